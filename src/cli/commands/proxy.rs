//! Standalone development proxy command.

use console::style;

use forensics_viewer::config::Settings;

use super::helpers::socket_addr;

pub async fn cmd_proxy(settings: &Settings, bind: &str) -> anyhow::Result<()> {
    let addr = socket_addr(bind, 3000)?;
    let proxy = settings.create_proxy()?;

    println!(
        "{} Dev proxy listening on http://{} -> {}",
        style("→").cyan(),
        addr,
        proxy.target()
    );
    for route in proxy.routes() {
        println!("  {}", route.prefix());
    }
    println!("  Press Ctrl+C to stop");

    forensics_viewer::proxy::serve(proxy, addr).await
}
