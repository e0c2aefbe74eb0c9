//! Web server command.

use console::style;

use forensics_viewer::config::Settings;

use super::helpers::socket_addr;

/// Start the dashboard.
pub async fn cmd_serve(settings: &Settings, bind: &str, no_proxy: bool) -> anyhow::Result<()> {
    let addr = socket_addr(bind, 3030)?;

    println!(
        "{} Starting report dashboard at http://{}",
        style("→").cyan(),
        addr
    );
    println!("  Backend: {}", settings.api_url);
    if no_proxy || !settings.proxy.enabled {
        println!("  {} Dev proxy disabled", style("!").yellow());
    } else {
        println!(
            "  Forwarding {} to {}",
            settings
                .proxy
                .routes
                .iter()
                .map(|r| r.prefix.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            settings.proxy.target
        );
    }
    println!("  Press Ctrl+C to stop");

    forensics_viewer::server::serve(settings, addr, !no_proxy).await
}
