//! Terminal report viewer.

use std::sync::Arc;
use std::time::Duration;

use console::style;

use forensics_viewer::config::Settings;
use forensics_viewer::viewer::{NoticeLevel, PanelContent, ReportView, ReportViewer, ViewerPhase};

use super::helpers::spinner;

/// Show the report for `hash`, optionally polling until it is complete.
pub async fn cmd_view(
    settings: &Settings,
    hash: &str,
    json: bool,
    follow: bool,
    interval: u64,
) -> anyhow::Result<()> {
    let client = Arc::new(settings.create_api_client()?);
    let cache = Arc::new(settings.open_cache());
    let viewer = ReportViewer::new(client, cache);

    let mut token = viewer.navigate(hash);
    let mut last = None;
    loop {
        if let Some(t) = token.take() {
            let pb = spinner(format!("Loading report {}...", hash))?;
            viewer.load(t).await;
            pb.finish_and_clear();
        }

        let ViewerPhase::Ready(view) = viewer.phase() else {
            break;
        };

        if json {
            println!("{}", serde_json::to_string_pretty(&view)?);
        } else {
            print_view(&view);
        }

        let settled = view.is_settled();
        last = Some(view);
        if !follow || settled {
            break;
        }

        println!(
            "{} Analysis still running, checking again in {}s (Ctrl+C to stop)",
            style("…").dim(),
            interval
        );
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = tokio::time::sleep(Duration::from_secs(interval)) => {}
        }
        token = viewer.refresh();
    }

    match last {
        Some(view) if view.report.is_none() => {
            let message = view.notice.map(|n| n.message).unwrap_or_default();
            anyhow::bail!("{}", message)
        }
        _ => Ok(()),
    }
}

fn print_view(view: &ReportView) {
    if let Some(ref notice) = view.notice {
        match notice.level {
            NoticeLevel::Warning => println!("{} {}", style("!").yellow(), notice.message),
            NoticeLevel::Error => println!("{} {}", style("✗").red(), notice.message),
        }
    }

    let Some(ref report) = view.report else {
        return;
    };

    println!("\n{}", style("Image Information").bold());
    println!("{}", "-".repeat(40));
    println!(
        "{:<16} {}",
        "Source URL:",
        report.source_url.as_deref().unwrap_or("n/a")
    );
    println!("{:<16} {}", "Hash:", view.hash);
    println!(
        "{:<16} {}",
        "Status:",
        report
            .status
            .as_ref()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "n/a".to_string())
    );
    if let Some(ref image) = report.display_image {
        println!("{:<16} {}", "Display image:", image);
    }

    // Terminal output keeps absolute backend URLs.
    for panel in view.panels(None) {
        println!("\n{}", style(panel.tab.title()).bold());
        match panel.content {
            PanelContent::HeatMaps(maps) => {
                for map in maps {
                    if let Some(ref label) = map.label {
                        println!("  {}", style(label).cyan());
                    }
                    println!("  {}", map.image);
                    for fact in &map.facts {
                        println!("    {:<12} {}", format!("{}:", fact.name), fact.value);
                    }
                }
            }
            PanelContent::Json(json) => {
                for line in json.lines() {
                    println!("  {}", line);
                }
            }
            PanelContent::Unavailable => {
                println!("  {}", style(panel.tab.unavailable_message()).dim());
            }
        }
    }
}
