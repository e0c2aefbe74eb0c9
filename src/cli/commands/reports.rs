//! Cached report listing.

use console::style;

use forensics_viewer::config::Settings;

/// List cached report pointers, newest first.
pub async fn cmd_reports(settings: &Settings) -> anyhow::Result<()> {
    let cache = settings.open_cache();
    let entries = cache.entries();

    if entries.is_empty() {
        println!(
            "{} No cached reports in {}",
            style("!").yellow(),
            settings.cache_path().display()
        );
        return Ok(());
    }

    println!("\n{}", style("Cached Reports").bold());
    println!("{}", "-".repeat(60));
    for entry in &entries {
        println!(
            "{:<34} {:<16} {}",
            style(&entry.hash).cyan(),
            entry.date_str(),
            entry.url
        );
    }
    println!("{}", "-".repeat(60));
    println!("{} of {} max", entries.len(), cache.capacity());

    Ok(())
}
