//! Submit an image URL for analysis.

use console::style;

use forensics_viewer::config::Settings;
use forensics_viewer::models::CacheEntry;

use super::helpers::spinner;

pub async fn cmd_submit(settings: &Settings, url: &str, analyze: bool) -> anyhow::Result<()> {
    let client = settings.create_api_client()?;
    let cache = settings.open_cache();

    let pb = spinner(format!("Submitting {}...", url))?;
    let result = client.add_url(url).await;
    pb.finish_and_clear();
    let hash = result?;

    if hash.is_empty() {
        anyhow::bail!("Backend did not return a hash for {}", url);
    }

    println!("{} Submitted {}", style("✓").green(), url);
    println!("  Hash: {}", style(&hash).cyan());

    // Remember the image so the report page can show it while processing
    if let Err(e) = cache.record(CacheEntry::new(hash.clone(), url)) {
        eprintln!("  {} Could not update cache: {}", style("!").yellow(), e);
    }

    if analyze {
        let pb = spinner(format!("Requesting analysis for {}...", hash))?;
        let result = client.generate_report(&hash).await;
        pb.finish_and_clear();
        println!("  Backend: {}", result?);
    }

    println!("  View with: forensics view {}", hash);
    Ok(())
}
