//! Document database smoke test command.

use console::style;

use forensics_viewer::config::Settings;
use forensics_viewer::smoke::SmokeTestConfig;

/// Connect, insert, read back, count, disconnect.
pub async fn cmd_smoke_test(
    settings: &Settings,
    uri: Option<String>,
    database: Option<String>,
    collection: Option<String>,
) -> anyhow::Result<()> {
    let defaults = &settings.smoke_test;
    let config = SmokeTestConfig {
        uri: uri.unwrap_or_else(|| defaults.uri.clone()),
        database: database.unwrap_or_else(|| defaults.database.clone()),
        collection: collection.unwrap_or_else(|| defaults.collection.clone()),
    };

    run(&config).await
}

#[cfg(feature = "mongo")]
async fn run(config: &SmokeTestConfig) -> anyhow::Result<()> {
    use forensics_viewer::smoke::{run_smoke_test, MongoStore};

    println!(
        "{} Testing {} ({}.{})",
        style("→").cyan(),
        config.uri,
        config.database,
        config.collection
    );

    let store = MongoStore::connect(config).await?;
    let report = run_smoke_test(&store).await;

    if let Some(ref id) = report.inserted_id {
        println!("  {} Inserted test document with ID: {}", style("✓").green(), id);
    }
    if let Some(ref doc) = report.found {
        println!("  {} Found document:", style("✓").green());
        println!("{}", serde_json::to_string_pretty(doc)?);
    }
    if let Some(count) = report.count {
        println!(
            "  {} Total documents in collection: {}",
            style("✓").green(),
            count
        );
    }
    println!("  Connection closed");

    match report.failure {
        Some((step, error)) => {
            eprintln!("  {} Failed at {}: {}", style("✗").red(), step, error);
            anyhow::bail!("Smoke test failed at {}", step)
        }
        None => {
            println!("{} Smoke test passed", style("✓").green());
            Ok(())
        }
    }
}

#[cfg(not(feature = "mongo"))]
async fn run(config: &SmokeTestConfig) -> anyhow::Result<()> {
    eprintln!(
        "{} Built without the 'mongo' feature; cannot test {}",
        style("✗").red(),
        config.uri
    );
    anyhow::bail!("MongoDB support not compiled in")
}
