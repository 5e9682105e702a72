//! Stats command handler.
//!
//! Shows record counts and topic folders for both collections.

use clap::Args;
use topicshelf_core::{config::AppConfig, AppResult};
use topicshelf_shelf::Collection;

/// Show collection statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let mut all = Vec::new();
        for collection in [Collection::Papers, Collection::Images] {
            all.push(topicshelf_shelf::stats(config, collection).await?);
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&all)?);
            return Ok(());
        }

        for stats in &all {
            println!(
                "{}: {} records, {} topics",
                stats.collection.table_name(),
                stats.records,
                stats.topics.len()
            );
            for (topic, files) in &stats.topics {
                println!("  {:<24} {} files", topic, files);
            }
        }

        Ok(())
    }
}
