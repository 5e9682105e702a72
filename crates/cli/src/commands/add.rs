//! Add command handler.
//!
//! Indexes a file or directory into the paper or image collection.

use clap::Args;
use std::path::PathBuf;
use topicshelf_core::{config::AppConfig, AppResult};
use topicshelf_shelf::{Collection, IngestReport};

/// Index a file or a directory of files
#[derive(Args, Debug)]
pub struct AddCommand {
    /// File or directory to index
    pub path: PathBuf,

    /// Comma-separated topics (inferred from similar items when omitted)
    #[arg(short, long)]
    pub topics: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AddCommand {
    pub async fn execute(&self, config: &AppConfig, collection: Collection) -> AppResult<()> {
        tracing::info!(
            "Executing add command for {} at {:?}",
            collection.table_name(),
            self.path
        );

        let topics = self.topics.as_deref();
        let report = match collection {
            Collection::Papers => topicshelf_shelf::add_papers(config, &self.path, topics).await?,
            Collection::Images => topicshelf_shelf::add_images(config, &self.path, topics).await?,
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_report(collection, &report);
        }

        Ok(())
    }
}

fn print_report(collection: Collection, report: &IngestReport) {
    for item in &report.items {
        let origin = if item.inferred { "inferred" } else { "given" };
        println!(
            "Indexed {} [{}: {}]",
            item.source.display(),
            origin,
            item.topics.join(", ")
        );
        for stored in &item.stored_paths {
            println!("  -> {}", stored.display());
        }
    }

    for skipped in &report.skipped {
        println!("Skipped {} (no text)", skipped.display());
    }

    println!(
        "Added {} {} ({} records) in {:.2}s",
        report.items.len(),
        collection.table_name(),
        report.records(),
        report.duration_secs
    );
}
