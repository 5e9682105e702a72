//! Search command handler.

use clap::Args;
use topicshelf_core::{config::AppConfig, AppResult};
use topicshelf_shelf::{format_results, Collection, SearchQuery};

/// Search a collection by text, or by an image file for images
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Query text, or a path to an image file
    pub query: String,

    /// Number of results to retrieve (at least 1)
    #[arg(
        short = 'k',
        long,
        default_value = "5",
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub top_k: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub async fn execute(&self, config: &AppConfig, collection: Collection) -> AppResult<()> {
        tracing::info!(
            "Executing search command on {} (top-{})",
            collection.table_name(),
            self.top_k
        );

        let query = SearchQuery::parse(&self.query, collection);
        tracing::debug!("Parsed query: {:?}", query);

        let searcher = topicshelf_shelf::searcher(config, collection, &query).await?;
        let results = searcher.search(query, self.top_k).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&results)?);
        } else {
            print!("{}", format_results(&results));
        }

        Ok(())
    }
}
