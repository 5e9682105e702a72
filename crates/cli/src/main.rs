//! topicshelf CLI
//!
//! Main entry point for the topicshelf command-line tool.
//! Indexes papers and images by embedding and files them by topic.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AddCommand, SearchCommand, StatsCommand};
use std::path::PathBuf;
use topicshelf_core::{config::AppConfig, logging, AppResult};
use topicshelf_shelf::Collection;

/// topicshelf - semantic paper and image library with inferred topics
#[derive(Parser, Debug)]
#[command(name = "topicshelf")]
#[command(about = "Semantic paper and image library with inferred topics", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "TOPICSHELF_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "TOPICSHELF_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Index a PDF or a directory of PDFs
    AddPaper(AddCommand),

    /// Search papers by text
    SearchPaper(SearchCommand),

    /// Index an image or a directory of images
    AddImage(AddCommand),

    /// Search images by text or by an image file
    SearchImage(SearchCommand),

    /// Show collection statistics
    Stats(StatsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load configuration: defaults, config file, environment
    let config = AppConfig::load(cli.workspace, cli.config)?;

    // Apply CLI overrides
    let config = config.with_overrides(cli.log_level, cli.verbose, cli.no_color);

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("topicshelf starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!(
        "Models: paper={}, image={}, imageText={}",
        config.models.paper.service(),
        config.models.image.service(),
        config.models.image_text.service()
    );

    config.validate()?;
    config.ensure_state_dir()?;

    let command_name = match &cli.command {
        Commands::AddPaper(_) => "add-paper",
        Commands::SearchPaper(_) => "search-paper",
        Commands::AddImage(_) => "add-image",
        Commands::SearchImage(_) => "search-image",
        Commands::Stats(_) => "stats",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::AddPaper(cmd) => cmd.execute(&config, Collection::Papers).await,
        Commands::SearchPaper(cmd) => cmd.execute(&config, Collection::Papers).await,
        Commands::AddImage(cmd) => cmd.execute(&config, Collection::Images).await,
        Commands::SearchImage(cmd) => cmd.execute(&config, Collection::Images).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_paper_with_topics() {
        let cli = Cli::try_parse_from(["topicshelf", "add-paper", "papers/", "--topics", "ml,nlp"])
            .unwrap();
        match cli.command {
            Commands::AddPaper(cmd) => {
                assert_eq!(cmd.path, PathBuf::from("papers/"));
                assert_eq!(cmd.topics.as_deref(), Some("ml,nlp"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_search_top_k_defaults_to_five() {
        let cli = Cli::try_parse_from(["topicshelf", "search-image", "sunset"]).unwrap();
        match cli.command {
            Commands::SearchImage(cmd) => {
                assert_eq!(cmd.top_k, 5);
                assert_eq!(cmd.query, "sunset");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_search_top_k_must_be_positive() {
        assert!(Cli::try_parse_from(["topicshelf", "search-paper", "gnn", "--top-k", "0"]).is_err());

        let cli = Cli::try_parse_from(["topicshelf", "search-paper", "gnn", "-k", "1"]).unwrap();
        match cli.command {
            Commands::SearchPaper(cmd) => assert_eq!(cmd.top_k, 1),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
