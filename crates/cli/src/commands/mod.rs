//! Command handlers for the topicshelf CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod add;
pub mod search;
pub mod stats;

// Re-export command types for convenience
pub use add::AddCommand;
pub use search::SearchCommand;
pub use stats::StatsCommand;
