//! End-to-end tests for indexing and search.
