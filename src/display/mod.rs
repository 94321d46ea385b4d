//! Display formatting for terminal output
//!
//! Plain-text summaries of listings and search results.

pub mod listing;
pub mod search;

pub use listing::{format_listing, format_root_listing};
pub use search::format_search_results;
