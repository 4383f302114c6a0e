//! rusty-forum/crates/rf-core/src/lib.rs
//!
//! The central domain logic and port definitions for Rusty-Forum.
//! Nothing in this crate performs I/O: every read and write goes through
//! the traits in [`traits`], implemented by the plugins.

pub mod comments;
pub mod error;
pub mod models;
pub mod notifications;
pub mod traits;
pub mod trending;
pub mod votes;

// Re-exporting for easier access in other crates
pub use comments::{build_tree, CommentThreadLoader};
pub use error::*;
pub use models::*;
pub use notifications::NotificationCounter;
pub use traits::*;
pub use trending::TrendingRanker;
pub use votes::VoteLedger;
