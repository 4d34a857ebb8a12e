//! HTTP client for the bot trap admin API
//!
//! A thin authenticated request layer over `reqwest`. Higher layers decide
//! retry and partial-failure policy; this crate only shapes requests and maps
//! failures into the console error taxonomy.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod client;

// Re-export commonly used types
pub use client::{AdminApiClient, EventFilter};
