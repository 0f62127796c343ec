//! Search backend adapter
//!
//! Cursor-based exhaustive retrieval from a scroll-capable search backend.

pub mod client;
pub mod models;

pub use client::{PageProgress, ScrollSearchClient, SearchRequest};
