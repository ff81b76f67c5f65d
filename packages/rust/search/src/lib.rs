//! Web search collaborators for the responder's last-resort lookup.
//!
//! This crate provides:
//! - [`SearchProvider`]: the seam the responder calls through
//! - [`SerpApiProvider`]: the production provider (SerpApi JSON endpoint)
//! - [`DisabledSearch`]: a provider that never returns anything
//!
//! Providers never fail: every problem on the far side of the boundary
//! (missing key, network, status, body) collapses into an empty result.

mod serpapi;

use async_trait::async_trait;
use huddle_shared::SearchFragment;

pub use serpapi::SerpApiProvider;

/// A ranked web search over some external provider.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Run `query` and return ranked fragments, possibly none.
    async fn search(&self, query: &str) -> Vec<SearchFragment>;
}

/// Provider used when search is switched off entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSearch;

#[async_trait]
impl SearchProvider for DisabledSearch {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn search(&self, _query: &str) -> Vec<SearchFragment> {
        Vec::new()
    }
}
