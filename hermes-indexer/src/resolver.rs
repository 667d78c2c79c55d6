//! Spec Resolver
//!
//! Turns a challenge's `specCid` into a validated [`ChallengeSpec`].

use std::sync::Arc;

use hermes_core::ChallengeSpec;
use tracing::debug;

use crate::error::{IndexerError, IndexerResult};
use crate::fetch::{check_content_uri, ContentFetcher};

/// Fetch, parse and validate challenge spec documents
pub struct SpecResolver<F: ContentFetcher> {
    fetcher: Arc<F>,
}

impl<F: ContentFetcher> SpecResolver<F> {
    pub fn new(fetcher: Arc<F>) -> Self {
        Self { fetcher }
    }

    /// Resolve a spec URI.
    ///
    /// Unsupported schemes fail as [`IndexerError::SpecUri`] before any
    /// request. Transport failures surface as [`IndexerError::SpecFetch`];
    /// YAML and schema failures as [`IndexerError::SpecInvalid`].
    pub async fn resolve(&self, uri: &str) -> IndexerResult<ChallengeSpec> {
        check_content_uri(uri)?;
        let text = self.fetcher.fetch_text(uri).await?;
        let spec = ChallengeSpec::from_yaml(&text).map_err(|source| IndexerError::SpecInvalid {
            uri: uri.to_string(),
            source,
        })?;
        debug!(uri, title = %spec.title, "resolved challenge spec");
        Ok(spec)
    }
}
