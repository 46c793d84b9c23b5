use crate::error::PivotError;
use crate::resource_manager::ResourceManager;
use crate::source_store::{check_size, Source, SourceFetcher};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};

/// HTTP source fetcher.
///
/// Implements [SourceFetcher] for HTTP and HTTPS URLs.
#[derive(Debug)]
pub struct SourceFetcherHttp {
    reqwest_client: reqwest::Client,
}

impl SourceFetcherHttp {
    /// Create a new HTTP source fetcher.
    pub fn new() -> Self {
        Self {
            reqwest_client: reqwest::Client::new(),
        }
    }
}

impl Default for SourceFetcherHttp {
    /// Create a default HTTP source fetcher.
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceFetcher for SourceFetcherHttp {
    /// Download source data.
    ///
    /// # Arguments
    ///
    /// * `source`: Source to download. Must be [Source::Http].
    /// * `resource_manager`: ResourceManager object
    /// * `size_limit`: Optional maximum size in bytes of the response body
    #[tracing::instrument(level = "DEBUG", skip(self, resource_manager))]
    async fn fetch(
        &self,
        source: &Source,
        resource_manager: &ResourceManager,
        size_limit: Option<u64>,
    ) -> Result<Bytes, PivotError> {
        let Source::Http { url, .. } = source else {
            return Err(PivotError::UnsupportedSource {
                location: source.location().to_string(),
            });
        };
        // Acquire connection permit to be freed via drop when this function returns
        let _conn_permit = resource_manager.connection().await?;
        let mut response = self.reqwest_client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PivotError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        // Reject early if the server tells us the body is too large.
        if let Some(content_length) = response.content_length() {
            check_size(content_length, size_limit)?;
        }
        let Some(limit) = size_limit else {
            return Ok(response.bytes().await?);
        };
        // The content length may be absent or wrong, so also count bytes as they arrive.
        let mut data = BytesMut::new();
        while let Some(chunk) = response.chunk().await? {
            data.extend_from_slice(&chunk);
            check_size(u64::try_from(data.len())?, Some(limit))?;
        }
        Ok(data.freeze())
    }
}
