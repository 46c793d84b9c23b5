use crate::error::PivotError;
use crate::resource_manager::ResourceManager;
use crate::source_fetcher_file::SourceFetcherFile;
use crate::source_fetcher_http::SourceFetcherHttp;

use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use url::Url;

/// Location of source data.
#[derive(Clone, Debug, PartialEq)]
pub enum Source {
    /// HTTP or HTTPS URL
    Http { location: String, url: Url },
    /// Local file, given either as a `file://` URL or as a path
    File { location: String, path: PathBuf },
}

impl Source {
    /// Parse a source location.
    ///
    /// Strings that are not absolute URLs are treated as local paths, with a leading `~`
    /// expanded to the user's home directory.
    pub fn parse(location: &str) -> Result<Self, PivotError> {
        let unsupported = || PivotError::UnsupportedSource {
            location: location.to_string(),
        };
        match Url::parse(location) {
            Ok(url) => match url.scheme() {
                "http" | "https" => Ok(Source::Http {
                    location: location.to_string(),
                    url,
                }),
                "file" => Ok(Source::File {
                    location: location.to_string(),
                    path: url.to_file_path().map_err(|_| unsupported())?,
                }),
                _ => Err(unsupported()),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => Ok(Source::File {
                location: location.to_string(),
                path: expanduser::expanduser(location).map_err(|_| unsupported())?,
            }),
            Err(_) => Err(unsupported()),
        }
    }

    /// The location exactly as given.
    pub fn location(&self) -> &str {
        match self {
            Source::Http { location, .. } | Source::File { location, .. } => location,
        }
    }
}

/// Source fetcher trait.
///
/// Defines the interface for fetching the raw bytes of source data.
#[async_trait]
pub trait SourceFetcher: std::fmt::Debug + Send + Sync {
    /// Fetch source data.
    ///
    /// Returns the bytes exactly as stored, which may be compressed. Fetchers that can learn
    /// the size of the data before reading it all should stop once it exceeds `size_limit`.
    ///
    /// # Arguments
    ///
    /// * `source`: Location of the data
    /// * `resource_manager`: ResourceManager object
    /// * `size_limit`: Optional maximum size in bytes of the data
    async fn fetch(
        &self,
        source: &Source,
        resource_manager: &ResourceManager,
        size_limit: Option<u64>,
    ) -> Result<Bytes, PivotError>;
}

/// Check a size in bytes of source data against an optional limit.
pub fn check_size(size: u64, limit: Option<u64>) -> Result<(), PivotError> {
    match limit {
        Some(limit) if size > limit => Err(PivotError::SourceTooLarge { size, limit }),
        _ => Ok(()),
    }
}

/// Source store.
///
/// Dispatches to a fetcher based on the kind of [Source].
#[derive(Debug, Default)]
pub struct SourceStore {
    /// Fetcher for HTTP(S)
    fetcher_http: SourceFetcherHttp,
    /// Fetcher for local files
    fetcher_file: SourceFetcherFile,
}

impl SourceStore {
    /// Initialize the source store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SourceFetcher for SourceStore {
    #[tracing::instrument(level = "DEBUG", skip(self, resource_manager))]
    async fn fetch(
        &self,
        source: &Source,
        resource_manager: &ResourceManager,
        size_limit: Option<u64>,
    ) -> Result<Bytes, PivotError> {
        match source {
            Source::Http { .. } => {
                self.fetcher_http
                    .fetch(source, resource_manager, size_limit)
                    .await
            }
            Source::File { .. } => {
                self.fetcher_file
                    .fetch(source, resource_manager, size_limit)
                    .await
            }
        }
    }
}
