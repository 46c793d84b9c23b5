use crate::error::PivotError;
use crate::resource_manager::ResourceManager;
use crate::source_store::{check_size, Source, SourceFetcher};

use async_trait::async_trait;
use bytes::Bytes;

/// Local file source fetcher.
#[derive(Debug, Default)]
pub struct SourceFetcherFile {}

#[async_trait]
impl SourceFetcher for SourceFetcherFile {
    #[tracing::instrument(level = "DEBUG", skip(self, _resource_manager))]
    async fn fetch(
        &self,
        source: &Source,
        _resource_manager: &ResourceManager,
        size_limit: Option<u64>,
    ) -> Result<Bytes, PivotError> {
        let Source::File { path, .. } = source else {
            return Err(PivotError::UnsupportedSource {
                location: source.location().to_string(),
            });
        };
        let read_error = |error: std::io::Error| PivotError::SourceRead {
            path: path.display().to_string(),
            error,
        };
        if size_limit.is_some() {
            let metadata = tokio::fs::metadata(path).await.map_err(read_error)?;
            check_size(metadata.len(), size_limit)?;
        }
        let data = tokio::fs::read(path).await.map_err(read_error)?;
        Ok(data.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetch_missing_file() {
        let source = Source::parse("/nonexistent/pivotist/data.json").unwrap();
        let rm = ResourceManager::new(None, None);
        let err = SourceFetcherFile::default()
            .fetch(&source, &rm, None)
            .await
            .unwrap_err();
        match err {
            PivotError::SourceRead { path, error } => {
                assert_eq!("/nonexistent/pivotist/data.json", path);
                assert_eq!(std::io::ErrorKind::NotFound, error.kind());
            }
            err => panic!("unexpected error {}", err),
        }
    }

    #[tokio::test]
    async fn fetch_rejects_http_source() {
        let source = Source::parse("http://example.com/data.json").unwrap();
        let rm = ResourceManager::new(None, None);
        let err = SourceFetcherFile::default()
            .fetch(&source, &rm, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PivotError::UnsupportedSource { .. }));
    }

    #[tokio::test]
    async fn fetch_file_too_large() {
        let path = std::env::temp_dir().join(format!("pivotist-file-{}.json", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, b"[{}, {}]").await.unwrap();
        let source = Source::parse(path.to_str().unwrap()).unwrap();
        let rm = ResourceManager::new(None, None);
        let fetcher = SourceFetcherFile::default();
        let err = fetcher.fetch(&source, &rm, Some(4)).await.unwrap_err();
        assert!(matches!(err, PivotError::SourceTooLarge { size: 8, limit: 4 }));
        let data = fetcher.fetch(&source, &rm, Some(8)).await.unwrap();
        assert_eq!(b"[{}, {}]".as_ref(), data);
        tokio::fs::remove_file(&path).await.unwrap();
    }
}
