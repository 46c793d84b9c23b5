use crate::error::PivotError;
use crate::models::*;
use crate::resource_manager::ResourceManager;
use crate::source_store::{Source, SourceFetcher};
use crate::table::Table;

use async_trait::async_trait;
use bytes::Bytes;
use hashbrown::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Create a RequestData object with only required fields set.
pub(crate) fn get_test_request_data() -> RequestData {
    RequestData {
        url: "http://example.com/sales.json".to_string(),
        values: vec!["qty".to_string()],
        index: vec!["region".to_string()],
        columns: vec!["product".to_string()],
        rowfilter: vec![],
        aggfunc: "sum".to_string(),
        startrow: None,
        endrow: None,
    }
}

/// Create a RequestData object with all fields set.
pub(crate) fn get_test_request_data_optional() -> RequestData {
    RequestData {
        url: "http://example.com/sales.json".to_string(),
        values: vec!["qty".to_string(), "price".to_string()],
        index: vec!["region".to_string()],
        columns: vec!["product".to_string()],
        rowfilter: vec![RowFilter::new("region", "E")],
        aggfunc: "mean".to_string(),
        startrow: Some(1),
        endrow: Some(-1),
    }
}

/// Records used by most tests.
pub(crate) const SALES_JSON: &str = r#"[
    {"region": "E", "product": "A", "qty": 1, "price": 10.0},
    {"region": "E", "product": "B", "qty": 2, "price": 20.0},
    {"region": "W", "product": "A", "qty": 5, "price": 30.0}
]"#;

/// Build a Table from the sales records.
pub(crate) fn get_test_table() -> Table {
    Table::from_json(SALES_JSON.as_bytes()).unwrap()
}

/// Source fetcher serving fixed in-memory documents and counting fetches.
#[derive(Debug, Default)]
pub(crate) struct TestFetcher {
    documents: HashMap<String, Bytes>,
    fetches: Arc<AtomicUsize>,
}

impl TestFetcher {
    /// Create a fetcher serving `document` at `location`.
    pub(crate) fn new(location: &str, document: &str) -> Self {
        Self::default().with(location, document)
    }

    /// Serve an additional document.
    pub(crate) fn with(mut self, location: &str, document: &str) -> Self {
        self.documents
            .insert(location.to_string(), Bytes::from(document.to_string()));
        self
    }

    /// Shared handle on the number of fetches performed.
    pub(crate) fn counter(&self) -> Arc<AtomicUsize> {
        self.fetches.clone()
    }
}

#[async_trait]
impl SourceFetcher for TestFetcher {
    async fn fetch(
        &self,
        source: &Source,
        _resource_manager: &ResourceManager,
        _size_limit: Option<u64>,
    ) -> Result<Bytes, PivotError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        // Yield so that concurrent loads get a chance to interleave.
        tokio::task::yield_now().await;
        self.documents
            .get(source.location())
            .cloned()
            .ok_or_else(|| PivotError::HttpStatus {
                url: source.location().to_string(),
                status: 404,
            })
    }
}
