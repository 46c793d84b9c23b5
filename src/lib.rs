//! This crate provides a pivot table server. A client posts a request naming a JSON table and
//! how to cross-tabulate it, and receives the aggregated table in split orientation.
//!
//! Each request is handled in the following stages:
//!
//! * the source table is loaded from an HTTP(S) URL or a local path, or taken from the cache
//!   of previously loaded sources ([source_loader])
//! * rows are selected by exact match on string fields ([row_filter])
//! * the rows are grouped and aggregated into a pivot table ([pivot])
//! * the column levels are reordered and a window of rows is selected ([shaper])
//!
//! The server is built on top of a number of open source components.
//!
//! * [Tokio](tokio), the most popular asynchronous Rust runtime.
//! * [Axum](axum) web framework, built by the Tokio team, on top of the [hyper] HTTP library.
//! * [Serde](serde) performs (de)serialisation of JSON request, response and source data.
//! * [reqwest] fetches source data over HTTP.
//! * [ndarray] holds the aggregated table.

pub mod aggregation;
pub mod aggregations;
pub mod app;
pub mod app_state;
pub mod cli;
pub mod compression;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod pivot;
pub mod resource_manager;
pub mod row_filter;
pub mod server;
pub mod shaper;
pub mod source_cache;
pub mod source_fetcher_file;
pub mod source_fetcher_http;
pub mod source_loader;
pub mod source_store;
pub mod table;
#[cfg(test)]
pub mod test_utils;
pub mod tracing;
pub mod types;
pub mod validated_json;
