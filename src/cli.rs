//! Command Line Interface (CLI) arguments.

use byte_unit::Byte;
use clap::Parser;
use std::num::NonZeroUsize;

/// Pivotist command line interface
#[derive(Clone, Debug, Parser)]
pub struct CommandLineArgs {
    /// The IP address on which the server should listen
    #[arg(long, default_value = "0.0.0.0", env = "PIVOTIST_HOST")]
    pub host: String,
    /// The port to which the server should bind
    #[arg(long, default_value_t = 8000, env = "PIVOTIST_PORT")]
    pub port: u16,
    /// Flag indicating whether HTTPS should be used
    #[arg(long, default_value_t = false, env = "PIVOTIST_HTTPS")]
    pub https: bool,
    /// Path to the certificate file to be used for HTTPS encryption
    #[arg(
        long,
        default_value = "~/.config/pivotist/certs/cert.pem",
        env = "PIVOTIST_CERT_FILE"
    )]
    pub cert_file: String,
    /// Path to the key file to be used for HTTPS encryption
    #[arg(
        long,
        default_value = "~/.config/pivotist/certs/key.pem",
        env = "PIVOTIST_KEY_FILE"
    )]
    pub key_file: String,
    /// Maximum time in seconds to wait for requests to complete upon receiving `ctrl+c` signal.
    #[arg(long, default_value_t = 60, env = "PIVOTIST_SHUTDOWN_TIMEOUT")]
    pub graceful_shutdown_timeout: u64,
    /// Whether to use Rayon for execution of CPU-bound pivots.
    #[arg(long, default_value_t = false, env = "PIVOTIST_USE_RAYON")]
    pub use_rayon: bool,
    /// Maximum number of pivots to run concurrently.
    /// Defaults to one less than the number of CPUs.
    #[arg(long, env = "PIVOTIST_THREAD_LIMIT")]
    pub thread_limit: Option<NonZeroUsize>,
    /// Maximum number of concurrent connections used to fetch source data.
    #[arg(long, env = "PIVOTIST_CONNECTION_LIMIT")]
    pub connection_limit: Option<NonZeroUsize>,
    /// Maximum number of sources to keep in the cache. Unlimited if not set.
    #[arg(long, env = "PIVOTIST_SOURCE_CACHE_SIZE")]
    pub source_cache_size: Option<NonZeroUsize>,
    /// Time in seconds for which a cached source remains valid. Forever if not set.
    #[arg(long, env = "PIVOTIST_SOURCE_CACHE_TTL")]
    pub source_cache_ttl: Option<u64>,
    /// Maximum size of source data, e.g. 100MB. Unlimited if not set.
    #[arg(long, value_parser = parse_byte_size, env = "PIVOTIST_SOURCE_SIZE_LIMIT")]
    pub source_size_limit: Option<u64>,
}

/// Parse a human readable byte size such as `512KiB` or `2GB`.
fn parse_byte_size(s: &str) -> Result<u64, String> {
    Byte::parse_str(s, true)
        .map(|byte| byte.as_u64())
        .map_err(|err| err.to_string())
}

/// Returns parsed command line arguments.
pub fn parse() -> CommandLineArgs {
    CommandLineArgs::parse()
}
