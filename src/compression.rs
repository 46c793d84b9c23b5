//! Decompression of source data.

use crate::error::PivotError;

use bytes::Bytes;
use flate2::read::GzDecoder;
use std::io::Read;
use zune_inflate::errors::DecodeErrorStatus;
use zune_inflate::{DeflateDecoder, DeflateOptions};

/// Compression algorithm of source data
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Compression {
    /// Gzip
    Gzip,
    /// Zlib
    Zlib,
}

impl Compression {
    /// Infer the compression algorithm from the suffix of a source location.
    ///
    /// Any query string or fragment is ignored. Returns None for uncompressed data.
    pub fn infer(location: &str) -> Option<Self> {
        let path = location
            .split(&['?', '#'][..])
            .next()
            .unwrap_or(location);
        if path.ends_with(".gz") {
            Some(Self::Gzip)
        } else if path.ends_with(".zlib") || path.ends_with(".zz") {
            Some(Self::Zlib)
        } else {
            None
        }
    }
}

/// Decompresses some Bytes and returns the uncompressed data.
///
/// With a `size_limit`, decoding stops once the output exceeds it. The result then fails with
/// [PivotError::SourceTooLarge] and no more than `size_limit + 1` bytes are ever decoded.
///
/// # Arguments
///
/// * `compression`: Compression algorithm
/// * `data`: Compressed data
/// * `size_limit`: Optional maximum size in bytes of the uncompressed data
pub fn decompress(
    compression: Compression,
    data: &Bytes,
    size_limit: Option<u64>,
) -> Result<Bytes, PivotError> {
    // One byte past the limit is enough to tell that the limit was exceeded.
    let output_limit = size_limit.map(|limit| limit.saturating_add(1));
    let data = match compression {
        Compression::Gzip => decompress_flate2_gzip(data, output_limit)?,
        Compression::Zlib => decompress_zune_zlib(data, output_limit)?,
    };
    crate::source_store::check_size(u64::try_from(data.len())?, size_limit)?;
    Ok(data)
}

fn decompress_flate2_gzip(data: &Bytes, output_limit: Option<u64>) -> Result<Bytes, PivotError> {
    let decoder = GzDecoder::<&[u8]>::new(data);
    let mut buf = Vec::with_capacity(data.len());
    decoder
        .take(output_limit.unwrap_or(u64::MAX))
        .read_to_end(&mut buf)?;
    Ok(buf.into())
}

fn decompress_zune_zlib(data: &Bytes, output_limit: Option<u64>) -> Result<Bytes, PivotError> {
    let options = match output_limit {
        // Deflate expands by at most about 1032 times, so with this hint the output buffer only
        // needs to grow once the limit has been exceeded.
        Some(output_limit) => {
            let output_limit = usize::try_from(output_limit).unwrap_or(usize::MAX);
            let size_hint = output_limit.min(data.len().saturating_mul(1032));
            DeflateOptions::default()
                .set_size_hint(size_hint)
                .set_limit(output_limit)
        }
        None => DeflateOptions::default().set_size_hint(data.len()),
    };
    let mut decoder = DeflateDecoder::new_with_options(data, options);
    match decoder.decode_zlib() {
        Ok(data) => Ok(data.into()),
        Err(err) => {
            if let (DecodeErrorStatus::OutputLimitExceeded(..), Some(output_limit)) =
                (&err.error, output_limit)
            {
                return Err(PivotError::SourceTooLarge {
                    size: output_limit,
                    limit: output_limit - 1,
                });
            }
            Err(err.into())
        }
    }
}
