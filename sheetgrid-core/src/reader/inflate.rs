//! Raw-deflate decompression capability

use flate2::read::DeflateDecoder;
use std::io::{self, Read};

/// Decompresses raw DEFLATE streams (no zlib or gzip wrapper), as stored in ZIP entries.
///
/// Implementations must not produce more than `limit + 1` bytes so the caller
/// can detect an entry that inflates past its size limit.
pub trait Inflate {
    fn inflate_raw(
        &self,
        compressed: &[u8],
        expected_size: usize,
        limit: usize,
    ) -> io::Result<Vec<u8>>;
}

/// Default inflater backed by `flate2`
#[derive(Debug, Clone, Copy, Default)]
pub struct FlateInflater;

impl Inflate for FlateInflater {
    fn inflate_raw(
        &self,
        compressed: &[u8],
        expected_size: usize,
        limit: usize,
    ) -> io::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(expected_size.min(limit));
        DeflateDecoder::new(compressed)
            .take((limit as u64).saturating_add(1))
            .read_to_end(&mut out)?;
        Ok(out)
    }
}
