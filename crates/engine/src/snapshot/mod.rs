//! Snapshot Codec
//!
//! Serializes a whole namespace state to one buffer and back.
//!
//! ## Snapshot Format (Version 0x01)
//!
//! ```text
//! [Magic: b"HYST"]
//! [Version: u8]
//! [Flags: u8]              bit 0 = body is zstd compressed
//! [Metric: u8]             0 = cosine, 1 = euclidean, 2 = dot_product
//! [Reserved: u8 = 0]
//! [Body Length: u64 LE]    stored body length
//! [Raw Length: u64 LE]     uncompressed body length
//! [Body]
//! [Checksum: u64 LE]       xxh3-64 of every preceding byte
//! ```
//!
//! The body layout is described in [`body`].
//!
//! ## Design Notes
//!
//! 1. **Deterministic Output**: vectors and tags are written in VectorId
//!    order, so equal states encode to identical bytes.
//! 2. **Never partial**: decoding builds a complete new state; the caller
//!    swaps it in only on success.
//! 3. **Norms are not stored**: they are recomputed on decode.

mod body;

use std::io::Read;
use std::time::Instant;

use byteorder::{ByteOrder, LittleEndian};
use haystack_core::{DistanceMetric, HaystackError, HaystackResult};
use tracing::{info, warn};
use xxhash_rust::xxh3::xxh3_64;

use crate::config::{SnapshotCompression, StoreConfig};
use crate::state::NamespaceState;

/// Leading magic bytes
pub const SNAPSHOT_MAGIC: &[u8; 4] = b"HYST";

/// Snapshot format version
pub const SNAPSHOT_VERSION: u8 = 0x01;

/// Flag bit: body is zstd compressed
pub const FLAG_ZSTD: u8 = 0b0000_0001;

/// Fixed header size in bytes
pub const HEADER_LEN: usize = 4 + 1 + 1 + 1 + 1 + 8 + 8;

/// Trailing checksum size in bytes
pub const CHECKSUM_LEN: usize = 8;

/// Decoded fixed header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotHeader {
    /// Format version
    pub version: u8,
    /// Flag bits
    pub flags: u8,
    /// Store metric
    pub metric: DistanceMetric,
    /// Stored body length
    pub body_len: u64,
    /// Uncompressed body length
    pub raw_len: u64,
}

impl SnapshotHeader {
    /// Check whether the body is compressed
    pub fn is_compressed(&self) -> bool {
        self.flags & FLAG_ZSTD != 0
    }

    fn write_into(&self, buf: &mut [u8]) {
        buf[..4].copy_from_slice(SNAPSHOT_MAGIC);
        buf[4] = self.version;
        buf[5] = self.flags;
        buf[6] = self.metric.to_byte();
        buf[7] = 0;
        LittleEndian::write_u64(&mut buf[8..16], self.body_len);
        LittleEndian::write_u64(&mut buf[16..24], self.raw_len);
    }

    /// Parse and validate the fixed header
    ///
    /// Magic and version are checked first so a buffer from a future
    /// format is reported as such rather than as a checksum failure.
    pub fn parse(bytes: &[u8]) -> HaystackResult<Self> {
        if bytes.len() < SNAPSHOT_MAGIC.len() + 1 {
            return Err(HaystackError::corrupt("truncated snapshot header"));
        }
        if &bytes[..4] != SNAPSHOT_MAGIC {
            return Err(HaystackError::corrupt("bad snapshot magic"));
        }
        let version = bytes[4];
        if version != SNAPSHOT_VERSION {
            return Err(HaystackError::corrupt(format!(
                "unsupported snapshot version: {}",
                version
            )));
        }
        if bytes.len() < HEADER_LEN {
            return Err(HaystackError::corrupt("truncated snapshot header"));
        }

        let flags = bytes[5];
        if flags & !FLAG_ZSTD != 0 {
            return Err(HaystackError::corrupt(format!(
                "unknown snapshot flags: {:#04x}",
                flags
            )));
        }
        let metric = DistanceMetric::from_byte(bytes[6]).ok_or_else(|| {
            HaystackError::corrupt(format!("invalid metric: {}", bytes[6]))
        })?;
        if bytes[7] != 0 {
            return Err(HaystackError::corrupt("reserved header byte is set"));
        }
        let header = SnapshotHeader {
            version,
            flags,
            metric,
            body_len: LittleEndian::read_u64(&bytes[8..16]),
            raw_len: LittleEndian::read_u64(&bytes[16..24]),
        };
        if !header.is_compressed() && header.raw_len != header.body_len {
            return Err(HaystackError::corrupt(format!(
                "raw length {} differs from body length {} in uncompressed snapshot",
                header.raw_len, header.body_len
            )));
        }
        Ok(header)
    }
}

/// Encode a state with the compression settings of its config
pub fn encode(state: &NamespaceState) -> HaystackResult<Vec<u8>> {
    let started = Instant::now();
    let config = state.config();

    let mut out = vec![0u8; HEADER_LEN];
    let (flags, raw_len) = match config.compression {
        SnapshotCompression::None => {
            body::encode_body(state, &mut out)?;
            (0, (out.len() - HEADER_LEN) as u64)
        }
        SnapshotCompression::Zstd => {
            let mut raw = Vec::new();
            body::encode_body(state, &mut raw)?;
            zstd::stream::copy_encode(raw.as_slice(), &mut out, config.compression_level)?;
            (FLAG_ZSTD, raw.len() as u64)
        }
    };

    let header = SnapshotHeader {
        version: SNAPSHOT_VERSION,
        flags,
        metric: state.metric(),
        body_len: (out.len() - HEADER_LEN) as u64,
        raw_len,
    };
    header.write_into(&mut out[..HEADER_LEN]);
    let checksum = xxh3_64(&out);
    out.extend_from_slice(&checksum.to_le_bytes());

    info!(
        target: "haystack::snapshot",
        vectors = state.len(),
        bytes = out.len(),
        compressed = header.is_compressed(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "Snapshot encoded"
    );
    Ok(out)
}

/// Decode a buffer into a fresh state
///
/// Metric and dimension come from the snapshot. An empty snapshot without
/// a dimension falls back to the dimension pinned in `config`.
pub fn decode(bytes: &[u8], config: StoreConfig) -> HaystackResult<NamespaceState> {
    let started = Instant::now();
    match decode_checked(bytes, config) {
        Ok(state) => {
            info!(
                target: "haystack::snapshot",
                vectors = state.len(),
                bytes = bytes.len(),
                elapsed_us = started.elapsed().as_micros() as u64,
                "Snapshot decoded"
            );
            Ok(state)
        }
        Err(e) => {
            warn!(
                target: "haystack::snapshot",
                bytes = bytes.len(),
                error = %e,
                "Snapshot rejected"
            );
            Err(e)
        }
    }
}

fn decode_checked(bytes: &[u8], config: StoreConfig) -> HaystackResult<NamespaceState> {
    let header = SnapshotHeader::parse(bytes)?;
    if bytes.len() < HEADER_LEN + CHECKSUM_LEN {
        return Err(HaystackError::corrupt("truncated snapshot"));
    }

    let (payload, trailer) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
    let expected = LittleEndian::read_u64(trailer);
    let actual = xxh3_64(payload);
    if expected != actual {
        return Err(HaystackError::corrupt(format!(
            "checksum mismatch: stored {:#018x}, computed {:#018x}",
            expected, actual
        )));
    }

    let stored = &payload[HEADER_LEN..];
    if stored.len() as u64 != header.body_len {
        return Err(HaystackError::corrupt(format!(
            "body length {} does not match header ({})",
            stored.len(),
            header.body_len
        )));
    }

    let max_raw = config.limits.max_snapshot_bytes;
    if header.raw_len > max_raw {
        return Err(HaystackError::corrupt(format!(
            "snapshot body of {} bytes exceeds limit {}",
            header.raw_len, max_raw
        )));
    }

    if header.is_compressed() {
        let raw = decompress(stored, header.raw_len)?;
        body::decode_body(&raw, header.metric, config)
    } else {
        body::decode_body(stored, header.metric, config)
    }
}

fn decompress(stored: &[u8], raw_len: u64) -> HaystackResult<Vec<u8>> {
    let corrupt = |e: std::io::Error| HaystackError::corrupt(format!("zstd body: {}", e));

    let decoder = zstd::stream::Decoder::new(stored).map_err(corrupt)?;
    let mut limited = decoder.take(raw_len);
    let mut raw = Vec::new();
    limited.read_to_end(&mut raw).map_err(corrupt)?;
    if raw.len() as u64 != raw_len {
        return Err(HaystackError::corrupt(format!(
            "decompressed body is {} bytes, header says {}",
            raw.len(),
            raw_len
        )));
    }

    let mut extra = [0u8; 1];
    if limited.into_inner().read(&mut extra).map_err(corrupt)? != 0 {
        return Err(HaystackError::corrupt(
            "decompressed body is longer than header says",
        ));
    }
    Ok(raw)
}
