//! Snapshot body
//!
//! ```text
//! [Dimension: u32 LE]      0 only for an empty store without a dimension
//! [Vector Count: u64 LE]
//! [Vectors: count * dimension * f32 LE]
//! For each vector (in VectorId order):
//!   [VectorId: u64 LE]     must equal its position
//!   [Tag Count: u32 LE]
//!   For each tag:
//!     [Key Length: u32 LE] [Key: UTF-8]
//!     [Value Length: u32 LE] [Value: UTF-8]
//! ```
//!
//! Every length is checked against the remaining buffer before anything
//! is allocated for it.

use std::io::{self, Cursor, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use haystack_core::{DistanceMetric, HaystackError, HaystackResult, Tag, VectorId};

use crate::config::StoreConfig;
use crate::state::NamespaceState;
use crate::tags::TagStore;
use crate::vector::{BruteForceBackend, VectorHeap};

/// Smallest possible per-vector tag record (id + tag count)
const MIN_TAG_RECORD: u64 = 8 + 4;

/// Smallest possible tag (two length prefixes)
const MIN_TAG: u64 = 4 + 4;

pub(super) fn encode_body(state: &NamespaceState, out: &mut Vec<u8>) -> HaystackResult<()> {
    let index = state.index();
    let tags = state.tags();
    let count = index.len();
    let dimension = state.dimension().unwrap_or(0);

    out.write_u32::<LittleEndian>(length_u32(dimension, "dimension")?)?;
    out.write_u64::<LittleEndian>(count as u64)?;

    out.reserve(count * dimension * 4);
    for i in 0..count as u64 {
        let id = VectorId::new(i);
        let vector = index.get(id).ok_or(HaystackError::NotFound { id })?;
        for &x in vector {
            out.write_f32::<LittleEndian>(x)?;
        }
    }

    for i in 0..count as u64 {
        let id = VectorId::new(i);
        let view = tags.view(id).ok_or(HaystackError::NotFound { id })?;
        out.write_u64::<LittleEndian>(i)?;
        out.write_u32::<LittleEndian>(length_u32(view.len(), "tag count")?)?;
        for (key, value) in view.iter() {
            write_str(out, key)?;
            write_str(out, value)?;
        }
    }
    Ok(())
}

fn length_u32(len: usize, what: &str) -> HaystackResult<u32> {
    u32::try_from(len)
        .map_err(|_| HaystackError::invalid_input(format!("{} {} does not fit in u32", what, len)))
}

fn write_str<W: Write>(out: &mut W, s: &str) -> HaystackResult<()> {
    out.write_u32::<LittleEndian>(length_u32(s.len(), "string length")?)?;
    out.write_all(s.as_bytes())?;
    Ok(())
}

fn truncated(e: io::Error) -> HaystackError {
    HaystackError::corrupt(format!("truncated snapshot body: {}", e))
}

fn remaining(reader: &Cursor<&[u8]>) -> u64 {
    (reader.get_ref().len() as u64).saturating_sub(reader.position())
}

fn read_string(reader: &mut Cursor<&[u8]>, max: usize, what: &str) -> HaystackResult<String> {
    let len = reader.read_u32::<LittleEndian>().map_err(truncated)? as usize;
    if len > max {
        return Err(HaystackError::corrupt(format!(
            "tag {} of {} bytes exceeds limit {}",
            what, len, max
        )));
    }
    if len as u64 > remaining(reader) {
        return Err(HaystackError::corrupt(format!(
            "tag {} length {} runs past end of buffer",
            what, len
        )));
    }
    let start = reader.position() as usize;
    let bytes = &reader.get_ref()[start..start + len];
    let s = std::str::from_utf8(bytes)
        .map_err(|e| HaystackError::corrupt(format!("tag {} is not UTF-8: {}", what, e)))?
        .to_owned();
    reader.set_position((start + len) as u64);
    Ok(s)
}

pub(super) fn decode_body(
    raw: &[u8],
    metric: DistanceMetric,
    mut config: StoreConfig,
) -> HaystackResult<NamespaceState> {
    let limits = config.limits.clone();
    let mut reader = Cursor::new(raw);

    let dimension = reader.read_u32::<LittleEndian>().map_err(truncated)? as usize;
    let count = reader.read_u64::<LittleEndian>().map_err(truncated)?;
    if count > 0 && dimension == 0 {
        return Err(HaystackError::corrupt(format!(
            "{} vectors declared with dimension 0",
            count
        )));
    }
    if dimension > limits.max_dimension {
        return Err(HaystackError::corrupt(format!(
            "dimension {} exceeds limit {}",
            dimension, limits.max_dimension
        )));
    }

    // Vectors
    let floats = count
        .checked_mul(dimension as u64)
        .filter(|n| n.checked_mul(4).is_some_and(|bytes| bytes <= remaining(&reader)))
        .ok_or_else(|| {
            HaystackError::corrupt(format!(
                "{} vectors of dimension {} exceed buffer bounds",
                count, dimension
            ))
        })?;
    let mut data = vec![0.0f32; floats as usize];
    reader
        .read_f32_into::<LittleEndian>(&mut data)
        .map_err(truncated)?;

    let dimension = if dimension == 0 {
        config.dimension
    } else {
        Some(dimension)
    };
    let heap = VectorHeap::from_data(dimension, data, config.parallel_threshold)?;
    let index = Box::new(BruteForceBackend::from_heap(metric, heap));

    // Tags
    if count
        .checked_mul(MIN_TAG_RECORD)
        .map_or(true, |bytes| bytes > remaining(&reader))
    {
        return Err(HaystackError::corrupt(format!(
            "tag block for {} vectors exceeds buffer bounds",
            count
        )));
    }
    let mut tags = TagStore::with_unindexed_keys(config.unindexed_keys.iter().cloned());
    let mut scratch: Vec<Tag> = Vec::new();
    for expected in 0..count {
        let id = reader.read_u64::<LittleEndian>().map_err(truncated)?;
        if id != expected {
            return Err(HaystackError::corrupt(format!(
                "tag record {} carries id {}",
                expected, id
            )));
        }
        let tag_count = reader.read_u32::<LittleEndian>().map_err(truncated)? as usize;
        if tag_count > limits.max_tags_per_vector {
            return Err(HaystackError::corrupt(format!(
                "{} tags on {} exceeds limit {}",
                tag_count,
                VectorId::new(id),
                limits.max_tags_per_vector
            )));
        }
        if tag_count as u64 * MIN_TAG > remaining(&reader) {
            return Err(HaystackError::corrupt(format!(
                "{} tags on {} exceed buffer bounds",
                tag_count,
                VectorId::new(id)
            )));
        }

        scratch.clear();
        for _ in 0..tag_count {
            let key = read_string(&mut reader, limits.max_tag_key_bytes, "key")?;
            let value = read_string(&mut reader, limits.max_tag_value_bytes, "value")?;
            scratch.push(Tag { key, value });
        }
        tags.put(VectorId::new(id), &scratch)?;
    }

    if remaining(&reader) != 0 {
        return Err(HaystackError::corrupt(format!(
            "{} trailing bytes after tag block",
            remaining(&reader)
        )));
    }

    config.metric = metric;
    config.dimension = dimension;
    NamespaceState::from_parts(config, tags, index)
}
