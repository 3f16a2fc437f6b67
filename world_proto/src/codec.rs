// Envelope format (28 bytes, fixed-size, little-endian):
//   [0..4]   Magic bytes: "MWLD"
//   [4..8]   Envelope format version (u32)
//   [8..12]  Record schema version (u32: 1 or 2)
//   [12..20] Creation timestamp, ms since Unix epoch (u64)
//   [20..24] Payload size in bytes (u32)
//   [24..28] xxHash32 checksum of the payload
//
// The payload is the bitcode-serialized record of the schema version named
// in the header. Readers accept schema versions 1 and 2; writers always
// emit version 2.

use thiserror::Error;
use xxhash_rust::xxh32::xxh32;

use crate::{SaveRecord, SaveRecordV1, SAVE_VERSION};

/// Magic bytes identifying a Meridian world save.
pub const MAGIC: [u8; 4] = *b"MWLD";

/// Size of the envelope header in bytes.
pub const HEADER_SIZE: usize = 28;

/// Current envelope layout version, distinct from the record schema version.
pub const ENVELOPE_VERSION: u32 = 1;

const XXHASH_SEED: u32 = 0;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save blob does not start with the MWLD magic bytes")]
    BadMagic,
    #[error("save blob truncated: {len} bytes is too short for the envelope header")]
    Truncated { len: usize },
    #[error("envelope version {found} is newer than this build supports")]
    EnvelopeVersion { found: u32 },
    #[error("unknown record schema version {found}")]
    UnknownVersion { found: u32 },
    #[error("payload length {found} disagrees with header ({expected})")]
    PayloadSize { expected: usize, found: usize },
    #[error("checksum mismatch: header {expected:#010x}, payload hashes to {computed:#010x}")]
    ChecksumMismatch { expected: u32, computed: u32 },
    #[error("record payload failed to decode: {0}")]
    Decode(String),
    #[error("record payload failed to encode: {0}")]
    Encode(String),
    #[error("heightmap buffer is {found} bytes, expected {expected}")]
    HeightmapSize { expected: usize, found: usize },
    #[error(
        "road {road} metadata (offset {offset}, count {count}) exceeds the \
         point pool of {pool_pairs} pairs"
    )]
    RoadBlobInconsistent {
        road: usize,
        offset: u32,
        count: u32,
        pool_pairs: usize,
    },
}

/// A decoded record, still in its on-disk schema. Loaders materialise both
/// variants into the same in-memory world; old records are never rewritten.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedRecord {
    V1(SaveRecordV1),
    V2(SaveRecord),
}

impl DecodedRecord {
    pub fn version(&self) -> u32 {
        match self {
            DecodedRecord::V1(_) => 1,
            DecodedRecord::V2(_) => 2,
        }
    }

    pub fn created_at(&self) -> u64 {
        match self {
            DecodedRecord::V1(rec) => rec.created_at,
            DecodedRecord::V2(rec) => rec.created_at,
        }
    }
}

/// Serialize a version-2 record into a checksummed envelope.
pub fn encode_record(record: &SaveRecord) -> Result<Vec<u8>, SaveError> {
    debug_assert_eq!(record.version, SAVE_VERSION);
    let payload = bitcode::serialize(record).map_err(|err| SaveError::Encode(err.to_string()))?;

    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&ENVELOPE_VERSION.to_le_bytes());
    out.extend_from_slice(&SAVE_VERSION.to_le_bytes());
    out.extend_from_slice(&record.created_at.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(&xxh32(&payload, XXHASH_SEED).to_le_bytes());
    out.extend_from_slice(&payload);

    tracing::debug!(
        target: "meridian::save",
        payload_bytes = payload.len(),
        settlements = record.settlements.len(),
        roads = record.roads.metadata.len(),
        "save.encoded"
    );
    Ok(out)
}

/// Parse the envelope, verify the checksum, and decode the payload at
/// whichever schema version the header names.
pub fn decode_record(bytes: &[u8]) -> Result<DecodedRecord, SaveError> {
    if bytes.len() < HEADER_SIZE {
        if bytes.len() >= 4 && bytes[..4] != MAGIC {
            return Err(SaveError::BadMagic);
        }
        return Err(SaveError::Truncated { len: bytes.len() });
    }
    if bytes[..4] != MAGIC {
        return Err(SaveError::BadMagic);
    }

    let envelope_version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if envelope_version > ENVELOPE_VERSION {
        return Err(SaveError::EnvelopeVersion {
            found: envelope_version,
        });
    }
    let record_version = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
    let payload_len = u32::from_le_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]) as usize;
    let checksum = u32::from_le_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]);

    let payload = &bytes[HEADER_SIZE..];
    if payload.len() != payload_len {
        return Err(SaveError::PayloadSize {
            expected: payload_len,
            found: payload.len(),
        });
    }
    let computed = xxh32(payload, XXHASH_SEED);
    if computed != checksum {
        return Err(SaveError::ChecksumMismatch {
            expected: checksum,
            computed,
        });
    }

    match record_version {
        1 => {
            let record: SaveRecordV1 =
                bitcode::deserialize(payload).map_err(|err| SaveError::Decode(err.to_string()))?;
            Ok(DecodedRecord::V1(record))
        }
        2 => {
            let record: SaveRecord =
                bitcode::deserialize(payload).map_err(|err| SaveError::Decode(err.to_string()))?;
            record.roads.validate()?;
            Ok(DecodedRecord::V2(record))
        }
        other => Err(SaveError::UnknownVersion { found: other }),
    }
}

/// Encode a version-1 record. Production code never writes this form; it
/// exists so compatibility tests can manufacture legacy blobs.
pub fn encode_record_v1(record: &SaveRecordV1) -> Result<Vec<u8>, SaveError> {
    let payload = bitcode::serialize(record).map_err(|err| SaveError::Encode(err.to_string()))?;
    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&ENVELOPE_VERSION.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&record.created_at.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(&xxh32(&payload, XXHASH_SEED).to_le_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}
