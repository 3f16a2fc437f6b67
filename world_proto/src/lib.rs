//! Save-record schemas and the versioned binary codec for the Meridian
//! world core. These types are consumed by both the generation crate and
//! external hosts; they carry plain data only and never touch renderer or
//! UI state.

mod codec;
mod store;

use serde::{Deserialize, Serialize};

pub use codec::{
    decode_record, encode_record, encode_record_v1, DecodedRecord, SaveError, ENVELOPE_VERSION,
    HEADER_SIZE, MAGIC,
};
pub use store::RecordStore;

/// Record schema version written by this build. Version 1 (inline per-road
/// point lists) remains readable but is never written.
pub const SAVE_VERSION: u32 = 2;

/// Settlement category discriminant as stored on disk.
pub const CATEGORY_VILLAGE: u8 = 0;
pub const CATEGORY_TOWN: u8 = 1;
pub const CATEGORY_CITY: u8 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRecord {
    pub version: u32,
    pub seed: u32,
    pub width: u32,
    pub height: u32,
    pub use_shading: bool,
    pub enable_erosion: bool,
    /// Milliseconds since the Unix epoch at save time.
    pub created_at: u64,
    /// Contiguous little-endian 32-bit floats, `4 * width * height` bytes.
    pub heightmap: Vec<u8>,
    pub settlements: Vec<SettlementState>,
    pub roads: RoadBlob,
    pub time: TimeState,
    pub player: Option<PlayerState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementState {
    pub x: f32,
    pub y: f32,
    pub elevation: f32,
    pub suitability: f32,
    pub island_id: i32,
    pub island_area: u32,
    pub road_degree: u32,
    pub second_hop_reach: u32,
    pub city_score: f32,
    pub category: u8,
}

/// Per-road metadata into the shared point pool. `points_offset` counts xy
/// pairs from the start of `points_data`, not floats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadMetadata {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub length: f32,
    pub a_index: u32,
    pub b_index: u32,
    pub points_offset: u32,
    pub points_count: u32,
}

/// All road polylines flattened into one contiguous float pool of xy pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadBlob {
    pub metadata: Vec<RoadMetadata>,
    pub points_data: Vec<f32>,
}

impl RoadBlob {
    /// The xy pairs of road `index`, or `None` when the metadata points
    /// outside the pool.
    pub fn points(&self, index: usize) -> Option<&[f32]> {
        let meta = self.metadata.get(index)?;
        let start = meta.points_offset as usize * 2;
        let end = start + meta.points_count as usize * 2;
        self.points_data.get(start..end)
    }

    /// Checks every metadata entry against the pool bounds.
    pub fn validate(&self) -> Result<(), SaveError> {
        for (road, meta) in self.metadata.iter().enumerate() {
            let start = meta.points_offset as usize * 2;
            let end = start.saturating_add(meta.points_count as usize * 2);
            if meta.points_count < 2 || end > self.points_data.len() {
                return Err(SaveError::RoadBlobInconsistent {
                    road,
                    offset: meta.points_offset,
                    count: meta.points_count,
                    pool_pairs: self.points_data.len() / 2,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeState {
    pub total_days: u64,
    pub time_speed: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub x: f32,
    pub y: f32,
    pub current_settlement: Option<u32>,
}

/// Version-1 record: identical to [`SaveRecord`] except that each road
/// carries its own point list instead of indexing a shared pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRecordV1 {
    pub version: u32,
    pub seed: u32,
    pub width: u32,
    pub height: u32,
    pub use_shading: bool,
    pub enable_erosion: bool,
    pub created_at: u64,
    pub heightmap: Vec<u8>,
    pub settlements: Vec<SettlementState>,
    pub roads: Vec<RoadStateV1>,
    pub time: TimeState,
    pub player: Option<PlayerState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadStateV1 {
    pub a_index: u32,
    pub b_index: u32,
    pub length: f32,
    pub points: Vec<[f32; 2]>,
}

/// Packs a heightmap into contiguous little-endian f32 bytes.
pub fn heightmap_to_bytes(values: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * 4);
    for v in values {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Unpacks little-endian f32 bytes, verifying the expected cell count.
pub fn heightmap_from_bytes(bytes: &[u8], expected_cells: usize) -> Result<Vec<f32>, SaveError> {
    if bytes.len() != expected_cells * 4 {
        return Err(SaveError::HeightmapSize {
            expected: expected_cells * 4,
            found: bytes.len(),
        });
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heightmap_bytes_round_trip() {
        let values = vec![0.0f32, 0.25, 0.5, 0.75, 1.0, 0.125];
        let bytes = heightmap_to_bytes(&values);
        assert_eq!(bytes.len(), values.len() * 4);
        let back = heightmap_from_bytes(&bytes, values.len()).expect("round trip");
        assert_eq!(back, values);
    }

    #[test]
    fn heightmap_bytes_length_checked() {
        let bytes = heightmap_to_bytes(&[0.5f32; 4]);
        let err = heightmap_from_bytes(&bytes, 5).unwrap_err();
        assert!(matches!(err, SaveError::HeightmapSize { .. }));
    }

    #[test]
    fn road_blob_points_lookup() {
        let blob = RoadBlob {
            metadata: vec![
                RoadMetadata {
                    x1: 0.0,
                    y1: 0.0,
                    x2: 2.0,
                    y2: 0.0,
                    length: 2.0,
                    a_index: 0,
                    b_index: 1,
                    points_offset: 0,
                    points_count: 2,
                },
                RoadMetadata {
                    x1: 2.0,
                    y1: 0.0,
                    x2: 2.0,
                    y2: 3.0,
                    length: 3.0,
                    a_index: 1,
                    b_index: 2,
                    points_offset: 2,
                    points_count: 2,
                },
            ],
            points_data: vec![0.0, 0.0, 2.0, 0.0, 2.0, 0.0, 2.0, 3.0],
        };
        blob.validate().expect("consistent blob");
        assert_eq!(blob.points(0), Some(&[0.0, 0.0, 2.0, 0.0][..]));
        assert_eq!(blob.points(1), Some(&[2.0, 0.0, 2.0, 3.0][..]));
        assert_eq!(blob.points(2), None);
    }

    #[test]
    fn road_blob_out_of_bounds_rejected() {
        let blob = RoadBlob {
            metadata: vec![RoadMetadata {
                x1: 0.0,
                y1: 0.0,
                x2: 1.0,
                y2: 0.0,
                length: 1.0,
                a_index: 0,
                b_index: 1,
                points_offset: 1,
                points_count: 2,
            }],
            points_data: vec![0.0, 0.0, 1.0, 0.0],
        };
        assert!(blob.validate().is_err());
    }
}
