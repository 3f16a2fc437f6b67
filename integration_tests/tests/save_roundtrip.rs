mod common;

use common::reference_world;
use core_world::{PlayerPlacement, TimeSpeed, World};
use glam::Vec2;
use world_proto::{DecodedRecord, SaveError, HEADER_SIZE};

#[test]
fn full_world_survives_the_round_trip() {
    let mut world = reference_world(true);
    world.set_time_speed(TimeSpeed::Quadruple);
    world.tick(50.0);
    world.tick(2_050.0);
    if !world.settlements().is_empty() {
        let home = world.settlements()[0].position;
        world.set_player(Some(PlayerPlacement {
            position: home + Vec2::new(0.25, -0.5),
            settlement: Some(0),
        }));
    }

    let bytes = world.encode(1_700_000_000_123).expect("encode");
    let loaded = World::decode(&bytes).expect("decode");

    assert_eq!(world.height_field().values(), loaded.height_field().values());
    assert_eq!(world.settlements(), loaded.settlements());
    assert_eq!(world.roads(), loaded.roads());
    assert_eq!(world.islands().ids, loaded.islands().ids);
    assert_eq!(world.total_days(), loaded.total_days());
    assert_eq!(world.time_speed(), loaded.time_speed());
    assert_eq!(world.player(), loaded.player());

    // Load and re-save without touching anything: byte-for-byte equal.
    let resaved = loaded.encode(1_700_000_000_123).expect("re-encode");
    assert_eq!(bytes, resaved);
}

#[test]
fn record_size_is_dominated_by_the_heightmap() {
    let world = reference_world(false);
    let record = world.save_record(0);
    let cells = (world.config().width * world.config().height) as usize;
    assert_eq!(record.heightmap.len(), 4 * cells);
    assert_eq!(
        record.roads.points_data.len(),
        world.roads().iter().map(|r| r.points.len() * 2).sum::<usize>()
    );
}

#[test]
fn version_field_round_trips_as_two() {
    let world = reference_world(false);
    let bytes = world.encode(9).expect("encode");
    match world_proto::decode_record(&bytes).expect("decode") {
        DecodedRecord::V2(record) => assert_eq!(record.version, 2),
        DecodedRecord::V1(_) => panic!("writers must always emit version 2"),
    }
}

#[test]
fn corrupted_blob_is_rejected_loudly() {
    let world = reference_world(false);
    let mut bytes = world.encode(9).expect("encode");
    let mid = HEADER_SIZE + (bytes.len() - HEADER_SIZE) / 2;
    bytes[mid] ^= 0x55;
    match World::decode(&bytes) {
        Err(core_world::LoadError::Format(SaveError::ChecksumMismatch { .. })) => {}
        other => panic!("expected a checksum failure, got {other:?}"),
    }
}

#[test]
fn truncated_blob_is_rejected_loudly() {
    let world = reference_world(false);
    let bytes = world.encode(9).expect("encode");
    assert!(World::decode(&bytes[..bytes.len() / 2]).is_err());
    assert!(World::decode(&bytes[..10]).is_err());
}
