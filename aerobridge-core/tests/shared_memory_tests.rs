//! The external consumer's view: read the sidecar, open the region file,
//! find values at the advertised offsets. Exactly what a Python or C client
//! does, minus the mmap.

use aerobridge_core::shm::{write_sidecar, SharedMemoryPublisher, SIDECAR_NAME};
use aerobridge_core::snapshot::LAYOUT_VERSION;
use aerobridge_core::telemetry::decode_and_apply;
use aerobridge_core::testing::doubles_stream;
use aerobridge_core::registry::registry;

fn sidecar_json(dir: &std::path::Path) -> serde_json::Value {
    let text = std::fs::read_to_string(dir.join(SIDECAR_NAME)).unwrap();
    serde_json::from_str(&text).unwrap()
}

fn entry<'a>(doc: &'a serde_json::Value, name: &str) -> &'a serde_json::Value {
    doc["variables"]
        .as_array()
        .unwrap()
        .iter()
        .find(|v| v["name"] == name)
        .unwrap_or_else(|| panic!("{name} missing from sidecar"))
}

#[test]
fn test_consumer_reads_value_at_advertised_offset() {
    let dir = tempfile::tempdir().unwrap();
    let mut publisher = SharedMemoryPublisher::create_in(dir.path()).unwrap();
    write_sidecar(dir.path()).unwrap();

    let stream = doubles_stream(&[
        ("Aircraft.Altitude", 1066.8),
        ("Aircraft.IndicatedAirspeed", 61.8),
    ]);
    decode_and_apply(publisher.snapshot_mut(), &stream, 123_456);

    // Consumer side: offsets from the file, bytes from the region.
    let doc = sidecar_json(dir.path());
    let region = std::fs::read(publisher.path()).unwrap();

    let altitude = entry(&doc, "Aircraft.Altitude");
    let offset = altitude["byte_offset"].as_u64().unwrap() as usize;
    let raw = f64::from_le_bytes(region[offset..offset + 8].try_into().unwrap());
    assert_eq!(raw, 1066.8);

    // Scalar offsets also follow base + stride * index.
    let base = doc["array_base_offset"].as_u64().unwrap() as usize;
    let stride = doc["stride_bytes"].as_u64().unwrap() as usize;
    let index = altitude["logical_index"].as_u64().unwrap() as usize;
    assert_eq!(offset, base + stride * index);

    // Header fields at their fixed offsets.
    let timestamp = u64::from_le_bytes(region[0..8].try_into().unwrap());
    let data_valid = u32::from_le_bytes(region[8..12].try_into().unwrap());
    let update_counter = u32::from_le_bytes(region[12..16].try_into().unwrap());
    let layout_version = u32::from_le_bytes(region[16..20].try_into().unwrap());
    assert_eq!(timestamp, 123_456);
    assert_eq!(data_valid, 1);
    assert_eq!(update_counter, 1);
    assert_eq!(layout_version, LAYOUT_VERSION);
}

#[test]
fn test_offsets_stable_across_independent_exports() {
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();

    write_sidecar(dir_a.path()).unwrap();
    write_sidecar(dir_b.path()).unwrap();

    let a = std::fs::read(dir_a.path().join(SIDECAR_NAME)).unwrap();
    let b = std::fs::read(dir_b.path().join(SIDECAR_NAME)).unwrap();
    assert_eq!(a, b, "sidecar export is not deterministic");
}

#[test]
fn test_sidecar_covers_whole_registry() {
    let dir = tempfile::tempdir().unwrap();
    write_sidecar(dir.path()).unwrap();
    let doc = sidecar_json(dir.path());

    let reg = registry();
    assert_eq!(doc["count"].as_u64().unwrap() as usize, reg.len());
    for index in 0..reg.len() {
        let def = reg.def(index);
        let e = entry(&doc, def.name);
        assert_eq!(e["logical_index"].as_u64().unwrap() as usize, index);
        assert_eq!(e["message_id"].as_u64().unwrap(), reg.hash_of(index));
    }
}

#[test]
fn test_string_field_span_matches_sidecar() {
    let dir = tempfile::tempdir().unwrap();
    let mut publisher = SharedMemoryPublisher::create_in(dir.path()).unwrap();
    write_sidecar(dir.path()).unwrap();

    let stream = aerobridge_core::codec::encode_stream(&[aerobridge_core::codec::SimMessage::new(
        aerobridge_core::codec::message_hash("Aircraft.NearestAirportIdentifier"),
        0,
        aerobridge_core::codec::MessageValue::Str(b"EDDF".to_vec()),
    )]);
    decode_and_apply(publisher.snapshot_mut(), &stream, 1);

    let doc = sidecar_json(dir.path());
    let region = std::fs::read(publisher.path()).unwrap();

    let e = entry(&doc, "Aircraft.NearestAirportIdentifier");
    let offset = e["byte_offset"].as_u64().unwrap() as usize;
    let length = e["byte_length"].as_u64().unwrap() as usize;
    assert_eq!(length, 8);

    let bytes = &region[offset..offset + length];
    assert_eq!(&bytes[..4], b"EDDF");
    assert_eq!(bytes[4], 0);
    assert_eq!(*bytes.last().unwrap(), 0);
}
