use inputlab_analysis::{LabConfig, LabError, RecordStore};
use inputlab_core::{Metrics, RateRecord, TestKind, TestRecord, TrajectoryRecord};

fn trajectory_record(n: u64) -> TestRecord {
    TestRecord::Trajectory(TrajectoryRecord {
        metrics: Metrics {
            distance: n * 100,
            speed: n * 10,
            smoothness: 90,
            accuracy: 80,
        },
        sample_count: n as usize,
        timestamp_ms: n,
    })
}

#[test]
fn missing_file_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::load(dir.path().join("records.json"), 5).unwrap();
    assert!(store.is_empty());
    assert_eq!(store.capacity(), 5);
}

#[test]
fn save_then_load_keeps_records_per_kind() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.json");

    let mut store = RecordStore::new(5);
    for n in 1..=3 {
        store.push(trajectory_record(n));
    }
    store.push(TestRecord::KeyRate(RateRecord {
        rate: 4.2,
        max_rate: 6.1,
        count: 42,
        timestamp_ms: 99,
    }));
    store.save(&path).unwrap();
    assert!(!path.with_extension("json.tmp").exists());

    let loaded = RecordStore::load(&path, 5).unwrap();
    assert_eq!(loaded, store);
    assert_eq!(loaded.recent(TestKind::Trajectory).count(), 3);
    assert_eq!(loaded.latest(TestKind::KeyRate).unwrap().timestamp_ms(), 99);
}

#[test]
fn loading_with_smaller_capacity_keeps_newest() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.json");
    let mut store = RecordStore::new(10);
    for n in 1..=8 {
        store.push(trajectory_record(n));
    }
    store.save(&path).unwrap();

    let loaded = RecordStore::load(&path, 5).unwrap();
    let stamps: Vec<u64> = loaded
        .recent(TestKind::Trajectory)
        .map(|r| r.timestamp_ms())
        .collect();
    assert_eq!(stamps, vec![4, 5, 6, 7, 8]);
}

#[test]
fn corrupt_file_is_a_json_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = RecordStore::load(&path, 5).unwrap_err();
    assert!(matches!(err, LabError::Json { .. }));
    assert!(err.to_string().contains("records.json"));
}

#[test]
fn config_file_round_trips_through_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inputlab.json");
    std::fs::write(
        &path,
        r#"{"click_rate": {"duration_ms": 5000}, "history": {"capacity": 3}}"#,
    )
    .unwrap();
    let config = LabConfig::load(&path).unwrap();
    assert_eq!(config.click_rate.duration_ms, 5000);
    assert_eq!(config.click_rate.window_ms, 1000);
    assert_eq!(config.history.capacity, 3);

    std::fs::write(&path, r#"{"history": {"capacity": 0}}"#).unwrap();
    assert!(matches!(LabConfig::load(&path), Err(LabError::Config(_))));
}
