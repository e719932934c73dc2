use lora_storage::DeviceRegistry;
use std::sync::Arc;
use std::thread;

#[test]
fn registry_snapshot_lists_known_devices() {
    let registry = DeviceRegistry::new();
    registry.upsert("2CF7F1C04280041D", "greenhouse-1");
    registry.upsert("A840410000000001", "door-1");

    let mut ids = registry.all_known_ids();
    ids.sort();
    assert_eq!(ids, vec!["2CF7F1C04280041D".to_string(), "A840410000000001".to_string()]);

    // 快照不受后续修改影响
    registry.evict("A840410000000001");
    assert_eq!(ids.len(), 2);
    assert_eq!(registry.all_known_ids(), vec!["2CF7F1C04280041D".to_string()]);
}

#[test]
fn concurrent_upserts_report_first_seen_exactly_once() {
    let registry = Arc::new(DeviceRegistry::new());
    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let registry = registry.clone();
            thread::spawn(move || {
                (0..50)
                    .filter(|_| registry.upsert("24E1240000000001", &format!("tilt-{}", worker)))
                    .count()
            })
        })
        .collect();

    let first_seen: usize = handles
        .into_iter()
        .map(|handle| handle.join().expect("worker"))
        .sum();
    assert_eq!(first_seen, 1);
    let labels = registry.labels_for("24E1240000000001").expect("labels");
    assert!(labels.device_name.starts_with("tilt-"));
}

#[test]
fn concurrent_evict_and_upsert_never_expose_partial_records() {
    let registry = Arc::new(DeviceRegistry::new());
    registry.upsert("CACBB80000000001", "rejee");

    let writer = {
        let registry = registry.clone();
        thread::spawn(move || {
            for round in 0..200 {
                if round % 2 == 0 {
                    registry.evict("CACBB80000000001");
                } else {
                    registry.upsert("CACBB80000000001", "rejee");
                }
            }
        })
    };
    for _ in 0..200 {
        if let Some(labels) = registry.labels_for("CACBB80000000001") {
            assert_eq!(labels.device_name, "rejee");
            assert_eq!(labels.device_eui, "CACBB80000000001");
        }
    }
    writer.join().expect("writer");
}
