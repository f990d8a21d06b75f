//! Tests for the persistent `index` module

use super::level::LevelAssigner;
use super::HnswIndex;
use crate::distance::DistanceMetric;
use crate::graph::{GraphStore, MemoryGraph};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

fn tiny_index() -> HnswIndex {
    let index = HnswIndex::builder(2, DistanceMetric::Euclidean)
        .m(2)
        .ef(10)
        .ef_construction(10)
        .build()
        .unwrap();
    index.insert("A", vec![0.0, 0.0]).unwrap();
    index.insert("B", vec![0.0, 1.0]).unwrap();
    index.insert("C", vec![1.0, 0.0]).unwrap();
    index.insert("D", vec![10.0, 10.0]).unwrap();
    index
}

fn external_ids(index: &HnswIndex, found: &[(u64, f32)]) -> Vec<String> {
    found
        .iter()
        .map(|&(v, _)| index.adapter().read_external_id(v).unwrap())
        .collect()
}

#[test]
fn test_empty_index_returns_nothing() {
    let index = HnswIndex::builder(2, DistanceMetric::Euclidean).build().unwrap();
    assert!(index.find_nearest(&[0.0, 0.0], 5).unwrap().is_empty());
    assert!(index.is_empty());
    assert_eq!(index.entry_point(), None);
}

#[test]
fn test_exact_recall_on_tiny_set() {
    let index = tiny_index();

    let found = index.find_nearest(&[0.1, 0.1], 1).unwrap();
    assert_eq!(external_ids(&index, &found), vec!["A"]);

    let neighbors = index.find_neighbors("A", 2).unwrap();
    let ids = external_ids(&index, &neighbors);
    assert_eq!(neighbors.len(), 2);
    assert!(ids.contains(&"B".to_string()));
    assert!(ids.contains(&"C".to_string()));
    assert!((neighbors[0].1 - 1.0).abs() < 1e-6);
    assert!((neighbors[1].1 - 1.0).abs() < 1e-6);
}

#[test]
fn test_find_neighbors_excludes_self() {
    let index = tiny_index();
    for id in ["A", "B", "C", "D"] {
        let ids = external_ids(&index, &index.find_neighbors(id, 4).unwrap());
        assert!(!ids.contains(&id.to_string()), "{id} returned itself");
    }
}

#[test]
fn test_find_neighbors_unknown_id() {
    let index = tiny_index();
    let err = index.find_neighbors("nope", 2).unwrap_err();
    assert_eq!(err.code(), "SVAROG-002");
}

#[test]
fn test_dimension_mismatch_fails_before_mutation() {
    let index = tiny_index();
    let err = index.insert("E", vec![1.0, 2.0, 3.0]).unwrap_err();
    assert_eq!(err.code(), "SVAROG-001");
    assert_eq!(index.len(), 4);
    assert_eq!(index.get("E").unwrap(), None);

    let err = index.find_nearest(&[1.0], 1).unwrap_err();
    assert_eq!(err.code(), "SVAROG-001");
}

#[test]
fn test_duplicate_external_id_rejected() {
    let index = tiny_index();
    let err = index.insert("A", vec![5.0, 5.0]).unwrap_err();
    assert_eq!(err.code(), "SVAROG-003");
    assert_eq!(index.len(), 4);
}

#[test]
fn test_add_is_idempotent() {
    let index = tiny_index();
    let vertex = index.resolve("B").unwrap().unwrap();
    let degree_before = index.adapter().out_degree(vertex, 0).unwrap();

    assert!(index.add(vertex).unwrap());
    assert!(index.add(vertex).unwrap());

    assert_eq!(index.adapter().out_degree(vertex, 0).unwrap(), degree_before);
    assert_eq!(index.len(), 4);
}

#[test]
fn test_get_and_remove() {
    let index = tiny_index();

    let record = index.get("C").unwrap().expect("C is indexed");
    assert_eq!(record.vector(), Some(&[1.0, 0.0][..]));
    assert_eq!(index.get("zzz").unwrap(), None);

    assert!(index.remove("C").unwrap());
    assert!(!index.remove("C").unwrap());
    assert_eq!(index.get("C").unwrap(), None);
    assert_eq!(index.len(), 3);

    let ids = external_ids(&index, &index.find_nearest(&[1.0, 0.0], 3).unwrap());
    assert!(!ids.contains(&"C".to_string()));
}

#[test]
fn test_entry_point_promotion() {
    let assigner = LevelAssigner::new(1.0 / 16.0_f64.ln());
    let flat_id = (0..)
        .map(|i| format!("flat-{i}"))
        .find(|id| assigner.assign(id) == 0)
        .unwrap();
    let tall_id = (0..)
        .map(|i| format!("tall-{i}"))
        .find(|id| assigner.assign(id) >= 1)
        .unwrap();

    let index = HnswIndex::builder(2, DistanceMetric::Euclidean)
        .m(16)
        .build()
        .unwrap();

    let first = index.insert(&flat_id, vec![0.0, 0.0]).unwrap();
    assert_eq!(index.entry_point(), Some(first));

    let second = index.insert(&tall_id, vec![1.0, 1.0]).unwrap();
    assert_eq!(index.entry_point(), Some(second));
    assert!(
        index.adapter().read_max_level(second).unwrap()
            > index.adapter().read_max_level(first).unwrap()
    );
}

#[test]
fn test_entry_point_reassigned_on_remove() {
    let index = HnswIndex::builder(2, DistanceMetric::Euclidean)
        .m(4)
        .build()
        .unwrap();
    for i in 0..30_u8 {
        index
            .insert(&format!("p{i}"), vec![f32::from(i), f32::from(i) * 0.5])
            .unwrap();
    }

    let entry = index.entry_point().unwrap();
    let entry_id = index.adapter().read_external_id(entry).unwrap();
    assert!(index.remove(&entry_id).unwrap());

    let successor = index.entry_point().expect("graph is not empty");
    assert_ne!(successor, entry);

    // The successor carries the maximum remaining level.
    let successor_level = index.adapter().read_max_level(successor).unwrap();
    for v in index.adapter().vertex_ids() {
        assert!(index.adapter().read_max_level(v).unwrap() <= successor_level);
    }

    assert_eq!(index.find_nearest(&[3.0, 1.5], 5).unwrap().len(), 5);
}

#[test]
fn test_degree_caps_hold() {
    let index = HnswIndex::builder(4, DistanceMetric::Euclidean)
        .m(4)
        .ef_construction(24)
        .build()
        .unwrap();
    let mut rng = StdRng::seed_from_u64(3);

    for i in 0..150 {
        let vector: Vec<f32> = (0..4).map(|_| rng.gen_range(-1.0..1.0)).collect();
        index.insert(&format!("v{i}"), vector).unwrap();
    }

    for v in index.adapter().vertex_ids() {
        let top = index.adapter().read_max_level(v).unwrap();
        for level in 0..=top {
            let cap = if level == 0 { 8 } else { 4 };
            assert!(index.adapter().out_degree(v, level).unwrap() <= cap);
        }
    }
}

#[test]
fn test_edges_stay_within_levels() {
    let index = HnswIndex::builder(4, DistanceMetric::Euclidean)
        .m(4)
        .build()
        .unwrap();
    let mut rng = StdRng::seed_from_u64(17);

    for i in 0..120 {
        let vector: Vec<f32> = (0..4).map(|_| rng.gen_range(-1.0..1.0)).collect();
        index.insert(&format!("v{i}"), vector).unwrap();
    }

    for v in index.adapter().vertex_ids() {
        let top = index.adapter().read_max_level(v).unwrap();
        for level in 0..=top {
            for n in index.adapter().out_neighbors(v, level).unwrap() {
                assert!(index.adapter().read_max_level(n).unwrap() >= level);
            }
        }
    }
}

#[test]
fn test_larger_ef_does_not_worsen_results() {
    let index = HnswIndex::builder(8, DistanceMetric::Euclidean)
        .m(4)
        .ef_construction(16)
        .build()
        .unwrap();
    let mut rng = StdRng::seed_from_u64(29);

    for i in 0..300 {
        let vector: Vec<f32> = (0..8).map(|_| rng.gen_range(-1.0..1.0)).collect();
        index.insert(&format!("v{i}"), vector).unwrap();
    }

    let query: Vec<f32> = (0..8).map(|_| rng.gen_range(-1.0..1.0)).collect();

    index.set_ef(8);
    let narrow: f32 = index
        .find_nearest(&query, 10)
        .unwrap()
        .iter()
        .map(|&(_, d)| d)
        .sum();

    index.set_ef(128);
    let wide: f32 = index
        .find_nearest(&query, 10)
        .unwrap()
        .iter()
        .map(|&(_, d)| d)
        .sum();

    assert!(wide <= narrow + 1e-5);
}

#[test]
fn test_descriptor_reopen() {
    let store: Arc<MemoryGraph> = Arc::new(MemoryGraph::new());
    let index = HnswIndex::builder(2, DistanceMetric::Euclidean)
        .m(2)
        .ef(10)
        .ef_construction(10)
        .store(store.clone() as Arc<dyn GraphStore>)
        .build()
        .unwrap();
    index.insert("A", vec![0.0, 0.0]).unwrap();
    index.insert("B", vec![0.0, 1.0]).unwrap();
    index.set_ef(33);

    let descriptor = index.to_descriptor();
    drop(index);

    let reopened = HnswIndex::open(store as Arc<dyn GraphStore>, &descriptor, None).unwrap();
    assert_eq!(reopened.dimensions(), 2);
    assert_eq!(reopened.m(), 2);
    assert_eq!(reopened.ef(), 33);
    assert!(reopened.entry_point().is_some());

    let found = reopened.find_nearest(&[0.0, 0.9], 1).unwrap();
    assert_eq!(external_ids(&reopened, &found), vec!["B"]);
}

#[test]
fn test_accessors() {
    let index = HnswIndex::builder(16, DistanceMetric::Cosine)
        .m(8)
        .ef(20)
        .ef_construction(40)
        .max_item_count(9_999)
        .build()
        .unwrap();

    assert_eq!(index.dimensions(), 16);
    assert_eq!(index.m(), 8);
    assert_eq!(index.ef(), 20);
    assert_eq!(index.ef_construction(), 40);
    assert_eq!(index.max_item_count(), 9_999);
    assert_eq!(index.metric(), DistanceMetric::Cosine);

    index.set_ef(64);
    assert_eq!(index.ef(), 64);
}

#[test]
fn test_max_item_count_is_advisory() {
    let index = HnswIndex::builder(2, DistanceMetric::Euclidean)
        .max_item_count(2)
        .build()
        .unwrap();
    for i in 0..5_u8 {
        index
            .insert(&format!("v{i}"), vec![f32::from(i), 0.0])
            .unwrap();
    }
    assert_eq!(index.len(), 5);
}
