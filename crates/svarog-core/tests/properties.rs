//! Property tests for structural invariants.

use proptest::prelude::*;
use svarog_core::index::hnsw::LevelAssigner;
use svarog_core::{DistanceMetric, HnswIndex, MemoryHnsw};

fn small_vectors() -> impl Strategy<Value = Vec<Vec<f32>>> {
    prop::collection::vec(
        prop::collection::vec(-1.0_f32..1.0, 4),
        1..60,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn level_assignment_is_a_pure_function(id in ".{0,40}", m in 2_usize..64) {
        #[allow(clippy::cast_precision_loss)]
        let lambda = 1.0 / (m as f64).ln();
        let a = LevelAssigner::new(lambda);
        let b = LevelAssigner::new(lambda);
        prop_assert_eq!(a.assign(&id), b.assign(&id));
    }

    #[test]
    fn degree_caps_hold_for_any_input(vectors in small_vectors()) {
        let store = std::sync::Arc::new(svarog_core::MemoryGraph::new());
        let index = HnswIndex::builder(4, DistanceMetric::Euclidean)
            .m(3)
            .ef_construction(8)
            .store(store.clone() as std::sync::Arc<dyn svarog_core::GraphStore>)
            .build()
            .unwrap();

        for (i, vector) in vectors.iter().enumerate() {
            index.insert(&format!("v{i}"), vector.clone()).unwrap();
        }

        use svarog_core::GraphStore;
        for v in store.vertex_ids() {
            for layer in 0..=8 {
                let edge_type = format!("VectorNear{layer}");
                let cap = if layer == 0 { 6 } else { 3 };
                prop_assert!(store.out_degree(v, &edge_type).unwrap() <= cap);
            }
        }

        let entry = index.entry_point().unwrap();
        let entry_level = index
            .vertex(entry)
            .unwrap()
            .property("vectorMaxLevel")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0);

        for i in 0..vectors.len() {
            let v = index.resolve(&format!("v{i}")).unwrap().unwrap();
            let record = index.vertex(v).unwrap();
            let level = record
                .property("vectorMaxLevel")
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(0);
            prop_assert!(level <= entry_level);
        }
    }

    #[test]
    fn search_never_returns_the_query_vertex(vectors in small_vectors()) {
        let index = HnswIndex::builder(4, DistanceMetric::Euclidean)
            .m(3)
            .ef_construction(8)
            .build()
            .unwrap();

        for (i, vector) in vectors.iter().enumerate() {
            index.insert(&format!("v{i}"), vector.clone()).unwrap();
        }

        for i in 0..vectors.len().min(10) {
            let id = format!("v{i}");
            let this = index.resolve(&id).unwrap().unwrap();
            for (v, _) in index.find_neighbors(&id, 5).unwrap() {
                prop_assert_ne!(v, this);
            }
        }
    }

    #[test]
    fn memory_and_persistent_levels_agree(count in 1_usize..40) {
        let params = svarog_core::HnswParams::new(2, 5, 8, 8, 10_000).unwrap();
        let origin = MemoryHnsw::new(DistanceMetric::Euclidean, params);
        let index = HnswIndex::builder(2, DistanceMetric::Euclidean)
            .m(5)
            .ef(8)
            .ef_construction(8)
            .build()
            .unwrap();

        for i in 0..count {
            let id = format!("n{i}");
            #[allow(clippy::cast_precision_loss)]
            let vector = vec![i as f32, 0.5];
            origin.insert(&id, vector.clone()).unwrap();
            index.insert(&id, vector).unwrap();
        }

        for i in 0..count {
            let id = format!("n{i}");
            let node = origin.resolve(&id).unwrap();
            let vertex = index.resolve(&id).unwrap().unwrap();
            let persisted = index
                .vertex(vertex)
                .unwrap()
                .property("vectorMaxLevel")
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(0);
            prop_assert_eq!(origin.node_level(node) as u64, persisted);
        }
    }
}
