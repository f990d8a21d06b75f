//! Tests for the `adapter` module

use super::adapter::GraphAdapter;
use super::memory::MemoryGraph;
use super::store::GraphStore;
use super::VertexCache;
use std::sync::Arc;

fn adapter(cache: Option<VertexCache>) -> GraphAdapter {
    let store: Arc<dyn GraphStore> = Arc::new(MemoryGraph::new());
    GraphAdapter::new(store, "Item", "near_", "id", cache)
}

#[test]
fn test_edge_type_naming() {
    let adapter = adapter(None);
    assert_eq!(adapter.edge_type(0), "near_0");
    assert_eq!(adapter.edge_type(12), "near_12");
}

#[test]
fn test_create_then_resolve_by_external_id() {
    let adapter = adapter(None);
    adapter.ensure_id_index().unwrap();

    let v = adapter.create_vertex("doc-1", vec![0.5, 0.5]).unwrap();
    assert_eq!(adapter.vertex_by_external_id("doc-1").unwrap(), Some(v));
    assert_eq!(adapter.vertex_by_external_id("doc-2").unwrap(), None);
    assert_eq!(adapter.read_external_id(v).unwrap(), "doc-1");
}

#[test]
fn test_max_level_defaults_to_zero() {
    let adapter = adapter(None);
    adapter.ensure_id_index().unwrap();
    let v = adapter.create_vertex("doc-1", vec![0.0]).unwrap();

    assert_eq!(adapter.read_max_level(v).unwrap(), 0);
    adapter.write_max_level(v, 4).unwrap();
    assert_eq!(adapter.read_max_level(v).unwrap(), 4);
}

#[test]
fn test_max_level_write_invalidates_cache() {
    let adapter = adapter(Some(VertexCache::new(8)));
    adapter.ensure_id_index().unwrap();
    let v = adapter.create_vertex("doc-1", vec![0.0]).unwrap();

    // Populate the cache, then write through it.
    assert_eq!(adapter.read_max_level(v).unwrap(), 0);
    adapter.write_max_level(v, 2).unwrap();
    assert_eq!(adapter.read_max_level(v).unwrap(), 2);
}

#[test]
fn test_layer_edges() {
    let adapter = adapter(None);
    adapter.ensure_id_index().unwrap();
    let a = adapter.create_vertex("a", vec![0.0]).unwrap();
    let b = adapter.create_vertex("b", vec![1.0]).unwrap();

    adapter.ensure_edge_type(0);
    adapter.add_edge(a, b, 0).unwrap();

    assert_eq!(adapter.out_neighbors(a, 0).unwrap(), vec![b]);
    assert_eq!(adapter.out_degree(a, 0).unwrap(), 1);
    assert_eq!(adapter.out_degree(a, 1).unwrap(), 0);

    adapter.replace_out_edges(a, 0, &[]).unwrap();
    assert_eq!(adapter.out_degree(a, 0).unwrap(), 0);
}

#[test]
fn test_cached_load_returns_same_record() {
    let adapter = adapter(Some(VertexCache::new(8)));
    adapter.ensure_id_index().unwrap();
    let v = adapter.create_vertex("doc-1", vec![0.25, 0.75]).unwrap();

    let first = adapter.read_vector(v).unwrap();
    let second = adapter.read_vector(v).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.vector(), Some(&[0.25, 0.75][..]));
}

#[test]
fn test_delete_vertex_clears_resolution() {
    let adapter = adapter(Some(VertexCache::new(8)));
    adapter.ensure_id_index().unwrap();
    let v = adapter.create_vertex("doc-1", vec![0.0]).unwrap();
    let _ = adapter.load(v).unwrap();

    assert!(adapter.delete_vertex(v).unwrap());
    assert_eq!(adapter.vertex_by_external_id("doc-1").unwrap(), None);
    assert!(adapter.load(v).is_err());
}
