//! The serialized parameter descriptor.
//!
//! An index serializes as a flat JSON object of parameters; the graph itself
//! lives in the storage engine and is never part of the descriptor. Key
//! names are part of the on-disk contract and must not change. The distance
//! function and the comparator are stored as registry names and resolved
//! through [`DistanceMetric::from_name`] / [`DistanceComparator::from_name`]
//! on load.

use crate::distance::{DistanceComparator, DistanceMetric};
use crate::error::{Error, Result};
use crate::graph::VertexId;
use crate::index::hnsw::params::HnswParams;
use serde_json::{json, Map, Value};

/// Current descriptor format version.
pub(crate) const DESCRIPTOR_VERSION: u64 = 0;

/// The deserializable state of an index: parameters plus the two mutable
/// fields (`ef`, `entry_point`).
#[derive(Debug, Clone)]
pub(crate) struct Descriptor {
    pub params: HnswParams,
    pub metric: DistanceMetric,
    pub comparator: DistanceComparator,
    pub ef: usize,
    pub entry_point: Option<VertexId>,
}

/// Renders a descriptor to its JSON form.
pub(crate) fn write(descriptor: &Descriptor) -> Value {
    let entry_point = descriptor
        .entry_point
        .map_or_else(String::new, |v| v.to_string());

    json!({
        "version": DESCRIPTOR_VERSION,
        "dimensions": descriptor.params.dimensions,
        "distanceFunction": descriptor.metric.name(),
        "distanceComparator": descriptor.comparator.name(),
        "maxItemCount": descriptor.params.max_item_count,
        "m": descriptor.params.m,
        "maxM": descriptor.params.max_m,
        "maxM0": descriptor.params.max_m0,
        "levelLambda": descriptor.params.level_lambda,
        "ef": descriptor.ef,
        "efConstruction": descriptor.params.ef_construction,
        "entryPoint": entry_point,
        "vertexType": descriptor.params.vertex_type,
        "edgeType": descriptor.params.edge_type_prefix,
        "idPropertyName": descriptor.params.id_property,
        "vectorPropertyName": descriptor.params.vector_property,
    })
}

/// Parses a descriptor from its JSON form.
pub(crate) fn read(value: &Value) -> Result<Descriptor> {
    let obj = value
        .as_object()
        .ok_or_else(|| Error::Serialization("descriptor must be a JSON object".to_string()))?;

    let version = get_u64(obj, "version")?;
    if version != DESCRIPTOR_VERSION {
        return Err(Error::Serialization(format!(
            "unsupported descriptor version {version}"
        )));
    }

    let metric = DistanceMetric::from_name(&get_str(obj, "distanceFunction")?)?;
    let comparator = DistanceComparator::from_name(&get_str(obj, "distanceComparator")?)?;

    let dimensions = get_usize(obj, "dimensions")?;
    if dimensions == 0 {
        return Err(Error::Serialization(
            "descriptor dimensions must be positive".to_string(),
        ));
    }

    // Derived fields are taken verbatim from the descriptor rather than
    // recomputed, so an index always reopens with the exact parameters it
    // was built with.
    let params = HnswParams {
        dimensions,
        max_item_count: get_usize(obj, "maxItemCount")?,
        m: get_usize(obj, "m")?,
        max_m: get_usize(obj, "maxM")?,
        max_m0: get_usize(obj, "maxM0")?,
        level_lambda: get_f64(obj, "levelLambda")?,
        ef: get_usize(obj, "ef")?,
        ef_construction: get_usize(obj, "efConstruction")?,
        vertex_type: get_str(obj, "vertexType")?,
        edge_type_prefix: get_str(obj, "edgeType")?,
        id_property: get_str(obj, "idPropertyName")?,
        vector_property: get_str(obj, "vectorPropertyName")?,
    };

    let entry_point = match get_str(obj, "entryPoint")?.as_str() {
        "" => None,
        raw => Some(raw.parse::<VertexId>().map_err(|_| {
            Error::Serialization(format!("malformed entryPoint '{raw}'"))
        })?),
    };

    Ok(Descriptor {
        ef: params.ef,
        params,
        metric,
        comparator,
        entry_point,
    })
}

fn get_u64(obj: &Map<String, Value>, key: &str) -> Result<u64> {
    obj.get(key)
        .and_then(Value::as_u64)
        .ok_or_else(|| Error::Serialization(format!("descriptor key '{key}' missing or not an integer")))
}

#[allow(clippy::cast_possible_truncation)]
fn get_usize(obj: &Map<String, Value>, key: &str) -> Result<usize> {
    Ok(get_u64(obj, key)? as usize)
}

fn get_f64(obj: &Map<String, Value>, key: &str) -> Result<f64> {
    obj.get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| Error::Serialization(format!("descriptor key '{key}' missing or not a number")))
}

fn get_str(obj: &Map<String, Value>, key: &str) -> Result<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::Serialization(format!("descriptor key '{key}' missing or not a string")))
}
