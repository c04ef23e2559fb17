//! Per-polygon totals and the keyed response mapping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Final total for one polygon of the input geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PolygonResult {
    /// Position of the polygon in the input collection.
    pub index: usize,
    /// Summed counter of every cell inside the polygon.
    pub total: u64,
}

/// Mapping from polygon index (stringified) to its total.
///
/// Serializes as a flat JSON object, e.g. `{"0": 1523, "1": 0}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export, export_to = "bindings/")]
pub struct CountsResponse(pub BTreeMap<String, u64>);

impl CountsResponse {
    /// Create an empty response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the total of one polygon, replacing any earlier entry.
    pub fn record(&mut self, result: PolygonResult) {
        self.0.insert(result.index.to_string(), result.total);
    }

    /// Total recorded for the polygon at `index`.
    pub fn get(&self, index: usize) -> Option<u64> {
        self.0.get(&index.to_string()).copied()
    }

    /// Number of polygons recorded.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<PolygonResult> for CountsResponse {
    fn from_iter<I: IntoIterator<Item = PolygonResult>>(iter: I) -> Self {
        let mut response = Self::new();
        for result in iter {
            response.record(result);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_index_keyed_object() {
        let response: CountsResponse = [
            PolygonResult { index: 0, total: 1523 },
            PolygonResult { index: 1, total: 0 },
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_value(&response).unwrap_or_default();
        assert_eq!(json, serde_json::json!({"0": 1523, "1": 0}));
        assert_eq!(response.get(0), Some(1523));
        assert_eq!(response.get(2), None);
    }

    #[test]
    fn insertion_order_is_irrelevant() {
        let forward: CountsResponse = [
            PolygonResult { index: 0, total: 5 },
            PolygonResult { index: 1, total: 7 },
        ]
        .into_iter()
        .collect();
        let backward: CountsResponse = [
            PolygonResult { index: 1, total: 7 },
            PolygonResult { index: 0, total: 5 },
        ]
        .into_iter()
        .collect();
        assert_eq!(forward, backward);
    }
}
