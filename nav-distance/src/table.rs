//! A (possibly partial) precomputed `node -> node -> length` table, treated
//! as an external collaborator's output. This type is just the read/insert
//! surface the oracle needs over it; building or loading the full table is
//! out of scope here.

use std::collections::HashMap;

use nav_core::NodeId;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default)]
pub struct DistanceTable {
    entries: HashMap<(NodeId, NodeId), f64>,
}

impl DistanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from: NodeId, to: NodeId, distance: f64) {
        self.entries.insert((from, to), distance);
    }

    pub fn get(&self, from: NodeId, to: NodeId) -> Option<f64> {
        self.entries.get(&(from, to)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All distances currently in the table, in unspecified order. Used
    /// to derive `D_max` (the maximum finite pairwise distance) when a
    /// precomputed table is available.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.values().copied()
    }
}

impl FromIterator<(NodeId, NodeId, f64)> for DistanceTable {
    fn from_iter<I: IntoIterator<Item = (NodeId, NodeId, f64)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (from, to, distance) in iter {
            table.insert(from, to, distance);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_entry_is_none() {
        let table = DistanceTable::new();
        assert_eq!(table.get(0, 1), None);
    }

    #[test]
    fn insert_then_get_round_trips() {
        let mut table = DistanceTable::new();
        table.insert(3, 7, 42.5);
        assert_eq!(table.get(3, 7), Some(42.5));
        assert_eq!(table.get(7, 3), None);
    }
}
