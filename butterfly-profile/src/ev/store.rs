//! Contiguous per-edge flags
//!
//! Real graphs keep flags inside their own edge storage; this is the minimal owner
//! used by batch imports and tests. Edge `i` owns words
//! `i * words_per_edge .. (i + 1) * words_per_edge`.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeFlagsStore {
    words_per_edge: usize,
    words: Vec<u32>,
}

impl EdgeFlagsStore {
    pub fn new(words_per_edge: usize, edges: usize) -> Self {
        Self {
            words_per_edge,
            words: vec![0; words_per_edge * edges],
        }
    }

    pub fn words_per_edge(&self) -> usize {
        self.words_per_edge
    }

    /// Number of edges
    pub fn len(&self) -> usize {
        if self.words_per_edge == 0 {
            0
        } else {
            self.words.len() / self.words_per_edge
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a zeroed edge and return its id
    pub fn push_edge(&mut self) -> u32 {
        let id = self.len() as u32;
        self.words.resize(self.words.len() + self.words_per_edge, 0);
        id
    }

    pub fn edge(&self, edge_id: u32) -> &[u32] {
        let start = edge_id as usize * self.words_per_edge;
        &self.words[start..start + self.words_per_edge]
    }

    pub fn edge_mut(&mut self, edge_id: u32) -> &mut [u32] {
        let start = edge_id as usize * self.words_per_edge;
        &mut self.words[start..start + self.words_per_edge]
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.words
    }

    pub fn as_mut_slice(&mut self) -> &mut [u32] {
        &mut self.words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_are_disjoint() {
        let mut store = EdgeFlagsStore::new(2, 3);
        store.edge_mut(1)[0] = 7;
        store.edge_mut(2)[1] = 9;
        assert_eq!(store.edge(0), &[0, 0]);
        assert_eq!(store.edge(1), &[7, 0]);
        assert_eq!(store.edge(2), &[0, 9]);
        assert_eq!(store.as_slice().len(), 6);
    }

    #[test]
    fn test_push_edge() {
        let mut store = EdgeFlagsStore::new(3, 0);
        assert!(store.is_empty());
        assert_eq!(store.push_edge(), 0);
        assert_eq!(store.push_edge(), 1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.edge(1).len(), 3);
    }
}
