//! Vertex welding over quantized positions.
//!
//! Duplicate vertices are found by sorting an index permutation
//! lexicographically by (x, y, z). Quantized coordinates admit a total
//! order, so identical positions are adjacent after the sort and a single
//! linear pass can assign unique ids. This stays O(N log N) and reuses its
//! scratch arrays across calls instead of building a hash set per mesh.

/// Result of welding one mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniquifiedGeometry {
    /// Unique positions, three u16 coordinates per vertex, in sorted order.
    pub positions: Vec<u16>,
    /// Triangle indices remapped into the unique positions.
    pub indices: Vec<u32>,
    /// Edge indices remapped into the unique positions.
    pub edge_indices: Vec<u32>,
}

/// Reusable vertex welder.
#[derive(Debug, Default)]
pub struct PositionDeduper {
    order: Vec<u32>,
    remap: Vec<u32>,
}

impl PositionDeduper {
    /// Create a welder with empty scratch arrays.
    pub fn new() -> Self {
        Self::default()
    }

    /// Weld duplicate positions and remap `indices`/`edge_indices`.
    ///
    /// Every set of identical input vertices maps to one representative,
    /// the one appearing earliest in sorted order, so the result does not
    /// depend on the input ordering of duplicates.
    pub fn uniquify(
        &mut self,
        positions: &[u16],
        indices: &[u32],
        edge_indices: &[u32],
    ) -> UniquifiedGeometry {
        let n = positions.len() / 3;
        let key = |i: u32| {
            let o = i as usize * 3;
            (positions[o], positions[o + 1], positions[o + 2])
        };

        self.order.clear();
        self.order.extend(0..n as u32);
        self.order.sort_unstable_by_key(|&i| key(i));

        self.remap.clear();
        self.remap.resize(n, 0);

        let mut unique = Vec::with_capacity(positions.len());
        let mut last = None;
        let mut next_id = 0u32;
        for &i in &self.order {
            let k = key(i);
            if last != Some(k) {
                let o = i as usize * 3;
                unique.extend_from_slice(&positions[o..o + 3]);
                last = Some(k);
                next_id += 1;
            }
            self.remap[i as usize] = next_id - 1;
        }

        UniquifiedGeometry {
            positions: unique,
            indices: indices.iter().map(|&i| self.remap[i as usize]).collect(),
            edge_indices: edge_indices
                .iter()
                .map(|&i| self.remap[i as usize])
                .collect(),
        }
    }

    /// Remap table from the most recent [`uniquify`](Self::uniquify) call:
    /// original vertex index to unique vertex index.
    pub fn remap(&self) -> &[u32] {
        &self.remap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniquify_removes_duplicates() {
        // Vertex 2 duplicates vertex 0.
        let positions = [5, 5, 5, 9, 9, 9, 5, 5, 5];
        let indices = [0, 1, 2];
        let out = PositionDeduper::new().uniquify(&positions, &indices, &[]);
        assert_eq!(out.positions, vec![5, 5, 5, 9, 9, 9]);
        assert_eq!(out.indices[0], out.indices[2]);
    }

    #[test]
    fn test_uniquify_round_trip() {
        let positions = [3, 0, 1, 3, 0, 1, 7, 2, 2, 0, 0, 0];
        let indices = [0, 1, 2, 3, 2, 1];
        let mut deduper = PositionDeduper::new();
        let out = deduper.uniquify(&positions, &indices, &[]);
        // Looking up original positions through the remap yields exact equality.
        for (original, &unique_id) in (0..4).zip(deduper.remap()) {
            let o = original * 3;
            let u = unique_id as usize * 3;
            assert_eq!(positions[o..o + 3], out.positions[u..u + 3]);
        }
    }

    #[test]
    fn test_uniquify_idempotent() {
        let positions = [9, 9, 9, 1, 2, 3, 9, 9, 9, 1, 2, 3];
        let indices = [0, 1, 2, 3, 0, 1];
        let mut deduper = PositionDeduper::new();
        let first = deduper.uniquify(&positions, &indices, &[]);
        let second = deduper.uniquify(&first.positions, &first.indices, &first.edge_indices);
        assert_eq!(first, second);
        // Second pass maps every vertex to itself.
        assert_eq!(deduper.remap(), &[0, 1]);
    }

    #[test]
    fn test_uniquify_stable_under_duplicate_permutation() {
        let a = PositionDeduper::new().uniquify(&[4, 4, 4, 8, 8, 8, 4, 4, 4], &[0, 1, 2], &[]);
        let b = PositionDeduper::new().uniquify(&[4, 4, 4, 4, 4, 4, 8, 8, 8], &[0, 2, 1], &[]);
        assert_eq!(a.positions, b.positions);
        assert_eq!(a.indices, b.indices);
    }
}
