use std::collections::HashMap;

use crate::compare::DuplicateEdge;

/// A transitively-closed set of images judged to be the same shot.
/// `members` is sorted; `edges` are the duplicate edges between members, in
/// the order the comparator emitted them.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    pub members: Vec<usize>,
    pub edges: Vec<DuplicateEdge>,
}

/// Plain union-find with path halving.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[rb] = ra;
        }
    }
}

/// Close the duplicate edges transitively: if A~B and B~C then A, B and C
/// land in one group even though A and C were never directly matched.
/// Singleton images are not materialized as groups.
pub fn group_edges(image_count: usize, edges: &[DuplicateEdge]) -> Vec<DuplicateGroup> {
    let mut uf = UnionFind::new(image_count);
    for edge in edges {
        uf.union(edge.a, edge.b);
    }

    let mut clusters: HashMap<usize, Vec<usize>> = HashMap::new();
    for idx in 0..image_count {
        let root = uf.find(idx);
        clusters.entry(root).or_default().push(idx);
    }

    let mut groups: Vec<DuplicateGroup> = clusters
        .into_values()
        .filter(|members| members.len() > 1)
        .map(|mut members| {
            members.sort_unstable();
            let group_edges = edges
                .iter()
                .filter(|e| members.binary_search(&e.a).is_ok())
                .cloned()
                .collect();
            DuplicateGroup {
                members,
                edges: group_edges,
            }
        })
        .collect();

    // HashMap iteration order is arbitrary; sort for run-to-run determinism.
    groups.sort_by_key(|g| g.members[0]);
    groups
}
