//! Connected components over the pairwise dependency graph.

/// Disjoint-set forest with union by rank and path compression.
pub(crate) struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    pub(crate) fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    pub(crate) fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            let root = self.find(self.parent[x]);
            self.parent[x] = root;
        }
        self.parent[x]
    }

    pub(crate) fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

/// Partition `0..n` into connected components given undirected edges.
///
/// Components are ordered by their smallest member, members ascending, so
/// the grouping is deterministic for a given input order.
pub(crate) fn connected_components(n: usize, edges: &[(usize, usize)]) -> Vec<Vec<usize>> {
    let mut uf = UnionFind::new(n);
    for &(a, b) in edges {
        uf.union(a, b);
    }

    let mut by_root: Vec<Vec<usize>> = Vec::new();
    let mut root_slot = vec![usize::MAX; n];
    for i in 0..n {
        let root = uf.find(i);
        if root_slot[root] == usize::MAX {
            root_slot[root] = by_root.len();
            by_root.push(Vec::new());
        }
        by_root[root_slot[root]].push(i);
    }
    by_root
}
