//! Union-Find (disjoint set) data structure.
//!
//! Used by the low-count merger to resolve chained merge targets: when
//! polygon A merges into B and B merges into C, all three collapse into one
//! set whose members are unioned into a single geometry.

use std::collections::HashMap;
use std::hash::Hash;

/// Disjoint-set forest with path compression and union by rank.
#[derive(Debug, Clone, Default)]
pub struct UnionFind<T: Eq + Hash + Clone> {
    parent: HashMap<T, T>,
    rank: HashMap<T, usize>,
}

impl<T: Eq + Hash + Clone> UnionFind<T> {
    /// Create an empty union-find.
    pub fn new() -> Self {
        Self {
            parent: HashMap::new(),
            rank: HashMap::new(),
        }
    }

    /// Create an empty union-find with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            parent: HashMap::with_capacity(capacity),
            rank: HashMap::with_capacity(capacity),
        }
    }

    /// Add a new singleton set. No-op if the element already exists.
    pub fn make_set(&mut self, item: T) {
        if !self.parent.contains_key(&item) {
            self.parent.insert(item.clone(), item.clone());
            self.rank.insert(item, 0);
        }
    }

    /// Find the representative of the set containing `item`, compressing the
    /// path along the way. Panics if the element was never added.
    pub fn find(&mut self, item: &T) -> T {
        let parent = self.parent[item].clone();
        if parent == *item {
            return parent;
        }
        let root = self.find(&parent);
        self.parent.insert(item.clone(), root.clone());
        root
    }

    /// Merge the sets containing `a` and `b`.
    pub fn union(&mut self, a: &T, b: &T) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return;
        }
        let rank_a = self.rank[&root_a];
        let rank_b = self.rank[&root_b];
        if rank_a < rank_b {
            self.parent.insert(root_a, root_b);
        } else if rank_a > rank_b {
            self.parent.insert(root_b, root_a);
        } else {
            self.parent.insert(root_b, root_a.clone());
            self.rank.insert(root_a, rank_a + 1);
        }
    }

    /// Whether two elements belong to the same set.
    pub fn connected(&mut self, a: &T, b: &T) -> bool {
        self.find(a) == self.find(b)
    }

    /// Group all elements by their set representative.
    pub fn groups(&mut self) -> HashMap<T, Vec<T>> {
        let items: Vec<T> = self.parent.keys().cloned().collect();
        let mut groups: HashMap<T, Vec<T>> = HashMap::new();
        for item in items {
            let root = self.find(&item);
            groups.entry(root).or_default().push(item);
        }
        groups
    }

    /// Number of elements across all sets.
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// Whether the structure contains no elements.
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }
}
