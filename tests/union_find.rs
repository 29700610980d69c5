//! Tests for union_find module

use tasksplit::union_find::UnionFind;

#[test]
fn test_basic_operations() {
    let mut uf: UnionFind<u64> = UnionFind::new();

    uf.make_set(1);
    uf.make_set(2);
    uf.make_set(3);

    assert!(!uf.connected(&1, &2));

    uf.union(&1, &2);
    assert!(uf.connected(&1, &2));
    assert!(!uf.connected(&1, &3));
}

#[test]
fn test_path_compression() {
    let mut uf: UnionFind<u64> = UnionFind::new();

    // Create chain: 1 -> 2 -> 3 -> 4
    for id in 1..=4 {
        uf.make_set(id);
    }
    uf.union(&1, &2);
    uf.union(&2, &3);
    uf.union(&3, &4);

    // After find, all should point to same root
    let root = uf.find(&1);
    assert_eq!(uf.find(&2), root);
    assert_eq!(uf.find(&3), root);
    assert_eq!(uf.find(&4), root);
}

#[test]
fn test_groups() {
    let mut uf: UnionFind<u64> = UnionFind::new();

    for id in 1..=4 {
        uf.make_set(id);
    }
    uf.union(&1, &2);
    uf.union(&3, &4);

    let groups = uf.groups();
    assert_eq!(groups.len(), 2);
    for members in groups.values() {
        assert_eq!(members.len(), 2);
    }
}

#[test]
fn test_make_set_is_idempotent() {
    let mut uf: UnionFind<u64> = UnionFind::new();
    uf.make_set(1);
    uf.make_set(2);
    uf.union(&1, &2);
    uf.make_set(1);
    assert!(uf.connected(&1, &2));
    assert_eq!(uf.len(), 2);
}

#[test]
fn test_union_is_idempotent() {
    let mut uf: UnionFind<u64> = UnionFind::with_capacity(2);
    uf.make_set(1);
    uf.make_set(2);
    uf.union(&1, &2);
    uf.union(&2, &1);
    assert!(uf.connected(&1, &2));
    assert_eq!(uf.groups().len(), 1);
}
