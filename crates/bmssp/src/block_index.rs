use crate::label::Label;

const DEFAULT_SEED: u64 = 0x5EED_B10C;

#[derive(Clone, Copy)]
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

type Link = Option<Box<Node>>;

struct Node {
    label: Label,
    id: usize,
    priority: u64,
    left: Link,
    right: Link,
}

/// Treap over D1 blocks keyed by `(upper bound, block id)`.
///
/// `lower_bound` answers "smallest block whose upper bound is at least this
/// label"; the id only breaks ties between blocks sharing an upper bound.
/// Priorities come from a deterministic xorshift generator, which is enough
/// for the expected logarithmic height.
pub(crate) struct BlockIndex {
    root: Link,
    rng: XorShift64,
}

impl BlockIndex {
    pub fn new() -> Self {
        Self {
            root: None,
            rng: XorShift64::new(DEFAULT_SEED),
        }
    }

    pub fn insert(&mut self, label: Label, id: usize) {
        let node = Box::new(Node {
            label,
            id,
            priority: self.rng.next_u64(),
            left: None,
            right: None,
        });
        self.root = insert_node(self.root.take(), node);
    }

    pub fn delete(&mut self, label: Label, id: usize) {
        self.root = delete_node(self.root.take(), label, id);
    }

    /// Smallest `(upper, id)` key with `upper >= label`, probing below every
    /// real block id.
    pub fn lower_bound(&self, label: Label) -> Option<usize> {
        let mut node = self.root.as_deref();
        let mut best = None;
        while let Some(n) = node {
            if n.label < label {
                node = n.right.as_deref();
            } else {
                best = Some(n.id);
                node = n.left.as_deref();
            }
        }
        best
    }
}

#[inline]
fn key_less(a: Label, a_id: usize, b: Label, b_id: usize) -> bool {
    if a < b {
        return true;
    }
    if b < a {
        return false;
    }
    a_id < b_id
}

fn insert_node(root: Link, node: Box<Node>) -> Link {
    let Some(mut root) = root else {
        return Some(node);
    };
    if key_less(node.label, node.id, root.label, root.id) {
        root.left = insert_node(root.left.take(), node);
        if root.left.as_ref().is_some_and(|l| l.priority < root.priority) {
            return Some(rotate_right(root));
        }
    } else {
        root.right = insert_node(root.right.take(), node);
        if root.right.as_ref().is_some_and(|r| r.priority < root.priority) {
            return Some(rotate_left(root));
        }
    }
    Some(root)
}

fn delete_node(root: Link, label: Label, id: usize) -> Link {
    let mut root = root?;
    if key_less(label, id, root.label, root.id) {
        root.left = delete_node(root.left.take(), label, id);
        return Some(root);
    }
    if key_less(root.label, root.id, label, id) {
        root.right = delete_node(root.right.take(), label, id);
        return Some(root);
    }
    merge_nodes(root.left.take(), root.right.take())
}

fn merge_nodes(left: Link, right: Link) -> Link {
    match (left, right) {
        (None, right) => right,
        (left, None) => left,
        (Some(mut left), Some(mut right)) => {
            if left.priority < right.priority {
                left.right = merge_nodes(left.right.take(), Some(right));
                Some(left)
            } else {
                right.left = merge_nodes(Some(left), right.left.take());
                Some(right)
            }
        }
    }
}

fn rotate_right(mut y: Box<Node>) -> Box<Node> {
    let mut x = y.left.take().expect("rotate_right requires a left child");
    y.left = x.right.take();
    x.right = Some(y);
    x
}

fn rotate_left(mut x: Box<Node>) -> Box<Node> {
    let mut y = x.right.take().expect("rotate_left requires a right child");
    x.right = y.left.take();
    y.left = Some(x);
    y
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use rand::Rng;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::BlockIndex;
    use crate::label::Label;

    fn label(dist: u32) -> Label {
        Label::new(dist as f64, 0, dist)
    }

    #[test]
    fn lower_bound_picks_smallest_qualifying_key() {
        let mut index = BlockIndex::new();
        index.insert(label(10), 1);
        index.insert(label(20), 2);
        index.insert(label(30), 3);

        assert_eq!(index.lower_bound(label(5)), Some(1));
        assert_eq!(index.lower_bound(label(10)), Some(1));
        assert_eq!(index.lower_bound(label(11)), Some(2));
        assert_eq!(index.lower_bound(label(30)), Some(3));
        assert_eq!(index.lower_bound(label(31)), None);
    }

    #[test]
    fn equal_labels_break_ties_by_id() {
        let mut index = BlockIndex::new();
        index.insert(label(10), 7);
        index.insert(label(10), 3);
        assert_eq!(index.lower_bound(label(10)), Some(3));
        index.delete(label(10), 3);
        assert_eq!(index.lower_bound(label(10)), Some(7));
    }

    #[test]
    fn randomized_matches_btree_model() {
        let mut rng = StdRng::seed_from_u64(0xB10C_5EED);
        let mut index = BlockIndex::new();
        let mut model: BTreeSet<(u32, usize)> = BTreeSet::new();

        for _ in 0..4000 {
            match rng.random_range(0..3) {
                0 => {
                    let d = rng.random_range(0..500_u32);
                    let id = rng.random_range(0..64_usize);
                    if model.insert((d, id)) {
                        index.insert(label(d), id);
                    }
                }
                1 => {
                    if let Some(&(d, id)) = model.iter().nth(rng.random_range(0..model.len().max(1)))
                    {
                        model.remove(&(d, id));
                        index.delete(label(d), id);
                    }
                }
                _ => {
                    let probe = rng.random_range(0..520_u32);
                    let expected = model.range((probe, 0)..).next().map(|&(_, id)| id);
                    assert_eq!(index.lower_bound(label(probe)), expected);
                }
            }
        }
    }
}
