use std::collections::HashMap;
use std::collections::HashSet;

use crate::block_index::BlockIndex;
use crate::label::Label;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct FrontierItem {
    pub vertex: usize,
    pub label: Label,
}

/// Sorted bucket of frontier items with a cached upper-bound label.
///
/// Blocks live in a slab owned by the frontier; list membership is encoded
/// through `prev`/`next` slab indices so splits never invalidate handles.
/// A slab index is only reused after the block has left both lists and the
/// block index, so `(upper, id)` keys stay unambiguous while indexed.
#[derive(Debug)]
struct Block {
    items: Vec<FrontierItem>,
    upper: Label,
    prev: Option<usize>,
    next: Option<usize>,
    in_d0: bool,
}

impl Block {
    fn recompute_upper(&mut self) {
        self.upper = match self.items.last() {
            Some(item) => item.label,
            None => Label::INFINITY,
        };
    }
}

#[derive(Debug, Default)]
struct BlockList {
    head: Option<usize>,
    tail: Option<usize>,
}

impl BlockList {
    fn append(&mut self, blocks: &mut [Block], id: usize) {
        blocks[id].prev = self.tail;
        blocks[id].next = None;
        match self.tail {
            Some(tail) => blocks[tail].next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
    }

    fn insert_after(&mut self, blocks: &mut [Block], at: usize, id: usize) {
        blocks[id].prev = Some(at);
        blocks[id].next = blocks[at].next;
        match blocks[at].next {
            Some(next) => blocks[next].prev = Some(id),
            None => self.tail = Some(id),
        }
        blocks[at].next = Some(id);
    }

    fn remove(&mut self, blocks: &mut [Block], id: usize) {
        match blocks[id].prev {
            Some(prev) => blocks[prev].next = blocks[id].next,
            None => self.head = blocks[id].next,
        }
        match blocks[id].next {
            Some(next) => blocks[next].prev = blocks[id].prev,
            None => self.tail = blocks[id].prev,
        }
        blocks[id].prev = None;
        blocks[id].next = None;
    }

    /// Links `ids` in order and attaches the run in front of the current
    /// head, so `ids[0]` becomes the new head.
    fn prepend_run(&mut self, blocks: &mut [Block], ids: &[usize]) {
        let Some((&first, _)) = ids.split_first() else {
            return;
        };
        for window in ids.windows(2) {
            blocks[window[0]].next = Some(window[1]);
            blocks[window[1]].prev = Some(window[0]);
        }
        let last = *ids.last().expect("non-empty run");
        blocks[first].prev = None;
        blocks[last].next = self.head;
        match self.head {
            Some(head) => blocks[head].prev = Some(last),
            None => self.tail = Some(last),
        }
        self.head = Some(first);
    }

    /// Leading blocks whose cumulative item count first reaches `limit`.
    fn prefix(&self, blocks: &[Block], limit: usize) -> (Vec<usize>, usize) {
        let mut ids = Vec::new();
        let mut total = 0;
        let mut cursor = self.head;
        while let Some(id) = cursor {
            if total >= limit {
                break;
            }
            ids.push(id);
            total += blocks[id].items.len();
            cursor = blocks[id].next;
        }
        (ids, total)
    }
}

/// Dual-list, block-partitioned priority structure over frontier items.
///
/// D1 holds individually inserted blocks ordered by upper bound and indexed
/// by the treap; D0 holds batch-prepended blocks at the small-label end and
/// is never indexed. Each vertex has at most one resident item; a better
/// label supersedes, a worse-or-equal one is ignored, and labels at or above
/// `bound` are never admitted.
pub(crate) struct Frontier {
    bound: Label,
    limit: usize,
    blocks: Vec<Block>,
    free: Vec<usize>,
    d0: BlockList,
    d1: BlockList,
    index: BlockIndex,
    values: HashMap<usize, Label>,
    locations: HashMap<usize, usize>,
}

impl Frontier {
    pub fn new(limit: usize, bound: Label) -> Self {
        Self {
            bound,
            limit: limit.max(1),
            blocks: Vec::new(),
            free: Vec::new(),
            d0: BlockList::default(),
            d1: BlockList::default(),
            index: BlockIndex::new(),
            values: HashMap::new(),
            locations: HashMap::new(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn insert(&mut self, vertex: usize, label: Label) {
        if label >= self.bound {
            return;
        }
        if let Some(&existing) = self.values.get(&vertex) {
            if label >= existing {
                return;
            }
            self.remove(vertex);
        }

        let item = FrontierItem { vertex, label };
        let target = if self.d1.head.is_some() {
            self.index.lower_bound(label)
        } else {
            None
        };

        let Some(target) = target else {
            let id = self.allocate_block(vec![item], false);
            self.d1.append(&mut self.blocks, id);
            self.index.insert(self.blocks[id].upper, id);
            self.values.insert(vertex, label);
            self.locations.insert(vertex, id);
            return;
        };

        let old_upper = self.blocks[target].upper;
        let block = &mut self.blocks[target];
        let at = block.items.partition_point(|it| it.label < label);
        block.items.insert(at, item);
        block.recompute_upper();
        self.values.insert(vertex, label);
        self.locations.insert(vertex, target);
        self.update_index(target, old_upper);

        if self.blocks[target].items.len() > self.limit {
            self.split_block(target);
        }
    }

    pub fn batch_prepend(&mut self, items: &[FrontierItem]) {
        let mut filtered = Vec::with_capacity(items.len());
        for &item in items {
            if item.label >= self.bound {
                continue;
            }
            if let Some(&existing) = self.values.get(&item.vertex) {
                if item.label >= existing {
                    continue;
                }
                self.remove(item.vertex);
            }
            filtered.push(item);
        }
        if filtered.is_empty() {
            return;
        }

        // Staging can mention the same vertex more than once; after the sort
        // the first occurrence carries its best label, so later duplicates
        // are dropped to keep the one-item-per-vertex residency.
        filtered.sort_by(|a, b| a.label.cmp(&b.label));
        let mut seen = HashSet::with_capacity(filtered.len());
        filtered.retain(|item| seen.insert(item.vertex));

        let mut ids = Vec::with_capacity(filtered.len().div_ceil(self.limit));
        for chunk in filtered.chunks(self.limit) {
            let id = self.allocate_block(chunk.to_vec(), true);
            for item in chunk {
                self.values.insert(item.vertex, item.label);
                self.locations.insert(item.vertex, id);
            }
            ids.push(id);
        }
        self.d0.prepend_run(&mut self.blocks, &ids);
    }

    /// Removes and returns at most `limit` smallest-label vertices, together
    /// with the next bound: the smallest label still resident, or the
    /// configured bound once drained.
    pub fn pull(&mut self) -> (Label, Vec<usize>) {
        if self.is_empty() {
            return (self.bound, Vec::new());
        }

        let mut result = Vec::with_capacity(self.limit);
        let (blocks0, size0) = self.d0.prefix(&self.blocks, self.limit);
        let (blocks1, size1) = self.d1.prefix(&self.blocks, self.limit);

        if size0 + size1 <= self.limit {
            self.remove_prefix(ListKind::D0, &blocks0, &mut result);
            self.remove_prefix(ListKind::D1, &blocks1, &mut result);
            return (self.next_bound(), result);
        }

        let mut candidates = Vec::with_capacity(size0 + size1);
        for &id in blocks0.iter().chain(&blocks1) {
            candidates.extend_from_slice(&self.blocks[id].items);
        }
        candidates.sort_by(|a, b| a.label.cmp(&b.label));
        let cutoff = candidates[self.limit - 1].label;

        self.remove_up_to_cutoff(ListKind::D0, &blocks0, cutoff, &mut result);
        self.remove_up_to_cutoff(ListKind::D1, &blocks1, cutoff, &mut result);
        result.truncate(self.limit);

        (self.next_bound(), result)
    }

    fn allocate_block(&mut self, mut items: Vec<FrontierItem>, in_d0: bool) -> usize {
        items.sort_by(|a, b| a.label.cmp(&b.label));
        match self.free.pop() {
            Some(id) => {
                let block = &mut self.blocks[id];
                block.items = items;
                block.in_d0 = in_d0;
                block.prev = None;
                block.next = None;
                block.recompute_upper();
                id
            }
            None => {
                let id = self.blocks.len();
                let mut block = Block {
                    items,
                    upper: Label::INFINITY,
                    prev: None,
                    next: None,
                    in_d0,
                };
                block.recompute_upper();
                self.blocks.push(block);
                id
            }
        }
    }

    /// Drops an emptied or wholly pulled block from its list (and the index
    /// for D1) and recycles the slab slot.
    fn release_block(&mut self, kind: ListKind, id: usize) {
        match kind {
            ListKind::D0 => self.d0.remove(&mut self.blocks, id),
            ListKind::D1 => {
                self.d1.remove(&mut self.blocks, id);
                self.index.delete(self.blocks[id].upper, id);
            }
        }
        self.blocks[id].items.clear();
        self.free.push(id);
    }

    fn split_block(&mut self, id: usize) {
        if self.blocks[id].items.len() <= self.limit {
            return;
        }
        let old_upper = self.blocks[id].upper;
        let mid = self.blocks[id].items.len() / 2;
        let right_items = self.blocks[id].items.split_off(mid);
        self.blocks[id].recompute_upper();
        self.update_index(id, old_upper);

        let right = self.allocate_block(right_items, false);
        self.d1.insert_after(&mut self.blocks, id, right);
        self.index.insert(self.blocks[right].upper, right);
        for i in 0..self.blocks[right].items.len() {
            let vertex = self.blocks[right].items[i].vertex;
            self.locations.insert(vertex, right);
        }
    }

    fn update_index(&mut self, id: usize, old_upper: Label) {
        if self.blocks[id].in_d0 || self.blocks[id].upper == old_upper {
            return;
        }
        self.index.delete(old_upper, id);
        self.index.insert(self.blocks[id].upper, id);
    }

    fn remove(&mut self, vertex: usize) {
        let Some(id) = self.locations.remove(&vertex) else {
            return;
        };
        let label = self
            .values
            .remove(&vertex)
            .expect("location without value");

        let old_upper = self.blocks[id].upper;
        let block = &mut self.blocks[id];
        let at = block.items.partition_point(|it| it.label < label);
        debug_assert!(at < block.items.len() && block.items[at].vertex == vertex);
        block.items.remove(at);

        if self.blocks[id].items.is_empty() {
            let kind = if self.blocks[id].in_d0 {
                ListKind::D0
            } else {
                ListKind::D1
            };
            self.release_block(kind, id);
            return;
        }
        self.blocks[id].recompute_upper();
        self.update_index(id, old_upper);
    }

    fn remove_prefix(&mut self, kind: ListKind, ids: &[usize], result: &mut Vec<usize>) {
        for &id in ids {
            for i in 0..self.blocks[id].items.len() {
                let vertex = self.blocks[id].items[i].vertex;
                self.values.remove(&vertex);
                self.locations.remove(&vertex);
                result.push(vertex);
            }
            self.release_block(kind, id);
        }
    }

    fn remove_up_to_cutoff(
        &mut self,
        kind: ListKind,
        ids: &[usize],
        cutoff: Label,
        result: &mut Vec<usize>,
    ) {
        for &id in ids {
            let split = self.blocks[id].items.partition_point(|it| it.label <= cutoff);
            if split == 0 {
                continue;
            }
            for i in 0..split {
                let vertex = self.blocks[id].items[i].vertex;
                self.values.remove(&vertex);
                self.locations.remove(&vertex);
                result.push(vertex);
            }
            if split >= self.blocks[id].items.len() {
                self.release_block(kind, id);
                continue;
            }
            // Dropping a prefix leaves the last item, and with it the cached
            // upper bound, in place.
            self.blocks[id].items.drain(..split);
        }
    }

    fn next_bound(&self) -> Label {
        let mut bound = self.bound;
        if let Some(head) = self.d0.head {
            bound = self.blocks[head].items[0].label;
        }
        if let Some(head) = self.d1.head {
            let candidate = self.blocks[head].items[0].label;
            if self.d0.head.is_none() || candidate < bound {
                bound = candidate;
            }
        }
        bound
    }
}

#[derive(Clone, Copy)]
enum ListKind {
    D0,
    D1,
}

#[cfg(test)]
mod tests {
    use rand::Rng;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::Frontier;
    use super::FrontierItem;
    use crate::label::Label;

    fn label(dist: f64, vertex: usize) -> Label {
        Label::new(dist, 0, vertex as u32)
    }

    fn item(dist: f64, vertex: usize) -> FrontierItem {
        FrontierItem {
            vertex,
            label: label(dist, vertex),
        }
    }

    #[test]
    fn insert_ignores_labels_at_or_above_bound() {
        let mut f = Frontier::new(4, label(10.0, 0));
        f.insert(1, label(10.0, 1));
        f.insert(2, label(12.0, 2));
        assert!(f.is_empty());

        f.insert(3, label(9.0, 3));
        assert!(!f.is_empty());
    }

    #[test]
    fn better_label_supersedes_worse_is_ignored() {
        let mut f = Frontier::new(4, Label::INFINITY);
        f.insert(7, label(10.0, 7));
        f.insert(7, label(12.0, 7));
        f.insert(7, label(8.0, 7));

        let (_, pulled) = f.pull();
        assert_eq!(pulled, vec![7]);
        assert!(f.is_empty());
    }

    #[test]
    fn pull_returns_bound_when_empty() {
        let bound = label(42.0, 0);
        let mut f = Frontier::new(2, bound);
        let (next, pulled) = f.pull();
        assert_eq!(next, bound);
        assert!(pulled.is_empty());
    }

    #[test]
    fn pull_reports_next_resident_label_as_bound() {
        let mut f = Frontier::new(2, Label::INFINITY);
        f.insert(10, label(10.0, 10));
        f.insert(11, label(11.0, 11));
        f.insert(12, label(12.0, 12));

        let (next, pulled) = f.pull();
        assert_eq!(pulled.len(), 2);
        assert_eq!(next, label(12.0, 12));

        let (next, pulled) = f.pull();
        assert_eq!(pulled, vec![12]);
        assert_eq!(next, Label::INFINITY);
    }

    #[test]
    fn batch_prepend_lands_before_inserted_blocks() {
        let mut f = Frontier::new(3, Label::INFINITY);
        f.insert(10, label(100.0, 10));
        f.insert(11, label(120.0, 11));
        f.insert(12, label(140.0, 12));

        f.batch_prepend(&[item(1.0, 1), item(2.0, 2), item(3.0, 3)]);

        let (next, pulled) = f.pull();
        assert_eq!(pulled.len(), 3);
        assert!(pulled.contains(&1) && pulled.contains(&2) && pulled.contains(&3));
        assert_eq!(next, label(100.0, 10));
    }

    #[test]
    fn batch_prepend_filters_and_dedups() {
        let mut f = Frontier::new(2, label(50.0, 0));
        f.insert(5, label(20.0, 5));

        f.batch_prepend(&[
            item(60.0, 1),  // at/above bound
            item(25.0, 5),  // worse than resident entry
            item(4.0, 6),
            item(3.0, 6),   // duplicate vertex, better label wins
        ]);

        let (_, pulled) = f.pull();
        assert_eq!(pulled.len(), 2);
        assert!(pulled.contains(&5) && pulled.contains(&6));
        assert!(f.is_empty());
    }

    #[test]
    fn drains_inserted_items_in_label_order() {
        let mut rng = StdRng::seed_from_u64(0xF807_1E55);
        for round in 0..20_usize {
            let limit = 1 + (round % 5);
            let mut f = Frontier::new(limit, Label::INFINITY);
            let n = 40 + round;
            let dists: Vec<f64> = (0..n).map(|_| rng.random_range(0.0..100.0)).collect();

            let mut order: Vec<usize> = (0..n).collect();
            for i in (1..n).rev() {
                order.swap(i, rng.random_range(0..=i));
            }
            for &v in &order {
                f.insert(v, label(dists[v], v));
            }

            let mut expected: Vec<usize> = (0..n).collect();
            expected.sort_by(|&a, &b| label(dists[a], a).cmp(&label(dists[b], b)));

            let mut drained = Vec::new();
            let mut last_max = Label::new(0.0, 0, 0);
            while !f.is_empty() {
                let (next, pulled) = f.pull();
                assert!(!pulled.is_empty());
                assert!(pulled.len() <= limit);
                let batch_min = pulled.iter().map(|&v| label(dists[v], v)).min().unwrap();
                let batch_max = pulled.iter().map(|&v| label(dists[v], v)).max().unwrap();
                assert!(last_max <= batch_min, "pulls must be non-decreasing");
                assert!(batch_max < next, "bound must exceed every pulled label");
                last_max = batch_max;
                drained.extend_from_slice(&pulled);
            }
            assert_eq!(drained, expected);
        }
    }
}
