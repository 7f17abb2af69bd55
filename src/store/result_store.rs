//! Indexed result buffer shared between one producer and many consumers.
//!
//! The store is a leaf component: it has no locking of its own, the owner
//! supplies the lock. Results land at explicit indexes (or append at the
//! next free one) and may arrive out of order. In *filter mode* an arrival
//! ahead of the contiguous tail is buffered aside and only becomes visible
//! once every index below it has arrived, so consumers always observe
//! results in strictly increasing index order no matter the arrival order.
//!
//! ## Key Design Points
//! - `count()` is the length of the longest contiguous prefix available from
//!   index 0, and is monotonically non-decreasing.
//! - A batch with a declared size but no values is a legal placeholder (a
//!   skipped or canceled sub-unit); it advances the logical count without
//!   contributing values.
//! - Iteration is lazy, finite, single-pass and re-callable; each `iter()`
//!   call walks the then-current contents in index order.
//! - Outside filter mode indexes are random access but must not overlap a
//!   previously stored span; overlapping writes are a caller error.

use std::collections::BTreeMap;

use tracing::trace;
use tracing::warn;

/// One stored entry: a single value, a batch, or a value-less span.
#[derive(Debug)]
pub enum ResultItem<T> {
    /// One value at one index
    Single(T),
    /// A batch of values occupying a contiguous index range
    Batch(Vec<T>),
    /// A value-less span that still occupies the given number of indexes
    Placeholder(usize),
}

impl<T> ResultItem<T> {
    /// Number of indexes this item occupies.
    pub fn span(&self) -> usize {
        match self {
            ResultItem::Single(_) => 1,
            ResultItem::Batch(values) => values.len(),
            ResultItem::Placeholder(count) => *count,
        }
    }
}

/// Ordered index-to-item map with an optional out-of-order holding area.
#[derive(Debug)]
pub struct ResultStore<T> {
    items: BTreeMap<usize, ResultItem<T>>,
    /// Arrivals ahead of the contiguous tail, waiting for the gap to close.
    /// Only used in filter mode.
    pending: BTreeMap<usize, ResultItem<T>>,
    to_insert_index: usize,
    result_count: usize,
    filter_mode: bool,
}

impl<T> Default for ResultStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ResultStore<T> {
    pub fn new() -> Self {
        Self::with_filter_mode(false)
    }

    pub fn with_filter_mode(filter_mode: bool) -> Self {
        Self {
            items: BTreeMap::new(),
            pending: BTreeMap::new(),
            to_insert_index: 0,
            result_count: 0,
            filter_mode,
        }
    }

    pub fn is_filter_mode(&self) -> bool {
        self.filter_mode
    }

    /// Index where the next sequential insert will land.
    pub fn next_result_index(&self) -> usize {
        self.to_insert_index
    }

    /// Length of the longest contiguous prefix available from index 0.
    pub fn count(&self) -> usize {
        self.result_count
    }

    /// Store one value. `None` appends at the next sequential index.
    /// Returns the index the value was accepted for.
    pub fn add_result(&mut self, index: Option<usize>, value: T) -> usize {
        self.insert_item(index, ResultItem::Single(value))
    }

    /// Store a batch. An empty batch with a positive `declared_count` is a
    /// placeholder that advances the logical count by its declared size.
    pub fn add_results(&mut self, index: Option<usize>, values: Vec<T>, declared_count: usize) -> usize {
        let item = if values.is_empty() {
            ResultItem::Placeholder(declared_count)
        } else {
            if declared_count != values.len() {
                warn!(
                    declared_count,
                    actual = values.len(),
                    "declared batch count ignored for non-empty batch"
                );
            }
            ResultItem::Batch(values)
        };
        self.insert_item(index, item)
    }

    fn insert_item(&mut self, index: Option<usize>, item: ResultItem<T>) -> usize {
        let span = item.span();
        if span == 0 {
            trace!("empty batch with zero declared count; nothing stored");
            return self.to_insert_index;
        }
        let at = index.unwrap_or(self.to_insert_index);
        if self.filter_mode && at != self.to_insert_index {
            if at < self.to_insert_index {
                warn!(index = at, "arrival below the contiguous tail; dropped as duplicate");
            } else {
                self.pending.insert(at, item);
            }
            return at;
        }
        self.items.insert(at, item);
        self.to_insert_index = self.to_insert_index.max(at + span);
        if self.filter_mode {
            self.splice_pending();
        }
        self.update_count();
        at
    }

    /// Move buffered arrivals adjacent to the new tail into the visible map.
    fn splice_pending(&mut self) {
        while let Some(item) = self.pending.remove(&self.to_insert_index) {
            let span = item.span();
            self.items.insert(self.to_insert_index, item);
            self.to_insert_index += span;
        }
        while let Some((&first, _)) = self.pending.iter().next() {
            if first >= self.to_insert_index {
                break;
            }
            self.pending.remove(&first);
            warn!(index = first, "buffered arrival overlaps the contiguous tail; dropped");
        }
    }

    fn update_count(&mut self) {
        while let Some((start, item)) = self.item_covering(self.result_count) {
            self.result_count = start + item.span();
        }
    }

    fn item_covering(&self, index: usize) -> Option<(usize, &ResultItem<T>)> {
        let (&start, item) = self.items.range(..=index).next_back()?;
        if index < start + item.span() {
            Some((start, item))
        } else {
            None
        }
    }

    /// Whether an item (value or placeholder) covers `index`. Buffered
    /// out-of-order arrivals do not count until the gap below them closes.
    pub fn contains(&self, index: usize) -> bool {
        self.item_covering(index).is_some()
    }

    /// Value stored at `index`, if any. A placeholder span covers the index
    /// but yields no value.
    pub fn result_at(&self, index: usize) -> Option<&T> {
        match self.item_covering(index)? {
            (_, ResultItem::Single(value)) => Some(value),
            (start, ResultItem::Batch(values)) => values.get(index - start),
            (_, ResultItem::Placeholder(_)) => None,
        }
    }

    /// Fresh pass over the currently available results in index order.
    pub fn iter(&self) -> ResultIter<'_, T> {
        ResultIter {
            outer: self.items.iter(),
            current: None,
            offset: 0,
        }
    }
}

/// Index-ordered iterator over available values. Placeholder spans are
/// skipped, so yielded indexes may jump.
pub struct ResultIter<'a, T> {
    outer: std::collections::btree_map::Iter<'a, usize, ResultItem<T>>,
    current: Option<(usize, std::slice::Iter<'a, T>)>,
    offset: usize,
}

impl<'a, T> Iterator for ResultIter<'a, T> {
    type Item = (usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((start, values)) = self.current.as_mut() {
                if let Some(value) = values.next() {
                    let index = *start + self.offset;
                    self.offset += 1;
                    return Some((index, value));
                }
                self.current = None;
            }
            let (&start, item) = self.outer.next()?;
            self.offset = 0;
            match item {
                ResultItem::Single(value) => {
                    self.current = Some((start, std::slice::from_ref(value).iter()));
                }
                ResultItem::Batch(values) => {
                    self.current = Some((start, values.iter()));
                }
                ResultItem::Placeholder(_) => continue,
            }
        }
    }
}
