//! Round-robin cursors over candidate images and screen tiles.

use std::path::{Path, PathBuf};

/// Index that wraps modulo a fixed bound.
///
/// `next` hands out the current position and then advances, so a fresh
/// cursor yields `0, 1, .., bound - 1, 0, ..`. The stored position is always
/// strictly below `bound` (or zero when the bound is zero).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundRobin {
    idx: usize,
    bound: usize,
}

impl RoundRobin {
    #[must_use]
    pub const fn new(bound: usize) -> Self {
        Self { idx: 0, bound }
    }

    /// Position the next call to [`RoundRobin::next`] will return.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.idx
    }

    #[must_use]
    pub const fn bound(&self) -> usize {
        self.bound
    }

    /// Return the current position and advance, wrapping at the bound.
    pub fn next(&mut self) -> Option<usize> {
        if self.bound == 0 {
            return None;
        }
        let out = self.idx;
        self.idx = (self.idx + 1) % self.bound;
        Some(out)
    }

    /// Change the bound and restart from zero.
    pub const fn reset(&mut self, bound: usize) {
        self.idx = 0;
        self.bound = bound;
    }
}

/// Ordered candidate paths with the image cursor that walks them.
#[derive(Debug, Clone, Default)]
pub struct CandidateList {
    items: Vec<PathBuf>,
    cursor: RoundRobin,
}

impl CandidateList {
    #[must_use]
    pub fn from_vec(items: Vec<PathBuf>) -> Self {
        let cursor = RoundRobin::new(items.len());
        Self { items, cursor }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Index of the image the next [`CandidateList::advance`] returns.
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.cursor.position()
    }

    /// Return the next image in round-robin order.
    pub fn advance(&mut self) -> Option<(usize, &Path)> {
        let idx = self.cursor.next()?;
        Some((idx, self.items[idx].as_path()))
    }

    /// Drop every candidate and reset the cursor.
    pub fn clear(&mut self) {
        self.items.clear();
        self.cursor.reset(0);
    }

    #[must_use]
    pub fn as_slice(&self) -> &[PathBuf] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_robin_wraps_and_stays_in_bounds() {
        let mut rr = RoundRobin::new(3);
        let seen: Vec<usize> = (0..7).filter_map(|_| rr.next()).collect();
        assert_eq!(seen, vec![0, 1, 2, 0, 1, 2, 0]);
        for _ in 0..10_000 {
            rr.next();
            assert!(rr.position() < rr.bound());
        }
    }

    #[test]
    fn empty_round_robin_yields_nothing() {
        let mut rr = RoundRobin::new(0);
        assert_eq!(rr.next(), None);
        assert_eq!(rr.position(), 0);
    }

    #[test]
    fn candidates_advance_in_list_order() {
        let mut list = CandidateList::from_vec(vec!["a.jpg".into(), "b.jpg".into()]);
        let order: Vec<usize> = (0..5).filter_map(|_| list.advance().map(|(i, _)| i)).collect();
        assert_eq!(order, vec![0, 1, 0, 1, 0]);
        list.clear();
        assert!(list.is_empty());
        assert!(list.advance().is_none());
    }
}
