//! Maximal-run diffing over a row of cells.
//!
//! Used by the screen-library color backend (render::screen_color): a run
//! is a maximal contiguous span of cells that (a) all differ from the
//! mirror and (b) share one color attribute — not necessarily the same
//! glyph, so this is a generalization of a plain equality-run iterator with
//! a caller-supplied attribute key.

use std::ops::Range;

pub struct RowDiffIter<'a, T, K, F> {
    current: &'a [T],
    prev: &'a [T],
    key: F,
    idx: usize,
}

impl<'a, T: PartialEq, K: PartialEq, F: Fn(&T) -> K> RowDiffIter<'a, T, K, F> {
    pub fn new(current: &'a [T], prev: &'a [T], key: F) -> Self {
        assert_eq!(
            current.len(),
            prev.len(),
            "current and prev rows must be the same length"
        );
        Self {
            current,
            prev,
            key,
            idx: 0,
        }
    }
}

impl<'a, T: PartialEq, K: PartialEq, F: Fn(&T) -> K> Iterator for RowDiffIter<'a, T, K, F> {
    type Item = (Range<usize>, K);

    fn next(&mut self) -> Option<Self::Item> {
        while self.current.get(self.idx)? == self.prev.get(self.idx)? {
            self.idx += 1;
        }
        let start = self.idx;
        let attr = (self.key)(self.current.get(self.idx)?);
        loop {
            match self.current.get(self.idx) {
                Some(cell) if cell != &self.prev[self.idx] && (self.key)(cell) == attr => {
                    self.idx += 1;
                }
                _ => return Some((start..self.idx, attr)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_rows_yield_no_runs() {
        let row = [1u8, 2, 3];
        let runs: Vec<_> = RowDiffIter::new(&row, &row, |v| *v).collect();
        assert!(runs.is_empty());
    }

    #[test]
    fn single_changed_cell_is_one_run() {
        let prev = [0u8, 0, 0, 0];
        let curr = [0u8, 9, 0, 0];
        let runs: Vec<_> = RowDiffIter::new(&curr, &prev, |v| *v).collect();
        assert_eq!(runs, vec![(1..2, 9)]);
    }

    #[test]
    fn adjacent_differing_cells_with_same_attr_join_one_run() {
        let prev = [(' ', 0u8), (' ', 0), (' ', 0), (' ', 0)];
        let curr = [('a', 5u8), ('b', 5), (' ', 0), ('c', 5)];
        let runs: Vec<_> = RowDiffIter::new(&curr, &prev, |(_, palette)| *palette).collect();
        // cols 0..2 share palette 5 and both differ from the mirror, so they
        // merge; col 2 is unchanged and breaks the run; col 3 starts a new one.
        assert_eq!(runs, vec![(0..2, 5), (3..4, 5)]);
    }

    #[test]
    fn attribute_change_without_equality_still_splits_the_run() {
        let prev = [(' ', 0u8), (' ', 0)];
        let curr = [('a', 1u8), ('b', 2)];
        let runs: Vec<_> = RowDiffIter::new(&curr, &prev, |(_, palette)| *palette).collect();
        assert_eq!(runs, vec![(0..1, 1), (1..2, 2)]);
    }
}
