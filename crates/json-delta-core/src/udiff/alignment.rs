use std::collections::BTreeSet;

use crate::Value;

/// One position of a reconstructed array alignment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) enum Slot<'v> {
    Present(&'v Value),
    Gap,
}

impl Slot<'_> {
    fn is_present(self) -> bool {
        matches!(self, Self::Present(_))
    }
}

/// Left and right arrays laid out side by side, with gaps where a delta
/// inserts into or deletes from one side only.
pub(super) struct Alignment<'v> {
    pub(super) left: Vec<Slot<'v>>,
    pub(super) right: Vec<Slot<'v>>,
    left_after: Vec<bool>,
    right_after: Vec<bool>,
}

impl<'v> Alignment<'v> {
    /// Lays out `left` and `right` given the positions a delta inserts at,
    /// the positions it deletes outright, and the highest index it touches.
    pub(super) fn reconstruct(
        left: &'v [Value],
        right: &'v [Value],
        inserts: &BTreeSet<usize>,
        deletes: &BTreeSet<usize>,
        max_touched: Option<usize>,
    ) -> Self {
        let len = (left.len() + inserts.len())
            .max(right.len() + deletes.len())
            .max(max_touched.map_or(0, |index| index + 1));

        let mut lefts = left.iter();
        let mut rights = right.iter();
        let left: Vec<Slot<'v>> = (0..len)
            .map(|index| {
                if inserts.contains(&index) {
                    Slot::Gap
                } else {
                    lefts.next().map_or(Slot::Gap, Slot::Present)
                }
            })
            .collect();
        let right: Vec<Slot<'v>> = (0..len)
            .map(|index| {
                if deletes.contains(&index) {
                    Slot::Gap
                } else {
                    rights.next().map_or(Slot::Gap, Slot::Present)
                }
            })
            .collect();

        let left_after = presence_suffix(&left);
        let right_after = presence_suffix(&right);
        Self { left, right, left_after, right_after }
    }

    pub(super) fn len(&self) -> usize {
        self.left.len()
    }

    /// Whether any element is present at or after `index`, per side. That
    /// decides whether the element before `index` needs a trailing comma.
    pub(super) fn commas_from(&self, index: usize) -> (bool, bool) {
        (
            self.left_after.get(index).copied().unwrap_or(false),
            self.right_after.get(index).copied().unwrap_or(false),
        )
    }
}

fn presence_suffix(slots: &[Slot<'_>]) -> Vec<bool> {
    let mut after = vec![false; slots.len() + 1];
    for (index, slot) in slots.iter().enumerate().rev() {
        after[index] = slot.is_present() || after[index + 1];
    }
    after
}
