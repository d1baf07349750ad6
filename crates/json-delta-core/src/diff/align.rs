//! Minimal-mode array alignment.
//!
//! A dynamic program over (right element, left element) pairs. Each cell
//! holds the cheapest stanza list that turns a suffix-trimmed prefix of the
//! left array into a prefix of the right one, reached by modifying,
//! deleting or appending. Cells share their history through reference
//! counted chains so extending a candidate never copies the stanzas
//! already accumulated.

use std::rc::Rc;

use super::Engine;
use crate::size::{list_size, stanza_size};
use crate::{DeltaError, Key, KeyPath, Stanza, Value};

struct Chain {
    segment: Vec<Stanza>,
    prev: Option<Rc<Chain>>,
    bytes: usize,
    count: usize,
    appended: usize,
}

impl Chain {
    fn empty() -> Rc<Self> {
        Rc::new(Self { segment: Vec::new(), prev: None, bytes: 0, count: 0, appended: 0 })
    }

    fn extend(prev: &Rc<Self>, segment: Vec<Stanza>, appended: usize) -> Rc<Self> {
        let bytes = prev.bytes + segment.iter().map(stanza_size).sum::<usize>();
        Rc::new(Self {
            count: prev.count + segment.len(),
            bytes,
            appended: prev.appended + appended,
            segment,
            prev: Some(Rc::clone(prev)),
        })
    }

    fn cost(&self) -> usize {
        list_size(self.count, self.bytes)
    }

    fn flatten(&self) -> Vec<Stanza> {
        let mut segments = vec![&self.segment];
        let mut cursor = self.prev.as_deref();
        while let Some(chain) = cursor {
            segments.push(&chain.segment);
            cursor = chain.prev.as_deref();
        }
        let mut stanzas = Vec::with_capacity(self.count);
        for segment in segments.into_iter().rev() {
            stanzas.extend(segment.iter().cloned());
        }
        stanzas
    }
}

impl Drop for Chain {
    // Unlinks iteratively; long arrays build chains deep enough to
    // overflow the stack with the recursive default.
    fn drop(&mut self) {
        let mut next = self.prev.take();
        while let Some(chain) = next {
            match Rc::try_unwrap(chain) {
                Ok(mut owned) => next = owned.prev.take(),
                Err(_) => break,
            }
        }
    }
}

/// Keeps the first of equally cheap candidates.
fn cheaper(best: Option<Rc<Chain>>, candidate: Rc<Chain>) -> Option<Rc<Chain>> {
    match best {
        Some(best) if best.cost() <= candidate.cost() => Some(best),
        _ => Some(candidate),
    }
}

pub(super) fn align_diff(
    engine: &Engine,
    left: &[Value],
    right: &[Value],
    path: &KeyPath,
    depth: usize,
) -> Result<Vec<Stanza>, DeltaError> {
    let len = left.len();
    let at = |index: usize| path.child(Key::Index(index));

    if len == 0 {
        let appends = right.iter().enumerate().map(|(index, item)| Stanza::set(at(index), item.clone()));
        return Ok(appends.collect());
    }

    // lastrow[col] deletes left[0..len - col].
    let mut lastrow = Vec::with_capacity(len + 1);
    let mut chain = Chain::empty();
    lastrow.push(Rc::clone(&chain));
    for index in 0..len {
        chain = Chain::extend(&chain, vec![Stanza::delete(at(index))], 0);
        lastrow.push(Rc::clone(&chain));
    }
    lastrow.reverse();
    let mut winner = Rc::clone(&lastrow[0]);

    for (right_index, right_item) in right.iter().enumerate() {
        let first = right_index.min(len - 1);
        // Built with ascending left index, so `row.last()` is the cell
        // immediately to the right in column order.
        let mut row: Vec<Rc<Chain>> = Vec::with_capacity(len - first);

        for left_index in first..len {
            let col = len - left_index - 1;
            let mut best = None;

            if col + 1 < lastrow.len() {
                let modify = engine.diff_at(&left[left_index], right_item, &at(left_index), depth + 1)?;
                best = cheaper(best, Chain::extend(&lastrow[col + 1], modify, 0));
            }
            if let Some(prev) = row.last() {
                best = cheaper(best, Chain::extend(prev, vec![Stanza::delete(at(left_index))], 0));
            }
            if col == 0 || best.is_none() {
                let base = &lastrow[0];
                let append = Stanza::set(at(len + base.appended), right_item.clone());
                best = cheaper(best, Chain::extend(base, vec![append], 1));
            }

            if let Some(best) = best {
                winner = Rc::clone(&best);
                row.push(best);
            }
        }

        row.reverse();
        lastrow = row;
    }

    let stanzas = winner.flatten();
    tracing::trace!(%path, left = len, right = right.len(), stanzas = stanzas.len(), "aligned arrays");
    Ok(stanzas)
}
