use std::collections::BTreeMap;

use hifitime::Epoch;

use super::arena::{Arena, Handle};
use crate::{almanac::AlmanacRecord, time::TimeBound};

/// Where a new almanac belongs in an [EpochMap]
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) enum Placement {
    /// Same data already known, received earlier (or at the same time)
    Discard,
    /// Same data already known, but received later: replace this entry
    Replace(usize),
    /// Not known yet
    Append,
}

impl Placement {
    pub fn is_kept(&self) -> bool {
        !matches!(self, Self::Discard)
    }
}

/// Almanacs of a single satellite, sorted by epoch.
/// Distinct orbit models sharing an epoch are stored side by side,
/// in insertion order.
#[derive(Debug, Clone, Default)]
pub(crate) struct EpochMap {
    entries: BTreeMap<Epoch, Vec<Handle>>,
}

impl EpochMap {
    /// Total number of almanacs
    pub fn len(&self) -> usize {
        self.entries.values().map(|handles| handles.len()).sum()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(|handles| handles.is_empty())
    }
    /// Iterates (epoch, [Handle]) in chronological order
    pub fn iter(&self) -> impl Iterator<Item = (Epoch, Handle)> + '_ {
        self.entries
            .iter()
            .flat_map(|(epoch, handles)| handles.iter().map(move |handle| (*epoch, *handle)))
    }
    /// Determines how `record` should be inserted.
    /// Retransmissions of the same data are resolved in favor of
    /// the earliest reception.
    pub fn placement<A: AlmanacRecord>(&self, arena: &Arena<A>, record: &A) -> Placement {
        let candidates = match self.entries.get(&record.epoch()) {
            Some(candidates) => candidates,
            None => return Placement::Append,
        };
        for (index, handle) in candidates.iter().enumerate() {
            let known = arena.get(*handle);
            if record.is_same_data(known) {
                if known.begin_valid() <= record.begin_valid() {
                    return Placement::Discard;
                }
                return Placement::Replace(index);
            }
        }
        Placement::Append
    }
    /// Applies a [Placement] previously obtained with [Self::placement].
    /// Returns the [Handle] that got replaced, if any.
    pub fn place(&mut self, epoch: Epoch, handle: Handle, placement: Placement) -> Option<Handle> {
        let handles = self.entries.entry(epoch).or_default();
        match placement {
            Placement::Discard => None,
            Placement::Append => {
                handles.push(handle);
                None
            },
            Placement::Replace(index) => {
                let replaced = handles.remove(index);
                handles.push(handle);
                Some(replaced)
            },
        }
    }
    /// Selects the almanac a receiver would have been using at `t`:
    /// the last almanac whose transmission started before `t`.
    /// When none qualifies, the oldest one is returned.
    /// This assumes reception times increase with the epochs.
    pub fn best_fit<A: AlmanacRecord>(&self, arena: &Arena<A>, t: Epoch) -> Option<Handle> {
        let mut entries = self.iter();
        let (_, first) = entries.next()?;

        if self.len() == 1 || arena.get(first).begin_valid() >= t {
            return Some(first);
        }

        let mut previous = first;
        for (_, handle) in entries {
            if arena.get(handle).begin_valid() >= t {
                return Some(previous);
            }
            previous = handle;
        }
        Some(previous)
    }
    /// Drops every almanac whose epoch lies outside [start, end].
    /// Returns the number of entries removed.
    pub fn retain_within<A>(
        &mut self,
        arena: &mut Arena<A>,
        start: &TimeBound,
        end: &TimeBound,
    ) -> usize {
        let mut removed = 0;
        self.entries.retain(|epoch, handles| {
            let retained = start.spans(end, *epoch);
            if !retained {
                removed += handles.len();
                for handle in handles.drain(..) {
                    arena.release(handle);
                }
            }
            retained
        });
        removed
    }
}
