//! Almanac store
use std::collections::BTreeMap;

use log::{debug, trace, warn};
use thiserror::Error;

use gnss::prelude::{Constellation, SV};
use hifitime::Epoch;

use crate::{
    almanac::{AlmanacRecord, KeplerAlmanac, StateVector},
    cfg::Config,
    time::TimeBound,
};

mod arena;
mod dump;
mod epoch_map;

pub use dump::DumpDetail;

use arena::{Arena, Handle};
use epoch_map::{EpochMap, Placement};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("no almanac for {0}")]
    NotFound(SV),
    #[error("{0} is not a valid constellation for this store")]
    InvalidConstellation(Constellation),
    #[error("{0} is transmitting an unhealthy almanac at {1}")]
    Unhealthy(SV, Epoch),
    #[error("{0}: invalid orbital elements (toa={1})")]
    InvalidOrbit(SV, Epoch),
}

/// Selects one of the two indexes of the [AlmanacStore]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Index {
    /// Almanacs indexed by the satellite they describe
    Subject,
    /// Almanacs indexed by the satellite that transmitted them
    Transmit,
    /// Both indexes
    #[default]
    Both,
}

/// [AlmanacStore] collects almanacs and indexes them both by the satellite
/// they describe (subject) and by the satellite that transmitted them.
/// Records are stored once, both indexes refer to the same copy.
#[derive(Debug, Clone)]
pub struct AlmanacStore<A: AlmanacRecord = KeplerAlmanac> {
    /// Store configuration
    cfg: Config,
    /// Record owner
    arena: Arena<A>,
    /// Almanacs per subject
    subjects: BTreeMap<SV, EpochMap>,
    /// Almanacs per transmitter, then per subject
    transmitters: BTreeMap<SV, BTreeMap<SV, EpochMap>>,
    /// Start of span
    initial_time: TimeBound,
    /// End of span
    final_time: TimeBound,
}

impl<A: AlmanacRecord> Default for AlmanacStore<A> {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl<A: AlmanacRecord> AlmanacStore<A> {
    /// Builds a new empty [AlmanacStore] using given [Config]uration
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            arena: Arena::default(),
            subjects: BTreeMap::new(),
            transmitters: BTreeMap::new(),
            initial_time: TimeBound::EndOfTime,
            final_time: TimeBound::BeginningOfTime,
        }
    }
    /// Returns [Config] currently in use
    pub fn config(&self) -> &Config {
        &self.cfg
    }
    /// Start of the time span covered by this store.
    /// [TimeBound::EndOfTime] until something gets stored.
    pub fn initial_time(&self) -> TimeBound {
        self.initial_time
    }
    /// End of the time span covered by this store.
    /// [TimeBound::BeginningOfTime] until something gets stored.
    pub fn final_time(&self) -> TimeBound {
        self.final_time
    }
    /// Returns true if no almanac is stored at all
    pub fn is_empty(&self) -> bool {
        self.arena.len() == 0
    }
    /// Adds a new almanac, describing `subject` and broadcast by `transmitter`.
    /// The almanac is indexed by subject only when the transmitter is healthy,
    /// it is always indexed by transmitter.
    /// Retransmissions of known data are deduplicated, the earliest reception is kept.
    /// Returns true if either index changed.
    pub fn add_record(
        &mut self,
        record: &A,
        transmitter: SV,
        subject: SV,
        transmitter_healthy: bool,
    ) -> bool {
        if self.cfg.reject_foreign_constellations && !self.cfg.accepts(subject) {
            warn!(
                "{}({}) rejected: {} is not accepted",
                record.epoch(),
                subject,
                subject.constellation
            );
            return false;
        }

        let by_subject = if transmitter_healthy {
            match self.subjects.get(&subject) {
                Some(map) => map.placement(&self.arena, record),
                None => Placement::Append,
            }
        } else {
            debug!(
                "{}({}) unhealthy transmitter {}: not indexed by subject",
                record.epoch(),
                subject,
                transmitter
            );
            Placement::Discard
        };

        let by_transmitter = match self
            .transmitters
            .get(&transmitter)
            .and_then(|subjects| subjects.get(&subject))
        {
            Some(map) => map.placement(&self.arena, record),
            None => Placement::Append,
        };

        let refs = [by_subject, by_transmitter]
            .iter()
            .filter(|placement| placement.is_kept())
            .count();

        if refs == 0 {
            debug!(
                "{}({}) from {}: already known",
                record.epoch(),
                subject,
                transmitter
            );
            return false;
        }

        let epoch = record.epoch();
        let handle = self.arena.insert(record.clone(), refs);

        if by_subject.is_kept() {
            let map = self.subjects.entry(subject).or_default();
            if let Some(replaced) = map.place(epoch, handle, by_subject) {
                debug!("{}({}) replaced by earlier reception", epoch, subject);
                self.arena.release(replaced);
            }
        }

        if by_transmitter.is_kept() {
            let map = self
                .transmitters
                .entry(transmitter)
                .or_default()
                .entry(subject)
                .or_default();
            if let Some(replaced) = map.place(epoch, handle, by_transmitter) {
                debug!(
                    "{}({}) from {}: replaced by earlier reception",
                    epoch, subject, transmitter
                );
                self.arena.release(replaced);
            }
        }

        debug!(
            "{}({}) from {}: stored (rx={})",
            epoch,
            subject,
            transmitter,
            record.begin_valid()
        );

        self.update_span(record);
        true
    }
    /// Widens the store span to include this record
    fn update_span(&mut self, record: &A) {
        self.initial_time = self.initial_time.min(TimeBound::At(record.begin_valid()));
        self.final_time = self.final_time.max(TimeBound::At(record.epoch()));
    }
    /// Returns the almanac a receiver would have been using for `subject` at `t`:
    /// the most recently transmitted almanac, which is not necessarily the closest in time.
    /// When `t` precedes all transmissions, the oldest almanac is returned.
    pub fn find_record(&self, subject: SV, t: Epoch) -> Result<&A, Error> {
        let map = self.subjects.get(&subject).ok_or(Error::NotFound(subject))?;
        let handle = map
            .best_fit(&self.arena, t)
            .ok_or(Error::NotFound(subject))?;
        Ok(self.arena.get(handle))
    }
    /// Same as [Self::find_record], restricted to almanacs broadcast by `transmitter`.
    pub fn find_transmitted(&self, transmitter: SV, subject: SV, t: Epoch) -> Result<&A, Error> {
        let handle = self
            .transmitters
            .get(&transmitter)
            .and_then(|subjects| subjects.get(&subject))
            .and_then(|map| map.best_fit(&self.arena, t))
            .ok_or(Error::NotFound(subject))?;
        Ok(self.arena.get(handle))
    }
    /// Returns the health flag of the almanac in use for `subject` at `t`.
    pub fn is_healthy(&self, subject: SV, t: Epoch) -> Result<bool, Error> {
        self.validate_constellation(subject)?;
        let record = self.find_record(subject, t)?;
        Ok(record.is_healthy())
    }
    /// Resolves the [StateVector] of `subject` at `t`, from the almanac in use at that time.
    /// Unhealthy almanacs are refused.
    pub fn state_vector(&self, subject: SV, t: Epoch) -> Result<StateVector, Error> {
        let record = self.find_record(subject, t)?;
        if !record.is_healthy() {
            return Err(Error::Unhealthy(subject, t));
        }
        record.state_vector(t)
    }
    fn validate_constellation(&self, sv: SV) -> Result<(), Error> {
        if self.cfg.accepts(sv) {
            Ok(())
        } else {
            warn!("{} is not accepted by this store", sv.constellation);
            Err(Error::InvalidConstellation(sv.constellation))
        }
    }
    /// Drops every almanac whose epoch lies outside [t_min, t_max] (both included),
    /// in both indexes. The store span becomes [t_min, t_max].
    pub fn edit<S: Into<TimeBound>, E: Into<TimeBound>>(&mut self, t_min: S, t_max: E) {
        let (t_min, t_max) = (t_min.into(), t_max.into());
        let Self {
            arena,
            subjects,
            transmitters,
            ..
        } = self;

        let mut removed = 0;
        for map in subjects.values_mut() {
            removed += map.retain_within(arena, &t_min, &t_max);
        }
        trace!("{} -> {}: pruned {} subject entries", t_min, t_max, removed);

        let mut removed = 0;
        for map in transmitters.values_mut().flat_map(|subjects| subjects.values_mut()) {
            removed += map.retain_within(arena, &t_min, &t_max);
        }
        trace!("{} -> {}: pruned {} transmit entries", t_min, t_max, removed);

        self.initial_time = t_min;
        self.final_time = t_max;
    }
    /// Drops all almanacs
    pub fn clear(&mut self) {
        self.subjects.clear();
        self.transmitters.clear();
        self.arena.clear();
    }
    /// Number of entries in given [Index]. [Index::Both] sums both indexes,
    /// an almanac referenced by both of them is counted twice.
    pub fn size(&self, index: Index) -> usize {
        let (subjects, transmitted) = self.sizes();
        match index {
            Index::Subject => subjects,
            Index::Transmit => transmitted,
            Index::Both => subjects + transmitted,
        }
    }
    /// Returns (subject index, transmit index) entry counts.
    /// The two may differ, almanacs received from unhealthy transmitters
    /// only appear in the transmit index.
    pub fn sizes(&self) -> (usize, usize) {
        let subjects = self.subjects.values().map(|map| map.len()).sum();
        let transmitted = self
            .transmitters
            .keys()
            .map(|transmitter| self.size_for_transmitter(*transmitter))
            .sum();
        (subjects, transmitted)
    }
    /// Number of almanacs describing `subject`
    pub fn size_for_subject(&self, subject: SV) -> usize {
        self.subjects.get(&subject).map_or(0, |map| map.len())
    }
    /// Number of almanacs broadcast by `transmitter`
    pub fn size_for_transmitter(&self, transmitter: SV) -> usize {
        self.transmitters.get(&transmitter).map_or(0, |subjects| {
            subjects.values().map(|map| map.len()).sum()
        })
    }
    /// Satellites described by at least one almanac
    pub fn subjects(&self) -> impl Iterator<Item = SV> + '_ {
        self.subjects
            .iter()
            .filter_map(|(sv, map)| if map.is_empty() { None } else { Some(*sv) })
    }
    /// Satellites that transmitted at least one almanac
    pub fn transmitters(&self) -> impl Iterator<Item = SV> + '_ {
        self.transmitters.iter().filter_map(|(sv, subjects)| {
            if subjects.values().all(|map| map.is_empty()) {
                None
            } else {
                Some(*sv)
            }
        })
    }
    /// Iterates all almanacs describing `subject`, in chronological order.
    pub fn subject_records(
        &self,
        subject: SV,
    ) -> Result<impl Iterator<Item = (Epoch, &A)> + '_, Error> {
        self.validate_constellation(subject)?;
        let map = self.subjects.get(&subject).ok_or(Error::NotFound(subject))?;
        Ok(map
            .iter()
            .map(move |(epoch, handle)| (epoch, self.arena.get(handle))))
    }
    /// Iterates all almanacs broadcast by `transmitter`,
    /// as (subject, epoch, almanac), sorted by subject then epoch.
    pub fn transmitted_records(
        &self,
        transmitter: SV,
    ) -> Result<impl Iterator<Item = (SV, Epoch, &A)> + '_, Error> {
        let subjects = self
            .transmitters
            .get(&transmitter)
            .ok_or(Error::NotFound(transmitter))?;
        Ok(subjects.iter().flat_map(move |(subject, map)| {
            map.iter()
                .map(move |(epoch, handle)| (*subject, epoch, self.arena.get(handle)))
        }))
    }
    /// Handles of all almanacs broadcast by `transmitter`
    fn transmitted_handles(&self, transmitter: &SV) -> Vec<Handle> {
        self.transmitters
            .get(transmitter)
            .map(|subjects| {
                subjects
                    .values()
                    .flat_map(|map| map.iter().map(|(_, handle)| handle))
                    .collect()
            })
            .unwrap_or_default()
    }
}
