//! Almanac records
use std::io::Write;

use gnss::prelude::SV;
use hifitime::{Duration, Epoch};
use nalgebra::Vector3;

use crate::Error;

mod kepler;

pub use kepler::{KeplerAlmanac, Keplerian};

/// Satellite state resolved from an almanac
#[derive(Debug, Clone, PartialEq)]
pub struct StateVector {
    /// Satellite Vehicle
    pub sv: SV,
    /// Instant of this state
    pub epoch: Epoch,
    /// ECEF position [m]
    pub position: Vector3<f64>,
    /// ECEF velocity [m/s]
    pub velocity: Vector3<f64>,
    /// Onboard clock offset
    pub clock_offset: Duration,
}

/// Implement this trait to store your own almanac type in the
/// [AlmanacStore](crate::prelude::AlmanacStore).
/// The store keeps private copies, hence the [Clone] requirement.
pub trait AlmanacRecord: Clone {
    /// Satellite this almanac describes
    fn subject(&self) -> SV;
    /// Reference [Epoch] of the orbit model (time of almanac).
    /// This is the key almanacs are sorted by.
    fn epoch(&self) -> Epoch;
    /// [Epoch] this almanac was first received.
    /// Used to order transmissions and to pick the earliest copy
    /// of retransmitted data.
    fn begin_valid(&self) -> Epoch;
    /// Health flag
    fn is_healthy(&self) -> bool;
    /// Returns true if both almanacs carry the same orbit model,
    /// regardless of when and by whom they were transmitted.
    fn is_same_data(&self, other: &Self) -> bool;
    /// Resolves the [StateVector] at desired [Epoch]
    fn state_vector(&self, t: Epoch) -> Result<StateVector, Error>;
    /// Column header matching [AlmanacRecord::dump_terse]
    fn terse_header() -> &'static str {
        "  SV  Epoch                             Begin valid                       Health"
    }
    /// One line description
    fn dump_terse<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        write!(
            w,
            "{:>4}  {:<32}  {:<32}  {}",
            self.subject().to_string(),
            self.epoch().to_string(),
            self.begin_valid().to_string(),
            if self.is_healthy() { "healthy" } else { "unhealthy" }
        )
    }
    /// Complete description
    fn dump<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        self.dump_terse(w)?;
        writeln!(w)
    }
}
