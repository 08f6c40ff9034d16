use std::io::Write;

use gnss::prelude::SV;
use hifitime::{Duration, Epoch, TimeScale, GPST_REF_EPOCH};
use log::error;
use nalgebra::{Rotation3, Vector3};

use super::{AlmanacRecord, StateVector};
use crate::Error;

/// Keplerian parameters
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct Keplerian {
    /// Semi major axis (m)
    pub a: f64,
    /// Eccentricity (n.a)
    pub e: f64,
    /// Inclination angle at reference time (rad)
    pub i_0: f64,
    /// Longitude of ascending node at weekly epoch (rad)
    pub omega_0: f64,
    /// Mean anomaly at reference time (rad)
    pub m_0: f64,
    /// Argument of perigee (rad)
    pub omega: f64,
}

/// Keplerian almanac, as broadcast by GPS, QZSS, Galileo and BeiDou.
#[derive(Debug, Clone, PartialEq)]
pub struct KeplerAlmanac {
    /// Satellite described by this almanac
    pub(crate) sv: SV,
    /// Time of almanac
    pub(crate) toa: Epoch,
    /// Reception [Epoch]
    pub(crate) begin_valid: Epoch,
    /// Raw health code, 0 means healthy
    pub(crate) health: u8,
    /// Orbital elements
    pub(crate) keplerian: Keplerian,
    /// Rate of right ascension (rad.s⁻¹)
    pub(crate) omega_dot: f64,
    /// Clock offset (s)
    pub(crate) af0: f64,
    /// Clock drift (s.s⁻¹)
    pub(crate) af1: f64,
}

impl KeplerAlmanac {
    /// Eearth mass * Gravitationnal field constant [m^3/s^2]
    pub(crate) const EARTH_GM_CONSTANT: f64 = 3.986004418E14_f64;
    /// Earth rotation rate in WGS84 frame [rad]
    pub(crate) const EARTH_OMEGA_E_WGS84: f64 = 7.2921151467E-5;
    /// Seconds in one week
    const WEEK_SECONDS: f64 = 604800.0;
    /// Maximal number of iterations when solving Kepler's equation
    const MAX_KEPLER_ITER: usize = 30;

    /// Builds a healthy [KeplerAlmanac] describing `sv`, with `toa` time of almanac,
    /// first received at `begin_valid`. Orbital elements are null until
    /// specified with [Self::with_keplerian].
    pub fn new(sv: SV, toa: Epoch, begin_valid: Epoch) -> Self {
        Self {
            sv,
            toa,
            begin_valid,
            health: 0,
            keplerian: Keplerian::default(),
            omega_dot: 0.0,
            af0: 0.0,
            af1: 0.0,
        }
    }
    /// Copies and returns Self with updated [Keplerian] elements
    pub fn with_keplerian(&self, keplerian: Keplerian) -> Self {
        let mut s = self.clone();
        s.keplerian = keplerian;
        s
    }
    /// Copies and returns Self with rate of right ascension (rad.s⁻¹)
    pub fn with_omega_dot(&self, omega_dot: f64) -> Self {
        let mut s = self.clone();
        s.omega_dot = omega_dot;
        s
    }
    /// Copies and returns Self with clock offset (s) and drift (s.s⁻¹)
    pub fn with_clock(&self, af0: f64, af1: f64) -> Self {
        let mut s = self.clone();
        s.af0 = af0;
        s.af1 = af1;
        s
    }
    /// Copies and returns Self with raw health code
    pub fn with_health(&self, health: u8) -> Self {
        let mut s = self.clone();
        s.health = health;
        s
    }
    /// Copies and returns Self as received at a different instant.
    /// This is how you describe a retransmission of the same data.
    pub fn with_begin_valid(&self, begin_valid: Epoch) -> Self {
        let mut s = self.clone();
        s.begin_valid = begin_valid;
        s
    }
    /// Returns [Keplerian] elements
    pub fn keplerian(&self) -> Keplerian {
        self.keplerian
    }
    /// Returns raw health code
    pub fn health(&self) -> u8 {
        self.health
    }
    /// Time of almanac, in seconds within the GPS week
    fn toa_seconds_of_week(&self) -> f64 {
        let dt = self.toa.to_time_scale(TimeScale::GPST) - GPST_REF_EPOCH;
        dt.to_seconds().rem_euclid(Self::WEEK_SECONDS)
    }
    /// Solves Kepler's equation for the eccentric anomaly
    fn eccentric_anomaly(&self, m_k: f64) -> Option<f64> {
        let e = self.keplerian.e;
        let mut e_k = m_k;
        for _ in 0..Self::MAX_KEPLER_ITER {
            let e_next = m_k + e * e_k.sin();
            if (e_next - e_k).abs() < 1.0E-12 {
                return Some(e_next);
            }
            e_k = e_next;
        }
        None
    }
}

impl AlmanacRecord for KeplerAlmanac {
    fn subject(&self) -> SV {
        self.sv
    }
    fn epoch(&self) -> Epoch {
        self.toa
    }
    fn begin_valid(&self) -> Epoch {
        self.begin_valid
    }
    fn is_healthy(&self) -> bool {
        self.health == 0
    }
    fn is_same_data(&self, other: &Self) -> bool {
        self.sv == other.sv
            && self.toa == other.toa
            && self.health == other.health
            && self.keplerian == other.keplerian
            && self.omega_dot == other.omega_dot
            && self.af0 == other.af0
            && self.af1 == other.af1
    }
    fn state_vector(&self, t: Epoch) -> Result<StateVector, Error> {
        let kepler = &self.keplerian;
        if !(kepler.a > 0.0) || !(0.0..1.0).contains(&kepler.e) {
            error!("{}({}) non physical orbital elements", self.toa, self.sv);
            return Err(Error::InvalidOrbit(self.sv, self.toa));
        }

        let t_k = (t - self.toa).to_seconds();

        let n = (Self::EARTH_GM_CONSTANT / kepler.a.powi(3)).sqrt();
        let m_k = kepler.m_0 + n * t_k;
        let e_k = self.eccentric_anomaly(m_k).ok_or_else(|| {
            error!("{}({}) kepler iteration overflow", self.toa, self.sv);
            Error::InvalidOrbit(self.sv, self.toa)
        })?;

        let (sin_e_k, cos_e_k) = e_k.sin_cos();
        let nu_k = ((1.0 - kepler.e.powi(2)).sqrt() * sin_e_k).atan2(cos_e_k - kepler.e);

        // argument of latitude, radius
        let u_k = nu_k + kepler.omega;
        let r_k = kepler.a * (1.0 - kepler.e * cos_e_k);

        let omega_k = kepler.omega_0 + (self.omega_dot - Self::EARTH_OMEGA_E_WGS84) * t_k
            - Self::EARTH_OMEGA_E_WGS84 * self.toa_seconds_of_week();

        let (sin_u_k, cos_u_k) = u_k.sin_cos();
        let (x, y) = (r_k * cos_u_k, r_k * sin_u_k);

        let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), omega_k)
            * Rotation3::from_axis_angle(&Vector3::x_axis(), kepler.i_0);
        let position = rotation * Vector3::new(x, y, 0.0);

        // first derivatives
        let fd_e_k = n / (1.0 - kepler.e * cos_e_k);
        let fd_u_k = ((1.0 + kepler.e) / (1.0 - kepler.e)).sqrt()
            * ((nu_k / 2.0).cos() / (e_k / 2.0).cos()).powi(2)
            * fd_e_k;
        let fd_r_k = kepler.a * kepler.e * sin_e_k * fd_e_k;
        let fd_omega_k = self.omega_dot - Self::EARTH_OMEGA_E_WGS84;

        let fd_x = fd_r_k * cos_u_k - r_k * fd_u_k * sin_u_k;
        let fd_y = fd_r_k * sin_u_k + r_k * fd_u_k * cos_u_k;

        let (sin_omega_k, cos_omega_k) = omega_k.sin_cos();
        let (sin_i, cos_i) = kepler.i_0.sin_cos();

        let velocity = Vector3::new(
            fd_x * cos_omega_k
                - fd_y * cos_i * sin_omega_k
                - (x * sin_omega_k + y * cos_omega_k * cos_i) * fd_omega_k,
            fd_x * sin_omega_k
                + fd_y * cos_i * cos_omega_k
                + (x * cos_omega_k - y * sin_omega_k * cos_i) * fd_omega_k,
            fd_y * sin_i,
        );

        Ok(StateVector {
            sv: self.sv,
            epoch: t,
            position,
            velocity,
            clock_offset: Duration::from_seconds(self.af0 + self.af1 * t_k),
        })
    }
    fn dump<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        let kepler = &self.keplerian;
        writeln!(w, "Almanac for {}", self.sv)?;
        writeln!(w, "  Time of almanac  : {}", self.toa)?;
        writeln!(w, "  Begin valid      : {}", self.begin_valid)?;
        writeln!(w, "  Health           : {:#04x}", self.health)?;
        writeln!(w, "  sqrt(A)  (m^1/2) : {:.6}", kepler.a.sqrt())?;
        writeln!(w, "  e                : {:.10}", kepler.e)?;
        writeln!(w, "  i0       (rad)   : {:.10}", kepler.i_0)?;
        writeln!(w, "  OMEGA0   (rad)   : {:.10}", kepler.omega_0)?;
        writeln!(w, "  OMEGAdot (rad/s) : {:.6E}", self.omega_dot)?;
        writeln!(w, "  omega    (rad)   : {:.10}", kepler.omega)?;
        writeln!(w, "  M0       (rad)   : {:.10}", kepler.m_0)?;
        writeln!(w, "  af0      (s)     : {:.6E}", self.af0)?;
        writeln!(w, "  af1      (s/s)   : {:.6E}", self.af1)
    }
}
