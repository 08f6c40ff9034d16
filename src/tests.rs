use hifitime::{Duration, Epoch, Unit};
use nalgebra::Vector3;
use std::str::FromStr;

use crate::{
    prelude::{
        AlmanacRecord, AlmanacStore, Config, DumpDetail, Index, KeplerAlmanac, Keplerian,
        StateVector, TimeBound,
    },
    Error,
};

use gnss::prelude::{Constellation, SV};

/// Minimal almanac: a satellite parked at a fixed position
#[derive(Debug, Clone, PartialEq)]
struct Parked {
    sv: SV,
    toa: Epoch,
    rx: Epoch,
    healthy: bool,
    position: (f64, f64, f64),
}

impl AlmanacRecord for Parked {
    fn subject(&self) -> SV {
        self.sv
    }
    fn epoch(&self) -> Epoch {
        self.toa
    }
    fn begin_valid(&self) -> Epoch {
        self.rx
    }
    fn is_healthy(&self) -> bool {
        self.healthy
    }
    fn is_same_data(&self, other: &Self) -> bool {
        self.sv == other.sv
            && self.toa == other.toa
            && self.healthy == other.healthy
            && self.position == other.position
    }
    fn state_vector(&self, t: Epoch) -> Result<StateVector, Error> {
        let (x, y, z) = self.position;
        Ok(StateVector {
            sv: self.sv,
            epoch: t,
            position: Vector3::new(x, y, z),
            velocity: Vector3::zeros(),
            clock_offset: Duration::ZERO,
        })
    }
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn generic_records() {
    init_logger();
    let t0 = Epoch::from_str("2024-03-01T00:00:00 GPST").unwrap();
    let (g01, e11) = (
        SV::new(Constellation::GPS, 1),
        SV::new(Constellation::Galileo, 11),
    );

    let parked = |toa_hours: f64, rx_hours: f64, position: (f64, f64, f64)| Parked {
        sv: g01,
        toa: t0 + toa_hours * Unit::Hour,
        rx: t0 + rx_hours * Unit::Hour,
        healthy: true,
        position,
    };

    let mut store = AlmanacStore::<Parked>::default();
    assert!(store.add_record(&parked(24.0, 1.0, (1.0, 2.0, 3.0)), g01, g01, true));
    assert!(store.add_record(&parked(48.0, 25.0, (4.0, 5.0, 6.0)), g01, g01, true));
    // relayed by a Galileo satellite, later on
    assert!(store.add_record(&parked(48.0, 26.0, (4.0, 5.0, 6.0)), e11, g01, true));

    assert_eq!(store.sizes(), (2, 3));
    assert_eq!(store.size_for_transmitter(e11), 1);

    let state = store.state_vector(g01, t0 + 12.0 * Unit::Hour).unwrap();
    assert_eq!(state.position, Vector3::new(1.0, 2.0, 3.0));

    let state = store.state_vector(g01, t0 + 30.0 * Unit::Hour).unwrap();
    assert_eq!(state.position, Vector3::new(4.0, 5.0, 6.0));

    let relayed = store
        .find_transmitted(e11, g01, t0 + 12.0 * Unit::Hour)
        .unwrap();
    assert_eq!(relayed.begin_valid(), t0 + 26.0 * Unit::Hour);
}

#[test]
fn almanac_collection() {
    init_logger();
    let cfg = Config::default()
        .with_constellations(&[Constellation::GPS])
        .with_foreign_rejection(true);

    let mut store = AlmanacStore::new(cfg);

    let week = Epoch::from_str("2024-01-07T00:00:00 GPST").unwrap();
    let kepler = Keplerian {
        a: 26559800.0,
        e: 0.0067,
        i_0: 0.967,
        omega_0: -1.52,
        m_0: 0.617,
        omega: 0.43,
    };

    // G03 broadcasts the almanac of each satellite of the constellation,
    // twice a day, for three days. Each almanac remains identical for a day.
    let g03 = SV::new(Constellation::GPS, 3);
    for day in 0..3 {
        let toa = week + (day as f64 + 1.0) * Unit::Day;
        for broadcast in 0..2 {
            let rx = week + day as f64 * Unit::Day + broadcast as f64 * 12.0 * Unit::Hour;
            for prn in 1..=4 {
                let sv = SV::new(Constellation::GPS, prn);
                let alm = KeplerAlmanac::new(sv, toa, rx)
                    .with_keplerian(Keplerian {
                        m_0: kepler.m_0 + prn as f64,
                        ..kepler
                    })
                    .with_clock(prn as f64 * 1.0E-6, 0.0);
                let changed = store.add_record(&alm, g03, sv, true);
                assert_eq!(changed, broadcast == 0, "{}({}) rx={}", toa, sv, rx);
            }
        }
    }

    // foreign almanac
    let e01 = SV::new(Constellation::Galileo, 1);
    let alm = KeplerAlmanac::new(e01, week, week);
    assert!(!store.add_record(&alm, g03, e01, true));

    assert_eq!(store.size(Index::Subject), 12);
    assert_eq!(store.size(Index::Transmit), 12);
    assert_eq!(store.initial_time(), TimeBound::At(week));
    assert_eq!(store.final_time(), TimeBound::At(week + 3.0 * Unit::Day));

    // what a receiver was using in the middle of day 1
    let g02 = SV::new(Constellation::GPS, 2);
    let t = week + 1.5 * Unit::Day;
    let alm = store.find_record(g02, t).unwrap();
    assert_eq!(alm.epoch(), week + 2.0 * Unit::Day);
    assert_eq!(store.is_healthy(g02, t), Ok(true));

    let state = store.state_vector(g02, t).unwrap();
    assert_eq!(state.sv, g02);
    let err = (state.clock_offset.to_seconds() - 2.0E-6).abs();
    assert!(err < 1.0E-9, "clock offset error {}", err);

    // drop day 0 almanacs
    store.edit(week + 2.0 * Unit::Day, TimeBound::EndOfTime);
    assert_eq!(store.sizes(), (8, 8));
    assert_eq!(store.size_for_subject(g02), 2);
    assert_eq!(store.initial_time(), TimeBound::At(week + 2.0 * Unit::Day));
    assert_eq!(store.final_time(), TimeBound::EndOfTime);

    // earliest remaining almanac is now returned before its transmission
    let alm = store.find_record(g02, week).unwrap();
    assert_eq!(alm.epoch(), week + 2.0 * Unit::Day);

    let mut report = Vec::<u8>::new();
    store.dump(&mut report, DumpDetail::Terse).unwrap();
    let report = String::from_utf8(report).unwrap();
    assert!(report.contains(" List of almanacs received from G03"));
    assert_eq!(report.matches("SV G0").count(), 8);

    let e01 = SV::new(Constellation::Galileo, 1);
    assert_eq!(
        store.is_healthy(e01, t),
        Err(Error::InvalidConstellation(Constellation::Galileo))
    );

    store.clear();
    assert_eq!(store.sizes(), (0, 0));
    assert_eq!(store.find_record(g02, t), Err(Error::NotFound(g02)));
}
