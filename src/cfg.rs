use gnss::prelude::{Constellation, SV};

#[cfg(feature = "serde")]
use serde::Deserialize;

/// [AlmanacStore](crate::prelude::AlmanacStore) configuration.
#[derive(Default, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Constellations this store accepts.
    /// Leave empty to accept any constellation.
    pub constellations: Vec<Constellation>,
    /// When set, almanacs describing a satellite that does not belong
    /// to an accepted constellation are ignored at insertion time.
    /// Otherwise they are stored and only rejected when queried
    /// through constellation sensitive methods.
    pub reject_foreign_constellations: bool,
}

impl Config {
    /// Returns a copy of Self restricted to given constellations
    pub fn with_constellations(&self, constellations: &[Constellation]) -> Self {
        let mut s = self.clone();
        s.constellations = constellations.to_vec();
        s
    }
    /// Returns a copy of Self that will ignore foreign almanacs
    /// at insertion time
    pub fn with_foreign_rejection(&self, reject: bool) -> Self {
        let mut s = self.clone();
        s.reject_foreign_constellations = reject;
        s
    }
    /// Returns true if this [SV] belongs to an accepted constellation
    pub(crate) fn accepts(&self, sv: SV) -> bool {
        self.constellations.is_empty() || self.constellations.contains(&sv.constellation)
    }
}

#[cfg(test)]
mod test {
    use super::Config;
    use gnss::prelude::{Constellation, SV};
    #[test]
    fn default_accepts_everything() {
        let cfg = Config::default();
        for sv in [
            SV::new(Constellation::GPS, 1),
            SV::new(Constellation::Galileo, 12),
            SV::new(Constellation::BeiDou, 30),
            SV::new(Constellation::Glonass, 4),
        ] {
            assert!(cfg.accepts(sv), "{} should be accepted", sv);
        }
        assert!(!cfg.reject_foreign_constellations);
    }
    #[test]
    fn constellation_filter() {
        let cfg = Config::default()
            .with_constellations(&[Constellation::GPS, Constellation::QZSS])
            .with_foreign_rejection(true);
        assert!(cfg.accepts(SV::new(Constellation::GPS, 5)));
        assert!(cfg.accepts(SV::new(Constellation::QZSS, 1)));
        assert!(!cfg.accepts(SV::new(Constellation::Galileo, 5)));
        assert!(cfg.reject_foreign_constellations);
    }
}
