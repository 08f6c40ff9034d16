use hifitime::Epoch;

#[cfg(feature = "serde")]
use serde::Deserialize;

/// [TimeBound] extends [Epoch] with the two open ends of the time line,
/// so a store span can be unbounded on either side.
/// Variants are declared in chronological order, which is what the
/// derived ordering relies on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub enum TimeBound {
    /// Earlier than any [Epoch]
    BeginningOfTime,
    /// Bounded instant
    At(Epoch),
    /// Later than any [Epoch]
    EndOfTime,
}

impl TimeBound {
    /// Returns the bounded [Epoch], if any
    pub fn epoch(&self) -> Option<Epoch> {
        match self {
            Self::At(t) => Some(*t),
            _ => None,
        }
    }
    /// Returns true if this is one of the two open ends
    pub fn is_unbounded(&self) -> bool {
        !matches!(self, Self::At(_))
    }
    /// Returns true if `t` lies within [self, end], both ends included
    pub(crate) fn spans(&self, end: &Self, t: Epoch) -> bool {
        let t = Self::At(t);
        *self <= t && t <= *end
    }
}

impl From<Epoch> for TimeBound {
    fn from(t: Epoch) -> Self {
        Self::At(t)
    }
}

impl std::fmt::Display for TimeBound {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::BeginningOfTime => write!(f, "Begin_time"),
            Self::At(t) => write!(f, "{}", t),
            Self::EndOfTime => write!(f, "End_time"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::TimeBound;
    use hifitime::Epoch;
    use std::str::FromStr;
    #[test]
    fn chronological_order() {
        let t0 = Epoch::from_str("1980-01-06T00:00:00 GPST").unwrap();
        let t1 = Epoch::from_str("2024-01-01T00:00:00 GPST").unwrap();
        assert!(TimeBound::BeginningOfTime < TimeBound::At(t0));
        assert!(TimeBound::At(t0) < TimeBound::At(t1));
        assert!(TimeBound::At(t1) < TimeBound::EndOfTime);
        assert!(TimeBound::BeginningOfTime < TimeBound::EndOfTime);
    }
    #[test]
    fn inclusive_span() {
        let t0 = Epoch::from_str("2024-01-01T00:00:00 GPST").unwrap();
        let t1 = Epoch::from_str("2024-01-02T00:00:00 GPST").unwrap();
        let t2 = Epoch::from_str("2024-01-03T00:00:00 GPST").unwrap();

        let (start, end) = (TimeBound::At(t0), TimeBound::At(t1));
        assert!(start.spans(&end, t0));
        assert!(start.spans(&end, t1));
        assert!(!start.spans(&end, t2));

        assert!(TimeBound::BeginningOfTime.spans(&TimeBound::EndOfTime, t2));
        assert!(!TimeBound::EndOfTime.spans(&TimeBound::BeginningOfTime, t2));
    }
    #[test]
    fn display() {
        assert_eq!(TimeBound::BeginningOfTime.to_string(), "Begin_time");
        assert_eq!(TimeBound::EndOfTime.to_string(), "End_time");
        let t = Epoch::from_str("2024-01-01T00:00:00 GPST").unwrap();
        assert_eq!(TimeBound::At(t).to_string(), t.to_string());
        assert_eq!(TimeBound::from(t).epoch(), Some(t));
        assert!(TimeBound::EndOfTime.is_unbounded());
    }
}
