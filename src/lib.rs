#![doc = include_str!("../README.md")]
#![cfg_attr(docrs, feature(doc_cfg))]

extern crate gnss_rs as gnss;

// private modules
mod almanac;
mod cfg;
mod store;
mod time;

// pub export
pub use store::Error;

#[cfg(test)]
mod tests;

// prelude
pub mod prelude {
    pub use crate::almanac::{AlmanacRecord, KeplerAlmanac, Keplerian, StateVector};
    pub use crate::cfg::Config;
    pub use crate::store::{AlmanacStore, DumpDetail, Index};
    pub use crate::time::TimeBound;
    // re-export
    pub use gnss::prelude::{Constellation, SV};
    pub use hifitime::{Duration, Epoch, TimeScale};
    pub use nalgebra::Vector3;
}
