use std::io::Write;

use itertools::Itertools;

use super::{AlmanacStore, Index};
use crate::almanac::AlmanacRecord;

/// Level of detail of [AlmanacStore::dump]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum DumpDetail {
    /// Time span and almanac count per satellite
    #[default]
    Summary,
    /// One line per almanac
    Terse,
    /// Complete description of each almanac
    Full,
}

impl<A: AlmanacRecord> AlmanacStore<A> {
    /// Writes a human readable report of both indexes
    pub fn dump<W: Write>(&self, w: &mut W, detail: DumpDetail) -> std::io::Result<()> {
        self.dump_subjects(w, detail)?;
        self.dump_transmitters(w, detail)
    }
    /// Writes a report of the subject index, in epoch order
    pub fn dump_subjects<W: Write>(&self, w: &mut W, detail: DumpDetail) -> std::io::Result<()> {
        writeln!(w)?;
        writeln!(
            w,
            "Dump of almanac store by satellite that is the SUBJECT of each almanac:"
        )?;
        if detail == DumpDetail::Summary {
            writeln!(
                w,
                " Span is {} to {} with {} entries.",
                self.initial_time,
                self.final_time,
                self.size(Index::Subject)
            )?;
        }
        for (sv, map) in self.subjects.iter() {
            writeln!(
                w,
                "  Almanac list for satellite {} has {} entries.",
                sv,
                map.len()
            )?;
            match detail {
                DumpDetail::Summary => {},
                DumpDetail::Terse => {
                    for (key, handle) in map.iter() {
                        let alm = self.arena.get(handle);
                        writeln!(
                            w,
                            "SV {} TOE {} KEY {} begVal: {}",
                            sv,
                            alm.epoch(),
                            key,
                            alm.begin_valid()
                        )?;
                    }
                },
                DumpDetail::Full => {
                    for (_, handle) in map.iter() {
                        self.arena.get(handle).dump(w)?;
                    }
                },
            }
        }
        Ok(())
    }
    /// Writes a report of the transmit index. Each transmitter's almanacs are listed
    /// in reception order, regardless of the satellite they describe.
    pub fn dump_transmitters<W: Write>(
        &self,
        w: &mut W,
        detail: DumpDetail,
    ) -> std::io::Result<()> {
        writeln!(w, "Dump of almanac store by transmitting satellite:")?;
        if detail == DumpDetail::Summary {
            writeln!(
                w,
                " Span is {} to {} with {} entries.",
                self.initial_time,
                self.final_time,
                self.size(Index::Transmit)
            )?;
            for transmitter in self.transmitters.keys() {
                writeln!(
                    w,
                    "  {} transmitted {} entries.",
                    transmitter,
                    self.size_for_transmitter(*transmitter)
                )?;
            }
            return Ok(());
        }
        for transmitter in self.transmitters.keys() {
            writeln!(w)?;
            writeln!(w, " List of almanacs received from {}", transmitter)?;
            if detail == DumpDetail::Terse {
                writeln!(w, "{}", A::terse_header())?;
            }
            let received = self
                .transmitted_handles(transmitter)
                .into_iter()
                .map(|handle| self.arena.get(handle))
                .sorted_by_key(|alm| alm.begin_valid());
            for alm in received {
                if detail == DumpDetail::Full {
                    alm.dump(w)?;
                } else {
                    alm.dump_terse(w)?;
                    writeln!(w)?;
                }
            }
        }
        Ok(())
    }
}
