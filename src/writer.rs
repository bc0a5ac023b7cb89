//! RINEX 2.11 observation file writer
use std::{
    collections::BTreeSet,
    io::{BufWriter, Write},
    path::Path,
};

use log::debug;

use crate::{
    codes::{LegacyLayout, ObservationCodeTable, SystemLayout},
    observable::LegacyCode,
    observation::{
        formatting::{format_epoch_v2, format_observations_v2},
        ObservationValue, SatelliteObservation,
    },
    output::OutputFile,
    prelude::{Constellation, Error, Rinex3Document},
};

/// What a [Rinex2Writer] produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteSummary {
    /// Legacy observables declared in the header
    pub types: Vec<LegacyCode>,
    /// Number of epochs written
    pub epochs: usize,
    /// Number of satellite observation groups written
    pub satellites: usize,
}

/// [Rinex2Writer] encodes a [Rinex3Document] as a RINEX 2.11 file,
/// collapsing observables with an [ObservationCodeTable].
#[derive(Debug, Clone)]
pub struct Rinex2Writer {
    table: &'static ObservationCodeTable,
    systems: Vec<Constellation>,
}

impl Default for Rinex2Writer {
    /// Writes GPS only, using the standard table
    fn default() -> Self {
        Self {
            table: ObservationCodeTable::standard(),
            systems: vec![Constellation::GPS],
        }
    }
}

impl Rinex2Writer {
    /// Builds a [Rinex2Writer] that encodes these systems
    pub fn new(systems: &[Constellation]) -> Self {
        Self {
            systems: systems.to_vec(),
            ..Default::default()
        }
    }

    /// Copies and returns [Rinex2Writer] with a different table
    pub fn with_table(&self, table: &'static ObservationCodeTable) -> Self {
        let mut s = self.clone();
        s.table = table;
        s
    }

    /// Legacy layout this writer uses for this document
    pub fn layout(&self, doc: &Rinex3Document) -> Result<LegacyLayout, Error> {
        self.table.layout(&doc.header.codes, &self.systems)
    }

    /// Writes this document to a new file. Any previous file is overwritten.
    /// On failure, no (partial) file remains.
    pub fn write<P: AsRef<Path>>(
        &self,
        doc: &Rinex3Document,
        path: P,
    ) -> Result<WriteSummary, Error> {
        let mut output = OutputFile::create(path)?;
        let summary = self
            .format(doc, output.writer())
            .map_err(|e| output.failure(e))?;
        output.commit()?;
        Ok(summary)
    }

    /// Formats this document into [BufWriter]
    pub fn format<W: Write>(
        &self,
        doc: &Rinex3Document,
        w: &mut BufWriter<W>,
    ) -> Result<WriteSummary, Error> {
        let layout = self.layout(doc)?;
        doc.header.format_v2(w, &layout)?;

        let mut summary = WriteSummary {
            types: layout.types.clone(),
            ..Default::default()
        };

        let mut skipped = BTreeSet::<Constellation>::new();

        for record in doc.epochs.iter() {
            let selected = record
                .satellites
                .iter()
                .filter_map(|sat| match layout.system(sat.sv.system) {
                    Some(system) => Some((system, sat)),
                    None => {
                        if skipped.insert(sat.sv.system) {
                            debug!("{} satellites are not transcribed", sat.sv.system);
                        }
                        None
                    },
                })
                .collect::<Vec<_>>();

            if selected.is_empty() {
                debug!("{}: no satellite to transcribe", record.epoch);
                continue;
            }

            let sv_list = selected.iter().map(|(_, sat)| sat.sv).collect::<Vec<_>>();
            format_epoch_v2(w, record.epoch, record.flag, &sv_list, record.clock_offset)?;

            for (system, sat) in selected.iter() {
                let slots = layout
                    .types
                    .iter()
                    .map(|legacy| self.select(system, legacy, sat))
                    .collect::<Result<Vec<_>, _>>()?;
                format_observations_v2(w, &sat.sv, &slots)?;
            }

            summary.epochs += 1;
            summary.satellites += selected.len();
        }

        w.flush()?;
        Ok(summary)
    }

    /*
     * Elects the observation feeding this legacy slot:
     * the best ranked observable this satellite actually reported.
     */
    fn select(
        &self,
        system: &SystemLayout,
        legacy: &LegacyCode,
        sat: &SatelliteObservation,
    ) -> Result<Option<ObservationValue>, Error> {
        let slot = match system.slot(legacy) {
            Some(slot) => slot,
            None => return Ok(None),
        };
        let observed = slot
            .candidates
            .iter()
            .filter(|code| sat.values.contains_key(code))
            .map(|code| code.attribute)
            .collect::<Vec<_>>();

        let reference = match slot.candidates.first() {
            Some(code) if !observed.is_empty() => code,
            _ => return Ok(None),
        };

        let resolution =
            self.table
                .resolve(reference.system, reference.kind, reference.band, &observed)?;

        Ok(sat.values.get(&resolution.code).copied())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tests::toolkit::{document, observation_code};

    #[test]
    fn best_observed_code_feeds_slot() {
        let doc = document(
            &[("G", &["C1C", "C1W", "L1C", "L2W", "L2X"])],
            &[&[
                ("G01", &[Some(20000000.0), Some(20000001.0), Some(1.0), None, Some(2.0)]),
                ("G02", &[Some(20000000.0), None, Some(1.0), Some(3.0), Some(4.0)]),
            ]],
        );
        let writer = Rinex2Writer::default();
        let layout = writer.layout(&doc).unwrap();
        let types = layout.types.iter().map(|t| t.to_string()).collect::<Vec<_>>();
        assert_eq!(types, vec!["C1", "P1", "L1", "L2"]);

        let gps = layout.system(Constellation::GPS).unwrap();
        let g01 = &doc.epochs[0].satellites[0];
        let g02 = &doc.epochs[0].satellites[1];

        let l2 = LegacyCode::new('L', 2);
        assert_eq!(writer.select(gps, &l2, g01).unwrap().unwrap().value, 2.0);
        assert_eq!(writer.select(gps, &l2, g02).unwrap().unwrap().value, 3.0);

        let p1 = LegacyCode::new('P', 1);
        assert!(writer.select(gps, &p1, g02).unwrap().is_none());

        let c5 = LegacyCode::new('C', 5);
        assert!(writer.select(gps, &c5, g01).unwrap().is_none());
        assert!(g01.values.contains_key(&observation_code("G", "C1W")));
    }

    #[test]
    fn unsupported_observable() {
        let doc = document(&[("G", &["C1C", "C1Z"])], &[]);
        let writer = Rinex2Writer::default();
        assert!(matches!(
            writer.layout(&doc),
            Err(Error::UnsupportedObservable { .. })
        ));
    }
}
