//! Observation code table: how modern observables collapse
//! onto the legacy RINEX 2 observables.
//!
//! The table is plain data. For each (system, kind, band) it lists the legacy
//! slots in priority order, and for each slot the tracking attributes it accepts,
//! best first. New revisions only need to edit [ENTRIES].
use std::collections::BTreeMap;

use itertools::Itertools;

use crate::{
    observable::{LegacyCode, ObservableKind, ObservationCode},
    prelude::{Constellation, Error},
};

#[cfg(feature = "serde")]
use serde::Serialize;

/// Revision of [ENTRIES]
pub const TABLE_REVISION: &str = "2.11-r2";

/// One legacy slot of the table
#[derive(Debug, Clone, PartialEq)]
pub struct TableEntry {
    pub system: Constellation,
    pub kind: ObservableKind,
    pub band: u8,
    /// Legacy observable this entry feeds
    pub legacy: LegacyCode,
    /// Accepted attributes, by decreasing priority
    pub attributes: &'static str,
}

const fn entry(
    system: Constellation,
    kind: ObservableKind,
    band: u8,
    letter: char,
    attributes: &'static str,
) -> TableEntry {
    TableEntry {
        system,
        kind,
        band,
        legacy: LegacyCode::new(letter, band),
        attributes,
    }
}

use crate::observable::ObservableKind::{
    Doppler as D, Phase as L, PseudoRange as C, SignalStrength as S,
};
use crate::prelude::Constellation::{
    BeiDou as BDS, Galileo as GAL, Glonass as GLO, IRNSS as IRN, QZSS as QZS, SBAS, GPS,
};

/// Table content. Within one (system, kind, band), entry order is the priority
/// among legacy slots: precise code tracking (P1/P2) ranks above civil codes.
/// Pilot (or combined) tracking ranks above data tracking,
/// semi codeless and codeless tracking rank last.
pub static ENTRIES: [TableEntry; 122] = [
    // GPS L1
    entry(GPS, C, 1, 'P', "WPY"),
    entry(GPS, C, 1, 'C', "CSLX"),
    entry(GPS, L, 1, 'L', "CWPYSLX"),
    entry(GPS, D, 1, 'D', "CWPYSLX"),
    entry(GPS, S, 1, 'S', "CWPYSLX"),
    // GPS L2
    entry(GPS, C, 2, 'P', "WPYD"),
    entry(GPS, C, 2, 'C', "CSLX"),
    entry(GPS, L, 2, 'L', "WPYDCSLX"),
    entry(GPS, D, 2, 'D', "WPYDCSLX"),
    entry(GPS, S, 2, 'S', "WPYDCSLX"),
    // GPS L5
    entry(GPS, C, 5, 'C', "QXI"),
    entry(GPS, L, 5, 'L', "QXI"),
    entry(GPS, D, 5, 'D', "QXI"),
    entry(GPS, S, 5, 'S', "QXI"),
    // Glonass G1
    entry(GLO, C, 1, 'P', "P"),
    entry(GLO, C, 1, 'C', "C"),
    entry(GLO, L, 1, 'L', "CP"),
    entry(GLO, D, 1, 'D', "CP"),
    entry(GLO, S, 1, 'S', "CP"),
    // Glonass G2
    entry(GLO, C, 2, 'P', "P"),
    entry(GLO, C, 2, 'C', "C"),
    entry(GLO, L, 2, 'L', "PC"),
    entry(GLO, D, 2, 'D', "PC"),
    entry(GLO, S, 2, 'S', "PC"),
    // Glonass G3 (CDMA)
    entry(GLO, C, 3, 'C', "QXI"),
    entry(GLO, L, 3, 'L', "QXI"),
    entry(GLO, D, 3, 'D', "QXI"),
    entry(GLO, S, 3, 'S', "QXI"),
    // Glonass G1a (CDMA)
    entry(GLO, C, 4, 'C', "BXA"),
    entry(GLO, L, 4, 'L', "BXA"),
    entry(GLO, D, 4, 'D', "BXA"),
    entry(GLO, S, 4, 'S', "BXA"),
    // Glonass G2a (CDMA)
    entry(GLO, C, 6, 'C', "BXA"),
    entry(GLO, L, 6, 'L', "BXA"),
    entry(GLO, D, 6, 'D', "BXA"),
    entry(GLO, S, 6, 'S', "BXA"),
    // Galileo E1
    entry(GAL, C, 1, 'C', "CXBAZ"),
    entry(GAL, L, 1, 'L', "CXBAZ"),
    entry(GAL, D, 1, 'D', "CXBAZ"),
    entry(GAL, S, 1, 'S', "CXBAZ"),
    // Galileo E5a
    entry(GAL, C, 5, 'C', "QXI"),
    entry(GAL, L, 5, 'L', "QXI"),
    entry(GAL, D, 5, 'D', "QXI"),
    entry(GAL, S, 5, 'S', "QXI"),
    // Galileo E6
    entry(GAL, C, 6, 'C', "CXBAZ"),
    entry(GAL, L, 6, 'L', "CXBAZ"),
    entry(GAL, D, 6, 'D', "CXBAZ"),
    entry(GAL, S, 6, 'S', "CXBAZ"),
    // Galileo E5b
    entry(GAL, C, 7, 'C', "QXI"),
    entry(GAL, L, 7, 'L', "QXI"),
    entry(GAL, D, 7, 'D', "QXI"),
    entry(GAL, S, 7, 'S', "QXI"),
    // Galileo E5 (a+b)
    entry(GAL, C, 8, 'C', "QXI"),
    entry(GAL, L, 8, 'L', "QXI"),
    entry(GAL, D, 8, 'D', "QXI"),
    entry(GAL, S, 8, 'S', "QXI"),
    // BeiDou band 1: B1C (RINEX 3.04 onwards) or B1I (RINEX 3.02).
    // One file only ever uses one of the two signals.
    entry(BDS, C, 1, 'C', "PXDIQ"),
    entry(BDS, L, 1, 'L', "PXDIQ"),
    entry(BDS, D, 1, 'D', "PXDIQ"),
    entry(BDS, S, 1, 'S', "PXDIQ"),
    // BeiDou B1I
    entry(BDS, C, 2, 'C', "IQX"),
    entry(BDS, L, 2, 'L', "IQX"),
    entry(BDS, D, 2, 'D', "IQX"),
    entry(BDS, S, 2, 'S', "IQX"),
    // BeiDou B2a
    entry(BDS, C, 5, 'C', "PXD"),
    entry(BDS, L, 5, 'L', "PXD"),
    entry(BDS, D, 5, 'D', "PXD"),
    entry(BDS, S, 5, 'S', "PXD"),
    // BeiDou B2I, B2b
    entry(BDS, C, 7, 'C', "IQXPZD"),
    entry(BDS, L, 7, 'L', "IQXPZD"),
    entry(BDS, D, 7, 'D', "IQXPZD"),
    entry(BDS, S, 7, 'S', "IQXPZD"),
    // BeiDou B3
    entry(BDS, C, 6, 'C', "IQXA"),
    entry(BDS, L, 6, 'L', "IQXA"),
    entry(BDS, D, 6, 'D', "IQXA"),
    entry(BDS, S, 6, 'S', "IQXA"),
    // BeiDou B2 (a+b)
    entry(BDS, C, 8, 'C', "PXD"),
    entry(BDS, L, 8, 'L', "PXD"),
    entry(BDS, D, 8, 'D', "PXD"),
    entry(BDS, S, 8, 'S', "PXD"),
    // QZSS L1
    entry(QZS, C, 1, 'C', "CLXSZEB"),
    entry(QZS, L, 1, 'L', "CLXSZEB"),
    entry(QZS, D, 1, 'D', "CLXSZEB"),
    entry(QZS, S, 1, 'S', "CLXSZEB"),
    // QZSS L2
    entry(QZS, C, 2, 'C', "LXS"),
    entry(QZS, L, 2, 'L', "LXS"),
    entry(QZS, D, 2, 'D', "LXS"),
    entry(QZS, S, 2, 'S', "LXS"),
    // QZSS L5
    entry(QZS, C, 5, 'C', "QXIPZD"),
    entry(QZS, L, 5, 'L', "QXIPZD"),
    entry(QZS, D, 5, 'D', "QXIPZD"),
    entry(QZS, S, 5, 'S', "QXIPZD"),
    // QZSS L6
    entry(QZS, C, 6, 'C', "LXSEZ"),
    entry(QZS, L, 6, 'L', "LXSEZ"),
    entry(QZS, D, 6, 'D', "LXSEZ"),
    entry(QZS, S, 6, 'S', "LXSEZ"),
    // IRNSS L5
    entry(IRN, C, 5, 'C', "CXAB"),
    entry(IRN, L, 5, 'L', "CXAB"),
    entry(IRN, D, 5, 'D', "CXAB"),
    entry(IRN, S, 5, 'S', "CXAB"),
    // IRNSS S
    entry(IRN, C, 9, 'C', "CXAB"),
    entry(IRN, L, 9, 'L', "CXAB"),
    entry(IRN, D, 9, 'D', "CXAB"),
    entry(IRN, S, 9, 'S', "CXAB"),
    // SBAS L1
    entry(SBAS, C, 1, 'C', "C"),
    entry(SBAS, L, 1, 'L', "C"),
    entry(SBAS, D, 1, 'D', "C"),
    entry(SBAS, S, 1, 'S', "C"),
    // SBAS L5
    entry(SBAS, C, 5, 'C', "QXI"),
    entry(SBAS, L, 5, 'L', "QXI"),
    entry(SBAS, D, 5, 'D', "QXI"),
    entry(SBAS, S, 5, 'S', "QXI"),
    // GPS L1/L2 M code, semi codeless and codeless variants, lowest priority
    entry(GPS, C, 1, 'C', "M"),
    entry(GPS, L, 1, 'L', "MN"),
    entry(GPS, D, 1, 'D', "MN"),
    entry(GPS, S, 1, 'S', "MN"),
    entry(GPS, C, 2, 'C', "M"),
    entry(GPS, L, 2, 'L', "MN"),
    entry(GPS, D, 2, 'D', "MN"),
    entry(GPS, S, 2, 'S', "MN"),
    // Glonass G1/G2 combined tracking
    entry(GLO, L, 1, 'L', "X"),
    entry(GLO, L, 2, 'L', "X"),
];

/// Outcome of [ObservationCodeTable::resolve]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Legacy observable
    pub legacy: LegacyCode,
    /// Modern observable elected to feed it
    pub code: ObservationCode,
}

/// [ObservationCodeTable] maps modern observables to legacy observables.
/// It is immutable and shared by all conversions.
#[derive(Debug)]
pub struct ObservationCodeTable {
    revision: &'static str,
    entries: &'static [TableEntry],
}

static STANDARD: ObservationCodeTable = ObservationCodeTable {
    revision: TABLE_REVISION,
    entries: &ENTRIES,
};

impl ObservationCodeTable {
    /// The standard table
    pub fn standard() -> &'static Self {
        &STANDARD
    }

    /// Table revision
    pub fn revision(&self) -> &str {
        self.revision
    }

    fn entries_for(
        &self,
        system: Constellation,
        kind: ObservableKind,
        band: u8,
    ) -> impl Iterator<Item = &TableEntry> {
        self.entries
            .iter()
            .filter(move |e| e.system == system && e.kind == kind && e.band == band)
    }

    /// All (system, kind, band) triplets this table knows, in table order.
    pub fn pairs(&self) -> Vec<(Constellation, ObservableKind, u8)> {
        self.entries
            .iter()
            .map(|e| (e.system, e.kind, e.band))
            .unique()
            .collect()
    }

    /// Every attribute known for this (system, kind, band), by decreasing priority.
    pub fn attributes(&self, system: Constellation, kind: ObservableKind, band: u8) -> Vec<char> {
        self.entries_for(system, kind, band)
            .flat_map(|e| e.attributes.chars())
            .collect()
    }

    /// Highest priority resolution for this (system, kind, band).
    pub fn highest_priority(
        &self,
        system: Constellation,
        kind: ObservableKind,
        band: u8,
    ) -> Option<Resolution> {
        let entry = self.entries_for(system, kind, band).next()?;
        let attribute = entry.attributes.chars().next()?;
        Some(Resolution {
            legacy: entry.legacy,
            code: ObservationCode {
                system,
                kind,
                band,
                attribute,
            },
        })
    }

    /// Elects the best candidate attribute for this (system, kind, band)
    /// and returns the legacy observable it feeds.
    /// Fails when the table has no entry for this triplet, or
    /// when none of the candidates is known.
    pub fn resolve(
        &self,
        system: Constellation,
        kind: ObservableKind,
        band: u8,
        candidates: &[char],
    ) -> Result<Resolution, Error> {
        for entry in self.entries_for(system, kind, band) {
            if let Some(attribute) = entry.attributes.chars().find(|a| candidates.contains(a)) {
                return Ok(Resolution {
                    legacy: entry.legacy,
                    code: ObservationCode {
                        system,
                        kind,
                        band,
                        attribute,
                    },
                });
            }
        }
        Err(Error::UnsupportedObservable {
            system,
            code: candidates
                .iter()
                .map(|a| format!("{}{}{}", kind.letter(), band, a))
                .join(","),
        })
    }

    /// Legacy observable this modern observable feeds
    pub fn legacy_code(&self, code: &ObservationCode) -> Result<LegacyCode, Error> {
        self.entries_for(code.system, code.kind, code.band)
            .find(|e| e.attributes.contains(code.attribute))
            .map(|e| e.legacy)
            .ok_or(Error::UnsupportedObservable {
                system: code.system,
                code: code.to_string(),
            })
    }

    /// Builds the [LegacyLayout] for these declared observables, restricted
    /// to the selected systems (in order, first is primary).
    pub fn layout(
        &self,
        declared: &BTreeMap<Constellation, Vec<ObservationCode>>,
        systems: &[Constellation],
    ) -> Result<LegacyLayout, Error> {
        let mut layouts = Vec::with_capacity(systems.len());
        for system in systems.iter() {
            let codes = match declared.get(system) {
                Some(codes) => codes,
                None => continue,
            };
            let mut slots = BTreeMap::<LegacyCode, Vec<ObservationCode>>::new();
            for code in codes.iter() {
                let legacy = self.legacy_code(code)?;
                slots.entry(legacy).or_default().push(*code);
            }
            let slots = slots
                .into_iter()
                .map(|(legacy, mut candidates)| {
                    candidates.sort_by_key(|c| self.rank(c));
                    SlotAssignment { legacy, candidates }
                })
                .collect::<Vec<_>>();
            layouts.push(SystemLayout {
                system: *system,
                slots,
            });
        }

        let types = layouts
            .iter()
            .flat_map(|l| l.slots.iter().map(|s| s.legacy))
            .unique()
            .sorted()
            .collect();

        Ok(LegacyLayout {
            systems: layouts,
            types,
        })
    }

    /// Priority rank of this observable, lower is better.
    fn rank(&self, code: &ObservationCode) -> usize {
        self.attributes(code.system, code.kind, code.band)
            .iter()
            .position(|a| *a == code.attribute)
            .unwrap_or(usize::MAX)
    }
}

/// Modern observables feeding one legacy slot, best first
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SlotAssignment {
    pub legacy: LegacyCode,
    pub candidates: Vec<ObservationCode>,
}

impl SlotAssignment {
    /// Candidate attributes, best first
    pub fn attributes(&self) -> Vec<char> {
        self.candidates.iter().map(|c| c.attribute).collect()
    }
}

/// Legacy slots of one satellite system
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SystemLayout {
    pub system: Constellation,
    /// Slots, in canonical legacy order
    pub slots: Vec<SlotAssignment>,
}

impl SystemLayout {
    /// Slot feeding this legacy observable, if any
    pub fn slot(&self, legacy: &LegacyCode) -> Option<&SlotAssignment> {
        self.slots.iter().find(|s| s.legacy == *legacy)
    }
    /// Legacy observables declared for this system
    pub fn legacy_codes(&self) -> Vec<LegacyCode> {
        self.slots.iter().map(|s| s.legacy).collect()
    }
}

/// [LegacyLayout] describes the observables of a legacy file:
/// the header type list and the per system slot assignments.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct LegacyLayout {
    /// Per system slots, in selection order
    pub systems: Vec<SystemLayout>,
    /// Union of all legacy observables, canonical order
    pub types: Vec<LegacyCode>,
}

impl LegacyLayout {
    /// [SystemLayout] of this system
    pub fn system(&self, system: Constellation) -> Option<&SystemLayout> {
        self.systems.iter().find(|l| l.system == system)
    }
    /// Returns true when more than one system is to be encoded
    pub fn is_mixed(&self) -> bool {
        self.systems.len() > 1
    }
    /// Legacy observables declared for this system
    pub fn legacy_codes(&self, system: Constellation) -> Vec<LegacyCode> {
        self.system(system)
            .map(|l| l.legacy_codes())
            .unwrap_or_default()
    }
}
