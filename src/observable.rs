//! Observation codes, modern (3 characters) and legacy (2 characters)
use thiserror::Error;

use crate::prelude::Constellation;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("observation code should be 3 characters: \"{0}\"")]
    MalformedDescriptor(String),
    #[error("unknown observable kind '{0}'")]
    UnknownKind(char),
    #[error("invalid frequency band '{0}'")]
    InvalidBand(char),
}

/// Kind of physical measurement
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ObservableKind {
    /// Pseudo range, in meters
    PseudoRange,
    /// Carrier phase, in cycles
    Phase,
    /// Doppler shift, in Hz
    Doppler,
    /// Raw signal strength
    SignalStrength,
}

impl ObservableKind {
    /// RINEX letter
    pub fn letter(&self) -> char {
        match self {
            Self::PseudoRange => 'C',
            Self::Phase => 'L',
            Self::Doppler => 'D',
            Self::SignalStrength => 'S',
        }
    }
    /// Identifies [ObservableKind] from RINEX letter
    pub fn from_letter(c: char) -> Result<Self, Error> {
        match c {
            'C' => Ok(Self::PseudoRange),
            'L' => Ok(Self::Phase),
            'D' => Ok(Self::Doppler),
            'S' => Ok(Self::SignalStrength),
            c => Err(Error::UnknownKind(c)),
        }
    }
}

/// [ObservationCode] is one modern (RINEX 3/4) observable,
/// for instance `C1C` (pseudo range, L1 band, C/A tracking),
/// tied to the satellite system it was declared for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObservationCode {
    /// Satellite system
    pub system: Constellation,
    /// Kind of measurement
    pub kind: ObservableKind,
    /// Frequency band number
    pub band: u8,
    /// Tracking mode / channel attribute
    pub attribute: char,
}

impl ObservationCode {
    /// Parses a 3 character descriptor declared for this system.
    pub fn parse(system: Constellation, descriptor: &str) -> Result<Self, Error> {
        let chars = descriptor.trim().chars().collect::<Vec<_>>();
        if chars.len() != 3 {
            return Err(Error::MalformedDescriptor(descriptor.to_string()));
        }
        let kind = ObservableKind::from_letter(chars[0])?;
        let band = chars[1]
            .to_digit(10)
            .ok_or(Error::InvalidBand(chars[1]))? as u8;
        if !chars[2].is_ascii_alphanumeric() {
            return Err(Error::MalformedDescriptor(descriptor.to_string()));
        }
        Ok(Self {
            system,
            kind,
            band,
            attribute: chars[2],
        })
    }
}

impl std::fmt::Display for ObservationCode {
    /// Formats self as 3 character descriptor, like "L1C"
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}{}{}", self.kind.letter(), self.band, self.attribute)
    }
}

/// [LegacyCode] is one RINEX 2 observable: `C1`, `P1`, `L2`...
/// The ordering is the canonical header ordering:
/// by frequency band, then `C P L D S`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LegacyCode {
    /// One of `C P L D S`
    pub letter: char,
    /// Frequency band number
    pub band: u8,
}

/// Bands of the legacy format first, then the modern bands
const BAND_ORDER: [u8; 9] = [1, 2, 5, 6, 7, 8, 3, 4, 9];
const LETTER_ORDER: [char; 5] = ['C', 'P', 'L', 'D', 'S'];

impl LegacyCode {
    pub const fn new(letter: char, band: u8) -> Self {
        Self { letter, band }
    }
    fn sort_key(&self) -> (usize, u8, usize, char) {
        let band = BAND_ORDER
            .iter()
            .position(|b| *b == self.band)
            .unwrap_or(BAND_ORDER.len());
        let letter = LETTER_ORDER
            .iter()
            .position(|l| *l == self.letter)
            .unwrap_or(LETTER_ORDER.len());
        (band, self.band, letter, self.letter)
    }
}

impl PartialOrd for LegacyCode {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LegacyCode {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl std::fmt::Display for LegacyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}{}", self.letter, self.band)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn observation_code_parsing() {
        let code = ObservationCode::parse(Constellation::GPS, "C1C").unwrap();
        assert_eq!(code.kind, ObservableKind::PseudoRange);
        assert_eq!(code.band, 1);
        assert_eq!(code.attribute, 'C');
        assert_eq!(code.to_string(), "C1C");

        let code = ObservationCode::parse(Constellation::Galileo, " L5Q").unwrap();
        assert_eq!(code.kind, ObservableKind::Phase);
        assert_eq!(code.band, 5);
        assert_eq!(code.attribute, 'Q');

        for descriptor in ["C1", "X1C", "CAC", "C1CC", ""] {
            assert!(ObservationCode::parse(Constellation::GPS, descriptor).is_err());
        }
    }
    #[test]
    fn legacy_code_ordering() {
        let mut codes = vec![
            LegacyCode::new('S', 2),
            LegacyCode::new('L', 1),
            LegacyCode::new('P', 2),
            LegacyCode::new('C', 5),
            LegacyCode::new('C', 1),
            LegacyCode::new('D', 1),
        ];
        codes.sort();
        let codes = codes.iter().map(|c| c.to_string()).collect::<Vec<_>>();
        assert_eq!(codes, vec!["C1", "L1", "D1", "P2", "S2", "C5"]);

        let mut codes = vec![
            LegacyCode::new('L', 4),
            LegacyCode::new('C', 3),
            LegacyCode::new('C', 9),
            LegacyCode::new('C', 8),
            LegacyCode::new('C', 4),
        ];
        codes.sort();
        let codes = codes.iter().map(|c| c.to_string()).collect::<Vec<_>>();
        assert_eq!(codes, vec!["C8", "C3", "C4", "L4", "C9"]);
    }
}
