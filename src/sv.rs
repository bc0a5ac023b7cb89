//! Satellite identification
use thiserror::Error;

use crate::prelude::Constellation;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// [SatelliteId] identifies one vehicle: satellite system and PRN number.
/// It is parsed from and formatted to the `XYY` RINEX convention,
/// `X` being the 1-letter system code.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SatelliteId {
    /// Satellite system this vehicle belongs to
    pub system: Constellation,
    /// PRN number
    pub prn: u8,
}

/// [SatelliteId] parsing errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParsingError {
    #[error("satellite identifier is too short")]
    TooShort,
    #[error("unknown satellite system \"{0}\"")]
    System(String),
    #[error("prn# parsing error")]
    PRNParsing(#[from] std::num::ParseIntError),
}

impl SatelliteId {
    /// Builds a new [SatelliteId]
    pub fn new(system: Constellation, prn: u8) -> Self {
        Self { system, prn }
    }
}

impl std::str::FromStr for SatelliteId {
    type Err = ParsingError;
    /*
     * Parses "XYY", tolerating a blank padded PRN ("G 1")
     * and trailing whitespaces.
     */
    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let content = string.trim_end();
        let letter = content.get(0..1).ok_or(ParsingError::TooShort)?;
        let prn = content.get(1..).ok_or(ParsingError::TooShort)?.trim();
        if prn.is_empty() {
            return Err(ParsingError::TooShort);
        }
        let system = match letter {
            "G" => Constellation::GPS,
            "R" => Constellation::Glonass,
            "E" => Constellation::Galileo,
            "C" => Constellation::BeiDou,
            "J" => Constellation::QZSS,
            "I" => Constellation::IRNSS,
            "S" => Constellation::SBAS,
            _ => return Err(ParsingError::System(letter.to_string())),
        };
        let prn = prn.parse::<u8>()?;
        Ok(Self { system, prn })
    }
}

impl std::fmt::Display for SatelliteId {
    /*
     * Formats self with the legacy 1-letter + 2-digit convention
     */
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:x}{:02}", self.system, self.prn)
    }
}
