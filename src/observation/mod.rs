//! Observation record
use std::collections::BTreeMap;

use bitflags::bitflags;
use thiserror::Error;

use crate::{
    observable::ObservationCode,
    prelude::{Epoch, SatelliteId},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub(crate) mod formatting;
pub(crate) mod parsing;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlagError {
    #[error("unknown epoch flag \"{0}\"")]
    UnknownValue(String),
}

/// [EpochFlag] validates an epoch,
/// or describes possible events that occurred
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EpochFlag {
    /// Epoch is sane
    #[default]
    Ok,
    /// Power failure since previous epoch
    PowerFailure,
    /// Antenna is being moved at current epoch
    AntennaBeingMoved,
    /// Site has changed, received has moved since last epoch
    NewSiteOccupation,
    /// New information to come after this epoch
    HeaderInformationFollows,
    /// External event - significant event in this epoch
    ExternalEvent,
    /// Cycle slip records follow
    CycleSlip,
}

impl EpochFlag {
    /// Returns true if this epoch carries observations
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok | Self::PowerFailure)
    }
    /// Returns true if this epoch is followed by special records
    /// rather than observations
    pub fn is_event(&self) -> bool {
        !self.is_ok()
    }
}

impl std::str::FromStr for EpochFlag {
    type Err = FlagError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0" | "" => Ok(Self::Ok),
            "1" => Ok(Self::PowerFailure),
            "2" => Ok(Self::AntennaBeingMoved),
            "3" => Ok(Self::NewSiteOccupation),
            "4" => Ok(Self::HeaderInformationFollows),
            "5" => Ok(Self::ExternalEvent),
            "6" => Ok(Self::CycleSlip),
            s => Err(FlagError::UnknownValue(s.to_string())),
        }
    }
}

impl std::fmt::Display for EpochFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Ok => "0".fmt(f),
            Self::PowerFailure => "1".fmt(f),
            Self::AntennaBeingMoved => "2".fmt(f),
            Self::NewSiteOccupation => "3".fmt(f),
            Self::HeaderInformationFollows => "4".fmt(f),
            Self::ExternalEvent => "5".fmt(f),
            Self::CycleSlip => "6".fmt(f),
        }
    }
}

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct LliFlags: u8 {
        /// Current epoch is marked Ok or Unknown status
        const OK_OR_UNKNOWN = 0x00;
        /// Lock lost between previous observation and current observation,
        /// cycle slip is possible
        const LOCK_LOSS = 0x01;
        /// Half cycle slip marker
        const HALF_CYCLE_SLIP = 0x02;
        /// Observing under anti spoofing,
        /// might suffer from decreased SNR - decreased signal quality
        const UNDER_ANTI_SPOOFING = 0x04;
    }
}

/// One measurement, with its optional flags
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObservationValue {
    /// Physical measurement
    pub value: f64,
    /// Lock loss indicator
    pub lli: Option<LliFlags>,
    /// Signal strength indicator (0-9)
    pub snr: Option<u8>,
}

impl ObservationValue {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            lli: None,
            snr: None,
        }
    }
    pub fn with_lli(&self, lli: LliFlags) -> Self {
        let mut s = *self;
        s.lli = Some(lli);
        s
    }
    pub fn with_snr(&self, snr: u8) -> Self {
        let mut s = *self;
        s.snr = Some(snr);
        s
    }
}

/// Observations of one satellite at one epoch.
/// Observables that were not reported are simply absent.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SatelliteObservation {
    pub sv: SatelliteId,
    pub values: BTreeMap<ObservationCode, ObservationValue>,
}

/// One observation epoch
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EpochRecord {
    /// Sampling instant, in GPST
    pub epoch: Epoch,
    pub flag: EpochFlag,
    /// Receiver clock offset, in seconds
    pub clock_offset: Option<f64>,
    /// Satellites, in file order
    pub satellites: Vec<SatelliteObservation>,
}

impl EpochRecord {
    /// Satellites of this system, in file order
    pub fn satellites_of(
        &self,
        system: crate::prelude::Constellation,
    ) -> impl Iterator<Item = &SatelliteObservation> {
        self.satellites.iter().filter(move |s| s.sv.system == system)
    }
}

/// Event epoch (flag 2 to 6) and its special records, kept verbatim
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventRecord {
    /// 0-based ordinal of this block among all epoch blocks
    pub index: usize,
    /// Event timestamp, when one was provided
    pub epoch: Option<Epoch>,
    pub flag: EpochFlag,
    /// Special records
    pub records: Vec<String>,
}
