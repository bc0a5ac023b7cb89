//! RINEX 3 observation record parsing
use std::{collections::BTreeMap, str::FromStr};

use crate::{
    epoch::{field, parse_gpst},
    error::EpochFault,
    observable::ObservationCode,
    observation::{EpochFlag, LliFlags, ObservationValue, SatelliteObservation},
    prelude::{Constellation, Epoch, SatelliteId},
};

const SVNN_SIZE: usize = 3;
const OBSERVABLE_F14_WIDTH: usize = 14;
const OBSERVABLE_WIDTH: usize = 16; // F14 +2 flags

/// Content of a `>` epoch descriptor
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EpochDescriptor {
    /// Timestamp, mandatory unless this is an event
    pub epoch: Option<Epoch>,
    pub flag: EpochFlag,
    /// Number of satellites, or special records, that follow
    pub numsat: usize,
    /// Receiver clock offset (s)
    pub clock_offset: Option<f64>,
}

/// Parses a RINEX 3 epoch descriptor:
/// "> yyyy mm dd hh mm ss.sssssss  f nnn      oooooooooooooooo"
pub(crate) fn parse_epoch_descriptor(line: &str) -> Result<EpochDescriptor, EpochFault> {
    if !line.starts_with('>') {
        return Err(EpochFault::UnexpectedLine(line.to_string()));
    }

    let flag = EpochFlag::from_str(field(line, 29, 32))
        .map_err(|_| EpochFault::BadTimestamp(line.to_string()))?;

    let numsat = field(line, 32, 35).trim();
    let numsat = if numsat.is_empty() {
        0
    } else {
        numsat
            .parse::<usize>()
            .map_err(|_| EpochFault::BadTimestamp(line.to_string()))?
    };

    let datetime = field(line, 1, 29);
    let epoch = if flag.is_event() && datetime.trim().is_empty() {
        None
    } else {
        Some(parse_gpst(datetime).map_err(|_| EpochFault::BadTimestamp(line.to_string()))?)
    };

    let clock = field(line, 41, 56).trim();
    let clock_offset = if clock.is_empty() {
        None
    } else {
        Some(
            clock
                .parse::<f64>()
                .map_err(|_| EpochFault::BadTimestamp(line.to_string()))?,
        )
    };

    Ok(EpochDescriptor {
        epoch,
        flag,
        numsat,
        clock_offset,
    })
}

/// Parses one satellite line, following the header definitions.
/// Blank or missing slots are absent observations.
pub(crate) fn parse_satellite(
    line: &str,
    codes: &BTreeMap<Constellation, Vec<ObservationCode>>,
) -> Result<SatelliteObservation, EpochFault> {
    let sv_str = field(line, 0, SVNN_SIZE);
    let sv = SatelliteId::from_str(sv_str)
        .map_err(|_| EpochFault::BadSatellite(sv_str.to_string()))?;

    let codes = codes
        .get(&sv.system)
        .ok_or(EpochFault::NoObservables(sv.system))?;

    let mut values = BTreeMap::new();

    for (nth, code) in codes.iter().enumerate() {
        let offset = SVNN_SIZE + nth * OBSERVABLE_WIDTH;
        if offset >= line.len() {
            break;
        }

        let numeric_fault = |content: &str| EpochFault::NumericField {
            sv: sv.to_string(),
            code: code.to_string(),
            field: content.to_string(),
        };

        let value = field(line, offset, offset + OBSERVABLE_F14_WIDTH).trim();
        if value.is_empty() {
            continue;
        }
        let value = value.parse::<f64>().map_err(|_| numeric_fault(value))?;
        let mut observation = ObservationValue::new(value);

        let lli = field(
            line,
            offset + OBSERVABLE_F14_WIDTH,
            offset + OBSERVABLE_F14_WIDTH + 1,
        );
        if !lli.trim().is_empty() {
            let bits = lli.parse::<u8>().map_err(|_| numeric_fault(lli))?;
            let lli = LliFlags::from_bits(bits).ok_or(numeric_fault(lli))?;
            observation = observation.with_lli(lli);
        }

        let snr = field(
            line,
            offset + OBSERVABLE_F14_WIDTH + 1,
            offset + OBSERVABLE_WIDTH,
        );
        if !snr.trim().is_empty() {
            let snr = snr.parse::<u8>().map_err(|_| numeric_fault(snr))?;
            observation = observation.with_snr(snr);
        }

        values.insert(*code, observation);
    }

    Ok(SatelliteObservation { sv, values })
}
