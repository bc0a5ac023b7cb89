#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

/*
 * gamit-bridge: feeds modern GNSS observations to the GAMIT toolchain
 * and gathers its session outputs.
 * This framework is shipped under the Mozilla Public V2 license.
 */

extern crate gnss_rs as gnss;

pub mod batch;
pub mod codes;
pub mod converter;
pub mod hardware;
pub mod header;
pub mod observable;
pub mod observation;
pub mod production;
pub mod reader;
pub mod session;
pub mod sv;
pub mod writer;

mod epoch;
mod error;
mod output;

#[cfg(test)]
mod tests;

use std::path::Path;

pub mod prelude {
    // export
    pub use crate::{
        batch::{BatchFallbackGenerator, BatchTemplate},
        codes::{ObservationCodeTable, TABLE_REVISION},
        converter::{ConversionOptions, ConversionReport, Converter},
        error::{EpochFault, Error},
        hardware::{Antenna, Receiver},
        header::{Header, Version},
        observable::{LegacyCode, ObservableKind, ObservationCode},
        observation::{EpochFlag, EpochRecord, LliFlags, ObservationValue, SatelliteObservation},
        reader::{Rinex3Document, Rinex3Reader},
        session::{ParseMode, SessionOutputParser, SessionResult},
        sv::SatelliteId,
        writer::Rinex2Writer,
    };

    // pub re-export
    pub use gnss::prelude::Constellation;
    pub use hifitime::{Duration, Epoch, TimeScale};
}

use prelude::{ConversionReport, Converter, Error};

/// Converts a RINEX 3/4 observation file into a RINEX 2.11 observation file,
/// transcribing GPS observations. See [Converter] for other options.
/// ```no_run
/// use gamit_bridge::convert_rinex3_to_rinex2;
/// let report = convert_rinex3_to_rinex2(
///     "CAS100ATA_R_20250010000_01D_30S_MO.rnx",
///     "cas10010.25o",
/// ).unwrap();
/// println!("{} epochs", report.epochs);
/// ```
pub fn convert_rinex3_to_rinex2<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
) -> Result<ConversionReport, Error> {
    Converter::default().convert(input, output)
}

/*
 * formats one header line: content padded to 60 columns,
 * then the label, padded to 80 columns.
 * Lengthy content spans several lines.
 */
pub(crate) fn fmt_rinex(content: &str, marker: &str) -> String {
    if content.len() <= 60 {
        format!("{:<60}{:<20}", content, marker)
    } else {
        let mut string = String::new();
        let nb_lines = (content.len() + 59) / 60;
        for i in 0..nb_lines {
            let start_off = i * 60;
            let end_off = std::cmp::min(start_off + 60, content.len());
            let chunk = content.get(start_off..end_off).unwrap_or("");
            string.push_str(&format!("{:<60}{:<20}", chunk, marker));
            if i < nb_lines - 1 {
                string.push('\n');
            }
        }
        string
    }
}

/*
 * formats one comment line
 */
pub(crate) fn fmt_comment(content: &str) -> String {
    fmt_rinex(content, "COMMENT")
}
