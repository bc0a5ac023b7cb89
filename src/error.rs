use std::path::PathBuf;
use thiserror::Error;

use crate::prelude::Constellation;

/// Structural defects of one RINEX 3 epoch block
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EpochFault {
    #[error("epoch declares {declared} satellites, {found} found")]
    SatelliteCount { declared: usize, found: usize },
    #[error("{sv}: non numerical {code} field \"{field}\"")]
    NumericField {
        sv: String,
        code: String,
        field: String,
    },
    #[error("invalid satellite identifier \"{0}\"")]
    BadSatellite(String),
    #[error("invalid epoch descriptor \"{0}\"")]
    BadTimestamp(String),
    #[error("satellite {0} listed twice")]
    DuplicateSatellite(String),
    #[error("epoch is not posterior to previous epoch")]
    NotMonotonic,
    #[error("no observables declared for {0}")]
    NoObservables(Constellation),
    #[error("unexpected content \"{0}\"")]
    UnexpectedLine(String),
}

/// Errors that may rise while transcoding RINEX
/// or parsing session outputs.
#[derive(Error, Debug)]
pub enum Error {
    /// Observation code the code table cannot place in the legacy layout
    #[error("unsupported {system} observable \"{code}\"")]
    UnsupportedObservable { system: Constellation, code: String },
    /// Missing or corrupt mandatory header field
    #[error("{file}: malformed header field \"{field}\" (line {line}): {reason}")]
    MalformedHeader {
        file: String,
        line: usize,
        field: String,
        reason: String,
    },
    /// Structural corruption in the observation record
    #[error("{file}: malformed epoch #{index} (offset {offset}): {fault}")]
    MalformedEpoch {
        file: String,
        index: usize,
        offset: u64,
        fault: EpochFault,
    },
    /// Document would produce a semantically empty legacy file
    #[error("empty document: {0}")]
    EmptyDocument(String),
    /// Grammar violation in one session output file
    #[error("{file}:{line}: {reason}")]
    SectionParse {
        file: String,
        line: usize,
        reason: String,
    },
    /// Value that does not fit its fixed width field
    #[error("{field} overflows its fixed width field: {value}")]
    FieldOverflow { field: String, value: String },
    /// Batch template refers to an unknown placeholder
    #[error("unknown template placeholder \"{{{0}}}\"")]
    Template(String),
    /// I/O error while producing an output file (its destination is left untouched)
    #[error("failed to write \"{}\": {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns true if this error is scoped to one session output section.
    pub fn is_section_error(&self) -> bool {
        matches!(self, Self::SectionParse { .. })
    }
}
