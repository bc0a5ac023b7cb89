//! GAMIT session output parsing.
//!
//! [SessionOutputParser] walks a session directory through four stages:
//! scanning (listing the directory), classifying (by file name, then
//! by first line signature), extracting (one grammar per [FileKind]) and
//! merging into a single [SessionResult]. Files are merged by kind then by
//! name, whatever the order the directory lists them in.
use std::path::{Path, PathBuf};

use log::{debug, error, warn};

use crate::prelude::Error;

mod classify;
mod met;
mod ofile;
mod qfile;
mod record;
mod summary;

pub use classify::FileKind;
pub use record::{
    BaselineRecord, Component, ComponentSolution, CoordinateRecord, SectionFailure,
    SessionResult, ZtdRecord, ZtdTime,
};

/// How a malformed session file is handled
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Aborts the whole session
    #[default]
    Strict,
    /// Records the failed section and carries on
    Lenient,
}

/// Parses Fortran style floats ("0.1066D-01")
pub(crate) fn fortran_float(s: &str) -> Option<f64> {
    s.trim().replace(['D', 'd'], "E").parse::<f64>().ok()
}

pub(crate) fn section_error(file: &str, line: usize, reason: &str) -> Error {
    Error::SectionParse {
        file: file.to_string(),
        line,
        reason: reason.to_string(),
    }
}

/// One classified session file
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SessionFile {
    pub kind: FileKind,
    pub name: String,
    pub path: PathBuf,
}

/// [SessionOutputParser] extracts a [SessionResult] from a session directory
#[derive(Debug, Clone, Default)]
pub struct SessionOutputParser {
    mode: ParseMode,
    experiment: Option<String>,
}

impl SessionOutputParser {
    pub fn new(mode: ParseMode) -> Self {
        Self {
            mode,
            experiment: None,
        }
    }

    pub fn with_mode(&self, mode: ParseMode) -> Self {
        let mut s = self.clone();
        s.mode = mode;
        s
    }

    /// Prefers `o<expt>*` and `q<expt>*` solution files, when present
    pub fn with_experiment(&self, experiment: &str) -> Self {
        let mut s = self.clone();
        s.experiment = Some(experiment.to_lowercase());
        s
    }

    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    /// Parses every recognized file of this session directory
    pub fn parse_dir<P: AsRef<Path>>(&self, dir: P) -> Result<SessionResult, Error> {
        let dir = dir.as_ref();
        let mut paths = Vec::<PathBuf>::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() {
                paths.push(path);
            }
        }
        debug!("{}: {} files", dir.display(), paths.len());
        self.parse_files(&paths)
    }

    /// Parses these session files
    pub fn parse_files<P: AsRef<Path>>(&self, paths: &[P]) -> Result<SessionResult, Error> {
        let files = self.classify(paths)?;

        let mut result = SessionResult::default();
        for file in files.iter() {
            let content = std::fs::read(&file.path)?;
            let content = String::from_utf8_lossy(&content);
            match self.extract(file.kind, &file.name, &content) {
                Ok(section) => result.merge_mut(&section),
                Err(e) => {
                    let failure = match SectionFailure::from_error(&e) {
                        Some(failure) if self.mode == ParseMode::Lenient => failure,
                        _ => {
                            error!("{}: {}", file.name, e);
                            return Err(e);
                        },
                    };
                    warn!("{}: section skipped: {}", file.name, e);
                    result.merge_mut(&SessionResult {
                        failures: vec![failure],
                        ..Default::default()
                    });
                },
            }
        }
        Ok(result)
    }

    /// Identifies session files, sorted in merge order.
    /// Unrecognized files are dropped.
    pub fn classify<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<SessionFile>, Error> {
        let mut files = Vec::<SessionFile>::with_capacity(paths.len());
        for path in paths.iter() {
            let path = path.as_ref();
            let name = match path.file_name() {
                Some(name) => name.to_string_lossy().to_string(),
                None => continue,
            };
            let kind = match FileKind::from_name(&name) {
                Some(kind) => Some(kind),
                None => FileKind::from_signature(&first_line(path)?),
            };
            match kind {
                Some(kind) => {
                    debug!("{}: {:?}", name, kind);
                    files.push(SessionFile {
                        kind,
                        name,
                        path: path.to_path_buf(),
                    });
                },
                None => debug!("{}: not a session output", name),
            }
        }

        if let Some(expt) = &self.experiment {
            for (kind, prefix) in [
                (FileKind::Solution, format!("o{}", expt)),
                (FileKind::Residuals, format!("q{}", expt)),
            ] {
                let preferred = |f: &SessionFile| {
                    f.kind == kind && f.name.to_lowercase().starts_with(&prefix)
                };
                if files.iter().any(preferred) {
                    files.retain(|f| f.kind != kind || preferred(f));
                }
            }
        }

        files.sort();
        Ok(files)
    }

    /// Extracts the section one file content holds
    pub fn extract(&self, kind: FileKind, name: &str, content: &str) -> Result<SessionResult, Error> {
        match kind {
            FileKind::Solution => ofile::parse(name, content),
            FileKind::Residuals => Ok(qfile::parse(content)),
            FileKind::Summary => summary::parse(name, content),
            FileKind::MetListing => met::parse(name, content),
        }
    }
}

fn first_line(path: &Path) -> Result<String, Error> {
    use std::io::{BufRead, BufReader};
    let mut reader = BufReader::new(std::fs::File::open(path)?);
    let mut line = Vec::with_capacity(128);
    reader.read_until(b'\n', &mut line)?;
    Ok(String::from_utf8_lossy(&line).to_string())
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn fortran_floats() {
        assert_eq!(fortran_float("-0.1066D-01"), Some(-0.01066));
        assert_eq!(fortran_float("0.5965d-02"), Some(0.005965));
        assert_eq!(fortran_float(" 0.41331E+00"), Some(0.41331));
        assert_eq!(fortran_float("2.25"), Some(2.25));
        assert_eq!(fortran_float("D"), None);
    }
    #[test]
    fn parse_mode() {
        assert_eq!(SessionOutputParser::default().mode(), ParseMode::Strict);
        let parser = SessionOutputParser::new(ParseMode::Lenient).with_experiment("ANTA");
        assert_eq!(parser.mode(), ParseMode::Lenient);
        assert_eq!(parser.experiment.as_deref(), Some("anta"));
    }
}
