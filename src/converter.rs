//! RINEX 3/4 to RINEX 2.11 conversion
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use log::{debug, error, info};

use crate::{
    header::peek_version,
    output::OutputFile,
    prelude::{Constellation, Error, Rinex3Document, Rinex3Reader, Rinex2Writer},
};

/// [ConversionOptions] tune the [Converter]
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionOptions {
    /// Satellite systems to transcribe. The first one is the primary system.
    pub systems: Vec<Constellation>,
    /// Copies legacy (RINEX 2) inputs unchanged, instead of rejecting them
    pub passthrough_legacy: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            systems: vec![Constellation::GPS],
            passthrough_legacy: true,
        }
    }
}

impl ConversionOptions {
    /// Selects the satellite systems to transcribe, primary system first
    pub fn with_systems(&self, systems: &[Constellation]) -> Self {
        let mut s = self.clone();
        s.systems = systems.to_vec();
        s
    }

    pub fn with_legacy_passthrough(&self, passthrough: bool) -> Self {
        let mut s = self.clone();
        s.passthrough_legacy = passthrough;
        s
    }

    /// Primary satellite system
    pub fn primary(&self) -> Constellation {
        self.systems.first().copied().unwrap_or(Constellation::GPS)
    }
}

/// Outcome of one conversion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionReport {
    /// Input was already a legacy file, and was copied
    pub passthrough: bool,
    /// Number of epochs written
    pub epochs: usize,
    /// Legacy observables declared
    pub observables: usize,
}

/// [Converter] reads a modern observation file and writes its legacy
/// counterpart, rejecting documents that would produce an empty file.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    options: ConversionOptions,
}

impl Converter {
    pub fn new(options: ConversionOptions) -> Self {
        Self { options }
    }

    /// Converts input file into output file.
    /// Output file is either completely written, or left untouched.
    pub fn convert<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
    ) -> Result<ConversionReport, Error> {
        let input = input.as_ref();
        let output = output.as_ref();

        if self.options.passthrough_legacy && Self::is_legacy(input)? {
            info!(
                "{}: already a legacy file, copied to {}",
                input.display(),
                output.display()
            );
            Self::copy(input, output)?;
            return Ok(ConversionReport {
                passthrough: true,
                ..Default::default()
            });
        }

        let doc = Rinex3Reader::new().read(input)?;
        self.validate(&doc).map_err(|e| {
            error!("{}: {}", input.display(), e);
            e
        })?;

        let summary = Rinex2Writer::new(&self.options.systems).write(&doc, output)?;

        info!(
            "{}: {} epochs converted to {}",
            input.display(),
            summary.epochs,
            output.display()
        );

        Ok(ConversionReport {
            passthrough: false,
            epochs: summary.epochs,
            observables: summary.types.len(),
        })
    }

    /// Validation gate between reading and writing
    pub fn validate(&self, doc: &Rinex3Document) -> Result<(), Error> {
        if doc.epochs.is_empty() {
            return Err(Error::EmptyDocument("no observation epochs".to_string()));
        }

        let primary = self.options.primary();
        let layout = Rinex2Writer::new(&self.options.systems).layout(doc)?;

        let primary_slots = layout
            .system(primary)
            .map(|l| l.slots.len())
            .unwrap_or(0);
        if primary_slots == 0 {
            return Err(Error::EmptyDocument(format!(
                "no resolvable {} observables",
                primary
            )));
        }

        let transcribed = doc
            .epochs
            .iter()
            .flat_map(|e| e.satellites.iter())
            .any(|sat| layout.system(sat.sv.system).is_some());
        if !transcribed {
            return Err(Error::EmptyDocument(format!(
                "no {} satellites observed",
                self.options
                    .systems
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join("/")
            )));
        }

        debug!("{} observables, {} epochs", layout.types.len(), doc.epochs.len());
        Ok(())
    }

    fn is_legacy(input: &Path) -> Result<bool, Error> {
        let mut reader = BufReader::new(File::open(input)?);
        let mut first = Vec::with_capacity(82);
        reader.read_until(b'\n', &mut first)?;
        let first = String::from_utf8_lossy(&first);
        Ok(peek_version(first.trim_end()).map(|v| v.major < 3).unwrap_or(false))
    }

    fn copy(input: &Path, output: &Path) -> Result<(), Error> {
        let mut reader = BufReader::new(File::open(input)?);
        let mut file = OutputFile::create(output)?;
        std::io::copy(&mut reader, file.writer()).map_err(|e| file.failure(Error::Io(e)))?;
        file.commit()
    }
}
