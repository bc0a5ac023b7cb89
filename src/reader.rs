//! RINEX 3/4 observation file reader
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use log::{debug, error};

use crate::{
    error::EpochFault,
    header::Header,
    observation::{
        parsing::{parse_epoch_descriptor, parse_satellite, EpochDescriptor},
        EpochRecord, EventRecord, SatelliteObservation,
    },
    prelude::{Epoch, Error},
};

#[cfg(feature = "serde")]
use serde::Serialize;

/// Per call reading context: where we stand in the file being read.
pub(crate) struct ReadContext<R: BufRead> {
    reader: R,
    /// File name, for error reports
    pub file: String,
    /// 1-based number of the last line returned
    pub line: usize,
    /// Byte offset of the last line returned
    pub offset: u64,
    consumed: u64,
    pending: Option<String>,
    buf: Vec<u8>,
}

impl<R: BufRead> ReadContext<R> {
    pub fn new(reader: R, file: &str) -> Self {
        Self {
            reader,
            file: file.to_string(),
            line: 0,
            offset: 0,
            consumed: 0,
            pending: None,
            buf: Vec::with_capacity(128),
        }
    }

    /// Returns next line, stripped of its terminator (LF or CRLF)
    pub fn next_line(&mut self) -> Result<Option<String>, Error> {
        if let Some(line) = self.pending.take() {
            return Ok(Some(line));
        }
        self.buf.clear();
        let size = self.reader.read_until(b'\n', &mut self.buf)?;
        if size == 0 {
            return Ok(None);
        }
        self.offset = self.consumed;
        self.consumed += size as u64;
        self.line += 1;
        let content = String::from_utf8_lossy(&self.buf);
        Ok(Some(content.trim_end_matches(['\n', '\r']).to_string()))
    }

    /// Pushes the last returned line back, next call returns it again
    pub fn push_back(&mut self, line: String) {
        self.pending = Some(line);
    }

    pub fn header_error(&self, field: &str, reason: &str) -> Error {
        Error::MalformedHeader {
            file: self.file.clone(),
            line: self.line,
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Parsed RINEX 3/4 observation file
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Rinex3Document {
    pub header: Header,
    /// Observation epochs, strictly time ordered
    pub epochs: Vec<EpochRecord>,
    /// Event epochs, in file order
    pub events: Vec<EventRecord>,
}

impl Rinex3Document {
    /// First observation epoch
    pub fn first_epoch(&self) -> Option<Epoch> {
        self.epochs.first().map(|e| e.epoch)
    }
}

/// [Rinex3Reader] parses modern observation files
#[derive(Debug, Default, Copy, Clone)]
pub struct Rinex3Reader {}

/// Tracks one epoch block while it is being parsed
struct EpochBlock {
    index: usize,
    offset: u64,
}

impl Rinex3Reader {
    pub fn new() -> Self {
        Self {}
    }

    /// Reads and parses this file
    pub fn read<P: AsRef<Path>>(&self, path: P) -> Result<Rinex3Document, Error> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        debug!("{}: parsing", name);
        let fd = File::open(path)?;
        self.parse(BufReader::new(fd), &name)
    }

    /// Parses a document from this stream. `source` names it in error reports.
    pub fn parse<R: BufRead>(&self, reader: R, source: &str) -> Result<Rinex3Document, Error> {
        let mut ctx = ReadContext::new(reader, source);
        let header = Header::parse(&mut ctx)?;

        debug!(
            "{}: RINEX {} {} header, {} system(s)",
            source,
            header.version,
            header.marker_name,
            header.codes.len()
        );

        let mut epochs = Vec::<EpochRecord>::new();
        let mut events = Vec::<EventRecord>::new();
        let mut index = 0;

        while let Some(line) = ctx.next_line()? {
            if line.trim().is_empty() {
                continue;
            }

            let block = EpochBlock {
                index,
                offset: ctx.offset,
            };
            index += 1;

            let malformed = |fault: EpochFault| {
                let err = Error::MalformedEpoch {
                    file: source.to_string(),
                    index: block.index,
                    offset: block.offset,
                    fault,
                };
                error!("{}", err);
                err
            };

            let descriptor = parse_epoch_descriptor(&line).map_err(malformed)?;

            if descriptor.flag.is_event() {
                let records = Self::parse_special_records(&mut ctx, &descriptor)?;
                events.push(EventRecord {
                    index: block.index,
                    epoch: descriptor.epoch,
                    flag: descriptor.flag,
                    records,
                });
                continue;
            }

            let epoch = descriptor
                .epoch
                .ok_or_else(|| malformed(EpochFault::BadTimestamp(line.clone())))?;

            if let Some(previous) = epochs.last() {
                if epoch <= previous.epoch {
                    return Err(malformed(EpochFault::NotMonotonic));
                }
            }

            let mut satellites = Vec::with_capacity(descriptor.numsat);
            for _ in 0..descriptor.numsat {
                match ctx.next_line()? {
                    Some(sat_line) if !sat_line.starts_with('>') => {
                        let sat = parse_satellite(&sat_line, &header.codes).map_err(malformed)?;
                        if satellites.iter().any(|s: &SatelliteObservation| s.sv == sat.sv) {
                            return Err(malformed(EpochFault::DuplicateSatellite(
                                sat.sv.to_string(),
                            )));
                        }
                        satellites.push(sat);
                    },
                    Some(sat_line) => {
                        ctx.push_back(sat_line);
                        break;
                    },
                    None => break,
                }
            }

            if satellites.len() != descriptor.numsat {
                return Err(malformed(EpochFault::SatelliteCount {
                    declared: descriptor.numsat,
                    found: satellites.len(),
                }));
            }

            // more value lines than declared
            if let Some(next) = ctx.next_line()? {
                if !next.starts_with('>') && !next.trim().is_empty() {
                    return Err(malformed(EpochFault::SatelliteCount {
                        declared: descriptor.numsat,
                        found: descriptor.numsat + 1,
                    }));
                }
                ctx.push_back(next);
            }

            epochs.push(EpochRecord {
                epoch,
                flag: descriptor.flag,
                clock_offset: descriptor.clock_offset,
                satellites,
            });
        }

        debug!(
            "{}: {} epochs, {} events",
            source,
            epochs.len(),
            events.len()
        );

        Ok(Rinex3Document {
            header,
            epochs,
            events,
        })
    }

    /*
     * Event epochs are followed by "numsat" special records
     * (header lines, or cycle slip records), retained verbatim.
     */
    fn parse_special_records<R: BufRead>(
        ctx: &mut ReadContext<R>,
        descriptor: &EpochDescriptor,
    ) -> Result<Vec<String>, Error> {
        let mut records = Vec::with_capacity(descriptor.numsat);
        for _ in 0..descriptor.numsat {
            match ctx.next_line()? {
                Some(line) => records.push(line),
                None => break,
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn crlf_tolerant_lines() {
        let content = "first line\r\nsecond\n\nlast";
        let mut ctx = ReadContext::new(Cursor::new(content), "test");
        assert_eq!(ctx.next_line().unwrap(), Some("first line".to_string()));
        assert_eq!((ctx.line, ctx.offset), (1, 0));
        assert_eq!(ctx.next_line().unwrap(), Some("second".to_string()));
        assert_eq!((ctx.line, ctx.offset), (2, 12));
        ctx.push_back("second".to_string());
        assert_eq!(ctx.next_line().unwrap(), Some("second".to_string()));
        assert_eq!((ctx.line, ctx.offset), (2, 12));
        assert_eq!(ctx.next_line().unwrap(), Some("".to_string()));
        assert_eq!(ctx.next_line().unwrap(), Some("last".to_string()));
        assert_eq!((ctx.line, ctx.offset), (4, 20));
        assert_eq!(ctx.next_line().unwrap(), None);
    }
}
