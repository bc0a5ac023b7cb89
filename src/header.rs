//! Observation file header
use std::{
    collections::BTreeMap,
    io::{BufRead, BufWriter, Write},
    str::FromStr,
};

use crate::{
    codes::LegacyLayout,
    epoch::field,
    fmt_comment, fmt_rinex,
    hardware::{Antenna, Receiver},
    observable::ObservationCode,
    prelude::{Constellation, Duration, Error},
    reader::ReadContext,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of legacy observables per "# / TYPES OF OBSERV" line
const TYPES_PER_LINE: usize = 9;

/// Emitted revision
pub const LEGACY_REVISION: Version = Version { major: 2, minor: 11 };

/// File format revision
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl FromStr for Version {
    type Err = std::num::ParseIntError;
    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let content = content.trim();
        match content.split_once('.') {
            Some((major, minor)) => Ok(Self {
                major: major.trim().parse::<u8>()?,
                minor: minor.trim().parse::<u8>()?,
            }),
            None => Ok(Self {
                major: content.parse::<u8>()?,
                minor: 0,
            }),
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.major, self.minor)
    }
}

/// Observation file [Header].
/// Labels this crate does not interpret are preserved verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Header {
    /// File revision
    pub version: Version,
    /// Satellite system declared by the file (Mixed for 'M')
    pub constellation: Option<Constellation>,
    /// Program that produced this file
    pub program: String,
    /// Agency that produced this file
    pub run_by: String,
    /// File production date
    pub date: String,
    pub marker_name: String,
    pub marker_number: Option<String>,
    pub observer: String,
    pub agency: String,
    pub receiver: Option<Receiver>,
    pub antenna: Option<Antenna>,
    /// Approximate marker position, ECEF (m)
    pub approx_position: (f64, f64, f64),
    /// Sampling interval
    pub interval: Duration,
    /// Declared observables, per system, in declaration order
    pub codes: BTreeMap<Constellation, Vec<ObservationCode>>,
    /// "TIME OF FIRST OBS" content
    pub time_of_first_obs: Option<String>,
    /// "TIME OF LAST OBS" content
    pub time_of_last_obs: Option<String>,
    pub comments: Vec<String>,
    /// Uninterpreted labels, sorted by label. Contents of one label
    /// are kept in order of appearance.
    pub extra: BTreeMap<String, Vec<String>>,
}

fn parse_constellation(c: &str) -> Option<Constellation> {
    match c.trim() {
        "" | "G" => Some(Constellation::GPS),
        "R" => Some(Constellation::Glonass),
        "E" => Some(Constellation::Galileo),
        "C" => Some(Constellation::BeiDou),
        "J" => Some(Constellation::QZSS),
        "I" => Some(Constellation::IRNSS),
        "S" => Some(Constellation::SBAS),
        "M" => Some(Constellation::Mixed),
        _ => None,
    }
}

impl Header {
    /// Parses a modern [Header] by consuming the context until "END OF HEADER".
    pub(crate) fn parse<R: BufRead>(ctx: &mut ReadContext<R>) -> Result<Self, Error> {
        let mut header = Self::default();

        let mut approx_position = Option::<(f64, f64, f64)>::None;
        let mut interval = Option::<Duration>::None;

        // observables being declared: system, declared count
        let mut current: Option<(Constellation, usize)> = None;
        let mut declared = BTreeMap::<Constellation, usize>::new();

        let mut first = true;
        let mut terminated = false;

        while let Some(line) = ctx.next_line()? {
            let content = field(&line, 0, 60);
            let marker = field(&line, 60, line.len()).trim();

            if first {
                first = false;
                if marker != "RINEX VERSION / TYPE" {
                    return Err(ctx.header_error(
                        "RINEX VERSION / TYPE",
                        "file does not start with a RINEX header",
                    ));
                }
            }

            match marker {
                "RINEX VERSION / TYPE" => {
                    header.version = Version::from_str(field(content, 0, 9)).map_err(|_| {
                        ctx.header_error(marker, "invalid revision number")
                    })?;
                    if header.version.major < 3 {
                        return Err(ctx.header_error(
                            marker,
                            &format!("revision {} is not a modern revision", header.version),
                        ));
                    }
                    if field(content, 20, 21) != "O" {
                        return Err(ctx.header_error(marker, "not an observation file"));
                    }
                    header.constellation = parse_constellation(field(content, 40, 41));
                    if header.constellation.is_none() {
                        return Err(ctx.header_error(marker, "unknown satellite system"));
                    }
                },
                "PGM / RUN BY / DATE" => {
                    header.program = field(content, 0, 20).trim().to_string();
                    header.run_by = field(content, 20, 40).trim().to_string();
                    header.date = field(content, 40, 60).trim().to_string();
                },
                "COMMENT" => {
                    header.comments.push(content.trim_end().to_string());
                },
                "MARKER NAME" => {
                    header.marker_name = content.trim().to_string();
                },
                "MARKER NUMBER" => {
                    let number = field(content, 0, 20).trim();
                    if !number.is_empty() {
                        header.marker_number = Some(number.to_string());
                    }
                },
                "OBSERVER / AGENCY" => {
                    header.observer = field(content, 0, 20).trim().to_string();
                    header.agency = field(content, 20, 60).trim().to_string();
                },
                "REC # / TYPE / VERS" => {
                    header.receiver = Some(Receiver::parse(content));
                },
                "ANT # / TYPE" => {
                    let mut antenna = Antenna::parse(content);
                    if let Some(previous) = &header.antenna {
                        antenna.height = previous.height;
                        antenna.eastern = previous.eastern;
                        antenna.northern = previous.northern;
                    }
                    header.antenna = Some(antenna);
                },
                "ANTENNA: DELTA H/E/N" => {
                    header
                        .antenna
                        .get_or_insert_with(Antenna::default)
                        .parse_eccentricities(content);
                },
                "APPROX POSITION XYZ" => {
                    let coords = (0..3)
                        .map(|i| field(content, i * 14, (i + 1) * 14).trim().parse::<f64>())
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(|_| ctx.header_error(marker, "non numerical coordinates"))?;
                    approx_position = Some((coords[0], coords[1], coords[2]));
                },
                "INTERVAL" => {
                    let seconds = field(content, 0, 10)
                        .trim()
                        .parse::<f64>()
                        .map_err(|_| ctx.header_error(marker, "non numerical interval"))?;
                    if seconds <= 0.0 {
                        return Err(ctx.header_error(marker, "interval should be positive"));
                    }
                    interval = Some(Duration::from_seconds(seconds));
                },
                "SYS / # / OBS TYPES" => {
                    let system = field(content, 0, 1);
                    if !system.trim().is_empty() {
                        let constellation = match parse_constellation(system) {
                            Some(Constellation::Mixed) | None => {
                                return Err(ctx.header_error(marker, "unknown satellite system"));
                            },
                            Some(c) => c,
                        };
                        let count = field(content, 3, 6)
                            .trim()
                            .parse::<usize>()
                            .map_err(|_| ctx.header_error(marker, "invalid observable count"))?;
                        declared.insert(constellation, count);
                        header.codes.insert(constellation, Vec::with_capacity(count));
                        current = Some((constellation, count));
                    }
                    let (constellation, _) = current.ok_or_else(|| {
                        ctx.header_error(marker, "continuation line without a satellite system")
                    })?;
                    for descriptor in field(content, 7, 60).split_ascii_whitespace() {
                        let code = ObservationCode::parse(constellation, descriptor)
                            .map_err(|e| ctx.header_error(marker, &e.to_string()))?;
                        if let Some(codes) = header.codes.get_mut(&constellation) {
                            codes.push(code);
                        }
                    }
                },
                "TIME OF FIRST OBS" => {
                    header.time_of_first_obs = Some(content.trim_end().to_string());
                },
                "TIME OF LAST OBS" => {
                    header.time_of_last_obs = Some(content.trim_end().to_string());
                },
                "END OF HEADER" => {
                    terminated = true;
                    break;
                },
                _ => {
                    header
                        .extra
                        .entry(marker.to_string())
                        .or_default()
                        .push(content.trim_end().to_string());
                },
            }
        }

        if first {
            return Err(Error::EmptyDocument(format!("{}: empty file", ctx.file)));
        }
        if !terminated {
            return Err(ctx.header_error("END OF HEADER", "missing end of header"));
        }

        for (constellation, count) in declared.iter() {
            let found = header.codes.get(constellation).map(|c| c.len()).unwrap_or(0);
            if found != *count {
                return Err(ctx.header_error(
                    "SYS / # / OBS TYPES",
                    &format!(
                        "{} declares {} observables, {} listed",
                        constellation, count, found
                    ),
                ));
            }
        }

        header.approx_position = approx_position
            .ok_or_else(|| ctx.header_error("APPROX POSITION XYZ", "missing mandatory field"))?;
        header.interval =
            interval.ok_or_else(|| ctx.header_error("INTERVAL", "missing mandatory field"))?;
        if header.codes.is_empty() {
            return Err(ctx.header_error("SYS / # / OBS TYPES", "missing mandatory field"));
        }

        Ok(header)
    }

    /// Systems that declare observables, in [Constellation] order
    pub fn systems(&self) -> Vec<Constellation> {
        self.codes.keys().copied().collect()
    }

    /// Formats this [Header] as a legacy header, describing the given [LegacyLayout].
    pub(crate) fn format_v2<W: Write>(
        &self,
        w: &mut BufWriter<W>,
        layout: &LegacyLayout,
    ) -> Result<(), Error> {
        let system = if layout.is_mixed() {
            Constellation::Mixed
        } else {
            layout
                .systems
                .first()
                .map(|l| l.system)
                .unwrap_or(Constellation::GPS)
        };

        writeln!(
            w,
            "{}",
            fmt_rinex(
                &format!(
                    "{:9.2}{:11}{:<20}{:<20}",
                    2.11,
                    "",
                    "OBSERVATION DATA",
                    format!("{:x}", system)
                ),
                "RINEX VERSION / TYPE"
            )
        )?;

        let program = format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        writeln!(
            w,
            "{}",
            fmt_rinex(
                &format!(
                    "{:<20}{:<20}{:<20}",
                    truncate(&program, 20),
                    truncate(&self.run_by, 20),
                    truncate(&self.date, 20)
                ),
                "PGM / RUN BY / DATE"
            )
        )?;

        let origin = if self.program.is_empty() {
            format!("converted from RINEX {}", self.version)
        } else {
            format!("converted from RINEX {} ({})", self.version, self.program)
        };
        writeln!(w, "{}", fmt_comment(&truncate(&origin, 60)))?;
        for comment in self.comments.iter() {
            writeln!(w, "{}", fmt_comment(comment))?;
        }

        writeln!(w, "{}", fmt_rinex(&self.marker_name, "MARKER NAME"))?;
        if let Some(number) = &self.marker_number {
            writeln!(w, "{}", fmt_rinex(number, "MARKER NUMBER"))?;
        }
        writeln!(
            w,
            "{}",
            fmt_rinex(
                &format!(
                    "{:<20}{:<40}",
                    truncate(&self.observer, 20),
                    truncate(&self.agency, 40)
                ),
                "OBSERVER / AGENCY"
            )
        )?;

        self.receiver.clone().unwrap_or_default().format(w)?;
        self.antenna.clone().unwrap_or_default().format(w)?;

        let (x, y, z) = self.approx_position;
        writeln!(
            w,
            "{}",
            fmt_rinex(
                &format!("{:14.4}{:14.4}{:14.4}", x, y, z),
                "APPROX POSITION XYZ"
            )
        )?;

        writeln!(w, "{}", fmt_rinex("     1     1", "WAVELENGTH FACT L1/2"))?;

        for (nth, chunk) in layout.types.chunks(TYPES_PER_LINE).enumerate() {
            let mut content = if nth == 0 {
                format!("{:6}", layout.types.len())
            } else {
                "      ".to_string()
            };
            for code in chunk {
                content.push_str(&format!("{:>6}", code.to_string()));
            }
            writeln!(w, "{}", fmt_rinex(&content, "# / TYPES OF OBSERV"))?;
        }

        writeln!(
            w,
            "{}",
            fmt_rinex(
                &format!("{:10.3}", self.interval.to_seconds()),
                "INTERVAL"
            )
        )?;

        if let Some(first) = &self.time_of_first_obs {
            writeln!(w, "{}", fmt_rinex(first, "TIME OF FIRST OBS"))?;
        }
        if let Some(last) = &self.time_of_last_obs {
            writeln!(w, "{}", fmt_rinex(last, "TIME OF LAST OBS"))?;
        }

        writeln!(w, "{}", fmt_rinex("", "END OF HEADER"))?;
        Ok(())
    }
}

fn truncate(content: &str, width: usize) -> String {
    content.chars().take(width).collect()
}

/// Identifies the revision of a RINEX file, from its first line
pub(crate) fn peek_version(first_line: &str) -> Option<Version> {
    if field(first_line, 60, first_line.len()).trim() != "RINEX VERSION / TYPE" {
        return None;
    }
    Version::from_str(field(first_line, 0, 9)).ok()
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn version() {
        assert_eq!(
            Version::from_str("     3.04"),
            Ok(Version { major: 3, minor: 4 })
        );
        assert_eq!(
            Version::from_str("4.00"),
            Ok(Version { major: 4, minor: 0 })
        );
        assert_eq!(LEGACY_REVISION.to_string(), "2.11");
        assert!(Version::from_str("x.04").is_err());
    }
    #[test]
    fn version_peeking() {
        let line = format!(
            "{:<60}{}",
            "     3.04           OBSERVATION DATA    M", "RINEX VERSION / TYPE"
        );
        assert_eq!(peek_version(&line), Some(Version { major: 3, minor: 4 }));
        let line = format!(
            "{:<60}{}",
            "     2.11           OBSERVATION DATA    G", "RINEX VERSION / TYPE"
        );
        assert_eq!(peek_version(&line), Some(Version { major: 2, minor: 11 }));
        assert_eq!(peek_version("G01  20000000.000"), None);
    }
}
