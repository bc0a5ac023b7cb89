//! Timestamps: every epoch is expressed in GPST
use hifitime::{Duration, Epoch, TimeScale, Unit};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParsingError {
    #[error("expecting \"yyyy mm dd hh mm ss.sssssss\" format")]
    FormatError,
    #[error("failed to parse years from \"{0}\"")]
    YearField(String),
    #[error("failed to parse months from \"{0}\"")]
    MonthField(String),
    #[error("failed to parse days from \"{0}\"")]
    DayField(String),
    #[error("failed to parse hours from \"{0}\"")]
    HoursField(String),
    #[error("failed to parse minutes from \"{0}\"")]
    MinutesField(String),
    #[error("failed to parse seconds from \"{0}\"")]
    SecondsField(String),
    #[error("invalid calendar date")]
    Calendar,
}

/// TAI - GPST, constant
const GPST_TAI_OFFSET: f64 = 19.0;

/// Returns the slice [start, end[ of this line, shortened
/// to what is available. Never panics.
pub(crate) fn field(line: &str, start: usize, end: usize) -> &str {
    let end = end.min(line.len());
    if start >= end {
        return "";
    }
    line.get(start..end).unwrap_or("")
}

/// Builds a GPST [Epoch] from its calendar description
pub(crate) fn from_gregorian_gpst(
    y: i32,
    m: u8,
    d: u8,
    hh: u8,
    mm: u8,
    ss: u8,
    ns: u32,
) -> Result<Epoch, ParsingError> {
    Epoch::maybe_from_gregorian(y, m, d, hh, mm, ss, ns, TimeScale::GPST)
        .map_err(|_| ParsingError::Calendar)
}

/// Builds a GPST [Epoch] from year, day of year and time of day
pub(crate) fn from_gps_doy(
    y: i32,
    doy: u16,
    hh: u8,
    mm: u8,
    ss: u8,
    ns: u32,
) -> Result<Epoch, ParsingError> {
    if doy == 0 || doy > 366 {
        return Err(ParsingError::DayField(doy.to_string()));
    }
    let t0 = from_gregorian_gpst(y, 1, 1, 0, 0, 0, 0)?;
    Ok(t0
        + Unit::Day * (doy as i64 - 1)
        + Unit::Hour * hh as i64
        + Unit::Minute * mm as i64
        + Unit::Second * ss as i64
        + Unit::Nanosecond * ns as i64)
}

/// Decomposes a GPST [Epoch] into its calendar description
pub(crate) fn decompose(e: Epoch) -> (i32, u8, u8, u8, u8, u8, u32) {
    let e = e.to_time_scale(TimeScale::GPST);
    (e - Duration::from_seconds(GPST_TAI_OFFSET)).to_gregorian_tai()
}

/// Day of year (1..=366) of a GPST [Epoch]
pub(crate) fn day_of_year(e: Epoch) -> u16 {
    let (y, m, d, _, _, _, _) = decompose(e);
    match from_gregorian_gpst(y, 1, 1, 0, 0, 0, 0) {
        Ok(t0) => {
            let midnight = from_gregorian_gpst(y, m, d, 0, 0, 0, 0).unwrap_or(t0);
            ((midnight - t0).to_unit(Unit::Day).round() as u16) + 1
        },
        Err(_) => 1,
    }
}

/*
 * Parses "ss.sssssss" exactly, without going through floating point
 */
fn parse_seconds(content: &str) -> Result<(u8, u32), ParsingError> {
    let err = || ParsingError::SecondsField(content.to_string());
    let content = content.trim();
    let (int, frac) = match content.split_once('.') {
        Some((int, frac)) => (int, frac),
        None => (content, ""),
    };
    let ss = int.trim().parse::<u8>().map_err(|_| err())?;
    if ss > 60 || frac.len() > 9 || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(err());
    }
    let mut ns = 0_u32;
    for (i, c) in frac.chars().enumerate() {
        ns += c.to_digit(10).unwrap_or(0) * 10_u32.pow(8 - i as u32);
    }
    Ok((ss, ns))
}

/// Parses a RINEX 3 epoch descriptor, "yyyy mm dd hh mm ss.sssssss",
/// as a GPST [Epoch].
pub(crate) fn parse_gpst(content: &str) -> Result<Epoch, ParsingError> {
    let items = content.split_ascii_whitespace().collect::<Vec<_>>();
    if items.len() != 6 {
        return Err(ParsingError::FormatError);
    }
    let y = items[0]
        .parse::<i32>()
        .map_err(|_| ParsingError::YearField(items[0].to_string()))?;
    let m = items[1]
        .parse::<u8>()
        .map_err(|_| ParsingError::MonthField(items[1].to_string()))?;
    let d = items[2]
        .parse::<u8>()
        .map_err(|_| ParsingError::DayField(items[2].to_string()))?;
    let hh = items[3]
        .parse::<u8>()
        .map_err(|_| ParsingError::HoursField(items[3].to_string()))?;
    let mm = items[4]
        .parse::<u8>()
        .map_err(|_| ParsingError::MinutesField(items[4].to_string()))?;
    let (ss, ns) = parse_seconds(items[5])?;
    if y < 1980 {
        return Err(ParsingError::YearField(items[0].to_string()));
    }
    from_gregorian_gpst(y, m, d, hh, mm, ss, ns)
}

/// Formats a GPST [Epoch] the way RINEX 2 observation records expect it:
/// " yy mm dd hh mm ss.sssssss" (26 characters).
pub(crate) fn format_v2(e: Epoch) -> String {
    let (y, m, d, hh, mm, ss, ns) = decompose(e);
    format!(
        " {:02} {:>2} {:>2} {:>2} {:>2}{:>3}.{:07}",
        y.rem_euclid(100),
        m,
        d,
        hh,
        mm,
        ss,
        ns / 100
    )
}
