//! Met listing (`met_ssss.yyddd`) grammar: zenith delay time series
use lazy_static::lazy_static;
use regex::Regex;

use crate::{epoch::from_gps_doy, prelude::Error};

use super::{section_error, SessionResult, ZtdRecord, ZtdTime};

lazy_static! {
    static ref SITE_NAME: Regex = Regex::new(r"(?i)^met_(\w{4})\.").unwrap();
    static ref SITE_HEADER: Regex = Regex::new(r"(?i)site\s+(\w{4})").unwrap();
}

/// Station this listing describes, from its file name, else from its header
fn station(file: &str, content: &str) -> Option<String> {
    SITE_NAME
        .captures(file)
        .or_else(|| {
            content
                .lines()
                .next()
                .and_then(|first| SITE_HEADER.captures(first))
        })
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_uppercase())
}

/*
 * Data row: Yr Doy Hr Mn Sec TotalZen WetZen Sig .. (zenith delays in mm)
 */
fn parse_row(
    file: &str,
    line_num: usize,
    line: &str,
    station: &str,
) -> Result<ZtdRecord, Error> {
    let invalid = |field: &str| section_error(file, line_num, &format!("invalid {} field", field));

    let fields = line.split_whitespace().collect::<Vec<_>>();
    if fields.len() < 8 {
        return Err(section_error(file, line_num, "truncated met row"));
    }

    let mut year = fields[0].parse::<i32>().map_err(|_| invalid("year"))?;
    if year < 100 {
        year += if year < 80 { 2000 } else { 1900 };
    }
    let doy = fields[1].parse::<u16>().map_err(|_| invalid("day of year"))?;
    let hh = fields[2].parse::<u8>().map_err(|_| invalid("hours"))?;
    let mm = fields[3].parse::<u8>().map_err(|_| invalid("minutes"))?;
    let seconds = fields[4].parse::<f64>().map_err(|_| invalid("seconds"))?;
    if !(0.0..61.0).contains(&seconds) {
        return Err(invalid("seconds"));
    }
    let ss = seconds.trunc() as u8;
    let ns = ((seconds - seconds.trunc()) * 1.0E9).round() as u32;

    let total = fields[5].parse::<f64>().map_err(|_| invalid("total zenith delay"))?;
    let sigma = fields[7].parse::<f64>().map_err(|_| invalid("sigma"))?;

    let epoch = from_gps_doy(year, doy, hh, mm, ss, ns).map_err(|_| invalid("epoch"))?;

    Ok(ZtdRecord {
        station: station.to_string(),
        time: ZtdTime::Epoch(epoch),
        value: total / 1000.0,
        sigma: sigma / 1000.0,
        adjustment: None,
    })
}

/// Parses a met listing content
pub(crate) fn parse(file: &str, content: &str) -> Result<SessionResult, Error> {
    let station = station(file, content)
        .ok_or_else(|| section_error(file, 1, "unknown met listing station"))?;

    let mut result = SessionResult::default();
    for (index, line) in content.lines().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('*') {
            continue;
        }
        if trimmed.starts_with(|c: char| c.is_ascii_alphabetic()) {
            // column labels
            continue;
        }
        result
            .ztd
            .push(parse_row(file, index + 1, line, &station)?);
    }
    result.sort();
    Ok(result)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::prelude::Epoch;
    use std::str::FromStr;

    const LISTING: &str = "\
* Met values for site CAS1 from GAMIT o-file
* Yr  Doy Hr Mn  Sec   Total Zen  Wet Zen   Sig
 2025   1  0  0  0.00  2254.9     12.3     6.0
 2025   1  2  0  0.00  2251.4     8.8      5.1
";

    #[test]
    fn zenith_delay_series() {
        let result = parse("met_cas1.25001", LISTING).unwrap();
        assert_eq!(result.ztd.len(), 2);
        let second = &result.ztd[1];
        assert_eq!(second.station, "CAS1");
        assert_eq!(
            second.time,
            ZtdTime::Epoch(Epoch::from_str("2025-01-01T02:00:00 GPST").unwrap())
        );
        assert!((second.value - 2.2514).abs() < 1e-9);
        assert!((second.sigma - 0.0051).abs() < 1e-9);
    }

    #[test]
    fn station_from_header() {
        let content = "* site DAV1 met listing\n 25 1 0 0 0.0 2300.0 10.0 4.0\n";
        let result = parse("renamed.txt", content).unwrap();
        assert_eq!(result.ztd[0].station, "DAV1");
        assert_eq!(
            result.ztd[0].time,
            ZtdTime::Epoch(Epoch::from_str("2025-01-01T00:00:00 GPST").unwrap())
        );
    }

    #[test]
    fn corrupt_row() {
        let content = format!("{} 2025   1  4  0  0.00  x  8.8  5.1\n", LISTING);
        match parse("met_cas1.25001", &content) {
            Err(Error::SectionParse { line, .. }) => assert_eq!(line, 5),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            parse("renamed.txt", "* zenith delays\n 2025 1 0 0 0.0 2300.0 10.0 4.0\n"),
            Err(Error::SectionParse { line: 1, .. })
        ));
    }
}
