/*
 * File production: legacy (short) file names the processing toolchain expects.
 *   ssssdddf.yyt
 *    ssss: 4 character station name
 *    ddd:  day of year of first observation
 *    f:    file sequence within the day, '0' for daily files
 *    yy:   2 digit year
 *    t:    file type ('o' observation, 'n' navigation)
 */
use crate::{
    epoch::{day_of_year, decompose},
    prelude::{Epoch, Header},
};

/// 4 character (lowercase) station name, derived from this marker name:
/// "CAS100ATA" gives "cas1". Returns None when the marker name
/// does not have 4 alphanumerical characters.
pub fn station_short_name(marker_name: &str) -> Option<String> {
    let name = marker_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(4)
        .collect::<String>()
        .to_lowercase();
    if name.len() == 4 {
        Some(name)
    } else {
        None
    }
}

/// Legacy observation file name, like "cas10630.22o"
pub fn legacy_filename(header: &Header, first_epoch: Epoch) -> Option<String> {
    let station = station_short_name(&header.marker_name)?;
    let (y, _, _, _, _, _, _) = decompose(first_epoch);
    Some(format!(
        "{}{:03}0.{:02}o",
        station,
        day_of_year(first_epoch),
        y.rem_euclid(100)
    ))
}

/// Default broadcast navigation file name, like "brdc0630.22n"
pub fn navigation_filename(year: i32, doy: u16) -> String {
    format!("brdc{:03}0.{:02}n", doy, year.rem_euclid(100))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;
    #[test]
    fn short_names() {
        assert_eq!(station_short_name("CAS100ATA"), Some("cas1".to_string()));
        assert_eq!(station_short_name("ESBC00DNK"), Some("esbc".to_string()));
        assert_eq!(station_short_name("zimm"), Some("zimm".to_string()));
        assert_eq!(station_short_name("  AB"), None);
    }
    #[test]
    fn legacy_names() {
        let header = Header {
            marker_name: "CAS100ATA".to_string(),
            ..Default::default()
        };
        let t0 = Epoch::from_str("2022-03-04T00:00:30 GPST").unwrap();
        assert_eq!(legacy_filename(&header, t0), Some("cas10630.22o".to_string()));

        let header = Header::default();
        assert_eq!(legacy_filename(&header, t0), None);

        assert_eq!(navigation_filename(2025, 1), "brdc0010.25n");
    }
}
