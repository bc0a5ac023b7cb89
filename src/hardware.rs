//! Receiver and antenna
use crate::{epoch::field, fmt_rinex};

use std::io::{BufWriter, Write};

use lazy_static::lazy_static;
use regex::Regex;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref FIRMWARE_VERSION: Regex = Regex::new(r"(\d+\.\d+)").unwrap();
}

/// Receiver maker to the 3 letter abbreviation the processing toolchain uses
const MAKERS: [(&str, &str); 9] = [
    ("SEPT", "SEP"),
    ("JAVAD", "JAV"),
    ("TRIMBLE", "TRM"),
    ("LEICA", "LEI"),
    ("ASHTECH", "ASH"),
    ("TOPCON", "TOP"),
    ("NOVATEL", "NOV"),
    ("TPS", "TPS"),
    ("ROGUE", "ROG"),
];

/// GNSS receiver description
#[derive(Default, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Receiver {
    /// Receiver (hardware) model
    pub model: String,
    /// Receiver (hardware) identification info
    pub sn: String, // serial #
    /// Receiver embedded software info
    pub firmware: String, // firmware #
}

impl Receiver {
    /// Parses "REC # / TYPE / VERS" content
    pub(crate) fn parse(content: &str) -> Self {
        Self {
            sn: field(content, 0, 20).trim().to_string(),
            model: field(content, 20, 40).trim().to_string(),
            firmware: field(content, 40, 60).trim().to_string(),
        }
    }

    /// Formats [Receiver] into [BufWriter]
    pub(crate) fn format<W: Write>(&self, w: &mut BufWriter<W>) -> std::io::Result<()> {
        writeln!(
            w,
            "{}",
            fmt_rinex(
                &format!("{:<20}{:<20}{:<20}", self.sn, self.model, self.firmware),
                "REC # / TYPE / VERS"
            )
        )
    }

    /// 3 letter maker abbreviation, like "SEP" for "SEPT POLARX5".
    /// Unknown makers are abbreviated to their first three letters.
    pub fn abbreviation(&self) -> String {
        let model = self.model.to_uppercase();
        for (maker, abbrev) in MAKERS.iter() {
            if model.contains(maker) {
                return abbrev.to_string();
            }
        }
        model.chars().take(3).collect()
    }

    /// Numerical firmware version, like 5.4 for "5.4.0".
    /// Returns 0.0 when no version number can be found.
    pub fn firmware_version(&self) -> f64 {
        FIRMWARE_VERSION
            .captures(&self.firmware)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0)
    }

    pub fn with_model(&self, model: &str) -> Self {
        let mut s = self.clone();
        s.model = model.to_string();
        s
    }

    pub fn with_serial_number(&self, sn: &str) -> Self {
        let mut s = self.clone();
        s.sn = sn.to_string();
        s
    }

    pub fn with_firmware(&self, firmware: &str) -> Self {
        let mut s = self.clone();
        s.firmware = firmware.to_string();
        s
    }
}

/// Antenna description
#[derive(Default, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Antenna {
    /// Hardware model / make descriptor
    pub model: String,
    /// Serial number / identification number
    pub sn: String,
    /// Optionnal `h` eccentricity (height component),
    /// referenced to base/reference point, in meter
    pub height: Option<f64>,
    /// Optionnal `eastern` eccentricity (eastern component),
    /// referenced to base/reference point, in meter
    pub eastern: Option<f64>,
    /// Optionnal `northern` eccentricity (northern component),
    /// referenced to base/reference point, in meter
    pub northern: Option<f64>,
}

impl Antenna {
    /// Parses "ANT # / TYPE" content
    pub(crate) fn parse(content: &str) -> Self {
        Self {
            sn: field(content, 0, 20).trim().to_string(),
            model: field(content, 20, 40).trim().to_string(),
            ..Default::default()
        }
    }

    /// Parses "ANTENNA: DELTA H/E/N" content into self
    pub(crate) fn parse_eccentricities(&mut self, content: &str) {
        self.height = field(content, 0, 14).trim().parse::<f64>().ok();
        self.eastern = field(content, 14, 28).trim().parse::<f64>().ok();
        self.northern = field(content, 28, 42).trim().parse::<f64>().ok();
    }

    /// Formats [Antenna] into [BufWriter]
    pub(crate) fn format<W: Write>(&self, w: &mut BufWriter<W>) -> std::io::Result<()> {
        writeln!(
            w,
            "{}",
            fmt_rinex(&format!("{:<20}{:<20}", self.sn, self.model), "ANT # / TYPE")
        )?;
        writeln!(
            w,
            "{}",
            fmt_rinex(
                &format!(
                    "{:14.4}{:14.4}{:14.4}",
                    self.height.unwrap_or(0.0),
                    self.eastern.unwrap_or(0.0),
                    self.northern.unwrap_or(0.0)
                ),
                "ANTENNA: DELTA H/E/N"
            )
        )
    }

    /// Sets desired model
    pub fn with_model(&self, m: &str) -> Self {
        let mut s = self.clone();
        s.model = m.to_string();
        s
    }

    /// Sets desired Serial Number
    pub fn with_serial_number(&self, sn: &str) -> Self {
        let mut s = self.clone();
        s.sn = sn.to_string();
        s
    }

    /// Sets antenna `h` eccentricity component
    pub fn with_height(&self, h: f64) -> Self {
        let mut s = self.clone();
        s.height = Some(h);
        s
    }

    /// Sets antenna `eastern` coordinates component
    pub fn with_eastern_component(&self, e: f64) -> Self {
        let mut s = self.clone();
        s.eastern = Some(e);
        s
    }

    /// Sets antenna `northern` coordinates component
    pub fn with_northern_component(&self, n: f64) -> Self {
        let mut s = self.clone();
        s.northern = Some(n);
        s
    }
}
