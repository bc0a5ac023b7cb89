//! Batch control file fallback.
//!
//! When the processing toolchain fails to infer the X-file production
//! parameters from converted headers, [BatchFallbackGenerator] writes the
//! `<expt>.makex.batch` control file directly: one line per site, with
//! receiver and firmware identifiers, and one declaration per satellite system
//! listing the legacy observables the [Rinex2Writer](crate::prelude::Rinex2Writer)
//! emits for it.
use std::{
    io::Write,
    path::{Path, PathBuf},
};

use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;

use crate::{
    codes::ObservationCodeTable,
    epoch::{day_of_year, decompose},
    observable::LegacyCode,
    output::OutputFile,
    prelude::{Constellation, Epoch, Error, Header},
    production::{navigation_filename, station_short_name},
};

#[cfg(feature = "serde")]
use serde::Serialize;

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{([a-z_]+)\}").unwrap();
}

/// Default control file layout
pub const DEFAULT_TEMPLATE: &str = "infor 1
sceno 1 session.info
rinex 1 {rinex_dir}
fica  0
coord 1 l{expt}{xver}.{doy}
stnfo 1 station.info
xfile 1 {rinex_dir}x
svclk 1 jbrdc{xver}.{doy}
clock 1 {rinex_dir}k
sp3   0
rdorb 1 {nav}
gnss  1 {gnss}
site year doy sn  sw  ver
(a4,1x,a4,1x,a3,1x,a1,2x,a3,1x,f5.2)
{sites}
sys sw  ver   antenna              nob types
{systems}
";

/// [BatchTemplate] gathers the session parameters and the text
/// the control file is rendered from. Placeholders are `{name}` tokens:
/// `expt`, `year`, `yy`, `doy`, `xver`, `orbit`, `nav`, `rinex_dir`,
/// `gnss`, `sites` and `systems`.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchTemplate {
    /// 4 character experiment name, lower case
    pub experiment: String,
    pub year: i32,
    pub doy: u16,
    /// Orbit product identifier
    pub orbit: String,
    /// Navigation file, defaults to the daily broadcast file
    pub nav_file: Option<String>,
    /// X-file version character
    pub xfile_version: String,
    /// Directory holding the legacy observation files
    pub rinex_dir: String,
    /// Template text
    pub text: String,
}

impl BatchTemplate {
    pub fn new(experiment: &str, year: i32, doy: u16) -> Self {
        Self {
            experiment: experiment.to_lowercase(),
            year,
            doy,
            orbit: "igsg".to_string(),
            nav_file: None,
            xfile_version: "5".to_string(),
            rinex_dir: "./".to_string(),
            text: DEFAULT_TEMPLATE.to_string(),
        }
    }

    /// Session parameters for the day this [Epoch] belongs to
    pub fn for_epoch(experiment: &str, epoch: Epoch) -> Self {
        let (year, _, _, _, _, _, _) = decompose(epoch);
        Self::new(experiment, year, day_of_year(epoch))
    }

    pub fn with_orbit(&self, orbit: &str) -> Self {
        let mut s = self.clone();
        s.orbit = orbit.to_string();
        s
    }

    pub fn with_navigation_file(&self, nav_file: &str) -> Self {
        let mut s = self.clone();
        s.nav_file = Some(nav_file.to_string());
        s
    }

    pub fn with_xfile_version(&self, version: &str) -> Self {
        let mut s = self.clone();
        s.xfile_version = version.to_string();
        s
    }

    pub fn with_rinex_dir(&self, dir: &str) -> Self {
        let mut s = self.clone();
        s.rinex_dir = dir.to_string();
        s
    }

    /// Replaces the template text
    pub fn with_text(&self, text: &str) -> Self {
        let mut s = self.clone();
        s.text = text.to_string();
        s
    }

    /// Navigation file name
    pub fn navigation_file(&self) -> String {
        self.nav_file
            .clone()
            .unwrap_or_else(|| navigation_filename(self.year, self.doy))
    }

    /// Control file name
    pub fn filename(&self) -> String {
        format!("{}.makex.batch", self.experiment)
    }
}

/// One site of the session
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SiteEntry {
    /// 4 character station name
    pub station: String,
    /// 3 letter receiver abbreviation
    pub receiver: String,
    /// Numerical firmware version
    pub firmware: f64,
}

/// What is declared for one satellite system
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SystemDeclaration {
    pub system: Constellation,
    /// 3 letter receiver abbreviation
    pub receiver: String,
    /// Numerical firmware version
    pub firmware: f64,
    /// Antenna model
    pub antenna: String,
    /// Legacy observables, canonical order
    pub codes: Vec<LegacyCode>,
}

/// [BatchFallbackGenerator] renders control files from headers
#[derive(Debug, Clone)]
pub struct BatchFallbackGenerator {
    table: &'static ObservationCodeTable,
    systems: Vec<Constellation>,
}

impl Default for BatchFallbackGenerator {
    fn default() -> Self {
        Self {
            table: ObservationCodeTable::standard(),
            systems: vec![Constellation::GPS],
        }
    }
}

impl BatchFallbackGenerator {
    /// Declares these systems, which should match the conversion selection
    pub fn new(systems: &[Constellation]) -> Self {
        Self {
            systems: systems.to_vec(),
            ..Default::default()
        }
    }

    /// Site entry of this header, if it names a station
    pub fn site(&self, header: &Header) -> Option<SiteEntry> {
        let station = station_short_name(&header.marker_name)?;
        let receiver = header.receiver.clone().unwrap_or_default();
        Some(SiteEntry {
            station,
            receiver: receiver.abbreviation(),
            firmware: receiver.firmware_version(),
        })
    }

    /// Per system declarations for this header, using the same
    /// code selection the writer applies.
    pub fn declarations(&self, header: &Header) -> Result<Vec<SystemDeclaration>, Error> {
        let layout = self.table.layout(&header.codes, &self.systems)?;
        let receiver = header.receiver.clone().unwrap_or_default();
        let antenna = header
            .antenna
            .as_ref()
            .map(|a| a.model.clone())
            .unwrap_or_default();

        Ok(layout
            .systems
            .iter()
            .filter(|l| !l.slots.is_empty())
            .map(|l| SystemDeclaration {
                system: l.system,
                receiver: receiver.abbreviation(),
                firmware: receiver.firmware_version(),
                antenna: antenna.clone(),
                codes: l.legacy_codes(),
            })
            .collect())
    }

    /// Renders the control file for a single station
    pub fn generate(&self, header: &Header, template: &BatchTemplate) -> Result<String, Error> {
        self.generate_session(std::slice::from_ref(header), template)
    }

    /// Renders the control file for all the stations of a session
    pub fn generate_session(
        &self,
        headers: &[Header],
        template: &BatchTemplate,
    ) -> Result<String, Error> {
        let mut sites = Vec::<SiteEntry>::with_capacity(headers.len());
        let mut systems = Vec::<String>::new();

        for header in headers.iter() {
            let site = match self.site(header) {
                Some(site) => site,
                None => {
                    warn!("\"{}\": not a valid station name", header.marker_name);
                    continue;
                },
            };
            if sites.iter().any(|s| s.station == site.station) {
                warn!("{}: station declared twice", site.station);
                continue;
            }
            for decl in self.declarations(header)? {
                systems.push(format!(
                    "{:x}   {:<3} {:5.2} {:<20} {:2} {}",
                    decl.system,
                    decl.receiver,
                    decl.firmware,
                    decl.antenna,
                    decl.codes.len(),
                    decl.codes
                        .iter()
                        .map(|c| c.to_string())
                        .collect::<Vec<_>>()
                        .join(" ")
                ));
            }
            sites.push(site);
        }

        if sites.is_empty() {
            return Err(Error::EmptyDocument("no station to declare".to_string()));
        }

        let sites = sites
            .iter()
            .map(|site| {
                format!(
                    "{:<4} {} {:03} 1  {:<3} {:5.2}",
                    site.station, template.year, template.doy, site.receiver, site.firmware
                )
            })
            .collect::<Vec<_>>();

        let gnss = self
            .systems
            .iter()
            .map(|c| format!("{:x}", c))
            .collect::<String>();

        debug!(
            "{}: rendering {} site(s)",
            template.filename(),
            sites.len()
        );

        render(&template.text, |name| match name {
            "expt" => Some(template.experiment.clone()),
            "year" => Some(format!("{:04}", template.year)),
            "yy" => Some(format!("{:02}", template.year.rem_euclid(100))),
            "doy" => Some(format!("{:03}", template.doy)),
            "xver" => Some(template.xfile_version.clone()),
            "orbit" => Some(template.orbit.clone()),
            "nav" => Some(template.navigation_file()),
            "rinex_dir" => Some(template.rinex_dir.clone()),
            "gnss" => Some(gnss.clone()),
            "sites" => Some(sites.join("\n")),
            "systems" => Some(systems.join("\n")),
            _ => None,
        })
    }

    /// Renders the session control file and writes it into this directory.
    /// Returns the path of the control file.
    pub fn write<P: AsRef<Path>>(
        &self,
        headers: &[Header],
        template: &BatchTemplate,
        dir: P,
    ) -> Result<PathBuf, Error> {
        let content = self.generate_session(headers, template)?;
        let path = dir.as_ref().join(template.filename());
        let mut output = OutputFile::create(&path)?;
        output
            .writer()
            .write_all(content.as_bytes())
            .map_err(|e| output.failure(Error::Io(e)))?;
        output.commit()?;
        Ok(path)
    }
}

/*
 * Substitutes every {placeholder}; unknown placeholders are errors.
 */
fn render<F: Fn(&str) -> Option<String>>(text: &str, value: F) -> Result<String, Error> {
    let mut rendered = String::with_capacity(text.len() * 2);
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(text) {
        let (whole, name) = match (caps.get(0), caps.get(1)) {
            (Some(whole), Some(name)) => (whole, name.as_str()),
            _ => continue,
        };
        let substitute = value(name).ok_or(Error::Template(name.to_string()))?;
        rendered.push_str(&text[last..whole.start()]);
        rendered.push_str(&substitute);
        last = whole.end();
    }
    rendered.push_str(&text[last..]);
    Ok(rendered)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hardware::{Antenna, Receiver};
    use crate::tests::toolkit::document;

    fn header(marker: &str, model: &str, firmware: &str) -> Header {
        let mut header = document(&[("G", &["C1C", "C1W", "L1C", "L2W", "S1C"])], &[]).header;
        header.marker_name = marker.to_string();
        header.receiver = Some(
            Receiver::default()
                .with_model(model)
                .with_firmware(firmware),
        );
        header.antenna = Some(Antenna::default().with_model("LEIAR25.R3      NONE"));
        header
    }

    #[test]
    fn template_rendering() {
        let rendered = render("a {expt} b {doy}", |name| match name {
            "expt" => Some("anta".to_string()),
            "doy" => Some("063".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(rendered, "a anta b 063");

        match render("{expt} {unknown}", |name| {
            if name == "expt" {
                Some(String::new())
            } else {
                None
            }
        }) {
            Err(Error::Template(name)) => assert_eq!(name, "unknown"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn single_station() {
        let template = BatchTemplate::new("anta", 2025, 1);
        let header = header("CAS100ATA", "SEPT POLARX5", "5.4.0");
        let content = BatchFallbackGenerator::default()
            .generate(&header, &template)
            .unwrap();
        let lines = content.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "infor 1");
        assert_eq!(lines[4], "coord 1 lanta5.001");
        assert_eq!(lines[7], "svclk 1 jbrdc5.001");
        assert_eq!(lines[10], "rdorb 1 brdc0010.25n");
        assert_eq!(lines[11], "gnss  1 G");
        assert_eq!(lines[14], "cas1 2025 001 1  SEP  5.40");
        assert_eq!(
            lines[16],
            "G   SEP  5.40 LEIAR25.R3      NONE  5 C1 P1 L1 S1 L2"
        );
    }

    #[test]
    fn session() {
        let template = BatchTemplate::new("anta", 2025, 1)
            .with_navigation_file("auto0010.25n")
            .with_text("{nav}\n{sites}\n");
        let headers = vec![
            header("CAS100ATA", "SEPT POLARX5", "5.4.0"),
            header("DAV100ATA", "LEICA GR50", "4.31/6.523"),
            header("??", "LEICA GR50", "4.31"),
        ];
        let content = BatchFallbackGenerator::default()
            .generate_session(&headers, &template)
            .unwrap();
        assert_eq!(
            content,
            "auto0010.25n\ncas1 2025 001 1  SEP  5.40\ndav1 2025 001 1  LEI  4.31\n"
        );

        let template = template.with_text("{station}");
        assert!(matches!(
            BatchFallbackGenerator::default().generate_session(&headers, &template),
            Err(Error::Template(_))
        ));
        assert!(matches!(
            BatchFallbackGenerator::default().generate_session(&headers[2..], &template),
            Err(Error::EmptyDocument(_))
        ));
    }

    #[test]
    fn control_file() {
        let dir = tempfile::tempdir().unwrap();
        let template = BatchTemplate::new("anta", 2025, 1);
        let headers = vec![header("CAS100ATA", "SEPT POLARX5", "5.4.0")];
        let path = BatchFallbackGenerator::default()
            .write(&headers, &template, dir.path())
            .unwrap();
        assert_eq!(path, dir.path().join("anta.makex.batch"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("cas1 2025 001 1  SEP  5.40"));
    }
}
