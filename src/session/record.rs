//! Session results
use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::prelude::{Epoch, Error};

#[cfg(feature = "serde")]
use serde::Serialize;

/// Zenith delay time tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ZtdTime {
    /// Piecewise node of the solution, 0 being the session mean
    Node(u16),
    /// Epoch of a tabulated time series
    Epoch(Epoch),
}

impl std::fmt::Display for ZtdTime {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Node(n) => write!(f, "{}", n),
            Self::Epoch(e) => write!(f, "{}", e),
        }
    }
}

/// Zenith total delay estimate
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ZtdRecord {
    /// 4 character station name (uppercase)
    pub station: String,
    pub time: ZtdTime,
    /// Zenith total delay (m)
    pub value: f64,
    /// Formal uncertainty (m)
    pub sigma: f64,
    /// Adjustment to the a priori value (m), when the solution reports it
    pub adjustment: Option<f64>,
}

impl ZtdRecord {
    fn key(&self) -> (&str, ZtdTime) {
        (&self.station, self.time)
    }
}

/// Geocentric coordinate component
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Component {
    Latitude,
    Longitude,
    Radius,
}

/// Solution of one [Component]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ComponentSolution {
    /// Final value: decimal degrees for angles, km for the radius
    pub value: f64,
    /// Adjustment (m)
    pub adjustment: f64,
    /// Formal uncertainty (m)
    pub sigma: f64,
}

/// Station coordinates solution
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CoordinateRecord {
    pub station: String,
    pub latitude: Option<ComponentSolution>,
    pub longitude: Option<ComponentSolution>,
    pub radius: Option<ComponentSolution>,
}

impl CoordinateRecord {
    pub fn new(station: &str) -> Self {
        Self {
            station: station.to_string(),
            ..Default::default()
        }
    }

    /// Stores this [ComponentSolution]
    pub fn set(&mut self, component: Component, solution: ComponentSolution) {
        match component {
            Component::Latitude => self.latitude = Some(solution),
            Component::Longitude => self.longitude = Some(solution),
            Component::Radius => self.radius = Some(solution),
        }
    }

    pub fn component(&self, component: Component) -> Option<&ComponentSolution> {
        match component {
            Component::Latitude => self.latitude.as_ref(),
            Component::Longitude => self.longitude.as_ref(),
            Component::Radius => self.radius.as_ref(),
        }
    }

    /* fills what other solved */
    fn update(&mut self, other: &Self) {
        for component in [Component::Latitude, Component::Longitude, Component::Radius] {
            if let Some(solution) = other.component(component) {
                self.set(component, *solution);
            }
        }
    }
}

/// Baseline solution
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct BaselineRecord {
    pub from: String,
    pub to: String,
    /// Length (m)
    pub length: f64,
    /// Formal uncertainty (m)
    pub sigma: f64,
}

/// Session output file that could not be parsed (lenient mode)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SectionFailure {
    pub file: String,
    pub line: usize,
    pub reason: String,
}

impl SectionFailure {
    /// Builds a [SectionFailure] from a [Error::SectionParse]
    pub(crate) fn from_error(e: &Error) -> Option<Self> {
        match e {
            Error::SectionParse { file, line, reason } => Some(Self {
                file: file.clone(),
                line: *line,
                reason: reason.clone(),
            }),
            _ => None,
        }
    }
}

/// Everything extracted from one session directory.
/// Sections are empty (never missing) when the session lacks their files.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SessionResult {
    /// Scalar statistics (nrms, ambiguity counts, fixing rates..)
    pub summary: BTreeMap<String, f64>,
    /// Zenith delays, sorted by station then time
    pub ztd: Vec<ZtdRecord>,
    /// Coordinates, sorted by station
    pub coordinates: Vec<CoordinateRecord>,
    /// Baselines, sorted by site pair
    pub baselines: Vec<BaselineRecord>,
    /// Sections that failed to parse
    pub failures: Vec<SectionFailure>,
}

impl SessionResult {
    /// Returns true if nothing was extracted
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty()
            && self.ztd.is_empty()
            && self.coordinates.is_empty()
            && self.baselines.is_empty()
    }

    /// Statistic value, if extracted
    pub fn statistic(&self, key: &str) -> Option<f64> {
        self.summary.get(key).copied()
    }

    /// Zenith delays of this station
    pub fn station_ztd<'a>(&'a self, station: &'a str) -> impl Iterator<Item = &'a ZtdRecord> + 'a {
        self.ztd.iter().filter(move |r| r.station == station)
    }

    /// Merges rhs into self. Records of rhs replace records of self
    /// that share their key, so merging the same content twice is a no-op.
    pub fn merge_mut(&mut self, rhs: &Self) {
        for (key, value) in rhs.summary.iter() {
            self.summary.insert(key.clone(), *value);
        }

        for record in rhs.ztd.iter() {
            match self.ztd.iter_mut().find(|r| r.key() == record.key()) {
                Some(existing) => *existing = record.clone(),
                None => self.ztd.push(record.clone()),
            }
        }

        for record in rhs.coordinates.iter() {
            match self
                .coordinates
                .iter_mut()
                .find(|r| r.station == record.station)
            {
                Some(existing) => existing.update(record),
                None => self.coordinates.push(record.clone()),
            }
        }

        for record in rhs.baselines.iter() {
            match self
                .baselines
                .iter_mut()
                .find(|r| r.from == record.from && r.to == record.to)
            {
                Some(existing) => *existing = record.clone(),
                None => self.baselines.push(record.clone()),
            }
        }

        for failure in rhs.failures.iter() {
            if !self.failures.contains(failure) {
                self.failures.push(failure.clone());
            }
        }
        self.sort();
    }

    /// Sorts every section by key
    pub(crate) fn sort(&mut self) {
        self.ztd
            .sort_by(|a, b| a.station.cmp(&b.station).then(a.time.cmp(&b.time)));
        self.coordinates.sort_by(|a, b| a.station.cmp(&b.station));
        self.baselines
            .sort_by(|a, b| a.from.cmp(&b.from).then(a.to.cmp(&b.to)));
        self.failures.sort();
    }

    /// Merges two [SessionResult]s, see [Self::merge_mut]
    pub fn merge(&self, rhs: &Self) -> Self {
        let mut s = self.clone();
        s.merge_mut(rhs);
        s
    }

    /// Exports as a JSON document with `summary`, `ztd`, `coordinates`,
    /// `baselines` and `failures` keys.
    #[cfg(feature = "serde")]
    #[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Io(e.into()))
    }

    /// Zenith delays as CSV
    pub fn ztd_csv(&self) -> String {
        let mut csv = String::from("station,time,ztd_m,sigma_m,adjustment_m\n");
        for record in self.ztd.iter() {
            let _ = writeln!(
                csv,
                "{},{},{:.8},{:.6},{}",
                record.station,
                record.time,
                record.value,
                record.sigma,
                record
                    .adjustment
                    .map(|adj| format!("{:.6}", adj))
                    .unwrap_or_default()
            );
        }
        csv
    }
}
