//! Solution (o-file) grammar
use std::collections::BTreeMap;

use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;

use crate::prelude::Error;

use super::{
    fortran_float, section_error, BaselineRecord, Component, ComponentSolution,
    CoordinateRecord, SessionResult, ZtdRecord, ZtdTime,
};

lazy_static! {
    /// Apriori and adjustment columns may touch: "2.2655438832-0.1066D-01"
    static ref ATMZEN: Regex = Regex::new(
        r"(\d+)\*(\w{4})\s+ATMZEN\s+m\s*(\d+)?\s*(\d+\.\d+)\s*([-+]?\d*\.\d+(?:[DdEe][-+]?\d+)?)\s+(\d*\.\d+(?:[DdEe][-+]?\d+)?)\s+([-+]?[\d.]+)\s+([-+]?[\d.]+)"
    )
    .unwrap();
    static ref COORDINATE: Regex =
        Regex::new(r"(\d+)\*(\w{4})\s+(?:GEOC\s+)?(LAT|LONG|RADIUS)\s+").unwrap();
    static ref D_VALUE: Regex = Regex::new(r"[-+]?\d*\.\d+[Dd][-+]?\d+").unwrap();
    static ref LATITUDE: Regex = Regex::new(r"([NS])(\d+):(\d+):([\d.]+)\s*$").unwrap();
    static ref LONGITUDE: Regex = Regex::new(r"([EW])(\d+):(\d+):([\d.]+)\s*$").unwrap();
    static ref RADIUS: Regex = Regex::new(r"(\d{4}\.\d+)\s*$").unwrap();
    static ref INTEGER: Regex = Regex::new(r"\d+").unwrap();
}

/// Converts a signed DMS angle ("S66:08:28.75536") to decimal degrees
fn dms_to_degrees(hemisphere: &str, d: &str, m: &str, s: &str) -> Option<f64> {
    let degrees =
        d.parse::<f64>().ok()? + m.parse::<f64>().ok()? / 60.0 + s.parse::<f64>().ok()? / 3600.0;
    match hemisphere {
        "S" | "W" => Some(-degrees),
        _ => Some(degrees),
    }
}

/*
 * Parses one ATMZEN line. Node values are relative to the session mean.
 */
fn parse_atmzen(file: &str, line_num: usize, line: &str) -> Result<ZtdRecord, Error> {
    let caps = ATMZEN
        .captures(line)
        .ok_or_else(|| section_error(file, line_num, "invalid ATMZEN line"))?;

    let group = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or("");

    let node = match caps.get(3) {
        Some(m) => m
            .as_str()
            .parse::<u16>()
            .map_err(|_| section_error(file, line_num, "invalid ATMZEN node"))?,
        None => 0,
    };

    let adjustment = fortran_float(group(5))
        .ok_or_else(|| section_error(file, line_num, "invalid ATMZEN adjustment"))?;
    let sigma = fortran_float(group(6))
        .ok_or_else(|| section_error(file, line_num, "invalid ATMZEN sigma"))?;
    let value = group(8)
        .parse::<f64>()
        .map_err(|_| section_error(file, line_num, "invalid ATMZEN estimate"))?;

    Ok(ZtdRecord {
        station: group(2).to_uppercase(),
        time: ZtdTime::Node(node),
        value,
        sigma,
        adjustment: Some(adjustment),
    })
}

/*
 * Parses one coordinate line: adjustment and sigma (m) are the first two
 * D formatted values, final value is the last column.
 */
fn parse_coordinate(
    file: &str,
    line_num: usize,
    line: &str,
    station: &str,
    component: Component,
) -> Result<ComponentSolution, Error> {
    let mut d_values = D_VALUE.find_iter(line).map(|m| fortran_float(m.as_str()));
    let (adjustment, sigma) = match (d_values.next(), d_values.next()) {
        (Some(Some(adj)), Some(Some(sigma))) => (adj, sigma),
        _ => {
            return Err(section_error(
                file,
                line_num,
                &format!("{}: missing adjustment or sigma", station),
            ))
        },
    };

    let value = match component {
        Component::Latitude | Component::Longitude => {
            let re = if component == Component::Latitude {
                &*LATITUDE
            } else {
                &*LONGITUDE
            };
            re.captures(line).and_then(|caps| {
                let group = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or("");
                dms_to_degrees(group(1), group(2), group(3), group(4))
            })
        },
        Component::Radius => RADIUS
            .captures(line)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok()),
    };

    let value = value.ok_or_else(|| {
        section_error(
            file,
            line_num,
            &format!("{}: missing final {:?}", station, component),
        )
    })?;

    Ok(ComponentSolution {
        value,
        adjustment,
        sigma,
    })
}

/*
 * Baseline row: "CAS1_GPS DAV1_GPS 1234567.8901 0.0012"
 */
fn parse_baseline(line: &str) -> Option<BaselineRecord> {
    let parts = line.split_whitespace().collect::<Vec<_>>();
    if parts.len() < 4 {
        return None;
    }
    let length = parts[2].parse::<f64>().ok()?;
    let sigma = parts[3].parse::<f64>().ok()?;
    Some(BaselineRecord {
        from: parts[0].chars().take(4).collect::<String>().to_uppercase(),
        to: parts[1].chars().take(4).collect::<String>().to_uppercase(),
        length,
        sigma,
    })
}

/// Parses an o-file content
pub(crate) fn parse(file: &str, content: &str) -> Result<SessionResult, Error> {
    let mut result = SessionResult::default();
    let mut nodes = Vec::<ZtdRecord>::new();
    let mut means = BTreeMap::<String, f64>::new();
    let mut coordinates = BTreeMap::<String, CoordinateRecord>::new();
    let mut in_baselines = false;

    for (index, line) in content.lines().enumerate() {
        let line_num = index + 1;

        if line.contains("Baseline") && line.contains("Length") {
            in_baselines = true;
            continue;
        }
        if in_baselines {
            if line.trim().is_empty() {
                in_baselines = false;
            } else {
                match parse_baseline(line) {
                    Some(baseline) => result.baselines.push(baseline),
                    None => debug!("{}:{}: not a baseline row", file, line_num),
                }
            }
            continue;
        }

        if line.contains("ATMZEN") {
            let record = parse_atmzen(file, line_num, line)?;
            if record.time == ZtdTime::Node(0) {
                means.insert(record.station.clone(), record.value);
                result.ztd.push(record);
            } else {
                nodes.push(record);
            }
            continue;
        }

        if let Some(caps) = COORDINATE.captures(line) {
            let station = caps
                .get(2)
                .map(|m| m.as_str().to_uppercase())
                .unwrap_or_default();
            let component = match caps.get(3).map(|m| m.as_str()) {
                Some("LAT") => Component::Latitude,
                Some("LONG") => Component::Longitude,
                _ => Component::Radius,
            };
            let solution = parse_coordinate(file, line_num, line, &station, component)?;
            coordinates
                .entry(station.clone())
                .or_insert_with(|| CoordinateRecord::new(&station))
                .set(component, solution);
            continue;
        }

        if line.contains("Double-difference observations") {
            if let Some(n) = INTEGER
                .find(line)
                .and_then(|m| m.as_str().parse::<f64>().ok())
            {
                result.summary.insert("num_observations".to_string(), n);
            }
        } else if line.contains("Total parameters") {
            let counts = INTEGER
                .find_iter(line)
                .filter_map(|m| m.as_str().parse::<f64>().ok())
                .take(2)
                .collect::<Vec<_>>();
            for (key, n) in ["num_parameters", "live_parameters"].iter().zip(counts) {
                result.summary.insert(key.to_string(), n);
            }
        }
    }

    for mut node in nodes {
        match means.get(&node.station) {
            Some(mean) => node.value += mean,
            None => warn!("{}: {} has no session mean zenith delay", file, node.station),
        }
        result.ztd.push(node);
    }

    result.coordinates = coordinates.into_values().collect();
    debug!(
        "{}: {} zenith delays, {} coordinates, {} baselines",
        file,
        result.ztd.len(),
        result.coordinates.len(),
        result.baselines.len()
    );
    result.sort();
    Ok(result)
}
