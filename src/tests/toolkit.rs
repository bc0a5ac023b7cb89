//! Test tools
use std::{collections::BTreeMap, path::PathBuf, str::FromStr};

use crate::{
    hardware::{Antenna, Receiver},
    header::Version,
    observation::{EpochFlag, EpochRecord, ObservationValue, SatelliteObservation},
    prelude::{Constellation, Duration, Epoch, Header, ObservationCode, Rinex3Document, SatelliteId},
};

/// Routes the crate logs to the test output, once
pub fn init_logger() {
    let _ = env_logger::Builder::from_default_env()
        .target(env_logger::Target::Stdout)
        .is_test(true)
        .try_init();
}

/// Satellite system from its letter ("G", "E"..)
pub fn constellation(letter: &str) -> Constellation {
    SatelliteId::from_str(&format!("{}01", letter))
        .unwrap()
        .system
}

/// Builds an [ObservationCode] like "C1C" for this system letter
pub fn observation_code(system: &str, descriptor: &str) -> ObservationCode {
    ObservationCode::parse(constellation(system), descriptor).unwrap()
}

/// Path to one test resource
pub fn test_resource(relative: &str) -> PathBuf {
    PathBuf::new()
        .join(env!("CARGO_MANIFEST_DIR"))
        .join("test_resources")
        .join(relative)
}

/// Builds a [Rinex3Document] in memory.
/// `systems` declares the observables per system letter,
/// each epoch lists satellites and their values, in declaration order
/// (None is an absent observation). Epochs are 30s apart,
/// starting 2022-03-04T00:00:00 GPST.
pub fn document(
    systems: &[(&str, &[&str])],
    epochs: &[&[(&str, &[Option<f64>])]],
) -> Rinex3Document {
    let mut codes = BTreeMap::<Constellation, Vec<ObservationCode>>::new();
    for (letter, descriptors) in systems.iter() {
        codes.insert(
            constellation(letter),
            descriptors
                .iter()
                .map(|d| observation_code(letter, d))
                .collect(),
        );
    }

    let header = Header {
        version: Version { major: 3, minor: 4 },
        constellation: Some(if codes.len() > 1 {
            Constellation::Mixed
        } else {
            codes.keys().next().copied().unwrap_or(Constellation::GPS)
        }),
        program: "sbf2rin-13.4.3".to_string(),
        run_by: "AAD".to_string(),
        date: "20220304 010000 UTC".to_string(),
        marker_name: "CAS100ATA".to_string(),
        receiver: Some(
            Receiver::default()
                .with_serial_number("3047942")
                .with_model("SEPT POLARX5")
                .with_firmware("5.4.0"),
        ),
        antenna: Some(
            Antenna::default()
                .with_serial_number("5012")
                .with_model("LEIAR25.R3      NONE")
                .with_height(0.0),
        ),
        approx_position: (-901776.1482, 2409383.4250, -5816748.4390),
        interval: Duration::from_seconds(30.0),
        codes: codes.clone(),
        ..Default::default()
    };

    let t0 = Epoch::from_str("2022-03-04T00:00:00 GPST").unwrap();

    let epochs = epochs
        .iter()
        .enumerate()
        .map(|(i, satellites)| EpochRecord {
            epoch: t0 + Duration::from_seconds(30.0 * i as f64),
            flag: EpochFlag::Ok,
            clock_offset: None,
            satellites: satellites
                .iter()
                .map(|(sv, values)| {
                    let sv = SatelliteId::from_str(sv).unwrap();
                    let declared = codes.get(&sv.system).cloned().unwrap_or_default();
                    SatelliteObservation {
                        sv,
                        values: declared
                            .iter()
                            .zip(values.iter())
                            .filter_map(|(code, value)| {
                                value.map(|v| (*code, ObservationValue::new(v)))
                            })
                            .collect(),
                    }
                })
                .collect(),
        })
        .collect();

    Rinex3Document {
        header,
        epochs,
        events: Vec::new(),
    }
}

/// Asserts every line is exactly 80 columns wide
pub fn check_line_widths(content: &str) {
    for (nth, line) in content.lines().enumerate() {
        assert_eq!(
            line.len(),
            80,
            "line #{} is {} columns wide: \"{}\"",
            nth + 1,
            line.len(),
            line
        );
    }
}
