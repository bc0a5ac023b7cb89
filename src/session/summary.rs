//! Processing summary grammar
use lazy_static::lazy_static;
use regex::Regex;

use crate::prelude::Error;

use super::{fortran_float, section_error, SessionResult};

lazy_static! {
    static ref PREFIT_NRMS: Regex =
        Regex::new(r"Prefit\s+nrms\s*:\s*(\d*\.\d+(?:[EeDd][-+]?\d+)?)").unwrap();
    static ref POSTFIT_NRMS: Regex =
        Regex::new(r"Postfit\s+nrms\s*:\s*(\d*\.\d+(?:[EeDd][-+]?\d+)?)").unwrap();
    static ref AMBIGUITIES: Regex = Regex::new(r"\)\s*:\s*(\d+)\s+(\d+)\s+(\d+)").unwrap();
    static ref WL_RATE: Regex = Regex::new(r"WL\s+fixed\s+([\d.]+)%").unwrap();
    static ref NL_RATE: Regex = Regex::new(r"NL\s+fixed\s+([\d.]+)%").unwrap();
}

/// Parses a summary file content
pub(crate) fn parse(file: &str, content: &str) -> Result<SessionResult, Error> {
    let mut result = SessionResult::default();

    for (index, line) in content.lines().enumerate() {
        let line_num = index + 1;

        if line.contains("Prefit nrms") {
            let prefit = PREFIT_NRMS
                .captures(line)
                .and_then(|caps| caps.get(1))
                .and_then(|m| fortran_float(m.as_str()))
                .ok_or_else(|| section_error(file, line_num, "invalid prefit nrms"))?;
            result.summary.insert("nrms".to_string(), prefit);

            if let Some(postfit) = POSTFIT_NRMS
                .captures(line)
                .and_then(|caps| caps.get(1))
                .and_then(|m| fortran_float(m.as_str()))
            {
                result.summary.insert("postfit_nrms".to_string(), postfit);
            }
        }

        if line.contains("Phase ambiguities") && line.contains("Total") {
            let caps = AMBIGUITIES
                .captures(line)
                .ok_or_else(|| section_error(file, line_num, "invalid ambiguity counts"))?;
            for (i, key) in ["num_ambiguities", "wl_fixed", "nl_fixed"]
                .iter()
                .enumerate()
            {
                let n = caps
                    .get(i + 1)
                    .and_then(|m| m.as_str().parse::<f64>().ok())
                    .ok_or_else(|| section_error(file, line_num, "invalid ambiguity counts"))?;
                result.summary.insert(key.to_string(), n);
            }
        }

        if line.contains("WL fixed") && line.contains('%') {
            for (re, key) in [(&*WL_RATE, "wl_rate"), (&*NL_RATE, "nl_rate")] {
                if let Some(rate) = re
                    .captures(line)
                    .and_then(|caps| caps.get(1))
                    .and_then(|m| m.as_str().parse::<f64>().ok())
                {
                    result.summary.insert(key.to_string(), rate);
                }
            }
        }
    }

    Ok(result)
}
