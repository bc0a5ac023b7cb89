//! Residuals (q-file) grammar
use lazy_static::lazy_static;
use regex::Regex;

use super::{fortran_float, SessionResult};

lazy_static! {
    static ref NUMBER: Regex = Regex::new(r"\d*\.\d+(?:[EeDd][-+]?\d+)?|\d+").unwrap();
}

/// Extracts the normalized rms from a q-file content. On each line that
/// mentions it, the first number is a candidate, retained when plausible
/// (0 < nrms < 10). The last line with a plausible candidate prevails.
pub(crate) fn parse(content: &str) -> SessionResult {
    let mut result = SessionResult::default();
    for line in content.lines() {
        if !line.to_lowercase().contains("nrms") {
            continue;
        }
        let nrms = NUMBER
            .find(line)
            .and_then(|m| fortran_float(m.as_str()))
            .filter(|n| *n > 0.0 && *n < 10.0);
        if let Some(nrms) = nrms {
            result.summary.insert("nrms".to_string(), nrms);
        }
    }
    result
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn nrms_fallback() {
        let content = "\
 Q-FILE
 Normalized rms (nrms) 0.1898E+00 for 24311 observations
 nrms 31.2
";
        let result = parse(content);
        assert_eq!(result.statistic("nrms"), Some(0.1898));
        assert!(parse(" no statistics here\n").is_empty());
    }
}
