//! Session output file identification
use lazy_static::lazy_static;
use regex::Regex;

#[cfg(feature = "serde")]
use serde::Serialize;

lazy_static! {
    static ref SOLUTION_NAME: Regex = Regex::new(r"^o\w+\.\d{3}$").unwrap();
    static ref RESIDUALS_NAME: Regex = Regex::new(r"^q\w+\.\d{3}$").unwrap();
    static ref SUMMARY_NAME: Regex = Regex::new(r"(^sh_\w*summary$|\.summary$)").unwrap();
    static ref MET_NAME: Regex = Regex::new(r"^met_\w{4}\.\d{5}$").unwrap();
}

/// Session output file kinds, in merge order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum FileKind {
    /// Solution residuals summary (q-file)
    Residuals,
    /// Solution (o-file): zenith delays, coordinates, baselines
    Solution,
    /// Tabulated zenith delay time series (met listing)
    MetListing,
    /// Processing summary
    Summary,
}

impl FileKind {
    /// Identifies a file from its name only
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        if SOLUTION_NAME.is_match(&name) {
            Some(Self::Solution)
        } else if RESIDUALS_NAME.is_match(&name) {
            Some(Self::Residuals)
        } else if SUMMARY_NAME.is_match(&name) {
            Some(Self::Summary)
        } else if MET_NAME.is_match(&name) {
            Some(Self::MetListing)
        } else {
            None
        }
    }

    /// Identifies a file from its first line only
    pub fn from_signature(first_line: &str) -> Option<Self> {
        let upper = first_line.to_uppercase();
        if upper.contains("Q-FILE") {
            Some(Self::Residuals)
        } else if upper.contains("O-FILE") || upper.contains("SOLVE") {
            Some(Self::Solution)
        } else if upper.contains("SUMMARY") || upper.contains("SH_GAMIT") {
            Some(Self::Summary)
        } else if upper.contains("TOTAL ZEN")
            || (upper.trim_start().starts_with('*') && upper.contains("MET"))
        {
            Some(Self::MetListing)
        } else {
            None
        }
    }

    /// Identifies a file by name, then by first line content
    pub fn classify(name: &str, first_line: &str) -> Option<Self> {
        Self::from_name(name).or_else(|| Self::from_signature(first_line))
    }
}
