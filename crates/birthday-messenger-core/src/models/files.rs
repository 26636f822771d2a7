use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Upload slot a student spreadsheet belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcademicYear {
    First,
    Second,
    Third,
    Fourth,
}

impl AcademicYear {
    pub const ALL: [AcademicYear; 4] = [
        AcademicYear::First,
        AcademicYear::Second,
        AcademicYear::Third,
        AcademicYear::Fourth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AcademicYear::First => "first",
            AcademicYear::Second => "second",
            AcademicYear::Third => "third",
            AcademicYear::Fourth => "fourth",
        }
    }
}

impl fmt::Display for AcademicYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AcademicYear {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" | "1" => Ok(AcademicYear::First),
            "second" | "2" => Ok(AcademicYear::Second),
            "third" | "3" => Ok(AcademicYear::Third),
            "fourth" | "4" => Ok(AcademicYear::Fourth),
            other => Err(format!("Unknown year: {} (expected first, second, third or fourth)", other)),
        }
    }
}

/// Uploaded spreadsheets keyed by year, as listed by `GET /files`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileListing {
    #[serde(default)]
    pub files: BTreeMap<String, Vec<String>>,
}

impl FileListing {
    pub fn total(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    pub fn for_year(&self, year: AcademicYear) -> &[String] {
        self.files
            .get(year.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
