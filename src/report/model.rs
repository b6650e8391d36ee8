use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// GitLab SAST report produced by the analysis container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VulnerabilityReport {
    pub vulnerabilities: Vec<Finding>,
}

/// One reported vulnerability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    #[serde(default)]
    pub severity: Severity,

    #[serde(default)]
    pub confidence: Severity,

    #[serde(default, deserialize_with = "null_as_default")]
    pub location: Location,

    /// Rule identifiers; only the first one is displayed
    #[serde(default, deserialize_with = "null_as_default")]
    pub identifiers: Vec<Identifier>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, deserialize_with = "null_as_default")]
    pub file: String,
    pub start_line: Option<u64>,
    pub end_line: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

/// Treat an explicit `null` like an absent field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Severity or confidence level. Matching is case-sensitive, so "high"
/// lands in `Other`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Other(String),
    #[default]
    Missing,
}

impl From<String> for Severity {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Critical" => Self::Critical,
            "High" => Self::High,
            "Medium" => Self::Medium,
            "Low" => Self::Low,
            "" => Self::Missing,
            _ => Self::Other(value),
        }
    }
}

impl From<Option<String>> for Severity {
    fn from(value: Option<String>) -> Self {
        value.map(Self::from).unwrap_or_default()
    }
}

impl From<Severity> for String {
    fn from(value: Severity) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Critical => write!(f, "Critical"),
            Self::High => write!(f, "High"),
            Self::Medium => write!(f, "Medium"),
            Self::Low => write!(f, "Low"),
            Self::Other(s) => write!(f, "{}", s),
            Self::Missing => Ok(()),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = |l: Option<u64>| l.map(|n| n.to_string()).unwrap_or_default();
        write!(f, "{}:{}:{}", self.file, line(self.start_line), line(self.end_line))
    }
}
