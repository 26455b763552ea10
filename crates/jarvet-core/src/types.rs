use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            _ => Err(anyhow::anyhow!("unknown severity: {s}")),
        }
    }
}

/// Category of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCategory {
    CircularDependencies,
    UnresolvedDependencies,
    DuplicatePackages,
    PlatformClasses,
    JdkEeClasses,
    UnusedArchives,
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingCategory::CircularDependencies => write!(f, "circular dependencies"),
            FindingCategory::UnresolvedDependencies => write!(f, "unresolved dependencies"),
            FindingCategory::DuplicatePackages => write!(f, "duplicate packages"),
            FindingCategory::PlatformClasses => write!(f, "platform classes"),
            FindingCategory::JdkEeClasses => write!(f, "jdk/ee classes"),
            FindingCategory::UnusedArchives => write!(f, "unused archives"),
        }
    }
}

/// Per-category summary of what a run found. `total` counts every hit,
/// `suppressed` the ones a configured filter struck out; severity is computed
/// from the non-suppressed remainder only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub category: FindingCategory,
    pub severity: Severity,
    pub total: usize,
    pub suppressed: usize,
}

impl Finding {
    pub fn active(&self) -> usize {
        self.total - self.suppressed
    }
}

/// An archive excluded from analysis because its record was malformed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedArchive {
    pub name: String,
    pub reason: String,
}
