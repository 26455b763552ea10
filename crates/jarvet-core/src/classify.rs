use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::archive::{flatten, Archive, ArchiveKind};
use crate::catalog::Profile;
use crate::filter::KeyFilter;
use crate::types::Severity;

/// Severity thresholds on the count of distinct non-suppressed problematic
/// archives: `red` or more escalates to Error, `yellow` or more to Warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub red: usize,
    pub yellow: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self { red: 10, yellow: 5 }
    }
}

impl Thresholds {
    /// Stricter defaults for the JDK/EE variant: these classes conflict with
    /// the runtime itself, so far fewer archives are tolerated.
    pub fn jdk_ee() -> Self {
        Self { red: 6, yellow: 2 }
    }

    pub fn severity(&self, active: usize) -> Severity {
        if active >= self.red {
            Severity::Error
        } else if active >= self.yellow {
            Severity::Warning
        } else {
            Severity::Info
        }
    }
}

/// An archive that overlaps one or more platform profiles. Ordered by archive
/// identity (name, then locations), tie-broken by the matched profile list,
/// so duplicates collapse in a set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProblematicArchive {
    pub archive: String,
    pub locations: BTreeSet<String>,
    /// Codes of every profile the archive overlapped, in classifier order.
    pub profiles: Vec<String>,
    /// Per profile code: origin location within the platform -> the provided
    /// classes that location already ships.
    pub origins: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
}

/// Matches archives against a set of platform profiles. Both classifier
/// variants are instances of this type parameterized by profile set and
/// thresholds.
pub struct Classifier<'a> {
    profiles: Vec<&'a Profile>,
    thresholds: Thresholds,
}

impl<'a> Classifier<'a> {
    pub fn new(profiles: Vec<&'a Profile>, thresholds: Thresholds) -> Self {
        Self { profiles, thresholds }
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Classify one JAR archive. Returns None for other kinds or when no
    /// profile overlaps.
    pub fn classify_archive(&self, archive: &Archive) -> Option<ProblematicArchive> {
        if archive.kind != ArchiveKind::Jar {
            return None;
        }

        let mut matched = Vec::new();
        let mut origins = BTreeMap::new();
        for profile in &self.profiles {
            let mut by_location: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
            for class in archive.provides.keys() {
                if let Some(locations) = profile.locations_of(class) {
                    for location in locations {
                        by_location
                            .entry(location.clone())
                            .or_default()
                            .insert(class.clone());
                    }
                }
            }
            if !by_location.is_empty() {
                matched.push(profile.code.clone());
                origins.insert(profile.code.clone(), by_location);
            }
        }

        if matched.is_empty() {
            return None;
        }
        Some(ProblematicArchive {
            archive: archive.name.clone(),
            locations: archive.locations.clone(),
            profiles: matched,
            origins,
        })
    }

    /// Classify every JAR in the forest, descending into WAR/EAR containers.
    pub fn classify(&self, roots: &[Archive]) -> BTreeSet<ProblematicArchive> {
        flatten(roots)
            .iter()
            .filter_map(|unit| self.classify_archive(unit))
            .collect()
    }

    /// Category severity from the count of distinct non-suppressed archives.
    pub fn severity(
        &self,
        problems: &BTreeSet<ProblematicArchive>,
        filter: &KeyFilter,
    ) -> (Severity, usize) {
        let suppressed = problems
            .iter()
            .filter(|p| filter.is_filtered(&p.archive))
            .count();
        let active = problems.len() - suppressed;
        (self.thresholds.severity(active), suppressed)
    }
}
