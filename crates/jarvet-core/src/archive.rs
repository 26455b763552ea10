use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of packaged code unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveKind {
    Class,
    Jar,
    War,
    Ear,
}

impl ArchiveKind {
    /// WAR and EAR archives group sub-archives; JAR and CLASS hold code directly.
    pub fn is_nestable(&self) -> bool {
        matches!(self, ArchiveKind::War | ArchiveKind::Ear)
    }
}

/// A malformed archive record. These are recovered per-archive: the offending
/// record is excluded from analysis and reported, the run continues.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("archive '{name}' is {kind:?} but has sub-archives")]
    ChildrenOnLeaf { name: String, kind: ArchiveKind },
    #[error("class archive '{name}' provides {count} classes, expected exactly 1")]
    ClassProvides { name: String, count: usize },
    #[error("archive '{child}' records parent '{found}' but is nested under '{expected}'")]
    ParentMismatch {
        child: String,
        expected: String,
        found: String,
    },
}

/// A scanned archive: a class file, a jar, or a war/ear bundle with nested
/// sub-archives. Built once by the scanning stage, immutable afterwards.
///
/// `children` are owned; `parent` is only the enclosing archive's name, used
/// for lookups and display, never for traversal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Archive {
    pub name: String,
    pub kind: ArchiveKind,
    /// Provided class name -> serial version UID, when the class declares one.
    #[serde(default)]
    pub provides: BTreeMap<String, Option<i64>>,
    /// Externally referenced class names.
    #[serde(default)]
    pub requires: BTreeSet<String>,
    /// Physical paths this logical archive was found at.
    #[serde(default)]
    pub locations: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Archive>,
}

impl Archive {
    pub fn does_provide(&self, class: &str) -> bool {
        self.provides.contains_key(class)
    }

    /// Requires of this archive plus, for nestable kinds, everything its
    /// sub-archives require. Duplicate sub-archive entries are skipped by name.
    pub fn all_requires(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        let mut seen = HashSet::new();
        collect_requires(self, &mut out, &mut seen);
        out
    }

    /// Check the record against the data-model invariants.
    pub fn validate(&self) -> Result<(), ModelError> {
        if !self.kind.is_nestable() && !self.children.is_empty() {
            return Err(ModelError::ChildrenOnLeaf {
                name: self.name.clone(),
                kind: self.kind,
            });
        }
        if self.kind == ArchiveKind::Class && self.provides.len() != 1 {
            return Err(ModelError::ClassProvides {
                name: self.name.clone(),
                count: self.provides.len(),
            });
        }
        for child in &self.children {
            if let Some(recorded) = &child.parent {
                if recorded != &self.name {
                    return Err(ModelError::ParentMismatch {
                        child: child.name.clone(),
                        expected: self.name.clone(),
                        found: recorded.clone(),
                    });
                }
            }
            child.validate()?;
        }
        Ok(())
    }
}

fn collect_requires<'a>(archive: &'a Archive, out: &mut BTreeSet<String>, seen: &mut HashSet<&'a str>) {
    if !seen.insert(archive.name.as_str()) {
        return;
    }
    out.extend(archive.requires.iter().cloned());
    for child in &archive.children {
        collect_requires(child, out, seen);
    }
}

/// Flatten an archive forest to its JAR/CLASS units, ignoring the WAR/EAR
/// containers themselves. Completeness and no duplicates are guaranteed
/// (identity is the archive name); ordering is not.
pub fn flatten<'a>(roots: impl IntoIterator<Item = &'a Archive>) -> Vec<&'a Archive> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for root in roots {
        descend(root, &mut out, &mut seen);
    }
    out
}

fn descend<'a>(archive: &'a Archive, out: &mut Vec<&'a Archive>, seen: &mut HashSet<&'a str>) {
    if !seen.insert(archive.name.as_str()) {
        return;
    }
    if archive.kind.is_nestable() {
        for child in &archive.children {
            descend(child, out, seen);
        }
    } else {
        out.push(archive);
    }
}

/// Global provides index: class name -> names of the archives providing it,
/// over the flattened forest.
pub fn global_provides(units: &[&Archive]) -> BTreeMap<String, BTreeSet<String>> {
    let mut index: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for unit in units {
        for class in unit.provides.keys() {
            index
                .entry(class.clone())
                .or_default()
                .insert(unit.name.clone());
        }
    }
    index
}
