use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::archive::Archive;

/// Package of a fully qualified class name; the default package is "".
pub fn package_of(class: &str) -> &str {
    match class.rfind('.') {
        Some(idx) => &class[..idx],
        None => "",
    }
}

/// Project class-level requires/provides to package level and merge into one
/// global mapping: every package an archive provides depends on the package
/// projection of that archive's requires. Self-references are stripped after
/// the merge; a package never depends on itself.
pub fn package_dependencies(units: &[&Archive]) -> BTreeMap<String, BTreeSet<String>> {
    let mut merged: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for unit in units {
        let required_packages: BTreeSet<&str> =
            unit.requires.iter().map(|class| package_of(class)).collect();
        for class in unit.provides.keys() {
            let entry = merged.entry(package_of(class).to_string()).or_default();
            entry.extend(required_packages.iter().map(|p| p.to_string()));
        }
    }
    for (package, deps) in merged.iter_mut() {
        deps.remove(package.as_str());
    }
    merged
}

/// Duplicate-package analysis output: conflicting packages grouped under
/// their longest common subpackage, plus the providing archives per package.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageClusters {
    /// Common subpackage -> the conflicting packages merged under it.
    pub clusters: BTreeMap<String, BTreeSet<String>>,
    /// Conflicting package -> archives providing it.
    pub providers: BTreeMap<String, BTreeSet<String>>,
}

impl PackageClusters {
    /// Archives that provide any package of the given cluster.
    pub fn cluster_archives(&self, common: &str) -> BTreeSet<String> {
        let mut archives = BTreeSet::new();
        if let Some(packages) = self.clusters.get(common) {
            for package in packages {
                if let Some(providers) = self.providers.get(package) {
                    archives.extend(providers.iter().cloned());
                }
            }
        }
        archives
    }
}

/// Build duplicate-package clusters from the global provides index: group
/// classes into packages, keep the packages provided by more than one
/// archive, and cluster those by longest common subpackage.
pub fn duplicate_package_clusters(
    global_provides: &BTreeMap<String, BTreeSet<String>>,
) -> PackageClusters {
    let mut package_providers: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (class, archives) in global_provides {
        package_providers
            .entry(package_of(class).to_string())
            .or_default()
            .extend(archives.iter().cloned());
    }

    let conflicting: BTreeSet<String> = package_providers
        .iter()
        .filter(|(_, archives)| archives.len() > 1)
        .map(|(package, _)| package.clone())
        .collect();

    let clusters = common_subpackages(&conflicting);
    let providers = package_providers
        .into_iter()
        .filter(|(package, _)| conflicting.contains(package))
        .collect();

    PackageClusters { clusters, providers }
}

/// Cluster packages by longest common subpackage. Each package either merges
/// into the first existing cluster it shares a package boundary with (the
/// cluster is rekeyed to the possibly shorter common prefix) or starts its
/// own singleton cluster.
pub fn common_subpackages(packages: &BTreeSet<String>) -> BTreeMap<String, BTreeSet<String>> {
    let mut commons: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for package in packages {
        let matched = commons.keys().find_map(|key| {
            longest_common_subpackage(package, key).map(|common| (key.clone(), common))
        });
        match matched {
            Some((key, common)) => {
                let mut members = commons.remove(&key).unwrap_or_default();
                members.insert(package.clone());
                commons.entry(common).or_default().extend(members);
            }
            None => {
                commons
                    .entry(package.clone())
                    .or_default()
                    .insert(package.clone());
            }
        }
    }
    commons
}

/// Byte length of the shared leading character run of two strings.
fn greatest_common_prefix(a: &str, b: &str) -> usize {
    a.char_indices()
        .zip(b.chars())
        .find(|((_, ca), cb)| ca != cb)
        .map(|((idx, _), _)| idx)
        .unwrap_or_else(|| a.len().min(b.len()))
}

/// Number of dots in the prefix, ignoring a trailing run of dots.
fn interior_dots(common: &str) -> usize {
    common.trim_end_matches('.').matches('.').count()
}

/// The longest common subpackage of two package names, or None when the
/// shared prefix does not end on a package boundary that spans at least one
/// full parent segment. A partial identifier overlap ("cnx" vs "cnv") is
/// never common.
fn longest_common_subpackage(a: &str, b: &str) -> Option<String> {
    let max = greatest_common_prefix(a, b);
    if max == 0 {
        return None;
    }
    let longest = if a.len() > b.len() { a } else { b };
    let common = &longest[..max];

    let dots = interior_dots(common);
    if dots == 0 {
        return None;
    }

    if let Some(trimmed) = common.strip_suffix('.') {
        // the prefix already ends on a package boundary
        return Some(trimmed.to_string());
    }

    let next_dot = longest[max..].find('.').map(|i| i + max);
    match next_dot {
        // the common prefix is itself a complete package name
        Some(idx) if &longest[..idx] == common => Some(common.to_string()),
        // mismatch inside the last segment: with several shared parent
        // segments, back off to the last boundary; with only one, the
        // packages share a parent plus a partial segment and do not merge
        None if dots > 1 => common.rfind('.').map(|idx| common[..idx].to_string()),
        _ => None,
    }
}
