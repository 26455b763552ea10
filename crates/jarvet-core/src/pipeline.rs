use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::archive::{flatten, global_provides, Archive};
use crate::catalog::{CatalogError, ProfileCatalog};
use crate::classify::{Classifier, ProblematicArchive, Thresholds};
use crate::config::Config;
use crate::filter::{FilterError, KeyFilter, KeyValueFilter};
use crate::graph::{
    circular_sets, direct_dependants, direct_depends_on, unresolved_requires, AlwaysVisible,
    DependencyGraph, Visibility,
};
use crate::liveness::{self, Liveness};
use crate::packages::{self, PackageClusters};
use crate::types::{Finding, FindingCategory, Severity, SkippedArchive};

/// Caller-configuration errors. These fail the run up front: no partial
/// result is meaningful when the configuration itself is wrong.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// A required class no archive in the snapshot provides. Suppression is
/// scoped to the depending archive, not global.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedDependency {
    pub archive: String,
    pub class: String,
    pub suppressed: bool,
}

/// Everything one analysis run computes, as plain data for the renderers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// JAR/CLASS units that were analyzed after flattening.
    pub archive_count: usize,
    pub skipped: Vec<SkippedArchive>,
    pub depends_on: BTreeMap<String, BTreeSet<String>>,
    pub transitive_depends_on: BTreeMap<String, BTreeSet<String>>,
    pub dependants: BTreeMap<String, BTreeSet<String>>,
    pub transitive_dependants: BTreeMap<String, BTreeSet<String>>,
    pub circular: BTreeMap<String, BTreeSet<String>>,
    pub package_dependencies: BTreeMap<String, BTreeSet<String>>,
    pub duplicate_packages: PackageClusters,
    pub platform_classes: BTreeSet<ProblematicArchive>,
    pub jdk_ee_classes: BTreeSet<ProblematicArchive>,
    pub unresolved: Vec<UnresolvedDependency>,
    pub liveness: Liveness,
    pub findings: Vec<Finding>,
    /// Per category, the identifiers a configured filter struck out. Findings
    /// stay listed in the maps above; these only mark them inactive.
    pub suppressed: BTreeMap<FindingCategory, BTreeSet<String>>,
}

impl AnalysisReport {
    pub fn finding(&self, category: FindingCategory) -> Option<&Finding> {
        self.findings.iter().find(|f| f.category == category)
    }

    pub fn max_severity(&self) -> Severity {
        self.findings
            .iter()
            .map(|f| f.severity)
            .max()
            .unwrap_or(Severity::Info)
    }

    pub fn is_suppressed(&self, category: FindingCategory, name: &str) -> bool {
        self.suppressed
            .get(&category)
            .is_some_and(|names| names.contains(name))
    }
}

struct CompiledFilters {
    circular: KeyFilter,
    unused: KeyFilter,
    duplicate_packages: KeyFilter,
    platform: KeyFilter,
    jdk_ee: KeyFilter,
    unresolved: KeyValueFilter,
}

/// Single-pass batch analysis over an immutable archive snapshot. Built once
/// per run from config and a loaded profile catalog; per-archive computations
/// fan out across worker threads and merge sequentially.
pub struct AnalysisPipeline {
    config: Config,
    catalog: ProfileCatalog,
    filters: CompiledFilters,
    visibility: Box<dyn Visibility>,
}

impl std::fmt::Debug for AnalysisPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisPipeline").finish_non_exhaustive()
    }
}

impl AnalysisPipeline {
    pub fn new(config: Config, catalog: ProfileCatalog) -> Result<Self, AnalysisError> {
        let filters = CompiledFilters {
            circular: KeyFilter::parse(&config.filters.circular),
            unused: KeyFilter::parse(&config.filters.unused),
            duplicate_packages: KeyFilter::parse(&config.filters.duplicate_packages),
            platform: KeyFilter::parse(&config.filters.platform),
            jdk_ee: KeyFilter::parse(&config.filters.jdk_ee),
            unresolved: KeyValueFilter::parse(&config.filters.unresolved)?,
        };
        Ok(Self {
            config,
            catalog,
            filters,
            visibility: Box::new(AlwaysVisible),
        })
    }

    /// Replace the classloader-visibility predicate used by the dependency
    /// scan.
    pub fn with_visibility(mut self, visibility: Box<dyn Visibility>) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the full analysis. Malformed archive records are excluded and
    /// reported in `skipped`; configuration errors abort the run.
    pub fn analyze(&self, roots: &[Archive]) -> Result<AnalysisReport, AnalysisError> {
        // resolve every requested profile before any work starts
        let platform_classifier = Classifier::new(
            self.catalog.select(&self.config.classifiers.platform.profiles)?,
            Thresholds {
                red: self.config.classifiers.platform.red,
                yellow: self.config.classifiers.platform.yellow,
            },
        );
        let jdk_ee_classifier = Classifier::new(
            self.catalog.select(&self.config.classifiers.jdk_ee.profiles)?,
            Thresholds {
                red: self.config.classifiers.jdk_ee.red,
                yellow: self.config.classifiers.jdk_ee.yellow,
            },
        );

        let mut valid: Vec<&Archive> = Vec::new();
        let mut skipped = Vec::new();
        for root in roots {
            match root.validate() {
                Ok(()) => valid.push(root),
                Err(e) => skipped.push(SkippedArchive {
                    name: root.name.clone(),
                    reason: e.to_string(),
                }),
            }
        }

        let units = flatten(valid.iter().copied());
        let visibility = self.visibility.as_ref();

        let depends_on: BTreeMap<String, BTreeSet<String>> = units
            .par_iter()
            .map(|unit| (unit.name.clone(), direct_depends_on(unit, &units, visibility)))
            .collect::<Vec<_>>()
            .into_iter()
            .collect();
        let dependants: BTreeMap<String, BTreeSet<String>> = units
            .par_iter()
            .map(|unit| (unit.name.clone(), direct_dependants(unit, &units, visibility)))
            .collect::<Vec<_>>()
            .into_iter()
            .collect();

        let transitive_depends_on = DependencyGraph::from_direct_map(&depends_on).transitive_closure();
        let transitive_dependants = DependencyGraph::from_direct_map(&dependants).transitive_closure();
        let circular = circular_sets(&transitive_depends_on);

        let package_dependencies = packages::package_dependencies(&units);
        let duplicate_packages = packages::duplicate_package_clusters(&global_provides(&units));

        let platform_classes = classify_units(&platform_classifier, &units);
        let jdk_ee_classes = classify_units(&jdk_ee_classifier, &units);

        let liveness = liveness::partition(&units);

        let unresolved: Vec<UnresolvedDependency> = units
            .par_iter()
            .map(|unit| {
                unresolved_requires(unit, &units, visibility)
                    .into_iter()
                    .map(|class| UnresolvedDependency {
                        suppressed: self.filters.unresolved.is_filtered(&unit.name, &class),
                        archive: unit.name.clone(),
                        class,
                    })
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect();

        let mut findings = Vec::new();
        let mut suppressed = BTreeMap::new();

        let circular_suppressed = suppressed_names(circular.keys(), &self.filters.circular);
        findings.push(escalating_finding(
            FindingCategory::CircularDependencies,
            circular.len(),
            circular_suppressed.len(),
            Severity::Error,
        ));
        suppressed.insert(FindingCategory::CircularDependencies, circular_suppressed);

        let unresolved_suppressed = unresolved.iter().filter(|d| d.suppressed).count();
        findings.push(escalating_finding(
            FindingCategory::UnresolvedDependencies,
            unresolved.len(),
            unresolved_suppressed,
            Severity::Warning,
        ));

        let flagged: Vec<&String> = duplicate_packages
            .clusters
            .keys()
            .filter(|common| duplicate_packages.cluster_archives(common).len() > 1)
            .collect();
        let cluster_suppressed =
            suppressed_names(flagged.iter().copied(), &self.filters.duplicate_packages);
        let cluster_active = flagged.len() - cluster_suppressed.len();
        findings.push(Finding {
            category: FindingCategory::DuplicatePackages,
            severity: if cluster_active >= 5 {
                Severity::Error
            } else if cluster_active >= 1 {
                Severity::Warning
            } else {
                Severity::Info
            },
            total: flagged.len(),
            suppressed: cluster_suppressed.len(),
        });
        suppressed.insert(FindingCategory::DuplicatePackages, cluster_suppressed);

        for (category, classifier, problems, filter) in [
            (
                FindingCategory::PlatformClasses,
                &platform_classifier,
                &platform_classes,
                &self.filters.platform,
            ),
            (
                FindingCategory::JdkEeClasses,
                &jdk_ee_classifier,
                &jdk_ee_classes,
                &self.filters.jdk_ee,
            ),
        ] {
            let (severity, suppressed_count) = classifier.severity(problems, filter);
            findings.push(Finding {
                category,
                severity,
                total: problems.len(),
                suppressed: suppressed_count,
            });
            suppressed.insert(
                category,
                suppressed_names(problems.iter().map(|p| &p.archive), filter),
            );
        }

        let unused_suppressed = suppressed_names(liveness.unused.iter(), &self.filters.unused);
        findings.push(escalating_finding(
            FindingCategory::UnusedArchives,
            liveness.unused.len(),
            unused_suppressed.len(),
            Severity::Warning,
        ));
        suppressed.insert(FindingCategory::UnusedArchives, unused_suppressed);

        Ok(AnalysisReport {
            archive_count: units.len(),
            skipped,
            depends_on,
            transitive_depends_on,
            dependants,
            transitive_dependants,
            circular,
            package_dependencies,
            duplicate_packages,
            platform_classes,
            jdk_ee_classes,
            unresolved,
            liveness,
            findings,
            suppressed,
        })
    }
}

fn classify_units(classifier: &Classifier<'_>, units: &[&Archive]) -> BTreeSet<ProblematicArchive> {
    units
        .par_iter()
        .filter_map(|unit| classifier.classify_archive(unit))
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}

fn suppressed_names<'a>(
    names: impl IntoIterator<Item = &'a String>,
    filter: &KeyFilter,
) -> BTreeSet<String> {
    names
        .into_iter()
        .filter(|name| filter.is_filtered(name))
        .cloned()
        .collect()
}

/// A category whose severity is fixed once any non-suppressed hit exists.
fn escalating_finding(
    category: FindingCategory,
    total: usize,
    suppressed: usize,
    severity: Severity,
) -> Finding {
    Finding {
        category,
        severity: if total > suppressed { severity } else { Severity::Info },
        total,
        suppressed,
    }
}
