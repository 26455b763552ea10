use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::archive::{Archive, ArchiveKind};

/// Pluggable classloader-visibility predicate for the dependency scan. An
/// edge dependent -> provider only exists when the provider's classes are
/// visible to the dependent at runtime.
pub trait Visibility: Send + Sync {
    fn is_visible(&self, provider: &Archive, dependent: &Archive) -> bool;
}

/// Flat-classpath default: every archive sees every other.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysVisible;

impl Visibility for AlwaysVisible {
    fn is_visible(&self, _provider: &Archive, _dependent: &Archive) -> bool {
        true
    }
}

/// Archives the target directly depends on: JAR-kind units providing at least
/// one class the target (including its sub-archives) requires. First matching
/// class wins per candidate.
pub fn direct_depends_on(
    target: &Archive,
    units: &[&Archive],
    visibility: &dyn Visibility,
) -> BTreeSet<String> {
    let requires = target.all_requires();
    let mut result = BTreeSet::new();
    for candidate in units {
        if candidate.kind != ArchiveKind::Jar || candidate.name == target.name {
            continue;
        }
        if !visibility.is_visible(candidate, target) {
            continue;
        }
        if requires.iter().any(|class| candidate.does_provide(class)) {
            result.insert(candidate.name.clone());
        }
    }
    result
}

/// The inverse question, asked directly rather than by inverting the map
/// (visibility is directional): JAR-kind units requiring at least one class
/// the target provides.
pub fn direct_dependants(
    target: &Archive,
    units: &[&Archive],
    visibility: &dyn Visibility,
) -> BTreeSet<String> {
    let mut result = BTreeSet::new();
    for candidate in units {
        if candidate.kind != ArchiveKind::Jar || candidate.name == target.name {
            continue;
        }
        if !visibility.is_visible(target, candidate) {
            continue;
        }
        if candidate
            .all_requires()
            .iter()
            .any(|class| target.does_provide(class))
        {
            result.insert(candidate.name.clone());
        }
    }
    result
}

/// Required classes no visible JAR unit (nor the archive itself) provides.
/// These surface as loose ends in the dependency report instead of edges.
pub fn unresolved_requires(
    target: &Archive,
    units: &[&Archive],
    visibility: &dyn Visibility,
) -> BTreeSet<String> {
    target
        .all_requires()
        .into_iter()
        .filter(|class| {
            !target.does_provide(class)
                && !units.iter().any(|candidate| {
                    candidate.kind == ArchiveKind::Jar
                        && candidate.name != target.name
                        && candidate.does_provide(class)
                        && visibility.is_visible(candidate, target)
                })
        })
        .collect()
}

/// Directed archive dependency graph, built from a direct-relation map.
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
        }
    }

    pub fn from_direct_map(map: &BTreeMap<String, BTreeSet<String>>) -> Self {
        let mut graph = Self::new();
        for (from, deps) in map {
            graph.ensure_node(from);
            for to in deps {
                graph.add_edge(from, to);
            }
        }
        graph
    }

    pub fn ensure_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.index.insert(name.to_string(), idx);
        idx
    }

    pub fn add_edge(&mut self, from: &str, to: &str) {
        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);
        if !self.graph.contains_edge(from_idx, to_idx) {
            self.graph.add_edge(from_idx, to_idx, ());
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(String::as_str)
    }

    /// Direct relation map, every node present even with no edges.
    pub fn direct_map(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut map: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for idx in self.graph.node_indices() {
            map.entry(self.graph[idx].clone()).or_default();
        }
        for edge in self.graph.edge_references() {
            map.get_mut(&self.graph[edge.source()])
                .expect("source node registered")
                .insert(self.graph[edge.target()].clone());
        }
        map
    }

    /// Transitive closure of the relation. Expansion is guarded by membership
    /// in the accumulating result set, so every archive is expanded at most
    /// once and cycles terminate. An archive never appears in its own set.
    pub fn transitive_closure(&self) -> BTreeMap<String, BTreeSet<String>> {
        let direct = self.direct_map();
        let mut transitive = BTreeMap::new();
        for (origin, deps) in &direct {
            let mut result = BTreeSet::new();
            for dep in deps {
                resolve(origin, dep, &direct, &mut result);
            }
            transitive.insert(origin.clone(), result);
        }
        transitive
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve(
    origin: &str,
    scan: &str,
    direct: &BTreeMap<String, BTreeSet<String>>,
    result: &mut BTreeSet<String>,
) {
    if scan == origin || result.contains(scan) {
        return;
    }
    result.insert(scan.to_string());
    if let Some(next) = direct.get(scan) {
        for dep in next {
            resolve(origin, dep, direct, result);
        }
    }
}

/// Mutually reachable pairs: B is circular with respect to A exactly when
/// each appears in the other's transitive set. Only archives with a non-empty
/// circular set are reported.
pub fn circular_sets(
    transitive: &BTreeMap<String, BTreeSet<String>>,
) -> BTreeMap<String, BTreeSet<String>> {
    let mut circular = BTreeMap::new();
    for (archive, reachable) in transitive {
        let partners: BTreeSet<String> = reachable
            .iter()
            .filter(|other| {
                transitive
                    .get(*other)
                    .is_some_and(|back| back.contains(archive))
            })
            .cloned()
            .collect();
        if !partners.is_empty() {
            circular.insert(archive.clone(), partners);
        }
    }
    circular
}
