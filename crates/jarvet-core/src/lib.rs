pub mod archive;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod filter;
pub mod graph;
pub mod liveness;
pub mod packages;
pub mod pipeline;
pub mod types;

pub use archive::{Archive, ArchiveKind};
pub use catalog::{Profile, ProfileCatalog};
pub use classify::{Classifier, ProblematicArchive, Thresholds};
pub use config::Config;
pub use graph::{DependencyGraph, Visibility};
pub use pipeline::{AnalysisPipeline, AnalysisReport};
pub use types::*;
