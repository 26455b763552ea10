use std::collections::{BTreeMap, HashMap};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no profile loaded for code '{code}'")]
    MissingProfile { code: String },
    #[error("profile data for '{code}' is malformed: {reason}")]
    MalformedProfile { code: String, reason: String },
    #[error("failed to read profile data for '{code}': {source}")]
    Io {
        code: String,
        #[source]
        source: std::io::Error,
    },
}

/// Static metadata for a profile: code, display name, bytecode major version,
/// and the label of the platform archive the profile represents.
#[derive(Debug, Clone)]
pub struct ProfileMeta {
    pub code: &'static str,
    pub name: &'static str,
    pub class_version: u32,
    pub origin: &'static str,
}

/// Profiles the original platform distributions ship class lists for.
/// Further codes can be supplied through configuration.
pub const KNOWN_PROFILES: &[ProfileMeta] = &[
    ProfileMeta { code: "sunjava5", name: "Sun Java 5", class_version: 49, origin: "rt.jar" },
    ProfileMeta { code: "sunjava6", name: "Sun Java 6", class_version: 50, origin: "rt.jar" },
    ProfileMeta { code: "java7", name: "Java 7", class_version: 51, origin: "rt.jar" },
    ProfileMeta { code: "java8", name: "Java 8", class_version: 52, origin: "rt.jar" },
    ProfileMeta { code: "javaee5", name: "Java EE 5", class_version: 49, origin: "javaee-api-5.jar" },
    ProfileMeta { code: "javaee6", name: "Java EE 6", class_version: 50, origin: "javaee-api-6.jar" },
    ProfileMeta { code: "javaee7", name: "Java EE 7", class_version: 51, origin: "javaee-api-7.jar" },
    ProfileMeta { code: "eap429", name: "EAP 4.2.9", class_version: 49, origin: "jboss-eap-4.2" },
    ProfileMeta { code: "eap4310", name: "EAP 4.3.10", class_version: 49, origin: "jboss-eap-4.3" },
    ProfileMeta { code: "eap512", name: "EAP 5.1.2", class_version: 50, origin: "jboss-eap-5.1" },
    ProfileMeta { code: "eap600", name: "EAP 6.0.0", class_version: 51, origin: "jboss-eap-6.0" },
    ProfileMeta { code: "eap700", name: "EAP 7.0.0", class_version: 52, origin: "jboss-eap-7.0" },
];

pub fn known_profile(code: &str) -> Option<&'static ProfileMeta> {
    KNOWN_PROFILES.iter().find(|m| m.code.eq_ignore_ascii_case(code))
}

/// A named reference body of classes with known origin, used as a
/// classification target. Built once, read-only afterwards.
#[derive(Debug, Clone)]
pub struct Profile {
    pub code: String,
    pub name: String,
    pub class_version: u32,
    pub origin: String,
    class_locations: HashMap<String, Vec<String>>,
}

impl Profile {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        class_version: u32,
        origin: impl Into<String>,
        class_locations: HashMap<String, Vec<String>>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            class_version,
            origin: origin.into(),
            class_locations,
        }
    }

    pub fn does_provide(&self, class: &str) -> bool {
        self.class_locations.contains_key(class)
    }

    /// Origin locations within the platform that ship this class, if any.
    /// A class can appear in more than one location of the same profile.
    pub fn locations_of(&self, class: &str) -> Option<&[String]> {
        self.class_locations.get(class).map(Vec::as_slice)
    }

    pub fn class_count(&self) -> usize {
        self.class_locations.len()
    }

    /// Parse a class list in the line-oriented location format: a line ending
    /// with `=` names the location the following class lines belong to.
    pub fn parse_class_list(
        code: &str,
        reader: impl BufRead,
    ) -> Result<HashMap<String, Vec<String>>, CatalogError> {
        let mut class_locations: HashMap<String, Vec<String>> = HashMap::new();
        let mut current_location: Option<String> = None;

        for (lineno, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| CatalogError::Io {
                code: code.to_string(),
                source,
            })?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(location) = line.strip_suffix('=') {
                current_location = Some(location.to_string());
            } else {
                let location = current_location.as_ref().ok_or_else(|| {
                    CatalogError::MalformedProfile {
                        code: code.to_string(),
                        reason: format!("class entry before any location header (line {})", lineno + 1),
                    }
                })?;
                class_locations
                    .entry(line.to_string())
                    .or_default()
                    .push(location.clone());
            }
        }

        if class_locations.is_empty() {
            return Err(CatalogError::MalformedProfile {
                code: code.to_string(),
                reason: "no class entries".to_string(),
            });
        }

        Ok(class_locations)
    }

    /// Load a profile's class list from a file, transparently decompressing
    /// `.gz` data.
    pub fn load(
        code: &str,
        name: &str,
        class_version: u32,
        origin: &str,
        path: &Path,
    ) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path).map_err(|source| CatalogError::Io {
            code: code.to_string(),
            source,
        })?;
        let reader: Box<dyn Read> = if path.extension().is_some_and(|ext| ext == "gz") {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };
        let class_locations = Self::parse_class_list(code, BufReader::new(reader))?;
        Ok(Self::new(code, name, class_version, origin, class_locations))
    }
}

/// Registry of loaded profiles, keyed by profile code. One catalog instance
/// is shared across a whole analysis run.
#[derive(Debug, Default)]
pub struct ProfileCatalog {
    profiles: BTreeMap<String, Profile>,
}

impl ProfileCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, profile: Profile) {
        self.profiles.insert(profile.code.clone(), profile);
    }

    pub fn get(&self, code: &str) -> Result<&Profile, CatalogError> {
        self.profiles.get(code).ok_or_else(|| CatalogError::MissingProfile {
            code: code.to_string(),
        })
    }

    /// Resolve a list of codes up front so classification fails fast on a
    /// missing profile instead of partway through.
    pub fn select(&self, codes: &[String]) -> Result<Vec<&Profile>, CatalogError> {
        codes.iter().map(|code| self.get(code)).collect()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
