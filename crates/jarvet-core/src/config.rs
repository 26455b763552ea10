use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration from `.jarvet.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub profiles: Vec<ProfileSource>,
    #[serde(default)]
    pub filters: FiltersConfig,
    #[serde(default)]
    pub classifiers: ClassifiersConfig,
}

/// A profile class-list data source. Metadata for well-known codes is built
/// in; unknown codes must spell out name, class_version, and origin here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSource {
    pub code: String,
    pub path: PathBuf,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub class_version: Option<u32>,
    #[serde(default)]
    pub origin: Option<String>,
}

/// Suppression patterns per finding category. Key filters are comma-separated
/// prefix patterns; the unresolved filter is keyed per archive
/// (`archive=prefix,prefix;archive2=...`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FiltersConfig {
    #[serde(default)]
    pub circular: String,
    #[serde(default)]
    pub unused: String,
    #[serde(default)]
    pub duplicate_packages: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub jdk_ee: String,
    #[serde(default)]
    pub unresolved: String,
}

/// One classifier instance: which profiles to match against and how many
/// problematic archives escalate the category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub profiles: Vec<String>,
    pub red: usize,
    pub yellow: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiersConfig {
    #[serde(default = "default_platform_classifier")]
    pub platform: ClassifierConfig,
    #[serde(default = "default_jdk_ee_classifier")]
    pub jdk_ee: ClassifierConfig,
}

fn default_platform_classifier() -> ClassifierConfig {
    ClassifierConfig {
        profiles: Vec::new(),
        red: 10,
        yellow: 5,
    }
}

fn default_jdk_ee_classifier() -> ClassifierConfig {
    ClassifierConfig {
        profiles: Vec::new(),
        red: 6,
        yellow: 2,
    }
}

impl Default for ClassifiersConfig {
    fn default() -> Self {
        Self {
            platform: default_platform_classifier(),
            jdk_ee: default_jdk_ee_classifier(),
        }
    }
}

impl Config {
    /// Load configuration from a `.jarvet.toml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let config: Config = toml::from_str(&content).with_context(|| {
            format!(
                "failed to parse '{}'. Run `jarvet init` to create a valid config file",
                path.display()
            )
        })?;
        Ok(config)
    }

    /// Load from `.jarvet.toml` in the given directory or any ancestor, or
    /// return defaults.
    pub fn load_or_default(dir: &Path) -> Self {
        let start = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        let mut current = start.as_path();
        loop {
            let config_path = current.join(".jarvet.toml");
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => config,
                    Err(e) => {
                        eprintln!(
                            "Warning: failed to load config from '{}': {e:#}. Using defaults.",
                            config_path.display()
                        );
                        Self::default()
                    }
                };
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }
        Self::default()
    }

    /// Generate default TOML content for `jarvet init`.
    pub fn default_toml() -> String {
        r#"# jarvet - Archive Classloading Analysis Configuration

# Platform profile data sources. Well-known codes (java7, java8, javaee5-7,
# eap429/4310/512/600/700, sunjava5/6) carry built-in metadata; only the
# class-list path is needed. Plain or gzip-compressed files are accepted.
# [[profiles]]
# code = "eap512"
# path = "profiles/eap512.clz.gz"
#
# [[profiles]]
# code = "javaee7"
# path = "profiles/javaee7.clz.gz"

[filters]
# Comma-separated prefix patterns per finding category. A trailing `.*`
# suppresses the prefix and everything under it.
circular = ""
unused = ""
duplicate_packages = ""
platform = ""
jdk_ee = ""
# Per-archive suppression of unresolved external references:
# unresolved = "app.jar=com.legacy.*;web.war=org.old.*"
unresolved = ""

# How many problematic archives escalate each classifier category.
[classifiers.platform]
# profiles = ["eap512"]
red = 10
yellow = 5

[classifiers.jdk_ee]
# profiles = ["java8", "javaee7"]
red = 6
yellow = 2
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.profiles.is_empty());
        assert_eq!(config.classifiers.platform.red, 10);
        assert_eq!(config.classifiers.platform.yellow, 5);
        assert_eq!(config.classifiers.jdk_ee.red, 6);
        assert_eq!(config.classifiers.jdk_ee.yellow, 2);
    }

    #[test]
    fn test_deserialize_config() {
        let toml_str = r#"
[[profiles]]
code = "eap512"
path = "profiles/eap512.clz.gz"

[filters]
circular = "com.vendor.*"
unused = "utility.jar"

[classifiers.platform]
profiles = ["eap512"]
red = 3
yellow = 1

[classifiers.jdk_ee]
profiles = ["java8"]
red = 6
yellow = 2
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.profiles.len(), 1);
        assert_eq!(config.profiles[0].code, "eap512");
        assert_eq!(config.filters.circular, "com.vendor.*");
        assert_eq!(config.classifiers.platform.red, 3);
        assert_eq!(config.classifiers.jdk_ee.profiles, vec!["java8"]);
    }

    #[test]
    fn test_default_toml_is_valid() {
        let toml_str = Config::default_toml();
        let config: Config = toml::from_str(&toml_str).unwrap();
        assert!(config.profiles.is_empty());
        assert_eq!(config.classifiers.jdk_ee.yellow, 2);
    }

    #[test]
    fn test_missing_sections_backward_compatible() {
        let toml_str = r#"
[filters]
circular = "com.vendor.*"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.classifiers.platform.red, 10);
        assert!(config.filters.unused.is_empty());
    }

    #[test]
    fn test_profile_source_metadata_overrides() {
        let toml_str = r#"
[[profiles]]
code = "custom-runtime"
path = "data/custom.clz"
name = "Custom Runtime 1.0"
class_version = 52
origin = "custom-runtime.jar"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        let source = &config.profiles[0];
        assert_eq!(source.name.as_deref(), Some("Custom Runtime 1.0"));
        assert_eq!(source.class_version, Some(52));
        assert_eq!(source.origin.as_deref(), Some("custom-runtime.jar"));
    }

    #[test]
    fn test_load_or_default_walks_ancestors() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            tmp.path().join(".jarvet.toml"),
            "[filters]\ncircular = \"com.x.*\"\n",
        )
        .unwrap();

        let config = Config::load_or_default(&nested);
        assert_eq!(config.filters.circular, "com.x.*");
    }
}
