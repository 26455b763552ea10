use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid key-value filter token '{token}': missing '='")]
    InvalidPattern { token: String },
}

/// Map an archive or class identifier to the normalized `/`-delimited path
/// form both filters match against. A trailing `.*` marks a
/// prefix-and-everything-under-it pattern and produces a trailing slash.
fn normalize(value: &str) -> String {
    let mut value = value.trim();
    let mut include_all = false;

    if let Some(stripped) = value.strip_suffix(".class") {
        value = stripped;
    }
    if let Some(stripped) = value.strip_suffix(".jar") {
        value = stripped;
    }
    if let Some(stripped) = value.strip_suffix(".*") {
        value = stripped;
        include_all = true;
    }

    let mut path = value.replace('.', "/");
    if include_all {
        path.push('/');
    }
    path
}

/// Sort prefixes most-specific first so the longest suppression wins when
/// prefixes overlap.
fn sort_by_specificity(prefixes: &mut [String]) {
    prefixes.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
}

/// Suppression by archive/class name prefix. Patterns are comma separated.
#[derive(Debug, Clone, Default)]
pub struct KeyFilter {
    prefixes: Vec<String>,
}

impl KeyFilter {
    pub fn parse(spec: &str) -> Self {
        let mut prefixes: Vec<String> = spec
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| normalize(token))
            .collect();
        sort_by_specificity(&mut prefixes);
        Self { prefixes }
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub fn is_filtered(&self, name: &str) -> bool {
        let query = normalize(name);
        self.prefixes.iter().any(|prefix| query.starts_with(prefix))
    }
}

/// Suppression scoped to one key: each key (an archive) carries its own list
/// of value prefixes (the classes or archives to suppress in that context
/// only). Entries are semicolon separated, `key=v1,v2` each.
#[derive(Debug, Clone, Default)]
pub struct KeyValueFilter {
    entries: HashMap<String, Vec<String>>,
}

impl KeyValueFilter {
    pub fn parse(spec: &str) -> Result<Self, FilterError> {
        let mut entries: HashMap<String, Vec<String>> = HashMap::new();
        for token in spec.split(';').map(str::trim).filter(|t| !t.is_empty()) {
            let (key, values) = token.split_once('=').ok_or_else(|| FilterError::InvalidPattern {
                token: token.to_string(),
            })?;
            let mut prefixes: Vec<String> = values
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| normalize(v))
                .collect();
            sort_by_specificity(&mut prefixes);
            entries.insert(key.trim().to_string(), prefixes);
        }
        Ok(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_filtered(&self, key: &str, query: &str) -> bool {
        let Some(prefixes) = self.entries.get(key) else {
            return false;
        };
        let query = normalize(query);
        prefixes.iter().any(|prefix| query.starts_with(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_filter_prefix_and_descendants() {
        let filter = KeyFilter::parse("com.foo.*");
        assert!(filter.is_filtered("com.foo.Bar"));
        assert!(filter.is_filtered("com.foo.bar.Baz"));
        assert!(!filter.is_filtered("com.foobar.Baz"));
    }

    #[test]
    fn test_key_filter_plain_prefix() {
        let filter = KeyFilter::parse("com.foo");
        // without `.*` the match is a plain prefix test on the path form
        assert!(filter.is_filtered("com.foo"));
        assert!(filter.is_filtered("com.foo.Bar"));
        assert!(filter.is_filtered("com.foobar.Baz"));
        assert!(!filter.is_filtered("org.foo"));
    }

    #[test]
    fn test_key_filter_strips_archive_suffixes() {
        let filter = KeyFilter::parse("utility.jar, legacy.Main.class");
        assert!(filter.is_filtered("utility.jar"));
        assert!(filter.is_filtered("legacy.Main"));
        assert!(!filter.is_filtered("app.jar"));
    }

    #[test]
    fn test_key_filter_most_specific_first() {
        let filter = KeyFilter::parse("com,com.foo.bar.*");
        assert_eq!(filter.prefixes[0], "com/foo/bar/");
        assert!(filter.is_filtered("com.anything"));
    }

    #[test]
    fn test_key_filter_blank_tokens_ignored() {
        let filter = KeyFilter::parse(" , ,");
        assert!(filter.is_empty());
        assert!(!filter.is_filtered("com.foo.Bar"));
    }

    #[test]
    fn test_key_value_filter_scoped_to_key() {
        let filter = KeyValueFilter::parse("app.jar=org.slf4j.*;web.war=com.legacy.*").unwrap();
        assert!(filter.is_filtered("app.jar", "org.slf4j.Logger"));
        assert!(!filter.is_filtered("other.jar", "org.slf4j.Logger"));
        assert!(filter.is_filtered("web.war", "com.legacy.Servlet"));
        assert!(!filter.is_filtered("app.jar", "com.legacy.Servlet"));
    }

    #[test]
    fn test_key_value_filter_rejects_missing_equals() {
        let err = KeyValueFilter::parse("app.jar").unwrap_err();
        assert!(matches!(err, FilterError::InvalidPattern { token } if token == "app.jar"));
    }

    #[test]
    fn test_key_value_filter_multiple_values() {
        let filter = KeyValueFilter::parse("app.jar=org.slf4j.*,ch.qos.logback.*").unwrap();
        assert!(filter.is_filtered("app.jar", "ch.qos.logback.classic.Logger"));
        assert!(filter.is_filtered("app.jar", "org.slf4j.Logger"));
        assert!(!filter.is_filtered("app.jar", "org.apache.log4j.Logger"));
    }

    #[test]
    fn test_filters_never_mutate_inputs() {
        let filter = KeyFilter::parse("com.foo.*");
        let name = "com.foo.Bar";
        let _ = filter.is_filtered(name);
        assert_eq!(name, "com.foo.Bar");
    }
}
