use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::archive::Archive;

/// Used/unused split of the flattened archive set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Liveness {
    pub used: BTreeSet<String>,
    pub unused: BTreeSet<String>,
}

/// An archive is used when any other archive in the flattened set directly
/// requires at least one class it provides. No transitivity: a jar only
/// reached through an unused jar is itself reported unused.
pub fn partition(units: &[&Archive]) -> Liveness {
    let mut liveness = Liveness::default();
    for archive in units {
        let used = units.iter().any(|other| {
            other.name != archive.name
                && other.requires.iter().any(|class| archive.does_provide(class))
        });
        if used {
            liveness.used.insert(archive.name.clone());
        } else {
            liveness.unused.insert(archive.name.clone());
        }
    }
    liveness
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveKind;
    use std::collections::BTreeSet;

    fn jar(name: &str, provides: &[&str], requires: &[&str]) -> Archive {
        Archive {
            name: name.to_string(),
            kind: ArchiveKind::Jar,
            provides: provides.iter().map(|c| (c.to_string(), None)).collect(),
            requires: requires.iter().map(|c| c.to_string()).collect(),
            locations: BTreeSet::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    #[test]
    fn test_provider_used_consumer_unused() {
        let x = jar("x.jar", &["a.A"], &[]);
        let y = jar("y.jar", &["b.B"], &["a.A"]);
        let units = vec![&x, &y];

        let liveness = partition(&units);
        assert!(liveness.used.contains("x.jar"));
        assert!(liveness.unused.contains("y.jar"));
    }

    #[test]
    fn test_self_requirement_does_not_count_as_used() {
        let a = jar("a.jar", &["a.A"], &["a.A"]);
        let units = vec![&a];
        let liveness = partition(&units);
        assert!(liveness.unused.contains("a.jar"));
    }

    #[test]
    fn test_class_archives_can_keep_a_jar_alive() {
        let lib = jar("lib.jar", &["lib.Util"], &[]);
        let mut loose = jar("Main.class", &["app.Main"], &["lib.Util"]);
        loose.kind = ArchiveKind::Class;
        let units = vec![&lib, &loose];

        let liveness = partition(&units);
        assert!(liveness.used.contains("lib.jar"));
        assert!(liveness.unused.contains("Main.class"));
    }

    #[test]
    fn test_liveness_is_not_transitive() {
        // c <- b <- a, nothing requires a: only what is directly required is used
        let a = jar("a.jar", &["a.A"], &["b.B"]);
        let b = jar("b.jar", &["b.B"], &["c.C"]);
        let c = jar("c.jar", &["c.C"], &[]);
        let units = vec![&a, &b, &c];

        let liveness = partition(&units);
        assert!(liveness.used.contains("b.jar"));
        assert!(liveness.used.contains("c.jar"));
        assert!(liveness.unused.contains("a.jar"));
    }
}
