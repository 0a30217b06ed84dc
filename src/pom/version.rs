//! Version expression resolution against a POM's properties

use std::sync::LazyLock;

use regex::Regex;

use crate::pom::Pom;

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$\{([^}]+)\}$").expect("valid placeholder pattern"));

const PROJECT_VERSION: &str = "${project.version}";

/// Version to check, and whether the dependency is skipped instead
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    pub version: Option<String>,
    pub skip: bool,
}

/// True for a whole-string `${name}` expression
pub fn is_placeholder(version: &str) -> bool {
    PLACEHOLDER_RE.is_match(version)
}

/// Substitutes one `${name}` through `<properties>`; unknown names stay as is.
fn substitute(version: &str, pom: &Pom) -> String {
    PLACEHOLDER_RE
        .captures(version)
        .and_then(|captures| pom.properties.get(&captures[1]))
        .cloned()
        .unwrap_or_else(|| version.to_string())
}

/// Resolves a dependency's raw `<version>` text in a single pass.
///
/// A missing version or one still shaped like a placeholder after
/// substitution is skipped unless `empty_version` lets it through.
pub fn resolve_version(raw: Option<&str>, pom: &Pom, empty_version: bool) -> ResolvedVersion {
    let Some(raw) = raw else {
        return ResolvedVersion {
            version: None,
            skip: !empty_version,
        };
    };

    let mut version = substitute(raw, pom);

    if version == PROJECT_VERSION
        && let Some(project_version) = &pom.version
    {
        version = substitute(project_version, pom);
    }

    let skip = is_placeholder(&version) && !empty_version;

    ResolvedVersion {
        version: Some(version),
        skip,
    }
}
