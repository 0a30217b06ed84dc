use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use semver::Version;

static MAJOR_MINOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.(\d+)").expect("valid major.minor pattern"));

/// Leading `major.minor` pair of a version string.
///
/// Only these two numbers take part in threshold comparisons; anything after
/// them is ignored. Strings without the pattern parse as `(0, 0)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MajorMinor {
    pub major: i64,
    pub minor: i64,
}

impl MajorMinor {
    pub fn parse(version: Option<&str>) -> Self {
        version
            .and_then(|v| MAJOR_MINOR_RE.captures(v))
            .and_then(|caps| {
                Some(Self {
                    major: caps[1].parse().ok()?,
                    minor: caps[2].parse().ok()?,
                })
            })
            .unwrap_or_default()
    }
}

/// A listing entry is a candidate when it starts with a digit.
pub fn is_candidate(version: &str) -> bool {
    version.starts_with(|c: char| c.is_ascii_digit())
}

/// Parse a version string into a semver::Version, normalizing partial versions.
///
/// A Maven qualifier after the first `-` becomes the pre-release part.
///
/// Examples:
/// - "1" -> Version(1, 0, 0)
/// - "1.2" -> Version(1, 2, 0)
/// - "1.2-beta" -> Version(1, 2, 0-beta)
pub fn parse_version(version: &str) -> Option<Version> {
    let (numbers, qualifier) = match version.split_once('-') {
        Some((numbers, qualifier)) => (numbers, Some(qualifier)),
        None => (version, None),
    };
    let parts: Vec<&str> = numbers.split('.').collect();
    let mut normalized = match parts.len() {
        1 => format!("{}.0.0", parts[0]),
        2 => format!("{}.{}.0", parts[0], parts[1]),
        _ => numbers.to_string(),
    };
    if let Some(qualifier) = qualifier {
        normalized.push('-');
        normalized.push_str(qualifier);
    }
    Version::parse(&normalized).ok()
}

/// Filter a raw listing down to candidates, newest first.
///
/// By default the document order is reversed, trusting the repository to list
/// oldest first. With `semantic` the candidates are sorted by version instead;
/// entries that do not parse keep their relative order after the parsed ones.
pub fn order_candidates(versions: &[String], semantic: bool) -> Vec<String> {
    let mut candidates: Vec<String> = versions
        .iter()
        .filter(|v| is_candidate(v))
        .cloned()
        .collect();
    candidates.reverse();

    if semantic {
        candidates.sort_by(|a, b| match (parse_version(a), parse_version(b)) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    }

    candidates
}

/// Returns true when the entry the repository lists last is not the
/// semantically highest candidate.
pub fn last_entry_is_not_newest(versions: &[String]) -> bool {
    let Some(last) = versions.iter().rev().find(|v| is_candidate(v)) else {
        return false;
    };
    let Some(last_parsed) = parse_version(last) else {
        return false;
    };

    versions
        .iter()
        .filter(|v| is_candidate(v))
        .filter_map(|v| parse_version(v))
        .any(|v| v > last_parsed)
}
