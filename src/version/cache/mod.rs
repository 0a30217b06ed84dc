//! Resolved-version cache
//!
//! Entries are loaded once from a [`CacheBackend`] when a run starts, shared
//! between tasks through [`VersionCache`], and written back once at the end.
//! [`CachePolicy`] decides whether an entry spares the repositories a visit.

pub mod json;
pub mod sqlite;

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::version::error::CacheError;
use crate::version::types::{Coordinate, display_version};

pub use json::JsonFileCache;
pub use sqlite::SqliteCache;

/// Number of recent versions remembered per entry
pub const RECENT_VERSIONS: usize = 3;

/// Entries keyed by `group:artifact`, in insertion order
pub type CacheMap = IndexMap<String, CacheEntry>;

/// On-disk shape: `[timestamp, version, repository, date, [versions]]`
type CacheRecord = (i64, String, String, Option<String>, Vec<String>);

/// Result of the last successful check of one coordinate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CacheRecord", into = "CacheRecord")]
pub struct CacheEntry {
    /// Seconds since UNIX epoch
    pub timestamp: i64,
    pub version: String,
    /// Key of the repository the version was found in
    pub repository: String,
    /// `Last-Modified` of the version's descriptor as `YYYY-MM-DD`
    pub last_modified: Option<String>,
    pub recent_versions: Vec<String>,
}

impl CacheEntry {
    /// Creates an entry stamped with the current time, keeping at most
    /// [`RECENT_VERSIONS`] of `recent_versions`.
    pub fn new(
        version: &str,
        repository: &str,
        last_modified: Option<String>,
        recent_versions: &[String],
    ) -> Self {
        Self {
            timestamp: current_timestamp(),
            version: version.to_string(),
            repository: repository.to_string(),
            last_modified,
            recent_versions: recent_versions
                .iter()
                .take(RECENT_VERSIONS)
                .cloned()
                .collect(),
        }
    }
}

impl From<CacheRecord> for CacheEntry {
    fn from(
        (timestamp, version, repository, last_modified, recent_versions): CacheRecord,
    ) -> Self {
        Self {
            timestamp,
            version,
            repository,
            last_modified,
            recent_versions,
        }
    }
}

impl From<CacheEntry> for CacheRecord {
    fn from(entry: CacheEntry) -> Self {
        (
            entry.timestamp,
            entry.version,
            entry.repository,
            entry.last_modified,
            entry.recent_versions,
        )
    }
}

/// Get current timestamp in seconds since UNIX epoch
pub fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Persistence for cache entries
#[cfg_attr(test, automock)]
pub trait CacheBackend: Send + Sync {
    /// Loads every stored entry; a store that does not exist yet is empty.
    fn load(&self) -> Result<CacheMap, CacheError>;

    /// Persists `entries`, replacing what was stored for the same keys.
    fn save(&self, entries: &CacheMap) -> Result<(), CacheError>;
}

/// Storage selected by `cache_backend`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheBackendKind {
    #[default]
    Json,
    Sqlite,
}

impl CacheBackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheBackendKind::Json => "json",
            CacheBackendKind::Sqlite => "sqlite",
        }
    }

    fn default_file(&self) -> &'static str {
        match self {
            CacheBackendKind::Json => "maven_check_versions.cache",
            CacheBackendKind::Sqlite => "maven_check_versions.db",
        }
    }

    /// Opens the backend at `path`, or at the backend's default file name.
    pub fn open(&self, path: Option<PathBuf>) -> Result<Box<dyn CacheBackend>, CacheError> {
        let path = path.unwrap_or_else(|| PathBuf::from(self.default_file()));
        Ok(match self {
            CacheBackendKind::Json => Box::new(JsonFileCache::new(path)),
            CacheBackendKind::Sqlite => Box::new(SqliteCache::new(&path)?),
        })
    }
}

impl FromStr for CacheBackendKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(CacheBackendKind::Json),
            "sqlite" => Ok(CacheBackendKind::Sqlite),
            _ => Err(()),
        }
    }
}

/// In-process cache shared by every task of a run.
///
/// Each coordinate is checked at most once per run, so tasks never race on
/// the same key.
#[derive(Debug, Default)]
pub struct VersionCache {
    entries: Mutex<CacheMap>,
}

impl VersionCache {
    pub fn new(entries: CacheMap) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Loads a cache from `backend`.
    pub fn load(backend: &dyn CacheBackend) -> Result<Self, CacheError> {
        Ok(Self::new(backend.load()?))
    }

    fn lock(&self) -> MutexGuard<'_, CacheMap> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, coordinate: &Coordinate) -> Option<CacheEntry> {
        self.lock().get(&coordinate.key()).cloned()
    }

    pub fn insert(&self, coordinate: &Coordinate, entry: CacheEntry) {
        self.lock().insert(coordinate.key(), entry);
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of every entry, for persisting
    pub fn snapshot(&self) -> CacheMap {
        self.lock().clone()
    }

    /// Writes the current entries to `backend`.
    pub fn save(&self, backend: &dyn CacheBackend) -> Result<(), CacheError> {
        backend.save(&self.snapshot())
    }
}

/// Freshness rule applied before any repository is contacted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CachePolicy {
    /// Seconds an entry stays usable; 0 never expires
    pub ttl_secs: i64,
}

impl CachePolicy {
    pub fn new(ttl_secs: i64) -> Self {
        Self { ttl_secs }
    }

    /// Returns true when `entry` settles the check for `coordinate`.
    ///
    /// An entry naming the declared version is accepted whatever its age. A
    /// differing entry still inside the TTL is reported as a cached update.
    pub fn accept(
        &self,
        coordinate: &Coordinate,
        current: Option<&str>,
        entry: &CacheEntry,
        now: i64,
    ) -> bool {
        if current == Some(entry.version.as_str()) {
            return true;
        }

        if self.ttl_secs == 0 || now - entry.timestamp < self.ttl_secs {
            info!("{}", cached_line(coordinate, current, entry));
            return true;
        }

        false
    }
}

/// `*{repo}: {group}:{artifact}, current:{version} versions: {v1, v2} updated: {date}`
pub fn cached_line(coordinate: &Coordinate, current: Option<&str>, entry: &CacheEntry) -> String {
    format!(
        "*{}: {}, current:{} versions: {} updated: {}",
        entry.repository,
        coordinate,
        display_version(current),
        entry.recent_versions.join(", "),
        entry.last_modified.as_deref().unwrap_or_default()
    )
    .trim_end()
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn entry(timestamp: i64, version: &str) -> CacheEntry {
        CacheEntry {
            timestamp,
            version: version.to_string(),
            repository: "central".to_string(),
            last_modified: Some("2025-01-23".to_string()),
            recent_versions: vec!["1.1".to_string(), "1.0".to_string()],
        }
    }

    #[test]
    fn cache_entry_serializes_as_positional_array() {
        let json = serde_json::to_value(entry(1700000000, "1.1")).unwrap();

        assert_eq!(
            json,
            serde_json::json!([1700000000, "1.1", "central", "2025-01-23", ["1.1", "1.0"]])
        );
    }

    #[test]
    fn cache_entry_reads_null_date() {
        let parsed: CacheEntry =
            serde_json::from_str(r#"[1700000000, "1.1", "central", null, ["1.1"]]"#).unwrap();

        assert_eq!(parsed.last_modified, None);
        assert_eq!(parsed.recent_versions, vec!["1.1".to_string()]);
    }

    #[test]
    fn cache_entry_new_keeps_three_recent_versions() {
        let recent: Vec<String> = ["1.4", "1.3", "1.2", "1.1"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let entry = CacheEntry::new("1.4", "central", None, &recent);

        assert_eq!(entry.recent_versions, vec!["1.4", "1.3", "1.2"]);
        assert!(entry.timestamp > 0);
    }

    #[rstest]
    // same version: accepted whatever the age
    #[case(50, 1000, Some("1.1"), true)]
    // never expires
    #[case(0, 1000, Some("1.0"), true)]
    // within ttl
    #[case(200, 100, Some("1.0"), true)]
    // expired
    #[case(50, 100, Some("1.0"), false)]
    #[case(50, 100, None, false)]
    fn policy_accept(
        #[case] ttl: i64,
        #[case] age: i64,
        #[case] current: Option<&str>,
        #[case] expected: bool,
    ) {
        let now = 1_700_000_000;
        let policy = CachePolicy::new(ttl);
        let coordinate = Coordinate::new("group", "artifact");

        assert_eq!(
            policy.accept(&coordinate, current, &entry(now - age, "1.1"), now),
            expected
        );
    }

    #[test]
    fn cached_line_matches_log_format() {
        let coordinate = Coordinate::new("group", "artifact");

        assert_eq!(
            cached_line(&coordinate, Some("1.0"), &entry(0, "1.1")),
            "*central: group:artifact, current:1.0 versions: 1.1, 1.0 updated: 2025-01-23"
        );

        let mut undated = entry(0, "1.1");
        undated.last_modified = None;
        assert_eq!(
            cached_line(&coordinate, Some("1.0"), &undated),
            "*central: group:artifact, current:1.0 versions: 1.1, 1.0 updated:"
        );
    }

    #[test]
    fn version_cache_get_insert_and_snapshot() {
        let cache = VersionCache::default();
        let coordinate = Coordinate::new("group", "artifact");

        assert!(cache.get(&coordinate).is_none());
        cache.insert(&coordinate, entry(1, "1.1"));

        assert_eq!(cache.get(&coordinate), Some(entry(1, "1.1")));
        assert_eq!(cache.snapshot().len(), 1);
        assert_eq!(
            cache.snapshot().get("group:artifact"),
            Some(&entry(1, "1.1"))
        );
    }

    #[test]
    fn version_cache_round_trips_through_backend() {
        let mut stored = CacheMap::new();
        stored.insert("group:artifact".to_string(), entry(1, "1.1"));
        let expected = stored.clone();

        let mut backend = MockCacheBackend::new();
        backend.expect_load().times(1).return_once(move || Ok(stored));
        backend
            .expect_save()
            .withf(move |entries| *entries == expected)
            .times(1)
            .returning(|_| Ok(()));

        let cache = VersionCache::load(&backend).unwrap();
        cache.save(&backend).unwrap();
    }

    #[rstest]
    #[case("json", Ok(CacheBackendKind::Json))]
    #[case("SQLite", Ok(CacheBackendKind::Sqlite))]
    #[case("redis", Err(()))]
    fn backend_kind_from_str(#[case] input: &str, #[case] expected: Result<CacheBackendKind, ()>) {
        assert_eq!(input.parse::<CacheBackendKind>(), expected);
    }
}
