//! Version-check engine for Maven coordinates
//!
//! For one coordinate, each configured repository is probed in declaration
//! order until one of them yields a validated candidate.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Prober    │────▶│   Checker   │────▶│    Cache    │
//! │ (3 tiers)   │     │ (validate)  │     │  (storage)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                   │
//!        ▼                   ▼
//! ┌─────────────┐     ┌─────────────┐
//! │  Listings   │     │  Threshold  │
//! │(xml, html)  │     │ (fail-mode) │
//! └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`cache`]: Cache entries, freshness policy and the JSON/SQLite stores
//! - [`checker`]: Candidate ordering, descriptor probes and match reporting
//! - [`listing`]: Trait for one version-discovery strategy
//! - [`listings`]: Metadata XML, REST browse XML and REST browse HTML strategies
//! - [`prober`]: Runs the strategies of one repository in order
//! - [`threshold`]: Fail-mode drift bounds
//! - [`error`]: Error types for the engine
//! - [`semver`]: Candidate filtering and version parsing
//! - [`types`]: Coordinates, repository sections and listings

pub mod cache;
pub mod checker;
pub mod error;
pub mod listing;
pub mod listings;
pub mod prober;
pub mod semver;
pub mod threshold;
pub mod types;
