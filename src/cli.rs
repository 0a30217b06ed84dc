use std::path::PathBuf;

use clap::Parser;
use indexmap::IndexMap;

use crate::config::ArgumentSource;

#[derive(Debug, Default, Parser)]
#[command(name = "maven-check-versions")]
#[command(version, about = "Checks Maven POM dependencies against their latest repository versions")]
pub struct Cli {
    /// Do not wait for Enter before exiting
    #[arg(long, alias = "ci_mode")]
    pub ci_mode: bool,

    /// POM file or URL to process
    #[arg(long, alias = "pom_file")]
    pub pom_file: Option<String>,

    /// Look up one artifact, as groupId:artifactId:version
    #[arg(long, alias = "find_artifact", value_name = "G:A:V")]
    pub find_artifact: Option<String>,

    /// Do not read or write the cache
    #[arg(long, alias = "cache_off")]
    pub cache_off: bool,

    #[arg(long, alias = "cache_file")]
    pub cache_file: Option<PathBuf>,

    /// Log to stdout only
    #[arg(long, alias = "logfile_off")]
    pub logfile_off: bool,

    #[arg(long, alias = "log_file")]
    pub log_file: Option<PathBuf>,

    #[arg(long, alias = "config_file")]
    pub config_file: Option<PathBuf>,

    /// Fail when a newer version drifts beyond the major/minor deltas
    #[arg(long, alias = "fail_mode")]
    pub fail_mode: bool,

    #[arg(long, alias = "fail_major", value_name = "DELTA")]
    pub fail_major: Option<i64>,

    #[arg(long, alias = "fail_minor", value_name = "DELTA")]
    pub fail_minor: Option<i64>,

    /// Check build plugins as well
    #[arg(long, alias = "search_plugins")]
    pub search_plugins: bool,

    /// Recurse into <modules>
    #[arg(long, alias = "process_modules")]
    pub process_modules: bool,

    #[arg(long, alias = "show_skip")]
    pub show_skip: bool,

    #[arg(long, alias = "show_search")]
    pub show_search: bool,

    /// Check dependencies without a resolvable version
    #[arg(long, alias = "empty_version")]
    pub empty_version: bool,

    #[arg(long, alias = "show_invalid")]
    pub show_invalid: bool,

    /// Basic auth user
    #[arg(long)]
    pub user: Option<String>,

    /// Basic auth password
    #[arg(long)]
    pub password: Option<String>,

    /// Check dependencies and modules concurrently
    #[arg(long)]
    pub threading: bool,

    #[arg(long, alias = "max_threads", value_name = "N")]
    pub max_threads: Option<usize>,
}

impl Cli {
    /// `base` overrides for every flag that was given
    pub fn overrides(&self) -> ArgumentSource {
        let mut values = IndexMap::new();

        let switches = [
            ("cache_off", self.cache_off),
            ("fail_mode", self.fail_mode),
            ("search_plugins", self.search_plugins),
            ("process_modules", self.process_modules),
            ("show_skip", self.show_skip),
            ("show_search", self.show_search),
            ("empty_version", self.empty_version),
            ("show_invalid", self.show_invalid),
            ("threading", self.threading),
        ];
        for (key, enabled) in switches {
            if enabled {
                values.insert(key.to_string(), "true".to_string());
            }
        }

        let options = [
            ("cache_file", self.cache_file.as_ref().map(|p| p.display().to_string())),
            ("fail_major", self.fail_major.map(|n| n.to_string())),
            ("fail_minor", self.fail_minor.map(|n| n.to_string())),
            ("user", self.user.clone()),
            ("password", self.password.clone()),
            ("max_threads", self.max_threads.map(|n| n.to_string())),
        ];
        for (key, value) in options {
            if let Some(value) = value {
                values.insert(key.to_string(), value);
            }
        }

        ArgumentSource::new(values)
    }
}
