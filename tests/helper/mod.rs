//! Shared fixtures for end-to-end runs against mock repositories

#![allow(dead_code)]

pub mod repository;

use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::TempDir;

use maven_check_versions::config::{ArgumentSource, Config, FileSource};

pub use repository::TestRepository;

/// Scratch directory holding POMs and the cache file of one test
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `content` to `relative` and returns the absolute path as a string.
    pub fn write_pom(&self, relative: &str, content: &str) -> String {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path.to_str().unwrap().to_string()
    }

    pub fn cache_path(&self) -> PathBuf {
        self.dir.path().join("maven_check_versions.cache")
    }

    pub fn cache_json(&self) -> Value {
        let text = std::fs::read_to_string(self.cache_path()).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    /// Config with a single `central` repository at `repository_url` plus the
    /// given extra `base` lines (two-space indented YAML).
    pub fn config(&self, repository_url: &str, base: &str) -> Config {
        self.config_yaml(&format!(
            "base:\n  cache_file: {}\n{}\nrepositories:\n  central: central\ncentral:\n  base: {}\n  path: maven2\n",
            self.cache_path().display(),
            base,
            repository_url
        ))
    }

    pub fn config_yaml(&self, yaml: &str) -> Config {
        Config::new(vec![
            Box::new(ArgumentSource::default()),
            Box::new(FileSource::parse(yaml, Path::new("test.yml")).unwrap()),
        ])
    }
}

/// POM declaring `dependencies` as `(group, artifact, version)`
pub fn pom(dependencies: &[(&str, &str, Option<&str>)]) -> String {
    let entries: String = dependencies
        .iter()
        .map(|(group, artifact, version)| {
            let version = version
                .map(|v| format!("<version>{}</version>", v))
                .unwrap_or_default();
            format!(
                "<dependency><groupId>{}</groupId><artifactId>{}</artifactId>{}</dependency>",
                group, artifact, version
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
    <groupId>org.example</groupId>
    <artifactId>app</artifactId>
    <version>1.0.0</version>
    <dependencies>{}</dependencies>
</project>"#,
        entries
    )
}
