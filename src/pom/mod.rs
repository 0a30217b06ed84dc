//! POM descriptor model
//!
//! Only what the walker needs is kept: project identity, `<properties>`,
//! declared dependencies and plugins, and `<modules>`. Elements are matched by
//! local name, so POMs with or without the Maven namespace parse alike.

pub mod loader;
pub mod version;

use indexmap::IndexMap;
use roxmltree::Node;
use thiserror::Error;

pub use loader::{is_remote, load_pom, module_paths};
pub use version::{ResolvedVersion, is_placeholder, resolve_version};

#[derive(Debug, Error)]
pub enum PomError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid POM {path}: {source}")]
    Xml {
        path: String,
        #[source]
        source: roxmltree::Error,
    },

    #[error("Failed to read POM {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fetch POM: {0}")]
    Network(#[from] reqwest::Error),
}

/// A `<dependency>` or `<plugin>` entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependency {
    pub group: Option<String>,
    pub artifact: Option<String>,
    /// Raw `<version>` text; `None` when the element is absent
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pom {
    pub group: Option<String>,
    pub artifact: Option<String>,
    pub version: Option<String>,
    pub properties: IndexMap<String, String>,
    /// Every `<dependency>` in the document, in document order
    pub dependencies: Vec<Dependency>,
    /// Every `<plugin>` directly under a `<plugins>` element
    pub plugins: Vec<Dependency>,
    /// `<module>` names under `<modules>`
    pub modules: Vec<String>,
}

impl Pom {
    /// Parses POM text; `path` only labels errors.
    pub fn parse(text: &str, path: &str) -> Result<Self, PomError> {
        let document = roxmltree::Document::parse(text).map_err(|source| PomError::Xml {
            path: path.to_string(),
            source,
        })?;
        let root = document.root_element();

        let properties = child(root, "properties")
            .map(|properties| {
                properties
                    .children()
                    .filter(Node::is_element)
                    .map(|node| (node.tag_name().name().to_string(), text_of(node)))
                    .collect()
            })
            .unwrap_or_default();

        let dependencies = root
            .descendants()
            .filter(|node| node.is_element() && node.tag_name().name() == "dependency")
            .map(dependency_of)
            .collect();

        let plugins = root
            .descendants()
            .filter(|node| node.is_element() && node.tag_name().name() == "plugin")
            .filter(|node| has_parent_named(*node, "plugins"))
            .map(dependency_of)
            .collect();

        let modules = root
            .descendants()
            .filter(|node| node.is_element() && node.tag_name().name() == "module")
            .filter(|node| has_parent_named(*node, "modules"))
            .map(text_of)
            .filter(|name| !name.is_empty())
            .collect();

        Ok(Self {
            group: child_text(root, "groupId"),
            artifact: child_text(root, "artifactId"),
            version: child_text(root, "version"),
            properties,
            dependencies,
            plugins,
            modules,
        })
    }

    /// `group:artifact`, or just the artifact when the POM declares no group
    pub fn display_name(&self) -> String {
        let artifact = self.artifact.as_deref().unwrap_or_default();
        match &self.group {
            Some(group) => format!("{}:{}", group, artifact),
            None => artifact.to_string(),
        }
    }

    /// Dependencies followed by plugins when `with_plugins` is set
    pub fn entries(&self, with_plugins: bool) -> Vec<Dependency> {
        let mut entries = self.dependencies.clone();
        if with_plugins {
            entries.extend(self.plugins.iter().cloned());
        }
        entries
    }
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == name)
}

fn child_text(node: Node, name: &str) -> Option<String> {
    child(node, name).map(text_of)
}

fn text_of(node: Node) -> String {
    node.text().unwrap_or_default().trim().to_string()
}

fn has_parent_named(node: Node, name: &str) -> bool {
    node.parent_element()
        .is_some_and(|parent| parent.tag_name().name() == name)
}

fn dependency_of(node: Node) -> Dependency {
    Dependency {
        group: child_text(node, "groupId").filter(|s| !s.is_empty()),
        artifact: child_text(node, "artifactId").filter(|s| !s.is_empty()),
        version: child_text(node, "version"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
    <groupId>org.example</groupId>
    <artifactId>app</artifactId>
    <version>2.1</version>
    <properties>
        <lib.version>1.0</lib.version>
    </properties>
    <modules>
        <module>core</module>
        <module>web</module>
    </modules>
    <dependencyManagement>
        <dependencies>
            <dependency>
                <groupId>org.example</groupId>
                <artifactId>managed</artifactId>
                <version>${lib.version}</version>
            </dependency>
        </dependencies>
    </dependencyManagement>
    <dependencies>
        <dependency>
            <groupId>org.example</groupId>
            <artifactId>lib</artifactId>
        </dependency>
    </dependencies>
    <build>
        <plugins>
            <plugin>
                <groupId>org.apache.maven.plugins</groupId>
                <artifactId>maven-compiler-plugin</artifactId>
                <version>3.11.0</version>
            </plugin>
        </plugins>
    </build>
</project>"#;

    #[test]
    fn parse_reads_identity_properties_and_modules() {
        let pom = Pom::parse(POM, "pom.xml").unwrap();

        assert_eq!(pom.display_name(), "org.example:app");
        assert_eq!(pom.version.as_deref(), Some("2.1"));
        assert_eq!(pom.properties.get("lib.version").map(String::as_str), Some("1.0"));
        assert_eq!(pom.modules, vec!["core", "web"]);
    }

    #[test]
    fn parse_collects_dependencies_anywhere_in_document_order() {
        let pom = Pom::parse(POM, "pom.xml").unwrap();

        assert_eq!(
            pom.dependencies,
            vec![
                Dependency {
                    group: Some("org.example".to_string()),
                    artifact: Some("managed".to_string()),
                    version: Some("${lib.version}".to_string()),
                },
                Dependency {
                    group: Some("org.example".to_string()),
                    artifact: Some("lib".to_string()),
                    version: None,
                },
            ]
        );
    }

    #[test]
    fn entries_append_plugins_on_request() {
        let pom = Pom::parse(POM, "pom.xml").unwrap();

        assert_eq!(pom.entries(false).len(), 2);

        let entries = pom.entries(true);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].artifact.as_deref(), Some("maven-compiler-plugin"));
    }

    #[test]
    fn parse_accepts_pom_without_namespace_or_group() {
        let pom = Pom::parse(
            "<project><artifactId>bare</artifactId><dependencies><dependency>\
             <artifactId>orphan</artifactId></dependency></dependencies></project>",
            "pom.xml",
        )
        .unwrap();

        assert_eq!(pom.display_name(), "bare");
        assert_eq!(pom.dependencies[0].group, None);
    }

    #[test]
    fn parse_rejects_malformed_xml() {
        let result = Pom::parse("<project>", "broken.xml");

        assert!(matches!(result, Err(PomError::Xml { ref path, .. }) if path == "broken.xml"));
    }
}
