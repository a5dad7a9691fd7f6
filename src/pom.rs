//! # POM access
//!
//! Reading goes through `xot` so namespaces, entities and comments are
//! handled by a real XML parser. Writing is a text substitution inside the
//! located element: only the element's content changes and every other byte
//! of the document (indentation, comments, attribute order) is preserved.

use crate::error::{Error, Result};
use crate::project::{ProjectTree, ROOT_POM};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use xot::{Node, Xot};

/// Matches markup that can hide element tags, then element tags themselves.
static MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--[\s\S]*?-->|<!\[CDATA\[[\s\S]*?\]\]>|<[?!][^>]*>|<(/?)([A-Za-z_][\w.:-]*)[^>]*?(/?)>")
        .expect("valid regex")
});

/// The parts of a POM the release engine reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pom {
    pub version: Option<String>,
    pub parent_version: Option<String>,
    pub properties: BTreeMap<String, String>,
}

impl Pom {
    /// Parses a POM document; `path` is only used in error messages.
    pub fn parse(content: &str, path: &str) -> Result<Pom> {
        let pom_error = |message: String| Error::Pom {
            path: path.to_string(),
            message,
        };

        let mut xot = Xot::new();
        let root = xot.parse(content).map_err(|e| pom_error(e.to_string()))?;
        let project = xot
            .document_element(root)
            .map_err(|e| pom_error(e.to_string()))?;
        if local_name(&xot, project) != Some("project") {
            return Err(pom_error("root element is not <project>".to_string()));
        }

        let version = child_element(&xot, project, "version").and_then(|n| text(&xot, n));
        let parent_version = child_element(&xot, project, "parent")
            .and_then(|parent| child_element(&xot, parent, "version"))
            .and_then(|n| text(&xot, n));

        let mut properties = BTreeMap::new();
        if let Some(node) = child_element(&xot, project, "properties") {
            for property in xot.children(node) {
                if let Some(name) = local_name(&xot, property) {
                    properties.insert(name.to_string(), text(&xot, property).unwrap_or_default());
                }
            }
        }

        Ok(Pom {
            version,
            parent_version,
            properties,
        })
    }
}

fn local_name(xot: &Xot, node: Node) -> Option<&str> {
    xot.element(node).map(|element| xot.local_name_str(element.name()))
}

fn child_element(xot: &Xot, parent: Node, name: &str) -> Option<Node> {
    xot.children(parent)
        .find(|&child| local_name(xot, child) == Some(name))
}

fn text(xot: &Xot, node: Node) -> Option<String> {
    xot.text_content_str(node).map(|s| s.trim().to_string())
}

/// Replaces the text of every element at `path` (local names from the root).
///
/// Returns the new document and the number of elements replaced. Self-closing
/// elements are left alone.
pub fn set_element_text(xml: &str, path: &[&str], value: &str) -> (String, usize) {
    let mut stack: Vec<&str> = Vec::new();
    let mut open_at: Option<(usize, usize)> = None;
    let mut ranges: Vec<(usize, usize)> = Vec::new();

    for caps in MARKUP.captures_iter(xml) {
        let Some(name) = caps.get(2) else {
            continue;
        };
        let whole = caps.get(0).map(|m| (m.start(), m.end())).unwrap_or_default();
        let local = name.as_str().rsplit(':').next().unwrap_or_default();
        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        let self_closing = caps.get(3).is_some_and(|m| !m.as_str().is_empty());

        if closing {
            if let Some((depth, start)) = open_at {
                if depth == stack.len() {
                    ranges.push((start, whole.0));
                    open_at = None;
                }
            }
            if stack.last() == Some(&local) {
                stack.pop();
            }
        } else if !self_closing {
            stack.push(local);
            if open_at.is_none() && stack.as_slice() == path {
                open_at = Some((stack.len(), whole.1));
            }
        }
    }

    let escaped = escape_text(value);
    let mut result = xml.to_string();
    for (start, end) in ranges.iter().rev() {
        result.replace_range(*start..*end, &escaped);
    }
    (result, ranges.len())
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Reads and parses the root POM of a tree.
pub fn root_pom(tree: &ProjectTree) -> Result<Pom> {
    let content = tree.require_file(ROOT_POM)?;
    Pom::parse(&content, ROOT_POM)
}

/// The project version declared in the root POM.
pub fn current_version(tree: &ProjectTree) -> Result<String> {
    root_pom(tree)?.version.ok_or_else(|| Error::Pom {
        path: format!("{}/{}", tree.name(), ROOT_POM),
        message: "no <version> element under <project>".to_string(),
    })
}

/// The project version without a trailing `-SNAPSHOT`.
pub fn current_version_without_snapshot(tree: &ProjectTree) -> Result<String> {
    current_version(tree).map(|v| crate::version::strip_snapshot(&v).to_string())
}

/// A property declared in the root POM.
pub fn property(tree: &ProjectTree, name: &str) -> Result<Option<String>> {
    Ok(root_pom(tree)?.properties.remove(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    const POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <modelVersion>4.0.0</modelVersion>
  <parent>
    <groupId>dev.snowdrop</groupId>
    <artifactId>snowdrop-dependencies</artifactId>
    <version>2.2.5.Final</version>
  </parent>
  <!-- <version>commented</version> -->
  <version>2.2.5-3-SNAPSHOT</version>
  <properties>
    <spring-boot.version>2.2.5.RELEASE</spring-boot.version>
    <tomcat.version>9.0.31</tomcat.version>
    <empty.version/>
  </properties>
  <dependencies>
    <dependency>
      <groupId>org.example</groupId>
      <artifactId>lib</artifactId>
      <version>1.0</version>
    </dependency>
  </dependencies>
</project>
"#;

    #[test]
    fn test_parse_reads_versions_and_properties() {
        let pom = Pom::parse(POM, "pom.xml").unwrap();
        assert_eq!(pom.version.as_deref(), Some("2.2.5-3-SNAPSHOT"));
        assert_eq!(pom.parent_version.as_deref(), Some("2.2.5.Final"));
        assert_eq!(
            pom.properties.get("tomcat.version").map(String::as_str),
            Some("9.0.31")
        );
        assert_eq!(pom.properties.get("empty.version").map(String::as_str), Some(""));
    }

    #[test]
    fn test_parse_rejects_non_pom() {
        assert!(Pom::parse("<settings/>", "settings.xml").is_err());
        assert!(Pom::parse("<project>", "pom.xml").is_err());
    }

    #[test]
    fn test_set_project_version_leaves_other_versions() {
        let (updated, count) = set_element_text(POM, &["project", "version"], "2.2.5-3");
        assert_eq!(count, 1);
        let pom = Pom::parse(&updated, "pom.xml").unwrap();
        assert_eq!(pom.version.as_deref(), Some("2.2.5-3"));
        assert_eq!(pom.parent_version.as_deref(), Some("2.2.5.Final"));
        assert!(updated.contains("<version>1.0</version>"));
        assert!(updated.contains("<!-- <version>commented</version> -->"));
    }

    #[test]
    fn test_set_parent_version() {
        let (updated, count) =
            set_element_text(POM, &["project", "parent", "version"], "2.2.5.Beta1-redhat-00007");
        assert_eq!(count, 1);
        assert!(updated.contains("<version>2.2.5.Beta1-redhat-00007</version>"));
        assert!(updated.contains("<version>2.2.5-3-SNAPSHOT</version>"));
    }

    #[test]
    fn test_set_property_preserves_formatting() {
        let (updated, count) =
            set_element_text(POM, &["project", "properties", "tomcat.version"], "9.0.30");
        assert_eq!(count, 1);
        assert_eq!(updated, POM.replace("9.0.31", "9.0.30"));
    }

    #[test]
    fn test_missing_element_is_untouched() {
        let (updated, count) =
            set_element_text(POM, &["project", "properties", "jetty.version"], "9.4.0");
        assert_eq!(count, 0);
        assert_eq!(updated, POM);
    }

    #[test]
    fn test_prefixed_elements_use_local_names() {
        let xml = "<p:project xmlns:p=\"urn:x\"><p:version>1</p:version></p:project>";
        let (updated, count) = set_element_text(xml, &["project", "version"], "2");
        assert_eq!(count, 1);
        assert_eq!(updated, "<p:project xmlns:p=\"urn:x\"><p:version>2</p:version></p:project>");
    }
}
