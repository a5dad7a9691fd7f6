//! Project editors
//!
//! An [`Editor`] is a named transformation `ProjectTree -> Result<ProjectTree>`.
//! Editors are composed into an [`EditorChain`] which applies them in order
//! and stops at the first failure, so a chain either produces a fully edited
//! tree or nothing at all. Order matters: later editors read values written
//! by earlier ones (the template editor reads the already-updated version).

use crate::config::BomConfig;
use crate::error::{Error, Result};
use crate::pom;
use crate::project::{ProjectTree, ROOT_POM};
use crate::version;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

type EditFn = dyn Fn(ProjectTree) -> Result<ProjectTree> + Send + Sync;

/// Glob of module POMs whose parent is the root project.
const MODULE_POMS: &str = "*/pom.xml";

/// A named project transformation
#[derive(Clone)]
pub struct Editor {
    name: String,
    edit: Arc<EditFn>,
}

impl Editor {
    pub fn new<F>(name: impl Into<String>, edit: F) -> Self
    where
        F: Fn(ProjectTree) -> Result<ProjectTree> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            edit: Arc::new(edit),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, tree: ProjectTree) -> Result<ProjectTree> {
        (self.edit)(tree)
    }
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Editor").field("name", &self.name).finish()
    }
}

/// An ordered list of editors applied as one unit
#[derive(Clone, Debug, Default)]
pub struct EditorChain {
    editors: Vec<Editor>,
}

impl EditorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an editor to the chain.
    pub fn then(mut self, editor: Editor) -> Self {
        self.editors.push(editor);
        self
    }

    pub fn len(&self) -> usize {
        self.editors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.editors.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.editors.iter().map(Editor::name).collect()
    }

    /// Applies every editor in order, short-circuiting on the first error.
    pub fn apply(&self, tree: ProjectTree) -> Result<ProjectTree> {
        self.editors.iter().try_fold(tree, |tree, editor| {
            log::debug!("{}: applying editor '{}'", tree.name(), editor.name());
            editor.apply(tree)
        })
    }
}

impl FromIterator<Editor> for EditorChain {
    fn from_iter<I: IntoIterator<Item = Editor>>(iter: I) -> Self {
        Self {
            editors: iter.into_iter().collect(),
        }
    }
}

/// Replaces the element at `path` in every POM matching `pattern`.
fn edit_poms(tree: &mut ProjectTree, pattern: &str, path: &[&str], value: &str) -> Result<usize> {
    let mut matched = 0;
    tree.transform_files(pattern, |_, content| {
        let (updated, count) = pom::set_element_text(content, path, value);
        matched += count;
        Ok(updated)
    })?;
    Ok(matched)
}

/// Editors changing POM versions
pub mod versions {
    use super::*;

    /// Sets `/project/version` of the root POM and the parent version of module POMs.
    ///
    /// Fails if the root POM declares no version.
    pub fn set_project_version(version: impl Into<String>) -> Editor {
        let version = version.into();
        Editor::new(format!("set-project-version {}", version), move |mut tree| {
            apply_project_version(&mut tree, &version)?;
            Ok(tree)
        })
    }

    pub(crate) fn apply_project_version(tree: &mut ProjectTree, version: &str) -> Result<()> {
        tree.require_file(ROOT_POM)?;
        if edit_poms(tree, ROOT_POM, &["project", "version"], version)? == 0 {
            return Err(Error::Editor {
                editor: "set-project-version".to_string(),
                message: format!("{}: {} declares no project version", tree.name(), ROOT_POM),
            });
        }
        edit_poms(tree, MODULE_POMS, &["project", "parent", "version"], version)?;
        Ok(())
    }

    /// Sets `/project/parent/version` of the root POM.
    pub fn set_parent_version(version: impl Into<String>) -> Editor {
        let version = version.into();
        Editor::new(format!("set-parent-version {}", version), move |mut tree| {
            apply_parent_version(&mut tree, &version)?;
            Ok(tree)
        })
    }

    pub(crate) fn apply_parent_version(tree: &mut ProjectTree, version: &str) -> Result<()> {
        tree.require_file(ROOT_POM)?;
        if edit_poms(tree, ROOT_POM, &["project", "parent", "version"], version)? == 0 {
            log::warn!("{}: {} has no parent, parent version left unchanged", tree.name(), ROOT_POM);
        }
        Ok(())
    }

    /// Removes `-SNAPSHOT` from the project version.
    pub fn strip_snapshot() -> Editor {
        Editor::new("strip-snapshot", |mut tree| {
            let released = pom::current_version_without_snapshot(&tree)?;
            apply_project_version(&mut tree, &released)?;
            Ok(tree)
        })
    }

    /// Replaces `-SNAPSHOT` with `-{marker}`, e.g. `2.2.5-3-redhat`.
    pub fn qualify(marker: impl Into<String>) -> Editor {
        let marker = marker.into();
        Editor::new(format!("qualify {}", marker), move |mut tree| {
            let qualified = format!("{}-{}", pom::current_version_without_snapshot(&tree)?, marker);
            apply_project_version(&mut tree, &qualified)?;
            Ok(tree)
        })
    }

    /// Bumps the revision of the project version.
    pub fn bump_revision() -> Editor {
        Editor::new("bump-revision", |mut tree| {
            let current = pom::current_version(&tree)?;
            let next = version::next_booster_version(&current);
            if next != current {
                apply_project_version(&mut tree, &next)?;
            }
            Ok(tree)
        })
    }

    /// Re-bases a booster onto a released BOM.
    ///
    /// The project version follows [`version::rebase_booster_version`]; the
    /// BOM property is set to the BOM version and the framework property to
    /// the framework version the BOM was built from.
    pub fn rebase_onto_bom(bom_version: impl Into<String>, config: &BomConfig) -> Result<Editor> {
        let bom_version = bom_version.into();
        let framework_version = version::framework_version_for_bom(&bom_version, config)?;
        let mut properties = BTreeMap::new();
        properties.insert(config.bom_property.clone(), bom_version.clone());
        properties.insert(config.framework_property.clone(), framework_version);
        Ok(Editor::new(format!("rebase-onto-bom {}", bom_version), move |mut tree| {
            let current = pom::current_version(&tree)?;
            let next = version::rebase_booster_version(&current, &bom_version);
            if next != current {
                apply_project_version(&mut tree, &next)?;
            }
            super::properties::apply_properties(&mut tree, &properties)?;
            Ok(tree)
        }))
    }

    /// Aligns an example, whose parent is the BOM, with a BOM release.
    pub fn align_with_bom(bom_version: impl Into<String>, config: &BomConfig) -> Result<Editor> {
        let bom_version = bom_version.into();
        let framework_version = version::framework_version_for_bom(&bom_version, config)?;
        let mut properties = BTreeMap::new();
        properties.insert(config.framework_property.clone(), framework_version);
        Ok(Editor::new(format!("align-with-bom {}", bom_version), move |mut tree| {
            let current = pom::current_version(&tree)?;
            let next = version::realign_to_upstream(&current, &bom_version);
            if next != current {
                apply_project_version(&mut tree, &next)?;
            }
            apply_parent_version(&mut tree, &bom_version)?;
            super::properties::apply_properties(&mut tree, &properties)?;
            Ok(tree)
        }))
    }

    /// Moves the BOM's own version past a release.
    pub fn bump_bom_for_release(released: impl Into<String>) -> Editor {
        let released = released.into();
        Editor::new(format!("bump-bom-for-release {}", released), move |mut tree| {
            let current = pom::current_version(&tree)?;
            let next = version::next_bom_version(&current, &released);
            if next != current {
                apply_project_version(&mut tree, &next)?;
            }
            Ok(tree)
        })
    }
}

/// Editors changing POM properties
pub mod properties {
    use super::*;

    /// Sets properties in `/project/properties` of the root POM.
    ///
    /// Properties the POM does not declare are skipped.
    pub fn set_properties(properties: BTreeMap<String, String>) -> Editor {
        let name = format!(
            "set-properties {}",
            properties.keys().cloned().collect::<Vec<_>>().join(",")
        );
        Editor::new(name, move |mut tree| {
            apply_properties(&mut tree, &properties)?;
            Ok(tree)
        })
    }

    /// Sets a single property.
    pub fn set_property(name: impl Into<String>, value: impl Into<String>) -> Editor {
        let mut properties = BTreeMap::new();
        properties.insert(name.into(), value.into());
        set_properties(properties)
    }

    pub(crate) fn apply_properties(
        tree: &mut ProjectTree,
        properties: &BTreeMap<String, String>,
    ) -> Result<()> {
        tree.require_file(ROOT_POM)?;
        for (name, value) in properties {
            if edit_poms(tree, ROOT_POM, &["project", "properties", name.as_str()], value)? == 0 {
                log::debug!("{}: property '{}' is not declared, skipping", tree.name(), name);
            }
        }
        Ok(())
    }
}

/// Editors for OpenShift templates
pub mod templates {
    use super::*;

    /// Tokens substituted in template files.
    #[derive(Debug, Clone)]
    pub struct TemplateTokens {
        /// Glob selecting the templates.
        pub glob: String,
        /// Replaced by the project version.
        pub version_token: String,
        /// Replaced by the framework version.
        pub framework_token: String,
        /// POM property read when no framework version is given.
        pub framework_property: String,
    }

    /// Substitutes the version and framework-version tokens in every template.
    ///
    /// The project version is read when the editor runs, so it reflects
    /// edits made earlier in the chain.
    pub fn substitute(tokens: TemplateTokens, framework_version: Option<String>) -> Editor {
        Editor::new("substitute-template-placeholders", move |mut tree| {
            let project_version = pom::current_version(&tree)?;
            let framework_version = match &framework_version {
                Some(v) => v.clone(),
                None => pom::property(&tree, &tokens.framework_property)?.ok_or_else(|| {
                    Error::Editor {
                        editor: "substitute-template-placeholders".to_string(),
                        message: format!(
                            "{}: property '{}' is not declared",
                            tree.name(),
                            tokens.framework_property
                        ),
                    }
                })?,
            };
            let changed = tree.transform_files(&tokens.glob, |_, content| {
                Ok(content
                    .replace(&tokens.version_token, &project_version)
                    .replace(&tokens.framework_token, &framework_version))
            })?;
            log::debug!("{}: substituted placeholders in {} template(s)", tree.name(), changed);
            Ok(tree)
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::filesystem::MemoryFS;
    use crate::pom::Pom;

    pub(crate) const EXAMPLE_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <modelVersion>4.0.0</modelVersion>
  <parent>
    <groupId>dev.snowdrop</groupId>
    <artifactId>snowdrop-dependencies</artifactId>
    <version>2.2.5.Final</version>
  </parent>
  <groupId>dev.snowdrop.example</groupId>
  <artifactId>rest-http</artifactId>
  <version>2.2.5-3-SNAPSHOT</version>
  <properties>
    <spring-boot.version>2.2.5.RELEASE</spring-boot.version>
    <spring-boot-bom.version>2.2.5.Final</spring-boot-bom.version>
  </properties>
</project>
"#;

    const MODULE_POM: &str = r#"<project>
  <parent>
    <groupId>dev.snowdrop.example</groupId>
    <artifactId>rest-http</artifactId>
    <version>2.2.5-3-SNAPSHOT</version>
  </parent>
  <artifactId>rest-http-service</artifactId>
</project>
"#;

    const TEMPLATE: &str = "image: rest-http:BOOSTER_VERSION\nspringBoot: SPRING_BOOT_VERSION\nlabel: BOOSTER_VERSION\n";

    pub(crate) fn example_tree() -> ProjectTree {
        let mut fs = MemoryFS::new();
        fs.add_file_string("pom.xml", EXAMPLE_POM);
        fs.add_file_string("service/pom.xml", MODULE_POM);
        fs.add_file_string(".openshiftio/application.yaml", TEMPLATE);
        fs.add_file_string("service/.openshiftio/application.yml", TEMPLATE);
        ProjectTree::in_memory("rest-http-example", fs)
    }

    pub(crate) fn tokens() -> templates::TemplateTokens {
        templates::TemplateTokens {
            glob: "**/.openshiftio/application.y*ml".to_string(),
            version_token: "BOOSTER_VERSION".to_string(),
            framework_token: "SPRING_BOOT_VERSION".to_string(),
            framework_property: "spring-boot.version".to_string(),
        }
    }

    fn root(tree: &ProjectTree) -> Pom {
        pom::root_pom(tree).unwrap()
    }

    #[test]
    fn test_set_project_version_updates_modules() {
        let tree = versions::set_project_version("2.2.5-3").apply(example_tree()).unwrap();
        assert_eq!(root(&tree).version.as_deref(), Some("2.2.5-3"));
        let module = tree.get_file("service/pom.xml").unwrap().unwrap();
        assert_eq!(
            Pom::parse(&module, "service/pom.xml").unwrap().parent_version.as_deref(),
            Some("2.2.5-3")
        );
    }

    #[test]
    fn test_set_project_version_requires_version_element() {
        let mut fs = MemoryFS::new();
        fs.add_file_string("pom.xml", "<project><artifactId>x</artifactId></project>");
        let tree = ProjectTree::in_memory("broken", fs);
        let result = versions::set_project_version("1.0.0-1").apply(tree);
        assert!(matches!(result, Err(Error::Editor { .. })));
    }

    #[test]
    fn test_strip_snapshot_and_qualify() {
        let community = versions::strip_snapshot().apply(example_tree()).unwrap();
        assert_eq!(root(&community).version.as_deref(), Some("2.2.5-3"));

        let prod = versions::qualify("redhat").apply(example_tree()).unwrap();
        assert_eq!(root(&prod).version.as_deref(), Some("2.2.5-3-redhat"));
    }

    #[test]
    fn test_bump_revision() {
        let tree = versions::bump_revision().apply(example_tree()).unwrap();
        assert_eq!(root(&tree).version.as_deref(), Some("2.2.5-4-SNAPSHOT"));
    }

    #[test]
    fn test_set_property_absent_is_noop() {
        let tree = properties::set_property("jetty.version", "9.4.0")
            .apply(example_tree())
            .unwrap();
        assert!(!tree.is_modified());
    }

    #[test]
    fn test_set_property() {
        let tree = properties::set_property("spring-boot.version", "2.2.6.RELEASE")
            .apply(example_tree())
            .unwrap();
        assert_eq!(
            root(&tree).properties.get("spring-boot.version").map(String::as_str),
            Some("2.2.6.RELEASE")
        );
    }

    #[test]
    fn test_template_substitution_reads_updated_version() {
        let chain = EditorChain::new()
            .then(versions::strip_snapshot())
            .then(templates::substitute(tokens(), Some("2.2.5.RELEASE".to_string())));
        let tree = chain.apply(example_tree()).unwrap();
        for path in [".openshiftio/application.yaml", "service/.openshiftio/application.yml"] {
            let content = tree.get_file(path).unwrap().unwrap();
            assert_eq!(
                content,
                "image: rest-http:2.2.5-3\nspringBoot: 2.2.5.RELEASE\nlabel: 2.2.5-3\n"
            );
        }
    }

    #[test]
    fn test_template_substitution_falls_back_to_property() {
        let tree = templates::substitute(tokens(), None).apply(example_tree()).unwrap();
        let content = tree.get_file(".openshiftio/application.yaml").unwrap().unwrap();
        assert!(content.contains("springBoot: 2.2.5.RELEASE"));
    }

    #[test]
    fn test_chain_short_circuits() {
        let failing = Editor::new("fail", |tree: ProjectTree| {
            Err(Error::Editor {
                editor: "fail".to_string(),
                message: format!("{} refused", tree.name()),
            })
        });
        let never = Editor::new("never", |_tree: ProjectTree| -> Result<ProjectTree> {
            panic!("editor after a failure must not run")
        });
        let chain: EditorChain = vec![versions::strip_snapshot(), failing, never].into_iter().collect();
        assert_eq!(chain.len(), 3);
        assert!(chain.apply(example_tree()).is_err());
    }

    #[test]
    fn test_rebase_onto_bom() {
        let config = BomConfig::default();
        let tree = versions::rebase_onto_bom("2.2.6.Final", &config)
            .unwrap()
            .apply(example_tree())
            .unwrap();
        let pom = root(&tree);
        assert_eq!(pom.version.as_deref(), Some("2.2.6-1-SNAPSHOT"));
        assert_eq!(
            pom.properties.get("spring-boot-bom.version").map(String::as_str),
            Some("2.2.6.Final")
        );
        assert_eq!(
            pom.properties.get("spring-boot.version").map(String::as_str),
            Some("2.2.6.RELEASE")
        );
    }

    #[test]
    fn test_align_with_bom_same_core_keeps_version() {
        let config = BomConfig::default();
        let tree = versions::align_with_bom("2.2.5.SP1", &config)
            .unwrap()
            .apply(example_tree())
            .unwrap();
        let pom = root(&tree);
        assert_eq!(pom.version.as_deref(), Some("2.2.5-3-SNAPSHOT"));
        assert_eq!(pom.parent_version.as_deref(), Some("2.2.5.SP1"));
    }

    #[test]
    fn test_bump_bom_for_release() {
        let mut fs = MemoryFS::new();
        fs.add_file_string("pom.xml", "<project><version>1.5.15-SNAPSHOT</version></project>");
        let tree = ProjectTree::in_memory("spring-boot-bom", fs);
        let tree = versions::bump_bom_for_release("1.5.15.Final").apply(tree).unwrap();
        assert_eq!(root(&tree).version.as_deref(), Some("1.5.15.SP1-SNAPSHOT"));
    }
}
