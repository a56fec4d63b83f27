//! Project installation: symlinks from tool directories into the repository.
//!
//! An [`Installer`] is bound to one project directory and a resolved set of
//! target tools. Each installed resource is a symlink at
//! `<project>/<tool dir>/<name>[.md]` pointing at the canonical store path;
//! nothing is ever copied into the project.

pub mod project;
pub mod verify;

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{AimgrError, Result};
use crate::repo::Repository;
use crate::resource::{Package, ResourceRef, ResourceType};
use crate::tools::{self, Tool};
use crate::utils::fs::{absolute, ensure_dir, entry_exists, is_symlink, prune_empty_parents, symlink};

pub use project::{PROJECT_MANIFEST, ProjectManifest};
pub use verify::{IssueKind, ProjectIssue, ProjectVerification};

/// Pick target tools: explicit, then detected project directories, then
/// the project manifest, then configured defaults.
pub fn resolve_targets(explicit: &[Tool], project: &Path, defaults: &[Tool]) -> Result<Vec<Tool>> {
    if !explicit.is_empty() {
        return Ok(explicit.to_vec());
    }
    let detected = tools::detect_existing(project);
    if !detected.is_empty() {
        debug!(?detected, "using detected tool directories");
        return Ok(detected);
    }
    match ProjectManifest::load(project) {
        Ok(Some(manifest)) if !manifest.install.targets.is_empty() => return manifest.targets(),
        Ok(_) => {}
        Err(err) => warn!(error = %err, "ignoring unreadable project manifest"),
    }
    Ok(defaults.to_vec())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    Ok,
    Broken,
}

/// One installed resource, merged across every tool that links it.
#[derive(Debug, Clone, Serialize)]
pub struct InstalledResource {
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Link target; for a broken link this path does not exist.
    pub path: PathBuf,
    pub health: Health,
    pub tools: Vec<Tool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOutcome {
    pub linked: Vec<Tool>,
    pub existing: Vec<Tool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UninstallOutcome {
    pub removed: Vec<Tool>,
    /// Tools holding a non-symlink entry that was left in place.
    pub flagged: Vec<Tool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Done,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionOutcome {
    #[serde(flatten)]
    pub resource: ResourceRef,
    pub status: ActionStatus,
    pub message: String,
}

/// Per-resource results of a batch install or uninstall.
#[derive(Debug, Clone, Serialize)]
pub struct ActionReport {
    #[serde(skip)]
    verb: &'static str,
    pub outcomes: Vec<ActionOutcome>,
}

impl ActionReport {
    const fn new(verb: &'static str) -> Self {
        Self {
            verb,
            outcomes: Vec::new(),
        }
    }

    #[must_use]
    pub fn count(&self, status: ActionStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    #[must_use]
    pub fn summary_line(&self) -> String {
        format!(
            "Summary: {} {}, {} skipped, {} failed",
            self.count(ActionStatus::Done),
            self.verb,
            self.count(ActionStatus::Skipped),
            self.count(ActionStatus::Failed)
        )
    }

    fn push(&mut self, resource: ResourceRef, status: ActionStatus, message: impl Into<String>) {
        self.outcomes.push(ActionOutcome {
            resource,
            status,
            message: message.into(),
        });
    }
}

fn tool_list(tools: &[Tool]) -> String {
    tools.iter().map(|tool| tool.as_str()).collect::<Vec<_>>().join(", ")
}

pub struct Installer<'a> {
    repo: &'a Repository,
    project: PathBuf,
    targets: Vec<Tool>,
}

impl<'a> Installer<'a> {
    pub fn new(repo: &'a Repository, project: &Path, targets: Vec<Tool>) -> Result<Self> {
        Ok(Self {
            repo,
            project: absolute(project)?,
            targets,
        })
    }

    #[must_use]
    pub fn project(&self) -> &Path {
        &self.project
    }

    #[must_use]
    pub fn targets(&self) -> &[Tool] {
        &self.targets
    }

    /// Where `tool` expects the link for `(resource_type, name)`.
    #[must_use]
    pub fn link_path(&self, tool: Tool, resource_type: ResourceType, name: &str) -> Option<PathBuf> {
        tool.info()
            .dir_for(resource_type)
            .map(|dir| self.project.join(dir).join(resource_type.kind().file_name(name)))
    }

    /// Link one stored resource into every supporting target tool.
    ///
    /// Entries already present are left untouched, so repeated calls are
    /// no-ops.
    pub fn install_resource(&self, reference: &ResourceRef) -> Result<InstallOutcome> {
        if reference.resource_type == ResourceType::Package {
            return Err(AimgrError::Validation(format!(
                "{reference} must be expanded before linking"
            )));
        }
        let resource = self.repo.get(reference.resource_type, &reference.name)?;
        let canonical = self.repo.resource_path(reference.resource_type, &reference.name);

        let mut outcome = InstallOutcome::default();
        for &tool in &self.targets {
            let Some(link) = self.link_path(tool, resource.resource_type, &reference.name) else {
                continue;
            };
            if entry_exists(&link) {
                debug!(tool = %tool, path = %link.display(), "already installed");
                outcome.existing.push(tool);
                continue;
            }
            if let Some(parent) = link.parent() {
                ensure_dir(parent)?;
            }
            symlink(&canonical, &link)?;
            info!(
                tool = %tool,
                resource_type = %resource.resource_type,
                name = %reference.name,
                path = %link.display(),
                "resource installed"
            );
            outcome.linked.push(tool);
        }
        Ok(outcome)
    }

    /// Install `references`, expanding packages into their members.
    #[must_use]
    pub fn install(&self, references: &[ResourceRef]) -> ActionReport {
        let mut report = ActionReport::new("installed");
        for reference in self.expand(references, &mut report) {
            match self.install_resource(&reference) {
                Ok(outcome) if !outcome.linked.is_empty() => {
                    let message = format!("installed to {}", tool_list(&outcome.linked));
                    report.push(reference, ActionStatus::Done, message);
                }
                Ok(outcome) if !outcome.existing.is_empty() => {
                    report.push(reference, ActionStatus::Skipped, "already installed");
                }
                Ok(_) => {
                    let message = format!(
                        "no target tool supports {}s ({})",
                        reference.resource_type,
                        tool_list(&self.targets)
                    );
                    report.push(reference, ActionStatus::Skipped, message);
                }
                Err(err) => report.push(reference, ActionStatus::Failed, err.to_string()),
            }
        }
        report
    }

    /// Remove the resource's links from every target tool.
    ///
    /// Succeeds if at least one link was removed. Non-symlink entries are
    /// never touched; they are reported in [`UninstallOutcome::flagged`].
    pub fn uninstall_resource(&self, resource_type: ResourceType, name: &str) -> Result<UninstallOutcome> {
        let mut outcome = UninstallOutcome::default();
        for &tool in &self.targets {
            let Some(link) = self.link_path(tool, resource_type, name) else {
                continue;
            };
            if !entry_exists(&link) {
                continue;
            }
            if !is_symlink(&link) {
                warn!(tool = %tool, path = %link.display(), "not a symlink, leaving in place");
                outcome.flagged.push(tool);
                continue;
            }
            std::fs::remove_file(&link)?;
            if let Some(dir) = tool.info().dir_for(resource_type) {
                prune_empty_parents(&link, &self.project.join(dir));
            }
            info!(tool = %tool, %resource_type, name, "resource uninstalled");
            outcome.removed.push(tool);
        }

        if outcome.removed.is_empty() {
            if let Some(tool) = outcome.flagged.first() {
                return Err(AimgrError::Conflict(format!(
                    "'{name}' in {tool} is not a symlink (manual installation?)"
                )));
            }
            return Err(AimgrError::NotFound(format!("{resource_type} '{name}' is not installed")));
        }
        Ok(outcome)
    }

    #[must_use]
    pub fn uninstall(&self, references: &[ResourceRef]) -> ActionReport {
        let mut report = ActionReport::new("uninstalled");
        for reference in self.expand(references, &mut report) {
            match self.uninstall_resource(reference.resource_type, &reference.name) {
                Ok(outcome) => {
                    let mut message = format!("removed from {}", tool_list(&outcome.removed));
                    if !outcome.flagged.is_empty() {
                        message.push_str(&format!(
                            "; left non-symlink entries in {}",
                            tool_list(&outcome.flagged)
                        ));
                    }
                    report.push(reference, ActionStatus::Done, message);
                }
                Err(AimgrError::NotFound(message)) => {
                    report.push(reference, ActionStatus::Skipped, message);
                }
                Err(err) => report.push(reference, ActionStatus::Failed, err.to_string()),
            }
        }
        report
    }

    /// True if any target tool holds a live symlink for the resource.
    #[must_use]
    pub fn is_installed(&self, resource_type: ResourceType, name: &str) -> bool {
        self.targets.iter().any(|&tool| {
            self.link_path(tool, resource_type, name)
                .is_some_and(|link| is_symlink(&link) && link.exists())
        })
    }

    /// Installed resources across all target tools, one entry per
    /// `(type, name)`.
    pub fn list(&self) -> Result<Vec<InstalledResource>> {
        let mut found: BTreeMap<(ResourceType, String), InstalledResource> = BTreeMap::new();
        for &tool in &self.targets {
            for resource_type in [ResourceType::Command, ResourceType::Skill, ResourceType::Agent] {
                let Some(dir) = tool.info().dir_for(resource_type) else {
                    continue;
                };
                for (name, link) in scan_links(&self.project.join(dir), resource_type)? {
                    let Some(entry) = inspect_link(resource_type, name, &link, tool) else {
                        continue;
                    };
                    match found.get_mut(&(resource_type, entry.name.clone())) {
                        Some(existing) => {
                            if existing.health == Health::Broken && entry.health == Health::Ok {
                                let tools = std::mem::take(&mut existing.tools);
                                *existing = entry;
                                existing.tools.splice(0..0, tools);
                            } else if !existing.tools.contains(&tool) {
                                existing.tools.push(tool);
                            }
                        }
                        None => {
                            found.insert((resource_type, entry.name.clone()), entry);
                        }
                    }
                }
            }
        }
        Ok(found.into_values().collect())
    }

    /// Replace package references by their members, keeping first-seen order.
    fn expand(&self, references: &[ResourceRef], report: &mut ActionReport) -> Vec<ResourceRef> {
        let mut seen = HashSet::new();
        let mut expanded = Vec::new();
        for reference in references {
            if reference.resource_type != ResourceType::Package {
                if seen.insert(reference.clone()) {
                    expanded.push(reference.clone());
                }
                continue;
            }
            let path = self.repo.resource_path(ResourceType::Package, &reference.name);
            let members = if path.is_file() {
                Package::load(&path).and_then(|package| package.members())
            } else {
                Err(AimgrError::NotFound(format!(
                    "package '{}' not found in repository",
                    reference.name
                )))
            };
            match members {
                Ok(members) => {
                    debug!(package = %reference.name, members = members.len(), "expanding package");
                    for member in members {
                        if seen.insert(member.clone()) {
                            expanded.push(member);
                        }
                    }
                }
                Err(err) => report.push(reference.clone(), ActionStatus::Failed, err.to_string()),
            }
        }
        expanded
    }
}

/// Symlinks in a tool directory as `(name, link path)`. Commands and agents
/// are also looked up one directory deep for nested names.
fn scan_links(dir: &Path, resource_type: ResourceType) -> Result<Vec<(String, PathBuf)>> {
    let mut links = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(links),
        Err(err) => return Err(err.into()),
    };
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if is_symlink(&path) {
            links.push((link_name(resource_type, &file_name), path));
        } else if resource_type.supports_nesting() && path.is_dir() {
            let Ok(nested) = std::fs::read_dir(&path) else {
                continue;
            };
            for sub in nested.filter_map(|e| e.ok()) {
                let sub_path = sub.path();
                if is_symlink(&sub_path) {
                    let sub_name = sub.file_name().to_string_lossy().into_owned();
                    let name = format!("{file_name}/{}", link_name(resource_type, &sub_name));
                    links.push((name, sub_path));
                }
            }
        }
    }
    Ok(links)
}

fn link_name(resource_type: ResourceType, file_name: &str) -> String {
    match resource_type {
        ResourceType::Skill => file_name.to_string(),
        _ => file_name.strip_suffix(".md").unwrap_or(file_name).to_string(),
    }
}

fn inspect_link(resource_type: ResourceType, name: String, link: &Path, tool: Tool) -> Option<InstalledResource> {
    let raw = std::fs::read_link(link).ok()?;
    let target = match link.parent() {
        Some(parent) if raw.is_relative() => parent.join(raw),
        _ => raw,
    };
    if !target.exists() {
        return Some(InstalledResource {
            resource_type,
            name,
            description: String::new(),
            path: target,
            health: Health::Broken,
            tools: vec![tool],
        });
    }
    match resource_type.kind().load(&target) {
        Ok(resource) => Some(InstalledResource {
            resource_type,
            name,
            description: resource.description,
            path: target,
            health: Health::Ok,
            tools: vec![tool],
        }),
        Err(err) => {
            warn!(path = %link.display(), error = %err, "skipping unloadable installed resource");
            None
        }
    }
}
