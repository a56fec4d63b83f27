//! Project health: compare tool directories with the repository and
//! `ai.package.yaml`, and relink what the repository can still provide.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::{ActionReport, ActionStatus, Installer, PROJECT_MANIFEST, ProjectManifest, scan_links, tool_list};
use crate::error::Result;
use crate::resource::{Package, ResourceRef, ResourceType};
use crate::tools::Tool;
use crate::utils::fs::{absolute, entry_exists};

const LINKED_TYPES: [ResourceType; 3] = [ResourceType::Command, ResourceType::Skill, ResourceType::Agent];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    /// The link target does not exist.
    Broken,
    /// The link resolves outside the repository.
    WrongRepo,
    /// Listed in `ai.package.yaml` but linked in no target tool.
    NotInstalled,
    /// Linked from the repository but not listed in `ai.package.yaml`.
    Orphaned,
    Unreadable,
}

impl IssueKind {
    /// Orphans are reported but do not make a project unhealthy.
    #[must_use]
    pub const fn is_error(self) -> bool {
        !matches!(self, Self::Orphaned)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectIssue {
    #[serde(flatten)]
    pub resource: ResourceRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<Tool>,
    pub kind: IssueKind,
    /// The offending link, or the project manifest for missing entries.
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectVerification {
    /// Links inspected across all target tools.
    pub checked: usize,
    pub issues: Vec<ProjectIssue>,
}

impl ProjectVerification {
    #[must_use]
    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|issue| issue.kind == kind).count()
    }

    #[must_use]
    pub fn errors(&self) -> usize {
        self.issues.iter().filter(|issue| issue.kind.is_error()).count()
    }

    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.errors() == 0
    }

    fn push(
        &mut self,
        resource: ResourceRef,
        tool: Option<Tool>,
        kind: IssueKind,
        path: PathBuf,
        message: String,
    ) {
        self.issues.push(ProjectIssue {
            resource,
            tool,
            kind,
            path,
            message,
        });
    }
}

impl Installer<'_> {
    /// Inspect every link in the target tools and, when the project has an
    /// `ai.package.yaml`, compare the links against its resources.
    pub fn verify(&self) -> Result<ProjectVerification> {
        let repo_root = absolute(self.repo.root())?;
        let mut report = ProjectVerification::default();
        let mut healthy: BTreeMap<ResourceRef, (Tool, PathBuf)> = BTreeMap::new();

        for &tool in &self.targets {
            for resource_type in LINKED_TYPES {
                let Some(dir) = tool.info().dir_for(resource_type) else {
                    continue;
                };
                for (name, link) in scan_links(&self.project.join(dir), resource_type)? {
                    report.checked += 1;
                    let resource = ResourceRef { resource_type, name };
                    let Ok(raw) = std::fs::read_link(&link) else {
                        let message = "cannot read link target".to_string();
                        report.push(resource, Some(tool), IssueKind::Unreadable, link, message);
                        continue;
                    };
                    let target = match link.parent() {
                        Some(parent) if raw.is_relative() => parent.join(raw),
                        _ => raw,
                    };
                    if !target.exists() {
                        let message = format!("link target does not exist: {}", target.display());
                        report.push(resource, Some(tool), IssueKind::Broken, link, message);
                    } else if !target.starts_with(&repo_root) {
                        let message = format!(
                            "points outside the repository: {} (expected under {})",
                            target.display(),
                            repo_root.display()
                        );
                        report.push(resource, Some(tool), IssueKind::WrongRepo, link, message);
                    } else {
                        healthy.entry(resource).or_insert((tool, link));
                    }
                }
            }
        }

        let Some(manifest) = ProjectManifest::load(&self.project)? else {
            debug!(project = %self.project.display(), "no project manifest, skipping manifest checks");
            return Ok(report);
        };
        let manifest_path = ProjectManifest::path(&self.project);
        let mut wanted = BTreeSet::new();
        for reference in manifest.references()? {
            if reference.resource_type != ResourceType::Package {
                wanted.insert(reference);
                continue;
            }
            let path = self.repo.resource_path(ResourceType::Package, &reference.name);
            match Package::load(&path).and_then(|package| package.members()) {
                Ok(members) => wanted.extend(members),
                Err(err) => {
                    let message = format!("package definition unavailable: {err}");
                    report.push(reference, None, IssueKind::NotInstalled, manifest_path.clone(), message);
                }
            }
        }

        for reference in &wanted {
            let mut supported = false;
            let mut present = false;
            for &tool in &self.targets {
                if let Some(link) = self.link_path(tool, reference.resource_type, &reference.name) {
                    supported = true;
                    present |= entry_exists(&link);
                }
            }
            if supported && !present {
                let message = format!("listed in {PROJECT_MANIFEST} but not installed");
                report.push(
                    reference.clone(),
                    None,
                    IssueKind::NotInstalled,
                    manifest_path.clone(),
                    message,
                );
            }
        }

        for (resource, (tool, link)) in healthy {
            if !wanted.contains(&resource) {
                let message = format!("installed but not listed in {PROJECT_MANIFEST}");
                report.push(resource, Some(tool), IssueKind::Orphaned, link, message);
            }
        }
        Ok(report)
    }

    /// Fix what [`Installer::verify`] finds.
    ///
    /// Broken and foreign links are replaced and missing manifest entries
    /// installed, provided the repository holds the resource. Orphans are
    /// reported as skipped; unreadable links and resources the repository
    /// lost are failures. With `dry_run` nothing on disk changes.
    pub fn repair(&self, dry_run: bool) -> Result<ActionReport> {
        let verification = self.verify()?;
        let mut report = ActionReport::new(if dry_run { "to repair" } else { "repaired" });
        let mut relink = BTreeSet::new();

        for issue in verification.issues {
            let resource = issue.resource;
            match issue.kind {
                IssueKind::Orphaned => {
                    let message = format!(
                        "not in {PROJECT_MANIFEST}; run 'aimgr uninstall {resource}' or 'aimgr install {resource}'"
                    );
                    report.push(resource, ActionStatus::Skipped, message);
                }
                IssueKind::Unreadable => {
                    let message = format!("unreadable link at {}; fix it by hand", issue.path.display());
                    report.push(resource, ActionStatus::Failed, message);
                }
                IssueKind::NotInstalled if resource.resource_type == ResourceType::Package => {
                    report.push(resource, ActionStatus::Failed, issue.message);
                }
                IssueKind::NotInstalled => {
                    relink.insert(resource);
                }
                IssueKind::Broken | IssueKind::WrongRepo => {
                    let available = self.repo.contains(resource.resource_type, &resource.name);
                    if !available && issue.kind == IssueKind::WrongRepo {
                        let message = format!("links outside the repository, which has no {resource}");
                        report.push(resource, ActionStatus::Failed, message);
                        continue;
                    }
                    if !dry_run {
                        if let Err(err) = std::fs::remove_file(&issue.path) {
                            let message = format!("cannot remove {}: {err}", issue.path.display());
                            report.push(resource, ActionStatus::Failed, message);
                            continue;
                        }
                        info!(path = %issue.path.display(), kind = ?issue.kind, "removed bad link");
                    }
                    if available {
                        relink.insert(resource);
                    } else if !report.outcomes.iter().any(|o| o.resource == resource) {
                        let message =
                            format!("no longer in the repository; run 'aimgr uninstall {resource}'");
                        report.push(resource, ActionStatus::Failed, message);
                    }
                }
            }
        }

        for resource in relink {
            if !self.repo.contains(resource.resource_type, &resource.name) {
                let message = format!("not found in the repository; run 'aimgr repo add' or edit {PROJECT_MANIFEST}");
                report.push(resource, ActionStatus::Failed, message);
                continue;
            }
            if dry_run {
                report.push(resource, ActionStatus::Done, "would relink");
                continue;
            }
            match self.install_resource(&resource) {
                Ok(outcome) if !outcome.linked.is_empty() => {
                    let message = format!("relinked in {}", tool_list(&outcome.linked));
                    report.push(resource, ActionStatus::Done, message);
                }
                Ok(_) => {
                    warn!(%resource, "nothing to relink");
                    report.push(resource, ActionStatus::Skipped, "already linked");
                }
                Err(err) => report.push(resource, ActionStatus::Failed, err.to_string()),
            }
        }
        Ok(report)
    }
}
