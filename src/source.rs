//! Parse user-supplied source strings into a registrable [`Source`].
//!
//! Accepted forms: `gh:owner/repo[@ref][/subpath]`, bare `owner/repo`,
//! `https://github.com/owner/repo[/tree/ref[/subpath]]`, other HTTP(S) and
//! `git@host:owner/repo.git` URLs, `local:<path>`, and relative (`./`,
//! `../`) or absolute paths.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AimgrError, Result};
use crate::manifest::Source;
use crate::utils::fs::absolute;

static OWNER_REPO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+/[A-Za-z0-9_.-]+$").expect("owner/repo regex")
});
static GITHUB_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://github\.com/([A-Za-z0-9_-]+)/([A-Za-z0-9_.-]+)(?:/tree/([^/]+)(?:/(.+?))?)?/?$")
        .expect("github url regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    GitHub,
    GitLab,
    GitUrl,
    Local,
}

impl SourceKind {
    /// Value recorded as `source_type` in resource metadata.
    #[must_use]
    pub const fn metadata_type(self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::GitLab | Self::GitUrl => "git-url",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::GitHub => "github",
            Self::GitLab => "gitlab",
            Self::GitUrl => "git-url",
            Self::Local => "local",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSource {
    pub kind: SourceKind,
    /// Clone URL for git sources.
    pub url: Option<String>,
    pub local_path: Option<PathBuf>,
    pub git_ref: Option<String>,
    pub subpath: Option<String>,
}

impl ParsedSource {
    fn remote(kind: SourceKind, url: String, git_ref: Option<String>, subpath: Option<String>) -> Self {
        Self {
            kind,
            url: Some(url),
            local_path: None,
            git_ref: git_ref.filter(|r| !r.is_empty()),
            subpath: subpath.filter(|s| !s.is_empty()),
        }
    }

    fn local(path: &str) -> Result<Self> {
        if path.trim().is_empty() {
            return Err(AimgrError::Validation("local path cannot be empty".to_string()));
        }
        Ok(Self {
            kind: SourceKind::Local,
            url: None,
            local_path: Some(PathBuf::from(path)),
            git_ref: None,
            subpath: None,
        })
    }

    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self.kind, SourceKind::Local)
    }

    /// Convert into a manifest source. Local paths are made absolute;
    /// explicit `git_ref`/`subpath` arguments override parsed ones.
    ///
    /// Local sources are read in place, so a ref or subpath is rejected.
    pub fn into_source(
        self,
        name: Option<String>,
        git_ref: Option<String>,
        subpath: Option<String>,
    ) -> Result<Source> {
        let source = match (self.local_path, self.url) {
            (Some(path), _) => {
                if git_ref.is_some() || subpath.is_some() {
                    return Err(AimgrError::Validation(format!(
                        "--ref and --subpath apply to git sources only; point at '{}' directly instead",
                        path.display()
                    )));
                }
                Source::local(absolute(&path)?)
            }
            (None, Some(url)) => Source::remote(url, git_ref.or(self.git_ref), subpath.or(self.subpath)),
            (None, None) => {
                return Err(AimgrError::Validation("source has no location".to_string()));
            }
        };
        Ok(match name {
            Some(name) => source.with_name(name),
            None => source,
        })
    }
}

/// Parse a source string.
pub fn parse(input: &str) -> Result<ParsedSource> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AimgrError::Validation("source cannot be empty".to_string()));
    }

    if let Some(rest) = input.strip_prefix("gh:") {
        return parse_github_shorthand(rest);
    }
    if let Some(rest) = input.strip_prefix("local:") {
        return ParsedSource::local(rest);
    }
    if input.starts_with("http://") || input.starts_with("https://") {
        return Ok(parse_http(input));
    }
    if input.starts_with("git@") {
        return Ok(ParsedSource::remote(SourceKind::GitUrl, input.to_string(), None, None));
    }
    if OWNER_REPO_RE.is_match(input) && !Path::new(input).exists() {
        return parse_github_shorthand(input);
    }
    if input.starts_with("./")
        || input.starts_with("../")
        || input == "."
        || input == ".."
        || Path::new(input).is_absolute()
    {
        return ParsedSource::local(input);
    }
    Err(AimgrError::Validation(format!(
        "unable to parse source format: {input}"
    )))
}

/// `owner/repo[@ref][/subpath]` or `owner/repo/subpath`.
fn parse_github_shorthand(input: &str) -> Result<ParsedSource> {
    let (repo_path, git_ref, ref_subpath) = match input.split_once('@') {
        Some((repo, rest)) => match rest.split_once('/') {
            Some((git_ref, sub)) => (repo, Some(git_ref.to_string()), Some(sub.to_string())),
            None => (repo, Some(rest.to_string()), None),
        },
        None => (input, None, None),
    };

    let mut parts = repo_path.splitn(3, '/');
    let owner = parts.next().unwrap_or_default();
    let repo = parts.next().unwrap_or_default();
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if owner.is_empty() || repo.is_empty() {
        return Err(AimgrError::Validation(format!(
            "invalid GitHub source {input:?}: expected owner/repo"
        )));
    }
    let subpath = ref_subpath.or_else(|| parts.next().map(str::to_string));

    Ok(ParsedSource::remote(
        SourceKind::GitHub,
        format!("https://github.com/{owner}/{repo}"),
        git_ref,
        subpath,
    ))
}

fn parse_http(input: &str) -> ParsedSource {
    if let Some(caps) = GITHUB_URL_RE.captures(input) {
        let repo = &caps[2];
        let repo = repo.strip_suffix(".git").unwrap_or(repo);
        return ParsedSource::remote(
            SourceKind::GitHub,
            format!("https://github.com/{}/{repo}", &caps[1]),
            caps.get(3).map(|m| m.as_str().to_string()),
            caps.get(4).map(|m| m.as_str().to_string()),
        );
    }
    let kind = if input.contains("://gitlab.com/") {
        SourceKind::GitLab
    } else {
        SourceKind::GitUrl
    };
    ParsedSource::remote(kind, input.to_string(), None, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn github_shorthand_forms() {
        let parsed = parse("gh:anthropics/skills").unwrap();
        assert_eq!(parsed.kind, SourceKind::GitHub);
        assert_eq!(parsed.url.as_deref(), Some("https://github.com/anthropics/skills"));
        assert_eq!(parsed.git_ref, None);

        let parsed = parse("gh:org/repo@v1.2/skills/pdf").unwrap();
        assert_eq!(parsed.git_ref.as_deref(), Some("v1.2"));
        assert_eq!(parsed.subpath.as_deref(), Some("skills/pdf"));

        let parsed = parse("gh:org/repo.git/plugins").unwrap();
        assert_eq!(parsed.url.as_deref(), Some("https://github.com/org/repo"));
        assert_eq!(parsed.subpath.as_deref(), Some("plugins"));

        let parsed = parse("someorg/some-repo").unwrap();
        assert_eq!(parsed.kind, SourceKind::GitHub);
    }

    #[test]
    fn github_urls_with_tree() {
        let parsed = parse("https://github.com/org/repo/tree/main/skills").unwrap();
        assert_eq!(parsed.url.as_deref(), Some("https://github.com/org/repo"));
        assert_eq!(parsed.git_ref.as_deref(), Some("main"));
        assert_eq!(parsed.subpath.as_deref(), Some("skills"));

        let parsed = parse("https://github.com/org/repo.git").unwrap();
        assert_eq!(parsed.url.as_deref(), Some("https://github.com/org/repo"));
        assert_eq!(parsed.git_ref, None);
    }

    #[test]
    fn other_git_urls() {
        let parsed = parse("https://gitlab.com/group/project.git").unwrap();
        assert_eq!(parsed.kind, SourceKind::GitLab);
        assert_eq!(parsed.kind.metadata_type(), "git-url");

        let parsed = parse("git@github.com:org/repo.git").unwrap();
        assert_eq!(parsed.kind, SourceKind::GitUrl);
        assert_eq!(parsed.url.as_deref(), Some("git@github.com:org/repo.git"));
    }

    #[test]
    fn local_paths() {
        assert!(parse("./my-skills").unwrap().is_local());
        assert!(parse("../shared").unwrap().is_local());
        assert!(parse("/opt/resources").unwrap().is_local());
        let parsed = parse("local:relative/dir").unwrap();
        assert_eq!(parsed.local_path.as_deref(), Some(Path::new("relative/dir")));

        let source = parse("/opt/resources").unwrap().into_source(None, None, None).unwrap();
        assert_eq!(source.path.as_deref(), Some(Path::new("/opt/resources")));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("").is_err());
        assert!(parse("gh:onlyowner").is_err());
        assert!(parse("just words here").is_err());
    }

    #[test]
    fn explicit_ref_overrides_parsed() {
        let source = parse("gh:org/repo@v1")
            .unwrap()
            .into_source(Some("team".into()), Some("v2".into()), None)
            .unwrap();
        assert_eq!(source.git_ref.as_deref(), Some("v2"));
        assert_eq!(source.name, "team");
    }

    #[test]
    fn local_sources_reject_ref_and_subpath() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_string_lossy().to_string();

        let err = parse(&path)
            .unwrap()
            .into_source(None, Some("main".into()), None)
            .unwrap_err();
        assert!(matches!(err, AimgrError::Validation(_)), "{err}");

        let err = parse(&path)
            .unwrap()
            .into_source(None, None, Some("skills".into()))
            .unwrap_err();
        assert!(err.to_string().contains("git sources only"), "{err}");

        let source = parse(&path).unwrap().into_source(None, None, None).unwrap();
        assert!(source.path.is_some());
    }
}
