//! File-token resolution.
//!
//! Rules extract raw file tokens exactly as the build tool wrote them:
//! `../src/main.c`, `C:\work\x.c`, `main.o`, `{standard input}`. Resolution
//! turns a token into a [`FileIdentity`]:
//!
//! ```text
//! token ──┬─ empty ───────────────────────────▶ Project(name) | Workspace
//!         └─ key(token) ─┬─ cache hit ─────────▶ cached identity
//!                        ├─ FileIndex hit ────▶ File(best candidate)
//!                        └─ otherwise ────────▶ External(path)
//! ```
//!
//! ## Cache precedence
//!
//! The first identity computed for a key is reused for the rest of the session,
//! even if the same base name later shows up under a different directory
//! (`make` changed directory, or the token carries a different prefix). Build
//! logs rarely contain two distinct files with the same base name in one
//! session, and callers rely on the stable attribution.
//!
//! ## Disambiguation
//!
//! When the index returns several candidates, the one whose trailing path
//! components match the token as written the longest wins; then one under the
//! current working directory; then the first returned.

use crate::FileIdentity;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// External file lookup, typically backed by the host project's file list.
///
/// `name` is the lookup name chosen by the session's [`PathStrategy`]: the base
/// name by default, or the token as written.
pub trait FileIndex {
    fn candidates(&self, name: &str) -> Vec<PathBuf>;
}

impl<F> FileIndex for F
where
    F: Fn(&str) -> Vec<PathBuf>,
{
    fn candidates(&self, name: &str) -> Vec<PathBuf> {
        self(name)
    }
}

/// Which part of a file token is used for cache keys and index lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathStrategy {
    /// Strip directories and look up by base name. Tolerates build systems that
    /// print paths relative to an unknown directory.
    #[default]
    BaseName,
    /// Use the token as written (separators normalized to `/`).
    AsWritten,
}

pub(crate) struct Resolver<'a> {
    project: Option<String>,
    index: Option<Box<dyn FileIndex + 'a>>,
    strategy: PathStrategy,
    case_insensitive: bool,
    base: Option<PathBuf>,
    directories: Vec<PathBuf>,
    cache: HashMap<String, FileIdentity>,
}

impl<'a> Resolver<'a> {
    pub fn new(
        project: Option<String>,
        index: Option<Box<dyn FileIndex + 'a>>,
        strategy: PathStrategy,
        case_insensitive: bool,
        base: Option<PathBuf>,
    ) -> Self {
        Resolver { project, index, strategy, case_insensitive, base, directories: Vec::new(), cache: HashMap::new() }
    }

    pub fn working_directory(&self) -> Option<&Path> {
        self.directories.last().or(self.base.as_ref()).map(PathBuf::as_path)
    }

    pub fn push_directory(&mut self, dir: &Path) {
        let dir = match self.working_directory() {
            Some(cwd) if dir.is_relative() => cwd.join(dir),
            _ => dir.to_path_buf(),
        };
        debug!(dir = %dir.display(), "entering directory");
        self.directories.push(dir);
    }

    pub fn pop_directory(&mut self) {
        if let Some(dir) = self.directories.pop() {
            debug!(dir = %dir.display(), "leaving directory");
        }
    }

    pub fn resolve(&mut self, token: Option<&str>) -> FileIdentity {
        let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
            return match &self.project {
                Some(name) => FileIdentity::Project(name.clone()),
                None => FileIdentity::Workspace,
            };
        };

        let name = match self.strategy {
            PathStrategy::BaseName => base_name(token).to_string(),
            PathStrategy::AsWritten => token.replace('\\', "/"),
        };
        let key = if self.case_insensitive { name.to_lowercase() } else { name.clone() };

        if let Some(hit) = self.cache.get(&key) {
            debug!(token, %hit, "file cache hit");
            return hit.clone();
        }

        let identity = match self.lookup(token, &name) {
            Some(path) => FileIdentity::File(path),
            None => FileIdentity::External(self.external_path(token)),
        };
        self.cache.insert(key, identity.clone());
        identity
    }

    fn lookup(&self, token: &str, name: &str) -> Option<PathBuf> {
        let candidates = self.index.as_ref()?.candidates(name);
        if candidates.len() <= 1 {
            return candidates.into_iter().next();
        }

        let wanted = components(token);
        let cwd = self.working_directory();
        candidates
            .into_iter()
            .enumerate()
            .max_by_key(|(i, candidate)| {
                let suffix = self.common_suffix(&wanted, candidate);
                let under_cwd = cwd.is_some_and(|d| candidate.starts_with(d));
                (suffix, under_cwd, std::cmp::Reverse(*i))
            })
            .map(|(_, candidate)| candidate)
    }

    fn common_suffix(&self, wanted: &[&str], candidate: &Path) -> usize {
        let have: Vec<String> = candidate.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();
        wanted
            .iter()
            .rev()
            .zip(have.iter().rev())
            .take_while(|&(w, h)| if self.case_insensitive { w.eq_ignore_ascii_case(h) } else { *w == h.as_str() })
            .count()
    }

    fn external_path(&self, token: &str) -> PathBuf {
        let path = PathBuf::from(token);
        match self.working_directory() {
            Some(cwd) if path.is_relative() && !looks_like_drive_path(token) => cwd.join(path),
            _ => path,
        }
    }
}

/// Text after the last `/` or `\`.
pub(crate) fn base_name(token: &str) -> &str {
    token.rsplit(['/', '\\']).next().unwrap_or(token)
}

fn components(token: &str) -> Vec<&str> {
    token.split(['/', '\\']).filter(|c| !c.is_empty() && *c != ".").collect()
}

fn looks_like_drive_path(token: &str) -> bool {
    let b = token.as_bytes();
    b.len() >= 2 && b[0].is_ascii_alphabetic() && b[1] == b':'
}
