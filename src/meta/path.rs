//! Absolute, slash separated entry paths.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized absolute path of an entry. `/` is the root.
///
/// A single trailing slash is stripped on construction (except for the root
/// itself), so `/a/b/` and `/a/b` name the same entry.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FullPath(String);

impl FullPath {
    pub const ROOT: &'static str = "/";

    pub fn new(p: impl Into<String>) -> Self {
        let mut p = p.into();
        if p.len() > 1 && p.ends_with('/') {
            p.pop();
        }
        Self(p)
    }

    pub fn root() -> Self {
        Self(Self::ROOT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == Self::ROOT
    }

    /// Ancestor directories of this path, shallowest first, paired with their
    /// 1-based level in the walk.
    ///
    /// `/a/b/c` yields `(1, "/")`, `(2, "/a")`, `(3, "/a/b")`. A path with no
    /// separator yields nothing.
    pub fn ancestors(&self) -> Vec<(usize, FullPath)> {
        let parts: Vec<&str> = self.0.split('/').collect();
        (1..parts.len())
            .map(|i| {
                let joined = parts[..i]
                    .iter()
                    .filter(|s| !s.is_empty())
                    .copied()
                    .collect::<Vec<_>>()
                    .join("/");
                (i, FullPath(format!("/{joined}")))
            })
            .collect()
    }

    /// Split into parent directory and basename.
    pub fn dir_and_name(&self) -> (FullPath, &str) {
        match self.0.rfind('/') {
            Some(0) => (Self::root(), &self.0[1..]),
            Some(n) => (FullPath(self.0[..n].to_string()), &self.0[n + 1..]),
            None => (Self::root(), self.0.as_str()),
        }
    }

    pub fn name(&self) -> &str {
        self.dir_and_name().1
    }

    pub fn child(&self, name: &str) -> FullPath {
        if self.is_root() {
            FullPath(format!("/{name}"))
        } else {
            FullPath(format!("{}/{name}", self.0))
        }
    }
}

impl fmt::Display for FullPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FullPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for FullPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for FullPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
