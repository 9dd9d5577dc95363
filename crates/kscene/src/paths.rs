//! Asset search paths
//!
//! Search paths are recorded verbatim while a scene loads. They may contain `${NAME}`
//! placeholders which are only substituted when a consumer expands them against a set of
//! [`PathVars`]. Looking assets up on disk is left to the consumer as well; [`AssetResolver`] is a
//! small helper for doing that the way the engine's file system does.

use ahash::AHashMap;
use log::*;
use serde::{Serialize, Serializer};
use std::{
    ffi::OsString,
    fmt::{self, Display},
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceholderError {
    #[error("path is empty")]
    EmptyPath,
    #[error("placeholder at byte {0} is missing its closing `}}`")]
    Unterminated(usize),
    #[error("placeholder at byte {0} has no name")]
    EmptyName(usize),
    #[error("placeholder name `{0}` may only contain letters, digits and underscores")]
    InvalidName(String),
}

/// A piece of a search path, either literal text or a placeholder name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSegment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

/// A single asset search path, as written in the scene file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetPath {
    raw: String,
}

impl AssetPath {
    /// Validates the placeholder syntax of `raw`. Nothing is checked on disk.
    pub fn parse(raw: impl Into<String>) -> Result<Self, PlaceholderError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(PlaceholderError::EmptyPath);
        }
        for segment in Segments::new(&raw) {
            segment?;
        }
        Ok(Self { raw })
    }

    /// The path as written, placeholders included.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> impl Iterator<Item = PathSegment<'_>> + '_ {
        // Validated in `parse`
        Segments::new(&self.raw).filter_map(Result::ok)
    }

    /// Names of every placeholder used in this path, in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> + '_ {
        self.segments().filter_map(|segment| match segment {
            PathSegment::Placeholder(name) => Some(name),
            PathSegment::Literal(_) => None,
        })
    }

    pub fn has_placeholders(&self) -> bool {
        self.placeholders().next().is_some()
    }

    /// Substitutes every placeholder with its value from `vars`. Variables that aren't set expand
    /// to an empty string.
    pub fn expand(&self, vars: &PathVars) -> PathBuf {
        let mut result = String::with_capacity(self.raw.len());
        for segment in self.segments() {
            match segment {
                PathSegment::Literal(text) => result.push_str(text),
                PathSegment::Placeholder(name) => match vars.get(name) {
                    Some(value) => result.push_str(value),
                    None => warn!(
                        "Path variable `{name}` isn't set, expanding `{self}` with an empty value"
                    ),
                },
            }
        }
        PathBuf::from(result)
    }
}

impl Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for AssetPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

struct Segments<'a> {
    source: &'a str,
    offset: usize,
}

impl<'a> Segments<'a> {
    fn new(source: &'a str) -> Self {
        Self { source, offset: 0 }
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Result<PathSegment<'a>, PlaceholderError>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.source[self.offset..];
        if rest.is_empty() {
            return None;
        }

        let start = self.offset;
        if let Some(after_open) = rest.strip_prefix("${") {
            // Stop iterating after an error
            self.offset = self.source.len();

            let Some(len) = after_open.find('}') else {
                return Some(Err(PlaceholderError::Unterminated(start)));
            };
            let name = &after_open[..len];
            if name.is_empty() {
                return Some(Err(PlaceholderError::EmptyName(start)));
            }
            if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Some(Err(PlaceholderError::InvalidName(name.to_string())));
            }

            self.offset = start + 2 + len + 1;
            Some(Ok(PathSegment::Placeholder(name)))
        } else {
            // A `$` at the very start that isn't a placeholder is plain text
            let len = rest
                .char_indices()
                .skip(1)
                .find(|&(i, _)| rest[i..].starts_with("${"))
                .map_or(rest.len(), |(i, _)| i);
            self.offset += len;
            Some(Ok(PathSegment::Literal(&rest[..len])))
        }
    }
}

/// Values substituted for placeholders in asset paths. A variable that was never set behaves as
/// if it was set to an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathVars {
    vars: AHashMap<String, String>,
}

impl PathVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures every variable of the current process environment. Variables whose name or value
    /// isn't valid Unicode are skipped.
    pub fn from_env() -> Self {
        Self::from_os_vars(std::env::vars_os())
    }

    fn from_os_vars(vars: impl IntoIterator<Item = (OsString, OsString)>) -> Self {
        vars.into_iter()
            .filter_map(|(name, value)| match (name.into_string(), value.into_string()) {
                (Ok(name), Ok(value)) => Some((name, value)),
                (name, _) => {
                    let name = name.unwrap_or_else(|name| name.to_string_lossy().into_owned());
                    warn!("Skipping environment variable `{name}`, it isn't valid Unicode");
                    None
                }
            })
            .collect()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.vars.remove(name)
    }

    /// Copies every variable from `other` into `self`, replacing existing values.
    pub fn extend_from(&mut self, other: &PathVars) {
        self.vars
            .extend(other.vars.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathVars {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("asset `{0}` doesn't exist in any search path")]
    NotFound(String),
    #[error("asset `{id}` is ambiguous, found in {} search paths", .candidates.len())]
    Ambiguous { id: String, candidates: Vec<PathBuf> },
}

/// Looks asset identifiers up in a list of expanded search paths.
#[derive(Debug, Clone)]
pub struct AssetResolver {
    roots: Vec<PathBuf>,
}

impl AssetResolver {
    pub fn new<'a>(paths: impl IntoIterator<Item = &'a AssetPath>, vars: &PathVars) -> Self {
        Self {
            roots: paths.into_iter().map(|path| path.expand(vars)).collect(),
        }
    }

    /// Expanded search roots, in search order.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Every file matching `id`, in search order.
    pub fn resolve_all(&self, id: &str) -> Vec<PathBuf> {
        self.roots
            .iter()
            .map(|root| root.join(id))
            .filter(|candidate| candidate.is_file())
            .collect()
    }

    /// Returns the first match of `id` in search order.
    pub fn resolve(&self, id: &str) -> Result<PathBuf, ResolveError> {
        self.roots
            .iter()
            .map(|root| root.join(id))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| ResolveError::NotFound(id.to_string()))
    }

    /// Like [`AssetResolver::resolve`], but fails if more than one search path contains `id`.
    pub fn resolve_unique(&self, id: &str) -> Result<PathBuf, ResolveError> {
        let mut candidates = self.resolve_all(id);
        match candidates.len() {
            0 => Err(ResolveError::NotFound(id.to_string())),
            1 => Ok(candidates.remove(0)),
            _ => Err(ResolveError::Ambiguous {
                id: id.to_string(),
                candidates,
            }),
        }
    }

    /// Checks whether `path` lies within one of the search roots.
    pub fn contains(&self, path: &Path) -> bool {
        self.roots.iter().any(|root| path.starts_with(root))
    }
}
