//! Error types produced while reading and validating scene files

use crate::descriptor::AttributeKind;
use kscene_utils::EscapeDisplay;
use std::{
    fmt::{self, Display},
    io,
    path::PathBuf,
};
use thiserror::Error;

/// 1-based position within a scene source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub const START: Location = Location { line: 1, column: 1 };
}

impl Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Semantic errors raised by the [`SceneBuilder`](crate::SceneBuilder). Any of these aborts the
/// load, no partial scene is ever returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    /// A field has a malformed or contradictory value.
    #[error("invalid `{field}`{}: {reason}", OnEntity(.entity))]
    Validation {
        /// Entity being declared, if the field belongs to one
        entity: Option<String>,
        /// Dotted field path, such as `camera.fov` or `scene.version`
        field: String,
        reason: String,
    },
    #[error("entity `{}` is already declared", EscapeDisplay(.0))]
    DuplicateEntity(String),
    #[error("entity `{}` already has a {attribute} attribute", EscapeDisplay(.entity))]
    DuplicateAttribute {
        entity: String,
        attribute: AttributeKind,
    },
    /// A `parent`/`look_at` reference names an entity that isn't declared before the referrer.
    #[error(
        "`{field}` of entity `{}` refers to `{}`, which isn't declared before it",
        EscapeDisplay(.entity),
        EscapeDisplay(.target)
    )]
    UnknownEntityReference {
        entity: String,
        field: String,
        target: String,
    },
}

impl SceneError {
    pub(crate) fn validation(field: impl Into<String>, reason: impl Display) -> Self {
        Self::Validation {
            entity: None,
            field: field.into(),
            reason: reason.to_string(),
        }
    }

    /// Attaches the entity name to a validation error that doesn't have one yet.
    pub(crate) fn on_entity(self, name: &str) -> Self {
        match self {
            Self::Validation {
                entity: None,
                field,
                reason,
            } => Self::Validation {
                entity: Some(name.to_string()),
                field,
                reason,
            },
            other => other,
        }
    }

    /// Returns the offending field path of a validation error.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } | Self::UnknownEntityReference { field, .. } => {
                Some(field)
            }
            _ => None,
        }
    }
}

struct OnEntity<'a>(&'a Option<String>);

impl Display for OnEntity<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(name) => write!(f, " on entity `{}`", EscapeDisplay(name)),
            None => Ok(()),
        }
    }
}

/// Malformed scene source text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SyntaxError {
    pub message: String,
    pub location: Location,
}

impl SyntaxError {
    pub(crate) fn new(location: Location, message: impl Display) -> Self {
        Self {
            message: message.to_string(),
            location,
        }
    }
}

/// Error returned by the scene loader. The display output is meant to be surfaced to the user
/// verbatim.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("couldn't read `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{origin}:{}: {error}", .error.location)]
    Syntax { origin: String, error: SyntaxError },
    #[error("{origin}:{location}: {source}")]
    Scene {
        origin: String,
        location: Location,
        #[source]
        source: SceneError,
    },
}

impl LoadError {
    /// Returns the semantic error, if this is one.
    pub fn scene_error(&self) -> Option<&SceneError> {
        match self {
            Self::Scene { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Returns where in the source the error was detected.
    pub fn location(&self) -> Option<Location> {
        match self {
            Self::Io { .. } => None,
            Self::Syntax { error, .. } => Some(error.location),
            Self::Scene { location, .. } => Some(*location),
        }
    }
}
