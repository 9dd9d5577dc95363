//! # kscene
//! Reader for declarative scene files. A scene file names the scene, lists asset search paths and
//! declares entities along with their attributes:
//!
//! ```text
//! scene.name = "scene01"
//! scene.require_version("1.0")
//! assets.addPath("${PROJECT_SRC}/components/")
//!
//! create_entity("dragon")
//!     .mesh(asset="dragon.kmesh", scale=1.0)
//!     .material(asset="dragon.kmaterial")
//! ```
//!
//! Loading produces a fully validated, immutable [`SceneDescriptor`]. Scenes can also be
//! assembled programmatically through the [`SceneBuilder`].

pub mod builder;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod lexer;
pub mod loader;
pub mod parser;
pub mod paths;
pub mod version;

pub use builder::{CameraArgs, EntityBuilder, MeshArgs, SceneBuilder, TransformArgs};
pub use config::{ConfigError, LoaderConfig};
pub use descriptor::*;
pub use error::{LoadError, Location, SceneError, SyntaxError};
pub use loader::{load_scene, load_scene_str, SceneLoader};
pub use paths::{AssetPath, AssetResolver, PathVars, ResolveError};
pub use version::Version;
