//! Scene file loading
//!
//! Glues the parser to the [`SceneBuilder`]: every statement is applied as soon as it's parsed
//! out, and the first error aborts the whole load.

use crate::{
    builder::{CameraArgs, EntityBuilder, MeshArgs, SceneBuilder, TransformArgs},
    config::LoaderConfig,
    descriptor::{AttributeKind, CameraKind, Rotation, SceneDescriptor},
    error::{LoadError, Location, SceneError},
    parser::{Argument, Call, Parser, Statement, StatementKind, Value},
};
use glam::{Quat, Vec3};
use kscene_proc::Keyword;
use kscene_utils::{ok, KeywordParseError, OneOf};
use log::*;
use std::{fmt::Display, fs, path::Path};

/// Origin reported for sources that don't come from a file.
pub const STRING_ORIGIN: &str = "<string>";

/// A scene error along with where it was detected.
type Located<T> = Result<T, (Location, SceneError)>;

#[derive(Debug, Clone, Default)]
pub struct SceneLoader {
    config: LoaderConfig,
}

impl SceneLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Reads and loads a scene file. Errors are reported relative to the file path.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<SceneDescriptor, LoadError> {
        let path = path.as_ref();
        let src = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_str(&path.display().to_string(), &src)
    }

    /// Loads a scene from source text. `origin` only shows up in error messages and logs.
    pub fn load_str(&self, origin: &str, src: &str) -> Result<SceneDescriptor, LoadError> {
        let statements = Parser::parse(src).map_err(|error| LoadError::Syntax {
            origin: origin.to_string(),
            error,
        })?;

        let scene_error = |(location, source): (Location, SceneError)| LoadError::Scene {
            origin: origin.to_string(),
            location,
            source,
        };

        let mut builder = SceneBuilder::with_config(&self.config);
        for statement in statements {
            apply_statement(&mut builder, statement).map_err(scene_error)?;
        }

        let scene = builder
            .finish()
            .map_err(|err| scene_error((end_location(src), err)))?;

        info!(
            "Loaded scene `{}` from {origin} ({} entities, {} asset paths)",
            scene.name(),
            scene.entity_count(),
            scene.asset_paths().len()
        );

        Ok(scene)
    }
}

/// Loads a scene file with the default configuration.
pub fn load_scene(path: impl AsRef<Path>) -> Result<SceneDescriptor, LoadError> {
    SceneLoader::new().load_file(path)
}

/// Loads scene source text with the default configuration.
///
/// ## Example
/// ```
/// let scene = kscene::load_scene_str(
///     r#"
///     scene.name = "demo"
///     scene.require_version("1.0")
///     create_entity("dragon").mesh(asset="dragon.kmesh")
///     "#,
/// )?;
/// assert_eq!(scene.name(), "demo");
/// assert_eq!(scene.entity("dragon").unwrap().mesh.as_ref().unwrap().scale, 1.0);
/// # Ok::<(), kscene::LoadError>(())
/// ```
pub fn load_scene_str(src: &str) -> Result<SceneDescriptor, LoadError> {
    SceneLoader::new().load_str(STRING_ORIGIN, src)
}

fn apply_statement(builder: &mut SceneBuilder, statement: Statement) -> Located<()> {
    let location = statement.location;
    let at = |err| (location, err);

    match statement.kind {
        StatementKind::SceneName(name) => builder.set_scene_name(name).map_err(at),
        StatementKind::RequireVersion(version) => builder.require_version(&version).map_err(at),
        StatementKind::AddAssetPath(path) => builder.add_asset_path(path).map_err(at),
        StatementKind::CreateEntity { name, calls } => {
            let mut entity = builder.create_entity(name).map_err(at)?;
            for call in &calls {
                apply_call(&mut entity, call)
                    .map_err(|(location, err)| (location, err.on_entity(entity.name())))?;
            }
            ok()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Keyword)]
enum TransformArg {
    #[keyword("pos", "position")]
    Position,
    RotDegrees,
    #[keyword("rot_quat", "rotation")]
    RotQuat,
    Parent,
    LookAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Keyword)]
enum MeshArg {
    Asset,
    Origin,
    Scale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Keyword)]
enum CameraArg {
    #[keyword("type")]
    Kind,
    Fov,
    Near,
    Far,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Keyword)]
enum AssetArg {
    Asset,
}

fn apply_call(entity: &mut EntityBuilder<'_>, call: &Call) -> Located<()> {
    let attribute = call.attribute;
    if entity.descriptor().has_attribute(attribute) {
        return Err((
            call.location,
            SceneError::DuplicateAttribute {
                entity: entity.name().to_string(),
                attribute,
            },
        ));
    }

    let result = match attribute {
        AttributeKind::Transform => {
            let mut args = TransformArgs::default();
            for (key, arg) in call_args::<TransformArg>(call)? {
                let field = field_name(attribute, key);
                match key {
                    TransformArg::Position => args.position = Some(expect_vec3(&field, arg)?),
                    TransformArg::RotDegrees | TransformArg::RotQuat => {
                        if args.rotation.is_some() {
                            return Err((
                                arg.location,
                                SceneError::validation(
                                    field,
                                    "only one of `rot_degrees` and `rot_quat` can be given",
                                ),
                            ));
                        }
                        args.rotation = Some(if key == TransformArg::RotDegrees {
                            Rotation::EulerDegrees(expect_vec3(&field, arg)?)
                        } else {
                            Rotation::Quaternion(Quat::from_array(expect_tuple(&field, arg)?))
                        });
                    }
                    TransformArg::Parent => args.parent = Some(expect_entity(&field, arg)?),
                    TransformArg::LookAt => args.look_at = Some(expect_entity(&field, arg)?),
                }
            }
            entity.transform(args).map(drop)
        }
        AttributeKind::Mesh => {
            let mut asset = None;
            let mut args = MeshArgs::new("");
            for (key, arg) in call_args::<MeshArg>(call)? {
                let field = field_name(attribute, key);
                match key {
                    MeshArg::Asset => asset = Some(expect_str(&field, arg)?),
                    MeshArg::Origin => args.origin = Some(expect_vec3(&field, arg)?),
                    MeshArg::Scale => args.scale = Some(expect_number(&field, arg)?),
                }
            }
            args.asset = required_asset(call, asset)?;
            entity.mesh(args).map(drop)
        }
        AttributeKind::Material => {
            let asset = asset_only(call)?;
            entity.material(asset).map(drop)
        }
        AttributeKind::Module => {
            let asset = asset_only(call)?;
            entity.module(asset).map(drop)
        }
        AttributeKind::Camera => {
            let mut args = CameraArgs::default();
            for (key, arg) in call_args::<CameraArg>(call)? {
                let field = field_name(attribute, key);
                match key {
                    CameraArg::Kind => {
                        let kind = expect_str(&field, arg)?;
                        let kind = CameraKind::try_from(kind.as_str())
                            .map_err(|err| (arg.location, SceneError::validation(&field, err)))?;
                        args.kind = Some(kind);
                    }
                    CameraArg::Fov => args.fov = Some(expect_number(&field, arg)?),
                    CameraArg::Near => args.near = Some(expect_number(&field, arg)?),
                    CameraArg::Far => args.far = Some(expect_number(&field, arg)?),
                }
            }
            entity.camera(args).map(drop)
        }
    };

    result.map_err(|err| (locate(call, &err), err))
}

/// Points at the argument an error is about, or at the whole call if there's no such argument.
fn locate(call: &Call, err: &SceneError) -> Location {
    let Some(field) = err.field() else {
        return call.location;
    };
    call.args
        .iter()
        .find(|arg| {
            canonical_argument(call.attribute, &arg.name)
                .map_or(false, |name| field_name(call.attribute, name) == field)
        })
        .map_or(call.location, |arg| arg.location)
}

/// Spelling of an argument name used in field paths, with aliases folded into it.
fn canonical_argument(attribute: AttributeKind, name: &str) -> Option<&'static str> {
    match attribute {
        AttributeKind::Transform => TransformArg::try_from(name).ok().map(|k| k.as_str()),
        AttributeKind::Mesh => MeshArg::try_from(name).ok().map(|k| k.as_str()),
        AttributeKind::Camera => CameraArg::try_from(name).ok().map(|k| k.as_str()),
        AttributeKind::Material | AttributeKind::Module => {
            AssetArg::try_from(name).ok().map(|k| k.as_str())
        }
    }
}

fn field_name(attribute: AttributeKind, argument: impl Display) -> String {
    format!("{attribute}.{argument}")
}

/// Matches argument names against the keywords of `K`, rejecting unknown and repeated ones.
/// Aliases of the same argument count as repeats.
fn call_args<K>(call: &Call) -> Located<Vec<(K, &Argument)>>
where
    K: for<'s> TryFrom<&'s str, Error = KeywordParseError> + Copy + PartialEq + Display,
{
    let mut result: Vec<(K, &Argument)> = Vec::with_capacity(call.args.len());
    for arg in &call.args {
        let key = K::try_from(arg.name.as_str()).map_err(|err: KeywordParseError| {
            (
                arg.location,
                SceneError::validation(
                    field_name(call.attribute, &arg.name),
                    format_args!("unknown argument, expected {}", OneOf(err.expected)),
                ),
            )
        })?;

        if result.iter().any(|(other, _)| *other == key) {
            return Err((
                arg.location,
                SceneError::validation(
                    field_name(call.attribute, key),
                    "argument is given more than once",
                ),
            ));
        }
        result.push((key, arg));
    }
    Ok(result)
}

/// Reads the single `asset` argument of `material` and `module`.
fn asset_only(call: &Call) -> Located<String> {
    let mut asset = None;
    for (key, arg) in call_args::<AssetArg>(call)? {
        match key {
            AssetArg::Asset => asset = Some(expect_str(&field_name(call.attribute, key), arg)?),
        }
    }
    required_asset(call, asset)
}

fn required_asset(call: &Call, asset: Option<String>) -> Located<String> {
    asset.ok_or_else(|| {
        (
            call.location,
            SceneError::validation(field_name(call.attribute, "asset"), "is required"),
        )
    })
}

fn mismatch(field: &str, arg: &Argument, expected: &str) -> (Location, SceneError) {
    (
        arg.location,
        SceneError::validation(
            field,
            format_args!("expected {expected}, found {}", arg.value.type_name()),
        ),
    )
}

fn expect_str(field: &str, arg: &Argument) -> Located<String> {
    match &arg.value {
        Value::Str(s) => Ok(s.clone()),
        _ => Err(mismatch(field, arg, "a string")),
    }
}

fn expect_number(field: &str, arg: &Argument) -> Located<f32> {
    match arg.value {
        Value::Number(n) => Ok(n),
        _ => Err(mismatch(field, arg, "a number")),
    }
}

fn expect_tuple<const N: usize>(field: &str, arg: &Argument) -> Located<[f32; N]> {
    match &arg.value {
        Value::Tuple(values) => <[f32; N]>::try_from(values.as_slice()).map_err(|_| {
            (
                arg.location,
                SceneError::validation(
                    field,
                    format_args!("expected {N} components, found {}", values.len()),
                ),
            )
        }),
        _ => Err(mismatch(field, arg, "a tuple")),
    }
}

fn expect_vec3(field: &str, arg: &Argument) -> Located<Vec3> {
    expect_tuple(field, arg).map(Vec3::from_array)
}

/// Entity references can be written as `entities['name']` or as a plain string.
fn expect_entity(field: &str, arg: &Argument) -> Located<String> {
    match &arg.value {
        Value::EntityRef(name) | Value::Str(name) => Ok(name.clone()),
        _ => Err(mismatch(field, arg, "an entity reference")),
    }
}

/// Location just past the last character of `src`.
fn end_location(src: &str) -> Location {
    src.chars().fold(Location::START, |loc, c| {
        if c == '\n' {
            Location {
                line: loc.line + 1,
                column: 1,
            }
        } else {
            Location {
                line: loc.line,
                column: loc.column + 1,
            }
        }
    })
}
