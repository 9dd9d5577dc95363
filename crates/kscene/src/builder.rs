use crate::{
    config::LoaderConfig,
    descriptor::*,
    error::SceneError,
    paths::AssetPath,
    version::Version,
};
use ahash::AHashMap;
use glam::{Quat, Vec3};
use kscene_utils::{ok, EscapeDisplay};
use log::*;

/// Arguments of [`EntityBuilder::transform`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformArgs {
    pub position: Option<Vec3>,
    pub rotation: Option<Rotation>,
    /// Name of the parent entity
    pub parent: Option<String>,
    /// Name of the entity to look at
    pub look_at: Option<String>,
}

/// Arguments of [`EntityBuilder::mesh`].
#[derive(Debug, Clone, PartialEq)]
pub struct MeshArgs {
    pub asset: String,
    pub origin: Option<Vec3>,
    pub scale: Option<f32>,
}

impl MeshArgs {
    pub fn new(asset: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
            origin: None,
            scale: None,
        }
    }
}

/// Arguments of [`EntityBuilder::camera`]. Omitted values use the [`Camera`] defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CameraArgs {
    pub kind: Option<CameraKind>,
    pub fov: Option<f32>,
    pub near: Option<f32>,
    pub far: Option<f32>,
}

/// Builds a [`SceneDescriptor`] one declaration at a time, validating every declaration as it
/// comes in. The first error aborts the build.
///
/// ## Example
/// ```
/// use kscene::{CameraArgs, SceneBuilder, TransformArgs};
///
/// let mut builder = SceneBuilder::new();
/// builder.set_scene_metadata("scene01", "1.0")?;
/// builder.add_asset_path("../assets")?;
/// builder.create_entity("dragon")?.material("dragon.kmaterial")?;
/// builder
///     .create_entity("mainCamera")?
///     .camera(CameraArgs::default())?
///     .transform(TransformArgs {
///         parent: Some("dragon".into()),
///         ..Default::default()
///     })?;
///
/// let scene = builder.finish()?;
/// assert_eq!(scene.entity_count(), 2);
/// # Ok::<(), kscene::SceneError>(())
/// ```
#[derive(Debug, Default)]
pub struct SceneBuilder {
    name: Option<String>,
    required_version: Option<Version>,
    asset_paths: Vec<AssetPath>,
    entities: Vec<EntityDescriptor>,
    names: AHashMap<String, usize>,

    engine_version: Option<Version>,
    strict_near_plane: bool,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &LoaderConfig) -> Self {
        Self {
            engine_version: config.engine_version,
            strict_near_plane: config.strict_near_plane,
            ..Self::default()
        }
    }

    pub fn set_scene_name(&mut self, name: impl Into<String>) -> Result<(), SceneError> {
        let name = name.into();
        self.check_name(&name)?;
        debug!("Scene name: `{}`", EscapeDisplay(&name));
        self.name = Some(name);
        ok()
    }

    /// Records the minimum engine version required by the scene.
    pub fn require_version(&mut self, version: &str) -> Result<(), SceneError> {
        let version = self.check_version(version)?;
        debug!("Scene requires engine version {version}");
        self.required_version = Some(version);
        ok()
    }

    /// Sets both the scene name and its required version. Fails without changing anything if
    /// either was already set.
    pub fn set_scene_metadata(
        &mut self,
        name: impl Into<String>,
        version: &str,
    ) -> Result<(), SceneError> {
        let name = name.into();
        self.check_name(&name)?;
        let version = self.check_version(version)?;
        self.name = Some(name);
        self.required_version = Some(version);
        ok()
    }

    /// Appends an asset search path. Placeholders are kept as they are and nothing is checked on
    /// disk.
    pub fn add_asset_path(&mut self, path: impl Into<String>) -> Result<(), SceneError> {
        let path = AssetPath::parse(path).map_err(|err| SceneError::validation("assets.path", err))?;
        debug!("Asset search path #{}: `{path}`", self.asset_paths.len());
        self.asset_paths.push(path);
        ok()
    }

    /// Declares a new entity and returns a builder for setting its attributes.
    pub fn create_entity(&mut self, name: impl Into<String>) -> Result<EntityBuilder<'_>, SceneError> {
        let name = name.into();
        if name.is_empty() {
            return Err(SceneError::validation("create_entity.name", "can't be empty"));
        }
        if self.names.contains_key(&name) {
            return Err(SceneError::DuplicateEntity(name));
        }

        let index = self.entities.len();
        debug!("Entity #{index}: `{}`", EscapeDisplay(&name));
        self.names.insert(name.clone(), index);
        self.entities.push(EntityDescriptor::new(name));

        Ok(EntityBuilder { scene: self, index })
    }

    /// Reopens an already declared entity. References set on it can still only point at entities
    /// declared before it.
    pub fn entity(&mut self, name: &str) -> Option<EntityBuilder<'_>> {
        let index = *self.names.get(name)?;
        Some(EntityBuilder { scene: self, index })
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Checks that all required fields are present and produces the finished scene.
    pub fn finish(self) -> Result<SceneDescriptor, SceneError> {
        let Some(name) = self.name else {
            return Err(SceneError::validation("scene.name", "is required"));
        };
        let Some(required_version) = self.required_version else {
            return Err(SceneError::validation("scene.version", "is required"));
        };

        Ok(SceneDescriptor {
            metadata: SceneMetadata {
                name,
                required_version,
            },
            asset_paths: self.asset_paths,
            entities: self.entities,
            names: self.names,
        })
    }

    fn check_name(&self, name: &str) -> Result<(), SceneError> {
        if self.name.is_some() {
            return Err(SceneError::validation("scene.name", "is already set"));
        }
        if name.is_empty() {
            return Err(SceneError::validation("scene.name", "can't be empty"));
        }
        ok()
    }

    fn check_version(&self, version: &str) -> Result<Version, SceneError> {
        if self.required_version.is_some() {
            return Err(SceneError::validation("scene.version", "is already set"));
        }

        let parsed: Version = version.parse().map_err(|err| {
            SceneError::validation(
                "scene.version",
                format_args!("`{}` isn't a dotted version ({err})", EscapeDisplay(version)),
            )
        })?;

        if let Some(engine) = self.engine_version {
            if !engine.satisfies(&parsed) {
                return Err(SceneError::validation(
                    "scene.version",
                    format_args!("scene requires engine version {parsed}, but the engine is {engine}"),
                ));
            }
        }

        Ok(parsed)
    }
}

/// Sets attributes of one entity. Obtained from [`SceneBuilder::create_entity`].
///
/// All setters validate their arguments and can be chained with `?`.
#[derive(Debug)]
pub struct EntityBuilder<'a> {
    scene: &'a mut SceneBuilder,
    index: usize,
}

impl<'a> EntityBuilder<'a> {
    pub fn name(&self) -> &str {
        &self.scene.entities[self.index].name
    }

    pub fn descriptor(&self) -> &EntityDescriptor {
        &self.scene.entities[self.index]
    }

    fn descriptor_mut(&mut self) -> &mut EntityDescriptor {
        &mut self.scene.entities[self.index]
    }

    pub fn transform(&mut self, args: TransformArgs) -> Result<&mut Self, SceneError> {
        self.check_unset(AttributeKind::Transform)?;
        let transform = self.build_transform(args).map_err(|e| e.on_entity(self.name()))?;
        self.descriptor_mut().transform = Some(transform);
        Ok(self)
    }

    pub fn mesh(&mut self, args: MeshArgs) -> Result<&mut Self, SceneError> {
        self.check_unset(AttributeKind::Mesh)?;
        let mesh = build_mesh(args).map_err(|e| e.on_entity(self.name()))?;
        self.descriptor_mut().mesh = Some(mesh);
        Ok(self)
    }

    pub fn material(&mut self, asset: impl Into<String>) -> Result<&mut Self, SceneError> {
        self.check_unset(AttributeKind::Material)?;
        let asset = check_asset("material.asset", asset.into()).map_err(|e| e.on_entity(self.name()))?;
        self.descriptor_mut().material = Some(Material { asset });
        Ok(self)
    }

    pub fn camera(&mut self, args: CameraArgs) -> Result<&mut Self, SceneError> {
        self.check_unset(AttributeKind::Camera)?;
        let camera = self.build_camera(args).map_err(|e| e.on_entity(self.name()))?;
        self.descriptor_mut().camera = Some(camera);
        Ok(self)
    }

    pub fn module(&mut self, asset: impl Into<String>) -> Result<&mut Self, SceneError> {
        self.check_unset(AttributeKind::Module)?;
        let asset = check_asset("module.asset", asset.into()).map_err(|e| e.on_entity(self.name()))?;
        self.descriptor_mut().module = Some(ModuleAttachment { asset });
        Ok(self)
    }

    fn check_unset(&self, attribute: AttributeKind) -> Result<(), SceneError> {
        if self.descriptor().has_attribute(attribute) {
            return Err(SceneError::DuplicateAttribute {
                entity: self.name().to_string(),
                attribute,
            });
        }
        ok()
    }

    /// Looks up an entity declared before this one.
    fn resolve(&self, field: &str, target: &str) -> Result<EntityRef, SceneError> {
        if target == self.name() {
            return Err(SceneError::validation(field, "an entity can't refer to itself"));
        }

        // Reopened entities can see later declarations in the map, those don't count
        match self.scene.names.get(target) {
            Some(&index) if index < self.index => Ok(EntityRef {
                name: target.to_string(),
                index,
            }),
            _ => Err(SceneError::UnknownEntityReference {
                entity: self.name().to_string(),
                field: field.to_string(),
                target: target.to_string(),
            }),
        }
    }

    fn build_transform(&self, args: TransformArgs) -> Result<Transform, SceneError> {
        let position = args.position.unwrap_or(Vec3::ZERO);
        check_finite("transform.pos", position)?;

        let rotation = match args.rotation {
            Some(Rotation::EulerDegrees(degrees)) => {
                check_finite("transform.rot_degrees", degrees)?;
                Some(Rotation::EulerDegrees(degrees))
            }
            Some(Rotation::Quaternion(q)) => Some(Rotation::Quaternion(check_quat(q)?)),
            None => None,
        };

        let parent = args
            .parent
            .map(|name| self.resolve("transform.parent", &name))
            .transpose()?;
        let look_at = args
            .look_at
            .map(|name| self.resolve("transform.look_at", &name))
            .transpose()?;

        if look_at.is_some() && rotation.is_some() {
            return Err(SceneError::validation(
                "transform.look_at",
                "can't be combined with an explicit rotation",
            ));
        }

        Ok(Transform {
            position,
            rotation,
            parent,
            look_at,
        })
    }

    fn build_camera(&self, args: CameraArgs) -> Result<Camera, SceneError> {
        let kind = args.kind.unwrap_or_default();
        let fov = args.fov.unwrap_or(Camera::DEFAULT_FOV);
        let near = args.near.unwrap_or(Camera::DEFAULT_NEAR);
        let far = args.far.unwrap_or(Camera::DEFAULT_FAR);

        if !(fov.is_finite() && fov > 0.0) {
            return Err(SceneError::validation(
                "camera.fov",
                format_args!("must be greater than 0 (got {fov})"),
            ));
        }
        if kind == CameraKind::Perspective && fov >= 180.0 {
            return Err(SceneError::validation(
                "camera.fov",
                format_args!("must be less than 180 degrees for a perspective camera (got {fov})"),
            ));
        }
        if !(near.is_finite() && near >= 0.0) {
            return Err(SceneError::validation(
                "camera.near",
                format_args!("must not be negative (got {near})"),
            ));
        }
        if !(far.is_finite() && far > near) {
            return Err(SceneError::validation(
                "camera.far",
                format_args!("must be greater than `near` ({near}, got {far})"),
            ));
        }

        if kind == CameraKind::Perspective && near == 0.0 {
            if self.scene.strict_near_plane {
                return Err(SceneError::validation(
                    "camera.near",
                    "must be greater than 0 for a perspective camera",
                ));
            }
            warn!(
                "Perspective camera on entity `{}` has its near plane at 0",
                EscapeDisplay(self.name())
            );
        }

        Ok(Camera {
            kind,
            fov,
            near,
            far,
        })
    }
}

fn build_mesh(args: MeshArgs) -> Result<Mesh, SceneError> {
    let asset = check_asset("mesh.asset", args.asset)?;
    let origin = args.origin.unwrap_or(Vec3::ZERO);
    check_finite("mesh.origin", origin)?;

    let scale = args.scale.unwrap_or(1.0);
    if !(scale.is_finite() && scale > 0.0) {
        return Err(SceneError::validation(
            "mesh.scale",
            format_args!("must be greater than 0 (got {scale})"),
        ));
    }

    Ok(Mesh {
        asset,
        origin,
        scale,
    })
}

fn check_asset(field: &str, asset: String) -> Result<String, SceneError> {
    if asset.trim().is_empty() {
        return Err(SceneError::validation(field, "asset id can't be empty"));
    }
    Ok(asset)
}

fn check_finite(field: &str, v: Vec3) -> Result<(), SceneError> {
    if !v.is_finite() {
        return Err(SceneError::validation(
            field,
            format_args!("components must be finite (got {v})"),
        ));
    }
    ok()
}

fn check_quat(q: Quat) -> Result<Quat, SceneError> {
    if !q.is_finite() || q.length_squared() < 1e-12 {
        return Err(SceneError::validation(
            "transform.rot_quat",
            "must be a finite, non-zero quaternion",
        ));
    }
    Ok(q.normalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder_with_dragon() -> SceneBuilder {
        let mut builder = SceneBuilder::new();
        builder.set_scene_metadata("scene01", "1.0").unwrap();
        builder.create_entity("dragon").unwrap();
        builder
    }

    #[test]
    fn metadata_can_only_be_set_once() {
        let mut builder = SceneBuilder::new();
        builder.set_scene_metadata("scene01", "1.0").unwrap();

        let err = builder.set_scene_metadata("scene02", "2.0").unwrap_err();
        assert_eq!(err.field(), Some("scene.name"));
        let err = builder.require_version("2.0").unwrap_err();
        assert_eq!(err.field(), Some("scene.version"));

        let scene = builder.finish().unwrap();
        assert_eq!(scene.name(), "scene01");
        assert_eq!(scene.required_version(), Version::new(1, 0, 0));
    }

    #[test]
    fn metadata_is_atomic_on_bad_version() {
        let mut builder = SceneBuilder::new();
        let err = builder.set_scene_metadata("scene01", "one.zero").unwrap_err();
        assert!(matches!(err, SceneError::Validation { ref field, .. } if field == "scene.version"));

        // Nothing was recorded, so setting it again works
        builder.set_scene_metadata("scene01", "1.0").unwrap();
    }

    #[test]
    fn missing_metadata_fails_on_finish() {
        let mut builder = SceneBuilder::new();
        builder.require_version("1.0").unwrap();
        assert_eq!(builder.finish().unwrap_err().field(), Some("scene.name"));

        let mut builder = SceneBuilder::new();
        builder.set_scene_name("scene01").unwrap();
        assert_eq!(builder.finish().unwrap_err().field(), Some("scene.version"));
    }

    #[test]
    fn engine_version_is_enforced() {
        let config = LoaderConfig {
            engine_version: Some(Version::new(1, 4, 0)),
            ..Default::default()
        };
        let mut builder = SceneBuilder::with_config(&config);
        assert!(builder.require_version("1.5").is_err());
        builder.require_version("1.4").unwrap();
    }

    #[test]
    fn duplicate_entities_are_rejected() {
        let mut builder = builder_with_dragon();
        assert_eq!(
            builder.create_entity("dragon").unwrap_err(),
            SceneError::DuplicateEntity("dragon".into())
        );
        assert_eq!(builder.entity_count(), 1);
    }

    #[test]
    fn attributes_can_only_be_set_once() {
        let mut builder = builder_with_dragon();
        let mut dragon = builder.entity("dragon").unwrap();
        dragon.material("dragon.kmaterial").unwrap();
        assert_eq!(
            dragon.material("other.kmaterial").unwrap_err(),
            SceneError::DuplicateAttribute {
                entity: "dragon".into(),
                attribute: AttributeKind::Material,
            }
        );
        assert_eq!(
            dragon.descriptor().material.as_ref().unwrap().asset,
            "dragon.kmaterial"
        );
    }

    #[test]
    fn references_must_point_backwards() {
        let mut builder = builder_with_dragon();

        let err = builder
            .create_entity("camera")
            .unwrap()
            .transform(TransformArgs {
                parent: Some("light".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(
            err,
            SceneError::UnknownEntityReference {
                entity: "camera".into(),
                field: "transform.parent".into(),
                target: "light".into(),
            }
        );

        let mut light = builder.create_entity("light").unwrap();
        light
            .transform(TransformArgs {
                look_at: Some("dragon".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(
            light.descriptor().look_at(),
            Some(&EntityRef {
                name: "dragon".into(),
                index: 0,
            })
        );
    }

    #[test]
    fn reopened_entities_cant_refer_forward() {
        let mut builder = builder_with_dragon();
        builder.create_entity("cam").unwrap();

        let err = builder
            .entity("dragon")
            .unwrap()
            .transform(TransformArgs {
                parent: Some("cam".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(
            err,
            SceneError::UnknownEntityReference {
                entity: "dragon".into(),
                field: "transform.parent".into(),
                target: "cam".into(),
            }
        );

        // The backwards direction is still fine, so no cycle can form
        builder
            .entity("cam")
            .unwrap()
            .transform(TransformArgs {
                parent: Some("dragon".into()),
                ..Default::default()
            })
            .unwrap();
        let scene = builder.finish().unwrap();
        assert!(scene.entity("dragon").unwrap().parent().is_none());
        assert_eq!(scene.entity("cam").unwrap().parent().unwrap().index, 0);
    }

    #[test]
    fn self_references_are_rejected() {
        let mut builder = builder_with_dragon();
        let err = builder
            .entity("dragon")
            .unwrap()
            .transform(TransformArgs {
                parent: Some("dragon".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.field(), Some("transform.parent"));
    }

    #[test]
    fn look_at_excludes_rotation() {
        let mut builder = builder_with_dragon();
        let err = builder
            .create_entity("cam")
            .unwrap()
            .transform(TransformArgs {
                rotation: Some(Rotation::EulerDegrees(Vec3::new(0.0, 90.0, 0.0))),
                look_at: Some("dragon".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.field(), Some("transform.look_at"));
    }

    #[test]
    fn quaternions_are_normalized() {
        let mut builder = builder_with_dragon();
        let mut dragon = builder.entity("dragon").unwrap();
        dragon
            .transform(TransformArgs {
                rotation: Some(Rotation::Quaternion(Quat::from_xyzw(0.0, 0.0, 0.0, 2.0))),
                ..Default::default()
            })
            .unwrap();
        let transform = dragon.descriptor().transform.clone().unwrap();
        assert_eq!(transform.rotation, Some(Rotation::Quaternion(Quat::IDENTITY)));

        let mut other = builder.create_entity("other").unwrap();
        let err = other
            .transform(TransformArgs {
                rotation: Some(Rotation::Quaternion(Quat::from_xyzw(0.0, 0.0, 0.0, 0.0))),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.field(), Some("transform.rot_quat"));
    }

    #[test]
    fn camera_ranges() {
        let bad = [
            (Some(0.0), None, None, "camera.fov"),
            (Some(-10.0), None, None, "camera.fov"),
            (Some(180.0), None, None, "camera.fov"),
            (None, Some(-1.0), None, "camera.near"),
            (None, Some(10.0), Some(10.0), "camera.far"),
            (None, Some(10.0), Some(5.0), "camera.far"),
        ];

        for (i, (fov, near, far, field)) in bad.into_iter().enumerate() {
            let mut builder = SceneBuilder::new();
            let err = builder
                .create_entity(format!("cam{i}"))
                .unwrap()
                .camera(CameraArgs {
                    kind: None,
                    fov,
                    near,
                    far,
                })
                .unwrap_err();
            assert_eq!(err.field(), Some(field), "case #{i}");
        }

        // Orthographic cameras have no upper bound on their extent
        let mut builder = SceneBuilder::new();
        builder
            .create_entity("ortho")
            .unwrap()
            .camera(CameraArgs {
                kind: Some(CameraKind::Orthographic),
                fov: Some(250.0),
                ..Default::default()
            })
            .unwrap();
    }

    #[test]
    fn zero_near_plane_depends_on_strictness() {
        let args = CameraArgs {
            near: Some(0.0),
            ..Default::default()
        };

        let mut lenient = SceneBuilder::new();
        let mut cam = lenient.create_entity("cam").unwrap();
        cam.camera(args.clone()).unwrap();
        assert_eq!(cam.descriptor().camera.as_ref().unwrap().near, 0.0);

        let config = LoaderConfig {
            strict_near_plane: true,
            ..Default::default()
        };
        let mut strict = SceneBuilder::with_config(&config);
        let err = strict.create_entity("cam").unwrap().camera(args).unwrap_err();
        assert_eq!(err.field(), Some("camera.near"));
    }

    #[test]
    fn mesh_validation() {
        let mut builder = SceneBuilder::new();
        let mut e = builder.create_entity("e").unwrap();
        assert_eq!(
            e.mesh(MeshArgs::new("")).unwrap_err().field(),
            Some("mesh.asset")
        );
        assert_eq!(
            e.mesh(MeshArgs {
                scale: Some(0.0),
                ..MeshArgs::new("dragon.kmesh")
            })
            .unwrap_err()
            .field(),
            Some("mesh.scale")
        );

        // Failed setters don't count as set
        e.mesh(MeshArgs::new("dragon.kmesh")).unwrap();
        let mesh = e.descriptor().mesh.clone().unwrap();
        assert_eq!(mesh.scale, 1.0);
        assert_eq!(mesh.origin, Vec3::ZERO);
    }

    #[test]
    fn asset_paths_keep_placeholders() {
        let mut builder = SceneBuilder::new();
        builder.add_asset_path("../assets").unwrap();
        builder.add_asset_path("${PROJECT_SRC}/components/").unwrap();
        assert_eq!(
            builder.add_asset_path("${PROJECT_SRC").unwrap_err().field(),
            Some("assets.path")
        );
        builder.set_scene_metadata("s", "1").unwrap();

        let scene = builder.finish().unwrap();
        let paths: Vec<_> = scene.asset_paths().iter().map(AssetPath::as_str).collect();
        assert_eq!(paths, vec!["../assets", "${PROJECT_SRC}/components/"]);
    }
}
