//! # Scene descriptors
//! The read-only result of loading a scene file. A [`SceneDescriptor`] is handed to the engine,
//! which instantiates its runtime entities from the [`EntityDescriptor`]s. Nothing in here owns
//! any runtime state.

use crate::{paths::AssetPath, version::Version};
use ahash::AHashMap;
use glam::{EulerRot, Quat, Vec3};
use kscene_proc::Keyword;
use serde::{Serialize, Serializer};

/// Name and minimum engine version of a scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneMetadata {
    pub name: String,
    pub required_version: Version,
}

/// Attribute slots of an entity. Each one can be set at most once per entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Keyword)]
pub enum AttributeKind {
    Transform,
    Mesh,
    Material,
    Camera,
    Module,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Keyword)]
pub enum CameraKind {
    #[default]
    Perspective,
    Orthographic,
}

impl Serialize for CameraKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Non-owning reference to another entity of the same scene.
///
/// References can only point backwards, so `index` is always lower than the index of the entity
/// holding the reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub name: String,
    pub index: usize,
}

impl Serialize for EntityRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    /// Euler angles in degrees, applied in X, Y, Z order.
    EulerDegrees(Vec3),
    /// Unit quaternion.
    Quaternion(Quat),
}

impl Rotation {
    pub fn to_quat(self) -> Quat {
        match self {
            Rotation::EulerDegrees(degrees) => Quat::from_euler(
                EulerRot::XYZ,
                degrees.x.to_radians(),
                degrees.y.to_radians(),
                degrees.z.to_radians(),
            ),
            Rotation::Quaternion(q) => q,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transform {
    pub position: Vec3,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Rotation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<EntityRef>,
    /// Entity to orient towards. Never set together with `rotation`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub look_at: Option<EntityRef>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: None,
            parent: None,
            look_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mesh {
    pub asset: String,
    pub origin: Vec3,
    pub scale: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Material {
    pub asset: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Camera {
    #[serde(rename = "type")]
    pub kind: CameraKind,
    /// Field of view, in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub const DEFAULT_FOV: f32 = 60.0;
    pub const DEFAULT_NEAR: f32 = 0.1;
    pub const DEFAULT_FAR: f32 = 1000.0;
}

/// Scripted module attached to an entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleAttachment {
    pub asset: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityDescriptor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesh: Option<Mesh>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<Material>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<Camera>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<ModuleAttachment>,
}

impl EntityDescriptor {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            transform: None,
            mesh: None,
            material: None,
            camera: None,
            module: None,
        }
    }

    pub fn has_attribute(&self, kind: AttributeKind) -> bool {
        match kind {
            AttributeKind::Transform => self.transform.is_some(),
            AttributeKind::Mesh => self.mesh.is_some(),
            AttributeKind::Material => self.material.is_some(),
            AttributeKind::Camera => self.camera.is_some(),
            AttributeKind::Module => self.module.is_some(),
        }
    }

    /// Attributes set on this entity, in [`AttributeKind`] declaration order.
    pub fn attributes(&self) -> impl Iterator<Item = AttributeKind> + '_ {
        [
            AttributeKind::Transform,
            AttributeKind::Mesh,
            AttributeKind::Material,
            AttributeKind::Camera,
            AttributeKind::Module,
        ]
        .into_iter()
        .filter(|&kind| self.has_attribute(kind))
    }

    /// Asset identifiers referenced by this entity's mesh, material and module.
    pub fn asset_ids(&self) -> impl Iterator<Item = &str> + '_ {
        let mesh = self.mesh.as_ref().map(|m| m.asset.as_str());
        let material = self.material.as_ref().map(|m| m.asset.as_str());
        let module = self.module.as_ref().map(|m| m.asset.as_str());
        [mesh, material, module].into_iter().flatten()
    }

    pub fn parent(&self) -> Option<&EntityRef> {
        self.transform.as_ref()?.parent.as_ref()
    }

    pub fn look_at(&self) -> Option<&EntityRef> {
        self.transform.as_ref()?.look_at.as_ref()
    }
}

/// A fully validated scene. Created by [`SceneBuilder::finish`](crate::SceneBuilder::finish) and
/// immutable from then on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneDescriptor {
    #[serde(rename = "scene")]
    pub(crate) metadata: SceneMetadata,
    pub(crate) asset_paths: Vec<AssetPath>,
    pub(crate) entities: Vec<EntityDescriptor>,
    #[serde(skip)]
    pub(crate) names: AHashMap<String, usize>,
}

impl SceneDescriptor {
    pub fn metadata(&self) -> &SceneMetadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn required_version(&self) -> Version {
        self.metadata.required_version
    }

    /// Asset search paths, in the order they were added.
    pub fn asset_paths(&self) -> &[AssetPath] {
        &self.asset_paths
    }

    /// Iterates through entities in declaration order. Every call starts a fresh iteration.
    pub fn iter_entities(&self) -> std::slice::Iter<'_, EntityDescriptor> {
        self.entities.iter()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entity(&self, name: &str) -> Option<&EntityDescriptor> {
        self.names.get(name).map(|&index| &self.entities[index])
    }

    /// Declaration index of the named entity.
    pub fn entity_index(&self, name: &str) -> Option<usize> {
        self.names.get(name).copied()
    }

    /// Follows an entity reference. Returns `None` if the reference doesn't belong to this scene.
    pub fn resolve_ref(&self, reference: &EntityRef) -> Option<&EntityDescriptor> {
        self.entities
            .get(reference.index)
            .filter(|entity| entity.name == reference.name)
    }

    /// Every referenced asset identifier, deduplicated, in order of first use.
    pub fn asset_ids(&self) -> Vec<&str> {
        use itertools::Itertools;
        self.entities
            .iter()
            .flat_map(EntityDescriptor::asset_ids)
            .unique()
            .collect()
    }

    /// Direct children of the named entity, in declaration order.
    pub fn children_of<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a EntityDescriptor> + 'a {
        self.entities
            .iter()
            .filter(move |entity| entity.parent().map_or(false, |p| p.name == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_round_trip() {
        assert_eq!(CameraKind::try_from("perspective"), Ok(CameraKind::Perspective));
        assert_eq!(
            "orthographic".parse::<CameraKind>(),
            Ok(CameraKind::Orthographic)
        );
        assert!("fisheye".parse::<CameraKind>().is_err());
        assert_eq!(AttributeKind::Module.to_string(), "module");
        assert_eq!(
            AttributeKind::KEYWORDS,
            &["transform", "mesh", "material", "camera", "module"]
        );
    }

    #[test]
    fn euler_rotation_converts_to_quaternion() {
        let q = Rotation::EulerDegrees(Vec3::new(0.0, 0.0, 90.0)).to_quat();
        let rotated = q * Vec3::X;
        assert!(rotated.abs_diff_eq(Vec3::Y, 1e-5));
    }

    #[test]
    fn entity_attribute_listing() {
        let mut entity = EntityDescriptor::new("dragon".into());
        entity.mesh = Some(Mesh {
            asset: "dragon.kmesh".into(),
            origin: Vec3::ZERO,
            scale: 1.0,
        });
        entity.material = Some(Material {
            asset: "dragon.kmaterial".into(),
        });

        assert_eq!(
            entity.attributes().collect::<Vec<_>>(),
            vec![AttributeKind::Mesh, AttributeKind::Material]
        );
        assert_eq!(
            entity.asset_ids().collect::<Vec<_>>(),
            vec!["dragon.kmesh", "dragon.kmaterial"]
        );
        assert!(entity.parent().is_none());
    }
}
