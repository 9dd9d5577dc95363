use clap::{Args, ValueEnum};
use itertools::Itertools;
use kscene::{EntityDescriptor, LoaderConfig, Rotation, SceneDescriptor, SceneLoader};
use kscene_utils::{ok, AnyResult, AnyhowResultExt};
use std::{
    fmt::{self, Write},
    path::PathBuf,
};

#[derive(Args)]
pub struct DumpCommand {
    /// Scene file to print
    pub file: PathBuf,
    /// Output format
    #[arg(long, value_enum, default_value_t = DumpFormat::Text)]
    pub format: DumpFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DumpFormat {
    /// Human readable summary
    Text,
    /// Machine readable TOML document
    Toml,
}

impl crate::Command for DumpCommand {
    fn run(self, config: &LoaderConfig) -> AnyResult {
        let scene = SceneLoader::with_config(config.clone()).load_file(&self.file)?;
        let output = match self.format {
            DumpFormat::Text => render_text(&scene)?,
            DumpFormat::Toml => toml::to_string_pretty(&scene).otherwise("couldn't serialize scene")?,
        };
        print!("{output}");
        ok()
    }
}

pub fn render_text(scene: &SceneDescriptor) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(
        out,
        "scene `{}` (requires engine {})",
        scene.name(),
        scene.required_version()
    )?;

    writeln!(out, "asset paths:")?;
    for path in scene.asset_paths() {
        writeln!(out, "  {path}")?;
    }

    writeln!(out, "entities:")?;
    for (index, entity) in scene.iter_entities().enumerate() {
        writeln!(out, "  #{index} {}", entity.name)?;
        render_entity(&mut out, entity)?;
    }

    Ok(out)
}

fn render_entity(out: &mut String, entity: &EntityDescriptor) -> fmt::Result {
    if let Some(transform) = &entity.transform {
        let mut parts = vec![format!("pos {}", transform.position)];
        match transform.rotation {
            Some(Rotation::EulerDegrees(degrees)) => parts.push(format!("rot_degrees {degrees}")),
            Some(Rotation::Quaternion(q)) => parts.push(format!("rot_quat {q}")),
            None => (),
        }
        if let Some(parent) = &transform.parent {
            parts.push(format!("parent `{}`", parent.name));
        }
        if let Some(target) = &transform.look_at {
            parts.push(format!("look_at `{}`", target.name));
        }
        writeln!(out, "    transform: {}", parts.iter().join(", "))?;
    }
    if let Some(mesh) = &entity.mesh {
        writeln!(
            out,
            "    mesh: {} (origin {}, scale {})",
            mesh.asset, mesh.origin, mesh.scale
        )?;
    }
    if let Some(material) = &entity.material {
        writeln!(out, "    material: {}", material.asset)?;
    }
    if let Some(camera) = &entity.camera {
        writeln!(
            out,
            "    camera: {} (fov {}, near {}, far {})",
            camera.kind, camera.fov, camera.near, camera.far
        )?;
    }
    if let Some(module) = &entity.module {
        writeln!(out, "    module: {}", module.asset)?;
    }
    Ok(())
}
