use anyhow::bail;
use clap::Args;
use kscene::{AssetResolver, LoaderConfig, PathVars, ResolveError, SceneLoader};
use kscene_utils::{ok, AnyResult};
use log::*;
use std::path::PathBuf;

#[derive(Args)]
pub struct ResolveCommand {
    /// Scene file whose assets should be looked up
    pub file: PathBuf,
    /// Sets a path variable, overriding the environment and the config file
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,
    /// Also take path variables from the process environment
    #[arg(long)]
    pub env: bool,
}

fn parse_var(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, _)) if name.is_empty() => Err("variable name can't be empty".into()),
        Some((name, value)) => Ok((name.to_string(), value.to_string())),
        None => Err(format!("expected `NAME=VALUE`, got `{s}`")),
    }
}

impl ResolveCommand {
    /// Config file variables, then the environment, then `--var` flags, later ones winning.
    fn path_vars(&self, config: &LoaderConfig) -> PathVars {
        let mut vars = config.path_vars();
        if self.env {
            vars.extend_from(&PathVars::from_env());
        }
        for (name, value) in &self.vars {
            vars.set(name.as_str(), value.as_str());
        }
        vars
    }
}

impl crate::Command for ResolveCommand {
    fn run(self, config: &LoaderConfig) -> AnyResult {
        let scene = SceneLoader::with_config(config.clone()).load_file(&self.file)?;
        let vars = self.path_vars(config);
        let resolver = AssetResolver::new(scene.asset_paths(), &vars);

        println!("search paths:");
        for (path, root) in scene.asset_paths().iter().zip(resolver.roots()) {
            if path.has_placeholders() {
                println!("  {path} -> {}", root.display());
            } else {
                println!("  {path}");
            }
        }

        let ids = scene.asset_ids();
        let mut missing = 0;
        println!("assets:");
        for id in &ids {
            match resolver.resolve_unique(id) {
                Ok(path) => println!("  {id}: {}", path.display()),
                Err(ResolveError::NotFound(_)) => {
                    println!("  {id}: missing");
                    missing += 1;
                }
                Err(ResolveError::Ambiguous { candidates, .. }) => {
                    warn!("Asset `{id}` exists in more than one search path");
                    println!("  {id}: {} (ambiguous)", candidates[0].display());
                    for other in &candidates[1..] {
                        println!("    also {}", other.display());
                    }
                }
            }
        }

        if missing != 0 {
            bail!("{missing} of {} assets couldn't be found", ids.len());
        }
        ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Command;
    use std::fs;

    #[test]
    fn var_flags() {
        assert_eq!(parse_var("A=b=c"), Ok(("A".into(), "b=c".into())));
        assert_eq!(parse_var("A="), Ok(("A".into(), "".into())));
        assert!(parse_var("=x").is_err());
        assert!(parse_var("PROJECT_SRC").is_err());
    }

    #[test]
    fn flags_override_config() {
        let config = LoaderConfig::from_toml_str("[path_vars]\nROOT = '/config'\nOTHER = 'x'").unwrap();
        let command = ResolveCommand {
            file: PathBuf::new(),
            vars: vec![("ROOT".into(), "/flag".into())],
            env: false,
        };
        let vars = command.path_vars(&config);
        assert_eq!(vars.get("ROOT"), Some("/flag"));
        assert_eq!(vars.get("OTHER"), Some("x"));
    }

    #[test]
    fn resolve_scene_assets() {
        let dir = tempfile::tempdir().unwrap();
        let assets = dir.path().join("assets");
        fs::create_dir_all(&assets).unwrap();
        fs::write(assets.join("dragon.kmesh"), b"").unwrap();

        let scene = dir.path().join("scene.kscene");
        fs::write(
            &scene,
            "scene.name = 's'\n\
             scene.require_version('1.0')\n\
             assets.addPath('${ROOT}/assets')\n\
             create_entity('dragon').mesh(asset='dragon.kmesh')",
        )
        .unwrap();

        let root = dir.path().to_string_lossy().into_owned();
        let found = ResolveCommand {
            file: scene.clone(),
            vars: vec![("ROOT".into(), root)],
            env: false,
        };
        assert!(found.run(&LoaderConfig::default()).is_ok());

        // Without ROOT the path expands to `/assets`
        let missing = ResolveCommand {
            file: scene,
            vars: vec![],
            env: false,
        };
        let err = missing.run(&LoaderConfig::default()).unwrap_err();
        assert_eq!(err.to_string(), "1 of 1 assets couldn't be found");
    }
}
