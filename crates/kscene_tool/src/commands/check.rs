use anyhow::bail;
use clap::Args;
use kscene::{LoaderConfig, SceneLoader};
use kscene_utils::{ok, AnyResult};
use std::path::PathBuf;

#[derive(Args)]
pub struct CheckCommand {
    /// Scene files to check
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

impl crate::Command for CheckCommand {
    fn run(self, config: &LoaderConfig) -> AnyResult {
        let loader = SceneLoader::with_config(config.clone());

        let mut failed = 0;
        for path in &self.files {
            match loader.load_file(path) {
                Ok(scene) => println!(
                    "{}: ok ({} entities)",
                    path.display(),
                    scene.entity_count()
                ),
                Err(err) => {
                    println!("{err}");
                    failed += 1;
                }
            }
        }

        if failed != 0 {
            bail!("{failed} of {} scene files failed to load", self.files.len());
        }
        ok()
    }
}
