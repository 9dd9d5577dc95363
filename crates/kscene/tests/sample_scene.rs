use glam::Vec3;
use kscene::*;
use std::path::PathBuf;

fn sample_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/scene01.kscene")
}

fn sample() -> SceneDescriptor {
    load_scene(sample_path()).unwrap()
}

#[test]
fn sample_scene_metadata() {
    let scene = sample();
    assert_eq!(scene.name(), "scene01");
    assert_eq!(scene.required_version(), Version::new(1, 0, 0));
    assert_eq!(scene.metadata().required_version.to_string(), "1.0");

    let paths: Vec<_> = scene.asset_paths().iter().map(AssetPath::as_str).collect();
    assert_eq!(paths, vec!["../assets", "${PROJECT_SRC}/components/"]);
}

#[test]
fn sample_scene_entities() {
    let scene = sample();

    let names: Vec<_> = scene.iter_entities().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["dragon", "mainCamera"]);

    let dragon = scene.entity("dragon").unwrap();
    let transform = dragon.transform.as_ref().unwrap();
    assert_eq!(
        transform.rotation,
        Some(Rotation::EulerDegrees(Vec3::new(180.0, 0.0, 45.0)))
    );
    assert_eq!(dragon.mesh.as_ref().unwrap().asset, "dragon.kmesh");
    assert_eq!(dragon.material.as_ref().unwrap().asset, "dragon.kmaterial");
    assert!(dragon.camera.is_none());

    let camera_entity = scene.entity("mainCamera").unwrap();
    let camera = camera_entity.camera.as_ref().unwrap();
    assert_eq!(camera.kind, CameraKind::Perspective);
    assert_eq!(camera.fov, 60.0);
    assert_eq!(camera.near, 0.0);
    assert_eq!(camera.far, 100.0);

    let parent = camera_entity.parent().unwrap();
    assert_eq!(parent.name, "dragon");
    assert_eq!(scene.resolve_ref(parent).unwrap().name, "dragon");

    let foreign = EntityRef {
        name: "dragon".into(),
        index: 7,
    };
    assert!(scene.resolve_ref(&foreign).is_none());
    let renamed = EntityRef {
        name: "light".into(),
        index: 0,
    };
    assert!(scene.resolve_ref(&renamed).is_none());
    assert_eq!(camera_entity.look_at(), Some(parent));
    assert_eq!(
        camera_entity.module.as_ref().unwrap().asset,
        "camera_controller.kmodule"
    );

    assert_eq!(
        scene.asset_ids(),
        vec!["dragon.kmesh", "dragon.kmaterial", "camera_controller.kmodule"]
    );
    assert_eq!(
        scene.children_of("dragon").map(|e| e.name.as_str()).collect::<Vec<_>>(),
        vec!["mainCamera"]
    );
}

#[test]
fn iteration_is_restartable() {
    let scene = sample();
    let first: Vec<_> = scene.iter_entities().collect();
    let second: Vec<_> = scene.iter_entities().collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), scene.entity_count());
}

#[test]
fn loading_is_deterministic() {
    assert_eq!(sample(), sample());
}

#[test]
fn strict_near_plane_rejects_sample() {
    let config = LoaderConfig {
        strict_near_plane: true,
        ..Default::default()
    };
    let err = SceneLoader::with_config(config)
        .load_file(sample_path())
        .unwrap_err();

    assert_eq!(err.location(), Some(Location { line: 14, column: 41 }));
    assert_eq!(
        err.scene_error().and_then(SceneError::field),
        Some("camera.near")
    );
}

#[test]
fn engine_version_gates_scenes() {
    let old_engine = LoaderConfig::from_toml_str("engine_version = \"0.9\"").unwrap();
    let err = SceneLoader::with_config(old_engine)
        .load_file(sample_path())
        .unwrap_err();
    assert_eq!(
        err.scene_error().and_then(SceneError::field),
        Some("scene.version")
    );

    let new_engine = LoaderConfig::from_toml_str("engine_version = \"1.0.3\"").unwrap();
    assert!(SceneLoader::with_config(new_engine)
        .load_file(sample_path())
        .is_ok());
}

#[test]
fn missing_file_is_an_io_error() {
    let err = load_scene("does/not/exist.kscene").unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
    assert_eq!(err.location(), None);
}

#[test]
fn expanded_paths_resolve_assets() {
    let dir = tempfile::tempdir().unwrap();
    let components = dir.path().join("components");
    std::fs::create_dir_all(&components).unwrap();
    std::fs::write(components.join("camera_controller.kmodule"), b"").unwrap();

    let scene = sample();
    let mut vars = PathVars::new();
    vars.set("PROJECT_SRC", dir.path().to_string_lossy());
    let resolver = AssetResolver::new(scene.asset_paths(), &vars);

    assert_eq!(
        resolver.resolve("camera_controller.kmodule").unwrap(),
        components.join("camera_controller.kmodule")
    );
    assert!(matches!(
        resolver.resolve("dragon.kmesh"),
        Err(ResolveError::NotFound(_))
    ));
}
