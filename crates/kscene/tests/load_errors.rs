use kscene::*;

const HEADER: &str = r#"
scene.name = "errors"
scene.require_version("1.0")
"#;

fn load_err(body: &str) -> LoadError {
    load_scene_str(&format!("{HEADER}{body}")).unwrap_err()
}

fn scene_err(body: &str) -> SceneError {
    match load_err(body) {
        LoadError::Scene { source, .. } => source,
        other => panic!("expected a scene error, got: {other}"),
    }
}

#[test]
fn duplicate_entity() {
    let err = scene_err(
        r#"
        create_entity("dragon")
        create_entity("light")
        create_entity("dragon").mesh(asset="other.kmesh")
        "#,
    );
    assert_eq!(err, SceneError::DuplicateEntity("dragon".into()));
}

#[test]
fn forward_and_unknown_references() {
    let forward = r#"
        create_entity("mainCamera").transform(parent=entities['dragon'])
        create_entity("dragon")
    "#;
    assert_eq!(
        scene_err(forward),
        SceneError::UnknownEntityReference {
            entity: "mainCamera".into(),
            field: "transform.parent".into(),
            target: "dragon".into(),
        }
    );

    let unknown = r#"
        create_entity("dragon")
        create_entity("mainCamera").transform(look_at=entities["ghost"])
    "#;
    assert!(matches!(
        scene_err(unknown),
        SceneError::UnknownEntityReference { ref field, ref target, .. }
            if field == "transform.look_at" && target == "ghost"
    ));
}

#[test]
fn camera_validation() {
    for args in [
        "fov=0",
        "fov=-30",
        "far=0.05",
        "near=10, far=10",
        "near=-1",
    ] {
        let err = scene_err(&format!("create_entity('cam').camera({args})"));
        assert!(
            matches!(err, SceneError::Validation { ref field, .. } if field.starts_with("camera.")),
            "`{args}` gave {err}"
        );
    }
}

#[test]
fn duplicate_attribute() {
    let err = load_err(
        r#"create_entity("dragon")
    .material(asset="dragon.kmaterial")
    .material(asset="gold.kmaterial")"#,
    );
    assert_eq!(
        err.scene_error(),
        Some(&SceneError::DuplicateAttribute {
            entity: "dragon".into(),
            attribute: AttributeKind::Material,
        })
    );
    // HEADER adds three lines before the body
    assert_eq!(err.location(), Some(Location { line: 6, column: 6 }));
}

#[test]
fn duplicate_attribute_is_checked_before_arguments() {
    let err = scene_err("create_entity('a').module(asset='m.kmodule').module()");
    assert!(matches!(err, SceneError::DuplicateAttribute { .. }));
}

#[test]
fn positional_arguments_are_syntax_errors() {
    let err = load_err("create_entity('dragon').mesh('dragon.kmesh')");
    let LoadError::Syntax { error, .. } = err else {
        panic!("expected a syntax error");
    };
    assert!(error.message.starts_with("expected an argument name"));
}

#[test]
fn metadata_errors() {
    assert!(matches!(
        load_scene_str("scene.name = 'a'\nscene.require_version('1.x')").unwrap_err(),
        LoadError::Scene { source: SceneError::Validation { ref field, .. }, .. } if field == "scene.version"
    ));
    assert!(matches!(
        load_scene_str("scene.require_version('1.0')\ncreate_entity('a')").unwrap_err(),
        LoadError::Scene { source: SceneError::Validation { ref field, .. }, .. } if field == "scene.name"
    ));
    assert!(matches!(
        scene_err("assets.addPath('${PROJECT_SRC/components')"),
        SceneError::Validation { ref field, .. } if field == "assets.path"
    ));
}

#[test]
fn error_messages_are_user_facing() {
    let err = load_err("create_entity('cam').camera(fov=0)");
    assert_eq!(
        err.to_string(),
        "<string>:4:29: invalid `camera.fov` on entity `cam`: must be greater than 0 (got 0)"
    );
}
