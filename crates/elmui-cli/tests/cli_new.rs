use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[allow(deprecated)]
fn elm_ui_cmd() -> Command {
    Command::cargo_bin("elm-ui").unwrap()
}

#[test]
fn test_new_project() {
    let tmp = TempDir::new().unwrap();

    elm_ui_cmd()
        .current_dir(tmp.path())
        .args(["new", "my-app"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Scaffolded new project into my-app"));

    let project_dir = tmp.path().join("my-app");
    assert!(project_dir.join("elm-package.json").is_file());
    assert!(project_dir.join("elm-ui.json").is_file());
    assert!(project_dir.join("source/Main.elm").is_file());
    assert!(project_dir.join("stylesheets/main.scss").is_file());
    assert!(project_dir.join("config/development.json").is_file());
    assert!(project_dir.join("public").is_dir());
    assert!(project_dir.join(".gitignore").is_file());

    let manifest = fs::read_to_string(project_dir.join("elm-package.json")).unwrap();
    assert!(manifest.contains("gdotdesign/elm-ui"));
    assert!(manifest.contains("\"summary\": \"my-app\""));
}

#[test]
fn test_new_into_existing_directory_keeps_files() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("existing");
    fs::create_dir_all(dir.join("source")).unwrap();
    fs::write(dir.join("source/Main.elm"), "module Main exposing (main)").unwrap();

    elm_ui_cmd()
        .current_dir(tmp.path())
        .args(["new", "existing"])
        .assert()
        .success()
        .stderr(predicate::str::contains("source/Main.elm"));

    assert_eq!(
        fs::read_to_string(dir.join("source/Main.elm")).unwrap(),
        "module Main exposing (main)"
    );
    assert!(dir.join("elm-package.json").is_file());
}

#[test]
fn test_new_requires_directory() {
    elm_ui_cmd().arg("new").assert().failure();
}
