//! CLI integration tests
//!
//! Runs the `langpack` binary against a temporary project and checks exit
//! codes, output and the files written.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const CONFIG: &str = r#"
[project]
name = "Rainbow"
homepage = "rainbowco.de"
"#;

/// Get the path to the langpack binary.
fn langpack_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_langpack"))
}

fn write(root: &Path, name: &str, content: &str) {
    let path = root.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn create_project() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write(root, "langpack.toml", CONFIG);
    write(root, "package.json", "{\n  \"name\": \"rainbow-code\",\n  \"version\": \"2.1.0\"\n}\n");
    write(root, "src/rainbow.js", "/* engine */\nvar Rainbow = {};\n");
    write(root, "src/language/generic.js", "Rainbow.generic = 1;\n");
    write(root, "src/language/python.js", "Rainbow.python = 1;\n");
    write(root, "src/language/go.js", "Rainbow.go = 1;\n");
    write(root, "src/language/css.js", "Rainbow.css = 1;\n");
    temp
}

/// Run langpack in `dir` with the given arguments.
fn run_langpack(dir: &Path, args: &[&str]) -> Output {
    Command::new(langpack_binary())
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to execute langpack")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ============================================================================
// pack
// ============================================================================

#[test]
fn test_pack_writes_development_artifact() {
    let temp = create_project();
    let output = run_langpack(temp.path(), &["pack"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).starts_with("Built rainbow.js (standard, "));

    let text = fs::read_to_string(temp.path().join("dist/rainbow.js")).unwrap();
    assert!(text.starts_with("(function (root) {\n/* engine */\n"));
    assert!(text.contains("sourceMappingURL=data:application/json"));
}

#[test]
fn test_pack_release_without_sourcemaps() {
    let temp = create_project();
    let output = run_langpack(temp.path(), &["pack", "--release", "--sourcemaps=0"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = fs::read_to_string(temp.path().join("dist/rainbow.min.js")).unwrap();
    assert_eq!(
        text,
        "(function (root) {\nvar Rainbow = {};\n\
         if (typeof Rainbow !== 'undefined') { root.Rainbow = Rainbow; }\n\
         }(typeof globalThis !== 'undefined' ? globalThis : this));\n"
    );
    assert!(!temp.path().join("dist/rainbow.js").exists());
}

#[test]
fn test_pack_ignores_languages() {
    let temp = create_project();
    let output = run_langpack(temp.path(), &["pack", "--languages=python"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = fs::read_to_string(temp.path().join("dist/rainbow.js")).unwrap();
    assert!(!text.contains("Rainbow.python"));
}

#[test]
fn test_pack_dry_run() {
    let temp = create_project();
    let output = run_langpack(temp.path(), &["pack", "--dry-run", "--custom"]);

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Dry run - would pack:"));
    assert!(out.contains("rainbow-custom.min.js (minified-custom)"));
    assert!(!temp.path().join("dist").exists());
}

#[test]
fn test_pack_out_override() {
    let temp = create_project();
    let output = run_langpack(temp.path(), &["pack", "--out", "build"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(temp.path().join("build/rainbow.js").is_file());
}

// ============================================================================
// build
// ============================================================================

#[test]
fn test_build_custom_bundle() {
    let temp = create_project();
    let output = run_langpack(temp.path(), &["build", "--languages=python,go"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("with 3 modules [generic, python, go]"));

    let text = fs::read_to_string(temp.path().join("dist/rainbow-custom.min.js")).unwrap();
    assert!(text.starts_with(
        "/* Rainbow v2.1.0 rainbowco.de | included languages: generic, go, python */\n"
    ));
    assert!(text.ends_with("Rainbow.generic = 1;\nRainbow.python = 1;\nRainbow.go = 1;\n"));
    assert!(!text.contains("Rainbow.css"));
}

#[test]
fn test_build_defaults_to_all_languages() {
    let temp = create_project();
    let output = run_langpack(temp.path(), &["build", "--version", "v9.0.0"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = fs::read_to_string(temp.path().join("dist/rainbow-custom.min.js")).unwrap();
    assert!(text.starts_with(
        "/* Rainbow v9.0.0 rainbowco.de | included languages: css, generic, go, python */\n"
    ));
}

#[test]
fn test_build_reads_version_file_override() {
    let temp = create_project();
    write(temp.path(), "VERSION", "3.4.5\n");
    let output = run_langpack(temp.path(), &["build", "--languages=css", "--version-file", "VERSION"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = fs::read_to_string(temp.path().join("dist/rainbow-custom.min.js")).unwrap();
    assert!(text.starts_with("/* Rainbow v3.4.5 rainbowco.de | included languages: css */\n"));
}

#[test]
fn test_build_leaves_no_scratch_files() {
    let temp = create_project();
    let output = run_langpack(temp.path(), &["build", "--languages=all"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let leftovers: Vec<_> = fs::read_dir(temp.path().join("src/language"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with('.'))
        .collect();
    assert!(leftovers.is_empty(), "leftover files: {:?}", leftovers);
}

#[test]
fn test_build_unknown_language_fails() {
    let temp = create_project();
    let output = run_langpack(temp.path(), &["build", "--languages=python,cobol"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("unknown module requested: 'cobol'"));
    assert!(!temp.path().join("dist").exists());
}

#[test]
fn test_build_empty_languages_is_invalid() {
    let temp = create_project();
    let output = run_langpack(temp.path(), &["build", "--languages=,"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("--languages"));
}

#[test]
fn test_build_dry_run() {
    let temp = create_project();
    let output = run_langpack(temp.path(), &["build", "--dry-run", "--languages=go"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("modules: [generic, go]"));
    assert!(!temp.path().join("dist").exists());
}

#[test]
fn test_invalid_flag_values_are_usage_errors() {
    let temp = create_project();

    let output = run_langpack(temp.path(), &["pack", "--sourcemaps=maybe"]);
    assert_eq!(output.status.code(), Some(2));

    let output = run_langpack(temp.path(), &["pack", "--version=2.1"]);
    assert_eq!(output.status.code(), Some(2));

    let output = run_langpack(temp.path(), &["release", "--type=huge"]);
    assert_eq!(output.status.code(), Some(2));
}

// ============================================================================
// modules, clean
// ============================================================================

#[test]
fn test_modules_lists_registry() {
    let temp = create_project();
    let output = run_langpack(temp.path(), &["modules"]);

    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "generic (base)\ncss\ngo (needs generic)\npython (needs generic)\n"
    );
}

#[test]
fn test_modules_shows_load_order() {
    let temp = create_project();
    let output = run_langpack(temp.path(), &["modules", "--languages=go,css"]);

    assert!(output.status.success());
    assert_eq!(stdout(&output), "generic\ngo\ncss\n");
}

#[test]
fn test_clean_removes_output() {
    let temp = create_project();
    assert!(run_langpack(temp.path(), &["pack"]).status.success());
    assert!(temp.path().join("dist").exists());

    let output = run_langpack(temp.path(), &["clean"]);
    assert!(output.status.success());
    assert!(!temp.path().join("dist").exists());

    let output = run_langpack(temp.path(), &["clean"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Nothing to clean"));
}

// ============================================================================
// release, config
// ============================================================================

#[test]
fn test_release_dry_run() {
    let temp = create_project();
    let output = run_langpack(temp.path(), &["release", "--dry-run", "--type", "feature"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.starts_with("Would release 2.1.0 -> 2.2.0 (minor) as "));
    assert!(out.trim_end().ends_with("and tag 2.2.0"));

    let package = fs::read_to_string(temp.path().join("package.json")).unwrap();
    assert!(package.contains("\"version\": \"2.1.0\""));
}

#[test]
fn test_config_from_subdirectory() {
    let temp = create_project();
    let nested = temp.path().join("src/language");
    let output = run_langpack(&nested, &["pack"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(temp.path().join("dist/rainbow.js").is_file());
}

#[test]
fn test_explicit_config_path() {
    let temp = create_project();
    let elsewhere = TempDir::new().unwrap();
    let config = temp.path().join("langpack.toml");

    let output = run_langpack(elsewhere.path(), &["pack", "--config", config.to_str().unwrap()]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(temp.path().join("dist/rainbow.js").is_file());
    assert!(!elsewhere.path().join("dist").exists());
}

#[test]
fn test_invalid_config_is_reported() {
    let temp = create_project();
    write(temp.path(), "langpack.toml", "[project]\nname = \"\"\n");

    let output = run_langpack(temp.path(), &["pack"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("project.name"));
}
