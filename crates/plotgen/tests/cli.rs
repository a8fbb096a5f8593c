//! End-to-end tests of the `plotgen` binary.

use assert_cmd::Command;
use std::path::Path;

const FIXTURE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../plotgen-typegen/tests/fixtures/plot-schema.json"
);

/// Runs in `dir` so no stray `plotgen.toml` is picked up.
fn plotgen(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("plotgen").unwrap();
    cmd.current_dir(dir);
    cmd
}

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn generate_all_targets() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("gen");

    let output = plotgen(dir.path())
        .args(["generate", "--input", FIXTURE, "--out-dir"])
        .arg(&out)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));

    for name in [
        "bar_gen.rs",
        "histogram_gen.rs",
        "scatter_gen.rs",
        "layout_gen.rs",
        "config_gen.rs",
        "decode_gen.rs",
    ] {
        let source = std::fs::read_to_string(out.join(name)).unwrap();
        assert!(source.starts_with("// Code generated by plotgen. DO NOT EDIT."));
    }
    assert!(stderr(&output).contains("Generated"));
}

#[test]
fn generate_selected_targets_with_config() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("plotgen.toml"),
        format!(
            "schema = {:?}\nout_dir = \"bindings\"\ngenerator = \"plotgen-ci\"\n",
            FIXTURE
        ),
    )
    .unwrap();

    let output = plotgen(dir.path())
        .args(["generate", "scatter", "decoder"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));

    let bindings = dir.path().join("bindings");
    let mut names: Vec<_> = std::fs::read_dir(&bindings)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["decode_gen.rs", "scatter_gen.rs"]);

    let scatter = std::fs::read_to_string(bindings.join("scatter_gen.rs")).unwrap();
    assert!(scatter.starts_with("// Code generated by plotgen-ci. DO NOT EDIT."));
}

#[test]
fn unknown_trace_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("gen");

    let output = plotgen(dir.path())
        .args(["generate", "pie", "--input", FIXTURE, "--out-dir"])
        .arg(&out)
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("unknown attribute `traces.pie`"));
    assert!(!out.join("pie_gen.rs").exists());
}

#[test]
fn missing_schema_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let output = plotgen(dir.path()).arg("generate").output().unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("no schema given"));
}

#[test]
fn list_targets() {
    let dir = tempfile::tempdir().unwrap();
    let output = plotgen(dir.path())
        .args(["list", "-i", FIXTURE])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "bar\nhistogram\nscatter\nlayout\nconfig\ndecoder\n"
    );
}

#[test]
fn ir_is_json() {
    let dir = tempfile::tempdir().unwrap();
    let output = plotgen(dir.path())
        .args(["ir", "config", "--input", FIXTURE])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));

    let ir: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(ir["kind"], "config");
    assert_eq!(ir["file"]["main"]["name"], "Config");
}

#[test]
fn backends_lists_rust() {
    let dir = tempfile::tempdir().unwrap();
    let output = plotgen(dir.path()).arg("backends").output().unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains("rust\trust\t.rs"));
}

#[test]
fn unknown_backend_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let output = plotgen(dir.path())
        .args(["generate", "--input", FIXTURE, "--backend", "cobol"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("unknown backend `cobol`"));
}

#[test]
fn schema_flag_prints_config_schema() {
    let dir = tempfile::tempdir().unwrap();
    let output = plotgen(dir.path()).arg("--schema").output().unwrap();
    assert!(output.status.success());

    let response: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(response["config_path"], "plotgen.toml");
    assert_eq!(response["format"], "toml");
    assert!(response["schema"]["properties"]["out_dir"].is_object());
}
