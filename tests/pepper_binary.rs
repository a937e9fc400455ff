//! Integration tests for the `pepper` binary executable.
//!
//! Drives the compiled binary directly rather than calling into the library,
//! so these exercise the actual CLI contract (argument handling, exit codes,
//! stdout) from spec.md §6.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

fn find_pepper_binary() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

    let candidates = [
        manifest_dir.join("target/release/pepper"),
        manifest_dir.join("target/debug/pepper"),
    ];

    for candidate in &candidates {
        if candidate.exists() {
            return candidate.clone();
        }
    }

    panic!(
        "pepper binary not found. Build it first:\n  cargo build\nTried:\n{}",
        candidates
            .iter()
            .map(|p| format!("  - {}", p.display()))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

fn demos_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos")
}

#[test]
fn test_binary_exists_and_is_executable() {
    let binary = find_pepper_binary();
    assert!(binary.exists(), "binary not found at: {}", binary.display());

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let metadata = fs::metadata(&binary).expect("failed to stat binary");
        assert!(metadata.permissions().mode() & 0o111 != 0, "binary is not executable");
    }
}

#[test]
fn test_version_flag_exits_zero_and_prints_banner() {
    let binary = find_pepper_binary();
    let output = Command::new(&binary)
        .arg("--version")
        .output()
        .expect("failed to execute binary");

    assert!(output.status.success(), "--version should exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Pepper"), "banner missing from: {}", stdout);
}

#[test]
fn test_unrecognized_multi_arg_invocation_fails() {
    let binary = find_pepper_binary();
    let output = Command::new(&binary)
        .arg("one")
        .arg("two")
        .output()
        .expect("failed to execute binary");

    assert!(!output.status.success(), "more than one argument should be rejected");
}

#[test]
fn test_recursive_function_script_succeeds() {
    let binary = find_pepper_binary();
    let script = demos_dir().join("fibonacci.pepper");
    assert!(script.exists(), "missing demo script: {}", script.display());

    let output = Command::new(&binary).arg(&script).output().expect("failed to execute binary");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success(), "fibonacci.pepper failed:\nSTDOUT:\n{}\nSTDERR:\n{}", stdout, stderr);
    assert_eq!(stdout.trim(), "55");
}

#[test]
fn test_closures_script_independent_captures() {
    let binary = find_pepper_binary();
    let script = demos_dir().join("closures.pepper");

    let output = Command::new(&binary).arg(&script).output().expect("failed to execute binary");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "closures.pepper failed:\n{}", stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["6", "11", "7"], "each closure should keep its own captured x");
}

#[test]
fn test_arrays_and_maps_script() {
    let binary = find_pepper_binary();
    let script = demos_dir().join("arrays_and_maps.pepper");

    let output = Command::new(&binary).arg(&script).output().expect("failed to execute binary");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "arrays_and_maps.pepper failed:\n{}", stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["15", "175", "null"]);
}

#[test]
fn test_parse_error_exits_non_zero() {
    let binary = find_pepper_binary();
    let script = demos_dir().join("broken_syntax.pepper");

    let output = Command::new(&binary).arg(&script).output().expect("failed to execute binary");
    assert!(!output.status.success(), "parse error should exit non-zero");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ParseError"), "expected ParseError in stderr: {}", stderr);
}

#[test]
fn test_runtime_error_exits_non_zero() {
    let binary = find_pepper_binary();
    let script = demos_dir().join("runtime_error.pepper");

    let output = Command::new(&binary).arg(&script).output().expect("failed to execute binary");
    assert!(!output.status.success(), "runtime error should exit non-zero");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("RuntimeError"), "expected RuntimeError in stderr: {}", stderr);
}

#[test]
fn test_nonexistent_script_path_fails() {
    let binary = find_pepper_binary();
    let output = Command::new(&binary)
        .arg("this_script_does_not_exist.pepper")
        .output()
        .expect("failed to execute binary");

    assert!(!output.status.success(), "missing file should exit non-zero");
}

#[test]
fn test_all_demo_scripts_succeed() {
    let binary = find_pepper_binary();
    let demos: Vec<_> = fs::read_dir(demos_dir())
        .expect("failed to read demos directory")
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().and_then(|ext| ext.to_str()) == Some("pepper"))
        .filter(|entry| !entry.file_name().to_string_lossy().contains("broken"))
        .filter(|entry| !entry.file_name().to_string_lossy().contains("runtime_error"))
        .collect();

    assert!(!demos.is_empty(), "no .pepper demo scripts found");

    for entry in demos {
        let path = entry.path();
        let output = Command::new(&binary).arg(&path).output().expect("failed to execute binary");
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(
            output.status.success(),
            "failed to run {}:\nSTDOUT:\n{}\nSTDERR:\n{}",
            path.display(),
            stdout,
            stderr
        );
    }
}
