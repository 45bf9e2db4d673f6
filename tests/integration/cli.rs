use tempfile::TempDir;

use crate::common::{NARROW_MANIFEST, normalized_lines, run, run_with_input, write_file};

#[test]
fn unknown_option_exits_with_usage_error() {
    let output = run(&["--notvalid"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("--notvalid"),
        "stderr did not name the option. stderr was: {stderr}"
    );
}

#[test]
fn hexdump_of_text_argument() {
    let output = run(&["--text", "abc", "-m", "hexdump"]);
    assert!(output.status.success());
    let lines = normalized_lines(&output.stdout);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("0000:    61 62 63 "));
    assert!(lines[0].ends_with("    abc"));
}

#[test]
fn hexdump_of_stdin_with_custom_width() {
    let output = run_with_input(&["-m", "hexdump", "--hexwidth", "2"], b"hi!");
    assert!(output.status.success());
    assert_eq!(
        normalized_lines(&output.stdout),
        vec!["0000:    68 69    hi", "0002:    21       !"]
    );
}

#[test]
fn module_options_need_a_selected_module() {
    let output = run(&["--hexwidth", "2"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn invalid_module_argument_fails() {
    let output = run(&["-m", "hexdump", "--hexwidth", "0", "--text", "x"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("hexwidth must be between 1 and"), "stderr was: {stderr}");
}

#[test]
fn oversized_hexwidth_fails_without_panicking() {
    let output = run(&["-m", "hexdump", "--hexwidth", "9223372036854775807", "--text", "x"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("panicked"), "stderr was: {stderr}");
    assert!(stderr.contains("hexwidth must be between 1 and 4096"), "stderr was: {stderr}");
}

#[test]
fn baseclass_selection_is_rejected() {
    let output = run(&["-m", "modargs.demos.ExampleModule"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("must not be the baseclass"), "stderr was: {stderr}");
}

#[test]
fn unknown_module_lists_choices() {
    let output = run(&["-m", "nosuch"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Valid modules are: hexdump"), "stderr was: {stderr}");
}

#[test]
fn help_lists_entry_points() {
    let output = run(&["--help"]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("hexdump -> Print a hexdump of the received data"));
    assert!(stdout.contains("--config"));
}

#[test]
fn show_args_prints_namespace_as_json() {
    let output = run(&["--show-args", "-m", "hexdump", "--hexwidth", "4"]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        json["modules"],
        serde_json::json!(["modargs.demos.ExampleModule", "modargs.demos.HexDump"])
    );
    assert_eq!(json["hexwidth"], 4);
    assert_eq!(json["show_args"], true);
    assert_eq!(json["config"], serde_json::json!([]));
}

#[test]
fn modules_load_from_manifest_files() {
    let dir = TempDir::new().unwrap();
    let manifest = write_file(dir.path(), "mods.json", NARROW_MANIFEST);
    let selection = format!("{}:NarrowDump", manifest.display());
    let output = run(&["-m", &selection, "--text", "hi"]);
    assert!(
        output.status.success(),
        "stderr was: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(normalized_lines(&output.stdout), vec!["0000:    68 69    hi"]);
}

#[test]
fn input_file_is_read() {
    let dir = TempDir::new().unwrap();
    let input = write_file(dir.path(), "input.txt", "ok");
    let output = run(&["-i", input.to_str().unwrap(), "-m", "hexdump", "--hexwidth", "2"]);
    assert!(output.status.success());
    assert_eq!(normalized_lines(&output.stdout), vec!["0000:    6f 6b    ok"]);
}
