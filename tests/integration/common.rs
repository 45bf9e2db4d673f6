use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

pub fn binary_path() -> String {
    let raw = PathBuf::from(env!("CARGO_BIN_EXE_modargs"));
    if raw.is_absolute() {
        return raw.to_string_lossy().to_string();
    }
    let from_manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(&raw);
    if from_manifest.exists() {
        return from_manifest.to_string_lossy().to_string();
    }
    raw.to_string_lossy().to_string()
}

/// Run the binary with `args`, feeding `input` on stdin.
pub fn run_with_input(args: &[&str], input: &[u8]) -> Output {
    let mut child = Command::new(binary_path())
        .args(args)
        .env("RUST_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn binary");

    child.stdin.take().unwrap().write_all(input).unwrap();
    child.wait_with_output().unwrap()
}

pub fn run(args: &[&str]) -> Output {
    run_with_input(args, b"")
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

pub fn normalized_lines(buf: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(buf)
        .lines()
        .map(|l| l.trim_end().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

pub const NARROW_MANIFEST: &str = r#"{
  "classes": {
    "NarrowDump": {
      "extends": "modargs.demos.HexDump",
      "doc": "Hexdump with 2 bytes per row",
      "defaults": { "hexwidth": 2 }
    }
  }
}"#;
