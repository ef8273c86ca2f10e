//! Compiler orchestration tests using fake toolchain scripts.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use hdlgen::compile::Compiler;
use hdlgen::hdl::{compute_metadata, Language, ParsedHdl};
use hdlgen::CompilerConfig;

fn write_script(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path.to_str().unwrap().to_string()
}

fn vhdl_unit(name: &str) -> ParsedHdl {
    let content = format!(
        "entity {name} is\nend {name};\narchitecture rtl of {name} is\nbegin\nend rtl;\n"
    );
    let metadata = compute_metadata(&content, Language::Vhdl);
    ParsedHdl {
        content,
        language: Language::Vhdl,
        entity_name: name.to_string(),
        metadata,
    }
}

fn verilog_unit(name: &str) -> ParsedHdl {
    let content = format!("module {name};\nendmodule\n");
    let metadata = compute_metadata(&content, Language::Verilog);
    ParsedHdl {
        content,
        language: Language::Verilog,
        entity_name: name.to_string(),
        metadata,
    }
}

fn config(dir: &Path, ghdl: &str, iverilog: &str, timeout_secs: u64) -> CompilerConfig {
    CompilerConfig {
        ghdl_path: ghdl.to_string(),
        iverilog_path: iverilog.to_string(),
        work_directory: dir.join("build"),
        timeout_secs,
        vhdl_flags: vec!["-fsynopsys".to_string()],
        verilog_flags: vec![],
    }
}

#[tokio::test]
async fn test_vhdl_success_collects_build_files() {
    let dir = tempfile::tempdir().unwrap();
    // Drops an artifact into the workdir on analyze, like ghdl -a does.
    let ghdl = write_script(
        dir.path(),
        "fake_ghdl",
        "#!/bin/sh\nif [ \"$1\" = \"-a\" ]; then\n  workdir=\"${2#--workdir=}\"\n  touch \"$workdir/work-obj93.cf\"\nfi\nexit 0\n",
    );
    let compiler = Compiler::new(config(dir.path(), &ghdl, "iverilog", 10));

    let result = compiler.compile(&vhdl_unit("gate"), "s1").await;

    assert!(result.success);
    assert!(result.error_message.is_none());
    let names: Vec<_> = result
        .build_files
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
        .collect();
    assert!(names.contains(&"gate.vhdl"));
    assert!(names.contains(&"work-obj93.cf"));
}

#[tokio::test]
async fn test_stderr_on_success_becomes_warnings() {
    let dir = tempfile::tempdir().unwrap();
    let ghdl = write_script(
        dir.path(),
        "fake_ghdl",
        "#!/bin/sh\necho 'warning: universal integer bound' >&2\nexit 0\n",
    );
    let compiler = Compiler::new(config(dir.path(), &ghdl, "iverilog", 10));

    let result = compiler.compile(&vhdl_unit("gate"), "s2").await;

    assert!(result.success);
    // Both the analyze and elaborate stages emit the warning.
    assert_eq!(result.warnings.len(), 2);
    assert!(result.warnings[0].contains("universal integer"));
}

#[tokio::test]
async fn test_nonzero_exit_is_failure_with_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let iverilog = write_script(
        dir.path(),
        "fake_iverilog",
        "#!/bin/sh\necho 'gate.v:1: syntax error' >&2\nexit 2\n",
    );
    let compiler = Compiler::new(config(dir.path(), "ghdl", &iverilog, 10));

    let result = compiler.compile(&verilog_unit("gate"), "s3").await;

    assert!(!result.success);
    assert!(result
        .error_message
        .as_deref()
        .unwrap()
        .contains("syntax error"));
    assert!(result.build_files.is_empty());
}

#[tokio::test]
async fn test_timeout_names_the_configured_limit() {
    let dir = tempfile::tempdir().unwrap();
    let ghdl = write_script(dir.path(), "fake_ghdl", "#!/bin/sh\nsleep 30\n");
    let compiler = Compiler::new(config(dir.path(), &ghdl, "iverilog", 1));

    let result = compiler.compile(&vhdl_unit("gate"), "s4").await;

    assert!(!result.success);
    assert_eq!(
        result.error_message.as_deref(),
        Some("Compilation timeout after 1 seconds")
    );
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let ghdl = write_script(dir.path(), "fake_ghdl", "#!/bin/sh\nexit 0\n");
    let compiler = Compiler::new(config(dir.path(), &ghdl, "iverilog", 10));

    compiler.compile(&vhdl_unit("a_gate"), "alpha").await;
    compiler.compile(&vhdl_unit("b_gate"), "beta").await;

    assert!(dir.path().join("build/alpha/a_gate.vhdl").exists());
    assert!(dir.path().join("build/beta/b_gate.vhdl").exists());
    assert!(!dir.path().join("build/alpha/b_gate.vhdl").exists());
}
