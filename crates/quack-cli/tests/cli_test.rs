//! Driver tests: run the `quackc` binary on JSON trees

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const ROUND_TRIP: &str = r#"{
    "classes": [{
        "name": "C",
        "methods": [{
            "name": "m",
            "return_type": "Int",
            "body": [
                { "kind": { "return": { "kind": { "binary": {
                    "op": "add",
                    "left": { "kind": { "int": 1 } },
                    "right": { "kind": { "int": 2 } }
                } } } } }
            ]
        }]
    }],
    "main": [
        { "kind": { "assign": {
            "target": "x",
            "declared": "Int",
            "value": { "kind": { "call": {
                "receiver": { "kind": { "new": { "class": "C" } } },
                "method": "m"
            } } }
        } } }
    ]
}"#;

const UNASSIGNED: &str = r#"{
    "main": [
        { "kind": { "expr": { "kind": { "call": {
            "receiver": { "kind": { "var": "y" }, "span": { "start": 0, "end": 1, "line": 3, "column": 5 } },
            "method": "print"
        } } } } }
    ]
}"#;

fn quackc(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_quackc"))
        .args(args)
        .env("NO_COLOR", "1")
        .output()
        .expect("failed to run quackc")
}

fn write_tree(dir: &Path, source: &str) -> String {
    let path = dir.join("program.json");
    fs::write(&path, source).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_writes_one_unit_per_class() {
    let dir = tempfile::tempdir().unwrap();
    let tree = write_tree(dir.path(), ROUND_TRIP);
    let out = dir.path().join("out");

    let output = quackc(&[&tree, out.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let c = fs::read_to_string(out.join("C.asm")).unwrap();
    assert!(c.starts_with(".class C:Obj\n"));
    assert!(c.contains(".method m\n\tenter\n\tconst 1\n\tconst 2\n\troll 1\n\tcall Int:plus\n\treturn 0\n"));

    let main = fs::read_to_string(out.join("Main.asm")).unwrap();
    assert!(main.contains(".method $constructor\n.local x\n\tenter\n\tnew C\n\tcall C:$constructor\n\tcall C:m\n\tstore x\n"));
}

#[test]
fn test_custom_entry_class_name() {
    let dir = tempfile::tempdir().unwrap();
    let tree = write_tree(dir.path(), ROUND_TRIP);
    let out = dir.path().join("out");

    let output = quackc(&[&tree, out.to_str().unwrap(), "--name", "Start"]);
    assert!(output.status.success());
    assert!(out.join("Start.asm").exists());
    assert!(!out.join("Main.asm").exists());
}

#[test]
fn test_error_reports_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let tree = write_tree(dir.path(), UNASSIGNED);
    let out = dir.path().join("out");

    let output = quackc(&[&tree, out.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Error: 3:5: variable 'y' may be used before assignment in Main:$constructor"),
        "{}",
        stderr
    );
    assert!(!out.exists());
}

#[test]
fn test_dump_tree_stops_before_compiling() {
    let dir = tempfile::tempdir().unwrap();
    let tree = write_tree(dir.path(), ROUND_TRIP);
    let out = dir.path().join("out");

    let output = quackc(&[&tree, out.to_str().unwrap(), "-t"]);
    assert!(output.status.success());
    let dumped: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(dumped["classes"].as_array().unwrap().len(), 1);
    assert!(!out.exists());

    let output = quackc(&[&tree, out.to_str().unwrap(), "-tt"]);
    assert!(output.status.success());
    let dumped: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(dumped["classes"].as_array().unwrap().len(), 2);
    assert_eq!(dumped["classes"][1]["name"], "Main");
    assert!(!String::from_utf8_lossy(&output.stdout).contains("\"binary\""));
}

#[test]
fn test_custom_builtin_table() {
    let dir = tempfile::tempdir().unwrap();
    let tree = write_tree(dir.path(), ROUND_TRIP);
    let builtins = dir.path().join("builtins.json");
    // No Int:plus in this table
    fs::write(
        &builtins,
        r#"{ "Obj": { "super": null }, "Int": { "super": "Obj" }, "Bool": {}, "String": {}, "Nothing": {} }"#,
    )
    .unwrap();

    let output = quackc(&[&tree, dir.path().to_str().unwrap(), "--builtins", builtins.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("'Int' has no method 'plus'"));
}

#[test]
fn test_missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.json");
    let output = quackc(&[missing.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("Error: cannot read"));
}
