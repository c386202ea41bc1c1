// Protocol loop tests: header line, streamed responses, clean termination

use std::fs;
use std::io::Cursor;
use std::path::Path;

use pretty_assertions::assert_eq;
use serde_json::{json, Value as JsonValue};
use tempfile::TempDir;

use rulescript::index::IndexState;
use rulescript::protocol::{run, OutputFormat};
use rulescript::runtime::processor::BuildFileProcessor;

const DEFS: &str = "\
def foo_rule(name, srcs = []) {
    add_rule({\"type\": \"foo\", \"name\": name, \"srcs\": srcs})
}
";

fn write_file(root: &Path, path: &str, contents: &str) {
    let full = root.join(path);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(full, contents).unwrap();
}

fn processor(root: &Path) -> BuildFileProcessor {
    BuildFileProcessor::new(
        root.to_path_buf(),
        "BUILD",
        false,
        vec!["//defs".to_string()],
        IndexState::disabled(),
    )
}

fn expected_rules(root: &Path, supplied_path: &str, name: &str, base_path: &str) -> JsonValue {
    json!([
        {
            "type": "foo",
            "name": name,
            "srcs": [],
            "buck.base_path": base_path,
        },
        {
            "__includes": [supplied_path, root.join("defs").display().to_string()],
        },
    ])
}

#[test]
fn streams_one_json_value_per_path_after_the_header() {
    let root = TempDir::new().unwrap();
    write_file(root.path(), "defs", DEFS);
    write_file(root.path(), "BUILD", "foo_rule(name = \"root\")\n");
    write_file(root.path(), "lib/BUILD", "foo_rule(name = \"lib\")\n");

    let mut p = processor(root.path());
    let input = Cursor::new("lib/BUILD\n");
    let mut output = Vec::new();
    run(&mut p, OutputFormat::Json, &["BUILD".to_string()], input, &mut output).unwrap();

    let newline = output.iter().position(|b| *b == b'\n').unwrap();
    assert_eq!(&output[..newline], b"JSON");

    let values: Vec<JsonValue> = serde_json::Deserializer::from_slice(&output[newline + 1..])
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        values,
        vec![
            expected_rules(root.path(), "BUILD", "root", ""),
            expected_rules(root.path(), "lib/BUILD", "lib", "lib"),
        ],
    );
}

#[test]
fn blank_input_lines_are_skipped_and_eof_terminates() {
    let root = TempDir::new().unwrap();
    write_file(root.path(), "defs", DEFS);
    write_file(root.path(), "BUILD", "foo_rule(name = \"root\")\n");

    let mut p = processor(root.path());
    let input = Cursor::new("\nBUILD\n\n");
    let mut output = Vec::new();
    run(&mut p, OutputFormat::Json, &[], input, &mut output).unwrap();

    let newline = output.iter().position(|b| *b == b'\n').unwrap();
    let values: Vec<JsonValue> = serde_json::Deserializer::from_slice(&output[newline + 1..])
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(values.len(), 1);
}

#[test]
fn binary_encoding_announces_itself_and_matches_the_json_tree() {
    let root = TempDir::new().unwrap();
    write_file(root.path(), "defs", DEFS);
    write_file(root.path(), "BUILD", "foo_rule(name = \"root\")\n");

    let mut p = processor(root.path());
    let input = Cursor::new("");
    let mut output = Vec::new();
    run(&mut p, OutputFormat::Bincode, &["BUILD".to_string()], input, &mut output).unwrap();

    let newline = output.iter().position(|b| *b == b'\n').unwrap();
    assert_eq!(&output[..newline], b"BINCODE");

    let expected = expected_rules(root.path(), "BUILD", "root", "");
    let expected_values = match expected {
        JsonValue::Array(values) => values,
        _ => unreachable!(),
    };
    assert_eq!(&output[newline + 1..], bincode::serialize(&expected_values).unwrap());
}

#[test]
fn a_failing_path_aborts_the_run() {
    let root = TempDir::new().unwrap();
    write_file(root.path(), "defs", DEFS);
    write_file(root.path(), "BUILD", "UNDEFINED\n");
    write_file(root.path(), "ok/BUILD", "foo_rule(name = \"ok\")\n");

    let mut p = processor(root.path());
    let input = Cursor::new("ok/BUILD\n");
    let mut output = Vec::new();
    let result = run(&mut p, OutputFormat::Json, &["BUILD".to_string()], input, &mut output);
    assert!(result.is_err());

    // Nothing but the header made it out.
    assert_eq!(output, b"JSON\n");
}
