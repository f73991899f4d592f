#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::{Value, json};

pub const T1: &str = "[C:1][OH]>>[C:1]Br";
pub const T2: &str = "[N:1]>>[N:1]C";
pub const T3: &str = "[O:1]>>[O:1]C";
pub const T4: &str = "[S:1]>>[S:1]C";

/// Canonical form of [`T3`] under the lexical toolkit
pub const T3_CANONICAL: &str = "[O]>>[O]C";

/// Linear route `target -> ... -> start` applying `templates` from the top.
pub fn linear_route(target: &str, templates: &[&str], solved: bool) -> Value {
    let mut node = json!({
        "type": "mol",
        "smiles": format!("{target}-start"),
        "in_stock": solved,
    });
    for (depth, template) in templates.iter().enumerate().rev() {
        let smiles = if depth == 0 {
            target.to_string()
        } else {
            format!("{target}-I{depth}")
        };
        node = json!({
            "type": "mol",
            "smiles": smiles,
            "in_stock": false,
            "children": [{
                "type": "reaction",
                "smiles": format!("{smiles}>>{template}"),
                "metadata": {"template": template},
                "children": [node],
            }],
        });
    }
    node
}

/// Standard search: `A` solved via `[T1]` (cheapest) and `[T2, T1]`, `B` via `[T1]`.
pub fn primary_routes() -> Value {
    json!([
        {"target": "A", "trees": [linear_route("A", &[T1], true), linear_route("A", &[T2, T1], true)]},
        {"target": "B", "trees": [linear_route("B", &[T1], true)]},
    ])
}

/// Alternative search solving two targets the standard search never saw.
pub fn alternative_routes() -> Value {
    json!([
        {"target": "A", "trees": [linear_route("A", &[T1, T2], true)]},
        {"target": "C", "trees": [linear_route("C", &[T3], true)]},
        {"target": "D", "trees": [linear_route("D", &[T4], true)]},
    ])
}

pub fn write_json(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

pub fn retromine() -> Command {
    let mut cmd = Command::cargo_bin("retromine").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}
