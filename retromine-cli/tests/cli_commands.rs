mod common;

use std::fs;

use serde_json::Value;
use tempfile::tempdir;

use crate::common::{
    T1, T2, T3, T3_CANONICAL, T4, alternative_routes, primary_routes, retromine, write_json,
};

fn read_json(path: &std::path::Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn mine_writes_popular_table_in_score_order() {
    let dir = tempdir().unwrap();
    let primary = write_json(dir.path(), "primary.json", &primary_routes());
    let out = dir.path().join("mined");

    retromine()
        .arg("mine")
        .arg("--primary")
        .arg(&primary)
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success();

    let text = fs::read_to_string(out.join("popular_templates.json")).unwrap();
    let popular = read_json(&out.join("popular_templates.json"));
    assert!((popular[T1].as_f64().unwrap() - 2.0 / 3.0).abs() < 1e-12);
    assert_eq!(popular[T2], Value::from(0.0));
    assert!(text.find(T1).unwrap() < text.find(T2).unwrap());

    assert!(!out.join("unused_templates.json").exists());
}

#[test]
fn mine_with_alternative_splits_by_library() {
    let dir = tempdir().unwrap();
    let primary = write_json(dir.path(), "primary.json", &primary_routes());
    let alternative = write_json(dir.path(), "alternative.json", &alternative_routes());
    let library = dir.path().join("library.txt");
    fs::write(&library, format!("# reference templates\n{T3_CANONICAL}\n")).unwrap();
    let out = dir.path().join("mined");

    let output = retromine()
        .arg("mine")
        .arg("--primary")
        .arg(&primary)
        .arg("--alternative")
        .arg(&alternative)
        .arg("--library")
        .arg(&library)
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success()
        .get_output()
        .clone();
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Mining complete! Wrote 4 tables"), "stderr: {stderr}");

    let unused = read_json(&out.join("unused_templates.json"));
    assert_eq!(unused.as_object().unwrap().len(), 2);
    assert_eq!(unused[T3], Value::from(1.0));
    assert_eq!(unused[T4], Value::from(1.0));

    let overlooked = read_json(&out.join("overlooked_templates.json"));
    let novel = read_json(&out.join("novel_templates.json"));
    assert_eq!(overlooked, serde_json::json!({ T3: 1.0 }));
    assert_eq!(novel, serde_json::json!({ T4: 1.0 }));
}

#[test]
fn quiet_suppresses_summary() {
    let dir = tempdir().unwrap();
    let primary = write_json(dir.path(), "primary.json", &primary_routes());

    let output = retromine()
        .args(["-q", "mine", "--primary"])
        .arg(&primary)
        .arg("--output-dir")
        .arg(dir.path())
        .assert()
        .success()
        .get_output()
        .clone();
    assert!(output.stderr.is_empty());
}

#[test]
fn ml_price_without_predictor_fails() {
    let dir = tempdir().unwrap();
    let primary = write_json(dir.path(), "primary.json", &primary_routes());

    let output = retromine()
        .args(["mine", "--mode", "ml-price", "--primary"])
        .arg(&primary)
        .arg("--output-dir")
        .arg(dir.path())
        .assert()
        .failure()
        .get_output()
        .clone();
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Configuration"), "stderr: {stderr}");
    assert!(stderr.contains("price predictor"), "stderr: {stderr}");
}

#[test]
fn stock_cost_uses_stock_table() {
    let dir = tempdir().unwrap();
    let primary = write_json(dir.path(), "primary.json", &primary_routes());
    let stock = dir.path().join("stock.tsv");
    fs::write(&stock, "smiles\tprice\nA-start\t1.0\nB-start\t1.0\n").unwrap();
    let out = dir.path().join("mined");

    retromine()
        .args(["mine", "-q", "--mode", "stock-cost", "--stock"])
        .arg(&stock)
        .arg("--primary")
        .arg(&primary)
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success();

    let popular = read_json(&out.join("popular_templates.json"));
    assert!((popular[T1].as_f64().unwrap() - 2.0 / 3.0).abs() < 1e-12);

    retromine()
        .args(["mine", "-q", "--mode", "stock-cost", "--primary"])
        .arg(&primary)
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .failure();
}

#[test]
fn unknown_mode_fails() {
    let dir = tempdir().unwrap();
    let primary = write_json(dir.path(), "primary.json", &primary_routes());

    retromine()
        .args(["mine", "--mode", "cheapest", "--primary"])
        .arg(&primary)
        .arg("--output-dir")
        .arg(dir.path())
        .assert()
        .failure();
}

#[test]
fn compare_prints_scores() {
    let dir = tempdir().unwrap();
    let standard = write_json(dir.path(), "standard.json", &primary_routes());
    let optimised = write_json(dir.path(), "optimised.json", &alternative_routes());

    let output = retromine()
        .args(["compare", "-q", "--standard"])
        .arg(&standard)
        .arg("--optimised")
        .arg(&optimised)
        .assert()
        .success()
        .get_output()
        .clone();
    let scores: Value = serde_json::from_slice(&output.stdout).unwrap();

    let keys: Vec<&str> = scores.as_object().unwrap().keys().map(String::as_str).collect();
    let mut sorted = keys.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, vec!["difference", "extra", "num"]);
    assert_eq!(scores["difference"], Value::from(0.0));
    assert_eq!(scores["extra"], Value::from(1.0));
    let num = scores["num"].as_f64().unwrap();
    assert!((num - 3.0_f64.ln() / 20.0_f64.ln()).abs() < 1e-12);
}

#[test]
fn compare_writes_output_file() {
    let dir = tempdir().unwrap();
    let standard = write_json(dir.path(), "standard.json", &primary_routes());
    let out = dir.path().join("comparison.json");

    retromine()
        .args(["compare", "-q", "--standard"])
        .arg(&standard)
        .arg("--optimised")
        .arg(&standard)
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    let scores = read_json(&out);
    assert_eq!(scores["difference"], Value::from(0.0));
    assert_eq!(scores["num"], Value::from(0.0));
}
