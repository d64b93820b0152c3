use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    assert_cmd::Command::from(Command::new(env!("CARGO_BIN_EXE_qldoc")))
}

fn fixture_path(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn generate(dir: &Path, libraries: &[&str]) -> assert_cmd::assert::Assert {
    let mut command = cmd();
    command
        .arg("generate")
        .args(["--cache-dir", dir.join("cache").to_str().unwrap()])
        .args(["--output", dir.join("site").to_str().unwrap()]);
    for library in libraries {
        command.arg(fixture_path(library));
    }
    command.assert()
}

// -- generate --

#[test]
fn generate_writes_site_and_caches() {
    let dir = TempDir::new().unwrap();
    generate(dir.path(), &["std", "demo", "ext"])
        .success()
        .stdout(predicate::str::contains("documented 3 libraries"));

    let site = dir.path().join("site");
    assert!(site.join("style.css").is_file());
    for library in ["std", "demo", "ext"] {
        assert!(dir.path().join("cache").join(format!("{}.cache", library)).is_file());
        assert!(site.join("library").join(library).join("index.html").is_file());
        assert!(site.join("library").join(library).join("files.html").is_file());
        assert!(site.join("library").join(library).join("index.json").is_file());
    }
    assert!(site.join("library/std/file/core_io.ql.html").is_file());

    let global = fs::read_to_string(site.join("index.html")).unwrap();
    assert!(global.contains("<a href=\"/library/demo/\">demo</a>"));
    assert!(global.contains("Extensions for demo widgets"));
}

#[test]
fn extensions_land_on_their_target_pages() {
    let dir = TempDir::new().unwrap();
    generate(dir.path(), &["std", "demo", "ext"]).success();
    let site = dir.path().join("site");

    let widget = fs::read_to_string(site.join("library/demo/entity/Widget.html")).unwrap();
    assert!(widget.contains("<code>Widget(x)</code>"));
    assert!(widget.contains("fun double() on Widget"));
    assert!(widget.contains("from <a href=\"/library/ext/\">ext</a>"));

    let string = fs::read_to_string(site.join("library/std/entity/string.html")).unwrap();
    assert!(string.contains("native fun upper() on string"));
    assert!(string.contains("fun shout() on string"));
}

#[test]
fn extensions_resolve_regardless_of_library_order() {
    let dir = TempDir::new().unwrap();
    generate(dir.path(), &["ext", "demo", "std"]).success();

    let widget =
        fs::read_to_string(dir.path().join("site/library/demo/entity/Widget.html")).unwrap();
    assert!(widget.contains("fun double() on Widget"));
}

#[test]
fn search_index_lists_library_members() {
    let dir = TempDir::new().unwrap();
    generate(dir.path(), &["std", "demo", "ext"]).success();

    let json = fs::read_to_string(dir.path().join("site/library/demo/index.json")).unwrap();
    let entries: serde_json::Value = serde_json::from_str(&json).unwrap();
    let titles: Vec<_> = entries
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, ["Widget", "Widget(x)", "fun move(by)", "fun origin()"]);
    assert_eq!(entries[0]["importPath"], "widget.ql");
    assert_eq!(entries[0]["description"], "A spinning widget.");
}

#[test]
fn unresolved_extension_is_warned_about_not_fatal() {
    let dir = TempDir::new().unwrap();
    generate(dir.path(), &["std", "demo", "ext"])
        .success()
        .stderr(predicate::str::contains("stray"));
}

#[test]
fn quiet_flag_silences_warnings() {
    let dir = TempDir::new().unwrap();
    cmd()
        .args(["-q", "generate"])
        .args(["--cache-dir", dir.path().join("cache").to_str().unwrap()])
        .args(["--output", dir.path().join("site").to_str().unwrap()])
        .arg(fixture_path("ext"))
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}

#[test]
fn rerunning_generate_leaves_caches_unchanged() {
    let dir = TempDir::new().unwrap();
    generate(dir.path(), &["std", "demo", "ext"]).success();
    let first: Vec<_> = ["std", "demo", "ext"]
        .iter()
        .map(|l| fs::read(dir.path().join("cache").join(format!("{}.cache", l))).unwrap())
        .collect();

    generate(dir.path(), &["std", "demo", "ext"]).success();
    let second: Vec<_> = ["std", "demo", "ext"]
        .iter()
        .map(|l| fs::read(dir.path().join("cache").join(format!("{}.cache", l))).unwrap())
        .collect();
    assert_eq!(first, second);
}

#[test]
fn missing_library_fails_but_others_are_documented() {
    let dir = TempDir::new().unwrap();
    let mut command = cmd();
    command
        .arg("generate")
        .args(["--cache-dir", dir.path().join("cache").to_str().unwrap()])
        .args(["--output", dir.path().join("site").to_str().unwrap()])
        .arg(fixture_path("demo"))
        .arg(fixture_path("no-such-library"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("qll.info"));

    assert!(dir.path().join("cache/demo.cache").is_file());
    assert!(dir.path().join("site/library/demo/index.html").is_file());
}

#[test]
fn generate_requires_a_library() {
    let dir = TempDir::new().unwrap();
    cmd()
        .arg("generate")
        .args(["--cache-dir", dir.path().to_str().unwrap()])
        .args(["--output", dir.path().to_str().unwrap()])
        .assert()
        .failure();
}

// -- list / index --

#[test]
fn list_prints_cached_libraries() {
    let dir = TempDir::new().unwrap();
    generate(dir.path(), &["demo", "std"]).success();

    cmd()
        .arg("list")
        .args(["--cache-dir", dir.path().join("cache").to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "demo 0.2.0 by Demo Author: Widgets and friends\nstd 1.0.0",
        ));
}

#[test]
fn list_fails_on_corrupt_cache() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("broken.cache"), b"not a cache").unwrap();

    cmd()
        .arg("list")
        .args(["--cache-dir", dir.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken.cache"));
}

#[test]
fn index_rebuilds_global_page_from_cache() {
    let dir = TempDir::new().unwrap();
    generate(dir.path(), &["demo"]).success();
    let index = dir.path().join("site/index.html");
    fs::remove_file(&index).unwrap();

    cmd()
        .arg("index")
        .args(["--cache-dir", dir.path().join("cache").to_str().unwrap()])
        .args(["--output", dir.path().join("site").to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("indexed 1 libraries"));

    let html = fs::read_to_string(index).unwrap();
    assert!(html.contains("Widgets and friends"));
}

#[test]
fn index_with_empty_cache() {
    let dir = TempDir::new().unwrap();
    cmd()
        .arg("index")
        .args(["--cache-dir", dir.path().join("cache").to_str().unwrap()])
        .args(["--output", dir.path().join("site").to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("indexed 0 libraries"));
}
