//! Integration tests for the Shelf CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const COVER: &str = "https://images.unsplash.com/photo-1544947950-fa07a98d237f?w=800&q=80";

/// `shelf` with its state under `dir`
fn shelf(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("shelf").unwrap();
    cmd.arg("--data-dir").arg(dir.path());
    cmd
}

fn stdout_json(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).expect("stdout is not JSON")
}

#[test]
fn test_help() {
    let mut cmd = Command::cargo_bin("shelf").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("qualify"))
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("bookmark"))
        .stdout(predicate::str::contains("read"));
}

#[test]
fn test_version() {
    let mut cmd = Command::cargo_bin("shelf").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("shelf"));
}

#[test]
fn test_resolve_help() {
    let mut cmd = Command::cargo_bin("shelf").unwrap();
    cmd.args(["resolve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Simulate loading"))
        .stdout(predicate::str::contains("--fail-fallback"))
        .stdout(predicate::str::contains("--base-delay-ms"));
}

#[test]
fn test_qualify_provider_url() {
    let mut cmd = Command::cargo_bin("shelf").unwrap();
    cmd.args(["qualify", COVER, "--width", "200", "--height", "300"])
        .assert()
        .success()
        .stdout(predicate::str::contains("w=200"))
        .stdout(predicate::str::contains("h=300"))
        .stdout(predicate::str::contains("q=75"))
        .stdout(predicate::str::contains("fm=webp"))
        .stdout(predicate::str::contains("w=800").not());
}

#[test]
fn test_qualify_leaves_other_hosts_alone() {
    let mut cmd = Command::cargo_bin("shelf").unwrap();
    cmd.args(["qualify", "https://example.com/cover.png?w=10"])
        .assert()
        .success()
        .stdout("https://example.com/cover.png?w=10\n");
}

#[test]
fn test_qualify_strip() {
    let mut cmd = Command::cargo_bin("shelf").unwrap();
    cmd.args(["qualify", "--strip", COVER])
        .assert()
        .success()
        .stdout("https://images.unsplash.com/photo-1544947950-fa07a98d237f\n");
}

#[test]
fn test_qualify_rejects_bad_quality() {
    let mut cmd = Command::cargo_bin("shelf").unwrap();
    cmd.args(["qualify", COVER, "--quality", "150"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("between 0 and 100"));
}

#[test]
fn test_fallback_is_stable() {
    let first = Command::cargo_bin("shelf")
        .unwrap()
        .args(["fallback", "https://broken.test/cover.jpg"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let second = Command::cargo_bin("shelf")
        .unwrap()
        .args(["fallback", "https://broken.test/cover.jpg"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    assert_eq!(first, second);
    assert!(String::from_utf8_lossy(&first).contains("images.unsplash.com"));
}

#[test]
fn test_resolve_recovers_after_retries() {
    let dir = TempDir::new().unwrap();
    let report = stdout_json(shelf(&dir).args([
        "resolve",
        COVER,
        "--fail",
        "2",
        "--base-delay-ms",
        "0",
        "--json",
    ]));

    assert_eq!(report["resolution"]["tier"], "primary");
    assert_eq!(report["resolution"]["source"], report["qualified"]);
    let attempts = report["attempts"].as_array().unwrap();
    assert_eq!(attempts.len(), 3);
    assert_eq!(attempts[2]["outcome"], "Success");
    assert!(attempts[1]["source_variant"]
        .as_str()
        .unwrap()
        .contains("retry=1"));
}

#[test]
fn test_resolve_degrades_to_fallback() {
    let dir = TempDir::new().unwrap();
    let report = stdout_json(shelf(&dir).args([
        "resolve",
        COVER,
        "--fail",
        "100",
        "--base-delay-ms",
        "0",
        "--json",
    ]));

    assert_eq!(report["resolution"]["tier"], "fallback");
    assert_eq!(report["resolution"]["source"], report["fallback"]);
    assert_eq!(report["attempts"].as_array().unwrap().len(), 5);
}

#[test]
fn test_resolve_ends_on_placeholder() {
    let dir = TempDir::new().unwrap();
    shelf(&dir)
        .args([
            "resolve",
            COVER,
            "--alt",
            "Almond",
            "--fail",
            "100",
            "--fail-fallback",
            "--base-delay-ms",
            "0",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("placeholder (Almond)"));
}

#[test]
fn test_catalog_search() {
    let dir = TempDir::new().unwrap();
    shelf(&dir)
        .args(["catalog", "--search", "sagan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cosmos"))
        .stdout(predicate::str::contains("Almond").not());
}

#[test]
fn test_session_persists() {
    let dir = TempDir::new().unwrap();

    shelf(&dir)
        .args(["login", "admin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed in as admin (admin)"));

    shelf(&dir)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("admin@example.com"));

    shelf(&dir).arg("logout").assert().success();

    shelf(&dir)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not signed in"));
}

#[test]
fn test_login_unknown_user() {
    let dir = TempDir::new().unwrap();
    shelf(&dir)
        .args(["login", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("User not found: ghost"));
}

#[test]
fn test_data_dir_from_env() {
    let dir = TempDir::new().unwrap();

    Command::cargo_bin("shelf")
        .unwrap()
        .env("SHELF_DATA_PATH", dir.path())
        .args(["login", "reader"])
        .assert()
        .success();

    assert!(dir.path().join("current_user.json").exists());
}

#[test]
fn test_purchase_requires_login() {
    let dir = TempDir::new().unwrap();
    shelf(&dir)
        .args(["purchase", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not signed in"));
}

#[test]
fn test_purchase_and_library() {
    let dir = TempDir::new().unwrap();
    shelf(&dir).args(["login", "reader"]).assert().success();

    shelf(&dir)
        .args(["purchase", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added 'Almond'"));
    shelf(&dir)
        .args(["purchase", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already in your library"));

    let library = stdout_json(shelf(&dir).args(["library", "--json"]));
    let books = library.as_array().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["title"], "Almond");

    let library = stdout_json(shelf(&dir).args(["library", "--remove", "3", "--json"]));
    assert!(library.as_array().unwrap().is_empty());
}

#[test]
fn test_purchase_unknown_book() {
    let dir = TempDir::new().unwrap();
    shelf(&dir).args(["login", "reader"]).assert().success();
    shelf(&dir)
        .args(["purchase", "999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No book with id 999"));
}

#[test]
fn test_bookmarks_persist() {
    let dir = TempDir::new().unwrap();

    shelf(&dir)
        .args(["bookmark", "add", "3", "42", "--note", "the almond scene"])
        .assert()
        .success();

    let list = stdout_json(shelf(&dir).args(["bookmark", "list", "--json"]));
    let entries = list.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["book_id"], 3);
    assert_eq!(entries[0]["page"], 42);
    assert_eq!(entries[0]["note"], "the almond scene");

    let id = entries[0]["id"].as_str().unwrap().to_string();
    shelf(&dir)
        .args(["bookmark", "remove", "3", id.as_str()])
        .assert()
        .success();
    shelf(&dir)
        .args(["bookmark", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No bookmarks"));
}

#[test]
fn test_bookmark_page_out_of_range() {
    let dir = TempDir::new().unwrap();
    shelf(&dir)
        .args(["bookmark", "add", "3", "9999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn test_malformed_bookmarks_start_empty() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("bookmarks.json"), "{\"3\": [{\"page\": ").unwrap();

    shelf(&dir)
        .args(["bookmark", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No bookmarks"));

    shelf(&dir)
        .args(["bookmark", "add", "3", "5"])
        .assert()
        .success();
    let list = stdout_json(shelf(&dir).args(["bookmark", "list", "--json"]));
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[test]
fn test_read_clamps_page() {
    let dir = TempDir::new().unwrap();
    shelf(&dir)
        .args(["read", "3", "--page", "5000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Page 264/264"))
        .stdout(predicate::str::contains("(100%)"));
}

#[test]
fn test_read_shows_bookmark() {
    let dir = TempDir::new().unwrap();
    shelf(&dir)
        .args(["bookmark", "add", "1", "7", "--note", "favourite line"])
        .assert()
        .success();
    shelf(&dir)
        .args(["read", "1", "--page", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Bookmarked: favourite line"));
}

#[test]
fn test_register_signs_in() {
    let dir = TempDir::new().unwrap();
    shelf(&dir)
        .args(["register", "bookworm", "--email", "worm@example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Registered and signed in as bookworm"));

    shelf(&dir)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("worm@example.com"))
        .stdout(predicate::str::contains("Admin:    no"));

    shelf(&dir).arg("logout").assert().success();
    shelf(&dir).args(["login", "bookworm"]).assert().success();

    shelf(&dir)
        .args(["register", "bookworm", "--email", "other@example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Username already taken"));
}

#[test]
fn test_book_commands_require_admin() {
    let dir = TempDir::new().unwrap();
    shelf(&dir)
        .args(["book", "add", "--title", "Pachinko", "--author", "Min Jin Lee"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not signed in"));

    shelf(&dir).args(["login", "reader"]).assert().success();
    shelf(&dir)
        .args(["book", "delete", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Administrator access required"));

    shelf(&dir)
        .arg("catalog")
        .assert()
        .success()
        .stdout(predicate::str::contains("The Midnight Library"));
}

#[test]
fn test_admin_edits_catalog() {
    let dir = TempDir::new().unwrap();
    shelf(&dir).args(["login", "admin"]).assert().success();

    shelf(&dir)
        .args([
            "book", "add", "--title", "Pachinko", "--author", "Min Jin Lee", "--pages", "496",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("as book 5"));

    let books = stdout_json(shelf(&dir).args(["catalog", "--json"]));
    assert_eq!(books[0]["id"], 5);
    assert_eq!(books[0]["pages"], 496);

    shelf(&dir)
        .args(["book", "update", "5", "--title", "Pachinko (Reissue)"])
        .assert()
        .success();
    shelf(&dir)
        .args(["catalog", "--search", "reissue"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pachinko (Reissue)"));

    shelf(&dir)
        .args(["book", "update", "999", "--stock", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No book with id 999"));
}

#[test]
fn test_book_delete_clears_library_and_bookmarks() {
    let dir = TempDir::new().unwrap();
    shelf(&dir).args(["login", "admin"]).assert().success();
    shelf(&dir).args(["purchase", "3"]).assert().success();
    shelf(&dir)
        .args(["bookmark", "add", "3", "10"])
        .assert()
        .success();

    shelf(&dir)
        .args(["book", "delete", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted 'Almond'"));

    let library = stdout_json(shelf(&dir).args(["library", "--json"]));
    assert!(library.as_array().unwrap().is_empty());
    shelf(&dir)
        .args(["bookmark", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No bookmarks"));
    shelf(&dir)
        .arg("catalog")
        .assert()
        .success()
        .stdout(predicate::str::contains("Almond").not());
    shelf(&dir)
        .args(["read", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No book with id 3"));
}

#[test]
fn test_library_remove_keeps_bookmarks() {
    let dir = TempDir::new().unwrap();
    shelf(&dir).args(["login", "reader"]).assert().success();
    shelf(&dir).args(["purchase", "2"]).assert().success();
    shelf(&dir)
        .args(["bookmark", "add", "2", "15", "--note", "dream shop"])
        .assert()
        .success();

    let library = stdout_json(shelf(&dir).args(["library", "--remove", "2", "--json"]));
    assert!(library.as_array().unwrap().is_empty());

    let list = stdout_json(shelf(&dir).args(["bookmark", "list", "2", "--json"]));
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["note"], "dream shop");
}
