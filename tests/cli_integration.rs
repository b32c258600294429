//! Integration tests for the `mlk` binary.
//!
//! Each test runs in its own temporary directory with a private home and
//! config location, so user configuration never leaks in.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

use meshlock::document::DocumentStore;

// =============================================================================
// Fixtures
// =============================================================================

const SCENE: &str = "scene.mlk.json";

fn mlk(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("mlk").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("MESHLOCK_FILE")
        .env_remove("MESHLOCK_CONFIG")
        .env_remove("MESHLOCK_LOG")
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join("xdg"));
    cmd
}

fn run(dir: &TempDir, args: &[&str]) {
    mlk(dir).args(args).assert().success();
}

/// A 2x2 grid (9 vertices) in edit mode.
fn editing() -> TempDir {
    let dir = TempDir::new().unwrap();
    run(&dir, &["init"]);
    run(&dir, &["edit", "enter"]);
    dir
}

/// Vertices {0, 1, 2} locked.
fn with_locks() -> TempDir {
    let dir = editing();
    run(&dir, &["select", "--vert", "0,1,2"]);
    run(&dir, &["lock"]);
    dir
}

// =============================================================================
// Basics
// =============================================================================

#[test]
fn version_flag_works() {
    let dir = TempDir::new().unwrap();
    mlk(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mlk"));
}

#[test]
fn init_creates_document() {
    let dir = TempDir::new().unwrap();
    mlk(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("'Grid' (9 vertices)"));

    dir.child(SCENE).assert(predicate::path::exists());
    dir.child(SCENE)
        .assert(predicate::str::contains("\"kind\": \"meshlock.scene\""));
}

#[test]
fn init_refuses_to_overwrite() {
    let dir = TempDir::new().unwrap();
    run(&dir, &["init"]);
    mlk(&dir)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    run(&dir, &["init", "--force", "--grid", "1x1"]);
}

#[test]
fn commands_need_a_document() {
    let dir = TempDir::new().unwrap();
    mlk(&dir)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("run `mlk init` first"));
}

#[test]
fn file_flag_and_nested_directory() {
    let dir = TempDir::new().unwrap();
    run(&dir, &["-f", "scenes/a.json", "init"]);
    dir.child("scenes/a.json").assert(predicate::path::exists());
    mlk(&dir)
        .args(["-f", "scenes/a.json", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Grid"));
}

#[test]
fn completion_script() {
    let dir = TempDir::new().unwrap();
    mlk(&dir)
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mlk"));
}

// =============================================================================
// Lock workflow
// =============================================================================

#[test]
fn lock_then_status() {
    let dir = editing();
    run(&dir, &["select", "--vert", "0,1,2"]);
    mlk(&dir)
        .arg("lock")
        .assert()
        .success()
        .stdout(predicate::str::contains("locked 3 vertices"));

    mlk(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("locked:         3"))
        .stdout(predicate::str::contains("mode:           normal"));
}

#[test]
fn lock_without_selection_fails() {
    let dir = editing();
    mlk(&dir)
        .arg("lock")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no selection"));
}

#[test]
fn face_mode_lock() {
    let dir = editing();
    run(&dir, &["mode", "face"]);
    run(&dir, &["select", "--face", "0"]);
    mlk(&dir)
        .arg("lock")
        .assert()
        .success()
        .stdout(predicate::str::contains("locked 4 vertices"));
}

#[test]
fn begin_commit_unlock() {
    let dir = with_locks();
    mlk(&dir)
        .args(["unlock", "begin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("revealed 3 locked vertices"));

    run(&dir, &["select", "--vert", "0"]);
    mlk(&dir)
        .args(["unlock", "commit"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unlocked 1 vertices"));

    mlk(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("locked:         2"));
}

#[test]
fn commit_before_begin_fails() {
    let dir = with_locks();
    mlk(&dir)
        .args(["unlock", "commit"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("begin unlock selection first"));
}

#[test]
fn unlock_all_without_locks_fails() {
    let dir = editing();
    mlk(&dir)
        .args(["unlock", "all"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no locked elements"));
}

#[test]
fn quiet_suppresses_output() {
    let dir = editing();
    run(&dir, &["select", "--vert", "4"]);
    mlk(&dir)
        .args(["-q", "lock"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

// =============================================================================
// Guards
// =============================================================================

#[test]
fn delete_everything_visible_is_refused() {
    let dir = with_locks();
    run(&dir, &["select", "--all"]);
    mlk(&dir)
        .arg("delete")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "cannot delete everything while locked elements exist",
        ));
}

#[test]
fn delete_touching_revealed_lock_is_refused() {
    let dir = with_locks();
    run(&dir, &["unlock", "begin"]);
    run(&dir, &["select", "--vert", "2,5"]);
    mlk(&dir)
        .args(["delete", "--dialog"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("locked elements in selection"));
}

#[test]
fn delete_and_move_free_vertices() {
    let dir = with_locks();
    run(&dir, &["select", "--vert", "8"]);
    mlk(&dir)
        .args(["move", "--offset", "0,0,-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("moving 1 vertices"));

    mlk(&dir)
        .arg("delete")
        .assert()
        .success()
        .stdout(predicate::str::contains("deleted 1 vertices"));

    mlk(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("locked:         3"));
}

#[test]
fn keys_resolve_through_the_keymap() {
    let dir = editing();
    run(&dir, &["select", "--vert", "3"]);
    mlk(&dir)
        .args(["key", "ctrl+shift+L"])
        .assert()
        .success()
        .stdout(predicate::str::contains("locked 1 vertices"));

    mlk(&dir)
        .args(["key", "Q"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no binding for 'Q'"));
}

#[test]
fn keymap_listing() {
    let dir = TempDir::new().unwrap();
    mlk(&dir)
        .arg("keymap")
        .assert()
        .success()
        .stdout(predicate::str::contains("mesh.lock_guard_delete_dialog"))
        .stdout(predicate::str::contains("ctrl+shift+U"));
}

// =============================================================================
// Edit sessions and objects
// =============================================================================

#[test]
fn locks_survive_leaving_edit_mode() {
    let dir = with_locks();
    run(&dir, &["edit", "exit"]);

    mlk(&dir)
        .arg("lock")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not an editable mesh"));

    run(&dir, &["edit", "enter"]);
    run(&dir, &["select", "--all"]);
    mlk(&dir)
        .arg("move")
        .args(["--offset", "1,0,0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot move everything"));
}

#[test]
fn leaving_edit_mode_cancels_unlock() {
    let dir = with_locks();
    run(&dir, &["unlock", "begin"]);
    run(&dir, &["edit", "exit"]);
    run(&dir, &["edit", "enter"]);

    mlk(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("mode:           normal"));
}

#[test]
fn select_requires_edit_mode() {
    let dir = TempDir::new().unwrap();
    run(&dir, &["init"]);
    mlk(&dir)
        .args(["select", "--vert", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not in edit mode"));
}

#[test]
fn empty_object_has_no_locks() {
    let dir = TempDir::new().unwrap();
    run(&dir, &["init", "--empty", "--name", "Camera"]);
    mlk(&dir)
        .args(["edit", "enter"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'Camera' is not a mesh"));
    mlk(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("editable:       no"))
        .stdout(predicate::str::contains("locked:         0"));
}

#[test]
fn custom_layer_from_scene_config() {
    let dir = TempDir::new().unwrap();
    run(&dir, &["init", "--layer", "lock_v2"]);
    dir.child("meshlock.toml")
        .assert(predicate::str::contains("lock_v2"));

    run(&dir, &["edit", "enter"]);
    run(&dir, &["select", "--vert", "1"]);
    run(&dir, &["lock"]);
    dir.child(SCENE).assert(predicate::str::contains("\"lock_v2\""));
    dir.child(SCENE)
        .assert(predicate::str::contains("mesh_lock_vert").not());
}

#[test]
fn invalid_layer_is_rejected() {
    let dir = TempDir::new().unwrap();
    mlk(&dir)
        .args(["init", "--layer", "bad name!"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid layer name"));
}

// =============================================================================
// Doctor and overlay
// =============================================================================

#[test]
fn doctor_reseals_exposed_locks() {
    let dir = with_locks();
    mlk(&dir)
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("no issues found"));

    // simulate an external unhide
    let store = DocumentStore::new(dir.path().join(SCENE));
    let mut doc = store.load().unwrap();
    doc.objects[0].mesh.as_mut().unwrap().verts[1].flags.hidden = false;
    store.save(&mut doc).unwrap();

    mlk(&dir)
        .args(["doctor", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("would apply"))
        .stdout(predicate::str::contains("[locked-resealed]"));

    mlk(&dir)
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("applied"));

    mlk(&dir)
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("no issues found"));
}

#[test]
fn overlay_only_while_revealed() {
    let dir = with_locks();
    mlk(&dir)
        .arg("overlay")
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to draw"));

    run(&dir, &["unlock", "begin"]);
    mlk(&dir)
        .arg("overlay")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"verts_unselected\""))
        .stdout(predicate::str::contains("\"point_size\": 8.0"));
}
