//! Tests for state module.

use super::*;
use crate::error::Error;
use crate::slug::WorldId;
use chrono::NaiveDate;
use std::fs;
use tempfile::TempDir;

/// Create a test Archive rooted in a temporary directory
fn create_test_archive() -> (Archive, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let archive = Archive::new(temp_dir.path());
    (archive, temp_dir)
}

fn world(name: &str) -> WorldId {
    WorldId::parse(name).unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// === Path construction tests ===

#[test]
fn test_resolve_layout() {
    let id = world("My World!");
    let paths = WorldPaths::resolve(std::path::Path::new("/repo"), &id);
    assert_eq!(paths.world_id.as_str(), "my-world");
    assert_eq!(paths.world_dir, std::path::PathBuf::from("/repo/worlds/my-world"));
    assert_eq!(
        paths.codex_path,
        std::path::PathBuf::from("/repo/worlds/my-world/codex.md")
    );
    assert_eq!(
        paths.sessions_dir,
        std::path::PathBuf::from("/repo/worlds/my-world/sessions")
    );
}

#[test]
fn test_resolve_is_pure() {
    let (archive, temp) = create_test_archive();
    let a = archive.world_paths(&world("Ash"));
    let b = archive.world_paths(&world("ash"));
    assert_eq!(a, b);
    assert!(!temp.path().join("worlds").exists());
}

#[test]
fn test_discover_root_walks_upward() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("worlds")).unwrap();
    let nested = temp.path().join("notes").join("deep");
    fs::create_dir_all(&nested).unwrap();

    assert_eq!(discover_root(&nested), temp.path());
    assert_eq!(discover_root(temp.path()), temp.path());
}

#[test]
fn test_discover_root_falls_back_to_start() {
    let temp = TempDir::new().unwrap();
    let start = temp.path().join("empty");
    fs::create_dir_all(&start).unwrap();
    // a `worlds` *file* does not count
    fs::write(start.join("worlds"), "").unwrap();

    assert_eq!(discover_root(&start), start);
}

// === World lifecycle tests ===

#[test]
fn test_ensure_world_creates_layout_and_template() {
    let (archive, _temp) = create_test_archive();
    let id = world("Tidefall");

    let paths = archive.ensure_world(&id).unwrap();

    assert!(paths.world_dir.is_dir());
    assert!(paths.sessions_dir.is_dir());
    let codex = fs::read_to_string(&paths.codex_path).unwrap();
    assert_eq!(codex, default_codex(&id));
    assert!(codex.starts_with("# Codex — tidefall\n"));
    for heading in REQUIRED_HEADINGS {
        assert_eq!(codex.lines().filter(|l| *l == heading).count(), 1);
    }
}

#[test]
fn test_ensure_world_twice_keeps_existing_codex() {
    let (archive, _temp) = create_test_archive();
    let id = world("Tidefall");

    let first = archive.ensure_world(&id).unwrap();
    fs::write(&first.codex_path, "# Codex — tidefall\nhand edited\n").unwrap();
    let before = fs::read(&first.codex_path).unwrap();

    let second = archive.ensure_world(&id).unwrap();

    assert_eq!(first, second);
    assert_eq!(fs::read(&second.codex_path).unwrap(), before);
}

#[test]
fn test_delete_world() {
    let (archive, _temp) = create_test_archive();
    let id = world("doomed");
    let paths = archive.ensure_world(&id).unwrap();
    archive.create_session(&id).unwrap();

    archive.delete_world(&id).unwrap();

    assert!(!paths.world_dir.exists());
}

#[test]
fn test_delete_missing_world() {
    let (archive, _temp) = create_test_archive();
    match archive.delete_world(&world("ghost")) {
        Err(Error::WorldNotFound(name)) => assert_eq!(name, "ghost"),
        other => panic!("expected WorldNotFound, got {:?}", other),
    }
}

#[test]
fn test_list_worlds() {
    let (archive, _temp) = create_test_archive();
    assert!(archive.list_worlds().unwrap().is_empty());

    archive.ensure_world(&world("Zeta")).unwrap();
    archive.ensure_world(&world("alpha")).unwrap();
    fs::write(archive.worlds_dir().join("stray.txt"), "").unwrap();

    assert_eq!(archive.list_worlds().unwrap(), vec!["alpha", "zeta"]);
}

// === Codex tests ===

#[test]
fn test_read_codex_creates_world() {
    let (archive, _temp) = create_test_archive();
    let id = world("fresh");

    let codex = archive.read_codex(&id).unwrap();

    assert_eq!(codex, default_codex(&id));
    assert!(archive.world_paths(&id).codex_path.exists());
}

#[test]
fn test_write_codex_replaces_in_full() {
    let (archive, _temp) = create_test_archive();
    let id = world("fresh");
    archive.ensure_world(&id).unwrap();

    archive.write_codex(&id, "# Codex — fresh\nshort\n").unwrap();

    assert_eq!(archive.read_codex(&id).unwrap(), "# Codex — fresh\nshort\n");
    let leftovers: Vec<_> = fs::read_dir(archive.world_paths(&id).world_dir)
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|n| n.ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

// === Session tests ===

#[test]
fn test_create_session_numbers_from_one() {
    let (archive, _temp) = create_test_archive();
    let id = world("Tidefall");

    let path = archive.create_session_on(&id, day(2026, 3, 9)).unwrap();

    assert_eq!(path.file_name().unwrap(), "2026-03-09_01.md");
    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(
        text,
        "# Session: 2026-03-09_01\nWorld: tidefall\n\n## Transcript\n"
    );
}

#[test]
fn test_create_session_twice_same_day() {
    let (archive, _temp) = create_test_archive();
    let id = world("Tidefall");

    let first = archive.create_session(&id).unwrap();
    let second = archive.create_session(&id).unwrap();

    assert_ne!(first, second);
    let seq = |p: &std::path::Path| -> u32 {
        let stem = p.file_stem().unwrap().to_string_lossy().to_string();
        stem.rsplit('_').next().unwrap().parse().unwrap()
    };
    assert_eq!(seq(&second), seq(&first) + 1);
}

#[test]
fn test_create_session_continues_after_highest_and_per_day() {
    let (archive, _temp) = create_test_archive();
    let id = world("Tidefall");
    let paths = archive.ensure_world(&id).unwrap();
    fs::write(paths.sessions_dir.join("2026-03-09_07.md"), "").unwrap();
    fs::write(paths.sessions_dir.join("2026-03-09_03.md"), "").unwrap();
    fs::write(paths.sessions_dir.join("2026-03-08_12.md"), "").unwrap();
    // quarantine files do not count as sessions
    fs::write(
        paths.sessions_dir.join("2026-03-09_09.codex_write_failed.md"),
        "",
    )
    .unwrap();

    let next = archive.create_session_on(&id, day(2026, 3, 9)).unwrap();
    assert_eq!(next.file_name().unwrap(), "2026-03-09_08.md");

    let other_day = archive.create_session_on(&id, day(2026, 3, 10)).unwrap();
    assert_eq!(other_day.file_name().unwrap(), "2026-03-10_01.md");
}

#[test]
fn test_create_session_past_ninety_nine() {
    let (archive, _temp) = create_test_archive();
    let id = world("busy");
    let paths = archive.ensure_world(&id).unwrap();
    fs::write(paths.sessions_dir.join("2026-03-09_99.md"), "").unwrap();

    let next = archive.create_session_on(&id, day(2026, 3, 9)).unwrap();
    assert_eq!(next.file_name().unwrap(), "2026-03-09_100.md");
    let after = archive.create_session_on(&id, day(2026, 3, 9)).unwrap();
    assert_eq!(after.file_name().unwrap(), "2026-03-09_101.md");

    // numeric ordering, not lexicographic
    let latest = archive.latest_session(&id).unwrap().unwrap();
    assert_eq!(latest, after);
}

#[test]
fn test_concurrent_session_creation_never_collides() {
    let (archive, _temp) = create_test_archive();
    let id = world("crowded");
    archive.ensure_world(&id).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let archive = archive.clone();
            let id = id.clone();
            std::thread::spawn(move || archive.create_session_on(&id, day(2026, 1, 1)).unwrap())
        })
        .collect();
    let mut created: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    created.sort();
    created.dedup();

    assert_eq!(created.len(), 8);
    assert_eq!(archive.list_sessions(&id).unwrap().len(), 8);
}

#[test]
fn test_list_and_latest_sessions() {
    let (archive, _temp) = create_test_archive();
    let id = world("Tidefall");
    assert!(archive.list_sessions(&id).unwrap().is_empty());
    assert!(archive.latest_session(&id).unwrap().is_none());

    let a = archive.create_session_on(&id, day(2026, 1, 2)).unwrap();
    let b = archive.create_session_on(&id, day(2026, 1, 1)).unwrap();
    let c = archive.create_session_on(&id, day(2026, 1, 2)).unwrap();

    assert_eq!(archive.list_sessions(&id).unwrap(), vec![b, a, c.clone()]);
    assert_eq!(archive.latest_session(&id).unwrap(), Some(c));
}

// === Transcript tests ===

#[test]
fn test_append_then_read_recent_one() {
    let (archive, _temp) = create_test_archive();
    let session = archive.create_session(&world("Tidefall")).unwrap();

    append_transcript(&session, "Sage", "The tide is a god.").unwrap();
    append_transcript(&session, "AI", "Who tends its shrines?   \n").unwrap();

    assert_eq!(
        read_recent_transcript(&session, 1).unwrap(),
        "**AI:** Who tends its shrines?"
    );
}

#[test]
fn test_append_multiline_text_stays_one_turn() {
    let (archive, _temp) = create_test_archive();
    let session = archive.create_session(&world("Tidefall")).unwrap();

    append_transcript(&session, "AI", "The bells rang at dusk.\nWho rang them?").unwrap();

    assert_eq!(
        read_recent_transcript(&session, 1).unwrap(),
        "**AI:** The bells rang at dusk. Who rang them?"
    );
    let text = fs::read_to_string(&session).unwrap();
    assert!(text.ends_with("## Transcript\n**AI:** The bells rang at dusk. Who rang them?\n"));
}

#[test]
fn test_append_blank_speaker_is_anonymous() {
    let (archive, _temp) = create_test_archive();
    let session = archive.create_session(&world("Tidefall")).unwrap();

    append_transcript(&session, "   ", "hello").unwrap();

    assert_eq!(
        read_recent_transcript(&session, 5).unwrap(),
        "**Anonymous:** hello"
    );
}

#[test]
fn test_append_only_grows_file() {
    let (archive, _temp) = create_test_archive();
    let session = archive.create_session(&world("Tidefall")).unwrap();
    let header = fs::read_to_string(&session).unwrap();

    append_transcript(&session, "Sage", "one").unwrap();
    append_transcript(&session, "AI", "two?").unwrap();

    let text = fs::read_to_string(&session).unwrap();
    assert!(text.starts_with(&header));
    assert_eq!(&text[header.len()..], "**Sage:** one\n**AI:** two?\n");
}

#[test]
fn test_read_recent_window() {
    let (archive, _temp) = create_test_archive();
    let session = archive.create_session(&world("Tidefall")).unwrap();
    for i in 0..5 {
        append_transcript(&session, "Sage", &format!("line {}", i)).unwrap();
    }

    assert_eq!(read_recent_transcript(&session, 0).unwrap(), "");
    assert_eq!(
        read_recent_transcript(&session, 2).unwrap(),
        "**Sage:** line 3\n**Sage:** line 4"
    );
    // asking for more than exists returns every turn, never the header
    let all = read_recent_transcript(&session, 50).unwrap();
    assert_eq!(all.lines().count(), 5);
    assert!(!all.contains("# Session"));
}

#[test]
fn test_transcript_ops_on_missing_session() {
    let (_archive, temp) = create_test_archive();
    let missing = temp.path().join("nope.md");

    assert!(matches!(
        append_transcript(&missing, "Sage", "x"),
        Err(Error::SessionNotFound(p)) if p == missing
    ));
    assert!(matches!(
        read_recent_transcript(&missing, 3),
        Err(Error::SessionNotFound(_))
    ));
    assert!(matches!(tail_lines(&missing, 3), Err(Error::SessionNotFound(_))));
    assert!(!missing.exists());
}

#[test]
fn test_tail_lines_includes_header() {
    let (archive, _temp) = create_test_archive();
    let session = archive.create_session(&world("Tidefall")).unwrap();
    append_transcript(&session, "Sage", "only turn").unwrap();

    let tail = tail_lines(&session, 2).unwrap();
    assert_eq!(tail, vec!["## Transcript", "**Sage:** only turn"]);
    assert_eq!(tail_lines(&session, 100).unwrap().len(), 5);
}
