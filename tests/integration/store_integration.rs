//! Integration tests for the Progress Store

use scrivener::error::StorageError;
use scrivener::progress::ProgressStore;
use scrivener::project::{format_unit, unit_heading, ProjectStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

const CHAPTERS: u32 = 40;

fn open(dir: &TempDir) -> Arc<ProgressStore> {
    Arc::new(ProgressStore::open(dir.path().join("store")).unwrap())
}

/// Test that readers never see a torn update while one writer advances a project
#[test]
fn test_concurrent_readers_never_observe_torn_updates() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    let id = store.create("Concurrent", CHAPTERS).unwrap();
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            let done = done.clone();
            thread::spawn(move || {
                let mut last_position = 0;
                let mut observations = 0usize;
                while !done.load(Ordering::Acquire) {
                    let project = store.get(id).unwrap();
                    assert!(project.position >= last_position, "position went backwards");
                    assert_eq!(project.segments.len() as u32, project.position);
                    if project.position > 0 {
                        let document = project.document();
                        assert!(document.contains(&unit_heading(project.position)));
                        assert!(!document.contains(&unit_heading(project.position + 1)));
                    }
                    last_position = project.position;
                    observations += 1;
                }
                observations
            })
        })
        .collect();

    for unit in 1..=CHAPTERS {
        store
            .set_status(id, ProjectStatus::Generating { unit })
            .unwrap();
        let status = if unit == CHAPTERS {
            ProjectStatus::Completed
        } else {
            ProjectStatus::Running
        };
        store
            .append_and_advance(id, unit, status, &format_unit(unit, &format!("text {}", unit)))
            .unwrap();
    }
    done.store(true, Ordering::Release);

    for reader in readers {
        assert!(reader.join().unwrap() > 0);
    }

    let project = store.get(id).unwrap();
    assert_eq!(project.status, ProjectStatus::Completed);
    assert_eq!(project.position, CHAPTERS);
}

/// Test that projects written by different threads stay independent
#[test]
fn test_parallel_writers_on_distinct_projects() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);

    let writers: Vec<_> = (0..4)
        .map(|n| {
            let store = store.clone();
            thread::spawn(move || {
                let id = store.create(&format!("Project {}", n), 5).unwrap();
                for unit in 1..=5 {
                    let status = if unit == 5 {
                        ProjectStatus::Completed
                    } else {
                        ProjectStatus::Running
                    };
                    store
                        .append_and_advance(id, unit, status, &format_unit(unit, "x"))
                        .unwrap();
                }
                id
            })
        })
        .collect();

    let ids: Vec<_> = writers.into_iter().map(|w| w.join().unwrap()).collect();
    for id in ids {
        let project = store.get(id).unwrap();
        assert_eq!(project.position, 5);
        assert!(project.is_complete());
    }
    assert_eq!(store.list().unwrap().len(), 4);
}

/// Test that every acknowledged update survives reopening the store
#[test]
fn test_progress_survives_restart() {
    let dir = TempDir::new().unwrap();
    let id = {
        let store = open(&dir);
        let id = store.create("Durable", 3).unwrap();
        store
            .append_and_advance(id, 1, ProjectStatus::Running, &format_unit(1, "one"))
            .unwrap();
        store
            .set_status(id, ProjectStatus::Generating { unit: 2 })
            .unwrap();
        id
    };

    let store = open(&dir);
    let project = store.get(id).unwrap();
    assert_eq!(project.position, 1);
    assert_eq!(project.status, ProjectStatus::Generating { unit: 2 });
    assert!(project.document().ends_with("one"));

    let stalled = store.list_stalled().unwrap();
    assert_eq!(stalled.len(), 1);
    assert_eq!(stalled[0].id, id);
}

/// Test listing order and snapshot shape for fresh projects
#[test]
fn test_create_and_list() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    let a = store.create("A", 1).unwrap();
    let b = store.create("B", 2).unwrap();

    let listed = store.list().unwrap();
    assert_eq!(listed[0].id, b);
    assert_eq!(listed[1].id, a);
    assert_eq!(listed[1].title, "A");
    assert_eq!(listed[1].status, ProjectStatus::Queued);

    let fresh = store.get(b).unwrap();
    assert_eq!(fresh.position, 0);
    assert!(fresh.document().is_empty());

    assert!(matches!(
        store.create("", 3),
        Err(StorageError::InvalidInput(_))
    ));
}
