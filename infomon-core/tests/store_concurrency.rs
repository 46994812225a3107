//! Concurrency and durability tests against file-backed stores.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rand::Rng;
use tempfile::TempDir;

use infomon_core::config::{InfomonConfig, StoreConfig};
use infomon_core::{FactStore, Infomon, InfomonError};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("infomon_core=debug")
        .with_test_writer()
        .try_init();
}

fn file_engine(dir: &TempDir) -> Infomon {
    let config = InfomonConfig::default().with_store_path(dir.path().join("infomon.db"));
    Infomon::open(config).expect("open file-backed infomon")
}

#[test]
fn setup_creates_the_database_file() {
    init_tracing();
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("nested").join("infomon.db");
    let infomon =
        Infomon::open(InfomonConfig::default().with_store_path(&path)).expect("open");
    infomon.setup().expect("second setup is a no-op");
    assert!(path.exists());
    assert!(infomon.cache().store().exists().expect("exists"));
}

#[test]
fn hundred_writers_on_one_key() {
    init_tracing();
    let dir = TempDir::new().expect("tempdir");
    let infomon = Arc::new(file_engine(&dir));
    let key = "answer.life";

    let writers: Vec<_> = (0..100_i64)
        .map(|n| {
            let infomon = Arc::clone(&infomon);
            thread::spawn(move || {
                let mut rng = rand::thread_rng();
                infomon.set(key, n).expect("first set");
                let seen = infomon.get_int(key).expect("read back").expect("present");
                assert!((0..100).contains(&seen), "torn value {seen}");
                thread::sleep(Duration::from_millis(rng.gen_range(0..20)));
                infomon.set(key, n).expect("second set");
                // Force the next read through to SQLite while others write.
                infomon.cache().flush();
                let seen = infomon.get_int(key).expect("read back").expect("present");
                assert!((0..100).contains(&seen), "torn value {seen}");
            })
        })
        .collect();
    for writer in writers {
        writer.join().expect("writer panicked");
    }

    let value = infomon.get_int(key).expect("get").expect("present");
    assert!((0..100).contains(&value));

    // The cache and the store agree after the dust settles.
    infomon.cache().flush();
    assert_eq!(infomon.get_int(key).expect("get"), Some(value));
    assert_eq!(infomon.entries().expect("entries").len(), 1);
}

#[test]
fn readers_and_resetters_never_resurrect_facts() {
    let dir = TempDir::new().expect("tempdir");
    let infomon = Arc::new(file_engine(&dir));
    infomon.set("stat.level", 12).expect("set");

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let infomon = Arc::clone(&infomon);
            thread::spawn(move || {
                for _ in 0..200 {
                    let _ = infomon.get("stat.level").expect("get");
                    infomon.cache().flush();
                }
            })
        })
        .collect();

    infomon.reset().expect("reset");
    for reader in readers {
        reader.join().expect("reader panicked");
    }

    assert_eq!(infomon.get("stat.level").expect("get"), None);
    assert!(!infomon.cache().contains("stat.level"));
}

#[test]
fn facts_survive_reopen() {
    let dir = TempDir::new().expect("tempdir");
    {
        let infomon = file_engine(&dir);
        infomon
            .parse("You currently have full citizenship in Icemule Trace.")
            .expect("parse");
        infomon.set("cman.krynch", 2).expect("set");
    }
    let infomon = file_engine(&dir);
    assert_eq!(
        infomon.get("citizenship").expect("get"),
        Some("Icemule Trace".into())
    );
    assert_eq!(infomon.get_int("cman.krynch").expect("get"), Some(2));
}

#[test]
fn tables_are_isolated_per_character() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("shared.db");
    let store_for = |table: &str| {
        let config = StoreConfig {
            path: Some(path.clone()),
            table: table.to_string(),
            ..StoreConfig::default()
        };
        let store = FactStore::open(&config).expect("open");
        Infomon::with_store(Arc::new(store), InfomonConfig::default()).expect("engine")
    };

    let alice = store_for("alice");
    let bob = store_for("bob");
    alice.set("stat.level", 10).expect("set");
    bob.set("stat.level", 20).expect("set");
    assert_eq!(alice.get_int("stat.level").expect("get"), Some(10));
    assert_eq!(bob.get_int("stat.level").expect("get"), Some(20));

    alice.reset().expect("reset");
    assert_eq!(bob.get_int("stat.level").expect("get"), Some(20));
}

#[test]
fn corrupt_file_is_reported_not_retried() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("infomon.db");
    std::fs::write(&path, vec![0x5a_u8; 4096]).expect("write garbage");

    let err = Infomon::open(InfomonConfig::default().with_store_path(&path))
        .expect_err("garbage must not open");
    assert!(matches!(err, InfomonError::StoreCorrupt { .. }), "{err}");
}
