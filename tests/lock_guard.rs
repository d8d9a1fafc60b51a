use std::fs::{self, File};
use std::time::{Duration, Instant};

use file_uploader::errors::LockError;
use file_uploader::fs_ops::{LockPolicy, acquire_then_release, try_lock_once};

#[tokio::test]
async fn uncontended_file_locks_first_try() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("a.bin");
    fs::write(&p, b"data").unwrap();

    let started = Instant::now();
    acquire_then_release(&p, &LockPolicy::new(3, Duration::from_millis(200)))
        .await
        .unwrap();
    assert!(started.elapsed() < Duration::from_millis(200), "no retry pause expected");
}

#[tokio::test]
async fn held_lock_exhausts_after_all_attempts() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("busy.bin");
    fs::write(&p, b"writing").unwrap();

    let holder = File::open(&p).unwrap();
    fs2::FileExt::lock_exclusive(&holder).unwrap();

    let policy = LockPolicy::new(3, Duration::from_millis(30));
    let started = Instant::now();
    let err = acquire_then_release(&p, &policy).await.unwrap_err();
    // Two pauses between three attempts.
    assert!(started.elapsed() >= Duration::from_millis(60));
    match err {
        LockError::Exhausted { attempts, path } => {
            assert_eq!(attempts, 3);
            assert_eq!(path, p);
        }
        other => panic!("unexpected {other:?}"),
    }

    fs2::FileExt::unlock(&holder).unwrap();
    assert!(try_lock_once(&p).unwrap(), "lock is free again after the holder releases");
}

#[tokio::test]
async fn lock_released_by_holder_mid_retry_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("late.bin");
    fs::write(&p, b"x").unwrap();

    let holder = File::open(&p).unwrap();
    fs2::FileExt::lock_exclusive(&holder).unwrap();
    let release = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(60)).await;
        drop(holder);
    });

    acquire_then_release(&p, &LockPolicy::new(20, Duration::from_millis(25)))
        .await
        .unwrap();
    release.await.unwrap();
}

#[test]
fn lock_does_not_outlive_the_attempt() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("free.bin");
    fs::write(&p, b"x").unwrap();
    assert!(try_lock_once(&p).unwrap());
    // A second independent handle can still take it.
    let other = File::open(&p).unwrap();
    fs2::FileExt::try_lock_exclusive(&other).unwrap();
}

#[tokio::test]
async fn vanished_file_is_an_open_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = acquire_then_release(&dir.path().join("gone"), &LockPolicy::default())
        .await
        .unwrap_err();
    assert!(matches!(err, LockError::Open { .. }));
}
