use either::{Left, Right};
use std::{
    env::{self, VarError},
    fs,
    path::{Path, PathBuf},
    sync::mpsc::channel,
    thread,
    time::Duration,
};
use fill_engine::writer::STAGING_PREFIX;
use tempfile::TempDir;

/// A wrapper to force tests to panic after a timeout.
///
/// Note this is overrideable with the FILLGEN_TEST_TIMEOUT environment
/// variable, which provides a timeout in seconds
pub fn timeout<R: Send + 'static, F: (FnOnce() -> R) + Send + 'static>(
    timeout: Duration,
    f: F,
) -> R {
    let timeout = match env::var("FILLGEN_TEST_TIMEOUT")
        .map_err(Left)
        .and_then(|timeout| timeout.parse::<u64>().map_err(Right))
    {
        Ok(val) => Duration::from_secs(val),
        Err(Left(VarError::NotPresent)) => timeout,
        Err(err) => panic!("Couldn't parse FILLGEN_TEST_TIMEOUT: {:?}", err),
    };

    let (done_tx, done_rx) = channel();
    let thread = thread::spawn(move || {
        let r = f();
        done_tx.send(()).unwrap();
        r
    });

    match done_rx.recv_timeout(timeout) {
        Ok(_) => thread.join().expect("thread panicked"),
        Err(_) => panic!(
            "timeout after {:?}, specify FILLGEN_TEST_TIMEOUT to override",
            timeout
        ),
    }
}

/// A fresh scratch directory, removed when dropped.
pub fn scratch_dir() -> TempDir {
    let _ = env_logger::builder().is_test(true).try_init();
    tempfile::tempdir().expect("cannot create scratch directory")
}

/// Path of `name` inside `dir`.
pub fn target_in<T: AsRef<Path>>(dir: T, name: &str) -> PathBuf {
    dir.as_ref().join(name)
}

/// Names of the staging files left behind in `dir`.
pub fn leftover_staging_files<T: AsRef<Path>>(dir: T) -> Vec<String> {
    fs::read_dir(dir.as_ref())
        .expect("cannot list scratch directory")
        .map(|entry| {
            entry
                .expect("cannot read directory entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .filter(|name| name.starts_with(STAGING_PREFIX))
        .collect()
}
