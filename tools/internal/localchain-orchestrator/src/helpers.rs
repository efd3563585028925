// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::error::OrchestratorError;
use indicatif::{HumanDuration, ProgressBar};
use std::borrow::Cow;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::pin;
use tokio::time::interval;
use tracing::trace;

pub(crate) const FIREFLY_DIR: &str = ".firefly";
pub(crate) const STACKS_DIR: &str = "stacks";

pub(crate) fn home_directory() -> Result<PathBuf, OrchestratorError> {
    dirs::home_dir().ok_or(OrchestratorError::NoHomeDirectory)
}

/// Get default path to the directory holding all stacks.
/// It should get resolved to `$HOME/.firefly/stacks`
pub(crate) fn default_stacks_directory() -> Result<PathBuf, OrchestratorError> {
    Ok(home_directory()?.join(FIREFLY_DIR).join(STACKS_DIR))
}

pub(crate) fn init_path<P: AsRef<Path>>(path: P) -> Result<(), OrchestratorError> {
    let path = path.as_ref();
    trace!("initialising {}", path.display());

    fs::create_dir_all(path).map_err(|source| OrchestratorError::PathInitFailure {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes the file, creating any missing parent directories first.
pub(crate) fn write_file<P, C>(path: P, contents: C) -> Result<(), OrchestratorError>
where
    P: AsRef<Path>,
    C: AsRef<[u8]>,
{
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        init_path(parent)?;
    }
    trace!("writing {}", path.display());

    fs::write(path, contents).map_err(|source| OrchestratorError::FileWriteFailure {
        path: path.to_path_buf(),
        source,
    })
}

/// Same as [write_file], but marks the result as executable so containers can use it as an entrypoint.
pub(crate) fn write_executable<P, C>(path: P, contents: C) -> Result<(), OrchestratorError>
where
    P: AsRef<Path>,
    C: AsRef<[u8]>,
{
    let path = path.as_ref();
    write_file(path, contents)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|source| {
            OrchestratorError::FileWriteFailure {
                path: path.to_path_buf(),
                source,
            }
        })?;
    }
    Ok(())
}

pub(crate) fn read_file<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, OrchestratorError> {
    let path = path.as_ref();
    fs::read(path).map_err(|source| OrchestratorError::FileReadFailure {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn path_exists<P: AsRef<Path>>(path: P) -> Result<bool, OrchestratorError> {
    let path = path.as_ref();
    path.try_exists()
        .map_err(|source| OrchestratorError::PathInspectFailure {
            path: path.to_path_buf(),
            source,
        })
}

pub(crate) fn copy_dir_all<P, Q>(source: P, destination: Q) -> Result<(), OrchestratorError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let source = source.as_ref();
    let destination = destination.as_ref();
    init_path(destination)?;

    let entries = fs::read_dir(source).map_err(|source_err| OrchestratorError::FileReadFailure {
        path: source.to_path_buf(),
        source: source_err,
    })?;
    for entry in entries {
        let entry = entry.map_err(|err| OrchestratorError::FileReadFailure {
            path: source.to_path_buf(),
            source: err,
        })?;
        let from = entry.path();
        let to = destination.join(entry.file_name());
        if from.is_dir() {
            copy_dir_all(&from, &to)?;
        } else {
            fs::copy(&from, &to).map_err(|err| OrchestratorError::FileWriteFailure {
                path: to.clone(),
                source: err,
            })?;
        }
    }
    Ok(())
}

/// Removes the directory and everything below it. Missing directories are not an error.
pub(crate) fn remove_dir_all<P: AsRef<Path>>(path: P) -> Result<(), OrchestratorError> {
    let path = path.as_ref();
    if !path_exists(path)? {
        return Ok(());
    }
    trace!("removing {}", path.display());

    fs::remove_dir_all(path).map_err(|source| OrchestratorError::PathRemovalFailure {
        path: path.to_path_buf(),
        source,
    })
}

/// Nanoseconds since the unix epoch, used to prefix freshly generated key files.
pub(crate) fn unix_nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default()
}

pub(crate) fn command_args<I, S>(parts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts.into_iter().map(|p| p.as_ref().to_string()).collect()
}

pub(crate) struct ProgressTracker {
    start: Instant,
    pub(crate) progress_bar: ProgressBar,
}

impl ProgressTracker {
    pub(crate) fn new<I: AsRef<str>>(msg: I) -> Self {
        let progress_bar = ProgressBar::new_spinner();
        progress_bar.println(msg);

        ProgressTracker {
            start: Instant::now(),
            progress_bar,
        }
    }

    pub(crate) fn println<I: AsRef<str>>(&self, msg: I) {
        self.progress_bar.println(msg)
    }

    pub(crate) fn set_pb_message(&self, msg: impl Into<Cow<'static, str>>) {
        self.progress_bar.set_message(msg)
    }

    pub(crate) async fn with_progress<F, T>(&self, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        async_with_progress(fut, &self.progress_bar).await
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.progress_bar.println(format!(
            "✨ Done in {}",
            HumanDuration(self.start.elapsed())
        ));
        self.progress_bar.finish_and_clear();
    }
}

pub(crate) async fn async_with_progress<F, T>(fut: F, pb: &ProgressBar) -> T
where
    F: Future<Output = T>,
{
    pb.tick();
    pin!(fut);
    let mut update_interval = interval(Duration::from_millis(50));

    loop {
        tokio::select! {
            _ = update_interval.tick() => {
                pb.tick()
            }
            res = &mut fut => {
                return res
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_file_creates_missing_parents() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a").join("b").join("file.txt");
        write_file(&target, "content").unwrap();
        assert_eq!(fs::read_to_string(target).unwrap(), "content");
    }

    #[test]
    fn copy_dir_all_copies_nested_entries() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("init");
        write_file(source.join("config").join("a.yaml"), "a: 1").unwrap();
        write_file(source.join("top.json"), "{}").unwrap();

        let destination = dir.path().join("runtime");
        copy_dir_all(&source, &destination).unwrap();

        assert_eq!(
            fs::read_to_string(destination.join("config").join("a.yaml")).unwrap(),
            "a: 1"
        );
        assert!(destination.join("top.json").exists());
    }

    #[test]
    fn removing_a_directory_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = dir.path().join("runtime");
        write_file(runtime.join("config").join("a.yaml"), "a: 1").unwrap();

        remove_dir_all(&runtime).unwrap();
        assert!(!runtime.exists());
        remove_dir_all(&runtime).unwrap();
    }
}
