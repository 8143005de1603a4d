use glob::{glob, Pattern};
use std::{
    fs,
    future::{self, Future},
    path::{Path, PathBuf},
    time::SystemTime,
};
use tracing::{debug, warn};

use super::FilePicker;

/// Non-interactive picker over a directory: "open" chooses the most recently
/// modified list with the requested extension, "save" proposes a name that does
/// not exist yet.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectoryPicker;

impl FilePicker for DirectoryPicker {
    fn pick_open(
        &self,
        dir: &Path,
        extension: &str,
    ) -> impl Future<Output = Option<PathBuf>> + Send {
        let dir = dir.to_path_buf();
        let extension = extension.to_string();
        async move {
            tokio::task::spawn_blocking(move || newest_with_extension(&dir, &extension))
                .await
                .ok()
                .flatten()
        }
    }

    fn pick_save(
        &self,
        dir: &Path,
        default_name: &str,
        extension: &str,
    ) -> impl Future<Output = Option<PathBuf>> + Send {
        let dir = dir.to_path_buf();
        let default_name = default_name.to_string();
        let extension = extension.to_string();
        async move {
            tokio::task::spawn_blocking(move || unused_name(&dir, &default_name, &extension))
                .await
                .ok()
        }
    }
}

fn newest_with_extension(dir: &Path, extension: &str) -> Option<PathBuf> {
    let pattern = format!(
        "{}/*.{}",
        Pattern::escape(&dir.to_string_lossy()),
        Pattern::escape(extension)
    );
    let entries = match glob(&pattern) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("bad list pattern {}: {}", pattern, e);
            return None;
        }
    };

    let mut best: Option<(SystemTime, PathBuf)> = None;
    for path in entries.filter_map(Result::ok) {
        if !path.is_file() {
            continue;
        }
        let modified = fs::metadata(&path)
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        if best.as_ref().map_or(true, |(t, _)| modified > *t) {
            best = Some((modified, path));
        }
    }
    let picked = best.map(|(_, p)| p);
    debug!(?picked, "directory picker open");
    picked
}

fn unused_name(dir: &Path, default_name: &str, extension: &str) -> PathBuf {
    let first = dir.join(format!("{}.{}", default_name, extension));
    if !first.exists() {
        return first;
    }
    (1..)
        .map(|n| dir.join(format!("{}_{}.{}", default_name, n, extension)))
        .find(|p| !p.exists())
        .unwrap_or(first)
}

/// Picker that always answers with preset paths.
#[derive(Debug, Default, Clone)]
pub struct FixedPicker {
    pub open: Option<PathBuf>,
    pub save: Option<PathBuf>,
}

impl FilePicker for FixedPicker {
    fn pick_open(
        &self,
        _dir: &Path,
        _extension: &str,
    ) -> impl Future<Output = Option<PathBuf>> + Send {
        future::ready(self.open.clone())
    }

    fn pick_save(
        &self,
        _dir: &Path,
        _default_name: &str,
        _extension: &str,
    ) -> impl Future<Output = Option<PathBuf>> + Send {
        future::ready(self.save.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_picks_newest_matching_file() {
        let dir = tempdir().unwrap();
        let old = dir.path().join("old.csv");
        fs::write(&old, "ppid\n").unwrap();
        fs::File::options()
            .write(true)
            .open(&old)
            .unwrap()
            .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(1_000))
            .unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::write(dir.path().join("new.csv"), "ppid\n").unwrap();

        let picked = DirectoryPicker.pick_open(dir.path(), "csv").await;
        assert_eq!(picked, Some(dir.path().join("new.csv")));
    }

    #[tokio::test]
    async fn open_in_empty_dir_is_cancelled() {
        let dir = tempdir().unwrap();
        assert_eq!(DirectoryPicker.pick_open(dir.path(), "csv").await, None);
    }

    #[tokio::test]
    async fn save_avoids_existing_files() {
        let dir = tempdir().unwrap();
        let picker = DirectoryPicker;
        let first = picker
            .pick_save(dir.path(), "participant_list", "csv")
            .await
            .unwrap();
        assert_eq!(first, dir.path().join("participant_list.csv"));

        fs::write(&first, "ppid\n").unwrap();
        let second = picker
            .pick_save(dir.path(), "participant_list", "csv")
            .await
            .unwrap();
        assert_eq!(second, dir.path().join("participant_list_1.csv"));
    }
}
