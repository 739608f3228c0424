//! Store backups
//!
//! Backups live in a single directory as `game_backup_YYYYMMDD_HHMMSS.db`.
//! `.sql` dumps with the same prefix are listed, counted and cleaned up, but
//! only `.db` snapshots can be restored.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Local};
use serde::Serialize;
use thiserror::Error;

use super::database::{self, DatabaseError};

/// File name prefix shared by all backups
pub const BACKUP_PREFIX: &str = "game_backup_";

const BACKUP_EXTENSIONS: &[&str] = &["db", "sql"];
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const SECONDS_PER_DAY: u64 = 24 * 3600;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Store not found: {0}")]
    StoreMissing(PathBuf),
    #[error("Backup file not found: {0}")]
    NotFound(PathBuf),
    #[error("Cannot restore {0}: only .db snapshots can be restored")]
    Unsupported(PathBuf),
    #[error("Cannot restore {0}: it is the live store")]
    SameFile(PathBuf),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One backup file on disk
#[derive(Debug, Clone, Serialize)]
pub struct BackupEntry {
    pub filename: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub size_mb: f64,
    /// Modification time, local, `YYYY-MM-DD HH:MM:SS`
    pub created: String,
    #[serde(skip)]
    modified: SystemTime,
}

/// Aggregate view over the backup directory
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BackupStats {
    pub total_backups: usize,
    pub total_size_mb: f64,
    pub latest_backup: Option<String>,
    pub oldest_backup: Option<String>,
}

/// Creates, restores, lists and prunes store backups
#[derive(Debug, Clone)]
pub struct BackupManager {
    store: PathBuf,
    backup_dir: PathBuf,
    keep_days: u32,
}

impl BackupManager {
    pub fn new(store: PathBuf, backup_dir: PathBuf, keep_days: u32) -> Self {
        Self {
            store,
            backup_dir,
            keep_days,
        }
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Snapshot the store into the backup directory, then prune old backups
    pub fn create(&self) -> Result<PathBuf, BackupError> {
        if !self.store.is_file() {
            return Err(BackupError::StoreMissing(self.store.clone()));
        }
        std::fs::create_dir_all(&self.backup_dir)?;

        let stamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let mut backup_path = self.backup_dir.join(format!("{BACKUP_PREFIX}{stamp}.db"));
        let mut suffix = 1;
        while backup_path.exists() {
            backup_path = self
                .backup_dir
                .join(format!("{BACKUP_PREFIX}{stamp}_{suffix}.db"));
            suffix += 1;
        }

        database::snapshot(&self.store, &backup_path)?;
        tracing::info!(path = %backup_path.display(), "Backup created");

        self.cleanup()?;
        Ok(backup_path)
    }

    /// Replace the store with a backup.
    ///
    /// The current store (if any) is preserved as `<store>.before_restore` first.
    /// Returns the path of that preserved copy.
    pub fn restore(&self, backup: &Path) -> Result<Option<PathBuf>, BackupError> {
        if !backup.is_file() {
            return Err(BackupError::NotFound(backup.to_path_buf()));
        }
        if self.store.exists()
            && std::fs::canonicalize(backup)? == std::fs::canonicalize(&self.store)?
        {
            return Err(BackupError::SameFile(backup.to_path_buf()));
        }
        if backup.extension().and_then(|e| e.to_str()) != Some("db") {
            return Err(BackupError::Unsupported(backup.to_path_buf()));
        }
        database::verify(backup)?;

        let preserved = if self.store.is_file() {
            let mut name = self.store.as_os_str().to_os_string();
            name.push(".before_restore");
            let preserved = PathBuf::from(name);
            std::fs::copy(&self.store, &preserved)?;
            Some(preserved)
        } else {
            if let Some(parent) = self.store.parent() {
                std::fs::create_dir_all(parent)?;
            }
            None
        };

        std::fs::copy(backup, &self.store)?;
        database::verify(&self.store)?;

        tracing::info!(
            backup = %backup.display(),
            store = %self.store.display(),
            "Store restored from backup"
        );
        Ok(preserved)
    }

    /// All backups, newest first
    pub fn list(&self) -> Result<Vec<BackupEntry>, BackupError> {
        let read_dir = match std::fs::read_dir(&self.backup_dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry?;
            let path = entry.path();
            if !is_backup_file(&path) {
                continue;
            }
            let metadata = entry.metadata()?;
            let modified = metadata.modified()?;
            let size_bytes = metadata.len();
            entries.push(BackupEntry {
                filename: entry.file_name().to_string_lossy().into_owned(),
                path,
                size_bytes,
                size_mb: round2(size_bytes as f64 / (1024.0 * 1024.0)),
                created: DateTime::<Local>::from(modified)
                    .format(DISPLAY_FORMAT)
                    .to_string(),
                modified,
            });
        }

        entries.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(entries)
    }

    /// Delete backups older than the retention window
    pub fn cleanup(&self) -> Result<Vec<PathBuf>, BackupError> {
        self.cleanup_at(SystemTime::now())
    }

    /// Delete backups whose age at `now` exceeds the retention window
    pub fn cleanup_at(&self, now: SystemTime) -> Result<Vec<PathBuf>, BackupError> {
        let max_age = Duration::from_secs(u64::from(self.keep_days) * SECONDS_PER_DAY);
        let mut removed = Vec::new();

        for entry in self.list()? {
            let age = now.duration_since(entry.modified).unwrap_or_default();
            if age > max_age {
                std::fs::remove_file(&entry.path)?;
                tracing::info!(file = %entry.filename, "Deleted old backup");
                removed.push(entry.path);
            }
        }

        Ok(removed)
    }

    pub fn stats(&self) -> Result<BackupStats, BackupError> {
        let backups = self.list()?;
        let total_size_mb = round2(backups.iter().map(|b| b.size_mb).sum());
        Ok(BackupStats {
            total_backups: backups.len(),
            total_size_mb,
            latest_backup: backups.first().map(|b| b.created.clone()),
            oldest_backup: backups.last().map(|b| b.created.clone()),
        })
    }
}

fn is_backup_file(path: &Path) -> bool {
    let name_matches = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(BACKUP_PREFIX));
    let ext_matches = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| BACKUP_EXTENSIONS.contains(&e));
    name_matches && ext_matches && path.is_file()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
