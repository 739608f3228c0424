//! Persistent store for the bot
//!
//! SQLite schema creation through versioned migrations, plus backup management.

mod backup;
mod database;
mod migrations;

pub use backup::{BackupEntry, BackupError, BackupManager, BackupStats, BACKUP_PREFIX};
pub use database::{snapshot, verify, Database, DatabaseError};
pub use migrations::{run_migrations, Migration, MIGRATIONS};
