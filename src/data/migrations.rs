//! Store migrations using a versioned migration pattern.
//!
//! Each migration runs exactly once and is tracked in the `schema_migrations` table.
//! Migrations are applied in order by version number. The schema is the one the
//! bot expects to find on first start.

use rusqlite::{params, Connection};

/// A database migration with a version number, name, and SQL to execute.
pub struct Migration {
    /// Unique version number (migrations run in order)
    pub version: i64,
    /// Human-readable name for the migration
    pub name: &'static str,
    /// SQL to execute (can be multiple statements)
    pub sql: &'static str,
}

/// All migrations in order. New migrations should be added at the end.
pub const MIGRATIONS: &[Migration] = &[
    // ============================================================
    // Core tables (v1-v7)
    // ============================================================
    Migration {
        version: 1,
        name: "create_users_table",
        sql: r#"
            CREATE TABLE IF NOT EXISTS users (
                user_id INTEGER PRIMARY KEY,
                username TEXT NOT NULL,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP,
                last_active TEXT DEFAULT CURRENT_TIMESTAMP,
                is_active BOOLEAN DEFAULT 1,
                settings TEXT DEFAULT '{}'
            );
        "#,
    },
    Migration {
        version: 2,
        name: "create_characters_table",
        sql: r#"
            CREATE TABLE IF NOT EXISTS characters (
                user_id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                class TEXT NOT NULL,
                level INTEGER DEFAULT 1,
                experience INTEGER DEFAULT 0,
                experience_needed INTEGER DEFAULT 100,
                health INTEGER NOT NULL,
                max_health INTEGER NOT NULL,
                mana INTEGER DEFAULT 0,
                max_mana INTEGER DEFAULT 0,
                attack INTEGER NOT NULL,
                defense INTEGER NOT NULL,
                magic_power INTEGER DEFAULT 0,
                speed INTEGER DEFAULT 10,
                critical_chance INTEGER DEFAULT 10,
                block_chance INTEGER DEFAULT 5,
                gold INTEGER DEFAULT 50,
                weapon TEXT DEFAULT 'basic_sword',
                armor TEXT DEFAULT 'basic_clothes',
                dungeon_progress INTEGER DEFAULT 0,
                daily_quests_completed INTEGER DEFAULT 0,
                last_daily_reset TEXT,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP,
                last_played TEXT DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users (user_id)
            );
        "#,
    },
    Migration {
        version: 3,
        name: "create_inventory_table",
        sql: r#"
            CREATE TABLE IF NOT EXISTS inventory (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                item_id TEXT NOT NULL,
                item_type TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT DEFAULT '',
                quantity INTEGER DEFAULT 1,
                properties TEXT DEFAULT '{}',
                is_equipped BOOLEAN DEFAULT 0,
                obtained_at TEXT DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users (user_id)
            );
        "#,
    },
    Migration {
        version: 4,
        name: "create_achievements_table",
        sql: r#"
            CREATE TABLE IF NOT EXISTS achievements (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                achievement_id TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                achievement_type TEXT NOT NULL,
                requirements TEXT DEFAULT '{}',
                rewards TEXT DEFAULT '{}',
                is_unlocked BOOLEAN DEFAULT 0,
                progress INTEGER DEFAULT 0,
                max_progress INTEGER DEFAULT 1,
                unlocked_at TEXT,
                is_hidden BOOLEAN DEFAULT 0,
                FOREIGN KEY (user_id) REFERENCES users (user_id),
                UNIQUE(user_id, achievement_id)
            );
        "#,
    },
    Migration {
        version: 5,
        name: "create_daily_quests_table",
        sql: r#"
            CREATE TABLE IF NOT EXISTS daily_quests (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                quest_id TEXT NOT NULL,
                quest_type TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                requirement INTEGER NOT NULL,
                current_progress INTEGER DEFAULT 0,
                reward_experience INTEGER DEFAULT 0,
                reward_gold INTEGER DEFAULT 0,
                reward_item_id TEXT,
                reward_item_name TEXT,
                status TEXT DEFAULT 'active',
                icon TEXT DEFAULT '📋',
                created_at TEXT DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users (user_id),
                UNIQUE(user_id, quest_id)
            );
        "#,
    },
    Migration {
        version: 6,
        name: "create_user_data_table",
        sql: r#"
            CREATE TABLE IF NOT EXISTS user_data (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                key TEXT NOT NULL,
                value TEXT,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users (user_id),
                UNIQUE(user_id, key)
            );
        "#,
    },
    Migration {
        version: 7,
        name: "create_statistics_table",
        sql: r#"
            CREATE TABLE IF NOT EXISTS statistics (
                user_id INTEGER PRIMARY KEY,
                enemies_killed INTEGER DEFAULT 0,
                total_damage_dealt INTEGER DEFAULT 0,
                total_damage_received INTEGER DEFAULT 0,
                critical_hits INTEGER DEFAULT 0,
                blocks_performed INTEGER DEFAULT 0,
                arena_wins INTEGER DEFAULT 0,
                arena_losses INTEGER DEFAULT 0,
                arena_draws INTEGER DEFAULT 0,
                highest_arena_streak INTEGER DEFAULT 0,
                current_arena_streak INTEGER DEFAULT 0,
                dungeons_completed INTEGER DEFAULT 0,
                bosses_defeated INTEGER DEFAULT 0,
                deepest_dungeon_level INTEGER DEFAULT 0,
                gold_earned INTEGER DEFAULT 0,
                gold_spent INTEGER DEFAULT 0,
                items_found INTEGER DEFAULT 0,
                items_sold INTEGER DEFAULT 0,
                total_playtime_hours REAL DEFAULT 0.0,
                sessions_count INTEGER DEFAULT 0,
                quests_completed INTEGER DEFAULT 0,
                daily_streaks INTEGER DEFAULT 0,
                max_daily_streak INTEGER DEFAULT 0,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users (user_id)
            );
        "#,
    },
    Migration {
        version: 8,
        name: "create_core_indexes",
        sql: r#"
            CREATE INDEX IF NOT EXISTS idx_inventory_user_id ON inventory(user_id);
            CREATE INDEX IF NOT EXISTS idx_inventory_equipped ON inventory(user_id, is_equipped);
            CREATE INDEX IF NOT EXISTS idx_achievements_user_id ON achievements(user_id);
            CREATE INDEX IF NOT EXISTS idx_achievements_unlocked ON achievements(user_id, is_unlocked);
            CREATE INDEX IF NOT EXISTS idx_daily_quests_user_id ON daily_quests(user_id);
            CREATE INDEX IF NOT EXISTS idx_daily_quests_status ON daily_quests(user_id, status);
            CREATE INDEX IF NOT EXISTS idx_user_data_key ON user_data(user_id, key);
            CREATE INDEX IF NOT EXISTS idx_characters_level ON characters(level);
            CREATE INDEX IF NOT EXISTS idx_users_active ON users(is_active);
        "#,
    },
    // ============================================================
    // Equipment system (v9+)
    // ============================================================
    Migration {
        version: 9,
        name: "create_player_equipment_table",
        sql: r#"
            CREATE TABLE IF NOT EXISTS player_equipment (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                item_id TEXT NOT NULL,
                upgrade_level INTEGER DEFAULT 0,
                item_type TEXT NOT NULL,
                is_equipped BOOLEAN DEFAULT 0,
                acquired_at TEXT DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users (user_id)
            );
        "#,
    },
    Migration {
        version: 10,
        name: "create_player_materials_table",
        sql: r#"
            CREATE TABLE IF NOT EXISTS player_materials (
                user_id INTEGER PRIMARY KEY,
                gods_stone INTEGER DEFAULT 0,
                mithril_dust INTEGER DEFAULT 0,
                dragon_scale INTEGER DEFAULT 0,
                updated_at TEXT DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users (user_id)
            );
        "#,
    },
    Migration {
        version: 11,
        name: "add_characters_equipment_columns",
        sql: r#"
            ALTER TABLE characters ADD COLUMN equipped_weapon TEXT;
            ALTER TABLE characters ADD COLUMN equipped_armor TEXT;
            ALTER TABLE characters ADD COLUMN weapon_upgrade_level INTEGER DEFAULT 0;
            ALTER TABLE characters ADD COLUMN armor_upgrade_level INTEGER DEFAULT 0;
        "#,
    },
    Migration {
        version: 12,
        name: "add_player_equipment_quantity",
        sql: "ALTER TABLE player_equipment ADD COLUMN quantity INTEGER DEFAULT 1;",
    },
    Migration {
        version: 13,
        name: "create_equipment_indexes",
        sql: r#"
            CREATE INDEX IF NOT EXISTS idx_player_equipment_user ON player_equipment(user_id);
            CREATE INDEX IF NOT EXISTS idx_player_equipment_item ON player_equipment(user_id, item_id);
        "#,
    },
];

/// Create the schema_migrations table if it doesn't exist.
fn ensure_migrations_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// Get the set of already-applied migration versions.
fn get_applied_versions(conn: &Connection) -> rusqlite::Result<std::collections::HashSet<i64>> {
    let mut stmt = conn.prepare("SELECT version FROM schema_migrations")?;
    let versions = stmt
        .query_map([], |row| row.get::<_, i64>(0))?
        .collect::<rusqlite::Result<std::collections::HashSet<i64>>>()?;
    Ok(versions)
}

/// Run all pending migrations.
pub fn run_migrations(conn: &mut Connection) -> rusqlite::Result<()> {
    ensure_migrations_table(conn)?;

    let applied = get_applied_versions(conn)?;

    for migration in MIGRATIONS {
        if applied.contains(&migration.version) {
            continue;
        }

        tracing::info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );

        // Execute the migration SQL and record it within a single transaction for atomicity
        let now = chrono::Utc::now().to_rfc3339();
        let tx = conn.transaction()?;
        let result = tx.execute_batch(migration.sql).and_then(|_| {
            tx.execute(
                "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
                params![migration.version, migration.name, now],
            )
        });
        if let Err(e) = result.and_then(|_| tx.commit()) {
            tracing::error!(
                version = migration.version,
                name = migration.name,
                error = %e,
                "Migration failed"
            );
            return Err(e);
        }

        tracing::info!(
            version = migration.version,
            name = migration.name,
            "Migration applied successfully"
        );
    }

    Ok(())
}
