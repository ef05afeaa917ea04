//! Ledger stores: JSON files on disk or a SQLite database
//!
//! Both serve the bundled sample under the default name until a ledger is
//! uploaded with that name.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use earnings_engine::LedgerStore;
use earnings_engine::constants::DEFAULT_LEDGER_NAME;
use earnings_engine::store::with_default_name;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::{Backend, Config};
use crate::constants;

/// Reject names that would escape the ledger directory
fn check_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
        bail!("Invalid ledger name '{}': use a plain file name such as march.json", name);
    }
    Ok(())
}

// =============================================================================
// File System
// =============================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
struct Settings {
    #[serde(default)]
    current: Option<String>,
    #[serde(default)]
    uploads: BTreeMap<String, DateTime<Utc>>,
}

/// JSON documents under `<data_dir>/ledgers`, bookkeeping in `<data_dir>/settings.json`
pub struct FsLedgerStore {
    ledgers_dir: PathBuf,
    settings_path: PathBuf,
    fallback: String,
}

impl FsLedgerStore {
    pub async fn open(data_dir: &Path, fallback: &str) -> Result<Self> {
        let ledgers_dir = data_dir.join(constants::LEDGERS_DIR);
        tokio::fs::create_dir_all(&ledgers_dir)
            .await
            .with_context(|| format!("Failed to create ledger directory {}", ledgers_dir.display()))?;

        Ok(Self {
            ledgers_dir,
            settings_path: data_dir.join(constants::SETTINGS_FILENAME),
            fallback: fallback.to_string(),
        })
    }

    fn path(&self, name: &str) -> Result<PathBuf> {
        check_name(name)?;
        Ok(self.ledgers_dir.join(name))
    }

    async fn read_settings(&self) -> Result<Settings> {
        match tokio::fs::read_to_string(&self.settings_path).await {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", self.settings_path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", self.settings_path.display())),
        }
    }

    async fn write_settings(&self, settings: &Settings) -> Result<()> {
        let content = serde_json::to_string_pretty(settings)?;
        tokio::fs::write(&self.settings_path, content)
            .await
            .with_context(|| format!("Failed to write {}", self.settings_path.display()))
    }
}

impl LedgerStore for FsLedgerStore {
    async fn load(&self, name: &str) -> Result<Option<String>> {
        let path = self.path(name)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok((name == DEFAULT_LEDGER_NAME).then(|| constants::BUNDLED_LEDGER.to_string()))
            }
            Err(e) => Err(e).with_context(|| format!("Failed to read ledger {}", path.display())),
        }
    }

    async fn save(&self, name: &str, body: &str) -> Result<()> {
        let path = self.path(name)?;
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("Failed to write ledger {}", path.display()))?;

        let mut settings = self.read_settings().await?;
        settings.uploads.insert(name.to_string(), Utc::now());
        self.write_settings(&settings).await?;
        debug!(ledger = name, path = %path.display(), "Ledger saved");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.ledgers_dir)
            .await
            .with_context(|| format!("Failed to list {}", self.ledgers_dir.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(with_default_name(names))
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let path = self.path(name)?;
        let removed = match tokio::fs::remove_file(&path).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(e).with_context(|| format!("Failed to delete {}", path.display())),
        };

        let mut settings = self.read_settings().await?;
        settings.uploads.remove(name);
        if settings.current.as_deref() == Some(name) {
            settings.current = None;
        }
        self.write_settings(&settings).await?;
        Ok(removed)
    }

    async fn timestamp(&self, name: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.read_settings().await?.uploads.get(name).copied())
    }

    async fn current(&self) -> Result<String> {
        Ok(self.read_settings().await?.current.unwrap_or_else(|| self.fallback.clone()))
    }

    async fn set_current(&self, name: &str) -> Result<()> {
        check_name(name)?;
        let mut settings = self.read_settings().await?;
        settings.current = Some(name.to_string());
        self.write_settings(&settings).await
    }
}

// =============================================================================
// SQLite
// =============================================================================

/// Ledgers and settings in one SQLite file
pub struct SqliteLedgerStore {
    pool: SqlitePool,
    fallback: String,
}

#[derive(FromRow)]
struct LedgerRow {
    body: String,
}

#[derive(FromRow)]
struct UploadRow {
    uploaded_at: String,
}

impl SqliteLedgerStore {
    /// Open or create the ledger database
    pub async fn open(path: &Path, fallback: &str) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // SQLx requires the file to exist for SQLite
        if !path.exists() {
            std::fs::File::create(path)?;
        }

        let url = format!("sqlite:{}", path.display());
        let pool = SqlitePool::connect(&url)
            .await
            .context("Failed to open ledger database")?;

        sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;
        sqlx::query("PRAGMA busy_timeout=5000").execute(&pool).await?;

        let store = Self {
            pool,
            fallback: fallback.to_string(),
        };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            "
            -- Uploaded ledger documents
            CREATE TABLE IF NOT EXISTS ledgers (
                name TEXT PRIMARY KEY,
                body TEXT NOT NULL,
                uploaded_at TEXT NOT NULL
            );

            -- Key/value settings such as the selected ledger
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create ledger schema")?;
        Ok(())
    }

    async fn setting(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(v,)| v))
    }
}

impl LedgerStore for SqliteLedgerStore {
    async fn load(&self, name: &str) -> Result<Option<String>> {
        let row: Option<LedgerRow> = sqlx::query_as("SELECT body FROM ledgers WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(match row {
            Some(row) => Some(row.body),
            None => (name == DEFAULT_LEDGER_NAME).then(|| constants::BUNDLED_LEDGER.to_string()),
        })
    }

    async fn save(&self, name: &str, body: &str) -> Result<()> {
        check_name(name)?;
        sqlx::query("INSERT OR REPLACE INTO ledgers (name, body, uploaded_at) VALUES (?, ?, ?)")
            .bind(name)
            .bind(body)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        debug!(ledger = name, "Ledger saved to database");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM ledgers ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(with_default_name(rows.into_iter().map(|(n,)| n).collect()))
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM ledgers WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;

        if self.setting(constants::CURRENT_LEDGER_KEY).await?.as_deref() == Some(name) {
            sqlx::query("DELETE FROM settings WHERE key = ?")
                .bind(constants::CURRENT_LEDGER_KEY)
                .execute(&self.pool)
                .await?;
        }

        Ok(result.rows_affected() > 0)
    }

    async fn timestamp(&self, name: &str) -> Result<Option<DateTime<Utc>>> {
        let row: Option<UploadRow> = sqlx::query_as("SELECT uploaded_at FROM ledgers WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| {
            DateTime::parse_from_rfc3339(&r.uploaded_at)
                .map(|dt| dt.with_timezone(&Utc))
                .with_context(|| format!("Corrupt upload time for ledger '{}'", name))
        })
        .transpose()
    }

    async fn current(&self) -> Result<String> {
        Ok(self
            .setting(constants::CURRENT_LEDGER_KEY)
            .await?
            .unwrap_or_else(|| self.fallback.clone()))
    }

    async fn set_current(&self, name: &str) -> Result<()> {
        check_name(name)?;
        sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
            .bind(constants::CURRENT_LEDGER_KEY)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// =============================================================================
// Backend Selection
// =============================================================================

/// The store chosen by configuration
pub enum Store {
    Fs(FsLedgerStore),
    Sqlite(SqliteLedgerStore),
}

impl Store {
    pub async fn open(config: &Config) -> Result<Self> {
        debug!(backend = ?config.backend, data_dir = %config.data_dir.display(), "Opening ledger store");
        Ok(match config.backend {
            Backend::Fs => Self::Fs(FsLedgerStore::open(&config.data_dir, &config.default_ledger).await?),
            Backend::Sqlite => {
                let path = config.data_dir.join(constants::DATABASE_FILENAME);
                Self::Sqlite(SqliteLedgerStore::open(&path, &config.default_ledger).await?)
            }
        })
    }
}

impl LedgerStore for Store {
    async fn load(&self, name: &str) -> Result<Option<String>> {
        match self {
            Self::Fs(s) => s.load(name).await,
            Self::Sqlite(s) => s.load(name).await,
        }
    }

    async fn save(&self, name: &str, body: &str) -> Result<()> {
        match self {
            Self::Fs(s) => s.save(name, body).await,
            Self::Sqlite(s) => s.save(name, body).await,
        }
    }

    async fn list(&self) -> Result<Vec<String>> {
        match self {
            Self::Fs(s) => s.list().await,
            Self::Sqlite(s) => s.list().await,
        }
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        match self {
            Self::Fs(s) => s.delete(name).await,
            Self::Sqlite(s) => s.delete(name).await,
        }
    }

    async fn timestamp(&self, name: &str) -> Result<Option<DateTime<Utc>>> {
        match self {
            Self::Fs(s) => s.timestamp(name).await,
            Self::Sqlite(s) => s.timestamp(name).await,
        }
    }

    async fn current(&self) -> Result<String> {
        match self {
            Self::Fs(s) => s.current().await,
            Self::Sqlite(s) => s.current().await,
        }
    }

    async fn set_current(&self, name: &str) -> Result<()> {
        match self {
            Self::Fs(s) => s.set_current(name).await,
            Self::Sqlite(s) => s.set_current(name).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use earnings_engine::{LedgerOptions, Session, SystemClock};
    use std::sync::Arc;

    const UPLOAD: &str = r#"{
        "metadata": { "userName": "Upload", "utcOffset": "+00:00", "operationalStatus": true },
        "transactions": []
    }"#;

    async fn exercise(store: &impl LedgerStore) {
        // bundled default before any upload
        let bundled = store.load(DEFAULT_LEDGER_NAME).await.unwrap().unwrap();
        assert!(bundled.contains("transactions"));
        assert!(store.load("march.json").await.unwrap().is_none());
        assert_eq!(store.list().await.unwrap(), vec![DEFAULT_LEDGER_NAME]);
        assert_eq!(store.current().await.unwrap(), DEFAULT_LEDGER_NAME);

        store.save("march.json", UPLOAD).await.unwrap();
        assert_eq!(store.load("march.json").await.unwrap().as_deref(), Some(UPLOAD));
        assert!(store.timestamp("march.json").await.unwrap().is_some());
        assert_eq!(store.list().await.unwrap(), vec![DEFAULT_LEDGER_NAME, "march.json"]);

        store.set_current("march.json").await.unwrap();
        assert_eq!(store.current().await.unwrap(), "march.json");

        assert!(store.delete("march.json").await.unwrap());
        assert_eq!(store.current().await.unwrap(), DEFAULT_LEDGER_NAME);
        assert!(store.timestamp("march.json").await.unwrap().is_none());
        assert!(!store.delete("march.json").await.unwrap());
    }

    #[tokio::test]
    async fn fs_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsLedgerStore::open(dir.path(), DEFAULT_LEDGER_NAME).await.unwrap();
        exercise(&store).await;
    }

    #[tokio::test]
    async fn sqlite_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteLedgerStore::open(&dir.path().join("ledgers.db"), DEFAULT_LEDGER_NAME)
            .await
            .unwrap();
        exercise(&store).await;
    }

    #[tokio::test]
    async fn rejects_path_like_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsLedgerStore::open(dir.path(), DEFAULT_LEDGER_NAME).await.unwrap();
        assert!(store.save("../escape.json", UPLOAD).await.is_err());
        assert!(store.load("nested/ledger.json").await.is_err());
    }

    #[tokio::test]
    async fn bundled_ledger_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsLedgerStore::open(dir.path(), DEFAULT_LEDGER_NAME).await.unwrap();
        let mut session = Session::new(Arc::new(SystemClock), LedgerOptions::default());
        assert!(session.load_from(&store, DEFAULT_LEDGER_NAME).await.unwrap());
        assert!(!session.ledger_name().unwrap_or_default().is_empty());
    }
}
