//! Named ledger persistence
//!
//! Backends live with the application; the engine only needs the trait.
//! [`MemoryLedgerStore`] backs tests and one-shot runs.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::constants;

/// Load/save/list/delete for named JSON ledger documents
pub trait LedgerStore: Send + Sync {
    /// Raw document body, `None` when no ledger has that name
    fn load(&self, name: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Store `body` under `name` and record the upload time
    fn save(&self, name: &str, body: &str) -> impl Future<Output = Result<()>> + Send;

    /// Stored names, always including the default ledger
    fn list(&self) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Remove a ledger; returns whether anything was removed
    fn delete(&self, name: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Upload time of a stored ledger
    fn timestamp(&self, name: &str) -> impl Future<Output = Result<Option<DateTime<Utc>>>> + Send;

    /// Name of the selected ledger, the default when none was selected
    fn current(&self) -> impl Future<Output = Result<String>> + Send;

    fn set_current(&self, name: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Keep `names` sorted and make sure the default ledger is listed first
pub fn with_default_name(mut names: Vec<String>) -> Vec<String> {
    names.retain(|n| n != constants::DEFAULT_LEDGER_NAME);
    names.sort();
    names.insert(0, constants::DEFAULT_LEDGER_NAME.to_string());
    names
}

#[derive(Default)]
struct MemoryState {
    ledgers: BTreeMap<String, (String, DateTime<Utc>)>,
    current: Option<String>,
}

/// Process-local store
#[derive(Default)]
pub struct MemoryLedgerStore {
    state: Mutex<MemoryState>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LedgerStore for MemoryLedgerStore {
    async fn load(&self, name: &str) -> Result<Option<String>> {
        Ok(self.state().ledgers.get(name).map(|(body, _)| body.clone()))
    }

    async fn save(&self, name: &str, body: &str) -> Result<()> {
        self.state()
            .ledgers
            .insert(name.to_string(), (body.to_string(), Utc::now()));
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>> {
        Ok(with_default_name(self.state().ledgers.keys().cloned().collect()))
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let mut state = self.state();
        let removed = state.ledgers.remove(name).is_some();
        if state.current.as_deref() == Some(name) {
            state.current = None;
        }
        Ok(removed)
    }

    async fn timestamp(&self, name: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.state().ledgers.get(name).map(|(_, at)| *at))
    }

    async fn current(&self) -> Result<String> {
        Ok(self
            .state()
            .current
            .clone()
            .unwrap_or_else(|| constants::DEFAULT_LEDGER_NAME.to_string()))
    }

    async fn set_current(&self, name: &str) -> Result<()> {
        self.state().current = Some(name.to_string());
        Ok(())
    }
}
