//! The per-source registry.
//!
//! One `Database` owns a remote source identifier, its table engines and
//! the serialization lock. The remote source has no transactional
//! isolation, so two in-flight calls against it could interleave and
//! corrupt the grid; every remote call from every table therefore runs
//! under [`Database::exec`], which admits one caller at a time in
//! submission order.

use std::collections::hash_map::Entry;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rustc_hash::FxHashMap;
use tokio::sync::Mutex;

use crate::client::SheetsClient;
use crate::error::SheetError;
use crate::schema::TableDef;
use crate::table::Table;

/// How long a fetched grid stays good as a diff base before it must be
/// refetched.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Shared per-source state handed to each table engine.
pub(crate) struct DatabaseCore {
    pub(crate) source_id: String,
    pub(crate) client: Arc<dyn SheetsClient>,
    pub(crate) cache_ttl: Duration,
    // tokio's mutex queues waiters fairly, which gives the FIFO ordering
    // the exec contract promises.
    lock: Mutex<()>,
}

impl DatabaseCore {
    /// Run `fut` holding the source's exclusive turn.
    pub(crate) async fn exec<F: Future>(&self, fut: F) -> F::Output {
        let _turn = self.lock.lock().await;
        fut.await
    }
}

pub struct Database {
    core: Arc<DatabaseCore>,
    tables: FxHashMap<String, Table>,
}

impl Database {
    pub fn new(source_id: impl Into<String>, client: Arc<dyn SheetsClient>) -> Self {
        Self::with_cache_ttl(source_id, client, DEFAULT_CACHE_TTL)
    }

    pub fn with_cache_ttl(
        source_id: impl Into<String>,
        client: Arc<dyn SheetsClient>,
        cache_ttl: Duration,
    ) -> Self {
        Database {
            core: Arc::new(DatabaseCore {
                source_id: source_id.into(),
                client,
                cache_ttl,
                lock: Mutex::new(()),
            }),
            tables: FxHashMap::default(),
        }
    }

    pub fn source_id(&self) -> &str {
        &self.core.source_id
    }

    /// Register a table engine under `key`. Fails fast on a malformed
    /// definition; re-registering a key replaces the previous engine.
    pub fn add_table(
        &mut self,
        key: impl Into<String>,
        def: TableDef,
    ) -> Result<&mut Table, SheetError> {
        let key = key.into();
        let table = Table::new(self.core.clone(), key.clone(), def)?;
        tracing::debug!(table = %key, "table added");
        Ok(match self.tables.entry(key) {
            Entry::Occupied(mut slot) => {
                slot.insert(table);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(table),
        })
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.get_mut(name)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Queue `fut` for exclusive execution against this source. At most
    /// one queued future runs at any instant, in submission order.
    pub async fn exec<F: Future>(&self, fut: F) -> F::Output {
        self.core.exec(fut).await
    }
}
