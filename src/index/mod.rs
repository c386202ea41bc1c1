// Remote file-index collaborator: the engine's fast path for glob queries.
// The service is external; only its query contract is modeled here.

#[cfg(unix)]
pub mod client;
pub mod query;

#[cfg(unix)]
pub use client::SocketIndexClient;
pub use query::{build_query_params, QueryParams, QueryResponse};

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("file index connection failed: {0}")]
    Connect(#[source] std::io::Error),

    #[error("file index I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file index protocol error: {0}")]
    Protocol(String),

    #[error("file index service error: {0}")]
    Service(String),
}

/// Interface to the remote file-index service.
pub trait FileIndex {
    /// Run one query against the given watch root.
    fn query(&mut self, watch_root: &str, params: &QueryParams) -> Result<QueryResponse, IndexError>;

    /// Tear down the connection. Teardown failures are of no interest to
    /// callers and must be swallowed by implementations.
    fn close(&mut self);
}

/// Process-wide flag controlling sync-cookie handling: cookies stay enabled
/// for the first query a process issues and are disabled afterwards.
#[derive(Debug)]
pub struct SyncCookieState {
    use_sync_cookies: bool,
}

impl SyncCookieState {
    pub fn new() -> Self {
        SyncCookieState { use_sync_cookies: true }
    }

    /// True exactly once, on the first call for this process.
    pub fn take(&mut self) -> bool {
        let first = self.use_sync_cookies;
        self.use_sync_cookies = false;
        first
    }
}

impl Default for SyncCookieState {
    fn default() -> Self {
        SyncCookieState::new()
    }
}

/// Memoization key for remote queries: a pure function of the glob
/// arguments and the query root. Sync-cookie state is deliberately not part
/// of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
    pub include_dotfiles: bool,
    pub relative_root: String,
}

/// The single, shared, at-most-one-active remote index connection plus the
/// process-wide caches that ride along with it. Once the connection fails
/// it is cleared and never retried for the remainder of the process.
pub struct IndexState {
    pub client: Option<Box<dyn FileIndex>>,
    pub watch_root: Option<String>,
    pub project_prefix: Option<String>,
    pub sync_cookies: SyncCookieState,
    pub query_cache: HashMap<QueryKey, Vec<String>>,
}

pub type SharedIndexState = Rc<RefCell<IndexState>>;

impl IndexState {
    pub fn new(
        client: Option<Box<dyn FileIndex>>,
        watch_root: Option<String>,
        project_prefix: Option<String>,
    ) -> Self {
        IndexState {
            client,
            watch_root,
            project_prefix,
            sync_cookies: SyncCookieState::new(),
            query_cache: HashMap::new(),
        }
    }

    /// State for a process running without the remote index.
    pub fn disabled() -> Self {
        IndexState::new(None, None, None)
    }

    pub fn shared(self) -> SharedIndexState {
        Rc::new(RefCell::new(self))
    }
}

impl fmt::Debug for IndexState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexState")
            .field("connected", &self.client.is_some())
            .field("watch_root", &self.watch_root)
            .field("project_prefix", &self.project_prefix)
            .field("sync_cookies", &self.sync_cookies)
            .field("cached_queries", &self.query_cache.len())
            .finish()
    }
}
