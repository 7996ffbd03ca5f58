use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};

use super::Role;

/// One user's live database session
///
/// Built completely before it is published in the registry, so readers
/// never see a half-initialised entry. The connection sits behind an async
/// mutex: requests running as this user hold it for the length of a query,
/// and eviction takes it out once the in-flight query is done.
pub struct Session<C> {
    id: u64,
    identity: String,
    role: Role,
    created_at: DateTime<Utc>,
    started: Instant,
    connection: Mutex<Option<C>>,
}

impl<C> Session<C> {
    pub(crate) fn new(id: u64, identity: String, role: Role, connection: C) -> Self {
        Self {
            id,
            identity,
            role,
            created_at: Utc::now(),
            started: Instant::now(),
            connection: Mutex::new(Some(connection)),
        }
    }

    /// Serial assigned on registration, unique per registered session
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Lock the connection for exclusive use
    ///
    /// Returns `None` once the session has been evicted.
    pub async fn connection(&self) -> Option<MappedMutexGuard<'_, C>> {
        MutexGuard::try_map(self.connection.lock().await, Option::as_mut).ok()
    }

    pub(crate) async fn take_connection(&self) -> Option<C> {
        self.connection.lock().await.take()
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            identity: self.identity.clone(),
            role: self.role,
            created_at: self.created_at,
            duration: self.elapsed(),
        }
    }
}

impl<C> std::fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("identity", &self.identity)
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Point-in-time view of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub identity: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub duration: Duration,
}
