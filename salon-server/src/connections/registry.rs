//! Per-user database session registry
//!
//! ```text
//! login ──► acquire(identity, credentials, role)
//!              │ read lock: existing session? ──► return it
//!              │
//!              │ (no lock) open + SET ROLE ── PendingConnection guard
//!              ▼
//!           write lock: compare-and-set
//!              ├── slot empty  ──► insert Session, return it
//!              └── slot taken  ──► close ours, return the winner
//!
//! logout ──► evict(identity)
//! admin login / shutdown ──► evict_all(keep)
//! ```
//!
//! The map lock is never held across an await; all database I/O happens
//! outside of it.

use parking_lot::RwLock;
use shared::client::{ConnectionInfo, ConnectionsInfo};
use shared::util::format_elapsed;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{
    ConnectParams, ConnectionError, Credentials, Role, Session, SessionInfo, SessionOpener,
};

const CONNECTED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

type SharedSession<O> = Arc<Session<<O as SessionOpener>::Connection>>;

/// Registry of live per-user sessions, keyed by identity (email)
pub struct ConnectionRegistry<O: SessionOpener> {
    params: ConnectParams,
    opener: Arc<O>,
    /// identity → session
    sessions: RwLock<HashMap<String, SharedSession<O>>>,
    next_id: AtomicU64,
}

impl<O: SessionOpener> ConnectionRegistry<O> {
    pub fn new(params: ConnectParams, opener: O) -> Self {
        tracing::info!(
            host = %params.host,
            port = params.port,
            database = %params.database,
            "User connection registry initialized"
        );
        Self {
            params,
            opener: Arc::new(opener),
            sessions: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn opener(&self) -> &O {
        &self.opener
    }

    /// Return the session for `identity`, opening one if there is none
    ///
    /// An existing session is returned as-is; the credentials and role of
    /// this call are ignored in that case.
    pub async fn acquire(
        &self,
        identity: &str,
        credentials: &Credentials,
        role: &str,
    ) -> Result<SharedSession<O>, ConnectionError> {
        if identity.is_empty() {
            return Err(ConnectionError::EmptyIdentity);
        }

        if let Some(existing) = self.get(identity) {
            tracing::debug!(identity = %identity, "Reusing existing connection");
            return Ok(existing);
        }

        let role: Role = role.parse()?;

        tracing::info!(identity = %identity, role = %role, "Creating new user connection");
        let conn = self
            .opener
            .open(&self.params, credentials)
            .await
            .map_err(ConnectionError::ConnectionFailure)?;
        let mut pending = PendingConnection::new(Arc::clone(&self.opener), conn);

        let activated = self.opener.activate_role(pending.connection(), role).await;
        if let Err(source) = activated {
            pending.release().await;
            return Err(ConnectionError::RoleActivationFailure {
                role: role.db_role(),
                source,
            });
        }

        match self.commit(identity, role, pending) {
            Ok((session, total)) => {
                tracing::info!(
                    identity = %identity,
                    role = %role,
                    db_role = role.db_role(),
                    total,
                    "User connection established"
                );
                Ok(session)
            }
            Err((winner, pending)) => {
                tracing::debug!(identity = %identity, "Lost connection race, closing duplicate");
                pending.release().await;
                Ok(winner)
            }
        }
    }

    /// Insert under the write lock unless another acquire got there first
    #[allow(clippy::type_complexity)]
    fn commit(
        &self,
        identity: &str,
        role: Role,
        pending: PendingConnection<O>,
    ) -> Result<(SharedSession<O>, usize), (SharedSession<O>, PendingConnection<O>)> {
        let mut sessions = self.sessions.write();
        if let Some(winner) = sessions.get(identity) {
            return Err((Arc::clone(winner), pending));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let session = Arc::new(Session::new(
            id,
            identity.to_string(),
            role,
            pending.into_inner(),
        ));
        sessions.insert(identity.to_string(), Arc::clone(&session));
        Ok((session, sessions.len()))
    }

    /// Close and remove the session for `identity`
    ///
    /// Returns `false` when there was nothing to evict. Close failures are
    /// logged, never returned.
    pub async fn evict(&self, identity: &str) -> bool {
        let removed = self.sessions.write().remove(identity);
        let Some(session) = removed else {
            tracing::debug!(identity = %identity, "No user connection to close");
            return false;
        };

        self.close_session(&session).await;
        tracing::info!(
            identity = %identity,
            remaining = self.len(),
            "User connection closed"
        );
        true
    }

    /// Evict `session` if it is still the one registered for its identity
    ///
    /// Used when a session's connection turns out to be dead. A newer session
    /// registered under the same identity is left alone.
    pub async fn evict_session(&self, session: &SharedSession<O>) -> bool {
        let removed = {
            let mut sessions = self.sessions.write();
            let registered = sessions
                .get(session.identity())
                .is_some_and(|current| Arc::ptr_eq(current, session));
            if registered {
                sessions.remove(session.identity())
            } else {
                None
            }
        };
        let Some(session) = removed else {
            return false;
        };

        self.close_session(&session).await;
        tracing::info!(
            identity = %session.identity(),
            remaining = self.len(),
            "Broken user connection discarded"
        );
        true
    }

    /// Close and remove every session whose identity `keep` rejects
    ///
    /// Returns the number of sessions evicted.
    pub async fn evict_all<F>(&self, keep: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let evicted: Vec<SharedSession<O>> = {
            let mut sessions = self.sessions.write();
            let doomed: Vec<String> = sessions
                .keys()
                .filter(|identity| !keep(identity.as_str()))
                .cloned()
                .collect();
            doomed
                .iter()
                .filter_map(|identity| sessions.remove(identity))
                .collect()
        };

        tracing::info!(count = evicted.len(), "Closing user connections");
        for session in &evicted {
            self.close_session(session).await;
        }
        tracing::info!(
            evicted = evicted.len(),
            remaining = self.len(),
            "User connections closed"
        );
        evicted.len()
    }

    /// Evict everything, sentinel included
    pub async fn shutdown(&self) -> usize {
        tracing::info!("Shutting down user connection registry");
        self.evict_all(|_| false).await
    }

    async fn close_session(&self, session: &Session<O::Connection>) {
        tracing::info!(
            identity = %session.identity(),
            duration = %format_elapsed(session.elapsed()),
            "Closing user connection"
        );
        // Waits for an in-flight query on this session
        let Some(conn) = session.take_connection().await else {
            return;
        };
        if let Err(e) = self.opener.close(conn).await {
            tracing::warn!(
                identity = %session.identity(),
                error = %e,
                "Failed to close user connection"
            );
        }
    }

    pub fn get(&self, identity: &str) -> Option<SharedSession<O>> {
        self.sessions.read().get(identity).cloned()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.sessions.read().contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Identities with a live session, sorted
    pub fn identities(&self) -> Vec<String> {
        let mut identities: Vec<String> = self.sessions.read().keys().cloned().collect();
        identities.sort();
        identities
    }

    /// Metadata of every live session, oldest first
    pub fn snapshot(&self) -> Vec<SessionInfo> {
        let mut infos: Vec<SessionInfo> = self
            .sessions
            .read()
            .values()
            .map(|session| session.info())
            .collect();
        infos.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.identity.cmp(&b.identity))
        });
        infos
    }

    /// Diagnostics payload for the connections status endpoint
    pub fn connections_info(&self) -> ConnectionsInfo {
        let connections: Vec<ConnectionInfo> = self
            .snapshot()
            .into_iter()
            .map(|info| ConnectionInfo {
                user: info.identity,
                role: info.role.label().to_string(),
                connected: info.created_at.format(CONNECTED_AT_FORMAT).to_string(),
                duration: format_elapsed(info.duration),
            })
            .collect();
        ConnectionsInfo {
            total_count: connections.len(),
            connections,
        }
    }

    pub fn log_status(&self) {
        let snapshot = self.snapshot();
        tracing::info!(total = snapshot.len(), "Active user connections");
        for info in &snapshot {
            tracing::info!(
                identity = %info.identity,
                role = %info.role,
                connected = %info.created_at.format(CONNECTED_AT_FORMAT),
                duration = %format_elapsed(info.duration),
                "  connection"
            );
        }
    }
}

/// A connection opened by `acquire` but not yet registered
///
/// Dropping it while still armed (the acquire future was cancelled) hands
/// the connection to the runtime to be closed.
struct PendingConnection<O: SessionOpener> {
    opener: Arc<O>,
    conn: Option<O::Connection>,
}

impl<O: SessionOpener> PendingConnection<O> {
    fn new(opener: Arc<O>, conn: O::Connection) -> Self {
        Self {
            opener,
            conn: Some(conn),
        }
    }

    fn connection(&mut self) -> &mut O::Connection {
        self.conn
            .as_mut()
            .expect("pending connection is only taken by consuming methods")
    }

    fn into_inner(mut self) -> O::Connection {
        self.conn
            .take()
            .expect("pending connection is only taken by consuming methods")
    }

    async fn release(mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        if let Err(e) = self.opener.close(conn).await {
            tracing::warn!(error = %e, "Failed to close unregistered connection");
        }
    }
}

impl<O: SessionOpener> Drop for PendingConnection<O> {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let opener = Arc::clone(&self.opener);
                handle.spawn(async move {
                    if let Err(e) = opener.close(conn).await {
                        tracing::warn!(error = %e, "Failed to close abandoned connection");
                    }
                });
            }
            Err(_) => {
                tracing::warn!("No runtime to close abandoned connection, dropping it");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connections::BoxError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::time::Duration;

    #[derive(Debug)]
    struct FakeConn {
        serial: usize,
        username: String,
        role: Option<Role>,
    }

    #[derive(Default)]
    struct FakeOpener {
        opened: AtomicUsize,
        closed: AtomicUsize,
        fail_open: AtomicBool,
        fail_role: AtomicBool,
        fail_close: AtomicBool,
        role_delay: Option<Duration>,
    }

    #[async_trait]
    impl SessionOpener for FakeOpener {
        type Connection = FakeConn;

        async fn open(
            &self,
            _params: &ConnectParams,
            credentials: &Credentials,
        ) -> Result<FakeConn, BoxError> {
            if self.fail_open.load(Ordering::SeqCst) {
                return Err("Access denied".into());
            }
            let serial = self.opened.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(FakeConn {
                serial,
                username: credentials.username().to_string(),
                role: None,
            })
        }

        async fn activate_role(&self, conn: &mut FakeConn, role: Role) -> Result<(), BoxError> {
            if let Some(delay) = self.role_delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_role.load(Ordering::SeqCst) {
                return Err("role not granted".into());
            }
            conn.role = Some(role);
            Ok(())
        }

        async fn close(&self, _conn: FakeConn) -> Result<(), BoxError> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            if self.fail_close.load(Ordering::SeqCst) {
                return Err("connection reset".into());
            }
            Ok(())
        }
    }

    fn registry(opener: FakeOpener) -> ConnectionRegistry<FakeOpener> {
        ConnectionRegistry::new(ConnectParams::new("localhost", 3306, "salondb"), opener)
    }

    fn creds(user: &str) -> Credentials {
        Credentials::new(user, "secret")
    }

    fn opened(r: &ConnectionRegistry<FakeOpener>) -> usize {
        r.opener.opened.load(Ordering::SeqCst)
    }

    fn closed(r: &ConnectionRegistry<FakeOpener>) -> usize {
        r.opener.closed.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_login_logout_scenario() {
        let r = registry(FakeOpener::default());

        r.acquire("alice@example.com", &creds("alice@example.com"), "client")
            .await
            .unwrap();
        assert_eq!(r.len(), 1);

        r.acquire("bob@example.com", &creds("bob@example.com"), "employee")
            .await
            .unwrap();
        assert_eq!(r.len(), 2);

        assert!(r.evict("alice@example.com").await);
        assert_eq!(r.identities(), vec!["bob@example.com".to_string()]);

        assert_eq!(r.evict_all(|_| false).await, 1);
        assert!(r.is_empty());
        assert_eq!(opened(&r), 2);
        assert_eq!(closed(&r), 2);
    }

    #[tokio::test]
    async fn test_acquire_activates_mapped_role_with_user_credentials() {
        let r = registry(FakeOpener::default());
        let session = r
            .acquire("carol@example.com", &creds("carol@example.com"), "employee")
            .await
            .unwrap();

        assert_eq!(session.identity(), "carol@example.com");
        assert_eq!(session.role(), Role::Employee);
        let conn = session.connection().await.unwrap();
        assert_eq!(conn.username, "carol@example.com");
        assert_eq!(conn.role, Some(Role::Employee));
    }

    #[tokio::test]
    async fn test_acquire_is_idempotent() {
        let r = registry(FakeOpener::default());
        let first = r
            .acquire("alice@example.com", &creds("alice@example.com"), "client")
            .await
            .unwrap();
        let second = r
            .acquire("alice@example.com", &creds("someone-else"), "admin")
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.role(), Role::Client);
        assert_eq!(opened(&r), 1);
        assert_eq!(r.len(), 1);
    }

    #[tokio::test]
    async fn test_evict_then_acquire_opens_fresh_session() {
        let r = registry(FakeOpener::default());
        let first = r
            .acquire("alice@example.com", &creds("alice@example.com"), "client")
            .await
            .unwrap();
        assert!(r.evict("alice@example.com").await);

        let second = r
            .acquire("alice@example.com", &creds("alice@example.com"), "client")
            .await
            .unwrap();
        assert_ne!(first.id(), second.id());
        assert!(second.created_at() >= first.created_at());
        assert_eq!(second.connection().await.unwrap().serial, 2);
        // The evicted handle no longer reaches a connection
        assert!(first.connection().await.is_none());
    }

    #[tokio::test]
    async fn test_evict_all_keeps_sentinel() {
        let r = registry(FakeOpener::default());
        for (identity, role) in [
            ("admin@bebacoiffure.com", "admin"),
            ("alice@example.com", "client"),
            ("bob@example.com", "employee"),
        ] {
            r.acquire(identity, &creds(identity), role).await.unwrap();
        }

        let evicted = r.evict_all(|id| id == "admin@bebacoiffure.com").await;
        assert_eq!(evicted, 2);
        assert_eq!(r.identities(), vec!["admin@bebacoiffure.com".to_string()]);
        assert_eq!(closed(&r), 2);
    }

    #[tokio::test]
    async fn test_shutdown_evicts_sentinel_too() {
        let r = registry(FakeOpener::default());
        r.acquire("admin@bebacoiffure.com", &creds("admin"), "admin")
            .await
            .unwrap();
        r.acquire("alice@example.com", &creds("alice"), "client")
            .await
            .unwrap();

        assert_eq!(r.shutdown().await, 2);
        assert!(r.is_empty());
        assert_eq!(closed(&r), 2);
    }

    #[tokio::test]
    async fn test_invalid_role_leaves_registry_unchanged() {
        let r = registry(FakeOpener::default());
        r.acquire("bob@example.com", &creds("bob"), "employee")
            .await
            .unwrap();

        let err = r
            .acquire("alice@example.com", &creds("alice"), "superuser")
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectionError::InvalidRole(ref l) if l == "superuser"));
        assert_eq!(r.identities(), vec!["bob@example.com".to_string()]);
        assert_eq!(opened(&r), 1);
    }

    #[tokio::test]
    async fn test_empty_identity_rejected() {
        let r = registry(FakeOpener::default());
        let err = r.acquire("", &creds("x"), "client").await.unwrap_err();
        assert!(matches!(err, ConnectionError::EmptyIdentity));
        assert_eq!(opened(&r), 0);
    }

    #[tokio::test]
    async fn test_connection_failure_registers_nothing() {
        let opener = FakeOpener::default();
        opener.fail_open.store(true, Ordering::SeqCst);
        let r = registry(opener);

        let err = r
            .acquire("alice@example.com", &creds("alice"), "client")
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectionError::ConnectionFailure(_)));
        assert!(r.is_empty());
    }

    #[tokio::test]
    async fn test_role_failure_closes_opened_connection() {
        let opener = FakeOpener::default();
        opener.fail_role.store(true, Ordering::SeqCst);
        let r = registry(opener);

        let err = r
            .acquire("alice@example.com", &creds("alice"), "client")
            .await
            .unwrap_err();
        match err {
            ConnectionError::RoleActivationFailure { role, .. } => assert_eq!(role, "rol_cliente"),
            other => panic!("expected RoleActivationFailure, got {other:?}"),
        }
        assert!(r.is_empty());
        assert_eq!(opened(&r), 1);
        assert_eq!(closed(&r), 1);
    }

    #[tokio::test]
    async fn test_evict_absent_is_noop() {
        let r = registry(FakeOpener::default());
        assert!(!r.evict("nobody@example.com").await);
        assert_eq!(closed(&r), 0);
    }

    #[tokio::test]
    async fn test_evict_swallows_close_failure() {
        let opener = FakeOpener::default();
        opener.fail_close.store(true, Ordering::SeqCst);
        let r = registry(opener);
        r.acquire("alice@example.com", &creds("alice"), "client")
            .await
            .unwrap();

        assert!(r.evict("alice@example.com").await);
        assert!(!r.contains("alice@example.com"));
        assert_eq!(closed(&r), 1);
    }

    #[tokio::test]
    async fn test_evict_waits_for_in_flight_query() {
        let r = Arc::new(registry(FakeOpener::default()));
        let session = r
            .acquire("alice@example.com", &creds("alice"), "client")
            .await
            .unwrap();
        let guard = session.connection().await.unwrap();

        let evicting = {
            let r = Arc::clone(&r);
            tokio::spawn(async move { r.evict("alice@example.com").await })
        };

        // Unregistered at once, closed only after the query finishes
        for _ in 0..50 {
            if !r.contains("alice@example.com") {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(!r.contains("alice@example.com"));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(closed(&r), 0);
        assert!(!evicting.is_finished());

        drop(guard);
        assert!(evicting.await.unwrap());
        assert_eq!(closed(&r), 1);
        assert!(session.connection().await.is_none());
    }

    #[tokio::test]
    async fn test_evict_session_only_removes_that_session() {
        let r = registry(FakeOpener::default());
        let stale = r
            .acquire("alice@example.com", &creds("alice"), "client")
            .await
            .unwrap();
        assert!(r.evict("alice@example.com").await);
        let fresh = r
            .acquire("alice@example.com", &creds("alice"), "client")
            .await
            .unwrap();

        assert!(!r.evict_session(&stale).await);
        assert!(Arc::ptr_eq(&r.get("alice@example.com").unwrap(), &fresh));
        assert_eq!(closed(&r), 1);

        assert!(r.evict_session(&fresh).await);
        assert!(r.is_empty());
        assert_eq!(closed(&r), 2);

        // Next login opens a new connection
        r.acquire("alice@example.com", &creds("alice"), "client")
            .await
            .unwrap();
        assert_eq!(opened(&r), 3);
    }

    #[tokio::test]
    async fn test_dropped_acquire_releases_connection() {
        let r = registry(FakeOpener {
            role_delay: Some(Duration::from_millis(200)),
            ..Default::default()
        });

        let result = tokio::time::timeout(
            Duration::from_millis(20),
            r.acquire("alice@example.com", &creds("alice"), "client"),
        )
        .await;
        assert!(result.is_err());

        // Close runs on a spawned task
        for _ in 0..50 {
            if closed(&r) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(opened(&r), 1);
        assert_eq!(closed(&r), 1);
        assert!(r.is_empty());
    }

    #[tokio::test]
    async fn test_connections_info_payload() {
        let r = registry(FakeOpener::default());
        r.acquire("alice@example.com", &creds("alice"), "client")
            .await
            .unwrap();

        let info = r.connections_info();
        assert_eq!(info.total_count, 1);
        let entry = &info.connections[0];
        assert_eq!(entry.user, "alice@example.com");
        assert_eq!(entry.role, "client");
        // YYYY-MM-DD HH:MM:SS
        assert_eq!(entry.connected.len(), 19);
        assert!(!entry.duration.is_empty());

        let snapshot = r.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].identity, "alice@example.com");
        r.log_status();
    }

    #[tokio::test]
    async fn test_get_returns_live_session() {
        let r = registry(FakeOpener::default());
        assert!(r.get("alice@example.com").is_none());
        let session = r
            .acquire("alice@example.com", &creds("alice"), "client")
            .await
            .unwrap();
        let found = r.get("alice@example.com").unwrap();
        assert!(Arc::ptr_eq(&session, &found));
    }
}
