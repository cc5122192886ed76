//! Scripted in-process API used by the coordinator tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Semaphore;

use retoken_core::{
    AccessToken, AuthClient, ClientConfig, CredentialPair, CredentialStore,
    MemoryCredentialStore, RefreshFailedError, RefreshToken, Request, Response, Transport,
    TransportError,
};

pub const REFRESH_PATH: &str = "/auth/refresh";
pub const LOGIN_PATH: &str = "/auth/login";

/// What the refresh endpoint answers.
#[derive(Debug, Clone)]
pub enum RefreshReply {
    /// Rotate to these tokens.
    Rotate {
        access: String,
        refresh: Option<String>,
    },
    /// Answer with this status.
    Status(u16),
    /// Fail without a response.
    Unreachable,
    /// Answer 200 with a body that is not a token pair.
    Garbage,
}

/// A request as the fake API received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    pub path: String,
    pub authorization: Option<String>,
}

/// An API that accepts exactly one access token at a time.
///
/// - `/auth/refresh` answers according to [`RefreshReply`], optionally waiting
///   on a gate first so tests can pile requests up behind it
/// - `/auth/login` issues `login-access` / `login-refresh`
/// - `/public/...` always answers 200
/// - `/always-401` always answers 401
/// - `/offline` fails at the transport level
/// - `/missing` answers 404
/// - anything else answers 200 with the valid token, 401 otherwise
pub struct FakeApi {
    valid_access: Mutex<String>,
    refresh_reply: Mutex<RefreshReply>,
    gate: Option<Arc<Semaphore>>,
    received: Mutex<Vec<Received>>,
    refresh_bodies: Mutex<Vec<serde_json::Value>>,
    refresh_calls: AtomicUsize,
}

impl FakeApi {
    pub fn new(valid_access: &str, refresh_reply: RefreshReply) -> Arc<Self> {
        Arc::new(Self::build(valid_access, refresh_reply, None))
    }

    /// Like [`FakeApi::new`], but every refresh call waits for a permit on the
    /// returned semaphore.
    pub fn gated(valid_access: &str, refresh_reply: RefreshReply) -> (Arc<Self>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let api = Self::build(valid_access, refresh_reply, Some(gate.clone()));
        (Arc::new(api), gate)
    }

    fn build(valid_access: &str, refresh_reply: RefreshReply, gate: Option<Arc<Semaphore>>) -> Self {
        Self {
            valid_access: Mutex::new(valid_access.to_string()),
            refresh_reply: Mutex::new(refresh_reply),
            gate,
            received: Mutex::new(Vec::new()),
            refresh_bodies: Mutex::new(Vec::new()),
            refresh_calls: AtomicUsize::new(0),
        }
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn received(&self) -> Vec<Received> {
        self.received.lock().unwrap().clone()
    }

    pub fn refresh_bodies(&self) -> Vec<serde_json::Value> {
        self.refresh_bodies.lock().unwrap().clone()
    }

    /// Requests other than refresh calls that carried `token`, in arrival order.
    pub fn paths_sent_with(&self, token: &str) -> Vec<String> {
        let expected = format!("Bearer {token}");
        self.received()
            .into_iter()
            .filter(|r| r.path != REFRESH_PATH && r.authorization.as_deref() == Some(&expected))
            .map(|r| r.path)
            .collect()
    }

    fn answer_refresh(&self, request: &Request) -> Result<Response, TransportError> {
        if let Some(body) = request.body() {
            self.refresh_bodies.lock().unwrap().push(body.clone());
        }
        let reply = self.refresh_reply.lock().unwrap().clone();
        match reply {
            RefreshReply::Rotate { access, refresh } => {
                *self.valid_access.lock().unwrap() = access.clone();
                let body = match refresh {
                    Some(refresh) => json!({"accessToken": access, "refreshToken": refresh}),
                    None => json!({"accessToken": access}),
                };
                Ok(Response::json_body(200, &body))
            }
            RefreshReply::Status(status) => Ok(Response::json_body(
                status,
                &json!({"error": "InvalidToken", "message": "refresh token expired"}),
            )),
            RefreshReply::Unreachable => Err(TransportError::Connection {
                message: "connection refused".into(),
            }),
            RefreshReply::Garbage => Ok(Response::json_body(200, &json!({"ok": true}))),
        }
    }
}

#[async_trait]
impl Transport for FakeApi {
    async fn send(&self, request: &Request) -> Result<Response, TransportError> {
        let path = request.route().to_string();
        let authorization = request.header("authorization").map(str::to_string);
        self.received.lock().unwrap().push(Received {
            path: path.clone(),
            authorization: authorization.clone(),
        });

        if path == REFRESH_PATH {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.acquire().await.expect("gate closed").forget();
            }
            return self.answer_refresh(request);
        }

        match path.as_str() {
            LOGIN_PATH => Ok(Response::json_body(
                200,
                &json!({"accessToken": "login-access", "refreshToken": "login-refresh"}),
            )),
            "/always-401" => Ok(Response::empty(401)),
            "/offline" => Err(TransportError::Timeout { duration_ms: 10 }),
            "/missing" => Ok(Response::json_body(404, &json!({"error": "NotFound"}))),
            p if p.starts_with("/public") => Ok(Response::json_body(200, &json!({"public": true}))),
            _ => {
                let valid = format!("Bearer {}", self.valid_access.lock().unwrap());
                if authorization.as_deref() == Some(valid.as_str()) {
                    Ok(Response::json_body(200, &json!({"path": path})))
                } else {
                    Ok(Response::json_body(
                        401,
                        &json!({"error": "ExpiredToken", "message": "jwt expired"}),
                    ))
                }
            }
        }
    }
}

/// A memory store that counts writes.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryCredentialStore,
    sets: AtomicUsize,
    clears: AtomicUsize,
}

impl CountingStore {
    pub fn with_tokens(access: Option<&str>, refresh: Option<&str>) -> Arc<Self> {
        let store = Self::default();
        store.inner.set(CredentialPair::new(
            access.map(AccessToken::new),
            refresh.map(RefreshToken::new),
        ));
        Arc::new(store)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    pub fn access(&self) -> Option<String> {
        self.inner.get().access_token().map(|t| t.as_str().to_string())
    }

    pub fn refresh(&self) -> Option<String> {
        self.inner.get().refresh_token().map(|t| t.as_str().to_string())
    }

    /// Swap in a different access token without counting a write.
    pub fn set_access(&self, access: &str) {
        let current = self.inner.get();
        self.inner.set(CredentialPair::new(
            Some(AccessToken::new(access)),
            current.refresh_token().cloned(),
        ));
    }
}

impl CredentialStore for CountingStore {
    fn get(&self) -> CredentialPair {
        self.inner.get()
    }

    fn set(&self, pair: CredentialPair) {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(pair);
    }

    fn clear(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.inner.clear();
    }
}

/// Counts session-end notifications.
#[derive(Clone, Default)]
pub struct SessionEnds(Arc<AtomicUsize>);

impl SessionEnds {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

pub fn client(api: Arc<FakeApi>, store: Arc<CountingStore>) -> (AuthClient, SessionEnds) {
    let ends = SessionEnds::default();
    let counter = ends.0.clone();
    let client = AuthClient::builder(ClientConfig::default(), store, api)
        .on_session_end(move |_: &RefreshFailedError| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build();
    (client, ends)
}

/// Yield until `condition` holds, failing the test after a generous timeout.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition not reached in time");
}
