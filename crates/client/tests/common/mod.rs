//! Shared fixtures for authenticator and call lifecycle tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use tokio::sync::Notify;
use url::Url;

use blindauth_client::auth::{AuthenticatorConfig, IdentityMode, RequestAuthenticator, SignedRequest};
use blindauth_client::clock::Clock;
use blindauth_client::transport::{Destination, Response, Transport, TransportError};
use common::crypto::KeyPair;

pub const SEED_HEX: &str = "0123456789abcdef0123456789abcdef00000000000000000000000000000000";
pub const PUBLIC_KEY_HEX: &str = "4cb76fdc6d32278e3f83dbf608360ecc6b65727934b85d2fb86862ff98c46ab7";
pub const SERVER_KEY_HEX: &str =
    "c3b3c6f32f0ab5a57f853cc4f30f5da7fda5624b0c77b3fb0829de562ada081d";
pub const BLINDED_PUBLIC_KEY_HEX: &str =
    "00ef3155c128c047de68d8e51442397c4c81073d9358b93a203dd948517107c0";
pub const BLINDED_SIGNATURE_HEX: &str = "137c3fe5fc9c889fc3aa34398e2a6de31d6ade135a45c73802038e956375af945d1c04aabcefb2dc6bf23400bda5d40193df656d2862a3336afa25ca1d6ff904";
pub const PLAIN_SIGNATURE_HEX: &str = "5f00e1901940c6262f96a00d84ef72e648332bd6bbc34d254792cdd4406e56fb6e812d47ce79d1b54fbe81c2693d97c7cb9c3790a9ba64df12a41e57b830e900";

pub const SERVER_URL: &str = "http://open.example.org";
pub const TIMESTAMP: u64 = 1_700_000_000;

pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_seconds(&self) -> u64 {
        self.0
    }
}

/// In-process transport with controllable latency and outcome
#[derive(Default)]
pub struct MockTransport {
    pub sent: Mutex<Vec<(SignedRequest, Destination)>>,
    calls: AtomicUsize,
    delay: Duration,
    gate: Option<Notify>,
    fail_with: Option<StatusCode>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Every send blocks until [`MockTransport::release`]
    pub fn gated() -> Self {
        Self {
            gate: Some(Notify::new()),
            ..Self::default()
        }
    }

    pub fn failing(status: StatusCode) -> Self {
        Self {
            fail_with: Some(status),
            ..Self::default()
        }
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_waiters();
        }
    }

    /// Number of sends that have started
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn wait_for_calls(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.calls() < count {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("transport was never called");
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        request: SignedRequest,
        destination: &Destination,
    ) -> Result<Response, TransportError> {
        self.sent
            .lock()
            .unwrap()
            .push((request, destination.clone()));

        if let Some(gate) = &self.gate {
            let released = gate.notified();
            self.calls.fetch_add(1, Ordering::SeqCst);
            released.await;
        } else {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.fail_with {
            Some(status) => Err(TransportError::Http {
                status,
                body: "rejected".to_string(),
            }),
            None => Ok(Response {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
                body: Bytes::from_static(b"{}"),
            }),
        }
    }
}

pub fn root_key() -> KeyPair {
    KeyPair::from_hex(SEED_HEX).unwrap()
}

pub fn server_url() -> Url {
    Url::parse(SERVER_URL).unwrap()
}

pub fn url(path: &str) -> Url {
    server_url().join(path).unwrap()
}

pub fn config(mode: IdentityMode, sign_requests: bool) -> AuthenticatorConfig {
    AuthenticatorConfig {
        server_url: server_url(),
        server_public_key: SERVER_KEY_HEX.to_string(),
        sign_requests,
        identity_mode: mode,
    }
}

pub fn authenticator(transport: Arc<MockTransport>, mode: IdentityMode) -> RequestAuthenticator {
    RequestAuthenticator::new(
        config(mode, true),
        root_key(),
        Arc::new(FixedClock(TIMESTAMP)),
        transport,
    )
    .unwrap()
}
