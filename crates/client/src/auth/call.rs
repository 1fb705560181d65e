use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use futures::future::{AbortHandle, Abortable};

use super::authenticator::{RequestAuthenticator, SignedRequest, UnsignedRequest};
use super::{AuthError, CallError};
use crate::transport::Response;

// Lifecycle phase in the low bits, "executed" flag in the high bit.
const UNSTARTED: u8 = 0;
const IN_FLIGHT: u8 = 1;
const COMPLETED: u8 = 2;
const FAILED: u8 = 3;
const CANCELLED: u8 = 4;

const EXECUTED: u8 = 0x80;
const PHASE_MASK: u8 = 0x7f;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Unstarted,
    InFlight,
    Completed,
    Failed,
    Cancelled,
}

impl CallState {
    fn from_word(word: u8) -> Self {
        match word & PHASE_MASK {
            UNSTARTED => CallState::Unstarted,
            IN_FLIGHT => CallState::InFlight,
            COMPLETED => CallState::Completed,
            FAILED => CallState::Failed,
            _ => CallState::Cancelled,
        }
    }
}

/// One authenticated request to a community server
///
/// A call is executed at most once, either with [`SignedCall::enqueue`] or
/// [`SignedCall::send`]. The request is signed on first use and the signed
/// form is kept for the lifetime of the call, so retries must go through
/// [`SignedCall::duplicate`] to get a fresh nonce and timestamp.
///
/// Cloning a `SignedCall` yields another handle to the same call, which is
/// how a call is cancelled from elsewhere.
#[derive(Clone)]
pub struct SignedCall {
    inner: Arc<CallInner>,
}

struct CallInner {
    authenticator: RequestAuthenticator,
    request: UnsignedRequest,
    state: AtomicU8,
    signed: OnceLock<SignedRequest>,
    abort: OnceLock<AbortHandle>,
}

impl fmt::Debug for SignedCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedCall")
            .field("method", &self.inner.request.method)
            .field("url", &self.inner.request.url.as_str())
            .field("state", &self.state())
            .field("executed", &self.is_executed())
            .finish()
    }
}

impl SignedCall {
    pub(crate) fn new(authenticator: RequestAuthenticator, request: UnsignedRequest) -> Self {
        Self {
            inner: Arc::new(CallInner {
                authenticator,
                request,
                state: AtomicU8::new(UNSTARTED),
                signed: OnceLock::new(),
                abort: OnceLock::new(),
            }),
        }
    }

    pub fn request(&self) -> &UnsignedRequest {
        &self.inner.request
    }

    pub fn state(&self) -> CallState {
        CallState::from_word(self.inner.state.load(Ordering::Acquire))
    }

    pub fn is_executed(&self) -> bool {
        self.inner.state.load(Ordering::Acquire) & EXECUTED != 0
    }

    pub fn is_cancelled(&self) -> bool {
        self.state() == CallState::Cancelled
    }

    /// The signed form of the request, computed on first use
    pub fn signed_request(&self) -> Result<&SignedRequest, AuthError> {
        if let Some(signed) = self.inner.signed.get() {
            return Ok(signed);
        }
        let signed = self.inner.authenticator.sign(&self.inner.request)?;
        Ok(self.inner.signed.get_or_init(|| signed))
    }

    /// A fresh, unstarted call for the same request
    pub fn duplicate(&self) -> SignedCall {
        SignedCall::new(
            self.inner.authenticator.clone(),
            self.inner.request.clone(),
        )
    }

    /// Dispatch the call, invoking `callback` with the outcome
    ///
    /// Outside a tokio runtime this returns `NoRuntime` and leaves the call
    /// unstarted. Signing errors are returned here and the callback is not
    /// invoked.
    ///
    /// # Panics
    ///
    /// If the call was already executed.
    pub fn enqueue<F>(&self, callback: F) -> Result<(), CallError>
    where
        F: FnOnce(Result<Response, CallError>) + Send + 'static,
    {
        match self.try_enqueue(callback) {
            Err(CallError::AlreadyExecuted) => panic!("{}", CallError::AlreadyExecuted),
            other => other,
        }
    }

    /// Like [`SignedCall::enqueue`], reporting a second execution as an error
    pub fn try_enqueue<F>(&self, callback: F) -> Result<(), CallError>
    where
        F: FnOnce(Result<Response, CallError>) + Send + 'static,
    {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return Err(CallError::NoRuntime);
        };

        let previous = self.inner.state.fetch_or(EXECUTED, Ordering::AcqRel);
        if previous & EXECUTED != 0 {
            return Err(CallError::AlreadyExecuted);
        }
        if previous & PHASE_MASK == CANCELLED {
            return Err(CallError::Cancelled);
        }

        let signed = match self.signed_request() {
            Ok(signed) => signed.clone(),
            Err(e) => {
                let _ = self.inner.state.compare_exchange(
                    UNSTARTED | EXECUTED,
                    FAILED | EXECUTED,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                );
                tracing::warn!("failed to sign request: {}", e);
                return Err(e.into());
            }
        };

        // registered before going in flight so a racing cancel always finds it
        let (abort_handle, abort_registration) = AbortHandle::new_pair();
        let _ = self.inner.abort.set(abort_handle);

        if self
            .inner
            .state
            .compare_exchange(
                UNSTARTED | EXECUTED,
                IN_FLIGHT | EXECUTED,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return Err(CallError::Cancelled);
        }

        let call = self.inner.clone();
        let transport = self.inner.authenticator.transport().clone();
        let destination = self.inner.authenticator.destination();

        runtime.spawn(async move {
            let sent = Abortable::new(transport.send(signed, &destination), abort_registration);
            let result = match sent.await {
                Ok(result) => result.map_err(CallError::from),
                Err(_aborted) => {
                    tracing::debug!("signed call aborted in flight");
                    return;
                }
            };

            let next = if result.is_ok() { COMPLETED } else { FAILED };
            let won = call
                .state
                .compare_exchange(
                    IN_FLIGHT | EXECUTED,
                    next | EXECUTED,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok();
            if !won {
                tracing::debug!("signed call cancelled before completion, dropping result");
                return;
            }

            if let Err(CallError::Transport(e)) = &result {
                e.log("signed call");
            }
            callback(result);
        });

        Ok(())
    }

    /// Dispatch the call and wait for its outcome
    ///
    /// Dropping the returned future does not cancel the call; use
    /// [`SignedCall::cancel`].
    ///
    /// # Panics
    ///
    /// If the call was already executed.
    pub async fn send(&self) -> Result<Response, CallError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.enqueue(move |result| {
            let _ = tx.send(result);
        })?;
        rx.await.map_err(|_| CallError::Cancelled)?
    }

    /// Synchronous execution is not supported
    ///
    /// Consumes the call: an unstarted call moves to `Failed`, a cancelled
    /// one stays `Cancelled`.
    ///
    /// # Panics
    ///
    /// If the call was already executed.
    pub fn execute_blocking(&self) -> Result<Response, CallError> {
        let previous = self
            .inner
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                if word & EXECUTED != 0 {
                    return None;
                }
                match word & PHASE_MASK {
                    UNSTARTED => Some(FAILED | EXECUTED),
                    phase => Some(phase | EXECUTED),
                }
            });
        if previous.is_err() {
            panic!("{}", CallError::AlreadyExecuted);
        }
        Err(CallError::SynchronousUnsupported)
    }

    /// Cancel the call if it has not finished yet
    ///
    /// Returns `true` if this invocation cancelled the call. Once it has, the
    /// callback will never run. Calling it again, or after completion, is a
    /// no-op returning `false`.
    pub fn cancel(&self) -> bool {
        let mut current = self.inner.state.load(Ordering::Acquire);
        loop {
            let phase = current & PHASE_MASK;
            if phase != UNSTARTED && phase != IN_FLIGHT {
                return false;
            }
            let next = CANCELLED | (current & EXECUTED);
            match self.inner.state.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        if let Some(handle) = self.inner.abort.get() {
            handle.abort();
        }
        tracing::debug!(url = %self.inner.request.url, "signed call cancelled");
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_state_word_decoding() {
        assert_eq!(CallState::from_word(UNSTARTED), CallState::Unstarted);
        assert_eq!(CallState::from_word(IN_FLIGHT | EXECUTED), CallState::InFlight);
        assert_eq!(CallState::from_word(COMPLETED | EXECUTED), CallState::Completed);
        assert_eq!(CallState::from_word(FAILED | EXECUTED), CallState::Failed);
        assert_eq!(CallState::from_word(CANCELLED), CallState::Cancelled);
        assert_eq!(CallState::from_word(CANCELLED | EXECUTED), CallState::Cancelled);
    }
}
