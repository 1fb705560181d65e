// Request signing and call lifecycle
pub mod auth;
pub mod clock;
pub mod file_server;
pub mod transport;

// Config directory, logging
pub mod logging;
pub mod state;

// Re-exports for consumers
pub use auth::{
    AuthError, CallError, IdentityMode, RequestAuthenticator, SignedCall, SignedRequest,
    UnsignedRequest,
};
pub use clock::{Clock, NetworkClock, SystemClock};
pub use file_server::{FileServerAuth, VersionData};
pub use state::{AppConfig, AppState, StateError};
pub use transport::{Destination, HttpTransport, Response, Transport, TransportError};
