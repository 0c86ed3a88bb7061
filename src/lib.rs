//! Session token lifecycle library.
//!
//! Issues, validates, refreshes and revokes short-lived bearer credentials
//! for HTTP services, with Redis as the session backend. The bearer string
//! is a signed JWT wrapped in an AES-256-GCM encryption pass; revocation is
//! server-side, so possession of a well-formed unexpired token is necessary
//! but not sufficient.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod error;
pub mod gate;
pub mod metrics;
pub mod session;
pub mod storage;
pub mod token;

// Re-exports for convenience
pub use config::AuthConfig;
pub use engine::{TokenEngine, TokenResponse};
pub use error::AuthError;
pub use gate::{authenticate, AuthContext, Gate, RequestMeta};
pub use session::{AuthId, SessionId, SessionRecord, TokenInput};
pub use storage::{MemorySessionStore, RedisSessionStore, SessionStore};
pub use token::TokenCodec;
