//! Bearer credential encoding and refresh secret generation.

pub mod claims;
pub mod codec;
pub mod secret;

pub use claims::SessionClaims;
pub use codec::TokenCodec;
pub use secret::RefreshSecret;
