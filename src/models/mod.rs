// Models module - key manager events and revocation records

pub mod key_manager;
pub mod revoked_token;
pub mod token_revocation;

pub use key_manager::KeyManagerType;
pub use revoked_token::RevokedToken;
pub use token_revocation::{RevocationProperties, TokenRevocationEvent};
