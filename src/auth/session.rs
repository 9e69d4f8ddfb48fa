//! Token and nonce generation for wallet sign-in.

use base64::{engine::general_purpose, Engine as _};
use rand::Rng;
use zeroize::Zeroizing;

/// Random bytes per challenge nonce (128 bits).
pub const NONCE_BYTES: usize = 16;

/// Random bytes per bearer session token (256 bits).
pub const SESSION_TOKEN_BYTES: usize = 32;

/// Fill `N` bytes from the thread-local CSPRNG, wiped on drop.
fn random_bytes<const N: usize>() -> Zeroizing<[u8; N]> {
    let mut bytes = Zeroizing::new([0u8; N]);
    rand::rng().fill(&mut bytes[..]);
    bytes
}

/// Opaque bearer token handed out after a successful wallet sign-in.
///
/// 44 base64 characters.
pub fn generate_session_token() -> String {
    let bytes = random_bytes::<SESSION_TOKEN_BYTES>();
    general_purpose::STANDARD.encode(&bytes[..])
}

/// Nonce embedded in a sign-in message. 32 lowercase hex characters.
pub fn generate_challenge_nonce() -> String {
    let bytes = random_bytes::<NONCE_BYTES>();
    hex::encode(&bytes[..])
}
