//! Wallet sign-in: nonce challenges, EIP-191 signature recovery and bearer sessions.

pub mod address;
pub mod challenge;
pub mod error;
pub mod message;
pub mod middleware;
pub mod recover;
pub mod session;
pub mod verify;

pub use address::WalletAddress;
pub use challenge::{ChallengeService, IssuedChallenge};
pub use error::AuthError;
pub use middleware::{AppState, AuthSession};
pub use session::{generate_challenge_nonce, generate_session_token};
pub use verify::{AuthenticatedIdentity, VerificationService};
