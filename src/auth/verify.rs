//! Signature verification: "here is my signature".

use crate::auth::address::WalletAddress;
use crate::auth::error::AuthError;
use crate::auth::message::{SignInMessage, MESSAGE_VERSION};
use crate::auth::recover::{recover_address, SIGNATURE_LEN};
use crate::config::AuthConfig;
use crate::storage::UserDirectory;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;

/// Account proven to control its wallet key, ready for session issuance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    pub user_id: String,
    pub address: WalletAddress,
}

/// Decode a `0x`/`0X`-prefixed hex signature of exactly 65 bytes.
pub fn decode_signature(raw: &str) -> Result<[u8; SIGNATURE_LEN], AuthError> {
    let raw = raw.trim();
    let hex_part = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or(AuthError::InvalidSignature)?;
    let bytes = hex::decode(hex_part).map_err(|_| AuthError::InvalidSignature)?;
    bytes.try_into().map_err(|_| AuthError::InvalidSignature)
}

#[derive(Clone)]
pub struct VerificationService {
    directory: Arc<dyn UserDirectory>,
    config: Arc<AuthConfig>,
}

impl VerificationService {
    pub fn new(directory: Arc<dyn UserDirectory>, config: Arc<AuthConfig>) -> Self {
        VerificationService { directory, config }
    }

    pub async fn verify(
        &self,
        raw_address: &str,
        signature: &str,
        domain: &str,
        uri: &str,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        self.verify_at(raw_address, signature, domain, uri, Utc::now())
            .await
    }

    /// Verify a signed challenge as of `now`.
    ///
    /// Malformed input is rejected before storage is touched. Once the nonce
    /// has been consumed it stays consumed, whatever the outcome: an expired,
    /// unrecoverable or mismatching attempt cannot be retried against the
    /// same challenge. Only `domain` and `uri` come from the caller; nonce and
    /// issuance time come from the store.
    pub async fn verify_at(
        &self,
        raw_address: &str,
        signature: &str,
        domain: &str,
        uri: &str,
        now: DateTime<Utc>,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        let address = WalletAddress::parse(raw_address)?;
        let signature = decode_signature(signature)?;

        let pending = self
            .directory
            .consume_nonce(&address)
            .await?
            .ok_or(AuthError::NoPendingChallenge)?;
        let challenge = pending.challenge;

        let age = now.signed_duration_since(challenge.issued_at);
        let ttl = TimeDelta::try_seconds(self.config.nonce_ttl_secs as i64)
            .unwrap_or(TimeDelta::MAX);
        if age > ttl {
            let err = AuthError::ChallengeExpired;
            tracing::warn!(action = "auth_failed", reason = err.kind(), address = %address, age_ms = age.num_milliseconds(), "Expired challenge");
            return Err(err);
        }

        let message = SignInMessage {
            domain,
            address: address.as_str(),
            statement: &self.config.statement,
            uri,
            version: MESSAGE_VERSION,
            chain_id: self.config.chain_id,
            nonce: &challenge.nonce,
            issued_at: challenge.issued_at,
        }
        .render();

        let recovered = recover_address(&message, &signature).map_err(|e| {
            let err = AuthError::RecoveryFailed(e);
            tracing::warn!(action = "auth_failed", reason = err.kind(), address = %address, error = %err, "Unrecoverable signature");
            err
        })?;

        if recovered != address {
            let err = AuthError::SignatureMismatch;
            tracing::warn!(action = "auth_failed", reason = err.kind(), address = %address, "Signature does not match address");
            return Err(err);
        }

        Ok(AuthenticatedIdentity {
            user_id: pending.user_id,
            address,
        })
    }
}
