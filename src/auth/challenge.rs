//! Challenge issuance: "give me something to sign".

use crate::auth::address::WalletAddress;
use crate::auth::error::AuthError;
use crate::auth::message::{SignInMessage, MESSAGE_VERSION};
use crate::auth::session::generate_challenge_nonce;
use crate::config::AuthConfig;
use crate::models::NonceChallenge;
use crate::storage::UserDirectory;
use chrono::{DateTime, SubsecRound, Utc};
use std::sync::Arc;

/// A freshly issued challenge.
#[derive(Debug, Clone)]
pub struct IssuedChallenge {
    pub user_id: String,
    pub address: WalletAddress,
    pub nonce: String,
    pub issued_at: DateTime<Utc>,
    pub statement: String,
    pub domain: String,
    pub uri: String,
    /// Exact text the wallet must sign.
    pub message: String,
}

#[derive(Clone)]
pub struct ChallengeService {
    directory: Arc<dyn UserDirectory>,
    config: Arc<AuthConfig>,
}

impl ChallengeService {
    pub fn new(directory: Arc<dyn UserDirectory>, config: Arc<AuthConfig>) -> Self {
        ChallengeService { directory, config }
    }

    pub async fn issue_challenge(
        &self,
        raw_address: &str,
        domain: &str,
        uri: &str,
    ) -> Result<IssuedChallenge, AuthError> {
        self.issue_challenge_at(raw_address, domain, uri, Utc::now())
            .await
    }

    /// Issue a challenge as of `now`.
    ///
    /// Replaces any outstanding nonce of the account and provisions the
    /// account on first contact. The address is validated before storage is
    /// touched.
    pub async fn issue_challenge_at(
        &self,
        raw_address: &str,
        domain: &str,
        uri: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedChallenge, AuthError> {
        let address = WalletAddress::parse(raw_address)?;

        // Stored and rendered at millisecond precision so the message can be
        // rebuilt byte-for-byte at verification time.
        let challenge = NonceChallenge {
            nonce: generate_challenge_nonce(),
            issued_at: now.trunc_subsecs(3),
        };

        let user_id = self.directory.issue_nonce(&address, &challenge).await?;

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

        tracing::debug!(action = "challenge_issued", user_id = %user_id, address = %address, "Issued sign-in challenge");

        Ok(IssuedChallenge {
            user_id,
            address,
            nonce: challenge.nonce,
            issued_at: challenge.issued_at,
            statement: self.config.statement.clone(),
            domain: domain.to_string(),
            uri: uri.to_string(),
            message,
        })
    }
}
