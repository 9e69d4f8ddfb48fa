//! Canonical sign-in message rendering.
//!
//! The client signs exactly the text produced here, and verification
//! re-renders it from stored values. Field order, labels and line breaks
//! are a wire contract: any change breaks every outstanding challenge.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;

/// Protocol version rendered on the `Version:` line.
pub const MESSAGE_VERSION: &str = "1";

/// Render an issuance instant as RFC 3339 UTC with millisecond precision,
/// e.g. `2024-05-01T12:30:00.125Z`.
pub fn format_issued_at(issued_at: &DateTime<Utc>) -> String {
    issued_at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Fields of a sign-in message. Strings are rendered verbatim.
#[derive(Debug, Clone)]
pub struct SignInMessage<'a> {
    pub domain: &'a str,
    pub address: &'a str,
    pub statement: &'a str,
    pub uri: &'a str,
    pub version: &'a str,
    pub chain_id: u64,
    pub nonce: &'a str,
    pub issued_at: DateTime<Utc>,
}

impl SignInMessage<'_> {
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SignInMessage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} wants you to sign in with your Ethereum account:\n\
             {}\n\
             \n\
             {}\n\
             \n\
             URI: {}\n\
             Version: {}\n\
             Chain ID: {}\n\
             Nonce: {}\n\
             Issued At: {}",
            self.domain,
            self.address,
            self.statement,
            self.uri,
            self.version,
            self.chain_id,
            self.nonce,
            format_issued_at(&self.issued_at),
        )
    }
}
