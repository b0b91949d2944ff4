//! # Authentication
//!
//! Wallet owners prove themselves by entering their secret. The exchange
//! never reads secrets itself; it asks a [`SecretProvider`], which might be a
//! terminal, a scripted queue in a test, or a closure.
//!
//! ## Flows
//!
//! ```text
//! challenge   Login / ConfirmTransfer, up to N entries, first match wins
//! bootstrap   NewSecret + ConfirmNewSecret, must match and be non-empty,
//!             up to N rounds; used for wallets that have no credential yet
//! ```
//!
//! A provider that returns `None` has given up, and the flow fails on the
//! spot without using the remaining attempts.

use std::collections::VecDeque;
use std::fmt;

use tracing::warn;

use crate::crypto::CredentialStore;
use crate::error::{LedgerError, LedgerResult};
use crate::vault::Wallet;

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// What the exchange is asking the owner for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SecretPrompt {
    /// Secret to open a session.
    Login,
    /// Secret again, right before a transfer is applied.
    ConfirmTransfer,
    /// A new secret for a wallet that doesn't have one.
    NewSecret,
    /// The new secret repeated.
    ConfirmNewSecret,
}

impl SecretPrompt {
    /// Human-readable prompt text.
    pub fn label(self) -> &'static str {
        match self {
            SecretPrompt::Login => "Enter secret to login",
            SecretPrompt::ConfirmTransfer => "Enter secret to confirm this transfer",
            SecretPrompt::NewSecret => "New secret",
            SecretPrompt::ConfirmNewSecret => "Confirm secret",
        }
    }
}

impl fmt::Display for SecretPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why an entry was not accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// The secret didn't match the stored credential.
    WrongSecret,
    /// The new secret and its confirmation differ.
    Mismatch,
    /// The new secret was empty.
    Empty,
}

impl Rejection {
    pub fn message(self) -> &'static str {
        match self {
            Rejection::WrongSecret => "Wrong secret, try again.",
            Rejection::Mismatch => "Secrets do not match. Try again.",
            Rejection::Empty => "Secret cannot be empty.",
        }
    }
}

/// Source of secrets.
pub trait SecretProvider {
    /// Asks for a secret. `None` means the owner gave up.
    fn provide(&mut self, prompt: SecretPrompt) -> Option<String>;

    /// Told when an entry is turned down, so an interactive provider can say
    /// why. Does nothing by default.
    fn rejected(&mut self, _reason: Rejection) {}
}

impl<F> SecretProvider for F
where
    F: FnMut(SecretPrompt) -> Option<String>,
{
    fn provide(&mut self, prompt: SecretPrompt) -> Option<String> {
        self(prompt)
    }
}

/// Hands out a fixed list of secrets in order, then gives up.
#[derive(Clone, Debug, Default)]
pub struct ScriptedSecrets {
    queue: VecDeque<String>,
    rejections: Vec<Rejection>,
}

impl ScriptedSecrets {
    pub fn new<I, S>(secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queue: secrets.into_iter().map(Into::into).collect(),
            rejections: Vec::new(),
        }
    }

    /// Secrets not yet handed out.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Every rejection reported so far.
    pub fn rejections(&self) -> &[Rejection] {
        &self.rejections
    }
}

impl SecretProvider for ScriptedSecrets {
    fn provide(&mut self, _prompt: SecretPrompt) -> Option<String> {
        self.queue.pop_front()
    }

    fn rejected(&mut self, reason: Rejection) {
        self.rejections.push(reason);
    }
}

// ---------------------------------------------------------------------------
// Authenticator
// ---------------------------------------------------------------------------

/// Runs the secret flows against a [`CredentialStore`].
#[derive(Clone, Copy, Debug)]
pub struct Authenticator {
    credentials: CredentialStore,
    attempt_limit: u32,
}

impl Authenticator {
    /// `attempt_limit` is clamped to at least one.
    pub fn new(credentials: CredentialStore, attempt_limit: u32) -> Self {
        Self {
            credentials,
            attempt_limit: attempt_limit.max(1),
        }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn attempt_limit(&self) -> u32 {
        self.attempt_limit
    }

    /// Asks for the wallet's secret until one verifies or attempts run out.
    ///
    /// A wallet without a credential fails immediately; bootstrap it first.
    pub fn challenge(
        &self,
        wallet: &Wallet,
        prompt: SecretPrompt,
        provider: &mut dyn SecretProvider,
    ) -> LedgerResult<()> {
        let failed = || LedgerError::AuthFailed {
            owner: wallet.owner().to_string(),
        };
        if !wallet.has_credential() {
            warn!(owner = %wallet.owner(), "challenge on wallet without credential");
            return Err(failed());
        }

        for attempt in 1..=self.attempt_limit {
            let Some(secret) = provider.provide(prompt) else {
                warn!(owner = %wallet.owner(), attempt, "secret entry abandoned");
                return Err(failed());
            };
            if self.credentials.verify(wallet, &secret) {
                return Ok(());
            }
            warn!(owner = %wallet.owner(), attempt, "wrong secret");
            provider.rejected(Rejection::WrongSecret);
        }

        warn!(owner = %wallet.owner(), limit = self.attempt_limit, "too many failed attempts");
        Err(failed())
    }

    /// Collects a new secret (entered twice) and sets it as the wallet's
    /// credential. The caller persists.
    pub fn bootstrap_interactive(
        &self,
        wallet: &mut Wallet,
        provider: &mut dyn SecretProvider,
    ) -> LedgerResult<()> {
        for round in 1..=self.attempt_limit {
            let Some(first) = provider.provide(SecretPrompt::NewSecret) else {
                warn!(owner = %wallet.owner(), round, "secret setup abandoned");
                break;
            };
            let Some(second) = provider.provide(SecretPrompt::ConfirmNewSecret) else {
                warn!(owner = %wallet.owner(), round, "secret setup abandoned");
                break;
            };

            let rejection = if first != second {
                Rejection::Mismatch
            } else if first.is_empty() {
                Rejection::Empty
            } else {
                self.credentials.bootstrap(wallet, &first)?;
                return Ok(());
            };
            warn!(owner = %wallet.owner(), round, reason = ?rejection, "new secret refused");
            provider.rejected(rejection);
        }

        Err(LedgerError::AuthFailed {
            owner: wallet.owner().to_string(),
        })
    }
}
