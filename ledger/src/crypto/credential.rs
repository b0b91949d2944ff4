//! # Credential Store
//!
//! A wallet's credential is a one-way derivation of its owner's secret. We
//! never store the secret itself and never log either value.
//!
//! ## Encoding
//!
//! ```text
//! <scheme>$<salt-hex>$<digest-hex>     digest = H(salt || secret)
//! <64 hex digits>                      legacy: SHA-256(secret), no salt
//! ```
//!
//! The scheme travels with the credential, so switching the default
//! [`HashScheme`] only affects credentials issued afterwards. Legacy values
//! come from wallet records written before salting existed; they still
//! verify, and get replaced the next time the wallet bootstraps.

use std::fmt;
use std::str::FromStr;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::hash::{blake3_parts, digests_match, sha256_parts};
use crate::config::SALT_LENGTH;
use crate::error::LedgerError;
use crate::vault::Wallet;

const FIELD_SEPARATOR: char = '$';

// ---------------------------------------------------------------------------
// HashScheme
// ---------------------------------------------------------------------------

/// Hash function used to derive a credential.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashScheme {
    /// Salted SHA-256.
    #[default]
    Sha256,
    /// Salted BLAKE3.
    Blake3,
}

impl HashScheme {
    /// Tag written into the credential string.
    pub fn as_str(self) -> &'static str {
        match self {
            HashScheme::Sha256 => "sha256",
            HashScheme::Blake3 => "blake3",
        }
    }

    fn digest(self, salt: &[u8], secret: &str) -> [u8; 32] {
        match self {
            HashScheme::Sha256 => sha256_parts(&[salt, secret.as_bytes()]),
            HashScheme::Blake3 => blake3_parts(&[salt, secret.as_bytes()]),
        }
    }
}

impl fmt::Display for HashScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashScheme {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(HashScheme::Sha256),
            "blake3" => Ok(HashScheme::Blake3),
            other => Err(LedgerError::InvalidInput(format!(
                "unknown hash scheme '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

/// The stored, one-way form of a wallet secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

/// A credential string broken into its parts.
enum Parsed {
    Legacy([u8; 32]),
    Salted {
        scheme: HashScheme,
        salt: Vec<u8>,
        digest: [u8; 32],
    },
}

impl Credential {
    /// Derives a credential deterministically from `secret` and `salt`.
    pub fn derive(scheme: HashScheme, secret: &str, salt: &[u8]) -> Self {
        let digest = scheme.digest(salt, secret);
        Credential(format!(
            "{}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}{}",
            scheme.as_str(),
            hex::encode(salt),
            hex::encode(digest)
        ))
    }

    /// Derives the unsalted SHA-256 form found in older records.
    pub fn legacy(secret: &str) -> Self {
        Credential(hex::encode(sha256_parts(&[secret.as_bytes()])))
    }

    /// Wraps a value read back from storage. Nothing is validated here;
    /// an unparsable value simply never verifies.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Credential(value.into())
    }

    /// The encoded form, as persisted.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for unsalted credentials carried over from old records.
    pub fn is_legacy(&self) -> bool {
        matches!(self.parse(), Some(Parsed::Legacy(_)))
    }

    /// Scheme this credential was derived with, if it can be parsed.
    pub fn scheme(&self) -> Option<HashScheme> {
        match self.parse()? {
            Parsed::Legacy(_) => Some(HashScheme::Sha256),
            Parsed::Salted { scheme, .. } => Some(scheme),
        }
    }

    /// Re-derives from `secret` and compares.
    pub fn matches(&self, secret: &str) -> bool {
        match self.parse() {
            Some(Parsed::Legacy(expected)) => {
                digests_match(&sha256_parts(&[secret.as_bytes()]), &expected)
            }
            Some(Parsed::Salted {
                scheme,
                salt,
                digest,
            }) => digests_match(&scheme.digest(&salt, secret), &digest),
            None => false,
        }
    }

    fn parse(&self) -> Option<Parsed> {
        let mut fields = self.0.split(FIELD_SEPARATOR);
        match (fields.next(), fields.next(), fields.next(), fields.next()) {
            (Some(legacy), None, None, None) => decode_digest(legacy).map(Parsed::Legacy),
            (Some(scheme), Some(salt), Some(digest), None) => Some(Parsed::Salted {
                scheme: scheme.parse().ok()?,
                salt: hex::decode(salt).ok()?,
                digest: decode_digest(digest)?,
            }),
            _ => None,
        }
    }
}

fn decode_digest(value: &str) -> Option<[u8; 32]> {
    let mut out = [0u8; 32];
    hex::decode_to_slice(value, &mut out).ok()?;
    Some(out)
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scheme() {
            Some(scheme) if self.is_legacy() => write!(f, "Credential({scheme}, legacy)"),
            Some(scheme) => write!(f, "Credential({scheme})"),
            None => f.write_str("Credential(unparsable)"),
        }
    }
}

// ---------------------------------------------------------------------------
// CredentialStore
// ---------------------------------------------------------------------------

/// Issues and checks wallet credentials.
#[derive(Clone, Copy, Debug, Default)]
pub struct CredentialStore {
    scheme: HashScheme,
}

impl CredentialStore {
    /// Creates a store that issues new credentials with `scheme`.
    pub fn new(scheme: HashScheme) -> Self {
        Self { scheme }
    }

    /// The scheme used for newly issued credentials.
    pub fn scheme(&self) -> HashScheme {
        self.scheme
    }

    /// Deterministic derivation with this store's scheme.
    pub fn derive(&self, secret: &str, salt: &[u8]) -> Credential {
        Credential::derive(self.scheme, secret, salt)
    }

    /// Derives a credential for `secret` under a fresh random salt.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidInput`] if `secret` is empty.
    pub fn issue(&self, secret: &str) -> Result<Credential, LedgerError> {
        if secret.is_empty() {
            return Err(LedgerError::InvalidInput("secret must not be empty".into()));
        }
        let mut salt = [0u8; SALT_LENGTH];
        OsRng.fill_bytes(&mut salt);
        Ok(self.derive(secret, &salt))
    }

    /// Sets `wallet`'s credential from a freshly supplied secret, replacing
    /// whatever was there.
    pub fn bootstrap(&self, wallet: &mut Wallet, secret: &str) -> Result<(), LedgerError> {
        let credential = self.issue(secret)?;
        wallet.set_credential(credential);
        Ok(())
    }

    /// `true` iff `wallet` has a credential and `secret` derives to it.
    /// Never fails: a wallet without a credential just doesn't verify.
    pub fn verify(&self, wallet: &Wallet, secret: &str) -> bool {
        wallet
            .credential()
            .map(|credential| credential.matches(secret))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::Address;

    fn wallet() -> Wallet {
        Wallet::new("alice", Address::from_bytes([1; 20]))
    }

    #[test]
    fn derive_is_deterministic() {
        let a = Credential::derive(HashScheme::Sha256, "pw1", b"salt");
        let b = Credential::derive(HashScheme::Sha256, "pw1", b"salt");
        assert_eq!(a, b);
        assert!(a.as_str().starts_with("sha256$"));
    }

    #[test]
    fn salt_and_scheme_change_the_value() {
        let base = Credential::derive(HashScheme::Sha256, "pw1", b"salt");
        assert_ne!(base, Credential::derive(HashScheme::Sha256, "pw1", b"pepper"));
        assert_ne!(base, Credential::derive(HashScheme::Blake3, "pw1", b"salt"));
    }

    #[test]
    fn issued_credentials_use_fresh_salts() {
        let store = CredentialStore::default();
        let a = store.issue("pw1").unwrap();
        let b = store.issue("pw1").unwrap();
        assert_ne!(a, b);
        assert!(a.matches("pw1") && b.matches("pw1"));
    }

    #[test]
    fn empty_secret_is_rejected() {
        let store = CredentialStore::default();
        let mut w = wallet();
        assert!(matches!(
            store.bootstrap(&mut w, ""),
            Err(LedgerError::InvalidInput(_))
        ));
        assert!(!w.has_credential());
    }

    #[test]
    fn verify_without_credential_is_false() {
        let store = CredentialStore::default();
        assert!(!store.verify(&wallet(), "anything"));
        assert!(!store.verify(&wallet(), ""));
    }

    #[test]
    fn bootstrap_then_verify_exact_secret_only() {
        let store = CredentialStore::new(HashScheme::Blake3);
        let mut w = wallet();
        store.bootstrap(&mut w, "pw1").unwrap();

        assert!(store.verify(&w, "pw1"));
        assert!(!store.verify(&w, "pw2"));
        assert!(!store.verify(&w, "PW1"));
        assert!(!store.verify(&w, ""));
        assert_eq!(w.credential().unwrap().scheme(), Some(HashScheme::Blake3));
    }

    #[test]
    fn legacy_unsalted_digest_still_verifies() {
        // sha256("pw1"), as stored by records that predate salting.
        let stored = Credential::from_stored(hex::encode(sha256_parts(&[b"pw1"])));
        assert!(stored.is_legacy());
        assert!(stored.matches("pw1"));
        assert!(!stored.matches("pw2"));
        assert_eq!(stored, Credential::legacy("pw1"));
    }

    #[test]
    fn garbage_never_verifies() {
        for raw in ["", "nothex", "md5$00$00", "sha256$zz$00", "a$b$c$d"] {
            assert!(!Credential::from_stored(raw).matches(""), "{raw}");
        }
    }

    #[test]
    fn scheme_parsing() {
        assert_eq!("SHA256".parse::<HashScheme>().unwrap(), HashScheme::Sha256);
        assert_eq!("blake3".parse::<HashScheme>().unwrap(), HashScheme::Blake3);
        assert!("md5".parse::<HashScheme>().is_err());
    }

    #[test]
    fn debug_does_not_leak_digest() {
        let c = Credential::derive(HashScheme::Sha256, "pw1", b"salt");
        let rendered = format!("{c:?}");
        assert_eq!(rendered, "Credential(sha256)");
    }
}
