//! # Cryptographic Primitives
//!
//! Everything secret-shaped flows through here: hashing helpers and the
//! credential store that turns wallet secrets into stored credentials.
//!
//! We don't roll our own primitives. `sha2` and `blake3` do the hashing;
//! this module only decides what gets hashed and how the result is encoded.

pub mod credential;
pub mod hash;

pub use credential::{Credential, CredentialStore, HashScheme};
