//! # Wallet Registry
//!
//! Owner name → [`Wallet`], plus an address index kept in step with it.
//! Both maps are bijections: one wallet per name, one wallet per address.
//!
//! The registry is purely in-memory. It doesn't know about persistence or
//! secret prompts; the [`Exchange`](crate::exchange::Exchange) wraps it with
//! both.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use tracing::debug;

use super::address::{Address, AddressGenerator, RandomAddresses};
use super::amount::Amount;
use super::wallet::Wallet;
use crate::config::ADDRESS_RETRY_LIMIT;
use crate::crypto::CredentialStore;
use crate::error::{LedgerError, LedgerResult};
use crate::storage::StoreError;

/// All registered wallets.
pub struct WalletRegistry {
    /// Wallets keyed by owner name. `BTreeMap` so snapshots come out sorted.
    wallets: BTreeMap<String, Wallet>,
    /// Address → owner name.
    by_address: HashMap<Address, String>,
    /// Where new addresses come from.
    generator: Box<dyn AddressGenerator + Send>,
}

impl WalletRegistry {
    /// Creates an empty registry drawing addresses from the OS RNG.
    pub fn new() -> Self {
        Self::with_generator(RandomAddresses)
    }

    /// Creates an empty registry with a custom address source.
    pub fn with_generator(generator: impl AddressGenerator + Send + 'static) -> Self {
        Self {
            wallets: BTreeMap::new(),
            by_address: HashMap::new(),
            generator: Box::new(generator),
        }
    }

    /// Rebuilds a registry from persisted wallets.
    ///
    /// Entries missing an `owner_name` take it from their key. An entry whose
    /// name disagrees with its key, or two entries sharing an address, make
    /// the whole record invalid.
    pub fn from_wallets(
        wallets: BTreeMap<String, Wallet>,
        generator: impl AddressGenerator + Send + 'static,
    ) -> Result<Self, StoreError> {
        let mut registry = Self::with_generator(generator);
        for (key, mut wallet) in wallets {
            wallet.adopt_owner_name(&key);
            if wallet.owner() != key {
                return Err(StoreError::invalid(format!(
                    "entry '{key}' belongs to owner '{}'",
                    wallet.owner()
                )));
            }
            if let Some(other) = registry.by_address.get(&wallet.address()) {
                return Err(StoreError::invalid(format!(
                    "address {} is shared by '{other}' and '{key}'",
                    wallet.address()
                )));
            }
            registry.by_address.insert(wallet.address(), key.clone());
            registry.wallets.insert(key, wallet);
        }
        Ok(registry)
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Registers a new wallet for `owner` with `secret` as its credential.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidInput`] for a blank name or an empty secret.
    /// - [`LedgerError::AlreadyExists`] if the name is taken.
    /// - [`LedgerError::AddressExhausted`] if every candidate address collided.
    ///
    /// Nothing is inserted unless every step succeeds.
    pub fn register(
        &mut self,
        owner: &str,
        secret: &str,
        credentials: &CredentialStore,
    ) -> LedgerResult<&Wallet> {
        if owner.trim().is_empty() {
            return Err(LedgerError::InvalidInput("owner name must not be empty".into()));
        }
        if self.wallets.contains_key(owner) {
            return Err(LedgerError::AlreadyExists {
                owner: owner.to_string(),
            });
        }

        let address = self.allocate_address()?;
        let mut wallet = Wallet::new(owner, address);
        credentials.bootstrap(&mut wallet, secret)?;

        self.by_address.insert(address, owner.to_string());
        let wallet = self.wallets.entry(owner.to_string()).or_insert(wallet);
        debug!(owner = %wallet.owner(), address = %wallet.address(), "wallet registered");
        Ok(wallet)
    }

    /// Draws candidates until one is free, up to [`ADDRESS_RETRY_LIMIT`].
    fn allocate_address(&mut self) -> LedgerResult<Address> {
        for attempt in 1..=ADDRESS_RETRY_LIMIT {
            let candidate = self.generator.next_address();
            if !self.by_address.contains_key(&candidate) {
                return Ok(candidate);
            }
            debug!(attempt, "address collision, drawing again");
        }
        Err(LedgerError::AddressExhausted {
            attempts: ADDRESS_RETRY_LIMIT,
        })
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    /// Finds a wallet by owner name.
    pub fn lookup_by_name(&self, owner: &str) -> LedgerResult<&Wallet> {
        self.wallets
            .get(owner)
            .ok_or_else(|| LedgerError::NotFound(owner.to_string()))
    }

    /// Finds a wallet by address.
    pub fn lookup_by_address(&self, address: &Address) -> LedgerResult<&Wallet> {
        self.by_address
            .get(address)
            .and_then(|owner| self.wallets.get(owner))
            .ok_or_else(|| LedgerError::NotFound(address.to_string()))
    }

    pub(crate) fn get_mut(&mut self, owner: &str) -> LedgerResult<&mut Wallet> {
        self.wallets
            .get_mut(owner)
            .ok_or_else(|| LedgerError::NotFound(owner.to_string()))
    }

    /// Mutable access to two distinct wallets at once.
    pub(crate) fn pair_mut(
        &mut self,
        first: &str,
        second: &str,
    ) -> LedgerResult<(&mut Wallet, &mut Wallet)> {
        if first == second {
            return Err(LedgerError::SelfTransfer);
        }
        let mut a = None;
        let mut b = None;
        for (name, wallet) in self.wallets.iter_mut() {
            if name == first {
                a = Some(wallet);
            } else if name == second {
                b = Some(wallet);
            }
        }
        match (a, b) {
            (Some(a), Some(b)) => Ok((a, b)),
            (None, _) => Err(LedgerError::NotFound(first.to_string())),
            (_, None) => Err(LedgerError::NotFound(second.to_string())),
        }
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    /// Number of registered wallets.
    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    /// `true` if nobody has registered yet.
    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }

    /// Wallets in owner-name order.
    pub fn iter(&self) -> impl Iterator<Item = &Wallet> {
        self.wallets.values()
    }

    /// Sum of every balance. Grows only through voucher redemption.
    pub fn total_supply(&self) -> Amount {
        self.iter()
            .fold(Amount::ZERO, |acc, wallet| acc.saturating_add(wallet.balance()))
    }

    /// Copy of every wallet, keyed by owner name, ready to persist.
    pub fn snapshot(&self) -> BTreeMap<String, Wallet> {
        self.wallets.clone()
    }
}

impl Default for WalletRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WalletRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletRegistry")
            .field("wallets", &self.wallets.len())
            .finish()
    }
}
