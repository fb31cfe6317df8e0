use crate::domain::account::Account;
use crate::domain::identity::Identity;
use crate::domain::ports::{AccountStore, IdentityProvider, StorageHandle};
use crate::error::{LedgerError, Result};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use async_trait::async_trait;
use tracing::info;

/// Argon2 memory cost used when none is configured.
pub const DEFAULT_HASH_MEMORY_KIB: u32 = Params::DEFAULT_M_COST;

/// Name + password sign-in backed by argon2id hashes stored on the account.
///
/// Hashing is CPU bound and runs on the blocking pool.
pub struct PasswordIdentityProvider {
    storage: StorageHandle,
    params: Params,
}

impl PasswordIdentityProvider {
    pub fn new(storage: StorageHandle) -> Self {
        Self {
            storage,
            params: Params::default(),
        }
    }

    /// Uses a custom argon2 memory cost in KiB, keeping the default time and
    /// parallelism costs.
    pub fn with_memory_cost(storage: StorageHandle, memory_kib: u32) -> Result<Self> {
        let params = Params::new(
            memory_kib,
            Params::DEFAULT_T_COST,
            Params::DEFAULT_P_COST,
            None,
        )
        .map_err(|e| LedgerError::internal(format!("invalid argon2 parameters: {e}")))?;
        Ok(Self { storage, params })
    }

    async fn hash_secret(&self, secret: &str) -> Result<String> {
        let params = self.params.clone();
        let secret = secret.to_owned();
        tokio::task::spawn_blocking(move || {
            let salt_bytes: [u8; 16] = rand::random();
            let salt = SaltString::encode_b64(&salt_bytes)
                .map_err(|e| LedgerError::internal(format!("salt encoding failed: {e}")))?;
            Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
                .hash_password(secret.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| LedgerError::internal(format!("password hashing failed: {e}")))
        })
        .await?
    }

    async fn verify_secret(&self, account: &Account, secret: &str) -> Result<()> {
        let hash = account.secret_hash.clone();
        let secret = secret.to_owned();
        let valid = tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&hash)
                .map_err(|e| LedgerError::internal(format!("stored hash unreadable: {e}")))?;
            Ok::<_, LedgerError>(
                Argon2::default()
                    .verify_password(secret.as_bytes(), &parsed)
                    .is_ok(),
            )
        })
        .await??;

        if valid {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized)
        }
    }
}

#[async_trait]
impl IdentityProvider for PasswordIdentityProvider {
    async fn authenticate(&self, name: &str, secret: &str) -> Result<Identity> {
        let account = self
            .storage
            .get(name)
            .await?
            .ok_or(LedgerError::Unauthorized)?;
        self.verify_secret(&account, secret).await?;
        Ok(Identity::new(account.name))
    }

    async fn ensure_account_exists(&self, name: &str, secret: &str) -> Result<Account> {
        if name.trim().is_empty() {
            return Err(LedgerError::InvalidName);
        }

        if let Some(account) = self.storage.get(name).await? {
            self.verify_secret(&account, secret).await?;
            return Ok(account);
        }

        let hash = self.hash_secret(secret).await?;
        match self.storage.create(name, &hash).await {
            Ok(account) => {
                info!(employee = name, balance = %account.balance, "provisioned account");
                Ok(account)
            }
            Err(LedgerError::AlreadyExists(_)) => {
                // Lost a provisioning race; sign in against the winner.
                let account = self
                    .storage
                    .get(name)
                    .await?
                    .ok_or_else(|| LedgerError::AccountNotFound(name.to_string()))?;
                self.verify_secret(&account, secret).await?;
                Ok(account)
            }
            Err(e) => Err(e),
        }
    }
}
