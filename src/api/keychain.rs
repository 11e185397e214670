use crate::models::secret::EncryptionKey;

/// The encrypted key-chain holding the wallet secret.
#[async_trait::async_trait]
pub trait KeyChain: Send + Sync {
    /// derive the wallet's encryption key from `password`. fails on a wrong
    /// password.
    async fn unlock(&self, password: &str) -> anyhow::Result<EncryptionKey>;
}
