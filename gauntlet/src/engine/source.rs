use super::{AccountSource, AccountView};
use crate::{error::EngineError, paper::{PaperAccount, PaperEngine}, security::seal::SealKey};
use gauntlet_data::PriceCache;
use gauntlet_exchange::{AccountClient, ApiCredentials, Environment};
use gauntlet_integration::rate_limit::RateLimiter;
use gauntlet_ledger::{
    model::{AccountMode, Challenge},
    LedgerStore,
};
use std::sync::Arc;

/// Production [`AccountSource`].
///
/// Challenges holding sealed credentials get a signed [`AccountClient`] against the
/// demo or live environment; decryption happens here and the plaintext lives only
/// inside the client's request signer. Challenges without venue credentials fall back
/// to the embedded paper account.
pub struct SealedAccountSource {
    seal_key: SealKey,
    demo_rate_limiter: RateLimiter,
    live_rate_limiter: RateLimiter,
    paper: PaperEngine,
    ledger: LedgerStore,
    cache: PriceCache,
}

impl std::fmt::Debug for SealedAccountSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealedAccountSource").finish()
    }
}

impl SealedAccountSource {
    pub fn new(
        seal_key: SealKey,
        demo_rate_limiter: RateLimiter,
        live_rate_limiter: RateLimiter,
        paper: PaperEngine,
        ledger: LedgerStore,
        cache: PriceCache,
    ) -> Self {
        Self {
            seal_key,
            demo_rate_limiter,
            live_rate_limiter,
            paper,
            ledger,
            cache,
        }
    }

    fn unseal_credentials(
        &self,
        challenge: &Challenge,
        key_enc: &str,
        secret_enc: &str,
    ) -> Result<ApiCredentials, EngineError> {
        let unseal = |sealed: &str| {
            self.seal_key
                .unseal(sealed)
                .map_err(|_| EngineError::CredentialUnseal {
                    challenge_id: challenge.id,
                })
        };
        Ok(ApiCredentials::new(unseal(key_enc)?, unseal(secret_enc)?))
    }
}

impl AccountSource for SealedAccountSource {
    fn account_for(&self, challenge: &Challenge) -> Result<AccountView, EngineError> {
        match challenge.sealed_credentials() {
            Some((key_enc, secret_enc)) => {
                let credentials = self.unseal_credentials(challenge, key_enc, secret_enc)?;
                let (environment, rate_limiter) = match challenge.account_mode {
                    AccountMode::Demo => (Environment::Demo, self.demo_rate_limiter.clone()),
                    AccountMode::Funded => (Environment::Live, self.live_rate_limiter.clone()),
                };
                Ok(AccountView {
                    exchange: Arc::new(AccountClient::new(
                        credentials,
                        environment,
                        rate_limiter,
                    )),
                    is_paper: false,
                })
            }
            None => Ok(AccountView {
                exchange: Arc::new(PaperAccount::new(
                    self.paper.clone(),
                    self.ledger.clone(),
                    self.cache.clone(),
                    challenge.id,
                )),
                is_paper: true,
            }),
        }
    }
}
