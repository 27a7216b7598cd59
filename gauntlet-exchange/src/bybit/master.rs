use crate::{
    bybit::{
        execute,
        model::{
            balance::GetWalletBalance,
            order::SetLeverage,
            subaccount::{CreateSubApiKey, CreateSubMember, DemoTopUp},
            transfer::UniversalTransfer,
        },
        Environment, RequestSigner, ResponseParser, V5Client,
    },
    credentials::ApiCredentials,
    error::ExchangeError,
};
use async_trait::async_trait;
use gauntlet_integration::{
    protocol::http::client::SignedClient,
    rate_limit::{Priority, RateLimiter},
};
use rand::Rng;
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

/// A freshly provisioned sub-account: venue uid plus its API key pair.
///
/// The credentials exist in plaintext only between provisioning and sealing; callers
/// seal them into the ledger immediately.
#[derive(Debug, Clone)]
pub struct ProvisionedAccount {
    pub account_id: String,
    pub credentials: ApiCredentials,
}

/// Privileged master-account operations: provisioning and funding of sub-accounts.
///
/// Implemented by [`MasterClient`] in production and by in-memory fakes in tests.
#[async_trait]
pub trait MasterExchange: Send + Sync {
    /// Available master wallet balance in USDT.
    async fn master_balance(&self) -> Result<Decimal, ExchangeError>;

    /// Verify the master wallet holds at least the configured minimum, returning the
    /// observed balance or [`ExchangeError::MasterBalanceLow`].
    async fn ensure_master_healthy(&self) -> Result<Decimal, ExchangeError>;

    /// Provision a demo sub-account: create sub-member, create keys, credit demo
    /// balance.
    async fn provision_demo_account(
        &self,
        account_size: Decimal,
        username_prefix: &str,
    ) -> Result<ProvisionedAccount, ExchangeError>;

    /// Provision a funded sub-account: verify master balance, create sub-member,
    /// transfer real funds (idempotent by `transfer_id`), create keys, apply leverage.
    async fn provision_funded_account(
        &self,
        account_size: Decimal,
        username_prefix: &str,
        max_leverage: u32,
        transfer_id: Uuid,
    ) -> Result<ProvisionedAccount, ExchangeError>;

    /// Reset a demo wallet to `amount`, signing with the sub-account's own keys.
    async fn top_up_demo_balance(
        &self,
        sub_credentials: ApiCredentials,
        amount: Decimal,
    ) -> Result<(), ExchangeError>;

    /// Move `amount` USDT from master into a sub-member wallet. Replaying the same
    /// `transfer_id` is a no-op at the venue.
    async fn transfer_to_sub(
        &self,
        transfer_id: Uuid,
        amount: Decimal,
        sub_uid: &str,
    ) -> Result<(), ExchangeError>;
}

/// Single, process-wide client operating the master account.
#[derive(Debug, Clone)]
pub struct MasterClient {
    live: V5Client,
    rate_limiter: RateLimiter,
    min_balance: Decimal,
    /// Symbols funded sub-accounts are capped on at provisioning time.
    instrument_allow_list: Vec<String>,
}

impl MasterClient {
    pub fn new(
        credentials: ApiCredentials,
        min_balance: Decimal,
        instrument_allow_list: Vec<String>,
        rate_limiter: RateLimiter,
    ) -> Self {
        Self {
            live: SignedClient::new(
                Environment::Live.rest_url(),
                RequestSigner::new(credentials),
                ResponseParser,
            ),
            rate_limiter,
            min_balance,
            instrument_allow_list,
        }
    }

    /// Unique venue username: `{prefix}_{8 hex chars}`, capped to the venue's length
    /// limit. The random suffix makes a retried provisioning create a fresh account
    /// rather than collide.
    fn unique_username(prefix: &str) -> String {
        let suffix: u32 = rand::thread_rng().gen();
        let mut username = format!("{prefix}{suffix:08X}");
        username.truncate(16);
        username
    }

    async fn create_sub_member(&self, username: &str, note: &str) -> Result<String, ExchangeError> {
        self.rate_limiter.acquire(Priority::Normal).await;
        let created = execute(&self.live, CreateSubMember::new(username, note)).await?;
        info!(uid = %created.uid, %username, "sub-account created");
        Ok(created.uid)
    }

    async fn create_sub_api_key(
        &self,
        sub_uid: &str,
        note: &str,
    ) -> Result<ApiCredentials, ExchangeError> {
        let subuid: i64 = sub_uid.parse().map_err(|_| ExchangeError::Api {
            code: -1,
            message: format!("sub uid `{sub_uid}` is not numeric"),
        })?;

        self.rate_limiter.acquire(Priority::Normal).await;
        let key = execute(&self.live, CreateSubApiKey::new(subuid, note, false)).await?;
        info!(uid = %sub_uid, "sub-account api key created");
        Ok(ApiCredentials::new(key.api_key, key.secret))
    }

    fn stage<T>(
        stage: &'static str,
        result: Result<T, ExchangeError>,
    ) -> Result<T, ExchangeError> {
        result.map_err(|source| ExchangeError::Provision {
            stage,
            source: Box::new(source),
        })
    }
}

#[async_trait]
impl MasterExchange for MasterClient {
    async fn master_balance(&self) -> Result<Decimal, ExchangeError> {
        self.rate_limiter.acquire(Priority::Normal).await;
        execute(&self.live, GetWalletBalance::usdt())
            .await
            .map(|result| result.usdt().available)
    }

    async fn ensure_master_healthy(&self) -> Result<Decimal, ExchangeError> {
        let balance = self.master_balance().await?;
        if balance < self.min_balance {
            warn!(%balance, minimum = %self.min_balance, "master balance below minimum");
            return Err(ExchangeError::MasterBalanceLow {
                balance,
                minimum: self.min_balance,
            });
        }
        Ok(balance)
    }

    async fn provision_demo_account(
        &self,
        account_size: Decimal,
        username_prefix: &str,
    ) -> Result<ProvisionedAccount, ExchangeError> {
        let username = Self::unique_username(username_prefix);

        let uid = Self::stage(
            "create_sub_member",
            self.create_sub_member(&username, "Gauntlet evaluation account")
                .await,
        )?;

        let credentials = Self::stage(
            "create_sub_api_key",
            self.create_sub_api_key(&uid, "Gauntlet evaluation key").await,
        )?;

        Self::stage(
            "demo_top_up",
            self.top_up_demo_balance(credentials.clone(), account_size)
                .await,
        )?;

        info!(%uid, %account_size, "demo challenge account provisioned");
        Ok(ProvisionedAccount {
            account_id: uid,
            credentials,
        })
    }

    async fn provision_funded_account(
        &self,
        account_size: Decimal,
        username_prefix: &str,
        max_leverage: u32,
        transfer_id: Uuid,
    ) -> Result<ProvisionedAccount, ExchangeError> {
        Self::stage("master_balance", self.ensure_master_healthy().await)?;

        let username = Self::unique_username(username_prefix);
        let uid = Self::stage(
            "create_sub_member",
            self.create_sub_member(&username, "Gauntlet funded account")
                .await,
        )?;

        Self::stage(
            "fund_transfer",
            self.transfer_to_sub(transfer_id, account_size, &uid).await,
        )?;

        let credentials = Self::stage(
            "create_sub_api_key",
            self.create_sub_api_key(&uid, "Gauntlet funded key").await,
        )?;

        // Cap leverage on every tradeable symbol; a failure here is not fatal to the
        // promotion, the order surface re-validates leverage anyway.
        let sub_client = SignedClient::new(
            Environment::Live.rest_url(),
            RequestSigner::new(credentials.clone()),
            ResponseParser,
        );
        for symbol in &self.instrument_allow_list {
            self.rate_limiter.acquire(Priority::Low).await;
            if let Err(err) = execute(
                &sub_client,
                SetLeverage::symmetric(symbol.clone(), max_leverage),
            )
            .await
            {
                warn!(%symbol, %err, "failed to cap leverage on funded account");
            }
        }

        info!(%uid, %account_size, "funded account provisioned");
        Ok(ProvisionedAccount {
            account_id: uid,
            credentials,
        })
    }

    async fn top_up_demo_balance(
        &self,
        sub_credentials: ApiCredentials,
        amount: Decimal,
    ) -> Result<(), ExchangeError> {
        // Demo wallet adjustments are served from the demo base url and signed by the
        // account being credited.
        let demo_client = SignedClient::new(
            Environment::Demo.rest_url(),
            RequestSigner::new(sub_credentials),
            ResponseParser,
        );
        self.rate_limiter.acquire(Priority::Normal).await;
        execute(&demo_client, DemoTopUp::usdt(amount)).await?;
        info!(%amount, "demo balance credited");
        Ok(())
    }

    async fn transfer_to_sub(
        &self,
        transfer_id: Uuid,
        amount: Decimal,
        sub_uid: &str,
    ) -> Result<(), ExchangeError> {
        let to_member_id: i64 = sub_uid.parse().map_err(|_| ExchangeError::Api {
            code: -1,
            message: format!("sub uid `{sub_uid}` is not numeric"),
        })?;

        self.rate_limiter.acquire(Priority::High).await;
        let result = execute(
            &self.live,
            UniversalTransfer::usdt(transfer_id, amount, to_member_id),
        )
        .await?;

        info!(
            %transfer_id,
            %amount,
            %sub_uid,
            status = %result.status,
            "universal transfer submitted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_username_bounded_and_prefixed() {
        let username = MasterClient::unique_username("GL42");
        assert!(username.starts_with("GL42"));
        assert!(username.len() <= 16);

        // Two draws virtually never collide
        assert_ne!(username, MasterClient::unique_username("GL42"));
    }
}
