//! # アクセストークンキャッシュ
//!
//! 認証結果を有効期限まで再利用する。期限切れ（余裕込み）なら再取得する。
//! 再取得中はロックを保持するため、同時要求でもJWT交換は1回に絞られる。

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::auth::AccountContext;
use crate::error::ProviderError;

struct CachedAccount {
    account: AccountContext,
    expires_at: Instant,
}

/// 有効期限付きの認証結果キャッシュ。
pub struct TokenCache {
    slot: Mutex<Option<CachedAccount>>,
    skew: Duration,
}

impl TokenCache {
    /// `skew` だけ早めに失効扱いにする。
    pub fn new(skew: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            skew,
        }
    }

    /// 有効なキャッシュがあれば返し、なければ `refresh` で取得して保存する。
    ///
    /// `refresh` は認証結果とトークンの有効期間を返す。失敗はキャッシュしない。
    pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> Result<AccountContext, ProviderError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(AccountContext, Duration), ProviderError>>,
    {
        let mut slot = self.slot.lock().await;

        if let Some(cached) = slot.as_ref() {
            if Instant::now() + self.skew < cached.expires_at {
                return Ok(cached.account.clone());
            }
            tracing::debug!("アクセストークンの期限切れ。再取得します");
        }

        let (account, lifetime) = refresh().await?;
        *slot = Some(CachedAccount {
            account: account.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(account)
    }

    /// プロバイダに拒否されたトークンがまだキャッシュされていれば破棄する。
    /// 別のリクエストが既に再取得したトークンは残す。
    pub async fn invalidate(&self, rejected_token: &str) {
        let mut slot = self.slot.lock().await;
        if slot
            .as_ref()
            .is_some_and(|cached| cached.account.access_token == rejected_token)
        {
            *slot = None;
        }
    }
}
