//! # サービスアカウント認証
//!
//! JWTグラントでアクセストークンを取得し、既定アカウントを解決する。
//!
//! ## 処理フロー
//! 1. RSA秘密鍵でJWTアサーションに署名（scope: signature impersonation, 有効期間10分）
//! 2. `/oauth/token` でアクセストークンに交換
//! 3. `/oauth/userinfo` から既定アカウントを選び、REST APIのベースパスを決める
//!
//! `consent_required` が返った場合は同意URLを組み立てて `ConsentRequired` を返す。
//! プロセスは終了させない。

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::config::{ProviderConfig, SCOPES};
use crate::error::ProviderError;
use crate::wire::{OAuthErrorBody, TokenResponse, UserInfo};

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// 1回の認証で得られるアカウント情報。リクエストごとに明示的に渡す。
#[derive(Clone, PartialEq, Eq)]
pub struct AccountContext {
    /// Bearerトークン
    pub access_token: String,
    /// 既定アカウントのID
    pub account_id: String,
    /// REST APIのベースパス（`{base_uri}/restapi`）
    pub base_path: String,
}

impl std::fmt::Debug for AccountContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountContext")
            .field("access_token", &"<redacted>")
            .field("account_id", &self.account_id)
            .field("base_path", &self.base_path)
            .finish()
    }
}

/// JWTアサーションのクレーム。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// インテグレーションキー
    pub iss: String,
    /// なりすまし対象ユーザー
    pub sub: String,
    /// 認可サーバーのホスト名
    pub aud: String,
    pub iat: u64,
    pub exp: u64,
    /// スペース区切りのスコープ
    pub scope: String,
}

/// JWTアサーションを構築し、RS256で署名する。
pub fn build_jwt_assertion(
    config: &ProviderConfig,
    key: &EncodingKey,
    issued_at: u64,
) -> Result<String, ProviderError> {
    let claims = JwtClaims {
        iss: config.integration_key.clone(),
        sub: config.user_id.clone(),
        aud: config.oauth_host().to_string(),
        iat: issued_at,
        exp: issued_at + config.jwt_lifetime_secs,
        scope: SCOPES.join(" "),
    };

    jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, key)
        .map_err(|e| ProviderError::Authentication(format!("JWTアサーションの署名に失敗: {e}")))
}

/// 運用者が一度だけ開く同意URLを組み立てる。
pub fn consent_url(config: &ProviderConfig) -> Result<String, ProviderError> {
    let base = format!("{}/oauth/auth", config.auth_base_url());
    let scope = SCOPES.join(" ");
    let url = reqwest::Url::parse_with_params(
        &base,
        [
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("client_id", config.integration_key.as_str()),
            ("redirect_uri", config.consent_redirect_uri.as_str()),
        ],
    )
    .map_err(|e| ProviderError::Configuration(format!("認可サーバーURLが不正です ({base}): {e}")))?;
    Ok(url.to_string())
}

/// `/oauth/token` の失敗レスポンスを分類する。
pub fn classify_token_error(config: &ProviderConfig, status: u16, body: &str) -> ProviderError {
    match serde_json::from_str::<OAuthErrorBody>(body) {
        Ok(err) if err.error == "consent_required" => match consent_url(config) {
            Ok(consent_url) => ProviderError::ConsentRequired { consent_url },
            Err(e) => e,
        },
        Ok(err) => ProviderError::Authentication(format!(
            "HTTP {status} - {}{}",
            err.error,
            err.error_description
                .map(|d| format!(": {d}"))
                .unwrap_or_default()
        )),
        Err(_) => ProviderError::Authentication(format!("HTTP {status} - {body}")),
    }
}

/// userinfoから既定アカウントを選ぶ。
pub fn select_default_account(
    info: &UserInfo,
    access_token: &str,
) -> Result<AccountContext, ProviderError> {
    let account = info
        .accounts
        .iter()
        .find(|a| a.is_default)
        .ok_or_else(|| {
            ProviderError::Authentication("既定アカウントが見つかりません".to_string())
        })?;

    Ok(AccountContext {
        access_token: access_token.to_string(),
        account_id: account.account_id.clone(),
        base_path: format!("{}/restapi", account.base_uri.trim_end_matches('/')),
    })
}

/// JWT交換からアカウント解決までを行い、認証結果とトークン有効期間を返す。
pub(crate) async fn exchange_jwt(
    http: &reqwest::Client,
    config: &ProviderConfig,
    key: &EncodingKey,
) -> Result<(AccountContext, Duration), ProviderError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| ProviderError::Internal(format!("時刻取得失敗: {e}")))?
        .as_secs();
    let assertion = build_jwt_assertion(config, key, now)?;

    let base = config.auth_base_url();
    let response = http
        .post(format!("{base}/oauth/token"))
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await
        .map_err(|e| ProviderError::Authentication(format!("トークン要求の送信失敗: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let err = classify_token_error(config, status.as_u16(), &body);
        if let ProviderError::ConsentRequired { consent_url } = &err {
            tracing::warn!(
                consent_url = %consent_url,
                "アプリケーションへの同意が必要です。ブラウザで consent_url を開いて同意してください"
            );
        }
        return Err(err);
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| ProviderError::Authentication(format!("トークンレスポンスのパースに失敗: {e}")))?;

    let info_response = http
        .get(format!("{base}/oauth/userinfo"))
        .bearer_auth(&token.access_token)
        .send()
        .await
        .map_err(|e| ProviderError::Authentication(format!("userinfo要求の送信失敗: {e}")))?;

    let info_status = info_response.status();
    if !info_status.is_success() {
        let body = info_response.text().await.unwrap_or_default();
        return Err(ProviderError::Authentication(format!(
            "userinfoがエラーを返しました: HTTP {info_status} - {body}"
        )));
    }

    let info: UserInfo = info_response
        .json()
        .await
        .map_err(|e| ProviderError::Authentication(format!("userinfoのパースに失敗: {e}")))?;

    let account = select_default_account(&info, &token.access_token)?;
    tracing::info!(
        account_id = %account.account_id,
        base_path = %account.base_path,
        expires_in = token.expires_in,
        "プロバイダ認証完了"
    );

    Ok((account, Duration::from_secs(token.expires_in)))
}
