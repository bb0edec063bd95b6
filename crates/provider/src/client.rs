//! # プロバイダクライアント
//!
//! `SignatureProvider` はGatewayから見たアダプタの境界。
//! `RestProvider` がREST API実装で、テストではスタブに差し替える。

use async_trait::async_trait;
use jsonwebtoken::EncodingKey;
use serde::de::DeserializeOwned;

use esign_types::{Envelope, EnvelopeArgs, EnvelopeStatus, RecipientView, RecipientViewArgs, Recipients};

use crate::auth::{self, AccountContext};
use crate::config::ProviderConfig;
use crate::envelope::{build_envelope, build_recipient_view};
use crate::error::ProviderError;
use crate::token_cache::TokenCache;
use crate::wire::ApiErrorBody;

const API_VERSION: &str = "v2.1";

/// 電子署名プロバイダの操作。
///
/// 各操作は1回のプロバイダ往復で、リトライはしない。
#[async_trait]
pub trait SignatureProvider: Send + Sync {
    /// アクセストークンと既定アカウントを取得する。
    async fn authenticate(&self) -> Result<AccountContext, ProviderError>;

    /// 1文書・N署名者のエンベロープを作成する。
    async fn create_envelope(
        &self,
        account: &AccountContext,
        signers: &[EnvelopeArgs],
        document_base64: &str,
        status: EnvelopeStatus,
    ) -> Result<Envelope, ProviderError>;

    /// エンベロープの状態・メタデータを取得する。
    async fn get_envelope(
        &self,
        account: &AccountContext,
        envelope_id: &str,
    ) -> Result<Envelope, ProviderError>;

    /// 署名者ごとの状態を取得する。
    async fn list_recipients(
        &self,
        account: &AccountContext,
        envelope_id: &str,
    ) -> Result<Recipients, ProviderError>;

    /// 全文書を結合したPDFを取得する。
    async fn get_combined_document(
        &self,
        account: &AccountContext,
        envelope_id: &str,
    ) -> Result<Vec<u8>, ProviderError>;

    /// 埋め込み署名URLを発行する。
    async fn create_recipient_view(
        &self,
        account: &AccountContext,
        args: &RecipientViewArgs,
    ) -> Result<RecipientView, ProviderError>;
}

/// REST API実装。認証結果はトークン有効期限までキャッシュする。
pub struct RestProvider {
    config: ProviderConfig,
    http: reqwest::Client,
    encoding_key: EncodingKey,
    token_cache: TokenCache,
}

impl RestProvider {
    /// 秘密鍵を検証して構築する。鍵が読めなければ起動時に失敗させる。
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        Self::with_http_client(config, reqwest::Client::new())
    }

    pub fn with_http_client(
        config: ProviderConfig,
        http: reqwest::Client,
    ) -> Result<Self, ProviderError> {
        let encoding_key = EncodingKey::from_rsa_pem(&config.private_key_pem)
            .map_err(|e| ProviderError::Configuration(format!("RSA秘密鍵の読み込みに失敗: {e}")))?;
        let token_cache = TokenCache::new(config.token_expiry_skew);
        Ok(Self {
            config,
            http,
            encoding_key,
            token_cache,
        })
    }

    /// `{base_path}/v2.1/accounts/{account_id}/envelopes[/{segments}...]`
    fn envelopes_url(
        account: &AccountContext,
        segments: &[&str],
    ) -> Result<reqwest::Url, ProviderError> {
        let mut url = reqwest::Url::parse(&account.base_path).map_err(|e| {
            ProviderError::Internal(format!("base_pathが不正です ({}): {e}", account.base_path))
        })?;
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ProviderError::Internal(format!("base_pathが不正です ({})", account.base_path))
            })?;
            path.pop_if_empty()
                .extend([API_VERSION, "accounts", account.account_id.as_str(), "envelopes"])
                .extend(segments);
        }
        Ok(url)
    }

    /// Bearerトークンを付けて送信し、2xx以外を `ProviderError::Request` に変換する。
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        account: &AccountContext,
    ) -> Result<reqwest::Response, ProviderError> {
        let response = request
            .bearer_auth(&account.access_token)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("HTTP送信失敗: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            // 次回の認証でトークンを取り直す
            self.token_cache.invalidate(&account.access_token).await;
        }

        let body = response.text().await.unwrap_or_default();
        let parsed: ApiErrorBody = serde_json::from_str(&body).unwrap_or_default();
        Err(ProviderError::Request {
            status: status.as_u16(),
            error_code: parsed.error_code,
            message: parsed.message.unwrap_or(body),
        })
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ProviderError> {
        response
            .json()
            .await
            .map_err(|e| ProviderError::Transport(format!("レスポンスのパースに失敗: {e}")))
    }
}

#[async_trait]
impl SignatureProvider for RestProvider {
    async fn authenticate(&self) -> Result<AccountContext, ProviderError> {
        self.token_cache
            .get_or_refresh(|| auth::exchange_jwt(&self.http, &self.config, &self.encoding_key))
            .await
    }

    async fn create_envelope(
        &self,
        account: &AccountContext,
        signers: &[EnvelopeArgs],
        document_base64: &str,
        status: EnvelopeStatus,
    ) -> Result<Envelope, ProviderError> {
        let definition = build_envelope(signers, document_base64, status);
        let url = Self::envelopes_url(account, &[])?;
        let response = self.send(self.http.post(url).json(&definition), account).await?;
        let envelope: Envelope = Self::read_json(response).await?;
        tracing::info!(
            envelope_id = %envelope.envelope_id,
            status = %envelope.status,
            signers = signers.len(),
            "エンベロープを作成しました"
        );
        Ok(envelope)
    }

    async fn get_envelope(
        &self,
        account: &AccountContext,
        envelope_id: &str,
    ) -> Result<Envelope, ProviderError> {
        let url = Self::envelopes_url(account, &[envelope_id])?;
        let response = self.send(self.http.get(url), account).await?;
        Self::read_json(response).await
    }

    async fn list_recipients(
        &self,
        account: &AccountContext,
        envelope_id: &str,
    ) -> Result<Recipients, ProviderError> {
        let url = Self::envelopes_url(account, &[envelope_id, "recipients"])?;
        let response = self.send(self.http.get(url), account).await?;
        Self::read_json(response).await
    }

    async fn get_combined_document(
        &self,
        account: &AccountContext,
        envelope_id: &str,
    ) -> Result<Vec<u8>, ProviderError> {
        let url = Self::envelopes_url(account, &[envelope_id, "documents", "combined"])?;
        let response = self.send(self.http.get(url), account).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Transport(format!("文書の読み取りに失敗: {e}")))?;
        Ok(bytes.to_vec())
    }

    async fn create_recipient_view(
        &self,
        account: &AccountContext,
        args: &RecipientViewArgs,
    ) -> Result<RecipientView, ProviderError> {
        let request = build_recipient_view(args);
        let url = Self::envelopes_url(account, &[args.envelope_id.as_str(), "views", "recipient"])?;
        let response = self.send(self.http.post(url).json(&request), account).await?;
        Self::read_json(response).await
    }
}
