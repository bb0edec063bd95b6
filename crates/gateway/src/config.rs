//! # Gateway設定・共有状態
//!
//! 環境変数からの設定読み込みとGatewayの共有状態の定義。
//! 起動後は変更しない。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use esign_provider::config::DEFAULT_CONSENT_REDIRECT_URI;
use esign_provider::{ProviderConfig, SignatureProvider};

use crate::storage::DocumentStore;

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_PRIVATE_KEY_PATH: &str = "./credentials/docusign/private.key";
const DEFAULT_PING_URL: &str = "http://localhost:4000";
const DEFAULT_SIGNER_CLIENT_ID: &str = "1000";
const DEFAULT_DOWNLOAD_DIR: &str = "./downloads";

/// Gatewayの共有状態。
pub struct GatewayState {
    /// 電子署名プロバイダ（REST実装、テストではスタブ）
    pub provider: Arc<dyn SignatureProvider>,
    /// ダウンロード文書の保存先
    pub document_store: Box<dyn DocumentStore>,
    /// 署名画面からのping送信先
    pub ping_url: String,
    /// POST /create-single で使う署名者クライアントID
    pub default_signer_client_id: String,
}

/// 環境変数から読み込む設定。
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// 待ち受けポート（`PORT`）
    pub port: u16,
    /// 認可サーバーのベースURL（`DS_AUTH_SERVER`）
    pub auth_server: String,
    /// インテグレーションキー（`DS_INTEGRATION_KEY`）
    pub integration_key: String,
    /// なりすまし対象ユーザーID（`DS_USER_ID`）
    pub user_id: String,
    /// JWT署名用RSA秘密鍵のパス（`DS_PRIVATE_KEY_PATH`）
    pub private_key_path: PathBuf,
    /// 同意URLの redirect_uri（`DS_CONSENT_REDIRECT_URI`）
    pub consent_redirect_uri: String,
    /// `DS_PING_URL`
    pub ping_url: String,
    /// `DS_SIGNER_CLIENT_ID`
    pub default_signer_client_id: String,
    /// `DOWNLOAD_DIR`
    pub download_dir: PathBuf,
}

impl GatewayConfig {
    /// プロセスの環境変数から構築する。
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意のキー参照関数から構築する。空文字は未設定として扱う。
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| anyhow::anyhow!("環境変数 {key} が設定されていません"))
        };

        let port = match get("PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("PORTは数値である必要があります: {raw}"))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            port,
            auth_server: required("DS_AUTH_SERVER")?,
            integration_key: required("DS_INTEGRATION_KEY")?,
            user_id: required("DS_USER_ID")?,
            private_key_path: get("DS_PRIVATE_KEY_PATH")
                .unwrap_or_else(|| DEFAULT_PRIVATE_KEY_PATH.to_string())
                .into(),
            consent_redirect_uri: get("DS_CONSENT_REDIRECT_URI")
                .unwrap_or_else(|| DEFAULT_CONSENT_REDIRECT_URI.to_string()),
            ping_url: get("DS_PING_URL").unwrap_or_else(|| DEFAULT_PING_URL.to_string()),
            default_signer_client_id: get("DS_SIGNER_CLIENT_ID")
                .unwrap_or_else(|| DEFAULT_SIGNER_CLIENT_ID.to_string()),
            download_dir: get("DOWNLOAD_DIR")
                .unwrap_or_else(|| DEFAULT_DOWNLOAD_DIR.to_string())
                .into(),
        })
    }

    /// 秘密鍵ファイルを読み込み、プロバイダ設定を組み立てる。
    /// 鍵ファイルが読めない場合は起動を中止する。
    pub fn provider_config(&self) -> anyhow::Result<ProviderConfig> {
        let pem = std::fs::read(&self.private_key_path).with_context(|| {
            format!(
                "秘密鍵ファイルを読み込めません: {}",
                self.private_key_path.display()
            )
        })?;

        Ok(ProviderConfig::new(
            self.auth_server.clone(),
            self.integration_key.clone(),
            self.user_id.clone(),
            pem,
        )
        .with_consent_redirect_uri(self.consent_redirect_uri.clone()))
    }
}
