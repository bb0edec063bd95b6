//! # プロバイダ設定
//!
//! 起動時に一度だけ組み立て、以後は変更しない。

use std::time::Duration;

/// 要求するスコープ。
pub const SCOPES: [&str; 2] = ["signature", "impersonation"];

/// JWTアサーションの要求有効期間（10分）。
pub const JWT_LIFETIME_SECS: u64 = 10 * 60;

/// 同意画面から戻る先の既定値。
pub const DEFAULT_CONSENT_REDIRECT_URI: &str =
    "https://developers.docusign.com/platform/auth/consent";

/// キャッシュ済みトークンを失効扱いにする余裕。
pub const DEFAULT_TOKEN_EXPIRY_SKEW: Duration = Duration::from_secs(60);

/// プロバイダアダプタの設定。
#[derive(Clone)]
pub struct ProviderConfig {
    /// 認可サーバーのベースURL（例: `https://account-d.docusign.com`）
    pub auth_server: String,
    /// インテグレーションキー（クライアントID）
    pub integration_key: String,
    /// なりすまし対象のユーザーID
    pub user_id: String,
    /// JWTクライアントアサーション署名用のRSA秘密鍵（PEM）。送信はしない。
    pub private_key_pem: Vec<u8>,
    /// 同意URLの redirect_uri
    pub consent_redirect_uri: String,
    /// JWTアサーションの有効期間（秒）
    pub jwt_lifetime_secs: u64,
    /// トークンキャッシュの失効余裕
    pub token_expiry_skew: Duration,
}

impl ProviderConfig {
    pub fn new(
        auth_server: impl Into<String>,
        integration_key: impl Into<String>,
        user_id: impl Into<String>,
        private_key_pem: Vec<u8>,
    ) -> Self {
        Self {
            auth_server: auth_server.into(),
            integration_key: integration_key.into(),
            user_id: user_id.into(),
            private_key_pem,
            consent_redirect_uri: DEFAULT_CONSENT_REDIRECT_URI.to_string(),
            jwt_lifetime_secs: JWT_LIFETIME_SECS,
            token_expiry_skew: DEFAULT_TOKEN_EXPIRY_SKEW,
        }
    }

    pub fn with_consent_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.consent_redirect_uri = uri.into();
        self
    }

    /// 認可サーバーのURL。スキーム省略時は https を補う。末尾の `/` は除く。
    pub fn auth_base_url(&self) -> String {
        let trimmed = self.auth_server.trim_end_matches('/');
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        }
    }

    /// 認可サーバーのホスト名（JWTの`aud`）。ドメインのみ。
    pub fn oauth_host(&self) -> &str {
        let trimmed = self.auth_server.trim_end_matches('/');
        trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
            .unwrap_or(trimmed)
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("auth_server", &self.auth_server)
            .field("integration_key", &self.integration_key)
            .field("user_id", &self.user_id)
            .field("private_key_pem", &"<redacted>")
            .field("consent_redirect_uri", &self.consent_redirect_uri)
            .field("jwt_lifetime_secs", &self.jwt_lifetime_secs)
            .field("token_expiry_skew", &self.token_expiry_skew)
            .finish()
    }
}
