//! # プロバイダ エラー型

/// プロバイダアダプタのエラー型。
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// JWT交換の失敗（資格情報・通信）
    #[error("認証に失敗: {0}")]
    Authentication(String),
    /// 運用者による同意が必要
    #[error("アプリケーションへの同意が必要です: {consent_url}")]
    ConsentRequired {
        /// 運用者がブラウザで開く同意URL
        consent_url: String,
    },
    /// プロバイダが2xx以外を返した
    #[error("プロバイダがエラーを返しました: HTTP {status} - {message}")]
    Request {
        status: u16,
        error_code: Option<String>,
        message: String,
    },
    /// プロバイダへの通信自体に失敗
    #[error("プロバイダとの通信に失敗: {0}")]
    Transport(String),
    /// 設定の不備（秘密鍵の形式不正など）
    #[error("設定エラー: {0}")]
    Configuration(String),
    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}
