//! # Gateway エラー型
//!
//! ハンドラはすべてこの型でエラーを返し、ここでHTTPレスポンスに変換する。
//! レスポンスボディは `{"error": {"kind": ..., "message": ...}}` 形式。

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use esign_provider::ProviderError;
use esign_types::ValidationError;

/// Gatewayエラー型。
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// 入力検証に失敗（プロバイダ呼び出し前）
    #[error("不正なリクエスト: {message}")]
    Validation {
        field: Option<String>,
        message: String,
    },
    /// 運用者による同意が必要
    #[error("アプリケーションへの同意が必要です")]
    ConsentRequired { consent_url: String },
    /// JWT交換に失敗
    #[error("プロバイダ認証に失敗: {0}")]
    Authentication(String),
    /// プロバイダ呼び出しに失敗
    #[error("プロバイダ呼び出しに失敗: {message}")]
    Provider {
        status: Option<u16>,
        error_code: Option<String>,
        message: String,
    },
    /// 文書の保存に失敗
    #[error("ストレージ操作に失敗: {0}")]
    Storage(String),
    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl GatewayError {
    fn kind(&self) -> &'static str {
        match self {
            GatewayError::Validation { .. } => "validation_failure",
            GatewayError::ConsentRequired { .. } => "consent_required",
            GatewayError::Authentication(_) => "authentication_failure",
            GatewayError::Provider { .. } => "provider_request_failure",
            GatewayError::Storage(_) => "storage_failure",
            GatewayError::Internal(_) => "internal",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Validation { .. } => StatusCode::BAD_REQUEST,
            GatewayError::ConsentRequired { .. } => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Authentication(_) => StatusCode::BAD_GATEWAY,
            // プロバイダの4xxはそのまま返す（存在しないエンベロープは404）。
            // 401/403はGateway自身のトークンの問題なので呼び出し側には502
            GatewayError::Provider {
                status: Some(status),
                ..
            } if (400..500).contains(status) && !matches!(*status, 401 | 403) => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            GatewayError::Provider { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::Storage(_) | GatewayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Debug, Serialize)]
struct ErrorDetail<'a> {
    kind: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    consent_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider_error_code: Option<&'a str>,
}

impl axum::response::IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "リクエスト処理に失敗");
        } else {
            tracing::warn!(error = %self, "リクエストを拒否");
        }

        let (field, consent_url, provider_status, provider_error_code) = match &self {
            GatewayError::Validation { field, .. } => (field.as_deref(), None, None, None),
            GatewayError::ConsentRequired { consent_url } => {
                (None, Some(consent_url.as_str()), None, None)
            }
            GatewayError::Provider {
                status, error_code, ..
            } => (None, None, *status, error_code.as_deref()),
            _ => (None, None, None, None),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                kind: self.kind(),
                message: self.to_string(),
                field,
                consent_url,
                provider_status,
                provider_error_code,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<ProviderError> for GatewayError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Authentication(msg) => GatewayError::Authentication(msg),
            ProviderError::ConsentRequired { consent_url } => {
                GatewayError::ConsentRequired { consent_url }
            }
            ProviderError::Request {
                status,
                error_code,
                message,
            } => GatewayError::Provider {
                status: Some(status),
                error_code,
                message,
            },
            ProviderError::Transport(message) => GatewayError::Provider {
                status: None,
                error_code: None,
                message,
            },
            ProviderError::Configuration(msg) | ProviderError::Internal(msg) => {
                GatewayError::Internal(msg)
            }
        }
    }
}

impl From<ValidationError> for GatewayError {
    fn from(err: ValidationError) -> Self {
        GatewayError::Validation {
            field: Some(err.field),
            message: err.message,
        }
    }
}

impl From<JsonRejection> for GatewayError {
    fn from(rejection: JsonRejection) -> Self {
        GatewayError::Validation {
            field: None,
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for GatewayError {
    fn from(rejection: QueryRejection) -> Self {
        GatewayError::Validation {
            field: None,
            message: rejection.body_text(),
        }
    }
}
