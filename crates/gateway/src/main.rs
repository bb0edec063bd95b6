//! # eSign Gateway
//!
//! 電子署名プロバイダ（DocuSign eSignature REST API）の前段に立つHTTPサーバー。
//!
//! ## 役割
//! - JWTグラントによるサービス認証（トークンはプロバイダ層でキャッシュ）
//! - テンプレート文書からのエンベロープ作成
//! - 埋め込み署名URLの発行
//! - エンベロープ状態・受信者の参照
//! - 署名済み文書のダウンロードと保存
//!
//! ## API エンドポイント
//! - `GET /` — エンベロープ状態の取得
//! - `POST /create` — エンベロープ作成（複数署名者）
//! - `POST /create-single` — エンベロープ作成（1名、即時送信）
//! - `POST /sign` — 埋め込み署名URLの発行
//! - `GET /recipients` — 受信者一覧
//! - `GET /download` — 結合PDFのダウンロード
//! - `GET /health` — 死活監視

mod config;
mod endpoints;
mod error;
mod storage;
mod template;

use std::sync::Arc;

use axum::routing::{get, post};
use esign_provider::{ProviderError, RestProvider, SignatureProvider};
use tracing_subscriber::EnvFilter;

use config::{GatewayConfig, GatewayState};
use endpoints::*;
use storage::LocalDocumentStore;

/// ルーティングを構築する。
fn build_router(state: Arc<GatewayState>) -> axum::Router {
    axum::Router::new()
        .route("/", get(handle_envelope))
        .route("/create", post(handle_create))
        .route("/create-single", post(handle_create_single))
        .route("/sign", post(handle_sign))
        .route("/recipients", get(handle_recipients))
        .route("/download", get(handle_download))
        .route("/health", get(handle_health))
        .with_state(state)
}

/// 起動時の認証確認。失敗してもサーバーは起動し、各リクエストで再試行する。
async fn warm_up(provider: &dyn SignatureProvider) {
    match provider.authenticate().await {
        Ok(account) => {
            tracing::info!(account_id = %account.account_id, "起動時の認証に成功しました");
        }
        Err(ProviderError::ConsentRequired { consent_url }) => {
            tracing::warn!(
                consent_url = %consent_url,
                "同意が必要です。ブラウザで同意URLを開いてください"
            );
        }
        Err(e) => {
            tracing::warn!(error = %e, "起動時の認証に失敗しました");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = GatewayConfig::from_env()?;
    let provider = RestProvider::new(config.provider_config()?)?;

    let state = Arc::new(GatewayState {
        provider: Arc::new(provider),
        document_store: Box::new(LocalDocumentStore::new(config.download_dir.clone())),
        ping_url: config.ping_url.clone(),
        default_signer_client_id: config.default_signer_client_id.clone(),
    });

    warm_up(state.provider.as_ref()).await;

    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(
        download_dir = %config.download_dir.display(),
        "Gatewayを {} で起動します",
        addr
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// テスト
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::test_helpers::*;

    /// スタブ入りのルーターを起動し、ベースURLを返す。
    async fn spawn_gateway(stub: Arc<StubProvider>, download_dir: &std::path::Path) -> String {
        let app = build_router(test_state(stub, download_dir));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        format!("http://127.0.0.1:{port}")
    }

    #[tokio::test]
    async fn test_create_over_http() {
        let dir = tempfile::TempDir::new().unwrap();
        let stub = Arc::new(StubProvider::new(StubAuth::Ok));
        let base = spawn_gateway(stub.clone(), dir.path()).await;

        let resp = reqwest::Client::new()
            .post(format!("{base}/create"))
            .json(&serde_json::json!({
                "envelope_args": [
                    { "email": "test-app@yopmail.com", "name": "App Admin", "signer_client_id": 1000 },
                    { "email": "mermaid.man@yopmail.com", "name": "Mermaid Man", "signer_client_id": "2000" }
                ]
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["envelopeId"], KNOWN_ENVELOPE_ID);
        assert_eq!(body["status"], "sent");
        assert_eq!(stub.last_signers.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_json_is_structured_400() {
        let dir = tempfile::TempDir::new().unwrap();
        let stub = Arc::new(StubProvider::new(StubAuth::Ok));
        let base = spawn_gateway(stub.clone(), dir.path()).await;

        let resp = reqwest::Client::new()
            .post(format!("{base}/create"))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);

        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["error"]["kind"], "validation_failure");
        assert!(stub.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_download_unknown_envelope_over_http() {
        let dir = tempfile::TempDir::new().unwrap();
        let stub = Arc::new(StubProvider::new(StubAuth::Ok));
        let base = spawn_gateway(stub, dir.path()).await;

        let resp = reqwest::get(format!("{base}/download?envelope_id=does-not-exist"))
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
        assert_eq!(count_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_consent_required_over_http() {
        let dir = tempfile::TempDir::new().unwrap();
        let stub = Arc::new(StubProvider::new(StubAuth::ConsentRequired));
        let base = spawn_gateway(stub, dir.path()).await;

        let resp = reqwest::get(format!("{base}/recipients?envelope_id={KNOWN_ENVELOPE_ID}"))
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);

        let body: serde_json::Value = resp.json().await.unwrap();
        assert!(body["error"]["consent_url"]
            .as_str()
            .unwrap()
            .contains("oauth/auth"));
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::TempDir::new().unwrap();
        let stub = Arc::new(StubProvider::new(StubAuth::ConsentRequired));
        let base = spawn_gateway(stub, dir.path()).await;

        let body: serde_json::Value = reqwest::get(format!("{base}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_warm_up_never_fails() {
        let stub = StubProvider::new(StubAuth::ConsentRequired);
        warm_up(&stub).await;
        assert_eq!(*stub.calls.lock().unwrap(), vec!["authenticate"]);
    }
}
