//! # POST /create, POST /create-single
//!
//! テンプレート文書を生成し、署名者付きのエンベロープを作成する。
//!
//! ## 処理フロー
//! 1. リクエストを検証し、署名者引数に変換
//! 2. 先頭の署名者でテンプレートを描画し、署名者数分のアンカーがあるか確認
//! 3. 認証してエンベロープを作成

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use base64::Engine;
use esign_provider::envelope::missing_anchors;
use esign_types::{CreateEnvelopeRequest, CreateSingleRequest, Envelope, EnvelopeArgs, EnvelopeStatus};

use crate::config::GatewayState;
use crate::error::GatewayError;
use crate::template;

/// POST /create — 複数署名者のエンベロープ作成。
pub async fn handle_create(
    State(state): State<Arc<GatewayState>>,
    payload: Result<Json<CreateEnvelopeRequest>, JsonRejection>,
) -> Result<Json<Envelope>, GatewayError> {
    let Json(body) = payload?;
    let signers = body.to_envelope_args()?;
    let status = body.status.unwrap_or_default();

    create_from_template(&state, &signers, status).await.map(Json)
}

/// POST /create-single — 1名の署名者で即時送信する。
/// クライアントIDはGateway設定の既定値を使う。
pub async fn handle_create_single(
    State(state): State<Arc<GatewayState>>,
    payload: Result<Json<CreateSingleRequest>, JsonRejection>,
) -> Result<Json<Envelope>, GatewayError> {
    let Json(body) = payload?;
    let signer = body.to_envelope_args(&state.default_signer_client_id)?;

    create_from_template(&state, &[signer], EnvelopeStatus::Sent)
        .await
        .map(Json)
}

async fn create_from_template(
    state: &GatewayState,
    signers: &[EnvelopeArgs],
    status: EnvelopeStatus,
) -> Result<Envelope, GatewayError> {
    let first = signers.first().ok_or_else(|| GatewayError::Validation {
        field: Some("envelope_args".to_string()),
        message: "署名者を1名以上指定してください".to_string(),
    })?;

    let document = template::render_document(&first.signer_name, &first.signer_email);
    let missing = missing_anchors(&document, signers.len());
    if !missing.is_empty() {
        return Err(GatewayError::Validation {
            field: Some("envelope_args".to_string()),
            message: format!(
                "文書に署名欄のアンカーがない受信者があります: {:?}（最大 {} 名）",
                missing,
                signers.len() - missing.len()
            ),
        });
    }

    let document_base64 = template::b64().encode(&document);

    let account = state.provider.authenticate().await?;
    let envelope = state
        .provider
        .create_envelope(&account, signers, &document_base64, status)
        .await?;
    Ok(envelope)
}
