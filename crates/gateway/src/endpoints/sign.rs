//! # POST /sign
//!
//! 埋め込み署名URLの発行。
//! 署名者情報はエンベロープ作成時と同じ値を送る必要がある（不一致はプロバイダが拒否）。
//! 発行したURLは一度限り有効で、保存せずにそのまま返す。

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use esign_types::{RecipientView, SignRequest, ValidationError};

use crate::config::GatewayState;
use crate::error::GatewayError;

/// 署名完了後のリダイレクト先に `envelope_id` を付ける。
pub(crate) fn return_url_with_envelope(
    return_url: &str,
    envelope_id: &str,
) -> Result<String, ValidationError> {
    let mut url = reqwest::Url::parse(return_url)
        .map_err(|e| ValidationError::new("return_url", format!("URLの形式が不正です: {e}")))?;
    url.query_pairs_mut().append_pair("envelope_id", envelope_id);
    Ok(url.to_string())
}

/// POST /sign — 受信者ビュー（埋め込み署名URL）の発行。
pub async fn handle_sign(
    State(state): State<Arc<GatewayState>>,
    payload: Result<Json<SignRequest>, JsonRejection>,
) -> Result<Json<RecipientView>, GatewayError> {
    let Json(body) = payload?;
    let mut args = body.to_view_args(&state.ping_url)?;
    args.return_url = return_url_with_envelope(&args.return_url, &args.envelope_id)?;

    let account = state.provider.authenticate().await?;
    let view = state.provider.create_recipient_view(&account, &args).await?;

    tracing::info!(envelope_id = %args.envelope_id, "署名URLを発行しました");
    Ok(Json(view))
}
