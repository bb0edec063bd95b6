//! # GET /download
//!
//! 署名済み文書（全文書を結合したPDF）のダウンロード。
//! 取得した文書はリクエスト単位の一時ファイルに書き込み、添付ファイルとして返した後に削除する。
//! プロバイダ呼び出しに失敗した場合は何も書き込まない。

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use esign_types::EnvelopeIdQuery;

use crate::config::GatewayState;
use crate::error::GatewayError;
use crate::storage::sanitize_component;

/// GET /download — 結合PDFのダウンロード。
pub async fn handle_download(
    State(state): State<Arc<GatewayState>>,
    query: Result<Query<EnvelopeIdQuery>, QueryRejection>,
) -> Result<Response, GatewayError> {
    let Query(query) = query?;
    let envelope_id = query.require_envelope_id()?;

    let account = state.provider.authenticate().await?;
    let bytes = state
        .provider
        .get_combined_document(&account, &envelope_id)
        .await?;

    let stored = state.document_store.store(&envelope_id, &bytes).await?;
    tracing::info!(
        envelope_id = %envelope_id,
        path = %stored.path.display(),
        size = stored.size,
        "文書を保存しました"
    );

    let disposition = format!(
        "attachment; filename=\"{}.pdf\"",
        sanitize_component(&envelope_id)
    );
    let response = (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response();

    if let Err(e) = state.document_store.release(&stored).await {
        tracing::warn!(error = %e, "一時保存した文書を削除できませんでした");
    }
    Ok(response)
}
