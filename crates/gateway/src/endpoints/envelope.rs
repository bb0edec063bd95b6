//! # GET /
//!
//! エンベロープの状態取得。署名完了後のリダイレクト先として使われ、
//! `event` はそのまま返す。

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use esign_types::{EnvelopeQuery, EnvelopeWithEvent};

use crate::config::GatewayState;
use crate::error::GatewayError;

/// GET / — エンベロープの状態・メタデータ取得。
pub async fn handle_envelope(
    State(state): State<Arc<GatewayState>>,
    query: Result<Query<EnvelopeQuery>, QueryRejection>,
) -> Result<Json<EnvelopeWithEvent>, GatewayError> {
    let Query(query) = query?;
    let envelope_id = query.require_envelope_id()?;

    let account = state.provider.authenticate().await?;
    let envelope = state.provider.get_envelope(&account, &envelope_id).await?;

    Ok(Json(EnvelopeWithEvent {
        envelope,
        event: query.event,
    }))
}
