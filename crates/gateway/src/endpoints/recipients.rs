//! # GET /recipients
//!
//! エンベロープの署名者と、それぞれの署名状態を返す。

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use esign_types::{EnvelopeIdQuery, Recipients};

use crate::config::GatewayState;
use crate::error::GatewayError;

/// GET /recipients — 署名者一覧。
pub async fn handle_recipients(
    State(state): State<Arc<GatewayState>>,
    query: Result<Query<EnvelopeIdQuery>, QueryRejection>,
) -> Result<Json<Recipients>, GatewayError> {
    let Query(query) = query?;
    let envelope_id = query.require_envelope_id()?;

    let account = state.provider.authenticate().await?;
    let recipients = state.provider.list_recipients(&account, &envelope_id).await?;
    Ok(Json(recipients))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::test_helpers::*;

    #[tokio::test]
    async fn test_recipients() {
        let dir = tempfile::TempDir::new().unwrap();
        let stub = Arc::new(StubProvider::new(StubAuth::Ok));
        let state = test_state(stub, dir.path());

        let recipients = handle_recipients(
            State(state.clone()),
            Ok(Query(EnvelopeIdQuery {
                envelope_id: Some(KNOWN_ENVELOPE_ID.to_string()),
            })),
        )
        .await
        .unwrap()
        .0;
        assert_eq!(recipients.signers.len(), 1);
        assert_eq!(recipients.signers[0].client_user_id.as_deref(), Some("1000"));

        let unknown = handle_recipients(
            State(state),
            Ok(Query(EnvelopeIdQuery {
                envelope_id: Some("unknown".to_string()),
            })),
        )
        .await;
        assert!(matches!(
            unknown,
            Err(GatewayError::Provider {
                status: Some(404),
                ..
            })
        ));
    }
}
