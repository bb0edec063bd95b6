//! # eSign Gateway 共有型定義
//!
//! Gatewayの入出力と、プロバイダアダプタへ渡す引数をRust構造体として提供する。
//!
//! ## 命名規則
//! - クライアント → Gateway のリクエスト: snake_case
//! - Gateway → クライアント のレスポンス（プロバイダ由来）: camelCase
//!
//! プロバイダ固有のワイヤスキーマはここには置かない（`esign-provider`の`wire`を参照）。

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// アダプタ引数
// ---------------------------------------------------------------------------

/// エンベロープに含める署名者1名分の引数。
///
/// 入力列の順序が受信者番号（1始まり）を決める。
/// ここで渡した email / name / client_id は、後の受信者ビュー要求で
/// 完全一致させる必要がある。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeArgs {
    /// 署名者のメールアドレス
    pub signer_email: String,
    /// 署名者の表示名
    pub signer_name: String,
    /// 埋め込み署名用のクライアントID
    pub signer_client_id: String,
}

/// 受信者ビュー（埋め込み署名URL）要求の引数。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientViewArgs {
    /// 対象エンベロープID
    pub envelope_id: String,
    /// 署名完了後のリダイレクト先
    pub return_url: String,
    /// 署名画面からのping送信先
    pub ping_url: String,
    /// 署名者のメールアドレス（作成時と一致すること）
    pub signer_email: String,
    /// 署名者の表示名（作成時と一致すること）
    pub signer_name: String,
    /// 署名者のクライアントID（作成時と一致すること）
    pub signer_client_id: String,
}

/// エンベロープ作成時のステータス。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    /// 即時送信
    #[default]
    Sent,
    /// 下書きとして作成
    Created,
}

impl EnvelopeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvelopeStatus::Sent => "sent",
            EnvelopeStatus::Created => "created",
        }
    }
}

// ---------------------------------------------------------------------------
// 入力検証
// ---------------------------------------------------------------------------

/// 入力検証エラー。プロバイダ呼び出し前に返される。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// 問題のあるフィールド（例: `envelope_args[1].email`）
    pub field: String,
    /// 内容
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn require(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, "必須項目です"));
    }
    Ok(trimmed.to_string())
}

fn require_email(field: &str, value: &str) -> Result<String, ValidationError> {
    let email = require(field, value)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(email)
        }
        _ => Err(ValidationError::new(field, "メールアドレスの形式が不正です")),
    }
}

/// 数値・文字列のどちらで送られても文字列として受け取る。
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

// ---------------------------------------------------------------------------
// API リクエスト
// ---------------------------------------------------------------------------

/// GET / クエリ。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvelopeQuery {
    /// 対象エンベロープID
    #[serde(default)]
    pub envelope_id: Option<String>,
    /// リダイレクト元のイベント名（そのまま返却する）
    #[serde(default)]
    pub event: Option<String>,
}

/// GET /recipients, GET /download クエリ。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvelopeIdQuery {
    #[serde(default)]
    pub envelope_id: Option<String>,
}

impl EnvelopeIdQuery {
    /// 必須の envelope_id を取り出す。
    pub fn require_envelope_id(&self) -> Result<String, ValidationError> {
        require("envelope_id", self.envelope_id.as_deref().unwrap_or_default())
    }
}

impl EnvelopeQuery {
    pub fn require_envelope_id(&self) -> Result<String, ValidationError> {
        require("envelope_id", self.envelope_id.as_deref().unwrap_or_default())
    }
}

/// POST /create の署名者エントリ。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignerEntry {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub signer_client_id: String,
}

/// POST /create リクエスト。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateEnvelopeRequest {
    /// 署名者一覧（順序が受信者番号になる）
    #[serde(default)]
    pub envelope_args: Vec<SignerEntry>,
    /// 省略時は "sent"
    #[serde(default)]
    pub status: Option<EnvelopeStatus>,
}

impl CreateEnvelopeRequest {
    /// 署名者一覧を検証し、アダプタ引数に変換する。
    pub fn to_envelope_args(&self) -> Result<Vec<EnvelopeArgs>, ValidationError> {
        if self.envelope_args.is_empty() {
            return Err(ValidationError::new(
                "envelope_args",
                "署名者を1名以上指定してください",
            ));
        }

        self.envelope_args
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                Ok(EnvelopeArgs {
                    signer_email: require_email(&format!("envelope_args[{i}].email"), &entry.email)?,
                    signer_name: require(&format!("envelope_args[{i}].name"), &entry.name)?,
                    signer_client_id: require(
                        &format!("envelope_args[{i}].signer_client_id"),
                        &entry.signer_client_id,
                    )?,
                })
            })
            .collect()
    }
}

/// POST /create-single リクエスト。
/// クライアントIDはGateway設定の既定値を使う。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSingleRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
}

impl CreateSingleRequest {
    pub fn to_envelope_args(&self, signer_client_id: &str) -> Result<EnvelopeArgs, ValidationError> {
        Ok(EnvelopeArgs {
            signer_email: require_email("email", &self.email)?,
            signer_name: require("name", &self.name)?,
            signer_client_id: signer_client_id.to_string(),
        })
    }
}

/// POST /sign リクエスト。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub return_url: String,
    #[serde(default)]
    pub envelope_id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub signer_client_id: String,
}

impl SignRequest {
    /// 検証してアダプタ引数に変換する。`return_url` の形式検査はGateway側で行う。
    pub fn to_view_args(&self, ping_url: &str) -> Result<RecipientViewArgs, ValidationError> {
        Ok(RecipientViewArgs {
            envelope_id: require("envelope_id", &self.envelope_id)?,
            return_url: require("return_url", &self.return_url)?,
            ping_url: ping_url.to_string(),
            signer_email: require_email("email", &self.email)?,
            signer_name: require("name", &self.name)?,
            signer_client_id: require("signer_client_id", &self.signer_client_id)?,
        })
    }
}

// ---------------------------------------------------------------------------
// API レスポンス
// ---------------------------------------------------------------------------

/// プロバイダ側のエンベロープ。
/// 既知フィールド以外もそのままクライアントへ返す。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub envelope_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// GET / レスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeWithEvent {
    pub envelope: Envelope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
}

/// エンベロープの署名者とその状態。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientSigner {
    #[serde(default)]
    pub recipient_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_user_id: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// GET /recipients レスポンス。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipients {
    #[serde(default)]
    pub signers: Vec<RecipientSigner>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// 埋め込み署名URL。一度限り有効で、Gatewayは保存しない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientView {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_maps_signers_in_order() {
        let body: CreateEnvelopeRequest = serde_json::from_value(serde_json::json!({
            "envelope_args": [
                {"email": "test-app@yopmail.com", "name": "App Admin", "signer_client_id": "1000"},
                {"email": "mermaid.man@yopmail.com", "name": "Mermaid Man", "signer_client_id": 2000}
            ]
        }))
        .unwrap();

        let args = body.to_envelope_args().unwrap();
        assert_eq!(args.len(), 2);
        assert_eq!(args[0].signer_name, "App Admin");
        assert_eq!(args[1].signer_email, "mermaid.man@yopmail.com");
        // 数値のクライアントIDも文字列として受け付ける
        assert_eq!(args[1].signer_client_id, "2000");
        assert_eq!(body.status, None);
    }

    #[test]
    fn test_create_request_rejects_missing_fields() {
        let empty = CreateEnvelopeRequest::default();
        assert_eq!(empty.to_envelope_args().unwrap_err().field, "envelope_args");

        let body: CreateEnvelopeRequest = serde_json::from_value(serde_json::json!({
            "envelope_args": [
                {"email": "a@x.com", "name": "A", "signer_client_id": "1"},
                {"email": "not-an-email", "name": "B", "signer_client_id": "2"}
            ]
        }))
        .unwrap();
        let err = body.to_envelope_args().unwrap_err();
        assert_eq!(err.field, "envelope_args[1].email");

        let body: CreateEnvelopeRequest = serde_json::from_value(serde_json::json!({
            "envelope_args": [{"email": "a@x.com", "name": "  ", "signer_client_id": "1"}]
        }))
        .unwrap();
        assert_eq!(body.to_envelope_args().unwrap_err().field, "envelope_args[0].name");
    }

    #[test]
    fn test_draft_status_parses() {
        let body: CreateEnvelopeRequest = serde_json::from_value(serde_json::json!({
            "envelope_args": [],
            "status": "created"
        }))
        .unwrap();
        assert_eq!(body.status, Some(EnvelopeStatus::Created));
        assert_eq!(EnvelopeStatus::default().as_str(), "sent");
    }

    #[test]
    fn test_sign_request_validation() {
        let body: SignRequest = serde_json::from_value(serde_json::json!({
            "email": "mermaid.man@yopmail.com",
            "name": "Mermaid Man",
            "return_url": "http://localhost:4000/recipients",
            "envelope_id": "712e6e9d-89c1-49c9-ac5d-7ec6f24861aa",
            "signer_client_id": "2000"
        }))
        .unwrap();
        let args = body.to_view_args("http://localhost:4000").unwrap();
        assert_eq!(args.ping_url, "http://localhost:4000");
        assert_eq!(args.signer_client_id, "2000");

        let missing = SignRequest {
            envelope_id: String::new(),
            ..body
        };
        assert_eq!(
            missing.to_view_args("http://localhost:4000").unwrap_err().field,
            "envelope_id"
        );
    }

    #[test]
    fn test_envelope_keeps_unknown_fields() {
        let envelope: Envelope = serde_json::from_value(serde_json::json!({
            "envelopeId": "abc",
            "status": "sent",
            "statusDateTime": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(envelope.envelope_id, "abc");
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["statusDateTime"], "2024-01-01T00:00:00Z");
        assert_eq!(value["status"], "sent");
    }
}
