//! # プロバイダ ワイヤスキーマ
//!
//! REST APIに送受信するJSONの形。プロバイダ固有のフィールド名はこのモジュールに閉じる。
//! 数値もプロバイダ側は文字列で受け取るため、送信時は文字列化する。

use serde::{Deserialize, Deserializer, Serialize, Serializer};

fn as_string<T: std::fmt::Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// `true` / `"true"` のどちらでも受け付ける。
fn bool_or_string<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Bool(b) => b,
        Raw::Text(s) => s.eq_ignore_ascii_case("true"),
    })
}

// ---------------------------------------------------------------------------
// エンベロープ作成
// ---------------------------------------------------------------------------

/// エンベロープ作成リクエスト。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeDefinition {
    pub email_subject: String,
    /// 配列の順序がエンベロープ内の文書順になる
    pub documents: Vec<Document>,
    pub recipients: Recipients,
    /// "sent" で即時送信、"created" で下書き
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub document_base64: String,
    /// 表示名。実ファイル名と異なってよい
    pub name: String,
    pub file_extension: String,
    pub document_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipients {
    pub signers: Vec<Signer>,
}

/// 署名者。`client_user_id` を設定すると埋め込み署名になる。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Signer {
    pub email: String,
    pub name: String,
    pub client_user_id: String,
    #[serde(serialize_with = "as_string")]
    pub recipient_id: u32,
    pub tabs: Tabs,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tabs {
    pub sign_here_tabs: Vec<SignHere>,
}

/// アンカー文字列の位置に置かれる署名欄。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignHere {
    pub anchor_string: String,
    pub anchor_units: String,
    pub anchor_x_offset: String,
    pub anchor_y_offset: String,
}

// ---------------------------------------------------------------------------
// 受信者ビュー
// ---------------------------------------------------------------------------

/// 受信者ビュー（埋め込み署名URL）作成リクエスト。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientViewRequest {
    pub return_url: String,
    pub authentication_method: String,
    pub email: String,
    pub user_name: String,
    pub client_user_id: String,
    /// pingUrlがhttpsの場合のみ有効（プロバイダ側の制約）
    #[serde(serialize_with = "as_string")]
    pub ping_frequency: u32,
    pub ping_url: String,
}

// ---------------------------------------------------------------------------
// OAuth
// ---------------------------------------------------------------------------

/// `/oauth/token` の成功レスポンス。
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// 秒。省略時は1時間とみなす
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

/// `/oauth/*` のエラーレスポンス。
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthErrorBody {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// `/oauth/userinfo` レスポンス。
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub accounts: Vec<UserAccount>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserAccount {
    pub account_id: String,
    #[serde(default, deserialize_with = "bool_or_string")]
    pub is_default: bool,
    pub base_uri: String,
}

// ---------------------------------------------------------------------------
// REST API エラー
// ---------------------------------------------------------------------------

/// eSignature REST APIのエラーボディ。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
