//! # エンベロープ・受信者ビューの組み立て
//!
//! アダプタ引数（`esign_types`）からワイヤスキーマ（`crate::wire`）への変換。
//! 通信は行わない。

use esign_types::{EnvelopeArgs, EnvelopeStatus, RecipientViewArgs};

use crate::wire::{
    Document, EnvelopeDefinition, RecipientViewRequest, Recipients, SignHere, Signer, Tabs,
};

pub const EMAIL_SUBJECT: &str = "Please sign this document";
pub const DOCUMENT_ID: &str = "1";
pub const DOCUMENT_NAME: &str = "Lorem Ipsum";
pub const DOCUMENT_EXTENSION: &str = "html";

pub const ANCHOR_UNITS: &str = "pixels";
pub const ANCHOR_X_OFFSET: &str = "20";
pub const ANCHOR_Y_OFFSET: &str = "10";

/// 受信者ビューの認証方式。署名者の認証はホストアプリ側で済んでいる。
pub const AUTHENTICATION_METHOD: &str = "none";
/// 署名画面からのping間隔（秒）
pub const PING_FREQUENCY_SECS: u32 = 600;

/// 受信者番号に対応するアンカー文字列。
pub fn anchor_marker(recipient_id: u32) -> String {
    format!("**signature_{recipient_id}**")
}

/// 1文書のエンベロープを組み立てる。
///
/// 受信者番号は入力順に 1..N。各署名者に `**signature_<番号>**` へアンカーした
/// 署名欄を1つずつ置く。
pub fn build_envelope(
    signers: &[EnvelopeArgs],
    document_base64: &str,
    status: EnvelopeStatus,
) -> EnvelopeDefinition {
    let document = Document {
        document_base64: document_base64.to_string(),
        name: DOCUMENT_NAME.to_string(),
        file_extension: DOCUMENT_EXTENSION.to_string(),
        document_id: DOCUMENT_ID.to_string(),
    };

    let signers = (1u32..)
        .zip(signers)
        .map(|(recipient_id, args)| Signer {
            email: args.signer_email.clone(),
            name: args.signer_name.clone(),
            client_user_id: args.signer_client_id.clone(),
            recipient_id,
            tabs: Tabs {
                sign_here_tabs: vec![SignHere {
                    anchor_string: anchor_marker(recipient_id),
                    anchor_units: ANCHOR_UNITS.to_string(),
                    anchor_x_offset: ANCHOR_X_OFFSET.to_string(),
                    anchor_y_offset: ANCHOR_Y_OFFSET.to_string(),
                }],
            },
        })
        .collect();

    EnvelopeDefinition {
        email_subject: EMAIL_SUBJECT.to_string(),
        documents: vec![document],
        recipients: Recipients { signers },
        status: status.as_str().to_string(),
    }
}

/// 文書に含まれていないアンカーの受信者番号を返す。
/// 空でなければ、その番号の署名者には署名欄が表示されない。
pub fn missing_anchors(document: &str, signer_count: usize) -> Vec<u32> {
    (1u32..)
        .take(signer_count)
        .filter(|id| !document.contains(&anchor_marker(*id)))
        .collect()
}

/// 受信者ビュー要求を組み立てる。
///
/// 署名者情報はエンベロープ作成時と一致している必要があるが、ここでは検査せず
/// そのまま渡す（不一致はプロバイダが拒否する）。
pub fn build_recipient_view(args: &RecipientViewArgs) -> RecipientViewRequest {
    RecipientViewRequest {
        return_url: args.return_url.clone(),
        authentication_method: AUTHENTICATION_METHOD.to_string(),
        email: args.signer_email.clone(),
        user_name: args.signer_name.clone(),
        client_user_id: args.signer_client_id.clone(),
        ping_frequency: PING_FREQUENCY_SECS,
        ping_url: args.ping_url.clone(),
    }
}
