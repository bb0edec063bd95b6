//! # エンドポイントテスト用共通ヘルパー
//!
//! プロバイダのスタブと、スタブを組み込んだGatewayStateを提供する。

use std::path::Path;
use std::sync::{Arc, Mutex};

use esign_provider::{AccountContext, ProviderError, SignatureProvider};
use esign_types::{
    Envelope, EnvelopeArgs, EnvelopeStatus, RecipientSigner, RecipientView, RecipientViewArgs,
    Recipients,
};

use crate::config::GatewayState;
use crate::storage::LocalDocumentStore;

/// スタブが知っている唯一のエンベロープID
pub const KNOWN_ENVELOPE_ID: &str = "712e6e9d-89c1-49c9-ac5d-7ec6f24861aa";
pub const STUB_PDF: &[u8] = b"%PDF-1.4 stub";

/// スタブの認証結果
#[derive(Clone, Copy)]
pub enum StubAuth {
    Ok,
    ConsentRequired,
}

/// 呼び出しを記録するプロバイダスタブ。
pub struct StubProvider {
    auth: StubAuth,
    /// 呼ばれた操作名の履歴
    pub calls: Mutex<Vec<&'static str>>,
    pub last_signers: Mutex<Vec<EnvelopeArgs>>,
    pub last_document: Mutex<Option<String>>,
    pub last_view: Mutex<Option<RecipientViewArgs>>,
}

impl StubProvider {
    pub fn new(auth: StubAuth) -> Self {
        Self {
            auth,
            calls: Mutex::new(Vec::new()),
            last_signers: Mutex::new(Vec::new()),
            last_document: Mutex::new(None),
            last_view: Mutex::new(None),
        }
    }

    fn record(&self, op: &'static str) {
        self.calls.lock().unwrap().push(op);
    }

    fn ensure_known(envelope_id: &str) -> Result<(), ProviderError> {
        if envelope_id == KNOWN_ENVELOPE_ID {
            Ok(())
        } else {
            Err(ProviderError::Request {
                status: 404,
                error_code: Some("ENVELOPE_DOES_NOT_EXIST".to_string()),
                message: "The envelope specified either does not exist or you have no rights to it."
                    .to_string(),
            })
        }
    }
}

#[async_trait::async_trait]
impl SignatureProvider for StubProvider {
    async fn authenticate(&self) -> Result<AccountContext, ProviderError> {
        self.record("authenticate");
        match self.auth {
            StubAuth::Ok => Ok(AccountContext {
                access_token: "stub-token".to_string(),
                account_id: "stub-account".to_string(),
                base_path: "https://demo.docusign.net/restapi".to_string(),
            }),
            StubAuth::ConsentRequired => Err(ProviderError::ConsentRequired {
                consent_url: "https://account-d.docusign.com/oauth/auth?response_type=code"
                    .to_string(),
            }),
        }
    }

    async fn create_envelope(
        &self,
        _account: &AccountContext,
        signers: &[EnvelopeArgs],
        document_base64: &str,
        status: EnvelopeStatus,
    ) -> Result<Envelope, ProviderError> {
        self.record("create_envelope");
        *self.last_signers.lock().unwrap() = signers.to_vec();
        *self.last_document.lock().unwrap() = Some(document_base64.to_string());
        Ok(Envelope {
            envelope_id: KNOWN_ENVELOPE_ID.to_string(),
            status: status.as_str().to_string(),
            extra: serde_json::Map::new(),
        })
    }

    async fn get_envelope(
        &self,
        _account: &AccountContext,
        envelope_id: &str,
    ) -> Result<Envelope, ProviderError> {
        self.record("get_envelope");
        Self::ensure_known(envelope_id)?;
        Ok(Envelope {
            envelope_id: envelope_id.to_string(),
            status: "completed".to_string(),
            extra: serde_json::Map::new(),
        })
    }

    async fn list_recipients(
        &self,
        _account: &AccountContext,
        envelope_id: &str,
    ) -> Result<Recipients, ProviderError> {
        self.record("list_recipients");
        Self::ensure_known(envelope_id)?;
        Ok(Recipients {
            signers: vec![RecipientSigner {
                recipient_id: "1".to_string(),
                client_user_id: Some("1000".to_string()),
                email: "test-app@yopmail.com".to_string(),
                name: "App Admin".to_string(),
                status: "sent".to_string(),
                extra: serde_json::Map::new(),
            }],
            extra: serde_json::Map::new(),
        })
    }

    async fn get_combined_document(
        &self,
        _account: &AccountContext,
        envelope_id: &str,
    ) -> Result<Vec<u8>, ProviderError> {
        self.record("get_combined_document");
        Self::ensure_known(envelope_id)?;
        Ok(STUB_PDF.to_vec())
    }

    async fn create_recipient_view(
        &self,
        _account: &AccountContext,
        args: &RecipientViewArgs,
    ) -> Result<RecipientView, ProviderError> {
        self.record("create_recipient_view");
        Self::ensure_known(&args.envelope_id)?;
        *self.last_view.lock().unwrap() = Some(args.clone());
        Ok(RecipientView {
            url: format!(
                "https://demo.docusign.net/Signing/StartInSession.aspx?t={}",
                args.envelope_id
            ),
        })
    }
}

/// スタブへの参照を残したままGatewayStateを構築する。
pub fn test_state(
    provider: Arc<StubProvider>,
    download_dir: &Path,
) -> Arc<GatewayState> {
    Arc::new(GatewayState {
        provider,
        document_store: Box::new(LocalDocumentStore::new(download_dir)),
        ping_url: "http://localhost:4000".to_string(),
        default_signer_client_id: "1000".to_string(),
    })
}

/// ディレクトリ配下のファイル数（再帰）。
pub fn count_files(dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .filter_map(Result::ok)
        .map(|e| {
            let path = e.path();
            if path.is_dir() {
                count_files(&path)
            } else {
                1
            }
        })
        .sum()
}
