//! # ダウンロード文書の一時保存
//!
//! プロバイダから取得した結合PDFの保存先を抽象化する。
//! 保存した文書はリクエスト内でのみ使い、レスポンスを組み立てた後に `release` で削除する。
//! ローカル実装は `{root}/{envelope_id}/{uuid}.pdf` に書き込むため、
//! 同じエンベロープの同時ダウンロードでもパスが衝突しない。

use std::path::{Path, PathBuf};

use crate::error::GatewayError;

/// 保存結果。
#[derive(Debug, Clone)]
pub struct StoredDocument {
    /// 保存先のパス
    pub path: PathBuf,
    /// バイト数
    pub size: usize,
}

/// 文書保存先の抽象インターフェース。
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// エンベロープの文書を保存する。途中で失敗した場合は何も残さない。
    async fn store(&self, envelope_id: &str, bytes: &[u8]) -> Result<StoredDocument, GatewayError>;

    /// `store` で保存した文書を削除する。
    async fn release(&self, stored: &StoredDocument) -> Result<(), GatewayError>;
}

/// ファイル名・ディレクトリ名に使えない文字を `_` に置き換える。
pub fn sanitize_component(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `partial_path` に書き込んでから `final_path` へ移す。
/// どちらの段階で失敗しても `partial_path` は削除する。
async fn write_then_rename(
    partial_path: &Path,
    final_path: &Path,
    bytes: &[u8],
) -> Result<(), GatewayError> {
    if let Err(e) = tokio::fs::write(partial_path, bytes).await {
        tokio::fs::remove_file(partial_path).await.ok();
        return Err(GatewayError::Storage(format!(
            "文書の書き込み失敗 ({}): {e}",
            partial_path.display()
        )));
    }

    if let Err(e) = tokio::fs::rename(partial_path, final_path).await {
        tokio::fs::remove_file(partial_path).await.ok();
        return Err(GatewayError::Storage(format!(
            "文書の配置失敗 ({}): {e}",
            final_path.display()
        )));
    }

    Ok(())
}

/// ローカルディレクトリへの保存。
pub struct LocalDocumentStore {
    root: PathBuf,
}

impl LocalDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait::async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn store(&self, envelope_id: &str, bytes: &[u8]) -> Result<StoredDocument, GatewayError> {
        let dir = self.root.join(sanitize_component(envelope_id));
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| GatewayError::Storage(format!("ディレクトリ作成失敗 ({}): {e}", dir.display())))?;

        let name = uuid::Uuid::new_v4();
        let partial_path = dir.join(format!("{name}.pdf.partial"));
        let final_path = dir.join(format!("{name}.pdf"));
        write_then_rename(&partial_path, &final_path, bytes).await?;

        Ok(StoredDocument {
            path: final_path,
            size: bytes.len(),
        })
    }

    async fn release(&self, stored: &StoredDocument) -> Result<(), GatewayError> {
        tokio::fs::remove_file(&stored.path).await.map_err(|e| {
            GatewayError::Storage(format!("文書の削除失敗 ({}): {e}", stored.path.display()))
        })?;
        // 空になったエンベロープのディレクトリも片付ける（同時ダウンロード中なら残る）
        if let Some(dir) = stored.path.parent() {
            tokio::fs::remove_dir(dir).await.ok();
        }
        Ok(())
    }
}
