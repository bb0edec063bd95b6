//! # eSign プロバイダアダプタ
//!
//! 電子署名プロバイダのREST APIを小さな関数インターフェースの裏に閉じ込める。
//!
//! ## 構成
//! - `auth` — JWTグラントによるサービスアカウント認証、同意URLの導出
//! - `token_cache` — アクセストークンの有効期限付きキャッシュ
//! - `wire` — プロバイダのワイヤスキーマ（プロバイダ固有のフィールド名はここだけ）
//! - `envelope` — 引数からワイヤスキーマへの変換
//! - `client` — `SignatureProvider` トレイトとREST実装

pub mod auth;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod token_cache;
pub mod wire;

pub use auth::AccountContext;
pub use client::{RestProvider, SignatureProvider};
pub use config::ProviderConfig;
pub use error::ProviderError;
