//! # Gatewayエンドポイント
//!
//! 各ハンドラは (1) 入力検証 (2) 認証 (3) プロバイダ操作1回 (4) 結果の返却 のみを行う。

pub mod create;
pub mod download;
pub mod envelope;
pub mod health;
pub mod recipients;
pub mod sign;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use create::{handle_create, handle_create_single};
pub use download::handle_download;
pub use envelope::handle_envelope;
pub use health::handle_health;
pub use recipients::handle_recipients;
pub use sign::handle_sign;
