//! 機能モジュール
//!
//! 機能ごとに独立したモジュールとして実装する

pub mod extraction;
pub mod receipts;
pub mod reports;
