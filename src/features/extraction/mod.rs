//! 経費データ抽出機能モジュール
//!
//! このモジュールは領収書画像からの経費データ抽出に関連する機能を提供します：
//! - 画像ペイロードのエンコード（Base64 + メディアタイプ推定）
//! - Vision APIへのリクエスト送信
//! - 信頼できない応答テキストの解析と検証

// サブモジュールの宣言
pub mod client;
pub mod media;
pub mod models;

// 公開インターフェース：外部から使用可能な型と関数をエクスポート

// モデル
pub use models::{ExpenseCategory, ExtractedExpense, ExtractionError};

// クライアント
pub use client::{decode_response, ExpenseExtractor, VisionClient};

// メディアエンコーダ
pub use media::{encode, media_type_for};
