//! レシート処理機能
//!
//! アップロード・抽出・保存のパイプラインとバッチ処理を提供する

pub mod models;
pub mod processor;
pub mod storage;

pub use models::{BatchResult, BatchSummary, FailedReceipt, ProcessingError};
pub use processor::ReceiptProcessor;
pub use storage::R2Client;
