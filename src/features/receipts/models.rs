use serde::Serialize;
use thiserror::Error;

use crate::features::reports::models::Expense;

/// レシート処理の各段階で発生するエラー
///
/// どの段階で失敗したかを保持し、バッチ結果の報告に使用する
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// レシートファイルのアップロードに失敗
    #[error("レシートのアップロードに失敗しました: {0}")]
    UploadFailed(String),

    /// 経費情報の抽出に失敗
    #[error("経費情報の抽出に失敗しました: {0}")]
    ExtractionFailed(String),

    /// 経費レコードの保存に失敗
    #[error("経費レコードの保存に失敗しました: {0}")]
    PersistFailed(String),
}

/// バッチ処理で失敗したレシートの記録
#[derive(Debug, Clone, Serialize)]
pub struct FailedReceipt {
    /// 元のファイル名
    pub filename: String,
    /// 失敗理由(ユーザー提示用)
    pub error: String,
}

/// バッチ処理の件数サマリー
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

/// バッチ処理の結果
///
/// 成功した経費と失敗したレシートの両方を保持する。
/// 一部のレシートが失敗してもバッチ全体は完了する。
#[derive(Debug, Serialize)]
pub struct BatchResult {
    pub expenses: Vec<Expense>,
    pub failed_receipts: Vec<FailedReceipt>,
    pub summary: BatchSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_error_display() {
        let err = ProcessingError::UploadFailed("接続タイムアウト".to_string());
        assert!(err.to_string().contains("アップロード"));

        let err = ProcessingError::ExtractionFailed("応答が不正".to_string());
        assert!(err.to_string().contains("抽出"));

        let err = ProcessingError::PersistFailed("DB書き込み失敗".to_string());
        assert!(err.to_string().contains("保存"));
    }

    #[test]
    fn test_batch_result_serialization() {
        let result = BatchResult {
            expenses: vec![],
            failed_receipts: vec![FailedReceipt {
                filename: "receipt1.jpg".to_string(),
                error: "抽出に失敗".to_string(),
            }],
            summary: BatchSummary {
                total: 1,
                successful: 0,
                failed: 1,
            },
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["summary"]["total"], 1);
        assert_eq!(json["summary"]["failed"], 1);
        assert_eq!(json["failed_receipts"][0]["filename"], "receipt1.jpg");
    }
}
