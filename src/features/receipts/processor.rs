use std::sync::Arc;

use log::{error, info, warn};

use crate::features::extraction::client::ExpenseExtractor;
use crate::features::receipts::models::{
    BatchResult, BatchSummary, FailedReceipt, ProcessingError,
};
use crate::features::reports::models::{Expense, NewExpense};
use crate::features::reports::store::ExpenseStore;

/// レシート処理のオーケストレーター
///
/// アップロード → 抽出 → 保存 のパイプラインを調整し、
/// 途中で失敗した場合はアップロード済みファイルを巻き戻す
pub struct ReceiptProcessor {
    store: Arc<dyn ExpenseStore>,
    extractor: Arc<dyn ExpenseExtractor>,
}

impl ReceiptProcessor {
    pub fn new(store: Arc<dyn ExpenseStore>, extractor: Arc<dyn ExpenseExtractor>) -> Self {
        Self { store, extractor }
    }

    /// 単一のレシートを処理して経費レコードを作成する
    ///
    /// # 引数
    /// * `bytes` - レシートファイルの内容
    /// * `filename` - 元のファイル名
    /// * `report_id` - 紐付けるレポートID
    ///
    /// # 戻り値
    /// 保存済みの経費レコード
    ///
    /// 抽出または保存に失敗した場合、アップロード済みのファイルを
    /// 削除してから失敗を返す。孤立ファイルをストレージに残さない。
    pub async fn process(
        &self,
        bytes: &[u8],
        filename: &str,
        report_id: i64,
    ) -> Result<Expense, ProcessingError> {
        info!("レシート処理開始: {filename} (レポートID: {report_id})");

        let receipt_path = self
            .store
            .upload_receipt(bytes, filename, report_id)
            .await
            .map_err(|e| ProcessingError::UploadFailed(e.to_string()))?;

        let extracted = match self.extractor.extract(bytes, filename).await {
            Ok(extracted) => extracted,
            Err(e) => {
                warn!("抽出失敗のためアップロード済みファイルを削除: {receipt_path}");
                self.store.delete_receipt(&receipt_path).await;
                return Err(ProcessingError::ExtractionFailed(e.to_string()));
            }
        };

        let new_expense = NewExpense::from_extracted(extracted, Some(receipt_path.clone()));

        match self.store.save_expense(new_expense, report_id).await {
            Ok(expense) => {
                info!("レシート処理完了: {filename} -> 経費ID {}", expense.id);
                Ok(expense)
            }
            Err(e) => {
                warn!("保存失敗のためアップロード済みファイルを削除: {receipt_path}");
                self.store.delete_receipt(&receipt_path).await;
                Err(ProcessingError::PersistFailed(e.to_string()))
            }
        }
    }

    /// 複数のレシートを順次処理する
    ///
    /// 個々の失敗はバッチ全体を止めず、失敗一覧として結果に含める。
    /// 処理後にレポートの経費件数をDBの実数で更新する。
    pub async fn process_batch(&self, files: Vec<(Vec<u8>, String)>, report_id: i64) -> BatchResult {
        let total = files.len();
        info!("バッチ処理開始: {total}件 (レポートID: {report_id})");

        let mut expenses = Vec::new();
        let mut failed_receipts = Vec::new();

        for (bytes, filename) in files {
            match self.process(&bytes, &filename, report_id).await {
                Ok(expense) => expenses.push(expense),
                Err(e) => {
                    warn!("レシート処理失敗: {filename}: {e}");
                    failed_receipts.push(FailedReceipt {
                        filename,
                        error: e.to_string(),
                    });
                }
            }
        }

        // 件数はDBの実数を正とする
        match self.store.count_expenses(report_id).await {
            Ok(count) => {
                if let Err(e) = self.store.update_report_count(report_id, count).await {
                    error!("レポート件数の更新に失敗しました (レポートID: {report_id}): {e}");
                }
            }
            Err(e) => {
                error!("経費件数の取得に失敗しました (レポートID: {report_id}): {e}");
            }
        }

        let summary = BatchSummary {
            total,
            successful: expenses.len(),
            failed: failed_receipts.len(),
        };
        info!(
            "バッチ処理完了: 成功{}件 / 失敗{}件",
            summary.successful, summary.failed
        );

        BatchResult {
            expenses,
            failed_receipts,
            summary,
        }
    }
}
