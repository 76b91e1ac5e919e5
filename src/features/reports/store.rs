// 経費レポート集約ストア（データベース + ファイルストレージ）

use crate::features::receipts::storage::R2Client;
use crate::features::reports::models::{Expense, ExpenseReport, ExpenseUpdate, NewExpense};
use crate::features::reports::repository;
use crate::shared::errors::{AppError, AppResult};
use async_trait::async_trait;
use log::warn;
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};

/// 経費レポート集約の永続化インターフェース
///
/// レコードの保存先（データベース）とファイルの保存先（オブジェクト
/// ストレージ）の両方を束ねる。テストでは代替実装に差し替えられる。
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    /// 経費レポートを作成する
    async fn create_report(&self, name: &str) -> AppResult<ExpenseReport>;

    /// IDで経費レポートを取得する
    async fn get_report(&self, report_id: i64) -> AppResult<ExpenseReport>;

    /// 経費レポート一覧を取得する（作成日時の降順）
    async fn list_reports(&self, limit: usize) -> AppResult<Vec<ExpenseReport>>;

    /// 経費レポートを削除する（所有する経費と領収書ファイルも削除）
    async fn delete_report(&self, report_id: i64) -> AppResult<()>;

    /// 経費を保存する
    async fn save_expense(&self, new: NewExpense, report_id: i64) -> AppResult<Expense>;

    /// レポートに属する経費一覧を取得する（日付の昇順、レンダラー契約）
    async fn get_expenses_for_report(&self, report_id: i64) -> AppResult<Vec<Expense>>;

    /// 経費を更新する（更新可能なフィールドのみ）
    async fn update_expense(&self, expense_id: i64, update: ExpenseUpdate) -> AppResult<Expense>;

    /// 経費を削除する（領収書ファイルを先に削除）
    async fn delete_expense(&self, expense_id: i64) -> AppResult<()>;

    /// 領収書ファイルをアップロードする
    ///
    /// # 戻り値
    /// ストレージパス（`{report_id}/{filename}` 形式）
    async fn upload_receipt(
        &self,
        bytes: &[u8],
        filename: &str,
        report_id: i64,
    ) -> AppResult<String>;

    /// 領収書ファイルを削除する
    ///
    /// # 戻り値
    /// 削除に成功した場合はtrue（失敗はログに記録され、falseが返る）
    async fn delete_receipt(&self, path: &str) -> bool;

    /// レポートに属する経費の件数を取得する
    async fn count_expenses(&self, report_id: i64) -> AppResult<i64>;

    /// レポートの非正規化経費カウンタを更新する
    async fn update_report_count(&self, report_id: i64, count: i64) -> AppResult<()>;
}

/// 本番用ストア実装（rusqlite + R2）
pub struct R2SqliteStore {
    db: Arc<Mutex<Connection>>,
    r2: R2Client,
}

impl R2SqliteStore {
    /// ストアを作成する
    ///
    /// # 引数
    /// * `db` - データベース接続
    /// * `r2` - R2クライアント
    ///
    /// # 戻り値
    /// ストアインスタンス
    pub fn new(db: Arc<Mutex<Connection>>, r2: R2Client) -> Self {
        Self { db, r2 }
    }

    /// データベース接続のロックを取得する
    fn conn(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|_| AppError::concurrency("データベース接続のロックに失敗しました"))
    }
}

#[async_trait]
impl ExpenseStore for R2SqliteStore {
    async fn create_report(&self, name: &str) -> AppResult<ExpenseReport> {
        let conn = self.conn()?;
        repository::create_report(&conn, name)
    }

    async fn get_report(&self, report_id: i64) -> AppResult<ExpenseReport> {
        let conn = self.conn()?;
        repository::find_report_by_id(&conn, report_id)
    }

    async fn list_reports(&self, limit: usize) -> AppResult<Vec<ExpenseReport>> {
        let conn = self.conn()?;
        repository::list_reports(&conn, limit)
    }

    async fn delete_report(&self, report_id: i64) -> AppResult<()> {
        // ロックを保持したままawaitしないよう、先に経費一覧を取り出す
        let expenses = {
            let conn = self.conn()?;
            repository::find_expenses_by_report(&conn, report_id)?
        };

        // 領収書ファイルを先に削除する（ベストエフォート）
        for expense in &expenses {
            if let Some(path) = &expense.receipt_path {
                self.delete_receipt(path).await;
            }
        }

        let conn = self.conn()?;
        repository::delete_report(&conn, report_id)
    }

    async fn save_expense(&self, new: NewExpense, report_id: i64) -> AppResult<Expense> {
        let conn = self.conn()?;
        repository::save_expense(&conn, new, report_id)
    }

    async fn get_expenses_for_report(&self, report_id: i64) -> AppResult<Vec<Expense>> {
        let conn = self.conn()?;
        repository::find_expenses_by_report(&conn, report_id)
    }

    async fn update_expense(&self, expense_id: i64, update: ExpenseUpdate) -> AppResult<Expense> {
        let conn = self.conn()?;
        repository::update_expense(&conn, expense_id, update)
    }

    async fn delete_expense(&self, expense_id: i64) -> AppResult<()> {
        let expense = {
            let conn = self.conn()?;
            repository::find_expense_by_id(&conn, expense_id)?
        };

        // 領収書ファイルを先に削除する（ベストエフォート）
        if let Some(path) = &expense.receipt_path {
            self.delete_receipt(path).await;
        }

        let conn = self.conn()?;
        repository::delete_expense(&conn, expense_id)
    }

    async fn upload_receipt(
        &self,
        bytes: &[u8],
        filename: &str,
        report_id: i64,
    ) -> AppResult<String> {
        let key = R2Client::receipt_key(report_id, filename);
        let content_type = R2Client::content_type_for(filename);

        self.r2
            .upload_file(&key, bytes.to_vec(), content_type)
            .await
    }

    async fn delete_receipt(&self, path: &str) -> bool {
        match self.r2.delete_file(path).await {
            Ok(()) => true,
            Err(e) => {
                warn!("領収書ファイルの削除に失敗しました: path={path}, error={e}");
                false
            }
        }
    }

    async fn count_expenses(&self, report_id: i64) -> AppResult<i64> {
        let conn = self.conn()?;
        repository::count_expenses(&conn, report_id)
    }

    async fn update_report_count(&self, report_id: i64, count: i64) -> AppResult<()> {
        let conn = self.conn()?;
        repository::update_report_count(&conn, report_id, count)
    }
}
