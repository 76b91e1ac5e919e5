use crate::features::reports::models::{Expense, ExpenseReport, ExpenseUpdate, NewExpense};
use crate::shared::errors::{AppError, AppResult};
use chrono::Utc;
use chrono_tz::Asia::Tokyo;
use rusqlite::{params, Connection, Row};

/// 経費レポートを作成する
///
/// # 引数
/// * `conn` - データベース接続
/// * `name` - レポート名
///
/// # 戻り値
/// 作成されたレポート、または失敗時はエラー
pub fn create_report(conn: &Connection, name: &str) -> AppResult<ExpenseReport> {
    // JSTで現在時刻を取得
    let now = Utc::now().with_timezone(&Tokyo).to_rfc3339();

    conn.execute(
        "INSERT INTO expense_reports (name, created_at, total_expenses) VALUES (?1, ?2, 0)",
        params![name, now],
    )?;

    let id = conn.last_insert_rowid();
    find_report_by_id(conn, id)
}

/// IDで経費レポートを取得する
///
/// # 引数
/// * `conn` - データベース接続
/// * `report_id` - レポートID
///
/// # 戻り値
/// レポート、または失敗時はエラー
pub fn find_report_by_id(conn: &Connection, report_id: i64) -> AppResult<ExpenseReport> {
    conn.query_row(
        "SELECT id, name, created_at, total_expenses FROM expense_reports WHERE id = ?1",
        params![report_id],
        |row| {
            Ok(ExpenseReport {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: row.get(2)?,
                total_expenses: row.get(3)?,
            })
        },
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => AppError::not_found("経費レポート"),
        _ => AppError::Database(e),
    })
}

/// 経費レポート一覧を取得する（作成日時の降順）
///
/// # 引数
/// * `conn` - データベース接続
/// * `limit` - 取得する最大件数
///
/// # 戻り値
/// レポートのリスト、または失敗時はエラー
pub fn list_reports(conn: &Connection, limit: usize) -> AppResult<Vec<ExpenseReport>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, created_at, total_expenses FROM expense_reports
         ORDER BY created_at DESC LIMIT ?1",
    )?;

    let reports = stmt.query_map(params![limit as i64], |row| {
        Ok(ExpenseReport {
            id: row.get(0)?,
            name: row.get(1)?,
            created_at: row.get(2)?,
            total_expenses: row.get(3)?,
        })
    })?;

    reports
        .collect::<Result<Vec<_>, _>>()
        .map_err(AppError::Database)
}

/// 経費レポートを削除する（所有する経費はカスケード削除される）
///
/// # 引数
/// * `conn` - データベース接続
/// * `report_id` - レポートID
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
pub fn delete_report(conn: &Connection, report_id: i64) -> AppResult<()> {
    let affected_rows = conn.execute(
        "DELETE FROM expense_reports WHERE id = ?1",
        params![report_id],
    )?;

    if affected_rows == 0 {
        return Err(AppError::not_found("経費レポート"));
    }

    Ok(())
}

/// 経費を保存する
///
/// # 引数
/// * `conn` - データベース接続
/// * `new` - 経費作成用DTO
/// * `report_id` - 所有するレポートのID
///
/// # 戻り値
/// 保存された経費、または失敗時はエラー
pub fn save_expense(conn: &Connection, new: NewExpense, report_id: i64) -> AppResult<Expense> {
    // JSTで現在時刻を取得
    let now = Utc::now().with_timezone(&Tokyo).to_rfc3339();

    conn.execute(
        "INSERT INTO expenses
         (report_id, date, merchant, description, amount, currency, category,
          payment_type, city, items, receipt_path, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            report_id,
            new.date,
            new.merchant,
            new.description,
            new.amount,
            new.currency,
            new.category,
            new.payment_type,
            new.city,
            new.items,
            new.receipt_path,
            now
        ],
    )?;

    let id = conn.last_insert_rowid();
    find_expense_by_id(conn, id)
}

/// IDで経費を取得する
///
/// # 引数
/// * `conn` - データベース接続
/// * `expense_id` - 経費ID
///
/// # 戻り値
/// 経費、または失敗時はエラー
pub fn find_expense_by_id(conn: &Connection, expense_id: i64) -> AppResult<Expense> {
    conn.query_row(
        "SELECT id, report_id, date, merchant, description, amount, currency, category,
                payment_type, city, items, receipt_path, created_at
         FROM expenses WHERE id = ?1",
        params![expense_id],
        map_expense_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => AppError::not_found("経費"),
        _ => AppError::Database(e),
    })
}

/// レポートに属する経費一覧を取得する（日付の昇順）
///
/// レポートレンダラーに渡す安定した並び順の契約であるため、
/// 並び順を変更してはならない。
///
/// # 引数
/// * `conn` - データベース接続
/// * `report_id` - レポートID
///
/// # 戻り値
/// 経費のリスト、または失敗時はエラー
pub fn find_expenses_by_report(conn: &Connection, report_id: i64) -> AppResult<Vec<Expense>> {
    let mut stmt = conn.prepare(
        "SELECT id, report_id, date, merchant, description, amount, currency, category,
                payment_type, city, items, receipt_path, created_at
         FROM expenses WHERE report_id = ?1 ORDER BY date ASC",
    )?;

    let expenses = stmt.query_map(params![report_id], map_expense_row)?;

    expenses
        .collect::<Result<Vec<_>, _>>()
        .map_err(AppError::Database)
}

/// 経費を更新する
///
/// # 引数
/// * `conn` - データベース接続
/// * `expense_id` - 経費ID
/// * `update` - 経費更新用DTO（指定されたフィールドのみ更新）
///
/// # 戻り値
/// 更新後の経費、または失敗時はエラー
///
/// id・report_id・created_at・receipt_pathはDTOに含まれないため
/// 変更されない。
pub fn update_expense(
    conn: &Connection,
    expense_id: i64,
    update: ExpenseUpdate,
) -> AppResult<Expense> {
    // 既存の経費を取得
    let existing = find_expense_by_id(conn, expense_id)?;

    // 更新するフィールドを決定
    let date = update.date.unwrap_or(existing.date);
    let merchant = update.merchant.unwrap_or(existing.merchant);
    let description = update.description.or(existing.description);
    let amount = update.amount.unwrap_or(existing.amount);
    let currency = update.currency.unwrap_or(existing.currency);
    let category = update.category.unwrap_or(existing.category);
    let payment_type = update.payment_type.unwrap_or(existing.payment_type);
    let city = update.city.or(existing.city);
    let items = update.items.or(existing.items);

    conn.execute(
        "UPDATE expenses
         SET date = ?1, merchant = ?2, description = ?3, amount = ?4, currency = ?5,
             category = ?6, payment_type = ?7, city = ?8, items = ?9
         WHERE id = ?10",
        params![
            date,
            merchant,
            description,
            amount,
            currency,
            category,
            payment_type,
            city,
            items,
            expense_id
        ],
    )?;

    find_expense_by_id(conn, expense_id)
}

/// 経費を削除する
///
/// # 引数
/// * `conn` - データベース接続
/// * `expense_id` - 経費ID
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
pub fn delete_expense(conn: &Connection, expense_id: i64) -> AppResult<()> {
    let affected_rows = conn.execute("DELETE FROM expenses WHERE id = ?1", params![expense_id])?;

    if affected_rows == 0 {
        return Err(AppError::not_found("経費"));
    }

    Ok(())
}

/// レポートに属する経費の件数を取得する
///
/// # 引数
/// * `conn` - データベース接続
/// * `report_id` - レポートID
///
/// # 戻り値
/// 経費の件数、または失敗時はエラー
pub fn count_expenses(conn: &Connection, report_id: i64) -> AppResult<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM expenses WHERE report_id = ?1",
        params![report_id],
        |row| row.get(0),
    )
    .map_err(AppError::Database)
}

/// レポートの非正規化経費カウンタを更新する
///
/// # 引数
/// * `conn` - データベース接続
/// * `report_id` - レポートID
/// * `count` - 設定する件数
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
pub fn update_report_count(conn: &Connection, report_id: i64, count: i64) -> AppResult<()> {
    let affected_rows = conn.execute(
        "UPDATE expense_reports SET total_expenses = ?1 WHERE id = ?2",
        params![count, report_id],
    )?;

    if affected_rows == 0 {
        return Err(AppError::not_found("経費レポート"));
    }

    Ok(())
}

/// 経費テーブルの1行をモデルに変換する
fn map_expense_row(row: &Row<'_>) -> rusqlite::Result<Expense> {
    Ok(Expense {
        id: row.get(0)?,
        report_id: row.get(1)?,
        date: row.get(2)?,
        merchant: row.get(3)?,
        description: row.get(4)?,
        amount: row.get(5)?,
        currency: row.get(6)?,
        category: row.get(7)?,
        payment_type: row.get(8)?,
        city: row.get(9)?,
        items: row.get(10)?,
        receipt_path: row.get(11)?,
        created_at: row.get(12)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::database::create_tables;
    use rusqlite::Connection;

    fn create_test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON").unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    fn sample_expense(receipt_path: Option<String>) -> NewExpense {
        NewExpense {
            date: "2024-05-01".to_string(),
            merchant: "Cafe Tokyo".to_string(),
            description: Some("チームランチ".to_string()),
            amount: 31.39,
            currency: "USD".to_string(),
            category: "Meals".to_string(),
            payment_type: "Credit Card".to_string(),
            city: Some("Tokyo".to_string()),
            items: None,
            receipt_path,
        }
    }

    #[test]
    fn test_report_crud_operations() {
        let conn = create_test_db();

        // レポート作成のテスト
        let report = create_report(&conn, "2024年5月 出張").unwrap();
        assert_eq!(report.name, "2024年5月 出張");
        assert_eq!(report.total_expenses, 0);

        // レポート取得のテスト
        let retrieved = find_report_by_id(&conn, report.id).unwrap();
        assert_eq!(retrieved.id, report.id);

        // レポート削除のテスト
        delete_report(&conn, report.id).unwrap();
        assert!(find_report_by_id(&conn, report.id).is_err());
    }

    #[test]
    fn test_expense_save_and_retrieve() {
        let conn = create_test_db();
        let report = create_report(&conn, "テストレポート").unwrap();

        // 経費保存のテスト
        let expense = save_expense(
            &conn,
            sample_expense(Some("1/receipt.jpg".to_string())),
            report.id,
        )
        .unwrap();
        assert_eq!(expense.report_id, report.id);
        assert_eq!(expense.amount, 31.39);
        assert_eq!(expense.receipt_path, Some("1/receipt.jpg".to_string()));

        // 経費取得のテスト
        let retrieved = find_expense_by_id(&conn, expense.id).unwrap();
        assert_eq!(retrieved.merchant, "Cafe Tokyo");
        assert_eq!(retrieved.category, "Meals");
    }

    #[test]
    fn test_update_expense_partial_fields() {
        let conn = create_test_db();
        let report = create_report(&conn, "更新テスト").unwrap();
        let expense = save_expense(
            &conn,
            sample_expense(Some("1/receipt.jpg".to_string())),
            report.id,
        )
        .unwrap();

        // 指定したフィールドのみ更新される
        let updated = update_expense(
            &conn,
            expense.id,
            ExpenseUpdate {
                merchant: Some("Hotel Plaza".to_string()),
                amount: Some(250.0),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(updated.merchant, "Hotel Plaza");
        assert_eq!(updated.amount, 250.0);

        // 未指定のフィールドは変更されない
        assert_eq!(updated.date, "2024-05-01");
        assert_eq!(updated.category, "Meals");

        // 保護フィールドは変更されない
        assert_eq!(updated.id, expense.id);
        assert_eq!(updated.report_id, expense.report_id);
        assert_eq!(updated.receipt_path, Some("1/receipt.jpg".to_string()));
        assert_eq!(updated.created_at, expense.created_at);
    }

    #[test]
    fn test_update_expense_not_found() {
        let conn = create_test_db();

        // 存在しない経費の更新テスト
        let result = update_expense(
            &conn,
            999,
            ExpenseUpdate {
                merchant: Some("Store".to_string()),
                ..Default::default()
            },
        );
        assert!(matches!(result.unwrap_err(), AppError::NotFound(_)));
    }

    #[test]
    fn test_expenses_ordered_by_date_ascending() {
        let conn = create_test_db();
        let report = create_report(&conn, "並び順テスト").unwrap();

        let mut late = sample_expense(None);
        late.date = "2024-05-20".to_string();
        let mut early = sample_expense(None);
        early.date = "2024-05-03".to_string();

        save_expense(&conn, late, report.id).unwrap();
        save_expense(&conn, early, report.id).unwrap();

        // 日付の昇順で返される
        let expenses = find_expenses_by_report(&conn, report.id).unwrap();
        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[0].date, "2024-05-03");
        assert_eq!(expenses[1].date, "2024-05-20");
    }

    #[test]
    fn test_report_delete_cascades_to_expenses() {
        let conn = create_test_db();
        let report = create_report(&conn, "カスケードテスト").unwrap();
        let expense = save_expense(&conn, sample_expense(None), report.id).unwrap();

        delete_report(&conn, report.id).unwrap();

        // 所有していた経費も削除される
        assert!(find_expense_by_id(&conn, expense.id).is_err());
    }

    #[test]
    fn test_count_and_update_report_count() {
        let conn = create_test_db();
        let report = create_report(&conn, "カウントテスト").unwrap();

        assert_eq!(count_expenses(&conn, report.id).unwrap(), 0);

        save_expense(&conn, sample_expense(None), report.id).unwrap();
        save_expense(&conn, sample_expense(None), report.id).unwrap();
        assert_eq!(count_expenses(&conn, report.id).unwrap(), 2);

        // カウンタ更新のテスト
        update_report_count(&conn, report.id, 2).unwrap();
        let updated = find_report_by_id(&conn, report.id).unwrap();
        assert_eq!(updated.total_expenses, 2);
    }

    #[test]
    fn test_list_reports_most_recent_first() {
        let conn = create_test_db();

        // created_atを明示的に分けて挿入する
        conn.execute(
            "INSERT INTO expense_reports (name, created_at, total_expenses)
             VALUES ('古いレポート', '2024-01-01T00:00:00+09:00', 0)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO expense_reports (name, created_at, total_expenses)
             VALUES ('新しいレポート', '2024-06-01T00:00:00+09:00', 0)",
            [],
        )
        .unwrap();

        let reports = list_reports(&conn, 50).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].name, "新しいレポート");

        // limitのテスト
        let limited = list_reports(&conn, 1).unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_not_found_errors() {
        let conn = create_test_db();

        // 存在しないレポートの取得テスト
        let result = find_report_by_id(&conn, 999);
        assert!(matches!(result.unwrap_err(), AppError::NotFound(_)));

        // 存在しない経費の削除テスト
        let result = delete_expense(&conn, 999);
        assert!(matches!(result.unwrap_err(), AppError::NotFound(_)));

        // 存在しないレポートのカウンタ更新テスト
        let result = update_report_count(&conn, 999, 1);
        assert!(matches!(result.unwrap_err(), AppError::NotFound(_)));
    }
}
