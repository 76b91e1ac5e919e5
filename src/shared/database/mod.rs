use crate::shared::config::{get_database_filename, get_environment};
use crate::shared::errors::{AppError, AppResult};
use rusqlite::Connection;
use std::path::PathBuf;

/// データベース接続を初期化し、テーブルを作成する
///
/// # 戻り値
/// データベース接続、または失敗時はエラー
///
/// # 処理内容
/// 1. アプリケーションデータディレクトリの確保
/// 2. データベースファイルパスの決定
/// 3. データベース接続の開設
/// 4. テーブルとインデックスの作成
pub fn initialize_database() -> AppResult<Connection> {
    // データベースファイルパスを取得
    let database_path = get_database_path()?;

    let conn = open_connection(&database_path)?;

    // テーブルを作成
    create_tables(&conn)?;

    log::info!("データベースを初期化しました: {:?}", database_path);

    Ok(conn)
}

/// 指定されたパスでデータベース接続を開く
///
/// # 引数
/// * `path` - データベースファイルのパス
///
/// # 戻り値
/// データベース接続、または失敗時はエラー
pub fn open_connection(path: &PathBuf) -> AppResult<Connection> {
    let conn = Connection::open(path)?;

    // 外部キー制約を有効化（レポート削除時のカスケードに必要）
    conn.execute_batch("PRAGMA foreign_keys = ON")?;

    Ok(conn)
}

/// アプリデータディレクトリ内のデータベースファイルパスを取得する
///
/// # 戻り値
/// データベースファイルのパス、または失敗時はエラー
pub fn get_database_path() -> AppResult<PathBuf> {
    // アプリケーションデータディレクトリを取得
    let data_dir = dirs::data_dir()
        .ok_or_else(|| AppError::configuration("アプリデータディレクトリの取得に失敗しました"))?
        .join("keihi-seisan");

    // ディレクトリが存在しない場合は作成
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir).map_err(|e| {
            AppError::configuration(format!("アプリデータディレクトリの作成に失敗: {e}"))
        })?;
        log::info!("アプリケーションデータディレクトリを作成: {:?}", data_dir);
    }

    // 環境に応じたデータベースファイル名を決定
    let db_filename = get_database_filename(get_environment());
    let database_path = data_dir.join(db_filename);

    Ok(database_path)
}

/// データベーステーブルを作成する
///
/// # 引数
/// * `conn` - データベース接続
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
pub fn create_tables(conn: &Connection) -> AppResult<()> {
    create_expense_reports_table(conn)?;
    create_expenses_table(conn)?;
    create_indexes(conn)?;

    Ok(())
}

/// 経費レポートテーブルを作成する
fn create_expense_reports_table(conn: &Connection) -> AppResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS expense_reports (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL,
            total_expenses INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    Ok(())
}

/// 経費テーブルを作成する
fn create_expenses_table(conn: &Connection) -> AppResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            report_id INTEGER NOT NULL REFERENCES expense_reports(id) ON DELETE CASCADE,
            date TEXT NOT NULL,
            merchant TEXT NOT NULL,
            description TEXT,
            amount REAL NOT NULL,
            currency TEXT NOT NULL DEFAULT 'USD',
            category TEXT NOT NULL DEFAULT 'Other',
            payment_type TEXT NOT NULL DEFAULT 'Credit Card',
            city TEXT,
            items TEXT,
            receipt_path TEXT,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

/// インデックスを作成する
fn create_indexes(conn: &Connection) -> AppResult<()> {
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_expenses_report_id ON expenses(report_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_reports_created_at
         ON expense_reports(created_at)",
        [],
    )?;

    Ok(())
}
