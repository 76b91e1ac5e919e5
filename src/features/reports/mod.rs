//! 経費レポート機能
//!
//! レポートと経費のCRUD、永続化ストア、精算用CSV出力を提供する

pub mod models;
pub mod renderer;
pub mod repository;
pub mod store;

pub use models::{Expense, ExpenseReport, ExpenseUpdate, NewExpense};
pub use renderer::{generate_summary, render_csv, ReportSummary, SummaryBucket};
pub use store::{ExpenseStore, R2SqliteStore};
