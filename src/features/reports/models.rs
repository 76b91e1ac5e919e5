// 経費レポート機能のデータモデル

use crate::features::extraction::ExtractedExpense;
use serde::{Deserialize, Serialize};

/// 経費レポート（集約ルート）
///
/// total_expensesは非正規化されたカウンタであり、バッチ処理の完了後に
/// 実際の経費件数から再計算される。
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExpenseReport {
    pub id: i64,
    pub name: String,
    pub created_at: String, // RFC3339形式、JST
    pub total_expenses: i64,
}

/// 永続化された経費レコード
///
/// receipt_pathが設定されている経費は、ファイルストアに対応する
/// オブジェクトが存在していなければならない。
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Expense {
    pub id: i64,
    pub report_id: i64,
    pub date: String, // YYYY-MM-DD形式
    pub merchant: String,
    pub description: Option<String>,
    pub amount: f64,
    pub currency: String,
    pub category: String,
    pub payment_type: String,
    pub city: Option<String>,
    pub items: Option<String>,
    pub receipt_path: Option<String>,
    pub created_at: String, // RFC3339形式、JST
}

/// 経費作成用DTO
#[derive(Debug, Clone, Deserialize)]
pub struct NewExpense {
    pub date: String,
    pub merchant: String,
    pub description: Option<String>,
    pub amount: f64,
    pub currency: String,
    pub category: String,
    pub payment_type: String,
    pub city: Option<String>,
    pub items: Option<String>,
    pub receipt_path: Option<String>,
}

/// 経費更新用DTO
///
/// 更新可能なフィールドのみを持つ。id・report_id・created_at・
/// receipt_pathは更新対象外であり、このDTOからは変更できない。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseUpdate {
    pub date: Option<String>,
    pub merchant: Option<String>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub category: Option<String>,
    pub payment_type: Option<String>,
    pub city: Option<String>,
    pub items: Option<String>,
}

impl NewExpense {
    /// 抽出済み経費データから作成用DTOを組み立てる
    ///
    /// # 引数
    /// * `extracted` - Vision APIから抽出された経費データ候補
    /// * `receipt_path` - アップロード済み領収書のストレージパス
    ///
    /// # 戻り値
    /// 経費作成用DTO
    pub fn from_extracted(extracted: ExtractedExpense, receipt_path: Option<String>) -> Self {
        Self {
            date: extracted.date,
            merchant: extracted.merchant,
            description: extracted.description,
            amount: extracted.amount,
            currency: extracted.currency,
            category: extracted.category.label().to_string(),
            payment_type: extracted.payment_type,
            city: extracted.city,
            items: extracted.items,
            receipt_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::extraction::ExpenseCategory;

    #[test]
    fn test_new_expense_from_extracted() {
        // 抽出データからDTOへの変換テスト
        let extracted = ExtractedExpense {
            date: "2024-05-01".to_string(),
            merchant: "Cafe Tokyo".to_string(),
            description: Some("チームランチ".to_string()),
            amount: 31.39,
            currency: "USD".to_string(),
            category: ExpenseCategory::Meals,
            payment_type: "Credit Card".to_string(),
            city: Some("Tokyo".to_string()),
            items: Some("Pasta, Coffee".to_string()),
        };

        let new_expense =
            NewExpense::from_extracted(extracted, Some("42/receipt.jpg".to_string()));

        assert_eq!(new_expense.date, "2024-05-01");
        assert_eq!(new_expense.merchant, "Cafe Tokyo");
        assert_eq!(new_expense.amount, 31.39);
        assert_eq!(new_expense.category, "Meals");
        assert_eq!(new_expense.receipt_path, Some("42/receipt.jpg".to_string()));
    }

    #[test]
    fn test_expense_serialization() {
        // 経費モデルのシリアライゼーションテスト
        let expense = Expense {
            id: 1,
            report_id: 42,
            date: "2024-05-01".to_string(),
            merchant: "Cafe Tokyo".to_string(),
            description: None,
            amount: 31.39,
            currency: "USD".to_string(),
            category: "Meals".to_string(),
            payment_type: "Credit Card".to_string(),
            city: None,
            items: None,
            receipt_path: Some("42/receipt.jpg".to_string()),
            created_at: "2024-05-01T12:00:00+09:00".to_string(),
        };

        let json = serde_json::to_string(&expense).unwrap();
        assert!(json.contains("Cafe Tokyo"));

        let deserialized: Expense = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.id, expense.id);
        assert_eq!(deserialized.amount, expense.amount);
        assert_eq!(deserialized.receipt_path, expense.receipt_path);
    }

    #[test]
    fn test_report_serialization() {
        // レポートモデルのシリアライゼーションテスト
        let report = ExpenseReport {
            id: 42,
            name: "2024年5月 出張".to_string(),
            created_at: "2024-05-01T12:00:00+09:00".to_string(),
            total_expenses: 3,
        };

        let json = serde_json::to_string(&report).unwrap();
        let deserialized: ExpenseReport = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.total_expenses, 3);
        assert_eq!(deserialized.name, report.name);
    }
}
