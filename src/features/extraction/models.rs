// 経費データ抽出機能のデータモデル

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// 経費データ抽出時のエラー
///
/// Vision APIの応答は信頼できない自由形式テキストであるため、
/// 失敗の種類を呼び出し側が網羅的に処理できるよう分類する。
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// 応答がJSONオブジェクトとして解析できない
    #[error("応答の解析に失敗しました: {0}")]
    MalformedResponse(String),

    /// 金額フィールドが数値として解釈できない
    #[error("金額の解析に失敗しました: {0}")]
    InvalidAmount(String),

    /// 必須フィールドが欠落している
    #[error("必須フィールドがありません: {0}")]
    MissingField(&'static str),

    /// Vision APIへの接続・通信に失敗した（このコンポーネントではリトライしない）
    #[error("Vision APIに接続できません: {0}")]
    UpstreamUnavailable(String),
}

/// 経費カテゴリ（SAP Concurの固定セット）
///
/// 閉じた集合であり、未知のカテゴリはOtherに集約される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpenseCategory {
    Meals,
    Transportation,
    OfficeSupplies,
    Entertainment,
    Lodging,
    #[default]
    Other,
}

impl ExpenseCategory {
    /// すべてのカテゴリ
    pub const ALL: [ExpenseCategory; 6] = [
        ExpenseCategory::Meals,
        ExpenseCategory::Transportation,
        ExpenseCategory::OfficeSupplies,
        ExpenseCategory::Entertainment,
        ExpenseCategory::Lodging,
        ExpenseCategory::Other,
    ];

    /// カテゴリの表記ラベルを取得する
    ///
    /// # 戻り値
    /// SAP Concur互換のカテゴリ名
    pub fn label(&self) -> &'static str {
        match self {
            ExpenseCategory::Meals => "Meals",
            ExpenseCategory::Transportation => "Transportation",
            ExpenseCategory::OfficeSupplies => "Office Supplies",
            ExpenseCategory::Entertainment => "Entertainment",
            ExpenseCategory::Lodging => "Lodging",
            ExpenseCategory::Other => "Other",
        }
    }

    /// ラベル文字列からカテゴリを取得する
    ///
    /// # 引数
    /// * `label` - カテゴリ名
    ///
    /// # 戻り値
    /// 対応するカテゴリ。未知のラベルはOther
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Meals" => ExpenseCategory::Meals,
            "Transportation" => ExpenseCategory::Transportation,
            "Office Supplies" => ExpenseCategory::OfficeSupplies,
            "Entertainment" => ExpenseCategory::Entertainment,
            "Lodging" => ExpenseCategory::Lodging,
            _ => ExpenseCategory::Other,
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for ExpenseCategory {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for ExpenseCategory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // 未知のカテゴリ名はOtherに集約する
        let label = String::deserialize(deserializer)?;
        Ok(ExpenseCategory::from_label(&label))
    }
}

/// Vision APIの応答から生成された経費データ候補
///
/// 応答1件につき1度だけ構築され、即座に永続化されるか破棄される。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedExpense {
    /// 日付（YYYY-MM-DD形式の文字列）
    pub date: String,
    /// 店舗・支払先名
    pub merchant: String,
    /// 経費の説明
    #[serde(default)]
    pub description: Option<String>,
    /// 金額（小数点以下2桁、非負）
    pub amount: f64,
    /// 通貨コード（ISO形式の3文字）
    #[serde(default = "default_currency")]
    pub currency: String,
    /// 経費カテゴリ
    #[serde(default)]
    pub category: ExpenseCategory,
    /// 支払い方法
    #[serde(default = "default_payment_type")]
    pub payment_type: String,
    /// 都市名
    #[serde(default)]
    pub city: Option<String>,
    /// 購入品目の概要
    #[serde(default)]
    pub items: Option<String>,
}

/// デフォルト通貨コード
fn default_currency() -> String {
    "USD".to_string()
}

/// デフォルト支払い方法
fn default_payment_type() -> String {
    "Credit Card".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_labels() {
        // カテゴリラベルのテスト
        assert_eq!(ExpenseCategory::Meals.label(), "Meals");
        assert_eq!(ExpenseCategory::OfficeSupplies.label(), "Office Supplies");
        assert_eq!(ExpenseCategory::Other.label(), "Other");
    }

    #[test]
    fn test_category_from_label_round_trip() {
        // ラベルとの相互変換テスト
        for category in ExpenseCategory::ALL {
            assert_eq!(ExpenseCategory::from_label(category.label()), category);
        }
    }

    #[test]
    fn test_unknown_category_collapses_to_other() {
        // 未知のカテゴリはOtherに集約される
        assert_eq!(
            ExpenseCategory::from_label("Groceries"),
            ExpenseCategory::Other
        );
        assert_eq!(ExpenseCategory::from_label(""), ExpenseCategory::Other);
        assert_eq!(
            ExpenseCategory::from_label("meals"),
            ExpenseCategory::Other
        );
    }

    #[test]
    fn test_category_deserialization() {
        // カテゴリのデシリアライゼーションテスト
        let category: ExpenseCategory = serde_json::from_str("\"Transportation\"").unwrap();
        assert_eq!(category, ExpenseCategory::Transportation);

        // 未知のカテゴリ名もエラーにならずOtherになる
        let category: ExpenseCategory = serde_json::from_str("\"Groceries\"").unwrap();
        assert_eq!(category, ExpenseCategory::Other);
    }

    #[test]
    fn test_extracted_expense_defaults() {
        // 任意フィールド省略時のデフォルト値テスト
        let json = r#"{"date": "2024-05-01", "merchant": "Cafe Tokyo", "amount": 31.39}"#;
        let extracted: ExtractedExpense = serde_json::from_str(json).unwrap();

        assert_eq!(extracted.amount, 31.39);
        assert_eq!(extracted.currency, "USD");
        assert_eq!(extracted.category, ExpenseCategory::Other);
        assert_eq!(extracted.payment_type, "Credit Card");
        assert_eq!(extracted.description, None);
        assert_eq!(extracted.city, None);
        assert_eq!(extracted.items, None);
    }

    #[test]
    fn test_extracted_expense_ignores_unknown_fields() {
        // 余分なフィールドは無視される
        let json = r#"{"date": "2024-05-01", "merchant": "Cafe", "amount": 10.0, "note": "extra"}"#;
        let extracted: ExtractedExpense = serde_json::from_str(json).unwrap();
        assert_eq!(extracted.merchant, "Cafe");
    }

    #[test]
    fn test_extraction_error_messages() {
        // エラーメッセージのテスト
        let error = ExtractionError::MissingField("merchant");
        assert!(error.to_string().contains("merchant"));

        let error = ExtractionError::InvalidAmount("N/A".to_string());
        assert!(error.to_string().contains("N/A"));
    }
}
