use std::collections::BTreeMap;

use serde::Serialize;

use crate::features::reports::models::Expense;
use crate::shared::errors::AppResult;

/// 経費精算CSVのヘッダー行
pub const CONCUR_HEADERS: [&str; 9] = [
    "Expense Date",
    "Merchant/Vendor",
    "Description",
    "Expense Type",
    "Amount",
    "Currency",
    "Payment Type",
    "City",
    "Receipt File",
];

/// 経費一覧から精算用CSVを生成する
///
/// # 引数
/// * `expenses` - 出力対象の経費一覧（日付順で渡されることを想定）
///
/// # 戻り値
/// CSVファイルの内容（UTF-8バイト列）
///
/// 末尾に合計行を追加する
pub fn render_csv(expenses: &[Expense]) -> AppResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(CONCUR_HEADERS)?;

    let mut total = 0.0;
    for expense in expenses {
        total += expense.amount;
        writer.write_record([
            expense.date.as_str(),
            expense.merchant.as_str(),
            expense.description.as_deref().unwrap_or(""),
            expense.category.as_str(),
            &format!("{:.2}", expense.amount),
            expense.currency.as_str(),
            expense.payment_type.as_str(),
            expense.city.as_deref().unwrap_or(""),
            expense.receipt_path.as_deref().unwrap_or(""),
        ])?;
    }

    writer.write_record(["", "", "", "TOTAL:", &format!("{total:.2}"), "", "", "", ""])?;

    writer
        .into_inner()
        .map_err(|e| crate::shared::errors::AppError::Io(e.into_error()))
}

/// カテゴリ・通貨ごとの件数と合計金額
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SummaryBucket {
    pub count: usize,
    pub total: f64,
}

/// レポートの経費サマリー
#[derive(Debug, Serialize)]
pub struct ReportSummary {
    pub by_category: BTreeMap<String, SummaryBucket>,
    pub by_currency: BTreeMap<String, SummaryBucket>,
    pub total_expenses: usize,
    pub currencies: Vec<String>,
}

/// 経費一覧からカテゴリ別・通貨別のサマリーを集計する
///
/// # 引数
/// * `expenses` - 集計対象の経費一覧
///
/// # 戻り値
/// カテゴリ別・通貨別の件数と合計金額、および全体の件数と通貨一覧
pub fn generate_summary(expenses: &[Expense]) -> ReportSummary {
    let mut by_category: BTreeMap<String, SummaryBucket> = BTreeMap::new();
    let mut by_currency: BTreeMap<String, SummaryBucket> = BTreeMap::new();

    for expense in expenses {
        let category = by_category
            .entry(expense.category.clone())
            .or_insert(SummaryBucket {
                count: 0,
                total: 0.0,
            });
        category.count += 1;
        category.total += expense.amount;

        let currency = by_currency
            .entry(expense.currency.clone())
            .or_insert(SummaryBucket {
                count: 0,
                total: 0.0,
            });
        currency.count += 1;
        currency.total += expense.amount;
    }

    let currencies = by_currency.keys().cloned().collect();

    ReportSummary {
        by_category,
        by_currency,
        total_expenses: expenses.len(),
        currencies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_expense(id: i64, date: &str, merchant: &str, amount: f64) -> Expense {
        Expense {
            id,
            report_id: 1,
            date: date.to_string(),
            merchant: merchant.to_string(),
            description: Some("Business meal".to_string()),
            amount,
            currency: "USD".to_string(),
            category: "Meals".to_string(),
            payment_type: "Credit Card".to_string(),
            city: Some("Seattle".to_string()),
            items: None,
            receipt_path: Some(format!("1/receipt{id}.jpg")),
            created_at: "2025-01-15T10:00:00+09:00".to_string(),
        }
    }

    #[test]
    fn test_render_csv_header_and_total() {
        let expenses = vec![
            sample_expense(1, "2025-01-10", "スターバックス", 31.39),
            sample_expense(2, "2025-01-12", "Uber", 18.5),
        ];

        let bytes = render_csv(&expenses).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Expense Date,Merchant/Vendor"));
        assert!(lines[1].contains("31.39"));
        assert!(lines[2].contains("18.50"));
        assert!(lines[3].contains("TOTAL:"));
        assert!(lines[3].contains("49.89"));
    }

    #[test]
    fn test_render_csv_empty_list() {
        let bytes = render_csv(&[]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        // ヘッダーと合計行のみ
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("TOTAL:"));
        assert!(lines[1].contains("0.00"));
    }

    #[test]
    fn test_render_csv_escapes_commas() {
        let mut expense = sample_expense(1, "2025-01-10", "Smith, Jones & Co", 10.0);
        expense.description = Some("Lunch, with client".to_string());

        let bytes = render_csv(&[expense]).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.contains("\"Smith, Jones & Co\""));
        assert!(text.contains("\"Lunch, with client\""));
    }

    #[test]
    fn test_generate_summary_groups_by_category_and_currency() {
        let mut lodging = sample_expense(3, "2025-01-14", "Hotel Plaza", 250.0);
        lodging.category = "Lodging".to_string();
        lodging.currency = "EUR".to_string();

        let expenses = vec![
            sample_expense(1, "2025-01-10", "スターバックス", 31.39),
            sample_expense(2, "2025-01-12", "Bistro", 18.61),
            lodging,
        ];

        let summary = generate_summary(&expenses);

        // カテゴリ別の集計
        assert_eq!(summary.by_category["Meals"].count, 2);
        assert_eq!(summary.by_category["Meals"].total, 50.0);
        assert_eq!(summary.by_category["Lodging"].count, 1);

        // 通貨別の集計
        assert_eq!(summary.by_currency["USD"].count, 2);
        assert_eq!(summary.by_currency["EUR"].total, 250.0);

        // 全体の件数と通貨一覧
        assert_eq!(summary.total_expenses, 3);
        assert_eq!(summary.currencies, vec!["EUR", "USD"]);
    }

    #[test]
    fn test_generate_summary_empty_list() {
        let summary = generate_summary(&[]);

        assert_eq!(summary.total_expenses, 0);
        assert!(summary.by_category.is_empty());
        assert!(summary.by_currency.is_empty());
        assert!(summary.currencies.is_empty());
    }

    #[test]
    fn test_render_csv_blank_optional_fields() {
        let mut expense = sample_expense(1, "2025-01-10", "Office Depot", 25.0);
        expense.description = None;
        expense.city = None;
        expense.receipt_path = None;

        let bytes = render_csv(&[expense]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[1], "2025-01-10,Office Depot,,Meals,25.00,USD,Credit Card,,");
    }
}
