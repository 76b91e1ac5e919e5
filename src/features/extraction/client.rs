// Vision APIを使った経費データ抽出クライアント

use super::media;
use super::models::{ExtractedExpense, ExtractionError};
use crate::shared::config::environment::VisionConfig;
use crate::shared::errors::{AppError, AppResult};
use async_trait::async_trait;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

/// 領収書から経費データを抽出するための指示プロンプト
///
/// モデルには9つの固定フィールドを持つJSONオブジェクトのみを
/// 返すよう要求する。
const EXTRACTION_PROMPT: &str = r#"Analyze this receipt and extract the following information in JSON format:
{
  "date": "YYYY-MM-DD format",
  "merchant": "Merchant/Vendor name",
  "description": "Brief description of the expense",
  "amount": "Total amount as decimal number only",
  "currency": "Currency code (USD, EUR, etc.)",
  "category": "Expense category (Meals, Transportation, Office Supplies, Entertainment, Lodging, Other)",
  "payment_type": "Credit Card",
  "city": "City if available",
  "items": "Brief list of items purchased"
}

Please extract the exact values from the receipt. For the category, choose the most appropriate one based on what was purchased. Return ONLY the JSON object, no other text."#;

/// 金額文字列から通貨記号・桁区切りを取り除くための正規表現
static AMOUNT_STRIP_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9.\-]").expect("不正な正規表現"));

/// 領収書画像から経費データを抽出するインターフェース
///
/// 本番実装はVisionClient。テストでは代替実装に差し替えられる。
#[async_trait]
pub trait ExpenseExtractor: Send + Sync {
    /// 領収書画像から経費データを抽出する
    ///
    /// # 引数
    /// * `bytes` - 画像ファイルの生バイト列
    /// * `filename` - 元のファイル名
    ///
    /// # 戻り値
    /// 抽出された経費データ候補、または失敗時は抽出エラー
    async fn extract(
        &self,
        bytes: &[u8],
        filename: &str,
    ) -> Result<ExtractedExpense, ExtractionError>;
}

/// Vision APIクライアント（経費データ抽出用）
///
/// 外部モデルへの送信と、信頼できない応答テキストの解析を担う。
/// 永続ストレージには一切触れない。
#[derive(Clone)]
pub struct VisionClient {
    http_client: reqwest::Client,
    config: VisionConfig,
}

impl VisionClient {
    /// Vision APIクライアントを初期化する
    ///
    /// # 引数
    /// * `config` - Vision API設定
    ///
    /// # 戻り値
    /// クライアント、または設定が不正な場合はエラー
    pub fn new(config: VisionConfig) -> AppResult<Self> {
        config
            .validate()
            .map_err(|e| AppError::configuration(format!("Vision API設定の検証に失敗: {e}")))?;

        let http_client = reqwest::Client::new();

        info!(
            "Vision APIクライアントを初期化しました: model={}",
            config.model
        );

        Ok(Self {
            http_client,
            config,
        })
    }
}

#[async_trait]
impl ExpenseExtractor for VisionClient {
    async fn extract(
        &self,
        bytes: &[u8],
        filename: &str,
    ) -> Result<ExtractedExpense, ExtractionError> {
        let (image_data, media_type) = media::encode(bytes, filename);

        debug!(
            "経費データ抽出リクエストを送信: filename={filename}, media_type={media_type}, size={} bytes",
            bytes.len()
        );

        let body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": 1024,
            "messages": [
                {
                    "role": "user",
                    "content": [
                        {
                            "type": "image",
                            "source": {
                                "type": "base64",
                                "media_type": media_type,
                                "data": image_data
                            }
                        },
                        {
                            "type": "text",
                            "text": EXTRACTION_PROMPT
                        }
                    ]
                }
            ]
        });

        // 通信エラー・非2xxはUpstreamUnavailable。リトライは呼び出し側の責務
        let response = self
            .http_client
            .post(format!("{}/v1/messages", self.config.api_base))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(|e| ExtractionError::UpstreamUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Vision APIがエラーを返しました: filename={filename}, status={status}");
            return Err(ExtractionError::UpstreamUnavailable(format!(
                "HTTP {status}"
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ExtractionError::UpstreamUnavailable(e.to_string()))?;

        let text = payload
            .get("content")
            .and_then(|content| content.get(0))
            .and_then(|block| block.get("text"))
            .and_then(|text| text.as_str())
            .ok_or_else(|| {
                ExtractionError::MalformedResponse(
                    "応答にテキストブロックが含まれていません".to_string(),
                )
            })?;

        let extracted = decode_response(text)?;

        debug!(
            "経費データを抽出しました: filename={filename}, merchant={}, amount={}",
            extracted.merchant, extracted.amount
        );

        Ok(extracted)
    }
}

/// モデルの応答テキストを経費データ候補に解読する
///
/// # 引数
/// * `text` - モデルが返した自由形式テキスト
///
/// # 戻り値
/// 経費データ候補、または失敗時は抽出エラー
///
/// # 処理内容
/// 1. 前後の空白を除去
/// 2. コードフェンス（```json ... ```）を除去
/// 3. JSONオブジェクトとして解析
/// 4. 金額が文字列の場合は通貨記号・桁区切りを除去して数値化
/// 5. フィールドセットを検証（必須: date, merchant, amount）
pub fn decode_response(text: &str) -> Result<ExtractedExpense, ExtractionError> {
    let body = strip_code_fence(text.trim());

    let mut value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| ExtractionError::MalformedResponse(e.to_string()))?;

    let object = value.as_object_mut().ok_or_else(|| {
        ExtractionError::MalformedResponse("JSONオブジェクトではありません".to_string())
    })?;

    // 必須フィールドの存在チェック
    for field in ["date", "merchant", "amount"] {
        match object.get(field) {
            None | Some(serde_json::Value::Null) => {
                return Err(ExtractionError::MissingField(field))
            }
            Some(_) => {}
        }
    }

    // 金額を正規化（通貨記号付き文字列を許容する）
    let amount = match object.get("amount") {
        Some(serde_json::Value::String(raw)) => normalize_amount(raw)?,
        Some(serde_json::Value::Number(number)) => number
            .as_f64()
            .ok_or_else(|| ExtractionError::InvalidAmount(number.to_string()))?,
        Some(other) => return Err(ExtractionError::InvalidAmount(other.to_string())),
        None => unreachable!("必須フィールドチェック済み"),
    };

    if !amount.is_finite() || amount < 0.0 {
        return Err(ExtractionError::InvalidAmount(amount.to_string()));
    }

    let rounded = round_to_two_places(amount);
    let number = serde_json::Number::from_f64(rounded)
        .ok_or_else(|| ExtractionError::InvalidAmount(rounded.to_string()))?;
    object.insert("amount".to_string(), serde_json::Value::Number(number));

    // null値を除去し、任意フィールドにデフォルト値を適用させる
    object.retain(|_, field_value| !field_value.is_null());

    let extracted: ExtractedExpense = serde_json::from_value(value)
        .map_err(|e| ExtractionError::MalformedResponse(e.to_string()))?;

    if extracted.merchant.trim().is_empty() {
        return Err(ExtractionError::MissingField("merchant"));
    }

    Ok(extracted)
}

/// コードフェンスを除去する
///
/// # 引数
/// * `text` - トリム済みの応答テキスト
///
/// # 戻り値
/// フェンス内側のテキスト。フェンスがない場合は入力をそのまま返す
fn strip_code_fence(text: &str) -> &str {
    if !text.starts_with("```") {
        return text;
    }

    let mut inner = text.split("```").nth(1).unwrap_or(text);

    // 先頭の言語タグ（json）を除去
    if let Some(stripped) = inner.strip_prefix("json") {
        inner = stripped;
    }

    inner.trim()
}

/// 金額文字列を数値に正規化する
///
/// # 引数
/// * `raw` - 金額の文字列表現（"$1,234.50" など）
///
/// # 戻り値
/// 数値化された金額、または解析不能な場合はInvalidAmount
fn normalize_amount(raw: &str) -> Result<f64, ExtractionError> {
    let cleaned = AMOUNT_STRIP_PATTERN.replace_all(raw, "");

    cleaned
        .parse::<f64>()
        .map_err(|_| ExtractionError::InvalidAmount(raw.to_string()))
}

/// 小数点以下2桁に丸める
fn round_to_two_places(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
