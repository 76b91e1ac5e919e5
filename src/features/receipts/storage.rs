// 領収書ファイルのR2ストレージクライアント

use crate::shared::config::environment::R2Config;
use crate::shared::errors::{AppError, AppResult};
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::{Credentials, SharedCredentialsProvider};
use aws_sdk_s3::{Client, Config};
use log::{debug, error, info};

/// R2クライアント（領収書ファイルの保管用）
#[derive(Clone)]
pub struct R2Client {
    client: Client,
    bucket_name: String,
}

impl R2Client {
    /// R2クライアントを初期化する
    ///
    /// # 引数
    /// * `config` - R2設定
    ///
    /// # 戻り値
    /// クライアント、または設定が不正な場合はエラー
    pub async fn new(config: R2Config) -> AppResult<Self> {
        info!("R2クライアントを初期化しています...");

        // 設定を検証
        config.validate().map_err(|e| {
            error!("R2設定の検証に失敗しました: {e}");
            AppError::configuration(format!("R2設定の検証に失敗しました: {e}"))
        })?;

        // 認証情報を設定（ログには出力しない）
        debug!("認証情報を設定中...");
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "r2",
        );

        // S3互換設定を構築
        debug!("AWS設定を構築中... エンドポイント: {}", config.endpoint_url);
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .endpoint_url(config.endpoint_url.clone())
            .region(Region::new(config.region.clone()))
            .credentials_provider(SharedCredentialsProvider::new(credentials))
            .load()
            .await;

        let s3_config = Config::from(&aws_config);
        let client = Client::from_conf(s3_config);

        let bucket_name = config.bucket_name.clone();

        info!("R2クライアントの初期化が完了しました。バケット: {bucket_name}");

        Ok(Self {
            client,
            bucket_name,
        })
    }

    /// ファイルをR2にアップロードする
    ///
    /// # 引数
    /// * `key` - ストレージキー
    /// * `file_data` - ファイルの生バイト列
    /// * `content_type` - Content-Type
    ///
    /// # 戻り値
    /// ストレージキー、または失敗時はエラー
    pub async fn upload_file(
        &self,
        key: &str,
        file_data: Vec<u8>,
        content_type: &str,
    ) -> AppResult<String> {
        let file_size = file_data.len();
        info!(
            "ファイルアップロード開始: key={key}, size={file_size} bytes, content_type={content_type}"
        );

        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .body(file_data.into())
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                error!(
                    "ファイルアップロード失敗: key={}, bucket={}, error={}",
                    key, self.bucket_name, e
                );
                AppError::r2(format!("R2アップロードに失敗しました: {e}"))
            })?;

        info!("ファイルアップロード成功: key={key}");

        Ok(key.to_string())
    }

    /// ファイルをR2から削除する
    ///
    /// # 引数
    /// * `key` - ストレージキー
    ///
    /// # 戻り値
    /// 成功時はOk(())、失敗時はエラー
    pub async fn delete_file(&self, key: &str) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::r2(format!("R2削除エラー: {e}")))?;

        debug!("ファイルを削除しました: key={key}");

        Ok(())
    }

    /// 接続テストを行う（バケットの存在確認）
    ///
    /// # 戻り値
    /// 成功時はOk(())、失敗時はエラー
    pub async fn test_connection(&self) -> AppResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
            .map_err(|e| {
                error!(
                    "R2接続テスト失敗: bucket={}, error={}",
                    self.bucket_name, e
                );
                AppError::r2(format!("R2接続テストに失敗しました: {e}"))
            })?;

        info!("R2接続テスト成功: bucket={}", self.bucket_name);

        Ok(())
    }

    /// 領収書のストレージキーを生成する
    ///
    /// # 引数
    /// * `report_id` - 所有するレポートのID
    /// * `filename` - 元のファイル名
    ///
    /// # 戻り値
    /// `{report_id}/{filename}` 形式のストレージキー
    pub fn receipt_key(report_id: i64, filename: &str) -> String {
        format!("{report_id}/{filename}")
    }

    /// ストレージ保存用のContent-Typeを推定する
    ///
    /// # 引数
    /// * `filename` - ファイル名
    ///
    /// # 戻り値
    /// Content-Type
    pub fn content_type_for(filename: &str) -> &'static str {
        let extension = std::path::Path::new(filename)
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "bmp" => "image/bmp",
            "pdf" => "application/pdf",
            _ => "application/octet-stream",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_key_format() {
        // ストレージキーの形式テスト
        assert_eq!(R2Client::receipt_key(42, "receipt.jpg"), "42/receipt.jpg");
        assert_eq!(R2Client::receipt_key(1, "領収書.png"), "1/領収書.png");
    }

    #[test]
    fn test_content_type_detection() {
        assert_eq!(R2Client::content_type_for("test.pdf"), "application/pdf");
        assert_eq!(R2Client::content_type_for("test.png"), "image/png");
        assert_eq!(R2Client::content_type_for("test.jpg"), "image/jpeg");
        assert_eq!(R2Client::content_type_for("test.jpeg"), "image/jpeg");
        assert_eq!(R2Client::content_type_for("test.gif"), "image/gif");
        assert_eq!(
            R2Client::content_type_for("test.unknown"),
            "application/octet-stream"
        );
    }
}
