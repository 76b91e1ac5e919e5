//! 経費精算パイプライン
//!
//! レシート画像から経費情報を抽出し、レポート単位で管理・精算するための
//! ライブラリ。Vision APIによる抽出、R2ストレージへの領収書保存、
//! SQLiteでの永続化、精算用CSVの生成を提供する。

pub mod features;
pub mod shared;

use std::sync::{Arc, Mutex};

use log::info;

use features::extraction::client::VisionClient;
use features::receipts::processor::ReceiptProcessor;
use features::receipts::storage::R2Client;
use features::reports::store::R2SqliteStore;
use shared::config::environment::{
    initialize_logging_system, load_environment_variables, R2Config, VisionConfig,
};
use shared::errors::{AppError, AppResult};

/// 環境変数と設定からレシート処理パイプライン一式を組み立てる
///
/// # 戻り値
/// 設定済みの`ReceiptProcessor`
///
/// ログ初期化・環境変数読み込み・DB初期化・R2接続・Vision API設定を
/// まとめて行う。個別に構成したい場合は各モジュールを直接使用する。
pub async fn build_processor() -> AppResult<ReceiptProcessor> {
    initialize_logging_system();
    load_environment_variables();

    info!("パイプラインの初期化を開始します...");

    let conn = shared::database::initialize_database()?;

    let r2_config = R2Config::from_env()
        .ok_or_else(|| AppError::configuration("R2の設定が見つかりません"))?;
    let r2_client = R2Client::new(r2_config).await?;

    let vision_config = VisionConfig::from_env()
        .ok_or_else(|| AppError::configuration("Vision APIの設定が見つかりません"))?;
    let vision_client = VisionClient::new(vision_config)?;

    let store = R2SqliteStore::new(Arc::new(Mutex::new(conn)), r2_client);

    info!("パイプラインの初期化が完了しました");

    Ok(ReceiptProcessor::new(
        Arc::new(store),
        Arc::new(vision_client),
    ))
}
