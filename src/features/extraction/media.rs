// 画像ペイロードのエンコード処理

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// 画像バイト列をVision APIに渡せる形式にエンコードする
///
/// # 引数
/// * `bytes` - 画像ファイルの生バイト列
/// * `filename` - 元のファイル名（メディアタイプの判定にのみ使用）
///
/// # 戻り値
/// (Base64エンコード済みデータ, メディアタイプ)のタプル
///
/// この関数は失敗しない。空の入力は空のペイロードになる。
pub fn encode(bytes: &[u8], filename: &str) -> (String, &'static str) {
    let encoded = STANDARD.encode(bytes);
    let media_type = media_type_for(filename);

    (encoded, media_type)
}

/// ファイル名の拡張子からメディアタイプを推定する
///
/// # 引数
/// * `filename` - ファイル名
///
/// # 戻り値
/// メディアタイプ。拡張子が未知または欠落している場合はimage/jpeg
///
/// 拡張子による推定であり、内容の検査は行わない。誤った拡張子の
/// ファイルは誤ったメディアタイプのまま送信される。
pub fn media_type_for(filename: &str) -> &'static str {
    let extension = std::path::Path::new(filename)
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        _ => "image/jpeg",
    }
}
