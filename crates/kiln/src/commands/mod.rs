pub mod annotate;
pub mod build;

/// `KEY=VALUE` を最初の `=` で分割
pub fn parse_label(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("ラベルは KEY=VALUE 形式で指定してください: {}", s)),
    }
}
