use kiln_build::{AnnotationRequest, ImageBuilder};
use kiln_config::KilnConfig;

/// annotate コマンドを処理
pub fn handle(
    config: &KilnConfig,
    tag: String,
    labels: Vec<(String, String)>,
    schema: String,
    output: String,
    push: bool,
) -> anyhow::Result<()> {
    tracing::info!(
        "🏷  ラベルとスキーマを追加中: {} ({} labels)",
        tag,
        labels.len()
    );

    let request = AnnotationRequest {
        labels: labels.into_iter().collect(),
        push,
        ..AnnotationRequest::new(tag.clone(), schema, output)
    };

    ImageBuilder::with_program(&config.docker).add_labels_and_schema(&request)?;

    tracing::info!("✓ 完了: {}", tag);
    Ok(())
}
