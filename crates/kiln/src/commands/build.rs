use anyhow::Context;
use kiln_build::{BuildError, BuildRequest, ImageBuilder, ProgressMode};
use kiln_config::KilnConfig;
use std::io::Read;
use std::path::PathBuf;

pub struct BuildArgs {
    pub context: PathBuf,
    pub file: String,
    pub tag: String,
    pub secrets: Vec<String>,
    pub no_cache: bool,
    pub push: bool,
    pub progress: Option<String>,
}

/// ビルドコマンドを処理
pub fn handle(config: &KilnConfig, args: BuildArgs) -> anyhow::Result<()> {
    let progress: ProgressMode = args
        .progress
        .as_deref()
        .unwrap_or(&config.progress)
        .parse()?;

    // Dockerfile の読み込みエラーより先にコンテキストの不在を報告する
    if !args.context.is_dir() {
        return Err(BuildError::ContextNotFound(args.context).into());
    }

    let dockerfile = read_dockerfile(&args.context, &args.file)?;

    tracing::info!("🔨 ビルド中: {}", args.tag);

    let request = BuildRequest {
        secrets: args.secrets,
        no_cache: args.no_cache,
        push: args.push,
        progress,
        ..BuildRequest::new(args.context, dockerfile, args.tag.clone())
    };

    ImageBuilder::with_program(&config.docker).build(&request)?;

    tracing::info!("✓ ビルド完了: {}", args.tag);
    Ok(())
}

/// Dockerfile 本文を読み込む（`-` なら標準入力、相対パスはコンテキスト基準）
fn read_dockerfile(context: &std::path::Path, file: &str) -> anyhow::Result<String> {
    if file == "-" {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("標準入力から Dockerfile を読み込めませんでした")?;
        return Ok(content);
    }

    let path = context.join(file);
    std::fs::read_to_string(&path)
        .with_context(|| format!("Dockerfile を読み込めませんでした: {}", path.display()))
}
