//! ビルド済みイメージの後処理
//!
//! 既存イメージを `FROM` にした Dockerfile をその場で生成し、
//! ラベル付与・OpenAPI スキーマの同梱・スキーマからの Python モデル生成を行う。
//! 生成ツールは使い捨ての venv に入れ、同じ `RUN` の中で削除する
//! （別レイヤーにするとイメージに残るため）。

use crate::builder::ImageBuilder;
use crate::error::{BuildError, Result};
use crate::invocation::Invocation;
use crate::platform::HostPlatform;
use crate::runner::CommandRunner;
use std::collections::HashMap;

/// 生成ツール用 venv の場所
const TOOLS_VENV: &str = "/tmp/venv/tools";

/// 生成ツールのバージョン制約
const CODEGEN_REQUIREMENT: &str = "datamodel-code-generator>=0.25";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRequest {
    /// 対象イメージ。同じタグで上書きされる
    pub image_tag: String,
    pub labels: HashMap<String, String>,
    /// イメージに同梱するスキーマファイル（ビルドコンテキストからの相対パス）
    pub schema_file: String,
    /// 生成物を置くイメージ内のパス
    pub generated_path: String,
    pub push: bool,
}

impl AnnotationRequest {
    pub fn new(
        image_tag: impl Into<String>,
        schema_file: impl Into<String>,
        generated_path: impl Into<String>,
    ) -> Self {
        Self {
            image_tag: image_tag.into(),
            labels: HashMap::new(),
            schema_file: schema_file.into(),
            generated_path: generated_path.into(),
            push: false,
        }
    }

    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}

/// 後処理用の Dockerfile を生成
pub fn annotation_dockerfile(image_tag: &str, schema_file: &str, generated_path: &str) -> String {
    let steps = [
        format!("python -m venv --symlinks {TOOLS_VENV}/"),
        format!("{TOOLS_VENV}/bin/python -m pip install '{CODEGEN_REQUIREMENT}'"),
        format!("{TOOLS_VENV}/bin/datamodel-codegen --version"),
        format!(
            "{TOOLS_VENV}/bin/datamodel-codegen --input-file-type openapi --input {} --output {}",
            schema_file, generated_path
        ),
        format!("rm -rf {TOOLS_VENV}/"),
    ];

    format!(
        "FROM {}\nCOPY {} .cog\nRUN {}",
        image_tag,
        schema_file,
        steps.join(" && ")
    )
}

/// `buildx build` 以降の引数を組み立てる
///
/// ラベル値はクォートしない（docker は最初の `=` でだけ分割する）。
/// ラベルの順序は HashMap の反復順に従う。
pub fn annotate_args(request: &AnnotationRequest, host: &HostPlatform) -> Vec<String> {
    let mut args: Vec<String> = vec!["buildx".into(), "build".into()];

    if request.push {
        args.push("--push".into());
    }

    host.push_compat_args(&mut args);

    args.extend([
        "--file".to_string(),
        "-".to_string(),
        "--tag".to_string(),
        request.image_tag.clone(),
    ]);

    for (key, value) in &request.labels {
        args.push("--label".into());
        args.push(format!("{}={}", key, value));
    }

    // コンテキストの中身は使わないが docker が要求する
    args.push(".".into());
    args
}

impl<R: CommandRunner> ImageBuilder<R> {
    /// ラベルとスキーマをイメージに追加する
    ///
    /// 出力は捕捉し、失敗したときだけ info として表示する。
    pub fn add_labels_and_schema(&self, request: &AnnotationRequest) -> Result<()> {
        let invocation = Invocation::new(
            self.program(),
            annotate_args(request, self.host()),
            annotation_dockerfile(
                &request.image_tag,
                &request.schema_file,
                &request.generated_path,
            ),
        );

        invocation.trace();
        let result = self.runner().run_combined(&invocation)?;

        if !result.success() {
            if !result.output.is_empty() {
                tracing::info!("{}", result.output_lossy());
            }
            return Err(BuildError::ExitStatus {
                program: invocation.program,
                code: result.code,
            });
        }

        tracing::debug!("Added labels and schema to {}", request.image_tag);
        Ok(())
    }
}
