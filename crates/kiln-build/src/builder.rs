//! メインのイメージビルド
//!
//! 呼び出し元が渡した Dockerfile 本文を stdin から `docker buildx build` に渡す。

use crate::error::{BuildError, Result};
use crate::invocation::{Invocation, ProgressMode};
use crate::platform::HostPlatform;
use crate::runner::{CommandRunner, ProcessRunner};
use std::path::PathBuf;

/// 既定のビルドツール
pub const DEFAULT_PROGRAM: &str = "docker";

/// 1 回のビルドに必要なパラメータ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// ビルドコンテキスト。プロセスの作業ディレクトリになる
    pub context_dir: PathBuf,
    /// Dockerfile の本文（ファイルパスではない）
    pub dockerfile: String,
    pub image_tag: String,
    /// `--secret` にそのまま渡す値（例: `id=npmrc,src=.npmrc`）
    pub secrets: Vec<String>,
    pub no_cache: bool,
    pub push: bool,
    pub progress: ProgressMode,
}

impl BuildRequest {
    pub fn new(
        context_dir: impl Into<PathBuf>,
        dockerfile: impl Into<String>,
        image_tag: impl Into<String>,
    ) -> Self {
        Self {
            context_dir: context_dir.into(),
            dockerfile: dockerfile.into(),
            image_tag: image_tag.into(),
            secrets: Vec::new(),
            no_cache: false,
            push: false,
            progress: ProgressMode::default(),
        }
    }
}

/// `buildx build` 以降の引数を組み立てる
///
/// コンテキストは常に `.`（作業ディレクトリ側で context_dir を指定する）。
pub fn build_args(request: &BuildRequest, host: &HostPlatform) -> Vec<String> {
    let mut args: Vec<String> = vec!["buildx".into(), "build".into()];

    host.push_compat_args(&mut args);

    for secret in &request.secrets {
        args.push("--secret".into());
        args.push(secret.clone());
    }

    if request.no_cache {
        args.push("--no-cache".into());
    }

    if request.push {
        args.push("--push".into());
    }

    args.extend([
        "--file".to_string(),
        "-".to_string(),
        "--cache-to".to_string(),
        "type=inline".to_string(),
        "--tag".to_string(),
        request.image_tag.clone(),
        "--progress".to_string(),
        request.progress.to_string(),
        ".".to_string(),
    ]);

    args
}

/// ビルドツールの呼び出しをまとめるハンドラ
pub struct ImageBuilder<R = ProcessRunner> {
    runner: R,
    host: HostPlatform,
    program: String,
}

impl ImageBuilder<ProcessRunner> {
    /// 実プロセスで `program` を起動するビルダー
    pub fn with_program(program: impl Into<String>) -> Self {
        Self::new(ProcessRunner::new(), HostPlatform::current(), program)
    }
}

impl Default for ImageBuilder<ProcessRunner> {
    fn default() -> Self {
        Self::with_program(DEFAULT_PROGRAM)
    }
}

impl<R: CommandRunner> ImageBuilder<R> {
    pub fn new(runner: R, host: HostPlatform, program: impl Into<String>) -> Self {
        Self {
            runner,
            host,
            program: program.into(),
        }
    }

    pub fn host(&self) -> &HostPlatform {
        &self.host
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub(crate) fn runner(&self) -> &R {
        &self.runner
    }

    /// イメージをビルド
    ///
    /// 出力は stderr にそのまま流れる。失敗時にリトライや後片付けはしない。
    pub fn build(&self, request: &BuildRequest) -> Result<()> {
        if !request.context_dir.is_dir() {
            return Err(BuildError::ContextNotFound(request.context_dir.clone()));
        }

        tracing::info!("Building image: {}", request.image_tag);

        let invocation = Invocation::new(
            self.program.clone(),
            build_args(request, &self.host),
            request.dockerfile.clone(),
        )
        .current_dir(&request.context_dir);

        invocation.trace();
        self.runner.run_streaming(&invocation)?;

        tracing::info!("Successfully built: {}", request.image_tag);
        Ok(())
    }
}

/// 既定の docker と現在のホストでビルドする
pub fn build(
    context_dir: impl Into<PathBuf>,
    dockerfile: &str,
    image_tag: &str,
    secrets: &[String],
    no_cache: bool,
    push: bool,
    progress: ProgressMode,
) -> Result<()> {
    let request = BuildRequest {
        secrets: secrets.to_vec(),
        no_cache,
        push,
        progress,
        ..BuildRequest::new(context_dir, dockerfile, image_tag)
    };
    ImageBuilder::default().build(&request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingRunner, capture_logs};
    use tempfile::tempdir;

    fn linux() -> HostPlatform {
        HostPlatform::new("linux", "x86_64")
    }

    fn apple_silicon() -> HostPlatform {
        HostPlatform::new("macos", "aarch64")
    }

    fn args_of(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_minimal_args() {
        let request = BuildRequest::new("/ctx", "FROM alpine", "app:latest");
        assert_eq!(
            build_args(&request, &linux()),
            args_of(&[
                "buildx",
                "build",
                "--file",
                "-",
                "--cache-to",
                "type=inline",
                "--tag",
                "app:latest",
                "--progress",
                "auto",
                ".",
            ])
        );
    }

    #[test]
    fn test_full_args_order() {
        let request = BuildRequest {
            secrets: vec!["id=a".into(), "id=b".into()],
            no_cache: true,
            push: true,
            progress: ProgressMode::Plain,
            ..BuildRequest::new("/ctx", "FROM alpine", "r8.im/user/model")
        };
        assert_eq!(
            build_args(&request, &apple_silicon()),
            args_of(&[
                "buildx",
                "build",
                "--platform",
                "linux/amd64",
                "--load",
                "--secret",
                "id=a",
                "--secret",
                "id=b",
                "--no-cache",
                "--push",
                "--file",
                "-",
                "--cache-to",
                "type=inline",
                "--tag",
                "r8.im/user/model",
                "--progress",
                "plain",
                ".",
            ])
        );
    }

    #[test]
    fn test_secrets_keep_order_and_pairing() {
        let request = BuildRequest {
            secrets: vec!["id=a".into(), "id=b".into()],
            ..BuildRequest::new("/ctx", "", "t")
        };
        let args = build_args(&request, &linux());
        let values: Vec<&String> = args
            .iter()
            .enumerate()
            .filter(|(_, a)| *a == "--secret")
            .map(|(i, _)| &args[i + 1])
            .collect();
        assert_eq!(values, vec!["id=a", "id=b"]);
    }

    #[test]
    fn test_no_cache_and_push_absent_by_default() {
        let args = build_args(&BuildRequest::new("/ctx", "", "t"), &linux());
        assert!(!args.contains(&"--no-cache".to_string()));
        assert!(!args.contains(&"--push".to_string()));
        assert!(!args.contains(&"--platform".to_string()));
        assert!(!args.contains(&"--load".to_string()));
    }

    #[test]
    fn test_context_is_always_dot() {
        let request = BuildRequest::new("/some/absolute/dir", "", "t");
        let args = build_args(&request, &linux());
        assert_eq!(args.last().map(String::as_str), Some("."));
        assert!(!args.iter().any(|a| a.contains("/some/absolute/dir")));
    }

    #[test]
    fn test_build_runs_in_context_with_stdin() {
        let ctx = tempdir().unwrap();
        let builder = ImageBuilder::new(RecordingRunner::succeeding(), linux(), "docker");
        let request = BuildRequest::new(ctx.path(), "FROM alpine\nRUN true\n", "app:dev");

        builder.build(&request).unwrap();

        let inv = builder.runner().last();
        assert_eq!(inv.program, "docker");
        assert_eq!(inv.current_dir.as_deref(), Some(ctx.path()));
        assert_eq!(inv.stdin, "FROM alpine\nRUN true\n");
        assert_eq!(inv.args, build_args(&request, &linux()));
    }

    #[test]
    fn test_build_emits_command_trace() {
        let ctx = tempdir().unwrap();
        let builder = ImageBuilder::new(RecordingRunner::succeeding(), linux(), "docker");
        let request = BuildRequest::new(ctx.path(), "FROM alpine", "app:dev");

        let (result, logs) = capture_logs(|| builder.build(&request));
        assert!(result.is_ok());
        assert!(logs.contains("$ docker buildx build --file - --cache-to type=inline"));
    }

    #[test]
    fn test_build_failure_is_returned_without_extra_output() {
        let ctx = tempdir().unwrap();
        let builder = ImageBuilder::new(RecordingRunner::exiting(1, "boom"), linux(), "docker");
        let request = BuildRequest::new(ctx.path(), "FROM alpine", "app:dev");

        let (result, logs) = capture_logs(|| builder.build(&request));
        let err = result.unwrap_err();
        assert!(matches!(err, BuildError::ExitStatus { code: Some(1), .. }));
        // 失敗時に出力を再表示しない
        assert!(!logs.contains("boom"));
        assert_eq!(builder.runner().calls.borrow().len(), 1);
    }

    #[test]
    fn test_missing_context_dir() {
        let builder = ImageBuilder::new(RecordingRunner::succeeding(), linux(), "docker");
        let request = BuildRequest::new("/nonexistent/kiln/context", "FROM alpine", "t");

        let err = builder.build(&request).unwrap_err();
        assert!(matches!(err, BuildError::ContextNotFound(_)));
        assert!(builder.runner().calls.borrow().is_empty());
    }
}
