use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} failed ({})", exit_description(.code))]
    ExitStatus { program: String, code: Option<i32> },

    #[error("Build context directory not found: {0}")]
    ContextNotFound(PathBuf),

    #[error("Unknown progress mode: {0}")]
    InvalidProgressMode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {}", code),
        None => "terminated by signal".to_string(),
    }
}

impl BuildError {
    /// ユーザー向けの分かりやすいエラーメッセージ
    pub fn user_message(&self) -> String {
        match self {
            BuildError::Spawn { program, source } => {
                format!(
                    "{} を実行できません: {}\n\
                     \n\
                     解決方法:\n\
                     1. Docker がインストールされ PATH に含まれているか確認してください\n\
                     2. 別のバイナリを使う場合は KILN_DOCKER 環境変数で指定してください",
                    program, source
                )
            }
            BuildError::ExitStatus { .. } => {
                format!(
                    "ビルドに失敗しました: {}\n\
                     \n\
                     上に表示されたビルド出力を確認してください。",
                    self
                )
            }
            BuildError::ContextNotFound(path) => {
                format!(
                    "ビルドコンテキストが見つかりません: {}\n\
                     \n\
                     コンテキストディレクトリのパスを確認してください。",
                    path.display()
                )
            }
            BuildError::InvalidProgressMode(mode) => {
                format!(
                    "不明な progress モード: {}\n\
                     \n\
                     auto, plain, tty, quiet, rawjson のいずれかを指定してください。",
                    mode
                )
            }
            _ => format!("{}", self),
        }
    }

    /// 外部ツールが非ゼロで終了した場合の終了コード
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            BuildError::ExitStatus { code, .. } => *code,
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
