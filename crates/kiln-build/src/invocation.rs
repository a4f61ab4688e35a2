//! 外部ビルドツールの 1 回分の呼び出し

use crate::error::BuildError;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// 1 回のプロセス実行に必要なものをすべて保持する
///
/// 引数はシェルを介さずそのまま渡されるため、クォートもエスケープもしない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// `None` のときは呼び出し元のカレントディレクトリで実行
    pub current_dir: Option<PathBuf>,
    /// 標準入力に流し込む Dockerfile 本文
    pub stdin: String,
}

impl Invocation {
    pub fn new(program: impl Into<String>, args: Vec<String>, stdin: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args,
            current_dir: None,
            stdin: stdin.into(),
        }
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// デバッグ表示用のコマンドライン（スペース区切り）
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub(crate) fn trace(&self) {
        tracing::debug!("$ {}", self.command_line());
    }
}

/// `--progress` に渡す出力モード
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProgressMode {
    #[default]
    Auto,
    Plain,
    Tty,
    Quiet,
    RawJson,
}

impl ProgressMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressMode::Auto => "auto",
            ProgressMode::Plain => "plain",
            ProgressMode::Tty => "tty",
            ProgressMode::Quiet => "quiet",
            ProgressMode::RawJson => "rawjson",
        }
    }
}

impl fmt::Display for ProgressMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProgressMode {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(ProgressMode::Auto),
            "plain" => Ok(ProgressMode::Plain),
            "tty" => Ok(ProgressMode::Tty),
            "quiet" => Ok(ProgressMode::Quiet),
            "rawjson" => Ok(ProgressMode::RawJson),
            _ => Err(BuildError::InvalidProgressMode(s.to_string())),
        }
    }
}
