//! 外部プロセスの実行
//!
//! 引数組み立て（純粋）とプロセス起動（副作用）の境界。
//! テストでは [`CommandRunner`] を差し替えて、実際のバイナリを起動せずに
//! 引数リストと Dockerfile 本文を検証する。

use crate::error::{BuildError, Result};
use crate::invocation::Invocation;
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::process::{Command, ExitStatus, Stdio};

/// stdout と stderr をまとめて捕捉した実行結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombinedOutput {
    /// 終了コード（シグナルで終了した場合は `None`）
    pub code: Option<i32>,
    pub output: Vec<u8>,
}

impl CombinedOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn output_lossy(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

pub trait CommandRunner {
    /// stdout / stderr を呼び出し元の stderr に流しながら実行する
    ///
    /// 非ゼロ終了は [`BuildError::ExitStatus`] になる。
    fn run_streaming(&self, invocation: &Invocation) -> Result<()>;

    /// stdout / stderr を 1 つのバッファに捕捉して実行する
    ///
    /// 起動に失敗した場合のみ `Err`。終了コードの判定は呼び出し側で行う。
    fn run_combined(&self, invocation: &Invocation) -> Result<CombinedOutput>;
}

/// `std::process::Command` による実装
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    fn command(invocation: &Invocation) -> Command {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        if let Some(dir) = &invocation.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl CommandRunner for ProcessRunner {
    fn run_streaming(&self, invocation: &Invocation) -> Result<()> {
        let mut cmd = Self::command(invocation);
        // ビルド出力はすべてメッセージなので stdout も stderr に流す
        cmd.stdout(std::io::stderr()).stderr(Stdio::inherit());

        let status = spawn_and_wait(cmd, invocation)?;
        check_status(&invocation.program, status)
    }

    fn run_combined(&self, invocation: &Invocation) -> Result<CombinedOutput> {
        // 同じファイルを stdout と stderr の両方に渡すと書き込み順のまま残る
        let mut sink = tempfile::tempfile()?;
        let mut cmd = Self::command(invocation);
        cmd.stdout(Stdio::from(sink.try_clone()?))
            .stderr(Stdio::from(sink.try_clone()?));

        let status = spawn_and_wait(cmd, invocation)?;

        let mut output = Vec::new();
        sink.seek(SeekFrom::Start(0))?;
        sink.read_to_end(&mut output)?;

        Ok(CombinedOutput {
            code: status.code(),
            output,
        })
    }
}

/// プロセスを起動し、Dockerfile を stdin に書き込んで終了を待つ
fn spawn_and_wait(mut cmd: Command, invocation: &Invocation) -> Result<ExitStatus> {
    cmd.stdin(Stdio::piped());

    let mut child = cmd.spawn().map_err(|source| BuildError::Spawn {
        program: invocation.program.clone(),
        source,
    })?;

    if let Some(mut stdin) = child.stdin.take() {
        match stdin.write_all(invocation.stdin.as_bytes()) {
            Ok(()) => {}
            // stdin を読む前に終了した。結果は終了コードで判断する
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                tracing::debug!("{} closed stdin early", invocation.program);
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(BuildError::Io(e));
            }
        }
    }

    Ok(child.wait()?)
}

fn check_status(program: &str, status: ExitStatus) -> Result<()> {
    if status.success() {
        Ok(())
    } else {
        Err(BuildError::ExitStatus {
            program: program.to_string(),
            code: status.code(),
        })
    }
}
