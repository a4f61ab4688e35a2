//! テスト用の CommandRunner と tracing 出力の捕捉

use crate::error::{BuildError, Result};
use crate::invocation::Invocation;
use crate::runner::{CombinedOutput, CommandRunner};
use std::cell::RefCell;
use std::io::Write;
use std::sync::{Arc, Mutex};

/// 実行せずに Invocation を記録するだけの runner
pub struct RecordingRunner {
    pub calls: RefCell<Vec<Invocation>>,
    exit_code: i32,
    output: Vec<u8>,
}

impl RecordingRunner {
    pub fn succeeding() -> Self {
        Self::exiting(0, "")
    }

    pub fn exiting(exit_code: i32, output: &str) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            exit_code,
            output: output.as_bytes().to_vec(),
        }
    }

    pub fn last(&self) -> Invocation {
        self.calls.borrow().last().cloned().expect("no invocation recorded")
    }
}

impl CommandRunner for RecordingRunner {
    fn run_streaming(&self, invocation: &Invocation) -> Result<()> {
        self.calls.borrow_mut().push(invocation.clone());
        if self.exit_code == 0 {
            Ok(())
        } else {
            Err(BuildError::ExitStatus {
                program: invocation.program.clone(),
                code: Some(self.exit_code),
            })
        }
    }

    fn run_combined(&self, invocation: &Invocation) -> Result<CombinedOutput> {
        self.calls.borrow_mut().push(invocation.clone());
        Ok(CombinedOutput {
            code: Some(self.exit_code),
            output: self.output.clone(),
        })
    }
}

#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// `f` の実行中に出た tracing イベント（DEBUG 以上）を文字列で返す
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .without_time()
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, buffer.contents())
}
