//! kiln のイメージビルド機能
//!
//! `docker buildx build` の引数組み立てと実行、およびビルド済みイメージへの
//! ラベル付与・スキーマ同梱（後処理ビルド）を提供します。
//!
//! 引数リストと Dockerfile 本文の生成は純粋関数として分離しており、
//! プロセス起動は [`CommandRunner`] の背後に隠れています。

pub mod annotate;
pub mod builder;
pub mod error;
pub mod invocation;
pub mod platform;
pub mod runner;

#[cfg(test)]
pub(crate) mod testing;

pub use annotate::{AnnotationRequest, annotate_args, annotation_dockerfile};
pub use builder::{BuildRequest, ImageBuilder, build, build_args};
pub use error::{BuildError, Result};
pub use invocation::{Invocation, ProgressMode};
pub use platform::{COMPAT_PLATFORM, HostPlatform, needs_platform_workaround};
pub use runner::{CombinedOutput, CommandRunner, ProcessRunner};
