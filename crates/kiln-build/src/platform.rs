//! ホストプラットフォーム判定
//!
//! Apple Silicon 上の Docker は `linux/arm64` を既定にするため、
//! `linux/amd64` のベースイメージをビルドすると
//! "The requested image's platform (linux/amd64) does not match the detected host platform"
//! の警告が出る。該当ホストでは platform を固定し `--load` でローカルに取り込む。

/// 互換ワークアラウンド時に固定するターゲットプラットフォーム
pub const COMPAT_PLATFORM: &str = "linux/amd64";

/// ビルドを実行するホストの OS と CPU アーキテクチャ
///
/// 値は `std::env::consts::{OS, ARCH}` と同じ表記を使う。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPlatform {
    pub os: String,
    pub arch: String,
}

impl HostPlatform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// 現在のホスト
    pub fn current() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }

    pub fn needs_workaround(&self) -> bool {
        needs_platform_workaround(&self.os, &self.arch)
    }

    /// `--platform linux/amd64 --load` を `args` に追加する（必要な場合のみ）
    ///
    /// `--load` なしで platform だけ固定すると非互換ホストで失敗するため、常に対で追加する。
    pub(crate) fn push_compat_args(&self, args: &mut Vec<String>) {
        if self.needs_workaround() {
            args.extend(
                ["--platform", COMPAT_PLATFORM, "--load"]
                    .iter()
                    .map(|s| s.to_string()),
            );
        }
    }
}

/// Apple Silicon Mac かどうか
pub fn needs_platform_workaround(os: &str, arch: &str) -> bool {
    os == "macos" && arch == "aarch64"
}
