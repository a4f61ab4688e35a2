mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use kiln_build::BuildError;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kiln")]
#[command(about = "docker buildx でイメージをビルドし、ラベルとスキーマを焼き込む", long_about = None)]
struct Cli {
    /// 実行するコマンドラインなどのデバッグログを表示
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dockerfile からイメージをビルド
    Build {
        /// ビルドコンテキストのディレクトリ
        #[arg(short = 'C', long = "context", default_value = ".")]
        context: PathBuf,
        /// Dockerfile のパス（`-` で標準入力）
        #[arg(short, long, default_value = "Dockerfile")]
        file: String,
        /// イメージタグ
        #[arg(short, long)]
        tag: String,
        /// docker の --secret にそのまま渡す値（複数指定可）
        #[arg(long = "secret")]
        secrets: Vec<String>,
        /// レイヤーキャッシュを使わない
        #[arg(long)]
        no_cache: bool,
        /// ビルド後にレジストリへプッシュ
        #[arg(long)]
        push: bool,
        /// 進捗表示 (auto, plain, tty, quiet, rawjson)。省略時は設定ファイルの値
        #[arg(long)]
        progress: Option<String>,
    },
    /// ビルド済みイメージにラベルとスキーマを追加
    Annotate {
        /// 対象イメージタグ（同じタグで上書き）
        #[arg(short, long)]
        tag: String,
        /// ラベル KEY=VALUE（複数指定可）
        #[arg(short, long = "label", value_parser = commands::parse_label)]
        labels: Vec<(String, String)>,
        /// 同梱する OpenAPI スキーマファイル
        #[arg(long)]
        schema: String,
        /// 生成した Python モデルを置くイメージ内のパス
        #[arg(short, long)]
        output: String,
        /// 追加後にレジストリへプッシュ
        #[arg(long)]
        push: bool,
    },
    /// バージョン情報を表示
    Version,
}

fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        // docker の終了コードはそのまま返す
        let exit_code = match e.downcast_ref::<BuildError>() {
            Some(build_error) => {
                eprintln!("{}", build_error.user_message().red());
                build_error.exit_code().unwrap_or(1)
            }
            None => {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
                1
            }
        };
        std::process::exit(exit_code);
    }
}

/// ログは stderr に出力（ビルド出力と同じストリーム）
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Version => {
            println!("kiln {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Build {
            context,
            file,
            tag,
            secrets,
            no_cache,
            push,
            progress,
        } => {
            let config = kiln_config::KilnConfig::load()?;
            commands::build::handle(
                &config,
                commands::build::BuildArgs {
                    context,
                    file,
                    tag,
                    secrets,
                    no_cache,
                    push,
                    progress,
                },
            )
        }
        Commands::Annotate {
            tag,
            labels,
            schema,
            output,
            push,
        } => {
            let config = kiln_config::KilnConfig::load()?;
            commands::annotate::handle(&config, tag, labels, schema, output, push)
        }
    }
}
