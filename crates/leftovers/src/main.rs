mod commands;

use clap::{Parser, Subcommand};
use leftovers_cloud::{ApiVersion, EntityKind};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "leftovers")]
#[command(
    about = "テストが残したリソースを、安全な順序で片付ける。",
    long_about = None
)]
struct Cli {
    /// 設定ファイルのパス（省略時は LEFTOVERS_CONFIG_PATH、カレントディレクトリ、~/.config/leftovers の順に検索）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// エンティティが削除対象かどうかを判定
    Check {
        /// エンティティの種類 (vcd_org, vcd_vapp, ...)
        #[arg(short = 't', long = "type")]
        kind: EntityKind,
        /// エンティティ名
        #[arg(short, long)]
        name: String,
    },
    /// 有効な設定を表示
    Config,
    /// インベントリのスナップショットに対して削除を実行
    Simulate {
        /// インベントリファイル (JSON または YAML)
        #[arg(short, long)]
        inventory: PathBuf,
        /// 判定のみ行い、削除は実行しない
        #[arg(long)]
        dry_run: bool,
        /// 判定行を表示しない（削除行のみ）
        #[arg(short, long)]
        quiet: bool,
        /// テナント権限で実行（プロバイダー専用のパスをスキップ）
        #[arg(long)]
        tenant: bool,
        /// API バージョンを上書き (例: 37.1)
        #[arg(long)]
        api_version: Option<ApiVersion>,
        /// 実行後のインベントリを書き出すファイル
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// 結果を JSON で出力
        #[arg(long)]
        json: bool,
    },
    /// バージョン情報を表示
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 標準出力は進捗表示に使うので、ログは stderr に出力
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    // Versionコマンドは設定ファイル不要
    if matches!(cli.command, Commands::Version) {
        println!("leftovers {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let (config, config_path) = commands::load_config(cli.config.as_deref())?;

    // コマンドディスパッチ
    match cli.command {
        Commands::Check { kind, name } => {
            commands::check::handle(&config, kind, &name);
        }
        Commands::Config => {
            commands::config::handle(&config, config_path.as_deref())?;
        }
        Commands::Simulate {
            inventory,
            dry_run,
            quiet,
            tenant,
            api_version,
            output,
            json,
        } => {
            let args = commands::simulate::SimulateArgs {
                inventory,
                dry_run,
                verbose: !quiet,
                sys_admin: !tenant,
                api_version,
                output,
                json,
            };
            commands::simulate::handle(&config, args).await?;
        }
        Commands::Version => {}
    }

    Ok(())
}
