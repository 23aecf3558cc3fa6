use anyhow::Context;
use colored::Colorize;
use leftovers_cloud::{ApiVersion, Inventory, InventoryPlane, ManagementPlane};
use leftovers_config::SweepConfig;
use leftovers_core::{LineProgress, Progress, SweepOptions, TracingProgress, Walker};
use std::path::PathBuf;

pub struct SimulateArgs {
    pub inventory: PathBuf,
    pub dry_run: bool,
    pub verbose: bool,
    pub sys_admin: bool,
    pub api_version: Option<ApiVersion>,
    pub output: Option<PathBuf>,
    pub json: bool,
}

pub async fn handle(config: &SweepConfig, args: SimulateArgs) -> anyhow::Result<()> {
    let inventory = Inventory::load(&args.inventory).await.with_context(|| {
        format!(
            "インベントリを読み込めません: {}",
            args.inventory.display()
        )
    })?;

    let mut plane = InventoryPlane::new(inventory).with_sys_admin(args.sys_admin);
    if let Some(version) = args.api_version {
        plane = plane.with_api_version(version);
    }

    if !args.json {
        println!(
            "{} {} (API {}, {})",
            "🧹 スイープ開始:".bold(),
            args.inventory.display().to_string().cyan(),
            plane.api_version(),
            if args.sys_admin { "プロバイダー" } else { "テナント" }
        );
        if args.dry_run {
            println!("{}", "ドライラン: 削除は実行しません".yellow());
        }
        println!();
    }

    let options = SweepOptions {
        verbose: args.verbose,
        dry_run: args.dry_run,
    };
    let progress: Box<dyn Progress> = if args.json {
        Box::new(TracingProgress)
    } else {
        Box::new(LineProgress::stdout(args.verbose))
    };
    let result = Walker::new(&plane, config, progress.as_ref(), options)
        .run()
        .await;

    // 途中で失敗しても、そこまでの結果は書き出す
    if let Some(output) = &args.output {
        plane
            .inventory()
            .save(output)
            .await
            .with_context(|| format!("インベントリを書き出せません: {}", output.display()))?;
        if !args.json {
            println!("インベントリを書き出しました: {}", output.display());
        }
    }

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{} {}", "✗ スイープ失敗:".red().bold(), e);
            std::process::exit(1);
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!("{} {}", "✓ 完了:".green().bold(), report);
    for retained in &report.retained {
        println!(
            "  {} {} {} ({})",
            "保持:".yellow(),
            retained.kind.label(),
            retained.path,
            retained.reason
        );
    }
    for skipped in &report.skipped {
        println!(
            "  {} {} ({})",
            "スキップ:".dimmed(),
            skipped.pass,
            skipped.reason
        );
    }
    Ok(())
}
