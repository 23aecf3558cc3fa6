use colored::Colorize;
use leftovers_config::SweepConfig;
use std::path::Path;

pub fn handle(config: &SweepConfig, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(path) => println!("設定ファイル: {}", path.display().to_string().cyan()),
        None => println!("{}", "設定ファイルなし（デフォルト設定を使用）".yellow()),
    }
    println!();

    println!("テスト名パターン: {}", config.is_test().as_str().cyan());
    let always_show: Vec<String> = config.always_show().map(|k| k.to_string()).collect();
    println!("常に表示する種類: {}", always_show.join(", "));

    println!("do_not_delete: {}件", config.do_not_delete().len());
    for entry in config.do_not_delete().iter() {
        print_entry(entry);
    }
    println!("also_delete: {}件", config.also_delete().len());
    for entry in config.also_delete().iter() {
        print_entry(entry);
    }

    println!();
    println!("{}", "YAML:".bold());
    print!("{}", config.to_yaml()?);
    Ok(())
}

fn print_entry(entry: &leftovers_config::EntityRef) {
    if entry.comment.is_empty() {
        println!("  - {}", entry);
    } else {
        println!("  - {} # {}", entry, entry.comment.dimmed());
    }
}
