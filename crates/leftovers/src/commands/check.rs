use colored::Colorize;
use leftovers_cloud::EntityKind;
use leftovers_config::{EntityRef, SweepConfig};
use leftovers_core::progress::format_decision;
use leftovers_core::{Reason, decide_with};

pub fn handle(config: &SweepConfig, kind: EntityKind, name: &str) {
    let decision = decide_with(config, name, kind);
    let entity = EntityRef::new(kind, name);

    println!("{}", format_decision(0, &entity, &decision));

    let verdict = if decision.delete {
        "削除対象".red().bold()
    } else {
        "保持".green().bold()
    };
    let rule = match decision.reason {
        Reason::Default if decision.delete => {
            format!("名前がパターン {} に一致", config.is_test().as_str())
        }
        Reason::Default => format!("名前がパターン {} に一致しない", config.is_test().as_str()),
        Reason::Forced => "also_delete に登録済み".to_string(),
        Reason::Protected => "do_not_delete に登録済み".to_string(),
    };
    println!("  判定: {} ({}: {})", verdict, decision.reason, rule);

    if decision.forced && decision.protected {
        println!(
            "  {}",
            "also_delete と do_not_delete の両方に登録されています（do_not_delete が優先）".yellow()
        );
    }
}
