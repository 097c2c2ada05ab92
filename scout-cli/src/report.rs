use colored::*;
use scout::{AutomationError, ObjectMap, Record, Summary, Verdict};

fn label(verdict: Verdict) -> ColoredString {
    let text = format!("{verdict:>7}");
    match verdict {
        Verdict::Pass => text.green(),
        Verdict::Fail | Verdict::Fatal => text.red().bold(),
        Verdict::Warning => text.yellow(),
        Verdict::Log => text.dimmed(),
    }
}

/// Display the verdicts of a run followed by the totals
pub fn display(records: &[Record], summary: &Summary) {
    println!();
    for record in records {
        match &record.detail {
            Some(detail) => println!("{} {} ({})", label(record.verdict), record.message, detail),
            None => println!("{} {}", label(record.verdict), record.message),
        }
    }

    println!("{}", "─".repeat(60));
    let totals = format!(
        "{} passed, {} failed, {} fatal, {} warnings",
        summary.passes, summary.fails, summary.fatals, summary.warnings
    );
    if summary.succeeded() {
        println!("{} {}", "✅ SUCCESS:".green().bold(), totals);
    } else {
        println!("{} {}", "❌ FAILURE:".red().bold(), totals);
    }
}

pub fn display_names(map: &ObjectMap, failures: &[(String, AutomationError)]) {
    for name in map.symbolic_names() {
        println!("{}\t{}", name.bold(), map.real_name(name).unwrap_or_default());
    }
    println!("{}", "─".repeat(60));
    if failures.is_empty() {
        println!("{} {} names resolve", "✅".green(), map.len());
        return;
    }
    for (name, error) in failures {
        println!("{} {}: {}", "❌".red(), name, error);
    }
}
