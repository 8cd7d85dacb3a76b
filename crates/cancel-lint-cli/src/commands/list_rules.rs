//! List rules command implementation.

use cancel_lint_rules::{fix_catalog, rule_catalog, suppression_catalog, FixPriority};

/// Runs the list-rules command.
pub fn run() {
    println!("Available rules:\n");
    println!("{:<8} {:<40} {:<9} Title", "Code", "Name", "Severity");
    println!("{}", "-".repeat(100));

    for descriptor in rule_catalog() {
        println!(
            "{:<8} {:<40} {:<9} {}",
            descriptor.code,
            descriptor.name,
            descriptor.severity.to_string(),
            descriptor.title
        );
    }

    println!("\nSuppressions:");
    for descriptor in suppression_catalog() {
        println!(
            "  {} hides {}: {}",
            descriptor.id, descriptor.suppressed_id, descriptor.justification
        );
    }

    println!("\nFixes:");
    for fix in fix_catalog() {
        let low = if fix.priority == FixPriority::Low { " (alternative)" } else { "" };
        println!(
            "  {:<46} {:<38} {}{}",
            fix.title,
            fix.equivalence_key,
            fix.codes.join(","),
            low
        );
    }

    println!("\nDisable or re-level a rule in cancel-lint.toml, e.g.:");
    println!("  [rules.CT003]");
    println!("  severity = \"warning\"");
}
