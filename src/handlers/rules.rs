use colored::*;

use crate::analyzer::cfnlint::rules::{RuleDefinition, rule_definitions};

/// Print the rule catalog.
pub fn handle_rules(quick: bool, json: bool) -> crate::Result<()> {
    let definitions: Vec<RuleDefinition> = rule_definitions()
        .into_iter()
        .filter(|d| !quick || d.quick)
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&definitions)?);
        return Ok(());
    }

    print!("{}", format_rule_table(&definitions));
    Ok(())
}

fn format_rule_table(definitions: &[RuleDefinition]) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{}\n",
        format!("{} rules", definitions.len()).bright_white().bold()
    ));
    output.push_str(&format!("{}\n", "─".repeat(72).dimmed()));

    for def in definitions {
        let code = if def.code.is_error_class() {
            def.code.as_str().red()
        } else {
            def.code.as_str().yellow()
        };
        let tier = if def.quick { "quick" } else { "deep" };
        output.push_str(&format!(
            "{}  {:<30} {:<6} {}\n",
            code,
            def.name,
            tier.dimmed(),
            def.description
        ));
        output.push_str(&format!("      {} {}\n", "fix:".dimmed(), def.remediation));
    }

    output
}
