//! `lp` — command-line front end for `lp-core`.
//!
//! Reads a descriptor file from disk and loads it into a `Plan`, then checks,
//! dumps, or re-emits it.

use std::fmt::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use lp_core::{LintSeverity, ParseOptions, Plan};

pub mod cli;

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.level_filter())
        .parse_default_env()
        .init();

    match cli.command {
        Command::Check { file, strict } => {
            let options = ParseOptions {
                strict_arity: strict,
            };
            let plan = load(&file, &options)?;
            let diags = lp_core::lint_plan(&plan);
            for diag in &diags {
                println!(
                    "{}: {:?} [{}] {}",
                    file.display(),
                    diag.severity,
                    diag.rule,
                    diag.message
                );
            }
            let warnings = diags
                .iter()
                .filter(|d| d.severity == LintSeverity::Warning)
                .count();
            if warnings > 0 {
                anyhow::bail!("{warnings} warning(s) in {}", file.display());
            }
            println!(
                "{}: ok, {} rules over {} pixels",
                file.display(),
                plan.rules().count(),
                plan.len()
            );
        }
        Command::Dump { file, json } => {
            let plan = load(&file, &ParseOptions::default())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                print!("{}", render_table(&plan));
            }
        }
        Command::Fmt { file } => {
            let plan = load(&file, &ParseOptions::default())?;
            print!("{}", lp_core::emit_document(&plan));
        }
    }

    Ok(())
}

fn load(path: &Path, options: &ParseOptions) -> Result<Plan> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut plan = Plan::new();
    plan.reload(&text, options)
        .with_context(|| format!("failed to load {}", path.display()))?;
    log::info!("loaded {} ({} pixel slots)", path.display(), plan.len());
    Ok(plan)
}

/// One row per executable rule, aligned for reading in a terminal.
fn render_table(plan: &Plan) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>5} {:>5}  {:<6} {:>5} {:>6} {:>4} {:>4}  {:<20} {:>6} {:>4}  target",
        "pixel", "state", "color", "level", "delay", "dlv", "ddl", "flags", "cdelay", "clvl"
    );
    for action in plan.rules() {
        let _ = writeln!(
            out,
            "{:>5} {:>5}  {:<6} {:>5} {:>6} {:>4} {:>4}  {:<20} {:>6} {:>4}  {}/{}",
            action.pixel,
            action.state,
            action.color.to_hex(),
            action.level,
            action.delay,
            action.delta_level,
            action.delta_delay,
            format!("{:?}", action.cmp_flags),
            action.cmp_delay,
            action.cmp_level,
            action.target_pixel,
            action.target_state,
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_table_lists_valid_rules_only() {
        let plan = lp_core::parse_document(
            "0,2,FF0000,128,10,1,-1,1,5,100,1,0\n1,0,00FF00,0,0,0,0,0,0,0,0,0\n",
        )
        .unwrap();
        let table = render_table(&plan);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("FF0000"));
        assert!(lines[1].ends_with("1/0"));
    }

    #[test]
    fn load_reports_path_on_error() {
        let err = load(Path::new("/nonexistent/plan.txt"), &ParseOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/plan.txt"));
    }
}
