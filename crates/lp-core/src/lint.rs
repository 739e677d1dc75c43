//! Lint diagnostics for loaded plans.
//!
//! Reports structural issues the engine would silently tolerate at runtime.
//! Nothing here modifies the plan.

use crate::model::{CmpFlags, Plan};
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Bfs;
use std::collections::HashSet;

// ─── Diagnostic types ────────────────────────────────────────────────────

/// Severity of a lint finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintSeverity {
    /// Likely a mistake in the descriptor.
    Warning,
    /// Informational.
    Info,
}

/// A single lint diagnostic for one `(pixel, state)` rule.
#[derive(Debug, Clone)]
pub struct LintDiagnostic {
    pub pixel: u8,
    pub state: u8,
    /// Human-readable message.
    pub message: String,
    pub severity: LintSeverity,
    /// Short rule identifier (e.g. "dangling-target").
    pub rule: &'static str,
}

// ─── Public API ───────────────────────────────────────────────────────────

/// Run all lint rules over the plan and return diagnostics.
#[must_use]
pub fn lint_plan(plan: &Plan) -> Vec<LintDiagnostic> {
    let mut diags = Vec::new();
    lint_unknown_flags(plan, &mut diags);
    lint_dangling_targets(plan, &mut diags);
    lint_unreachable_states(plan, &mut diags);
    diags
}

// ─── Rules ────────────────────────────────────────────────────────────────

/// Warn on comparison bits the engine does not know about.
fn lint_unknown_flags(plan: &Plan, diags: &mut Vec<LintDiagnostic>) {
    for action in plan.rules() {
        let unknown = action.cmp_flags.bits() & !CmpFlags::all().bits();
        if unknown != 0 {
            diags.push(LintDiagnostic {
                pixel: action.pixel,
                state: action.state,
                message: format!(
                    "Unknown comparison bits 0x{unknown:02X} on pixel {} state {}.",
                    action.pixel, action.state
                ),
                severity: LintSeverity::Warning,
                rule: "unknown-cmp-flags",
            });
        }
    }
}

/// Warn when a transition points at a slot with no executable rule.
fn lint_dangling_targets(plan: &Plan, diags: &mut Vec<LintDiagnostic>) {
    for action in plan.rules() {
        if !action.cmp_flags.intersects(CmpFlags::TRANSITIONS) {
            continue;
        }
        let (target_pixel, target_state) = action.target();
        if plan.rule(target_pixel, target_state).is_none() {
            diags.push(LintDiagnostic {
                pixel: action.pixel,
                state: action.state,
                message: format!(
                    "Pixel {} state {} transitions to pixel {target_pixel} state {target_state}, which has no rule.",
                    action.pixel, action.state
                ),
                severity: LintSeverity::Warning,
                rule: "dangling-target",
            });
        }
    }
}

/// Info on rules no transition chain reaches from any pixel's state 0.
fn lint_unreachable_states(plan: &Plan, diags: &mut Vec<LintDiagnostic>) {
    let mut graph: DiGraphMap<(u8, u8), ()> = DiGraphMap::new();
    for action in plan.rules() {
        let from = (action.pixel, action.state);
        graph.add_node(from);
        if action.cmp_flags.intersects(CmpFlags::TRANSITIONS)
            && plan.rule(action.target_pixel, action.target_state).is_some()
        {
            graph.add_edge(from, action.target(), ());
        }
    }

    let mut reached: HashSet<(u8, u8)> = HashSet::new();
    for (pixel, _) in plan.pixels() {
        let entry = (pixel, 0);
        if !graph.contains_node(entry) || reached.contains(&entry) {
            continue;
        }
        let mut bfs = Bfs::new(&graph, entry);
        while let Some(node) = bfs.next(&graph) {
            reached.insert(node);
        }
    }

    for action in plan.rules() {
        if !reached.contains(&(action.pixel, action.state)) {
            diags.push(LintDiagnostic {
                pixel: action.pixel,
                state: action.state,
                message: format!(
                    "Pixel {} state {} is never reached from any entry state.",
                    action.pixel, action.state
                ),
                severity: LintSeverity::Info,
                rule: "unreachable-state",
            });
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;

    #[test]
    fn lint_clean_plan_no_diags() {
        let input = "\
0,0,FF0000,255,10,0,0,1,0,0,0,1
0,1,000000,0,10,0,0,1,0,0,0,0
1,0,00FF00,255,0,0,0,8,0,0,0,0
";
        let plan = parse_document(input).unwrap();
        let diags = lint_plan(&plan);
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    }

    #[test]
    fn lint_dangling_target() {
        let plan = parse_document("0,0,FF0000,255,10,0,0,1,0,0,4,2\n").unwrap();
        let diags = lint_plan(&plan);
        assert!(
            diags.iter().any(|d| d.rule == "dangling-target"),
            "expected dangling-target diagnostic"
        );
    }

    #[test]
    fn lint_nop_never_dangles() {
        let plan = parse_document("0,0,FF0000,255,10,0,0,8,0,0,4,2\n").unwrap();
        assert!(lint_plan(&plan).is_empty());
    }

    #[test]
    fn lint_unknown_flags() {
        let plan = parse_document("0,0,FF0000,255,10,0,0,24,0,0,0,0\n").unwrap();
        let diags = lint_plan(&plan);
        let diag = diags
            .iter()
            .find(|d| d.rule == "unknown-cmp-flags")
            .expect("expected unknown-cmp-flags diagnostic");
        assert_eq!(diag.severity, LintSeverity::Warning);
        assert!(diag.message.contains("0x10"));
    }

    #[test]
    fn lint_unreachable_state() {
        let input = "\
0,0,FF0000,255,10,0,0,8,0,0,0,0
0,3,00FF00,255,10,0,0,1,0,0,0,0
";
        let plan = parse_document(input).unwrap();
        let diags = lint_plan(&plan);
        let unreachable: Vec<_> = diags
            .iter()
            .filter(|d| d.rule == "unreachable-state")
            .map(|d| (d.pixel, d.state))
            .collect();
        assert_eq!(unreachable, vec![(0, 3)]);
    }

    #[test]
    fn lint_cross_pixel_transition_reaches() {
        let input = "\
0,0,FF0000,255,10,0,0,1,0,0,1,2
1,2,00FF00,255,10,0,0,8,0,0,0,0
";
        let plan = parse_document(input).unwrap();
        assert!(lint_plan(&plan).is_empty());
    }
}
