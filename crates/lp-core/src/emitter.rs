//! Emitter: `Plan` → LP descriptor text.
//!
//! Output re-parses to an equal `Plan`. Growth fill is left out; the last
//! slot of every table is always written so table lengths survive.
//!
//! A pixel table with no slots (only `Plan::pixel_table_mut` makes one) has
//! no line to write. It re-parses as an absent pixel, and `Plan::len` shrinks
//! if it was the highest pixel. Plans loaded from text never contain one.

use crate::model::{Action, Plan};
use std::fmt::Write;

/// Column header written at the top of every emitted document.
pub const HEADER: &str =
    "# pixel,state,color,level,delay,dlevel,ddelay,flags,cmpdelay,cmplevel,tpixel,tstate";

/// Emit a `Plan` as descriptor text.
#[must_use]
pub fn emit_document(plan: &Plan) -> String {
    let mut out = String::with_capacity(64 * plan.len() + HEADER.len() + 1);
    out.push_str(HEADER);
    out.push('\n');

    for (_, table) in plan.pixels() {
        let last = table.len().saturating_sub(1);
        for (state, action) in table.iter() {
            if *action != Action::INVALID || usize::from(state) == last {
                emit_action(&mut out, action);
            }
        }
    }

    out
}

/// Append one data line for `action`.
pub fn emit_action(out: &mut String, action: &Action) {
    let _ = writeln!(
        out,
        "{},{},{},{},{},{},{},{},{},{},{},{}",
        action.pixel,
        action.state,
        action.color.to_hex(),
        action.level,
        action.delay,
        action.delta_level,
        action.delta_delay,
        action.cmp_flags.bits(),
        action.cmp_delay,
        action.cmp_level,
        action.target_pixel,
        action.target_state,
    );
}

// ─── Tests ────────────────────────────────────────────────────────────────
