//! Parser for the LP descriptor format → `Plan`.
//!
//! One record per line, twelve comma-separated positional fields:
//!
//! ```text
//! # pixel,state,color,level,delay,dlevel,ddelay,flags,cmpdelay,cmplevel,tpixel,tstate
//! 1,2,FF0000,128,10,1,-1,1,5,100,3,0
//! ```
//!
//! `color` is hexadecimal, everything else decimal. Lines starting with `#`
//! and blank lines carry no record. Every line must end with `\n`.

use crate::config::ParseOptions;
use crate::cursor::Cursor;
use crate::error::PlanError;
use crate::model::{Action, CmpFlags, Plan, Rgb};

/// Fields in a data line.
pub const FIELD_COUNT: usize = 12;

/// First character of a comment line.
pub const COMMENT_MARKER: char = '#';

/// Parse a descriptor into a fresh `Plan` with default options.
#[must_use = "parsing result should be used"]
pub fn parse_document(input: &str) -> Result<Plan, PlanError> {
    parse_document_with(input, &ParseOptions::default())
}

/// Parse a descriptor into a fresh `Plan`.
#[must_use = "parsing result should be used"]
pub fn parse_document_with(input: &str, options: &ParseOptions) -> Result<Plan, PlanError> {
    let mut plan = Plan::new();
    parse_plan(&mut plan, input, options)?;
    Ok(plan)
}

/// Parse every line of `input` into `plan`, overwriting existing slots.
///
/// On error `plan` may hold some of the buffer's actions and should be
/// discarded with `Plan::clear` (or use `Plan::reload` instead).
///
/// # Errors
/// `MissingTerminator` if the buffer does not end with `\n`,
/// `StructuralUnderflow` for short lines under `strict_arity`,
/// `Allocation` if the table cannot grow.
pub fn parse_plan(plan: &mut Plan, input: &str, options: &ParseOptions) -> Result<(), PlanError> {
    let mut cursor = Cursor::new(input)?;
    let mut inserted = 0usize;

    while !cursor.is_at_end() {
        if let Some(action) = parse_line(&mut cursor, options)? {
            log::trace!(
                "PLAN insert pixel {} state {} flags {:?}",
                action.pixel,
                action.state,
                action.cmp_flags
            );
            plan.insert(action)?;
            inserted += 1;
        }
    }

    log::debug!(
        "parsed {inserted} actions over {} lines into {} pixel slots",
        cursor.line() - 1,
        plan.len()
    );
    Ok(())
}

/// Parse the line under `cursor`.
///
/// Returns `Ok(None)` at end of input (cursor unmoved) and for comment or
/// blank lines (cursor moved to the next line). Characters after the twelfth
/// field are ignored.
///
/// # Errors
/// `StructuralUnderflow` for short lines under `strict_arity`.
pub fn parse_line(
    cursor: &mut Cursor<'_>,
    options: &ParseOptions,
) -> Result<Option<Action>, PlanError> {
    if cursor.is_at_end() {
        return Ok(None);
    }
    if cursor.peek() == Some(COMMENT_MARKER) || cursor.is_blank_line() {
        cursor.skip_line()?;
        return Ok(None);
    }

    let mut fields = FieldReader {
        line: cursor.line(),
        cursor: &mut *cursor,
        strict: options.strict_arity,
        started: 0,
    };

    let action = Action {
        pixel: narrow_u8(fields.long()?),
        state: narrow_u8(fields.long()?),
        color: fields.rgb()?,
        level: narrow_u8(fields.long()?),
        delay: narrow_u32(fields.long()?),
        delta_level: narrow_u8(fields.long()?) as i8,
        delta_delay: narrow_u8(fields.long()?) as i8,
        cmp_flags: CmpFlags::from_bits_retain(narrow_u8(fields.long()?)),
        cmp_delay: narrow_u32(fields.long()?),
        cmp_level: narrow_u8(fields.long()?),
        target_pixel: narrow_u8(fields.long()?),
        target_state: narrow_u8(fields.long()?),
    };
    fields.finish();

    cursor.skip_line()?;
    Ok(Some(action))
}

/// Reads positional fields off one line and counts how many were present.
struct FieldReader<'c, 'a> {
    cursor: &'c mut Cursor<'a>,
    line: usize,
    strict: bool,
    started: usize,
}

impl FieldReader<'_, '_> {
    fn long(&mut self) -> Result<i64, PlanError> {
        self.start_field()?;
        Ok(self.cursor.read_long())
    }

    fn rgb(&mut self) -> Result<Rgb, PlanError> {
        self.start_field()?;
        Ok(self.cursor.read_rgb())
    }

    fn start_field(&mut self) -> Result<(), PlanError> {
        if !self.cursor.is_at_line_end() {
            self.started += 1;
        } else if self.strict {
            return Err(PlanError::StructuralUnderflow {
                line: self.line,
                found: self.started,
            });
        }
        Ok(())
    }

    fn finish(self) {
        if self.started < FIELD_COUNT {
            log::warn!(
                "line {}: {} of {FIELD_COUNT} fields present, rest read as 0",
                self.line,
                self.started
            );
        }
    }
}

// The engine stores fields in a packed record; values are truncated
// two's-complement style, so `-1` in a u8 field is 255.

fn narrow_u8(value: i64) -> u8 {
    value as u8
}

fn narrow_u32(value: i64) -> u32 {
    value as u32
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_single_line() {
        let plan = parse_document("1,2,FF0000,128,10,1,-1,1,5,100,3,0\n").expect("parse failed");
        assert_eq!(
            plan[1][2],
            Action {
                pixel: 1,
                state: 2,
                color: Rgb::new(255, 0, 0),
                level: 128,
                delay: 10,
                delta_level: 1,
                delta_delay: -1,
                cmp_flags: CmpFlags::WAIT,
                cmp_delay: 5,
                cmp_level: 100,
                target_pixel: 3,
                target_state: 0,
            }
        );
    }

    #[test]
    fn parse_comment_then_line() {
        let plan = parse_document("# comment\n1,0,0000FF,0,0,0,0,0,0,0,0,0\n").unwrap();
        assert_eq!(plan.len(), 2);
        assert!(plan.pixel(0).is_none());
        assert_eq!(plan[1][0].color, Rgb::new(0, 0, 255));
    }

    #[test]
    fn parse_line_end_of_input() {
        let mut cursor = Cursor::new("").unwrap();
        assert_eq!(parse_line(&mut cursor, &ParseOptions::default()), Ok(None));
        assert!(cursor.is_at_end());
    }

    #[test]
    fn parse_line_comment_advances() {
        let mut cursor = Cursor::new("# one\n0,0,0,0,0,0,0,1,0,0,0,0\n").unwrap();
        let options = ParseOptions::default();
        assert_eq!(parse_line(&mut cursor, &options), Ok(None));
        assert_eq!(cursor.line(), 2);
        let action = parse_line(&mut cursor, &options).unwrap().unwrap();
        assert_eq!(action.cmp_flags, CmpFlags::WAIT);
        assert!(cursor.is_at_end());
    }

    #[test]
    fn blank_and_crlf_lines() {
        let plan = parse_document("\n  \r\n0,1,00FF00,1,2,3,4,2,5,6,0,0\r\n\n").unwrap();
        let action = plan.rule(0, 1).expect("rule missing");
        assert_eq!(action.color, Rgb::new(0, 255, 0));
        assert_eq!(action.target_state, 0);
    }

    #[test]
    fn trailing_garbage_ignored() {
        let plan = parse_document("0,0,000001,1,1,1,1,1,1,1,1,1,,extra stuff\n").unwrap();
        assert_eq!(plan[0][0].target_state, 1);
    }

    #[test]
    fn repeated_separators_collapse() {
        let plan = parse_document("2,,,1,,FFFFFF,,9,8,7,6,1,2,3,4,5\n").unwrap();
        let action = plan[2][1];
        assert_eq!(action.level, 9);
        assert_eq!(action.target_state, 5);
    }

    #[test]
    fn short_line_is_lenient_by_default() {
        let plan = parse_document("3,1,ABCDEF,7\n").unwrap();
        let action = plan[3][1];
        assert_eq!(action.level, 7);
        assert_eq!(action.delay, 0);
        assert_eq!(action.cmp_flags, CmpFlags::INVALID);
    }

    #[test]
    fn short_line_does_not_consume_next_line() {
        let plan = parse_document("0,0\n1,1,000000,0,0,0,0,1,0,0,0,0\n").unwrap();
        assert_eq!(plan.len(), 2);
        assert!(plan.rule(1, 1).is_some());
    }

    #[test]
    fn short_line_rejected_when_strict() {
        let result = parse_document_with(
            "0,0,000000,0,0,0,0,1,0,0,0,0\n3,1,ABCDEF,7\n",
            &ParseOptions::strict(),
        );
        assert_eq!(
            result,
            Err(PlanError::StructuralUnderflow { line: 2, found: 4 })
        );
    }

    #[test]
    fn short_line_with_trailing_blanks_rejected_when_strict() {
        let strict = ParseOptions::strict();
        assert_eq!(
            parse_document_with("0,0 \n", &strict),
            Err(PlanError::StructuralUnderflow { line: 1, found: 2 })
        );
        assert_eq!(
            parse_document_with("0,0,FF0000,1,\t \r\n", &strict),
            Err(PlanError::StructuralUnderflow { line: 1, found: 4 })
        );
        let full = parse_document_with("0,0,000000,0,0,0,0,1,0,0,0,0 \t\n", &strict).unwrap();
        assert!(full.rule(0, 0).is_some());
    }

    #[test]
    fn oversized_delays_clamp_to_32_bit_long() {
        let plan = parse_document("0,0,0,0,99999999999,0,0,1,-99999999999,0,0,0\n").unwrap();
        assert_eq!(plan[0][0].delay, 0x7FFF_FFFF);
        assert_eq!(plan[0][0].cmp_delay, 0x8000_0000);
    }

    #[test]
    fn malformed_fields_read_as_zero() {
        let plan = parse_document("1,x,GG,5,,,,,1,,,\n").unwrap();
        // `x` and `GG` stop both readers without consuming, so every later
        // field also reads as 0.
        let action = plan[1][0];
        assert_eq!(action.color, Rgb::BLACK);
        assert_eq!(action.level, 0);
    }

    #[test]
    fn narrowing_truncates() {
        let plan = parse_document("0,0,0,300,-1,200,-129,1,0,0,0,0\n").unwrap();
        let action = plan[0][0];
        assert_eq!(action.level, 44);
        assert_eq!(action.delay, u32::MAX);
        assert_eq!(action.delta_level, -56);
        assert_eq!(action.delta_delay, 127);
    }

    #[test]
    fn last_definition_wins() {
        let input = "0,0,FF0000,1,0,0,0,1,0,0,0,0\n0,0,00FF00,2,0,0,0,1,0,0,0,0\n";
        let plan = parse_document(input).unwrap();
        assert_eq!(plan[0][0].color, Rgb::new(0, 255, 0));
        assert_eq!(plan[0][0].level, 2);
        assert_eq!(plan[0].len(), 1);
    }

    #[test]
    fn missing_terminator_is_fatal() {
        let result = parse_document("0,0,FF0000,1,0,0,0,1,0,0,0,0");
        assert_eq!(result, Err(PlanError::MissingTerminator { line: 1 }));
    }

    #[test]
    fn parse_plan_reuses_existing_plan() {
        let mut plan = parse_document("5,0,0,0,0,0,0,1,0,0,0,0\n").unwrap();
        parse_plan(
            &mut plan,
            "1,0,0,0,0,0,0,2,0,0,0,0\n",
            &ParseOptions::default(),
        )
        .unwrap();
        assert_eq!(plan.len(), 6);
        assert!(plan.rule(5, 0).is_some());
        assert!(plan.rule(1, 0).is_some());
    }
}
