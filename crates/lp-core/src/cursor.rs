//! Bounded read cursor and scalar field readers for the LP descriptor format.
//!
//! Every reader consumes one value plus the run of `,` separators after it.
//! Readers are lenient: a field with no valid digits reads as `0` and leaves
//! the cursor where it was (apart from the separator run). Readers never
//! consume a newline; only `skip_line` crosses line boundaries.

use crate::error::PlanError;
use crate::model::Rgb;
use winnow::ascii::space0;
use winnow::combinator::{alt, opt, peek, terminated};
use winnow::prelude::*;
use winnow::token::{one_of, take_while};

/// Separator between fields. Runs of it collapse into one.
pub const FIELD_SEPARATOR: char = ',';

/// A position inside a validated descriptor buffer.
///
/// The buffer is known to be newline-terminated, so `skip_line` always finds
/// a `\n` before the logical end.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    input: &'a str,
    rest: &'a str,
    line: usize,
}

impl<'a> Cursor<'a> {
    /// Accept a descriptor buffer.
    ///
    /// The logical end is the first NUL character, or the end of `buffer`.
    ///
    /// # Errors
    /// `PlanError::MissingTerminator` if the logical input is non-empty and
    /// does not end with `\n`.
    pub fn new(buffer: &'a str) -> Result<Self, PlanError> {
        let input = match buffer.find('\0') {
            Some(end) => &buffer[..end],
            None => buffer,
        };
        if !input.is_empty() && !input.ends_with('\n') {
            return Err(PlanError::MissingTerminator {
                line: input.matches('\n').count() + 1,
            });
        }
        Ok(Self {
            input,
            rest: input,
            line: 1,
        })
    }

    pub fn is_at_end(&self) -> bool {
        self.rest.is_empty()
    }

    /// True at end of input or when only spaces and tabs stand before the
    /// `\n` / `\r\n` terminator.
    pub fn is_at_line_end(&self) -> bool {
        let rest = self.rest.trim_start_matches([' ', '\t']);
        rest.is_empty() || rest.starts_with('\n') || rest.starts_with("\r\n")
    }

    /// True when nothing but whitespace remains before the next newline.
    pub fn is_blank_line(&self) -> bool {
        let line = self.rest.split('\n').next().unwrap_or_default();
        line.chars().all(char::is_whitespace)
    }

    pub fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    /// Unconsumed input.
    pub fn remaining(&self) -> &'a str {
        self.rest
    }

    /// Byte offset into the logical input.
    pub fn offset(&self) -> usize {
        self.input.len() - self.rest.len()
    }

    /// 1-based line of the cursor.
    pub fn line(&self) -> usize {
        self.line
    }

    /// 1-based column (in bytes) of the cursor.
    pub fn column(&self) -> usize {
        let consumed = &self.input[..self.offset()];
        consumed.len() - consumed.rfind('\n').map_or(0, |nl| nl + 1) + 1
    }

    /// Read a base-10 signed integer field.
    ///
    /// Leading spaces or tabs and a sign are accepted. Values clamp to the
    /// 32-bit range of the engine's `long`.
    pub fn read_long(&mut self) -> i64 {
        let value = self.lenient(decimal);
        self.skip_separators();
        value
    }

    /// Read a hexadecimal `RRGGBB` colour field (no `#`, optional `0x`).
    pub fn read_rgb(&mut self) -> Rgb {
        // Narrowed like a C `int` before the channels are masked out.
        let value = self.lenient(hexadecimal) as u32;
        self.skip_separators();
        Rgb::from_u32(value)
    }

    /// Advance to just after the next `\n`.
    ///
    /// # Errors
    /// `PlanError::MissingTerminator` if no newline remains. The cursor is
    /// left unmoved in that case.
    pub fn skip_line(&mut self) -> Result<(), PlanError> {
        match self.rest.find('\n') {
            Some(nl) => {
                self.rest = &self.rest[nl + 1..];
                self.line += 1;
                Ok(())
            }
            None => Err(PlanError::MissingTerminator { line: self.line }),
        }
    }

    /// Run `parser` on the remainder, restoring the cursor and yielding `0`
    /// when it finds no digits.
    fn lenient(&mut self, mut parser: impl FnMut(&mut &'a str) -> ModalResult<i64>) -> i64 {
        let checkpoint = self.rest;
        match parser(&mut self.rest) {
            Ok(value) => value,
            Err(_) => {
                self.rest = checkpoint;
                0
            }
        }
    }

    fn skip_separators(&mut self) {
        let _: ModalResult<&str> = take_while(0.., FIELD_SEPARATOR).parse_next(&mut self.rest);
    }
}

// ─── Low-level parsers ──────────────────────────────────────────────────

fn decimal(input: &mut &str) -> ModalResult<i64> {
    (
        space0,
        opt(one_of(['+', '-'])),
        take_while(1.., |c: char| c.is_ascii_digit()),
    )
        .map(|(_, sign, digits): (&str, Option<char>, &str)| signed(sign, digits, 10))
        .parse_next(input)
}

fn hexadecimal(input: &mut &str) -> ModalResult<i64> {
    (
        space0,
        opt(one_of(['+', '-'])),
        opt(hex_prefix),
        take_while(1.., |c: char| c.is_ascii_hexdigit()),
    )
        .map(|(_, sign, _, digits): (&str, Option<char>, Option<&str>, &str)| {
            signed(sign, digits, 16)
        })
        .parse_next(input)
}

/// `0x` only counts as a prefix when a hex digit follows it; `0xZ` reads as `0`.
fn hex_prefix<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    terminated(
        alt(("0x", "0X")),
        peek(one_of(|c: char| c.is_ascii_hexdigit())),
    )
    .parse_next(input)
}

fn signed(sign: Option<char>, digits: &str, radix: u32) -> i64 {
    let magnitude = digits
        .chars()
        .filter_map(|c| c.to_digit(radix))
        .fold(0i64, |acc, d| {
            acc.saturating_mul(i64::from(radix))
                .saturating_add(i64::from(d))
        });
    let value = if sign == Some('-') {
        -magnitude
    } else {
        magnitude
    };
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX))
}

// ─── Tests ────────────────────────────────────────────────────────────────
