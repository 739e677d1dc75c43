//! Core data model for LP plans.
//!
//! A `Plan` is a two-level sparse table: pixel index → optional `PixelTable`,
//! and `PixelTable` state index → `Action`. Both levels grow on demand to
//! exactly `index + 1` entries. Pixels that were never referenced stay `None`;
//! state slots created only by growth hold `Action::INVALID`.
//!
//! A plan is built by a single writer (`parse_plan`) before the animation
//! engine reads it with `Plan::slot` / `Plan::rule`.

use crate::config::ParseOptions;
use crate::error::PlanError;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::ops::Index;

// ─── Colors ──────────────────────────────────────────────────────────────

/// 8-bit RGB triple, as sent to the LED strip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Split `0xRRGGBB` into channels. Bits above the low 24 are ignored.
    pub const fn from_u32(rgb: u32) -> Self {
        Self::new(
            ((rgb >> 16) & 0xFF) as u8,
            ((rgb >> 8) & 0xFF) as u8,
            (rgb & 0xFF) as u8,
        )
    }

    pub const fn to_u32(self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Six uppercase hex digits, no prefix (the descriptor's colour syntax).
    pub fn to_hex(self) -> String {
        format!("{:06X}", self.to_u32())
    }
}

// ─── Comparison flags ────────────────────────────────────────────────────

bitflags! {
    /// Conditions the engine evaluates to decide whether to leave a state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct CmpFlags: u8 {
        /// The state's delay has counted down to `cmp_delay`.
        const WAIT = 0x01;
        /// The pixel colour matches the action colour.
        const COLOR = 0x02;
        /// The pixel level has reached `cmp_level`.
        const LEVEL = 0x04;
        /// Never transition.
        const NOP = 0x08;
    }
}

impl CmpFlags {
    /// Sentinel for an unpopulated slot. The engine must never execute it.
    pub const INVALID: Self = Self::empty();

    /// Conditions that move the pixel to `target_pixel` / `target_state`.
    pub const TRANSITIONS: Self = Self::WAIT.union(Self::COLOR).union(Self::LEVEL);
}

// ─── Actions ─────────────────────────────────────────────────────────────

/// One state-transition rule for one pixel in one state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    pub pixel: u8,
    pub state: u8,

    pub color: Rgb,
    /// Brightness as a fraction of 256.
    pub level: u8,
    /// Ticks to remain in this state before re-evaluation.
    pub delay: u32,
    pub delta_level: i8,
    pub delta_delay: i8,

    pub cmp_flags: CmpFlags,
    pub cmp_delay: u32,
    pub cmp_level: u8,

    pub target_pixel: u8,
    pub target_state: u8,
}

impl Action {
    /// Fill value for slots created by growth.
    pub const INVALID: Self = Self {
        pixel: 0,
        state: 0,
        color: Rgb::BLACK,
        level: 0,
        delay: 0,
        delta_level: 0,
        delta_delay: 0,
        cmp_flags: CmpFlags::INVALID,
        cmp_delay: 0,
        cmp_level: 0,
        target_pixel: 0,
        target_state: 0,
    };

    /// Whether the engine may execute this slot.
    pub fn is_valid(&self) -> bool {
        self.cmp_flags != CmpFlags::INVALID
    }

    /// The `(pixel, state)` this action moves to when a transition fires.
    pub fn target(&self) -> (u8, u8) {
        (self.target_pixel, self.target_state)
    }
}

// ─── Per-pixel table ─────────────────────────────────────────────────────

/// State-indexed actions for one pixel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PixelTable {
    actions: Vec<Action>,
}

impl PixelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest state ever written plus one.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Raw slot for `state`, including `INVALID` fill.
    pub fn slot(&self, state: u8) -> Option<&Action> {
        self.actions.get(usize::from(state))
    }

    /// Executable rule for `state`, skipping `INVALID` slots.
    pub fn rule(&self, state: u8) -> Option<&Action> {
        self.slot(state).filter(|action| action.is_valid())
    }

    /// All slots with their state index.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &Action)> {
        // A table never exceeds 256 slots: states are `u8`.
        self.actions
            .iter()
            .enumerate()
            .map(|(state, action)| (state as u8, action))
    }

    /// Write `action` at `state`, growing the table first if needed.
    ///
    /// New slots below `state` are `Action::INVALID`. An existing slot is
    /// overwritten, so the latest definition wins.
    ///
    /// # Errors
    /// `PlanError::Allocation` if the table cannot grow.
    pub fn insert(&mut self, state: u8, action: Action) -> Result<(), PlanError> {
        let index = usize::from(state);
        if index >= self.actions.len() {
            let requested = index + 1;
            self.actions
                .try_reserve_exact(requested - self.actions.len())
                .map_err(|_| PlanError::Allocation {
                    what: "pixel state table",
                    requested,
                })?;
            self.actions.resize(requested, Action::INVALID);
        }
        self.actions[index] = action;
        Ok(())
    }
}

impl Index<u8> for PixelTable {
    type Output = Action;

    fn index(&self, state: u8) -> &Action {
        &self.actions[usize::from(state)]
    }
}

// ─── Plan ────────────────────────────────────────────────────────────────

/// The loaded action table: pixel → state → `Action`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan {
    pixels: Vec<Option<PixelTable>>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest pixel ever referenced plus one.
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// The table for `pixel`, or `None` if that pixel was never referenced.
    pub fn pixel(&self, pixel: u8) -> Option<&PixelTable> {
        self.pixels.get(usize::from(pixel))?.as_ref()
    }

    /// Raw slot at `(pixel, state)`, including `INVALID` fill.
    pub fn slot(&self, pixel: u8, state: u8) -> Option<&Action> {
        self.pixel(pixel)?.slot(state)
    }

    /// Executable rule at `(pixel, state)`.
    pub fn rule(&self, pixel: u8, state: u8) -> Option<&Action> {
        self.pixel(pixel)?.rule(state)
    }

    /// Allocated pixel tables with their pixel index.
    pub fn pixels(&self) -> impl Iterator<Item = (u8, &PixelTable)> {
        self.pixels
            .iter()
            .enumerate()
            .filter_map(|(pixel, table)| table.as_ref().map(|t| (pixel as u8, t)))
    }

    /// Every executable rule, ordered by pixel then state.
    pub fn rules(&self) -> impl Iterator<Item = &Action> {
        self.pixels()
            .flat_map(|(_, table)| table.iter().map(|(_, action)| action))
            .filter(|action| action.is_valid())
    }

    /// Return the table for `pixel`, growing the pixel array to exactly
    /// `pixel + 1` entries and allocating an empty table on first use.
    ///
    /// # Errors
    /// `PlanError::Allocation` if the pixel array cannot grow.
    pub fn pixel_table_mut(&mut self, pixel: u8) -> Result<&mut PixelTable, PlanError> {
        let index = usize::from(pixel);
        if index >= self.pixels.len() {
            let requested = index + 1;
            self.pixels
                .try_reserve_exact(requested - self.pixels.len())
                .map_err(|_| PlanError::Allocation {
                    what: "pixel array",
                    requested,
                })?;
            self.pixels.resize_with(requested, || None);
        }
        Ok(self.pixels[index].get_or_insert_with(PixelTable::new))
    }

    /// Store `action` at its own `(pixel, state)`.
    ///
    /// # Errors
    /// `PlanError::Allocation` if either level cannot grow.
    pub fn insert(&mut self, action: Action) -> Result<(), PlanError> {
        self.pixel_table_mut(action.pixel)?
            .insert(action.state, action)
    }

    /// Release every table. The plan is empty and ready for another load.
    pub fn clear(&mut self) {
        self.pixels = Vec::new();
    }

    /// Replace this plan with one parsed from `input`.
    ///
    /// The new table is built separately and only installed once the whole
    /// buffer has parsed; on error `self` is left as it was.
    ///
    /// # Errors
    /// Any `PlanError` from parsing.
    pub fn reload(&mut self, input: &str, options: &ParseOptions) -> Result<(), PlanError> {
        let mut fresh = Plan::new();
        crate::parser::parse_plan(&mut fresh, input, options)?;
        log::debug!(
            "plan reloaded: {} pixel slots (was {})",
            fresh.len(),
            self.len()
        );
        *self = fresh;
        Ok(())
    }
}

impl Index<u8> for Plan {
    type Output = PixelTable;

    /// Panics if `pixel` is out of range or was never referenced.
    fn index(&self, pixel: u8) -> &PixelTable {
        match self.pixel(pixel) {
            Some(table) => table,
            None => panic!("pixel {pixel} has no table"),
        }
    }
}

/// Release `plan` if there is one. `None` is a no-op.
pub fn free_plan(plan: Option<&mut Plan>) {
    if let Some(plan) = plan {
        plan.clear();
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
