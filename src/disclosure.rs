// File: ./src/disclosure.rs
// Open/close behaviour of a day's event popover, independent of the
// toolkit drawing it. Each cell owns its state; nothing is shared.
use crate::grid::Grid;
use std::collections::BTreeMap;

/// Popover width used for edge alignment in the browser, in CSS pixels.
pub const POPOVER_WIDTH: f32 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Closed,
    Opening,
    Open,
    Closing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellInput {
    Click,
    HoverEnter,
    HoverLeave,
    Escape,
    AnimationFrame,
    TransitionEnd,
}

/// Rendered size of one child of the popover.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxMetrics {
    pub height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Padding {
    pub top: f32,
    pub bottom: f32,
}

/// Height the popover needs to show all of its children.
pub fn full_height(children: &[BoxMetrics], padding: Padding) -> f32 {
    let content: f32 = children
        .iter()
        .map(|c| c.height + c.margin_top + c.margin_bottom)
        .sum();
    content + padding.top + padding.bottom
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisclosureCell {
    has_events: bool,
    phase: Phase,
    /// Inline height while animating; `None` lets the stylesheet decide.
    height_override: Option<f32>,
    /// Height applied on the next animation frame.
    target_height: Option<f32>,
    aria_expanded: bool,
    aria_hidden: bool,
    links_tab_inert: bool,
    right_aligned: bool,
}

impl DisclosureCell {
    pub fn new(has_events: bool) -> Self {
        Self {
            has_events,
            phase: Phase::Closed,
            height_override: None,
            target_height: None,
            aria_expanded: false,
            aria_hidden: true,
            links_tab_inert: true,
            right_aligned: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Open or on its way there.
    pub fn is_open(&self) -> bool {
        matches!(self.phase, Phase::Opening | Phase::Open)
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.phase, Phase::Opening | Phase::Closing)
    }

    pub fn height_override(&self) -> Option<f32> {
        self.height_override
    }

    pub fn aria_expanded(&self) -> bool {
        self.aria_expanded
    }

    pub fn aria_hidden(&self) -> bool {
        self.aria_hidden
    }

    pub fn links_tab_inert(&self) -> bool {
        self.links_tab_inert
    }

    pub fn right_aligned(&self) -> bool {
        self.right_aligned
    }

    /// `full_height` is the popover's measured height at the time of the
    /// input; only open/close transitions use it.
    pub fn handle(&mut self, input: CellInput, full_height: f32) {
        match input {
            CellInput::Click => self.toggle(full_height),
            CellInput::HoverEnter => self.open(full_height),
            CellInput::HoverLeave | CellInput::Escape => self.close(full_height),
            CellInput::AnimationFrame => self.animation_frame(),
            CellInput::TransitionEnd => self.transition_end(),
        }
    }

    pub fn toggle(&mut self, full_height: f32) {
        if self.is_open() {
            self.close(full_height);
        } else {
            self.open(full_height);
        }
    }

    /// Starts the reveal from zero height.
    pub fn open(&mut self, full_height: f32) {
        if !self.has_events || self.is_open() {
            return;
        }
        self.phase = Phase::Opening;
        self.height_override = Some(0.0);
        self.target_height = Some(full_height);
        self.aria_expanded = true;
        self.aria_hidden = false;
        self.links_tab_inert = false;
    }

    /// Collapses from the current full height.
    pub fn close(&mut self, full_height: f32) {
        if !self.is_open() {
            return;
        }
        self.phase = Phase::Closing;
        self.height_override = Some(full_height);
        self.target_height = Some(0.0);
        self.aria_expanded = false;
        self.aria_hidden = true;
        self.links_tab_inert = true;
    }

    pub fn animation_frame(&mut self) {
        if let Some(h) = self.target_height.take() {
            self.height_override = Some(h);
        }
    }

    pub fn transition_end(&mut self) {
        if self.target_height.is_some() {
            // target height not applied yet
            return;
        }
        self.height_override = None;
        self.phase = match self.phase {
            Phase::Opening => Phase::Open,
            Phase::Closing => Phase::Closed,
            settled => settled,
        };
    }

    /// Flags the popover to open leftwards when it would run past the
    /// viewport's right edge.
    pub fn align(&mut self, anchor_x: f32, viewport_width: f32, popover_width: f32) {
        self.right_aligned = anchor_x + popover_width > viewport_width;
    }
}

/// Disclosure state of every in-month day of a grid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Disclosures {
    cells: BTreeMap<u32, DisclosureCell>,
}

impl Disclosures {
    pub fn from_grid(grid: &Grid) -> Self {
        Self {
            cells: grid
                .cells()
                .filter_map(|c| c.as_day())
                .map(|d| (d.day, DisclosureCell::new(d.has_events())))
                .collect(),
        }
    }

    pub fn get(&self, day: u32) -> Option<&DisclosureCell> {
        self.cells.get(&day)
    }

    pub fn handle(&mut self, day: u32, input: CellInput, full_height: f32) {
        if let Some(cell) = self.cells.get_mut(&day) {
            cell.handle(input, full_height);
        }
    }

    /// Escape closes every open popover.
    pub fn escape(&mut self, full_height: impl Fn(u32) -> f32) {
        for (day, cell) in self.cells.iter_mut() {
            cell.handle(CellInput::Escape, full_height(*day));
        }
    }

    /// Re-runs edge alignment, e.g. after a resize.
    pub fn align_all(
        &mut self,
        anchor_x: impl Fn(u32) -> Option<f32>,
        viewport_width: f32,
        popover_width: f32,
    ) {
        for (day, cell) in self.cells.iter_mut() {
            if let Some(x) = anchor_x(*day) {
                cell.align(x, viewport_width, popover_width);
            }
        }
    }

    /// Advances animations one step: a pending height is applied, then the
    /// following tick ends the transition.
    pub fn tick(&mut self) {
        for cell in self.cells.values_mut() {
            if !cell.is_animating() {
                continue;
            }
            if cell.target_height.is_some() {
                cell.animation_frame();
            } else {
                cell.transition_end();
            }
        }
    }

    pub fn open_days(&self) -> Vec<u32> {
        self.cells
            .iter()
            .filter(|(_, c)| c.is_open())
            .map(|(d, _)| *d)
            .collect()
    }
}
