use crate::calendar::Calendar;
use crate::disclosure::{BoxMetrics, CellInput, Disclosures, Padding, full_height};
use crate::grid::Grid;
use crate::model::{CalendarRequest, DayEventEntry};
use ratatui::layout::Rect;

/// Width of a day's popover, in columns.
pub const POPOVER_COLUMNS: u16 = 32;

pub struct AppState {
    pub request: CalendarRequest,
    pub calendar: Option<Calendar>,
    pub grid: Option<Grid>,
    pub disclosures: Disclosures,
    pub selected_day: u32,
    pub hovered_day: Option<u32>,
    /// Screen area of each day cell, refreshed on every draw.
    pub cell_areas: Vec<(u32, Rect)>,
    pub viewport_width: u16,
    pub message: String,
    pub loading: bool,
}

impl AppState {
    pub fn new(request: CalendarRequest) -> Self {
        Self {
            request,
            calendar: None,
            grid: None,
            disclosures: Disclosures::default(),
            selected_day: 1,
            hovered_day: None,
            cell_areas: vec![],
            viewport_width: 0,
            message: "←↓↑→: Day | Enter: Events | n/p: Month | q: Quit".to_string(),
            loading: true,
        }
    }

    pub fn set_calendar(&mut self, calendar: Calendar) {
        let grid = calendar.grid();
        self.disclosures = Disclosures::from_grid(&grid);
        self.request = calendar.request;
        self.selected_day = self.selected_day.clamp(1, calendar.meta.days_in_month);
        self.hovered_day = None;
        self.grid = Some(grid);
        self.calendar = Some(calendar);
        self.loading = false;
    }

    pub fn days_in_month(&self) -> u32 {
        self.calendar
            .as_ref()
            .map(|c| c.meta.days_in_month)
            .unwrap_or(1)
    }

    pub fn events_for(&self, day: u32) -> &[DayEventEntry] {
        self.grid
            .as_ref()
            .and_then(|g| g.day(day))
            .map(|d| d.events.as_slice())
            .unwrap_or(&[])
    }

    /// One line per event inside a bordered box.
    pub fn full_height(&self, day: u32) -> f32 {
        let lines: Vec<BoxMetrics> = self
            .events_for(day)
            .iter()
            .map(|_| BoxMetrics {
                height: 1.0,
                ..BoxMetrics::default()
            })
            .collect();
        full_height(
            &lines,
            Padding {
                top: 1.0,
                bottom: 1.0,
            },
        )
    }

    pub fn move_selection(&mut self, delta: i64) {
        let days = i64::from(self.days_in_month());
        let next = (i64::from(self.selected_day) + delta).clamp(1, days);
        self.selected_day = next as u32;
    }

    pub fn toggle_selected(&mut self) {
        let height = self.full_height(self.selected_day);
        self.disclosures
            .handle(self.selected_day, CellInput::Click, height);
    }

    pub fn escape(&mut self) {
        let heights: Vec<(u32, f32)> = self
            .disclosures
            .open_days()
            .into_iter()
            .map(|d| (d, self.full_height(d)))
            .collect();
        self.disclosures.escape(|day| {
            heights
                .iter()
                .find(|(d, _)| *d == day)
                .map(|(_, h)| *h)
                .unwrap_or(0.0)
        });
    }

    fn day_at(&self, column: u16, row: u16) -> Option<u32> {
        self.cell_areas
            .iter()
            .find(|(_, r)| {
                column >= r.x && column < r.x + r.width && row >= r.y && row < r.y + r.height
            })
            .map(|(day, _)| *day)
    }

    /// Mouse movement: leaving a cell closes it, entering one opens it.
    pub fn hover_at(&mut self, column: u16, row: u16) {
        let day = self.day_at(column, row);
        if day == self.hovered_day {
            return;
        }
        if let Some(old) = self.hovered_day {
            let height = self.full_height(old);
            self.disclosures.handle(old, CellInput::HoverLeave, height);
        }
        if let Some(new) = day {
            let height = self.full_height(new);
            self.disclosures.handle(new, CellInput::HoverEnter, height);
        }
        self.hovered_day = day;
    }

    pub fn click_at(&mut self, column: u16, row: u16) {
        if let Some(day) = self.day_at(column, row) {
            self.selected_day = day;
            self.toggle_selected();
        }
    }

    /// Flips popovers that would run off the right edge.
    pub fn realign(&mut self) {
        let areas = self.cell_areas.clone();
        self.disclosures.align_all(
            |day| {
                areas
                    .iter()
                    .find(|(d, _)| *d == day)
                    .map(|(_, r)| f32::from(r.x))
            },
            f32::from(self.viewport_width),
            f32::from(POPOVER_COLUMNS),
        );
    }

    pub fn tick(&mut self) {
        self.disclosures.tick();
    }
}
