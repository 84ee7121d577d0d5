use crate::grid::{Cell, WEEKDAY_LABELS};
use crate::tui::state::{AppState, POPOVER_COLUMNS};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph},
};

pub fn draw(f: &mut Frame, state: &mut AppState) {
    let v_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    // --- Header ---
    let title = if state.loading {
        format!(
            " {} {} (Loading...) ",
            state.request.month_name(),
            state.request.year()
        )
    } else {
        format!(
            " {} {} Events ",
            state.request.month_name(),
            state.request.year()
        )
    };
    let header = Paragraph::new(title)
        .alignment(Alignment::Center)
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, v_chunks[0]);

    // --- Month Grid ---
    state.cell_areas.clear();
    if let Some(grid) = &state.grid {
        let weeks = grid.weeks.len() as u32;
        let mut row_constraints = vec![Constraint::Length(1)];
        row_constraints.extend((0..weeks).map(|_| Constraint::Ratio(1, weeks)));
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(row_constraints)
            .split(v_chunks[1]);

        let label_cols = columns(rows[0]);
        for (label, area) in WEEKDAY_LABELS.iter().zip(label_cols.iter()) {
            let p = Paragraph::new(*label)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Cyan));
            f.render_widget(p, *area);
        }

        for (week, row_area) in grid.weeks.iter().zip(rows.iter().skip(1)) {
            for (cell, area) in week.iter().zip(columns(*row_area).iter()) {
                let Cell::Day(day) = cell else {
                    let empty = Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::DarkGray));
                    f.render_widget(empty, *area);
                    continue;
                };

                let border = if day.day == state.selected_day {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                };
                let mut lines = vec![];
                if day.has_events() {
                    lines.push(Line::from(day.weekday_name));
                    let count = day.events.len();
                    lines.push(Line::styled(
                        format!("• {} event{}", count, if count == 1 { "" } else { "s" }),
                        Style::default().fg(Color::Green),
                    ));
                }
                let block = Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} ", day.day))
                    .border_style(border);
                f.render_widget(Paragraph::new(lines).block(block), *area);
                state.cell_areas.push((day.day, *area));
            }
        }
    }

    // --- Popovers ---
    let frame_area = f.area();
    for day in state.disclosures.open_days().into_iter().chain(animating_closed(state)) {
        let Some(cell) = state.disclosures.get(day) else {
            continue;
        };
        let Some(anchor) = state
            .cell_areas
            .iter()
            .find(|(d, _)| *d == day)
            .map(|(_, r)| *r)
        else {
            continue;
        };

        let height = cell
            .height_override()
            .unwrap_or_else(|| state.full_height(day))
            .round() as u16;
        if height == 0 {
            continue;
        }
        let width = POPOVER_COLUMNS.min(frame_area.width);
        let x = if cell.right_aligned() {
            (anchor.x + anchor.width).saturating_sub(width)
        } else {
            anchor.x
        };
        let y = anchor.y + 1;
        let height = height.min(frame_area.height.saturating_sub(y));
        let area = Rect::new(x, y, width.min(frame_area.width.saturating_sub(x)), height);

        let lines: Vec<Line> = state
            .events_for(day)
            .iter()
            .map(|e| {
                if e.title_language.is_empty() {
                    Line::from(e.title.clone())
                } else {
                    Line::from(format!("{} [{}]", e.title, e.title_language))
                }
            })
            .collect();
        let popover = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        );
        f.render_widget(Clear, area);
        f.render_widget(popover, area);
    }

    // --- Footer ---
    let f_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(v_chunks[2]);
    let status = Paragraph::new(state.message.clone())
        .style(Style::default().fg(Color::Cyan))
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::TOP | Borders::BOTTOM)
                .title(" Status "),
        );
    let help_text = "Enter:Open | Esc:Close | n/p:Month | t:Today | q:Quit";
    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::TOP | Borders::BOTTOM)
                .title(" Actions "),
        );
    f.render_widget(status, f_chunks[0]);
    f.render_widget(help, f_chunks[1]);
}

fn columns(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 7); 7])
        .split(area)
}

/// Days still collapsing, drawn until their transition ends.
fn animating_closed(state: &AppState) -> Vec<u32> {
    state
        .cell_areas
        .iter()
        .map(|(d, _)| *d)
        .filter(|d| {
            state
                .disclosures
                .get(*d)
                .is_some_and(|c| c.is_animating() && !c.is_open())
        })
        .collect()
}
