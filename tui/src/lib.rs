//! TUI rendering for hwdiag using ratatui.

mod input;
mod network;
mod results;
mod theme;

pub use input::{InputPump, apply_event, handle_events};
pub use network::{NetworkFrame, canvas_size, label_row};
pub use theme::{Glyphs, Palette, glyphs, mix, palette, spinner_frame, styles};

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Padding, Paragraph, Wrap},
};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use hwdiag_engine::{App, DraftInput, ENGINE_INFO, Phase, visualization::LAYER_LABELS};

const TITLE: &str = "Hardware Diagnosis";
const SUBTITLE: &str = "Neuro-Symbolic Engine";
const BADGE_PROCESSING: &str = "Processing...";
const BADGE_COMPLETE: &str = "Analysis Complete";
const INPUT_PLACEHOLDER: &str =
    "Describe the symptoms, e.g. \"three beeps on startup and no display\"";

/// Screen regions for one frame.
#[derive(Debug, Clone, Copy)]
pub struct Areas {
    pub header: Rect,
    pub input: Rect,
    pub network: Rect,
    pub details: Rect,
    pub status: Rect,
}

#[must_use]
pub fn layout(area: Rect) -> Areas {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1),      // Header
            Constraint::Percentage(45), // Input + network
            Constraint::Min(6),         // Result / failure
            Constraint::Length(1),      // Status bar
        ])
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[1]);

    Areas {
        header: rows[0],
        input: top[0],
        network: top[1],
        details: rows[2],
        status: rows[3],
    }
}

/// Canvas area inside the network panel: borders, label row and footer removed.
#[must_use]
pub fn network_canvas_area(network: Rect) -> Rect {
    let inner = network_block(Phase::Idle, &palette(Default::default())).inner(network);
    Rect {
        height: inner.height.saturating_sub(2),
        ..inner
    }
}

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
    let options = app.ui_options();
    let palette = palette(options);
    let glyphs = glyphs(options);

    let bg_block = Block::default().style(Style::default().bg(palette.bg_dark));
    frame.render_widget(bg_block, frame.area());

    let areas = layout(frame.area());
    draw_header(frame, areas.header, &palette);
    draw_input(frame, app, areas.input, &palette, &glyphs);
    draw_network(frame, app, areas.network, &palette, &glyphs);
    draw_details(frame, app, areas.details, &palette, &glyphs);
    draw_status_bar(frame, app, areas.status, &palette);
}

fn draw_header(frame: &mut Frame, area: Rect, palette: &Palette) {
    let line = Line::from(vec![
        Span::styled(TITLE, styles::title(palette)),
        Span::styled(format!("  {SUBTITLE}"), styles::key_hint(palette)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_input(frame: &mut Frame, app: &App, area: Rect, palette: &Palette, glyphs: &Glyphs) {
    let processing = app.phase().is_processing();
    let border = if processing {
        palette.bg_border
    } else {
        palette.accent
    };
    let block = Block::default()
        .title(Line::from(Span::styled(" Describe the problem ", styles::title(palette))))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border))
        .padding(Padding::horizontal(1))
        .style(Style::default().bg(palette.bg_panel));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let draft = app.draft();
    let text = if draft.text().is_empty() && !processing {
        let mut lines = vec![Line::from(Span::styled(
            INPUT_PLACEHOLDER,
            styles::key_hint(palette),
        ))];
        lines[0].spans.insert(0, cursor_span(" ", palette));
        lines
    } else {
        draft_lines(draft, !processing, palette)
    };
    frame.render_widget(
        Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .style(Style::default().fg(palette.text_primary)),
        rows[0],
    );

    let footer = match app.processing_stage() {
        Some(stage) => Line::from(vec![
            Span::styled(
                format!("{} ", spinner_frame(app.frame_count(), app.ui_options())),
                Style::default().fg(palette.accent),
            ),
            Span::styled(stage, Style::default().fg(palette.text_secondary)),
        ]),
        None => Line::from(vec![
            Span::styled("Enter", styles::key_highlight(palette)),
            Span::styled(" analyze", styles::key_hint(palette)),
            Span::styled(format!(" {} ", glyphs.bullet), styles::key_hint(palette)),
            Span::styled("Shift+Enter", styles::key_highlight(palette)),
            Span::styled(" newline", styles::key_hint(palette)),
        ]),
    };
    frame.render_widget(Paragraph::new(footer), rows[1]);
}

fn cursor_span<'a>(text: &'a str, palette: &Palette) -> Span<'a> {
    Span::styled(
        text,
        Style::default()
            .fg(palette.bg_dark)
            .bg(palette.text_primary),
    )
}

/// Split the draft into display lines with a block cursor at the cursor position.
fn draft_lines<'a>(draft: &'a DraftInput, show_cursor: bool, palette: &Palette) -> Vec<Line<'a>> {
    let text = draft.text();
    let (before, after) = text.split_at(draft.byte_index());

    let mut lines: Vec<Line<'a>> = vec![Line::default()];
    for (i, segment) in before.split('\n').enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }
        if !segment.is_empty()
            && let Some(line) = lines.last_mut()
        {
            line.spans.push(Span::raw(segment));
        }
    }

    let mut rest = after;
    if show_cursor {
        let under = after.graphemes(true).next().filter(|g| *g != "\n");
        let cell = under.unwrap_or(" ");
        if let Some(line) = lines.last_mut() {
            line.spans.push(cursor_span(cell, palette));
        }
        rest = &after[under.map_or(0, str::len)..];
    }

    for (i, segment) in rest.split('\n').enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }
        if !segment.is_empty()
            && let Some(line) = lines.last_mut()
        {
            line.spans.push(Span::raw(segment));
        }
    }
    lines
}

fn network_block<'a>(phase: Phase, palette: &Palette) -> Block<'a> {
    let badge = match phase {
        Phase::Processing => Some(BADGE_PROCESSING),
        Phase::Succeeded => Some(BADGE_COMPLETE),
        Phase::Idle | Phase::Failed => None,
    };
    let mut block = Block::default()
        .title(Line::from(Span::styled(
            " Neural-Symbolic Network ",
            styles::title(palette),
        )))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.bg_border))
        .style(Style::default().bg(palette.bg_dark));
    if let Some(badge) = badge {
        block = block.title(
            Line::from(Span::styled(format!(" {badge} "), styles::badge(palette))).right_aligned(),
        );
    }
    block
}

fn draw_network(frame: &mut Frame, app: &mut App, area: Rect, palette: &Palette, glyphs: &Glyphs) {
    let block = network_block(app.phase(), palette);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Canvas
            Constraint::Length(1), // Layer labels
            Constraint::Length(1), // Engine info
        ])
        .split(inner);

    let size = canvas_size(rows[0]);
    let visualization = app.visualization_mut();
    visualization.resize(size);
    let mut net = NetworkFrame::new(size, *palette).with_marker(glyphs.marker);
    visualization.render(&mut net);
    if !net.is_empty() {
        net.render(frame, rows[0]);
    }

    frame.render_widget(
        Paragraph::new(label_row(&LAYER_LABELS, rows[1].width))
            .style(Style::default().fg(palette.text_muted)),
        rows[1],
    );

    let mut info = Vec::new();
    for (i, (layer, engine)) in ENGINE_INFO.iter().enumerate() {
        if i > 0 {
            info.push(Span::styled("   ", styles::key_hint(palette)));
        }
        info.push(Span::styled(
            format!("{layer}: "),
            Style::default()
                .fg(palette.text_secondary)
                .add_modifier(Modifier::BOLD),
        ));
        info.push(Span::styled(*engine, styles::key_hint(palette)));
    }
    frame.render_widget(
        Paragraph::new(Line::from(info)).alignment(Alignment::Center),
        rows[2],
    );
}

fn draw_details(frame: &mut Frame, app: &App, area: Rect, palette: &Palette, glyphs: &Glyphs) {
    if let Some(error) = app.error() {
        results::draw_failure(frame, error, area, palette, glyphs);
        return;
    }
    if let Some(result) = app.result() {
        results::draw_result(frame, result, area, palette, glyphs);
        return;
    }

    let message = if app.phase().is_processing() {
        "Analyzing symptoms..."
    } else {
        "Results will appear here once the analysis completes."
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.bg_border))
        .style(Style::default().bg(palette.bg_panel));
    frame.render_widget(
        Paragraph::new(Span::styled(message, styles::key_hint(palette)))
            .alignment(Alignment::Center)
            .block(block),
        area,
    );
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let hints = [
        ("Enter", "submit"),
        ("Esc", "dismiss"),
        ("Ctrl+U", "clear"),
        ("Ctrl+C", "quit"),
    ];
    let mut spans = Vec::new();
    for (key, action) in hints {
        spans.push(Span::styled(key, styles::key_highlight(palette)));
        spans.push(Span::styled(format!(" {action}  "), styles::key_hint(palette)));
    }

    let right = if app.endpoint_url().is_empty() {
        app.phase().to_string()
    } else {
        format!("{} {}", app.phase(), app.endpoint_url())
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(right.width() as u16)])
        .split(area);
    frame.render_widget(Paragraph::new(Line::from(spans)), columns[0]);
    frame.render_widget(
        Paragraph::new(Span::styled(right, styles::key_hint(palette))).alignment(Alignment::Right),
        columns[1],
    );
}

#[cfg(test)]
mod tests {
    use hwdiag_engine::DraftInput;

    use super::draft_lines;
    use crate::theme::Palette;

    fn rendered(lines: &[ratatui::text::Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn draft_lines_places_cursor_block() {
        let mut draft = DraftInput::default();
        draft.set_text("beep\nno display");
        let palette = Palette::standard();

        assert_eq!(
            rendered(&draft_lines(&draft, true, &palette)),
            vec!["beep", "no display "]
        );

        draft.move_cursor_home();
        let lines = draft_lines(&draft, true, &palette);
        assert_eq!(rendered(&lines), vec!["beep", "no display"]);
        assert_eq!(lines[0].spans[0].content, "b");
    }

    #[test]
    fn draft_lines_without_cursor() {
        let mut draft = DraftInput::default();
        draft.set_text("fan\n");
        let palette = Palette::standard();
        assert_eq!(
            rendered(&draft_lines(&draft, false, &palette)),
            vec!["fan", ""]
        );
    }
}
