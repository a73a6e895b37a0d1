//! Diagnosis result panel and failure banner.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Padding, Paragraph, Wrap},
};

use hwdiag_engine::{Confidence, DiagnosticResult, ErrorInfo};

use crate::theme::{Glyphs, Palette, styles};

const CONFIDENCE_BAR_WIDTH: usize = 20;

pub(crate) fn draw_result(
    frame: &mut Frame,
    result: &DiagnosticResult,
    area: Rect,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let block = Block::default()
        .title(Line::from(Span::styled(" Diagnosis Result ", styles::title(palette))))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.bg_border))
        .padding(Padding::horizontal(1))
        .style(Style::default().bg(palette.bg_panel));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .spacing(2)
        .split(inner);

    let left = Paragraph::new(summary_lines(result, palette, glyphs))
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(palette.text_secondary));
    frame.render_widget(left, columns[0]);

    let right = Paragraph::new(detail_lines(result, palette, glyphs))
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(palette.text_secondary));
    frame.render_widget(right, columns[1]);
}

fn heading<'a>(text: &'a str, palette: &Palette) -> Line<'a> {
    Line::from(Span::styled(
        text,
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD),
    ))
}

fn summary_lines<'a>(
    result: &'a DiagnosticResult,
    palette: &Palette,
    glyphs: &Glyphs,
) -> Vec<Line<'a>> {
    let severity = result.severity();
    let mut lines = vec![
        Line::from(Span::styled(result.diagnosis_name(), styles::title(palette))),
        Line::from(vec![
            Span::styled("Severity   ", styles::key_hint(palette)),
            Span::styled(
                severity.display_name(),
                Style::default()
                    .fg(palette.severity(severity))
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Confidence ", styles::key_hint(palette)),
            Span::styled(
                confidence_bar(result.confidence(), glyphs),
                Style::default().fg(palette.node_active),
            ),
            Span::raw(format!(" {:.1}%", result.confidence().percent())),
        ]),
        Line::from(vec![
            Span::styled("Est. cost  ", styles::key_hint(palette)),
            Span::raw(result.estimated_cost()),
        ]),
    ];

    if !result.symptoms().is_empty() {
        lines.push(Line::from(""));
        lines.push(heading("Detected Symptoms", palette));
        for symptom in result.symptoms() {
            let mark = if symptom.detected {
                glyphs.check
            } else {
                glyphs.bullet
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{mark} "), Style::default().fg(palette.accent)),
                Span::raw(symptom.id.as_str()),
            ]));
        }
    }
    lines
}

fn detail_lines<'a>(
    result: &'a DiagnosticResult,
    palette: &Palette,
    glyphs: &Glyphs,
) -> Vec<Line<'a>> {
    let mut lines = Vec::new();
    if !result.reasoning().is_empty() {
        lines.push(heading("Reasoning", palette));
        for step in result.reasoning() {
            lines.push(Line::from(vec![
                Span::styled(format!("{}. ", step.step()), styles::key_hint(palette)),
                Span::styled(step.rule(), Style::default().fg(palette.edge_end)),
                Span::styled(
                    format!(" ({:.1}%)", step.certainty().percent()),
                    styles::key_hint(palette),
                ),
            ]));
            lines.push(Line::from(format!("   {}", step.conclusion())));
        }
        lines.push(Line::from(""));
    }

    lines.push(heading("Repair Steps", palette));
    for (i, step) in result.repair_steps().iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!("{} {}. ", glyphs.arrow, i + 1), Style::default().fg(palette.green)),
            Span::raw(step.as_str()),
        ]));
    }
    lines
}

pub(crate) fn confidence_bar(confidence: Confidence, glyphs: &Glyphs) -> String {
    let filled = (confidence.value() * CONFIDENCE_BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(CONFIDENCE_BAR_WIDTH);
    format!(
        "{}{}",
        glyphs.bar_full.repeat(filled),
        glyphs.bar_empty.repeat(CONFIDENCE_BAR_WIDTH - filled)
    )
}

pub(crate) fn draw_failure(
    frame: &mut Frame,
    error: &ErrorInfo,
    area: Rect,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let block = Block::default()
        .title(Line::from(Span::styled(
            format!(" {} {} ", glyphs.cross, error.headline()),
            Style::default().fg(palette.red).add_modifier(Modifier::BOLD),
        )))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.red))
        .padding(Padding::horizontal(1))
        .style(Style::default().bg(palette.bg_panel));

    let lines = vec![
        Line::from(Span::styled(
            "The diagnosis engine could not complete the analysis.",
            Style::default().fg(palette.text_primary),
        )),
        Line::from(Span::styled(error.detail(), styles::key_hint(palette))),
        Line::from(""),
        Line::from(vec![
            Span::styled("Esc", styles::key_highlight(palette)),
            Span::styled(" dismiss  ", styles::key_hint(palette)),
            Span::styled("Enter", styles::key_highlight(palette)),
            Span::styled(" retry", styles::key_hint(palette)),
        ]),
    ];
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}
