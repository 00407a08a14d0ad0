use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn key_line(key: &'static str, pad: usize, what: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(" ".repeat(pad)),
        Span::raw(what),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("q", Style::default().fg(Color::Magenta)),
            Span::raw(" / "),
            Span::styled("Ctrl-C", Style::default().fg(Color::Magenta)),
            Span::raw("  Quit"),
        ]),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("s", Style::default().fg(Color::Magenta)),
            Span::raw(" / "),
            Span::styled("Enter", Style::default().fg(Color::Magenta)),
            Span::raw("   Submit the workflow"),
        ]),
        key_line("d", 11, "Dismiss the rate-limit notice"),
        key_line("y", 11, "Copy the workflow id to the clipboard"),
        key_line("tab", 9, "Switch tabs"),
        key_line("?", 11, "Show this help"),
        Line::from(""),
        Line::from("Submission steps:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("✓", Style::default().fg(Color::Green)),
            Span::raw(" done   "),
            Span::styled("▶", Style::default().fg(Color::Yellow)),
            Span::raw(" running   "),
            Span::styled("·", Style::default().fg(Color::DarkGray)),
            Span::raw(" pending"),
        ]),
        Line::from(""),
        Line::from("A rate-limited submission keeps its saved workflow; it shows up in"),
        Line::from("`workscan list` as having no analysis."),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
