use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Pad or cut `text` to exactly `width` characters so row hints line up.
pub(crate) fn fit_width(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count > width {
        if width == 0 {
            return String::new();
        }
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    } else {
        let mut padded = text.to_string();
        padded.push_str(&" ".repeat(width - count));
        padded
    }
}

/// The end of `text` that fits in `width` columns with room for a cursor after
/// it, plus the cursor's column offset. Long input scrolls left.
pub(crate) fn input_tail(text: &str, width: u16) -> (String, u16) {
    let width = usize::from(width);
    if width == 0 {
        return (String::new(), 0);
    }
    let count = text.chars().count();
    let keep = count.min(width - 1);
    let tail = text.chars().skip(count - keep).collect();
    (tail, u16::try_from(keep).unwrap_or(u16::MAX))
}

/// Render one of the primary action buttons. Disabled buttons are dimmed.
pub(crate) fn button(label: &str, key: &str, enabled: bool) -> Vec<Span<'static>> {
    let (label_style, key_style) = if enabled {
        (
            Style::default()
                .fg(Color::White)
                .bg(Color::Rgb(0x64, 0x38, 0x43))
                .add_modifier(Modifier::BOLD),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )
    } else {
        (
            Style::default().fg(Color::DarkGray),
            Style::default().fg(Color::DarkGray),
        )
    };
    vec![
        Span::styled(format!(" {label} "), label_style),
        Span::styled(format!(" [{key}]"), key_style),
        Span::raw("   "),
    ]
}
