//! Text wrapping for styled ratatui Lines.
//!
//! Widths are measured in terminal cells, so CJK text wraps at half the
//! character count of ASCII text.

use ratatui::style::Style;
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

/// Wrap each line to fit within `width` cells, preserving span styles.
pub fn wrap_lines(lines: Vec<Line<'static>>, width: usize) -> Vec<Line<'static>> {
    if width == 0 {
        return lines;
    }

    lines
        .into_iter()
        .flat_map(|line| wrap_line(line, width))
        .collect()
}

/// Wrap a single Line. Returns one or more Lines with preserved styling.
fn wrap_line(line: Line<'static>, width: usize) -> Vec<Line<'static>> {
    if line.width() <= width {
        return vec![line];
    }

    let styled: Vec<(char, Style)> = line
        .spans
        .iter()
        .flat_map(|span| span.content.chars().map(move |ch| (ch, span.style)))
        .collect();
    let plain: String = styled.iter().map(|(ch, _)| ch).collect();

    let mut result = Vec::new();
    let mut cursor = 0;

    for row in textwrap::wrap(&plain, width) {
        // textwrap drops the whitespace it breaks on
        while cursor < styled.len() {
            let (ch, _) = styled[cursor];
            if ch.is_whitespace() && !row.starts_with(ch) {
                cursor += 1;
            } else {
                break;
            }
        }

        let mut spans: Vec<Span<'static>> = Vec::new();
        let mut run = String::new();
        let mut run_style: Option<Style> = None;

        for expected in row.chars() {
            let Some(&(ch, style)) = styled.get(cursor) else {
                run.push(expected);
                continue;
            };
            cursor += 1;

            if let Some(current) = run_style.filter(|current| *current != style) {
                spans.push(Span::styled(std::mem::take(&mut run), current));
            }
            run_style = Some(style);
            run.push(ch);
        }

        if !run.is_empty() {
            spans.push(Span::styled(run, run_style.unwrap_or_default()));
        }
        if !spans.is_empty() {
            result.push(Line::from(spans));
        }
    }

    if result.is_empty() {
        result.push(Line::from(""));
    }

    result
}

/// Display width of a string in terminal cells.
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;

    fn text_of(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_wrap_line_short() {
        let wrapped = wrap_line(Line::from("Short"), 20);
        assert_eq!(wrapped.len(), 1);
    }

    #[test]
    fn test_wrap_line_preserves_style() {
        let line = Line::from(vec![
            Span::styled("Hello ", Style::default().fg(Color::Red)),
            Span::styled("world", Style::default().fg(Color::Blue)),
        ]);
        let wrapped = wrap_line(line, 100);
        assert_eq!(wrapped.len(), 1);
        assert_eq!(wrapped[0].spans.len(), 2);
    }

    #[test]
    fn test_wrap_ascii_words() {
        let wrapped = wrap_lines(vec![Line::from("one two three four five")], 9);
        assert!(wrapped.len() > 1);
        for line in &wrapped {
            assert!(line.width() <= 9);
        }
    }

    #[test]
    fn test_wrap_japanese_by_cell_width() {
        let text = "あいうえおかきくけこ";
        let wrapped = wrap_lines(vec![Line::from(text)], 6);

        assert!(wrapped.len() >= 4);
        for line in &wrapped {
            assert!(line.width() <= 6, "row too wide: {}", text_of(line));
        }
        let rejoined: String = wrapped.iter().map(text_of).collect();
        assert_eq!(rejoined, text);
    }

    #[test]
    fn test_wrap_styles_follow_characters() {
        let line = Line::from(vec![
            Span::styled("ああああ", Style::default().fg(Color::Red)),
            Span::styled("いいいい", Style::default().fg(Color::Blue)),
        ]);
        let wrapped = wrap_line(line, 8);
        assert!(wrapped.len() >= 2);

        let first = wrapped.first().unwrap();
        let last = wrapped.last().unwrap();
        assert_eq!(first.spans[0].style.fg, Some(Color::Red));
        assert_eq!(last.spans[last.spans.len() - 1].style.fg, Some(Color::Blue));
    }

    #[test]
    fn test_wrap_zero_width_is_passthrough() {
        let lines = vec![Line::from("anything at all")];
        assert_eq!(wrap_lines(lines, 0).len(), 1);
    }

    #[test]
    fn test_display_width() {
        assert_eq!(display_width("hello"), 5);
        assert_eq!(display_width("こんにちは"), 10);
    }
}
