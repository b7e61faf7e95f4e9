use crossterm::{
    cursor::{MoveTo, MoveToPreviousLine},
    queue,
    style::{Attribute, Color as CColor, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use std::io::{self, Write};

/// Writes themed lines to a terminal stream. Nothing is cached: each call
/// emits the text followed by a style reset.
#[derive(Debug)]
pub(crate) struct Screen<W: Write> {
    out: W,
    transient_visible: bool,
}

impl<W: Write> Screen<W> {
    pub(crate) fn new(out: W) -> Self {
        Self {
            out,
            transient_visible: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn get_ref(&self) -> &W {
        &self.out
    }

    pub(crate) fn write_lines(&mut self, lines: &[Line<'_>]) -> io::Result<()> {
        self.clear_transient()?;
        for line in lines {
            self.queue_line(line)?;
            queue!(self.out, Print("\n"))?;
        }
        self.out.flush()
    }

    /// Replaces the current transient line, if any, with `line`.
    pub(crate) fn show_transient(&mut self, line: &Line<'_>) -> io::Result<()> {
        queue!(self.out, Print("\r"), Clear(ClearType::CurrentLine))?;
        self.queue_line(line)?;
        self.transient_visible = true;
        self.out.flush()
    }

    pub(crate) fn clear_transient(&mut self) -> io::Result<()> {
        if !self.transient_visible {
            return Ok(());
        }
        self.transient_visible = false;
        queue!(self.out, Print("\r"), Clear(ClearType::CurrentLine))?;
        self.out.flush()
    }

    /// Removes the line the line editor just echoed, so the input can be
    /// redrawn with its timestamp.
    pub(crate) fn erase_previous_line(&mut self) -> io::Result<()> {
        queue!(self.out, MoveToPreviousLine(1), Clear(ClearType::CurrentLine))?;
        self.out.flush()
    }

    pub(crate) fn clear(&mut self) -> io::Result<()> {
        self.transient_visible = false;
        queue!(self.out, Clear(ClearType::All), Clear(ClearType::Purge), MoveTo(0, 0))?;
        self.out.flush()
    }

    fn queue_line(&mut self, line: &Line<'_>) -> io::Result<()> {
        for span in &line.spans {
            let style = line.style.patch(span.style);
            let styled = style != Style::default();
            if styled {
                self.queue_style(style)?;
            }
            queue!(self.out, Print(span.content.as_ref()))?;
            if styled {
                queue!(self.out, SetAttribute(Attribute::Reset), ResetColor)?;
            }
        }
        Ok(())
    }

    fn queue_style(&mut self, style: Style) -> io::Result<()> {
        if let Some(fg) = style.fg.map(to_crossterm_color) {
            queue!(self.out, SetForegroundColor(fg))?;
        }
        if let Some(bg) = style.bg.map(to_crossterm_color) {
            queue!(self.out, SetBackgroundColor(bg))?;
        }
        for attribute in attributes(style.add_modifier) {
            queue!(self.out, SetAttribute(attribute))?;
        }
        Ok(())
    }
}

fn attributes(modifier: Modifier) -> Vec<Attribute> {
    [
        (Modifier::BOLD, Attribute::Bold),
        (Modifier::DIM, Attribute::Dim),
        (Modifier::ITALIC, Attribute::Italic),
        (Modifier::UNDERLINED, Attribute::Underlined),
        (Modifier::SLOW_BLINK, Attribute::SlowBlink),
        (Modifier::RAPID_BLINK, Attribute::RapidBlink),
        (Modifier::REVERSED, Attribute::Reverse),
        (Modifier::HIDDEN, Attribute::Hidden),
        (Modifier::CROSSED_OUT, Attribute::CrossedOut),
    ]
    .into_iter()
    .filter(|(flag, _)| modifier.contains(*flag))
    .map(|(_, attribute)| attribute)
    .collect()
}

// ratatui 0.29 is built against an older crossterm, so colors are mapped by
// hand instead of through its conversion impls.
fn to_crossterm_color(color: Color) -> CColor {
    match color {
        Color::Reset => CColor::Reset,
        Color::Black => CColor::Black,
        Color::Red => CColor::DarkRed,
        Color::Green => CColor::DarkGreen,
        Color::Yellow => CColor::DarkYellow,
        Color::Blue => CColor::DarkBlue,
        Color::Magenta => CColor::DarkMagenta,
        Color::Cyan => CColor::DarkCyan,
        Color::Gray => CColor::Grey,
        Color::DarkGray => CColor::DarkGrey,
        Color::LightRed => CColor::Red,
        Color::LightGreen => CColor::Green,
        Color::LightYellow => CColor::Yellow,
        Color::LightBlue => CColor::Blue,
        Color::LightMagenta => CColor::Magenta,
        Color::LightCyan => CColor::Cyan,
        Color::White => CColor::White,
        Color::Rgb(r, g, b) => CColor::Rgb { r, g, b },
        Color::Indexed(index) => CColor::AnsiValue(index),
    }
}

#[cfg(test)]
mod tests {
    use super::{Screen, attributes, to_crossterm_color};
    use crossterm::style::{Attribute, Color as CColor};
    use ratatui::style::{Color, Modifier, Style};
    use ratatui::text::{Line, Span};

    fn output(screen: &Screen<Vec<u8>>) -> String {
        String::from_utf8(screen.get_ref().clone()).expect("utf8 output")
    }

    #[test]
    fn unstyled_lines_are_written_as_plain_text() {
        let mut screen = Screen::new(Vec::new());
        screen
            .write_lines(&[Line::from("hello"), Line::from(vec![Span::raw("a"), Span::raw("b")])])
            .expect("write");
        assert_eq!(output(&screen), "hello\nab\n");
    }

    #[test]
    fn styled_spans_are_wrapped_in_escape_codes_and_reset() {
        let mut screen = Screen::new(Vec::new());
        let style = Style::default()
            .fg(Color::Rgb(1, 2, 3))
            .add_modifier(Modifier::BOLD);
        screen
            .write_lines(&[Line::from(Span::styled("x", style))])
            .expect("write");

        let text = output(&screen);
        assert!(text.contains("\u{1b}[38;2;1;2;3m"), "got {text:?}");
        assert!(text.contains("\u{1b}[1m"), "got {text:?}");
        assert!(text.contains('x'));
        assert!(text.ends_with("\u{1b}[0m\n"), "got {text:?}");
    }

    #[test]
    fn transient_line_is_cleared_before_permanent_output() {
        let mut screen = Screen::new(Vec::new());
        screen
            .show_transient(&Line::from("thinking"))
            .expect("transient");
        screen.write_lines(&[Line::from("answer")]).expect("write");

        let text = output(&screen);
        let thinking = text.find("thinking").expect("transient text");
        let answer = text.find("answer").expect("answer text");
        let clear = text[thinking..].find("\r\u{1b}[2K").expect("clear line") + thinking;
        assert!(clear < answer);
    }

    #[test]
    fn clear_transient_is_a_no_op_without_transient_line() {
        let mut screen = Screen::new(Vec::new());
        screen.clear_transient().expect("clear");
        assert!(output(&screen).is_empty());
    }

    #[test]
    fn colors_and_modifiers_map_to_crossterm() {
        assert_eq!(to_crossterm_color(Color::Rgb(9, 8, 7)), CColor::Rgb { r: 9, g: 8, b: 7 });
        assert_eq!(to_crossterm_color(Color::LightRed), CColor::Red);
        assert_eq!(to_crossterm_color(Color::Indexed(42)), CColor::AnsiValue(42));
        assert_eq!(
            attributes(Modifier::ITALIC | Modifier::DIM),
            vec![Attribute::Dim, Attribute::Italic]
        );
    }
}
