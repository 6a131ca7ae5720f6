//! Terminal presentation helpers: number formatting, ANSI colors gated on
//! TTY detection, terminal size and plain-text tables.

use crossterm::tty::IsTty;
use unicode_width::UnicodeWidthStr;

const FG_RED: &str = "\x1b[31m";
const FG_GREEN: &str = "\x1b[32m";
const FG_YELLOW: &str = "\x1b[33m";
const FG_BLUE: &str = "\x1b[34m";
const FG_DEFAULT: &str = "\x1b[39m";

/// Format an integer with en_US thousands grouping: `1234567` -> `1,234,567`.
pub fn pretty_int(num: i64) -> String {
    let digits = num.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if num < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Foreground colors, applied only when enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Palette { enabled }
    }

    /// Colors on when stdout is a terminal.
    pub fn detect() -> Self {
        Palette::new(std::io::stdout().is_tty())
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }
        format!("{}{}{}", code, text, FG_DEFAULT)
    }

    pub fn green(&self, text: &str) -> String {
        self.paint(FG_GREEN, text)
    }

    pub fn red(&self, text: &str) -> String {
        self.paint(FG_RED, text)
    }

    pub fn yellow(&self, text: &str) -> String {
        self.paint(FG_YELLOW, text)
    }

    pub fn blue(&self, text: &str) -> String {
        self.paint(FG_BLUE, text)
    }

    pub fn brand(&self) -> String {
        self.blue("SolveBio")
    }
}

/// Terminal `(columns, rows)`, or `None` when it cannot be detected.
pub fn terminal_size() -> Option<(u16, u16)> {
    match crossterm::terminal::size() {
        Ok(size) => Some(size),
        Err(e) => {
            if std::io::stdout().is_tty() {
                tracing::warn!(error = %e, "Cannot detect terminal column width");
            }
            None
        }
    }
}

/// Collapse line breaks so a cell always renders on a single line.
fn single_line(cell: &str) -> String {
    cell.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// Render a pipe-delimited table: one header row, one `|---+---|` separator
/// and one row per record. Every column is as wide as its widest cell,
/// header included.
pub fn tabulate<S: AsRef<str>>(headers: &[&str], rows: &[Vec<S>]) -> String {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|c| single_line(AsRef::<str>::as_ref(c))).collect())
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.width()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.width());
        }
    }

    let render_row = |cells: &mut dyn Iterator<Item = &str>| -> String {
        let padded: Vec<String> = widths
            .iter()
            .map(|w| {
                let cell = cells.next().unwrap_or("");
                format!(" {}{} ", cell, " ".repeat(w - cell.width()))
            })
            .collect();
        format!("|{}|", padded.join("|"))
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(render_row(&mut headers.iter().copied()));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(w + 2)).collect();
    lines.push(format!("|{}|", rule.join("+")));
    for row in &rows {
        lines.push(render_row(&mut row.iter().map(String::as_str)));
    }
    lines.join("\n")
}
