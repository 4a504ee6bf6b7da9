use std::io::IsTerminal;
use std::time::Duration;

use cactus_link::admin::{VerifyFinding, VerifySeverity};
use cactus_link::storage::LinkRecord;
use clap::ValueEnum;
use nu_ansi_term::{Color, Style};

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Theme {
    Auto,
    Light,
    Dark,
    Plain,
}

/// Text renderer for flower headers, link tables, and verify findings.
///
/// Colors are applied only when stdout is a terminal; `quiet` drops titles
/// and the closing status line.
pub struct Ui {
    styles: Styles,
    quiet: bool,
}

impl Ui {
    pub fn new(theme: Theme, quiet: bool) -> Self {
        let color = theme != Theme::Plain && !quiet && std::io::stdout().is_terminal();
        #[cfg(windows)]
        if color {
            let _ = nu_ansi_term::enable_ansi_support();
        }
        let styles = match (color, theme) {
            (false, _) => Styles::default(),
            (true, Theme::Light) => Styles::light(),
            (true, _) => Styles::dark(),
        };
        Self { styles, quiet }
    }

    /// Prints `title` followed by right-aligned `key: value` rows.
    pub fn fields(&self, title: &str, rows: &[(&str, String)]) {
        self.title(title);
        let width = rows.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
        for (key, value) in rows {
            let key = format!("{key:>width$}:");
            println!("  {} {value}", self.styles.key.paint(key));
        }
    }

    /// Prints the records of one chain as a column table.
    pub fn link_table(&self, title: &str, records: &[LinkRecord]) {
        self.title(title);
        if records.is_empty() {
            println!("  (empty)");
            return;
        }
        let header = format!(
            "{:>6}  {:>20}  {:>20}  {:>20}",
            "index", "3' end", "5' end", "group"
        );
        println!("  {}", self.styles.key.paint(header));
        for record in records {
            println!(
                "  {}  {:>20}  {:>20}  {:>20}",
                self.styles.index.paint(format!("{:>6}", record.link_index)),
                record.three_end.0,
                record.five_end.0,
                record.group.0
            );
        }
    }

    /// Prints one line per finding, tagged with its severity.
    pub fn findings(&self, findings: &[VerifyFinding]) {
        if findings.is_empty() {
            return;
        }
        self.title("Findings");
        for finding in findings {
            let (tag, style) = match finding.severity {
                VerifySeverity::Error => ("error", self.styles.bad),
                VerifySeverity::Warning => ("warn", self.styles.caution),
                VerifySeverity::Info => ("info", self.styles.key),
            };
            println!("  {} {}", style.paint(format!("{tag:>5}")), finding.message);
        }
    }

    /// Closing status line; failures go to stderr.
    pub fn status(&self, ok: bool, message: &str) {
        if ok {
            if !self.quiet {
                println!("{} {message}", self.styles.good.paint("ok:"));
            }
        } else {
            eprintln!("{} {message}", self.styles.bad.paint("failed:"));
        }
    }

    fn title(&self, title: &str) {
        if !self.quiet {
            println!("{}", self.styles.title.paint(title));
        }
    }
}

pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs >= 1.0 {
        format!("{secs:.2}s")
    } else {
        format!("{:.0}ms", secs * 1_000.0)
    }
}

#[derive(Clone, Copy, Default)]
struct Styles {
    title: Style,
    key: Style,
    index: Style,
    good: Style,
    caution: Style,
    bad: Style,
}

impl Styles {
    fn dark() -> Self {
        Self {
            title: Style::new().fg(Color::Purple).bold().underline(),
            key: Style::new().fg(Color::LightBlue),
            index: Style::new().fg(Color::DarkGray),
            good: Style::new().fg(Color::LightGreen).bold(),
            caution: Style::new().fg(Color::Yellow).bold(),
            bad: Style::new().fg(Color::LightRed).bold(),
        }
    }

    fn light() -> Self {
        Self {
            title: Style::new().fg(Color::Blue).bold().underline(),
            key: Style::new().fg(Color::Black).bold(),
            index: Style::new().fg(Color::DarkGray),
            good: Style::new().fg(Color::Green).bold(),
            caution: Style::new().fg(Color::Purple).bold(),
            bad: Style::new().fg(Color::Red).bold(),
        }
    }
}
