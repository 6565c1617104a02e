use buildmark::{Diagnostic, Severity, SessionMetrics};

mod ansi {
    pub const DIM: &str = "2";
    pub const BOLD: &str = "1";

    pub const RED: &str = "31";
    pub const MAGENTA: &str = "35";
    pub const YELLOW: &str = "33";
    pub const BLUE: &str = "34";
    pub const CYAN: &str = "36";
    pub const GREEN: &str = "32";
    pub const GRAY: &str = "90";

    /// SGR styling that collapses to plain text when color is off.
    #[derive(Clone, Copy)]
    pub struct Palette(pub bool);

    impl Palette {
        pub fn paint(self, s: impl Into<String>, code: &str) -> String {
            let s = s.into();
            if self.0 { format!("\x1b[{code}m{s}\x1b[0m") } else { s }
        }

        pub fn bold(self, s: impl Into<String>) -> String {
            self.paint(s, BOLD)
        }

        pub fn dim(self, s: impl Into<String>) -> String {
            self.paint(s, DIM)
        }
    }
}

fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::ErrorBuild => ansi::MAGENTA,
        Severity::ErrorResource => ansi::RED,
        Severity::Warning => ansi::YELLOW,
        Severity::Info => ansi::BLUE,
    }
}

/// One line per diagnostic, `file:line: severity: description [variable] (rule)`.
pub fn print_diagnostic(d: &Diagnostic, color: bool) {
    let palette = ansi::Palette(color);
    let location = match (d.file.path(), d.line) {
        (Some(path), 0) => format!("{}", path.display()),
        (Some(path), line) => format!("{}:{}", path.display(), line),
        (None, _) => d.file.to_string(),
    };
    let variable = d.variable.as_deref().map(|v| format!(" [{v}]")).unwrap_or_default();

    println!(
        "{}: {}: {}{} {}",
        palette.bold(location),
        palette.bold(palette.paint(d.severity.label(), severity_color(d.severity))),
        d.description,
        palette.paint(variable, ansi::CYAN),
        palette.dim(format!("({})", d.rule)),
    );
}

pub fn print_summary(metrics: &SessionMetrics, color: bool) {
    let palette = ansi::Palette(color);
    println!("\n{}", palette.paint("━━━ Summary ━━━", ansi::GRAY));
    println!(
        "  {} build errors  │  {} errors  │  {} warnings  │  {} infos",
        palette.paint(metrics.build_errors.to_string(), ansi::MAGENTA),
        palette.paint(metrics.resource_errors.to_string(), ansi::RED),
        palette.paint(metrics.warnings.to_string(), ansi::YELLOW),
        palette.paint(metrics.infos.to_string(), ansi::BLUE),
    );
    println!(
        "  Lines: {}  │  Claimed: {}  │  Total: {}",
        palette.paint(metrics.lines.to_string(), ansi::CYAN),
        palette.paint(metrics.claimed.to_string(), ansi::CYAN),
        palette.paint(format!("{:?}", metrics.total), ansi::GREEN),
    );

    for rule in &metrics.rules {
        println!(
            "  {} {} {}  {} {}  {} {}",
            palette.paint(format!("{:<8}", rule.id), ansi::CYAN),
            palette.dim("offered:"),
            palette.paint(rule.offered.to_string(), ansi::YELLOW),
            palette.dim("claimed:"),
            palette.paint(rule.claimed.to_string(), ansi::YELLOW),
            palette.dim("reported:"),
            palette.paint(rule.reported.to_string(), ansi::YELLOW),
        );
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::ansi::{self, Palette};

    #[test]
    fn palette_wraps_only_when_enabled() {
        assert_eq!(Palette(false).paint("3", ansi::RED), "3");
        assert_eq!(Palette(true).paint("3", ansi::RED), "\x1b[31m3\x1b[0m");
        assert_eq!(Palette(true).bold(Palette(true).dim("x")), "\x1b[1m\x1b[2mx\x1b[0m\x1b[0m");
    }
}
