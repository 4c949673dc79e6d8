use rogerian::{ReplySource, TransformTrace};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

pub fn print_trace(input: &str, trace: &TransformTrace, color: bool) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Transforming: \"{}\"", input), ansi::CYAN)));

    println!("\n{}", palette.paint("━━━ Fragments ━━━", ansi::GRAY));
    if trace.fragments.is_empty() {
        println!("{}", palette.dim("  (no non-empty fragments)"));
    } else {
        for (idx, fragment) in trace.fragments.iter().enumerate() {
            println!(
                "  {} {}",
                palette.paint(format!("[{}]", idx), ansi::GRAY),
                palette.paint(format!("\"{fragment}\""), ansi::YELLOW)
            );
        }
    }

    println!("\n{}", palette.paint("━━━ Matches ━━━", ansi::GRAY));
    if trace.matches.is_empty() {
        println!("{}", palette.dim("  No decomposition matched"));
        println!("\n{}", palette.dim("  Tip: Set ROGERIAN_DEBUG_RULES=1 to see rule activation details"));
    } else {
        for m in &trace.matches {
            println!(
                "  {} {} {} {}",
                palette.bold(palette.paint(&m.key, ansi::GREEN)),
                palette.paint(format!("rank {}", m.rank), ansi::BLUE),
                palette.dim("│"),
                palette.dim(&m.pattern),
            );
            println!(
                "      {} {}{}",
                palette.dim("reassembly:"),
                palette.paint(&m.reassembly, ansi::CYAN),
                if m.saved_to_memory { palette.paint("  (saved to memory)", ansi::YELLOW) } else { String::new() },
            );
        }
    }

    println!("\n{}", palette.paint("━━━ Source ━━━", ansi::GRAY));
    let source = match trace.source {
        ReplySource::Keyword => "keyword rule",
        ReplySource::Memory => "deferred memory",
        ReplySource::Fallback => "fallback (xnone)",
        ReplySource::Farewell => "quit word",
    };
    println!("  {}", palette.paint(source, ansi::GREEN));
    println!();
}
