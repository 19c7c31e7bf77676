//! Purpose: Progress reporting port for streamed transfers.
//! Exports: `Progress`, `Hidden`, `ProgressBar`, `format_bytes`.
//! Role: Decouples byte accounting in downloads from how (or whether) it is shown.
//! Invariants: Reporters never fail the transfer; render errors are ignored.
//! Invariants: A total of 0 means the size is unknown.

use std::io::{self, Write};
use std::time::{Duration, Instant};

const BAR_WIDTH: usize = 24;
const REDRAW_INTERVAL: Duration = Duration::from_millis(100);

pub trait Progress {
    fn start(&mut self, label: &str, total: u64);
    fn advance(&mut self, bytes: u64);
    fn finish(&mut self);
}

/// Reporter used when progress display is turned off.
#[derive(Clone, Copy, Debug, Default)]
pub struct Hidden;

impl Progress for Hidden {
    fn start(&mut self, _label: &str, _total: u64) {}

    fn advance(&mut self, _bytes: u64) {}

    fn finish(&mut self) {}
}

/// Single-line text bar, redrawn in place with `\r`.
pub struct ProgressBar<W: Write> {
    out: W,
    label: String,
    total: u64,
    done: u64,
    last_draw: Option<Instant>,
}

impl ProgressBar<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> ProgressBar<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            label: String::new(),
            total: 0,
            done: 0,
            last_draw: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render_line(&self) -> String {
        if self.total == 0 {
            return format!("{}: {}", self.label, format_bytes(self.done));
        }
        let done = self.done.min(self.total);
        let percent = done * 100 / self.total;
        let filled = (done as u128 * BAR_WIDTH as u128 / self.total as u128) as usize;
        format!(
            "{}: {:>3}%|{}{}| {}/{}",
            self.label,
            percent,
            "#".repeat(filled),
            " ".repeat(BAR_WIDTH - filled),
            format_bytes(done),
            format_bytes(self.total)
        )
    }

    fn draw(&mut self, force: bool) {
        let now = Instant::now();
        if !force
            && self
                .last_draw
                .is_some_and(|last| now.duration_since(last) < REDRAW_INTERVAL)
        {
            return;
        }
        self.last_draw = Some(now);
        let line = self.render_line();
        let _ = write!(self.out, "\r{line}");
        let _ = self.out.flush();
    }
}

impl<W: Write> Progress for ProgressBar<W> {
    fn start(&mut self, label: &str, total: u64) {
        self.label = label.to_string();
        self.total = total;
        self.done = 0;
        self.last_draw = None;
        self.draw(true);
    }

    fn advance(&mut self, bytes: u64) {
        self.done = self.done.saturating_add(bytes);
        self.draw(false);
    }

    fn finish(&mut self) {
        self.draw(true);
        let _ = writeln!(self.out);
        let _ = self.out.flush();
    }
}

/// Human byte count: `512B`, `1.5K`, `3M`, `2.1G`.
pub fn format_bytes(value: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    const GIB: u64 = 1024 * 1024 * 1024;
    if value < KIB {
        return format!("{value}B");
    }
    let (unit, suffix) = if value >= GIB {
        (GIB, "G")
    } else if value >= MIB {
        (MIB, "M")
    } else {
        (KIB, "K")
    };
    if value % unit == 0 {
        return format!("{}{}", value / unit, suffix);
    }
    format!("{:.1}{}", (value as f64) / (unit as f64), suffix)
}

#[cfg(test)]
mod tests {
    use super::{Progress, ProgressBar, format_bytes};

    #[test]
    fn format_bytes_scales_units() {
        assert_eq!(format_bytes(0), "0B");
        assert_eq!(format_bytes(1023), "1023B");
        assert_eq!(format_bytes(1024), "1K");
        assert_eq!(format_bytes(1536), "1.5K");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3M");
        assert_eq!(format_bytes(5 * 1024 * 1024 * 1024), "5G");
    }

    #[test]
    fn bar_renders_known_total() {
        let mut bar = ProgressBar::new(Vec::new());
        bar.start("data.zip", 2048);
        bar.advance(1024);
        bar.advance(1024);
        bar.finish();
        let text = String::from_utf8(bar.into_inner()).expect("utf8");
        let last = text.trim_end().rsplit('\r').next().expect("line");
        assert_eq!(last, format!("data.zip: 100%|{}| 2K/2K", "#".repeat(24)));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn bar_renders_unknown_total_as_count() {
        let mut bar = ProgressBar::new(Vec::new());
        bar.start("stream.csv", 0);
        bar.advance(700);
        bar.finish();
        let text = String::from_utf8(bar.into_inner()).expect("utf8");
        let last = text.trim_end().rsplit('\r').next().expect("line");
        assert_eq!(last, "stream.csv: 700B");
    }

    #[test]
    fn overshoot_is_clamped_to_total() {
        let mut bar = ProgressBar::new(Vec::new());
        bar.start("short.bin", 100);
        bar.advance(1024);
        bar.finish();
        let text = String::from_utf8(bar.into_inner()).expect("utf8");
        assert!(text.trim_end().ends_with("100B/100B"));
    }
}
