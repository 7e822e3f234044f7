//! CLI output formatting utilities.
//!
//! Colored status lines, planned change lines, and human-readable durations.
//! Color is only applied when the target stream supports it.

use std::time::Duration;

use anyhow::Context;
use owo_colors::{OwoColorize, Stream};

use artreg_lib::plan::{Change, ChangeKind};

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
}

/// Color of a status line or change marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
  Green,
  Red,
  Yellow,
  Blue,
  Dim,
}

impl Tone {
  fn paint(self, text: &str, stream: Stream) -> String {
    match self {
      Tone::Green => text.if_supports_color(stream, |s| s.green()).to_string(),
      Tone::Red => text.if_supports_color(stream, |s| s.red()).to_string(),
      Tone::Yellow => text.if_supports_color(stream, |s| s.yellow()).to_string(),
      Tone::Blue => text.if_supports_color(stream, |s| s.blue()).to_string(),
      Tone::Dim => text.if_supports_color(stream, |s| s.dimmed()).to_string(),
    }
  }
}

pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  let millis = duration.subsec_millis();

  if secs >= 60 {
    format!("{}m {}s", secs / 60, secs % 60)
  } else if secs > 0 {
    format!("{}.{:02}s", secs, millis / 10)
  } else {
    format!("{}ms", millis)
  }
}

pub fn print_success(message: &str) {
  println!("{} {}", Tone::Green.paint(symbols::SUCCESS, Stream::Stdout), message);
}

pub fn print_info(message: &str) {
  println!("{} {}", Tone::Blue.paint(symbols::INFO, Stream::Stdout), message);
}

/// Errors and warnings go to stderr, message included in the color.
pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    Tone::Red.paint(symbols::ERROR, Stream::Stderr),
    Tone::Red.paint(message, Stream::Stderr)
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    Tone::Yellow.paint(symbols::WARNING, Stream::Stderr),
    Tone::Yellow.paint(message, Stream::Stderr)
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!("  {}: {}", Tone::Dim.paint(label, Stream::Stdout), value);
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}

/// One line per planned change. Unchanged entries only show with `verbose`.
pub fn print_changes(changes: &[Change], verbose: bool) {
  for change in changes {
    let tone = match change.kind {
      ChangeKind::Create(_) => Tone::Green,
      ChangeKind::Replace { .. } => Tone::Yellow,
      ChangeKind::Delete => Tone::Red,
      ChangeKind::Unchanged if verbose => Tone::Dim,
      ChangeKind::Unchanged => continue,
    };
    println!("  {} {}", tone.paint(change.symbol(), Stream::Stdout), change);
  }
}
