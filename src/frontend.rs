//! The interaction seam between the engine and whatever is driving it.
//!
//! The solver narrates its progress and occasionally asks a question; it
//! never touches stdout directly. The interactive CLI answers prompts from
//! the terminal, tests capture everything in memory, and the replay writer
//! points the same narration at a file.

use std::io::{self, Write};

/// Output and prompting handle injected into every solver entry point.
pub trait Frontend {
    /// Emit one line of narration or a rendered table.
    fn say(&mut self, text: &str);

    /// Ask the user a question. An empty answer means "take the default".
    fn ask(&mut self, prompt: &str) -> String {
        let _ = prompt;
        String::new()
    }
}

/// Discards all output and answers every prompt with the default.
pub struct Quiet;

impl Frontend for Quiet {
    fn say(&mut self, _text: &str) {}
}

/// Writes every line to an [`io::Write`] sink; prompts take the default.
///
/// Used for the replay dump and for capturing solver output in tests.
pub struct LineSink<W: Write> {
    out: W,
    status: io::Result<()>,
}

impl<W: Write> LineSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            status: Ok(()),
        }
    }

    /// Flushes and hands back the sink, surfacing any write error that
    /// occurred along the way.
    pub fn finish(mut self) -> io::Result<W> {
        self.status?;
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> Frontend for LineSink<W> {
    fn say(&mut self, text: &str) {
        if self.status.is_ok() {
            self.status = writeln!(self.out, "{}", text);
        }
    }
}

/// Re-prompts until the answer is empty (returning `default`) or one of
/// `values`.
pub fn check_ask(ui: &mut dyn Frontend, msg: &str, default: &str, values: &[String]) -> String {
    loop {
        let s = ui.ask(msg);
        if s.is_empty() {
            return default.to_string();
        }
        if values.iter().any(|v| v == &s) {
            return s;
        }
        ui.say("Bad choice.");
    }
}
