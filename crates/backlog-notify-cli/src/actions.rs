//! GitHub Actions workflow commands on stdout.

use std::io::{self, Write};

/// Escape a command's data so newlines and `%` survive the runner's parser.
pub fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

pub struct Actions<W: Write> {
    out: W,
}

impl Actions<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Actions<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn info(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{message}")
    }

    pub fn group(&mut self, name: &str) -> io::Result<()> {
        writeln!(self.out, "::group::{}", escape_data(name))
    }

    pub fn end_group(&mut self) -> io::Result<()> {
        writeln!(self.out, "::endgroup::")
    }

    pub fn error(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "::error::{}", escape_data(message))
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Report panics as workflow errors too.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let _ = Actions::stdout().error(&info.to_string());
    }));
}
