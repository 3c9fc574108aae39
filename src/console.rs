//! User-facing output
//!
//! Results, settings listings, comments and reported errors go through [`Console`].
//! A silent console drops everything. Diagnostics for developers go to `tracing`.

use std::cell::RefCell;
use std::fmt::Display;
use std::io::{self, Write};
use std::rc::Rc;

use colored::{Color, Colorize};

use crate::reserved;

/// Clones share the same sinks, so a sub-session writes where its parent does
#[derive(Clone)]
pub struct Console {
    out: Rc<RefCell<dyn Write>>,
    err: Rc<RefCell<dyn Write>>,
    silent: bool,
    color: bool,
}

impl Default for Console {
    fn default() -> Self {
        Self::stdout()
    }
}

impl Console {
    /// Results to stdout, errors to stderr
    pub fn stdout() -> Self {
        Self {
            out: Rc::new(RefCell::new(io::stdout())),
            err: Rc::new(RefCell::new(io::stderr())),
            silent: false,
            color: true,
        }
    }

    /// Console writing into shared buffers, without colours
    pub fn capture() -> (Self, Capture) {
        let capture = Capture::default();
        let console = Self {
            out: Rc::new(RefCell::new(SharedWriter(Rc::clone(&capture.out)))),
            err: Rc::new(RefCell::new(SharedWriter(Rc::clone(&capture.err)))),
            silent: false,
            color: false,
        };
        (console, capture)
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    /// Returns the previous state
    pub fn set_silent(&mut self, silent: bool) -> bool {
        std::mem::replace(&mut self.silent, silent)
    }

    pub fn set_color(&mut self, color: bool) {
        self.color = color;
    }

    pub fn print(&mut self, text: impl Display) {
        if self.silent {
            return;
        }
        if let Err(error) = writeln!(self.out.borrow_mut(), "{}", text) {
            tracing::debug!(%error, "console write failed");
        }
    }

    pub fn error(&mut self, text: impl Display) {
        tracing::warn!("{}", text);
        if self.silent {
            return;
        }
        let result = if self.color {
            writeln!(self.err.borrow_mut(), "{} {}", "error:".red().bold(), text)
        } else {
            writeln!(self.err.borrow_mut(), "error: {}", text)
        };
        if let Err(error) = result {
            tracing::debug!(%error, "console write failed");
        }
    }

    /// Print a comment line; `#red# text` prints `text` in red
    pub fn comment(&mut self, line: &str) {
        let body = line.strip_prefix(reserved::COMMENT).unwrap_or(line);
        match split_color(body) {
            Some((color, text)) if self.color => self.print(text.trim().color(color)),
            Some((_, text)) => self.print(text.trim()),
            None => self.print(body.trim()),
        }
    }
}

fn split_color(body: &str) -> Option<(Color, &str)> {
    let (name, text) = body.split_once(reserved::COMMENT)?;
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    let color = name.parse::<Color>().ok()?;
    Some((color, text))
}

/// Buffers behind a captured console
#[derive(Clone, Default)]
pub struct Capture {
    out: Rc<RefCell<Vec<u8>>>,
    err: Rc<RefCell<Vec<u8>>>,
}

impl Capture {
    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.out.borrow()).into_owned()
    }

    pub fn errors(&self) -> String {
        String::from_utf8_lossy(&self.err.borrow()).into_owned()
    }

    pub fn clear(&self) {
        self.out.borrow_mut().clear();
        self.err.borrow_mut().clear();
    }
}

struct SharedWriter(Rc<RefCell<Vec<u8>>>);

impl Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_console_drops_output() {
        let (mut console, capture) = Console::capture();
        console.print("visible");
        assert!(!console.set_silent(true));
        console.print("hidden");
        console.error("hidden too");
        assert!(console.set_silent(false));
        console.error("boom");

        assert_eq!(capture.output(), "visible\n");
        assert_eq!(capture.errors(), "error: boom\n");
    }

    #[test]
    fn test_comment_lines() {
        let (mut console, capture) = Console::capture();
        console.comment("# plain words ");
        console.comment("#red# alert");
        console.comment("#notacolor# kept");
        assert_eq!(capture.output(), "plain words\nalert\nnotacolor# kept\n");
    }

    #[test]
    fn test_clones_share_sinks() {
        let (mut console, capture) = Console::capture();
        let mut quiet = console.clone();
        quiet.set_silent(true);
        quiet.print("dropped");
        console.print("parent");
        quiet.set_silent(false);
        quiet.print("child");
        assert_eq!(capture.output(), "parent\nchild\n");
        assert!(!console.is_silent());
    }
}
