//! Event cursor shared by the document parser and the sub-element parsers.
//!
//! Every boundary read through the cursor updates the path tracker, which is
//! what keeps the path balanced when a sub-parser hands control back.

use std::io::BufRead;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{ParserError, Result};
use crate::path::PathTracker;
use crate::xml::{EventStream, XmlEvent};

pub struct Cursor<'d, R> {
    stream: EventStream<R>,
    path: PathTracker,
    diagnostics: &'d mut Diagnostics,
}

impl<'d, R: BufRead> Cursor<'d, R> {
    pub fn new(stream: EventStream<R>, diagnostics: &'d mut Diagnostics) -> Self {
        Self {
            stream,
            path: PathTracker::new(),
            diagnostics,
        }
    }

    /// Next boundary, with the path already pushed (start) or popped (end).
    pub fn next_boundary(&mut self) -> Result<XmlEvent> {
        let event = self.stream.next_event()?;
        match &event {
            XmlEvent::Start(name) => self.path.push(name.clone()),
            XmlEvent::End(name) => {
                if self.path.pop().is_none() {
                    let diagnostic = Diagnostic::path_underflow(self.stream.file(), name);
                    self.diagnostics.record(diagnostic);
                }
            }
            XmlEvent::Eof => {}
        }
        Ok(event)
    }

    /// Direct text of the element just entered; consumes its closing tag.
    pub fn text(&mut self) -> Result<Option<String>> {
        self.stream.read_text(&mut self.path)
    }

    /// Visit each direct child of the element just entered, returning once
    /// that element closes.
    ///
    /// `visit` is called right after a child's start tag. It may consume the
    /// child (through [`Cursor::text`] or a nested loop) or leave it; the
    /// remaining events of an unconsumed child are skipped.
    pub fn children<F>(&mut self, mut visit: F) -> Result<()>
    where
        F: FnMut(&mut Self, &str) -> Result<()>,
    {
        let base = self.path.depth();
        loop {
            match self.next_boundary()? {
                XmlEvent::Start(name) if self.path.depth() == base + 1 => visit(self, &name)?,
                XmlEvent::Start(_) => {}
                XmlEvent::End(_) if self.path.depth() < base => return Ok(()),
                XmlEvent::End(_) => {}
                XmlEvent::Eof => return Err(self.unexpected_eof()),
            }
        }
    }

    pub fn unexpected_eof(&self) -> ParserError {
        ParserError::UnexpectedEof {
            path: self.stream.file().to_path_buf(),
            open_path: self.path.current_path(),
        }
    }

    pub fn path(&self) -> &PathTracker {
        &self.path
    }

    /// Drop whatever is still open after an aborted parse.
    pub fn reset_path(&mut self) {
        self.path.clear();
    }

    pub fn diagnostics(&mut self) -> &mut Diagnostics {
        &mut *self.diagnostics
    }

    /// Record an unexpected-state diagnostic against the current document.
    pub fn unexpected(&mut self, message: impl Into<String>) {
        let diagnostic = Diagnostic::unexpected_state(self.stream.file(), message);
        self.diagnostics.record(diagnostic);
    }
}
