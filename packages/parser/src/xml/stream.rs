//! Thin wrapper over `quick_xml::Reader` reducing a document to element
//! boundaries and element text.
//!
//! The stream is read exactly once. Self-closing elements are expanded into a
//! start followed by an end, so callers only ever see balanced boundaries.

use std::fs::File;
use std::io::{self, BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{ParserError, Result};
use crate::path::PathTracker;

/// Element boundary produced by [`EventStream::next_event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    /// Opening tag, carrying the local name (namespace prefix removed).
    Start(String),
    /// Closing tag, carrying the local name.
    End(String),
    /// End of input.
    Eof,
}

/// Forward-only reader over one document.
pub struct EventStream<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    file: PathBuf,
}

impl EventStream<BufReader<File>> {
    /// Open a document file.
    ///
    /// Fails with [`ParserError::NotFound`] when the file does not exist.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => ParserError::NotFound {
                path: path.to_path_buf(),
            },
            _ => ParserError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        Ok(Self::from_reader(BufReader::new(file), path))
    }
}

impl<R: BufRead> EventStream<R> {
    /// Stream from any buffered reader. `file` is used in error messages only.
    pub fn from_reader(reader: R, file: impl Into<PathBuf>) -> Self {
        let mut reader = Reader::from_reader(reader);
        let config = reader.config_mut();
        config.trim_text(true);
        config.expand_empty_elements = true;
        Self {
            reader,
            buf: Vec::new(),
            file: file.into(),
        }
    }

    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Next element boundary. Text, comments and declarations are skipped.
    pub fn next_event(&mut self) -> Result<XmlEvent> {
        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(source) => {
                    return Err(xml_error(&self.file, &self.reader, source));
                }
            };
            match event {
                Event::Start(e) => return Ok(XmlEvent::Start(local_name(e.local_name().as_ref()))),
                Event::End(e) => return Ok(XmlEvent::End(local_name(e.local_name().as_ref()))),
                Event::Eof => return Ok(XmlEvent::Eof),
                _ => {}
            }
        }
    }

    /// Read the direct text of the element just entered, consuming up to and
    /// including its closing tag.
    ///
    /// Nested elements are skipped but still pushed and popped on `path`, so
    /// the tracker is back at the parent when this returns. Returns `None`
    /// when the element holds no text.
    pub fn read_text(&mut self, path: &mut PathTracker) -> Result<Option<String>> {
        let mut text = String::new();
        let mut nested = 0usize;

        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(source) => {
                    return Err(xml_error(&self.file, &self.reader, source));
                }
            };
            match event {
                Event::Text(e) if nested == 0 => {
                    let unescaped = e
                        .unescape()
                        .map_err(|source| xml_error(&self.file, &self.reader, source))?;
                    text.push_str(&unescaped);
                }
                Event::CData(e) if nested == 0 => {
                    text.push_str(&String::from_utf8_lossy(&e));
                }
                Event::Start(e) => {
                    path.push(local_name(e.local_name().as_ref()));
                    nested += 1;
                }
                Event::End(_) => {
                    path.pop();
                    if nested == 0 {
                        break;
                    }
                    nested -= 1;
                }
                Event::Eof => {
                    return Err(ParserError::UnexpectedEof {
                        path: self.file.clone(),
                        open_path: path.current_path(),
                    });
                }
                _ => {}
            }
        }

        Ok(if text.is_empty() { None } else { Some(text) })
    }
}

fn local_name(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Tokenizer failures become `Xml`; read failures of the underlying file stay `Io`.
fn xml_error<R>(file: &Path, reader: &Reader<R>, source: quick_xml::Error) -> ParserError {
    match source {
        quick_xml::Error::Io(io) => ParserError::Io {
            path: file.to_path_buf(),
            source: Arc::try_unwrap(io)
                .unwrap_or_else(|shared| io::Error::new(shared.kind(), shared.to_string())),
        },
        source => ParserError::Xml {
            path: file.to_path_buf(),
            position: reader.buffer_position(),
            source,
        },
    }
}
