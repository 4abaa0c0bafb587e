//! Forward-only XML event streaming.

pub mod stream;

pub use stream::{EventStream, XmlEvent};
