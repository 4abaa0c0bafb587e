//! Sub-element parsers.
//!
//! Each function is entered right after the start tag of its block and
//! returns once that block's end tag has been consumed, leaving the path
//! tracker where it found it.

use std::io::BufRead;

use crate::error::Result;
use crate::types::{
    Connection, Parameter, ProcessMetadata, Reference, ReferenceKind, StepBuilder, Variable,
};
use crate::xml::XmlEvent;

use super::cursor::Cursor;
use super::resolver::Resolver;

/// A variable seen inside a `fields` block, not yet tied to a named step.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingVariable {
    name: String,
    scope: Option<String>,
}

/// Parse one transformation `step`.
///
/// The step is (re)inserted into `metadata` at every end tag observed inside
/// its subtree, keyed by name, so the state after the step closes is the one
/// that sticks. Returns the document reference the step carries, if any.
pub fn parse_step<R: BufRead>(
    cursor: &mut Cursor<'_, R>,
    metadata: &mut ProcessMetadata,
) -> Result<Option<Reference>> {
    let base = cursor.path().depth();
    let mut builder = StepBuilder::new();
    let mut variables = Vec::new();

    loop {
        match cursor.next_boundary()? {
            XmlEvent::Start(name) if cursor.path().depth() == base + 1 => match name.as_str() {
                "name" => builder.name = cursor.text()?,
                "type" => builder.step_type = cursor.text()?,
                "description" => builder.description = cursor.text()?,
                "filename" => builder.filename = cursor.text()?,
                "fields" if builder.is_set_variable() => {
                    variables.extend(parse_variables(cursor)?);
                }
                _ => {}
            },
            XmlEvent::Start(_) => {}
            XmlEvent::End(_) => {
                if let Some(step) = builder.build() {
                    metadata.insert_step(step);
                }
                if cursor.path().depth() < base {
                    break;
                }
            }
            XmlEvent::Eof => return Err(cursor.unexpected_eof()),
        }
    }

    match builder.name.as_deref() {
        Some(step_name) => {
            tracing::debug!(
                step = step_name,
                step_type = ?builder.step_type,
                variables = variables.len(),
                "Parsed step"
            );
            metadata
                .variables
                .extend(variables.into_iter().map(|v| Variable {
                    step_name: step_name.to_string(),
                    name: v.name,
                    scope: v.scope,
                }));
        }
        None => {
            cursor.unexpected(format!(
                "step without a name (type {}), {} variable(s) dropped",
                builder.step_type.as_deref().unwrap_or("unknown"),
                variables.len()
            ));
        }
    }

    Ok(builder.reference(ReferenceKind::from_step_type))
}

/// Parse the `fields` block of a `SetVariable` step.
///
/// A variable starts at each `variable_name` and is kept when its `field`
/// closes.
fn parse_variables<R: BufRead>(cursor: &mut Cursor<'_, R>) -> Result<Vec<PendingVariable>> {
    let mut variables = Vec::new();

    cursor.children(|cursor, name| {
        if name != "field" {
            return Ok(());
        }

        let mut current: Option<PendingVariable> = None;
        cursor.children(|cursor, child| {
            match child {
                "variable_name" => match cursor.text()? {
                    Some(name) => current = Some(PendingVariable { name, scope: None }),
                    None => cursor.unexpected("empty variable_name in SetVariable field"),
                },
                "variable_type" => {
                    let scope = cursor.text()?;
                    match current.as_mut() {
                        Some(variable) => variable.scope = scope,
                        None => cursor.unexpected("variable_type before variable_name"),
                    }
                }
                _ => {}
            }
            Ok(())
        })?;

        if let Some(variable) = current {
            variables.push(variable);
        }
        Ok(())
    })?;

    Ok(variables)
}

/// Parse a `parameters` container into `metadata`.
pub fn parse_parameters<R: BufRead>(
    cursor: &mut Cursor<'_, R>,
    metadata: &mut ProcessMetadata,
) -> Result<()> {
    cursor.children(|cursor, name| {
        if name != "parameter" {
            return Ok(());
        }

        let mut parameter_name = None;
        let mut default_value = None;
        let mut description = None;
        cursor.children(|cursor, child| {
            match child {
                "name" => parameter_name = cursor.text()?,
                "default_value" | "default" => default_value = cursor.text()?,
                "description" => description = cursor.text()?,
                _ => {}
            }
            Ok(())
        })?;

        match parameter_name {
            Some(name) => metadata.insert_parameter(Parameter {
                name,
                default_value,
                description,
            }),
            None => cursor.unexpected("parameter without a name"),
        }
        Ok(())
    })
}

/// Parse one `connection` block.
///
/// Returns `None` for a connection without a name, which cannot be keyed.
pub fn parse_connection<R: BufRead>(cursor: &mut Cursor<'_, R>) -> Result<Option<Connection>> {
    let mut connection = Connection::default();
    let mut name = None;

    cursor.children(|cursor, child| {
        match child {
            "name" => name = cursor.text()?,
            "attributes" => cursor.children(|cursor, attribute| {
                if attribute != "attribute" {
                    return Ok(());
                }
                let mut code = None;
                let mut value = None;
                cursor.children(|cursor, part| {
                    match part {
                        "code" => code = cursor.text()?,
                        "attribute" => value = cursor.text()?,
                        _ => {}
                    }
                    Ok(())
                })?;
                if let Some(code) = code {
                    connection.attributes.insert(code, value.unwrap_or_default());
                }
                Ok(())
            })?,
            property => {
                let value = cursor.text()?.unwrap_or_default();
                connection.properties.insert(property.to_string(), value);
            }
        }
        Ok(())
    })?;

    match name {
        Some(name) => {
            connection.name = name;
            Ok(Some(connection))
        }
        None => {
            cursor.unexpected("connection without a name");
            Ok(None)
        }
    }
}

/// Parse a job `entries` container.
///
/// Every entry is recorded as a step of the job. Entries of type `JOB` or
/// `TRANS` with a filename are handed to `resolver` as soon as they close.
pub fn parse_entries<R: BufRead>(
    cursor: &mut Cursor<'_, R>,
    metadata: &mut ProcessMetadata,
    resolver: &mut Resolver<'_>,
) -> Result<()> {
    cursor.children(|cursor, name| {
        if name != "entry" {
            return Ok(());
        }

        let builder = parse_entry(cursor)?;
        let Some(step) = builder.build() else {
            cursor.unexpected(format!(
                "job entry without a name (type {})",
                builder.step_type.as_deref().unwrap_or("unknown")
            ));
            return Ok(());
        };
        tracing::debug!(entry = %step.name, entry_type = ?step.step_type, "Parsed job entry");
        metadata.insert_step(step);

        if let Some(reference) = builder.reference(ReferenceKind::from_entry_type) {
            if let Some(child) =
                resolver.expand(&reference, metadata.name.as_deref(), cursor.diagnostics())
            {
                metadata.children.push(child);
            }
        }
        Ok(())
    })
}

fn parse_entry<R: BufRead>(cursor: &mut Cursor<'_, R>) -> Result<StepBuilder> {
    let mut builder = StepBuilder::new();
    cursor.children(|cursor, child| {
        match child {
            "name" => builder.name = cursor.text()?,
            "type" => builder.step_type = cursor.text()?,
            "description" => builder.description = cursor.text()?,
            "filename" => builder.filename = cursor.text()?,
            _ => {}
        }
        Ok(())
    })?;
    Ok(builder)
}
