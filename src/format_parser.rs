/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Parser for the `format` string of native structures.
//!
//! The extension API dump describes native structure layouts in a compact text convention:
//! fields separated by `;`, each field being `<type> <name>`, optionally followed by `[<N>]`
//! (fixed array) and/or ` = <default>` (raw default literal). Type names may contain `::` and
//! may end in ` *` for pointers; the star belongs to the type token.
//!
//! The grammar is deliberately strict. Tolerating a malformed field would let the parsed field
//! count or order drift from the true native memory layout, which corrupts marshalling without
//! any diagnostic.

use thiserror::Error;

use crate::errors::BindgenError;

/// One field parsed from a structure format string, in textual order.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct NativeStructureField {
    /// Raw type text, e.g. `real_t`, `TextServer::Direction` or `Object *`.
    pub field_type: String,

    /// Field name without array suffix.
    pub field_name: String,

    /// Default literal, verbatim and not type-checked (e.g. `-1` or `0.f`).
    pub default_value: Option<String>,

    /// Fixed array length, if the field is an array. Always >= 1.
    pub array_size: Option<usize>,
}

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum LayoutError {
    #[error("expected space character after type name (field: `{0}`)")]
    MissingSpace(String),

    #[error("expected field name after type name (field: `{0}`)")]
    MissingFieldName(String),

    #[error("expected positive array length in brackets (field: `{0}`)")]
    InvalidArrayLength(String),

    #[error("expected default value after `=` (field: `{0}`)")]
    MissingDefaultValue(String),
}

/// Returns a lazy iterator over the fields of a structure format string.
///
/// The iterator is finite and has no side effects; calling `fields_of` again restarts the
/// enumeration from the beginning. Empty segments (e.g. from a trailing `;`) are skipped.
pub fn fields_of(format: &str) -> FieldIter<'_> {
    FieldIter {
        segments: format.split(';'),
    }
}

/// Parses an entire format string, attributing errors to the structure and field index.
pub fn parse_native_structure_format(
    structure: &str,
    format: &str,
) -> Result<Vec<NativeStructureField>, BindgenError> {
    fields_of(format)
        .enumerate()
        .map(|(field_index, field)| {
            field.map_err(|source| BindgenError::StructureLayout {
                structure: structure.to_string(),
                field_index,
                source,
            })
        })
        .collect()
}

#[derive(Clone)]
pub struct FieldIter<'a> {
    segments: std::str::Split<'a, char>,
}

impl Iterator for FieldIter<'_> {
    type Item = Result<NativeStructureField, LayoutError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let segment = self.segments.next()?.trim();
            if !segment.is_empty() {
                return Some(parse_field(segment));
            }
        }
    }
}

fn parse_field(buffer: &str) -> Result<NativeStructureField, LayoutError> {
    // The segment until the first space is the type name; if a `*` immediately follows the
    // space, it is a pointer suffix and still part of the type token.
    let space = buffer
        .find(' ')
        .ok_or_else(|| LayoutError::MissingSpace(buffer.to_string()))?;

    let (field_type, rest) = if buffer[space + 1..].starts_with('*') {
        (&buffer[..space + 2], &buffer[space + 2..])
    } else {
        (&buffer[..space], &buffer[space + 1..])
    };

    // Next segment is the field name, ending at the next space (or end of field).
    let (mut field_name, rest) = match rest.find(' ') {
        Some(idx) => (&rest[..idx], &rest[idx + 1..]),
        None => (rest, ""),
    };

    if field_name.is_empty() {
        return Err(LayoutError::MissingFieldName(buffer.to_string()));
    }

    // Array fields carry their fixed size after the name: `collisions[32]`.
    let mut array_size = None;
    if field_name.ends_with(']') {
        let open = field_name
            .rfind('[')
            .ok_or_else(|| LayoutError::InvalidArrayLength(buffer.to_string()))?;

        let digits = &field_name[open + 1..field_name.len() - 1];
        let size: usize = if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LayoutError::InvalidArrayLength(buffer.to_string()));
        } else {
            digits
                .parse()
                .map_err(|_| LayoutError::InvalidArrayLength(buffer.to_string()))?
        };

        if size == 0 {
            return Err(LayoutError::InvalidArrayLength(buffer.to_string()));
        }

        array_size = Some(size);
        field_name = &field_name[..open];
    }

    // Anything after the name must be a default value marker; the literal is kept verbatim.
    let default_value = if rest.is_empty() {
        None
    } else {
        let literal = rest
            .strip_prefix("= ")
            .filter(|lit| !lit.is_empty())
            .ok_or_else(|| LayoutError::MissingDefaultValue(buffer.to_string()))?;

        Some(literal.to_string())
    };

    Ok(NativeStructureField {
        field_type: field_type.to_string(),
        field_name: field_name.to_string(),
        default_value,
        array_size,
    })
}
