//! Minimal delimited-table codec.
//!
//! The corpus and cluster-assignment files are `;`-separated tables with a
//! header row and RFC-4180-style quoting (fields containing the separator,
//! quotes, or newlines are wrapped in `"`, embedded quotes doubled).

use crate::error::CorpusError;

/// Parse a whole delimited document into rows of fields.
///
/// Quoted fields may span multiple lines. A trailing newline does not
/// produce an empty row. `\r\n` line endings are accepted.
pub fn parse(input: &str, sep: char) -> Result<Vec<Vec<String>>, CorpusError> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = input.chars().peekable();
    let mut saw_any = false;

    while let Some(c) = chars.next() {
        saw_any = true;
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }

        match c {
            '"' => {
                if !field.is_empty() {
                    return Err(CorpusError::InvalidFormat(format!(
                        "unexpected quote inside unquoted field at row {}",
                        rows.len() + 1
                    )));
                }
                in_quotes = true;
            }
            '\r' => {
                // Consumed as part of \r\n; bare \r is ignored.
            }
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            c if c == sep => {
                row.push(std::mem::take(&mut field));
            }
            c => field.push(c),
        }
    }

    if in_quotes {
        return Err(CorpusError::InvalidFormat(
            "unterminated quoted field".into(),
        ));
    }

    // Final row without a trailing newline.
    if saw_any && (!field.is_empty() || !row.is_empty()) {
        row.push(field);
        rows.push(row);
    }

    Ok(rows)
}

/// Quote a field for writing if it contains the separator, quotes, or
/// newlines.
pub fn escape_field(field: &str, sep: char) -> String {
    if field.contains(sep) || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Join fields into one delimited line (no trailing newline).
pub fn write_row(fields: &[&str], sep: char) -> String {
    fields
        .iter()
        .map(|f| escape_field(f, sep))
        .collect::<Vec<_>>()
        .join(&sep.to_string())
}
