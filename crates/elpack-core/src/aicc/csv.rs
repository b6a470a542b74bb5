//! Comma-separated AICC descriptor tables (`.au`, `.des`, `.cst`, `.pre`, `.ort`).
//!
//! - fields may be double-quoted; `""` inside quotes is a literal quote
//! - quoted fields may span lines
//! - surrounding whitespace is trimmed and blank lines are skipped
//! - header names match ASCII case-insensitively

use crate::PackageError;

/// A parsed table: the header row plus data rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct CsvTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// One data row viewed through the header.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Record<'a> {
    header: &'a [String],
    fields: &'a [String],
}

impl<'a> Record<'a> {
    /// Field under `column`, or `None` when missing or blank.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let index = self
            .header
            .iter()
            .position(|name| name.eq_ignore_ascii_case(column))?;
        self.fields
            .get(index)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Owned form of [`Record::get`].
    pub fn string(&self, column: &str) -> Option<String> {
        self.get(column).map(str::to_string)
    }

    /// Non-blank fields from position `start` on.
    pub fn rest(&self, start: usize) -> Vec<String> {
        self.fields
            .iter()
            .skip(start)
            .filter(|value| !value.is_empty())
            .cloned()
            .collect()
    }

    /// First field.
    pub fn first(&self) -> Option<&'a str> {
        self.fields.first().map(String::as_str).filter(|v| !v.is_empty())
    }
}

impl CsvTable {
    /// Data rows as records.
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(|fields| Record {
            header: &self.header,
            fields,
        })
    }
}

/// Parse a table whose first non-blank row is the header.
pub(crate) fn parse_table(text: &str, file: &str) -> Result<CsvTable, PackageError> {
    let mut rows = parse_rows(text, file)?.into_iter();
    let header = rows.next().unwrap_or_default();
    Ok(CsvTable {
        header,
        rows: rows.collect(),
    })
}

fn parse_rows(text: &str, file: &str) -> Result<Vec<Vec<String>>, PackageError> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut chars = text.chars().peekable();
    let mut line = 1usize;

    let finish_field = |row: &mut Vec<String>, field: &mut String, quoted: &mut bool| {
        let value = if *quoted {
            std::mem::take(field)
        } else {
            std::mem::take(field).trim().to_string()
        };
        row.push(value);
        *quoted = false;
    };

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
                quoted = true;
            }
            ',' => finish_field(&mut row, &mut field, &mut quoted),
            '\r' => {}
            '\n' => {
                finish_field(&mut row, &mut field, &mut quoted);
                push_row(&mut rows, std::mem::take(&mut row));
                line += 1;
            }
            c if quoted && c.is_whitespace() => {}
            c if quoted => {
                return Err(PackageError::Ini {
                    file: file.to_string(),
                    message: format!("line {}: unexpected '{}' after closing quote", line, c),
                });
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(PackageError::Ini {
            file: file.to_string(),
            message: format!("line {}: unterminated quoted field", line),
        });
    }
    finish_field(&mut row, &mut field, &mut quoted);
    push_row(&mut rows, row);
    Ok(rows)
}

fn push_row(rows: &mut Vec<Vec<String>>, row: Vec<String>) {
    if row.iter().any(|field| !field.is_empty()) {
        rows.push(row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quoted_fields_and_skips_blank_lines() {
        let table = parse_table(
            "\"System_ID\",\"Title\"\r\n\r\n\"A1\", \"Intro, part \"\"one\"\"\"\nA2,  Plain  \n",
            "course.des",
        )
        .expect("table");
        assert_eq!(table.header, vec!["System_ID", "Title"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][1], "Intro, part \"one\"");
        assert_eq!(table.rows[1][1], "Plain");
    }

    #[test]
    fn records_match_header_case_insensitively() {
        let table = parse_table("system_id,FILE_NAME\nA1,index.html\nA2,", "c.au").expect("table");
        let records: Vec<_> = table.records().collect();
        assert_eq!(records[0].get("System_ID"), Some("A1"));
        assert_eq!(records[0].get("File_Name"), Some("index.html"));
        assert_eq!(records[1].get("File_Name"), None);
        assert_eq!(records[0].get("Missing"), None);
    }

    #[test]
    fn ragged_rows_and_rest() {
        let table = parse_table("block,member,member\nroot,B1,A1,A2\n", "c.cst").expect("table");
        let record = table.records().next().expect("row");
        assert_eq!(record.first(), Some("root"));
        assert_eq!(record.rest(1), vec!["B1", "A1", "A2"]);
    }

    #[test]
    fn quoted_field_may_span_lines() {
        let table = parse_table("id,text\nA1,\"line one\nline two\"\n", "c.des").expect("table");
        assert_eq!(table.rows[0][1], "line one\nline two");
    }

    #[test]
    fn rejects_unterminated_quote() {
        let err = parse_table("id\n\"A1\n", "c.au").expect_err("unterminated");
        assert!(matches!(err, PackageError::Ini { file, .. } if file == "c.au"));
    }

    #[test]
    fn rejects_text_after_closing_quote() {
        assert!(parse_table("id\n\"A1\"x\n", "c.au").is_err());
    }
}
