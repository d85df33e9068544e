//! Generic Centroid Parser
//!
//! Reads pick-and-place centroid exports. Each data line has the layout
//!
//! ```text
//! ref,footprint,value,x,y,rotation,side[,...]
//! ```
//!
//! Key format details:
//! - Coordinates are in millimeters with the origin at the board's lower-left corner
//! - Side is `top` for the front face, anything else is the back face
//! - A line whose first field starts with the comment marker is skipped
//! - Columns past the seventh are ignored

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::Read;

use csv::StringRecord;
use thiserror::Error;

use crate::parser::schema::{PlacementRecord, Side};

/// Minimum number of fields a data line must carry.
pub const REQUIRED_FIELDS: usize = 7;

#[derive(Debug, Error)]
pub enum CentroidParseError {
    #[error("line {line}: expected at least 7 fields, found {found}")]
    MalformedRow { line: u64, found: usize },
    #[error("line {line}: invalid number in '{field}' field: {value:?}")]
    InvalidNumber {
        line: u64,
        field: &'static str,
        value: String,
    },
    #[error("line {line}: duplicate reference designator '{reference}' (first seen on line {first_line})")]
    DuplicateReference {
        reference: String,
        line: u64,
        first_line: u64,
    },
    #[error("Unreadable centroid source: {0}")]
    UnreadableSource(#[from] csv::Error),
}

impl From<std::io::Error> for CentroidParseError {
    fn from(e: std::io::Error) -> Self {
        CentroidParseError::UnreadableSource(csv::Error::from(e))
    }
}

/// Parser for generic centroid files.
///
/// Field splitting follows the usual delimited-text rules (double quotes may
/// wrap a field containing the delimiter). The delimiter and the comment
/// marker are configurable; both must be single ASCII characters.
#[derive(Debug, Clone, Copy)]
pub struct CentroidParser {
    delimiter: u8,
    comment_marker: u8,
}

impl Default for CentroidParser {
    fn default() -> Self {
        Self {
            delimiter: b',',
            comment_marker: b'#',
        }
    }
}

impl CentroidParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_comment_marker(mut self, marker: u8) -> Self {
        self.comment_marker = marker;
        self
    }

    /// Parse centroid text from any reader.
    ///
    /// The source is read once, up front; a read or UTF-8 failure is reported
    /// as [`CentroidParseError::UnreadableSource`].
    pub fn parse_reader<R: Read>(&self, mut reader: R) -> Result<Vec<PlacementRecord>, CentroidParseError> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        self.parse_str(&content)
    }

    /// Parse centroid text already held in memory.
    ///
    /// Stops at the first bad line; no partial result is returned. A leading
    /// byte-order mark is ignored, and lines may end in LF, CRLF or a lone CR.
    pub fn parse_str(&self, content: &str) -> Result<Vec<PlacementRecord>, CentroidParseError> {
        let content = normalize_text(content);
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .comment(Some(self.comment_marker))
            .from_reader(content.as_bytes());

        let mut lines = LineCounter::new(content.as_bytes(), self.comment_marker);
        let mut records = Vec::new();
        let mut seen: HashMap<String, u64> = HashMap::new();

        for result in csv_reader.records() {
            let row = result?;
            let start = row.position().map(|p| p.byte() as usize).unwrap_or(0);
            let line = lines.record_line(start);

            if self.is_comment(&row) {
                tracing::debug!("Skipping comment on line {}", line);
                continue;
            }

            let record = Self::parse_row(&row, line)?;

            if let Some(&first_line) = seen.get(&record.ref_designator) {
                return Err(CentroidParseError::DuplicateReference {
                    reference: record.ref_designator,
                    line,
                    first_line,
                });
            }
            seen.insert(record.ref_designator.clone(), line);
            records.push(record);
        }

        tracing::debug!("Parsed {} placement records", records.len());
        Ok(records)
    }

    fn is_comment(&self, row: &StringRecord) -> bool {
        row.get(0)
            .map(|first| first.as_bytes().first() == Some(&self.comment_marker))
            .unwrap_or(false)
    }

    fn parse_row(row: &StringRecord, line: u64) -> Result<PlacementRecord, CentroidParseError> {
        if row.len() < REQUIRED_FIELDS {
            return Err(CentroidParseError::MalformedRow {
                line,
                found: row.len(),
            });
        }

        let x = Self::parse_number(row, 3, "x", line)?;
        let y = Self::parse_number(row, 4, "y", line)?;
        let rotation = Self::parse_number(row, 5, "rotation", line)?;

        Ok(PlacementRecord {
            ref_designator: row[0].to_string(),
            footprint: row[1].to_string(),
            value: row[2].to_string(),
            position: (x, y),
            rotation,
            side: Side::from_token(&row[6]),
            line,
        })
    }

    fn parse_number(
        row: &StringRecord,
        index: usize,
        field: &'static str,
        line: u64,
    ) -> Result<f64, CentroidParseError> {
        let raw = &row[index];
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| CentroidParseError::InvalidNumber {
                line,
                field,
                value: raw.to_string(),
            })
    }
}

/// Maps record start offsets to 1-based line numbers.
///
/// The csv reader reports where it started scanning for a record, which is
/// before any blank or comment lines it skipped on the way. Those are skipped
/// here too so the line points at the record itself. Offsets must be fed in
/// increasing order.
struct LineCounter<'a> {
    bytes: &'a [u8],
    comment_marker: u8,
    offset: usize,
    line: u64,
}

impl<'a> LineCounter<'a> {
    fn new(bytes: &'a [u8], comment_marker: u8) -> Self {
        Self {
            bytes,
            comment_marker,
            offset: 0,
            line: 1,
        }
    }

    fn record_line(&mut self, start: usize) -> u64 {
        let start = start.clamp(self.offset, self.bytes.len());
        self.advance_to(start);

        while let Some(&b) = self.bytes.get(self.offset) {
            if b == b'\n' {
                self.advance_to(self.offset + 1);
            } else if b == self.comment_marker {
                let end = self.bytes[self.offset..]
                    .iter()
                    .position(|&c| c == b'\n')
                    .map(|i| self.offset + i + 1)
                    .unwrap_or(self.bytes.len());
                self.advance_to(end);
            } else {
                break;
            }
        }
        self.line
    }

    fn advance_to(&mut self, end: usize) {
        let newlines = self.bytes[self.offset..end].iter().filter(|&&b| b == b'\n').count();
        self.line += newlines as u64;
        self.offset = end;
    }
}

/// Drops a leading byte-order mark and folds CRLF and lone CR line endings
/// into LF. The csv reader and [`LineCounter`] both run on the result, so
/// they see the same line breaks and byte offsets.
fn normalize_text(content: &str) -> Cow<'_, str> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    if content.contains('\r') {
        Cow::Owned(content.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(content)
    }
}

/// Convenience function for parsing comma-separated centroid text.
pub fn parse_centroid(content: &str) -> Result<Vec<PlacementRecord>, CentroidParseError> {
    CentroidParser::new().parse_str(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_row() {
        let records = parse_centroid("R1,0402,10k,12.50,8.00,90,top\n").unwrap();
        assert_eq!(records.len(), 1);

        let r1 = &records[0];
        assert_eq!(r1.ref_designator, "R1");
        assert_eq!(r1.footprint, "0402");
        assert_eq!(r1.value, "10k");
        assert_eq!(r1.position, (12.5, 8.0));
        assert_eq!(r1.rotation, 90.0);
        assert_eq!(r1.side, Side::Top);
        assert_eq!(r1.line, 1);
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let content = "# Ref,Footprint,Value,X,Y,Rot,Side\n\nC1,0603,100n,1,2,0,bottom\n#C2,0603,100n,1,2,0,top\n";
        let records = parse_centroid(content).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ref_designator, "C1");
        assert_eq!(records[0].line, 3);
    }

    #[test]
    fn test_quoted_comment_field_is_skipped() {
        let records = parse_centroid("\"#note\",a,b,c,d,e,f\nR1,0402,1k,0,0,0,top\n").unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let records = parse_centroid("U1,QFN-32,MCU,10,10,180,top,extra,columns\n").unwrap();
        assert_eq!(records[0].ref_designator, "U1");
        assert_eq!(records[0].rotation, 180.0);
    }

    #[test]
    fn test_quoted_field_keeps_delimiter() {
        let records = parse_centroid("R1,\"0402,thin\",10k,1,1,0,top\n").unwrap();
        assert_eq!(records[0].footprint, "0402,thin");
    }

    #[test]
    fn test_numbers_tolerate_surrounding_whitespace() {
        let records = parse_centroid("R1,0402,10k, 1.5 , 2.5 , -45 ,top\n").unwrap();
        assert_eq!(records[0].position, (1.5, 2.5));
        assert_eq!(records[0].rotation, -45.0);
    }

    #[test]
    fn test_short_row_is_malformed() {
        let err = parse_centroid("R1,0402,10k,1,2\n").unwrap_err();
        match err {
            CentroidParseError::MalformedRow { line, found } => {
                assert_eq!(line, 1);
                assert_eq!(found, 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_number_names_field_and_line() {
        let content = "R1,0402,10k,1,2,0,top\nR2,0402,10k,1,abc,0,top\n";
        let err = parse_centroid(content).unwrap_err();
        match err {
            CentroidParseError::InvalidNumber { line, field, value } => {
                assert_eq!(line, 2);
                assert_eq!(field, "y");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_finite_number_is_rejected() {
        let err = parse_centroid("R1,0402,10k,nan,2,0,top\n").unwrap_err();
        assert!(matches!(err, CentroidParseError::InvalidNumber { field: "x", .. }));
    }

    #[test]
    fn test_duplicate_reference_is_rejected() {
        let content = "R1,0402,10k,1,2,0,top\nR1,0603,1k,3,4,0,bottom\n";
        let err = parse_centroid(content).unwrap_err();
        match err {
            CentroidParseError::DuplicateReference {
                reference,
                line,
                first_line,
            } => {
                assert_eq!(reference, "R1");
                assert_eq!(line, 2);
                assert_eq!(first_line, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_custom_delimiter_and_comment_marker() {
        let parser = CentroidParser::new()
            .with_delimiter(b';')
            .with_comment_marker(b'%');
        let err = parser
            .parse_str("% header\nR1;0402;10k;1,5;2;0;top\n")
            .unwrap_err();
        // "1,5" is not a number when ';' separates fields
        assert!(matches!(err, CentroidParseError::InvalidNumber { field: "x", .. }));

        let records = parser.parse_str("% header\nR1;0402;10k;1.5;2;0;top\n").unwrap();
        assert_eq!(records[0].position, (1.5, 2.0));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_centroid("").unwrap().is_empty());
        assert!(parse_centroid("# only a comment\n").unwrap().is_empty());
    }

    #[test]
    fn test_line_numbers_count_skipped_lines() {
        let content = "# header\r\n\r\n# units: mm\r\nR1,0402,10k,1,2,0,top\r\n\r\nR2,0402,10k,1,2\r\n";
        let err = parse_centroid(content).unwrap_err();
        assert!(matches!(err, CentroidParseError::MalformedRow { line: 6, found: 5 }));

        let records = parse_centroid("# header\n\nR1,0402,10k,1,2,0,top\n#\nR2,0402,10k,1,2,0,top").unwrap();
        let lines: Vec<u64> = records.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![3, 5]);
    }

    #[test]
    fn test_line_numbers_after_byte_order_mark() {
        let err = parse_centroid("\u{feff}# Ref,Pkg\n# units: mm\nR1,0402,10k,1,2\n").unwrap_err();
        assert!(matches!(err, CentroidParseError::MalformedRow { line: 3, found: 5 }));

        let records = parse_centroid("\u{feff}R1,0402,10k,1,2,0,top\n").unwrap();
        assert_eq!(records[0].ref_designator, "R1");
        assert_eq!(records[0].line, 1);
    }

    #[test]
    fn test_line_numbers_with_bare_carriage_returns() {
        let content = "# a\rR1,0402,10k,1,2,0,top\rR2,0402,10k,1,2\r";
        let err = parse_centroid(content).unwrap_err();
        assert!(matches!(err, CentroidParseError::MalformedRow { line: 3, found: 5 }));

        let records = parse_centroid("# a\rR1,0402,10k,1,2,0,top\r\rR2,0402,10k,1,2,0,bottom\r").unwrap();
        let lines: Vec<u64> = records.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![2, 4]);
        assert_eq!(records[1].side, Side::Bottom);
    }

    #[test]
    fn test_invalid_utf8_is_unreadable() {
        let bytes: &[u8] = b"R1,04\xff02,10k,1,2,0,top\n";
        let err = CentroidParser::new().parse_reader(bytes).unwrap_err();
        assert!(matches!(err, CentroidParseError::UnreadableSource(_)));
    }
}
