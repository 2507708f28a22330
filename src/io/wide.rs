//! Wide measurement sheet format
//!
//! Layout:
//! - row 1: free headers; must mention "input", "tolerance" and "correction"
//! - row 2: `input1, input2, tolerance, correction`
//! - row 3: column labels; must mention "nominal"
//! - row 4+: four 4-column blocks in lane order A..D, each
//!   `line, nominal, measured left, measured right`
//!
//! The delimiter is comma, semicolon or tab, whichever the first line uses
//! most. Numbers may use a decimal comma.

use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};
use thiserror::Error;

use crate::core::numeric::{format_number, parse_decimal};
use crate::entities::measurement::{LineBlock, MeasurementRow, MeasurementSheet, SessionMeta};

/// Columns per lane block
const BLOCK_WIDTH: usize = 4;

/// Candidate delimiters in tie-breaking order
const DELIMITERS: [u8; 3] = [b',', b';', b'\t'];

const HEADER_MARKERS: [&str; 3] = ["input", "tolerance", "correction"];
const LABEL_MARKER: &str = "nominal";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Unrecognized file format: {0}")]
    UnrecognizedFormat(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to write CSV: {0}")]
    Write(String),

    #[error("No measurement sheet has been imported. Run 'wingtrim import <file>' first")]
    NoSheet,
}

/// Pick the delimiter used most often in the first line
pub fn sniff_delimiter(text: &str) -> u8 {
    let first_line = text.lines().next().unwrap_or("");
    let mut best = b',';
    let mut best_count = 0;
    for candidate in DELIMITERS {
        let count = first_line.bytes().filter(|b| *b == candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

fn cell(record: &[String], index: usize) -> &str {
    record.get(index).map(String::as_str).unwrap_or("")
}

fn contains_marker(record: &[String], marker: &str) -> bool {
    record
        .iter()
        .any(|field| field.to_lowercase().contains(marker))
}

fn check_markers(records: &[Vec<String>]) -> Result<(), ImportError> {
    if records.len() < 3 {
        return Err(ImportError::UnrecognizedFormat(format!(
            "expected at least 3 header rows, found {}",
            records.len()
        )));
    }

    let missing: Vec<&str> = HEADER_MARKERS
        .iter()
        .copied()
        .filter(|marker| !contains_marker(&records[0], marker))
        .collect();
    if !missing.is_empty() {
        return Err(ImportError::UnrecognizedFormat(format!(
            "row 1 does not mention {}",
            missing.join(", ")
        )));
    }

    if !contains_marker(&records[2], LABEL_MARKER) {
        return Err(ImportError::UnrecognizedFormat(format!(
            "row 3 does not mention {}",
            LABEL_MARKER
        )));
    }
    Ok(())
}

fn read_row(record: &[String]) -> MeasurementRow {
    let mut row = MeasurementRow::default();
    for (lane, block) in row.blocks.iter_mut().enumerate() {
        let base = lane * BLOCK_WIDTH;
        *block = LineBlock::new(
            cell(record, base).trim(),
            parse_decimal(cell(record, base + 1)),
            parse_decimal(cell(record, base + 2)),
            parse_decimal(cell(record, base + 3)),
        );
    }
    row
}

/// Parse a wide sheet
///
/// Fails before producing anything when the header markers are missing.
/// Unparsable numbers become empty cells; rows with every block empty are
/// dropped.
pub fn parse_wide(text: &str) -> Result<MeasurementSheet, ImportError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let delimiter = sniff_delimiter(text);

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        records.push(record.iter().map(str::to_string).collect());
    }

    check_markers(&records)?;

    let meta_row = &records[1];
    let meta = SessionMeta {
        input1: cell(meta_row, 0).trim().to_string(),
        input2: cell(meta_row, 1).trim().to_string(),
        tolerance: parse_decimal(cell(meta_row, 2)).unwrap_or(0.0),
        correction: parse_decimal(cell(meta_row, 3)).unwrap_or(0.0),
    };

    let rows: Vec<MeasurementRow> = records[3..]
        .iter()
        .map(|record| read_row(record))
        .filter(|row| !row.is_empty())
        .collect();

    tracing::info!(
        "Parsed wide sheet: {} rows, delimiter {:?}",
        rows.len(),
        delimiter as char
    );

    Ok(MeasurementSheet {
        meta,
        rows,
        delimiter: delimiter as char,
        header_row: records[0].clone(),
        label_row: records[2].clone(),
    })
}

fn optional_number(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_default()
}

fn default_header_row() -> Vec<String> {
    vec![
        "Input 1".to_string(),
        "Input 2".to_string(),
        "Tolerance".to_string(),
        "Correction".to_string(),
    ]
}

fn default_label_row() -> Vec<String> {
    ["A", "B", "C", "D"]
        .iter()
        .flat_map(|lane| {
            [
                format!("Line {}", lane),
                "Nominal".to_string(),
                "Left".to_string(),
                "Right".to_string(),
            ]
        })
        .collect()
}

/// Serialize a sheet in the wide layout
///
/// `rows` replaces the sheet's own rows, e.g. with applied measurements.
/// Fields containing the delimiter, a quote or a newline are quoted.
pub fn write_wide(sheet: &MeasurementSheet, rows: &[MeasurementRow]) -> Result<String, ImportError> {
    let delimiter = u8::try_from(sheet.delimiter).unwrap_or(b',');
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .flexible(true)
        .from_writer(Vec::new());

    let header_row = if sheet.header_row.is_empty() {
        default_header_row()
    } else {
        sheet.header_row.clone()
    };
    let label_row = if sheet.label_row.is_empty() {
        default_label_row()
    } else {
        sheet.label_row.clone()
    };

    writer.write_record(&header_row)?;
    writer.write_record([
        sheet.meta.input1.clone(),
        sheet.meta.input2.clone(),
        format_number(sheet.meta.tolerance),
        format_number(sheet.meta.correction),
    ])?;
    writer.write_record(&label_row)?;

    for row in rows {
        let fields: Vec<String> = row
            .blocks
            .iter()
            .flat_map(|block| {
                [
                    block.line.clone(),
                    optional_number(block.nominal),
                    optional_number(block.meas_l),
                    optional_number(block.meas_r),
                ]
            })
            .collect();
        writer.write_record(&fields)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ImportError::Write(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ImportError::Write(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Input 1;Input 2;Tolerance;Correction
Wing X;Size M;10;0,5
Line A;Nominal A;Left A;Right A;Line B;Nominal B;Left B;Right B;Line C;Nominal C;Left C;Right C;Line D;Nominal D;Left D;Right D
A1;1000;1005;995;B1;980,5;981;;;;;;;;;
;;;;;;;;;;;;;;;
A02;1010;1012;1011;;;;;;;;;D1;900;903;899
";

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter("a;b;c,d"), b';');
        assert_eq!(sniff_delimiter("a\tb\tc"), b'\t');
        assert_eq!(sniff_delimiter("a,b"), b',');
        assert_eq!(sniff_delimiter("nothing here"), b',');
        assert_eq!(sniff_delimiter(""), b',');
        // Ties go to the earlier candidate
        assert_eq!(sniff_delimiter("a,b;c"), b',');
    }

    #[test]
    fn test_parse_sample_sheet() {
        let sheet = parse_wide(SAMPLE).unwrap();
        assert_eq!(sheet.delimiter, ';');
        assert_eq!(sheet.meta.input1, "Wing X");
        assert_eq!(sheet.meta.input2, "Size M");
        assert_eq!(sheet.meta.tolerance, 10.0);
        assert_eq!(sheet.meta.correction, 0.5);
        assert_eq!(sheet.rows.len(), 2, "blank row is dropped");

        let first = &sheet.rows[0];
        assert_eq!(first.blocks[0], LineBlock::new("A1", Some(1000.0), Some(1005.0), Some(995.0)));
        assert_eq!(first.blocks[1], LineBlock::new("B1", Some(980.5), Some(981.0), None));
        assert!(first.blocks[2].is_empty());

        let second = &sheet.rows[1];
        assert_eq!(second.blocks[0].line, "A02");
        assert_eq!(second.blocks[3], LineBlock::new("D1", Some(900.0), Some(903.0), Some(899.0)));
    }

    #[test]
    fn test_short_rows_are_padded() {
        let text = "input,tolerance,correction\n,,5,0\nnominal\nA1,1000,1001\n";
        let sheet = parse_wide(text).unwrap();
        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(sheet.rows[0].blocks[0].meas_r, None);
        assert_eq!(sheet.meta.tolerance, 5.0);
    }

    #[test]
    fn test_markers_are_case_insensitive() {
        let text = "INPUT\tTOLERANCE\tCORRECTION\n\t\t\t\nNOMINAL\n";
        let sheet = parse_wide(text).unwrap();
        assert_eq!(sheet.delimiter, '\t');
        assert!(sheet.rows.is_empty());
        assert_eq!(sheet.meta.tolerance, 0.0);
    }

    #[test]
    fn test_rejects_missing_header_markers() {
        let text = "input,correction\n,,1,0\nnominal\n";
        let err = parse_wide(text).unwrap_err();
        assert!(matches!(err, ImportError::UnrecognizedFormat(_)));
        assert!(err.to_string().contains("tolerance"));
    }

    #[test]
    fn test_rejects_missing_nominal_marker() {
        let text = "input,tolerance,correction\n,,1,0\nline,length\nA1,1,1,1\n";
        assert!(matches!(
            parse_wide(text),
            Err(ImportError::UnrecognizedFormat(_))
        ));
    }

    #[test]
    fn test_rejects_too_few_rows() {
        assert!(matches!(
            parse_wide("input,tolerance,correction\n"),
            Err(ImportError::UnrecognizedFormat(_))
        ));
        assert!(parse_wide("").is_err());
    }

    #[test]
    fn test_write_uses_detected_delimiter_and_quotes() {
        let mut sheet = parse_wide(SAMPLE).unwrap();
        sheet.meta.input1 = "Wing; \"X\"".to_string();
        let out = write_wide(&sheet, &sheet.rows).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Input 1;Input 2;Tolerance;Correction");
        assert_eq!(lines[1], "\"Wing; \"\"X\"\"\";Size M;10;0.5");
        assert!(lines[3].starts_with("A1;1000;1005;995;B1;980.5;981;;"));
    }

    #[test]
    fn test_written_sheet_parses_back() {
        let sheet = parse_wide(SAMPLE).unwrap();
        let out = write_wide(&sheet, &sheet.rows).unwrap();
        let again = parse_wide(&out).unwrap();
        assert_eq!(again.rows, sheet.rows);
        assert_eq!(again.meta, sheet.meta);
    }

    #[test]
    fn test_write_without_headers_uses_defaults() {
        let sheet = MeasurementSheet::default();
        let out = write_wide(&sheet, &[]).unwrap();
        let again = parse_wide(&out).unwrap();
        assert!(again.rows.is_empty());
        assert_eq!(again.delimiter, ',');
    }
}
