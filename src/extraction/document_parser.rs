//! Text extraction from office documents
//!
//! Works on in-memory bytes, no external system libraries:
//! - Word: .docx via docx-rs, raw paragraph and table text
//! - Excel: .xlsx / .xls / .ods via calamine, every sheet as CSV

use crate::error::{LedgerError, Result};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use std::io::Cursor;

/// Raw text of a .docx document, one line per paragraph or table row
pub fn extract_docx_text(bytes: &[u8]) -> Result<String> {
    let doc = docx_rs::read_docx(bytes)
        .map_err(|e| LedgerError::extraction(format!("Failed to parse DOCX: {}", e)))?;

    let mut output = String::new();
    for child in &doc.document.children {
        push_document_child(child, &mut output);
    }

    tracing::debug!("[DocumentParser] DOCX extracted: {} chars", output.len());
    Ok(output.trim_end().to_string())
}

fn push_document_child(element: &docx_rs::DocumentChild, output: &mut String) {
    match element {
        docx_rs::DocumentChild::Paragraph(para) => {
            push_paragraph(para, output);
            output.push('\n');
        }
        docx_rs::DocumentChild::Table(table) => {
            for row in &table.rows {
                let docx_rs::TableChild::TableRow(tr) = row;
                let mut cells = Vec::with_capacity(tr.cells.len());
                for cell in &tr.cells {
                    let docx_rs::TableRowChild::TableCell(tc) = cell;
                    let mut cell_text = String::new();
                    for content in &tc.children {
                        if let docx_rs::TableCellContent::Paragraph(para) = content {
                            if !cell_text.is_empty() {
                                cell_text.push(' ');
                            }
                            push_paragraph(para, &mut cell_text);
                        }
                    }
                    cells.push(cell_text);
                }
                output.push_str(&cells.join("\t"));
                output.push('\n');
            }
        }
        _ => {}
    }
}

fn push_paragraph(para: &docx_rs::Paragraph, output: &mut String) {
    for child in &para.children {
        match child {
            docx_rs::ParagraphChild::Run(run) => push_run(run, output),
            docx_rs::ParagraphChild::Hyperlink(link) => {
                for inner in &link.children {
                    if let docx_rs::ParagraphChild::Run(run) = inner {
                        push_run(run, output);
                    }
                }
            }
            _ => {}
        }
    }
}

fn push_run(run: &docx_rs::Run, output: &mut String) {
    for run_child in &run.children {
        match run_child {
            docx_rs::RunChild::Text(text) => output.push_str(&text.text),
            docx_rs::RunChild::Tab(_) => output.push('\t'),
            _ => {}
        }
    }
}

/// Every sheet of a workbook as CSV, sheets separated by a newline
pub fn extract_spreadsheet_csv(bytes: &[u8]) -> Result<String> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| LedgerError::extraction(format!("Failed to open spreadsheet: {}", e)))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(sheet_names.len());

    for sheet_name in &sheet_names {
        let range = workbook.worksheet_range(sheet_name).map_err(|e| {
            LedgerError::extraction(format!("Failed to read sheet '{}': {}", sheet_name, e))
        })?;
        sheets.push(range_to_csv(&range));
    }

    tracing::debug!(
        "[DocumentParser] Spreadsheet extracted: {} sheets",
        sheet_names.len()
    );
    Ok(sheets.join("\n"))
}

fn range_to_csv(range: &Range<Data>) -> String {
    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect();
    rows_to_csv(&rows)
}

/// RFC 4180 style rows, each terminated by a newline
pub(crate) fn rows_to_csv(rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    for row in rows {
        let line: Vec<String> = row.iter().map(|field| csv_field(field)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{Docx, Paragraph, Run, Table, TableCell, TableRow};

    fn build_docx(doc: Docx) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        doc.build().pack(&mut cursor).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_docx_paragraphs_and_tables() {
        let doc = Docx::new()
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("SAO KÊ TÀI KHOẢN")))
            .add_table(Table::new(vec![TableRow::new(vec![
                TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text("01/01/2024"))),
                TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text("1.000.000"))),
            ])]));

        let text = extract_docx_text(&build_docx(doc)).unwrap();
        assert!(text.contains("SAO KÊ TÀI KHOẢN\n"));
        assert!(text.contains("01/01/2024\t1.000.000"));
    }

    #[test]
    fn test_invalid_docx_is_extraction_error() {
        assert!(matches!(
            extract_docx_text(b"not a zip"),
            Err(LedgerError::Extraction(_))
        ));
    }

    #[test]
    fn test_invalid_workbook_is_extraction_error() {
        assert!(matches!(
            extract_spreadsheet_csv(b"garbage"),
            Err(LedgerError::Extraction(_))
        ));
    }

    #[test]
    fn test_csv_quoting() {
        let rows = vec![
            vec!["Ngày".to_string(), "Nội dung".to_string(), "Số tiền".to_string()],
            vec![
                "01/01/2024".to_string(),
                "CK, phí \"nhanh\"".to_string(),
                "1,000,000".to_string(),
            ],
        ];
        assert_eq!(
            rows_to_csv(&rows),
            "Ngày,Nội dung,Số tiền\n01/01/2024,\"CK, phí \"\"nhanh\"\"\",\"1,000,000\"\n"
        );
    }

    #[test]
    fn test_csv_keeps_empty_cells() {
        let rows = vec![vec!["a".to_string(), String::new(), "c".to_string()]];
        assert_eq!(rows_to_csv(&rows), "a,,c\n");
    }
}
