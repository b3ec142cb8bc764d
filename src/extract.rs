//! Text extraction for Office Open XML uploads (`.docx`, `.xlsx`).
//!
//! Both formats are ZIP archives of XML parts. Word documents yield the text
//! of their `w:t` runs, one line per paragraph; workbooks yield the text of
//! every shared-string cell, one line per row.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;

/// Maximum worksheets read from one workbook.
const XLSX_MAX_SHEETS: usize = 100;
/// Maximum cells read per worksheet.
const XLSX_MAX_CELLS_PER_SHEET: usize = 100_000;
/// Maximum decompressed bytes read from a single ZIP entry.
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

type Archive<'a> = zip::ZipArchive<Cursor<&'a [u8]>>;

#[derive(Debug)]
pub enum ExtractError {
    /// The bytes are not a readable ZIP archive or lack a required part.
    Archive(String),
    /// An XML part could not be parsed.
    Xml(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Archive(e) => write!(f, "invalid office archive: {}", e),
            ExtractError::Xml(e) => write!(f, "invalid office XML: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

impl From<zip::result::ZipError> for ExtractError {
    fn from(e: zip::result::ZipError) -> Self {
        ExtractError::Archive(e.to_string())
    }
}

impl From<quick_xml::Error> for ExtractError {
    fn from(e: quick_xml::Error) -> Self {
        ExtractError::Xml(e.to_string())
    }
}

fn read_entry(archive: &mut Archive<'_>, name: &str) -> Result<Vec<u8>, ExtractError> {
    let entry = archive
        .by_name(name)
        .map_err(|e| ExtractError::Archive(format!("{}: {}", name, e)))?;
    let mut out = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut out)
        .map_err(|e| ExtractError::Archive(e.to_string()))?;
    if out.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ExtractError::Archive(format!(
            "{} exceeds size limit ({} bytes)",
            name, MAX_XML_ENTRY_BYTES
        )));
    }
    Ok(out)
}

/// Extract the paragraph text of a Word document.
pub fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let xml = read_entry(&mut archive, "word/document.xml")?;
    docx_paragraphs(&xml)
}

fn docx_paragraphs(xml: &[u8]) -> Result<String, ExtractError> {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_text = true,
            Event::Text(te) if in_text => {
                current.push_str(&te.unescape()?);
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    let line = current.trim();
                    if !line.is_empty() {
                        paragraphs.push(line.to_string());
                    }
                    current.clear();
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let tail = current.trim();
    if !tail.is_empty() {
        paragraphs.push(tail.to_string());
    }
    Ok(paragraphs.join("\n"))
}

/// Extract the shared-string cell text of every worksheet in a workbook.
pub fn extract_xlsx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let shared_strings = match archive.index_for_name("xl/sharedStrings.xml") {
        Some(_) => shared_strings(&read_entry(&mut archive, "xl/sharedStrings.xml")?)?,
        None => Vec::new(),
    };

    let mut sheet_names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("xl/worksheets/sheet") && n.ends_with(".xml"))
        .map(String::from)
        .collect();
    sheet_names.sort_by_key(|name| {
        name.trim_start_matches("xl/worksheets/sheet")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });

    let mut rows: Vec<String> = Vec::new();
    for name in sheet_names.iter().take(XLSX_MAX_SHEETS) {
        let xml = read_entry(&mut archive, name)?;
        rows.extend(sheet_rows(&xml, &shared_strings)?);
    }
    Ok(rows.join("\n"))
}

fn shared_strings(xml: &[u8]) -> Result<Vec<String>, ExtractError> {
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_text = true,
            Event::Text(te) if in_text => current.push_str(&te.unescape()?),
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"si" => strings.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

fn sheet_rows(xml: &[u8], shared_strings: &[String]) -> Result<Vec<String>, ExtractError> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut in_value = false;
    let mut shared = false;
    let mut cell_count = 0usize;

    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    while cell_count < XLSX_MAX_CELLS_PER_SHEET {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"c" => {
                    shared = e.attributes().flatten().any(|a| {
                        a.key.as_ref() == b"t" && a.value.as_ref() == b"s"
                    });
                }
                b"v" => in_value = true,
                _ => {}
            },
            Event::Text(te) if in_value && shared => {
                let value = te.unescape()?;
                if let Some(text) = value
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| shared_strings.get(i))
                {
                    row.push(text.clone());
                    cell_count += 1;
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" => in_value = false,
                b"c" => shared = false,
                b"row" if !row.is_empty() => rows.push(std::mem::take(&mut row).join(" ")),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    if !row.is_empty() {
        rows.push(row.join(" "));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn zip_of(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            for (name, body) in entries {
                zip.start_file(*name, zip::write::SimpleFileOptions::default())
                    .unwrap();
                zip.write_all(body.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buf
    }

    #[test]
    fn docx_paragraphs_become_lines() {
        let xml = r#"<?xml version="1.0"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>产品介绍</w:t></w:r></w:p><w:p><w:r><w:t>Hello </w:t></w:r><w:r><w:t>world &amp; more</w:t></w:r></w:p></w:body></w:document>"#;
        let bytes = zip_of(&[("word/document.xml", xml)]);
        assert_eq!(extract_docx(&bytes).unwrap(), "产品介绍\nHello world & more");
    }

    #[test]
    fn docx_without_document_part_is_error() {
        let bytes = zip_of(&[("word/other.xml", "<x/>")]);
        assert!(matches!(extract_docx(&bytes), Err(ExtractError::Archive(_))));
    }

    #[test]
    fn invalid_zip_is_error() {
        assert!(matches!(extract_docx(b"not a zip"), Err(ExtractError::Archive(_))));
        assert!(matches!(extract_xlsx(b"not a zip"), Err(ExtractError::Archive(_))));
    }

    #[test]
    fn xlsx_shared_strings_by_row() {
        let strings = r#"<sst><si><t>问题</t></si><si><t>答案</t></si><si><t>退货</t></si><si><t>七天内</t></si></sst>"#;
        let sheet = r#"<worksheet><sheetData><row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row><row r="2"><c r="A2" t="s"><v>2</v></c><c r="B2"><v>42</v></c><c r="C2" t="s"><v>3</v></c></row></sheetData></worksheet>"#;
        let bytes = zip_of(&[
            ("xl/sharedStrings.xml", strings),
            ("xl/worksheets/sheet1.xml", sheet),
        ]);
        assert_eq!(extract_xlsx(&bytes).unwrap(), "问题 答案\n退货 七天内");
    }

    #[test]
    fn xlsx_without_shared_strings_is_empty() {
        let sheet = r#"<worksheet><sheetData><row r="1"><c r="A1"><v>1</v></c></row></sheetData></worksheet>"#;
        let bytes = zip_of(&[("xl/worksheets/sheet1.xml", sheet)]);
        assert_eq!(extract_xlsx(&bytes).unwrap(), "");
    }
}
