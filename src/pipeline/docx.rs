//! DOCX raw-text extraction.
//!
//! A `.docx` is a zip package; the body lives in `word/document.xml`. Text
//! runs (`w:t`) are concatenated per paragraph (`w:p`) and paragraphs are
//! joined by a blank line. Tabs and breaks become `\t` and `\n`. Styling,
//! numbering, headers and footers are dropped.

use crate::error::ConvertError;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

const DOCUMENT_PART: &str = "word/document.xml";
const PARAGRAPH_SEPARATOR: &str = "\n\n";
/// `mc:Choice` of an `mc:AlternateContent` block; only `mc:Fallback` is read.
const ALTERNATE_CHOICE: &[u8] = b"Choice";

/// Extract the raw text of the DOCX at `path`.
///
/// Blocking; call from `spawn_blocking`.
pub fn extract_raw_text(path: &Path) -> Result<String, ConvertError> {
    let corrupt = |detail: String| ConvertError::CorruptDocx {
        path: path.to_path_buf(),
        detail,
    };

    let file = File::open(path).map_err(|e| ConvertError::io(path, e))?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))
        .map_err(|e| corrupt(format!("not a zip package: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| corrupt(format!("missing {DOCUMENT_PART}: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| corrupt(format!("unreadable {DOCUMENT_PART}: {e}")))?;

    let paragraphs = paragraphs_from_xml(&xml).map_err(corrupt)?;
    debug!("DOCX: {} paragraphs", paragraphs.len());
    Ok(paragraphs.join(PARAGRAPH_SEPARATOR))
}

/// Split `word/document.xml` into paragraph strings, in document order.
///
/// Paragraphs nested inside another paragraph (text boxes) are emitted
/// before the paragraph that contains them. Content written twice under
/// `mc:AlternateContent` is read from the fallback branch only.
fn paragraphs_from_xml(xml: &str) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut open: Vec<String> = Vec::new();
    let mut in_text = false;
    let mut skipped_choices = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == ALTERNATE_CHOICE => {
                skipped_choices += 1;
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == ALTERNATE_CHOICE => {
                skipped_choices = skipped_choices.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "XML error at position {}: {e}",
                    reader.buffer_position()
                ))
            }
            Ok(_) if skipped_choices > 0 => {}
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"p" => open.push(String::new()),
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"p" => paragraphs.push(String::new()),
                b"tab" => push_to(&mut open, "\t"),
                b"br" | b"cr" => push_to(&mut open, "\n"),
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"p" => {
                    if let Some(p) = open.pop() {
                        paragraphs.push(p);
                    }
                }
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                push_to(&mut open, &String::from_utf8_lossy(e.as_ref()));
            }
            Ok(Event::GeneralRef(e)) if in_text => {
                let name = String::from_utf8_lossy(e.as_ref()).to_string();
                match resolve_entity(&name) {
                    Some(c) => push_to(&mut open, c.encode_utf8(&mut [0u8; 4])),
                    None => return Err(format!("unknown entity '&{name};'")),
                }
            }
            Ok(Event::CData(e)) if in_text => {
                push_to(&mut open, &String::from_utf8_lossy(e.as_ref()));
            }
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn push_to(open: &mut [String], s: &str) {
    if let Some(current) = open.last_mut() {
        current.push_str(s);
    }
}

/// Resolve the five predefined XML entities and numeric character references.
fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}
