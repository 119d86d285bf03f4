//! Stored number formats of an OOXML package (`.xlsx`, `.xlsm`, `.xltx`)
//!
//! Each `<c>` in a sheet part names a cell format by its `s` index into
//! `cellXfs`; that entry's `numFmtId` is either a built-in id or one of the
//! package's own `<numFmt>` codes.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use sheetgrep_core::{CellAddress, NumberFormat};
use zip::ZipArchive;

use super::StoredFormats;
use crate::error::ReadError;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const STYLES_PART: &str = "xl/styles.xml";

/// Read every cell's stored number format and the workbook date system
pub(crate) fn read_formats(path: &Path) -> Result<StoredFormats, ReadError> {
    let mut archive = ZipArchive::new(File::open(path)?)?;

    let (sheets, date_1904) = read_workbook(&mut archive)?;
    let targets = read_workbook_rels(&mut archive)?;
    let xf_formats = read_styles(&mut archive)?;

    let mut stored = StoredFormats {
        date_1904,
        ..StoredFormats::default()
    };
    if xf_formats.iter().all(|f| *f == NumberFormat::General) {
        return Ok(stored);
    }

    for (name, r_id) in sheets {
        let Some(part) = targets.get(&r_id) else {
            continue;
        };
        let cells = read_sheet_styles(&mut archive, part, &xf_formats)?;
        if !cells.is_empty() {
            stored.sheets.insert(name, cells);
        }
    }
    Ok(stored)
}

fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn is_true(value: Option<String>) -> bool {
    matches!(value.as_deref(), Some("1") | Some("true"))
}

/// Sheet `(name, r:id)` pairs in declared order, and `workbookPr/@date1904`
fn read_workbook<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> Result<(Vec<(String, String)>, bool), ReadError> {
    let file = archive.by_name(WORKBOOK_PART)?;
    let mut xml = Reader::from_reader(BufReader::new(file));
    let mut buf = Vec::new();
    let mut sheets = Vec::new();
    let mut date_1904 = false;

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"workbookPr" => date_1904 = is_true(attr(&e, b"date1904")),
                b"sheet" => {
                    if let (Some(name), Some(r_id)) = (attr(&e, b"name"), attr(&e, b"r:id")) {
                        sheets.push((name, r_id));
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok((sheets, date_1904))
}

/// Worksheet relationship id to part name
fn read_workbook_rels<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> Result<HashMap<String, String>, ReadError> {
    let file = archive.by_name(WORKBOOK_RELS_PART)?;
    let mut xml = Reader::from_reader(BufReader::new(file));
    let mut buf = Vec::new();
    let mut targets = HashMap::new();

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"Relationship" => {
                let is_sheet = attr(&e, b"Type").is_some_and(|t| t.ends_with("/worksheet"));
                if let (true, Some(id), Some(target)) =
                    (is_sheet, attr(&e, b"Id"), attr(&e, b"Target"))
                {
                    targets.insert(id, part_name(&target));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(targets)
}

/// Resolve a relationship target against the `xl/` folder
fn part_name(target: &str) -> String {
    let joined = match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    };

    let mut parts: Vec<&str> = Vec::new();
    for part in joined.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            _ => parts.push(part),
        }
    }
    parts.join("/")
}

/// The number format of each `cellXfs` entry, by index
fn read_styles<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Vec<NumberFormat>, ReadError> {
    let file = match archive.by_name(STYLES_PART) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut xml = Reader::from_reader(BufReader::new(file));
    let mut buf = Vec::new();
    let mut custom: HashMap<u32, String> = HashMap::new();
    let mut xf_ids: Vec<u32> = Vec::new();
    let mut in_cell_xfs = false;

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"cellXfs" => in_cell_xfs = true,
            Event::End(e) if e.name().as_ref() == b"cellXfs" => in_cell_xfs = false,
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"numFmt" => {
                    let id = attr(&e, b"numFmtId").and_then(|v| v.parse().ok());
                    if let (Some(id), Some(code)) = (id, attr(&e, b"formatCode")) {
                        custom.insert(id, code);
                    }
                }
                b"xf" if in_cell_xfs => {
                    let id = attr(&e, b"numFmtId").and_then(|v| v.parse().ok());
                    xf_ids.push(id.unwrap_or(0));
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(xf_ids
        .into_iter()
        .map(|id| match custom.get(&id) {
            Some(code) => NumberFormat::from_string(code.as_str()),
            None => NumberFormat::from_id(id),
        })
        .collect())
}

/// Cells of one sheet part whose style carries a non-General format
fn read_sheet_styles<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    part: &str,
    xf_formats: &[NumberFormat],
) -> Result<HashMap<CellAddress, NumberFormat>, ReadError> {
    let file = archive.by_name(part)?;
    let mut xml = Reader::from_reader(BufReader::new(file));
    let mut buf = Vec::new();
    let mut cells = HashMap::new();

    // Position of the next cell when `r` attributes are omitted
    let mut row: u32 = 0;
    let mut col: u32 = 0;
    let mut seen_row = false;

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"row" => {
                    row = match attr(&e, b"r").and_then(|r| r.parse::<u32>().ok()) {
                        Some(r) => r.saturating_sub(1),
                        None if seen_row => row + 1,
                        None => 0,
                    };
                    col = 0;
                    seen_row = true;
                }
                b"c" => {
                    let addr = match attr(&e, b"r") {
                        Some(r) => CellAddress::parse(&r)?,
                        None => CellAddress::checked(row, col)?,
                    };
                    col = u32::from(addr.col) + 1;

                    let format = attr(&e, b"s")
                        .and_then(|s| s.parse::<usize>().ok())
                        .and_then(|s| xf_formats.get(s));
                    if let Some(format) = format.filter(|f| **f != NumberFormat::General) {
                        cells.insert(addr, format.clone());
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(cells)
}
