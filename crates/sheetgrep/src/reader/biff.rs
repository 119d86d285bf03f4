//! Stored number formats of a BIFF8 workbook (`.xls`, `.xlt`)
//!
//! The `Workbook` stream of the compound file starts with the globals
//! substream (FORMAT, XF, DATEMODE and one BOUNDSHEET per sheet), followed
//! by one BOF..EOF substream per sheet. Every cell record carries an XF
//! index whose `ifmt` is a built-in id or a FORMAT record's id.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use log::debug;
use sheetgrep_core::{CellAddress, NumberFormat};

use super::StoredFormats;
use crate::error::ReadError;

const BOF: u16 = 0x0809;
const EOF: u16 = 0x000A;
const CONTINUE: u16 = 0x003C;
const DATEMODE: u16 = 0x0022;
const FORMAT: u16 = 0x041E;
const XF: u16 = 0x00E0;
const BOUNDSHEET: u16 = 0x0085;

const FORMULA: u16 = 0x0006;
const NUMBER: u16 = 0x0203;
const RK: u16 = 0x027E;
const MULRK: u16 = 0x00BD;
const LABEL: u16 = 0x0204;
const LABELSST: u16 = 0x00FD;
const BOOLERR: u16 = 0x0205;

const BIFF8_VERSION: u16 = 0x0600;
const SHEET_TYPE_WORKSHEET: u8 = 0;

/// Read every cell's stored number format and the workbook date system
pub(crate) fn read_formats(path: &Path) -> Result<StoredFormats, ReadError> {
    let mut file = cfb::open(path)?;
    let stream_path = ["/Workbook", "/Book"]
        .into_iter()
        .find(|p| file.exists(p))
        .ok_or_else(|| ReadError::Biff("no Workbook stream in compound file".into()))?;

    let mut stream = Vec::new();
    file.open_stream(stream_path)?.read_to_end(&mut stream)?;
    parse_formats(&stream)
}

/// A record body with its CONTINUE records appended
#[derive(Debug)]
struct Record {
    kind: u16,
    /// Offset of the record header in the stream
    offset: usize,
    data: Vec<u8>,
}

fn read_records(stream: &[u8]) -> Vec<Record> {
    let mut records: Vec<Record> = Vec::new();
    let mut offset = 0;

    while offset + 4 <= stream.len() {
        let kind = u16::from_le_bytes([stream[offset], stream[offset + 1]]);
        let len = u16::from_le_bytes([stream[offset + 2], stream[offset + 3]]) as usize;
        let Some(body) = stream.get(offset + 4..offset + 4 + len) else {
            break;
        };

        match (kind, records.last_mut()) {
            (CONTINUE, Some(prev)) => prev.data.extend_from_slice(body),
            (CONTINUE, None) => {}
            _ => records.push(Record {
                kind,
                offset,
                data: body.to_vec(),
            }),
        }
        offset += 4 + len;
    }
    records
}

fn parse_formats(stream: &[u8]) -> Result<StoredFormats, ReadError> {
    let records = read_records(stream);
    let mut stored = StoredFormats::default();

    match records.first() {
        Some(bof) if bof.kind == BOF => {
            let version = read_u16(&bof.data, &mut 0)?;
            if version != BIFF8_VERSION {
                debug!("BIFF version {:#06x} has no stored formats to read", version);
                return Ok(stored);
            }
        }
        _ => return Err(ReadError::Biff("stream does not start with BOF".into())),
    }

    let mut custom: HashMap<u16, String> = HashMap::new();
    let mut xf_ifmts: Vec<u16> = Vec::new();
    let mut sheets: Vec<(usize, String)> = Vec::new();

    for rec in &records[1..] {
        let mut off = 0;
        match rec.kind {
            EOF => break,
            DATEMODE => stored.date_1904 = read_u16(&rec.data, &mut off)? == 1,
            FORMAT => {
                let id = read_u16(&rec.data, &mut off)?;
                let code = read_unicode_string(&rec.data, &mut off)?;
                custom.insert(id, code);
            }
            XF => {
                off = 2;
                xf_ifmts.push(read_u16(&rec.data, &mut off)?);
            }
            BOUNDSHEET => {
                let position = read_u32(&rec.data, &mut off)? as usize;
                let _visibility = read_u8(&rec.data, &mut off)?;
                let sheet_type = read_u8(&rec.data, &mut off)?;
                let name = read_short_string(&rec.data, &mut off)?;
                if sheet_type == SHEET_TYPE_WORKSHEET {
                    sheets.push((position, name));
                }
            }
            _ => {}
        }
    }

    let xf_formats: Vec<NumberFormat> = xf_ifmts
        .into_iter()
        .map(|ifmt| match custom.get(&ifmt) {
            Some(code) => NumberFormat::from_string(code.as_str()),
            None => NumberFormat::from_id(u32::from(ifmt)),
        })
        .collect();

    for (position, name) in sheets {
        let start = records
            .iter()
            .position(|r| r.offset == position && r.kind == BOF);
        let Some(start) = start else {
            debug!("sheet '{}' has no substream at {:#x}", name, position);
            continue;
        };
        let cells = sheet_formats(&records[start + 1..], &xf_formats)?;
        if !cells.is_empty() {
            stored.sheets.insert(name, cells);
        }
    }
    Ok(stored)
}

/// Formats of the cell records in one sheet substream
fn sheet_formats(
    records: &[Record],
    xf_formats: &[NumberFormat],
) -> Result<HashMap<CellAddress, NumberFormat>, ReadError> {
    let mut cells = HashMap::new();
    let mut store = |row: u16, col: u16, xf: u16| -> Result<(), ReadError> {
        let format = xf_formats
            .get(usize::from(xf))
            .filter(|f| **f != NumberFormat::General);
        if let Some(format) = format {
            let addr = CellAddress::checked(u32::from(row), u32::from(col))?;
            cells.insert(addr, format.clone());
        }
        Ok(())
    };

    // Embedded chart substreams nest their own BOF..EOF
    let mut depth = 0usize;
    for rec in records {
        let data = &rec.data;
        let mut off = 0;
        match rec.kind {
            BOF => depth += 1,
            EOF if depth == 0 => break,
            EOF => depth -= 1,
            _ if depth > 0 => {}
            FORMULA | NUMBER | RK | LABEL | LABELSST | BOOLERR => {
                let row = read_u16(data, &mut off)?;
                let col = read_u16(data, &mut off)?;
                let xf = read_u16(data, &mut off)?;
                store(row, col, xf)?;
            }
            MULRK => {
                // row, first column, (xf, rk) per column, last column
                let row = read_u16(data, &mut off)?;
                let mut col = read_u16(data, &mut off)?;
                let end = data.len().saturating_sub(2);
                while off + 6 <= end {
                    let xf = read_u16(data, &mut off)?;
                    off += 4;
                    store(row, col, xf)?;
                    col = col.saturating_add(1);
                }
            }
            _ => {}
        }
    }
    Ok(cells)
}

fn truncated(offset: usize) -> ReadError {
    ReadError::Biff(format!("record truncated at offset {}", offset))
}

fn read_u8(data: &[u8], offset: &mut usize) -> Result<u8, ReadError> {
    let v = *data.get(*offset).ok_or_else(|| truncated(*offset))?;
    *offset += 1;
    Ok(v)
}

fn read_u16(data: &[u8], offset: &mut usize) -> Result<u16, ReadError> {
    let bytes = data.get(*offset..*offset + 2).ok_or_else(|| truncated(*offset))?;
    *offset += 2;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_u32(data: &[u8], offset: &mut usize) -> Result<u32, ReadError> {
    let bytes = data.get(*offset..*offset + 4).ok_or_else(|| truncated(*offset))?;
    *offset += 4;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// XLUnicodeString: u16 length, flags, optional rich/extended headers, characters
fn read_unicode_string(data: &[u8], offset: &mut usize) -> Result<String, ReadError> {
    let count = read_u16(data, offset)? as usize;
    let flags = read_u8(data, offset)?;
    if flags & 0x08 != 0 {
        read_u16(data, offset)?;
    }
    if flags & 0x04 != 0 {
        read_u32(data, offset)?;
    }
    read_chars(data, offset, count, flags & 0x01 != 0)
}

/// ShortXLUnicodeString: u8 length, flags, characters
fn read_short_string(data: &[u8], offset: &mut usize) -> Result<String, ReadError> {
    let count = read_u8(data, offset)? as usize;
    let flags = read_u8(data, offset)?;
    read_chars(data, offset, count, flags & 0x01 != 0)
}

/// UTF-16LE when `wide`, otherwise one Latin-1 byte per character
fn read_chars(
    data: &[u8],
    offset: &mut usize,
    count: usize,
    wide: bool,
) -> Result<String, ReadError> {
    let len = if wide { count * 2 } else { count };
    let bytes = data.get(*offset..*offset + len).ok_or_else(|| truncated(*offset))?;
    *offset += len;

    Ok(if wide {
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| char::from(b)).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::TempDir;

    fn record(kind: u16, body: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(body.len() + 4);
        out.extend_from_slice(&kind.to_le_bytes());
        out.extend_from_slice(&(body.len() as u16).to_le_bytes());
        out.extend_from_slice(body);
        out
    }

    fn bof(substream: u16) -> Vec<u8> {
        let mut body = BIFF8_VERSION.to_le_bytes().to_vec();
        body.extend_from_slice(&substream.to_le_bytes());
        body.extend_from_slice(&[0; 12]);
        record(BOF, &body)
    }

    fn xf(ifmt: u16) -> Vec<u8> {
        let mut body = vec![0, 0];
        body.extend_from_slice(&ifmt.to_le_bytes());
        body.resize(20, 0);
        record(XF, &body)
    }

    fn format(id: u16, code: &str) -> Vec<u8> {
        let mut body = id.to_le_bytes().to_vec();
        body.extend_from_slice(&(code.len() as u16).to_le_bytes());
        body.push(0);
        body.extend_from_slice(code.as_bytes());
        record(FORMAT, &body)
    }

    fn boundsheet(position: u32, sheet_type: u8, name: &str) -> Vec<u8> {
        let mut body = position.to_le_bytes().to_vec();
        body.extend_from_slice(&[0, sheet_type, name.len() as u8, 0]);
        body.extend_from_slice(name.as_bytes());
        record(BOUNDSHEET, &body)
    }

    fn number(row: u16, col: u16, xf: u16, value: f64) -> Vec<u8> {
        let mut body = Vec::new();
        for v in [row, col, xf] {
            body.extend_from_slice(&v.to_le_bytes());
        }
        body.extend_from_slice(&value.to_le_bytes());
        record(NUMBER, &body)
    }

    fn mulrk(row: u16, first_col: u16, xfs: &[u16]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&row.to_le_bytes());
        body.extend_from_slice(&first_col.to_le_bytes());
        for xf in xfs {
            body.extend_from_slice(&xf.to_le_bytes());
            body.extend_from_slice(&[0; 4]);
        }
        body.extend_from_slice(&(first_col + xfs.len() as u16 - 1).to_le_bytes());
        record(MULRK, &body)
    }

    /// Globals with xf 0 General, xf 1 `0.00%`, xf 2 custom `0.0%`, then
    /// one worksheet and one chart sheet
    fn workbook_stream(date_1904: bool) -> Vec<u8> {
        let sheet = [
            bof(0x0010),
            number(0, 0, 1, 0.5),
            mulrk(1, 0, &[2, 0, 1]),
            bof(0x0020),
            number(9, 9, 1, 1.0),
            record(EOF, &[]),
            number(2, 3, 0, 7.0),
            record(EOF, &[]),
        ]
        .concat();

        let globals_without_sheets = [
            bof(0x0005),
            record(DATEMODE, &u16::from(date_1904).to_le_bytes()),
            format(164, "0.0%"),
            xf(0),
            xf(10),
            xf(164),
        ]
        .concat();
        let sheet_entries_len = boundsheet(0, 0, "Data").len() + boundsheet(0, 2, "Chart").len();
        let sheet_start = globals_without_sheets.len() + sheet_entries_len + 4;

        [
            globals_without_sheets,
            boundsheet(sheet_start as u32, 0, "Data"),
            boundsheet(0, 2, "Chart"),
            record(EOF, &[]),
            sheet,
        ]
        .concat()
    }

    fn sorted(stored: &StoredFormats, sheet: &str) -> Vec<(String, NumberFormat)> {
        let mut cells: Vec<_> = stored.sheets[sheet]
            .iter()
            .map(|(addr, format)| (addr.to_string(), format.clone()))
            .collect();
        cells.sort_by(|a, b| a.0.cmp(&b.0));
        cells
    }

    #[test]
    fn test_cell_records_resolve_through_xf_table() {
        let stored = parse_formats(&workbook_stream(false)).unwrap();
        assert!(!stored.date_1904);
        assert_eq!(stored.sheets.len(), 1);
        assert_eq!(
            sorted(&stored, "Data"),
            vec![
                ("A1".to_string(), NumberFormat::BuiltIn(10)),
                ("A2".to_string(), NumberFormat::Custom("0.0%".into())),
                ("C2".to_string(), NumberFormat::BuiltIn(10)),
            ]
        );
    }

    #[test]
    fn test_date_mode() {
        assert!(parse_formats(&workbook_stream(true)).unwrap().date_1904);
    }

    #[test]
    fn test_continue_records_extend_their_parent() {
        let stream = [
            record(FORMAT, &[1, 2]),
            record(CONTINUE, &[3]),
            record(XF, &[4]),
        ]
        .concat();
        let records = read_records(&stream);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].data, vec![1, 2, 3]);
        assert_eq!(records[1].offset, 11);
    }

    #[test]
    fn test_wide_strings() {
        let mut body = 2u16.to_le_bytes().to_vec();
        body.push(0x01);
        for unit in "€%".encode_utf16() {
            body.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(read_unicode_string(&body, &mut 0).unwrap(), "€%");
        assert!(read_unicode_string(&body[..4], &mut 0).is_err());
    }

    #[test]
    fn test_not_a_biff_stream() {
        assert!(matches!(
            parse_formats(&record(XF, &[0; 20])),
            Err(ReadError::Biff(_))
        ));
    }

    #[test]
    fn test_read_from_compound_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("book.xls");
        {
            let mut file = cfb::create(&path).unwrap();
            let mut stream = file.create_stream("/Workbook").unwrap();
            stream.write_all(&workbook_stream(true)).unwrap();
            stream.flush().unwrap();
            drop(stream);
            file.flush().unwrap();
        }

        let stored = read_formats(&path).unwrap();
        assert!(stored.date_1904);
        assert_eq!(
            stored.sheets["Data"].get(&CellAddress::new(0, 0)),
            Some(&NumberFormat::BuiltIn(10))
        );
    }
}
