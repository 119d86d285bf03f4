//! Workbook decoding
//!
//! The engine never parses a container format itself. A [`WorkbookReader`]
//! turns a file into the [`Workbook`] model; [`CalamineReader`] is the
//! default implementation, covering every extension discovery accepts.

mod biff;
mod ooxml;

use std::collections::{BTreeMap, HashMap};
use std::ffi::OsStr;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{
    open_workbook, open_workbook_auto, CellErrorType, CellType, Data, Range, Reader, Sheets,
};
use log::debug;
use sheetgrep_core::{Cell, CellAddress, CellError, CellValue, NumberFormat, Workbook, Worksheet};

use crate::error::ReadError;

/// Days between the 1900 and 1904 date system epochs
const DAYS_1900_TO_1904: f64 = 1462.0;

/// Opens a spreadsheet file as a [`Workbook`].
///
/// Implementations are shared between worker threads.
pub trait WorkbookReader: Sync {
    /// Decode the whole workbook at `path`
    fn open(&self, path: &Path) -> Result<Workbook, ReadError>;
}

impl<R: WorkbookReader + ?Sized> WorkbookReader for &R {
    fn open(&self, path: &Path) -> Result<Workbook, ReadError> {
        (**self).open(path)
    }
}

/// [`WorkbookReader`] backed by calamine
///
/// Cell values and formula text come from calamine. Each cell's stored
/// number format, and whether the workbook counts dates from 1904, are read
/// from the container directly, since calamine does not expose them.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalamineReader;

impl WorkbookReader for CalamineReader {
    fn open(&self, path: &Path) -> Result<Workbook, ReadError> {
        let container = Container::of(path);
        let mut source = open_sheets(path, container)?;
        let stored = match container {
            Container::Biff => biff::read_formats(path)?,
            Container::Ooxml => ooxml::read_formats(path)?,
            Container::Unknown => StoredFormats::default(),
        };
        let sheet_names = source.sheet_names().to_vec();

        let mut workbook = Workbook::new();
        for name in &sheet_names {
            let values = source.worksheet_range(name)?;
            let formulas = source.worksheet_formula(name)?;
            workbook.add_worksheet(merge_sheet(name, &values, &formulas, &stored)?);
        }

        debug!(
            "decoded {} sheet(s) from {} (1904 dates: {})",
            workbook.sheet_count(),
            path.display(),
            stored.date_1904
        );
        Ok(workbook)
    }
}

/// Container format, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    /// Compound file with a BIFF8 stream (`.xls`, `.xlt`)
    Biff,
    /// Zip package (`.xlsx`, `.xlsm`, `.xltx`)
    Ooxml,
    Unknown,
}

impl Container {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(OsStr::to_str) {
            Some("xls" | "xlt") => Container::Biff,
            Some("xlsx" | "xlsm" | "xltx") => Container::Ooxml,
            _ => Container::Unknown,
        }
    }
}

/// Number formats a file stores for its cells
#[derive(Debug, Default)]
pub(crate) struct StoredFormats {
    /// Date serials count from 1904-01-01
    pub(crate) date_1904: bool,
    /// Non-General formats by sheet name and cell
    pub(crate) sheets: HashMap<String, HashMap<CellAddress, NumberFormat>>,
}

impl StoredFormats {
    fn get(&self, sheet: &str, addr: CellAddress) -> Option<&NumberFormat> {
        self.sheets.get(sheet).and_then(|cells| cells.get(&addr))
    }
}

/// Open with the decoder for the container, so template files get the right one
fn open_sheets(path: &Path, container: Container) -> Result<Sheets<BufReader<File>>, ReadError> {
    let sheets = match container {
        Container::Biff => Sheets::Xls(open_workbook(path).map_err(calamine::Error::Xls)?),
        Container::Ooxml => Sheets::Xlsx(open_workbook(path).map_err(calamine::Error::Xlsx)?),
        Container::Unknown => open_workbook_auto(path)?,
    };
    Ok(sheets)
}

fn merge_sheet(
    name: &str,
    values: &Range<Data>,
    formulas: &Range<String>,
    stored: &StoredFormats,
) -> Result<Worksheet, ReadError> {
    let mut cells: BTreeMap<CellAddress, Cell> = BTreeMap::new();

    for (addr, data) in positioned(values) {
        let addr = addr?;
        let (value, format) = convert(data, stored.get(name, addr), stored.date_1904);
        cells.insert(addr, Cell::with_format(addr, value, format));
    }

    for (addr, text) in positioned(formulas) {
        let addr = addr?;
        let cell = cells.entry(addr).or_insert_with(|| {
            let format = stored.get(name, addr).cloned().unwrap_or_default();
            Cell::with_format(addr, CellValue::Empty, format)
        });
        let cached = std::mem::take(&mut cell.value);
        let cached = (!cached.is_empty()).then_some(cached);
        cell.value = CellValue::formula_with_result(text, cached);
    }

    let mut sheet = Worksheet::new(name);
    for cell in cells.into_values() {
        sheet.insert_cell(cell);
    }
    Ok(sheet)
}

/// Non-empty cells of `range` with absolute addresses
fn positioned<T: CellType>(
    range: &Range<T>,
) -> impl Iterator<Item = (sheetgrep_core::Result<CellAddress>, &T)> {
    let (row0, col0) = range.start().unwrap_or((0, 0));
    range.used_cells().map(move |(row, col, value)| {
        (
            CellAddress::checked(row0 + row as u32, col0 + col as u32),
            value,
        )
    })
}

/// Model value and display format of one calamine cell.
///
/// `stored` is the cell's own number format, if the file gives it one.
/// Dates from a 1904-system workbook are moved onto the 1900 serial scale.
fn convert(data: &Data, stored: Option<&NumberFormat>, date_1904: bool) -> (CellValue, NumberFormat) {
    let format = stored.cloned().unwrap_or_default();
    match data {
        Data::Empty => (CellValue::Empty, format),
        Data::String(s) => (CellValue::String(s.clone()), format),
        Data::Float(f) => number(*f, format, date_1904),
        Data::Int(i) => number(*i as f64, format, date_1904),
        Data::Bool(b) => (CellValue::Boolean(*b), format),
        Data::Error(e) => (CellValue::Error(cell_error(e)), format),
        Data::DateTime(dt) if dt.is_duration() => {
            let format = stored.cloned().unwrap_or_else(NumberFormat::elapsed_time);
            (CellValue::Number(dt.as_f64()), format)
        }
        Data::DateTime(dt) => {
            let mut serial = dt.as_f64();
            if date_1904 {
                serial += DAYS_1900_TO_1904;
            }
            let format = match stored {
                Some(f) if f.is_date_format() => f.clone(),
                _ => inferred_date_format(serial),
            };
            (CellValue::Number(serial), format)
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => (CellValue::String(s.clone()), format),
    }
}

/// A plain number; one shown under a date format in a 1904 workbook is a date
fn number(value: f64, format: NumberFormat, date_1904: bool) -> (CellValue, NumberFormat) {
    let value = if date_1904 && format.is_date_format() {
        value + DAYS_1900_TO_1904
    } else {
        value
    };
    (CellValue::Number(value), format)
}

/// Date format for a date cell whose own format is unknown
fn inferred_date_format(serial: f64) -> NumberFormat {
    if serial < 1.0 {
        NumberFormat::time()
    } else if serial.fract() == 0.0 {
        NumberFormat::date_short()
    } else {
        NumberFormat::datetime()
    }
}

#[allow(unreachable_patterns)]
fn cell_error(e: &CellErrorType) -> CellError {
    match e {
        CellErrorType::Div0 => CellError::Div0,
        CellErrorType::NA => CellError::Na,
        CellErrorType::Name => CellError::Name,
        CellErrorType::Null => CellError::Null,
        CellErrorType::Num => CellError::Num,
        CellErrorType::Ref => CellError::Ref,
        CellErrorType::Value => CellError::Value,
        CellErrorType::GettingData => CellError::GettingData,
        other => CellError::parse(&other.to_string()).unwrap_or(CellError::Value),
    }
}
