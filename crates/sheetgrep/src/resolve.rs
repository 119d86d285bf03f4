//! Cell value resolution

use log::debug;
use sheetgrep_core::Cell;

/// The text a cell is matched against.
///
/// Formula cells resolve to `=` plus their source text, unless
/// `match_formula_result` is set, in which case they resolve to their
/// formatted cached result. Every other cell resolves to its formatted display
/// string. If formatting fails the raw value is used instead. Blank cells are
/// expected to be skipped by the caller.
pub fn resolve_cell_value(cell: &Cell, match_formula_result: bool) -> String {
    if !match_formula_result {
        if let Some(text) = cell.formula_text() {
            return format!("={}", text);
        }
    }

    match cell.formatted_value() {
        Ok(value) => value,
        Err(err) => {
            debug!("{}: using raw value ({})", cell.address, err);
            cell.raw_value()
        }
    }
}
