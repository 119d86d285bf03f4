//! Number formats and display rendering
//!
//! [`format_value`] produces the string a spreadsheet application shows for a
//! value under a given [`NumberFormat`]: General, fixed/grouped/percent/
//! scientific numeric codes, text sections and date/time codes.

mod date;
mod number;

use crate::cell::CellValue;
use crate::error::{Error, Result};

use number::format_general;

/// Number format for cell display
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NumberFormat {
    /// General format (default)
    #[default]
    General,

    /// Built-in format by ID
    BuiltIn(u32),

    /// Custom format string
    Custom(String),
}

impl NumberFormat {
    // Built-in format IDs
    /// 0 - General
    pub const ID_GENERAL: u32 = 0;
    /// 1 - 0
    pub const ID_NUMBER_INT: u32 = 1;
    /// 2 - 0.00
    pub const ID_NUMBER_DEC2: u32 = 2;
    /// 3 - #,##0
    pub const ID_NUMBER_SEP: u32 = 3;
    /// 4 - #,##0.00
    pub const ID_NUMBER_SEP_DEC2: u32 = 4;
    /// 9 - 0%
    pub const ID_PERCENT_INT: u32 = 9;
    /// 10 - 0.00%
    pub const ID_PERCENT_DEC2: u32 = 10;
    /// 11 - 0.00E+00
    pub const ID_SCIENTIFIC: u32 = 11;
    /// 14 - m/d/yyyy
    pub const ID_DATE_SHORT: u32 = 14;
    /// 21 - h:mm:ss
    pub const ID_TIME_24H_SEC: u32 = 21;
    /// 22 - m/d/yyyy h:mm
    pub const ID_DATETIME: u32 = 22;
    /// 46 - [h]:mm:ss
    pub const ID_ELAPSED_TIME: u32 = 46;
    /// 49 - @
    pub const ID_TEXT: u32 = 49;

    /// Create a number format from a format string
    pub fn from_string<S: Into<String>>(format: S) -> Self {
        NumberFormat::Custom(format.into())
    }

    /// Create a built-in format by ID; id 0 is General
    pub fn from_id(id: u32) -> Self {
        match id {
            Self::ID_GENERAL => NumberFormat::General,
            id => NumberFormat::BuiltIn(id),
        }
    }

    /// Percentage (0%)
    pub fn percent() -> Self {
        NumberFormat::BuiltIn(Self::ID_PERCENT_INT)
    }

    /// Percentage with decimals (0.00%)
    pub fn percent_decimal() -> Self {
        NumberFormat::BuiltIn(Self::ID_PERCENT_DEC2)
    }

    /// Short date (m/d/yyyy)
    pub fn date_short() -> Self {
        NumberFormat::BuiltIn(Self::ID_DATE_SHORT)
    }

    /// Time of day (h:mm:ss)
    pub fn time() -> Self {
        NumberFormat::BuiltIn(Self::ID_TIME_24H_SEC)
    }

    /// Date and time (m/d/yyyy h:mm)
    pub fn datetime() -> Self {
        NumberFormat::BuiltIn(Self::ID_DATETIME)
    }

    /// Elapsed time ([h]:mm:ss)
    pub fn elapsed_time() -> Self {
        NumberFormat::BuiltIn(Self::ID_ELAPSED_TIME)
    }

    /// Text format (@)
    pub fn text() -> Self {
        NumberFormat::BuiltIn(Self::ID_TEXT)
    }

    /// Get the format string
    pub fn format_string(&self) -> &str {
        match self {
            NumberFormat::General => "General",
            NumberFormat::BuiltIn(id) => Self::builtin_format_string(*id),
            NumberFormat::Custom(s) => s,
        }
    }

    /// Get built-in format string by ID
    ///
    /// Locale-dependent ids (14, 22) use the en-US rendering.
    fn builtin_format_string(id: u32) -> &'static str {
        match id {
            0 => "General",
            1 => "0",
            2 => "0.00",
            3 => "#,##0",
            4 => "#,##0.00",
            5 => "$#,##0_);($#,##0)",
            6 => "$#,##0_);[Red]($#,##0)",
            7 => "$#,##0.00_);($#,##0.00)",
            8 => "$#,##0.00_);[Red]($#,##0.00)",
            9 => "0%",
            10 => "0.00%",
            11 => "0.00E+00",
            14 => "m/d/yyyy",
            15 => "d-mmm-yy",
            16 => "d-mmm",
            17 => "mmm-yy",
            18 => "h:mm AM/PM",
            19 => "h:mm:ss AM/PM",
            20 => "h:mm",
            21 => "h:mm:ss",
            22 => "m/d/yyyy h:mm",
            37 => "#,##0 ;(#,##0)",
            38 => "#,##0 ;[Red](#,##0)",
            39 => "#,##0.00;(#,##0.00)",
            40 => "#,##0.00;[Red](#,##0.00)",
            45 => "mm:ss",
            46 => "[h]:mm:ss",
            48 => "##0.0E+0",
            49 => "@",
            _ => "General",
        }
    }

    /// Check if this is a date/time format
    pub fn is_date_format(&self) -> bool {
        match self {
            NumberFormat::General => false,
            _ => split_sections(self.format_string())
                .first()
                .is_some_and(|s| date::is_date_section(s)),
        }
    }
}

/// Render a value the way a spreadsheet application displays it.
///
/// Formula values are rendered through their cached result; a formula with
/// no cached result renders as an empty string.
pub fn format_value(value: &CellValue, format: &NumberFormat) -> Result<String> {
    let code = format.format_string();
    match value.effective_value() {
        CellValue::Empty | CellValue::Formula { .. } => Ok(String::new()),
        CellValue::Boolean(b) => Ok(if *b { "TRUE" } else { "FALSE" }.to_string()),
        CellValue::Error(e) => Ok(e.as_str().to_string()),
        CellValue::String(s) => Ok(format_text(s, code)),
        CellValue::Number(n) => format_number(*n, code),
    }
}

/// Format a number with an Excel format code
pub fn format_number(value: f64, code: &str) -> Result<String> {
    if !value.is_finite() {
        return Err(Error::NonFiniteNumber(value));
    }

    let sections = split_sections(code);
    let (section, value, explicit_sign) = match sections.len() {
        0 => return Ok(format_general(value)),
        1 => (sections[0], value, false),
        _ if value < 0.0 => (sections[1], value.abs(), true),
        n if n >= 3 && value == 0.0 => (sections[2], value, false),
        _ => (sections[0], value, false),
    };

    if section.is_empty() {
        return Ok(String::new());
    }

    if is_general_section(section) {
        let mut out = format_general(value.abs());
        if value < 0.0 && !explicit_sign {
            out.insert(0, '-');
        }
        return Ok(out);
    }

    if date::is_date_section(section) {
        return date::format_date(value, section);
    }

    number::format_numeric(value, section)
}

/// `General`, or a bare `@` which shows numbers as General
fn is_general_section(section: &str) -> bool {
    let section = section.trim();
    section.eq_ignore_ascii_case("general") || section == "@"
}

/// Apply the text section of a format code to a string value
fn format_text(text: &str, code: &str) -> String {
    let sections = split_sections(code);
    let section = match sections.len() {
        4.. => sections[3],
        1 if sections[0].contains('@') => sections[0],
        _ => return text.to_string(),
    };

    let mut out = String::new();
    let mut chars = section.chars();
    while let Some(c) = chars.next() {
        match c {
            '@' => out.push_str(text),
            '"' => out.extend(chars.by_ref().take_while(|&q| q != '"')),
            '\\' => out.extend(chars.next()),
            '_' => {
                chars.next();
                out.push(' ');
            }
            '*' => {
                chars.next();
            }
            '[' => {
                chars.by_ref().find(|&b| b == ']');
            }
            other => out.push(other),
        }
    }
    out
}

/// Split a format code on `;`, ignoring separators inside quotes and brackets
pub(crate) fn split_sections(code: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut in_brackets = false;
    let mut escaped = false;

    for (i, c) in code.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if !in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            '[' if !in_quotes => in_brackets = true,
            ']' if !in_quotes => in_brackets = false,
            ';' if !in_quotes && !in_brackets => {
                sections.push(&code[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < code.len() || !sections.is_empty() {
        sections.push(&code[start..]);
    }
    sections
}
