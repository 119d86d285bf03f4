//! Numeric format codes (`0`, `#`, `,`, `.`, `%`, `E+`)

use crate::error::{Error, Result};

/// Excel's General format.
///
/// Integers below 1e11 print without decimals, other values keep ten
/// significant digits, and very large or very small magnitudes switch to
/// scientific notation.
pub(crate) fn format_general(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }

    let abs = value.abs();
    if !(1e-9..1e11).contains(&abs) {
        return format_general_scientific(value);
    }
    if value.fract() == 0.0 {
        return format!("{}", value as i64);
    }

    let magnitude = abs.log10().floor() as i32;
    let decimals = (9 - magnitude).max(0) as usize;
    trim_fraction(format!("{:.*}", decimals, value))
}

fn format_general_scientific(value: f64) -> String {
    let formatted = format!("{:.5e}", value);
    let (mantissa, exponent) = formatted.split_once('e').unwrap_or((formatted.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    format!(
        "{}E{}{:02}",
        trim_fraction(mantissa.to_string()),
        if exponent < 0 { '-' } else { '+' },
        exponent.abs()
    )
}

fn trim_fraction(mut s: String) -> String {
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    s
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Literal(String),
    Digit(char),
    Point,
    Comma,
    Percent,
    Exponent(char),
}

fn tokenize(section: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = section.chars().peekable();
    let literal = |c: char| Token::Literal(c.to_string());

    while let Some(c) = chars.next() {
        match c {
            '0' | '#' => tokens.push(Token::Digit(c)),
            '?' => return Err(Error::unsupported(section, "fraction placeholders")),
            '.' => tokens.push(Token::Point),
            ',' => tokens.push(Token::Comma),
            '%' => tokens.push(Token::Percent),
            'E' | 'e' => match chars.peek().copied() {
                Some(sign @ ('+' | '-')) => {
                    chars.next();
                    tokens.push(Token::Exponent(sign));
                }
                _ => tokens.push(literal(c)),
            },
            '"' => tokens.push(Token::Literal(
                chars.by_ref().take_while(|&q| q != '"').collect(),
            )),
            '\\' => {
                if let Some(escaped) = chars.next() {
                    tokens.push(literal(escaped));
                }
            }
            '_' => {
                chars.next();
                tokens.push(literal(' '));
            }
            '*' => {
                chars.next();
            }
            '[' => {
                let content: String = chars.by_ref().take_while(|&b| b != ']').collect();
                // [$€-407] carries a currency symbol; colours and conditions render nothing
                if let Some(currency) = content.strip_prefix('$') {
                    let symbol = currency.split('-').next().unwrap_or_default();
                    tokens.push(Token::Literal(symbol.to_string()));
                }
            }
            other => tokens.push(literal(other)),
        }
    }

    Ok(tokens)
}

/// Parsed shape of one numeric section
#[derive(Debug, Default)]
struct Layout {
    prefix: String,
    suffix: String,
    int_digits: Vec<char>,
    frac_digits: Vec<char>,
    has_point: bool,
    grouping: bool,
    thousands_scale: i32,
    percent: i32,
    exponent: Option<(char, usize)>,
}

impl Layout {
    fn parse(section: &str) -> Result<Self> {
        let tokens = tokenize(section)?;
        let first_digit = tokens.iter().position(|t| matches!(t, Token::Digit(_)));
        let last_digit = tokens.iter().rposition(|t| matches!(t, Token::Digit(_)));

        let mut layout = Layout::default();
        let mut exponent_digits = 0usize;
        let mut exponent_sign = None;

        for (idx, token) in tokens.iter().enumerate() {
            let before = first_digit.map_or(true, |first| idx < first);
            let literal_target = if before {
                &mut layout.prefix
            } else {
                &mut layout.suffix
            };

            match token {
                Token::Literal(text) => literal_target.push_str(text),
                Token::Percent => {
                    layout.percent += 1;
                    literal_target.push('%');
                }
                Token::Digit(d) => {
                    if exponent_sign.is_some() {
                        exponent_digits += 1;
                    } else if layout.has_point {
                        layout.frac_digits.push(*d);
                    } else {
                        layout.int_digits.push(*d);
                    }
                }
                Token::Point if exponent_sign.is_none() && !layout.has_point => {
                    layout.has_point = true;
                }
                Token::Point => literal_target.push('.'),
                Token::Comma if exponent_sign.is_none() => {
                    let next = tokens.get(idx + 1);
                    if last_digit.is_some_and(|last| idx > last)
                        || matches!(next, Some(Token::Point))
                    {
                        layout.thousands_scale += 1;
                    } else if !before && !layout.has_point && matches!(next, Some(Token::Digit(_)))
                    {
                        layout.grouping = true;
                    } else {
                        literal_target.push(',');
                    }
                }
                Token::Comma => literal_target.push(','),
                Token::Exponent(sign) => exponent_sign = Some(*sign),
            }
        }

        if let Some(sign) = exponent_sign {
            layout.exponent = Some((sign, exponent_digits.max(1)));
        }
        Ok(layout)
    }

    fn min_int_digits(&self) -> usize {
        self.int_digits.iter().filter(|&&d| d == '0').count()
    }

    fn min_frac_digits(&self) -> usize {
        self.frac_digits.iter().filter(|&&d| d == '0').count()
    }

    /// Render a non-negative magnitude as integer and fraction digit strings
    fn render_digits(&self, magnitude: f64) -> (String, String) {
        let decimals = self.frac_digits.len();
        let formatted = format!("{:.*}", decimals, magnitude);
        let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), ""));

        let mut frac_part = frac_part.to_string();
        while frac_part.len() > self.min_frac_digits() && frac_part.ends_with('0') {
            frac_part.pop();
        }

        let min_int = self.min_int_digits();
        let mut int_part = if int_part == "0" && min_int == 0 {
            String::new()
        } else {
            int_part.to_string()
        };
        while int_part.len() < min_int {
            int_part.insert(0, '0');
        }
        if self.grouping {
            int_part = group_thousands(&int_part);
        }

        (int_part, frac_part)
    }

    fn render_mantissa(&self, magnitude: f64) -> String {
        let (int_part, frac_part) = self.render_digits(magnitude);
        let mut out = int_part;
        if self.has_point {
            out.push('.');
            out.push_str(&frac_part);
        }
        out
    }
}

/// Format a value with a single numeric section
pub(crate) fn format_numeric(value: f64, section: &str) -> Result<String> {
    let layout = Layout::parse(section)?;

    if layout.int_digits.is_empty() && layout.frac_digits.is_empty() {
        // Pure literal section such as "zero"
        return Ok(format!("{}{}", layout.prefix, layout.suffix));
    }

    let scaled = value * 100f64.powi(layout.percent) / 1000f64.powi(layout.thousands_scale);
    let magnitude = scaled.abs();

    let body = match layout.exponent {
        Some((sign_mode, min_exp_digits)) => {
            let (mantissa, exponent) = split_exponent(magnitude, &layout);
            let exp_sign = if exponent < 0 {
                "-"
            } else if sign_mode == '+' {
                "+"
            } else {
                ""
            };
            format!(
                "{}E{}{:0width$}",
                layout.render_mantissa(mantissa),
                exp_sign,
                exponent.abs(),
                width = min_exp_digits
            )
        }
        None => layout.render_mantissa(magnitude),
    };

    let mut out = String::new();
    if scaled < 0.0 && body.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    out.push_str(&layout.prefix);
    out.push_str(&body);
    out.push_str(&layout.suffix);
    Ok(out)
}

/// Split a magnitude into mantissa and exponent for scientific layouts.
///
/// Layouts with several integer placeholders and a `#` use engineering
/// steps, so `##0.0E+0` keeps exponents at multiples of three.
fn split_exponent(magnitude: f64, layout: &Layout) -> (f64, i32) {
    if magnitude == 0.0 {
        return (0.0, 0);
    }

    let int_count = layout.int_digits.len().max(1) as i32;
    let log = magnitude.log10().floor() as i32;
    let engineering = int_count > 1 && layout.int_digits.contains(&'#');

    let mut exponent = if engineering {
        log.div_euclid(int_count) * int_count
    } else {
        log - (int_count - 1)
    };
    let mut mantissa = magnitude / 10f64.powi(exponent);

    let step = if engineering { int_count } else { 1 };
    let limit = 10f64.powi(int_count);
    let rounded: f64 = format!("{:.*}", layout.frac_digits.len(), mantissa)
        .parse()
        .unwrap_or(mantissa);
    if rounded >= limit {
        exponent += step;
        mantissa = magnitude / 10f64.powi(exponent);
    }

    (mantissa, exponent)
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
