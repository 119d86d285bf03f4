//! Date and time format codes (1900 date system)

use chrono::{Datelike, Days, NaiveDate};

use crate::error::{Error, Result};

/// Largest serial the 1900 system can express (9999-12-31)
const MAX_SERIAL: f64 = 2_958_466.0;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Literal(String),
    Year(usize),
    /// `m` run that is either a month or a minute, resolved after tokenizing
    MonthOrMinute(usize),
    Month(usize),
    Minute(usize),
    Day(usize),
    Hour(usize),
    Second(usize),
    ElapsedHours,
    ElapsedMinutes,
    ElapsedSeconds,
    AmPm { short: bool, lowercase: bool },
}

impl Token {
    fn is_hour(&self) -> bool {
        matches!(self, Token::Hour(_) | Token::ElapsedHours)
    }

    fn is_second(&self) -> bool {
        matches!(self, Token::Second(_) | Token::ElapsedSeconds)
    }
}

fn tokenize(section: &str) -> Vec<Token> {
    let chars: Vec<char> = section.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    let run_length = |start: usize, target: char| {
        chars[start..]
            .iter()
            .take_while(|c| c.eq_ignore_ascii_case(&target))
            .count()
    };

    while i < chars.len() {
        let c = chars[i];
        match c.to_ascii_lowercase() {
            '"' => {
                let text: String = chars[i + 1..].iter().take_while(|&&q| q != '"').collect();
                i += text.chars().count() + 2;
                tokens.push(Token::Literal(text));
                continue;
            }
            '\\' => {
                if let Some(&escaped) = chars.get(i + 1) {
                    tokens.push(Token::Literal(escaped.to_string()));
                }
                i += 2;
                continue;
            }
            '_' => {
                tokens.push(Token::Literal(" ".into()));
                i += 2;
                continue;
            }
            '*' => {
                i += 2;
                continue;
            }
            '[' => {
                let content: String = chars[i + 1..].iter().take_while(|&&b| b != ']').collect();
                i += content.chars().count() + 2;
                // [h], [mm], [ss]; colours like [Magenta] and locales render nothing
                let lower = content.to_ascii_lowercase();
                let unit = lower.chars().next().filter(|&u| lower.chars().all(|x| x == u));
                match unit {
                    Some('h') => tokens.push(Token::ElapsedHours),
                    Some('m') => tokens.push(Token::ElapsedMinutes),
                    Some('s') => tokens.push(Token::ElapsedSeconds),
                    _ => {}
                }
                continue;
            }
            'a' => {
                let rest: String = chars[i..].iter().collect();
                let upper = rest.to_ascii_uppercase();
                if upper.starts_with("AM/PM") {
                    tokens.push(Token::AmPm {
                        short: false,
                        lowercase: c.is_ascii_lowercase(),
                    });
                    i += 5;
                } else if upper.starts_with("A/P") {
                    tokens.push(Token::AmPm {
                        short: true,
                        lowercase: c.is_ascii_lowercase(),
                    });
                    i += 3;
                } else {
                    tokens.push(Token::Literal(c.to_string()));
                    i += 1;
                }
                continue;
            }
            'y' | 'm' | 'd' | 'h' | 's' => {
                let target = c.to_ascii_lowercase();
                let len = run_length(i, target);
                i += len;
                tokens.push(match target {
                    'y' => Token::Year(if len <= 2 { 2 } else { 4 }),
                    'm' => Token::MonthOrMinute(len),
                    'd' => Token::Day(len),
                    'h' => Token::Hour(len.min(2)),
                    _ => Token::Second(len.min(2)),
                });
                continue;
            }
            _ => {
                tokens.push(Token::Literal(c.to_string()));
                i += 1;
            }
        }
    }

    resolve_minutes(tokens)
}

/// `m` directly after an hour or directly before a second means minutes
fn resolve_minutes(mut tokens: Vec<Token>) -> Vec<Token> {
    let field_positions: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| !matches!(t, Token::Literal(_)))
        .map(|(i, _)| i)
        .collect();

    for (n, &pos) in field_positions.iter().enumerate() {
        if let Token::MonthOrMinute(len) = tokens[pos] {
            let after_hour = n > 0 && tokens[field_positions[n - 1]].is_hour();
            let before_second = field_positions
                .get(n + 1)
                .is_some_and(|&next| tokens[next].is_second());
            tokens[pos] = if (after_hour || before_second) && len <= 2 {
                Token::Minute(len)
            } else {
                Token::Month(len)
            };
        }
    }
    tokens
}

/// Whether a format section renders a date or time
pub(crate) fn is_date_section(section: &str) -> bool {
    tokenize(section)
        .iter()
        .any(|t| !matches!(t, Token::Literal(_)))
}

/// Calendar and clock fields for a date serial
struct DateParts {
    year: i32,
    month: u32,
    day: u32,
    weekday: usize,
    hour: u32,
    minute: u32,
    second: u32,
    total_seconds: f64,
}

impl DateParts {
    fn from_serial(serial: f64) -> Result<Self> {
        if !(0.0..MAX_SERIAL).contains(&serial) {
            return Err(Error::DateOutOfRange(serial));
        }

        let mut days = serial.trunc() as u64;
        let mut seconds = ((serial - serial.trunc()) * 86_400.0).round() as u64;
        if seconds >= 86_400 {
            days += 1;
            seconds -= 86_400;
        }

        // Serial 60 is 1900-02-29, a day that never existed but Excel keeps
        let (year, month, day) = match days {
            0 => (1900, 1, 0),
            60 => (1900, 2, 29),
            _ => {
                let epoch = if days < 60 {
                    NaiveDate::from_ymd_opt(1899, 12, 31)
                } else {
                    NaiveDate::from_ymd_opt(1899, 12, 30)
                };
                let date = epoch
                    .and_then(|e| e.checked_add_days(Days::new(days)))
                    .ok_or(Error::DateOutOfRange(serial))?;
                (date.year(), date.month(), date.day())
            }
        };

        Ok(Self {
            year,
            month,
            day,
            weekday: ((days + 6) % 7) as usize,
            hour: (seconds / 3600) as u32,
            minute: (seconds % 3600 / 60) as u32,
            second: (seconds % 60) as u32,
            total_seconds: (serial * 86_400.0).round(),
        })
    }
}

/// Format a serial with a date/time section
pub(crate) fn format_date(serial: f64, section: &str) -> Result<String> {
    let parts = DateParts::from_serial(serial)?;
    let tokens = tokenize(section);
    let twelve_hour = tokens.iter().any(|t| matches!(t, Token::AmPm { .. }));

    let mut out = String::new();
    for token in &tokens {
        match token {
            Token::Literal(text) => out.push_str(text),
            Token::Year(2) => out.push_str(&format!("{:02}", parts.year % 100)),
            Token::Year(_) => out.push_str(&format!("{:04}", parts.year)),
            Token::Month(len) => {
                let name = MONTHS[(parts.month - 1) as usize];
                match len {
                    1 => out.push_str(&parts.month.to_string()),
                    2 => out.push_str(&format!("{:02}", parts.month)),
                    3 => out.push_str(&name[..3]),
                    5 => out.push_str(&name[..1]),
                    _ => out.push_str(name),
                }
            }
            Token::MonthOrMinute(_) => {}
            Token::Minute(1) => out.push_str(&parts.minute.to_string()),
            Token::Minute(_) => out.push_str(&format!("{:02}", parts.minute)),
            Token::Day(len) => {
                let name = WEEKDAYS[parts.weekday];
                match len {
                    1 => out.push_str(&parts.day.to_string()),
                    2 => out.push_str(&format!("{:02}", parts.day)),
                    3 => out.push_str(&name[..3]),
                    _ => out.push_str(name),
                }
            }
            Token::Hour(len) => {
                let hour = if twelve_hour {
                    match parts.hour % 12 {
                        0 => 12,
                        h => h,
                    }
                } else {
                    parts.hour
                };
                if *len == 1 {
                    out.push_str(&hour.to_string());
                } else {
                    out.push_str(&format!("{:02}", hour));
                }
            }
            Token::Second(1) => out.push_str(&parts.second.to_string()),
            Token::Second(_) => out.push_str(&format!("{:02}", parts.second)),
            Token::ElapsedHours => {
                out.push_str(&((parts.total_seconds / 3600.0).floor() as u64).to_string())
            }
            Token::ElapsedMinutes => {
                out.push_str(&((parts.total_seconds / 60.0).floor() as u64).to_string())
            }
            Token::ElapsedSeconds => out.push_str(&(parts.total_seconds as u64).to_string()),
            Token::AmPm { short, lowercase } => {
                let marker = match (parts.hour < 12, short) {
                    (true, false) => "AM",
                    (false, false) => "PM",
                    (true, true) => "A",
                    (false, true) => "P",
                };
                if *lowercase {
                    out.push_str(&marker.to_ascii_lowercase());
                } else {
                    out.push_str(marker);
                }
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_date() {
        // 2023-03-15
        assert_eq!(format_date(45000.0, "m/d/yyyy").unwrap(), "3/15/2023");
        assert_eq!(format_date(45000.0, "yyyy-mm-dd").unwrap(), "2023-03-15");
        assert_eq!(format_date(45000.0, "d-mmm-yy").unwrap(), "15-Mar-23");
    }

    #[test]
    fn test_names() {
        assert_eq!(
            format_date(45000.0, "dddd, mmmm d").unwrap(),
            "Wednesday, March 15"
        );
        assert_eq!(format_date(45000.0, "ddd mmmmm").unwrap(), "Wed M");
    }

    #[test]
    fn test_time_and_minutes_disambiguation() {
        // 2023-03-15 13:05:09
        let serial = 45000.0 + (13.0 * 3600.0 + 5.0 * 60.0 + 9.0) / 86_400.0;
        assert_eq!(format_date(serial, "h:mm:ss").unwrap(), "13:05:09");
        assert_eq!(format_date(serial, "h:mm AM/PM").unwrap(), "1:05 PM");
        assert_eq!(format_date(serial, "m/d/yyyy h:mm").unwrap(), "3/15/2023 13:05");
        assert_eq!(format_date(serial, "mm:ss").unwrap(), "05:09");
        assert_eq!(format_date(serial, "hh:mm a/p").unwrap(), "01:05 p");
    }

    #[test]
    fn test_elapsed_hours() {
        assert_eq!(format_date(1.5, "[h]:mm:ss").unwrap(), "36:00:00");
    }

    #[test]
    fn test_1900_leap_year_quirk() {
        assert_eq!(format_date(59.0, "yyyy-mm-dd").unwrap(), "1900-02-28");
        assert_eq!(format_date(60.0, "yyyy-mm-dd").unwrap(), "1900-02-29");
        assert_eq!(format_date(61.0, "yyyy-mm-dd").unwrap(), "1900-03-01");
        assert_eq!(format_date(1.0, "yyyy-mm-dd").unwrap(), "1900-01-01");
    }

    #[test]
    fn test_literals_are_not_fields() {
        assert_eq!(
            format_date(45000.0, "yyyy\"年\"m\"月\"d\"日\"").unwrap(),
            "2023年3月15日"
        );
        assert!(!is_date_section("0.00 \"days\""));
        assert!(!is_date_section("[Magenta]0.00"));
        assert!(is_date_section("[$-409]m/d/yy"));
    }

    #[test]
    fn test_out_of_range() {
        assert!(matches!(
            format_date(-1.0, "m/d/yyyy"),
            Err(Error::DateOutOfRange(_))
        ));
        assert!(matches!(
            format_date(3_000_000.0, "m/d/yyyy"),
            Err(Error::DateOutOfRange(_))
        ));
    }
}
