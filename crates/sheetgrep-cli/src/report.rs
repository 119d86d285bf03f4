//! Match lines and the result summary block

use std::fs;
use std::io::{self, Write};
use std::time::Duration;

use sheetgrep::SearchSummary;

pub const RESULT_HEADER: &str =
    "--- Result -------------------------------------------------------------";
const FILE_SUMMARY_HEADER: &str =
    "--- Result Summary (File) ----------------------------------------------";
const TOTAL_SUMMARY_HEADER: &str =
    "--- Result Summary (Total) ---------------------------------------------";

const MIB: f64 = 1024.0 * 1024.0;

/// Memory of the running process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryUsage {
    /// Resident set size
    pub used_bytes: u64,
    /// Virtual memory size
    pub total_bytes: u64,
}

impl MemoryUsage {
    /// Read the current figures, or zeros where the platform does not expose them
    pub fn current() -> Self {
        fs::read_to_string("/proc/self/status")
            .ok()
            .and_then(|status| Self::parse_status(&status))
            .unwrap_or_default()
    }

    fn parse_status(status: &str) -> Option<Self> {
        let kib = |key: &str| {
            status
                .lines()
                .find_map(|line| line.strip_prefix(key))
                .and_then(|rest| rest.split_whitespace().next())
                .and_then(|n| n.parse::<u64>().ok())
                .map(|n| n * 1024)
        };
        Some(Self {
            used_bytes: kib("VmRSS:")?,
            total_bytes: kib("VmSize:")?,
        })
    }
}

/// Whole milliseconds as seconds, always with a fractional part (`1.0`, `0.25`)
fn seconds(running_time: Duration) -> String {
    format!("{:?}", running_time.as_millis() as f64 / 1000.0)
}

/// One `[file][sheet][address] value` line per match
pub fn write_matches<W: Write>(out: &mut W, summary: &SearchSummary) -> io::Result<()> {
    for m in summary.all_matches() {
        writeln!(out, "{}", m)?;
    }
    Ok(())
}

/// The per-file counts and totals printed after the matches
pub fn write_summary<W: Write>(
    out: &mut W,
    summary: &SearchSummary,
    running_time: Duration,
    memory: MemoryUsage,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", FILE_SUMMARY_HEADER)?;
    let width = summary.max_match_count_width();
    for result in summary.results() {
        writeln!(
            out,
            "[{:>width$}] : {}",
            result.match_count(),
            result.file().display(),
            width = width
        )?;
    }

    writeln!(out)?;
    writeln!(out, "{}", TOTAL_SUMMARY_HEADER)?;
    writeln!(
        out,
        "number of files (matches/total) : {}/{}",
        summary.match_file_count(),
        summary.target_file_count()
    )?;
    writeln!(
        out,
        "number of matches               : {}",
        summary.total_match_count()
    )?;
    writeln!(
        out,
        "running time                    : {}s",
        seconds(running_time)
    )?;
    writeln!(
        out,
        "memory (used/total)             : {:.1}MB/{:.1}MB",
        memory.used_bytes as f64 / MIB,
        memory.total_bytes as f64 / MIB
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sheetgrep::{CellMatch, FileResult};
    use std::path::PathBuf;

    fn summary() -> SearchSummary {
        let hit = |file: &str, address: &str, value: &str| CellMatch {
            file_path: PathBuf::from(file),
            sheet_name: "Sheet1".into(),
            cell_address: address.into(),
            cell_value: value.into(),
        };
        let many = (1..=10)
            .map(|row| hit("/data/b.xlsx", &format!("A{row}"), "x"))
            .collect();
        SearchSummary::new(vec![
            FileResult::new(PathBuf::from("/data/c.xls"), Vec::new()),
            FileResult::new(PathBuf::from("/data/b.xlsx"), many),
            FileResult::new(
                PathBuf::from("/data/a.xlsx"),
                vec![hit("/data/a.xlsx", "B7", "hello world")],
            ),
        ])
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_match_lines() {
        let summary = summary();
        let text = render(|out| write_matches(out, &summary));
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 11);
        assert_eq!(lines[0], "[/data/a.xlsx][Sheet1][B7] hello world");
        assert_eq!(lines[1], "[/data/b.xlsx][Sheet1][A1] x");
    }

    #[test]
    fn test_summary_block() {
        let memory = MemoryUsage {
            used_bytes: 12 * 1024 * 1024 + 512 * 1024,
            total_bytes: 256 * 1024 * 1024,
        };
        let summary = summary();
        let text = render(|out| {
            write_summary(out, &summary, Duration::from_millis(1234), memory)
        });

        let expected = "\n\
--- Result Summary (File) ----------------------------------------------
[ 1] : /data/a.xlsx
[10] : /data/b.xlsx
[ 0] : /data/c.xls

--- Result Summary (Total) ---------------------------------------------
number of files (matches/total) : 2/3
number of matches               : 11
running time                    : 1.234s
memory (used/total)             : 12.5MB/256.0MB
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_running_time_keeps_a_decimal() {
        assert_eq!(seconds(Duration::from_secs(1)), "1.0");
        assert_eq!(seconds(Duration::ZERO), "0.0");
        assert_eq!(seconds(Duration::from_micros(250_900)), "0.25");
        assert_eq!(seconds(Duration::from_millis(61_005)), "61.005");

        let summary = SearchSummary::new(Vec::new());
        let text = render(|out| {
            write_summary(out, &summary, Duration::from_secs(2), MemoryUsage::default())
        });
        assert!(text.contains("running time                    : 2.0s\n"));
        assert!(text.contains("memory (used/total)             : 0.0MB/0.0MB\n"));
    }

    #[test]
    fn test_parse_proc_status() {
        let status = "Name:\tsheetgrep\nVmPeak:\t  20000 kB\nVmSize:\t  16384 kB\nVmRSS:\t   2048 kB\n";
        assert_eq!(
            MemoryUsage::parse_status(status),
            Some(MemoryUsage {
                used_bytes: 2048 * 1024,
                total_bytes: 16384 * 1024,
            })
        );
        assert_eq!(MemoryUsage::parse_status("Name:\tx\n"), None);
    }
}
