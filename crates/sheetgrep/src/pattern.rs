//! Pattern compilation

use log::debug;
use regex::{Regex, RegexBuilder};

use crate::config::SearchConfig;
use crate::error::Result;

/// A compiled search pattern, shared read-only by every worker
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: String,
    regex: Regex,
}

impl CompiledPattern {
    /// Compile `pattern` under the case and literal options of `config`.
    ///
    /// `^`/`$` always anchor at line breaks and `.` always matches them, so
    /// multi-line cell text behaves like a single searchable block.
    pub fn compile(pattern: &str, config: &SearchConfig) -> Result<Self> {
        let expr = if config.literal {
            regex::escape(pattern)
        } else {
            pattern.to_string()
        };

        let regex = RegexBuilder::new(&expr)
            .multi_line(true)
            .dot_matches_new_line(true)
            .case_insensitive(config.ignore_case)
            .build()?;

        debug!("compiled pattern {:?} as {:?}", pattern, regex.as_str());

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Unanchored search anywhere in `text`
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// The pattern as given by the caller
    pub fn as_str(&self) -> &str {
        &self.source
    }
}
