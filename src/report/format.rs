use console::Style;

use crate::config::ReportConfig;
use crate::types::CaseType;

/// Presentation settings handed to the [`Reporter`](super::Reporter)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportStyle {
    /// Emit ANSI colors
    pub color: bool,
    /// Digit group separator
    pub thousands_separator: char,
    /// Plot width in columns
    pub graph_width: usize,
    /// Plot height in rows
    pub graph_height: usize,
}

impl Default for ReportStyle {
    fn default() -> Self {
        Self::from_config(&ReportConfig::default())
    }
}

impl ReportStyle {
    /// Style described by the report section of the configuration
    pub fn from_config(config: &ReportConfig) -> Self {
        Self {
            color: config.color,
            thousands_separator: config.thousands_separator,
            graph_width: config.graph_width,
            graph_height: config.graph_height,
        }
    }

    /// Same settings without colors
    pub fn plain(self) -> Self {
        Self {
            color: false,
            ..self
        }
    }

    /// Color of a case type: confirmed yellow, dead red, recovered green
    pub(crate) fn case(&self, case: CaseType) -> Style {
        let style = match case {
            CaseType::Confirmed => Style::new().yellow(),
            CaseType::Dead => Style::new().red(),
            CaseType::Recovered => Style::new().green(),
        };
        style.force_styling(self.color)
    }

    pub(crate) fn heading(&self) -> Style {
        Style::new().bold().force_styling(self.color)
    }

    /// `n` with grouped thousands
    pub fn number(&self, n: i64) -> String {
        group_thousands(n, self.thousands_separator)
    }
}

/// Format an integer with a separator every three digits, e.g. `-1,234,567`
pub fn group_thousands(n: i64, separator: char) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(digit);
    }
    out
}
