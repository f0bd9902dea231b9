//! # Invoice Numbers
//!
//! Renders human-readable invoice numbers from a configurable template and
//! a monotonically increasing sequence.
//!
//! ## Template Placeholders
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  {YYYY}   four-digit year          2026                                 │
//! │  {YY}     two-digit year           26                                   │
//! │  {MM}     month                    10                                   │
//! │  {DD}     day                      16                                   │
//! │  {SEQ}    sequence, default width  0042                                 │
//! │  {SEQ:n}  sequence, width n        {SEQ:6} → 000042                     │
//! │                                                                         │
//! │  "INV/{YYYY}{MM}{DD}/{SEQ}"  →  "INV/20261016/0042"                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The counter itself is stored by kasir-db; this module only decides the
//! counter scope and renders the final string.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

pub const DEFAULT_INVOICE_TEMPLATE: &str = "INV/{YYYY}{MM}{DD}/{SEQ}";
pub const DEFAULT_SEQUENCE_WIDTH: usize = 4;

/// When the sequence starts over at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceReset {
    /// One counter per calendar day.
    #[default]
    Daily,
    /// A single counter for the lifetime of the store.
    Never,
}

impl SequenceReset {
    /// Key of the counter row used for an invoice issued on `date`.
    pub fn scope(&self, date: NaiveDate) -> String {
        match self {
            SequenceReset::Daily => date.format("%Y-%m-%d").to_string(),
            SequenceReset::Never => "global".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Year4,
    Year2,
    Month,
    Day,
    Sequence(usize),
}

/// A parsed invoice number template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl InvoiceTemplate {
    /// Parses a template.
    ///
    /// ## Errors
    /// * `InvalidTemplate` - unknown placeholder, unclosed brace, bad width,
    ///   or no `{SEQ}` at all (numbers would not be unique)
    ///
    /// ## Example
    /// ```rust
    /// use chrono::NaiveDate;
    /// use kasir_core::invoice::InvoiceTemplate;
    ///
    /// let template = InvoiceTemplate::parse("TRX-{YY}{MM}{DD}-{SEQ:5}", 4).unwrap();
    /// let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
    /// assert_eq!(template.render(date, 7), "TRX-260309-00007");
    /// ```
    pub fn parse(template: &str, default_width: usize) -> CoreResult<Self> {
        let invalid = |reason: &str| CoreError::InvalidTemplate {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| invalid("unclosed '{'"))?;
            let token = &after[..close];

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }

            let segment = match token {
                "YYYY" => Segment::Year4,
                "YY" => Segment::Year2,
                "MM" => Segment::Month,
                "DD" => Segment::Day,
                "SEQ" => Segment::Sequence(default_width),
                _ => match token.strip_prefix("SEQ:") {
                    Some(width) => {
                        let width: usize = width
                            .parse()
                            .map_err(|_| invalid("sequence width must be a number"))?;
                        Segment::Sequence(width)
                    }
                    None => return Err(invalid(&format!("unknown placeholder {{{}}}", token))),
                },
            };

            if let Segment::Sequence(width) = segment {
                if width == 0 || width > 12 {
                    return Err(invalid("sequence width must be between 1 and 12"));
                }
            }

            segments.push(segment);
            rest = &after[close + 1..];
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        if !segments.iter().any(|s| matches!(s, Segment::Sequence(_))) {
            return Err(invalid("template must contain {SEQ}"));
        }

        Ok(InvoiceTemplate {
            raw: template.to_string(),
            segments,
        })
    }

    /// Whether the rendered number carries the full calendar date (a year,
    /// `{MM}` and `{DD}`).
    ///
    /// A daily counter restarts at 1 every day, so only a dated template
    /// keeps numbers unique under [`SequenceReset::Daily`].
    pub fn is_dated(&self) -> bool {
        let segments = &self.segments;
        segments.iter().any(|s| matches!(s, Segment::Year4 | Segment::Year2))
            && segments.contains(&Segment::Month)
            && segments.contains(&Segment::Day)
    }

    /// Checks that numbers rendered under `reset` never repeat.
    ///
    /// ## Errors
    /// * `InvalidTemplate` - `Daily` reset with a template lacking the year,
    ///   month or day
    pub fn check_reset(&self, reset: SequenceReset) -> CoreResult<()> {
        if reset == SequenceReset::Daily && !self.is_dated() {
            return Err(CoreError::InvalidTemplate {
                template: self.raw.clone(),
                reason: "daily sequence reset needs a year, {MM} and {DD} in the template"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// Width of the (first) sequence placeholder.
    pub fn sequence_width(&self) -> usize {
        self.segments
            .iter()
            .find_map(|s| match s {
                Segment::Sequence(width) => Some(*width),
                _ => None,
            })
            .unwrap_or(DEFAULT_SEQUENCE_WIDTH)
    }

    /// The template as configured.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Renders the invoice number for `date` and sequence value `seq`.
    ///
    /// A sequence wider than the configured width is printed in full, never
    /// truncated.
    pub fn render(&self, date: NaiveDate, seq: i64) -> String {
        let mut out = String::with_capacity(self.raw.len() + 8);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Year4 => out.push_str(&format!("{:04}", date.year())),
                Segment::Year2 => out.push_str(&format!("{:02}", date.year() % 100)),
                Segment::Month => out.push_str(&format!("{:02}", date.month())),
                Segment::Day => out.push_str(&format!("{:02}", date.day())),
                Segment::Sequence(width) => {
                    out.push_str(&format!("{:0width$}", seq, width = *width))
                }
            }
        }
        out
    }
}

/// `INV/{YYYY}{MM}{DD}/{SEQ}` with a 4-digit sequence.
impl Default for InvoiceTemplate {
    fn default() -> Self {
        InvoiceTemplate {
            raw: DEFAULT_INVOICE_TEMPLATE.to_string(),
            segments: vec![
                Segment::Literal("INV/".to_string()),
                Segment::Year4,
                Segment::Month,
                Segment::Day,
                Segment::Literal("/".to_string()),
                Segment::Sequence(DEFAULT_SEQUENCE_WIDTH),
            ],
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn test_render_default_template() {
        let template = InvoiceTemplate::parse("INV/{YYYY}{MM}{DD}/{SEQ}", 4).unwrap();
        assert_eq!(template.render(date(), 42), "INV/20261016/0042");
        assert_eq!(template.render(date(), 123_456), "INV/20261016/123456");
    }

    #[test]
    fn test_render_explicit_width_and_short_year() {
        let template = InvoiceTemplate::parse("{YY}.{SEQ:6}-POS", 4).unwrap();
        assert_eq!(template.render(date(), 1), "26.000001-POS");
    }

    #[test]
    fn test_parse_rejects_bad_templates() {
        assert!(InvoiceTemplate::parse("INV-{YYYY}", 4).is_err());
        assert!(InvoiceTemplate::parse("INV-{SEQ", 4).is_err());
        assert!(InvoiceTemplate::parse("INV-{HH}-{SEQ}", 4).is_err());
        assert!(InvoiceTemplate::parse("INV-{SEQ:x}", 4).is_err());
        assert!(InvoiceTemplate::parse("INV-{SEQ:0}", 4).is_err());
    }

    #[test]
    fn test_default_matches_parsed_default() {
        let parsed = InvoiceTemplate::parse(DEFAULT_INVOICE_TEMPLATE, DEFAULT_SEQUENCE_WIDTH).unwrap();
        assert_eq!(InvoiceTemplate::default(), parsed);
        assert_eq!(parsed.sequence_width(), 4);
    }

    #[test]
    fn test_daily_reset_requires_full_date() {
        let dated = InvoiceTemplate::parse("TRX-{YY}{MM}{DD}-{SEQ}", 4).unwrap();
        assert!(dated.is_dated());
        assert!(dated.check_reset(SequenceReset::Daily).is_ok());

        for raw in ["POS-{SEQ}", "POS-{YYYY}{MM}-{SEQ}", "POS-{MM}{DD}-{SEQ}"] {
            let template = InvoiceTemplate::parse(raw, 4).unwrap();
            assert!(!template.is_dated(), "{}", raw);
            assert!(template.check_reset(SequenceReset::Daily).is_err(), "{}", raw);
            assert!(template.check_reset(SequenceReset::Never).is_ok(), "{}", raw);
        }
    }

    #[test]
    fn test_sequence_scope() {
        assert_eq!(SequenceReset::Daily.scope(date()), "2026-10-16");
        assert_eq!(SequenceReset::Never.scope(date()), "global");
    }
}
