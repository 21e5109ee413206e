//! Layered part-list parser.
//!
//! Documents arrive in one of several unrelated dialects and nothing tells us
//! which. The strategies are tried in a fixed order and the first one that
//! produces at least one record wins:
//!
//! | Order | Strategy                         | Module                |
//! |-------|----------------------------------|-----------------------|
//! | 1     | purchase-order blocks            | [`purchase_order`]    |
//! | 2     | single-line full specs           | [`full_spec`]         |
//! | 3     | tabular BOM / leading quantities | [`tabular`]           |
//!
//! Parsing is pure and never fails: the worst case is an empty vector.

pub mod full_spec;
pub mod patterns;
pub mod purchase_order;
pub mod tabular;

use crate::normalize;
use crate::record::{ParsedPartRecord, RawLine};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Which strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    PurchaseOrderBlocks,
    FullSpecLines,
    TabularBom,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::PurchaseOrderBlocks => "purchase-order blocks",
            Strategy::FullSpecLines => "single-line specs",
            Strategy::TabularBom => "tabular BOM",
        })
    }
}

/// The winning strategy and its records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseOutcome {
    pub strategy: Strategy,
    pub records: Vec<ParsedPartRecord>,
}

/// A source line prepared for matching.
///
/// `raw` is the trimmed original, kept for the record's audit trail; `text`
/// has Unicode fractions and typographic marks folded to ASCII.
#[derive(Debug, Clone)]
pub struct SourceLine<'a> {
    pub raw: &'a str,
    pub text: String,
}

impl<'a> SourceLine<'a> {
    pub fn new(raw: &'a str) -> Self {
        let raw = raw.trim();
        Self {
            raw,
            text: normalize::normalize_unicode_fractions(raw),
        }
    }
}

type StrategyFn = fn(&[SourceLine<'_>]) -> Option<Vec<ParsedPartRecord>>;

const STRATEGIES: [(Strategy, StrategyFn); 3] = [
    (Strategy::PurchaseOrderBlocks, purchase_order::parse),
    (Strategy::FullSpecLines, full_spec::parse),
    (Strategy::TabularBom, tabular::parse),
];

/// Parse extracted lines into part records. Empty when nothing matched.
pub fn parse(lines: &[RawLine]) -> Vec<ParsedPartRecord> {
    parse_with_strategy(lines)
        .map(|outcome| outcome.records)
        .unwrap_or_default()
}

/// Parse extracted lines, reporting which strategy matched.
pub fn parse_with_strategy(lines: &[RawLine]) -> Option<ParseOutcome> {
    let prepared: Vec<SourceLine<'_>> = lines.iter().map(|l| SourceLine::new(&l.text)).collect();
    run_strategies(&prepared)
}

/// Parse free text directly, split on line breaks.
pub fn parse_text(text: &str) -> Vec<ParsedPartRecord> {
    let prepared: Vec<SourceLine<'_>> = text.lines().map(SourceLine::new).collect();
    run_strategies(&prepared)
        .map(|outcome| outcome.records)
        .unwrap_or_default()
}

fn run_strategies(lines: &[SourceLine<'_>]) -> Option<ParseOutcome> {
    for (strategy, run) in STRATEGIES {
        if let Some(records) = run(lines) {
            debug!(%strategy, records = records.len(), "strategy matched");
            return Some(ParseOutcome { strategy, records });
        }
    }
    debug!(lines = lines.len(), "no strategy matched");
    None
}
