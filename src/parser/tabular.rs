//! Tabular bills of material, and the last-resort leading-quantity fallback.
//!
//! A table is recognised by a header line naming a quantity column. Every
//! later non-blank line is split into columns on a tab or a run of two or
//! more spaces (the extractor keeps wide horizontal gaps as double spaces):
//!
//! | field | meaning              |
//! |-------|----------------------|
//! | 1     | quantity (required)  |
//! | 2     | client part number   |
//! | 3     | description          |
//! | 4     | material             |
//! | 5..   | notes                |
//!
//! Without a header, any line that starts with a small positive integer
//! becomes a low-confidence record for a human to sort out.

use super::patterns::{self, DIM};
use super::SourceLine;
use crate::record::{Evidence, ParsedPartRecord, PartRecordBuilder, PartType};
use once_cell::sync::Lazy;
use regex::Regex;

static RE_QTY_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:QTY|QNTY|QUANTITY|QUAN)\b").unwrap());

static RE_COLUMN_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \f\v]*\t[ \f\v]*|[ \f\v]{2,}").unwrap());

/// Dimensions written inside a description cell: `1/2" X 10 X 48`, `1/2" PL 10 X 48`.
static RE_DESC_SIZE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"(?i)(?:(?P<thk>{DIM})\s*"\s*(?:[A-Z][\w\.]*\s+)?(?:X\s*)?)?(?P<width>{DIM})\s*"?\s*X\s*(?P<length>{DIM})"#
    ))
    .unwrap()
});

static RE_LEADING_QTY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?P<qty>\d{1,3})(?:[.):\-]\s+|\s+)(?P<rest>\S.*)$").unwrap());

static RE_FORM_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bFORM").unwrap());

/// Parse a bill of materials, or fall back to leading-quantity lines when no
/// quantity header exists anywhere in the input.
pub fn parse(lines: &[SourceLine<'_>]) -> Option<Vec<ParsedPartRecord>> {
    match lines.iter().position(|l| RE_QTY_HEADER.is_match(&l.text)) {
        Some(header) => parse_table(&lines[header + 1..]),
        None => parse_leading_quantity(lines),
    }
}

fn parse_table(rows: &[SourceLine<'_>]) -> Option<Vec<ParsedPartRecord>> {
    let records: Vec<_> = rows
        .iter()
        .filter_map(table_row)
        .filter_map(PartRecordBuilder::build)
        .collect();
    (!records.is_empty()).then_some(records)
}

fn table_row(line: &SourceLine<'_>) -> Option<PartRecordBuilder> {
    let fields: Vec<&str> = RE_COLUMN_SPLIT
        .split(line.text.trim())
        .map(str::trim)
        .collect();
    let quantity = fields.first()?;
    if !quantity.parse::<u32>().is_ok_and(|q| q > 0) {
        return None;
    }

    let part_number = fields.get(1).copied().unwrap_or_default();
    let description = fields.get(2).copied().unwrap_or_default();
    let material = fields.get(3).copied().unwrap_or_default();
    let notes = fields.get(4..).map(|rest| rest.join(" ")).unwrap_or_default();

    let described = format!("{description} {notes}");
    let part_type = if patterns::mentions_roll(&described) {
        PartType::PlateRoll
    } else if RE_FORM_WORD.is_match(&described) {
        PartType::PressBrake
    } else {
        PartType::Other
    };

    let mut builder = PartRecordBuilder::new(Evidence::Table, part_type, line.raw)
        .quantity(quantity, false)
        .client_part_number(part_number);
    if !material.is_empty() {
        builder = builder.material(material);
    }
    if let Some(caps) = RE_DESC_SIZE.captures(description) {
        if let Some(thk) = caps.name("thk") {
            builder = builder.thickness(thk.as_str());
        }
        builder = builder.width(&caps["width"]).length(&caps["length"]);
    }
    patterns::scan_roll(&described, &mut builder);

    let instructions = builder.instructions_mut();
    instructions.push("description", description);
    instructions.push("notes", notes);
    Some(builder)
}

fn parse_leading_quantity(lines: &[SourceLine<'_>]) -> Option<Vec<ParsedPartRecord>> {
    let records: Vec<_> = lines
        .iter()
        .filter(|l| !patterns::is_noise(&l.text))
        .filter_map(|line| {
            let caps = RE_LEADING_QTY.captures(&line.text)?;
            caps["qty"].parse::<u32>().ok().filter(|q| *q > 0)?;
            let rest = caps["rest"].trim();
            if !rest.chars().any(char::is_alphabetic) {
                return None;
            }
            let mut builder = PartRecordBuilder::new(Evidence::Fallback, PartType::Other, line.raw)
                .quantity(&caps["qty"], false);
            builder.instructions_mut().push("text", rest);
            Some(builder)
        })
        .filter_map(PartRecordBuilder::build)
        .collect();
    (!records.is_empty()).then_some(records)
}
