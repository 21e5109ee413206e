//! Single-line full specs: one complete part description per line.
//!
//! Three line shapes are recognised, tried in order, first match wins:
//!
//! 1. plate roll: `<qty> PCS <thk>" [<grade>] <width> X <length>"`
//! 2. flat bar: `<qty> PC <thk>" X <width> X <length>' [<grade>] FLAT BAR`, grade
//!    defaulting to A36
//! 3. simple plate: `<qty> [PC|PCS|EA] <thk>" [<grade>] <width> X <length>`
//!
//! The same matcher decides what counts as a block header for the
//! purchase-order strategy.

use super::patterns::{self, DIM, GRADE};
use super::SourceLine;
use crate::normalize;
use crate::record::{Evidence, ParsedPartRecord, PartRecordBuilder, PartType};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static RE_PLATE_ROLL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"(?i)^\s*(?P<qty>\d+)\s*PCS\.?\s+(?P<thk>\d{{1,2}}\s*GA\b|{DIM})(?:\s*"\s*|\s+)(?:(?P<grade>{GRADE})\s+)?(?P<width>{DIM})\s*"?\s*X\s*(?P<length>{DIM})\s*"?"#
    ))
    .unwrap()
});

static RE_FLAT_BAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"(?i)^\s*(?P<qty>\d+)\s*(?:PCS?|PIECES?|EA)\.?\s+(?P<thk>{DIM})\s*"?\s*X\s*(?P<width>{DIM})\s*"?\s*X\s*(?P<length>{DIM})\s*(?P<unit>'|FT\b\.?|FEET\b|"|IN\b\.?)?\s*(?:[A-Z0-9][\w/\-\.]*\s+)?(?:FLAT\s*BAR|BAR|FLAT|FB)\b"#
    ))
    .unwrap()
});

static RE_SIMPLE_PLATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"(?i)^\s*(?P<qty>\d+)\s*(?P<unit>PCS?|PIECES?|EA)?\.?\s*[-:)]?\s+(?:(?P<gauge>\d{{1,2}}\s*GA)\b\.?\s*|(?P<thk>{DIM})\s*"\s*)(?:(?P<grade>{GRADE})\s+)?(?P<width>{DIM})\s*"?\s*X\s*(?P<length>{DIM})\s*"?"#
    ))
    .unwrap()
});

/// Whether `text` is a complete single-line spec.
pub fn is_spec_line(text: &str) -> bool {
    RE_PLATE_ROLL.is_match(text) || RE_FLAT_BAR.is_match(text) || RE_SIMPLE_PLATE.is_match(text)
}

/// Match one line against the three shapes and collect everything it says.
pub fn match_line(line: &SourceLine<'_>) -> Option<PartRecordBuilder> {
    let text = line.text.as_str();
    if let Some(caps) = RE_PLATE_ROLL.captures(text) {
        return Some(plate_roll(line, &caps));
    }
    if let Some(caps) = RE_FLAT_BAR.captures(text) {
        return Some(flat_bar(line, &caps));
    }
    RE_SIMPLE_PLATE
        .captures(text)
        .map(|caps| simple_plate(line, &caps))
}

/// Every line matched independently; `None` when nothing matched.
pub fn parse(lines: &[SourceLine<'_>]) -> Option<Vec<ParsedPartRecord>> {
    let records: Vec<_> = lines
        .iter()
        .filter(|line| !patterns::is_noise(&line.text))
        .filter_map(match_line)
        .filter_map(PartRecordBuilder::build)
        .collect();
    (!records.is_empty()).then_some(records)
}

fn dimensions(builder: PartRecordBuilder, caps: &Captures<'_>) -> PartRecordBuilder {
    let mut builder = builder.width(&caps["width"]).length(&caps["length"]);
    if let Some(grade) = caps.name("grade") {
        builder = builder.material(grade.as_str());
    }
    builder
}

fn plate_roll(line: &SourceLine<'_>, caps: &Captures<'_>) -> PartRecordBuilder {
    let builder = PartRecordBuilder::new(Evidence::Pattern, PartType::PlateRoll, line.raw)
        .quantity(&caps["qty"], true)
        .thickness(&caps["thk"]);
    let mut builder = dimensions(builder, caps);
    patterns::scan_annotations(&line.text, &mut builder);
    builder
}

fn flat_bar(line: &SourceLine<'_>, caps: &Captures<'_>) -> PartRecordBuilder {
    let length = normalize::fraction_to_decimal(&caps["length"]);
    let in_feet = caps
        .name("unit")
        .map(|u| u.as_str().starts_with('\'') || u.as_str().to_ascii_uppercase().starts_with('F'))
        .unwrap_or(false);
    let length = if in_feet { length * 12.0 } else { length };

    // The grade may sit before or after the bar keyword.
    let after_length = &line.text[caps.name("length").map_or(0, |m| m.end())..];
    let grade = patterns::find_grade(after_length).unwrap_or_else(|| "A36".to_string());

    let mut builder = PartRecordBuilder::new(Evidence::Pattern, PartType::FlatBar, line.raw)
        .quantity(&caps["qty"], true)
        .thickness(&caps["thk"])
        .width(&caps["width"])
        .material(grade);
    if length > 0.0 {
        builder = builder.length_inches(length);
    }
    patterns::scan_annotations(&line.text, &mut builder);
    patterns::scan_supplied_by(&line.text, &mut builder);
    builder
}

fn simple_plate(line: &SourceLine<'_>, caps: &Captures<'_>) -> PartRecordBuilder {
    let thickness = caps
        .name("gauge")
        .or_else(|| caps.name("thk"))
        .map_or("", |m| m.as_str());
    let builder = PartRecordBuilder::new(Evidence::Pattern, PartType::FlatStock, line.raw)
        .quantity(&caps["qty"], caps.name("unit").is_some())
        .thickness(thickness);
    let mut builder = dimensions(builder, caps);
    patterns::scan_roll(&line.text, &mut builder);
    if builder.roll_spec_value().is_set() || patterns::mentions_roll(&line.text) {
        builder.set_part_type(PartType::PlateRoll);
    }
    builder
}
