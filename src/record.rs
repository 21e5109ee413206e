//! Part records and the builder that produces them.
//!
//! Every parsing strategy fills a [`PartRecordBuilder`] with whatever its
//! patterns captured and calls [`PartRecordBuilder::build`]. The builder owns
//! the rules that must hold for every emitted record regardless of which
//! strategy matched:
//!
//! - thickness and grade pass through the dimension normalizer
//! - width and length become decimal-inch strings
//! - a missing or zero quantity becomes 1
//! - confidence follows the evidence actually matched (see [`Evidence`])
//! - a record is never built without its source text

use crate::normalize;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One reconstructed line of source text, in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLine {
    /// 1-indexed page the line came from (always 1 for text files).
    pub page: usize,
    /// 0-indexed position in the document's overall line sequence.
    pub index: usize,
    pub text: String,
}

impl RawLine {
    pub fn new(page: usize, index: usize, text: impl Into<String>) -> Self {
        Self {
            page,
            index,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartType {
    PlateRoll,
    FlatBar,
    PressBrake,
    PipeRoll,
    FlatStock,
    Other,
}

impl PartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartType::PlateRoll => "plate_roll",
            PartType::FlatBar => "flat_bar",
            PartType::PressBrake => "press_brake",
            PartType::PipeRoll => "pipe_roll",
            PartType::FlatStock => "flat_stock",
            PartType::Other => "other",
        }
    }
}

impl fmt::Display for PartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        })
    }
}

/// Orientation of the section relative to the rolling axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollType {
    EasyWay,
    HardWay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurePoint {
    #[default]
    Inside,
    Outside,
    Centerline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureType {
    #[default]
    Diameter,
    Radius,
}

/// Target curvature for a rolling operation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollSpec {
    /// Measured value in inches; `None` when no roll-to phrase was found.
    pub value: Option<f64>,
    pub measure_point: MeasurePoint,
    pub measure_type: MeasureType,
}

impl RollSpec {
    /// Roll spec for `value` measured at the given reference. An unknown or
    /// absent reference falls back to inside diameter.
    pub fn to(value: f64, reference: Option<&str>) -> Self {
        let (measure_point, measure_type) = reference
            .map(normalize::measure_reference)
            .unwrap_or_default();
        Self {
            value: Some(value),
            measure_point,
            measure_type,
        }
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }
}

/// The unit of output: one candidate part row for human review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedPartRecord {
    pub part_type: PartType,
    pub quantity: u32,
    /// Canonical fraction label such as `1/2"`, or empty.
    pub thickness: String,
    pub material: String,
    /// Decimal inches, or empty.
    pub width: String,
    /// Decimal inches, or empty.
    pub length: String,
    pub roll_type: Option<RollType>,
    pub roll_spec: RollSpec,
    pub special_instructions: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub client_part_number: Option<String>,
    pub confidence: Confidence,
    /// The originating source text, kept for audit and manual correction.
    pub raw_line: String,
}

/// Annotation text accumulated for one record, de-duplicated by keyword.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstructionSet {
    entries: Vec<(String, String)>,
}

impl InstructionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `text` unless an entry with the same keyword already exists.
    /// Returns whether the entry was added.
    pub fn push(&mut self, keyword: &str, text: impl Into<String>) -> bool {
        let key = keyword.to_ascii_lowercase();
        if self.contains(&key) {
            return false;
        }
        let text = text.into();
        if text.trim().is_empty() {
            return false;
        }
        self.entries.push((key, text.trim().to_string()));
        true
    }

    pub fn contains(&self, keyword: &str) -> bool {
        let key = keyword.to_ascii_lowercase();
        self.entries.iter().any(|(k, _)| *k == key)
    }

    /// Drop the entry for `keyword`, if any.
    pub fn remove(&mut self, keyword: &str) {
        let key = keyword.to_ascii_lowercase();
        self.entries.retain(|(k, _)| *k != key);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|(_, text)| text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// How the record's core fields were matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evidence {
    /// A dedicated part-type pattern (plate, flat bar, PO block header).
    Pattern,
    /// A row of a recognised bill-of-materials table.
    Table,
    /// The permissive "leading integer + text" fallback.
    Fallback,
}

/// Collects a strategy's captures before normalisation.
#[derive(Debug, Clone)]
pub struct PartRecordBuilder {
    evidence: Evidence,
    raw_line: String,
    part_type: PartType,
    quantity: Option<u32>,
    quantity_from_unit: bool,
    thickness: Option<String>,
    material: Option<String>,
    width: Option<String>,
    length: Option<String>,
    roll_type: Option<RollType>,
    roll_spec: RollSpec,
    instructions: InstructionSet,
    client_part_number: Option<String>,
}

impl PartRecordBuilder {
    pub fn new(evidence: Evidence, part_type: PartType, raw_line: impl Into<String>) -> Self {
        Self {
            evidence,
            raw_line: raw_line.into().trim().to_string(),
            part_type,
            quantity: None,
            quantity_from_unit: false,
            thickness: None,
            material: None,
            width: None,
            length: None,
            roll_type: None,
            roll_spec: RollSpec::default(),
            instructions: InstructionSet::new(),
            client_part_number: None,
        }
    }

    /// Record the quantity capture. `with_unit` means it came from dedicated
    /// `<n> PCS` syntax rather than a bare leading number.
    pub fn quantity(mut self, raw: &str, with_unit: bool) -> Self {
        self.quantity = raw.trim().parse::<u32>().ok().filter(|q| *q > 0);
        self.quantity_from_unit = with_unit && self.quantity.is_some();
        self
    }

    pub fn thickness(mut self, raw: impl Into<String>) -> Self {
        self.thickness = Some(raw.into());
        self
    }

    pub fn material(mut self, raw: impl Into<String>) -> Self {
        self.material = Some(raw.into());
        self
    }

    pub fn width(mut self, raw: impl Into<String>) -> Self {
        self.width = Some(raw.into());
        self
    }

    pub fn length(mut self, raw: impl Into<String>) -> Self {
        self.length = Some(raw.into());
        self
    }

    /// Length given in decimal inches (already unit-converted by the caller).
    pub fn length_inches(mut self, inches: f64) -> Self {
        self.length = Some(normalize::format_decimal(inches));
        self
    }

    pub fn client_part_number(mut self, pn: impl Into<String>) -> Self {
        let pn = pn.into();
        if !pn.trim().is_empty() {
            self.client_part_number = Some(pn.trim().to_string());
        }
        self
    }

    /// Extend the source text with a consumed continuation line.
    pub fn append_raw_line(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if !self.raw_line.is_empty() {
            self.raw_line.push('\n');
        }
        self.raw_line.push_str(text);
    }

    pub fn set_part_type(&mut self, part_type: PartType) {
        self.part_type = part_type;
    }

    pub fn part_type_value(&self) -> PartType {
        self.part_type
    }

    pub fn set_roll_type(&mut self, roll_type: RollType) {
        self.roll_type = Some(roll_type);
    }

    pub fn roll_type_value(&self) -> Option<RollType> {
        self.roll_type
    }

    /// Set the roll spec unless one is already present.
    pub fn set_roll_spec_if_unset(&mut self, spec: RollSpec) {
        if !self.roll_spec.is_set() {
            self.roll_spec = spec;
        }
    }

    pub fn roll_spec_value(&self) -> &RollSpec {
        &self.roll_spec
    }

    pub fn has_thickness(&self) -> bool {
        self.thickness.is_some()
    }

    pub fn has_width(&self) -> bool {
        self.width.is_some()
    }

    pub fn instructions_mut(&mut self) -> &mut InstructionSet {
        &mut self.instructions
    }

    pub fn instructions(&self) -> &InstructionSet {
        &self.instructions
    }

    /// Normalise the captures and assign confidence.
    ///
    /// Returns `None` only when there is no source text to tie the record to.
    pub fn build(self) -> Option<ParsedPartRecord> {
        if self.raw_line.is_empty() {
            return None;
        }

        let confidence = match self.evidence {
            Evidence::Fallback => Confidence::Low,
            Evidence::Table => Confidence::Medium,
            Evidence::Pattern if !self.quantity_from_unit => Confidence::Medium,
            // Un-annotated lines are more often cut-to-size stock than real
            // roll jobs, so a bare dimensional match is only medium.
            Evidence::Pattern if !self.roll_spec.is_set() && self.instructions.is_empty() => {
                Confidence::Medium
            }
            Evidence::Pattern => Confidence::High,
        };

        Some(ParsedPartRecord {
            part_type: self.part_type,
            quantity: self.quantity.unwrap_or(1),
            thickness: self
                .thickness
                .as_deref()
                .map(normalize::thickness_label)
                .unwrap_or_default(),
            material: self
                .material
                .as_deref()
                .map(normalize::normalize_grade)
                .unwrap_or_default(),
            width: self.width.as_deref().map(decimal_field).unwrap_or_default(),
            length: self.length.as_deref().map(decimal_field).unwrap_or_default(),
            roll_type: self.roll_type,
            roll_spec: self.roll_spec,
            special_instructions: self.instructions.render(),
            client_part_number: self.client_part_number,
            confidence,
            raw_line: self.raw_line,
        })
    }
}

fn decimal_field(raw: &str) -> String {
    let value = normalize::fraction_to_decimal(raw);
    if value > 0.0 {
        normalize::format_decimal(value)
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_set_dedups_by_keyword() {
        let mut set = InstructionSet::new();
        assert!(set.push("tack", "Tack weld"));
        assert!(!set.push("TACK", "Tack weld"));
        assert!(set.push("trim", "Trim"));
        assert_eq!(set.render(), "Tack weld Trim");
        set.remove("trim");
        assert_eq!(set.render(), "Tack weld");
    }

    #[test]
    fn pattern_with_unit_and_annotation_is_high() {
        let mut b = PartRecordBuilder::new(Evidence::Pattern, PartType::PlateRoll, "2 PCS ...")
            .quantity("2", true)
            .thickness("1/2")
            .material("a36")
            .width("10")
            .length("48.57");
        b.instructions_mut().push("tack", "Tack weld");
        let r = b.build().unwrap();
        assert_eq!(r.confidence, Confidence::High);
        assert_eq!(r.thickness, "1/2\"");
        assert_eq!(r.material, "A36");
        assert_eq!(r.width, "10");
        assert_eq!(r.length, "48.57");
    }

    #[test]
    fn unannotated_pattern_is_demoted() {
        let r = PartRecordBuilder::new(Evidence::Pattern, PartType::PlateRoll, "1 PCS ...")
            .quantity("1", true)
            .build()
            .unwrap();
        assert_eq!(r.confidence, Confidence::Medium);
    }

    #[test]
    fn quantity_without_unit_is_never_high() {
        let mut b = PartRecordBuilder::new(Evidence::Pattern, PartType::PlateRoll, "1 1/2\" ...")
            .quantity("1", false);
        b.set_roll_spec_if_unset(RollSpec::to(42.0, Some("OD")));
        assert_eq!(b.build().unwrap().confidence, Confidence::Medium);
    }

    #[test]
    fn zero_quantity_defaults_to_one() {
        let r = PartRecordBuilder::new(Evidence::Pattern, PartType::PlateRoll, "0 PCS")
            .quantity("0", true)
            .build()
            .unwrap();
        assert_eq!(r.quantity, 1);
        assert_eq!(r.confidence, Confidence::Medium);
    }

    #[test]
    fn empty_source_text_builds_nothing() {
        assert!(PartRecordBuilder::new(Evidence::Fallback, PartType::Other, "   ")
            .build()
            .is_none());
    }

    #[test]
    fn roll_spec_is_not_overwritten() {
        let mut b = PartRecordBuilder::new(Evidence::Pattern, PartType::PlateRoll, "x");
        b.set_roll_spec_if_unset(RollSpec::to(42.125, Some("ID")));
        b.set_roll_spec_if_unset(RollSpec::to(10.0, Some("OR")));
        assert_eq!(b.roll_spec_value().value, Some(42.125));
        assert_eq!(b.roll_spec_value().measure_point, MeasurePoint::Inside);
    }

    #[test]
    fn roll_spec_defaults_to_inside_diameter() {
        let spec = RollSpec::to(30.0, None);
        assert_eq!(spec.measure_point, MeasurePoint::Inside);
        assert_eq!(spec.measure_type, MeasureType::Diameter);
        let spec = RollSpec::to(30.0, Some("??"));
        assert_eq!(spec.measure_point, MeasurePoint::Inside);
    }

    #[test]
    fn serialises_with_wire_names() {
        let r = PartRecordBuilder::new(Evidence::Table, PartType::PressBrake, "3\tA-1")
            .quantity("3", false)
            .client_part_number("A-1")
            .build()
            .unwrap();
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["partType"], "press_brake");
        assert_eq!(json["confidence"], "medium");
        assert_eq!(json["clientPartNumber"], "A-1");
        assert_eq!(json["rollSpec"]["measurePoint"], "inside");
        assert_eq!(json["rawLine"], "3\tA-1");
    }
}
