//! Shared pattern library: dimension tokens, roll-to phrases, annotations,
//! and document noise.
//!
//! Every regex is case-insensitive and runs on text that has already been
//! through [`crate::normalize::normalize_unicode_fractions`].

use crate::normalize;
use crate::pipeline::extract::PAGE_BREAK_MARKER;
use crate::record::{PartRecordBuilder, PartType, RollSpec, RollType};
use once_cell::sync::Lazy;
use regex::Regex;

/// A dimension: mixed number, simple fraction, decimal, or integer.
pub(crate) const DIM: &str = r"\d+-\d+/\d+|\d+/\d+|\d*\.\d+|\d+";

/// A grade token. Leading-letter tokens (`A36`, `A572 GR50`) or a bare
/// stainless series number. A lone `X` is a dimension separator, never a grade.
pub(crate) const GRADE: &str = r"(?:30[34]|316|321|410|430)L?(?:\s*S/?S)?\b|(?:[A-WYZ][\w/\-\.]*|X[\w/\-\.]+)(?:\s+GR\.?\s*\d+)?|\d[\d/\-\.]*[A-Z][\w/\-\.]*";

/// A roll reference: `ID`, `O.D.`, `IR`, `CL`, `inside diameter`, ...
const REF: &str = r"(?:INSIDE|OUTSIDE|CENTER\s*LINE)\s+(?:DIAMETER|DIA|RADIUS|RAD)\b\.?|I\.?D\b\.?|O\.?D\b\.?|I\.?R\b\.?|O\.?R\b\.?|C\.?L\.?[DR]\b\.?|C\.?L\b\.?";

static RE_ROLL_RT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"(?i)\bR/T\s+(?:TO\s+)?(?:AN?\s+)?(?P<val>{DIM})\s*(?:"|IN\b\.?)?\s*(?P<ref>{REF})?"#
    ))
    .unwrap()
});

static RE_ROLL_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"(?i)\bROLL(?:ED)?(?:\s+(?:AND|&)\s+TACK(?:ED)?)?(?:\s+(?:THE\s+)?(?:EASY|HARD)\s*WAY)?\s+TO\s+(?:AN?\s+)?(?P<val>{DIM})\s*(?:"|IN\b\.?)?\s*(?P<ref>{REF})?"#
    ))
    .unwrap()
});

static RE_EASY_WAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bEASY\s*WAY\b|\bE/W\b").unwrap());
static RE_HARD_WAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bHARD\s*WAY\b|\bH/W\b").unwrap());
static RE_TACK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bTACK").unwrap());
static RE_TRIM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bTRIM(?:MED)?\b").unwrap());
static RE_FORM_AND_TRIM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bFORM(?:ED)?\s+(?:AND|&)\s+TRIM").unwrap());
static RE_DRILL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"(?i)\bDRILL\s*\(?\s*(?P<n>\d+)\s*\)?\s*-?\s*(?P<size>{DIM})\s*"?\s*(?:DIA\.?\s*)?HOLES?\b"#
    ))
    .unwrap()
});
static RE_PER_DWG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bPER\s+(?:DWG|DRAWING|DRW|PRINT)\b\.?(?:\s*(?:#|NO\.?)?\s*[A-Z0-9][\w\-\.]*)?")
        .unwrap()
});
static RE_SUPPLIED_BY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bSUPPLIED\s+BY\s+(?P<name>[^,;()]+)").unwrap());
static RE_ROLL_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bROLL").unwrap());
static RE_KNOWN_GRADE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:A36|A572(?:[\s\-]*(?:GR\.?\s*)?50)?|A516(?:-70)?|A514|AR[45]00|(?:304|316)L?(?:\s*S/?S)?|S/S)\b")
        .unwrap()
});

static RE_NOISE_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)^\s*(?:
            PAGE\s+\d+
          | SUB\s*-?\s*TOTAL | GRAND\s+TOTAL | TOTAL
          | SALES\s+TAX | TAX\b
          | FREIGHT | SHIPPING | SHIP\s+(?:TO|VIA|DATE)
          | BILL\s+TO | SOLD\s+TO | VENDOR | SUPPLIER
          | PURCHASE\s+ORDER | P\.?\s?O\.?\s*(?:\#|NO\b|NUMBER)
          | ORDER\s+(?:\#|NO\b|DATE) | INVOICE
          | DATE\b | DUE\s+DATE | TERMS | REMIT
          | PHONE | TEL\b | FAX | E-?MAIL
          | BALANCE | AMOUNT | UNIT\s+PRICE | PRICE | EXTENDED
          | AUTHORI[ZS]ED | SIGNATURE | APPROVED | BUYER | CONTACT
          | THANK\s+YOU
        )",
    )
    .unwrap()
});
static RE_PAGE_OF: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bPAGE\s+\d+\s+OF\s+\d+\b").unwrap());

/// Headers, totals, page numbers, and financial lines that never describe a part.
pub fn is_noise(text: &str) -> bool {
    let t = text.trim();
    t == PAGE_BREAK_MARKER || RE_NOISE_START.is_match(t) || RE_PAGE_OF.is_match(t)
}

/// First roll-to phrase in `text`, in either phrasing.
pub fn detect_roll_spec(text: &str) -> Option<RollSpec> {
    let caps = RE_ROLL_RT
        .captures(text)
        .or_else(|| RE_ROLL_PHRASE.captures(text))?;
    let value = normalize::fraction_to_decimal(&caps["val"]);
    if value <= 0.0 {
        return None;
    }
    Some(RollSpec::to(value, caps.name("ref").map(|m| m.as_str())))
}

pub fn detect_roll_type(text: &str) -> Option<RollType> {
    if RE_EASY_WAY.is_match(text) {
        Some(RollType::EasyWay)
    } else if RE_HARD_WAY.is_match(text) {
        Some(RollType::HardWay)
    } else {
        None
    }
}

pub fn mentions_roll(text: &str) -> bool {
    RE_ROLL_WORD.is_match(text) || RE_ROLL_RT.is_match(text)
}

/// First recognisable grade anywhere in `text`.
pub fn find_grade(text: &str) -> Option<String> {
    RE_KNOWN_GRADE
        .find(text)
        .map(|m| normalize::normalize_grade(m.as_str()))
}

/// Apply roll-to, orientation, and instruction annotations found in `text`.
///
/// Used for both the spec line itself and a block's continuation lines. An
/// existing roll spec is never overwritten.
pub fn scan_annotations(text: &str, record: &mut PartRecordBuilder) {
    if let Some(spec) = detect_roll_spec(text) {
        record.set_roll_spec_if_unset(spec);
    }
    if let Some(roll_type) = detect_roll_type(text) {
        record.set_roll_type(roll_type);
    }
    if RE_TACK.is_match(text) {
        record.instructions_mut().push("tack", "Tack weld");
    }
    if RE_FORM_AND_TRIM.is_match(text) {
        record.set_part_type(PartType::PressBrake);
        let instructions = record.instructions_mut();
        instructions.remove("trim");
        instructions.push("form and trim", "Form and trim");
    } else if RE_TRIM.is_match(text) && !record.instructions().contains("form and trim") {
        record.instructions_mut().push("trim", "Trim");
    }
    if let Some(caps) = RE_DRILL.captures(text) {
        let size = caps["size"].trim_end_matches('"');
        record
            .instructions_mut()
            .push("drill", format!("Drill ({}) {}\" holes", &caps["n"], size));
    }
    for m in RE_PER_DWG.find_iter(text) {
        let reference = m.as_str().trim();
        record
            .instructions_mut()
            .push(&reference.to_ascii_uppercase(), reference);
    }
}

/// Roll-to and orientation only, for dialects that carry no other annotations.
pub fn scan_roll(text: &str, record: &mut PartRecordBuilder) {
    if let Some(spec) = detect_roll_spec(text) {
        record.set_roll_spec_if_unset(spec);
    }
    if let Some(roll_type) = detect_roll_type(text) {
        record.set_roll_type(roll_type);
    }
}

/// `SUPPLIED BY <name>` as an instruction, if present.
pub fn scan_supplied_by(text: &str, record: &mut PartRecordBuilder) {
    if let Some(caps) = RE_SUPPLIED_BY.captures(text) {
        let name = caps["name"].trim();
        if !name.is_empty() {
            record
                .instructions_mut()
                .push("supplied by", format!("Supplied by {name}"));
        }
    }
}
