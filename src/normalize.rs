//! Dimension and material normalisation.
//!
//! Stateless helpers shared by every parser strategy. They never fail: input
//! that cannot be interpreted yields `0`, an empty string, or the trimmed
//! input, and the record goes to human review with whatever was recovered.
//!
//! [`fraction_to_decimal`] and [`decimal_to_fraction`] are deliberately not
//! inverses. The second snaps to a short table of shop-floor labels, so
//! `0.3` comes back as `0.3"` while `0.375` comes back as `3/8"`.

use crate::record::{MeasurePoint, MeasureType};
use once_cell::sync::Lazy;
use regex::Regex;

/// Labels a decimal thickness can snap to.
pub const FRACTION_LABELS: &[(f64, &str)] = &[
    (0.125, "1/8\""),
    (0.25, "1/4\""),
    (0.375, "3/8\""),
    (0.5, "1/2\""),
    (0.625, "5/8\""),
    (0.75, "3/4\""),
    (0.875, "7/8\""),
    (1.0, "1\""),
    (1.25, "1-1/4\""),
    (1.5, "1-1/2\""),
    (2.0, "2\""),
];

const SNAP_TOLERANCE: f64 = 0.005;

/// Manufacturers' standard gauge for sheet steel, in inches.
const GAUGE_TABLE: &[(u32, f64)] = &[
    (7, 0.1793),
    (8, 0.1644),
    (9, 0.1495),
    (10, 0.1345),
    (11, 0.1196),
    (12, 0.1046),
    (13, 0.0897),
    (14, 0.0747),
    (16, 0.0598),
    (18, 0.0478),
    (20, 0.0359),
    (22, 0.0299),
    (24, 0.0239),
    (26, 0.0179),
    (28, 0.0149),
];

static RE_MIXED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)(?:\s*-\s*|\s+)(\d+)\s*/\s*(\d+)$").unwrap());
static RE_SIMPLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\s*/\s*(\d+)$").unwrap());
static RE_DECIMAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:\d+\.?\d*|\.\d+)$").unwrap());
static RE_GAUGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d{1,2})\s*(?:GA|GAUGE|GA\.)$").unwrap());
static RE_MIXED_HYPHEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d)\s*-\s*(\d+/\d+)").unwrap());
static RE_GLYPH_AFTER_DIGIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d)\s?([½¼¾⅛⅜⅝⅞⅓⅔⅕⅖⅗⅘⅙⅚⅐⅑⅒])").unwrap());

/// Parse `W-N/D`, `W N/D`, `N/D`, or a bare decimal into inches.
///
/// Quote and inch marks are stripped first. Returns `0.0` for anything else,
/// including a zero denominator.
pub fn fraction_to_decimal(text: &str) -> f64 {
    let cleaned = strip_inch_marks(text);
    let s = cleaned.trim();

    if let Some(c) = RE_MIXED.captures(s) {
        let whole: f64 = c[1].parse().unwrap_or(0.0);
        return match simple_fraction(&c[2], &c[3]) {
            Some(frac) => whole + frac,
            None => 0.0,
        };
    }
    if let Some(c) = RE_SIMPLE.captures(s) {
        return simple_fraction(&c[1], &c[2]).unwrap_or(0.0);
    }
    if RE_DECIMAL.is_match(s) {
        return s.parse().unwrap_or(0.0);
    }
    0.0
}

fn simple_fraction(num: &str, den: &str) -> Option<f64> {
    let n: f64 = num.parse().ok()?;
    let d: f64 = den.parse().ok()?;
    if d == 0.0 {
        None
    } else {
        Some(n / d)
    }
}

fn strip_inch_marks(text: &str) -> String {
    text.replace(['"', '\u{201C}', '\u{201D}', '\u{2033}'], "")
        .replace("''", "")
}

/// Snap a decimal inch value to the nearest fraction label, or fall back to
/// the plain decimal with an inch mark.
pub fn decimal_to_fraction(value: f64) -> String {
    FRACTION_LABELS
        .iter()
        .find(|(v, _)| (v - value).abs() <= SNAP_TOLERANCE)
        .map(|(_, label)| (*label).to_string())
        .unwrap_or_else(|| format!("{}\"", format_decimal(value)))
}

/// Decimal inches for a gauge token such as `"16 ga"`.
pub fn gauge_to_decimal(text: &str) -> Option<f64> {
    let c = RE_GAUGE.captures(text.trim())?;
    let gauge: u32 = c[1].parse().ok()?;
    GAUGE_TABLE
        .iter()
        .find(|(g, _)| *g == gauge)
        .map(|(_, inches)| *inches)
}

/// Canonical thickness label for a captured thickness token.
///
/// Gauge thicknesses keep their gauge form; everything else is snapped
/// through [`decimal_to_fraction`]. Unparsable input gives an empty label.
pub fn thickness_label(raw: &str) -> String {
    let raw = raw.trim();
    if let Some(c) = RE_GAUGE.captures(raw) {
        if gauge_to_decimal(raw).is_some() {
            return format!("{} ga", &c[1]);
        }
    }
    let value = fraction_to_decimal(raw);
    if value > 0.0 {
        decimal_to_fraction(value)
    } else {
        String::new()
    }
}

/// Shortest decimal rendering without trailing zeros (`10`, `48.5`, `227.77`).
pub fn format_decimal(value: f64) -> String {
    let rounded = (value * 10_000.0).round() / 10_000.0;
    format!("{}", rounded)
}

/// Map a free-text grade token to a canonical code.
///
/// Matching ignores case and spaces. Unrecognised tokens come back trimmed.
pub fn normalize_grade(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let key: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_ascii_uppercase();

    let canonical = if key.contains("316") {
        "316 S/S"
    } else if key.contains("304") {
        "304 S/S"
    } else if key.contains("A572") || key == "GR50" || key == "GRADE50" {
        "A572-50"
    } else if key.contains("A516") {
        "A516-70"
    } else if key.contains("A514") || key == "T1" {
        "A514"
    } else if key.contains("AR400") {
        "AR400"
    } else if key.contains("AR500") {
        "AR500"
    } else if key.contains("A36") {
        "A36"
    } else if key.contains("A500") {
        "A500"
    } else if key.contains("A53") {
        "A53"
    } else if key.contains("A106") {
        "A106"
    } else if matches!(key.as_str(), "SS" | "S/S" | "STAINLESS" | "STAINLESSSTEEL" | "STN") {
        "304 S/S"
    } else if matches!(
        key.as_str(),
        "CS" | "C/S" | "MS" | "HR" | "HRS" | "MILD" | "MILDSTEEL" | "CARBON" | "CARBONSTEEL"
    ) {
        "A36"
    } else if key.contains("5052") {
        "5052 AL"
    } else if key.contains("6061") {
        "6061 AL"
    } else {
        return trimmed.to_string();
    };
    canonical.to_string()
}

/// Replace vulgar-fraction glyphs with ASCII `N/D` and tighten mixed numbers.
///
/// `1½"` becomes `1-1/2"` and `1 - 1/4` becomes `1-1/4`. Typographic inch
/// marks and the Unicode fraction slash are folded to ASCII as well.
pub fn normalize_unicode_fractions(text: &str) -> String {
    let joined = RE_GLYPH_AFTER_DIGIT.replace_all(text, "${1}-${2}");
    let mut out = String::with_capacity(joined.len() + 8);
    for ch in joined.chars() {
        match glyph_fraction(ch) {
            Some(ascii) => out.push_str(ascii),
            None => match ch {
                '\u{2044}' | '\u{2215}' => out.push('/'),
                '\u{201C}' | '\u{201D}' | '\u{2033}' => out.push('"'),
                '\u{2018}' | '\u{2019}' | '\u{2032}' => out.push('\''),
                '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' => out.push('-'),
                _ => out.push(ch),
            },
        }
    }
    RE_MIXED_HYPHEN.replace_all(&out, "${1}-${2}").into_owned()
}

fn glyph_fraction(ch: char) -> Option<&'static str> {
    Some(match ch {
        '½' => "1/2",
        '¼' => "1/4",
        '¾' => "3/4",
        '⅛' => "1/8",
        '⅜' => "3/8",
        '⅝' => "5/8",
        '⅞' => "7/8",
        '⅓' => "1/3",
        '⅔' => "2/3",
        '⅕' => "1/5",
        '⅖' => "2/5",
        '⅗' => "3/5",
        '⅘' => "4/5",
        '⅙' => "1/6",
        '⅚' => "5/6",
        '⅐' => "1/7",
        '⅑' => "1/9",
        '⅒' => "1/10",
        _ => return None,
    })
}

/// Interpret a roll reference such as `ID`, `O.R.`, `CL` or
/// `inside diameter`. Unknown references default to inside diameter.
pub fn measure_reference(reference: &str) -> (MeasurePoint, MeasureType) {
    let key: String = reference
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_uppercase();

    let prefixes = [
        ("INSIDE", MeasurePoint::Inside),
        ("OUTSIDE", MeasurePoint::Outside),
        ("CENTERLINE", MeasurePoint::Centerline),
        ("CL", MeasurePoint::Centerline),
        ("I", MeasurePoint::Inside),
        ("O", MeasurePoint::Outside),
    ];
    let Some((point, rest)) = prefixes
        .iter()
        .find_map(|(prefix, point)| key.strip_prefix(prefix).map(|rest| (*point, rest)))
    else {
        return Default::default();
    };

    match rest {
        "" | "D" | "DIA" | "DIAMETER" => (point, MeasureType::Diameter),
        "R" | "RAD" | "RADIUS" => (point, MeasureType::Radius),
        _ => Default::default(),
    }
}
