//! Purchase-order blocks: a spec line followed by free-text instruction lines.
//!
//! ```text
//! 2 PCS 1/2" A36 10 X 48.57"                 <- header (a full single-line spec)
//! ROLL AND TACK THE EASY WAY TO A 42.125" ID <- continuation
//! DRILL (4) 13/16" HOLES PER DWG 1044-B      <- continuation
//! 1 PCS 3/8" A36 12 X 60"                    <- next header
//! ```
//!
//! A block ends at the next header, at a document-noise line, or at end of
//! input. Each block owns its own [`PartRecordBuilder`]; nothing accumulates
//! across blocks.

use super::{full_spec, patterns, SourceLine};
use crate::record::{ParsedPartRecord, PartRecordBuilder};
use tracing::trace;

/// Parse block-structured input.
///
/// Returns `None` unless at least one block actually consumed a continuation
/// line: a document of bare spec lines is left to the single-line strategy.
pub fn parse(lines: &[SourceLine<'_>]) -> Option<Vec<ParsedPartRecord>> {
    let mut records = Vec::new();
    let mut saw_continuation = false;
    let mut i = 0;

    while i < lines.len() {
        let header = &lines[i];
        i += 1;
        if patterns::is_noise(&header.text) {
            continue;
        }
        let Some(mut block) = full_spec::match_line(header) else {
            continue;
        };

        let consumed = consume_continuations(&lines[i..], &mut block);
        if consumed > 0 {
            trace!(line = %header.raw, consumed, "purchase-order block");
        }
        saw_continuation |= lines[i..i + consumed]
            .iter()
            .any(|l| !l.text.trim().is_empty());
        i += consumed;

        records.extend(block.build());
    }

    (saw_continuation && !records.is_empty()).then_some(records)
}

/// Fold continuation lines into `block`. Returns how many lines were consumed.
fn consume_continuations(lines: &[SourceLine<'_>], block: &mut PartRecordBuilder) -> usize {
    let mut consumed = 0;
    for line in lines {
        let text = line.text.trim();
        if !text.is_empty() {
            if patterns::is_noise(text) || full_spec::is_spec_line(text) {
                break;
            }
            patterns::scan_annotations(text, block);
            block.append_raw_line(line.raw);
        }
        consumed += 1;
    }
    consumed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Confidence, MeasurePoint, MeasureType, PartType, RollType};

    fn lines<'a>(texts: &[&'a str]) -> Vec<SourceLine<'a>> {
        texts.iter().copied().map(SourceLine::new).collect()
    }

    #[test]
    fn two_line_block_is_high_confidence() {
        let input = lines(&[
            "2 PCS 1/2\" A36 10 X 48.57\"",
            "ROLL AND TACK THE EASY WAY TO A 42.125\" ID",
        ]);
        let records = parse(&input).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.quantity, 2);
        assert_eq!(r.roll_spec.value, Some(42.125));
        assert_eq!(r.roll_spec.measure_point, MeasurePoint::Inside);
        assert_eq!(r.roll_spec.measure_type, MeasureType::Diameter);
        assert_eq!(r.roll_type, Some(RollType::EasyWay));
        assert!(r.special_instructions.contains("Tack weld"));
        assert_eq!(r.confidence, Confidence::High);
        assert!(r.raw_line.starts_with("2 PCS"));
        assert!(r.raw_line.contains("42.125"));
    }

    #[test]
    fn blocks_end_at_next_header_and_noise() {
        let input = lines(&[
            "PURCHASE ORDER 7781",
            "1 PCS 3/8\" A36 12 X 60\"",
            "R/T TO A 20\" OD",
            "",
            "TRIM ENDS",
            "4 PCS 1/4\" A36 6 X 30\"",
            "DRILL (2) 1/2\" HOLES",
            "SUBTOTAL 1,200.00",
            "TACK",
        ]);
        let records = parse(&input).unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].roll_spec.value, Some(20.0));
        assert_eq!(records[0].roll_spec.measure_point, MeasurePoint::Outside);
        assert_eq!(records[0].special_instructions, "Trim");

        assert_eq!(records[1].quantity, 4);
        assert_eq!(records[1].special_instructions, "Drill (2) 1/2\" holes");
    }

    #[test]
    fn header_roll_spec_wins_over_continuation() {
        let input = lines(&[
            "1 PCS 1/2\" A36 10 X 40\" R/T TO A 30\" IR",
            "ROLL TO 99\" OD THE HARD WAY",
        ]);
        let r = &parse(&input).unwrap()[0];
        assert_eq!(r.roll_spec.value, Some(30.0));
        assert_eq!(r.roll_spec.measure_type, MeasureType::Radius);
        assert_eq!(r.roll_type, Some(RollType::HardWay));
    }

    #[test]
    fn form_and_trim_makes_press_brake() {
        let input = lines(&["1 PCS 1/4\" A36 8 X 24\"", "FORM AND TRIM PER DWG 55"]);
        let r = &parse(&input).unwrap()[0];
        assert_eq!(r.part_type, PartType::PressBrake);
        assert_eq!(r.special_instructions, "Form and trim PER DWG 55");
    }

    #[test]
    fn bare_spec_lines_are_left_for_single_line_strategy() {
        let input = lines(&["1 PCS 1/2\" A36 34.75 X 227.77\"", "", "2 PCS 1/4\" A36 5 X 5\""]);
        assert!(parse(&input).is_none());
    }

    #[test]
    fn instructions_do_not_leak_between_blocks() {
        let input = lines(&[
            "1 PCS 1/2\" A36 10 X 40\"",
            "TACK",
            "1 PCS 1/2\" A36 10 X 40\"",
            "TRIM",
        ]);
        let records = parse(&input).unwrap();
        assert_eq!(records[0].special_instructions, "Tack weld");
        assert_eq!(records[1].special_instructions, "Trim");
    }
}
