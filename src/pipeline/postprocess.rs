//! Post-processing: deterministic cleanup of vision-model transcriptions.
//!
//! The recogniser is asked for plain text, but models still wrap output in
//! code fences, open with a chatty preamble, or render a parts table as a
//! Markdown pipe table. These rules undo that so the parser sees the same
//! shape of text a native PDF text layer would give it.
//!
//! ## Rule Order
//!
//! Fences come off before anything else so the preamble check sees the first
//! real line. Pipe tables are flattened before trailing whitespace is trimmed,
//! so a row ending in empty cells loses its trailing tabs like any other line.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply every cleanup rule to a raw transcription.
///
/// 1. Strip outer code fences
/// 2. Normalise line endings (CRLF → LF)
/// 3. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 4. Drop a leading "Here is the text" style preamble
/// 5. Convert Markdown pipe tables to tab-separated rows
/// 6. Trim trailing whitespace per line
/// 7. Collapse runs of blank lines to a single blank line
pub fn clean_transcription(input: &str) -> String {
    let s = strip_code_fences(input);
    let s = normalise_line_endings(&s);
    let s = remove_invisible_chars(&s);
    let s = strip_preamble(&s);
    let s = unpipe_tables(&s);
    let s = trim_trailing_whitespace(&s);
    collapse_blank_lines(&s).trim_matches('\n').to_string()
}

// ── Rule 1: Strip outer code fences ──────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```(?:text|plaintext|txt|markdown|md)?[ \t]*\r?\n(.*?)\r?\n```\s*$").unwrap()
});

fn strip_code_fences(input: &str) -> String {
    match RE_OUTER_FENCES.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Remove invisible Unicode characters ──────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 4: Drop a conversational preamble ───────────────────────────────────

static RE_PREAMBLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:here\s+is|here's|below\s+is|sure[,!]?)\b.*(?:text|transcription|content|page)\b.*:\s*$")
        .unwrap()
});

fn strip_preamble(input: &str) -> String {
    match input.split_once('\n') {
        Some((first, rest)) if RE_PREAMBLE.is_match(first) => rest.to_string(),
        None if RE_PREAMBLE.is_match(input) => String::new(),
        _ => input.to_string(),
    }
}

// ── Rule 5: Markdown pipe tables → tab-separated rows ────────────────────────

static RE_PIPE_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\|?\s*:?-{3,}:?\s*(?:\|\s*:?-{3,}:?\s*)*\|?\s*$").unwrap());

fn unpipe_tables(input: &str) -> String {
    input
        .lines()
        .filter(|line| !RE_PIPE_SEPARATOR.is_match(line))
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.starts_with('|') && trimmed.ends_with('|') && trimmed.len() > 1 {
                trimmed[1..trimmed.len() - 1]
                    .split('|')
                    .map(str::trim)
                    .collect::<Vec<_>>()
                    .join("\t")
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 6: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 7: Collapse blank-line runs ─────────────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fences() {
        let input = "```text\n2 PCS 1/2\" A36 10 X 48\"\n```";
        assert_eq!(clean_transcription(input), "2 PCS 1/2\" A36 10 X 48\"");
        let input = "```\nTACK\n```\n";
        assert_eq!(clean_transcription(input), "TACK");
    }

    #[test]
    fn unfenced_passthrough() {
        assert_eq!(clean_transcription("1 PCS\nTRIM"), "1 PCS\nTRIM");
    }

    #[test]
    fn crlf_and_invisible_chars() {
        assert_eq!(clean_transcription("A\u{200B}36\r\nB"), "A36\nB");
    }

    #[test]
    fn drops_preamble_only_on_first_line() {
        let input = "Here is the transcribed text of the page:\n1 PCS 1/4\" A36 5 X 5\"";
        assert_eq!(clean_transcription(input), "1 PCS 1/4\" A36 5 X 5\"");
        let input = "1 PCS\nHere is the text:";
        assert_eq!(clean_transcription(input), input);
    }

    #[test]
    fn pipe_table_becomes_tab_separated() {
        let input = "| QTY | PART | DESC |\n|---|:---:|---|\n| 2 | A-1 | SHELL |\n| 3 | A-2 |  |";
        assert_eq!(
            clean_transcription(input),
            "QTY\tPART\tDESC\n2\tA-1\tSHELL\n3\tA-2"
        );
    }

    #[test]
    fn collapses_blank_runs() {
        assert_eq!(clean_transcription("a\n\n\n\n\nb\n\n"), "a\n\nb");
    }

    #[test]
    fn empty_input() {
        assert_eq!(clean_transcription(""), "");
        assert_eq!(clean_transcription("   \n\n"), "");
    }
}
