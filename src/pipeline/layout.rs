//! Reading-order reconstruction from positioned text tokens.
//!
//! PDF text layers store glyph runs in content-stream order, which need not
//! match reading order. Tokens are sorted top to bottom (PDF `y` grows
//! upwards, so descending), then left to right, and clustered into lines by
//! vertical proximity to the first token of the current line. Within a line a
//! wide horizontal gap becomes two spaces, which the tabular parser treats as
//! a column break.

use crate::config::LayoutTolerances;
use serde::{Deserialize, Serialize};

/// One positioned run of text on a page, in PDF user-space points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextToken {
    pub text: String,
    /// Left edge.
    pub x: f32,
    /// Baseline, measured from the bottom of the page.
    pub y: f32,
    pub width: f32,
}

impl TextToken {
    pub fn new(text: impl Into<String>, x: f32, y: f32, width: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
        }
    }

    fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// Rebuild the lines of one page. Whitespace-only tokens are dropped and
/// lines that end up empty are not emitted.
pub fn cluster_lines(mut tokens: Vec<TextToken>, tolerances: &LayoutTolerances) -> Vec<String> {
    tokens.retain(|t| !t.text.trim().is_empty());
    tokens.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut rows: Vec<Vec<TextToken>> = Vec::new();
    let mut reference_y = f32::NAN;
    for token in tokens {
        match rows.last_mut() {
            Some(row) if (token.y - reference_y).abs() <= tolerances.line_tolerance => {
                row.push(token)
            }
            _ => {
                reference_y = token.y;
                rows.push(vec![token]);
            }
        }
    }

    rows.into_iter()
        .filter_map(|mut row| {
            row.sort_by(|a, b| a.x.total_cmp(&b.x));
            let line = join_row(&row, tolerances.column_gap);
            (!line.is_empty()).then_some(line)
        })
        .collect()
}

fn join_row(row: &[TextToken], column_gap: f32) -> String {
    let mut line = String::new();
    let mut previous: Option<&TextToken> = None;
    for token in row {
        if let Some(prev) = previous {
            let gap = token.x - prev.right();
            line.push_str(if gap > column_gap { "  " } else { " " });
        }
        line.push_str(token.text.trim());
        previous = Some(token);
    }
    line.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tol() -> LayoutTolerances {
        LayoutTolerances::default()
    }

    #[test]
    fn out_of_order_tokens_are_reordered() {
        let tokens = vec![
            TextToken::new("X 48.57\"", 140.0, 698.0, 40.0),
            TextToken::new("ROLL TO 42\" ID", 72.0, 680.0, 90.0),
            TextToken::new("2 PCS 1/2\" A36 10", 72.0, 700.0, 66.0),
        ];
        let lines = cluster_lines(tokens, &tol());
        assert_eq!(
            lines,
            vec!["2 PCS 1/2\" A36 10 X 48.57\"", "ROLL TO 42\" ID"]
        );
    }

    #[test]
    fn wide_gap_becomes_column_break() {
        let tokens = vec![
            TextToken::new("2", 50.0, 500.0, 6.0),
            TextToken::new("P-101", 120.0, 500.0, 30.0),
            TextToken::new("SHELL", 155.0, 501.0, 30.0),
        ];
        let lines = cluster_lines(tokens, &tol());
        assert_eq!(lines, vec!["2  P-101 SHELL"]);
    }

    #[test]
    fn tolerance_is_measured_from_line_reference() {
        // 4pt steps: each is within tolerance of its neighbour, but the third
        // is 8pt from the line's first token.
        let tokens = vec![
            TextToken::new("a", 0.0, 100.0, 5.0),
            TextToken::new("b", 10.0, 96.0, 5.0),
            TextToken::new("c", 20.0, 92.0, 5.0),
        ];
        let lines = cluster_lines(tokens, &tol());
        assert_eq!(lines, vec!["a b", "c"]);
    }

    #[test]
    fn blank_tokens_and_empty_pages() {
        assert!(cluster_lines(Vec::new(), &tol()).is_empty());
        let tokens = vec![TextToken::new("   ", 0.0, 10.0, 5.0)];
        assert!(cluster_lines(tokens, &tol()).is_empty());
    }
}
