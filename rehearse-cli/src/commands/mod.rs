pub mod cases;
pub mod config;
pub mod history;
pub mod play;
pub mod serve;

use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use rehearse_core::engine::{MAX_SCORE, PASS_THRESHOLD};

/// A table with cyan headers in the shared preset
pub(crate) fn table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).fg(Color::Cyan))
            .collect::<Vec<_>>(),
    );
    table
}

/// `4.2/5`
pub(crate) fn format_score(score: f64) -> String {
    format!("{:.1}/{}", score, MAX_SCORE)
}

pub(crate) fn verdict(score: f64) -> Cell {
    if score >= PASS_THRESHOLD {
        Cell::new("pass").fg(Color::Green)
    } else {
        Cell::new("fail").fg(Color::Red)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(4.0), "4.0/5");
        assert_eq!(format_score(3.25), "3.2/5");
    }

    #[test]
    fn test_table_headers_render() {
        let rendered = table(&["Case", "Topic"]).to_string();
        assert!(rendered.contains("Case"));
        assert!(rendered.contains("Topic"));
    }
}
