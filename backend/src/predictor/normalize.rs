use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // The escape byte is optional: captured output sometimes arrives with it
    // already stripped, leaving bare "[1m" style fragments.
    static ref ANSI_SEQUENCE: Regex = Regex::new(r"\x1b?\[[0-9;]*m").unwrap();
    static ref PROGRESS_FILL: Regex = Regex::new(r"=+").unwrap();
    static ref STEP_TIMING: Regex = Regex::new(r"\d+ms/step").unwrap();
    static ref PROGRESS_FRACTION: Regex = Regex::new(r"\d+/\d+").unwrap();
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Turns raw predictor output into a bare label by stripping terminal colour
/// codes and progress-bar noise.
pub fn normalize_output(raw: &str) -> String {
    let mut current = single_pass(raw);
    // A removal can splice two fragments into a new match ("[1=m"), so
    // repeat until nothing changes. Every pass either shrinks or stops.
    loop {
        let next = single_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn single_pass(input: &str) -> String {
    let cleaned = ANSI_SEQUENCE.replace_all(input, "");
    let cleaned = PROGRESS_FILL.replace_all(&cleaned, "");
    let cleaned = STEP_TIMING.replace_all(&cleaned, "");
    let cleaned = PROGRESS_FRACTION.replace_all(&cleaned, "");
    let cleaned = WHITESPACE_RUN.replace_all(&cleaned, " ");
    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_colour_codes_and_progress_noise() {
        assert_eq!(normalize_output("\u{1b}[1mCat\u{1b}[0m 1/1 250ms/step"), "Cat");
    }

    #[test]
    fn keras_progress_bar_leaves_only_brackets() {
        let raw = "1/1 [==============================] - 0s 120ms/step\nGolden Retriever\n";
        assert_eq!(normalize_output(raw), "[] - 0s Golden Retriever");
    }

    #[test]
    fn strips_bare_sgr_fragments() {
        assert_eq!(normalize_output("[32mElephant[0m"), "Elephant");
        assert_eq!(normalize_output("\u{1b}[1;32mZebra\u{1b}[0m"), "Zebra");
    }

    #[test]
    fn collapses_internal_whitespace() {
        assert_eq!(normalize_output("  Snow \t\n Leopard  "), "Snow Leopard");
    }

    #[test]
    fn spliced_fragments_are_removed_too() {
        assert_eq!(normalize_output("[1=mOwl"), "Owl");
    }

    #[test]
    fn noise_only_output_becomes_empty() {
        assert_eq!(normalize_output("\u{1b}[0m 1/1 ===== 12ms/step\n"), "");
    }

    #[test]
    fn normalizing_twice_changes_nothing() {
        let samples = [
            "\u{1b}[1mCat\u{1b}[0m 1/1 250ms/step",
            "[1=mOwl",
            "1/1 [====] 3ms/step Red Fox",
            "Error: model not found",
            "12/3/4 Hedgehog",
            "",
        ];
        for sample in samples {
            let once = normalize_output(sample);
            assert_eq!(normalize_output(&once), once, "input: {sample:?}");
        }
    }
}
