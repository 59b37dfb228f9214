//! Common utilities for the butterfly-osm toolkit

pub mod suggest;

pub use suggest::{find_best_fuzzy_match, suggest_correction};

#[cfg(test)]
mod tests {
    use super::find_best_fuzzy_match;

    #[test]
    fn test_fuzzy_match_keeps_candidate_spelling() {
        let known = ["road_class", "surface"];
        assert_eq!(
            find_best_fuzzy_match("SURFACE", known),
            Some("surface".to_string())
        );
        assert_eq!(find_best_fuzzy_match("zzzz", known), None);
    }
}
