//! Fuzzy "did you mean" suggestions for misspelled identifiers
//!
//! Used when a user-supplied name (an encoded value in a custom model, a key in a
//! profile config) does not resolve. The candidate list is always supplied by the
//! caller, so suggestions stay in sync with whatever was actually declared.

use strsim::{jaro_winkler, normalized_levenshtein};

/// Minimum combined similarity for a candidate to be suggested.
///
/// 0.65 keeps "road_clas" → "road_class" while rejecting unrelated names such as
/// "weather" against a routing attribute set.
const MIN_THRESHOLD: f64 = 0.65;

/// Find the best fuzzy match using hybrid character-based + structural scoring
///
/// Combines Jaro-Winkler (70%) and normalized Levenshtein (30%) with bonuses:
/// - Prefix matching: up to 20% for a strong prefix similarity
/// - Component matching: up to 12% per `_`/`-`/`:` separated part of the candidate
/// - Length similarity: up to 10% when both strings are long and similar in length
pub fn find_best_fuzzy_match<I, S>(input: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let input_lower = input.to_lowercase();
    let mut best_match = None;
    let mut best_score = 0.0f64;

    for candidate in candidates {
        let candidate = candidate.as_ref();
        let candidate_lower = candidate.to_lowercase();

        let jw_score = jaro_winkler(&input_lower, &candidate_lower);
        let lev_score = normalized_levenshtein(&input_lower, &candidate_lower);
        let combined_score = (jw_score * 0.7) + (lev_score * 0.3);

        let mut bonus = 0.0;

        let prefix_len = input_lower.chars().count().min(7);
        if prefix_len >= 4 {
            let input_prefix = input_lower.chars().take(prefix_len).collect::<String>();
            let candidate_prefix = candidate_lower.chars().take(prefix_len).collect::<String>();

            let prefix_similarity = normalized_levenshtein(&input_prefix, &candidate_prefix);
            if prefix_similarity > 0.7 {
                bonus += 0.2 * prefix_similarity;
            }
        }

        if input_lower.len() >= 8 && candidate_lower.len() >= 8 {
            let length_ratio = 1.0
                - ((input_lower.len() as f64 - candidate_lower.len() as f64).abs()
                    / input_lower.len().max(candidate_lower.len()) as f64);
            if length_ratio > 0.7 {
                bonus += 0.1 * length_ratio;
            }
        }

        // Compound names like "car_average_speed" should match when the input
        // closely matches one component ("averge_speed" is still a typo of the whole).
        if candidate_lower.contains(['_', '-', ':']) {
            for part in candidate_lower.split(['_', '-', ':']) {
                if part.len() >= 4 {
                    let part_similarity = jaro_winkler(&input_lower, part);
                    if part_similarity > 0.85 {
                        bonus += 0.12 * part_similarity;
                    }
                }
            }
        }

        let final_score = combined_score + bonus;
        if final_score >= MIN_THRESHOLD && final_score > best_score {
            best_score = final_score;
            best_match = Some(candidate.to_string());
        }
    }

    best_match
}

/// Suggest a correction for a name that did not resolve against `known`
///
/// Returns `None` when the name is already known (ignoring ASCII case) or when nothing
/// is close enough to be a plausible typo.
pub fn suggest_correction<I, S>(name: &str, known: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let known: Vec<S> = known.into_iter().collect();
    if known.iter().any(|k| k.as_ref().eq_ignore_ascii_case(name)) {
        return None;
    }
    find_best_fuzzy_match(name, known.iter().map(|k| k.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATTRIBUTES: [&str; 6] = [
        "road_class",
        "road_access",
        "surface",
        "max_speed",
        "car_average_speed",
        "hike_rating",
    ];

    #[test]
    fn test_suggest_correction_typos() {
        assert_eq!(
            suggest_correction("road_clas", ATTRIBUTES),
            Some("road_class".to_string())
        );
        assert_eq!(
            suggest_correction("surfase", ATTRIBUTES),
            Some("surface".to_string())
        );
        assert_eq!(
            suggest_correction("max_sped", ATTRIBUTES),
            Some("max_speed".to_string())
        );
    }

    #[test]
    fn test_suggest_correction_known_name() {
        assert_eq!(suggest_correction("road_class", ATTRIBUTES), None);
        assert_eq!(suggest_correction("ROAD_CLASS", ATTRIBUTES), None);
    }

    #[test]
    fn test_suggest_correction_no_match() {
        assert_eq!(suggest_correction("xyz", ATTRIBUTES), None);
        assert_eq!(suggest_correction("anything", Vec::<String>::new()), None);
    }
}
