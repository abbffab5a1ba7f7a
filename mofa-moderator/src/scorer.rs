//! Dominance scoring
//!
//! Measures how far the most talkative participant sits above the
//! per-participant mean, normalized by total talk time so the value stays
//! comparable as the conversation grows and across group sizes.

use std::collections::BTreeMap;

/// Keeps the division defined when total talk time is tiny
const SCORE_EPSILON: f64 = 1e-6;

/// Compute the dominance score for the current talk-time distribution
///
/// Returns 0 when there are no speakers or no talk time yet. Speakers
/// missing from `talk_time` count as silent.
pub fn dominance_score(
    talk_time: &BTreeMap<String, f64>,
    speakers: &[String],
    total_talk_time: f64,
) -> f64 {
    if speakers.is_empty() || total_talk_time <= 0.0 {
        return 0.0;
    }

    let max = speakers
        .iter()
        .map(|s| talk_time.get(s).copied().unwrap_or(0.0))
        .fold(f64::MIN, f64::max);
    let mean = total_talk_time / speakers.len() as f64;

    (max - mean) / (total_talk_time + SCORE_EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn times(entries: &[(&str, f64)]) -> (BTreeMap<String, f64>, Vec<String>, f64) {
        let map: BTreeMap<String, f64> = entries.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        let speakers = entries.iter().map(|(k, _)| k.to_string()).collect();
        let total = entries.iter().map(|(_, v)| v).sum();
        (map, speakers, total)
    }

    #[test]
    fn test_empty_group_scores_zero() {
        assert_eq!(dominance_score(&BTreeMap::new(), &[], 0.0), 0.0);
    }

    #[test]
    fn test_no_talk_time_scores_zero() {
        let (map, speakers, total) = times(&[("A", 0.0), ("B", 0.0)]);
        assert_eq!(dominance_score(&map, &speakers, total), 0.0);
    }

    #[test]
    fn test_tied_speakers_score_zero() {
        let (map, speakers, total) = times(&[("A", 10.0), ("B", 10.0)]);
        assert_eq!(dominance_score(&map, &speakers, total), 0.0);
    }

    #[test]
    fn test_single_owner_of_floor_in_pair() {
        let (map, speakers, total) = times(&[("A", 30.0), ("B", 0.0)]);
        let score = dominance_score(&map, &speakers, total);
        assert!((score - 0.5).abs() < 1e-6);
        assert!(score < 0.5);
    }

    #[test]
    fn test_larger_group_single_owner() {
        let (map, speakers, total) = times(&[("A", 40.0), ("B", 0.0), ("C", 0.0), ("D", 0.0)]);
        // (40 - 10) / 40
        let score = dominance_score(&map, &speakers, total);
        assert!((score - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_missing_entry_counts_as_silent() {
        let mut map = BTreeMap::new();
        map.insert("A".to_string(), 20.0);
        let speakers = vec!["A".to_string(), "B".to_string()];
        let score = dominance_score(&map, &speakers, 20.0);
        assert!((score - 0.5).abs() < 1e-6);
    }
}
