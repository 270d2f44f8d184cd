//! Mode selection rules. Pure functions of the per-mode results.

use crate::modes::SearchMode;
use crate::types::ModeResult;

/// Mode with the strictly greatest mean score; ties go to the earlier entry.
///
/// `None` only for an empty slice.
pub fn select_best_mode(results: &[ModeResult]) -> Option<SearchMode> {
    let mut best: Option<&ModeResult> = None;
    for result in results {
        match best {
            Some(current) if result.mean_score <= current.mean_score => {}
            // NaN means never win
            _ if result.mean_score.is_nan() => {}
            _ => best = Some(result),
        }
    }
    best.or_else(|| results.first()).map(|r| r.mode)
}

/// Smart-search choice among the modes tried so far.
///
/// The first mode with at least `min_good_results` good results wins;
/// otherwise the one with the most good results, ties to the earlier entry.
pub fn select_smart_mode(tried: &[ModeResult], min_good_results: usize) -> Option<usize> {
    if let Some(pos) = tried
        .iter()
        .position(|r| r.good_results >= min_good_results)
    {
        return Some(pos);
    }
    let mut best: Option<usize> = None;
    for (pos, result) in tried.iter().enumerate() {
        match best {
            Some(b) if result.good_results <= tried[b].good_results => {}
            _ => best = Some(pos),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use papersage_store::{Payload, ScoredPoint};

    fn result(mode: SearchMode, scores: &[f32]) -> ModeResult {
        let hits = scores
            .iter()
            .enumerate()
            .map(|(i, &score)| ScoredPoint {
                id: i as u64,
                score,
                payload: Payload::new(),
            })
            .collect();
        ModeResult::from_hits(mode, hits, 1.0)
    }

    #[test]
    fn test_highest_mean_wins() {
        let results = vec![
            result(SearchMode::Fast, &[0.9]),
            result(SearchMode::Balanced, &[0.85]),
            result(SearchMode::Quality, &[0.95]),
        ];
        assert_eq!(select_best_mode(&results), Some(SearchMode::Quality));
    }

    #[test]
    fn test_ties_go_to_earliest_mode() {
        let results = vec![
            result(SearchMode::Fast, &[0.8, 0.6]),
            result(SearchMode::Balanced, &[0.6, 0.8]),
            result(SearchMode::Quality, &[0.8, 0.6]),
        ];
        let first = select_best_mode(&results);
        assert_eq!(first, Some(SearchMode::Fast));
        for _ in 0..10 {
            assert_eq!(select_best_mode(&results), first);
        }
    }

    #[test]
    fn test_all_empty_picks_first() {
        let results: Vec<ModeResult> = SearchMode::ALL
            .iter()
            .map(|&m| result(m, &[]))
            .collect();
        assert_eq!(select_best_mode(&results), Some(SearchMode::Fast));
        assert_eq!(select_best_mode(&[]), None);
    }

    #[test]
    fn test_empty_mode_loses_to_any_positive_mean() {
        let results = vec![
            result(SearchMode::Fast, &[]),
            result(SearchMode::Balanced, &[0.1]),
            result(SearchMode::Quality, &[]),
        ];
        assert_eq!(select_best_mode(&results), Some(SearchMode::Balanced));
    }

    #[test]
    fn test_smart_stops_at_first_sufficient_mode() {
        let tried = vec![
            result(SearchMode::Fast, &[0.9, 0.6]),
            result(SearchMode::Balanced, &[0.9, 0.8, 0.75]),
        ];
        assert_eq!(select_smart_mode(&tried, 1), Some(0));
        assert_eq!(select_smart_mode(&tried, 3), Some(1));
    }

    #[test]
    fn test_smart_falls_back_to_most_good_results() {
        let tried = vec![
            result(SearchMode::Fast, &[0.9, 0.2]),
            result(SearchMode::Balanced, &[0.9, 0.8]),
            result(SearchMode::Quality, &[0.95, 0.85]),
        ];
        assert_eq!(select_smart_mode(&tried, 5), Some(1));
        assert_eq!(select_smart_mode(&[], 1), None);
    }
}
