//! # Aggregator
//! Pure reduction of scored posts into one result record: engagement-weighted
//! sentiment, summary statistics and a thematic digest. No I/O, suitable for
//! unit tests and offline evaluation.

use std::collections::BTreeSet;

use chrono::Utc;

use crate::error::PipelineError;
use crate::types::{AggregateResult, ScoredPost, SentimentStats};

/// Theme label with the keywords that vote for it.
const THEMES: [(&str, [&str; 5]); 5] = [
    ("bullish", ["bullish", "uptrend", "growth", "rally", "surge"]),
    ("bearish", ["bearish", "downtrend", "decline", "dump", "crash"]),
    (
        "momentum",
        ["momentum", "volume", "breakout", "resistance", "support"],
    ),
    (
        "fundamental",
        ["adoption", "development", "partnership", "news", "update"],
    ),
    ("risk", ["risk", "volatile", "uncertainty", "caution", "warning"]),
];

/// A theme counts once per post whose analysis mentions any of its keywords;
/// it makes the digest once at least two posts agree. No agreement at all
/// reads as `{neutral}`.
pub fn extract_themes<'a, I>(analyses: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let lowered: Vec<String> = analyses.into_iter().map(|a| a.to_lowercase()).collect();

    let mut out = BTreeSet::new();
    for (theme, keywords) in THEMES {
        let count = lowered
            .iter()
            .filter(|text| keywords.iter().any(|kw| text.contains(kw)))
            .count();
        if count >= 2 {
            out.insert(theme.to_string());
        }
    }

    if out.is_empty() {
        out.insert("neutral".to_string());
    }
    out
}

/// Convex combination of scores. With any engagement present, weights are
/// normalized against the maximum engagement (they do not sum to 1, but the
/// quotient below is still a valid weighted mean). With none at all, every
/// weight is 1.0 and this reduces to the arithmetic mean.
fn weighted_sentiment(scored: &[ScoredPost]) -> f64 {
    let total_engagement: u64 = scored.iter().map(|s| s.engagement).sum();
    let weights: Vec<f64> = if total_engagement > 0 {
        let max = scored
            .iter()
            .map(|s| s.engagement)
            .max()
            .unwrap_or(1)
            .max(1) as f64;
        scored.iter().map(|s| s.engagement as f64 / max).collect()
    } else {
        vec![1.0; scored.len()]
    };

    let weighted_sum: f64 = scored
        .iter()
        .zip(&weights)
        .map(|(s, w)| s.sentiment_score * w)
        .sum();
    let weight_sum: f64 = weights.iter().sum();
    weighted_sum / weight_sum
}

fn sample_std(scores: &[f64], mean: f64) -> f64 {
    let n = scores.len();
    if n < 2 {
        return 0.0;
    }
    let var = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0);
    var.sqrt()
}

/// Reduce `scored_posts` into one record. The input order (engagement
/// descending from the collector) is preserved in the output.
pub fn aggregate(
    ticker: &str,
    scored_posts: Vec<ScoredPost>,
) -> Result<AggregateResult, PipelineError> {
    if scored_posts.is_empty() {
        return Err(PipelineError::NoData(format!(
            "no scored posts to aggregate for {ticker}"
        )));
    }

    let scores: Vec<f64> = scored_posts.iter().map(|s| s.sentiment_score).collect();
    let count = scores.len();
    let mean = scores.iter().sum::<f64>() / count as f64;
    let std = sample_std(&scores, mean);
    let min = scores.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let avg_engagement =
        scored_posts.iter().map(|s| s.engagement as f64).sum::<f64>() / count as f64;

    let themes = extract_themes(scored_posts.iter().map(|s| s.analysis_text.as_str()));

    Ok(AggregateResult {
        ticker: ticker.to_string(),
        weighted_sentiment: weighted_sentiment(&scored_posts),
        stats: SentimentStats {
            count,
            mean,
            std,
            min,
            max,
            avg_engagement,
        },
        themes,
        scored_posts,
        summary: None,
        timestamp: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RawPost, SourceTag};

    fn scored(score: f64, engagement: u64, analysis: &str) -> ScoredPost {
        ScoredPost {
            post: RawPost {
                text: "post".to_string(),
                author: "a".to_string(),
                timestamp: Utc::now(),
                likes: engagement,
                retweets: 0,
                replies: 0,
            },
            analysis_text: analysis.to_string(),
            sentiment_score: score,
            source: SourceTag::Primary,
            engagement,
        }
    }

    #[test]
    fn empty_input_is_no_data() {
        let err = aggregate("$BTC", vec![]).unwrap_err();
        assert!(matches!(err, PipelineError::NoData { .. }));
    }

    #[test]
    fn uniform_weights_reduce_to_arithmetic_mean() {
        let posts = vec![
            scored(0.8, 0, "a"),
            scored(-0.2, 0, "b"),
            scored(0.3, 0, "c"),
        ];
        let res = aggregate("$BTC", posts).unwrap();
        let expected = (0.8 - 0.2 + 0.3) / 3.0;
        assert!((res.weighted_sentiment - expected).abs() < 1e-9);
    }

    #[test]
    fn weighted_mean_stays_within_score_range() {
        let posts = vec![
            scored(0.9, 100, "a"),
            scored(-0.6, 3, "b"),
            scored(0.1, 40, "c"),
        ];
        let res = aggregate("$BTC", posts).unwrap();
        assert!(res.weighted_sentiment <= 0.9 && res.weighted_sentiment >= -0.6);
        // High-engagement post dominates.
        assert!(res.weighted_sentiment > res.stats.mean);
    }

    #[test]
    fn single_post_reports_zero_std() {
        let res = aggregate("$BTC", vec![scored(0.5, 10, "a")]).unwrap();
        assert_eq!(res.stats.count, 1);
        assert_eq!(res.stats.std, 0.0);
        assert_eq!(res.stats.min, 0.5);
        assert_eq!(res.stats.max, 0.5);
    }

    #[test]
    fn theme_needs_two_posts_to_register() {
        let posts = vec![
            scored(0.1, 0, "price found support at 60k"),
            scored(0.2, 0, "strong support and volume"),
            scored(0.3, 0, "adoption is growing slowly"),
        ];
        let res = aggregate("$BTC", posts).unwrap();
        let themes: Vec<&str> = res.themes.iter().map(|s| s.as_str()).collect();
        assert_eq!(themes, vec!["momentum"]);
    }

    #[test]
    fn no_agreeing_theme_reads_neutral() {
        let posts = vec![scored(0.0, 0, "nothing here"), scored(0.0, 0, "or here")];
        let res = aggregate("$BTC", posts).unwrap();
        assert_eq!(res.themes.len(), 1);
        assert!(res.themes.contains("neutral"));
    }

    #[test]
    fn output_preserves_input_order() {
        let posts = vec![
            scored(0.1, 50, "x"),
            scored(0.9, 10, "y"),
            scored(-0.5, 30, "z"),
        ];
        let res = aggregate("$BTC", posts).unwrap();
        let engagements: Vec<u64> = res.scored_posts.iter().map(|s| s.engagement).collect();
        assert_eq!(engagements, vec![50, 10, 30]);
    }
}
