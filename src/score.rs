//! Importance scoring for articles.
//!
//! Two deterministic formulas, both clamped to [0, 100] and monotonic in
//! recency and volume:
//!
//! - the generic formula combining recency, a sub-linear volume term,
//!   a capped content-richness bonus, and a premium-source bonus;
//! - the events blend, used when the upstream supplies native tone and
//!   impact signals instead of view counts.

use chrono::{DateTime, Utc};
use rand::Rng;

/// Hours over which the recency term decays linearly to zero.
const RECENCY_HORIZON_HOURS: f64 = 48.0;
/// Maximum contribution of the recency term.
const RECENCY_WEIGHT: f64 = 40.0;
/// Multiplier on ln(views + 1).
const VOLUME_WEIGHT: f64 = 6.0;
/// Cap on the volume term so runaway counts cannot dominate.
const VOLUME_CAP: f64 = 30.0;
/// One richness point per this many description characters.
const RICHNESS_DIVISOR: f64 = 50.0;
/// Cap on the richness bonus.
const RICHNESS_CAP: f64 = 10.0;
/// Flat boost for curated premium sources.
const PREMIUM_BONUS: f64 = 15.0;

/// Domains on the curated allow-list receiving a scoring boost.
static PREMIUM_SOURCES: &[&str] = &[
    "reuters.com",
    "apnews.com",
    "bbc.co.uk",
    "bbc.com",
    "nytimes.com",
    "theguardian.com",
    "washingtonpost.com",
    "wsj.com",
    "bloomberg.com",
    "ft.com",
    "nature.com",
];

/// Synthesize a placeholder view count for upstreams that supply none.
pub fn placeholder_views() -> u32 {
    rand::rng().random_range(100..1000)
}

#[derive(Debug, Clone, Copy)]
pub struct Scorer {
    premium: &'static [&'static str],
}

impl Default for Scorer {
    fn default() -> Self {
        Scorer {
            premium: PREMIUM_SOURCES,
        }
    }
}

impl Scorer {
    pub fn new() -> Self {
        Scorer::default()
    }

    /// Generic importance score from recency, view count, description length,
    /// and source domain.
    pub fn importance(
        &self,
        published_at: DateTime<Utc>,
        views: u32,
        description_len: usize,
        domain: &str,
    ) -> i64 {
        self.importance_at(Utc::now(), published_at, views, description_len, domain)
    }

    /// Deterministic core of `importance`, with an explicit evaluation time.
    pub fn importance_at(
        &self,
        now: DateTime<Utc>,
        published_at: DateTime<Utc>,
        views: u32,
        description_len: usize,
        domain: &str,
    ) -> i64 {
        let recency = recency_term(now, published_at);
        let volume = (f64::from(views) + 1.0).ln() * VOLUME_WEIGHT;
        let richness = description_len as f64 / RICHNESS_DIVISOR;
        let premium = if self.is_premium(domain) {
            PREMIUM_BONUS
        } else {
            0.0
        };

        clamp(recency + volume.min(VOLUME_CAP) + richness.min(RICHNESS_CAP) + premium)
    }

    /// Impact score for event records, blending the upstream's native tone
    /// and impact-scale signals with bounded recency and mention-volume
    /// terms.
    pub fn event_impact(
        &self,
        published_at: DateTime<Utc>,
        tone: f64,
        impact_scale: f64,
        mentions: u32,
    ) -> i64 {
        self.event_impact_at(Utc::now(), published_at, tone, impact_scale, mentions)
    }

    /// Deterministic core of `event_impact`.
    pub fn event_impact_at(
        &self,
        now: DateTime<Utc>,
        published_at: DateTime<Utc>,
        tone: f64,
        impact_scale: f64,
        mentions: u32,
    ) -> i64 {
        let base = 50.0 + (tone + 10.0) * 0.5 + impact_scale.abs() * 5.0;
        let recency = recency_term(now, published_at) * 0.25;
        let volume = ((f64::from(mentions) + 1.0).ln() * 2.0).min(10.0);

        clamp(base + recency + volume)
    }

    fn is_premium(&self, domain: &str) -> bool {
        let domain = domain.trim().to_lowercase();
        self.premium
            .iter()
            .any(|p| domain == *p || domain.ends_with(&format!(".{}", p)))
    }
}

/// Linear decay from `RECENCY_WEIGHT` at publish time to zero at the horizon.
/// Articles dated in the future score as if published now.
fn recency_term(now: DateTime<Utc>, published_at: DateTime<Utc>) -> f64 {
    let age_hours = (now - published_at).num_minutes() as f64 / 60.0;
    let age_hours = age_hours.max(0.0);
    ((RECENCY_HORIZON_HOURS - age_hours).max(0.0) / RECENCY_HORIZON_HOURS) * RECENCY_WEIGHT
}

fn clamp(score: f64) -> i64 {
    score.clamp(0.0, 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_recency_is_monotonic() {
        let scorer = Scorer::new();
        let now = Utc::now();
        let newer = scorer.importance_at(now, now - Duration::hours(1), 200, 100, "example.com");
        let older = scorer.importance_at(now, now - Duration::hours(24), 200, 100, "example.com");
        let ancient = scorer.importance_at(now, now - Duration::hours(90), 200, 100, "example.com");
        assert!(newer >= older);
        assert!(older >= ancient);
    }

    #[test]
    fn test_volume_is_monotonic_and_sublinear() {
        let scorer = Scorer::new();
        let now = Utc::now();
        let published = now - Duration::hours(2);
        let low = scorer.importance_at(now, published, 10, 0, "example.com");
        let high = scorer.importance_at(now, published, 1_000, 0, "example.com");
        let extreme = scorer.importance_at(now, published, 10_000_000, 0, "example.com");
        assert!(high >= low);
        // The volume term is capped: astronomic counts cannot dominate.
        assert!(extreme - high <= VOLUME_CAP as i64);
    }

    #[test]
    fn test_premium_source_bonus() {
        let scorer = Scorer::new();
        let now = Utc::now();
        let published = now - Duration::hours(2);
        let plain = scorer.importance_at(now, published, 200, 100, "smalltownnews.com");
        let premium = scorer.importance_at(now, published, 200, 100, "reuters.com");
        let subdomain = scorer.importance_at(now, published, 200, 100, "feeds.reuters.com");
        assert_eq!(premium - plain, PREMIUM_BONUS as i64);
        assert_eq!(subdomain, premium);
    }

    #[test]
    fn test_scores_stay_in_bounds() {
        let scorer = Scorer::new();
        let now = Utc::now();
        let max = scorer.importance_at(now, now, u32::MAX, usize::MAX, "reuters.com");
        let min = scorer.importance_at(now, now - Duration::days(365), 0, 0, "example.com");
        assert!(max <= 100);
        assert!(min >= 0);

        let impact = scorer.event_impact_at(now, now, 10.0, 10.0, u32::MAX);
        assert!((0..=100).contains(&impact));
    }

    #[test]
    fn test_event_impact_monotonic_in_recency_and_mentions() {
        let scorer = Scorer::new();
        let now = Utc::now();
        let fresh = scorer.event_impact_at(now, now - Duration::hours(1), -2.0, 1.5, 40);
        let stale = scorer.event_impact_at(now, now - Duration::hours(40), -2.0, 1.5, 40);
        assert!(fresh >= stale);

        let quiet = scorer.event_impact_at(now, now - Duration::hours(4), -2.0, 1.5, 2);
        let loud = scorer.event_impact_at(now, now - Duration::hours(4), -2.0, 1.5, 500);
        assert!(loud >= quiet);
    }

    #[test]
    fn test_placeholder_views_in_range() {
        for _ in 0..50 {
            let v = placeholder_views();
            assert!((100..1000).contains(&v));
        }
    }
}
