//! Fixed sample articles, the last fallback tier when every upstream fails
//! and nothing usable is cached. Content is deliberately generic; the
//! presentation layer flags it as degraded via the response `source` field.

use chrono::{Duration, Utc};
use once_cell::sync::Lazy;

use crate::model::{Article, Category};

struct SampleSeed {
    title: &'static str,
    description: &'static str,
    url: &'static str,
    source: &'static str,
    category: Category,
    importance: i64,
    views: u32,
    age_hours: i64,
}

/// Seeds are ordered by descending importance within each category so the
/// fallback list is already in relevance order.
static SAMPLE_SEEDS: &[SampleSeed] = &[
    SampleSeed {
        title: "Global chip makers announce joint research initiative",
        description: "A consortium of semiconductor manufacturers will pool research on next-generation fabrication, aiming to shorten the path from lab prototypes to volume production.",
        url: "https://sample.newswire.local/technology/chip-research-initiative",
        source: "Newswire Sample",
        category: Category::Technology,
        importance: 86,
        views: 940,
        age_hours: 2,
    },
    SampleSeed {
        title: "Open-source maintainers push back on automated dependency churn",
        description: "Maintainers of widely used libraries say automated upgrade bots now generate the majority of their review load.",
        url: "https://sample.newswire.local/technology/dependency-churn",
        source: "Newswire Sample",
        category: Category::Technology,
        importance: 64,
        views: 410,
        age_hours: 9,
    },
    SampleSeed {
        title: "Central banks hold rates steady as inflation cools",
        description: "Policy makers across major economies left benchmark rates unchanged, citing a broad slowdown in consumer prices.",
        url: "https://sample.newswire.local/business/rates-steady",
        source: "Newswire Sample",
        category: Category::Business,
        importance: 81,
        views: 860,
        age_hours: 3,
    },
    SampleSeed {
        title: "Shipping costs fall to three-year low on new capacity",
        description: "Container freight rates continued their slide as newly delivered vessels entered service on the main east-west lanes.",
        url: "https://sample.newswire.local/business/shipping-costs",
        source: "Newswire Sample",
        category: Category::Business,
        importance: 58,
        views: 300,
        age_hours: 14,
    },
    SampleSeed {
        title: "Survey telescope catalogues ten thousand new variable stars",
        description: "The first data release from the southern sky survey includes a sharp increase in known variable stars, a resource for stellar evolution models.",
        url: "https://sample.newswire.local/science/variable-stars",
        source: "Newswire Sample",
        category: Category::Science,
        importance: 72,
        views: 520,
        age_hours: 6,
    },
    SampleSeed {
        title: "Trial data supports shorter antibiotic courses for common infections",
        description: "A multi-country trial found shorter treatment courses matched standard ones for several common infections, with fewer side effects.",
        url: "https://sample.newswire.local/health/antibiotic-courses",
        source: "Newswire Sample",
        category: Category::Health,
        importance: 76,
        views: 610,
        age_hours: 5,
    },
    SampleSeed {
        title: "Underdogs advance to continental final after penalty shootout",
        description: "A club outside the traditional top flight reached its first continental final, deciding the semi on penalties after a goalless draw.",
        url: "https://sample.newswire.local/sports/underdogs-final",
        source: "Newswire Sample",
        category: Category::Sports,
        importance: 69,
        views: 880,
        age_hours: 4,
    },
    SampleSeed {
        title: "League expansion adds two new franchises",
        description: "The league confirmed two expansion franchises will join in the next season, the first additions in a decade.",
        url: "https://sample.newswire.local/sports/league-expansion",
        source: "Newswire Sample",
        category: Category::Sports,
        importance: 55,
        views: 430,
        age_hours: 11,
    },
    SampleSeed {
        title: "Festival lineup announcement breaks ticket-site records",
        description: "Organizers said pre-sale demand after the lineup reveal exceeded any previous year within the first hour.",
        url: "https://sample.newswire.local/entertainment/festival-lineup",
        source: "Newswire Sample",
        category: Category::Entertainment,
        importance: 62,
        views: 720,
        age_hours: 7,
    },
    SampleSeed {
        title: "Coalition talks resume after weekend stalemate",
        description: "Party negotiators returned to the table after talks stalled over budget rules, with a self-imposed deadline at the end of the month.",
        url: "https://sample.newswire.local/politics/coalition-talks",
        source: "Newswire Sample",
        category: Category::Politics,
        importance: 74,
        views: 560,
        age_hours: 3,
    },
];

static SAMPLE_ARTICLES: Lazy<Vec<Article>> = Lazy::new(|| {
    let now = Utc::now();
    SAMPLE_SEEDS
        .iter()
        .enumerate()
        .map(|(index, seed)| Article {
            id: Article::derive_id(seed.category, index, seed.url),
            title: seed.title.to_string(),
            description: Some(seed.description.to_string()),
            url: seed.url.to_string(),
            image_url: None,
            published_at: now - Duration::hours(seed.age_hours),
            source: seed.source.to_string(),
            category: seed.category,
            author: None,
            importance: seed.importance,
            views: seed.views,
        })
        .collect()
});

/// The fixed sample set, filtered to a requested category (`All` returns
/// everything).
pub fn sample_articles(category: Category) -> Vec<Article> {
    SAMPLE_ARTICLES
        .iter()
        .filter(|a| a.category.matches(category))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_returns_full_set() {
        assert_eq!(sample_articles(Category::All).len(), SAMPLE_SEEDS.len());
    }

    #[test]
    fn test_category_filter() {
        let sports = sample_articles(Category::Sports);
        assert!(!sports.is_empty());
        assert!(sports.iter().all(|a| a.category == Category::Sports));
    }

    #[test]
    fn test_every_known_category_has_a_sample() {
        for category in Category::KNOWN {
            assert!(
                !sample_articles(category).is_empty(),
                "no sample article for {}",
                category
            );
        }
    }

    #[test]
    fn test_sample_urls_are_unique() {
        let all = sample_articles(Category::All);
        let mut urls: Vec<_> = all.iter().map(|a| a.url.as_str()).collect();
        urls.sort();
        urls.dedup();
        assert_eq!(urls.len(), all.len());
    }
}
