//! Source adapters, one per upstream kind.
//!
//! Each adapter translates one upstream's native response format into the
//! canonical `Article` shape. The contract is `fetch(category, lang) ->
//! Vec<Article>` and it never fails outward: network errors, timeouts,
//! non-2xx statuses, and malformed payloads are all logged at the adapter
//! and converted to an empty list, so one bad upstream cannot abort the
//! aggregate request.

mod events;
mod feed;
mod search;

pub use events::EventsAdapter;
pub use feed::FeedAdapter;
pub use search::SearchAdapter;

use tokio::time::Duration;
use tracing::debug;

use crate::environment::{get_env_var_as_vec, get_env_var_or};
use crate::model::{Article, Category};
use crate::TARGET_WEB_REQUEST;

/// Per-call timeout; a slower upstream is treated as failed.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
/// Raw record caps per call, bounding cost per upstream kind.
pub const MAX_EVENT_RECORDS: usize = 50;
pub const MAX_FEED_ENTRIES: usize = 30;
pub const MAX_SEARCH_RESULTS: usize = 15;

/// Built-in feed registrations used when no environment override is set.
/// Feeds registered under `All` are queried for every category and rely on
/// keyword inference for labeling.
static DEFAULT_FEEDS: &[(Category, &str)] = &[
    (Category::All, "https://feeds.bbci.co.uk/news/world/rss.xml"),
    (
        Category::Technology,
        "https://feeds.bbci.co.uk/news/technology/rss.xml",
    ),
    (Category::Technology, "https://techcrunch.com/feed/"),
    (
        Category::Business,
        "https://feeds.bbci.co.uk/news/business/rss.xml",
    ),
    (
        Category::Science,
        "https://feeds.bbci.co.uk/news/science_and_environment/rss.xml",
    ),
    (
        Category::Health,
        "https://feeds.bbci.co.uk/news/health/rss.xml",
    ),
    (Category::Sports, "https://www.espn.com/espn/rss/news"),
    (
        Category::Entertainment,
        "https://feeds.bbci.co.uk/news/entertainment_and_arts/rss.xml",
    ),
    (
        Category::Politics,
        "https://feeds.bbci.co.uk/news/politics/rss.xml",
    ),
];

/// Closed set of adapter kinds behind one fetch interface.
#[derive(Clone)]
pub enum SourceAdapter {
    Events(EventsAdapter),
    Feed(FeedAdapter),
    Search(SearchAdapter),
}

impl SourceAdapter {
    pub fn kind(&self) -> &'static str {
        match self {
            SourceAdapter::Events(_) => "events",
            SourceAdapter::Feed(_) => "feed",
            SourceAdapter::Search(_) => "search",
        }
    }

    /// Fetch and normalize articles for a category. Never fails; failures
    /// become empty lists inside the concrete adapter.
    pub async fn fetch(&self, category: Category, lang: &str) -> Vec<Article> {
        match self {
            SourceAdapter::Events(a) => a.fetch(category, lang).await,
            SourceAdapter::Feed(a) => a.fetch(category).await,
            SourceAdapter::Search(a) => a.fetch(category).await,
        }
    }
}

/// The configured adapters for this process, resolved once at startup.
#[derive(Clone, Default)]
pub struct AdapterSet {
    events: Option<EventsAdapter>,
    feeds: Vec<FeedAdapter>,
    search: Option<SearchAdapter>,
}

impl AdapterSet {
    /// Build the adapter set from environment configuration:
    /// `NEWSWIRE_FEEDS_<CATEGORY>` (semicolon-delimited URLs) overrides the
    /// built-in feed list per category, `NEWSWIRE_EVENTS_URL` overrides the
    /// events endpoint, and `NEWSWIRE_SEARCH_URL` enables the search
    /// adapter.
    pub fn from_env() -> Self {
        let client = default_client();

        let events = Some(EventsAdapter::new(
            client.clone(),
            get_env_var_or("NEWSWIRE_EVENTS_URL", events::DEFAULT_EVENTS_URL),
        ));

        let mut feeds = Vec::new();
        for category in Category::KNOWN.iter().copied().chain([Category::All]) {
            let var = format!("NEWSWIRE_FEEDS_{}", category.as_str().to_uppercase());
            let configured = get_env_var_as_vec(&var, ';');
            if configured.is_empty() {
                for (default_category, url) in DEFAULT_FEEDS {
                    if *default_category == category {
                        feeds.push(FeedAdapter::new(client.clone(), url.to_string(), category));
                    }
                }
            } else {
                for url in configured {
                    feeds.push(FeedAdapter::new(client.clone(), url, category));
                }
            }
        }

        let search_url = get_env_var_or("NEWSWIRE_SEARCH_URL", "");
        let search = if search_url.is_empty() {
            None
        } else {
            Some(SearchAdapter::new(client, search_url))
        };

        debug!(target: TARGET_WEB_REQUEST, "Configured {} feed adapters, events: {}, search: {}",
               feeds.len(), events.is_some(), search.is_some());

        AdapterSet {
            events,
            feeds,
            search,
        }
    }

    /// An adapter set with no upstreams configured; aggregation over it
    /// always falls through to the sample tier.
    pub fn empty() -> Self {
        AdapterSet::default()
    }

    /// Plan the fan-out for one request as (category, adapter) call pairs.
    ///
    /// A concrete category gets the events adapter, every feed registered
    /// for it (catch-all feeds included, post-filtered by inference), and
    /// the search adapter, all invoked with that category. An `All` request
    /// invokes the events adapter once per concrete category (its keyword
    /// queries are per-category) but each catch-all feed and the search
    /// adapter exactly once with `All`, so entries inferred as `General`
    /// stay in the merged result.
    pub fn fan_out(&self, requested: Category) -> Vec<(Category, SourceAdapter)> {
        let mut calls = Vec::new();

        if requested == Category::All {
            for category in Category::KNOWN {
                if let Some(events) = &self.events {
                    calls.push((category, SourceAdapter::Events(events.clone())));
                }
                for feed in &self.feeds {
                    if feed.category() == category {
                        calls.push((category, SourceAdapter::Feed(feed.clone())));
                    }
                }
            }
            for feed in &self.feeds {
                if feed.category() == Category::All {
                    calls.push((Category::All, SourceAdapter::Feed(feed.clone())));
                }
            }
            if let Some(search) = &self.search {
                calls.push((Category::All, SourceAdapter::Search(search.clone())));
            }
            return calls;
        }

        if let Some(events) = &self.events {
            calls.push((requested, SourceAdapter::Events(events.clone())));
        }
        for feed in &self.feeds {
            if feed.registered_for(requested) {
                calls.push((requested, SourceAdapter::Feed(feed.clone())));
            }
        }
        if let Some(search) = &self.search {
            calls.push((requested, SourceAdapter::Search(search.clone())));
        }
        calls
    }
}

/// Shared HTTP client used by every adapter.
fn default_client() -> reqwest::Client {
    reqwest::Client::builder()
        .gzip(true)
        .timeout(FETCH_TIMEOUT)
        .redirect(reqwest::redirect::Policy::default())
        .build()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_set_plans_no_calls() {
        let set = AdapterSet::empty();
        assert!(set.fan_out(Category::Technology).is_empty());
        assert!(set.fan_out(Category::All).is_empty());
    }

    #[test]
    fn test_fan_out_for_concrete_category() {
        let set = AdapterSet::from_env();
        let sports = set.fan_out(Category::Sports);
        // Events adapter, sports feed, and the catch-all world feed, all
        // invoked with the requested category.
        assert!(sports.iter().all(|(c, _)| *c == Category::Sports));
        assert!(sports.iter().any(|(_, a)| a.kind() == "events"));
        assert!(sports.iter().filter(|(_, a)| a.kind() == "feed").count() >= 2);
    }

    #[test]
    fn test_fan_out_for_all_calls_catch_all_feeds_once() {
        let set = AdapterSet::from_env();
        let calls = set.fan_out(Category::All);

        // Events once per concrete category.
        assert_eq!(
            calls.iter().filter(|(_, a)| a.kind() == "events").count(),
            Category::KNOWN.len()
        );
        // Each catch-all feed is invoked exactly once, with `All`, so its
        // general-news entries are not filtered away by inference.
        let catch_all: Vec<_> = calls
            .iter()
            .filter(|(c, a)| *c == Category::All && a.kind() == "feed")
            .collect();
        assert_eq!(catch_all.len(), 1);
        // No feed call is planned twice for the same category.
        assert!(calls
            .iter()
            .all(|(c, _)| *c == Category::All || Category::KNOWN.contains(c)));
    }
}
