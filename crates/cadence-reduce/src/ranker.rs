use std::collections::HashSet;
use std::sync::Arc;

use cadence_types::Source;
use url::Url;

pub const SCORE_AUTHORITATIVE: u8 = 3;
pub const SCORE_NEUTRAL: u8 = 1;
pub const SCORE_LOW: u8 = 0;

pub const DEFAULT_TOP_SOURCES: usize = 3;

const AUTHORITATIVE_TLDS: &[&str] = &["gov", "edu", "mil", "int"];
const AUTHORITATIVE_SECOND_LEVELS: &[&str] = &["gov", "ac", "edu"];

const DEFAULT_AUTHORITATIVE: &[&str] = &[
    "nhs.uk",
    "mayoclinic.org",
    "clevelandclinic.org",
    "apa.org",
    "nature.com",
    "sciencedirect.com",
    "britannica.com",
];

const DEFAULT_LOW_QUALITY: &[&str] = &[
    "reddit.com",
    "quora.com",
    "medium.com",
    "pinterest.com",
    "facebook.com",
    "twitter.com",
    "x.com",
    "tiktok.com",
    "buzzfeed.com",
    "msn.com",
    "news.yahoo.com",
    "news.google.com",
];

const DEFAULT_DENIED: &[&str] = &[
    "ehow.com",
    "ezinearticles.com",
    "hubpages.com",
    "answers.com",
];

/// Domain lists used to score sources
///
/// Entries match the host itself or any subdomain of it. The policy is
/// immutable once built and shared between requests behind an `Arc`.
#[derive(Debug, Clone)]
pub struct DomainPolicy {
    authoritative: Vec<String>,
    low_quality: Vec<String>,
    denied: Vec<String>,
}

impl Default for DomainPolicy {
    fn default() -> Self {
        Self {
            authoritative: to_owned(DEFAULT_AUTHORITATIVE),
            low_quality: to_owned(DEFAULT_LOW_QUALITY),
            denied: to_owned(DEFAULT_DENIED),
        }
    }
}

fn to_owned(domains: &[&str]) -> Vec<String> {
    domains.iter().map(|d| d.to_string()).collect()
}

fn normalize_domain(domain: &str) -> String {
    let domain = domain.trim().trim_end_matches('.').to_ascii_lowercase();
    match domain.strip_prefix("www.") {
        Some(bare) => bare.to_string(),
        None => domain,
    }
}

impl DomainPolicy {
    /// Policy with empty lists; only the TLD rules apply
    pub fn empty() -> Self {
        Self {
            authoritative: Vec::new(),
            low_quality: Vec::new(),
            denied: Vec::new(),
        }
    }

    pub fn with_authoritative<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.authoritative
            .extend(domains.into_iter().map(|d| normalize_domain(d.as_ref())));
        self
    }

    pub fn with_low_quality<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.low_quality
            .extend(domains.into_iter().map(|d| normalize_domain(d.as_ref())));
        self
    }

    pub fn with_denied<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.denied
            .extend(domains.into_iter().map(|d| normalize_domain(d.as_ref())));
        self
    }

    /// Score a URL, or `None` when it should be dropped
    pub fn score(&self, url: &str) -> Option<u8> {
        let parsed = Url::parse(url).ok()?;
        let host = normalize_domain(parsed.host_str()?);
        if host.is_empty() {
            return None;
        }

        if matches_any(&host, &self.denied) {
            return None;
        }
        if is_authoritative_suffix(&host) || matches_any(&host, &self.authoritative) {
            return Some(SCORE_AUTHORITATIVE);
        }
        if matches_any(&host, &self.low_quality) {
            return Some(SCORE_LOW);
        }
        Some(SCORE_NEUTRAL)
    }
}

fn matches_any(host: &str, domains: &[String]) -> bool {
    domains.iter().any(|domain| {
        host == domain
            || host
                .strip_suffix(domain.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

fn is_authoritative_suffix(host: &str) -> bool {
    let labels: Vec<&str> = host.split('.').collect();
    match labels.as_slice() {
        [.., _, tld] if AUTHORITATIVE_TLDS.contains(tld) => true,
        [.., second, country] if country.len() == 2 => AUTHORITATIVE_SECOND_LEVELS.contains(second),
        _ => false,
    }
}

/// Deduplicates, scores and truncates search sources
#[derive(Debug, Clone)]
pub struct SourceRanker {
    policy: Arc<DomainPolicy>,
    top_n: usize,
}

impl Default for SourceRanker {
    fn default() -> Self {
        Self::new(Arc::new(DomainPolicy::default()), DEFAULT_TOP_SOURCES)
    }
}

impl SourceRanker {
    pub fn new(policy: Arc<DomainPolicy>, top_n: usize) -> Self {
        Self { policy, top_n }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    pub fn policy(&self) -> &DomainPolicy {
        &self.policy
    }

    /// Rank sources best-first
    ///
    /// Exact duplicate URLs keep their first occurrence; denied and
    /// unparsable URLs are dropped; equal scores keep input order.
    pub fn rank(&self, sources: &[Source]) -> Vec<Source> {
        let mut seen = HashSet::new();

        let mut scored: Vec<(u8, &Source)> = sources
            .iter()
            .filter(|source| seen.insert(source.url.as_str()))
            .filter_map(|source| match self.policy.score(&source.url) {
                Some(score) => Some((score, source)),
                None => {
                    tracing::debug!(url = %source.url, "Dropping source");
                    None
                }
            })
            .collect();

        // sort_by is stable
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        scored
            .into_iter()
            .take(self.top_n)
            .map(|(_, source)| source.clone())
            .collect()
    }
}

/// Rank with the default policy
pub fn rank_sources(sources: &[Source], top_n: usize) -> Vec<Source> {
    SourceRanker::new(Arc::new(DomainPolicy::default()), top_n).rank(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn src(url: &str) -> Source {
        Source::new(url, url)
    }

    fn urls(sources: &[Source]) -> Vec<&str> {
        sources.iter().map(|s| s.url.as_str()).collect()
    }

    #[test]
    fn test_scores() {
        let policy = DomainPolicy::default();
        assert_eq!(policy.score("https://www.irs.gov/forms"), Some(SCORE_AUTHORITATIVE));
        assert_eq!(policy.score("https://cs.stanford.edu"), Some(SCORE_AUTHORITATIVE));
        assert_eq!(policy.score("https://www.ox.ac.uk/admissions"), Some(SCORE_AUTHORITATIVE));
        assert_eq!(policy.score("https://www.nhs.uk/conditions/adhd/"), Some(SCORE_AUTHORITATIVE));
        assert_eq!(
            policy.score("https://www.gov.uk/renew-adult-passport"),
            Some(SCORE_AUTHORITATIVE)
        );
        assert_eq!(policy.score("https://www.gov.au/x"), Some(SCORE_AUTHORITATIVE));
        assert_eq!(policy.score("https://gov.au"), Some(SCORE_AUTHORITATIVE));
        assert_eq!(policy.score("https://example.com/post"), Some(SCORE_NEUTRAL));
        assert_eq!(policy.score("https://old.reddit.com/r/adhd"), Some(SCORE_LOW));
        assert_eq!(policy.score("https://www.ehow.com/how-to"), None);
        assert_eq!(policy.score("not a url"), None);
    }

    #[test]
    fn test_subdomain_match_requires_label_boundary() {
        let policy = DomainPolicy::default();
        assert_eq!(policy.score("https://notreddit.com"), Some(SCORE_NEUTRAL));
        assert_eq!(policy.score("https://myehow.com"), Some(SCORE_NEUTRAL));
    }

    #[test]
    fn test_ac_requires_country_code() {
        let policy = DomainPolicy::default();
        assert_eq!(policy.score("https://shop.ac.com"), Some(SCORE_NEUTRAL));
    }

    #[test]
    fn test_policy_is_extendable() {
        let policy = DomainPolicy::empty()
            .with_authoritative(["www.Docs.RS"])
            .with_denied(vec!["spam.example".to_string()]);
        assert_eq!(policy.score("https://docs.rs/serde"), Some(SCORE_AUTHORITATIVE));
        assert_eq!(policy.score("https://a.spam.example"), None);
        assert_eq!(policy.score("https://reddit.com"), Some(SCORE_NEUTRAL));
    }

    #[test]
    fn test_rank_dedupes_sorts_and_truncates() {
        let sources = vec![
            src("https://reddit.com/r/a"),
            src("https://example.com/a"),
            src("https://www.cdc.gov/a"),
            src("https://example.com/a"),
            src("https://ehow.com/a"),
            src("https://blog.example.org/b"),
        ];

        let ranked = SourceRanker::default().rank(&sources);
        assert_eq!(
            urls(&ranked),
            vec!["https://www.cdc.gov/a", "https://example.com/a", "https://blog.example.org/b"]
        );
    }

    #[test]
    fn test_gov_ranks_before_low_quality() {
        let sources = vec![src("https://www.quora.com/q"), src("https://www.usa.gov/benefits")];
        let ranked = rank_sources(&sources, 3);
        assert_eq!(urls(&ranked), vec!["https://www.usa.gov/benefits", "https://www.quora.com/q"]);
    }

    #[test]
    fn test_empty_and_zero() {
        assert!(SourceRanker::default().rank(&[]).is_empty());
        assert!(rank_sources(&[src("https://a.gov")], 0).is_empty());
    }
}
