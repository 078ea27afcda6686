//! Randomness sources and event selection.
//!
//! Every source answers `next_index(max)` with a value in `[0, max)`.
//! The external true-random service is wrapped by [`FallbackRandom`],
//! which answers from a local seeded generator whenever the primary fails.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::lookup::{endpoint_url, LookupClient, LookupError};
use crate::core::resolution::Resolution;
use crate::core::storyboard::EventBranch;

#[derive(Debug, Error)]
pub enum RandomError {
    #[error("lookup failed: {0}")]
    Lookup(#[from] LookupError),
    #[error("not a number: '{0}'")]
    NotANumber(String),
    #[error("index {index} outside [0, {max})")]
    OutOfRange { index: usize, max: usize },
    #[error("cannot pick from an empty range")]
    EmptyRange,
}

/// A source of uniform indices.
#[async_trait]
pub trait RandomSource: Send {
    /// Return an index in `[0, max)`.
    async fn next_index(&mut self, max: usize) -> Result<usize, RandomError>;

    /// Source name for logging.
    fn name(&self) -> &str;
}

#[async_trait]
impl RandomSource for Box<dyn RandomSource> {
    async fn next_index(&mut self, max: usize) -> Result<usize, RandomError> {
        (**self).next_index(max).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Local pseudo-random generator.
#[derive(Debug, Clone)]
pub struct LocalRandom {
    rng: StdRng,
}

impl LocalRandom {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded when a seed is given, entropy-backed otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        seed.map(Self::seeded).unwrap_or_else(Self::from_entropy)
    }
}

#[async_trait]
impl RandomSource for LocalRandom {
    async fn next_index(&mut self, max: usize) -> Result<usize, RandomError> {
        if max == 0 {
            return Err(RandomError::EmptyRange);
        }
        Ok(self.rng.gen_range(0..max))
    }

    fn name(&self) -> &str {
        "local"
    }
}

/// random.org integer generator; answers in plain text.
#[derive(Clone)]
pub struct RandomOrgSource {
    client: LookupClient,
    endpoint: String,
}

impl RandomOrgSource {
    pub fn new(client: LookupClient, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl RandomSource for RandomOrgSource {
    async fn next_index(&mut self, max: usize) -> Result<usize, RandomError> {
        if max == 0 {
            return Err(RandomError::EmptyRange);
        }
        let url = endpoint_url(
            &self.endpoint,
            &[
                ("num", "1".to_string()),
                ("min", "0".to_string()),
                ("max", (max - 1).to_string()),
                ("col", "1".to_string()),
                ("base", "10".to_string()),
                ("format", "plain".to_string()),
                ("rnd", "new".to_string()),
            ],
        )?;
        let text = self.client.fetch_text(&url).await?;
        parse_index(&text, max)
    }

    fn name(&self) -> &str {
        "random.org"
    }
}

/// Parse a plain-text integer answer and check it lies in `[0, max)`.
pub fn parse_index(text: &str, max: usize) -> Result<usize, RandomError> {
    let trimmed = text.trim();
    let index: usize = trimmed
        .parse()
        .map_err(|_| RandomError::NotANumber(trimmed.chars().take(40).collect()))?;
    if index >= max {
        return Err(RandomError::OutOfRange { index, max });
    }
    Ok(index)
}

/// Decorator answering from `fallback` whenever `primary` fails.
pub struct FallbackRandom<P, F = LocalRandom> {
    primary: P,
    fallback: F,
}

impl<P: RandomSource, F: RandomSource> FallbackRandom<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }

    /// Like `next_index`, but reports whether the fallback answered.
    /// A primary answer outside `[0, max)` counts as a failure.
    pub async fn resolve_index(&mut self, max: usize) -> Result<Resolution<usize>, RandomError> {
        let primary = match self.primary.next_index(max).await {
            Ok(index) if index >= max => Err(RandomError::OutOfRange { index, max }),
            other => other,
        };
        match primary {
            Ok(index) => Ok(Resolution::Direct(index)),
            Err(e) => {
                warn!(
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    error = %e,
                    "Random source failed, falling back"
                );
                let index = self.fallback.next_index(max).await?;
                Ok(Resolution::recovered(
                    index,
                    format!("{} failed ({}), used {}", self.primary.name(), e, self.fallback.name()),
                ))
            }
        }
    }
}

#[async_trait]
impl<P: RandomSource, F: RandomSource> RandomSource for FallbackRandom<P, F> {
    async fn next_index(&mut self, max: usize) -> Result<usize, RandomError> {
        Ok(self.resolve_index(max).await?.into_value())
    }

    fn name(&self) -> &str {
        self.primary.name()
    }
}

/// Picks one event key from a resolved branch.
pub struct EventSelector<P: RandomSource = Box<dyn RandomSource>> {
    source: FallbackRandom<P, LocalRandom>,
}

impl<P: RandomSource> EventSelector<P> {
    pub fn new(primary: P, local: LocalRandom) -> Self {
        Self {
            source: FallbackRandom::new(primary, local),
        }
    }

    /// Pick a key uniformly over the branch's insertion order.
    /// A single-key branch returns that key without consulting any source.
    pub async fn select<'a>(
        &mut self,
        branch: &'a EventBranch,
    ) -> Result<Resolution<&'a str>, RandomError> {
        let count = branch.len();
        if count == 0 {
            return Err(RandomError::EmptyRange);
        }
        if count == 1 {
            if let Some((key, _)) = branch.first() {
                return Ok(Resolution::Direct(key.as_str()));
            }
        }

        let index = self.source.resolve_index(count).await?;
        let i = *index.value();
        debug!(index = i, count, "Event index drawn");
        let (key, _) = branch
            .get_index(i)
            .ok_or(RandomError::OutOfRange { index: i, max: count })?;
        Ok(index.map(|_| key.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lookup::test_support::{query_param, ScriptedTransport};
    use crate::core::lookup::HttpResponse;
    use crate::schema::event::StoryEvent;

    /// Source that always fails, to force the fallback path.
    struct Broken;

    #[async_trait]
    impl RandomSource for Broken {
        async fn next_index(&mut self, _max: usize) -> Result<usize, RandomError> {
            Err(RandomError::NotANumber("Error: quota exceeded".to_string()))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    /// Source that returns a fixed index, valid or not.
    struct Fixed(usize);

    #[async_trait]
    impl RandomSource for Fixed {
        async fn next_index(&mut self, _max: usize) -> Result<usize, RandomError> {
            Ok(self.0)
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn branch(keys: &[&str]) -> EventBranch {
        keys.iter()
            .map(|k| (k.to_string(), StoryEvent::with_description(k, "...")))
            .collect()
    }

    #[test]
    fn parse_index_accepts_trailing_newline() {
        assert_eq!(parse_index("3\n", 5).unwrap(), 3);
    }

    #[test]
    fn parse_index_rejects_garbage_and_range() {
        assert!(matches!(parse_index("Error: quota", 5), Err(RandomError::NotANumber(_))));
        assert!(matches!(
            parse_index("5", 5),
            Err(RandomError::OutOfRange { index: 5, max: 5 })
        ));
        assert!(matches!(parse_index("-1", 5), Err(RandomError::NotANumber(_))));
    }

    #[tokio::test]
    async fn local_random_stays_in_range_and_is_seeded() {
        let mut a = LocalRandom::seeded(7);
        let mut b = LocalRandom::seeded(7);
        for _ in 0..200 {
            let x = a.next_index(4).await.unwrap();
            assert!(x < 4);
            assert_eq!(x, b.next_index(4).await.unwrap());
        }
        assert!(matches!(a.next_index(0).await, Err(RandomError::EmptyRange)));
    }

    #[tokio::test]
    async fn random_org_requests_inclusive_max() {
        let transport = ScriptedTransport::new(|url| {
            assert_eq!(query_param(url, "max").as_deref(), Some("2"));
            assert_eq!(query_param(url, "format").as_deref(), Some("plain"));
            Ok(HttpResponse::text("1\n"))
        });
        let mut source = RandomOrgSource::new(
            LookupClient::new(transport),
            "https://random.test/integers/",
        );
        assert_eq!(source.next_index(3).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn random_org_error_status_is_an_error() {
        let transport = ScriptedTransport::new(|_| Ok(HttpResponse::status(503)));
        let mut source = RandomOrgSource::new(LookupClient::new(transport), "https://random.test/");
        assert!(matches!(source.next_index(3).await, Err(RandomError::Lookup(_))));
    }

    #[tokio::test]
    async fn fallback_answers_when_primary_fails() {
        let mut source = FallbackRandom::new(Broken, LocalRandom::seeded(1));
        let index = source.resolve_index(5).await.unwrap();
        assert!(index.is_recovered());
        assert!(*index.value() < 5);
        assert!(index.warning().unwrap().contains("broken"));
    }

    #[tokio::test]
    async fn selector_single_key_ignores_source() {
        let mut selector = EventSelector::new(Broken, LocalRandom::seeded(1));
        let b = branch(&["Only"]);
        let key = selector.select(&b).await.unwrap();
        assert_eq!(key, Resolution::Direct("Only"));
    }

    #[tokio::test]
    async fn selector_follows_insertion_order() {
        let b = branch(&["Event_3", "Event_1", "Event_2"]);
        let mut selector = EventSelector::new(Fixed(1), LocalRandom::seeded(1));
        assert_eq!(selector.select(&b).await.unwrap(), Resolution::Direct("Event_1"));
    }

    #[tokio::test]
    async fn selector_out_of_range_primary_falls_back() {
        let b = branch(&["A", "B", "C"]);
        let mut selector = EventSelector::new(Fixed(17), LocalRandom::seeded(3));
        let key = selector.select(&b).await.unwrap();
        assert!(key.is_recovered());
        assert!(b.contains_key(*key.value()));
    }

    #[tokio::test]
    async fn selector_index_always_in_range() {
        let b = branch(&["A", "B", "C", "D"]);
        let mut selector = EventSelector::new(Broken, LocalRandom::seeded(99));
        for _ in 0..100 {
            let key = selector.select(&b).await.unwrap();
            assert!(b.contains_key(*key.value()));
        }
    }

    #[tokio::test]
    async fn selector_rejects_empty_branch() {
        let mut selector = EventSelector::new(Broken, LocalRandom::seeded(1));
        assert!(matches!(
            selector.select(&EventBranch::new()).await,
            Err(RandomError::EmptyRange)
        ));
    }
}
