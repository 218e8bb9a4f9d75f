//! Orchestration of a web-grounded answer.
//!
//! A run moves through
//! `Start -> QueryDecided -> Searched -> Ranked -> Scraped -> Distilled -> Summarized -> Done`
//! and stops at `Aborted` when the model answers without asking for a search.
//! Every stage's output is complete before the next stage starts, and the
//! completion client is only ever used by one stage at a time.

use std::fmt;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::completions::Completions;
use crate::errors::WebAskResult;
use crate::models::completion::StageConfig;
use crate::models::search::{RankedDocument, SearchResult};
use crate::search::{extract_query, SearchEngine};
use crate::stages::distill::distill_html;
use crate::stages::rank::{rank, DEFAULT_PICKED_RESULTS};
use crate::stages::scrape::ScrapeStage;
use crate::stages::search_query::decide_query;
use crate::stages::summarize::summarize;

pub const DEFAULT_FAST_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_STRONG_MODEL: &str = "gpt-4o";

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Settings of the query, rank and distill stages
    pub fast: StageConfig,
    /// Model that writes the final summary; other settings come from `fast`
    pub strong_model: String,
    pub picked_results: usize,
    /// Pages fetched at once; 1 scrapes them one after the other
    pub scrape_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fast: StageConfig::new(DEFAULT_FAST_MODEL, 0.4, 500_000),
            strong_model: DEFAULT_STRONG_MODEL.to_string(),
            picked_results: DEFAULT_PICKED_RESULTS,
            scrape_concurrency: 1,
        }
    }
}

impl PipelineConfig {
    pub fn strong(&self) -> StageConfig {
        self.fast.with_model(&self.strong_model)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    QueryDecided,
    Searched,
    Ranked,
    Scraped,
    Distilled,
    Summarized,
    Done,
    Aborted,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What the model decided before any search happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryDecision {
    Search(String),
    /// The model answered directly; the reply is kept as is
    NoSearch(String),
}

/// Search results for the query the model chose
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFindings {
    pub query: String,
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebAnswer {
    pub query: String,
    pub summary: String,
    /// Domains of the ranked results, first occurrence order
    pub domains: Vec<String>,
    /// Urls of the ranked results, in ranked order
    pub urls: Vec<String>,
    /// Tokens reported by every call of the run
    pub used_tokens: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome<T = WebAnswer> {
    NoSearch { answer: String },
    Answered(T),
}

pub struct WebPipeline {
    completions: Completions,
    search: Box<dyn SearchEngine>,
    scraper: ScrapeStage,
    config: PipelineConfig,
    state: PipelineState,
}

impl WebPipeline {
    pub fn new(
        completions: Completions,
        search: Box<dyn SearchEngine>,
        scraper: ScrapeStage,
        config: PipelineConfig,
    ) -> Self {
        Self {
            completions,
            search,
            scraper,
            config,
            state: PipelineState::Start,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn completions(&self) -> &Completions {
        &self.completions
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn advance(&mut self, next: PipelineState) {
        debug!(from = %self.state, to = %next, "pipeline transition");
        self.state = next;
    }

    /// Ask the model whether `prompt` needs a web search
    pub async fn decide_query(&mut self, prompt: &str) -> WebAskResult<QueryDecision> {
        self.state = PipelineState::Start;
        let response = decide_query(&mut self.completions, &self.config.fast, prompt).await?;
        self.advance(PipelineState::QueryDecided);
        info!("{}", response.message);

        match extract_query(&response.message) {
            Some(query) => Ok(QueryDecision::Search(query)),
            None => {
                self.advance(PipelineState::Aborted);
                Ok(QueryDecision::NoSearch(response.message))
            }
        }
    }

    /// Decide a query and run it against the search engine
    pub async fn surf(&mut self, prompt: &str) -> WebAskResult<PipelineOutcome<SearchFindings>> {
        let query = match self.decide_query(prompt).await? {
            QueryDecision::Search(query) => query,
            QueryDecision::NoSearch(answer) => return Ok(PipelineOutcome::NoSearch { answer }),
        };

        let results = self.search.search(&query).await;
        info!(query = %query, results = results.len(), "search finished");
        self.advance(PipelineState::Searched);

        Ok(PipelineOutcome::Answered(SearchFindings { query, results }))
    }

    /// Search, then keep the results the model trusts most, best first
    pub async fn rank(&mut self, prompt: &str) -> WebAskResult<PipelineOutcome<SearchFindings>> {
        let findings = match self.surf(prompt).await? {
            PipelineOutcome::Answered(findings) => findings,
            PipelineOutcome::NoSearch { answer } => return Ok(PipelineOutcome::NoSearch { answer }),
        };

        let ranked = if findings.results.is_empty() {
            warn!("Search for \"{}\" returned no results", findings.query);
            Vec::new()
        } else {
            rank(
                &mut self.completions,
                &self.config.fast,
                prompt,
                &findings.results,
                self.config.picked_results,
            )
            .await?
        };
        self.advance(PipelineState::Ranked);

        Ok(PipelineOutcome::Answered(SearchFindings {
            query: findings.query,
            results: ranked,
        }))
    }

    /// Answer `prompt` from the pages the model picked.
    ///
    /// Pages that cannot be fetched are skipped but still listed among the
    /// sources. Any failing completion call ends the run.
    pub async fn run(&mut self, prompt: &str) -> WebAskResult<PipelineOutcome> {
        let findings = match self.rank(prompt).await? {
            PipelineOutcome::Answered(findings) => findings,
            PipelineOutcome::NoSearch { answer } => return Ok(PipelineOutcome::NoSearch { answer }),
        };

        let documents = self
            .scraper
            .scrape_all(findings.results, self.config.scrape_concurrency)
            .await;
        self.advance(PipelineState::Scraped);

        let distilled = self.distill_all(prompt, &documents).await?;
        self.advance(PipelineState::Distilled);

        let summary = summarize(
            &mut self.completions,
            &self.config.strong(),
            prompt,
            &distilled,
        )
        .await?;
        self.advance(PipelineState::Summarized);

        let mut domains: Vec<String> = Vec::new();
        for document in &documents {
            if !domains.contains(&document.result.domain) {
                domains.push(document.result.domain.clone());
            }
        }
        let urls = documents.iter().map(|d| d.result.url.clone()).collect();

        self.advance(PipelineState::Done);
        Ok(PipelineOutcome::Answered(WebAnswer {
            query: findings.query,
            summary: summary.message,
            domains,
            urls,
            used_tokens: self.completions.used_tokens(),
        }))
    }

    async fn distill_all(
        &mut self,
        prompt: &str,
        documents: &[RankedDocument],
    ) -> WebAskResult<Vec<String>> {
        let mut distilled = Vec::with_capacity(documents.len());
        for document in documents {
            if document.is_empty() {
                warn!("Nothing to read from {}", document.result.url);
                continue;
            }
            let started = Instant::now();
            let response = distill_html(
                &mut self.completions,
                &self.config.fast,
                prompt,
                &document.html,
            )
            .await?;
            info!(
                "Distilled: {}. Done in {}ms.",
                document.result.url,
                started.elapsed().as_millis()
            );
            distilled.push(response.message);
        }
        Ok(distilled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{WebAskError, WebAskResult};
    use crate::models::completion::TokenUsage;
    use crate::providers::mock::MockProvider;
    use crate::rate_limiter::RateLimits;
    use crate::render::PageRenderer;
    use async_trait::async_trait;

    struct FixedSearch(Vec<SearchResult>);

    #[async_trait]
    impl SearchEngine for FixedSearch {
        async fn search(&self, _query: &str) -> Vec<SearchResult> {
            self.0.clone()
        }
    }

    struct EchoRenderer;

    #[async_trait]
    impl PageRenderer for EchoRenderer {
        async fn render(&self, url: &str) -> WebAskResult<String> {
            if url.contains("down") {
                return Err(WebAskError::Render {
                    url: url.to_string(),
                    message: "timeout".to_string(),
                });
            }
            Ok(format!("<p>{}</p>", url))
        }
    }

    fn result(title: &str, url: &str) -> SearchResult {
        SearchResult::from_parts(title, url, "").unwrap()
    }

    fn pipeline(provider: &MockProvider, results: Vec<SearchResult>) -> WebPipeline {
        let config = PipelineConfig::default();
        WebPipeline::new(
            Completions::new(
                Box::new(provider.clone()),
                config.fast.clone(),
                RateLimits::default(),
            ),
            Box::new(FixedSearch(results)),
            ScrapeStage::new(Box::new(EchoRenderer)),
            config,
        )
    }

    fn fenced(results: &[SearchResult]) -> String {
        format!("```json\n{}\n```", serde_json::to_string(results).unwrap())
    }

    #[tokio::test]
    async fn test_direct_answer_aborts() {
        let provider = MockProvider::new(vec!["Paris is the capital of France."]);
        let mut pipeline = pipeline(&provider, vec![result("A", "https://a.com")]);

        let outcome = pipeline.run("capital of France?").await.unwrap();
        assert_eq!(
            outcome,
            PipelineOutcome::NoSearch {
                answer: "Paris is the capital of France.".to_string()
            }
        );
        assert_eq!(pipeline.state(), PipelineState::Aborted);
        assert_eq!(provider.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_page_is_skipped_but_listed() {
        let ranked = vec![
            result("Up", "https://up.example.com/a"),
            result("Down", "https://down.example.com/b"),
        ];
        let provider = MockProvider::with_usage(vec![
            ("Searching the web for: x".to_string(), TokenUsage::new(1, 1, 2, 0)),
            (fenced(&ranked), TokenUsage::new(1, 1, 2, 0)),
            ("distilled up".to_string(), TokenUsage::new(1, 1, 2, 0)),
            ("final".to_string(), TokenUsage::new(1, 1, 2, 0)),
        ]);
        let mut pipeline = pipeline(&provider, ranked.clone());

        let outcome = pipeline.run("x").await.unwrap();
        let PipelineOutcome::Answered(answer) = outcome else {
            panic!("expected an answer");
        };

        assert_eq!(answer.summary, "final");
        assert_eq!(answer.urls.len(), 2);
        assert_eq!(answer.domains, vec!["up.example.com", "down.example.com"]);
        assert_eq!(answer.used_tokens, 4 * 4);
        assert_eq!(pipeline.state(), PipelineState::Done);

        let requests = provider.requests();
        assert_eq!(requests.len(), 4);
        let summary_request = &requests[3];
        assert_eq!(summary_request.model, DEFAULT_STRONG_MODEL);
        assert_eq!(summary_request.messages.last().unwrap().content, "distilled up");
    }

    #[tokio::test]
    async fn test_empty_search_skips_ranking() {
        let provider = MockProvider::new(vec!["Searching the web for: nothing", "no sources"]);
        let mut pipeline = pipeline(&provider, Vec::new());

        let outcome = pipeline.rank("nothing").await.unwrap();
        assert_eq!(
            outcome,
            PipelineOutcome::Answered(SearchFindings {
                query: "nothing".to_string(),
                results: Vec::new()
            })
        );
        assert_eq!(provider.requests().len(), 1);
    }
}
