//! Harvest engine: per-source page fetch, link admission, and navigation
//! subpage discovery.
//!
//! The engine visits each source's start page, admits relevant document
//! links through the run-scoped [`FingerprintStore`], then fetches up to a
//! capped number of navigation subpages with a bounded concurrency and an
//! inter-request pause. Every page-level failure is logged and local to
//! that page; a source failure never aborts the run.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use scraper::{Html, Selector};
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};
use url::Url;

use energydocs_shared::types::CORPUS_LANGUAGE;
use energydocs_shared::{
    CrawlSettings, DocumentRecord, DocumentStatus, EnergyDocsError, Result,
};

use crate::classify::{assign_priority, classify_document_type};
use crate::dedup::{FingerprintStore, fingerprint};
use crate::sources::SourceSite;
use crate::text::{clean_text, is_usable_anchor};

/// User-Agent string for harvest requests.
const USER_AGENT: &str = concat!("energydocs/", env!("CARGO_PKG_VERSION"));

/// Common navigation container selectors, tried in order on the start page.
const NAV_SELECTORS: &[&str] = &[
    "nav a",
    ".menu a",
    ".navigation a",
    ".main-menu a",
    ".primary-menu a",
    "header a",
    ".header a",
];

/// Minimum cleaned-anchor length for a navigation link candidate.
const MIN_NAV_ANCHOR_LEN: usize = 4;

// ---------------------------------------------------------------------------
// HarvestResult
// ---------------------------------------------------------------------------

/// Summary of a completed harvest across all sources.
#[derive(Debug, Clone)]
pub struct HarvestResult {
    /// All admitted document records, in admission order.
    pub documents: Vec<DocumentRecord>,
    /// Pages fetched and parsed successfully.
    pub pages_visited: usize,
    /// Pages that failed to fetch or parse.
    pub pages_failed: usize,
    /// Errors encountered (URL, error message).
    pub errors: Vec<(String, String)>,
    /// Distinct URLs admitted through the fingerprint store.
    pub unique_urls: usize,
}

// ---------------------------------------------------------------------------
// Crawler
// ---------------------------------------------------------------------------

/// Harvest crawler. Owns the HTTP client and the run-scoped dedup state for
/// the duration of one `harvest` call; downstream stages receive an
/// immutable snapshot of the documents.
pub struct Crawler {
    settings: CrawlSettings,
    client: Client,
}

impl Crawler {
    /// Create a new crawler with the given settings.
    pub fn new(settings: CrawlSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| EnergyDocsError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { settings, client })
    }

    /// Harvest all sources sequentially. Subpages within a source are
    /// fetched with bounded concurrency. `shutdown` is checked between
    /// fetches; when set, the harvest returns early with whatever has been
    /// collected so far.
    #[instrument(skip_all, fields(sources = sources.len()))]
    pub async fn harvest(
        &self,
        sources: &[SourceSite],
        shutdown: &AtomicBool,
    ) -> Result<HarvestResult> {
        let store = Arc::new(FingerprintStore::new());
        let mut result = HarvestResult {
            documents: Vec::new(),
            pages_visited: 0,
            pages_failed: 0,
            errors: Vec::new(),
            unique_urls: 0,
        };

        info!(
            concurrency = self.settings.concurrency,
            rate_limit_ms = self.settings.rate_limit_ms,
            "starting harvest"
        );

        for source in sources {
            if shutdown.load(Ordering::Relaxed) {
                warn!("shutdown requested, stopping harvest early");
                break;
            }
            let before = result.documents.len();
            self.harvest_source(source, &store, shutdown, &mut result).await;
            info!(
                organization = %source.organization,
                documents = result.documents.len() - before,
                "source complete"
            );
        }

        result.unique_urls = store.urls_seen();

        info!(
            documents = result.documents.len(),
            pages_visited = result.pages_visited,
            pages_failed = result.pages_failed,
            "harvest complete"
        );

        Ok(result)
    }

    /// Harvest one source: start page, then discovered navigation subpages.
    /// All failures are folded into `result` and never propagate.
    async fn harvest_source(
        &self,
        source: &SourceSite,
        store: &Arc<FingerprintStore>,
        shutdown: &AtomicBool,
        result: &mut HarvestResult,
    ) {
        let base = match source.base() {
            Ok(base) => base,
            Err(e) => {
                warn!(organization = %source.organization, error = %e, "invalid source, skipping");
                result.errors.push((source.base_url.clone(), e.to_string()));
                return;
            }
        };

        let start_url = match Url::parse(&source.start_url) {
            Ok(url) => url,
            Err(e) => {
                warn!(organization = %source.organization, error = %e, "invalid start URL, skipping");
                result.errors.push((source.start_url.clone(), e.to_string()));
                return;
            }
        };

        let body = match fetch_page(&self.client, &start_url).await {
            Ok(body) => body,
            Err(e) => {
                warn!(url = %start_url, error = %e, "start page fetch failed, skipping source");
                result.pages_failed += 1;
                result.errors.push((start_url.to_string(), e.to_string()));
                return;
            }
        };
        result.pages_visited += 1;

        // Parse once for both document extraction and nav discovery; the
        // document must drop before the subpage awaits below.
        let nav_links = {
            let doc = Html::parse_document(&body);
            let mut docs = extract_documents(&doc, &base, &start_url, source, store);
            result.documents.append(&mut docs);
            discover_nav_links(&doc, &base, &start_url, source, self.settings.subpage_limit)
        };

        debug!(
            organization = %source.organization,
            subpages = nav_links.len(),
            "navigation subpages discovered"
        );

        // Fetch subpages with bounded concurrency, pausing between requests
        // to avoid overloading the source server.
        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency.max(1)));
        let mut handles = Vec::new();

        for subpage in nav_links {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            let client = self.client.clone();
            let sem = semaphore.clone();
            let store = store.clone();
            let source = source.clone();
            let base = base.clone();
            let rate_limit = self.settings.rate_limit_ms;

            handles.push(tokio::spawn(async move {
                let _permit = sem.acquire().await.expect("semaphore closed");
                if rate_limit > 0 {
                    tokio::time::sleep(Duration::from_millis(rate_limit)).await;
                }
                let body = fetch_page(&client, &subpage).await?;
                let doc = Html::parse_document(&body);
                Ok::<_, EnergyDocsError>((
                    subpage.clone(),
                    extract_documents(&doc, &base, &subpage, &source, &store),
                ))
            }));
        }

        for handle in handles {
            match handle.await {
                Ok(Ok((url, mut docs))) => {
                    debug!(%url, documents = docs.len(), "subpage harvested");
                    result.pages_visited += 1;
                    result.documents.append(&mut docs);
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "subpage fetch failed");
                    result.pages_failed += 1;
                    result.errors.push(("subpage".into(), e.to_string()));
                }
                Err(e) => {
                    warn!(error = %e, "subpage task failed");
                    result.pages_failed += 1;
                    result.errors.push(("task".into(), e.to_string()));
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Page fetching
// ---------------------------------------------------------------------------

/// Fetch a single page body. One attempt, bounded by the client timeout.
async fn fetch_page(client: &Client, url: &Url) -> Result<String> {
    debug!(%url, "fetching page");

    let response = client
        .get(url.as_str())
        .send()
        .await
        .map_err(|e| EnergyDocsError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(EnergyDocsError::Network(format!("{url}: HTTP {status}")));
    }

    response
        .text()
        .await
        .map_err(|e| EnergyDocsError::Network(format!("{url}: body read failed: {e}")))
}

// ---------------------------------------------------------------------------
// Link extraction & admission
// ---------------------------------------------------------------------------

/// Extract document records from a page: every `a[href]` whose cleaned
/// anchor is long enough, matches a source keyword, and passes fingerprint
/// admission becomes a record.
fn extract_documents(
    doc: &Html,
    base: &Url,
    page_url: &Url,
    source: &SourceSite,
    store: &FingerprintStore,
) -> Vec<DocumentRecord> {
    let link_sel = Selector::parse("a[href]").expect("valid selector");
    let mut documents = Vec::new();

    for el in doc.select(&link_sel) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        let title = clean_text(&el.text().collect::<String>());
        if !is_usable_anchor(&title) {
            continue;
        }
        if !source.is_relevant(&title) {
            continue;
        }
        let Some(resolved) = resolve_href(href, base, page_url) else {
            continue;
        };

        let url_fingerprint = fingerprint(resolved.as_str());
        let content_fingerprint = fingerprint(&title);
        if !store.admit(&url_fingerprint, &content_fingerprint) {
            continue;
        }

        let document_type = classify_document_type(&title);
        let priority = assign_priority(&title, document_type);

        documents.push(DocumentRecord {
            title,
            url: resolved.to_string(),
            source_organization: source.organization.clone(),
            collection_date: Utc::now().date_naive(),
            language: CORPUS_LANGUAGE.into(),
            document_type,
            priority,
            status: DocumentStatus::Collected,
            folder_path: source.folder_path.clone(),
            content_fingerprint,
        });
    }

    documents
}

/// Discover same-source navigation links on the start page, capped at
/// `limit`. Candidates must be relevant and carry a usable nav anchor; the
/// start page itself and duplicates are dropped so no page is fetched twice.
fn discover_nav_links(
    doc: &Html,
    base: &Url,
    start_url: &Url,
    source: &SourceSite,
    limit: usize,
) -> Vec<Url> {
    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(start_url.to_string());
    let mut links = Vec::new();

    for selector in NAV_SELECTORS {
        let sel = Selector::parse(selector).expect("valid selector");
        for el in doc.select(&sel) {
            if links.len() >= limit {
                return links;
            }
            let Some(href) = el.value().attr("href") else {
                continue;
            };
            let text = clean_text(&el.text().collect::<String>());
            if text.chars().count() < MIN_NAV_ANCHOR_LEN || !source.is_relevant(&text) {
                continue;
            }
            let Some(resolved) = resolve_href(href, base, start_url) else {
                continue;
            };
            if seen.insert(resolved.to_string()) {
                links.push(resolved);
            }
        }
    }

    links
}

/// Resolve an href: `/`-prefixed against the source base, absolute http(s)
/// unchanged, anything else against the current page URL. Fragment-only and
/// non-navigational schemes are dropped.
fn resolve_href(href: &str, base: &Url, page_url: &Url) -> Option<Url> {
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
    {
        return None;
    }

    let resolved = if href.starts_with('/') {
        // Root-relative paths resolve against the source base, not the page.
        base.join(href).ok()?
    } else if href.starts_with("http://") || href.starts_with("https://") {
        Url::parse(href).ok()?
    } else {
        page_url.join(href).ok()?
    };

    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}
