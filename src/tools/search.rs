//! DuckDuckGo web search tool.
//!
//! Queries the keyless HTML endpoint and scrapes the result list. Only the
//! title, target URL and snippet of each organic result are kept; ads
//! (which link through `duckduckgo.com/y.js`) are skipped.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::USER_AGENT;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolExecutionContext};
use super::types::AgentToolParameters;
use crate::error::ChatError;
use crate::provider::http::shared_client;

pub const DEFAULT_SEARCH_BASE_URL: &str = "https://html.duckduckgo.com";
pub const DEFAULT_MAX_RESULTS: usize = 5;
pub const NO_RESULTS_MESSAGE: &str = "No good DuckDuckGo Search Result was found";

const TOOL_NAME: &str = "duckduckgo_search";
const TOOL_DESCRIPTION: &str = "A wrapper around DuckDuckGo Search. Useful for when you need to \
answer questions about current events. Input should be a search query.";
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Settings for the web search tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Origin of the DuckDuckGo HTML endpoint (no trailing path).
    pub base_url: String,
    /// Upper bound on results returned to the model.
    pub max_results: usize,
    /// DuckDuckGo region code (`kl`), e.g. `us-en`; `None` means worldwide.
    pub region: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SEARCH_BASE_URL.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            region: None,
        }
    }
}

/// One organic search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Web search backed by DuckDuckGo.
pub struct WebSearchTool {
    config: SearchConfig,
    client: reqwest::Client,
    parameters: AgentToolParameters,
}

impl WebSearchTool {
    pub fn new(config: SearchConfig) -> Self {
        Self::with_client(config, shared_client().clone())
    }

    pub fn with_client(config: SearchConfig, client: reqwest::Client) -> Self {
        Self {
            config,
            client,
            parameters: AgentToolParameters::object()
                .string("query", "The search query", true)
                .build(),
        }
    }

    /// Run a query and return at most `max_results` hits.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ChatError> {
        let url = format!("{}/html/", self.config.base_url.trim_end_matches('/'));
        let mut params = vec![("q", query)];
        if let Some(region) = self.config.region.as_deref() {
            params.push(("kl", region));
        }

        debug!(query, "duckduckgo search");

        let resp = self
            .client
            .get(&url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .query(&params)
            .send()
            .await
            .map_err(|e| ChatError::tool(TOOL_NAME, e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ChatError::tool(
                TOOL_NAME,
                format!("search endpoint returned HTTP {}", status.as_u16()),
            ));
        }

        let html = resp
            .text()
            .await
            .map_err(|e| ChatError::tool(TOOL_NAME, e.to_string()))?;
        let mut results = parse_results(&html);
        results.truncate(self.config.max_results);
        debug!(query, hits = results.len(), "duckduckgo search done");
        Ok(results)
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        TOOL_DESCRIPTION
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        _ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value, ChatError> {
        // Models occasionally send the bare query instead of an object.
        let query = match args.raw() {
            serde_json::Value::String(raw) => raw.as_str(),
            _ => args.get_str("query")?,
        }
        .trim();
        if query.is_empty() {
            return Err(ChatError::InvalidArgument("search query is empty".into()));
        }

        let results = self.search(query).await?;
        Ok(serde_json::Value::String(format_results(&results)))
    }
}

/// Render results as the numbered text block handed back to the model.
pub fn format_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return NO_RESULTS_MESSAGE.to_string();
    }
    results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. {}\n   {}\n   {}", i + 1, r.title, r.url, r.snippet))
        .collect::<Vec<_>>()
        .join("\n")
}

fn title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<a([^>]*class="result__a"[^>]*)>(.*?)</a>"#).expect("valid regex")
    })
}

fn snippet_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<(?:a|div|td)[^>]*class="result__snippet"[^>]*>(.*?)</(?:a|div|td)>"#)
            .expect("valid regex")
    })
}

fn href_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"href="([^"]*)""#).expect("valid regex"))
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid regex"))
}

fn numeric_entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&#([xX]?)([0-9a-fA-F]+);").expect("valid regex"))
}

/// Extract organic results from a DuckDuckGo HTML results page.
pub fn parse_results(html: &str) -> Vec<SearchResult> {
    html.split("result__body")
        .skip(1)
        .filter_map(|chunk| {
            let title = title_re().captures(chunk)?;
            let href = href_re().captures(title.get(1)?.as_str())?;
            let url = resolve_href(href.get(1)?.as_str());
            if url.is_empty() || url.contains("duckduckgo.com/y.js") {
                return None;
            }
            let title = clean_text(title.get(2)?.as_str());
            if title.is_empty() {
                return None;
            }
            let snippet = snippet_re()
                .captures(chunk)
                .and_then(|c| c.get(1))
                .map(|m| clean_text(m.as_str()))
                .unwrap_or_default();
            Some(SearchResult {
                title,
                url,
                snippet,
            })
        })
        .collect()
}

/// Unwrap DuckDuckGo's `/l/?uddg=` redirect to the real target URL.
fn resolve_href(raw: &str) -> String {
    let href = decode_entities(raw);
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href
    };
    let Ok(parsed) = reqwest::Url::parse(&absolute) else {
        return absolute;
    };
    let is_redirect = parsed
        .host_str()
        .is_some_and(|host| host.ends_with("duckduckgo.com"))
        && parsed.path().starts_with("/l/");
    if is_redirect {
        if let Some((_, target)) = parsed.query_pairs().find(|(k, _)| k == "uddg") {
            return target.into_owned();
        }
    }
    absolute
}

fn clean_text(fragment: &str) -> String {
    let stripped = tag_re().replace_all(fragment, "");
    decode_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(s: &str) -> String {
    let named = s
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ");
    let numeric = numeric_entity_re().replace_all(&named, |caps: &regex::Captures<'_>| {
        let radix = if caps[1].is_empty() { 10 } else { 16 };
        u32::from_str_radix(&caps[2], radix)
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });
    // Last, so "&amp;lt;" decodes to "&lt;" rather than "<".
    numeric.replace("&amp;", "&")
}
