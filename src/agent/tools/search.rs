//! Wikipedia, Tavily and arXiv search tools.
//!
//! Results are rendered as `<Document .../>` blocks separated by `---` and
//! wrapped in a one-key JSON object, e.g. `{"wiki_results": "..."}`.

use super::ToolContext;
use crate::error::{Result, SvarError};
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

const WIKI_CONTENT_CHARS: usize = 4000;
const ARXIV_CONTENT_CHARS: usize = 1000;
const SEPARATOR: &str = "\n\n---\n\n";

/// Base URLs of the search backends.
#[derive(Debug, Clone)]
pub struct SearchEndpoints {
    pub wikipedia: String,
    pub tavily: String,
    pub arxiv: String,
}

impl Default for SearchEndpoints {
    fn default() -> Self {
        Self {
            wikipedia: "https://en.wikipedia.org/w/api.php".to_string(),
            tavily: "https://api.tavily.com/search".to_string(),
            arxiv: "https://export.arxiv.org/api/query".to_string(),
        }
    }
}

#[derive(Deserialize)]
struct WikiSearchResponse {
    query: WikiSearchQuery,
}

#[derive(Deserialize)]
struct WikiSearchQuery {
    #[serde(default)]
    search: Vec<WikiSearchHit>,
}

#[derive(Deserialize)]
struct WikiSearchHit {
    title: String,
}

#[derive(Deserialize)]
struct WikiPageResponse {
    query: WikiPageQuery,
}

#[derive(Deserialize)]
struct WikiPageQuery {
    #[serde(default)]
    pages: Vec<WikiPage>,
}

#[derive(Deserialize)]
struct WikiPage {
    #[serde(default)]
    extract: String,
    #[serde(default)]
    fullurl: String,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: f64,
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn document(source: &str, page: &str, content: &str) -> String {
    format!(
        "<Document source=\"{}\" page=\"{}\"/>\n{}\n</Document>",
        source, page, content
    )
}

fn wrap(key: &str, documents: Vec<String>) -> String {
    json!({ key: documents.join(SEPARATOR) }).to_string()
}

async fn check(response: reqwest::Response, service: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SvarError::Tool(format!("{} returned {}: {}", service, status, body)))
}

impl ToolContext {
    #[instrument(skip(self))]
    pub(crate) async fn wiki_search(&self, query: &str) -> Result<String> {
        let limit = self.settings.wiki_max_docs.to_string();
        let response = self
            .http
            .get(&self.endpoints.wikipedia)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await?;
        let hits: WikiSearchResponse = check(response, "Wikipedia").await?.json().await?;

        let mut documents = Vec::new();
        for hit in hits.query.search {
            // Full-text extracts can only be fetched one page at a time.
            let response = self
                .http
                .get(&self.endpoints.wikipedia)
                .query(&[
                    ("action", "query"),
                    ("prop", "extracts|info"),
                    ("titles", hit.title.as_str()),
                    ("explaintext", "1"),
                    ("inprop", "url"),
                    ("redirects", "1"),
                    ("format", "json"),
                    ("formatversion", "2"),
                ])
                .send()
                .await?;
            let pages: WikiPageResponse = check(response, "Wikipedia").await?.json().await?;

            for page in pages.query.pages {
                documents.push(document(
                    &page.fullurl,
                    "",
                    &truncate(&page.extract, WIKI_CONTENT_CHARS),
                ));
            }
        }

        debug!("Wikipedia returned {} documents", documents.len());
        Ok(wrap("wiki_results", documents))
    }

    #[instrument(skip(self))]
    pub(crate) async fn web_search(&self, query: &str) -> Result<String> {
        let api_key = self
            .tavily_api_key
            .as_deref()
            .ok_or_else(|| SvarError::Tool("TAVILY_API_KEY environment variable is not set.".to_string()))?;

        let response = self
            .http
            .post(&self.endpoints.tavily)
            .bearer_auth(api_key)
            .json(&json!({
                "query": query,
                "max_results": self.settings.web_search_max_results,
            }))
            .send()
            .await?;
        let results: TavilyResponse = check(response, "Tavily").await?.json().await?;

        let documents = results
            .results
            .iter()
            .map(|r| {
                format!(
                    "<Document source=\"{}\" title=\"{}\" score=\"{}\"/>\n{}\n</Document>",
                    r.url, r.title, r.score, r.content
                )
            })
            .collect();

        Ok(wrap("web_results", documents))
    }

    #[instrument(skip(self))]
    pub(crate) async fn arxiv_search(&self, query: &str) -> Result<String> {
        let search_query = format!("all:{}", query);
        let limit = self.settings.arxiv_max_docs.to_string();
        let response = self
            .http
            .get(&self.endpoints.arxiv)
            .query(&[
                ("search_query", search_query.as_str()),
                ("start", "0"),
                ("max_results", limit.as_str()),
            ])
            .send()
            .await?;
        let feed = check(response, "arXiv").await?.text().await?;

        let documents = parse_arxiv_feed(&feed)?
            .into_iter()
            .map(|entry| {
                let content = format!("{}\n\n{}", entry.title, entry.summary);
                document(&entry.id, "", &truncate(&content, ARXIV_CONTENT_CHARS))
            })
            .collect();

        Ok(wrap("arxiv_results", documents))
    }
}

#[derive(Debug, PartialEq)]
struct ArxivEntry {
    id: String,
    title: String,
    summary: String,
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_arxiv_feed(feed: &str) -> Result<Vec<ArxivEntry>> {
    let invalid = |e: regex::Error| SvarError::Tool(format!("Invalid pattern: {}", e));
    let entry_re = Regex::new(r"(?s)<entry>(.*?)</entry>").map_err(invalid)?;
    let field_re = |tag: &str| {
        Regex::new(&format!(r"(?s)<{tag}[^>]*>(.*?)</{tag}>")).map_err(invalid)
    };
    let id_re = field_re("id")?;
    let title_re = field_re("title")?;
    let summary_re = field_re("summary")?;

    let field = |re: &Regex, body: &str| {
        re.captures(body)
            .and_then(|c| c.get(1))
            .map(|m| collapse_whitespace(&unescape_xml(m.as_str())))
            .unwrap_or_default()
    };

    Ok(entry_re
        .captures_iter(feed)
        .filter_map(|c| c.get(1))
        .map(|body| ArxivEntry {
            id: field(&id_re, body.as_str()),
            title: field(&title_re, body.as_str()),
            summary: field(&summary_re, body.as_str()),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tools::testing;
    use mockito::Matcher;
    use pretty_assertions::assert_eq;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query</title>
  <entry>
    <id>http://arxiv.org/abs/1706.03762v7</id>
    <title>Attention Is All
      You Need</title>
    <summary>  The dominant sequence transduction models &amp; more.
    </summary>
  </entry>
</feed>"#;

    fn endpoints(server: &mockito::Server) -> SearchEndpoints {
        SearchEndpoints {
            wikipedia: format!("{}/w/api.php", server.url()),
            tavily: format!("{}/search", server.url()),
            arxiv: format!("{}/api/query", server.url()),
        }
    }

    #[test]
    fn test_parse_arxiv_feed() {
        let entries = parse_arxiv_feed(FEED).unwrap();
        assert_eq!(
            entries,
            vec![ArxivEntry {
                id: "http://arxiv.org/abs/1706.03762v7".to_string(),
                title: "Attention Is All You Need".to_string(),
                summary: "The dominant sequence transduction models & more.".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_arxiv_search_output_shape() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/query")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("search_query".into(), "all:attention".into()),
                Matcher::UrlEncoded("max_results".into(), "3".into()),
            ]))
            .with_status(200)
            .with_body(FEED)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let tools = testing::context(dir.path()).with_endpoints(endpoints(&server));
        let out = tools.arxiv_search("attention").await.unwrap();

        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(
            value["arxiv_results"],
            "<Document source=\"http://arxiv.org/abs/1706.03762v7\" page=\"\"/>\n\
             Attention Is All You Need\n\nThe dominant sequence transduction models & more.\n\
             </Document>"
        );
    }

    #[tokio::test]
    async fn test_wiki_search_fetches_each_page() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/w/api.php")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("list".into(), "search".into()),
                Matcher::UrlEncoded("srsearch".into(), "Mercedes Sosa".into()),
            ]))
            .with_body(r#"{"query": {"search": [{"title": "Mercedes Sosa"}, {"title": "Cantora"}]}}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/w/api.php")
            .match_query(Matcher::UrlEncoded("titles".into(), "Mercedes Sosa".into()))
            .with_body(
                r#"{"query": {"pages": [{"title": "Mercedes Sosa", "extract": "Argentine singer.",
                    "fullurl": "https://en.wikipedia.org/wiki/Mercedes_Sosa"}]}}"#,
            )
            .create_async()
            .await;
        server
            .mock("GET", "/w/api.php")
            .match_query(Matcher::UrlEncoded("titles".into(), "Cantora".into()))
            .with_body(
                r#"{"query": {"pages": [{"title": "Cantora", "extract": "An album.",
                    "fullurl": "https://en.wikipedia.org/wiki/Cantora"}]}}"#,
            )
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let tools = testing::context(dir.path()).with_endpoints(endpoints(&server));
        let out = tools.wiki_search("Mercedes Sosa").await.unwrap();

        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        let text = value["wiki_results"].as_str().unwrap();
        let docs: Vec<&str> = text.split(SEPARATOR).collect();
        assert_eq!(docs.len(), 2);
        assert!(docs[0].starts_with(
            "<Document source=\"https://en.wikipedia.org/wiki/Mercedes_Sosa\" page=\"\"/>"
        ));
        assert!(docs[1].contains("An album."));
    }

    #[tokio::test]
    async fn test_web_search_requires_key() {
        let dir = tempfile::tempdir().unwrap();
        let err = testing::context(dir.path())
            .web_search("anything")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("TAVILY_API_KEY"));
    }

    #[tokio::test]
    async fn test_web_search_formats_results() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/search")
            .match_header("authorization", "Bearer tvly-test")
            .match_body(Matcher::Json(json!({"query": "rust", "max_results": 3})))
            .with_body(
                r#"{"results": [{"url": "https://rust-lang.org", "title": "Rust",
                    "content": "A language.", "score": 0.5}]}"#,
            )
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let tools = testing::context(dir.path())
            .with_endpoints(endpoints(&server))
            .with_tavily_api_key("tvly-test");
        let out = tools.web_search("rust").await.unwrap();

        mock.assert_async().await;
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(
            value["web_results"],
            "<Document source=\"https://rust-lang.org\" title=\"Rust\" score=\"0.5\"/>\nA language.\n</Document>"
        );
    }
}
