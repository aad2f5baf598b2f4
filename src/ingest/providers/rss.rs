// src/ingest/providers/rss.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::histogram;
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use crate::ingest::normalize_text;
use crate::ingest::types::FeedProvider;
use crate::types::RawEntry;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    #[serde(rename = "category", default)]
    category: Vec<String>,
}

fn parse_rfc2822_to_unix(ts: &str) -> Option<u64> {
    OffsetDateTime::parse(ts, &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(|x| u64::try_from(x).ok())
}

/// RSS 2.0 feed provider. Parses fixture content directly, or fetches the
/// feed URL first when built with [`RssFeedProvider::from_url`].
pub struct RssFeedProvider {
    source: String,
    url: Option<String>,
    fixture: Option<String>,
    http: Option<reqwest::Client>,
}

impl RssFeedProvider {
    pub fn from_fixture(source: &str, content: &str) -> Self {
        Self {
            source: source.to_string(),
            url: None,
            fixture: Some(content.to_string()),
            http: None,
        }
    }

    pub fn from_url(source: &str, url: &str, http: reqwest::Client) -> Self {
        Self {
            source: source.to_string(),
            url: Some(url.to_string()),
            fixture: None,
            http: Some(http),
        }
    }

    fn parse(&self, xml: &str) -> Result<Vec<RawEntry>> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(xml);
        let rss: Rss =
            from_str(&xml_clean).with_context(|| format!("parsing rss for {}", self.source))?;
        let mut out = Vec::with_capacity(rss.channel.item.len());

        for it in rss.channel.item {
            let title = normalize_text(it.title.as_deref().unwrap_or_default());
            let link = it.link.unwrap_or_default().trim().to_string();
            if title.is_empty() && link.is_empty() {
                continue;
            }
            out.push(RawEntry {
                title,
                link,
                summary: normalize_text(it.description.as_deref().unwrap_or_default()),
                published_at: it.pub_date.as_deref().and_then(parse_rfc2822_to_unix),
                source: self.source.clone(),
                tags: it
                    .category
                    .iter()
                    .map(|c| normalize_text(c))
                    .filter(|c| !c.is_empty())
                    .collect(),
            });
        }

        histogram!("triage_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(out)
    }
}

/// Feeds routinely embed HTML entities the XML parser does not know; turn the
/// common ones into plain characters before parsing.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

#[async_trait]
impl FeedProvider for RssFeedProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawEntry>> {
        if let Some(fixture) = &self.fixture {
            return self.parse(fixture);
        }
        let url = self.url.as_deref().context("provider has no url")?;
        let http = self.http.as_ref().context("provider has no http client")?;
        let body = http
            .get(url)
            .send()
            .await
            .with_context(|| format!("fetching feed {url}"))?
            .error_for_status()
            .with_context(|| format!("feed {url} returned an error status"))?
            .text()
            .await
            .with_context(|| format!("reading feed body from {url}"))?;
        self.parse(&body)
    }

    fn name(&self) -> &str {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc2822_parses_and_rejects_garbage() {
        assert_eq!(
            parse_rfc2822_to_unix("Mon, 01 Jan 2024 00:00:00 GMT"),
            Some(1_704_067_200)
        );
        assert_eq!(parse_rfc2822_to_unix("not a date"), None);
    }

    #[tokio::test]
    async fn parses_items_with_categories() {
        let xml = r#"<rss version="2.0"><channel><title>Feed</title>
            <item>
                <title>Budget passes parliament</title>
                <link>https://example.com/politics/budget</link>
                <description>The annual budget passed after a long debate.</description>
                <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
                <category>Politics</category>
                <category>Economy</category>
            </item>
        </channel></rss>"#;
        let p = RssFeedProvider::from_fixture("Example", xml);
        let entries = p.fetch_latest().await.expect("parse");
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.title, "Budget passes parliament");
        assert_eq!(e.link, "https://example.com/politics/budget");
        assert_eq!(e.tags, vec!["Politics".to_string(), "Economy".to_string()]);
        assert_eq!(e.published_at, Some(1_704_067_200));
        assert_eq!(e.source, "Example");
    }

    #[tokio::test]
    async fn undeclared_html_entities_do_not_break_parsing() {
        let xml = r#"<rss version="2.0"><channel>
            <item>
                <title>Rates on hold&nbsp;&ndash; for now</title>
                <link>https://example.com/business/rates</link>
            </item>
        </channel></rss>"#;
        let p = RssFeedProvider::from_fixture("Example", xml);
        let entries = p.fetch_latest().await.expect("parse");
        assert_eq!(entries[0].title, "Rates on hold - for now");
    }
}
