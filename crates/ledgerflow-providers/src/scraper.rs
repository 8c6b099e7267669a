use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A PDF link discovered on a project's filings page, along with whatever
/// metadata the page itself exposes about it (a Document's `doc_type`/`period`
/// are seeded from this).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredPdf {
    pub source_url: String,
    pub doc_type: String,
    pub period: String,
}

/// scrape_page's output: the discovered PDFs plus a free-form info blob the
/// upload step may want (filing page title, currency, etc). Both halves of
/// the resume payload row produced by this step.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScrapeResult {
    pub pdfs: Vec<DiscoveredPdf>,
    pub pdf_info: serde_json::Value,
}

/// The `scrape_page` step's external dependency: given a project's filings
/// URL, find the PDFs on it. A 30-second ceiling applies per call; the
/// implementation is expected to enforce it via the underlying client's
/// timeout rather than the caller racing a separate deadline.
#[async_trait]
pub trait Scraper: Send + Sync {
    async fn scrape(&self, url: &str) -> Result<ScrapeResult>;
}

/// Fetches the page directly and scans it for filing links, in the manner
/// of a simple single-page ingestor rather than a crawling one — this
/// pipeline already knows the one URL it needs.
pub struct HttpScraper {
    client: reqwest::Client,
}

impl HttpScraper {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Scraper for HttpScraper {
    async fn scrape(&self, url: &str) -> Result<ScrapeResult> {
        let response = self
            .client
            .get(url)
            .timeout(std::time::Duration::from_secs(30))
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("scrape request to {url} returned {}", response.status());
        }

        let html = response.text().await?;
        let pdfs = extract_pdf_links(&html);

        tracing::info!(url, found = pdfs.len(), "scraped filings page");

        Ok(ScrapeResult {
            pdfs,
            pdf_info: serde_json::json!({ "source_page": url }),
        })
    }
}

/// Pulls `href="....pdf"` targets out of raw HTML along with the anchor
/// text, which is the best cheap signal for doc_type/period without a full
/// DOM parser.
fn extract_pdf_links(html: &str) -> Vec<DiscoveredPdf> {
    let mut out = Vec::new();
    for anchor in html.split("<a ").skip(1) {
        let Some(href_start) = anchor.find("href=\"") else { continue };
        let rest = &anchor[href_start + 6..];
        let Some(href_end) = rest.find('"') else { continue };
        let href = &rest[..href_end];
        if !href.to_ascii_lowercase().ends_with(".pdf") {
            continue;
        }

        let text = anchor
            .find('>')
            .and_then(|gt| anchor[gt + 1..].find('<').map(|lt| &anchor[gt + 1..gt + 1 + lt]))
            .unwrap_or("")
            .trim();

        let (doc_type, period) = classify_filing(text, href);
        out.push(DiscoveredPdf {
            source_url: href.to_string(),
            doc_type,
            period,
        });
    }
    out
}

fn classify_filing(anchor_text: &str, href: &str) -> (String, String) {
    let haystack = format!("{anchor_text} {href}").to_lowercase();
    let doc_type = if haystack.contains("annual") {
        "annual-report"
    } else if haystack.contains("quarter") {
        "quarterly-report"
    } else {
        "filing"
    };

    let period = haystack
        .split(|c: char| !c.is_ascii_digit())
        .find(|tok| tok.len() == 4)
        .unwrap_or("unknown")
        .to_string();

    (doc_type.to_string(), period)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_pdf_links_with_classification() {
        let html = r#"<a href="/filings/annual-2023.pdf">Annual Report 2023</a>
                       <a href="/filings/notes.html">Not a PDF</a>"#;
        let pdfs = extract_pdf_links(html);
        assert_eq!(pdfs.len(), 1);
        assert_eq!(pdfs[0].doc_type, "annual-report");
        assert_eq!(pdfs[0].period, "2023");
    }
}
