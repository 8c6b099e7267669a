use std::sync::LazyLock;

use regex::Regex;

/// `https://<host>/stock-share-price/<slug>/<code>/<id>/financials-annual-reports/`
static FILINGS_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https://[^/]+/stock-share-price/(?P<slug>[a-z0-9-]+)/[A-Za-z0-9]+/[A-Za-z0-9]+/financials-annual-reports/$",
    )
    .expect("valid regex")
});

/// Validates a caller-supplied filings URL against the fixed pattern.
/// Returns the `<slug>` segment on success so the caller can derive the
/// display name without re-parsing.
pub fn validate(url: &str) -> Result<String, String> {
    FILINGS_URL_RE
        .captures(url)
        .map(|caps| caps["slug"].to_string())
        .ok_or_else(|| format!("url does not match the required filings-page pattern: {url}"))
}

/// Company name is derived from `<slug>` by replacing `-` with space and
/// upper-casing.
pub fn company_name_from_slug(slug: &str) -> String {
    slug.replace('-', " ").to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_filings_url() {
        let url = "https://example.com/stock-share-price/acme-corp/ACME/123/financials-annual-reports/";
        let slug = validate(url).expect("should validate");
        assert_eq!(slug, "acme-corp");
        assert_eq!(company_name_from_slug(&slug), "ACME CORP");
    }

    #[test]
    fn rejects_missing_trailing_segment() {
        let url = "https://example.com/stock-share-price/acme-corp/ACME/123/";
        assert!(validate(url).is_err());
    }

    #[test]
    fn rejects_non_https() {
        let url = "http://example.com/stock-share-price/acme-corp/ACME/123/financials-annual-reports/";
        assert!(validate(url).is_err());
    }
}
