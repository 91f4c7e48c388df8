use serde_json::Value;

use crate::generator::SourceError;
use crate::generator::param::StrategyParams;
use crate::generator::text::TextLines;
use crate::generator::typeable::TypeableChars;

const WIKI_QUERY: &str = ".wikipedia.org/w/api.php?action=query\
&generator=random&grnnamespace=0&grnfilterredir=nonredirects\
&prop=extracts&explaintext=1&exsectionformat=plain&format=json";

/// Random article URL: the intro only, or the first `chars` characters.
pub fn wiki_url(lang: &str, chars: Option<usize>) -> String {
    let limit = match chars {
        Some(n) => format!("&exchars={n}"),
        None => "&exintro".to_string(),
    };
    format!("https://{lang}{WIKI_QUERY}{limit}")
}

/// Pull `title` and `extract` out of an extracts query response.
pub fn parse_extract(body: &str) -> Result<(String, String), SourceError> {
    let json: Value = serde_json::from_str(body)
        .map_err(|e| SourceError::other(format!("malformed response: {e}")))?;
    let page = json
        .pointer("/query/pages")
        .and_then(Value::as_object)
        .and_then(|pages| pages.values().next())
        .ok_or_else(|| SourceError::other("response contains no page"))?;
    let title = page.get("title").and_then(Value::as_str).unwrap_or_default();
    let extract = page
        .get("extract")
        .and_then(Value::as_str)
        .ok_or_else(|| SourceError::other("page has no extract"))?;
    Ok((title.to_string(), extract.to_string()))
}

/// Text of a random Wikipedia article, made typeable for `layout`.
///
/// Params: `lang` (subdomain, default `en`), optional `chars`.
pub fn wiki_lines(params: &StrategyParams, layout: &TypeableChars) -> Result<TextLines, SourceError> {
    let lang = params.get("lang").unwrap_or("en");
    if lang.is_empty() || !lang.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(SourceError::other(format!("invalid language subdomain `{lang}`")));
    }
    let url = wiki_url(lang, params.number("chars")?);
    log::debug!("Fetching practice text from {url}");
    let body = fetch_url(&url)
        .ok_or_else(|| SourceError::other(format!("could not fetch {url}")))?;
    let (title, extract) = parse_extract(&body)?;
    TextLines::from_text(layout.convert(&format!("{title}: {extract}")))
}

#[cfg(feature = "network")]
pub fn fetch_url(url: &str) -> Option<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .ok()?;
    let response = client.get(url).send().ok()?;
    if response.status().is_success() {
        response.text().ok()
    } else {
        log::warn!("{url} answered {}", response.status());
        None
    }
}

#[cfg(not(feature = "network"))]
pub fn fetch_url(_url: &str) -> Option<String> {
    None
}
