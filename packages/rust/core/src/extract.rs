//! Article extraction from saved pages.
//!
//! Article pages embed their content as a Next.js state blob
//! (`<script id="__NEXT_DATA__">`). The article itself lives under
//! `props.pageProps.cp2Content`; its body is an ordered list of blocks, each
//! tagged by a `type` string.

use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;

use econpub_shared::{EconpubError, Result};

/// Script element holding the embedded page state.
const NEXT_DATA_SELECTOR: &str = "script#__NEXT_DATA__";

// ---------------------------------------------------------------------------
// Public model
// ---------------------------------------------------------------------------

/// Outcome of looking for article content in a saved page.
#[derive(Debug, Clone)]
pub enum Extracted {
    Article(ArticleContent),
    /// The page carries no embedded article state (podcasts, interactive pieces, ...).
    Unsupported,
}

/// One parsed article.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleContent {
    pub headline: String,
    /// Subheading ("rubric"); empty when absent.
    pub rubric: String,
    /// Section name; empty when absent.
    pub section: String,
    /// Headline used in the print edition; empty when absent.
    pub print_headline: String,
    /// URL of the lead image, if the article has one.
    pub lead_image: Option<String>,
    pub body: Vec<ContentBlock>,
}

impl ArticleContent {
    /// The italic line under the rubric: `section - print headline`.
    ///
    /// When only one part is present it stands alone; when both are empty there
    /// is no line. An empty section never hides the print headline.
    pub fn section_line(&self) -> Option<String> {
        let section = self.section.trim();
        let print_headline = self.print_headline.trim();

        match (section.is_empty(), print_headline.is_empty()) {
            (true, true) => None,
            (false, true) => Some(section.to_string()),
            (true, false) => Some(print_headline.to_string()),
            (false, false) => Some(format!("{section} - {print_headline}")),
        }
    }
}

/// One structural unit of an article body.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    /// In-body heading.
    Crosshead { text: String },
    Image { url: String },
    /// Interactive chart; only its static fallback image is kept.
    Infographic { fallback_url: String },
    /// Section break.
    Divider,
    /// Third-party embed; dropped.
    GenericEmbed,
    /// Sidebar box; dropped.
    Infobox,
    /// Any other block carrying a rich-text HTML fragment.
    Text { html: String },
    /// Neither a known type nor an HTML fragment.
    Unrecognized { kind: Option<String> },
}

impl ContentBlock {
    /// Classify a raw body block by its `type` discriminator.
    ///
    /// Known types missing their payload are parse errors. Blocks of any other
    /// type fall back to their `textHtml` fragment, or to [`ContentBlock::Unrecognized`].
    pub fn classify(block: &Value) -> Result<Self> {
        let kind = block.get("type").and_then(Value::as_str);

        let classified = match kind {
            Some("INFOBOX") => Self::Infobox,
            Some("CROSSHEAD") => Self::Crosshead {
                text: required_str(block, "text", "CROSSHEAD")?,
            },
            Some("IMAGE") => Self::Image {
                url: required_str(block, "url", "IMAGE")?,
            },
            Some("INFOGRAPHIC") => {
                let fallback_url = block
                    .get("fallback")
                    .and_then(|f| f.get("url"))
                    .and_then(Value::as_str)
                    .ok_or_else(|| EconpubError::parse("INFOGRAPHIC block without fallback.url"))?;
                Self::Infographic {
                    fallback_url: fallback_url.to_string(),
                }
            }
            Some("DIVIDER") => Self::Divider,
            Some("GENERIC_EMBED") => Self::GenericEmbed,
            _ => match block.get("textHtml").and_then(Value::as_str) {
                Some(html) => Self::Text {
                    html: html.to_string(),
                },
                None => Self::Unrecognized {
                    kind: kind.map(str::to_string),
                },
            },
        };

        Ok(classified)
    }
}

fn required_str(block: &Value, field: &str, kind: &str) -> Result<String> {
    block
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| EconpubError::parse(format!("{kind} block without '{field}'")))
}

// ---------------------------------------------------------------------------
// Embedded state
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct NextData {
    props: Props,
}

#[derive(Debug, Deserialize)]
struct Props {
    #[serde(rename = "pageProps")]
    page_props: PageProps,
}

#[derive(Debug, Deserialize)]
struct PageProps {
    #[serde(rename = "cp2Content", default)]
    cp2_content: Option<RawArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    #[serde(default)]
    headline: Option<String>,
    #[serde(default)]
    rubric: Option<String>,
    #[serde(default)]
    section: Option<RawSection>,
    #[serde(default)]
    print_headline: Option<String>,
    #[serde(default)]
    lead_component: Option<Value>,
    #[serde(default)]
    body: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawSection {
    #[serde(default)]
    name: Option<String>,
}

/// Parse a saved article page.
///
/// Returns [`Extracted::Unsupported`] when the page has no embedded state or
/// the state holds no article. Malformed state is an error.
pub fn extract_article(html: &str) -> Result<Extracted> {
    let doc = Html::parse_document(html);
    let selector = Selector::parse(NEXT_DATA_SELECTOR).unwrap();

    let Some(script) = doc.select(&selector).next() else {
        return Ok(Extracted::Unsupported);
    };

    let json: String = script.text().collect();
    let state: NextData = serde_json::from_str(&json)
        .map_err(|e| EconpubError::parse(format!("invalid embedded page state: {e}")))?;

    let Some(raw) = state.props.page_props.cp2_content else {
        return Ok(Extracted::Unsupported);
    };

    let headline = raw
        .headline
        .filter(|h| !h.trim().is_empty())
        .ok_or_else(|| EconpubError::parse("article has no headline"))?;

    let lead_image = raw
        .lead_component
        .as_ref()
        .and_then(|c| c.get("url"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let body = raw
        .body
        .iter()
        .map(ContentBlock::classify)
        .collect::<Result<Vec<_>>>()?;

    Ok(Extracted::Article(ArticleContent {
        headline,
        rubric: raw.rubric.unwrap_or_default(),
        section: raw.section.and_then(|s| s.name).unwrap_or_default(),
        print_headline: raw.print_headline.unwrap_or_default(),
        lead_image,
        body,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page_with_state(state: &Value) -> String {
        format!(
            r#"<html><head><title>x</title></head><body><div id="__next"></div>
<script id="__NEXT_DATA__" type="application/json">{state}</script></body></html>"#
        )
    }

    fn article_state(content: Value) -> Value {
        json!({ "props": { "pageProps": { "cp2Content": content } }, "page": "/[...slug]" })
    }

    #[test]
    fn extracts_full_article() {
        let html = page_with_state(&article_state(json!({
            "headline": "The world this week",
            "rubric": "Politics",
            "section": { "name": "The world this week", "id": "/content/abc" },
            "printHeadline": "Politics",
            "leadComponent": { "type": "IMAGE", "url": "https://cdn.example.com/lead.jpg", "width": 1280 },
            "body": [
                { "type": "PARAGRAPH", "textHtml": "<p>First.</p>" },
                { "type": "CROSSHEAD", "text": "Elsewhere" },
                { "type": "IMAGE", "url": "https://cdn.example.com/inline.jpg" },
                { "type": "INFOGRAPHIC", "url": "https://interactive", "fallback": { "url": "https://cdn.example.com/fallback.png" } },
                { "type": "DIVIDER" },
                { "type": "GENERIC_EMBED", "embed": { "html": "<iframe/>" } },
                { "type": "INFOBOX", "components": [] }
            ]
        })));

        let Extracted::Article(article) = extract_article(&html).unwrap() else {
            panic!("expected article");
        };

        assert_eq!(article.headline, "The world this week");
        assert_eq!(article.rubric, "Politics");
        assert_eq!(article.section, "The world this week");
        assert_eq!(article.lead_image.as_deref(), Some("https://cdn.example.com/lead.jpg"));
        assert_eq!(
            article.body,
            vec![
                ContentBlock::Text { html: "<p>First.</p>".into() },
                ContentBlock::Crosshead { text: "Elsewhere".into() },
                ContentBlock::Image { url: "https://cdn.example.com/inline.jpg".into() },
                ContentBlock::Infographic { fallback_url: "https://cdn.example.com/fallback.png".into() },
                ContentBlock::Divider,
                ContentBlock::GenericEmbed,
                ContentBlock::Infobox,
            ]
        );
    }

    #[test]
    fn nulls_become_empty() {
        let html = page_with_state(&article_state(json!({
            "headline": "Bare",
            "rubric": null,
            "section": null,
            "printHeadline": null,
            "leadComponent": null,
            "body": []
        })));

        let Extracted::Article(article) = extract_article(&html).unwrap() else {
            panic!("expected article");
        };
        assert_eq!(article.rubric, "");
        assert_eq!(article.section, "");
        assert_eq!(article.print_headline, "");
        assert_eq!(article.lead_image, None);
        assert!(article.body.is_empty());
    }

    #[test]
    fn page_without_state_is_unsupported() {
        let html = "<html><body><h1>A podcast</h1></body></html>";
        assert!(matches!(extract_article(html).unwrap(), Extracted::Unsupported));
    }

    #[test]
    fn state_without_article_is_unsupported() {
        let html = page_with_state(&json!({ "props": { "pageProps": { "cp2Content": null } } }));
        assert!(matches!(extract_article(&html).unwrap(), Extracted::Unsupported));
    }

    #[test]
    fn malformed_state_is_error() {
        let html = r#"<script id="__NEXT_DATA__">{not json</script>"#;
        assert!(matches!(extract_article(html), Err(EconpubError::Parse { .. })));

        let html = page_with_state(&json!({ "props": {} }));
        assert!(matches!(extract_article(&html), Err(EconpubError::Parse { .. })));
    }

    #[test]
    fn missing_headline_is_error() {
        let html = page_with_state(&article_state(json!({ "body": [] })));
        assert!(matches!(extract_article(&html), Err(EconpubError::Parse { .. })));
    }

    #[test]
    fn classify_falls_back_to_text_html() {
        let block = json!({ "type": "BLOCK_QUOTE", "textHtml": "<q>Quote</q>" });
        assert_eq!(
            ContentBlock::classify(&block).unwrap(),
            ContentBlock::Text { html: "<q>Quote</q>".into() }
        );

        // No type at all, but a fragment: still text.
        let block = json!({ "textHtml": "<p>x</p>" });
        assert!(matches!(ContentBlock::classify(&block).unwrap(), ContentBlock::Text { .. }));
    }

    #[test]
    fn classify_known_type_wins_over_text_html() {
        let block = json!({ "type": "CROSSHEAD", "text": "Heading", "textHtml": "<p>ignored</p>" });
        assert_eq!(
            ContentBlock::classify(&block).unwrap(),
            ContentBlock::Crosshead { text: "Heading".into() }
        );
    }

    #[test]
    fn classify_unrecognized() {
        let block = json!({ "type": "VIDEO", "src": "https://video" });
        assert_eq!(
            ContentBlock::classify(&block).unwrap(),
            ContentBlock::Unrecognized { kind: Some("VIDEO".into()) }
        );

        let block = json!({ "something": 1 });
        assert_eq!(
            ContentBlock::classify(&block).unwrap(),
            ContentBlock::Unrecognized { kind: None }
        );
    }

    #[test]
    fn classify_known_type_missing_payload_is_error() {
        assert!(ContentBlock::classify(&json!({ "type": "IMAGE" })).is_err());
        assert!(ContentBlock::classify(&json!({ "type": "CROSSHEAD" })).is_err());
        assert!(ContentBlock::classify(&json!({ "type": "INFOGRAPHIC", "fallback": {} })).is_err());
    }

    #[test]
    fn section_line_combinations() {
        let mut article = ArticleContent {
            headline: "h".into(),
            section: "Leaders".into(),
            print_headline: "A better way".into(),
            ..Default::default()
        };
        assert_eq!(article.section_line().as_deref(), Some("Leaders - A better way"));

        // An empty section keeps the print headline.
        article.section.clear();
        assert_eq!(article.section_line().as_deref(), Some("A better way"));

        article.print_headline.clear();
        assert_eq!(article.section_line(), None);

        article.section = "Leaders".into();
        assert_eq!(article.section_line().as_deref(), Some("Leaders"));
    }
}
