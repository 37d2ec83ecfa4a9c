//! Rate extraction from converter pages.

use regex::Regex;
use scraper::{ElementRef, Html};

use crate::error::ExtractionError;

/// Class attribute of the element carrying the converted rate.
pub const DEFAULT_RATE_CLASS: &str = "sc-63d8b7e3-1 bMdPIi";

/// First `digits.digits` run in the rate text.
pub const DEFAULT_RATE_PATTERN: &str = r"(\d+\.\d+)";

/// Pulls a numeric rate out of a raw response body.
///
/// Implementations are pure and stateless.
pub trait RateExtractor: Send + Sync {
    /// Extract the rate from a response body.
    fn extract(&self, body: &[u8]) -> Result<f64, ExtractionError>;
}

/// Extracts the rate from the text of the first `<p>` element whose `class`
/// attribute equals a known value.
#[derive(Debug, Clone)]
pub struct MarkupRateExtractor {
    class: String,
    rate_pattern: Regex,
}

impl MarkupRateExtractor {
    /// Create an extractor looking for the given class attribute.
    pub fn new(class: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            class: class.into(),
            rate_pattern: Regex::new(DEFAULT_RATE_PATTERN)?,
        })
    }

    /// Extractor for the upstream converter page.
    pub fn standard() -> Result<Self, regex::Error> {
        Self::new(DEFAULT_RATE_CLASS)
    }

    /// Text of the rate element, each text node trimmed and concatenated.
    fn section_text(&self, document: &Html) -> Option<String> {
        document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|element| {
                let element = element.value();
                element.name() == "p" && element.attr("class") == Some(self.class.as_str())
            })
            .map(|element| element.text().map(str::trim).collect())
    }

    /// First decimal number in `text`.
    fn parse_rate(&self, text: &str) -> Option<f64> {
        self.rate_pattern
            .captures(text)
            .and_then(|captures| captures.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}

impl RateExtractor for MarkupRateExtractor {
    fn extract(&self, body: &[u8]) -> Result<f64, ExtractionError> {
        let document = Html::parse_document(&String::from_utf8_lossy(body));
        let text = self
            .section_text(&document)
            .ok_or_else(|| ExtractionError::SectionNotFound {
                class: self.class.clone(),
            })?;

        self.parse_rate(&text)
            .ok_or(ExtractionError::NoNumericRate(text))
    }
}
