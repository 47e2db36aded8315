//! Trend extraction from markup.
//!
//! The heuristic parser does not know the real structure of the trends page.
//! It collects text from generic leaf elements and keeps the ones long enough
//! to look like a topic. Expect to replace it with structure-aware selectors
//! once the page layout is known.

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{ParserConfig, TrendBatch, TrendRecord};

/// Candidates at or below this many characters are treated as page chrome.
pub const MIN_TITLE_CHARS: usize = 10;

const DEFAULT_SELECTOR: &str = "span";

/// Turns a markup document into trend records.
pub trait TrendParser: Send + Sync {
    fn parse(&self, markup: &str) -> Result<TrendBatch>;
}

/// Generic-tag, length-filtered, capped extraction.
#[derive(Debug, Clone)]
pub struct HeuristicParser {
    selector: Selector,
}

impl HeuristicParser {
    pub fn new(selector: &str) -> Result<Self> {
        let selector =
            Selector::parse(selector).map_err(|e| AppError::selector(selector, format!("{e:?}")))?;
        Ok(Self { selector })
    }

    pub fn from_config(config: &ParserConfig) -> Result<Self> {
        Self::new(&config.selector)
    }

    /// Extract trends from an already parsed document.
    ///
    /// Stops at the batch cap; candidates after the cap are never looked at.
    pub fn extract(&self, document: &Html) -> TrendBatch {
        let mut batch = TrendBatch::new();

        for element in document.select(&self.selector) {
            if !self.is_leaf(element) {
                continue;
            }

            let title = element_text(element);
            if title.chars().count() <= MIN_TITLE_CHARS {
                continue;
            }

            batch.push(TrendRecord::with_placeholder(title));
            if batch.is_full() {
                log::info!("Reached limit of {} trends during parsing", batch.len());
                break;
            }
        }

        batch
    }

    /// Whether no element below this one matches the same selector.
    fn is_leaf(&self, element: ElementRef<'_>) -> bool {
        !element
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .any(|child| self.selector.matches(&child))
    }
}

impl Default for HeuristicParser {
    fn default() -> Self {
        Self {
            selector: Selector::parse(DEFAULT_SELECTOR).expect("default selector is valid"),
        }
    }
}

impl TrendParser for HeuristicParser {
    fn parse(&self, markup: &str) -> Result<TrendBatch> {
        log::info!("Attempting to parse trends from {} bytes of markup", markup.len());
        let document = Html::parse_document(markup);
        let batch = self.extract(&document);
        log::info!("Found {} potential trends after parsing", batch.len());
        Ok(batch)
    }
}

/// Concatenated text of the element, trimmed at both ends only.
fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
