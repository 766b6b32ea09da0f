//! Thin query helpers over `scraper`'s DOM: first/all descendants by
//! selector, next sibling element by tag, trimmed text content.

use crate::{ScraperError, ScraperResult};
use scraper::{ElementRef, Html, Selector};

pub fn parse_document(markup: &str) -> ScraperResult<Html> {
    if markup.trim().is_empty() {
        return Err(ScraperError::ParsingError(
            "rendered document is empty".to_string(),
        ));
    }
    Ok(Html::parse_document(markup))
}

pub fn compile(selector: &str) -> ScraperResult<Selector> {
    Selector::parse(selector).map_err(|e| {
        ScraperError::ConfigError(format!("invalid selector '{}': {}", selector, e))
    })
}

pub fn find_first<'a>(scope: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    scope.select(selector).next()
}

pub fn find_all<'a>(scope: ElementRef<'a>, selector: &Selector) -> Vec<ElementRef<'a>> {
    scope.select(selector).collect()
}

pub fn next_sibling_element<'a>(element: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    element
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|sibling| sibling.value().name() == tag)
}

pub fn trimmed_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

pub fn has_child_elements(element: ElementRef<'_>) -> bool {
    element.children().any(|child| child.value().is_element())
}
