use super::document::{
    compile, find_all, find_first, has_child_elements, next_sibling_element, parse_document,
    trimmed_text,
};
use crate::core::panic_message;
use crate::profile::{ProfileRecord, Role, PAGE_TITLE_KEY};
use crate::{ScraperError, ScraperResult};
use log::{debug, trace};
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

/// CSS selectors and labels describing where each field lives on a profile
/// page. The defaults match the showcase site's markup.
#[derive(Debug, Clone)]
pub struct ProfileLayout {
    pub company_name: String,
    pub detail_container: String,
    pub city_label: String,
    pub registration_label: String,
    pub bio: String,
    pub founder_block: String,
    pub founder_name: String,
    pub cofounder_block: String,
    pub cofounder_name: String,
    pub attribute_container: String,
    pub attribute_card: String,
    pub attribute_heading: String,
    pub attribute_text: String,
    pub recognition_container: String,
    pub recognition_section: String,
    pub recognition_title: String,
}

impl Default for ProfileLayout {
    fn default() -> Self {
        Self {
            company_name: "h3.startup-name".to_string(),
            detail_container: "div.d-flex.flex-column.profile-details".to_string(),
            city_label: "City".to_string(),
            registration_label: "DIPP Number".to_string(),
            bio: "div.professional-bio-description".to_string(),
            founder_block: "div.row-one.no-gutters.d-flex".to_string(),
            founder_name: "div.founder-name".to_string(),
            cofounder_block: "div.card.border-0.co-founders.clearfix".to_string(),
            cofounder_name: "div.co-founder-name".to_string(),
            attribute_container: "article.other-detail-article".to_string(),
            attribute_card: "div.startup-info".to_string(),
            attribute_heading: "div.heading".to_string(),
            attribute_text: "div.text".to_string(),
            recognition_container: "article.award-certificate-wrapper".to_string(),
            recognition_section: "div.sub-box".to_string(),
            recognition_title: "h4.award-ttl".to_string(),
        }
    }
}

struct Selectors {
    company_name: Selector,
    detail_container: Selector,
    bio: Selector,
    founder_block: Selector,
    founder_name: Selector,
    cofounder_block: Selector,
    cofounder_name: Selector,
    attribute_container: Selector,
    attribute_card: Selector,
    attribute_heading: Selector,
    attribute_text: Selector,
    recognition_container: Selector,
    recognition_section: Selector,
    recognition_title: Selector,
    div: Selector,
    list: Selector,
    list_item: Selector,
    title: Selector,
}

/// Turns a rendered profile page into a [`ProfileRecord`].
///
/// Every field is looked up independently; a field whose markup is missing
/// is simply left absent. Extraction only reads the document, so the same
/// tree always yields the same record.
pub struct ProfileExtractor {
    selectors: Selectors,
    city_label: String,
    registration_label: String,
}

impl ProfileExtractor {
    pub fn new() -> ScraperResult<Self> {
        Self::with_layout(&ProfileLayout::default())
    }

    pub fn with_layout(layout: &ProfileLayout) -> ScraperResult<Self> {
        let selectors = Selectors {
            company_name: compile(&layout.company_name)?,
            detail_container: compile(&layout.detail_container)?,
            bio: compile(&layout.bio)?,
            founder_block: compile(&layout.founder_block)?,
            founder_name: compile(&layout.founder_name)?,
            cofounder_block: compile(&layout.cofounder_block)?,
            cofounder_name: compile(&layout.cofounder_name)?,
            attribute_container: compile(&layout.attribute_container)?,
            attribute_card: compile(&layout.attribute_card)?,
            attribute_heading: compile(&layout.attribute_heading)?,
            attribute_text: compile(&layout.attribute_text)?,
            recognition_container: compile(&layout.recognition_container)?,
            recognition_section: compile(&layout.recognition_section)?,
            recognition_title: compile(&layout.recognition_title)?,
            div: compile("div")?,
            list: compile("ul")?,
            list_item: compile("li")?,
            title: compile("title")?,
        };

        Ok(Self {
            selectors,
            city_label: layout.city_label.clone(),
            registration_label: layout.registration_label.clone(),
        })
    }

    /// Parses rendered markup and extracts a record for `source_url`.
    ///
    /// The document never leaves this call, and a panic inside any rule is
    /// reported as an extraction error instead of unwinding into the task.
    pub fn extract_markup(&self, source_url: &str, markup: &str) -> ScraperResult<ProfileRecord> {
        let document = parse_document(markup)?;
        trace!("Parsed {} bytes of markup for {}", markup.len(), source_url);

        panic::catch_unwind(AssertUnwindSafe(|| self.extract(source_url, &document))).map_err(
            |payload| ScraperError::ExtractionError(panic_message("extractor", payload.as_ref())),
        )
    }

    pub fn extract(&self, source_url: &str, document: &Html) -> ProfileRecord {
        let root = document.root_element();

        let record = ProfileRecord {
            source_url: source_url.to_string(),
            company_name: self.company_name(root),
            city: self.labeled_value(root, &self.city_label),
            registration_id: self.labeled_value(root, &self.registration_label),
            bio: self.bio(root),
            team: self.team(root),
            attributes: self.attributes(root),
            recognitions: self.recognitions(root),
            metadata: self.metadata(root),
        };

        debug!(
            "Extracted {}: company={:?}, {} attributes, {} recognition groups",
            source_url,
            record.company_name,
            record.attributes.len(),
            record.recognitions.len()
        );
        record
    }

    fn company_name(&self, root: ElementRef<'_>) -> Option<String> {
        find_first(root, &self.selectors.company_name).map(trimmed_text)
    }

    /// First container holding a leaf `div` labelled exactly `label` wins;
    /// the value is that label's next `div` sibling.
    fn labeled_value(&self, root: ElementRef<'_>, label: &str) -> Option<String> {
        for container in find_all(root, &self.selectors.detail_container) {
            let label_div = container
                .select(&self.selectors.div)
                .find(|div| !has_child_elements(*div) && trimmed_text(*div) == label);

            if let Some(label_div) = label_div {
                return next_sibling_element(label_div, "div").map(trimmed_text);
            }
        }
        None
    }

    fn bio(&self, root: ElementRef<'_>) -> Option<String> {
        find_first(root, &self.selectors.bio).map(trimmed_text)
    }

    fn team(&self, root: ElementRef<'_>) -> BTreeMap<Role, String> {
        let mut team = BTreeMap::new();

        let founder = find_first(root, &self.selectors.founder_block)
            .and_then(|block| find_first(block, &self.selectors.founder_name));
        if let Some(name) = founder {
            team.insert(Role::Founder, trimmed_text(name));
        }

        let cofounder = find_first(root, &self.selectors.cofounder_block)
            .and_then(|block| find_first(block, &self.selectors.cofounder_name));
        if let Some(name) = cofounder {
            team.insert(Role::Cofounder, trimmed_text(name));
        }

        team
    }

    fn attributes(&self, root: ElementRef<'_>) -> BTreeMap<String, String> {
        let mut attributes = BTreeMap::new();
        let Some(container) = find_first(root, &self.selectors.attribute_container) else {
            return attributes;
        };

        for card in find_all(container, &self.selectors.attribute_card) {
            let heading = find_first(card, &self.selectors.attribute_heading);
            let text = find_first(card, &self.selectors.attribute_text);
            if let (Some(heading), Some(text)) = (heading, text) {
                attributes.insert(trimmed_text(heading).to_lowercase(), trimmed_text(text));
            }
        }

        attributes
    }

    /// Sections with a title but no list items are left out.
    fn recognitions(&self, root: ElementRef<'_>) -> BTreeMap<String, Vec<String>> {
        let mut recognitions = BTreeMap::new();
        let Some(container) = find_first(root, &self.selectors.recognition_container) else {
            return recognitions;
        };

        for section in find_all(container, &self.selectors.recognition_section) {
            let Some(title) = find_first(section, &self.selectors.recognition_title) else {
                continue;
            };

            let items: Vec<String> = match find_first(section, &self.selectors.list) {
                Some(_) => section
                    .select(&self.selectors.list_item)
                    .map(trimmed_text)
                    .collect(),
                None => Vec::new(),
            };

            if !items.is_empty() {
                recognitions.insert(trimmed_text(title).to_lowercase(), items);
            }
        }

        recognitions
    }

    fn metadata(&self, root: ElementRef<'_>) -> BTreeMap<String, String> {
        let mut metadata = BTreeMap::new();
        if let Some(title) = find_first(root, &self.selectors.title) {
            metadata.insert(PAGE_TITLE_KEY.to_string(), trimmed_text(title));
        }
        metadata
    }
}
