//! immowelt.at rental apartments in Vienna

use super::{dedup_in_order, resolve_link, SiteAdapter};
use crate::extract::{
    concatenated_text, css, element_text, feature_present, first_text, fold_case,
    keyed_list_value,
};
use crate::record::{FieldValue, RawRecord, DETAILS_FIELD};
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

static ANCHOR: LazyLock<Selector> = LazyLock::new(|| css("a[href]"));

static HARDFACT: LazyLock<Selector> = LazyLock::new(|| css("app-hardfacts .hardfact"));
static HARDFACT_LABEL: LazyLock<Selector> = LazyLock::new(|| css(".hardfact__label"));
static HARDFACT_VALUE: LazyLock<Selector> =
    LazyLock::new(|| css("strong, span.has-font-300"));

static EQUIPMENT_CELL: LazyLock<Selector> =
    LazyLock::new(|| css("sd-card .equipment sd-cell-col"));
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| css("p"));

const SEARCH_PATH: &str = "/suche/wien/wohnungen/mieten?d=true&sd=DESC&sf=TIMESTAMP";
const EXPOSE_PATH: &str = "/projekte/expose/";

const TITLE: &str = "app-objectmeta h1";
const STREET: &str = r#"[data-cy="address-street"]"#;
const CITY: &str = r#"[data-cy="address-city"]"#;
const DETAIL_LINES: &str = "sd-card .textlist li";

/// Adapter for immowelt.at
#[derive(Debug, Clone)]
pub struct ImmoweltAdapter {
    root: Url,
    search: Url,
    expose_prefix: String,
}

impl ImmoweltAdapter {
    pub const DEFAULT_ROOT: &'static str = "https://www.immowelt.at";

    pub fn new(root: Url) -> Result<Self, url::ParseError> {
        let search = root.join(SEARCH_PATH)?;
        let expose_prefix = root.join(EXPOSE_PATH)?.to_string();
        Ok(Self {
            root,
            search,
            expose_prefix,
        })
    }
}

impl SiteAdapter for ImmoweltAdapter {
    fn name(&self) -> &str {
        "immowelt"
    }

    fn list_page_url(&self, page: u32) -> String {
        let mut url = self.search.clone();
        url.query_pairs_mut().append_pair("sp", &page.to_string());
        url.to_string()
    }

    fn extract_links(&self, list_html: &str) -> Vec<String> {
        let doc = Html::parse_document(list_html);

        let links = doc
            .select(&ANCHOR)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| resolve_link(href, &self.root))
            .map(String::from)
            .filter(|url| url.starts_with(&self.expose_prefix));

        dedup_in_order(links)
    }

    fn extract_record(&self, detail_html: &str, url: &str) -> RawRecord {
        let doc = Html::parse_document(detail_html);
        let mut record = RawRecord::new(url);

        record.insert_text("titel", first_text(&doc, TITLE).unwrap_or_default());
        record.insert_opt_text("preis", hardfact(&doc, "Gesamtmiete"));
        record.insert_opt_text("wohnfläche", hardfact(&doc, "Wohnfläche"));
        record.insert_opt_text("zimmer", hardfact(&doc, "Zimmer"));
        record.insert_text("address", address(&doc));
        record.insert_opt_text("stockwerk", equipment_value(&doc, "Wohnungslage"));
        record.insert_opt_text("verfügbar", equipment_value(&doc, "Bezug"));
        record.insert_opt_text("heizung", keyed_list_value(&doc, "Heizungsart"));
        record.insert(
            "barrierefrei",
            Some(FieldValue::Flag(feature_present(&doc, "barrierefrei"))),
        );
        record.insert_text(DETAILS_FIELD, concatenated_text(&doc, DETAIL_LINES));

        record
    }
}

/// Value of the hard fact whose label contains `label`
fn hardfact(doc: &Html, label: &str) -> Option<String> {
    let wanted = fold_case(label);
    doc.select(&HARDFACT)
        .find(|fact| {
            fact.select(&HARDFACT_LABEL)
                .next()
                .is_some_and(|l| fold_case(&element_text(l)).contains(&wanted))
        })
        .and_then(|fact| fact.select(&HARDFACT_VALUE).next())
        .map(element_text)
}

fn address(doc: &Html) -> String {
    [first_text(doc, STREET), first_text(doc, CITY)]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Second paragraph of the equipment cell whose first paragraph is `label`
fn equipment_value(doc: &Html, label: &str) -> Option<String> {
    let wanted = fold_case(label);
    for cell in doc.select(&EQUIPMENT_CELL) {
        let paragraphs: Vec<_> = cell.select(&PARAGRAPH).collect();
        if paragraphs.len() < 2 {
            continue;
        }
        if fold_case(&element_text(paragraphs[0])) == wanted {
            return Some(element_text(paragraphs[1]));
        }
    }
    None
}
