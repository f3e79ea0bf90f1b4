//! willhaben.at rental apartments in Vienna

use super::{dedup_in_order, resolve_link, SiteAdapter};
use crate::extract::{attribute_by_label, block_text, css, first_text};
use crate::record::RawRecord;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

static RESULT_LINK: LazyLock<Selector> = LazyLock::new(|| {
    css(r#"a[href^="/iad/immobilien/"][data-testid^="search-result-entry-header-"]"#)
});

const SEARCH_PATH: &str = "/iad/immobilien/mietwohnungen/wien";

const PRICE: &str = r#"span[data-testid^="contact-box-price-box-price-value-"]"#;
const ADDRESS: &str = r#"div[data-testid^="object-location-address"]"#;

/// Record key and attribute label, in extraction order
const ATTRIBUTES: [(&str, &str); 22] = [
    ("objekttyp", "Objekttyp"),
    ("bautyp", "Bautyp"),
    ("zustand", "Zustand"),
    ("wohnfläche", "Wohnfläche"),
    ("grundfläche", "Grundfläche"),
    ("zimmer", "Zimmer"),
    ("stockwerk", "Stockwerk(e)"),
    ("böden", "Böden"),
    ("verfügbar", "Verfügbar"),
    ("befristung", "Befristung"),
    ("heizung", "Heizung"),
    ("einbauküche", "Einbauküche"),
    ("keller", "Keller"),
    ("abstellraum", "Abstellraum"),
    ("garage", "Garage"),
    ("carport", "Carport"),
    ("barrierefrei", "Barrierefrei"),
    ("fahrstuhl", "Fahrstuhl"),
    ("parkplatz", "Parkplatz"),
    ("balkon", "Balkon"),
    ("terrasse", "Terrasse"),
    ("teilmöbliert_/_möbliert", "Teilmöbliert / Möbliert"),
];

/// Record key and description block name
const DESCRIPTIONS: [(&str, &str); 7] = [
    ("objektbeschreibung", "Objektbeschreibung"),
    ("lage", "Lage"),
    ("ausstattung", "Ausstattung"),
    ("preis_und_detailinformation", "Preis und Detailinformation"),
    ("zusatzinformationen", "Zusatzinformationen"),
    ("sonstiges", "Sonstiges"),
    ("energieausweis_heizung", "Energieausweis/Heizung"),
];

/// Adapter for willhaben.at
#[derive(Debug, Clone)]
pub struct WillhabenAdapter {
    root: Url,
    search: Url,
}

impl WillhabenAdapter {
    pub const DEFAULT_ROOT: &'static str = "https://www.willhaben.at";

    pub fn new(root: Url) -> Result<Self, url::ParseError> {
        let search = root.join(SEARCH_PATH)?;
        Ok(Self { root, search })
    }
}

impl SiteAdapter for WillhabenAdapter {
    fn name(&self) -> &str {
        "willhaben"
    }

    fn list_page_url(&self, page: u32) -> String {
        let mut url = self.search.clone();
        url.query_pairs_mut().append_pair("page", &page.to_string());
        url.to_string()
    }

    fn extract_links(&self, list_html: &str) -> Vec<String> {
        let doc = Html::parse_document(list_html);

        let links = doc
            .select(&RESULT_LINK)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| resolve_link(href, &self.root))
            .map(String::from);

        dedup_in_order(links)
    }

    fn extract_record(&self, detail_html: &str, url: &str) -> RawRecord {
        let doc = Html::parse_document(detail_html);
        let mut record = RawRecord::new(url);

        record.insert_text("titel", first_text(&doc, "h1").unwrap_or_default());
        record.insert_text("preis", first_text(&doc, PRICE).unwrap_or_default());
        record.insert_text("address", first_text(&doc, ADDRESS).unwrap_or_default());

        for (key, label) in ATTRIBUTES {
            record.insert(key, attribute_by_label(&doc, label));
        }

        for (key, name) in DESCRIPTIONS {
            let selector = format!(r#"div[data-testid="ad-description-{}"]"#, name);
            record.insert_text(key, block_text(&doc, &selector));
        }

        record
    }
}
