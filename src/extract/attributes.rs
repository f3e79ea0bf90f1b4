//! Label-based attribute lookups

use super::{css, element_text, fold_case};
use crate::record::FieldValue;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static ATTRIBUTE_ITEM: LazyLock<Selector> =
    LazyLock::new(|| css(r#"li[data-testid="attribute-item"]"#));
static ATTRIBUTE_TITLE: LazyLock<Selector> =
    LazyLock::new(|| css(r#"[data-testid="attribute-title"]"#));
static ATTRIBUTE_VALUE: LazyLock<Selector> =
    LazyLock::new(|| css(r#"[data-testid="attribute-value"]"#));
static PRESENT_MARKER: LazyLock<Selector> = LazyLock::new(|| css("svg"));

static LIST_LINE: LazyLock<Selector> = LazyLock::new(|| css("sd-card .textlist li"));
static LIST_KEY: LazyLock<Selector> = LazyLock::new(|| css("span.color-grey-500"));

/// Looks up the value of a labeled attribute item
///
/// The label is matched case-insensitively and exactly against the item's
/// title element. For the first matching item:
///
/// | value cell                    | result               |
/// |-------------------------------|----------------------|
/// | has text                      | `Some(Text(text))`   |
/// | no text, contains a checkmark | `Some(Flag(true))`   |
/// | no text, no marker            | `Some(Text(""))`     |
///
/// Returns `None` when no item carries the label.
pub fn attribute_by_label(doc: &Html, label: &str) -> Option<FieldValue> {
    let wanted = fold_case(label);

    for item in doc.select(&ATTRIBUTE_ITEM) {
        let (Some(title), Some(value)) = (
            item.select(&ATTRIBUTE_TITLE).next(),
            item.select(&ATTRIBUTE_VALUE).next(),
        ) else {
            continue;
        };

        if fold_case(&element_text(title)) != wanted {
            continue;
        }

        let text = element_text(value);
        if !text.is_empty() {
            return Some(FieldValue::Text(text));
        }

        if value.select(&PRESENT_MARKER).next().is_some() {
            return Some(FieldValue::Flag(true));
        }

        return Some(FieldValue::Text(String::new()));
    }

    None
}

/// Looks up `Key: value` lines in the details list
///
/// The key is compared case-insensitively after stripping a trailing colon.
/// Returns the line with the key text removed, or `None` when the key is
/// missing or its value is empty.
pub fn keyed_list_value(doc: &Html, label: &str) -> Option<String> {
    let wanted = fold_case(label.trim());

    for line in doc.select(&LIST_LINE) {
        let Some(key_el) = line.select(&LIST_KEY).next() else {
            continue;
        };

        let key_text = element_text(key_el);
        if fold_case(key_text.trim_end_matches(':').trim()) != wanted {
            continue;
        }

        let full = element_text(line);
        let value = full.replacen(&key_text, "", 1).trim().to_string();
        return if value.is_empty() { None } else { Some(value) };
    }

    None
}

/// Checks whether any details line mentions `needle`, ignoring case
pub fn feature_present(doc: &Html, needle: &str) -> bool {
    let needle = fold_case(needle.trim());
    doc.select(&LIST_LINE)
        .any(|line| fold_case(&element_text(line)).contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attributes_page() -> Html {
        Html::parse_document(
            r#"<html><body><ul>
            <li data-testid="attribute-item">
                <div data-testid="attribute-title">Wohnfläche</div>
                <div data-testid="attribute-value">81,76 m²</div>
            </li>
            <li data-testid="attribute-item">
                <div data-testid="attribute-title">Balkon</div>
                <div data-testid="attribute-value"><svg viewBox="0 0 24 24"><path d="M1 1"/></svg></div>
            </li>
            <li data-testid="attribute-item">
                <div data-testid="attribute-title">Zustand</div>
                <div data-testid="attribute-value">  </div>
            </li>
            <li data-testid="attribute-item">
                <div data-testid="attribute-title">Ohne Wert</div>
            </li>
            </ul></body></html>"#,
        )
    }

    #[test]
    fn test_attribute_text_value() {
        let doc = attributes_page();
        assert_eq!(
            attribute_by_label(&doc, "Wohnfläche"),
            Some(FieldValue::text("81,76 m²"))
        );
    }

    #[test]
    fn test_attribute_label_is_case_insensitive() {
        let doc = attributes_page();
        assert_eq!(
            attribute_by_label(&doc, "WOHNFLÄCHE"),
            Some(FieldValue::text("81,76 m²"))
        );
    }

    #[test]
    fn test_attribute_icon_marker_is_true() {
        let doc = attributes_page();
        assert_eq!(attribute_by_label(&doc, "Balkon"), Some(FieldValue::Flag(true)));
    }

    #[test]
    fn test_attribute_present_but_empty() {
        let doc = attributes_page();
        assert_eq!(attribute_by_label(&doc, "Zustand"), Some(FieldValue::text("")));
    }

    #[test]
    fn test_attribute_not_found_is_none() {
        let doc = attributes_page();
        assert_eq!(attribute_by_label(&doc, "Terrasse"), None);
        // Items without a value cell are skipped
        assert_eq!(attribute_by_label(&doc, "Ohne Wert"), None);
    }

    #[test]
    fn test_attribute_label_must_match_exactly() {
        let doc = attributes_page();
        assert_eq!(attribute_by_label(&doc, "Wohn"), None);
    }

    fn details_page() -> Html {
        Html::parse_document(
            r#"<html><body><sd-card><ul class="textlist">
            <li><span class="color-grey-500">Böden:</span> Parkett, Fliesen</li>
            <li><span class="color-grey-500">Zustand:</span> Renoviert</li>
            <li><span class="color-grey-500">Heizung:</span></li>
            <li>Personenaufzug</li>
            </ul></sd-card></body></html>"#,
        )
    }

    #[test]
    fn test_keyed_list_value() {
        let doc = details_page();
        assert_eq!(
            keyed_list_value(&doc, "Böden"),
            Some("Parkett, Fliesen".to_string())
        );
        assert_eq!(keyed_list_value(&doc, "zustand"), Some("Renoviert".to_string()));
    }

    #[test]
    fn test_keyed_list_value_empty_or_missing() {
        let doc = details_page();
        assert_eq!(keyed_list_value(&doc, "Heizung"), None);
        assert_eq!(keyed_list_value(&doc, "Baujahr"), None);
    }

    #[test]
    fn test_feature_present() {
        let doc = details_page();
        assert!(feature_present(&doc, "aufzug"));
        assert!(feature_present(&doc, "PARKETT"));
        assert!(!feature_present(&doc, "balkon"));
    }
}
