//! Entrance extraction from the embedded state document.
//!
//! The mapping service embeds its view state as a script-tagged JSON blob;
//! entrances for the first matched item live under a fixed path inside it.
//! Extraction is total: malformed or absent input yields an empty result,
//! never an error to the caller.

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::models::Entrance;

/// Result of scanning one page.
#[derive(Debug, Default)]
pub struct Extraction {
    /// The parsed embedded document, when one was located. Kept even when it
    /// yields zero entrances so failure rows can carry it for diagnosis.
    pub document: Option<Value>,

    /// Deduplicated entrances in first-seen order.
    pub entrances: Vec<Entrance>,
}

/// Extract entrances from page content.
///
/// Locates the embedded state document via `selector`, falling back to a
/// raw scan for an inline `"entrances"` array when no state element is
/// present (the service renders both shapes depending on the serving path).
pub fn extract(content: &str, selector: &str) -> Extraction {
    if let Some(document) = locate_state_document(content, selector) {
        let entrances = entrances_at_fixed_path(&document)
            .map(|items| parse_entrances(items))
            .unwrap_or_default();
        return Extraction {
            document: Some(document),
            entrances,
        };
    }

    match scan_inline_entrances(content) {
        Some(items) => Extraction {
            entrances: parse_entrances(&items),
            document: Some(Value::Array(items)),
        },
        None => Extraction::default(),
    }
}

/// Parse the first script element matching the configured selector as JSON.
fn locate_state_document(content: &str, selector: &str) -> Option<Value> {
    let parsed = Selector::parse(selector)
        .map_err(|e| log::warn!("invalid state selector '{selector}': {e:?}"))
        .ok()?;

    let document = Html::parse_document(content);
    let element = document.select(&parsed).next()?;
    let text: String = element.text().collect();
    serde_json::from_str(text.trim()).ok()
}

/// Navigate the fixed path `stack[0].response.items[0].entrances`.
fn entrances_at_fixed_path(document: &Value) -> Option<&Vec<Value>> {
    document
        .get("stack")?
        .get(0)?
        .get("response")?
        .get("items")?
        .get(0)?
        .get("entrances")?
        .as_array()
}

/// Raw scan for an inline entrance array in script code.
fn scan_inline_entrances(content: &str) -> Option<Vec<Value>> {
    let pattern = Regex::new(r#""entrances":\[(\{[^}]+\}(?:,\{[^}]+\})*)\]"#).ok()?;
    let captured = pattern.captures(content)?.get(1)?.as_str();
    serde_json::from_str(&format!("[{captured}]")).ok()
}

/// Convert raw entrance items into deduplicated records.
///
/// Items without coordinates are skipped. The dedup key is the entrance name
/// when present and non-blank, else the coordinate pair; the first occurrence
/// of a key wins. Nameless entrances get a synthetic sequential porch label.
fn parse_entrances(items: &[Value]) -> Vec<Entrance> {
    let mut seen = Vec::new();
    let mut entrances = Vec::new();
    let mut nameless = 0usize;

    for item in items {
        let Some(coordinates) = item.get("coordinates").and_then(Value::as_array) else {
            continue;
        };
        let (Some(lon), Some(lat)) = (
            coordinates.first().and_then(Value::as_f64),
            coordinates.get(1).and_then(Value::as_f64),
        ) else {
            continue;
        };

        let name = item.get("name").and_then(Value::as_str);
        let key = Entrance::dedup_key(name, lat, lon);
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);

        let porch = match name {
            Some(n) if !n.trim().is_empty() => n.trim().to_string(),
            _ => {
                nameless += 1;
                nameless.to_string()
            }
        };

        entrances.push(Entrance {
            porch,
            lat,
            lon,
            azimuth: item.get("azimuth").and_then(Value::as_f64),
        });
    }

    entrances
}
