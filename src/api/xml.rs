//! Parsing of the XML documents returned by the classic API.

use std::collections::BTreeSet;

use roxmltree::{Document, Node};
use tracing::warn;

use crate::audit::{entities::UsageRecord, error::LookupError};

/// Serial numbers of every `computer` element in an inventory document. Computers can be listed
/// several times (once per installed version), the result has each serial number once, sorted.
pub fn parse_serial_numbers(document: &str) -> Result<Vec<String>, LookupError> {
    let document = Document::parse(document)?;
    let mut serial_numbers = BTreeSet::new();

    for computer in document.descendants().filter(|n| n.has_tag_name("computer")) {
        let serial_number = child(computer, "serial_number")?;
        match serial_number.text().map(str::trim) {
            Some(v) if !v.is_empty() => {
                serial_numbers.insert(v.to_string());
            }
            _ => warn!(
                "Skipping computer without a serial number (id {})",
                child_text(computer, "id").unwrap_or("unknown")
            ),
        }
    }

    Ok(serial_numbers.into_iter().collect())
}

/// Every usage entry in `document` that belongs to `application`, in document order.
pub fn parse_usage_records(
    document: &str,
    serial_number: &str,
    application: &str,
) -> Result<Vec<UsageRecord>, LookupError> {
    let document = Document::parse(document)?;
    let mut records = vec![];

    for usage in document.descendants().filter(|n| n.has_tag_name("usage")) {
        let date = text(child(usage, "date")?);
        let apps = child(usage, "apps")?;

        for app in apps.children().filter(|n| n.has_tag_name("app")) {
            let name = child(app, "name")?;
            if name.text() != Some(application) {
                continue;
            }

            records.push(UsageRecord {
                date: date.to_string(),
                name: application.to_string(),
                serial: serial_number.to_string(),
                version: text(child(app, "version")?).to_string(),
                foreground: counter(app, "foreground")?,
                open: counter(app, "open")?,
            });
        }
    }

    Ok(records)
}

fn child<'a, 'input>(
    parent: Node<'a, 'input>,
    element: &'static str,
) -> Result<Node<'a, 'input>, LookupError> {
    parent
        .children()
        .find(|n| n.has_tag_name(element))
        .ok_or_else(|| LookupError::MissingElement {
            parent: parent.tag_name().name().to_string(),
            element,
        })
}

fn child_text<'a>(parent: Node<'a, '_>, element: &str) -> Option<&'a str> {
    parent
        .children()
        .find(|n| n.has_tag_name(element))
        .and_then(|n| n.text())
}

fn text<'a>(node: Node<'a, '_>) -> &'a str {
    node.text().unwrap_or_default()
}

fn counter(app: Node, field: &'static str) -> Result<i64, LookupError> {
    let value = text(child(app, field)?);
    value
        .trim()
        .parse()
        .map_err(|_| LookupError::InvalidCounter {
            field,
            value: value.to_string(),
        })
}
