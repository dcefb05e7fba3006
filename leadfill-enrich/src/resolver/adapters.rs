//! Response shape adapters
//!
//! Upstream APIs return the same contact in several payload shapes. Each
//! strategy lists the shapes it knows as an ordered slice of
//! [`ShapeAdapter`]s; [`apply_adapters`] returns the first recognized shape.
//!
//! Adapter contract:
//! - `None`: the shape is not present in this body
//! - `Some(empty fragment)`: shape present, no contact in it (no match)
//! - `Some(fragment)`: shape present with contact fields

use serde_json::Value;

use super::StrategyError;
use crate::models::ContactFragment;

/// Pure function from a raw response body to an optional contact fragment
pub type ShapeAdapter = fn(&Value) -> Option<ContactFragment>;

/// Field names carrying an email address, in preference order
pub const EMAIL_ALIASES: &[&str] = &["email", "agent_email", "primary_email", "work_email"];

/// Field names carrying a phone number, in preference order
pub const PHONE_ALIASES: &[&str] = &[
    "phone",
    "agent_phone",
    "phone_number",
    "mobile_phone",
    "sanitized_phone",
    "office_phone",
];

/// List of phone-number objects (Apollo style)
const PHONE_LIST_FIELD: &str = "phone_numbers";

/// Fields inside one phone-number object
const PHONE_NUMBER_FIELDS: &[&str] = &["number", "sanitized_number", "raw_number"];

/// Run adapters in order; stop at the first recognized shape
pub fn apply_adapters(
    body: &Value,
    adapters: &[ShapeAdapter],
) -> Result<ContactFragment, StrategyError> {
    adapters
        .iter()
        .find_map(|adapter| adapter(body))
        .ok_or_else(|| {
            StrategyError::MalformedResponse(format!(
                "no known payload shape in response: {}",
                truncate(&body.to_string(), 200)
            ))
        })
}

/// First non-blank scalar among `aliases` on `obj`
///
/// Strings are trimmed; numbers are rendered as written. Absent, `null` and
/// blank values are skipped.
pub fn pick_field(obj: &Value, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|alias| scalar_text(obj.get(*alias)?))
}

/// Phone from direct aliases, else the first usable `phone_numbers` entry
pub fn pick_phone(obj: &Value) -> Option<String> {
    pick_field(obj, PHONE_ALIASES).or_else(|| {
        obj.get(PHONE_LIST_FIELD)?
            .as_array()?
            .iter()
            .find_map(|entry| match entry {
                Value::Object(_) => pick_field(entry, PHONE_NUMBER_FIELDS),
                other => scalar_text(other),
            })
    })
}

/// Contact fields of one JSON object; `null` or non-objects give an empty fragment
pub fn contact_from_object(obj: &Value) -> ContactFragment {
    if !obj.is_object() {
        return ContactFragment::default();
    }
    ContactFragment::new(pick_field(obj, EMAIL_ALIASES), pick_phone(obj))
}

/// Shape: `{ "<key>": { ...contact fields... } }`
///
/// A present `null` means "no match"; any other non-object value is not this shape.
pub fn object_at(body: &Value, key: &str) -> Option<ContactFragment> {
    let value = body.get(key)?;
    match value {
        Value::Null => Some(ContactFragment::default()),
        Value::Object(_) => Some(contact_from_object(value)),
        _ => None,
    }
}

/// Shape: `{ "<key>": [ { ...contact fields... }, ... ] }`, first element wins
///
/// An empty list or `null` means "no match".
pub fn first_in_list(body: &Value, key: &str) -> Option<ContactFragment> {
    match body.get(key)? {
        Value::Null => Some(ContactFragment::default()),
        Value::Array(items) => Some(items.first().map(contact_from_object).unwrap_or_default()),
        _ => None,
    }
}

/// Shape: contact fields directly on the top-level object
///
/// Recognized when any email/phone alias key is present, even as `null`.
pub fn top_level(body: &Value) -> Option<ContactFragment> {
    let obj = body.as_object()?;
    let has_contact_key = EMAIL_ALIASES
        .iter()
        .chain(PHONE_ALIASES)
        .chain(std::iter::once(&PHONE_LIST_FIELD))
        .any(|k| obj.contains_key(*k));
    has_contact_key.then(|| contact_from_object(body))
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
