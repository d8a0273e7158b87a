//! Read-only snapshots of store state.

use serde_json::{Map, Value};

/// Escapes text for inclusion in markup.
///
/// Covers `&`, `<`, `>`, both quote characters and the no-break space.
pub fn escape_html(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			'\u{a0}' => out.push_str("&nbsp;"),
			_ => out.push(c),
		}
	}
	out
}

/// Deep-copies a value, escaping every string leaf unless `allow_html`.
///
/// Object keys are copied as they are.
pub fn snapshot(value: &Value, allow_html: bool) -> Value {
	match value {
		Value::String(s) if !allow_html => Value::String(escape_html(s)),
		Value::Array(items) => Value::Array(items.iter().map(|v| snapshot(v, allow_html)).collect()),
		Value::Object(map) => Value::Object(
			map.iter()
				.map(|(k, v)| (k.clone(), snapshot(v, allow_html)))
				.collect::<Map<String, Value>>(),
		),
		other => other.clone(),
	}
}
