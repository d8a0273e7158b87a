//! Inline style declaration lists.

/// One `name: value` pair from a `style` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
	/// Property name, trimmed.
	pub name: String,
	/// Property value, trimmed.
	pub value: String,
}

/// Parses a `style` attribute into declarations.
///
/// Empty segments and segments without a name are skipped. A later
/// declaration for the same property replaces the earlier one.
pub fn parse(source: &str) -> Vec<Declaration> {
	let mut out: Vec<Declaration> = Vec::new();
	for segment in source.split(';') {
		let Some((name, value)) = segment.split_once(':') else {
			continue;
		};
		let name = name.trim();
		if name.is_empty() {
			continue;
		}
		let decl = Declaration {
			name: name.to_string(),
			value: value.trim().to_string(),
		};
		match out.iter_mut().find(|d| d.name == decl.name) {
			Some(slot) => *slot = decl,
			None => out.push(decl),
		}
	}
	out
}

/// Serializes declarations in order as `name: value;` separated by spaces.
pub fn serialize(declarations: &[Declaration]) -> String {
	declarations
		.iter()
		.map(|d| format!("{}: {};", d.name, d.value))
		.collect::<Vec<_>>()
		.join(" ")
}

/// Two style strings are equivalent when they declare the same pairs in any order.
pub fn equivalent(a: &str, b: &str) -> bool {
	let mut left = parse(a);
	let mut right = parse(b);
	left.sort_by(|x, y| x.name.cmp(&y.name));
	right.sort_by(|x, y| x.name.cmp(&y.name));
	left == right
}
