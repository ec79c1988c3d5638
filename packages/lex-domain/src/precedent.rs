use serde::{Deserialize, Serialize};

use crate::{Candidate, field};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecedentUnit {
	#[serde(alias = "rule_statement")]
	pub rule: String,
	#[serde(alias = "exact_quote")]
	pub quote: String,
	#[serde(default, alias = "paragraph_anchor")]
	pub anchor: String,
}

/// Vetted highlights attached to a practice candidate, capped at `max_units`.
///
/// Malformed entries, empty quotes and quotes longer than `max_quote_words` are skipped.
pub fn precedent_units(
	candidate: &Candidate,
	max_units: usize,
	max_quote_words: usize,
) -> Vec<PrecedentUnit> {
	let Some(raw) = candidate.fields.get(field::PRECEDENT_UNITS).and_then(|v| v.as_array())
	else {
		return Vec::new();
	};

	raw.iter()
		.filter_map(|value| serde_json::from_value::<PrecedentUnit>(value.clone()).ok())
		.filter(|unit| !unit.rule.trim().is_empty())
		.filter(|unit| {
			let words = unit.quote.split_whitespace().count();

			words > 0 && words <= max_quote_words
		})
		.take(max_units)
		.collect()
}
