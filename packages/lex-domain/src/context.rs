use time::Date;

use crate::{
	IndexKind, PracticeCategory, ScoredResult, date_serde, field,
	precedent::{self, PrecedentUnit},
};

pub const NORMATIVE_SEPARATOR: &str = "\n\n";
pub const PRACTICE_SEPARATOR: &str = "\n\n---\n\n";

const MISSING: &str = "n/a";

#[derive(Debug, Clone, Copy)]
pub struct PracticeFormat {
	pub max_units: usize,
	pub quote_max_words: usize,
}

pub fn format_normative(results: &[ScoredResult]) -> String {
	results
		.iter()
		.filter(|result| result.candidate.index_kind == IndexKind::Normative)
		.enumerate()
		.map(|(idx, result)| {
			let candidate = &result.candidate;
			let labels: Vec<&str> = [field::CATEGORY, field::SOURCE]
				.into_iter()
				.filter_map(|key| candidate.field_str(key))
				.collect();
			let header = if labels.is_empty() {
				candidate.title.clone()
			} else {
				format!("{} ({})", candidate.title, labels.join(", "))
			};

			format!("[{}] {header}: {}", idx + 1, candidate.content_text.trim())
		})
		.collect::<Vec<_>>()
		.join(NORMATIVE_SEPARATOR)
}

pub fn format_practice(results: &[ScoredResult], format: &PracticeFormat) -> String {
	results
		.iter()
		.filter(|result| result.candidate.index_kind == IndexKind::Practice)
		.enumerate()
		.map(|(idx, result)| practice_block(idx + 1, result, format))
		.collect::<Vec<_>>()
		.join(PRACTICE_SEPARATOR)
}

pub fn temporal_disclaimer(reference_date: Option<Date>) -> String {
	match reference_date {
		Some(date) => format!(
			"Note: legislation above was filtered for validity on {}; later amendments are not reflected.",
			date_serde::format_date(date)
		),
		None => "Note: legislation above reflects the currently effective version; no reference date was given."
			.to_string(),
	}
}

fn practice_block(number: usize, result: &ScoredResult, format: &PracticeFormat) -> String {
	let candidate = &result.candidate;
	let category = candidate.field_str(field::CATEGORY);
	let court = match (candidate.field_str(field::COURT_TYPE), candidate.field_str(field::COURT_NAME))
	{
		(Some(kind), Some(name)) => format!("{kind} / {name}"),
		(Some(value), None) | (None, Some(value)) => value.to_string(),
		(None, None) => MISSING.to_string(),
	};
	let mut lines = vec![
		format!("[Practice {number}]"),
		format!("Source: {}", jurisdiction_tag(result)),
		format!("Category: {}", category.unwrap_or(MISSING)),
		format!("Court: {court}"),
		format!("Case: {}", candidate.title.trim()),
		format!("Decision date: {}", candidate.field_str(field::DECISION_DATE).unwrap_or(MISSING)),
		format!("Case number: {}", candidate.field_str(field::CASE_NUMBER).unwrap_or(MISSING)),
		format!("ID: {}", candidate.id),
	];
	let units = precedent::precedent_units(candidate, format.max_units, format.quote_max_words);

	if units.is_empty() {
		lines.push(format!("Excerpt: {}", candidate.content_text.trim()));
	} else {
		lines.push("Precedent units:".to_string());
		lines.extend(units.iter().enumerate().map(|(idx, unit)| render_unit(idx + 1, unit)));
	}

	lines.join("\n")
}

fn render_unit(number: usize, unit: &PrecedentUnit) -> String {
	let anchor = unit.anchor.trim();

	if anchor.is_empty() {
		format!("{number}. {} \"{}\"", unit.rule.trim(), unit.quote.trim())
	} else {
		format!("{number}. {} \"{}\" ({anchor})", unit.rule.trim(), unit.quote.trim())
	}
}

fn jurisdiction_tag(result: &ScoredResult) -> &str {
	if let Some(tag) = result.candidate.field_str(field::JURISDICTION) {
		return tag;
	}

	match result.candidate.field_str(field::CATEGORY) {
		Some(category) if category.eq_ignore_ascii_case(PracticeCategory::Echr.as_str()) => "ECHR",
		_ => "national",
	}
}
