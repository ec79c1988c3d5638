use std::collections::HashSet;

use regex::Regex;

pub const DEFAULT_MAX_KEYWORDS: usize = 10;
pub const DEFAULT_MAX_KEYWORD_CHARS: usize = 200;

// LIKE wildcards, PostgREST filter syntax and tsquery operators.
const SPECIAL_CHARS_PATTERN: &str = r#"[%_*\\()\[\]{}:;,.!?&|<>'"`~^$@#+=/]"#;

pub fn extract_keywords(text: &str, max_count: usize) -> Vec<String> {
	text.split_whitespace()
		.filter(|token| token.chars().count() > 2)
		.filter(|token| !token.chars().all(|ch| ch.is_ascii_digit()))
		.take(max_count)
		.map(str::to_string)
		.collect()
}

pub fn sanitize_keyword(token: &str, max_chars: usize) -> Option<String> {
	let special = Regex::new(SPECIAL_CHARS_PATTERN).ok()?;

	sanitize_with(&special, token, max_chars)
}

pub fn search_terms(text: &str, max_count: usize, max_chars: usize) -> Vec<String> {
	let Ok(special) = Regex::new(SPECIAL_CHARS_PATTERN) else {
		return Vec::new();
	};
	let mut seen = HashSet::new();
	let mut out = Vec::new();

	for token in extract_keywords(text, max_count) {
		let Some(clean) = sanitize_with(&special, &token, max_chars) else {
			continue;
		};

		if clean.chars().count() <= 2 {
			continue;
		}
		if seen.insert(clean.to_lowercase()) {
			out.push(clean);
		}
	}

	out
}

fn sanitize_with(special: &Regex, token: &str, max_chars: usize) -> Option<String> {
	let stripped = special.replace_all(token, " ");
	let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
	let capped: String = collapsed.chars().take(max_chars).collect();
	let trimmed = capped.trim();

	if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}
