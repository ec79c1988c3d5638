use std::collections::HashSet;

use crate::Candidate;

/// Concatenates candidate lists in priority order, keeping the first occurrence of every id.
///
/// Later duplicates are discarded without looking at their scores. Callers pass the rerank list
/// first so its instances win.
pub fn merge_candidates<I>(lists: I) -> Vec<Candidate>
where
	I: IntoIterator<Item = Vec<Candidate>>,
{
	let mut seen: HashSet<String> = HashSet::new();
	let mut out = Vec::new();

	for list in lists {
		for candidate in list {
			if seen.insert(candidate.id.clone()) {
				out.push(candidate);
			}
		}
	}

	out
}
