use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod field {
	pub const CATEGORY: &str = "category";
	pub const SOURCE: &str = "source";
	pub const SUMMARY: &str = "summary";
	pub const JURISDICTION: &str = "jurisdiction";
	pub const COURT_TYPE: &str = "court_type";
	pub const COURT_NAME: &str = "court_name";
	pub const DECISION_DATE: &str = "decision_date";
	pub const CASE_NUMBER: &str = "case_number";
	pub const PRECEDENT_UNITS: &str = "precedent_units";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
	Normative,
	Practice,
}
impl IndexKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Normative => "normative",
			Self::Practice => "practice",
		}
	}

	pub fn rerank_table(self) -> &'static str {
		match self {
			Self::Normative => "kb",
			Self::Practice => "practice",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTier {
	Rerank,
	Keyword,
	FtsFallback,
}
impl SourceTier {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Rerank => "rerank",
			Self::Keyword => "keyword",
			Self::FtsFallback => "fts_fallback",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RetrievalMode {
	#[serde(rename = "keyword+rerank")]
	KeywordRerank,
	#[serde(rename = "keyword_only")]
	KeywordOnly,
	#[serde(rename = "rpc_fallback")]
	RpcFallback,
}
impl RetrievalMode {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::KeywordRerank => "keyword+rerank",
			Self::KeywordOnly => "keyword_only",
			Self::RpcFallback => "rpc_fallback",
		}
	}

	/// `rerank_contributed` must only be true when the rerank tier succeeded and at least one of
	/// its candidates survived merging.
	pub fn resolve(rerank_contributed: bool, merged_count: usize) -> Self {
		if rerank_contributed {
			Self::KeywordRerank
		} else if merged_count > 0 {
			Self::KeywordOnly
		} else {
			Self::RpcFallback
		}
	}

	pub fn best(self, other: Self) -> Self {
		if other.strength() > self.strength() { other } else { self }
	}

	fn strength(self) -> u8 {
		match self {
			Self::KeywordRerank => 2,
			Self::KeywordOnly => 1,
			Self::RpcFallback => 0,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
	pub id: String,
	pub title: String,
	pub content_text: String,
	pub index_kind: IndexKind,
	pub source_tier: SourceTier,
	pub raw_score: f32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rank: Option<f32>,
	#[serde(default)]
	pub fields: Map<String, Value>,
}
impl Candidate {
	pub fn new(
		id: impl Into<String>,
		title: impl Into<String>,
		content_text: impl Into<String>,
		index_kind: IndexKind,
		source_tier: SourceTier,
	) -> Self {
		Self {
			id: id.into(),
			title: title.into(),
			content_text: content_text.into(),
			index_kind,
			source_tier,
			raw_score: 0.0,
			rank: None,
			fields: Map::new(),
		}
	}

	pub fn with_raw_score(mut self, raw_score: f32) -> Self {
		self.raw_score = raw_score;

		self
	}

	pub fn with_rank(mut self, rank: f32) -> Self {
		self.rank = Some(rank);

		self
	}

	pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
		self.fields.insert(key.to_string(), value.into());

		self
	}

	pub fn with_fields(mut self, fields: Map<String, Value>) -> Self {
		self.fields.extend(fields);

		self
	}

	pub fn field_str(&self, key: &str) -> Option<&str> {
		self.fields.get(key).and_then(Value::as_str).map(str::trim).filter(|value| !value.is_empty())
	}

	pub fn source_ref(&self) -> SourceRef {
		SourceRef {
			title: self.title.clone(),
			category: self.field_str(field::CATEGORY).map(str::to_string),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
	#[serde(flatten)]
	pub candidate: Candidate,
	pub normalized_score: f32,
	pub preview: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
	pub title: String,
	pub category: Option<String>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn mode_resolution_degrades_in_order() {
		assert_eq!(RetrievalMode::resolve(true, 3), RetrievalMode::KeywordRerank);
		assert_eq!(RetrievalMode::resolve(false, 3), RetrievalMode::KeywordOnly);
		assert_eq!(RetrievalMode::resolve(false, 0), RetrievalMode::RpcFallback);
	}

	#[test]
	fn best_mode_prefers_rerank_then_keyword() {
		use RetrievalMode::*;

		assert_eq!(RpcFallback.best(KeywordRerank), KeywordRerank);
		assert_eq!(KeywordOnly.best(RpcFallback), KeywordOnly);
		assert_eq!(KeywordRerank.best(KeywordOnly), KeywordRerank);
		assert_eq!(RpcFallback.best(RpcFallback), RpcFallback);
	}

	#[test]
	fn retrieval_mode_uses_wire_labels() {
		let encoded =
			serde_json::to_string(&RetrievalMode::KeywordRerank).expect("serialize failed");

		assert_eq!(encoded, "\"keyword+rerank\"");
	}

	#[test]
	fn field_str_ignores_blank_values() {
		let candidate = Candidate::new("1", "t", "c", IndexKind::Practice, SourceTier::Keyword)
			.with_field(field::CATEGORY, "  ")
			.with_field(field::CASE_NUMBER, " 757/1234/21 ");

		assert_eq!(candidate.field_str(field::CATEGORY), None);
		assert_eq!(candidate.field_str(field::CASE_NUMBER), Some("757/1234/21"));
	}
}
