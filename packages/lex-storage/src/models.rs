use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentTable {
	KnowledgeBase,
	LegalPractice,
}
impl DocumentTable {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::KnowledgeBase => "knowledge_base",
			Self::LegalPractice => "legal_practice",
		}
	}

	pub(crate) fn full_text_procedure(self) -> &'static str {
		match self {
			Self::KnowledgeBase => "search_knowledge_base",
			Self::LegalPractice => "search_legal_practice",
		}
	}
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocumentRow {
	pub id: String,
	pub title: String,
	pub content_text: String,
	pub extra: Value,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RankedRow {
	pub id: String,
	pub title: String,
	pub content_text: String,
	pub rank: f32,
	pub extra: Value,
}

#[derive(Debug, Clone)]
pub struct ApiUsage {
	pub service_type: String,
	pub model_name: String,
	pub tokens_used: i32,
	pub estimated_cost: f64,
	pub metadata: Value,
}
