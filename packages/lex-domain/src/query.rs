use serde::{Deserialize, Serialize};
use time::Date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PracticeCategory {
	Civil,
	Criminal,
	Administrative,
	Commercial,
	Labor,
	Echr,
}
impl PracticeCategory {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Civil => "civil",
			Self::Criminal => "criminal",
			Self::Administrative => "administrative",
			Self::Commercial => "commercial",
			Self::Labor => "labor",
			Self::Echr => "echr",
		}
	}

	pub fn is_echr(self) -> bool {
		matches!(self, Self::Echr)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
	pub text: String,
	#[serde(default, with = "crate::date_serde::option")]
	pub reference_date: Option<Date>,
	#[serde(default)]
	pub category: Option<PracticeCategory>,
	#[serde(default)]
	pub request_id: Option<String>,
}
impl Query {
	pub fn new(text: impl Into<String>) -> Self {
		Self { text: text.into(), reference_date: None, category: None, request_id: None }
	}

	pub fn with_reference_date(mut self, date: Date) -> Self {
		self.reference_date = Some(date);

		self
	}

	pub fn with_category(mut self, category: PracticeCategory) -> Self {
		self.category = Some(category);

		self
	}

	pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
		self.request_id = Some(request_id.into());

		self
	}
}
