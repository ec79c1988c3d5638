use sqlx::{Postgres, QueryBuilder};
use time::Date;

use crate::{
	Error, Result,
	db::Db,
	models::{ApiUsage, DocumentRow, DocumentTable, RankedRow},
};

const KEYWORD_COLUMNS: [&str; 3] = ["title", "summary", "content_text"];
const EXTRA_EXCLUDED: [&str; 5] = ["id", "title", "content_text", "search_vector", "created_at"];

#[derive(Debug, Clone)]
pub struct KeywordSearch<'a> {
	pub table: DocumentTable,
	/// Already sanitized; wildcard characters must not reach this layer.
	pub keywords: &'a [String],
	pub reference_date: Option<Date>,
	pub category: Option<&'a str>,
	pub limit: u32,
}

#[derive(Debug, Clone)]
pub struct FullTextSearch<'a> {
	pub table: DocumentTable,
	pub query: &'a str,
	pub limit: u32,
	pub reference_date: Option<Date>,
	pub category: Option<&'a str>,
}

pub async fn keyword_search(db: &Db, search: &KeywordSearch<'_>) -> Result<Vec<DocumentRow>> {
	if search.keywords.is_empty() {
		return Ok(Vec::new());
	}
	if search.limit == 0 {
		return Err(Error::InvalidArgument("Keyword search limit must be greater than zero.".to_string()));
	}

	let mut builder = keyword_query(search);
	let rows = builder.build_query_as::<DocumentRow>().fetch_all(&db.pool).await?;

	Ok(rows)
}

pub async fn full_text_search(db: &Db, search: &FullTextSearch<'_>) -> Result<Vec<RankedRow>> {
	if search.query.trim().is_empty() {
		return Ok(Vec::new());
	}

	let sql = format!(
		"\
SELECT
	r.id::text AS id,
	coalesce(r.title, '') AS title,
	coalesce(r.content_text, '') AS content_text,
	coalesce(r.rank, 0)::real AS rank,
	to_jsonb(r) - 'id' - 'title' - 'content_text' - 'rank' AS extra
FROM {}($1, $2, $3) r",
		search.table.full_text_procedure()
	);
	let query = sqlx::query_as::<_, RankedRow>(&sql)
		.bind(search.query)
		.bind(i32::try_from(search.limit).unwrap_or(i32::MAX));
	let query = match search.table {
		DocumentTable::KnowledgeBase => query.bind(search.reference_date),
		DocumentTable::LegalPractice => query.bind(search.category),
	};
	let rows = query.fetch_all(&db.pool).await?;

	Ok(rows)
}

pub async fn insert_api_usage(db: &Db, usage: &ApiUsage) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO api_usage (service_type, model_name, tokens_used, estimated_cost, metadata)
VALUES ($1, $2, $3, $4, $5)",
	)
	.bind(usage.service_type.as_str())
	.bind(usage.model_name.as_str())
	.bind(usage.tokens_used)
	.bind(usage.estimated_cost)
	.bind(&usage.metadata)
	.execute(&db.pool)
	.await?;

	Ok(())
}

fn keyword_query<'a>(search: &'a KeywordSearch<'a>) -> QueryBuilder<'a, Postgres> {
	let mut builder = QueryBuilder::new(
		"SELECT t.id::text AS id, t.title, t.content_text, to_jsonb(t)",
	);

	for column in EXTRA_EXCLUDED {
		builder.push(format!(" - '{column}'"));
	}

	builder.push(" AS extra FROM ");
	builder.push(search.table.as_str());
	builder.push(" t WHERE (");

	let mut first = true;

	for keyword in search.keywords {
		let pattern = format!("%{keyword}%");

		for column in KEYWORD_COLUMNS {
			if !first {
				builder.push(" OR ");
			}

			first = false;

			builder.push(format!("t.{column} ILIKE "));
			builder.push_bind(pattern.clone());
		}
	}

	builder.push(")");

	if let (DocumentTable::KnowledgeBase, Some(date)) = (search.table, search.reference_date) {
		builder.push(" AND (t.valid_from IS NULL OR t.valid_from <= ");
		builder.push_bind(date);
		builder.push(") AND (t.valid_to IS NULL OR t.valid_to > ");
		builder.push_bind(date);
		builder.push(")");
	}
	if let (DocumentTable::LegalPractice, Some(category)) = (search.table, search.category) {
		builder.push(" AND t.category = ");
		builder.push_bind(category);
	}

	builder.push(" ORDER BY t.title ASC, t.id ASC LIMIT ");
	builder.push_bind(i64::from(search.limit));

	builder
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn keyword_query_binds_every_keyword_per_column() {
		let keywords = vec!["penalty".to_string(), "contract".to_string()];
		let search = KeywordSearch {
			table: DocumentTable::LegalPractice,
			keywords: &keywords,
			reference_date: None,
			category: Some("civil"),
			limit: 50,
		};
		let builder = keyword_query(&search);
		let sql = builder.sql();

		assert!(sql.contains("FROM legal_practice t WHERE ("));
		assert_eq!(sql.matches("ILIKE").count(), 6);
		assert!(sql.contains("t.category = $7"));
		assert!(sql.ends_with("LIMIT $8"));
		assert!(!sql.contains("penalty"));
	}

	#[test]
	fn reference_date_only_filters_the_knowledge_base() {
		let keywords = vec!["lease".to_string()];
		let date = Date::from_calendar_date(2022, time::Month::February, 24).expect("valid date");
		let kb = KeywordSearch {
			table: DocumentTable::KnowledgeBase,
			keywords: &keywords,
			reference_date: Some(date),
			category: Some("civil"),
			limit: 10,
		};
		let practice = KeywordSearch { table: DocumentTable::LegalPractice, ..kb.clone() };

		let kb_sql = keyword_query(&kb).sql().to_string();
		let practice_sql = keyword_query(&practice).sql().to_string();

		assert!(kb_sql.contains("t.valid_from <= $4"));
		assert!(kb_sql.contains("t.valid_to > $5"));
		assert!(!kb_sql.contains("t.category"));
		assert!(!practice_sql.contains("valid_from"));
		assert!(practice_sql.contains("t.category = $4"));
	}
}
