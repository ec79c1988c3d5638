use std::env;

use serde_json::json;
use time::{Date, Month};
use uuid::Uuid;

use lex_config::Postgres;
use lex_storage::{
	db::Db,
	models::{ApiUsage, DocumentTable},
	queries::{self, FullTextSearch, KeywordSearch},
};

fn env_dsn() -> Option<String> {
	env::var("LEX_PG_DSN").ok().filter(|dsn| !dsn.trim().is_empty())
}

async fn connect(dsn: String) -> Db {
	let db = Db::connect(&Postgres { dsn, pool_max_conns: 2 })
		.await
		.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	db
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set LEX_PG_DSN to run."]
async fn keyword_search_respects_validity_window() {
	let Some(dsn) = env_dsn() else {
		eprintln!("Skipping keyword_search_respects_validity_window; set LEX_PG_DSN to run this test.");

		return;
	};
	let db = connect(dsn).await;
	let marker = Uuid::new_v4().simple().to_string();
	let current = Uuid::new_v4();
	let repealed = Uuid::new_v4();

	for (id, valid_to) in [
		(current, None),
		(repealed, Some(Date::from_calendar_date(2020, Month::January, 1).expect("valid date"))),
	] {
		sqlx::query(
			"\
INSERT INTO knowledge_base (id, title, content_text, category, valid_from, valid_to)
VALUES ($1, $2, $3, 'civil', NULL, $4)",
		)
		.bind(id)
		.bind(format!("Article {marker}"))
		.bind("Lease termination rules.")
		.bind(valid_to)
		.execute(&db.pool)
		.await
		.expect("Failed to insert knowledge row.");
	}

	let keywords = vec![marker.clone()];
	let rows = queries::keyword_search(
		&db,
		&KeywordSearch {
			table: DocumentTable::KnowledgeBase,
			keywords: &keywords,
			reference_date: Some(Date::from_calendar_date(2024, Month::March, 1).expect("valid date")),
			category: None,
			limit: 50,
		},
	)
	.await
	.expect("Keyword search failed.");

	assert_eq!(rows.len(), 1);
	assert_eq!(rows[0].id, current.to_string());
	assert_eq!(rows[0].extra.get("category"), Some(&json!("civil")));
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set LEX_PG_DSN to run."]
async fn full_text_procedure_filters_practice_category() {
	let Some(dsn) = env_dsn() else {
		eprintln!("Skipping full_text_procedure_filters_practice_category; set LEX_PG_DSN to run this test.");

		return;
	};
	let db = connect(dsn).await;
	let marker = format!("marker{}", Uuid::new_v4().simple());

	for category in ["civil", "echr"] {
		sqlx::query(
			"\
INSERT INTO legal_practice (title, content_text, category)
VALUES ($1, $2, $3)",
		)
		.bind(format!("Case {category}"))
		.bind(format!("Decision text {marker}"))
		.bind(category)
		.execute(&db.pool)
		.await
		.expect("Failed to insert practice row.");
	}

	let rows = queries::full_text_search(
		&db,
		&FullTextSearch {
			table: DocumentTable::LegalPractice,
			query: &marker,
			limit: 10,
			reference_date: None,
			category: Some("echr"),
		},
	)
	.await
	.expect("Full-text search failed.");

	assert_eq!(rows.len(), 1);
	assert_eq!(rows[0].title, "Case echr");
	assert!(rows[0].rank > 0.0);
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set LEX_PG_DSN to run."]
async fn usage_rows_are_inserted() {
	let Some(dsn) = env_dsn() else {
		eprintln!("Skipping usage_rows_are_inserted; set LEX_PG_DSN to run this test.");

		return;
	};
	let db = connect(dsn).await;
	let request_id = Uuid::new_v4().to_string();

	queries::insert_api_usage(
		&db,
		&ApiUsage {
			service_type: "legal_search".to_string(),
			model_name: "hybrid-retrieval".to_string(),
			tokens_used: 0,
			estimated_cost: 0.0,
			metadata: json!({ "request_id": request_id }),
		},
	)
	.await
	.expect("Failed to insert usage row.");

	let count: i64 =
		sqlx::query_scalar("SELECT count(*) FROM api_usage WHERE metadata->>'request_id' = $1")
			.bind(&request_id)
			.fetch_one(&db.pool)
			.await
			.expect("Failed to count usage rows.");

	assert_eq!(count, 1);
}
