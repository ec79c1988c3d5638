use std::time::Duration as StdDuration;

use reqwest::Client;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{Error, Result};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RerankRequest {
	pub query: String,
	pub tables: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub category: Option<String>,
	pub limit: u32,
	pub threshold: f32,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reference_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RerankHit {
	pub id: String,
	pub title: String,
	pub content_text: String,
	pub similarity: f32,
	pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RerankResponse {
	pub kb: Vec<RerankHit>,
	pub practice: Vec<RerankHit>,
	pub retrieval_mode: Option<String>,
	pub rerank_ok: Option<bool>,
	pub rerank_error: Option<String>,
	pub request_id: Option<String>,
}

pub async fn search(
	cfg: &lex_config::RerankProviderConfig,
	req: &RerankRequest,
) -> Result<RerankResponse> {
	let client = Client::builder().timeout(StdDuration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(req)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_rerank_response(json)
}

pub fn parse_rerank_response(json: Value) -> Result<RerankResponse> {
	let Value::Object(root) = json else {
		return Err(Error::InvalidResponse {
			message: "Rerank response must be a JSON object.".to_string(),
		});
	};

	if !root.contains_key("kb") && !root.contains_key("practice") {
		return Err(Error::InvalidResponse {
			message: "Rerank response is missing both kb and practice arrays.".to_string(),
		});
	}

	Ok(RerankResponse {
		kb: parse_hits(&root, "kb")?,
		practice: parse_hits(&root, "practice")?,
		retrieval_mode: string_field(&root, "retrievalMode"),
		rerank_ok: root.get("rerankOk").and_then(Value::as_bool),
		rerank_error: string_field(&root, "rerankError"),
		request_id: string_field(&root, "requestId"),
	})
}

fn parse_hits(root: &Map<String, Value>, key: &str) -> Result<Vec<RerankHit>> {
	let items = match root.get(key) {
		None | Some(Value::Null) => return Ok(Vec::new()),
		Some(Value::Array(items)) => items,
		Some(_) => {
			return Err(Error::InvalidResponse {
				message: format!("Rerank response field {key} must be an array."),
			});
		},
	};
	let mut hits = Vec::with_capacity(items.len());

	for item in items {
		let Value::Object(object) = item else {
			return Err(Error::InvalidResponse {
				message: format!("Rerank {key} item must be an object."),
			});
		};
		let id = match object.get("id") {
			Some(Value::String(id)) if !id.trim().is_empty() => id.trim().to_string(),
			Some(Value::Number(id)) => id.to_string(),
			_ => {
				return Err(Error::InvalidResponse {
					message: format!("Rerank {key} item is missing id."),
				});
			},
		};
		let similarity = object
			.get("similarity")
			.or_else(|| object.get("score"))
			.and_then(Value::as_f64)
			.ok_or_else(|| Error::InvalidResponse {
				message: format!("Rerank {key} item {id} is missing similarity."),
			})? as f32;
		let title = object.get("title").and_then(Value::as_str).unwrap_or_default().to_string();
		let content_text = object
			.get("content_text")
			.or_else(|| object.get("content"))
			.and_then(Value::as_str)
			.unwrap_or_default()
			.to_string();
		let fields = object
			.iter()
			.filter(|(name, _)| {
				!matches!(
					name.as_str(),
					"id" | "title" | "content_text" | "content" | "similarity" | "score"
				)
			})
			.map(|(name, value)| (name.clone(), value.clone()))
			.collect();

		hits.push(RerankHit { id, title, content_text, similarity, fields });
	}

	Ok(hits)
}

fn string_field(root: &Map<String, Value>, key: &str) -> Option<String> {
	root.get(key).and_then(Value::as_str).map(str::to_string)
}
