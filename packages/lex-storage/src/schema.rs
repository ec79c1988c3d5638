pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

/// Splits rendered SQL into executable statements. Function bodies must not contain `;`.
pub fn statements(sql: &str) -> impl Iterator<Item = &str> {
	sql.split(';').map(str::trim).filter(|statement| !statement.is_empty())
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"00_extensions.sql" => out.push_str(include_str!("../../../sql/00_extensions.sql")),
				"tables/001_knowledge_base.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_knowledge_base.sql")),
				"tables/002_legal_practice.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_legal_practice.sql")),
				"tables/003_api_usage.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_api_usage.sql")),
				"functions/001_search_knowledge_base.sql" => out
					.push_str(include_str!("../../../sql/functions/001_search_knowledge_base.sql")),
				"functions/002_search_legal_practice.sql" => out
					.push_str(include_str!("../../../sql/functions/002_search_legal_practice.sql")),
				_ => {
					out.push_str(line);
				},
			}

			out.push('\n');

			continue;
		}

		out.push_str(line);
		out.push('\n');
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn includes_are_expanded() {
		let sql = render_schema();

		assert!(!sql.contains("\\ir "));
		assert!(sql.contains("CREATE TABLE IF NOT EXISTS knowledge_base"));
		assert!(sql.contains("CREATE OR REPLACE FUNCTION search_legal_practice"));
	}

	#[test]
	fn function_bodies_survive_statement_split() {
		let sql = render_schema();
		let functions: Vec<&str> =
			statements(&sql).filter(|statement| statement.contains("FUNCTION")).collect();

		assert_eq!(functions.len(), 2);
		assert!(functions.iter().all(|statement| statement.ends_with("$$")));
	}
}
