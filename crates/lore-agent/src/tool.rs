//! The `search_knowledge` tool exposed to the LLM.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;

use lore_index::{KnowledgeHit, KnowledgeRetriever, format_as_context};

use crate::context::InvocationContext;

pub const TOOL_NAME: &str = "search_knowledge";

pub const DESCRIPTION: &str = "Search the user's knowledge base (codebase and documents) for relevant information. \
Returns matching code snippets, documentation, and file references based on semantic similarity. \
Use this when you need to find specific information in the user's project, \
such as code examples, configuration files, class definitions, or documentation. \
IMPORTANT: The 'query' parameter should describe WHAT you are looking for semantically \
(e.g. 'project introduction', 'user authentication implementation', 'database configuration'), \
NOT include user IDs, folder names, or system identifiers. \
Parameters: query (required), file_type (optional: CODE/DOCUMENT/CONFIG), top_k (optional, default 5).";

const DEFAULT_TOP_K: u32 = 5;
const MAX_QUERY_LEN: usize = 500;

/// Tool parameters as the LLM supplies them.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// Semantic description of what to look for.
    pub query: String,
    /// Optional category filter: CODE, DOCUMENT or CONFIG.
    #[serde(default)]
    pub file_type: Option<String>,
    /// Number of results to return (1..=20, default 5).
    #[serde(default)]
    pub top_k: Option<u32>,
}

/// Knowledge-base search callable by the LLM. All failures surface as
/// `"Error: …"` strings rather than errors, so the model always gets text.
pub struct SearchKnowledgeTool {
    retriever: Arc<KnowledgeRetriever>,
}

impl SearchKnowledgeTool {
    #[must_use]
    pub fn new(retriever: Arc<KnowledgeRetriever>) -> Self {
        Self { retriever }
    }

    /// JSON schema for the tool parameters, for registration with the
    /// agent framework.
    #[must_use]
    pub fn schema() -> schemars::Schema {
        schemars::schema_for!(SearchParams)
    }

    /// Execute the tool.
    pub async fn call(&self, params: SearchParams, ctx: &InvocationContext) -> String {
        if let Some(error) = validate(&params) {
            return format!("Error: {error}");
        }

        let Some(user_id) = ctx.resolve_user_id() else {
            return "Error: User ID not found in context".to_string();
        };

        let top_k = params.top_k.unwrap_or(DEFAULT_TOP_K) as usize;
        tracing::info!(
            user_id,
            query = %params.query,
            file_type = ?params.file_type,
            top_k,
            "knowledge search tool invoked"
        );

        let results = match self.search(&user_id, &params, top_k).await {
            Ok(results) => results,
            Err(e) => {
                tracing::error!("knowledge search failed: {e:#}");
                return format!("Error: Failed to search knowledge base: {e}");
            }
        };

        let formatted = format_as_context(&results);
        if formatted.trim().is_empty() {
            return format!("No relevant knowledge found for query: {}", params.query);
        }
        formatted
    }

    async fn search(
        &self,
        user_id: &str,
        params: &SearchParams,
        top_k: usize,
    ) -> lore_index::Result<Vec<KnowledgeHit>> {
        match params.file_type.as_deref().map(str::to_uppercase) {
            None => Ok(self.retriever.search(user_id, &params.query, top_k).await),
            Some(t) if t == "CODE" => {
                self.retriever.search_code(user_id, &params.query, top_k).await
            }
            Some(t) if t == "DOCUMENT" => {
                self.retriever
                    .search_documents(user_id, &params.query, top_k)
                    .await
            }
            Some(t) if t == "CONFIG" => {
                self.retriever
                    .search_config(user_id, &params.query, top_k)
                    .await
            }
            Some(_) => Ok(self.retriever.search(user_id, &params.query, top_k).await),
        }
    }
}

fn validate(params: &SearchParams) -> Option<&'static str> {
    if params.query.trim().is_empty() {
        return Some("Query cannot be empty");
    }
    if params.query.chars().count() > MAX_QUERY_LEN {
        return Some("Query is too long (max 500 characters)");
    }
    if let Some(file_type) = &params.file_type {
        let upper = file_type.to_uppercase();
        if !matches!(upper.as_str(), "CODE" | "DOCUMENT" | "CONFIG") {
            return Some("Invalid file_type. Must be one of: CODE, DOCUMENT, CONFIG");
        }
    }
    if let Some(top_k) = params.top_k
        && !(1..=20).contains(&top_k)
    {
        return Some("top_k must be between 1 and 20");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(query: &str) -> SearchParams {
        SearchParams {
            query: query.to_string(),
            file_type: None,
            top_k: None,
        }
    }

    #[test]
    fn empty_query_rejected() {
        assert_eq!(validate(&params("")), Some("Query cannot be empty"));
        assert_eq!(validate(&params("   ")), Some("Query cannot be empty"));
    }

    #[test]
    fn long_query_rejected() {
        let long = "q".repeat(501);
        assert_eq!(
            validate(&params(&long)),
            Some("Query is too long (max 500 characters)")
        );
        let ok = "q".repeat(500);
        assert!(validate(&params(&ok)).is_none());
    }

    #[test]
    fn file_type_validated_case_insensitively() {
        let mut p = params("find things");
        p.file_type = Some("code".into());
        assert!(validate(&p).is_none());
        p.file_type = Some("SPREADSHEET".into());
        assert_eq!(
            validate(&p),
            Some("Invalid file_type. Must be one of: CODE, DOCUMENT, CONFIG")
        );
    }

    #[test]
    fn top_k_bounds_enforced() {
        let mut p = params("find things");
        p.top_k = Some(0);
        assert_eq!(validate(&p), Some("top_k must be between 1 and 20"));
        p.top_k = Some(21);
        assert_eq!(validate(&p), Some("top_k must be between 1 and 20"));
        p.top_k = Some(1);
        assert!(validate(&p).is_none());
        p.top_k = Some(20);
        assert!(validate(&p).is_none());
    }

    #[test]
    fn schema_lists_parameters() {
        let schema = SearchKnowledgeTool::schema();
        let json = serde_json::to_value(&schema).unwrap();
        let props = json["properties"].as_object().unwrap();
        assert!(props.contains_key("query"));
        assert!(props.contains_key("file_type"));
        assert!(props.contains_key("top_k"));
        let required: Vec<&str> = json["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert_eq!(required, vec!["query"]);
    }

    #[test]
    fn params_deserialize_from_tool_json() {
        let p: SearchParams = serde_json::from_str(
            r#"{"query": "auth flow", "file_type": "CODE", "top_k": 3}"#,
        )
        .unwrap();
        assert_eq!(p.query, "auth flow");
        assert_eq!(p.file_type.as_deref(), Some("CODE"));
        assert_eq!(p.top_k, Some(3));

        let minimal: SearchParams = serde_json::from_str(r#"{"query": "x"}"#).unwrap();
        assert!(minimal.file_type.is_none());
        assert!(minimal.top_k.is_none());
    }
}
