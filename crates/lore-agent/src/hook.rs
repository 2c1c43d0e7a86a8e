//! Before-model hook: inject retrieved knowledge into the chat history.

use std::sync::Arc;

use lore_index::{KnowledgeRetriever, format_as_context};

use crate::context::InvocationContext;
use crate::message::{Message, Role};

/// At most this many knowledge hits are injected per turn.
const MAX_RESULTS: usize = 3;
/// Queries shorter than this are not worth a retrieval round-trip.
const MIN_QUERY_LENGTH: usize = 5;

/// Injects a system message with retrieved project context before the
/// first model call of a user turn. Turns inside a tool-calling loop
/// (last message is a tool response) are left untouched, as is everything
/// when the vector store is unavailable or no tenant resolves.
pub struct KnowledgeContextHook {
    retriever: Arc<KnowledgeRetriever>,
}

impl KnowledgeContextHook {
    #[must_use]
    pub fn new(retriever: Arc<KnowledgeRetriever>) -> Self {
        Self { retriever }
    }

    /// Run the hook; returns the (possibly unchanged) message list.
    pub async fn before_model(
        &self,
        messages: &[Message],
        ctx: &InvocationContext,
    ) -> Vec<Message> {
        if !self.retriever.vector_available() {
            tracing::debug!("vector store unavailable, skipping context injection");
            return messages.to_vec();
        }

        if messages.last().is_some_and(|m| m.role == Role::Tool) {
            tracing::debug!("inside tool-calling loop, skipping context injection");
            return messages.to_vec();
        }

        let Some(user_id) = ctx.resolve_user_id() else {
            return messages.to_vec();
        };

        let Some(query) = latest_user_text(messages) else {
            return messages.to_vec();
        };
        if query.chars().count() < MIN_QUERY_LENGTH {
            tracing::debug!("query too short, skipping context injection");
            return messages.to_vec();
        }

        let hits = self.retriever.search(&user_id, query, MAX_RESULTS).await;
        if hits.is_empty() {
            tracing::debug!(user_id, "no knowledge found for query");
            return messages.to_vec();
        }

        let context = format_as_context(&hits);
        if context.trim().is_empty() {
            return messages.to_vec();
        }

        tracing::info!(user_id, hits = hits.len(), "injecting knowledge context");
        inject_after_first_system(messages, context_message(&context))
    }
}

fn context_message(context: &str) -> Message {
    Message::new(
        Role::System,
        format!(
            "## 用户项目上下文\n\n\
             以下是从用户知识库中检索到的相关内容,可以帮助你更好地理解用户的项目:\n\n\
             {context}\n\n\
             请基于这些上下文信息回答用户的问题。"
        ),
    )
}

/// Most recent user message's text, scanning backwards.
fn latest_user_text(messages: &[Message]) -> Option<&str> {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
}

/// Insert `context` right after the first system message, or at the front
/// when none exists.
fn inject_after_first_system(messages: &[Message], context: Message) -> Vec<Message> {
    let mut out = Vec::with_capacity(messages.len() + 1);
    let mut injected = false;

    for msg in messages {
        out.push(msg.clone());
        if !injected && msg.role == Role::System {
            out.push(context.clone());
            injected = true;
        }
    }

    if !injected {
        out.insert(0, context);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use lore_index::{
        FtsStore, KnowledgeVectorStore, StateStore, db::open_pool,
        indexer::KnowledgeIndexer, splitter::SplitterFactory,
    };
    use lore_llm::AnyEmbedder;
    use lore_llm::mock::MockEmbedder;

    async fn retriever_with(noop: bool, seed: Option<(&str, &str)>) -> Arc<KnowledgeRetriever> {
        let pool = open_pool(":memory:").await.unwrap();
        let embedder = Arc::new(AnyEmbedder::Mock(MockEmbedder::with_vector(vec![
            1.0, 0.0,
        ])));
        let vector = Arc::new(if noop {
            KnowledgeVectorStore::Noop
        } else {
            KnowledgeVectorStore::memory(embedder)
        });
        let fts = FtsStore::new(pool.clone());

        if let Some((user, content)) = seed {
            let indexer = KnowledgeIndexer::new(
                vector.clone(),
                fts.clone(),
                StateStore::new(pool),
                SplitterFactory::default(),
            );
            indexer
                .add_content(user, content, Some("seed/NotesFile.txt"))
                .await
                .unwrap();
        }

        Arc::new(KnowledgeRetriever::new(vector, fts))
    }

    fn ctx() -> InvocationContext {
        InvocationContext::new().with_session_user("u1")
    }

    fn convo(user_text: &str) -> Vec<Message> {
        vec![
            Message::new(Role::System, "You are a helpful assistant."),
            Message::new(Role::User, user_text),
        ]
    }

    #[tokio::test]
    async fn injects_after_first_system_message() {
        let retriever =
            retriever_with(false, Some(("u1", "The deployment pipeline restarts nightly."))).await;
        let hook = KnowledgeContextHook::new(retriever);

        let out = hook
            .before_model(&convo("tell me about the deployment pipeline"), &ctx())
            .await;
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].role, Role::System);
        assert_eq!(out[1].role, Role::System);
        assert!(out[1].content.contains("用户项目上下文"));
        assert!(out[1].content.contains("文件:"));
        assert_eq!(out[2].role, Role::User);
    }

    #[tokio::test]
    async fn injects_at_front_without_system_message() {
        let retriever =
            retriever_with(false, Some(("u1", "Cache invalidation happens on write."))).await;
        let hook = KnowledgeContextHook::new(retriever);

        let messages = vec![Message::new(Role::User, "how does cache invalidation work")];
        let out = hook.before_model(&messages, &ctx()).await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].role, Role::System);
        assert!(out[0].content.contains("用户项目上下文"));
    }

    #[tokio::test]
    async fn short_query_skips_injection() {
        let retriever = retriever_with(false, Some(("u1", "Some indexed content here."))).await;
        let hook = KnowledgeContextHook::new(retriever);

        let out = hook.before_model(&convo("hey"), &ctx()).await;
        assert_eq!(out.len(), 2);
    }

    #[tokio::test]
    async fn tool_loop_turn_untouched() {
        let retriever = retriever_with(false, Some(("u1", "Some indexed content here."))).await;
        let hook = KnowledgeContextHook::new(retriever);

        let mut messages = convo("a perfectly long query about content");
        messages.push(Message::new(Role::Assistant, "calling tool"));
        messages.push(Message::new(Role::Tool, "tool output"));

        let out = hook.before_model(&messages, &ctx()).await;
        assert_eq!(out.len(), messages.len());
    }

    #[tokio::test]
    async fn unavailable_vector_store_skips_injection() {
        // Lexical data exists, but the hook gates on vector availability.
        let retriever = retriever_with(true, Some(("u1", "Indexed but dark content."))).await;
        let hook = KnowledgeContextHook::new(retriever);

        let out = hook
            .before_model(&convo("query about indexed dark content"), &ctx())
            .await;
        assert_eq!(out.len(), 2);
    }

    #[tokio::test]
    async fn missing_tenant_skips_injection() {
        let retriever = retriever_with(false, Some(("u1", "Tenant gated content."))).await;
        let hook = KnowledgeContextHook::new(retriever);

        let out = hook
            .before_model(&convo("query about tenant gated content"), &InvocationContext::new())
            .await;
        assert_eq!(out.len(), 2);
    }

    #[tokio::test]
    async fn no_results_skips_injection() {
        let retriever = retriever_with(false, None).await;
        let hook = KnowledgeContextHook::new(retriever);

        let out = hook
            .before_model(&convo("query with an empty knowledge base"), &ctx())
            .await;
        assert_eq!(out.len(), 2);
    }

    #[tokio::test]
    async fn multi_turn_conversation_still_injects() {
        let retriever =
            retriever_with(false, Some(("u1", "Rate limiting uses a token bucket."))).await;
        let hook = KnowledgeContextHook::new(retriever);

        let messages = vec![
            Message::new(Role::System, "sys"),
            Message::new(Role::User, "earlier question about something"),
            Message::new(Role::Assistant, "earlier answer"),
            Message::new(Role::User, "how does rate limiting work here"),
        ];
        let out = hook.before_model(&messages, &ctx()).await;
        assert_eq!(out.len(), 5);
        assert!(out[1].content.contains("用户项目上下文"));
    }
}
