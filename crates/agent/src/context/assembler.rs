//! Builds the per-turn context: prior turns, the search query, and the
//! people and rules that query matches.
//!
//! # Determinism
//!
//! Given the same stored history and catalogs, assembly always yields the
//! same context. Catalog matches keep catalog order.

use anxiousroid_catalog::{RuleIndex, TermIndex};
use anxiousroid_core::catalog::{Rule, Term, TermCategory};
use anxiousroid_core::error::Result;
use anxiousroid_core::message::ChatMessage;
use anxiousroid_core::store::{ConversationStore, HistoryLoad};
use std::sync::Arc;
use tracing::{debug, warn};

/// How many of the most recent history turns feed the catalog query.
pub const QUERY_HISTORY_TURNS: usize = 3;

/// Everything the pipeline needs to build one provider request.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledContext {
    /// Prior turns, oldest first, at most `window` long.
    pub history: Vec<ChatMessage>,
    /// Text the people search ran against.
    pub query: String,
    /// Matched `person` terms, in catalog order.
    pub people: Vec<Term>,
    /// Rules matched against the query extended with people descriptions.
    pub rules: Vec<Rule>,
    /// History could not be read and was treated as empty.
    pub history_degraded: bool,
}

pub struct ContextAssembler {
    terms: Arc<TermIndex>,
    rules: Arc<RuleIndex>,
    store: Arc<dyn ConversationStore>,
    window: usize,
}

impl ContextAssembler {
    pub fn new(
        terms: Arc<TermIndex>,
        rules: Arc<RuleIndex>,
        store: Arc<dyn ConversationStore>,
        window: usize,
    ) -> Self {
        Self {
            terms,
            rules,
            store,
            window,
        }
    }

    /// Assemble the context for `latest` from `user_id`.
    ///
    /// Only catalog failures are errors; unreadable history degrades to an
    /// empty one.
    pub async fn assemble(&self, user_id: &str, latest: &str) -> Result<AssembledContext> {
        let (history, history_degraded) = match self.store.load(user_id, self.window).await {
            HistoryLoad::Loaded(messages) => (messages, false),
            HistoryLoad::Degraded { reason } => {
                warn!(user_id, %reason, "Continuing with empty history");
                (Vec::new(), true)
            }
        };

        let query = build_query(&history, latest);
        let people = self.terms.search(&query, Some(TermCategory::Person))?;

        let mut extended = query.clone();
        for person in &people {
            extended.push_str(&person.description);
        }
        let rules = self.rules.search(&extended)?;

        debug!(
            user_id,
            history = history.len(),
            people = people.len(),
            rules = rules.len(),
            "Context assembled"
        );

        Ok(AssembledContext {
            history,
            query,
            people,
            rules,
            history_degraded,
        })
    }
}

/// Concatenate the last [`QUERY_HISTORY_TURNS`] turns (oldest first) and
/// the new message, with no separator.
fn build_query(history: &[ChatMessage], latest: &str) -> String {
    let skip = history.len().saturating_sub(QUERY_HISTORY_TURNS);
    let mut query: String = history[skip..].iter().map(|m| m.content.as_str()).collect();
    query.push_str(latest);
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use anxiousroid_catalog::CatalogSource;
    use anxiousroid_core::message::Role;
    use anxiousroid_core::store::AppendOutcome;
    use anxiousroid_memory::InMemoryConversationStore;
    use async_trait::async_trait;

    const TERMS: &str = r#"[
        {"index_regex": "太郎", "name": "太郎", "categories": ["person"],
         "description": "雨が嫌いな弟。", "alias": "", "attributes": []},
        {"index_regex": "東京", "name": "東京", "categories": ["other"],
         "description": "雨の多い街。", "alias": "", "attributes": []}
    ]"#;

    const RULES: &str = r#"[
        {"index_regex": "雨", "rules": ["天気の話では傘の心配をする。"]},
        {"index_regex": "試験", "rules": ["緊張を表す。"]}
    ]"#;

    fn assembler(store: Arc<dyn ConversationStore>, window: usize) -> ContextAssembler {
        ContextAssembler::new(
            Arc::new(TermIndex::new(CatalogSource::inline("terms", TERMS))),
            Arc::new(RuleIndex::new(CatalogSource::inline("rules", RULES))),
            store,
            window,
        )
    }

    struct BrokenStore;

    #[async_trait]
    impl ConversationStore for BrokenStore {
        fn name(&self) -> &str {
            "broken"
        }

        async fn load(&self, _user_id: &str, _window: usize) -> HistoryLoad {
            HistoryLoad::Degraded {
                reason: "corrupt line".into(),
            }
        }

        async fn append(
            &self,
            _user_id: &str,
            _platform: &str,
            _role: Role,
            _text: &str,
        ) -> AppendOutcome {
            AppendOutcome::Dropped {
                reason: "read only".into(),
            }
        }
    }

    #[test]
    fn query_uses_last_three_turns() {
        let history = vec![
            ChatMessage::user("a"),
            ChatMessage::assistant("b"),
            ChatMessage::user("c"),
            ChatMessage::assistant("d"),
        ];
        assert_eq!(build_query(&history, "e"), "bcde");
        assert_eq!(build_query(&[], "only"), "only");
    }

    #[tokio::test]
    async fn empty_history_queries_latest_only() {
        let store = Arc::new(InMemoryConversationStore::new());
        let ctx = assembler(store, 10).assemble("u1", "こんにちは").await.unwrap();
        assert!(ctx.history.is_empty());
        assert_eq!(ctx.query, "こんにちは");
        assert!(ctx.people.is_empty());
        assert!(ctx.rules.is_empty());
        assert!(!ctx.history_degraded);
    }

    #[tokio::test]
    async fn people_descriptions_feed_rule_search() {
        let store = Arc::new(InMemoryConversationStore::new());
        let ctx = assembler(store, 10)
            .assemble("u1", "太郎が来た")
            .await
            .unwrap();
        assert_eq!(ctx.people.len(), 1);
        // "雨" only appears in 太郎's description.
        assert_eq!(ctx.rules.len(), 1);
        assert_eq!(ctx.rules[0].index_regex, "雨");
        assert_eq!(ctx.query, "太郎が来た");
    }

    #[tokio::test]
    async fn non_person_terms_do_not_extend_query() {
        let store = Arc::new(InMemoryConversationStore::new());
        let ctx = assembler(store, 10).assemble("u1", "東京へ").await.unwrap();
        assert!(ctx.people.is_empty());
        assert!(ctx.rules.is_empty());
    }

    #[tokio::test]
    async fn query_slice_comes_from_window_limited_history() {
        let store = Arc::new(InMemoryConversationStore::new());
        store.append("u1", "cli", Role::User, "試験").await;
        for turn in ["x", "y", "z", "w"] {
            store.append("u1", "cli", Role::User, turn).await;
        }
        let ctx = assembler(store.clone(), 2).assemble("u1", "!").await.unwrap();
        assert_eq!(ctx.history.len(), 2);
        assert_eq!(ctx.query, "zw!");
        assert!(ctx.rules.is_empty());
    }

    #[tokio::test]
    async fn history_matches_reach_the_catalogs() {
        let store = Arc::new(InMemoryConversationStore::new());
        store.append("u1", "cli", Role::User, "明日は試験").await;
        store.append("u1", "cli", Role::Assistant, "不安ですわ。").await;
        let ctx = assembler(store, 10).assemble("u1", "がんばる").await.unwrap();
        assert_eq!(ctx.history.len(), 2);
        assert_eq!(ctx.rules.len(), 1);
        assert_eq!(ctx.rules[0].rules, vec!["緊張を表す。".to_string()]);
    }

    #[tokio::test]
    async fn degraded_history_is_empty_but_flagged() {
        let ctx = assembler(Arc::new(BrokenStore), 10)
            .assemble("u1", "こんにちは")
            .await
            .unwrap();
        assert!(ctx.history.is_empty());
        assert!(ctx.history_degraded);
    }

    #[tokio::test]
    async fn broken_catalog_is_an_error() {
        let assembler = ContextAssembler::new(
            Arc::new(TermIndex::new(CatalogSource::inline("terms", "not json"))),
            Arc::new(RuleIndex::new(CatalogSource::inline("rules", RULES))),
            Arc::new(InMemoryConversationStore::new()),
            10,
        );
        let err = assembler.assemble("u1", "hi").await.unwrap_err();
        assert_eq!(err.code(), "catalog_unavailable");
    }
}
