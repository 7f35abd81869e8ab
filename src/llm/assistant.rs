use log::{debug, error, info};

use crate::config::{InsightScope, DEFAULT_MODEL_NAME};
use crate::error::{Result, StatementError};
use crate::llm::prompts::*;
use crate::llm::types::*;
use crate::llm::utils::encode_transactions;
use crate::schema::Transaction;

/// A conversation grounded in one snapshot of the ledger.
///
/// The context is encoded once at creation. When the ledger changes, build a
/// new session instead of patching this one. `send` takes `&mut self`, so a
/// turn always completes before the next one starts.
pub struct ChatSession<M: GenerativeModel> {
    model: M,
    model_name: String,
    system_instruction: String,
    history: Vec<Content>,
    transcript: Vec<ChatMessage>,
}

impl<M: GenerativeModel> ChatSession<M> {
    pub fn new(model: M, transactions: &[Transaction]) -> Result<Self> {
        if !model.is_configured() {
            return Err(StatementError::Configuration(
                "GEMINI_API_KEY environment variable not set".to_string(),
            ));
        }

        let encoded = encode_transactions(transactions);
        info!(
            "Starting chat session over {} transactions",
            transactions.len()
        );

        Ok(Self {
            model,
            model_name: DEFAULT_MODEL_NAME.to_string(),
            system_instruction: chat_system_prompt(&encoded, transactions.len()),
            history: Vec::new(),
            transcript: vec![ChatMessage::model(CHAT_GREETING)],
        })
    }

    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    /// Sends one user turn and returns the reply appended to the transcript.
    /// Blank input is ignored. Transport failures never escape: the reply is a
    /// fixed apology and the failed turn is left out of the model's history.
    pub async fn send(&mut self, text: &str) -> Option<&ChatMessage> {
        let user_text = text.trim();
        if user_text.is_empty() {
            return None;
        }

        self.transcript.push(ChatMessage::user(user_text));

        let mut contents = self.history.clone();
        contents.push(Content::user(user_text));
        let request = GenerationRequest::new(self.model_name.clone(), contents)
            .with_system_instruction(self.system_instruction.clone());

        let reply = match self.model.generate(request).await {
            Ok(answer) => {
                let answer = if answer.trim().is_empty() {
                    CHAT_EMPTY_REPLY.to_string()
                } else {
                    answer
                };
                self.history.push(Content::user(user_text));
                self.history.push(Content::model(answer.clone()));
                debug!("Chat turn {} completed", self.history.len() / 2);
                answer
            }
            Err(e) => {
                error!("Chat Error: {}", e);
                CHAT_ERROR_REPLY.to_string()
            }
        };

        self.transcript.push(ChatMessage::model(reply));
        self.transcript.last()
    }
}

/// One-shot free-text observations over the ledger, independent of any chat.
pub struct InsightGenerator<M: GenerativeModel> {
    model: M,
    model_name: String,
    scope: InsightScope,
}

impl<M: GenerativeModel> InsightGenerator<M> {
    pub fn new(model: M, scope: InsightScope) -> Self {
        Self {
            model,
            model_name: DEFAULT_MODEL_NAME.to_string(),
            scope,
        }
    }

    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    pub fn scope(&self) -> InsightScope {
        self.scope
    }

    /// Failures degrade to a fixed "unavailable" message.
    pub async fn generate(&self, batch: &[Transaction], ledger: &[Transaction]) -> String {
        let subject = match self.scope {
            InsightScope::NewBatchOnly => batch,
            InsightScope::FullLedger => ledger,
        };

        if subject.is_empty() || !self.model.is_configured() {
            return INSIGHTS_UNAVAILABLE.to_string();
        }

        let request = GenerationRequest::new(
            self.model_name.clone(),
            vec![Content::user(insight_prompt(&encode_transactions(subject)))],
        );

        match self.model.generate(request).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => INSIGHTS_UNAVAILABLE.to_string(),
            Err(e) => {
                error!("Insight generation failed: {}", e);
                INSIGHTS_UNAVAILABLE.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TransactionDraft;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedModel {
        replies: Mutex<VecDeque<Result<String>>>,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Result<String>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl GenerativeModel for ScriptedModel {
        async fn generate(&self, request: GenerationRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(StatementError::AnalysisService("script exhausted".into())))
        }
    }

    fn ledger() -> Vec<Transaction> {
        vec![Transaction::from_draft(
            "abcdef0123".to_string(),
            TransactionDraft {
                date: "2024-04-01".to_string(),
                description: "Rent".to_string(),
                amount: -900.0,
                category: "Housing".to_string(),
                notes: None,
                is_subscription: false,
            },
        )]
    }

    #[tokio::test]
    async fn test_chat_turns_are_ordered_and_carry_history() {
        let model = ScriptedModel::new(vec![
            Ok("You paid **900.00** in rent.".to_string()),
            Ok(CHAT_NO_MATCH.to_string()),
        ]);
        let mut session = ChatSession::new(model, &ledger()).unwrap();
        assert!(session.system_instruction().contains("[abcdef01] 2024-04-01 | Rent"));

        session.send("How much rent?").await.unwrap();
        let reply = session.send("Any gym fees?").await.unwrap();
        assert_eq!(reply.text, CHAT_NO_MATCH);

        let roles: Vec<ChatRole> = session.transcript().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![ChatRole::Model, ChatRole::User, ChatRole::Model, ChatRole::User, ChatRole::Model]
        );

        let requests = session.model.requests.lock().unwrap();
        assert_eq!(requests[1].contents.len(), 3);
        assert_eq!(requests[1].contents[1].role, "model");
    }

    #[tokio::test]
    async fn test_chat_failure_degrades_to_apology() {
        let model = ScriptedModel::new(vec![
            Err(StatementError::AnalysisService("boom".into())),
            Ok("   ".to_string()),
        ]);
        let mut session = ChatSession::new(model, &ledger()).unwrap();

        assert_eq!(session.send("hello").await.unwrap().text, CHAT_ERROR_REPLY);
        assert_eq!(session.send("again").await.unwrap().text, CHAT_EMPTY_REPLY);
        assert!(session.send("   ").await.is_none());
        assert_eq!(session.transcript().len(), 5);

        // The failed turn is not replayed as context.
        let requests = session.model.requests.lock().unwrap();
        assert_eq!(requests[1].contents.len(), 1);
    }

    #[tokio::test]
    async fn test_insight_scope_and_fallback() {
        let batch = ledger();
        let model = ScriptedModel::new(vec![Ok("Rent dominates.".to_string())]);
        let insights = InsightGenerator::new(model, InsightScope::NewBatchOnly);
        assert_eq!(insights.generate(&batch, &[]).await, "Rent dominates.");

        let failing = InsightGenerator::new(ScriptedModel::new(vec![]), InsightScope::FullLedger);
        assert_eq!(failing.generate(&batch, &batch).await, INSIGHTS_UNAVAILABLE);
        // Full-ledger scope over an empty ledger never calls out.
        assert_eq!(failing.generate(&batch, &[]).await, INSIGHTS_UNAVAILABLE);
        assert_eq!(failing.model.requests.lock().unwrap().len(), 1);
    }
}
