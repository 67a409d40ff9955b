//! Single-flight query dispatcher.
//!
//! The dispatcher owns the conversation and a busy flag. A submission is
//! accepted only when the trimmed text is non-empty and no request is
//! outstanding. Accepting appends the user message and marks the dispatcher
//! busy; settling appends exactly one system message and clears the flag,
//! whatever the outcome.
//!
//! Submitting is split into [`Dispatcher::begin`] and [`Dispatcher::settle`]
//! so an event loop can run the request on its own task and stay responsive
//! in between. [`Dispatcher::submit`] chains the two for callers that can
//! simply await.

use crate::client::{QueryClient, QueryError, QueryResponse};
use crate::conversation::{Conversation, Message};
use tracing::{debug, warn};

/// Text appended in place of a summary when a request fails for any reason.
pub const ERROR_MESSAGE: &str =
    "Sorry, there was an error processing your request. Please try again.";

/// Dispatcher state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchState {
    /// Ready to accept a submission.
    #[default]
    Idle,
    /// A request is outstanding; submissions are ignored.
    Busy,
}

impl std::fmt::Display for DispatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Busy => write!(f, "busy"),
        }
    }
}

/// An accepted submission whose request has not been sent yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuery {
    text: String,
}

impl PendingQuery {
    /// The trimmed query text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Issue the request for this query.
    pub async fn send(self, client: &dyn QueryClient) -> Result<QueryResponse, QueryError> {
        debug!(query = %self.text, "sending query");
        client.query(&self.text).await
    }
}

/// Owns the conversation and gates submissions with a busy flag.
#[derive(Debug, Default)]
pub struct Dispatcher {
    conversation: Conversation,
    state: DispatchState,
}

impl Dispatcher {
    /// Create an idle dispatcher with an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// The conversation so far.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Current state.
    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Whether a request is outstanding.
    pub fn is_busy(&self) -> bool {
        self.state == DispatchState::Busy
    }

    /// Accept a submission.
    ///
    /// Returns `None` without touching anything when the text is blank or a
    /// request is already outstanding. Otherwise appends the user message,
    /// marks the dispatcher busy and hands back the query to send.
    pub fn begin(&mut self, text: &str) -> Option<PendingQuery> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if self.is_busy() {
            debug!("submission ignored while a request is outstanding");
            return None;
        }

        self.conversation.push(Message::user(text));
        self.state = DispatchState::Busy;
        Some(PendingQuery {
            text: text.to_string(),
        })
    }

    /// Record the outcome of the outstanding request.
    ///
    /// Appends the summary on success or [`ERROR_MESSAGE`] on failure, then
    /// returns to idle. Returns the appended message.
    pub fn settle(&mut self, outcome: Result<QueryResponse, QueryError>) -> &Message {
        let message = match outcome {
            Ok(response) => Message::system(response.summary),
            Err(e) => {
                warn!(error = %e, "query failed");
                Message::system(ERROR_MESSAGE)
            }
        };
        self.conversation.push(message);
        self.state = DispatchState::Idle;
        // Just pushed, so the conversation cannot be empty.
        &self.conversation.messages()[self.conversation.len() - 1]
    }

    /// Accept `text`, send it and settle the result.
    ///
    /// Returns `false` when the submission was rejected and no request was
    /// issued.
    pub async fn submit(&mut self, client: &dyn QueryClient, text: &str) -> bool {
        let Some(pending) = self.begin(text) else {
            return false;
        };
        let outcome = pending.send(client).await;
        self.settle(outcome);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::HttpQueryClient;
    use crate::config::Config;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    /// Client that replays canned outcomes and records every query it sees.
    #[derive(Default)]
    struct ScriptedClient {
        outcomes: Mutex<VecDeque<Result<QueryResponse, QueryError>>>,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn with(outcomes: Vec<Result<QueryResponse, QueryError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl QueryClient for ScriptedClient {
        async fn query(&self, text: &str) -> Result<QueryResponse, QueryError> {
            self.seen.lock().unwrap().push(text.to_string());
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .expect("no scripted outcome left")
        }
    }

    fn server_error() -> QueryError {
        QueryError::Status {
            status: 500,
            message: "boom".into(),
        }
    }

    #[test]
    fn test_blank_input_is_ignored() {
        let mut dispatcher = Dispatcher::new();

        assert!(dispatcher.begin("").is_none());
        assert!(dispatcher.begin("   \t\n ").is_none());

        assert!(dispatcher.conversation().is_empty());
        assert_eq!(dispatcher.state(), DispatchState::Idle);
    }

    #[test]
    fn test_begin_appends_trimmed_user_message() {
        let mut dispatcher = Dispatcher::new();

        let pending = dispatcher.begin("  AAPL price?  ").unwrap();
        assert_eq!(pending.text(), "AAPL price?");
        assert_eq!(
            dispatcher.conversation().messages(),
            &[Message::user("AAPL price?")]
        );
        assert!(dispatcher.is_busy());
    }

    #[test]
    fn test_begin_while_busy_is_ignored() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.begin("first").unwrap();

        assert!(dispatcher.begin("second").is_none());
        assert_eq!(dispatcher.conversation().len(), 1);
        assert!(dispatcher.is_busy());

        dispatcher.settle(Ok(QueryResponse::summary("answer")));
        assert!(!dispatcher.is_busy());

        // Accepted again once settled.
        assert!(dispatcher.begin("second").is_some());
        assert_eq!(dispatcher.conversation().len(), 3);
    }

    #[test]
    fn test_settle_success_appends_summary() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.begin("AAPL price?").unwrap();

        let appended = dispatcher.settle(Ok(QueryResponse::summary("$190"))).clone();
        assert_eq!(appended, Message::system("$190"));
        assert_eq!(
            dispatcher.conversation().messages(),
            &[Message::user("AAPL price?"), Message::system("$190")]
        );
        assert_eq!(dispatcher.state(), DispatchState::Idle);
    }

    #[test]
    fn test_settle_failure_appends_error_message() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.begin("AAPL price?").unwrap();

        dispatcher.settle(Err(server_error()));
        assert_eq!(
            dispatcher.conversation().last(),
            Some(&Message::system(ERROR_MESSAGE))
        );
        assert_eq!(dispatcher.conversation().len(), 2);
        assert_eq!(dispatcher.state(), DispatchState::Idle);
    }

    #[tokio::test]
    async fn test_submit_sequence() {
        let client = ScriptedClient::with(vec![
            Ok(QueryResponse::summary("$190")),
            Err(server_error()),
            Ok(QueryResponse::summary("12.3M shares")),
        ]);
        let mut dispatcher = Dispatcher::new();

        assert!(dispatcher.submit(&client, "AAPL price?").await);
        assert!(!dispatcher.submit(&client, "   ").await);
        assert!(dispatcher.submit(&client, "MSFT price?").await);
        assert!(dispatcher.submit(&client, "AAPL volume?").await);

        assert_eq!(client.seen(), vec!["AAPL price?", "MSFT price?", "AAPL volume?"]);
        assert_eq!(
            dispatcher.conversation().messages(),
            &[
                Message::user("AAPL price?"),
                Message::system("$190"),
                Message::user("MSFT price?"),
                Message::system(ERROR_MESSAGE),
                Message::user("AAPL volume?"),
                Message::system("12.3M shares"),
            ]
        );
        assert!(!dispatcher.is_busy());
    }

    #[tokio::test]
    async fn test_submit_against_http_backend() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "summary": "$190" })))
            .expect(1)
            .mount(&server)
            .await;

        let config = Config::default().with_api_url(server.uri());
        let client = HttpQueryClient::from_config(&config).unwrap();
        let mut dispatcher = Dispatcher::new();

        assert!(dispatcher.submit(&client, "AAPL price?").await);
        assert_eq!(
            dispatcher.conversation().messages(),
            &[Message::user("AAPL price?"), Message::system("$190")]
        );
    }

    #[tokio::test]
    async fn test_submit_against_unreachable_backend() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = Config::default().with_api_url(format!("http://{addr}"));
        let client = HttpQueryClient::from_config(&config).unwrap();
        let mut dispatcher = Dispatcher::new();

        assert!(dispatcher.submit(&client, "AAPL price?").await);
        assert_eq!(
            dispatcher.conversation().last(),
            Some(&Message::system(ERROR_MESSAGE))
        );
        assert!(!dispatcher.is_busy());
    }

    #[test]
    fn test_dispatch_state_display() {
        assert_eq!(DispatchState::Idle.to_string(), "idle");
        assert_eq!(DispatchState::Busy.to_string(), "busy");
    }
}
