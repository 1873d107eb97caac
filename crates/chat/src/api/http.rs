//! HTTP implementation of the chat repository
//!
//! Talks to the chat REST endpoints. Uses synchronous HTTP (ureq) to be
//! executor-agnostic; callers that need concurrency run this on their own
//! threads.

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use ureq::Agent;

use super::normalize::{create_payload, normalize_message, normalize_page, normalize_thread, send_payload};
use super::traits::{
    AvailabilitySyncReport, ChatApi, CreateThreadInput, MessageQuery, SendMessageInput, ThreadQuery,
};
use super::wire::{MarkReadPayload, MessageDto, MessagePageDto, ThreadDto};
use super::ChatError;
use crate::models::{ChatMessage, ChatThread, MessageId, MessagePage, ThreadId};
use crate::session::{AuthEvent, SessionStore};

const THREADS_BASE: &str = "/api/v1/chat/threads";
const SYNC_AVAILABILITY: &str = "/api/v1/chat/sync-availability";

/// Chat repository backed by the REST API
pub struct HttpChatApi {
    base_url: String,
    agent: Agent,
    session: Arc<SessionStore>,
}

impl HttpChatApi {
    pub fn new(base_url: impl Into<String>, session: Arc<SessionStore>) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(30)))
            .build()
            .into();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            agent,
            session,
        }
    }

    /// Bearer token for the current session; no request is made without one
    fn auth_header(&self) -> Result<String, ChatError> {
        let token = self
            .session
            .access_token()
            .ok_or_else(|| ChatError::Auth("no session stored".to_string()))?;
        Ok(format!("Bearer {}", token))
    }

    /// Join a path onto the base URL, verbatim, with optional query pairs
    ///
    /// Thread endpoints carry a trailing slash; the availability sync
    /// endpoint does not. Callers pass the exact path.
    fn build_url(&self, path: &str, pairs: &[(&'static str, String)]) -> String {
        let mut url = format!("{}{}", self.base_url, path);
        if !pairs.is_empty() {
            let query: String = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(pairs.iter().map(|(k, v)| (*k, v.as_str())))
                .finish();
            url.push('?');
            url.push_str(&query);
        }
        url
    }

    fn threads_root(&self) -> String {
        format!("{}/", THREADS_BASE)
    }

    fn thread_path(&self, thread_id: &ThreadId, suffix: &str) -> String {
        format!(
            "{}/{}{}/",
            THREADS_BASE,
            urlencoding::encode(thread_id.as_str()),
            suffix
        )
    }

    /// Convert a transport error, announcing expiry when the server rejected
    /// our credentials
    fn handle_error(&self, err: ureq::Error) -> ChatError {
        let error = ChatError::from(err);
        if error.is_auth() {
            self.session.events().emit(&AuthEvent::TokenExpired);
        }
        error
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, ChatError> {
        let auth = self.auth_header()?;
        debug!("GET {}", url);
        let mut response = self
            .agent
            .get(url)
            .header("Authorization", &auth)
            .call()
            .map_err(|e| self.handle_error(e))?;
        response
            .body_mut()
            .read_json()
            .map_err(|e| ChatError::Network(e.to_string()))
    }

    fn post_json<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, ChatError> {
        let auth = self.auth_header()?;
        debug!("POST {}", url);
        let mut response = self
            .agent
            .post(url)
            .header("Authorization", &auth)
            .send_json(body)
            .map_err(|e| self.handle_error(e))?;
        response
            .body_mut()
            .read_json()
            .map_err(|e| ChatError::Network(e.to_string()))
    }

    fn post_empty<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, ChatError> {
        let auth = self.auth_header()?;
        debug!("POST {}", url);
        let mut response = self
            .agent
            .post(url)
            .header("Authorization", &auth)
            .send_empty()
            .map_err(|e| self.handle_error(e))?;
        response
            .body_mut()
            .read_json()
            .map_err(|e| ChatError::Network(e.to_string()))
    }
}

impl ChatApi for HttpChatApi {
    fn list_threads(&self, query: &ThreadQuery) -> Result<Vec<ChatThread>, ChatError> {
        let url = self.build_url(&self.threads_root(), &query.to_query_pairs());
        let dtos: Vec<ThreadDto> = self.get_json(&url)?;
        Ok(dtos.iter().map(normalize_thread).collect())
    }

    fn get_thread(&self, thread_id: &ThreadId) -> Result<ChatThread, ChatError> {
        let url = self.build_url(&self.thread_path(thread_id, ""), &[]);
        let dto: ThreadDto = self.get_json(&url)?;
        Ok(normalize_thread(&dto))
    }

    fn list_messages(
        &self,
        thread_id: &ThreadId,
        query: &MessageQuery,
    ) -> Result<MessagePage, ChatError> {
        let url = self.build_url(&self.thread_path(thread_id, "/messages"), &query.to_query_pairs());
        let dto: MessagePageDto = self.get_json(&url)?;
        Ok(normalize_page(&dto))
    }

    fn send_message(
        &self,
        thread_id: &ThreadId,
        input: &SendMessageInput,
    ) -> Result<ChatMessage, ChatError> {
        input.validate()?;
        let url = self.build_url(&self.thread_path(thread_id, "/messages"), &[]);
        let dto: MessageDto = self.post_json(&url, &send_payload(input))?;
        Ok(normalize_message(&dto))
    }

    fn create_thread(&self, input: &CreateThreadInput) -> Result<ChatThread, ChatError> {
        let url = self.build_url(&self.threads_root(), &[]);
        let dto: ThreadDto = self.post_json(&url, &create_payload(input))?;
        Ok(normalize_thread(&dto))
    }

    fn mark_read(
        &self,
        thread_id: &ThreadId,
        up_to: Option<&MessageId>,
    ) -> Result<ChatThread, ChatError> {
        let url = self.build_url(&self.thread_path(thread_id, "/read"), &[]);
        let payload = MarkReadPayload {
            message_id: up_to.map(|id| id.as_str().to_string()),
        };
        let dto: ThreadDto = self.post_json(&url, &payload)?;
        Ok(normalize_thread(&dto))
    }

    fn archive_thread(&self, thread_id: &ThreadId) -> Result<ChatThread, ChatError> {
        let url = self.build_url(&self.thread_path(thread_id, "/archive"), &[]);
        let dto: ThreadDto = self.post_empty(&url)?;
        Ok(normalize_thread(&dto))
    }

    fn unarchive_thread(&self, thread_id: &ThreadId) -> Result<ChatThread, ChatError> {
        let url = self.build_url(&self.thread_path(thread_id, "/unarchive"), &[]);
        let dto: ThreadDto = self.post_empty(&url)?;
        Ok(normalize_thread(&dto))
    }

    fn sync_availability(&self) -> Result<AvailabilitySyncReport, ChatError> {
        let url = self.build_url(SYNC_AVAILABILITY, &[]);
        self.post_empty(&url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn api_without_session() -> (HttpChatApi, TempDir) {
        let dir = TempDir::new().unwrap();
        let session = Arc::new(SessionStore::with_dir(dir.path()));
        (HttpChatApi::new("http://localhost:9", session), dir)
    }

    #[test]
    fn test_url_building() {
        let (api, _dir) = api_without_session();
        let query = ThreadQuery {
            archived: Some(true),
            ..ThreadQuery::default()
        };
        let url = api.build_url(&api.threads_root(), &query.to_query_pairs());
        assert_eq!(url, "http://localhost:9/api/v1/chat/threads/?archived=1");
    }

    #[test]
    fn test_thread_path_encodes_id() {
        let (api, _dir) = api_without_session();
        let path = api.thread_path(&ThreadId::new("t 1/x"), "/messages");
        assert_eq!(path, "/api/v1/chat/threads/t%201%2Fx/messages/");
    }

    #[test]
    fn test_sync_url_has_no_trailing_slash() {
        let (api, _dir) = api_without_session();
        let url = api.build_url(SYNC_AVAILABILITY, &[]);
        assert_eq!(url, "http://localhost:9/api/v1/chat/sync-availability");
    }

    #[test]
    fn test_missing_session_fails_before_any_request() {
        let (api, _dir) = api_without_session();
        let result = api.list_threads(&ThreadQuery::default());
        assert!(matches!(result, Err(ChatError::Auth(_))));
    }

    #[test]
    fn test_send_rejects_empty_input_locally() {
        let (api, _dir) = api_without_session();
        let result = api.send_message(&ThreadId::new("t1"), &SendMessageInput::default());
        assert!(matches!(result, Err(ChatError::Validation(_))));
    }
}
