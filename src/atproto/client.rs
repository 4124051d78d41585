// SPDX-License-Identifier: MPL-2.0

use crate::atproto::types::{Conversation, FeedPage, FeedViewPost, Profile, Session};
use crate::config::DEFAULT_PDS;
use atrium_api::agent::AtpAgent;
use atrium_api::agent::store::MemorySessionStore;
use atrium_api::com::atproto::repo::{create_record, delete_record};
use atrium_api::types::Unknown;
use atrium_xrpc_client::reqwest::ReqwestClient;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("not authenticated")]
    NotAuthenticated,
}

type Agent = AtpAgent<MemorySessionStore, ReqwestClient>;

const LIKE_COLLECTION: &str = "app.bsky.feed.like";
const REPOST_COLLECTION: &str = "app.bsky.feed.repost";
const FOLLOW_COLLECTION: &str = "app.bsky.graph.follow";

/// Wraps atrium so the rest of the crate only sees our own types.
///
/// The agent sits behind a Tokio lock so every call yields a `Send` future
/// and can be spawned on the shared runtime.
pub struct SkyClient {
    agent: RwLock<Option<Agent>>,
    service_url: String,
}

impl SkyClient {
    pub fn new() -> Self {
        Self::with_service(DEFAULT_PDS)
    }

    pub fn with_service(service_url: &str) -> Self {
        Self {
            agent: RwLock::new(None),
            service_url: service_url.to_string(),
        }
    }

    pub async fn login(&self, handle: &str, password: &str) -> Result<Session, ClientError> {
        let client = ReqwestClient::new(&self.service_url);
        let agent = AtpAgent::new(client, MemorySessionStore::default());

        let result = agent
            .login(handle, password)
            .await
            .map_err(|e| ClientError::Auth(e.to_string()))?;

        let session = Session {
            did: result.data.did.to_string(),
            handle: result.data.handle.to_string(),
            access_jwt: result.data.access_jwt.clone(),
            refresh_jwt: result.data.refresh_jwt.clone(),
        };
        info!(handle = %session.handle, service = %self.service_url, "logged in");

        *self.agent.write().await = Some(agent);

        Ok(session)
    }

    pub async fn session(&self) -> Option<Session> {
        let guard = self.agent.read().await;
        let agent = guard.as_ref()?;
        let current = agent.get_session().await?;

        Some(Session {
            did: current.data.did.to_string(),
            handle: current.data.handle.to_string(),
            access_jwt: current.data.access_jwt.clone(),
            refresh_jwt: current.data.refresh_jwt.clone(),
        })
    }

    /// The home timeline ("Following").
    pub async fn get_timeline(&self, cursor: Option<&str>) -> Result<FeedPage, ClientError> {
        let guard = self.agent.read().await;
        let agent = guard.as_ref().ok_or(ClientError::NotAuthenticated)?;

        let params = atrium_api::app::bsky::feed::get_timeline::ParametersData {
            algorithm: None,
            cursor: cursor.map(String::from),
            limit: None,
        };

        let output = agent
            .api
            .app
            .bsky
            .feed
            .get_timeline(params.into())
            .await
            .map_err(network)?;

        Ok(FeedPage {
            posts: decode_each(&output.data.feed, "feed item"),
            cursor: output.data.cursor.clone(),
        })
    }

    /// A custom feed generator by its AT-URI.
    pub async fn get_feed(
        &self,
        feed_uri: &str,
        cursor: Option<&str>,
    ) -> Result<FeedPage, ClientError> {
        let guard = self.agent.read().await;
        let agent = guard.as_ref().ok_or(ClientError::NotAuthenticated)?;

        let params = atrium_api::app::bsky::feed::get_feed::ParametersData {
            feed: feed_uri.parse().map_err(|e| invalid("feed URI", e))?,
            cursor: cursor.map(String::from),
            limit: None,
        };

        let output = agent
            .api
            .app
            .bsky
            .feed
            .get_feed(params.into())
            .await
            .map_err(network)?;

        Ok(FeedPage {
            posts: decode_each(&output.data.feed, "feed item"),
            cursor: output.data.cursor.clone(),
        })
    }

    /// Posts, replies and reposts by one account.
    pub async fn get_author_feed(
        &self,
        actor: &str,
        cursor: Option<&str>,
    ) -> Result<FeedPage, ClientError> {
        let guard = self.agent.read().await;
        let agent = guard.as_ref().ok_or(ClientError::NotAuthenticated)?;

        let params = atrium_api::app::bsky::feed::get_author_feed::ParametersData {
            actor: actor.parse().map_err(|e| invalid("actor", e))?,
            cursor: cursor.map(String::from),
            filter: None,
            include_pins: None,
            limit: None,
        };

        let output = agent
            .api
            .app
            .bsky
            .feed
            .get_author_feed(params.into())
            .await
            .map_err(network)?;

        Ok(FeedPage {
            posts: decode_each::<_, FeedViewPost>(&output.data.feed, "author feed item"),
            cursor: output.data.cursor.clone(),
        })
    }

    pub async fn get_profile(&self, actor: &str) -> Result<Profile, ClientError> {
        let guard = self.agent.read().await;
        let agent = guard.as_ref().ok_or(ClientError::NotAuthenticated)?;

        let params = atrium_api::app::bsky::actor::get_profile::ParametersData {
            actor: actor.parse().map_err(|e| invalid("actor", e))?,
        };

        let output = agent
            .api
            .app
            .bsky
            .actor
            .get_profile(params.into())
            .await
            .map_err(network)?;

        decode(&output)
    }

    /// Like a post and return the URI of the created like record
    pub async fn like(&self, uri: &str, cid: &str) -> Result<String, ClientError> {
        let record = serde_json::json!({
            "$type": LIKE_COLLECTION,
            "subject": { "uri": uri, "cid": cid },
            "createdAt": now_timestamp()
        });
        self.create_record(LIKE_COLLECTION, record).await
    }

    /// Unlike a post by deleting the like record
    /// `like_uri` is the AT-URI of the like record (from the post viewer state)
    pub async fn unlike(&self, like_uri: &str) -> Result<(), ClientError> {
        self.delete_record(like_uri, LIKE_COLLECTION).await
    }

    /// Repost a post and return the URI of the created repost record
    pub async fn repost(&self, uri: &str, cid: &str) -> Result<String, ClientError> {
        let record = serde_json::json!({
            "$type": REPOST_COLLECTION,
            "subject": { "uri": uri, "cid": cid },
            "createdAt": now_timestamp()
        });
        self.create_record(REPOST_COLLECTION, record).await
    }

    /// Follow an account and return the URI of the follow record
    pub async fn follow(&self, did: &str) -> Result<String, ClientError> {
        let record = serde_json::json!({
            "$type": FOLLOW_COLLECTION,
            "subject": did,
            "createdAt": now_timestamp()
        });
        self.create_record(FOLLOW_COLLECTION, record).await
    }

    pub async fn unfollow(&self, follow_uri: &str) -> Result<(), ClientError> {
        self.delete_record(follow_uri, FOLLOW_COLLECTION).await
    }

    async fn create_record(
        &self,
        collection: &str,
        record: serde_json::Value,
    ) -> Result<String, ClientError> {
        let guard = self.agent.read().await;
        let agent = guard.as_ref().ok_or(ClientError::NotAuthenticated)?;
        let session = agent
            .get_session()
            .await
            .ok_or(ClientError::NotAuthenticated)?;

        let record: Unknown = serde_json::from_value(record)
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

        let collection = atrium_api::types::string::Nsid::new(collection.to_string())
            .map_err(|_| ClientError::InvalidResponse("invalid collection".into()))?;

        let input = create_record::InputData {
            collection,
            record,
            repo: session.data.did.clone().into(),
            rkey: None,
            swap_commit: None,
            validate: None,
        };

        let output = agent
            .api
            .com
            .atproto
            .repo
            .create_record(input.into())
            .await
            .map_err(network)?;

        debug!(uri = %output.data.uri, "created record");
        Ok(output.data.uri.to_string())
    }

    async fn delete_record(&self, record_uri: &str, collection: &str) -> Result<(), ClientError> {
        let guard = self.agent.read().await;
        let agent = guard.as_ref().ok_or(ClientError::NotAuthenticated)?;

        // at://did:plc:xxx/app.bsky.feed.like/rkey
        let parts: Vec<&str> = record_uri.split('/').collect();
        if parts.len() < 5 {
            return Err(ClientError::InvalidResponse("invalid record URI".into()));
        }
        let repo = parts[2];
        let rkey = parts[4];

        let collection = atrium_api::types::string::Nsid::new(collection.to_string())
            .map_err(|_| ClientError::InvalidResponse("invalid collection".into()))?;

        let input = delete_record::InputData {
            collection,
            repo: repo
                .parse()
                .map_err(|_| ClientError::InvalidResponse("invalid repo DID".into()))?,
            rkey: rkey.to_string(),
            swap_commit: None,
            swap_record: None,
        };

        agent
            .api
            .com
            .atproto
            .repo
            .delete_record(input.into())
            .await
            .map_err(network)?;

        debug!(uri = record_uri, "deleted record");
        Ok(())
    }

    /// Direct message conversations, newest first.
    pub async fn get_conversations(
        &self,
        cursor: Option<&str>,
    ) -> Result<(Vec<Conversation>, Option<String>), ClientError> {
        use atrium_api::agent::bluesky::{AtprotoServiceType, BSKY_CHAT_DID};

        let guard = self.agent.read().await;
        let agent = guard.as_ref().ok_or(ClientError::NotAuthenticated)?;

        // Chat API requires proxying through the chat service
        let chat_did = BSKY_CHAT_DID
            .parse()
            .map_err(|e| ClientError::Network(format!("invalid chat DID: {e}")))?;
        let chat_api = agent.api_with_proxy(chat_did, AtprotoServiceType::BskyChat);

        let params = atrium_api::chat::bsky::convo::list_convos::ParametersData {
            cursor: cursor.map(String::from),
            limit: None,
        };

        let output = chat_api
            .chat
            .bsky
            .convo
            .list_convos(params.into())
            .await
            .map_err(network)?;

        Ok((
            decode_each(&output.data.convos, "conversation"),
            output.data.cursor.clone(),
        ))
    }
}

impl Default for SkyClient {
    fn default() -> Self {
        Self::new()
    }
}

fn network(e: impl std::fmt::Display) -> ClientError {
    ClientError::Network(e.to_string())
}

fn invalid(what: &str, e: impl std::fmt::Display) -> ClientError {
    ClientError::InvalidResponse(format!("invalid {what}: {e}"))
}

fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Re-read an atrium view through JSON into one of our types.
fn decode<S: Serialize, T: DeserializeOwned>(view: &S) -> Result<T, ClientError> {
    let json =
        serde_json::to_value(view).map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
    serde_json::from_value(json).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

/// Decode a list item by item so one malformed entry does not sink a page.
fn decode_each<S: Serialize, T: DeserializeOwned>(views: &[S], what: &str) -> Vec<T> {
    views
        .iter()
        .filter_map(|view| match decode(view) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(error = %e, "skipping undecodable {what}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_calls_without_login_are_rejected() {
        let client = SkyClient::new();
        assert!(client.session().await.is_none());
        assert!(matches!(
            client.get_timeline(None).await,
            Err(ClientError::NotAuthenticated)
        ));
        assert!(matches!(
            client.unlike("at://did:plc:a/app.bsky.feed.like/1").await,
            Err(ClientError::NotAuthenticated)
        ));
    }

    #[test]
    fn test_decode_each_skips_bad_items() {
        let views = vec![
            serde_json::json!({"did": "did:plc:a", "handle": "a.test"}),
            serde_json::json!({"handle": "missing-did.test"}),
        ];
        let authors: Vec<crate::atproto::types::Author> = decode_each(&views, "author");
        assert_eq!(authors.len(), 1);
        assert_eq!(authors[0].handle, "a.test");
    }

    #[test]
    fn test_timestamp_is_rfc3339_millis() {
        let ts = now_timestamp();
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
        assert!(ts.ends_with('Z'));
    }
}
