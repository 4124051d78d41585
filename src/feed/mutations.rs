// SPDX-License-Identifier: MPL-2.0

//! Like, repost and follow commands, queued and carried out off the UI path.
//!
//! The timeline (or the profile view, for follows) pushes a [`Mutation`]
//! and moves on. A worker on the shared
//! runtime performs each one as its own task, so there is no ordering
//! between them, and reports a [`MutationOutcome`] back on a second channel.

use crate::atproto::types::ActorViewer;
use crate::atproto::{Profile, SkyClient};
use crate::runtime;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// `like` is the desired state. Unliking needs the viewer's like record.
    Like {
        uri: String,
        cid: String,
        like: bool,
        like_record: Option<String>,
    },
    Repost { uri: String, cid: String },
    /// `follow` is the desired state. Unfollowing needs the follow record.
    Follow {
        did: String,
        follow: bool,
        follow_record: Option<String>,
    },
}

impl Mutation {
    /// Follow the profile, or unfollow it if the viewer already follows.
    pub fn toggle_follow(profile: &Profile) -> Self {
        let following = profile.viewer.as_ref().and_then(|v| v.following.clone());
        Mutation::Follow {
            did: profile.did.clone(),
            follow: following.is_none(),
            follow_record: following,
        }
    }

    /// Post URI, or account DID for follows.
    pub fn subject(&self) -> &str {
        match self {
            Mutation::Like { uri, .. } | Mutation::Repost { uri, .. } => uri,
            Mutation::Follow { did, .. } => did,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// New like record, or `None` after an unlike.
    Liked {
        uri: String,
        like_record: Option<String>,
    },
    Reposted { uri: String, repost_record: String },
    /// New follow record, or `None` after an unfollow.
    Followed {
        did: String,
        follow_record: Option<String>,
    },
    Failed { uri: String, error: String },
}

impl MutationOutcome {
    /// Fold a follow outcome into the profile it targets.
    pub fn apply_to_profile(&self, profile: &mut Profile) {
        if let MutationOutcome::Followed { did, follow_record } = self {
            if *did != profile.did {
                return;
            }
            let viewer = profile.viewer.get_or_insert_with(ActorViewer::default);
            let count = profile.followers_count.get_or_insert(0);
            match (viewer.following.is_some(), follow_record.is_some()) {
                (false, true) => *count += 1,
                (true, false) => *count = count.saturating_sub(1),
                _ => {}
            }
            viewer.following = follow_record.clone();
        }
    }
}

/// Sending half of the mutation channel. Pushing never blocks.
#[derive(Debug, Clone)]
pub struct MutationQueue {
    tx: UnboundedSender<Mutation>,
}

impl MutationQueue {
    pub fn channel() -> (Self, UnboundedReceiver<Mutation>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn push(&self, mutation: Mutation) {
        debug!(?mutation, "queueing mutation");
        if self.tx.send(mutation).is_err() {
            warn!("mutation worker is gone, dropping command");
        }
    }
}

/// Carry out one mutation against the server.
pub async fn perform(client: &SkyClient, mutation: Mutation) -> MutationOutcome {
    let uri = mutation.subject().to_string();
    let result = match mutation {
        Mutation::Like {
            uri, cid, like: true, ..
        } => client.like(&uri, &cid).await.map(|record| MutationOutcome::Liked {
            uri,
            like_record: Some(record),
        }),
        Mutation::Like {
            uri,
            like: false,
            like_record: Some(record),
            ..
        } => client.unlike(&record).await.map(|()| MutationOutcome::Liked {
            uri,
            like_record: None,
        }),
        Mutation::Like {
            like: false,
            like_record: None,
            ..
        } => {
            return MutationOutcome::Failed {
                uri,
                error: "no like record to delete".to_string(),
            };
        }
        Mutation::Repost { uri, cid } => {
            client
                .repost(&uri, &cid)
                .await
                .map(|record| MutationOutcome::Reposted {
                    uri,
                    repost_record: record,
                })
        }
        Mutation::Follow {
            did, follow: true, ..
        } => client.follow(&did).await.map(|record| MutationOutcome::Followed {
            did,
            follow_record: Some(record),
        }),
        Mutation::Follow {
            did,
            follow: false,
            follow_record: Some(record),
        } => client.unfollow(&record).await.map(|()| MutationOutcome::Followed {
            did,
            follow_record: None,
        }),
        Mutation::Follow {
            follow: false,
            follow_record: None,
            ..
        } => {
            return MutationOutcome::Failed {
                uri,
                error: "no follow record to delete".to_string(),
            };
        }
    };

    result.unwrap_or_else(|e| MutationOutcome::Failed {
        uri,
        error: e.to_string(),
    })
}

/// Drain `rx` on the shared runtime, one task per mutation.
pub fn spawn_worker(
    client: Arc<SkyClient>,
    mut rx: UnboundedReceiver<Mutation>,
    outcomes: UnboundedSender<MutationOutcome>,
) -> JoinHandle<()> {
    runtime::spawn(async move {
        while let Some(mutation) = rx.recv().await {
            let client = Arc::clone(&client);
            let outcomes = outcomes.clone();
            tokio::spawn(async move {
                let outcome = perform(&client, mutation).await;
                if let MutationOutcome::Failed { uri, error } = &outcome {
                    warn!(%uri, %error, "mutation failed");
                }
                // The receiver may be gone during shutdown.
                let _ = outcomes.send(outcome);
            });
        }
        debug!("mutation queue closed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_delivers_in_push_order() {
        let (queue, mut rx) = MutationQueue::channel();
        queue.push(Mutation::Repost {
            uri: "at://a".to_string(),
            cid: "c".to_string(),
        });
        queue.push(Mutation::Like {
            uri: "at://b".to_string(),
            cid: "c".to_string(),
            like: true,
            like_record: None,
        });

        assert_eq!(rx.try_recv().unwrap().subject(), "at://a");
        assert_eq!(rx.try_recv().unwrap().subject(), "at://b");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_push_after_receiver_dropped_does_not_panic() {
        let (queue, rx) = MutationQueue::channel();
        drop(rx);
        queue.push(Mutation::Repost {
            uri: "at://a".to_string(),
            cid: "c".to_string(),
        });
    }

    fn profile(viewer: serde_json::Value) -> Profile {
        serde_json::from_value(serde_json::json!({
            "did": "did:plc:bob",
            "handle": "bob.test",
            "followersCount": 7,
            "viewer": viewer
        }))
        .unwrap()
    }

    #[test]
    fn test_toggle_follow_polarity() {
        let (queue, mut rx) = MutationQueue::channel();

        queue.push(Mutation::toggle_follow(&profile(serde_json::json!({}))));
        assert_eq!(
            rx.try_recv().unwrap(),
            Mutation::Follow {
                did: "did:plc:bob".to_string(),
                follow: true,
                follow_record: None,
            }
        );

        let followed = profile(serde_json::json!({
            "following": "at://did:plc:me/app.bsky.graph.follow/f1"
        }));
        queue.push(Mutation::toggle_follow(&followed));
        assert_eq!(
            rx.try_recv().unwrap(),
            Mutation::Follow {
                did: "did:plc:bob".to_string(),
                follow: false,
                follow_record: Some("at://did:plc:me/app.bsky.graph.follow/f1".to_string()),
            }
        );
    }

    #[test]
    fn test_follow_outcome_updates_profile() {
        let mut bob = profile(serde_json::Value::Null);

        MutationOutcome::Followed {
            did: "did:plc:bob".to_string(),
            follow_record: Some("at://f".to_string()),
        }
        .apply_to_profile(&mut bob);
        assert!(bob.is_followed());
        assert_eq!(bob.followers_count, Some(8));

        // Outcomes for someone else leave the profile alone.
        MutationOutcome::Followed {
            did: "did:plc:carol".to_string(),
            follow_record: None,
        }
        .apply_to_profile(&mut bob);
        assert!(bob.is_followed());

        MutationOutcome::Followed {
            did: "did:plc:bob".to_string(),
            follow_record: None,
        }
        .apply_to_profile(&mut bob);
        assert!(!bob.is_followed());
        assert_eq!(bob.followers_count, Some(7));
    }

    #[tokio::test]
    async fn test_mutations_fail_without_session() {
        let client = SkyClient::new();
        let outcome = perform(
            &client,
            Mutation::Like {
                uri: "at://a".to_string(),
                cid: "c".to_string(),
                like: true,
                like_record: None,
            },
        )
        .await;
        assert!(matches!(outcome, MutationOutcome::Failed { uri, .. } if uri == "at://a"));

        let outcome = perform(
            &client,
            Mutation::Like {
                uri: "at://a".to_string(),
                cid: "c".to_string(),
                like: false,
                like_record: None,
            },
        )
        .await;
        assert!(matches!(outcome, MutationOutcome::Failed { .. }));

        let outcome = perform(
            &client,
            Mutation::Follow {
                did: "did:plc:bob".to_string(),
                follow: true,
                follow_record: None,
            },
        )
        .await;
        assert!(matches!(outcome, MutationOutcome::Failed { uri, .. } if uri == "did:plc:bob"));
    }
}
