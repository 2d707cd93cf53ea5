//! Request/response contract for progress updates
//!
//! Requests are JSON objects tagged by `action`:
//!
//! ```json
//! { "action": "update_xp", "xp_earned": 10 }
//! { "action": "complete_module", "module_id": "level-2" }
//! { "action": "start_module", "module_id": "level-3" }
//! { "action": "record_myth_fact", "correct": true }
//! { "action": "set_last_visited", "route": "/learn/level-1" }
//! { "action": "reset" }
//! { "action": "get" }
//! ```
//!
//! Every response carries the current summary. Refused requests set
//! `ok: false` and explain why in `message`; the tracker is left untouched.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ProgressError;
use crate::lessons::Rewards;
use crate::navigation;
use crate::state::ProgressSummary;
use crate::tracker::ProgressTracker;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ProgressRequest {
    Get,
    UpdateXp {
        xp_earned: i64,
    },
    CompleteModule {
        module_id: String,
        /// Defaults to the configured level-completion reward
        #[serde(default)]
        xp_earned: Option<i64>,
    },
    StartModule {
        module_id: String,
    },
    RecordMythFact {
        correct: bool,
    },
    SetLastVisited {
        route: String,
    },
    Reset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub progress: ProgressSummary,
}

impl ProgressResponse {
    fn ok(tracker: &ProgressTracker, message: Option<String>) -> Self {
        Self {
            ok: true,
            message,
            progress: tracker.summary(),
        }
    }

    fn refused(tracker: &ProgressTracker, error: ProgressError) -> Self {
        Self {
            ok: false,
            message: Some(error.to_string()),
            progress: tracker.summary(),
        }
    }
}

/// Apply a request to a tracker
pub fn handle(
    tracker: &mut ProgressTracker,
    rewards: &Rewards,
    request: ProgressRequest,
) -> ProgressResponse {
    debug!(user_id = %tracker.user_id(), ?request, "Handling progress request");

    match request {
        ProgressRequest::Get => ProgressResponse::ok(tracker, None),
        ProgressRequest::UpdateXp { xp_earned } => {
            if tracker.award_xp(xp_earned) {
                ProgressResponse::ok(tracker, None)
            } else {
                ProgressResponse::refused(tracker, ProgressError::InvalidXp(xp_earned))
            }
        }
        ProgressRequest::CompleteModule {
            xp_earned: Some(xp),
            ..
        } if xp <= 0 => ProgressResponse::refused(tracker, ProgressError::InvalidXp(xp)),
        ProgressRequest::CompleteModule {
            module_id,
            xp_earned,
        } => match navigation::try_complete(tracker, &module_id) {
            Ok(true) => {
                tracker.award_xp(xp_earned.unwrap_or(rewards.level_complete));
                ProgressResponse::ok(tracker, Some(format!("Completed {}", module_id)))
            }
            Ok(false) => ProgressResponse::ok(
                tracker,
                Some(format!("{} was already completed", module_id)),
            ),
            Err(e) => ProgressResponse::refused(tracker, e),
        },
        ProgressRequest::StartModule { module_id } => {
            match navigation::enter_level(tracker, &module_id) {
                Ok(()) => ProgressResponse::ok(tracker, None),
                Err(e) => ProgressResponse::refused(tracker, e),
            }
        }
        ProgressRequest::RecordMythFact { correct } => {
            tracker.record_myth_fact_result(correct);
            ProgressResponse::ok(tracker, None)
        }
        ProgressRequest::SetLastVisited { route } => {
            tracker.set_last_visited(&route);
            ProgressResponse::ok(tracker, None)
        }
        ProgressRequest::Reset => {
            tracker.reset();
            ProgressResponse::ok(tracker, Some("Progress reset".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::{Curriculum, LevelId};
    use crate::state::UserId;
    use std::sync::Arc;

    fn tracker() -> ProgressTracker {
        ProgressTracker::new(UserId::new("api"), Arc::new(Curriculum::civic_default()))
    }

    #[test]
    fn test_request_parsing() {
        let request: ProgressRequest =
            serde_json::from_str(r#"{"action":"complete_module","module_id":"level-1"}"#).unwrap();
        assert_eq!(
            request,
            ProgressRequest::CompleteModule {
                module_id: "level-1".to_string(),
                xp_earned: None
            }
        );

        let request: ProgressRequest = serde_json::from_str(r#"{"action":"reset"}"#).unwrap();
        assert_eq!(request, ProgressRequest::Reset);
    }

    #[test]
    fn test_complete_module_awards_bonus_once() {
        let mut t = tracker();
        let rewards = Rewards::default();
        let request = ProgressRequest::CompleteModule {
            module_id: "level-1".to_string(),
            xp_earned: None,
        };

        let first = handle(&mut t, &rewards, request.clone());
        assert!(first.ok);
        assert_eq!(first.progress.xp, 50);
        assert_eq!(first.progress.completed_levels, vec![LevelId::from("level-1")]);

        let second = handle(&mut t, &rewards, request);
        assert!(second.ok);
        assert_eq!(second.progress.xp, 50);
    }

    #[test]
    fn test_locked_module_is_refused() {
        let mut t = tracker();
        let response = handle(
            &mut t,
            &Rewards::default(),
            ProgressRequest::CompleteModule {
                module_id: "level-4".to_string(),
                xp_earned: Some(20),
            },
        );
        assert!(!response.ok);
        assert!(response.message.unwrap().contains("locked"));
        assert_eq!(response.progress.xp, 0);
        assert_eq!(response.progress.completed, 0);
    }

    #[test]
    fn test_complete_module_with_non_positive_xp_is_refused() {
        let mut t = tracker();
        let response = handle(
            &mut t,
            &Rewards::default(),
            ProgressRequest::CompleteModule {
                module_id: "level-1".to_string(),
                xp_earned: Some(0),
            },
        );
        assert!(!response.ok);
        assert!(response.message.unwrap().contains("positive"));
        assert_eq!(response.progress.completed, 0);
        assert!(t.state().updated_at().is_none());
    }

    #[test]
    fn test_invalid_xp_is_refused() {
        let mut t = tracker();
        let response = handle(
            &mut t,
            &Rewards::default(),
            ProgressRequest::UpdateXp { xp_earned: -5 },
        );
        assert!(!response.ok);
        assert_eq!(response.progress.xp, 0);
    }

    #[test]
    fn test_response_serialization() {
        let mut t = tracker();
        let response = handle(&mut t, &Rewards::default(), ProgressRequest::Get);
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"ok\":true"));
        assert!(json.contains("\"current_level\":\"level-1\""));
        assert!(!json.contains("message"));
    }
}
