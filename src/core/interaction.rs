use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ulid::Ulid;

use super::error::{FriendError, Result};
use super::friend::{authorize_friend, check_resulting_score, check_score_change, SCORE_WRITE_RETRIES};
use super::store::FriendStore;

/// Recognized kinds of score-affecting interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Meeting,
    Call,
    Message,
    Activity,
    Gift,
    Help,
    Conflict,
    Celebration,
    Other,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::Meeting => "meeting",
            InteractionKind::Call => "call",
            InteractionKind::Message => "message",
            InteractionKind::Activity => "activity",
            InteractionKind::Gift => "gift",
            InteractionKind::Help => "help",
            InteractionKind::Conflict => "conflict",
            InteractionKind::Celebration => "celebration",
            InteractionKind::Other => "other",
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionKind {
    type Err = FriendError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "meeting" => Ok(InteractionKind::Meeting),
            "call" => Ok(InteractionKind::Call),
            "message" => Ok(InteractionKind::Message),
            "activity" => Ok(InteractionKind::Activity),
            "gift" => Ok(InteractionKind::Gift),
            "help" => Ok(InteractionKind::Help),
            "conflict" => Ok(InteractionKind::Conflict),
            "celebration" => Ok(InteractionKind::Celebration),
            "other" => Ok(InteractionKind::Other),
            _ => Err(FriendError::BadRequest(format!(
                "unrecognized interaction type: {}",
                s
            ))),
        }
    }
}

/// A journaled event that moved a friend's relationship score.
///
/// Immutable once created except for deletion, which reverses the score
/// change exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub id: String,

    #[serde(skip_serializing, default)]
    pub friend_id: String,

    #[serde(rename = "type")]
    pub kind: InteractionKind,

    /// The delta actually applied to the friend's score at creation time
    pub score_change: f64,

    /// Opaque free-form document; no schema beyond "serializable"
    pub metadata: Option<Map<String, Value>>,

    pub created_at: DateTime<Utc>,
}

impl Interaction {
    pub fn new(
        friend_id: String,
        kind: InteractionKind,
        score_change: f64,
        metadata: Option<Map<String, Value>>,
    ) -> Self {
        Self {
            id: Ulid::new().to_string(),
            friend_id,
            kind,
            score_change,
            metadata,
            created_at: Utc::now(),
        }
    }
}

/// Per-friend interaction counts
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionStats {
    pub total: usize,
    pub by_type: BTreeMap<String, u64>,
    pub by_month: BTreeMap<String, u64>,
}

/// Record an interaction and move the friend's score in one atomic step.
///
/// If the ledger rejects the delta nothing is persisted; the journal and
/// the score are updated together or not at all.
pub fn create_interaction(
    store: &FriendStore,
    friend_id: &str,
    kind: InteractionKind,
    score_change: f64,
    metadata: Option<Map<String, Value>>,
    owner_id: &str,
) -> Result<Interaction> {
    check_score_change(score_change)?;

    for attempt in 0..SCORE_WRITE_RETRIES {
        let friend = authorize_friend(store, friend_id, owner_id)?;
        let new_score = friend.relationship_score + score_change;
        check_resulting_score(new_score)?;

        let interaction = Interaction::new(
            friend_id.to_string(),
            kind,
            score_change,
            metadata.clone(),
        );

        if store.record_interaction(&interaction, friend.relationship_score, new_score)? {
            return Ok(interaction);
        }

        tracing::debug!(friend_id, attempt, "interaction write conflict, retrying");
    }

    Err(FriendError::Integrity(format!(
        "interaction insert for friend {} kept conflicting",
        friend_id
    )))
}

pub fn get_interaction(
    store: &FriendStore,
    friend_id: &str,
    interaction_id: &str,
    owner_id: &str,
) -> Result<Interaction> {
    authorize_friend(store, friend_id, owner_id)?;

    store
        .get_interaction(friend_id, interaction_id)?
        .ok_or_else(|| {
            FriendError::NotFound(format!("interaction {} not found", interaction_id))
        })
}

/// Delete an interaction, reversing its score change exactly.
///
/// A reversal the ledger would reject means the stored delta no longer
/// matches what was applied, which is prior corruption, not a business
/// error.
pub fn remove_interaction(
    store: &FriendStore,
    friend_id: &str,
    interaction_id: &str,
    owner_id: &str,
) -> Result<()> {
    for attempt in 0..SCORE_WRITE_RETRIES {
        let friend = authorize_friend(store, friend_id, owner_id)?;
        let interaction = store
            .get_interaction(friend_id, interaction_id)?
            .ok_or_else(|| {
                FriendError::NotFound(format!("interaction {} not found", interaction_id))
            })?;

        let reversed = friend.relationship_score - interaction.score_change;
        if !(0.0..=100.0).contains(&reversed) {
            tracing::warn!(friend_id, interaction_id, "reversal would leave score out of bounds");
            return Err(FriendError::Integrity(format!(
                "reversing interaction {} would leave the score out of bounds",
                interaction_id
            )));
        }

        if store.erase_interaction(
            interaction_id,
            friend_id,
            friend.relationship_score,
            reversed,
        )? {
            return Ok(());
        }

        tracing::debug!(friend_id, attempt, "interaction delete conflict, retrying");
    }

    Err(FriendError::Integrity(format!(
        "interaction delete for friend {} kept conflicting",
        friend_id
    )))
}

/// List a friend's interactions, newest first
pub fn list_interactions(
    store: &FriendStore,
    friend_id: &str,
    owner_id: &str,
) -> Result<Vec<Interaction>> {
    authorize_friend(store, friend_id, owner_id)?;
    store.list_interactions(friend_id)
}

/// Count interactions in total, per kind, and per `YYYY-MM` bucket
pub fn interaction_statistics(
    store: &FriendStore,
    friend_id: &str,
    owner_id: &str,
) -> Result<InteractionStats> {
    authorize_friend(store, friend_id, owner_id)?;
    let interactions = store.list_interactions(friend_id)?;

    let mut by_type: BTreeMap<String, u64> = BTreeMap::new();
    let mut by_month: BTreeMap<String, u64> = BTreeMap::new();

    for interaction in &interactions {
        *by_type.entry(interaction.kind.to_string()).or_insert(0) += 1;

        let month_key = interaction.created_at.format("%Y-%m").to_string();
        *by_month.entry(month_key).or_insert(0) += 1;
    }

    Ok(InteractionStats {
        total: interactions.len(),
        by_type,
        by_month,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::friend::{apply_delta, create_friend, get_friend};

    fn create_test_store() -> FriendStore {
        FriendStore::new(":memory:".into()).unwrap()
    }

    fn test_friend(store: &FriendStore) -> String {
        create_friend(store, "alice", "Bob".to_string(), None, None)
            .unwrap()
            .id
    }

    #[test]
    fn test_kind_round_trip() {
        for name in [
            "meeting",
            "call",
            "message",
            "activity",
            "gift",
            "help",
            "conflict",
            "celebration",
            "other",
        ] {
            let kind: InteractionKind = name.parse().unwrap();
            assert_eq!(kind.to_string(), name);
        }
    }

    #[test]
    fn test_unknown_kind_is_bad_request() {
        let err = "party".parse::<InteractionKind>().unwrap_err();
        assert!(matches!(err, FriendError::BadRequest(_)));
    }

    #[test]
    fn test_create_moves_score() {
        let store = create_test_store();
        let friend_id = test_friend(&store);

        let interaction = create_interaction(
            &store,
            &friend_id,
            InteractionKind::Meeting,
            25.0,
            None,
            "alice",
        )
        .unwrap();
        assert_eq!(interaction.score_change, 25.0);

        let friend = get_friend(&store, &friend_id, "alice").unwrap();
        assert_eq!(friend.relationship_score, 25.0);
    }

    #[test]
    fn test_rejected_delta_persists_nothing() {
        let store = create_test_store();
        let friend_id = test_friend(&store);
        apply_delta(&store, &friend_id, 50.0, "alice").unwrap();

        let err = create_interaction(
            &store,
            &friend_id,
            InteractionKind::Gift,
            60.0,
            None,
            "alice",
        )
        .unwrap_err();
        assert!(matches!(err, FriendError::BadRequest(_)));

        // Neither score nor journal changed
        let friend = get_friend(&store, &friend_id, "alice").unwrap();
        assert_eq!(friend.relationship_score, 50.0);
        assert!(list_interactions(&store, &friend_id, "alice")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_delete_reverses_score_exactly() {
        let store = create_test_store();
        let friend_id = test_friend(&store);
        apply_delta(&store, &friend_id, 40.0, "alice").unwrap();

        let interaction = create_interaction(
            &store,
            &friend_id,
            InteractionKind::Call,
            10.0,
            None,
            "alice",
        )
        .unwrap();
        let friend = get_friend(&store, &friend_id, "alice").unwrap();
        assert_eq!(friend.relationship_score, 50.0);

        remove_interaction(&store, &friend_id, &interaction.id, "alice").unwrap();

        let friend = get_friend(&store, &friend_id, "alice").unwrap();
        assert_eq!(friend.relationship_score, 40.0);
        assert!(list_interactions(&store, &friend_id, "alice")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_reversal_out_of_bounds_is_integrity_fault() {
        let store = create_test_store();
        let friend_id = test_friend(&store);

        let interaction = create_interaction(
            &store,
            &friend_id,
            InteractionKind::Help,
            50.0,
            None,
            "alice",
        )
        .unwrap();

        // The score drifts below what the recorded delta needs
        apply_delta(&store, &friend_id, -30.0, "alice").unwrap();

        let err = remove_interaction(&store, &friend_id, &interaction.id, "alice").unwrap_err();
        assert!(matches!(err, FriendError::Integrity(_)));

        // Nothing was deleted and the score is untouched
        let friend = get_friend(&store, &friend_id, "alice").unwrap();
        assert_eq!(friend.relationship_score, 20.0);
        assert_eq!(
            list_interactions(&store, &friend_id, "alice").unwrap().len(),
            1
        );
    }

    #[test]
    fn test_serialized_shape_keeps_null_metadata() {
        let interaction =
            Interaction::new("friend".to_string(), InteractionKind::Call, 5.0, None);

        let json = serde_json::to_value(&interaction).unwrap();
        let object = json.as_object().unwrap();

        assert!(object.contains_key("metadata"));
        assert!(object["metadata"].is_null());
        assert_eq!(object["type"], "call");
        assert!(!object.contains_key("friendId"));
    }

    #[test]
    fn test_get_interaction_wrong_friend_is_not_found() {
        let store = create_test_store();
        let friend_a = test_friend(&store);
        let friend_b = create_friend(&store, "alice", "Carol".to_string(), None, None)
            .unwrap()
            .id;

        let interaction = create_interaction(
            &store,
            &friend_a,
            InteractionKind::Message,
            5.0,
            None,
            "alice",
        )
        .unwrap();

        let err = get_interaction(&store, &friend_b, &interaction.id, "alice").unwrap_err();
        assert!(matches!(err, FriendError::NotFound(_)));
    }

    #[test]
    fn test_list_is_newest_first() {
        let store = create_test_store();
        let friend_id = test_friend(&store);

        let first = create_interaction(
            &store,
            &friend_id,
            InteractionKind::Meeting,
            5.0,
            None,
            "alice",
        )
        .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let second = create_interaction(
            &store,
            &friend_id,
            InteractionKind::Call,
            5.0,
            None,
            "alice",
        )
        .unwrap();

        let listed = list_interactions(&store, &friend_id, "alice").unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[test]
    fn test_metadata_round_trip() {
        let store = create_test_store();
        let friend_id = test_friend(&store);

        let mut metadata = Map::new();
        metadata.insert("place".to_string(), Value::String("cafe".to_string()));
        metadata.insert("minutes".to_string(), Value::from(45));

        let interaction = create_interaction(
            &store,
            &friend_id,
            InteractionKind::Meeting,
            5.0,
            Some(metadata.clone()),
            "alice",
        )
        .unwrap();

        let fetched = get_interaction(&store, &friend_id, &interaction.id, "alice").unwrap();
        assert_eq!(fetched.metadata, Some(metadata));
    }

    #[test]
    fn test_statistics_buckets() {
        let store = create_test_store();
        let friend_id = test_friend(&store);

        for kind in [
            InteractionKind::Meeting,
            InteractionKind::Meeting,
            InteractionKind::Call,
        ] {
            create_interaction(&store, &friend_id, kind, 5.0, None, "alice").unwrap();
        }

        let stats = interaction_statistics(&store, &friend_id, "alice").unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_type.get("meeting"), Some(&2));
        assert_eq!(stats.by_type.get("call"), Some(&1));
        // No zero-count buckets
        assert_eq!(stats.by_type.len(), 2);

        let month_key = Utc::now().format("%Y-%m").to_string();
        assert_eq!(stats.by_month.get(&month_key), Some(&3));
        assert_eq!(stats.by_month.len(), 1);
    }

    #[test]
    fn test_statistics_other_owner_is_unauthorized() {
        let store = create_test_store();
        let friend_id = test_friend(&store);

        let err = interaction_statistics(&store, &friend_id, "mallory").unwrap_err();
        assert!(matches!(err, FriendError::Unauthorized(_)));
    }
}
