use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use super::error::{FriendError, Result};
use super::store::FriendStore;

/// Upper bound on retries when a conditional score write loses a race.
pub(crate) const SCORE_WRITE_RETRIES: u32 = 5;

/// A tracked friend with a bounded relationship-health score
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Friend {
    /// Unique identifier using ULID (time-sortable)
    pub id: String,

    /// Owner identity; used only for authorization comparisons
    #[serde(skip_serializing, default)]
    pub owner_id: String,

    pub name: String,

    pub avatar: Option<String>,

    /// Relationship health, always within 0.0-100.0
    pub relationship_score: f64,

    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Friend {
    /// Create a new friend owned by `owner_id`, starting at score 0
    pub fn new(
        owner_id: String,
        name: String,
        avatar: Option<String>,
        notes: Option<String>,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: Ulid::new().to_string(),
            owner_id,
            name,
            avatar,
            relationship_score: 0.0,
            notes,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a friend's descriptive fields.
///
/// The relationship score is deliberately absent: it only moves through
/// the interaction journal or an explicit score change.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendUpdate {
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub notes: Option<String>,
}

/// Resolve a friend and check it belongs to the caller.
///
/// Every friend-scoped operation goes through here before touching state.
pub fn authorize_friend(
    store: &FriendStore,
    friend_id: &str,
    owner_id: &str,
) -> Result<Friend> {
    let friend = store
        .get_friend(friend_id)?
        .ok_or_else(|| FriendError::NotFound(format!("friend {} not found", friend_id)))?;

    if friend.owner_id != owner_id {
        return Err(FriendError::Unauthorized(format!(
            "friend {} belongs to another owner",
            friend_id
        )));
    }

    Ok(friend)
}

pub fn create_friend(
    store: &FriendStore,
    owner_id: &str,
    name: String,
    avatar: Option<String>,
    notes: Option<String>,
) -> Result<Friend> {
    let friend = Friend::new(owner_id.to_string(), name, avatar, notes);
    store.insert_friend(&friend)?;
    Ok(friend)
}

/// List all friends of an owner, newest first
pub fn list_friends(store: &FriendStore, owner_id: &str) -> Result<Vec<Friend>> {
    store.list_friends_by_owner(owner_id)
}

pub fn get_friend(store: &FriendStore, friend_id: &str, owner_id: &str) -> Result<Friend> {
    authorize_friend(store, friend_id, owner_id)
}

/// Merge the provided fields into the friend and persist
pub fn update_friend(
    store: &FriendStore,
    friend_id: &str,
    update: FriendUpdate,
    owner_id: &str,
) -> Result<Friend> {
    let mut friend = authorize_friend(store, friend_id, owner_id)?;

    if let Some(name) = update.name {
        friend.name = name;
    }
    if let Some(avatar) = update.avatar {
        friend.avatar = Some(avatar);
    }
    if let Some(notes) = update.notes {
        friend.notes = Some(notes);
    }
    friend.updated_at = Utc::now();

    store.update_friend_fields(&friend)?;
    Ok(friend)
}

/// Delete a friend together with its interactions and personality
pub fn delete_friend(store: &FriendStore, friend_id: &str, owner_id: &str) -> Result<()> {
    authorize_friend(store, friend_id, owner_id)?;
    store.delete_friend_cascade(friend_id)
}

pub(crate) fn check_score_change(delta: f64) -> Result<()> {
    if !(-100.0..=100.0).contains(&delta) {
        return Err(FriendError::BadRequest(
            "score change must be between -100 and 100".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn check_resulting_score(score: f64) -> Result<()> {
    if !(0.0..=100.0).contains(&score) {
        return Err(FriendError::BadRequest(
            "resulting score must be between 0 and 100".to_string(),
        ));
    }
    Ok(())
}

/// Apply a bounded delta to a friend's relationship score.
///
/// Deltas that would push the score outside 0-100 are rejected, never
/// clamped, so every accepted delta is exactly reversible. The write is a
/// compare-and-write on the previously read score, retried on conflict.
pub fn apply_delta(
    store: &FriendStore,
    friend_id: &str,
    delta: f64,
    owner_id: &str,
) -> Result<Friend> {
    check_score_change(delta)?;

    for attempt in 0..SCORE_WRITE_RETRIES {
        let friend = authorize_friend(store, friend_id, owner_id)?;
        let new_score = friend.relationship_score + delta;
        check_resulting_score(new_score)?;

        if store.update_score_if(friend_id, friend.relationship_score, new_score)? {
            return authorize_friend(store, friend_id, owner_id);
        }

        tracing::debug!(friend_id, attempt, "score write conflict, retrying");
    }

    Err(FriendError::Integrity(format!(
        "score update for friend {} kept conflicting",
        friend_id
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> FriendStore {
        FriendStore::new(":memory:".into()).unwrap()
    }

    #[test]
    fn test_create_starts_at_zero() {
        let store = create_test_store();
        let friend = create_friend(&store, "alice", "Bob".to_string(), None, None).unwrap();

        assert_eq!(friend.relationship_score, 0.0);
        assert!(!friend.id.is_empty());

        let fetched = get_friend(&store, &friend.id, "alice").unwrap();
        assert_eq!(fetched.name, "Bob");
    }

    #[test]
    fn test_get_unknown_friend_is_not_found() {
        let store = create_test_store();
        let err = get_friend(&store, "missing", "alice").unwrap_err();
        assert!(matches!(err, FriendError::NotFound(_)));
    }

    #[test]
    fn test_other_owner_is_unauthorized_not_not_found() {
        let store = create_test_store();
        let friend = create_friend(&store, "alice", "Bob".to_string(), None, None).unwrap();

        let err = get_friend(&store, &friend.id, "mallory").unwrap_err();
        assert!(matches!(err, FriendError::Unauthorized(_)));
    }

    #[test]
    fn test_list_friends_scoped_to_owner() {
        let store = create_test_store();
        create_friend(&store, "alice", "Bob".to_string(), None, None).unwrap();
        create_friend(&store, "alice", "Carol".to_string(), None, None).unwrap();
        create_friend(&store, "eve", "Dave".to_string(), None, None).unwrap();

        assert_eq!(list_friends(&store, "alice").unwrap().len(), 2);
        assert_eq!(list_friends(&store, "eve").unwrap().len(), 1);
    }

    #[test]
    fn test_partial_update_merges_fields() {
        let store = create_test_store();
        let friend = create_friend(
            &store,
            "alice",
            "Bob".to_string(),
            None,
            Some("met at work".to_string()),
        )
        .unwrap();

        let update = FriendUpdate {
            name: Some("Robert".to_string()),
            ..Default::default()
        };
        let updated = update_friend(&store, &friend.id, update, "alice").unwrap();

        assert_eq!(updated.name, "Robert");
        assert_eq!(updated.notes.as_deref(), Some("met at work"));
        assert_eq!(updated.relationship_score, 0.0);
    }

    #[test]
    fn test_serialized_shape_keeps_null_fields() {
        let friend = Friend::new("alice".to_string(), "Bob".to_string(), None, None);

        let json = serde_json::to_value(&friend).unwrap();
        let object = json.as_object().unwrap();

        assert!(object.contains_key("avatar"));
        assert!(object["avatar"].is_null());
        assert!(object.contains_key("notes"));
        assert!(object["notes"].is_null());
        assert_eq!(object["relationshipScore"], 0.0);
        assert!(!object.contains_key("ownerId"));
    }

    #[test]
    fn test_apply_delta_moves_score() {
        let store = create_test_store();
        let friend = create_friend(&store, "alice", "Bob".to_string(), None, None).unwrap();

        let updated = apply_delta(&store, &friend.id, 40.0, "alice").unwrap();
        assert_eq!(updated.relationship_score, 40.0);

        let updated = apply_delta(&store, &friend.id, -15.0, "alice").unwrap();
        assert_eq!(updated.relationship_score, 25.0);
    }

    #[test]
    fn test_delta_out_of_range_is_rejected() {
        let store = create_test_store();
        let friend = create_friend(&store, "alice", "Bob".to_string(), None, None).unwrap();

        let err = apply_delta(&store, &friend.id, 101.0, "alice").unwrap_err();
        assert!(matches!(err, FriendError::BadRequest(_)));

        let err = apply_delta(&store, &friend.id, -100.5, "alice").unwrap_err();
        assert!(matches!(err, FriendError::BadRequest(_)));
    }

    #[test]
    fn test_resulting_score_is_rejected_not_clamped() {
        let store = create_test_store();
        let friend = create_friend(&store, "alice", "Bob".to_string(), None, None).unwrap();
        apply_delta(&store, &friend.id, 50.0, "alice").unwrap();

        let err = apply_delta(&store, &friend.id, 60.0, "alice").unwrap_err();
        assert!(matches!(err, FriendError::BadRequest(_)));

        // Rejection leaves the score untouched
        let friend = get_friend(&store, &friend.id, "alice").unwrap();
        assert_eq!(friend.relationship_score, 50.0);

        let err = apply_delta(&store, &friend.id, -51.0, "alice").unwrap_err();
        assert!(matches!(err, FriendError::BadRequest(_)));
        let friend = get_friend(&store, &friend.id, "alice").unwrap();
        assert_eq!(friend.relationship_score, 50.0);
    }

    #[test]
    fn test_exact_bounds_are_accepted() {
        let store = create_test_store();
        let friend = create_friend(&store, "alice", "Bob".to_string(), None, None).unwrap();

        let updated = apply_delta(&store, &friend.id, 100.0, "alice").unwrap();
        assert_eq!(updated.relationship_score, 100.0);

        let updated = apply_delta(&store, &friend.id, -100.0, "alice").unwrap();
        assert_eq!(updated.relationship_score, 0.0);
    }

    #[test]
    fn test_delta_on_other_owners_friend_is_unauthorized() {
        let store = create_test_store();
        let friend = create_friend(&store, "alice", "Bob".to_string(), None, None).unwrap();

        let err = apply_delta(&store, &friend.id, 10.0, "mallory").unwrap_err();
        assert!(matches!(err, FriendError::Unauthorized(_)));
    }

    #[test]
    fn test_delete_removes_friend() {
        let store = create_test_store();
        let friend = create_friend(&store, "alice", "Bob".to_string(), None, None).unwrap();

        delete_friend(&store, &friend.id, "alice").unwrap();
        let err = get_friend(&store, &friend.id, "alice").unwrap_err();
        assert!(matches!(err, FriendError::NotFound(_)));
    }
}
