use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::PathBuf;

use super::error::{FriendError, Result};
use super::friend::Friend;
use super::interaction::{Interaction, InteractionKind};
use super::personality::Personality;

/// SQLite-backed storage for friends, interactions and personalities
pub struct FriendStore {
    conn: Connection,
}

fn parse_timestamp(idx: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn friend_from_row(row: &Row) -> rusqlite::Result<Friend> {
    let created_at: String = row.get(6)?;
    let updated_at: String = row.get(7)?;

    Ok(Friend {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        avatar: row.get(3)?,
        relationship_score: row.get(4)?,
        notes: row.get(5)?,
        created_at: parse_timestamp(6, created_at)?,
        updated_at: parse_timestamp(7, updated_at)?,
    })
}

fn interaction_from_row(row: &Row) -> rusqlite::Result<Interaction> {
    let kind: String = row.get(2)?;
    let metadata: Option<String> = row.get(4)?;
    let created_at: String = row.get(5)?;

    Ok(Interaction {
        id: row.get(0)?,
        friend_id: row.get(1)?,
        kind: kind
            .parse::<InteractionKind>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?,
        score_change: row.get(3)?,
        metadata: metadata
            .map(|m| serde_json::from_str(&m))
            .transpose()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?,
        created_at: parse_timestamp(5, created_at)?,
    })
}

fn personality_from_row(row: &Row) -> rusqlite::Result<Personality> {
    let created_at: String = row.get(11)?;
    let updated_at: String = row.get(12)?;

    Ok(Personality {
        id: row.get(0)?,
        friend_id: row.get(1)?,
        extroversion_introversion: row.get(2)?,
        sensing_intuition: row.get(3)?,
        thinking_feeling: row.get(4)?,
        judging_perceiving: row.get(5)?,
        openness: row.get(6)?,
        conscientiousness: row.get(7)?,
        extraversion: row.get(8)?,
        agreeableness: row.get(9)?,
        neuroticism: row.get(10)?,
        created_at: parse_timestamp(11, created_at)?,
        updated_at: parse_timestamp(12, updated_at)?,
    })
}

const FRIEND_COLUMNS: &str =
    "id, owner_id, name, avatar, relationship_score, notes, created_at, updated_at";
const INTERACTION_COLUMNS: &str = "id, friend_id, kind, score_change, metadata, created_at";
const PERSONALITY_COLUMNS: &str = "id, friend_id, extroversion_introversion, sensing_intuition, \
     thinking_feeling, judging_perceiving, openness, conscientiousness, extraversion, \
     agreeableness, neuroticism, created_at, updated_at";

impl FriendStore {
    /// Open (or create) the database at the given path
    pub fn new(db_path: PathBuf) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&db_path)?;
        tracing::debug!(path = %db_path.display(), "opened friend store");

        conn.execute(
            "CREATE TABLE IF NOT EXISTS friends (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                name TEXT NOT NULL,
                avatar TEXT,
                relationship_score REAL NOT NULL DEFAULT 0,
                notes TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS interactions (
                id TEXT PRIMARY KEY,
                friend_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                score_change REAL NOT NULL,
                metadata TEXT,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS personalities (
                id TEXT PRIMARY KEY,
                friend_id TEXT NOT NULL UNIQUE,
                extroversion_introversion REAL NOT NULL,
                sensing_intuition REAL NOT NULL,
                thinking_feeling REAL NOT NULL,
                judging_perceiving REAL NOT NULL,
                openness REAL NOT NULL,
                conscientiousness REAL NOT NULL,
                extraversion REAL NOT NULL,
                agreeableness REAL NOT NULL,
                neuroticism REAL NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_friends_owner ON friends(owner_id)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_interactions_friend ON interactions(friend_id)",
            [],
        )?;

        Ok(Self { conn })
    }

    /// Open a store in the default config directory
    pub fn default() -> Result<Self> {
        let data_dir = dirs::config_dir()
            .ok_or_else(|| FriendError::Config("Could not find config directory".to_string()))?
            .join("kizuna");

        Self::new(data_dir.join("kizuna.db"))
    }

    // --- friends ---

    pub fn insert_friend(&self, friend: &Friend) -> Result<()> {
        self.conn.execute(
            "INSERT INTO friends (id, owner_id, name, avatar, relationship_score, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                &friend.id,
                &friend.owner_id,
                &friend.name,
                &friend.avatar,
                friend.relationship_score,
                &friend.notes,
                friend.created_at.to_rfc3339(),
                friend.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_friend(&self, id: &str) -> Result<Option<Friend>> {
        let friend = self
            .conn
            .query_row(
                &format!("SELECT {} FROM friends WHERE id = ?1", FRIEND_COLUMNS),
                params![id],
                friend_from_row,
            )
            .optional()?;
        Ok(friend)
    }

    /// All friends of one owner, newest first
    pub fn list_friends_by_owner(&self, owner_id: &str) -> Result<Vec<Friend>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM friends WHERE owner_id = ?1 ORDER BY created_at DESC, id DESC",
            FRIEND_COLUMNS
        ))?;

        let friends = stmt
            .query_map(params![owner_id], friend_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(friends)
    }

    /// Update a friend's descriptive fields; the score is untouched
    pub fn update_friend_fields(&self, friend: &Friend) -> Result<()> {
        let rows_affected = self.conn.execute(
            "UPDATE friends SET name = ?1, avatar = ?2, notes = ?3, updated_at = ?4 WHERE id = ?5",
            params![
                &friend.name,
                &friend.avatar,
                &friend.notes,
                friend.updated_at.to_rfc3339(),
                &friend.id,
            ],
        )?;

        if rows_affected == 0 {
            return Err(FriendError::NotFound(format!(
                "friend {} not found",
                friend.id
            )));
        }
        Ok(())
    }

    /// Conditional score write: succeeds only if the stored score still
    /// matches the one the caller read. Returns false on conflict.
    pub fn update_score_if(&self, id: &str, expected: f64, new_score: f64) -> Result<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE friends SET relationship_score = ?1, updated_at = ?2
             WHERE id = ?3 AND relationship_score = ?4",
            params![new_score, Utc::now().to_rfc3339(), id, expected],
        )?;
        Ok(rows_affected == 1)
    }

    /// Delete a friend and everything scoped to it in one transaction
    pub fn delete_friend_cascade(&self, id: &str) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM interactions WHERE friend_id = ?1", params![id])?;
        tx.execute("DELETE FROM personalities WHERE friend_id = ?1", params![id])?;
        let rows_affected = tx.execute("DELETE FROM friends WHERE id = ?1", params![id])?;
        if rows_affected == 0 {
            return Err(FriendError::NotFound(format!("friend {} not found", id)));
        }
        tx.commit()?;
        Ok(())
    }

    // --- interactions ---

    /// Insert an interaction and apply its score delta atomically.
    ///
    /// Returns false without persisting anything if the conditional score
    /// write lost a race.
    pub fn record_interaction(
        &self,
        interaction: &Interaction,
        expected_score: f64,
        new_score: f64,
    ) -> Result<bool> {
        let metadata = interaction
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let tx = self.conn.unchecked_transaction()?;
        let rows_affected = tx.execute(
            "UPDATE friends SET relationship_score = ?1, updated_at = ?2
             WHERE id = ?3 AND relationship_score = ?4",
            params![
                new_score,
                Utc::now().to_rfc3339(),
                &interaction.friend_id,
                expected_score,
            ],
        )?;
        if rows_affected == 0 {
            // Dropping the transaction rolls back
            return Ok(false);
        }

        tx.execute(
            "INSERT INTO interactions (id, friend_id, kind, score_change, metadata, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &interaction.id,
                &interaction.friend_id,
                interaction.kind.as_str(),
                interaction.score_change,
                metadata,
                interaction.created_at.to_rfc3339(),
            ],
        )?;
        tx.commit()?;
        Ok(true)
    }

    /// Delete an interaction and apply the reversal delta atomically
    pub fn erase_interaction(
        &self,
        id: &str,
        friend_id: &str,
        expected_score: f64,
        new_score: f64,
    ) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let rows_affected = tx.execute(
            "UPDATE friends SET relationship_score = ?1, updated_at = ?2
             WHERE id = ?3 AND relationship_score = ?4",
            params![new_score, Utc::now().to_rfc3339(), friend_id, expected_score],
        )?;
        if rows_affected == 0 {
            return Ok(false);
        }

        let rows_affected = tx.execute(
            "DELETE FROM interactions WHERE id = ?1 AND friend_id = ?2",
            params![id, friend_id],
        )?;
        if rows_affected == 0 {
            return Err(FriendError::NotFound(format!(
                "interaction {} not found",
                id
            )));
        }
        tx.commit()?;
        Ok(true)
    }

    pub fn get_interaction(&self, friend_id: &str, id: &str) -> Result<Option<Interaction>> {
        let interaction = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM interactions WHERE id = ?1 AND friend_id = ?2",
                    INTERACTION_COLUMNS
                ),
                params![id, friend_id],
                interaction_from_row,
            )
            .optional()?;
        Ok(interaction)
    }

    /// A friend's interactions ordered by creation time descending
    pub fn list_interactions(&self, friend_id: &str) -> Result<Vec<Interaction>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM interactions WHERE friend_id = ?1 ORDER BY created_at DESC, id DESC",
            INTERACTION_COLUMNS
        ))?;

        let interactions = stmt
            .query_map(params![friend_id], interaction_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(interactions)
    }

    // --- personalities ---

    pub fn insert_personality(&self, personality: &Personality) -> Result<()> {
        let result = self.conn.execute(
            "INSERT INTO personalities (id, friend_id, extroversion_introversion, sensing_intuition,
                 thinking_feeling, judging_perceiving, openness, conscientiousness, extraversion,
                 agreeableness, neuroticism, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                &personality.id,
                &personality.friend_id,
                personality.extroversion_introversion,
                personality.sensing_intuition,
                personality.thinking_feeling,
                personality.judging_perceiving,
                personality.openness,
                personality.conscientiousness,
                personality.extraversion,
                personality.agreeableness,
                personality.neuroticism,
                personality.created_at.to_rfc3339(),
                personality.updated_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            // The unique index on friend_id catches concurrent creates
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(FriendError::Conflict(
                    "personality profile already exists for this friend".to_string(),
                ))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_personality(&self, friend_id: &str) -> Result<Option<Personality>> {
        let personality = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM personalities WHERE friend_id = ?1",
                    PERSONALITY_COLUMNS
                ),
                params![friend_id],
                personality_from_row,
            )
            .optional()?;
        Ok(personality)
    }

    pub fn update_personality(&self, personality: &Personality) -> Result<()> {
        let rows_affected = self.conn.execute(
            "UPDATE personalities SET extroversion_introversion = ?1, sensing_intuition = ?2,
                 thinking_feeling = ?3, judging_perceiving = ?4, openness = ?5,
                 conscientiousness = ?6, extraversion = ?7, agreeableness = ?8,
                 neuroticism = ?9, updated_at = ?10
             WHERE friend_id = ?11",
            params![
                personality.extroversion_introversion,
                personality.sensing_intuition,
                personality.thinking_feeling,
                personality.judging_perceiving,
                personality.openness,
                personality.conscientiousness,
                personality.extraversion,
                personality.agreeableness,
                personality.neuroticism,
                personality.updated_at.to_rfc3339(),
                &personality.friend_id,
            ],
        )?;

        if rows_affected == 0 {
            return Err(FriendError::NotFound(
                "personality profile not found".to_string(),
            ));
        }
        Ok(())
    }

    pub fn delete_personality(&self, friend_id: &str) -> Result<()> {
        let rows_affected = self.conn.execute(
            "DELETE FROM personalities WHERE friend_id = ?1",
            params![friend_id],
        )?;

        if rows_affected == 0 {
            return Err(FriendError::NotFound(
                "personality profile not found".to_string(),
            ));
        }
        Ok(())
    }
}
