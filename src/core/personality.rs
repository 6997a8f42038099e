use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use super::compatibility;
use super::error::{FriendError, Result};
use super::friend::authorize_friend;
use super::mbti;
use super::store::FriendStore;

/// Personality profile of a friend: four MBTI axes plus the Big Five.
///
/// At most one profile exists per friend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Personality {
    pub id: String,

    #[serde(skip_serializing, default)]
    pub friend_id: String,

    /// Extraversion (-100) to Introversion (100)
    pub extroversion_introversion: f64,
    /// Sensing (-100) to Intuition (100)
    pub sensing_intuition: f64,
    /// Thinking (-100) to Feeling (100)
    pub thinking_feeling: f64,
    /// Judging (-100) to Perceiving (100)
    pub judging_perceiving: f64,

    /// Openness (0-100)
    pub openness: f64,
    /// Conscientiousness (0-100)
    pub conscientiousness: f64,
    /// Extraversion (0-100)
    pub extraversion: f64,
    /// Agreeableness (0-100)
    pub agreeableness: f64,
    /// Neuroticism (0-100)
    pub neuroticism: f64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The nine trait values needed to create a profile
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalityTraits {
    pub extroversion_introversion: f64,
    pub sensing_intuition: f64,
    pub thinking_feeling: f64,
    pub judging_perceiving: f64,
    pub openness: f64,
    pub conscientiousness: f64,
    pub extraversion: f64,
    pub agreeableness: f64,
    pub neuroticism: f64,
}

/// Partial update; absent fields stay unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalityUpdate {
    pub extroversion_introversion: Option<f64>,
    pub sensing_intuition: Option<f64>,
    pub thinking_feeling: Option<f64>,
    pub judging_perceiving: Option<f64>,
    pub openness: Option<f64>,
    pub conscientiousness: Option<f64>,
    pub extraversion: Option<f64>,
    pub agreeableness: Option<f64>,
    pub neuroticism: Option<f64>,
}

/// MBTI classification next to the raw trait vectors
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalityAnalysis {
    pub mbti_type: String,
    pub mbti_scores: MbtiScores,
    pub big_five_scores: BigFiveScores,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MbtiScores {
    pub extroversion_introversion: f64,
    pub sensing_intuition: f64,
    pub thinking_feeling: f64,
    pub judging_perceiving: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BigFiveScores {
    pub openness: f64,
    pub conscientiousness: f64,
    pub extraversion: f64,
    pub agreeableness: f64,
    pub neuroticism: f64,
}

fn check_axis(name: &str, value: f64) -> Result<()> {
    if !(-100.0..=100.0).contains(&value) {
        return Err(FriendError::BadRequest(format!(
            "{} must be between -100 and 100",
            name
        )));
    }
    Ok(())
}

fn check_trait(name: &str, value: f64) -> Result<()> {
    if !(0.0..=100.0).contains(&value) {
        return Err(FriendError::BadRequest(format!(
            "{} must be between 0 and 100",
            name
        )));
    }
    Ok(())
}

fn validate(p: &Personality) -> Result<()> {
    check_axis("extroversionIntroversion", p.extroversion_introversion)?;
    check_axis("sensingIntuition", p.sensing_intuition)?;
    check_axis("thinkingFeeling", p.thinking_feeling)?;
    check_axis("judgingPerceiving", p.judging_perceiving)?;
    check_trait("openness", p.openness)?;
    check_trait("conscientiousness", p.conscientiousness)?;
    check_trait("extraversion", p.extraversion)?;
    check_trait("agreeableness", p.agreeableness)?;
    check_trait("neuroticism", p.neuroticism)?;
    Ok(())
}

/// Create the friend's profile; fails with `Conflict` if one already exists
pub fn create_personality(
    store: &FriendStore,
    friend_id: &str,
    traits: PersonalityTraits,
    owner_id: &str,
) -> Result<Personality> {
    authorize_friend(store, friend_id, owner_id)?;

    if store.get_personality(friend_id)?.is_some() {
        return Err(FriendError::Conflict(
            "personality profile already exists for this friend".to_string(),
        ));
    }

    let now = Utc::now();
    let personality = Personality {
        id: Ulid::new().to_string(),
        friend_id: friend_id.to_string(),
        extroversion_introversion: traits.extroversion_introversion,
        sensing_intuition: traits.sensing_intuition,
        thinking_feeling: traits.thinking_feeling,
        judging_perceiving: traits.judging_perceiving,
        openness: traits.openness,
        conscientiousness: traits.conscientiousness,
        extraversion: traits.extraversion,
        agreeableness: traits.agreeableness,
        neuroticism: traits.neuroticism,
        created_at: now,
        updated_at: now,
    };
    validate(&personality)?;

    // The unique index on friend_id closes the check-then-insert race
    store.insert_personality(&personality)?;
    Ok(personality)
}

pub fn get_personality(
    store: &FriendStore,
    friend_id: &str,
    owner_id: &str,
) -> Result<Personality> {
    authorize_friend(store, friend_id, owner_id)?;

    store.get_personality(friend_id)?.ok_or_else(|| {
        FriendError::NotFound("personality profile not found".to_string())
    })
}

/// Merge the provided trait values and re-validate every bound
pub fn update_personality(
    store: &FriendStore,
    friend_id: &str,
    update: PersonalityUpdate,
    owner_id: &str,
) -> Result<Personality> {
    let mut personality = get_personality(store, friend_id, owner_id)?;

    if let Some(v) = update.extroversion_introversion {
        personality.extroversion_introversion = v;
    }
    if let Some(v) = update.sensing_intuition {
        personality.sensing_intuition = v;
    }
    if let Some(v) = update.thinking_feeling {
        personality.thinking_feeling = v;
    }
    if let Some(v) = update.judging_perceiving {
        personality.judging_perceiving = v;
    }
    if let Some(v) = update.openness {
        personality.openness = v;
    }
    if let Some(v) = update.conscientiousness {
        personality.conscientiousness = v;
    }
    if let Some(v) = update.extraversion {
        personality.extraversion = v;
    }
    if let Some(v) = update.agreeableness {
        personality.agreeableness = v;
    }
    if let Some(v) = update.neuroticism {
        personality.neuroticism = v;
    }
    personality.updated_at = Utc::now();

    validate(&personality)?;
    store.update_personality(&personality)?;
    Ok(personality)
}

/// Delete the profile; the friend's score is unaffected
pub fn remove_personality(store: &FriendStore, friend_id: &str, owner_id: &str) -> Result<()> {
    get_personality(store, friend_id, owner_id)?;
    store.delete_personality(friend_id)
}

pub fn mbti_type(store: &FriendStore, friend_id: &str, owner_id: &str) -> Result<String> {
    let personality = get_personality(store, friend_id, owner_id)?;
    Ok(mbti::classify(&personality))
}

/// Classification plus the raw trait vectors, unmodified
pub fn personality_analysis(
    store: &FriendStore,
    friend_id: &str,
    owner_id: &str,
) -> Result<PersonalityAnalysis> {
    let p = get_personality(store, friend_id, owner_id)?;

    Ok(PersonalityAnalysis {
        mbti_type: mbti::classify(&p),
        mbti_scores: MbtiScores {
            extroversion_introversion: p.extroversion_introversion,
            sensing_intuition: p.sensing_intuition,
            thinking_feeling: p.thinking_feeling,
            judging_perceiving: p.judging_perceiving,
        },
        big_five_scores: BigFiveScores {
            openness: p.openness,
            conscientiousness: p.conscientiousness,
            extraversion: p.extraversion,
            agreeableness: p.agreeableness,
            neuroticism: p.neuroticism,
        },
    })
}

/// Pairwise compatibility of two friends' profiles (0-100)
pub fn compatibility_score(
    store: &FriendStore,
    friend_id: &str,
    other_friend_id: &str,
    owner_id: &str,
) -> Result<f64> {
    let a = get_personality(store, friend_id, owner_id)?;
    let b = get_personality(store, other_friend_id, owner_id)?;
    Ok(compatibility::compatibility(&a, &b))
}
