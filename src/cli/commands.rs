use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kizuna", version, about = "Track friends, interactions and personality compatibility")]
pub struct Args {
    /// Owner identity every operation runs as
    #[arg(long, global = true, default_value = "local")]
    pub owner: String,

    /// Data directory (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage tracked friends
    Friend {
        #[command(subcommand)]
        command: FriendCommands,
    },
    /// Log and inspect score-affecting interactions
    Interaction {
        #[command(subcommand)]
        command: InteractionCommands,
    },
    /// Personality profiles and compatibility
    Personality {
        #[command(subcommand)]
        command: PersonalityCommands,
    },
}

#[derive(Subcommand)]
pub enum FriendCommands {
    /// Add a new friend (relationship score starts at 0)
    Add {
        name: String,
        #[arg(long)]
        avatar: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List all friends
    List,
    /// Show one friend
    Show { id: String },
    /// Update a friend's name, avatar or notes
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        avatar: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a friend and everything recorded about them
    Remove { id: String },
    /// Apply a score change (-100 to 100) directly
    Score {
        id: String,
        #[arg(allow_hyphen_values = true)]
        change: f64,
    },
}

#[derive(Subcommand)]
pub enum InteractionCommands {
    /// Record an interaction and move the relationship score
    Log {
        friend_id: String,
        /// meeting, call, message, activity, gift, help, conflict, celebration, other
        kind: String,
        #[arg(allow_hyphen_values = true)]
        change: f64,
        /// Free-form JSON object attached to the interaction
        #[arg(long)]
        metadata: Option<String>,
    },
    /// List a friend's interactions, newest first
    List { friend_id: String },
    /// Show one interaction
    Show { friend_id: String, id: String },
    /// Delete an interaction, reversing its score change
    Remove { friend_id: String, id: String },
    /// Interaction counts per type and per month
    Stats { friend_id: String },
}

#[derive(Subcommand)]
pub enum PersonalityCommands {
    /// Create a friend's personality profile
    Set {
        friend_id: String,
        /// Extraversion (-100) to Introversion (100)
        #[arg(long, allow_hyphen_values = true)]
        ei: f64,
        /// Sensing (-100) to Intuition (100)
        #[arg(long, allow_hyphen_values = true)]
        sn: f64,
        /// Thinking (-100) to Feeling (100)
        #[arg(long, allow_hyphen_values = true)]
        tf: f64,
        /// Judging (-100) to Perceiving (100)
        #[arg(long, allow_hyphen_values = true)]
        jp: f64,
        /// Openness (0-100)
        #[arg(long)]
        openness: f64,
        /// Conscientiousness (0-100)
        #[arg(long)]
        conscientiousness: f64,
        /// Extraversion (0-100)
        #[arg(long)]
        extraversion: f64,
        /// Agreeableness (0-100)
        #[arg(long)]
        agreeableness: f64,
        /// Neuroticism (0-100)
        #[arg(long)]
        neuroticism: f64,
    },
    /// Show the stored profile
    Show { friend_id: String },
    /// Update some trait values
    Edit {
        friend_id: String,
        #[arg(long, allow_hyphen_values = true)]
        ei: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        sn: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        tf: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        jp: Option<f64>,
        #[arg(long)]
        openness: Option<f64>,
        #[arg(long)]
        conscientiousness: Option<f64>,
        #[arg(long)]
        extraversion: Option<f64>,
        #[arg(long)]
        agreeableness: Option<f64>,
        #[arg(long)]
        neuroticism: Option<f64>,
    },
    /// Delete the profile (the friend's score is unaffected)
    Remove { friend_id: String },
    /// Show the 4-letter MBTI type
    Mbti { friend_id: String },
    /// Full analysis: MBTI type plus raw trait vectors
    Analyze { friend_id: String },
    /// Compatibility score (0-100) between two friends
    Compat { friend_id: String, other_id: String },
}
