use std::path::PathBuf;

use anyhow::Result;

use crate::config::Config;
use crate::core::friend::{
    apply_delta, create_friend, delete_friend, get_friend, list_friends, update_friend,
};
use crate::core::interaction::{
    create_interaction, get_interaction, interaction_statistics, list_interactions,
    remove_interaction,
};
use crate::core::personality::{
    compatibility_score, create_personality, get_personality, mbti_type, personality_analysis,
    remove_personality, update_personality,
};
use crate::core::{
    Friend, FriendStore, FriendUpdate, Interaction, InteractionKind, PersonalityTraits,
    PersonalityUpdate,
};

pub use commands::{Args, Commands, FriendCommands, InteractionCommands, PersonalityCommands};

mod commands;

fn open_store(data_dir: Option<PathBuf>) -> Result<FriendStore> {
    match data_dir {
        Some(dir) => {
            let config = Config::new(Some(dir))?;
            Ok(FriendStore::new(config.db_path())?)
        }
        None => Ok(FriendStore::default()?),
    }
}

fn print_friend(friend: &Friend) {
    println!(
        "{} - {} (Score: {:.2})",
        friend.id, friend.name, friend.relationship_score
    );
    if let Some(ref notes) = friend.notes {
        println!("  Notes: {}", notes);
    }
}

fn print_interaction(interaction: &Interaction) {
    println!(
        "{} - {} ({:+.2}) at {}",
        interaction.id,
        interaction.kind,
        interaction.score_change,
        interaction.created_at.format("%Y-%m-%d %H:%M")
    );
}

pub fn handle_friend(
    command: FriendCommands,
    owner: &str,
    data_dir: Option<PathBuf>,
) -> Result<()> {
    let store = open_store(data_dir)?;

    match command {
        FriendCommands::Add { name, avatar, notes } => {
            let friend = create_friend(&store, owner, name, avatar, notes)?;
            println!("Added friend {} ({})", friend.name, friend.id);
        }
        FriendCommands::List => {
            let friends = list_friends(&store, owner)?;
            if friends.is_empty() {
                println!("No friends found.");
                return Ok(());
            }
            println!("👥 Friends ({}):", friends.len());
            for friend in &friends {
                print_friend(friend);
            }
        }
        FriendCommands::Show { id } => {
            let friend = get_friend(&store, &id, owner)?;
            println!("{}", serde_json::to_string_pretty(&friend)?);
        }
        FriendCommands::Edit { id, name, avatar, notes } => {
            let update = FriendUpdate { name, avatar, notes };
            let friend = update_friend(&store, &id, update, owner)?;
            println!("Updated friend {}", friend.id);
            print_friend(&friend);
        }
        FriendCommands::Remove { id } => {
            delete_friend(&store, &id, owner)?;
            println!("Removed friend {}", id);
        }
        FriendCommands::Score { id, change } => {
            let friend = apply_delta(&store, &id, change, owner)?;
            println!(
                "Score change {:+.2} applied; {} is now at {:.2}",
                change, friend.name, friend.relationship_score
            );
        }
    }

    Ok(())
}

pub fn handle_interaction(
    command: InteractionCommands,
    owner: &str,
    data_dir: Option<PathBuf>,
) -> Result<()> {
    let store = open_store(data_dir)?;

    match command {
        InteractionCommands::Log { friend_id, kind, change, metadata } => {
            let kind: InteractionKind = kind.parse()?;
            let metadata = metadata
                .map(|m| serde_json::from_str(&m))
                .transpose()
                .map_err(|e| anyhow::anyhow!("metadata must be a JSON object: {}", e))?;

            let interaction =
                create_interaction(&store, &friend_id, kind, change, metadata, owner)?;
            let friend = get_friend(&store, &friend_id, owner)?;
            println!(
                "Logged {} ({:+.2}); {} is now at {:.2}",
                interaction.kind, interaction.score_change, friend.name, friend.relationship_score
            );
        }
        InteractionCommands::List { friend_id } => {
            let interactions = list_interactions(&store, &friend_id, owner)?;
            if interactions.is_empty() {
                println!("No interactions found.");
                return Ok(());
            }
            println!("📒 Interactions ({}):", interactions.len());
            for interaction in &interactions {
                print_interaction(interaction);
            }
        }
        InteractionCommands::Show { friend_id, id } => {
            let interaction = get_interaction(&store, &friend_id, &id, owner)?;
            println!("{}", serde_json::to_string_pretty(&interaction)?);
        }
        InteractionCommands::Remove { friend_id, id } => {
            remove_interaction(&store, &friend_id, &id, owner)?;
            let friend = get_friend(&store, &friend_id, owner)?;
            println!(
                "Removed interaction {}; {} is back at {:.2}",
                id, friend.name, friend.relationship_score
            );
        }
        InteractionCommands::Stats { friend_id } => {
            let stats = interaction_statistics(&store, &friend_id, owner)?;
            println!("📊 {}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

pub fn handle_personality(
    command: PersonalityCommands,
    owner: &str,
    data_dir: Option<PathBuf>,
) -> Result<()> {
    let store = open_store(data_dir)?;

    match command {
        PersonalityCommands::Set {
            friend_id,
            ei,
            sn,
            tf,
            jp,
            openness,
            conscientiousness,
            extraversion,
            agreeableness,
            neuroticism,
        } => {
            let traits = PersonalityTraits {
                extroversion_introversion: ei,
                sensing_intuition: sn,
                thinking_feeling: tf,
                judging_perceiving: jp,
                openness,
                conscientiousness,
                extraversion,
                agreeableness,
                neuroticism,
            };
            let personality = create_personality(&store, &friend_id, traits, owner)?;
            println!("Created personality profile {}", personality.id);
        }
        PersonalityCommands::Show { friend_id } => {
            let personality = get_personality(&store, &friend_id, owner)?;
            println!("{}", serde_json::to_string_pretty(&personality)?);
        }
        PersonalityCommands::Edit {
            friend_id,
            ei,
            sn,
            tf,
            jp,
            openness,
            conscientiousness,
            extraversion,
            agreeableness,
            neuroticism,
        } => {
            let update = PersonalityUpdate {
                extroversion_introversion: ei,
                sensing_intuition: sn,
                thinking_feeling: tf,
                judging_perceiving: jp,
                openness,
                conscientiousness,
                extraversion,
                agreeableness,
                neuroticism,
            };
            let personality = update_personality(&store, &friend_id, update, owner)?;
            println!("{}", serde_json::to_string_pretty(&personality)?);
        }
        PersonalityCommands::Remove { friend_id } => {
            remove_personality(&store, &friend_id, owner)?;
            println!("Removed personality profile for friend {}", friend_id);
        }
        PersonalityCommands::Mbti { friend_id } => {
            let code = mbti_type(&store, &friend_id, owner)?;
            println!("MBTI type: {}", code);
        }
        PersonalityCommands::Analyze { friend_id } => {
            let analysis = personality_analysis(&store, &friend_id, owner)?;
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }
        PersonalityCommands::Compat { friend_id, other_id } => {
            let score = compatibility_score(&store, &friend_id, &other_id, owner)?;
            println!("💞 Compatibility: {:.2}", score);
        }
    }

    Ok(())
}
