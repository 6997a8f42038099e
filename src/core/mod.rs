pub mod compatibility;
pub mod error;
pub mod friend;
pub mod interaction;
pub mod mbti;
pub mod personality;
pub mod store;

pub use error::{FriendError, Result};
pub use friend::{Friend, FriendUpdate};
pub use interaction::{Interaction, InteractionKind, InteractionStats};
pub use personality::{Personality, PersonalityTraits, PersonalityUpdate};
pub use store::FriendStore;
