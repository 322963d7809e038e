/// Like/dislike toggling
use crate::db::post_repo::{self, ReactionCounts};
use crate::error::{AppError, Result};
use crate::metrics::REACTIONS_TOTAL;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Like,
    Dislike,
}

impl Reaction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reaction::Like => "like",
            Reaction::Dislike => "dislike",
        }
    }
}

impl FromStr for Reaction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "like" => Ok(Reaction::Like),
            "dislike" => Ok(Reaction::Dislike),
            other => Err(AppError::Validation(format!(
                "Reaction must be 'like' or 'dislike', got '{other}'"
            ))),
        }
    }
}

/// A user's standing on one post. Never both liked and disliked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReactionState {
    #[default]
    Neutral,
    Liked,
    Disliked,
}

impl ReactionState {
    pub fn of(liked: bool, disliked: bool) -> Self {
        match (liked, disliked) {
            (true, _) => ReactionState::Liked,
            (false, true) => ReactionState::Disliked,
            (false, false) => ReactionState::Neutral,
        }
    }

    /// Repeating a reaction clears it; the opposite reaction replaces it
    pub fn transition(self, reaction: Reaction) -> Self {
        match (self, reaction) {
            (ReactionState::Liked, Reaction::Like) => ReactionState::Neutral,
            (ReactionState::Disliked, Reaction::Dislike) => ReactionState::Neutral,
            (_, Reaction::Like) => ReactionState::Liked,
            (_, Reaction::Dislike) => ReactionState::Disliked,
        }
    }
}

/// In-memory form of the toggle `post_repo::toggle_reaction` performs in SQL
pub fn apply_toggle(likes: &mut Vec<Uuid>, dislikes: &mut Vec<Uuid>, user: Uuid, reaction: Reaction) {
    let next = ReactionState::of(likes.contains(&user), dislikes.contains(&user)).transition(reaction);
    likes.retain(|u| *u != user);
    dislikes.retain(|u| *u != user);
    match next {
        ReactionState::Liked => likes.push(user),
        ReactionState::Disliked => dislikes.push(user),
        ReactionState::Neutral => {}
    }
}

/// Toggle `reaction` for `user_id` on `post_id` and return the new counts
pub async fn toggle(
    pool: &PgPool,
    post_id: Uuid,
    user_id: Uuid,
    reaction: Reaction,
) -> Result<ReactionCounts> {
    let counts = post_repo::toggle_reaction(pool, post_id, user_id, reaction.as_str())
        .await?
        .ok_or_else(|| AppError::NotFound("Blog not found".into()))?;

    REACTIONS_TOTAL.with_label_values(&[reaction.as_str()]).inc();
    tracing::debug!(
        %post_id,
        %user_id,
        state = ?ReactionState::of(counts.liked, counts.disliked),
        "reaction toggled"
    );
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reaction() {
        assert_eq!("like".parse::<Reaction>().unwrap(), Reaction::Like);
        assert_eq!("dislike".parse::<Reaction>().unwrap(), Reaction::Dislike);
        assert!("love".parse::<Reaction>().is_err());
        assert!("Like".parse::<Reaction>().is_err());
    }

    #[test]
    fn test_state_transitions() {
        use Reaction::*;
        use ReactionState::*;
        assert_eq!(Neutral.transition(Like), Liked);
        assert_eq!(Liked.transition(Like), Neutral);
        assert_eq!(Liked.transition(Dislike), Disliked);
        assert_eq!(Disliked.transition(Like), Liked);
        assert_eq!(Disliked.transition(Dislike), Neutral);
        assert_eq!(Neutral.transition(Dislike), Disliked);
    }

    #[test]
    fn test_double_toggle_restores_counts() {
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();
        for reaction in [Reaction::Like, Reaction::Dislike] {
            let mut likes = vec![other];
            let mut dislikes = vec![];
            apply_toggle(&mut likes, &mut dislikes, user, reaction);
            apply_toggle(&mut likes, &mut dislikes, user, reaction);
            assert_eq!(likes, vec![other]);
            assert!(dislikes.is_empty());
        }
    }

    #[test]
    fn test_user_never_in_both_sets() {
        let user = Uuid::new_v4();
        let mut likes = vec![];
        let mut dislikes = vec![];
        let sequence = [
            Reaction::Like,
            Reaction::Dislike,
            Reaction::Dislike,
            Reaction::Like,
            Reaction::Like,
            Reaction::Dislike,
        ];
        for reaction in sequence {
            apply_toggle(&mut likes, &mut dislikes, user, reaction);
            assert!(!(likes.contains(&user) && dislikes.contains(&user)));
            assert!(likes.len() <= 1 && dislikes.len() <= 1);
        }
        assert_eq!(dislikes, vec![user]);
    }
}
