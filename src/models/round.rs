use rand::Rng;

use crate::models::room::VerdictSheet;

/// The fixed category list every round is played against.
pub const CATEGORIES: [&str; 7] = [
    "Country",
    "City",
    "Animal",
    "Food",
    "Celebrity",
    "Brand",
    "Object",
];

/// Points awarded for each category the judge accepts. No partial credit.
pub const POINTS_PER_CATEGORY: u32 = 10;

// Rare letters (Q, U, V, X, Y, Z) are left out so every category stays
// answerable.
const LETTER_POOL: &[u8] = b"ABCDEFGHIJKLMNOPRSTW";

/// Draw the round letter.
pub fn random_letter() -> char {
    let mut rng = rand::thread_rng();
    LETTER_POOL[rng.gen_range(0..LETTER_POOL.len())] as char
}

/// Where a player is in their round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    Idle,
    Playing,
    Submitted,
    Validating,
    Scored,
}

/// Final standing of an online match from one player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Win,
    Lose,
    Tie,
}

/// Sum of the fixed per-category award over every accepted category.
pub fn total_score(verdicts: &VerdictSheet) -> u32 {
    verdicts
        .values()
        .filter(|verdict| verdict.valid)
        .count() as u32
        * POINTS_PER_CATEGORY
}

pub fn decide_outcome(my_score: u32, opponent_score: u32) -> MatchOutcome {
    if my_score > opponent_score {
        MatchOutcome::Win
    } else if my_score < opponent_score {
        MatchOutcome::Lose
    } else {
        MatchOutcome::Tie
    }
}
