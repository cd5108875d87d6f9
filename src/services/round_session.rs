use crate::models::room::{AnswerSheet, Room, VerdictSheet};
use crate::models::round::{total_score, RoundPhase};

/// The session's attachment to an online room, if any. A solo round has none.
#[derive(Debug, Clone)]
pub struct RoomSeat {
    pub room_id: String,
    pub player_name: String,
}

/// One player's local progress through a single timed round:
/// `Idle -> Playing -> Submitted -> Validating -> Scored`.
///
/// The countdown and a manual submit race each other; both funnel into
/// [`RoundSession::begin_submission`], which fires at most once. Everything
/// here is plain local state — the coordinator drives the clock and the
/// grading call around it.
#[derive(Debug)]
pub struct RoundSession {
    letter: char,
    answers: AnswerSheet,
    time_remaining: u32,
    phase: RoundPhase,
    seat: Option<RoomSeat>,
    verdicts: Option<VerdictSheet>,
}

impl Default for RoundSession {
    fn default() -> Self {
        RoundSession {
            letter: '-',
            answers: AnswerSheet::new(),
            time_remaining: 0,
            phase: RoundPhase::Idle,
            seat: None,
            verdicts: None,
        }
    }
}

impl RoundSession {
    /// A session that has not started a round yet.
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn solo(letter: char, round_seconds: u32) -> Self {
        let mut session = Self::idle();
        session.start(letter, round_seconds, None);
        session
    }

    pub fn for_room(room: &Room, player_name: &str, round_seconds: u32) -> Self {
        let mut session = Self::idle();
        session.start(
            room.letter,
            round_seconds,
            Some(RoomSeat {
                room_id: room.id.clone(),
                player_name: player_name.to_string(),
            }),
        );
        session
    }

    /// Begin (or restart) a round: answers cleared, timer reset, `Playing`.
    pub fn start(&mut self, letter: char, round_seconds: u32, seat: Option<RoomSeat>) {
        self.letter = letter;
        self.answers = AnswerSheet::new();
        self.time_remaining = round_seconds;
        self.phase = RoundPhase::Playing;
        self.seat = seat;
        self.verdicts = None;
    }

    pub fn letter(&self) -> char {
        self.letter
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    pub fn seat(&self) -> Option<&RoomSeat> {
        self.seat.as_ref()
    }

    pub fn verdicts(&self) -> Option<&VerdictSheet> {
        self.verdicts.as_ref()
    }

    /// Total once scored; zero before.
    pub fn score(&self) -> u32 {
        self.verdicts.as_ref().map(total_score).unwrap_or(0)
    }

    /// Record an answer. Ignored outside `Playing` — inputs are dead once
    /// the round is submitted.
    pub fn set_answer(&mut self, category: &str, answer: &str) {
        if self.phase == RoundPhase::Playing {
            self.answers
                .insert(category.to_string(), answer.to_string());
        }
    }

    /// One second of countdown. Returns true exactly when the deadline is
    /// reached, which forces submission as if the player had pressed submit.
    /// Ticks outside `Playing` do nothing.
    pub fn tick(&mut self) -> bool {
        if self.phase != RoundPhase::Playing || self.time_remaining == 0 {
            return false;
        }
        self.time_remaining -= 1;
        self.time_remaining == 0
    }

    /// The single submission gate. First call moves `Playing -> Submitted`
    /// and returns true; any later call (timer racing a manual submit, or a
    /// double press) is a silent no-op.
    pub fn begin_submission(&mut self) -> bool {
        if self.phase != RoundPhase::Playing {
            return false;
        }
        self.phase = RoundPhase::Submitted;
        true
    }

    /// Grading is in flight.
    pub fn mark_validating(&mut self) {
        if self.phase == RoundPhase::Submitted {
            self.phase = RoundPhase::Validating;
        }
    }

    /// Store the grading result and settle the round. Returns the total.
    pub fn complete_submission(&mut self, verdicts: VerdictSheet) -> u32 {
        debug_assert!(matches!(
            self.phase,
            RoundPhase::Submitted | RoundPhase::Validating
        ));
        self.phase = RoundPhase::Scored;
        self.verdicts = Some(verdicts);
        self.score()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::room::CategoryVerdict;

    fn verdicts(pairs: &[(&str, bool)]) -> VerdictSheet {
        pairs
            .iter()
            .map(|(category, valid)| {
                (
                    category.to_string(),
                    CategoryVerdict {
                        valid: *valid,
                        reason: String::new(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn answers_only_mutate_while_playing() {
        let mut session = RoundSession::solo('B', 60);
        session.set_answer("Country", "Brazil");
        assert_eq!(session.answers()["Country"], "Brazil");

        session.begin_submission();
        session.set_answer("Country", "Belgium");
        assert_eq!(session.answers()["Country"], "Brazil");
    }

    #[test]
    fn countdown_reaches_deadline_once() {
        let mut session = RoundSession::solo('B', 3);
        assert!(!session.tick());
        assert!(!session.tick());
        assert!(session.tick());
        assert_eq!(session.time_remaining(), 0);
        // Further ticks never re-fire the deadline.
        assert!(!session.tick());
    }

    #[test]
    fn submission_fires_exactly_once() {
        let mut session = RoundSession::solo('B', 60);
        assert!(session.begin_submission());
        assert!(!session.begin_submission());
        assert_eq!(session.phase(), RoundPhase::Submitted);
    }

    #[test]
    fn ticks_stop_after_submission() {
        let mut session = RoundSession::solo('B', 60);
        session.begin_submission();
        assert!(!session.tick());
        assert_eq!(session.time_remaining(), 60);
    }

    #[test]
    fn full_phase_walk() {
        let mut session = RoundSession::solo('B', 60);
        assert_eq!(session.phase(), RoundPhase::Playing);

        assert!(session.begin_submission());
        session.mark_validating();
        assert_eq!(session.phase(), RoundPhase::Validating);

        let score =
            session.complete_submission(verdicts(&[("Country", true), ("City", false)]));
        assert_eq!(score, 10);
        assert_eq!(session.phase(), RoundPhase::Scored);
        assert_eq!(session.score(), 10);
    }

    #[test]
    fn idle_session_ignores_input_and_ticks() {
        let mut session = RoundSession::idle();
        assert_eq!(session.phase(), RoundPhase::Idle);
        session.set_answer("Country", "Brazil");
        assert!(session.answers().is_empty());
        assert!(!session.tick());
        assert!(!session.begin_submission());
    }

    #[test]
    fn restart_clears_a_scored_round() {
        let mut session = RoundSession::solo('B', 60);
        session.set_answer("Country", "Brazil");
        session.begin_submission();
        session.complete_submission(verdicts(&[("Country", true)]));

        session.start('C', 60, None);
        assert_eq!(session.phase(), RoundPhase::Playing);
        assert!(session.answers().is_empty());
        assert!(session.verdicts().is_none());
        assert_eq!(session.time_remaining(), 60);
    }

    #[test]
    fn room_session_carries_the_seat() {
        let room = Room::new('C', ("id-a", "Alice"), ("id-b", "Bob"));
        let session = RoundSession::for_room(&room, "Bob", 60);
        assert_eq!(session.letter(), 'C');
        let seat = session.seat().unwrap();
        assert_eq!(seat.room_id, room.id);
        assert_eq!(seat.player_name, "Bob");
    }
}
