use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::models::queue::{PairingOutcome, QueueEntry};
use crate::models::room::{AnswerSheet, Room, VerdictSheet};
use crate::models::round::{decide_outcome, random_letter, total_score, MatchOutcome};
use crate::repositories::kv_store::KeyValueStore;
use crate::repositories::queue_repository::KvQueueRepository;
use crate::repositories::room_repository::KvRoomRepository;
use crate::services::errors::CoordinatorError;
use crate::services::judge_service::{AnswerJudge, JudgeService};
use crate::services::matchmaking_service::MatchmakingService;
use crate::services::room_service::RoomService;
use crate::services::round_session::RoundSession;

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Hard deadline per round.
    pub round_seconds: u32,
    /// Fixed interval for queue polling and opponent-result polling.
    pub poll_interval: Duration,
    /// Queue entries older than this are pruned as abandoned.
    pub queue_ttl: chrono::Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        CoordinatorConfig {
            round_seconds: 60,
            poll_interval: Duration::from_secs(2),
            queue_ttl: chrono::Duration::seconds(60),
        }
    }
}

/// A successful pairing, from the local player's point of view.
#[derive(Debug, Clone)]
pub struct PairedMatch {
    pub room: Room,
    pub entry: QueueEntry,
    pub opponent_name: String,
}

/// Final standing once both results are in.
#[derive(Debug, Clone)]
pub struct MatchReport {
    pub my_score: u32,
    pub opponent_score: u32,
    pub outcome: MatchOutcome,
}

/// Orchestrates matchmaking, the round state machine, grading and result
/// exchange into the two player-visible flows: finding a match and awaiting
/// the opponent's result.
#[derive(Clone)]
pub struct MatchCoordinator {
    matchmaking: MatchmakingService,
    rooms: RoomService,
    judge: JudgeService,
    config: CoordinatorConfig,
}

impl MatchCoordinator {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        judge: Arc<dyn AnswerJudge>,
        config: CoordinatorConfig,
    ) -> Self {
        let rooms = RoomService::new(Arc::new(KvRoomRepository::new(store.clone())));
        let matchmaking = MatchmakingService::new(
            Arc::new(KvQueueRepository::new(store)),
            rooms.clone(),
            config.queue_ttl,
        );
        MatchCoordinator {
            matchmaking,
            rooms,
            judge: JudgeService::new(judge),
            config,
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Enter matchmaking and stay in it until paired. An immediate match
    /// returns right away; otherwise the queue is polled at the configured
    /// interval until another client pulls us out and leaves a room behind.
    ///
    /// The initial join is the only call whose failure is surfaced — the
    /// player can retry it. Errors inside the poll loop are swallowed and
    /// retried on the next wake-up. To abandon the search, drop this future
    /// and call [`MatchCoordinator::cancel_search`].
    pub async fn find_match(&self, player_name: &str) -> Result<PairedMatch, CoordinatorError> {
        let entry = QueueEntry::new(player_name);

        match self.matchmaking.join(&entry).await? {
            PairingOutcome::Matched(room) => Ok(Self::paired(room, entry)),
            PairingOutcome::Waiting => self.await_pairing(entry).await,
        }
    }

    async fn await_pairing(&self, entry: QueueEntry) -> Result<PairedMatch, CoordinatorError> {
        loop {
            tokio::time::sleep(self.config.poll_interval).await;

            let still_queued = match self.matchmaking.poll(&entry.id).await {
                Ok(still_queued) => still_queued,
                Err(error) => {
                    debug!("Queue poll failed, retrying: {}", error);
                    continue;
                }
            };
            if still_queued {
                continue;
            }

            // We were removed — someone matched with us. Their room write or
            // pointer write may not be visible yet, so keep looking.
            match self.matchmaking.find_room_for(&entry.id).await {
                Ok(Some(room)) => {
                    info!("{} was matched into room {}", entry.name, room.id);
                    return Ok(Self::paired(room, entry));
                }
                Ok(None) => debug!("Removed from queue but room not visible yet"),
                Err(error) => debug!("Room lookup failed, retrying: {}", error),
            }
        }
    }

    fn paired(room: Room, entry: QueueEntry) -> PairedMatch {
        let opponent_name = room
            .opponent_of(&entry.name)
            .unwrap_or("Opponent")
            .to_string();
        PairedMatch {
            room,
            entry,
            opponent_name,
        }
    }

    /// Leave the queue after an abandoned search. Best-effort: a search that
    /// already produced a room stands, and a store failure here only means
    /// the entry expires via its TTL instead.
    pub async fn cancel_search(&self, entry: &QueueEntry) {
        if let Err(error) = self.matchmaking.cancel(&entry.id).await {
            warn!("Could not remove {} from the queue: {}", entry.name, error);
        }
    }

    /// Start the local round for a paired match. Both sides play the same
    /// letter from the shared room.
    pub fn start_round(&self, paired: &PairedMatch) -> RoundSession {
        RoundSession::for_room(&paired.room, &paired.entry.name, self.config.round_seconds)
    }

    /// Start a roomless round against a freshly drawn letter.
    pub fn start_solo_round(&self) -> RoundSession {
        RoundSession::solo(random_letter(), self.config.round_seconds)
    }

    /// Advance the round clock by one second, forcing submission when the
    /// deadline is reached. Returns the score if this tick settled the round.
    pub async fn tick(&self, session: &mut RoundSession) -> Option<u32> {
        if session.tick() {
            self.submit(session).await
        } else {
            None
        }
    }

    /// Submit the round: grade the answers (falling back to the local
    /// heuristic if the judge is out) and, for an online round, push the
    /// result into the room. Idempotent — a second call, including the timer
    /// racing a manual submit, is a silent no-op returning `None`.
    pub async fn submit(&self, session: &mut RoundSession) -> Option<u32> {
        if !session.begin_submission() {
            return None;
        }
        session.mark_validating();

        let verdicts = self
            .judge
            .judge_answers(session.answers(), session.letter())
            .await;
        let score = session.complete_submission(verdicts.clone());

        if let Some(seat) = session.seat() {
            if let Err(error) = self
                .rooms
                .submit_result(&seat.room_id, &seat.player_name, session.answers(), &verdicts)
                .await
            {
                // Degraded but local-only: our score stands, the opponent
                // just won't see it.
                warn!("Could not push result to room {}: {}", seat.room_id, error);
            }
        }

        Some(score)
    }

    /// Poll the room until the opponent's result lands. Store hiccups are
    /// retried forever; a room that vanished never completes, which the
    /// caller bounds by dropping the future.
    pub async fn await_opponent(
        &self,
        session: &RoundSession,
    ) -> Result<(AnswerSheet, VerdictSheet), CoordinatorError> {
        let seat = session.seat().ok_or(CoordinatorError::NotAnOnlineRound)?;

        loop {
            match self
                .rooms
                .await_opponent_result(&seat.room_id, &seat.player_name)
                .await
            {
                Ok(Some(result)) => return Ok(result),
                Ok(None) => debug!("Opponent result not in yet for room {}", seat.room_id),
                Err(error) => debug!("Room poll failed, retrying: {}", error),
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Settle the match: both totals and win/lose/tie by plain comparison.
    pub fn finalize(
        &self,
        session: &RoundSession,
        opponent_verdicts: &VerdictSheet,
    ) -> MatchReport {
        let my_score = session.score();
        let opponent_score = total_score(opponent_verdicts);
        MatchReport {
            my_score,
            opponent_score,
            outcome: decide_outcome(my_score, opponent_score),
        }
    }
}
