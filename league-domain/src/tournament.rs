use std::sync::Arc;

use league_core::EliminationKind;

use crate::ServiceResult;

pub type TournamentId = i64;
pub type ParticipantId = i64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TournamentKind {
    Singles,
    Doubles,
    Teams,
}

#[derive(Clone, Debug)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub kind: TournamentKind,
    pub elimination: EliminationKind,
}

/// One entrant: a player, a fixed pair, or a team, depending on the
/// tournament kind. Read-only during bracket play except for `place`.
#[derive(Clone, Debug)]
pub struct Participant {
    pub id: ParticipantId,
    pub tournament: TournamentId,
    pub name: String,
    pub seed: Option<u32>,
    pub place: Option<u32>,
}

pub type ArcTournamentRepository = Arc<Box<dyn TournamentRepository + Send + Sync + 'static>>;
#[async_trait::async_trait]
pub trait TournamentRepository {
    async fn get_tournament(&self, id: TournamentId) -> ServiceResult<Option<Tournament>>;
}

pub type ArcParticipantRepository = Arc<Box<dyn ParticipantRepository + Send + Sync + 'static>>;
#[async_trait::async_trait]
pub trait ParticipantRepository {
    /// Entrants in seeding order; the caller fixed that order before
    /// bracket creation.
    async fn participants_by_tournament(
        &self,
        tournament: TournamentId,
    ) -> ServiceResult<Vec<Participant>>;
    async fn get_participant(&self, id: ParticipantId) -> ServiceResult<Option<Participant>>;
    async fn set_place(&self, id: ParticipantId, place: u32) -> ServiceResult<()>;
}
