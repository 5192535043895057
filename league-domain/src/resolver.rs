use std::sync::Arc;

use log::info;

use crate::{
    ServiceError, ServiceResult,
    bracket::{ArcBracketRepository, BracketSide, Matchup, MatchupId, MatchupSource},
    tournament::{ArcParticipantRepository, ParticipantId},
};

/// The two participant slots of a matchup as currently knowable. A
/// `None` slot is pending, not an error: its source matchup has no
/// winner yet (or the slot is a bye).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolvedSlots {
    pub participant_a: Option<ParticipantId>,
    pub participant_b: Option<ParticipantId>,
}

impl ResolvedSlots {
    pub fn contains(&self, participant: ParticipantId) -> bool {
        self.participant_a == Some(participant) || self.participant_b == Some(participant)
    }
}

/// The side of a decided matchup that did not win. None for a bye.
pub fn not_winner(matchup: &Matchup) -> Option<ParticipantId> {
    let winner = matchup.winner?;
    if matchup.participant_a == Some(winner) {
        matchup.participant_b
    } else {
        matchup.participant_a
    }
}

pub type ArcMatchupService = Arc<Box<dyn MatchupService + Send + Sync + 'static>>;
#[async_trait::async_trait]
pub trait MatchupService {
    async fn resolve(&self, matchup: &Matchup) -> ServiceResult<ResolvedSlots>;
    async fn describe(&self, matchup: &Matchup) -> ServiceResult<String>;
    /// Records a decided winner and refreshes the one-hop dependents.
    async fn record_winner(
        &self,
        matchup: MatchupId,
        winner: ParticipantId,
    ) -> ServiceResult<()>;
}

pub struct MatchupServiceImpl {
    bracket_repository: ArcBracketRepository,
    participant_repository: ArcParticipantRepository,
}

impl MatchupServiceImpl {
    pub fn new(
        bracket_repository: ArcBracketRepository,
        participant_repository: ArcParticipantRepository,
    ) -> Self {
        Self {
            bracket_repository,
            participant_repository,
        }
    }

    /// Follows one source reference if its matchup is decided. Decided
    /// matchups have their slots materialized by `record_winner`, so
    /// `not_winner` needs no further hops.
    async fn resolve_slot(
        &self,
        fixed: Option<ParticipantId>,
        source: Option<MatchupSource>,
    ) -> ServiceResult<Option<ParticipantId>> {
        if fixed.is_some() {
            return Ok(fixed);
        }
        let Some(source) = source else {
            return Ok(None);
        };
        let Some(source_matchup) = self.bracket_repository.get_matchup(source.matchup).await?
        else {
            return ServiceError::invariant(format!(
                "source matchup {} is missing",
                source.matchup
            ));
        };
        if source_matchup.winner.is_none() {
            return Ok(None);
        }
        if source.wants_winner {
            Ok(source_matchup.winner)
        } else {
            Ok(not_winner(&source_matchup))
        }
    }

    async fn slot_description(
        &self,
        fixed: Option<ParticipantId>,
        source: Option<MatchupSource>,
    ) -> ServiceResult<String> {
        if let Some(participant) = self.resolve_slot(fixed, source).await? {
            let Some(record) = self.participant_repository.get_participant(participant).await?
            else {
                return ServiceError::invariant(format!(
                    "participant {} is missing",
                    participant
                ));
            };
            return Ok(record.name);
        }
        Ok(match source {
            Some(source) if source.wants_winner => format!("winner of match {}", source.matchup),
            Some(source) => format!("loser of match {}", source.matchup),
            None => "bye".to_string(),
        })
    }

    /// Writes freshly resolvable slots into the matchups that source
    /// the decided one. One hop only: slots further downstream stay
    /// lazy until their own sources decide.
    async fn update_affected(&self, decided: MatchupId) -> ServiceResult<()> {
        for dependent in self.bracket_repository.matchups_sourcing(decided).await? {
            let slots = self.resolve(&dependent).await?;
            self.bracket_repository
                .set_slot_participants(dependent.id, slots.participant_a, slots.participant_b)
                .await?;
        }
        Ok(())
    }

    /// Final-matchup bookkeeping: the winners final fixes first and
    /// second place, the losers final third.
    async fn assign_places(
        &self,
        matchup: &Matchup,
        winner: ParticipantId,
    ) -> ServiceResult<()> {
        let Some(round) = self.bracket_repository.get_round(matchup.round).await? else {
            return ServiceError::invariant(format!("round {} is missing", matchup.round));
        };
        let Some(bracket) = self.bracket_repository.get_bracket(round.bracket).await? else {
            return ServiceError::invariant(format!("bracket {} is missing", round.bracket));
        };
        let rounds = self.bracket_repository.rounds_by_bracket(bracket.id).await?;
        let last = rounds.iter().map(|r| r.number).max().unwrap_or(0);
        if round.number != last {
            return Ok(());
        }
        match bracket.side {
            BracketSide::Winners => {
                self.participant_repository.set_place(winner, 1).await?;
                if let Some(loser) = not_winner(matchup) {
                    self.participant_repository.set_place(loser, 2).await?;
                }
            }
            BracketSide::Losers => {
                self.participant_repository.set_place(winner, 3).await?;
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl MatchupService for MatchupServiceImpl {
    async fn resolve(&self, matchup: &Matchup) -> ServiceResult<ResolvedSlots> {
        Ok(ResolvedSlots {
            participant_a: self
                .resolve_slot(matchup.participant_a, matchup.source_a)
                .await?,
            participant_b: self
                .resolve_slot(matchup.participant_b, matchup.source_b)
                .await?,
        })
    }

    async fn describe(&self, matchup: &Matchup) -> ServiceResult<String> {
        let a = self
            .slot_description(matchup.participant_a, matchup.source_a)
            .await?;
        let b = self
            .slot_description(matchup.participant_b, matchup.source_b)
            .await?;
        Ok(format!("{} vs {}", a, b))
    }

    async fn record_winner(
        &self,
        matchup: MatchupId,
        winner: ParticipantId,
    ) -> ServiceResult<()> {
        let Some(record) = self.bracket_repository.get_matchup(matchup).await? else {
            return ServiceError::not_found(format!("matchup {} does not exist", matchup));
        };
        if record.winner.is_some() {
            return ServiceError::not_possible(format!("matchup {} is already decided", matchup));
        }
        let slots = self.resolve(&record).await?;
        if !slots.contains(winner) {
            return ServiceError::bad_request(format!(
                "participant {} is not part of matchup {}",
                winner, matchup
            ));
        }
        // materialize the slots so dependents can read the loser
        self.bracket_repository
            .set_slot_participants(record.id, slots.participant_a, slots.participant_b)
            .await?;
        self.bracket_repository.set_winner(record.id, winner).await?;
        info!("matchup {}: winner {} recorded", matchup, winner);
        self.update_affected(record.id).await?;

        let decided = Matchup {
            participant_a: slots.participant_a,
            participant_b: slots.participant_b,
            winner: Some(winner),
            ..record
        };
        self.assign_places(&decided, winner).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::{BracketRepository, BracketService, BracketServiceImpl};
    use crate::memory::{
        InMemoryBracketRepository, InMemoryParticipantRepository, InMemoryTournamentRepository,
    };
    use crate::tournament::{Participant, ParticipantRepository, Tournament, TournamentKind};
    use league_core::EliminationKind;

    struct Fixture {
        brackets: Arc<InMemoryBracketRepository>,
        participants: Arc<InMemoryParticipantRepository>,
        builder: BracketServiceImpl,
        service: MatchupServiceImpl,
    }

    async fn build_fixture(elimination: EliminationKind, entrants: usize) -> Fixture {
        let tournament_repo = Arc::new(InMemoryTournamentRepository::new(vec![Tournament {
            id: 1,
            name: "City Open".to_string(),
            kind: TournamentKind::Singles,
            elimination,
        }]));
        let participant_repo = Arc::new(InMemoryParticipantRepository::new(
            (0..entrants)
                .map(|i| Participant {
                    id: (i + 1) as ParticipantId,
                    tournament: 1,
                    name: format!("Entrant {}", i + 1),
                    seed: Some((i + 1) as u32),
                    place: None,
                })
                .collect(),
        ));
        let bracket_repo = Arc::new(InMemoryBracketRepository::new());
        let builder = BracketServiceImpl::new(
            Arc::new(Box::new(tournament_repo.as_ref().clone())),
            Arc::new(Box::new(participant_repo.as_ref().clone())),
            Arc::new(Box::new(bracket_repo.as_ref().clone())),
        );
        builder.generate(1).await.unwrap();
        let service = MatchupServiceImpl::new(
            Arc::new(Box::new(bracket_repo.as_ref().clone())),
            Arc::new(Box::new(participant_repo.as_ref().clone())),
        );
        Fixture {
            brackets: bracket_repo,
            participants: participant_repo,
            builder,
            service,
        }
    }

    async fn round_matchups(fixture: &Fixture, side: BracketSide, number: u32) -> Vec<Matchup> {
        let bracket = fixture
            .brackets
            .find_bracket(1, side)
            .await
            .unwrap()
            .unwrap();
        let round = fixture
            .brackets
            .find_round(bracket.id, number)
            .await
            .unwrap()
            .unwrap();
        fixture.brackets.matchups_by_round(round.id).await.unwrap()
    }

    #[tokio::test]
    async fn test_pending_then_resolved_after_record() {
        let fixture = build_fixture(EliminationKind::Single, 4).await;
        let first = round_matchups(&fixture, BracketSide::Winners, 1).await;
        let final_round = round_matchups(&fixture, BracketSide::Winners, 2).await;
        let final_matchup = &final_round[0];

        let pending = fixture.service.resolve(final_matchup).await.unwrap();
        assert_eq!(pending, ResolvedSlots::default());
        let description = fixture.service.describe(final_matchup).await.unwrap();
        assert_eq!(
            description,
            format!(
                "winner of match {} vs winner of match {}",
                first[0].id, first[1].id
            )
        );

        // 1 beats 4, then the final's first slot resolves immediately
        fixture.service.record_winner(first[0].id, 1).await.unwrap();
        let refreshed = fixture
            .brackets
            .get_matchup(final_matchup.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(refreshed.participant_a, Some(1));
        let slots = fixture.service.resolve(&refreshed).await.unwrap();
        assert_eq!(slots.participant_a, Some(1));
        assert_eq!(slots.participant_b, None);
    }

    #[tokio::test]
    async fn test_record_winner_validates_participant() {
        let fixture = build_fixture(EliminationKind::Single, 4).await;
        let first = round_matchups(&fixture, BracketSide::Winners, 1).await;
        // entrant 2 plays in the other matchup
        assert!(matches!(
            fixture.service.record_winner(first[0].id, 2).await,
            Err(ServiceError::BadRequest(_))
        ));
        assert!(matches!(
            fixture.service.record_winner(999, 1).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_record_winner_twice_rejected() {
        let fixture = build_fixture(EliminationKind::Single, 4).await;
        let first = round_matchups(&fixture, BracketSide::Winners, 1).await;
        fixture.service.record_winner(first[0].id, 1).await.unwrap();
        assert!(matches!(
            fixture.service.record_winner(first[0].id, 4).await,
            Err(ServiceError::NotPossible(_))
        ));
    }

    #[tokio::test]
    async fn test_loser_feeds_losers_bracket() {
        let fixture = build_fixture(EliminationKind::Double, 4).await;
        let wb1 = round_matchups(&fixture, BracketSide::Winners, 1).await;
        let lb1 = round_matchups(&fixture, BracketSide::Losers, 1).await;

        fixture.service.record_winner(wb1[0].id, 1).await.unwrap();
        fixture.service.record_winner(wb1[1].id, 2).await.unwrap();

        let refreshed = fixture
            .brackets
            .get_matchup(lb1[0].id)
            .await
            .unwrap()
            .unwrap();
        let slots = fixture.service.resolve(&refreshed).await.unwrap();
        // the losers of 1v4 and 2v3 drop in
        assert_eq!(slots.participant_a, Some(4));
        assert_eq!(slots.participant_b, Some(3));
    }

    #[tokio::test]
    async fn test_final_assigns_places() {
        let fixture = build_fixture(EliminationKind::Single, 4).await;
        let first = round_matchups(&fixture, BracketSide::Winners, 1).await;
        let final_round = round_matchups(&fixture, BracketSide::Winners, 2).await;

        fixture.service.record_winner(first[0].id, 1).await.unwrap();
        fixture.service.record_winner(first[1].id, 3).await.unwrap();
        fixture
            .service
            .record_winner(final_round[0].id, 3)
            .await
            .unwrap();

        let champion = fixture
            .participants
            .get_participant(3)
            .await
            .unwrap()
            .unwrap();
        let runner_up = fixture
            .participants
            .get_participant(1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(champion.place, Some(1));
        assert_eq!(runner_up.place, Some(2));
    }

    #[tokio::test]
    async fn test_regenerate_after_recorded_result_adds_nothing() {
        // recording a result materializes participant slots; a re-run
        // of the builder must still find every row and create nothing
        let fixture = build_fixture(EliminationKind::Double, 4).await;
        let wb1 = round_matchups(&fixture, BracketSide::Winners, 1).await;
        fixture.service.record_winner(wb1[0].id, 1).await.unwrap();

        let before = fixture.brackets.matchup_count();
        fixture.builder.generate(1).await.unwrap();
        assert_eq!(fixture.brackets.matchup_count(), before);

        fixture.service.record_winner(wb1[1].id, 2).await.unwrap();
        fixture.builder.generate(1).await.unwrap();
        assert_eq!(fixture.brackets.matchup_count(), before);
    }

    #[tokio::test]
    async fn test_bye_matchup_description() {
        let fixture = build_fixture(EliminationKind::Single, 3).await;
        let first = round_matchups(&fixture, BracketSide::Winners, 1).await;
        assert!(first[0].is_bye());
        let description = fixture.service.describe(&first[0]).await.unwrap();
        assert_eq!(description, "Entrant 1 vs bye");
    }
}
