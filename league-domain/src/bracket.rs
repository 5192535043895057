use std::sync::Arc;

use league_core::{
    EliminationKind, bracket_size, drop_in_source_round, is_drop_in_round, losers_round_count,
    losers_round_matchups, round_count, winners_round_matchups,
};
use log::{error, info};

use crate::{
    ServiceError, ServiceResult,
    tournament::{ArcParticipantRepository, ArcTournamentRepository, ParticipantId, TournamentId},
};

pub type BracketId = i64;
pub type RoundId = i64;
pub type MatchupId = i64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BracketSide {
    Winners,
    Losers,
}

#[derive(Clone, Debug)]
pub struct Bracket {
    pub id: BracketId,
    pub tournament: TournamentId,
    pub side: BracketSide,
}

#[derive(Clone, Debug)]
pub struct Round {
    pub id: RoundId,
    pub bracket: BracketId,
    pub number: u32,
}

/// Reference to an earlier matchup whose winner (or loser) fills a
/// slot once that matchup is decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchupSource {
    pub matchup: MatchupId,
    pub wants_winner: bool,
}

#[derive(Clone, Debug)]
pub struct Matchup {
    pub id: MatchupId,
    pub round: RoundId,
    /// Sequence within the round, independent of play order.
    pub number: u32,
    pub participant_a: Option<ParticipantId>,
    pub participant_b: Option<ParticipantId>,
    pub source_a: Option<MatchupSource>,
    pub source_b: Option<MatchupSource>,
    pub winner: Option<ParticipantId>,
    pub play_order: Option<u32>,
}

impl Matchup {
    /// A round-one slot left empty on a non-power-of-two entry list.
    pub fn is_bye(&self) -> bool {
        self.source_a.is_none()
            && self.source_b.is_none()
            && (self.participant_a.is_none()) != (self.participant_b.is_none())
    }
}

/// A matchup to create. Idempotent creation looks existing rows up by
/// `(round, number)`; recording results materializes the participant
/// columns, so they cannot serve as a lookup key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewMatchup {
    pub round: RoundId,
    pub number: u32,
    pub participant_a: Option<ParticipantId>,
    pub participant_b: Option<ParticipantId>,
    pub source_a: Option<MatchupSource>,
    pub source_b: Option<MatchupSource>,
}

pub type ArcBracketRepository = Arc<Box<dyn BracketRepository + Send + Sync + 'static>>;
#[async_trait::async_trait]
pub trait BracketRepository {
    async fn find_bracket(
        &self,
        tournament: TournamentId,
        side: BracketSide,
    ) -> ServiceResult<Option<Bracket>>;
    async fn create_bracket(
        &self,
        tournament: TournamentId,
        side: BracketSide,
    ) -> ServiceResult<Bracket>;
    async fn get_bracket(&self, id: BracketId) -> ServiceResult<Option<Bracket>>;
    async fn find_round(&self, bracket: BracketId, number: u32) -> ServiceResult<Option<Round>>;
    async fn create_round(&self, bracket: BracketId, number: u32) -> ServiceResult<Round>;
    async fn get_round(&self, id: RoundId) -> ServiceResult<Option<Round>>;
    async fn rounds_by_bracket(&self, bracket: BracketId) -> ServiceResult<Vec<Round>>;
    async fn matchups_by_round(&self, round: RoundId) -> ServiceResult<Vec<Matchup>>;
    /// Lookup by the stable `(round, number)` pair of `new`.
    async fn find_matchup(&self, new: &NewMatchup) -> ServiceResult<Option<Matchup>>;
    async fn create_matchup(&self, new: &NewMatchup) -> ServiceResult<Matchup>;
    async fn get_matchup(&self, id: MatchupId) -> ServiceResult<Option<Matchup>>;
    async fn set_winner(&self, id: MatchupId, winner: ParticipantId) -> ServiceResult<()>;
    async fn set_slot_participants(
        &self,
        id: MatchupId,
        participant_a: Option<ParticipantId>,
        participant_b: Option<ParticipantId>,
    ) -> ServiceResult<()>;
    async fn set_play_order(&self, id: MatchupId, order: u32) -> ServiceResult<()>;
    /// One-hop dependents: matchups whose source_a or source_b
    /// references the given matchup.
    async fn matchups_sourcing(&self, id: MatchupId) -> ServiceResult<Vec<Matchup>>;
}

/// A "wants loser" reference outside a double-elimination losers
/// bracket means the builder itself is broken.
fn validate_sources(
    side: BracketSide,
    elimination: EliminationKind,
    new: &NewMatchup,
) -> ServiceResult<()> {
    let wants_loser = |s: &Option<MatchupSource>| s.map(|s| !s.wants_winner).unwrap_or(false);
    if (wants_loser(&new.source_a) || wants_loser(&new.source_b))
        && !(side == BracketSide::Losers && elimination == EliminationKind::Double)
    {
        error!(
            "matchup {} of round {} built with a loser reference outside a losers bracket",
            new.number, new.round
        );
        return ServiceError::invariant(format!(
            "loser reference in a {:?} bracket of a {:?}-elimination tournament",
            side, elimination
        ));
    }
    Ok(())
}

pub type ArcBracketService = Arc<Box<dyn BracketService + Send + Sync + 'static>>;
#[async_trait::async_trait]
pub trait BracketService {
    /// Builds the full round/matchup graph for the tournament. Safe to
    /// re-run: existing rows are found by natural key, never duplicated.
    async fn generate(&self, tournament: TournamentId) -> ServiceResult<()>;
}

pub struct BracketServiceImpl {
    tournament_repository: ArcTournamentRepository,
    participant_repository: ArcParticipantRepository,
    bracket_repository: ArcBracketRepository,
}

impl BracketServiceImpl {
    pub fn new(
        tournament_repository: ArcTournamentRepository,
        participant_repository: ArcParticipantRepository,
        bracket_repository: ArcBracketRepository,
    ) -> Self {
        Self {
            tournament_repository,
            participant_repository,
            bracket_repository,
        }
    }

    async fn ensure_bracket(
        &self,
        tournament: TournamentId,
        side: BracketSide,
    ) -> ServiceResult<Bracket> {
        if let Some(bracket) = self.bracket_repository.find_bracket(tournament, side).await? {
            return Ok(bracket);
        }
        self.bracket_repository.create_bracket(tournament, side).await
    }

    async fn ensure_round(&self, bracket: BracketId, number: u32) -> ServiceResult<Round> {
        if let Some(round) = self.bracket_repository.find_round(bracket, number).await? {
            return Ok(round);
        }
        self.bracket_repository.create_round(bracket, number).await
    }

    async fn ensure_matchup(
        &self,
        side: BracketSide,
        elimination: EliminationKind,
        new: NewMatchup,
    ) -> ServiceResult<Matchup> {
        validate_sources(side, elimination, &new)?;
        if let Some(existing) = self.bracket_repository.find_matchup(&new).await? {
            return Ok(existing);
        }
        self.bracket_repository.create_matchup(&new).await
    }

    async fn verify_round(&self, round: &Round, expected: usize) -> ServiceResult<Vec<Matchup>> {
        let built = self.bracket_repository.matchups_by_round(round.id).await?;
        if built.len() != expected {
            error!(
                "round {} holds {} matchups, topology demands {}",
                round.number,
                built.len(),
                expected
            );
            return ServiceError::invariant(format!(
                "round {} matchup count {} != {}",
                round.number,
                built.len(),
                expected
            ));
        }
        Ok(built)
    }

    async fn build_winners(
        &self,
        tournament: TournamentId,
        elimination: EliminationKind,
        seeds: &[ParticipantId],
    ) -> ServiceResult<Vec<Vec<Matchup>>> {
        let size = bracket_size(seeds.len());
        let rounds = round_count(seeds.len());
        let bracket = self.ensure_bracket(tournament, BracketSide::Winners).await?;

        let mut by_round: Vec<Vec<Matchup>> = Vec::with_capacity(rounds as usize);
        for number in 1..=rounds {
            let round = self.ensure_round(bracket.id, number).await?;
            let count = winners_round_matchups(size, number);
            for i in 0..count {
                let new = if number == 1 {
                    // seed i meets seed (size - 1 - i); a missing
                    // opponent past the entry list is a bye
                    let mirror = size - 1 - i;
                    NewMatchup {
                        round: round.id,
                        number: (i + 1) as u32,
                        participant_a: Some(seeds[i]),
                        participant_b: seeds.get(mirror).copied(),
                        source_a: None,
                        source_b: None,
                    }
                } else {
                    let prev = &by_round[(number - 2) as usize];
                    NewMatchup {
                        round: round.id,
                        number: (i + 1) as u32,
                        participant_a: None,
                        participant_b: None,
                        source_a: Some(MatchupSource {
                            matchup: prev[i].id,
                            wants_winner: true,
                        }),
                        source_b: Some(MatchupSource {
                            matchup: prev[prev.len() - 1 - i].id,
                            wants_winner: true,
                        }),
                    }
                };
                self.ensure_matchup(BracketSide::Winners, elimination, new)
                    .await?;
            }
            by_round.push(self.verify_round(&round, count).await?);
        }
        Ok(by_round)
    }

    async fn build_losers(
        &self,
        tournament: TournamentId,
        participant_count: usize,
        winners_rounds: &[Vec<Matchup>],
    ) -> ServiceResult<()> {
        let size = bracket_size(participant_count);
        let rounds = losers_round_count(participant_count);
        if rounds == 0 {
            return Ok(());
        }
        let bracket = self.ensure_bracket(tournament, BracketSide::Losers).await?;

        let mut prev: Vec<Matchup> = Vec::new();
        for number in 1..=rounds {
            let round = self.ensure_round(bracket.id, number).await?;
            let count = losers_round_matchups(size, number);
            for i in 0..count {
                let (source_a, source_b) = if number == 1 {
                    // both slots drop out of winners round one
                    let wb = &winners_rounds[0];
                    (
                        MatchupSource {
                            matchup: wb[i].id,
                            wants_winner: false,
                        },
                        MatchupSource {
                            matchup: wb[wb.len() - 1 - i].id,
                            wants_winner: false,
                        },
                    )
                } else if is_drop_in_round(number) {
                    // a freshly eliminated team meets a losers-bracket
                    // survivor
                    let wb = &winners_rounds[(drop_in_source_round(number) - 1) as usize];
                    (
                        MatchupSource {
                            matchup: wb[i].id,
                            wants_winner: false,
                        },
                        MatchupSource {
                            matchup: prev[i].id,
                            wants_winner: true,
                        },
                    )
                } else {
                    (
                        MatchupSource {
                            matchup: prev[i].id,
                            wants_winner: true,
                        },
                        MatchupSource {
                            matchup: prev[prev.len() - 1 - i].id,
                            wants_winner: true,
                        },
                    )
                };
                self.ensure_matchup(
                    BracketSide::Losers,
                    EliminationKind::Double,
                    NewMatchup {
                        round: round.id,
                        number: (i + 1) as u32,
                        participant_a: None,
                        participant_b: None,
                        source_a: Some(source_a),
                        source_b: Some(source_b),
                    },
                )
                .await?;
            }
            prev = self.verify_round(&round, count).await?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl BracketService for BracketServiceImpl {
    async fn generate(&self, tournament: TournamentId) -> ServiceResult<()> {
        let Some(record) = self.tournament_repository.get_tournament(tournament).await? else {
            return ServiceError::not_found(format!("tournament {} does not exist", tournament));
        };
        let participants = self
            .participant_repository
            .participants_by_tournament(tournament)
            .await?;
        if participants.is_empty() {
            return ServiceError::bad_request("cannot build a bracket without participants");
        }
        let seeds: Vec<ParticipantId> = participants.iter().map(|p| p.id).collect();
        info!(
            "tournament {}: building {:?}-elimination bracket for {} participants",
            tournament,
            record.elimination,
            seeds.len()
        );

        let winners_rounds = self
            .build_winners(tournament, record.elimination, &seeds)
            .await?;
        if record.elimination == EliminationKind::Double {
            self.build_losers(tournament, seeds.len(), &winners_rounds)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{
        InMemoryBracketRepository, InMemoryParticipantRepository, InMemoryTournamentRepository,
    };
    use crate::tournament::{Participant, Tournament, TournamentKind};

    fn tournament_fixture(elimination: EliminationKind) -> Tournament {
        Tournament {
            id: 1,
            name: "City Open".to_string(),
            kind: TournamentKind::Singles,
            elimination,
        }
    }

    fn participants_fixture(n: usize) -> Vec<Participant> {
        (0..n)
            .map(|i| Participant {
                id: (i + 1) as ParticipantId,
                tournament: 1,
                name: format!("Entrant {}", i + 1),
                seed: Some((i + 1) as u32),
                place: None,
            })
            .collect()
    }

    struct Fixture {
        brackets: Arc<InMemoryBracketRepository>,
        service: BracketServiceImpl,
    }

    fn build_fixture(elimination: EliminationKind, entrants: usize) -> Fixture {
        let tournament_repo =
            Arc::new(InMemoryTournamentRepository::new(vec![tournament_fixture(elimination)]));
        let participant_repo =
            Arc::new(InMemoryParticipantRepository::new(participants_fixture(entrants)));
        let bracket_repo = Arc::new(InMemoryBracketRepository::new());
        let service = BracketServiceImpl::new(
            Arc::new(Box::new(tournament_repo.as_ref().clone())),
            Arc::new(Box::new(participant_repo.as_ref().clone())),
            Arc::new(Box::new(bracket_repo.as_ref().clone())),
        );
        Fixture {
            brackets: bracket_repo,
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
    async fn test_single_elimination_eight() {
        let fixture = build_fixture(EliminationKind::Single, 8);
        fixture.service.generate(1).await.unwrap();

        let bracket = fixture
            .brackets
            .find_bracket(1, BracketSide::Winners)
            .await
            .unwrap()
            .unwrap();
        let rounds = fixture.brackets.rounds_by_bracket(bracket.id).await.unwrap();
        assert_eq!(rounds.len(), 3);
        assert!(
            fixture
                .brackets
                .find_bracket(1, BracketSide::Losers)
                .await
                .unwrap()
                .is_none()
        );

        let first = round_matchups(&fixture, BracketSide::Winners, 1).await;
        assert_eq!(first.len(), 4);
        // seed i against seed (8 - 1 - i)
        assert_eq!(first[0].participant_a, Some(1));
        assert_eq!(first[0].participant_b, Some(8));
        assert_eq!(first[3].participant_a, Some(4));
        assert_eq!(first[3].participant_b, Some(5));

        let second = round_matchups(&fixture, BracketSide::Winners, 2).await;
        assert_eq!(second.len(), 2);
        assert_eq!(
            second[0].source_a,
            Some(MatchupSource {
                matchup: first[0].id,
                wants_winner: true
            })
        );
        assert_eq!(
            second[0].source_b,
            Some(MatchupSource {
                matchup: first[3].id,
                wants_winner: true
            })
        );

        let last = round_matchups(&fixture, BracketSide::Winners, 3).await;
        assert_eq!(last.len(), 1);
    }

    #[tokio::test]
    async fn test_byes_for_five_entrants() {
        let fixture = build_fixture(EliminationKind::Single, 5);
        fixture.service.generate(1).await.unwrap();
        let first = round_matchups(&fixture, BracketSide::Winners, 1).await;
        assert_eq!(first.len(), 4);
        assert!(first[0].is_bye()); // 1 vs missing seed 8
        assert!(first[1].is_bye());
        assert!(first[2].is_bye());
        assert_eq!(first[3].participant_a, Some(4));
        assert_eq!(first[3].participant_b, Some(5));
    }

    #[tokio::test]
    async fn test_double_elimination_eight() {
        let fixture = build_fixture(EliminationKind::Double, 8);
        fixture.service.generate(1).await.unwrap();

        let losers = fixture
            .brackets
            .find_bracket(1, BracketSide::Losers)
            .await
            .unwrap()
            .unwrap();
        let rounds = fixture.brackets.rounds_by_bracket(losers.id).await.unwrap();
        assert_eq!(rounds.len(), 3);

        let wb1 = round_matchups(&fixture, BracketSide::Winners, 1).await;
        let wb2 = round_matchups(&fixture, BracketSide::Winners, 2).await;
        let lb1 = round_matchups(&fixture, BracketSide::Losers, 1).await;
        let lb2 = round_matchups(&fixture, BracketSide::Losers, 2).await;
        let lb3 = round_matchups(&fixture, BracketSide::Losers, 3).await;
        assert_eq!(lb1.len(), 2);
        assert_eq!(lb2.len(), 2);
        assert_eq!(lb3.len(), 1);

        // round one pairs the winners round's losers, mirrored
        assert_eq!(
            lb1[0].source_a,
            Some(MatchupSource {
                matchup: wb1[0].id,
                wants_winner: false
            })
        );
        assert_eq!(
            lb1[0].source_b,
            Some(MatchupSource {
                matchup: wb1[3].id,
                wants_winner: false
            })
        );

        // the drop-in round mixes a winners-bracket loser with a
        // losers-bracket survivor
        assert_eq!(
            lb2[0].source_a,
            Some(MatchupSource {
                matchup: wb2[0].id,
                wants_winner: false
            })
        );
        assert_eq!(
            lb2[0].source_b,
            Some(MatchupSource {
                matchup: lb1[0].id,
                wants_winner: true
            })
        );

        // the losers final pairs the drop-in round's survivors
        assert_eq!(
            lb3[0].source_a,
            Some(MatchupSource {
                matchup: lb2[0].id,
                wants_winner: true
            })
        );
        assert_eq!(
            lb3[0].source_b,
            Some(MatchupSource {
                matchup: lb2[1].id,
                wants_winner: true
            })
        );
    }

    #[tokio::test]
    async fn test_double_elimination_sixteen_losers_sizes() {
        let fixture = build_fixture(EliminationKind::Double, 16);
        fixture.service.generate(1).await.unwrap();
        let mut sizes = Vec::new();
        for number in 1..=losers_round_count(16) {
            sizes.push(round_matchups(&fixture, BracketSide::Losers, number).await.len());
        }
        assert_eq!(sizes, vec![4, 4, 2, 2, 1]);
    }

    #[tokio::test]
    async fn test_generate_is_idempotent() {
        let fixture = build_fixture(EliminationKind::Double, 8);
        fixture.service.generate(1).await.unwrap();
        let before: usize = fixture.brackets.matchup_count();
        fixture.service.generate(1).await.unwrap();
        assert_eq!(fixture.brackets.matchup_count(), before);
    }

    #[tokio::test]
    async fn test_zero_participants_rejected() {
        let fixture = build_fixture(EliminationKind::Single, 0);
        assert!(matches!(
            fixture.service.generate(1).await,
            Err(ServiceError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_tournament_rejected() {
        let fixture = build_fixture(EliminationKind::Single, 4);
        assert!(matches!(
            fixture.service.generate(9).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn test_loser_reference_outside_losers_bracket() {
        let new = NewMatchup {
            round: 1,
            number: 1,
            participant_a: None,
            participant_b: None,
            source_a: Some(MatchupSource {
                matchup: 5,
                wants_winner: false,
            }),
            source_b: None,
        };
        assert!(matches!(
            validate_sources(BracketSide::Winners, EliminationKind::Double, &new),
            Err(ServiceError::Invariant(_))
        ));
        assert!(matches!(
            validate_sources(BracketSide::Losers, EliminationKind::Single, &new),
            Err(ServiceError::Invariant(_))
        ));
        assert!(validate_sources(BracketSide::Losers, EliminationKind::Double, &new).is_ok());
    }
}
