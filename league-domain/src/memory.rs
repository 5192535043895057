use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

use dashmap::DashMap;

use crate::{
    ServiceError, ServiceResult,
    bracket::{
        Bracket, BracketId, BracketRepository, BracketSide, Matchup, MatchupId, NewMatchup, Round,
        RoundId,
    },
    ranking::{Tie, TieBreakerResult, TieRepository},
    score_sheet::{ScoreSheet, ScoreSheetRepository, SheetId},
    team::{DivisionId, Season, SeasonId, SeasonRepository, Team, TeamId, TeamRepository},
    tournament::{
        Participant, ParticipantId, ParticipantRepository, Tournament, TournamentId,
        TournamentRepository,
    },
};

#[derive(Clone, Default)]
pub struct InMemorySeasonRepository {
    seasons: Arc<DashMap<SeasonId, Season>>,
}

impl InMemorySeasonRepository {
    pub fn new(seasons: Vec<Season>) -> Self {
        let repo = Self::default();
        for season in seasons {
            repo.seasons.insert(season.id, season);
        }
        repo
    }
}

#[async_trait::async_trait]
impl SeasonRepository for InMemorySeasonRepository {
    async fn get_season(&self, id: SeasonId) -> ServiceResult<Option<Season>> {
        Ok(self.seasons.get(&id).map(|s| s.value().clone()))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryTeamRepository {
    teams: Arc<DashMap<TeamId, Team>>,
}

impl InMemoryTeamRepository {
    pub fn new(teams: Vec<Team>) -> Self {
        let repo = Self::default();
        for team in teams {
            repo.teams.insert(team.id, team);
        }
        repo
    }

    fn update<F: FnOnce(&mut Team)>(&self, id: TeamId, apply: F) -> ServiceResult<()> {
        match self.teams.get_mut(&id) {
            Some(mut team) => {
                apply(&mut team);
                Ok(())
            }
            None => ServiceError::not_found(format!("team {} does not exist", id)),
        }
    }
}

#[async_trait::async_trait]
impl TeamRepository for InMemoryTeamRepository {
    async fn teams_by_season(&self, season: SeasonId) -> ServiceResult<Vec<Team>> {
        let mut teams: Vec<Team> = self
            .teams
            .iter()
            .filter(|entry| entry.value().season == season)
            .map(|entry| entry.value().clone())
            .collect();
        teams.sort_by_key(|t| t.id);
        Ok(teams)
    }

    async fn teams_by_division(
        &self,
        season: SeasonId,
        division: DivisionId,
    ) -> ServiceResult<Vec<Team>> {
        let mut teams: Vec<Team> = self
            .teams
            .iter()
            .filter(|entry| {
                entry.value().season == season && entry.value().division == Some(division)
            })
            .map(|entry| entry.value().clone())
            .collect();
        teams.sort_by_key(|t| t.id);
        Ok(teams)
    }

    async fn update_win_percentage(
        &self,
        id: TeamId,
        win_percentage: Option<f64>,
    ) -> ServiceResult<()> {
        self.update(id, |t| t.win_percentage = win_percentage)
    }

    async fn update_ranking(&self, id: TeamId, ranking: u32) -> ServiceResult<()> {
        self.update(id, |t| t.ranking = Some(ranking))
    }

    async fn update_division_ranking(&self, id: TeamId, ranking: u32) -> ServiceResult<()> {
        self.update(id, |t| t.division_ranking = Some(ranking))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryScoreSheetRepository {
    sheets: Arc<DashMap<SheetId, ScoreSheet>>,
}

impl InMemoryScoreSheetRepository {
    pub fn new(sheets: Vec<ScoreSheet>) -> Self {
        let repo = Self::default();
        for sheet in sheets {
            repo.sheets.insert(sheet.id, sheet);
        }
        repo
    }

    pub fn add(&self, sheet: ScoreSheet) {
        self.sheets.insert(sheet.id, sheet);
    }
}

#[async_trait::async_trait]
impl ScoreSheetRepository for InMemoryScoreSheetRepository {
    async fn sheets_by_season(&self, season: SeasonId) -> ServiceResult<Vec<ScoreSheet>> {
        let mut sheets: Vec<ScoreSheet> = self
            .sheets
            .iter()
            .filter(|entry| entry.value().season == season)
            .map(|entry| entry.value().clone())
            .collect();
        sheets.sort_by_key(|s| s.id);
        Ok(sheets)
    }

    async fn sheets_between(
        &self,
        season: SeasonId,
        teams: &[TeamId],
    ) -> ServiceResult<Vec<ScoreSheet>> {
        let mut sheets: Vec<ScoreSheet> = self
            .sheets
            .iter()
            .filter(|entry| {
                let sheet = entry.value();
                sheet.season == season
                    && teams.contains(&sheet.home_team)
                    && teams.contains(&sheet.away_team)
            })
            .map(|entry| entry.value().clone())
            .collect();
        sheets.sort_by_key(|s| s.id);
        Ok(sheets)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryTieRepository {
    ties: Arc<DashMap<SeasonId, Vec<Tie>>>,
    results: Arc<DashMap<SeasonId, Vec<TieBreakerResult>>>,
}

impl InMemoryTieRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl TieRepository for InMemoryTieRepository {
    async fn clear_season(&self, season: SeasonId) -> ServiceResult<()> {
        self.ties.remove(&season);
        self.results.remove(&season);
        Ok(())
    }

    async fn record_tie(&self, tie: &Tie) -> ServiceResult<()> {
        self.ties.entry(tie.season).or_default().push(tie.clone());
        Ok(())
    }

    async fn record_result(&self, result: &TieBreakerResult) -> ServiceResult<()> {
        self.results
            .entry(result.season)
            .or_default()
            .push(result.clone());
        Ok(())
    }

    async fn ties_by_season(&self, season: SeasonId) -> ServiceResult<Vec<Tie>> {
        Ok(self
            .ties
            .get(&season)
            .map(|t| t.value().clone())
            .unwrap_or_default())
    }

    async fn results_by_season(&self, season: SeasonId) -> ServiceResult<Vec<TieBreakerResult>> {
        Ok(self
            .results
            .get(&season)
            .map(|r| r.value().clone())
            .unwrap_or_default())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryTournamentRepository {
    tournaments: Arc<DashMap<TournamentId, Tournament>>,
}

impl InMemoryTournamentRepository {
    pub fn new(tournaments: Vec<Tournament>) -> Self {
        let repo = Self::default();
        for tournament in tournaments {
            repo.tournaments.insert(tournament.id, tournament);
        }
        repo
    }
}

#[async_trait::async_trait]
impl TournamentRepository for InMemoryTournamentRepository {
    async fn get_tournament(&self, id: TournamentId) -> ServiceResult<Option<Tournament>> {
        Ok(self.tournaments.get(&id).map(|t| t.value().clone()))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryParticipantRepository {
    participants: Arc<DashMap<ParticipantId, Participant>>,
}

impl InMemoryParticipantRepository {
    pub fn new(participants: Vec<Participant>) -> Self {
        let repo = Self::default();
        for participant in participants {
            repo.participants.insert(participant.id, participant);
        }
        repo
    }
}

#[async_trait::async_trait]
impl ParticipantRepository for InMemoryParticipantRepository {
    async fn participants_by_tournament(
        &self,
        tournament: TournamentId,
    ) -> ServiceResult<Vec<Participant>> {
        let mut participants: Vec<Participant> = self
            .participants
            .iter()
            .filter(|entry| entry.value().tournament == tournament)
            .map(|entry| entry.value().clone())
            .collect();
        participants.sort_by_key(|p| (p.seed.unwrap_or(u32::MAX), p.id));
        Ok(participants)
    }

    async fn get_participant(&self, id: ParticipantId) -> ServiceResult<Option<Participant>> {
        Ok(self.participants.get(&id).map(|p| p.value().clone()))
    }

    async fn set_place(&self, id: ParticipantId, place: u32) -> ServiceResult<()> {
        match self.participants.get_mut(&id) {
            Some(mut participant) => {
                participant.place = Some(place);
                Ok(())
            }
            None => ServiceError::not_found(format!("participant {} does not exist", id)),
        }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryBracketRepository {
    brackets: Arc<DashMap<BracketId, Bracket>>,
    rounds: Arc<DashMap<RoundId, Round>>,
    matchups: Arc<DashMap<MatchupId, Matchup>>,
    next_id: Arc<AtomicI64>,
}

impl InMemoryBracketRepository {
    pub fn new() -> Self {
        Self {
            next_id: Arc::new(AtomicI64::new(1)),
            ..Self::default()
        }
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    pub fn matchup_count(&self) -> usize {
        self.matchups.len()
    }
}

#[async_trait::async_trait]
impl BracketRepository for InMemoryBracketRepository {
    async fn find_bracket(
        &self,
        tournament: TournamentId,
        side: BracketSide,
    ) -> ServiceResult<Option<Bracket>> {
        Ok(self
            .brackets
            .iter()
            .find(|entry| {
                entry.value().tournament == tournament && entry.value().side == side
            })
            .map(|entry| entry.value().clone()))
    }

    async fn create_bracket(
        &self,
        tournament: TournamentId,
        side: BracketSide,
    ) -> ServiceResult<Bracket> {
        let bracket = Bracket {
            id: self.allocate_id(),
            tournament,
            side,
        };
        self.brackets.insert(bracket.id, bracket.clone());
        Ok(bracket)
    }

    async fn get_bracket(&self, id: BracketId) -> ServiceResult<Option<Bracket>> {
        Ok(self.brackets.get(&id).map(|b| b.value().clone()))
    }

    async fn find_round(&self, bracket: BracketId, number: u32) -> ServiceResult<Option<Round>> {
        Ok(self
            .rounds
            .iter()
            .find(|entry| entry.value().bracket == bracket && entry.value().number == number)
            .map(|entry| entry.value().clone()))
    }

    async fn create_round(&self, bracket: BracketId, number: u32) -> ServiceResult<Round> {
        let round = Round {
            id: self.allocate_id(),
            bracket,
            number,
        };
        self.rounds.insert(round.id, round.clone());
        Ok(round)
    }

    async fn get_round(&self, id: RoundId) -> ServiceResult<Option<Round>> {
        Ok(self.rounds.get(&id).map(|r| r.value().clone()))
    }

    async fn rounds_by_bracket(&self, bracket: BracketId) -> ServiceResult<Vec<Round>> {
        let mut rounds: Vec<Round> = self
            .rounds
            .iter()
            .filter(|entry| entry.value().bracket == bracket)
            .map(|entry| entry.value().clone())
            .collect();
        rounds.sort_by_key(|r| r.number);
        Ok(rounds)
    }

    async fn matchups_by_round(&self, round: RoundId) -> ServiceResult<Vec<Matchup>> {
        let mut matchups: Vec<Matchup> = self
            .matchups
            .iter()
            .filter(|entry| entry.value().round == round)
            .map(|entry| entry.value().clone())
            .collect();
        matchups.sort_by_key(|m| m.number);
        Ok(matchups)
    }

    async fn find_matchup(&self, new: &NewMatchup) -> ServiceResult<Option<Matchup>> {
        Ok(self
            .matchups
            .iter()
            .find(|entry| entry.value().round == new.round && entry.value().number == new.number)
            .map(|entry| entry.value().clone()))
    }

    async fn create_matchup(&self, new: &NewMatchup) -> ServiceResult<Matchup> {
        let matchup = Matchup {
            id: self.allocate_id(),
            round: new.round,
            number: new.number,
            participant_a: new.participant_a,
            participant_b: new.participant_b,
            source_a: new.source_a,
            source_b: new.source_b,
            winner: None,
            play_order: None,
        };
        self.matchups.insert(matchup.id, matchup.clone());
        Ok(matchup)
    }

    async fn get_matchup(&self, id: MatchupId) -> ServiceResult<Option<Matchup>> {
        Ok(self.matchups.get(&id).map(|m| m.value().clone()))
    }

    async fn set_winner(&self, id: MatchupId, winner: ParticipantId) -> ServiceResult<()> {
        match self.matchups.get_mut(&id) {
            Some(mut matchup) => {
                matchup.winner = Some(winner);
                Ok(())
            }
            None => ServiceError::not_found(format!("matchup {} does not exist", id)),
        }
    }

    async fn set_slot_participants(
        &self,
        id: MatchupId,
        participant_a: Option<ParticipantId>,
        participant_b: Option<ParticipantId>,
    ) -> ServiceResult<()> {
        match self.matchups.get_mut(&id) {
            Some(mut matchup) => {
                matchup.participant_a = participant_a;
                matchup.participant_b = participant_b;
                Ok(())
            }
            None => ServiceError::not_found(format!("matchup {} does not exist", id)),
        }
    }

    async fn set_play_order(&self, id: MatchupId, order: u32) -> ServiceResult<()> {
        match self.matchups.get_mut(&id) {
            Some(mut matchup) => {
                matchup.play_order = Some(order);
                Ok(())
            }
            None => ServiceError::not_found(format!("matchup {} does not exist", id)),
        }
    }

    async fn matchups_sourcing(&self, id: MatchupId) -> ServiceResult<Vec<Matchup>> {
        let mut matchups: Vec<Matchup> = self
            .matchups
            .iter()
            .filter(|entry| {
                let m = entry.value();
                m.source_a.map(|s| s.matchup == id).unwrap_or(false)
                    || m.source_b.map(|s| s.matchup == id).unwrap_or(false)
            })
            .map(|entry| entry.value().clone())
            .collect();
        matchups.sort_by_key(|m| m.id);
        Ok(matchups)
    }
}
