use std::sync::Arc;

use league_domain::{
    bracket::{ArcBracketRepository, ArcBracketService, BracketServiceImpl},
    ranking::{ArcRankingService, ArcTieRepository, RankingServiceImpl},
    resolver::{ArcMatchupService, MatchupServiceImpl},
    score_sheet::ArcScoreSheetRepository,
    team::{ArcSeasonRepository, ArcTeamRepository},
    tournament::{ArcParticipantRepository, ArcTournamentRepository},
};
use league_persistence_sqlite::{
    SqliteBracketRepository, SqliteParticipantRepository, SqliteScoreSheetRepository,
    SqliteSeasonRepository, SqliteTeamRepository, SqliteTieRepository, SqliteTournamentRepository,
};

#[derive(Clone)]
pub struct AppState {
    pub ranking_service: ArcRankingService,
    pub bracket_service: ArcBracketService,
    pub matchup_service: ArcMatchupService,

    pub season_repository: ArcSeasonRepository,
    pub team_repository: ArcTeamRepository,
    pub participant_repository: ArcParticipantRepository,
    pub bracket_repository: ArcBracketRepository,
}

pub fn build_app_state() -> AppState {
    let season_repository: ArcSeasonRepository = Arc::new(Box::new(SqliteSeasonRepository::new()));
    let team_repository: ArcTeamRepository = Arc::new(Box::new(SqliteTeamRepository::new()));
    let score_sheet_repository: ArcScoreSheetRepository =
        Arc::new(Box::new(SqliteScoreSheetRepository::new()));
    let tie_repository: ArcTieRepository = Arc::new(Box::new(SqliteTieRepository::new()));
    let tournament_repository: ArcTournamentRepository =
        Arc::new(Box::new(SqliteTournamentRepository::new()));
    let participant_repository: ArcParticipantRepository =
        Arc::new(Box::new(SqliteParticipantRepository::new()));
    let bracket_repository: ArcBracketRepository =
        Arc::new(Box::new(SqliteBracketRepository::new()));

    let ranking_service: ArcRankingService = Arc::new(Box::new(RankingServiceImpl::new(
        season_repository.clone(),
        team_repository.clone(),
        score_sheet_repository.clone(),
        tie_repository.clone(),
    )));
    let bracket_service: ArcBracketService = Arc::new(Box::new(BracketServiceImpl::new(
        tournament_repository.clone(),
        participant_repository.clone(),
        bracket_repository.clone(),
    )));
    let matchup_service: ArcMatchupService = Arc::new(Box::new(MatchupServiceImpl::new(
        bracket_repository.clone(),
        participant_repository.clone(),
    )));

    AppState {
        ranking_service,
        bracket_service,
        matchup_service,
        season_repository,
        team_repository,
        participant_repository,
        bracket_repository,
    }
}
