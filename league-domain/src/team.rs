use std::sync::Arc;

use chrono::NaiveDate;

use crate::ServiceResult;

pub type TeamId = i64;
pub type SeasonId = i64;
pub type DivisionId = i64;

#[derive(Clone, Debug)]
pub struct Team {
    pub id: TeamId,
    pub season: SeasonId,
    pub division: Option<DivisionId>,
    pub name: String,
    pub win_percentage: Option<f64>,
    pub ranking: Option<u32>,
    pub division_ranking: Option<u32>,
    pub rank_tie_breaker: i32,
}

impl Team {
    /// Rank 0 marks a team excluded from the standings.
    pub fn is_excluded(&self) -> bool {
        self.ranking == Some(0)
    }
}

#[derive(Clone, Debug)]
pub struct Season {
    pub id: SeasonId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub minimum_games: u32,
}

impl Season {
    /// Minimum-games threshold for standings computed part-way through
    /// the season, pro-rated by how much of it has elapsed.
    pub fn standings_minimum_games(&self, before: NaiveDate) -> u32 {
        let total = (self.end_date - self.start_date).num_days();
        if total <= 0 || before >= self.end_date {
            return self.minimum_games;
        }
        if before <= self.start_date {
            return 0;
        }
        let elapsed = (before - self.start_date).num_days();
        (self.minimum_games as i64 * elapsed / total) as u32
    }
}

pub type ArcSeasonRepository = Arc<Box<dyn SeasonRepository + Send + Sync + 'static>>;
#[async_trait::async_trait]
pub trait SeasonRepository {
    async fn get_season(&self, id: SeasonId) -> ServiceResult<Option<Season>>;
}

pub type ArcTeamRepository = Arc<Box<dyn TeamRepository + Send + Sync + 'static>>;
#[async_trait::async_trait]
pub trait TeamRepository {
    async fn teams_by_season(&self, season: SeasonId) -> ServiceResult<Vec<Team>>;
    async fn teams_by_division(
        &self,
        season: SeasonId,
        division: DivisionId,
    ) -> ServiceResult<Vec<Team>>;
    async fn update_win_percentage(
        &self,
        id: TeamId,
        win_percentage: Option<f64>,
    ) -> ServiceResult<()>;
    async fn update_ranking(&self, id: TeamId, ranking: u32) -> ServiceResult<()>;
    async fn update_division_ranking(&self, id: TeamId, ranking: u32) -> ServiceResult<()>;
}
