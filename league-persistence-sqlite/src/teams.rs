use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};

use league_domain::{
    ServiceError, ServiceResult,
    team::{DivisionId, Season, SeasonId, SeasonRepository, Team, TeamId, TeamRepository},
};

use crate::create_db_pool;

pub struct SqliteSeasonRepository {
    pool: Pool<Sqlite>,
}

impl SqliteSeasonRepository {
    pub fn new() -> Self {
        let pool = create_db_pool();
        Self { pool }
    }

    fn season_from_row(row: &SqliteRow) -> sqlx::Result<Season> {
        Ok(Season {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            minimum_games: row.try_get("minimum_games")?,
        })
    }
}

#[async_trait::async_trait]
impl SeasonRepository for SqliteSeasonRepository {
    async fn get_season(&self, id: SeasonId) -> ServiceResult<Option<Season>> {
        let row = sqlx::query("SELECT * FROM seasons WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        row.map(|r| Self::season_from_row(&r))
            .transpose()
            .map_err(|e| ServiceError::Internal(e.to_string()))
    }
}

pub struct SqliteTeamRepository {
    pool: Pool<Sqlite>,
}

impl SqliteTeamRepository {
    pub fn new() -> Self {
        let pool = create_db_pool();
        Self { pool }
    }

    fn team_from_row(row: &SqliteRow) -> sqlx::Result<Team> {
        Ok(Team {
            id: row.try_get("id")?,
            season: row.try_get("season_id")?,
            division: row.try_get("division_id")?,
            name: row.try_get("name")?,
            win_percentage: row.try_get("win_percentage")?,
            ranking: row.try_get("ranking")?,
            division_ranking: row.try_get("division_ranking")?,
            rank_tie_breaker: row.try_get("rank_tie_breaker")?,
        })
    }

    fn teams_from_rows(rows: Vec<SqliteRow>) -> ServiceResult<Vec<Team>> {
        rows.iter()
            .map(|row| Self::team_from_row(row).map_err(|e| ServiceError::Internal(e.to_string())))
            .collect()
    }
}

#[async_trait::async_trait]
impl TeamRepository for SqliteTeamRepository {
    async fn teams_by_season(&self, season: SeasonId) -> ServiceResult<Vec<Team>> {
        let rows = sqlx::query("SELECT * FROM teams WHERE season_id = ? ORDER BY id")
            .bind(season)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Self::teams_from_rows(rows)
    }

    async fn teams_by_division(
        &self,
        season: SeasonId,
        division: DivisionId,
    ) -> ServiceResult<Vec<Team>> {
        let rows =
            sqlx::query("SELECT * FROM teams WHERE season_id = ? AND division_id = ? ORDER BY id")
                .bind(season)
                .bind(division)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Self::teams_from_rows(rows)
    }

    async fn update_win_percentage(
        &self,
        id: TeamId,
        win_percentage: Option<f64>,
    ) -> ServiceResult<()> {
        sqlx::query("UPDATE teams SET win_percentage = ? WHERE id = ?")
            .bind(win_percentage)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Ok(())
    }

    async fn update_ranking(&self, id: TeamId, ranking: u32) -> ServiceResult<()> {
        sqlx::query("UPDATE teams SET ranking = ? WHERE id = ?")
            .bind(ranking)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Ok(())
    }

    async fn update_division_ranking(&self, id: TeamId, ranking: u32) -> ServiceResult<()> {
        sqlx::query("UPDATE teams SET division_ranking = ? WHERE id = ?")
            .bind(ranking)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Ok(())
    }
}
