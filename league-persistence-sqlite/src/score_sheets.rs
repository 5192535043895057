use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};

use league_domain::{
    ServiceError, ServiceResult,
    score_sheet::{ScoreSheet, ScoreSheetRepository},
    team::{SeasonId, TeamId},
};

use crate::create_db_pool;

pub struct SqliteScoreSheetRepository {
    pool: Pool<Sqlite>,
}

impl SqliteScoreSheetRepository {
    pub fn new() -> Self {
        let pool = create_db_pool();
        Self { pool }
    }

    fn sheet_from_row(row: &SqliteRow) -> sqlx::Result<ScoreSheet> {
        Ok(ScoreSheet {
            id: row.try_get("id")?,
            season: row.try_get("season_id")?,
            home_team: row.try_get("home_team_id")?,
            away_team: row.try_get("away_team_id")?,
            home_games: row.try_get("home_games")?,
            away_games: row.try_get("away_games")?,
            home_forfeit_wins: row.try_get("home_forfeit_wins")?,
            away_forfeit_wins: row.try_get("away_forfeit_wins")?,
            official: row.try_get("official")?,
            playoff: row.try_get("playoff")?,
            date: row.try_get("date")?,
        })
    }

    fn sheets_from_rows(rows: Vec<SqliteRow>) -> ServiceResult<Vec<ScoreSheet>> {
        rows.iter()
            .map(|row| Self::sheet_from_row(row).map_err(|e| ServiceError::Internal(e.to_string())))
            .collect()
    }
}

#[async_trait::async_trait]
impl ScoreSheetRepository for SqliteScoreSheetRepository {
    async fn sheets_by_season(&self, season: SeasonId) -> ServiceResult<Vec<ScoreSheet>> {
        let rows = sqlx::query("SELECT * FROM score_sheets WHERE season_id = ? ORDER BY id")
            .bind(season)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Self::sheets_from_rows(rows)
    }

    async fn sheets_between(
        &self,
        season: SeasonId,
        teams: &[TeamId],
    ) -> ServiceResult<Vec<ScoreSheet>> {
        if teams.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = teams.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let query_str = format!(
            "SELECT * FROM score_sheets WHERE season_id = ? \
             AND home_team_id IN ({placeholders}) \
             AND away_team_id IN ({placeholders}) ORDER BY id"
        );
        let mut query = sqlx::query(&query_str).bind(season);
        for team in teams {
            query = query.bind(team);
        }
        for team in teams {
            query = query.bind(team);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Self::sheets_from_rows(rows)
    }
}
