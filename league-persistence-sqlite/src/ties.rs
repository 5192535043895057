use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};

use league_domain::{
    ServiceError, ServiceResult,
    ranking::{RankAttribute, Tie, TieBreakRule, TieBreakerResult, TieRepository},
    team::SeasonId,
};

use crate::create_db_pool;

pub struct SqliteTieRepository {
    pool: Pool<Sqlite>,
}

fn attribute_from_str(s: &str) -> ServiceResult<RankAttribute> {
    match s {
        "win_percentage" => Ok(RankAttribute::WinPercentage),
        "ranking" => Ok(RankAttribute::Ranking),
        "division_ranking" => Ok(RankAttribute::DivisionRanking),
        other => Err(ServiceError::Internal(format!(
            "unknown rank attribute [{}]",
            other
        ))),
    }
}

fn rule_from_str(s: &str) -> ServiceResult<TieBreakRule> {
    match s {
        "net_game_wins" => Ok(TieBreakRule::NetGameWins),
        "division_rank" => Ok(TieBreakRule::DivisionRank),
        "forfeit_wins" => Ok(TieBreakRule::ForfeitWins),
        "rank_tie_breaker" => Ok(TieBreakRule::Manual),
        other => Err(ServiceError::Internal(format!(
            "unknown tie break rule [{}]",
            other
        ))),
    }
}

impl SqliteTieRepository {
    pub fn new() -> Self {
        let pool = create_db_pool();
        Self { pool }
    }

    fn result_from_row(row: &SqliteRow) -> ServiceResult<TieBreakerResult> {
        let rule: String = row
            .try_get("rule")
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Ok(TieBreakerResult {
            season: row
                .try_get("season_id")
                .map_err(|e| ServiceError::Internal(e.to_string()))?,
            team: row
                .try_get("team_id")
                .map_err(|e| ServiceError::Internal(e.to_string()))?,
            rule: rule_from_str(&rule)?,
            rank_delta: row
                .try_get("rank_delta")
                .map_err(|e| ServiceError::Internal(e.to_string()))?,
            divisional: row
                .try_get("divisional")
                .map_err(|e| ServiceError::Internal(e.to_string()))?,
        })
    }
}

#[async_trait::async_trait]
impl TieRepository for SqliteTieRepository {
    async fn clear_season(&self, season: SeasonId) -> ServiceResult<()> {
        sqlx::query(
            "DELETE FROM tie_teams WHERE tie_id IN (SELECT id FROM ties WHERE season_id = ?)",
        )
        .bind(season)
        .execute(&self.pool)
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))?;
        sqlx::query("DELETE FROM ties WHERE season_id = ?")
            .bind(season)
            .execute(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        sqlx::query("DELETE FROM tie_breaker_results WHERE season_id = ?")
            .bind(season)
            .execute(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Ok(())
    }

    async fn record_tie(&self, tie: &Tie) -> ServiceResult<()> {
        let result =
            sqlx::query("INSERT INTO ties (season_id, attribute, divisional) VALUES (?, ?, ?)")
                .bind(tie.season)
                .bind(tie.attribute.as_str())
                .bind(tie.divisional)
                .execute(&self.pool)
                .await
                .map_err(|e| ServiceError::Internal(e.to_string()))?;
        let tie_id = result.last_insert_rowid();
        for team in &tie.teams {
            sqlx::query("INSERT INTO tie_teams (tie_id, team_id) VALUES (?, ?)")
                .bind(tie_id)
                .bind(team)
                .execute(&self.pool)
                .await
                .map_err(|e| ServiceError::Internal(e.to_string()))?;
        }
        Ok(())
    }

    async fn record_result(&self, result: &TieBreakerResult) -> ServiceResult<()> {
        sqlx::query(
            "INSERT INTO tie_breaker_results (season_id, team_id, rule, rank_delta, divisional) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(result.season)
        .bind(result.team)
        .bind(result.rule.as_str())
        .bind(result.rank_delta)
        .bind(result.divisional)
        .execute(&self.pool)
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Ok(())
    }

    async fn ties_by_season(&self, season: SeasonId) -> ServiceResult<Vec<Tie>> {
        let rows = sqlx::query("SELECT * FROM ties WHERE season_id = ? ORDER BY id")
            .bind(season)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        let mut ties = Vec::with_capacity(rows.len());
        for row in rows {
            let tie_id: i64 = row
                .try_get("id")
                .map_err(|e| ServiceError::Internal(e.to_string()))?;
            let attribute: String = row
                .try_get("attribute")
                .map_err(|e| ServiceError::Internal(e.to_string()))?;
            let divisional: bool = row
                .try_get("divisional")
                .map_err(|e| ServiceError::Internal(e.to_string()))?;
            let teams = sqlx::query_scalar::<_, i64>(
                "SELECT team_id FROM tie_teams WHERE tie_id = ? ORDER BY team_id",
            )
            .bind(tie_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
            ties.push(Tie {
                season,
                attribute: attribute_from_str(&attribute)?,
                divisional,
                teams,
            });
        }
        Ok(ties)
    }

    async fn results_by_season(&self, season: SeasonId) -> ServiceResult<Vec<TieBreakerResult>> {
        let rows = sqlx::query("SELECT * FROM tie_breaker_results WHERE season_id = ? ORDER BY id")
            .bind(season)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        rows.iter().map(Self::result_from_row).collect()
    }
}
