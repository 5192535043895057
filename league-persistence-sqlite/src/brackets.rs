use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};

use league_domain::{
    ServiceError, ServiceResult,
    bracket::{
        Bracket, BracketId, BracketRepository, BracketSide, Matchup, MatchupId, MatchupSource,
        NewMatchup, Round, RoundId,
    },
    tournament::{ParticipantId, TournamentId},
};

use crate::create_db_pool;

pub struct SqliteBracketRepository {
    pool: Pool<Sqlite>,
}

fn side_as_str(side: BracketSide) -> &'static str {
    match side {
        BracketSide::Winners => "winners",
        BracketSide::Losers => "losers",
    }
}

fn side_from_str(s: &str) -> ServiceResult<BracketSide> {
    match s {
        "winners" => Ok(BracketSide::Winners),
        "losers" => Ok(BracketSide::Losers),
        other => Err(ServiceError::Internal(format!(
            "unknown bracket side [{}]",
            other
        ))),
    }
}

fn source_from_columns(
    matchup: Option<MatchupId>,
    wants_winner: Option<bool>,
) -> Option<MatchupSource> {
    matchup.map(|matchup| MatchupSource {
        matchup,
        wants_winner: wants_winner.unwrap_or(true),
    })
}

impl SqliteBracketRepository {
    pub fn new() -> Self {
        let pool = create_db_pool();
        Self { pool }
    }

    fn bracket_from_row(row: &SqliteRow) -> ServiceResult<Bracket> {
        let side: String = row
            .try_get("side")
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Ok(Bracket {
            id: row
                .try_get("id")
                .map_err(|e| ServiceError::Internal(e.to_string()))?,
            tournament: row
                .try_get("tournament_id")
                .map_err(|e| ServiceError::Internal(e.to_string()))?,
            side: side_from_str(&side)?,
        })
    }

    fn round_from_row(row: &SqliteRow) -> sqlx::Result<Round> {
        Ok(Round {
            id: row.try_get("id")?,
            bracket: row.try_get("bracket_id")?,
            number: row.try_get("number")?,
        })
    }

    fn matchup_from_row(row: &SqliteRow) -> sqlx::Result<Matchup> {
        Ok(Matchup {
            id: row.try_get("id")?,
            round: row.try_get("round_id")?,
            number: row.try_get("number")?,
            participant_a: row.try_get("participant_a")?,
            participant_b: row.try_get("participant_b")?,
            source_a: source_from_columns(
                row.try_get("source_a_matchup")?,
                row.try_get("source_a_wants_winner")?,
            ),
            source_b: source_from_columns(
                row.try_get("source_b_matchup")?,
                row.try_get("source_b_wants_winner")?,
            ),
            winner: row.try_get("winner")?,
            play_order: row.try_get("play_order")?,
        })
    }

    fn matchups_from_rows(rows: Vec<SqliteRow>) -> ServiceResult<Vec<Matchup>> {
        rows.iter()
            .map(|row| {
                Self::matchup_from_row(row).map_err(|e| ServiceError::Internal(e.to_string()))
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl BracketRepository for SqliteBracketRepository {
    async fn find_bracket(
        &self,
        tournament: TournamentId,
        side: BracketSide,
    ) -> ServiceResult<Option<Bracket>> {
        let row = sqlx::query("SELECT * FROM brackets WHERE tournament_id = ? AND side = ?")
            .bind(tournament)
            .bind(side_as_str(side))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        row.map(|r| Self::bracket_from_row(&r)).transpose()
    }

    async fn create_bracket(
        &self,
        tournament: TournamentId,
        side: BracketSide,
    ) -> ServiceResult<Bracket> {
        let result = sqlx::query("INSERT INTO brackets (tournament_id, side) VALUES (?, ?)")
            .bind(tournament)
            .bind(side_as_str(side))
            .execute(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Ok(Bracket {
            id: result.last_insert_rowid(),
            tournament,
            side,
        })
    }

    async fn get_bracket(&self, id: BracketId) -> ServiceResult<Option<Bracket>> {
        let row = sqlx::query("SELECT * FROM brackets WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        row.map(|r| Self::bracket_from_row(&r)).transpose()
    }

    async fn find_round(&self, bracket: BracketId, number: u32) -> ServiceResult<Option<Round>> {
        let row = sqlx::query("SELECT * FROM rounds WHERE bracket_id = ? AND number = ?")
            .bind(bracket)
            .bind(number)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        row.map(|r| Self::round_from_row(&r))
            .transpose()
            .map_err(|e| ServiceError::Internal(e.to_string()))
    }

    async fn create_round(&self, bracket: BracketId, number: u32) -> ServiceResult<Round> {
        let result = sqlx::query("INSERT INTO rounds (bracket_id, number) VALUES (?, ?)")
            .bind(bracket)
            .bind(number)
            .execute(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Ok(Round {
            id: result.last_insert_rowid(),
            bracket,
            number,
        })
    }

    async fn get_round(&self, id: RoundId) -> ServiceResult<Option<Round>> {
        let row = sqlx::query("SELECT * FROM rounds WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        row.map(|r| Self::round_from_row(&r))
            .transpose()
            .map_err(|e| ServiceError::Internal(e.to_string()))
    }

    async fn rounds_by_bracket(&self, bracket: BracketId) -> ServiceResult<Vec<Round>> {
        let rows = sqlx::query("SELECT * FROM rounds WHERE bracket_id = ? ORDER BY number")
            .bind(bracket)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        rows.iter()
            .map(|row| {
                Self::round_from_row(row).map_err(|e| ServiceError::Internal(e.to_string()))
            })
            .collect()
    }

    async fn matchups_by_round(&self, round: RoundId) -> ServiceResult<Vec<Matchup>> {
        let rows = sqlx::query("SELECT * FROM matchups WHERE round_id = ? ORDER BY number")
            .bind(round)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Self::matchups_from_rows(rows)
    }

    async fn find_matchup(&self, new: &NewMatchup) -> ServiceResult<Option<Matchup>> {
        let row = sqlx::query("SELECT * FROM matchups WHERE round_id = ? AND number = ?")
            .bind(new.round)
            .bind(new.number)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        row.map(|r| Self::matchup_from_row(&r))
            .transpose()
            .map_err(|e| ServiceError::Internal(e.to_string()))
    }

    async fn create_matchup(&self, new: &NewMatchup) -> ServiceResult<Matchup> {
        let result = sqlx::query(
            "INSERT INTO matchups (round_id, number, participant_a, participant_b, \
             source_a_matchup, source_a_wants_winner, source_b_matchup, source_b_wants_winner) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(new.round)
        .bind(new.number)
        .bind(new.participant_a)
        .bind(new.participant_b)
        .bind(new.source_a.map(|s| s.matchup))
        .bind(new.source_a.map(|s| s.wants_winner))
        .bind(new.source_b.map(|s| s.matchup))
        .bind(new.source_b.map(|s| s.wants_winner))
        .execute(&self.pool)
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Ok(Matchup {
            id: result.last_insert_rowid(),
            round: new.round,
            number: new.number,
            participant_a: new.participant_a,
            participant_b: new.participant_b,
            source_a: new.source_a,
            source_b: new.source_b,
            winner: None,
            play_order: None,
        })
    }

    async fn get_matchup(&self, id: MatchupId) -> ServiceResult<Option<Matchup>> {
        let row = sqlx::query("SELECT * FROM matchups WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        row.map(|r| Self::matchup_from_row(&r))
            .transpose()
            .map_err(|e| ServiceError::Internal(e.to_string()))
    }

    async fn set_winner(&self, id: MatchupId, winner: ParticipantId) -> ServiceResult<()> {
        sqlx::query("UPDATE matchups SET winner = ? WHERE id = ?")
            .bind(winner)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Ok(())
    }

    async fn set_slot_participants(
        &self,
        id: MatchupId,
        participant_a: Option<ParticipantId>,
        participant_b: Option<ParticipantId>,
    ) -> ServiceResult<()> {
        sqlx::query("UPDATE matchups SET participant_a = ?, participant_b = ? WHERE id = ?")
            .bind(participant_a)
            .bind(participant_b)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Ok(())
    }

    async fn set_play_order(&self, id: MatchupId, order: u32) -> ServiceResult<()> {
        sqlx::query("UPDATE matchups SET play_order = ? WHERE id = ?")
            .bind(order)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Ok(())
    }

    async fn matchups_sourcing(&self, id: MatchupId) -> ServiceResult<Vec<Matchup>> {
        let rows = sqlx::query(
            "SELECT * FROM matchups WHERE source_a_matchup = ? OR source_b_matchup = ? ORDER BY id",
        )
        .bind(id)
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Self::matchups_from_rows(rows)
    }
}
