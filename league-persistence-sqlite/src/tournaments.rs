use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};

use league_core::EliminationKind;
use league_domain::{
    ServiceError, ServiceResult,
    tournament::{
        Participant, ParticipantId, ParticipantRepository, Tournament, TournamentId,
        TournamentKind, TournamentRepository,
    },
};

use crate::create_db_pool;

pub struct SqliteTournamentRepository {
    pool: Pool<Sqlite>,
}

fn kind_from_str(s: &str) -> ServiceResult<TournamentKind> {
    match s {
        "singles" => Ok(TournamentKind::Singles),
        "doubles" => Ok(TournamentKind::Doubles),
        "teams" => Ok(TournamentKind::Teams),
        other => Err(ServiceError::Internal(format!(
            "unknown tournament kind [{}]",
            other
        ))),
    }
}

fn elimination_from_str(s: &str) -> ServiceResult<EliminationKind> {
    match s {
        "single" => Ok(EliminationKind::Single),
        "double" => Ok(EliminationKind::Double),
        other => Err(ServiceError::Internal(format!(
            "unknown elimination kind [{}]",
            other
        ))),
    }
}

impl SqliteTournamentRepository {
    pub fn new() -> Self {
        let pool = create_db_pool();
        Self { pool }
    }

    fn tournament_from_row(row: &SqliteRow) -> ServiceResult<Tournament> {
        let kind: String = row
            .try_get("kind")
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        let elimination: String = row
            .try_get("elimination")
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Ok(Tournament {
            id: row
                .try_get("id")
                .map_err(|e| ServiceError::Internal(e.to_string()))?,
            name: row
                .try_get("name")
                .map_err(|e| ServiceError::Internal(e.to_string()))?,
            kind: kind_from_str(&kind)?,
            elimination: elimination_from_str(&elimination)?,
        })
    }
}

#[async_trait::async_trait]
impl TournamentRepository for SqliteTournamentRepository {
    async fn get_tournament(&self, id: TournamentId) -> ServiceResult<Option<Tournament>> {
        let row = sqlx::query("SELECT * FROM tournaments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        row.map(|r| Self::tournament_from_row(&r)).transpose()
    }
}

pub struct SqliteParticipantRepository {
    pool: Pool<Sqlite>,
}

impl SqliteParticipantRepository {
    pub fn new() -> Self {
        let pool = create_db_pool();
        Self { pool }
    }

    fn participant_from_row(row: &SqliteRow) -> sqlx::Result<Participant> {
        Ok(Participant {
            id: row.try_get("id")?,
            tournament: row.try_get("tournament_id")?,
            name: row.try_get("name")?,
            seed: row.try_get("seed")?,
            place: row.try_get("place")?,
        })
    }
}

#[async_trait::async_trait]
impl ParticipantRepository for SqliteParticipantRepository {
    async fn participants_by_tournament(
        &self,
        tournament: TournamentId,
    ) -> ServiceResult<Vec<Participant>> {
        let rows = sqlx::query(
            "SELECT * FROM participants WHERE tournament_id = ? \
             ORDER BY seed IS NULL, seed, id",
        )
        .bind(tournament)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))?;
        rows.iter()
            .map(|row| {
                Self::participant_from_row(row).map_err(|e| ServiceError::Internal(e.to_string()))
            })
            .collect()
    }

    async fn get_participant(&self, id: ParticipantId) -> ServiceResult<Option<Participant>> {
        let row = sqlx::query("SELECT * FROM participants WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        row.map(|r| Self::participant_from_row(&r))
            .transpose()
            .map_err(|e| ServiceError::Internal(e.to_string()))
    }

    async fn set_place(&self, id: ParticipantId, place: u32) -> ServiceResult<()> {
        sqlx::query("UPDATE participants SET place = ? WHERE id = ?")
            .bind(place)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Ok(())
    }
}
