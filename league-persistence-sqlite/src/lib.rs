use sqlx::{
    Pool, Sqlite,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub mod brackets;
pub mod score_sheets;
pub mod teams;
pub mod ties;
pub mod tournaments;

pub use brackets::SqliteBracketRepository;
pub use score_sheets::SqliteScoreSheetRepository;
pub use teams::{SqliteSeasonRepository, SqliteTeamRepository};
pub use ties::SqliteTieRepository;
pub use tournaments::{SqliteParticipantRepository, SqliteTournamentRepository};

/// Lazily connected pool for the league database. The path comes from
/// the LEAGUE_DB env var (loaded from .env if present).
pub fn create_db_pool() -> Pool<Sqlite> {
    dotenvy::dotenv().ok();
    let db_path = std::env::var("LEAGUE_DB").expect("LEAGUE_DB env var not set");
    let connect_options = SqliteConnectOptions::new()
        .filename(&db_path)
        .create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_lazy_with(connect_options)
}
