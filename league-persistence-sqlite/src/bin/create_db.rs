use sqlx::{
    Pool, Sqlite,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS seasons (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        start_date TEXT NOT NULL,
        end_date TEXT NOT NULL,
        minimum_games INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS teams (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        season_id INTEGER NOT NULL REFERENCES seasons(id),
        division_id INTEGER,
        name TEXT NOT NULL,
        win_percentage REAL,
        ranking INTEGER,
        division_ranking INTEGER,
        rank_tie_breaker INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS score_sheets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        season_id INTEGER NOT NULL REFERENCES seasons(id),
        home_team_id INTEGER NOT NULL REFERENCES teams(id),
        away_team_id INTEGER NOT NULL REFERENCES teams(id),
        home_games INTEGER NOT NULL DEFAULT 0,
        away_games INTEGER NOT NULL DEFAULT 0,
        home_forfeit_wins INTEGER NOT NULL DEFAULT 0,
        away_forfeit_wins INTEGER NOT NULL DEFAULT 0,
        official INTEGER NOT NULL DEFAULT 0,
        playoff INTEGER NOT NULL DEFAULT 0,
        date TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS ties (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        season_id INTEGER NOT NULL REFERENCES seasons(id),
        attribute TEXT NOT NULL,
        divisional INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS tie_teams (
        tie_id INTEGER NOT NULL REFERENCES ties(id),
        team_id INTEGER NOT NULL REFERENCES teams(id)
    )",
    "CREATE TABLE IF NOT EXISTS tie_breaker_results (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        season_id INTEGER NOT NULL REFERENCES seasons(id),
        team_id INTEGER NOT NULL REFERENCES teams(id),
        rule TEXT NOT NULL,
        rank_delta INTEGER NOT NULL,
        divisional INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS tournaments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        kind TEXT NOT NULL,
        elimination TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS participants (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        tournament_id INTEGER NOT NULL REFERENCES tournaments(id),
        name TEXT NOT NULL,
        seed INTEGER,
        place INTEGER
    )",
    "CREATE TABLE IF NOT EXISTS brackets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        tournament_id INTEGER NOT NULL REFERENCES tournaments(id),
        side TEXT NOT NULL,
        UNIQUE (tournament_id, side)
    )",
    "CREATE TABLE IF NOT EXISTS rounds (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        bracket_id INTEGER NOT NULL REFERENCES brackets(id),
        number INTEGER NOT NULL,
        UNIQUE (bracket_id, number)
    )",
    "CREATE TABLE IF NOT EXISTS matchups (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        round_id INTEGER NOT NULL REFERENCES rounds(id),
        number INTEGER NOT NULL,
        participant_a INTEGER REFERENCES participants(id),
        participant_b INTEGER REFERENCES participants(id),
        source_a_matchup INTEGER REFERENCES matchups(id),
        source_a_wants_winner INTEGER,
        source_b_matchup INTEGER REFERENCES matchups(id),
        source_b_wants_winner INTEGER,
        winner INTEGER REFERENCES participants(id),
        play_order INTEGER,
        UNIQUE (round_id, number)
    )",
];

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let db_path = std::env::var("LEAGUE_DB").expect("LEAGUE_DB env var not set");

    let connect_options = SqliteConnectOptions::new()
        .filename(&db_path)
        .create_if_missing(true);

    let conn: Pool<Sqlite> = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(connect_options)
        .await
        .expect("Failed to create pool");

    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(&conn)
            .await
            .expect("Failed to create table");
    }

    println!("Created schema in [{}]", db_path);
}
