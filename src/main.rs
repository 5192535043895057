use chrono::NaiveDate;
use log::{LevelFilter, info};
use log4rs::{
    Config,
    append::{
        console::{ConsoleAppender, Target},
        rolling_file::policy::compound::{
            CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
        },
    },
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
};

use league_domain::{
    ServiceResult,
    bracket::{BracketRepository, BracketService},
    ranking::RankingService,
    resolver::MatchupService,
    team::TeamRepository,
};

mod app;

use app::{AppState, build_app_state};

const LOG_SIZE_LIMIT: u64 = 10 * 1024 * 1024; // 10 MB

const LOG_FILE_COUNT: u32 = 3;

fn init_logger() {
    let file_path = std::env::var("LOG_FILE_PATH").expect("LOG_FILE_PATH must be set");
    let archive_pattern =
        std::env::var("LOG_ARCHIVE_PATTERN").expect("LOG_ARCHIVE_PATTERN must be set");

    let stderr_level = LevelFilter::Info;
    let file_level = LevelFilter::Debug;

    let stderr = ConsoleAppender::builder().target(Target::Stderr).build();

    let trigger = SizeTrigger::new(LOG_SIZE_LIMIT);
    let roller = FixedWindowRoller::builder()
        .build(&archive_pattern, LOG_FILE_COUNT)
        .unwrap();
    let policy = CompoundPolicy::new(Box::new(trigger), Box::new(roller));

    let logfile = log4rs::append::rolling_file::RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{l} - {m}\n")))
        .build(file_path, Box::new(policy))
        .unwrap();

    let config = Config::builder()
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(file_level)))
                .build("logfile", Box::new(logfile)),
        )
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(stderr_level)))
                .build("stderr", Box::new(stderr)),
        )
        .build(
            Root::builder()
                .appender("logfile")
                .appender("stderr")
                .build(LevelFilter::Trace),
        )
        .unwrap();

    let _handle = log4rs::init_config(config).expect("Failed to initialize logger");
}

fn usage() -> ! {
    eprintln!("Usage: league-server <command> [args]");
    eprintln!("  rank <season_id> [YYYY-MM-DD]        recompute season standings");
    eprintln!("  standings <season_id>                print season standings");
    eprintln!("  bracket <tournament_id>              generate tournament brackets");
    eprintln!("  record <matchup_id> <participant_id> record a matchup winner");
    eprintln!("  order <matchup_id> <play_order>      set a matchup's play order");
    eprintln!("  describe <matchup_id>                print a matchup's slots");
    std::process::exit(1);
}

fn parse_id(arg: &str) -> i64 {
    arg.parse().unwrap_or_else(|_| usage())
}

async fn run_command(state: &AppState, args: &[String]) -> ServiceResult<()> {
    match args {
        [cmd, season] if cmd == "rank" => {
            state.ranking_service.rank_season(parse_id(season)).await
        }
        [cmd, season, date] if cmd == "rank" => {
            let before = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .unwrap_or_else(|_| usage());
            state
                .ranking_service
                .rank_season_as_of(parse_id(season), before)
                .await
        }
        [cmd, season] if cmd == "standings" => {
            let mut teams = state
                .team_repository
                .teams_by_season(parse_id(season))
                .await?;
            teams.retain(|t| !t.is_excluded());
            teams.sort_by_key(|t| t.ranking.unwrap_or(u32::MAX));
            for team in teams {
                let pct = team
                    .win_percentage
                    .map(|p| format!("{:.3}", p))
                    .unwrap_or_else(|| "-".to_string());
                let rank = team
                    .ranking
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{:>4}  {:<30} {}", rank, team.name, pct);
            }
            Ok(())
        }
        [cmd, tournament] if cmd == "bracket" => {
            state.bracket_service.generate(parse_id(tournament)).await
        }
        [cmd, matchup, participant] if cmd == "record" => {
            state
                .matchup_service
                .record_winner(parse_id(matchup), parse_id(participant))
                .await
        }
        [cmd, matchup, order] if cmd == "order" => {
            let order: u32 = order.parse().unwrap_or_else(|_| usage());
            state
                .bracket_repository
                .set_play_order(parse_id(matchup), order)
                .await
        }
        [cmd, matchup] if cmd == "describe" => {
            let id = parse_id(matchup);
            let Some(matchup) = state.bracket_repository.get_matchup(id).await? else {
                println!("no matchup with id {}", id);
                return Ok(());
            };
            println!("{}", state.matchup_service.describe(&matchup).await?);
            Ok(())
        }
        _ => usage(),
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    init_logger();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        usage();
    }

    let state = build_app_state();

    info!("Running command [{}]", args[0]);

    if let Err(e) = run_command(&state, &args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
