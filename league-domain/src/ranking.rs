use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use chrono::NaiveDate;
use dashmap::DashMap;
use league_core::find_ties;
use log::{info, warn};

use crate::{
    ServiceError, ServiceResult,
    score_sheet::{ArcScoreSheetRepository, ScoreSheet},
    stats::{self, TeamRecord},
    team::{ArcSeasonRepository, ArcTeamRepository, DivisionId, SeasonId, Team, TeamId},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RankAttribute {
    WinPercentage,
    Ranking,
    DivisionRanking,
}

impl RankAttribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            RankAttribute::WinPercentage => "win_percentage",
            RankAttribute::Ranking => "ranking",
            RankAttribute::DivisionRanking => "division_ranking",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TieBreakRule {
    NetGameWins,
    DivisionRank,
    ForfeitWins,
    Manual,
}

impl TieBreakRule {
    /// Rules where a larger raw value means a better placement flip
    /// the default ascending sort. Forfeit wins deliberately do not:
    /// a win by forfeit ranks the team worse.
    pub fn reverse_order(&self) -> bool {
        matches!(self, TieBreakRule::NetGameWins | TieBreakRule::Manual)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TieBreakRule::NetGameWins => "net_game_wins",
            TieBreakRule::DivisionRank => "division_rank",
            TieBreakRule::ForfeitWins => "forfeit_wins",
            TieBreakRule::Manual => "rank_tie_breaker",
        }
    }
}

/// Ephemeral grouping of teams sharing a rank attribute value during
/// one ranking run. Rows from a prior run are discarded when the next
/// run starts.
#[derive(Clone, Debug)]
pub struct Tie {
    pub season: SeasonId,
    pub attribute: RankAttribute,
    pub divisional: bool,
    pub teams: Vec<TeamId>,
}

/// Append-only audit row: which rule moved which team, and by how much.
#[derive(Clone, Debug)]
pub struct TieBreakerResult {
    pub season: SeasonId,
    pub team: TeamId,
    pub rule: TieBreakRule,
    pub rank_delta: u32,
    pub divisional: bool,
}

pub type ArcTieRepository = Arc<Box<dyn TieRepository + Send + Sync + 'static>>;
#[async_trait::async_trait]
pub trait TieRepository {
    async fn clear_season(&self, season: SeasonId) -> ServiceResult<()>;
    async fn record_tie(&self, tie: &Tie) -> ServiceResult<()>;
    async fn record_result(&self, result: &TieBreakerResult) -> ServiceResult<()>;
    async fn ties_by_season(&self, season: SeasonId) -> ServiceResult<Vec<Tie>>;
    async fn results_by_season(&self, season: SeasonId) -> ServiceResult<Vec<TieBreakerResult>>;
}

/// Sorts tie-group members by a rule value and computes each member's
/// rank offset. Members with equal values share the offset of the
/// first member of their sub-run. Returns None when the rule fails to
/// separate any pair, leaving the group for the next cascade rule.
pub fn rank_offsets(members: &[(TeamId, i64)], reverse: bool) -> Option<Vec<(TeamId, u32)>> {
    if members.iter().all(|(_, v)| *v == members[0].1) {
        return None;
    }
    let mut sorted = members.to_vec();
    if reverse {
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
    } else {
        sorted.sort_by(|a, b| a.1.cmp(&b.1));
    }
    let mut offsets = Vec::with_capacity(sorted.len());
    let mut run_start = 0usize;
    for (i, (team, value)) in sorted.iter().enumerate() {
        if *value != sorted[run_start].1 {
            run_start = i;
        }
        offsets.push((*team, run_start as u32));
    }
    Some(offsets)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RankScope {
    Division(DivisionId),
    Overall,
}

impl RankScope {
    fn attribute(&self) -> RankAttribute {
        match self {
            RankScope::Division(_) => RankAttribute::DivisionRanking,
            RankScope::Overall => RankAttribute::Ranking,
        }
    }

    fn rank_of(&self, team: &Team) -> Option<u32> {
        match self {
            RankScope::Division(_) => team.division_ranking,
            RankScope::Overall => team.ranking,
        }
    }
}

pub type ArcRankingService = Arc<Box<dyn RankingService + Send + Sync + 'static>>;
#[async_trait::async_trait]
pub trait RankingService {
    /// Full run: one pass per division, then the season-wide pass.
    async fn rank_season(&self, season: SeasonId) -> ServiceResult<()>;
    /// Same, with games on or after the cutoff excluded and the
    /// minimum-games threshold pro-rated to the cutoff.
    async fn rank_season_as_of(&self, season: SeasonId, before: NaiveDate) -> ServiceResult<()>;
}

pub struct RankingServiceImpl {
    season_repository: ArcSeasonRepository,
    team_repository: ArcTeamRepository,
    score_sheet_repository: ArcScoreSheetRepository,
    tie_repository: ArcTieRepository,
    season_locks: DashMap<SeasonId, Arc<tokio::sync::Mutex<()>>>,
}

impl RankingServiceImpl {
    pub fn new(
        season_repository: ArcSeasonRepository,
        team_repository: ArcTeamRepository,
        score_sheet_repository: ArcScoreSheetRepository,
        tie_repository: ArcTieRepository,
    ) -> Self {
        Self {
            season_repository,
            team_repository,
            score_sheet_repository,
            tie_repository,
            season_locks: DashMap::new(),
        }
    }

    fn season_lock(&self, season: SeasonId) -> Arc<tokio::sync::Mutex<()>> {
        self.season_locks
            .entry(season)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    async fn fetch_scope(&self, season: SeasonId, scope: RankScope) -> ServiceResult<Vec<Team>> {
        match scope {
            RankScope::Division(division) => {
                self.team_repository
                    .teams_by_division(season, division)
                    .await
            }
            RankScope::Overall => self.team_repository.teams_by_season(season).await,
        }
    }

    async fn write_rank(&self, scope: RankScope, team: TeamId, rank: u32) -> ServiceResult<()> {
        match scope {
            RankScope::Division(_) => {
                self.team_repository
                    .update_division_ranking(team, rank)
                    .await
            }
            RankScope::Overall => self.team_repository.update_ranking(team, rank).await,
        }
    }

    fn rule_values(
        &self,
        rule: TieBreakRule,
        members: &[Team],
        records: &HashMap<TeamId, TeamRecord>,
        head_to_head: &[ScoreSheet],
    ) -> Vec<(TeamId, i64)> {
        members
            .iter()
            .map(|team| {
                let value = match rule {
                    TieBreakRule::NetGameWins => stats::net_game_wins(team.id, head_to_head),
                    TieBreakRule::DivisionRank => {
                        team.division_ranking.map(i64::from).unwrap_or(i64::MAX)
                    }
                    TieBreakRule::ForfeitWins => records
                        .get(&team.id)
                        .map(|r| r.forfeit_wins as i64)
                        .unwrap_or(0),
                    TieBreakRule::Manual => team.rank_tie_breaker as i64,
                };
                (team.id, value)
            })
            .collect()
    }

    /// Applies one rule to one tie group. The group's members all hold
    /// `base_rank`; members separated by the rule get `base_rank +
    /// offset`, and co-tied members keep sharing a rank.
    async fn break_group(
        &self,
        season: SeasonId,
        scope: RankScope,
        base_rank: u32,
        members: &[Team],
        rule: TieBreakRule,
        records: &HashMap<TeamId, TeamRecord>,
        before: Option<NaiveDate>,
    ) -> ServiceResult<()> {
        let head_to_head = if rule == TieBreakRule::NetGameWins {
            let ids: Vec<TeamId> = members.iter().map(|t| t.id).collect();
            let mut sheets = self
                .score_sheet_repository
                .sheets_between(season, &ids)
                .await?;
            // a dated run must break ties on the same sheets the win
            // percentages were formed on
            if let Some(cutoff) = before {
                sheets.retain(|s| s.date < cutoff);
            }
            sheets
        } else {
            Vec::new()
        };
        let values = self.rule_values(rule, members, records, &head_to_head);
        let Some(offsets) = rank_offsets(&values, rule.reverse_order()) else {
            return Ok(());
        };
        let divisional = matches!(scope, RankScope::Division(_));
        for (team, offset) in offsets {
            self.write_rank(scope, team, base_rank + offset).await?;
            if offset != 0 {
                self.tie_repository
                    .record_result(&TieBreakerResult {
                        season,
                        team,
                        rule,
                        rank_delta: offset,
                        divisional,
                    })
                    .await?;
            }
        }
        Ok(())
    }

    /// Re-reads the scope's teams and regroups them on their current
    /// rank value. Later cascade steps always see the writes of the
    /// previous step.
    async fn rank_tie_groups(
        &self,
        season: SeasonId,
        scope: RankScope,
    ) -> ServiceResult<Vec<(u32, Vec<Team>)>> {
        let mut teams: Vec<Team> = self
            .fetch_scope(season, scope)
            .await?
            .into_iter()
            .filter(|t| scope.rank_of(t).is_some_and(|r| r > 0))
            .collect();
        teams.sort_by_key(|t| scope.rank_of(t).unwrap_or(u32::MAX));
        let keys: Vec<u32> = teams
            .iter()
            .map(|t| scope.rank_of(t).unwrap_or(u32::MAX))
            .collect();
        let partition = find_ties(&keys);
        Ok(partition
            .groups
            .iter()
            .map(|group| (keys[group.start], teams[group.range()].to_vec()))
            .collect())
    }

    async fn cascade_step(
        &self,
        season: SeasonId,
        scope: RankScope,
        rule: TieBreakRule,
        records: &HashMap<TeamId, TeamRecord>,
        before: Option<NaiveDate>,
    ) -> ServiceResult<()> {
        let groups = self.rank_tie_groups(season, scope).await?;
        let divisional = matches!(scope, RankScope::Division(_));
        for (base_rank, members) in groups {
            self.tie_repository
                .record_tie(&Tie {
                    season,
                    attribute: scope.attribute(),
                    divisional,
                    teams: members.iter().map(|t| t.id).collect(),
                })
                .await?;
            self.break_group(season, scope, base_rank, &members, rule, records, before)
                .await?;
        }
        Ok(())
    }

    async fn rank_pass(
        &self,
        season: SeasonId,
        scope: RankScope,
        sheets: &[ScoreSheet],
        threshold: u32,
        before: Option<NaiveDate>,
    ) -> ServiceResult<()> {
        let teams = self.fetch_scope(season, scope).await?;
        if teams.is_empty() {
            return Ok(());
        }

        let mut records = HashMap::new();
        for team in &teams {
            records.insert(team.id, stats::team_record(team.id, sheets, before));
        }

        // Teams under the minimum-games threshold are excluded from
        // the standings entirely and marked with rank 0.
        let mut ranked: Vec<&Team> = Vec::new();
        for team in &teams {
            let record = &records[&team.id];
            self.team_repository
                .update_win_percentage(team.id, stats::win_percentage(record))
                .await?;
            if record.matches_played < threshold {
                self.write_rank(scope, team.id, 0).await?;
            } else {
                ranked.push(team);
            }
        }
        ranked.sort_by(|a, b| {
            let pa = stats::win_percentage(&records[&a.id]).unwrap_or(0.0);
            let pb = stats::win_percentage(&records[&b.id]).unwrap_or(0.0);
            pb.total_cmp(&pa)
        });

        // Pass 1: positional ranks from win percentage, net game wins
        // among the tied teams breaking each group.
        let keys: Vec<f64> = ranked
            .iter()
            .map(|t| stats::win_percentage(&records[&t.id]).unwrap_or(0.0))
            .collect();
        let partition = find_ties(&keys);
        for (i, team) in ranked.iter().enumerate() {
            self.write_rank(scope, team.id, partition.ranks[i]).await?;
        }
        let divisional = matches!(scope, RankScope::Division(_));
        for group in &partition.groups {
            let members: Vec<Team> = group.range().map(|i| ranked[i].clone()).collect();
            self.tie_repository
                .record_tie(&Tie {
                    season,
                    attribute: RankAttribute::WinPercentage,
                    divisional,
                    teams: members.iter().map(|t| t.id).collect(),
                })
                .await?;
            self.break_group(
                season,
                scope,
                group.rank(),
                &members,
                TieBreakRule::NetGameWins,
                &records,
                before,
            )
            .await?;
        }

        // Pass 2 (season-wide only): division rank as the next rule.
        if scope == RankScope::Overall {
            self.cascade_step(season, scope, TieBreakRule::DivisionRank, &records, before)
                .await?;
        }

        // Passes 3 and 4: forfeit wins, then the manual override.
        self.cascade_step(season, scope, TieBreakRule::ForfeitWins, &records, before)
            .await?;
        self.cascade_step(season, scope, TieBreakRule::Manual, &records, before)
            .await?;

        // Whatever survives the whole cascade legitimately stays tied.
        let leftovers = self.rank_tie_groups(season, scope).await?;
        for (base_rank, members) in leftovers {
            let ids: Vec<TeamId> = members.iter().map(|t| t.id).collect();
            warn!(
                "season {}: irreducible tie at rank {} between teams {:?}",
                season, base_rank, ids
            );
            self.tie_repository
                .record_tie(&Tie {
                    season,
                    attribute: scope.attribute(),
                    divisional,
                    teams: ids,
                })
                .await?;
        }
        Ok(())
    }

    async fn run(&self, season_id: SeasonId, before: Option<NaiveDate>) -> ServiceResult<()> {
        let lock = self.season_lock(season_id);
        let _guard = lock.lock().await;

        let Some(season) = self.season_repository.get_season(season_id).await? else {
            return ServiceError::not_found(format!("season {} does not exist", season_id));
        };
        let teams = self.team_repository.teams_by_season(season_id).await?;
        if teams.is_empty() {
            info!("season {}: no teams to rank", season_id);
            return Ok(());
        }

        self.tie_repository.clear_season(season_id).await?;
        let threshold = match before {
            Some(date) => season.standings_minimum_games(date),
            None => season.minimum_games,
        };
        let sheets = self.score_sheet_repository.sheets_by_season(season_id).await?;

        let divisions: BTreeSet<DivisionId> = teams.iter().filter_map(|t| t.division).collect();
        for division in divisions {
            info!("season {}: ranking division {}", season_id, division);
            self.rank_pass(
                season_id,
                RankScope::Division(division),
                &sheets,
                threshold,
                before,
            )
            .await?;
        }
        info!("season {}: ranking season-wide", season_id);
        self.rank_pass(season_id, RankScope::Overall, &sheets, threshold, before)
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl RankingService for RankingServiceImpl {
    async fn rank_season(&self, season: SeasonId) -> ServiceResult<()> {
        self.run(season, None).await
    }

    async fn rank_season_as_of(&self, season: SeasonId, before: NaiveDate) -> ServiceResult<()> {
        self.run(season, Some(before)).await
    }
}
