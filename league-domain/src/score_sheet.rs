use std::sync::Arc;

use chrono::NaiveDate;

use crate::{
    ServiceResult,
    team::{SeasonId, TeamId},
};

pub type SheetId = i64;

/// One completed match between two teams, with per-game totals. Home
/// and away are plain fields on the sheet; a forfeited game is counted
/// in the winning side's forfeit counter as well as its games column.
#[derive(Clone, Debug)]
pub struct ScoreSheet {
    pub id: SheetId,
    pub season: SeasonId,
    pub home_team: TeamId,
    pub away_team: TeamId,
    pub home_games: u32,
    pub away_games: u32,
    pub home_forfeit_wins: u32,
    pub away_forfeit_wins: u32,
    pub official: bool,
    pub playoff: bool,
    pub date: NaiveDate,
}

impl ScoreSheet {
    pub fn counts_for_standings(&self) -> bool {
        self.official && !self.playoff
    }

    pub fn involves(&self, team: TeamId) -> bool {
        self.home_team == team || self.away_team == team
    }

    /// Games won and lost from the given team's perspective.
    pub fn games_for(&self, team: TeamId) -> (u32, u32) {
        if self.home_team == team {
            (self.home_games, self.away_games)
        } else if self.away_team == team {
            (self.away_games, self.home_games)
        } else {
            (0, 0)
        }
    }

    pub fn forfeit_wins_for(&self, team: TeamId) -> u32 {
        if self.home_team == team {
            self.home_forfeit_wins
        } else if self.away_team == team {
            self.away_forfeit_wins
        } else {
            0
        }
    }

    /// The sheet's match winner, None on an even split.
    pub fn winner(&self) -> Option<TeamId> {
        if self.home_games > self.away_games {
            Some(self.home_team)
        } else if self.away_games > self.home_games {
            Some(self.away_team)
        } else {
            None
        }
    }
}

pub type ArcScoreSheetRepository = Arc<Box<dyn ScoreSheetRepository + Send + Sync + 'static>>;
#[async_trait::async_trait]
pub trait ScoreSheetRepository {
    async fn sheets_by_season(&self, season: SeasonId) -> ServiceResult<Vec<ScoreSheet>>;
    /// Sheets where both sides belong to the given team subset.
    async fn sheets_between(
        &self,
        season: SeasonId,
        teams: &[TeamId],
    ) -> ServiceResult<Vec<ScoreSheet>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(home: TeamId, away: TeamId, home_games: u32, away_games: u32) -> ScoreSheet {
        ScoreSheet {
            id: 1,
            season: 1,
            home_team: home,
            away_team: away,
            home_games,
            away_games,
            home_forfeit_wins: 0,
            away_forfeit_wins: 0,
            official: true,
            playoff: false,
            date: NaiveDate::from_ymd_opt(2026, 2, 10).unwrap(),
        }
    }

    #[test]
    fn test_winner_and_games() {
        let s = sheet(1, 2, 9, 7);
        assert_eq!(s.winner(), Some(1));
        assert_eq!(s.games_for(1), (9, 7));
        assert_eq!(s.games_for(2), (7, 9));
        assert_eq!(s.games_for(3), (0, 0));
    }

    #[test]
    fn test_even_split_has_no_winner() {
        assert_eq!(sheet(1, 2, 8, 8).winner(), None);
    }

    #[test]
    fn test_playoff_sheets_do_not_count() {
        let mut s = sheet(1, 2, 9, 7);
        s.playoff = true;
        assert!(!s.counts_for_standings());
        s.playoff = false;
        s.official = false;
        assert!(!s.counts_for_standings());
    }
}
