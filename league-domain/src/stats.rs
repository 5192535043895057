use chrono::NaiveDate;

use crate::{score_sheet::ScoreSheet, team::TeamId};

/// Raw per-team totals recomputed from score sheets at the start of a
/// ranking run. Only official, non-playoff sheets count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TeamRecord {
    pub matches_played: u32,
    pub matches_won: u32,
    pub games_won: u32,
    pub games_lost: u32,
    pub forfeit_wins: u32,
}

pub fn team_record(team: TeamId, sheets: &[ScoreSheet], before: Option<NaiveDate>) -> TeamRecord {
    let mut record = TeamRecord::default();
    for sheet in sheets {
        if !sheet.counts_for_standings() || !sheet.involves(team) {
            continue;
        }
        if let Some(cutoff) = before
            && sheet.date >= cutoff
        {
            continue;
        }
        let (won, lost) = sheet.games_for(team);
        record.matches_played += 1;
        record.games_won += won;
        record.games_lost += lost;
        record.forfeit_wins += sheet.forfeit_wins_for(team);
        if sheet.winner() == Some(team) {
            record.matches_won += 1;
        }
    }
    record
}

pub fn win_percentage(record: &TeamRecord) -> Option<f64> {
    if record.matches_played == 0 {
        None
    } else {
        Some(record.matches_won as f64 / record.matches_played as f64)
    }
}

/// Net game differential for one team, restricted to the sheets given.
/// Callers pass sheets already filtered to the tie group's members, so
/// this is the head-to-head differential within the group.
pub fn net_game_wins(team: TeamId, sheets: &[ScoreSheet]) -> i64 {
    let mut net = 0i64;
    for sheet in sheets {
        if !sheet.counts_for_standings() {
            continue;
        }
        let (won, lost) = sheet.games_for(team);
        net += won as i64 - lost as i64;
    }
    net
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(home: TeamId, away: TeamId, home_games: u32, away_games: u32) -> ScoreSheet {
        ScoreSheet {
            id: 0,
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
    fn test_team_record_totals() {
        let sheets = vec![sheet(1, 2, 9, 7), sheet(3, 1, 8, 8), sheet(2, 1, 5, 11)];
        let record = team_record(1, &sheets, None);
        assert_eq!(record.matches_played, 3);
        assert_eq!(record.matches_won, 2);
        assert_eq!(record.games_won, 9 + 8 + 11);
        assert_eq!(record.games_lost, 7 + 8 + 5);
        assert_eq!(win_percentage(&record), Some(2.0 / 3.0));
    }

    #[test]
    fn test_record_respects_cutoff_date() {
        let mut early = sheet(1, 2, 9, 7);
        early.date = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        let late = sheet(1, 2, 9, 7);
        let sheets = vec![early, late];
        let cutoff = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        assert_eq!(team_record(1, &sheets, Some(cutoff)).matches_played, 1);
    }

    #[test]
    fn test_no_games_no_percentage() {
        assert_eq!(win_percentage(&team_record(9, &[], None)), None);
    }

    #[test]
    fn test_forfeit_wins_counted() {
        let mut s = sheet(1, 2, 9, 7);
        s.home_forfeit_wins = 1;
        let record = team_record(1, &[s.clone()], None);
        assert_eq!(record.forfeit_wins, 1);
        assert_eq!(team_record(2, &[s], None).forfeit_wins, 0);
    }

    #[test]
    fn test_net_game_wins() {
        let sheets = vec![sheet(1, 2, 9, 7)];
        assert_eq!(net_game_wins(1, &sheets), 2);
        assert_eq!(net_game_wins(2, &sheets), -2);
    }

    #[test]
    fn test_net_game_wins_skips_playoff_sheets() {
        let mut s = sheet(1, 2, 9, 7);
        s.playoff = true;
        assert_eq!(net_game_wins(1, &[s]), 0);
    }
}
