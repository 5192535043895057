#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EliminationKind {
    Single,
    Double,
}

/// Smallest power of two >= the participant count.
pub fn bracket_size(participant_count: usize) -> usize {
    participant_count.next_power_of_two()
}

/// Number of winners-bracket rounds needed for the participant count.
pub fn round_count(participant_count: usize) -> u32 {
    bracket_size(participant_count).trailing_zeros()
}

pub fn winners_round_matchups(bracket_size: usize, round: u32) -> usize {
    bracket_size >> round
}

/// Matchups in losers-bracket round `round` (1-indexed). Sizes repeat
/// in pairs: a bracket of 64 gives 16, 16, 8, 8, 4, 4, 2, 2, 1.
pub fn losers_round_matchups(bracket_size: usize, round: u32) -> usize {
    bracket_size >> (round.div_ceil(2) + 1)
}

/// Total losers-bracket rounds in a double-elimination bracket. Every
/// winners round past the first feeds a drop-in round, and each
/// drop-in round is followed by an elimination round, except that the
/// last elimination round is the losers final.
pub fn losers_round_count(participant_count: usize) -> u32 {
    let rounds = round_count(participant_count);
    if rounds < 2 { 0 } else { 2 * rounds - 3 }
}

/// Drop-in rounds receive the losers of a winners-bracket round;
/// odd rounds past the first pair up losers-bracket survivors.
pub fn is_drop_in_round(round: u32) -> bool {
    round % 2 == 0
}

/// The winners-bracket round whose losers enter the given drop-in
/// losers round.
pub fn drop_in_source_round(losers_round: u32) -> u32 {
    losers_round / 2 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bracket_size_bounds() {
        for n in 1..=1024usize {
            let size = bracket_size(n);
            assert!(size >= n);
            assert!(size.is_power_of_two());
            assert_eq!(size == n, n.is_power_of_two());
        }
    }

    #[test]
    fn test_round_count() {
        assert_eq!(round_count(2), 1);
        assert_eq!(round_count(3), 2);
        assert_eq!(round_count(4), 2);
        assert_eq!(round_count(5), 3);
        assert_eq!(round_count(8), 3);
        assert_eq!(round_count(9), 4);
        assert_eq!(round_count(64), 6);
    }

    #[test]
    fn test_winners_round_matchups() {
        assert_eq!(winners_round_matchups(64, 1), 32);
        assert_eq!(winners_round_matchups(64, 2), 16);
        assert_eq!(winners_round_matchups(64, 6), 1);
        assert_eq!(winners_round_matchups(8, 3), 1);
    }

    #[test]
    fn test_losers_round_sizes_64() {
        let sizes: Vec<usize> = (1..=losers_round_count(64))
            .map(|r| losers_round_matchups(64, r))
            .collect();
        assert_eq!(sizes, vec![16, 16, 8, 8, 4, 4, 2, 2, 1]);
    }

    #[test]
    fn test_losers_round_sizes_8() {
        let sizes: Vec<usize> = (1..=losers_round_count(8))
            .map(|r| losers_round_matchups(8, r))
            .collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn test_losers_rounds_non_power_of_two() {
        // 6 entrants round up to a bracket of 8
        assert_eq!(losers_round_count(6), 3);
        assert_eq!(losers_round_matchups(bracket_size(6), 1), 2);
        // 2 entrants leave nobody to pair in a losers bracket
        assert_eq!(losers_round_count(2), 0);
    }

    #[test]
    fn test_drop_in_rounds() {
        assert!(!is_drop_in_round(1));
        assert!(is_drop_in_round(2));
        assert!(!is_drop_in_round(3));
        assert!(is_drop_in_round(4));
        assert_eq!(drop_in_source_round(2), 2);
        assert_eq!(drop_in_source_round(4), 3);
        assert_eq!(drop_in_source_round(8), 5);
    }
}
