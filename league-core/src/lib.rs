mod ties;
mod topology;

pub use ties::{TieGroup, TiePartition, find_ties};
pub use topology::{
    EliminationKind, bracket_size, drop_in_source_round, is_drop_in_round, losers_round_count,
    losers_round_matchups, round_count, winners_round_matchups,
};
