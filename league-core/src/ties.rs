#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TieGroup {
    pub start: usize,
    pub len: usize,
}

impl TieGroup {
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.len
    }

    pub fn rank(&self) -> u32 {
        (self.start + 1) as u32
    }
}

#[derive(Clone, Debug, Default)]
pub struct TiePartition {
    pub groups: Vec<TieGroup>,
    pub ranks: Vec<u32>,
}

/// Partitions a pre-sorted sequence of attribute values into maximal
/// runs of equal value. Runs of length >= 2 become tie groups; every
/// position gets the positional rank of the first member of its run.
pub fn find_ties<K: PartialEq>(keys: &[K]) -> TiePartition {
    let mut groups = Vec::new();
    let mut ranks = Vec::with_capacity(keys.len());
    let mut run_start = 0usize;
    for (i, key) in keys.iter().enumerate() {
        if *key != keys[run_start] {
            if i - run_start >= 2 {
                groups.push(TieGroup {
                    start: run_start,
                    len: i - run_start,
                });
            }
            run_start = i;
        }
        ranks.push((run_start + 1) as u32);
    }
    if !keys.is_empty() && keys.len() - run_start >= 2 {
        groups.push(TieGroup {
            start: run_start,
            len: keys.len() - run_start,
        });
    }
    TiePartition { groups, ranks }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_ties() {
        let partition = find_ties(&[8, 6, 5, 3]);
        assert!(partition.groups.is_empty());
        assert_eq!(partition.ranks, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_single_group_in_middle() {
        let partition = find_ties(&[9, 7, 7, 7, 4, 2]);
        assert_eq!(
            partition.groups,
            vec![TieGroup { start: 1, len: 3 }]
        );
        assert_eq!(partition.ranks, vec![1, 2, 2, 2, 5, 6]);
    }

    #[test]
    fn test_multiple_groups() {
        let partition = find_ties(&[5, 5, 4, 3, 3, 3, 1]);
        assert_eq!(
            partition.groups,
            vec![
                TieGroup { start: 0, len: 2 },
                TieGroup { start: 3, len: 3 }
            ]
        );
        assert_eq!(partition.ranks, vec![1, 1, 3, 4, 4, 4, 7]);
    }

    #[test]
    fn test_all_tied() {
        let partition = find_ties(&[2.5f64, 2.5, 2.5]);
        assert_eq!(
            partition.groups,
            vec![TieGroup { start: 0, len: 3 }]
        );
        assert_eq!(partition.ranks, vec![1, 1, 1]);
    }

    #[test]
    fn test_trailing_group() {
        let partition = find_ties(&[4, 2, 2]);
        assert_eq!(
            partition.groups,
            vec![TieGroup { start: 1, len: 2 }]
        );
        assert_eq!(partition.ranks, vec![1, 2, 2]);
    }

    #[test]
    fn test_empty() {
        let partition = find_ties::<i64>(&[]);
        assert!(partition.groups.is_empty());
        assert!(partition.ranks.is_empty());
    }

    #[test]
    fn test_partition_covers_input() {
        let keys = [7, 7, 6, 6, 6, 5, 4, 4, 1];
        let partition = find_ties(&keys);
        let mut covered = vec![false; keys.len()];
        for group in &partition.groups {
            assert!(group.len >= 2);
            for i in group.range() {
                assert!(!covered[i], "group overlap at {}", i);
                covered[i] = true;
            }
        }
        // positions outside any group are singletons with their own rank
        for (i, c) in covered.iter().enumerate() {
            if !c {
                assert_eq!(partition.ranks[i], (i + 1) as u32);
            }
        }
        assert_eq!(partition.ranks.len(), keys.len());
    }
}
