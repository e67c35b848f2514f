use crate::filter::Filter;
use crate::player::PlayerSnapshot;

/// Set of snapshot indices matched by a filter, one bit per player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerMask {
    words: Vec<u64>,
    len: usize,
}

impl PlayerMask {
    pub fn empty(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
            len,
        }
    }

    /// Evaluate `filter` once against every player in the snapshot
    pub fn from_filter(filter: &Filter, snapshot: &PlayerSnapshot) -> Self {
        let mut mask = Self::empty(snapshot.len());
        for (i, player) in snapshot.players().iter().enumerate() {
            if filter.evaluate(player) {
                mask.words[i / 64] |= 1u64 << (i % 64);
            }
        }
        mask
    }

    pub fn contains(&self, index: usize) -> bool {
        index < self.len && self.words[index / 64] & (1u64 << (index % 64)) != 0
    }

    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Popcount of `self ∧ other` without allocating
    pub fn intersection_count(&self, other: &PlayerMask) -> usize {
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a & b).count_ones() as usize)
            .sum()
    }

    pub fn intersect(&self, other: &PlayerMask) -> PlayerMask {
        PlayerMask {
            words: self
                .words
                .iter()
                .zip(&other.words)
                .map(|(a, b)| a & b)
                .collect(),
            len: self.len.min(other.len),
        }
    }

    /// Snapshot indices of set bits, ascending
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(w, &word)| {
            let mut bits = word;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let bit = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                Some(w * 64 + bit)
            })
        })
    }

    /// Number of players the mask is defined over
    pub fn universe(&self) -> usize {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Flag;
    use crate::player::Player;

    fn snapshot(n: usize) -> PlayerSnapshot {
        PlayerSnapshot::new(
            (0..n)
                .map(|i| Player {
                    is_all_star: i % 2 == 0,
                    is_champion: i % 3 == 0,
                    ..Player::new(i as u64, format!("P {}", i))
                })
                .collect(),
        )
    }

    #[test]
    fn test_counts_across_word_boundary() {
        let snapshot = snapshot(130);
        let stars = PlayerMask::from_filter(&Filter::Flag(Flag::AllStar), &snapshot);
        let champs = PlayerMask::from_filter(&Filter::Flag(Flag::NbaChampion), &snapshot);
        assert_eq!(stars.count(), 65);
        assert_eq!(champs.count(), 44);
        // multiples of 6 below 130
        assert_eq!(stars.intersection_count(&champs), 22);
        assert_eq!(stars.intersect(&champs).count(), 22);
    }

    #[test]
    fn test_indices() {
        let snapshot = snapshot(70);
        let champs = PlayerMask::from_filter(&Filter::Flag(Flag::NbaChampion), &snapshot);
        let indices: Vec<usize> = champs.indices().collect();
        assert_eq!(indices.first(), Some(&0));
        assert_eq!(indices.last(), Some(&69));
        assert!(indices.iter().all(|i| i % 3 == 0));
        assert!(champs.contains(66));
        assert!(!champs.contains(67));
        assert!(!champs.contains(500));
    }

    #[test]
    fn test_empty_snapshot() {
        let mask = PlayerMask::from_filter(&Filter::Flag(Flag::AllStar), &snapshot(0));
        assert_eq!(mask.count(), 0);
        assert_eq!(mask.indices().count(), 0);
    }
}
