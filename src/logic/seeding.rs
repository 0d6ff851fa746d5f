//! Seeding helpers shared by every generator. Pure functions, no state.

use crate::models::{BracketError, Team};
use rand::seq::SliceRandom;
use std::collections::HashSet;

/// Smallest power of two >= `n` (1 for 0 or 1).
pub fn next_power_of_two(n: u32) -> u32 {
    n.max(1).next_power_of_two()
}

/// Seed order of the first-round slots of a bracket of `bracket_size` (a power of two).
///
/// Built by repeatedly splitting every seed `s` of the smaller bracket into `s` and
/// `size + 1 - s`, flipping the orientation on every other pair, so the two best remaining
/// seeds always sit in opposite halves of any sub-bracket.
pub fn bracket_order(bracket_size: u32) -> Vec<u32> {
    let mut order = vec![1];
    let mut size = 1;
    while size < bracket_size {
        size *= 2;
        order = order
            .iter()
            .enumerate()
            .flat_map(|(i, &s)| {
                let other = size + 1 - s;
                if i % 2 == 0 {
                    [s, other]
                } else {
                    [other, s]
                }
            })
            .collect();
    }
    order
}

/// First-round seed pairs, better seed first, in bracket position order.
///
/// For 8: `(1,8), (4,5), (3,6), (2,7)`. Seeds 1 and 2 can only meet in the final.
pub fn classic_seed_pairs(bracket_size: u32) -> Vec<(u32, u32)> {
    bracket_order(bracket_size)
        .chunks_exact(2)
        .map(|pair| (pair[0].min(pair[1]), pair[0].max(pair[1])))
        .collect()
}

/// Deal teams (already in seed order) into `group_count` groups, alternating forward and
/// backward passes: with 4 groups, seeds 1-4 go to A-D and seeds 5-8 to D-A.
pub fn snake_distribute(teams: &[Team], group_count: usize) -> Vec<Vec<Team>> {
    let mut groups = vec![Vec::new(); group_count];
    if group_count == 0 {
        return groups;
    }
    for (i, team) in teams.iter().enumerate() {
        let pass = i / group_count;
        let offset = i % group_count;
        let group = if pass % 2 == 0 {
            offset
        } else {
            group_count - 1 - offset
        };
        groups[group].push(team.clone());
    }
    groups
}

/// Validate a roster and put it in seeding order.
///
/// Seeded teams come first by ascending seed (ties keep input order); unseeded teams follow
/// in random order.
pub fn seeded_roster(teams: &[Team], required: usize) -> Result<Vec<Team>, BracketError> {
    if teams.len() < required {
        return Err(BracketError::InsufficientTeams {
            required,
            actual: teams.len(),
        });
    }
    let mut seen = HashSet::new();
    for team in teams {
        if !seen.insert(team.id) {
            return Err(BracketError::DuplicateTeam(team.id));
        }
    }

    let mut seeded: Vec<Team> = teams.iter().filter(|t| t.seed.is_some()).cloned().collect();
    seeded.sort_by_key(|t| t.seed);
    let mut unseeded: Vec<Team> = teams.iter().filter(|t| t.seed.is_none()).cloned().collect();
    unseeded.shuffle(&mut rand::thread_rng());
    seeded.append(&mut unseeded);
    Ok(seeded)
}

/// `ceil(log2(n))`, with 0 for n <= 1.
pub fn ceil_log2(n: u32) -> u32 {
    next_power_of_two(n).trailing_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_of_two_rounding() {
        assert_eq!(next_power_of_two(0), 1);
        assert_eq!(next_power_of_two(2), 2);
        assert_eq!(next_power_of_two(5), 8);
        assert_eq!(next_power_of_two(16), 16);
        assert_eq!(next_power_of_two(17), 32);
        assert_eq!(ceil_log2(8), 3);
        assert_eq!(ceil_log2(9), 4);
    }

    #[test]
    fn eight_team_pairs() {
        assert_eq!(classic_seed_pairs(8), vec![(1, 8), (4, 5), (3, 6), (2, 7)]);
        assert_eq!(classic_seed_pairs(4), vec![(1, 4), (2, 3)]);
        assert_eq!(classic_seed_pairs(2), vec![(1, 2)]);
    }

    #[test]
    fn pairs_cover_every_seed_once() {
        for size in [2u32, 4, 8, 16, 32, 64] {
            let mut seeds: Vec<u32> = classic_seed_pairs(size)
                .into_iter()
                .flat_map(|(a, b)| [a, b])
                .collect();
            seeds.sort_unstable();
            assert_eq!(seeds, (1..=size).collect::<Vec<_>>());
            for (a, b) in classic_seed_pairs(size) {
                assert_eq!(a + b, size + 1);
            }
        }
    }

    #[test]
    fn snake_balances_groups() {
        let teams: Vec<Team> = (1..=8).map(|i| Team::seeded(i, format!("T{i}"), i as u32)).collect();
        let groups = snake_distribute(&teams, 4);
        let ids: Vec<Vec<u64>> = groups
            .iter()
            .map(|g| g.iter().map(|t| t.id).collect())
            .collect();
        assert_eq!(ids, vec![vec![1, 8], vec![2, 7], vec![3, 6], vec![4, 5]]);
    }

    #[test]
    fn roster_orders_seeded_before_unseeded() {
        let teams = vec![
            Team::new(10, "Unseeded"),
            Team::seeded(2, "Second", 2),
            Team::seeded(1, "First", 1),
        ];
        let ordered = seeded_roster(&teams, 2).unwrap();
        let ids: Vec<u64> = ordered.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 10]);
    }

    #[test]
    fn roster_rejects_duplicates_and_short_lists() {
        let teams = vec![Team::seeded(1, "A", 1), Team::seeded(1, "B", 2)];
        assert_eq!(seeded_roster(&teams, 2), Err(BracketError::DuplicateTeam(1)));
        assert_eq!(
            seeded_roster(&teams[..1], 2),
            Err(BracketError::InsufficientTeams {
                required: 2,
                actual: 1
            })
        );
    }
}
