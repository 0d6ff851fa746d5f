/// Property-based tests for bracket structure and pairing using proptest
///
/// These check the structural guarantees of every generator across random team counts
/// and random match outcomes.
use bracket_engine::logic::{round_robin, single_elimination, swiss};
use bracket_engine::{
    next_matches, validate_bracket, BestOf, Bracket, MatchId, MatchResult, MatchStatus, Team,
    TeamId,
};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

fn seeded_teams(n: u64) -> Vec<Team> {
    (1..=n)
        .map(|i| Team::seeded(i, format!("Team {i}"), i as u32))
        .collect()
}

// Full bracket sizes where seeds 1 and 2 must be kept apart until the final
fn full_bracket_size() -> impl Strategy<Value = u64> {
    prop_oneof![Just(4u64), Just(8), Just(16), Just(32)]
}

// Pick a winner for each pending match from a stream of coin flips
fn pick_winners(bracket: &Bracket, flips: &[bool], offset: &mut usize) -> Vec<(MatchId, TeamId)> {
    next_matches(bracket)
        .iter()
        .map(|m| {
            let flip = flips[*offset % flips.len()];
            *offset += 1;
            let winner = if flip { m.slot1 } else { m.slot2 };
            (m.id, winner.unwrap())
        })
        .collect()
}

proptest! {
    #[test]
    fn test_single_elimination_shape(n in 2u64..=40) {
        let bracket = single_elimination::generate(&seeded_teams(n), BestOf::Bo1).unwrap();
        let b = (n as usize).next_power_of_two();
        prop_assert_eq!(bracket.matches.len(), b - 1);
        prop_assert_eq!(bracket.matches_in_round(1).count(), b / 2);
        prop_assert!(validate_bracket(&bracket).is_empty());
    }

    #[test]
    fn test_top_seeds_only_meet_in_final(
        size in full_bracket_size(),
        flips in prop::collection::vec(any::<bool>(), 1..64),
    ) {
        let mut bracket = single_elimination::generate(&seeded_teams(size), BestOf::Bo1).unwrap();
        let mut offset = 0;
        loop {
            let playable = pick_winners(&bracket, &flips, &mut offset);
            if playable.is_empty() {
                break;
            }
            for (id, winner) in playable {
                single_elimination::apply_result(&mut bracket, &MatchResult::win(id, winner)).unwrap();
            }
        }
        for m in &bracket.matches {
            if m.involves(1) && m.involves(2) {
                prop_assert_eq!(m.round, bracket.total_rounds);
            }
        }
        prop_assert!(single_elimination::champion(&bracket).is_some());
    }

    #[test]
    fn test_round_robin_pairs_each_team_once_per_leg(n in 3u64..=12, double_leg in any::<bool>()) {
        let bracket = round_robin::generate(&seeded_teams(n), BestOf::Bo1, double_leg).unwrap();
        let legs = if double_leg { 2 } else { 1 };
        let n = n as usize;
        prop_assert_eq!(bracket.matches.len(), legs * n * (n - 1) / 2);

        let mut pairs: HashMap<(TeamId, TeamId), usize> = HashMap::new();
        for m in &bracket.matches {
            let (a, b) = (m.slot1.unwrap(), m.slot2.unwrap());
            *pairs.entry((a.min(b), a.max(b))).or_default() += 1;
        }
        prop_assert_eq!(pairs.len(), n * (n - 1) / 2);
        prop_assert!(pairs.values().all(|&count| count == legs));

        for round in 1..=bracket.total_rounds {
            let mut busy = HashSet::new();
            for team in bracket.matches_in_round(round).flat_map(|m| m.teams()) {
                prop_assert!(busy.insert(team), "team {} twice in round {}", team, round);
            }
        }
    }

    #[test]
    fn test_swiss_avoids_rematches_when_possible(
        n in prop_oneof![Just(4u64), Just(6), Just(8)],
        outcomes in prop::collection::vec(0u8..3, 1..64),
    ) {
        // n/2 rounds always leave a rematch-free pairing available for an even field.
        let rounds = n as u32 / 2;
        let mut bracket = swiss::generate(&seeded_teams(n), Some(rounds), BestOf::Bo1).unwrap();
        let mut offset = 0;
        loop {
            let playable: Vec<MatchId> = next_matches(&bracket).iter().map(|m| m.id).collect();
            for id in playable {
                let m = bracket.get_match(id).unwrap();
                let (a, b) = (m.slot1.unwrap(), m.slot2.unwrap());
                let result = match outcomes[offset % outcomes.len()] {
                    0 => MatchResult::win(id, a),
                    1 => MatchResult::win(id, b),
                    _ => MatchResult::draw(id, a),
                };
                offset += 1;
                swiss::apply_result(&mut bracket, &result).unwrap();
            }
            if swiss::is_complete(&bracket) {
                break;
            }

            let history = bracket.pairings.clone();
            let round = swiss::generate_next_round(&mut bracket).unwrap();
            prop_assert_eq!(round.rematches, 0);
            let mut busy = HashSet::new();
            for id in &round.matches {
                let m = bracket.get_match(*id).unwrap();
                let (a, b) = (m.slot1.unwrap(), m.slot2.unwrap());
                prop_assert!(!history.contains(a, b), "rematch {} vs {}", a, b);
                prop_assert!(busy.insert(a) && busy.insert(b));
            }
        }
        prop_assert_eq!(bracket.current_round, rounds);
        prop_assert!(bracket.matches.iter().all(|m| m.status == MatchStatus::Completed));
    }
}
