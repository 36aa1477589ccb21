use assert_float_eq::*;

use super::*;
use crate::domain::MatchRecord;
use crate::expand::expand;
use crate::testing::{alpha_season, day, round_robin, window};

fn alpha_snapshots(matches: &[MatchRecord], len: usize) -> Vec<Option<RollingSnapshot>> {
    let observations = expand(matches);
    let snapshots = annotate(&observations, window(len));
    observations
        .iter()
        .zip(snapshots)
        .filter(|(observation, _)| observation.team == "Alpha")
        .map(|(_, snapshot)| snapshot)
        .collect()
}

#[test]
fn first_observation_is_undefined() {
    let snapshots = alpha_snapshots(&alpha_season(), 3);
    assert_eq!(6, snapshots.len());
    assert_eq!(None, snapshots[0]);
    assert!(snapshots[1..].iter().all(Option::is_some));
}

#[test]
fn single_prior_match() {
    let snapshots = alpha_snapshots(&alpha_season(), 3);
    let snapshot = snapshots[1].as_ref().unwrap();
    assert_eq!(
        &RollingSnapshot {
            window_len: 1,
            goals_for_avg: 2.0,
            goals_against_avg: 0.0,
            goal_diff_avg: 2.0,
            win_rate: 1.0,
            points_avg: 3.0,
            momentum: 3.0,
            clean_sheet_rate: 1.0,
            conceded_avg: 0.0,
            weighted_points: 3.0,
        },
        snapshot
    );
}

#[test]
fn before_fifth_match() {
    // window holds L (1-3), D (1-1), W (2-0)
    let snapshots = alpha_snapshots(&alpha_season(), 3);
    let snapshot = snapshots[4].as_ref().unwrap();
    assert_eq!(3, snapshot.window_len);
    assert_float_absolute_eq!(4.0 / 3.0, snapshot.goals_for_avg);
    assert_float_absolute_eq!(4.0 / 3.0, snapshot.goals_against_avg);
    assert_float_absolute_eq!(0.0, snapshot.goal_diff_avg);
    assert_float_absolute_eq!(1.0 / 3.0, snapshot.win_rate);
    assert_float_absolute_eq!(4.0 / 3.0, snapshot.points_avg);
    assert_float_absolute_eq!(4.0, snapshot.momentum);
    assert_float_absolute_eq!(1.0 / 3.0, snapshot.clean_sheet_rate);
    assert_float_absolute_eq!(11.0 / 6.0, snapshot.weighted_points);
}

#[test]
fn before_sixth_match() {
    // window holds D (1-1), W (2-0), L (0-1)
    let snapshots = alpha_snapshots(&alpha_season(), 3);
    let snapshot = snapshots[5].as_ref().unwrap();
    assert_eq!(3, snapshot.window_len);
    assert_float_absolute_eq!(1.0, snapshot.goals_for_avg);
    assert_float_absolute_eq!(2.0 / 3.0, snapshot.goals_against_avg);
    assert_float_absolute_eq!(1.0 / 3.0, snapshot.goal_diff_avg);
    assert_float_absolute_eq!(1.0 / 3.0, snapshot.win_rate);
    assert_float_absolute_eq!(4.0 / 3.0, snapshot.points_avg);
    assert_float_absolute_eq!(4.0, snapshot.momentum);
    assert_float_absolute_eq!(1.0 / 3.0, snapshot.clean_sheet_rate);
    assert_float_absolute_eq!(2.0 / 3.0, snapshot.conceded_avg);
    assert_float_absolute_eq!(7.0 / 6.0, snapshot.weighted_points);
}

#[test]
fn window_len_is_bounded() {
    for len in 1..=7 {
        let snapshots = alpha_snapshots(&alpha_season(), len);
        for (position, snapshot) in snapshots.iter().enumerate() {
            let window_len = snapshot.as_ref().map(|snapshot| snapshot.window_len).unwrap_or(0);
            assert_eq!(usize::min(position, len), window_len, "window {len}, position {position}");
        }
    }
}

#[test]
fn current_result_never_leaks() {
    let matches = round_robin();
    let observations = expand(&matches);
    let baseline = annotate(&observations, window(4));
    for match_index in 0..matches.len() {
        let mut altered = matches.clone();
        altered[match_index].home_goals = 9;
        altered[match_index].away_goals = 7;
        let altered_observations = expand(&altered);
        let altered_snapshots = annotate(&altered_observations, window(4));
        for (index, observation) in altered_observations.iter().enumerate() {
            if observation.match_index <= match_index {
                assert_eq!(
                    baseline[index], altered_snapshots[index],
                    "match {match_index} leaked into observation {index}"
                );
            }
        }
    }
}

#[test]
fn later_matches_see_the_change() {
    let mut matches = alpha_season();
    let baseline = alpha_snapshots(&matches, 3);
    matches[3].away_goals = 0;
    let altered = alpha_snapshots(&matches, 3);
    assert_eq!(baseline[..=3], altered[..=3]);
    assert_ne!(baseline[4], altered[4]);
}

#[test]
fn same_date_matches_keep_ingestion_order() {
    let matches = vec![
        MatchRecord::finished(day(1), "Alpha", "Beta", 3, 0),
        MatchRecord::finished(day(1), "Gamma", "Alpha", 0, 0),
        MatchRecord::finished(day(2), "Alpha", "Delta", 0, 1),
    ];
    let snapshots = alpha_snapshots(&matches, 2);
    assert_eq!(None, snapshots[0]);
    assert_float_absolute_eq!(3.0, snapshots[1].as_ref().unwrap().weighted_points);
    // oldest (W) weighs 1, newer (D) weighs 2
    assert_float_absolute_eq!(5.0 / 3.0, snapshots[2].as_ref().unwrap().weighted_points);

    let mut swapped = matches.clone();
    swapped.swap(0, 1);
    let snapshots = alpha_snapshots(&swapped, 2);
    assert_float_absolute_eq!(1.0, snapshots[1].as_ref().unwrap().weighted_points);
    assert_float_absolute_eq!(7.0 / 3.0, snapshots[2].as_ref().unwrap().weighted_points);
}

#[test]
fn timelines_are_chronological() {
    let mut matches = alpha_season();
    matches.reverse();
    let observations = expand(&matches);
    let timelines = timelines(&observations);
    assert_eq!(4, timelines.len());
    let alpha = &timelines["Alpha"];
    assert_eq!(6, alpha.len());
    for pair in alpha.windows(2) {
        assert!(observations[pair[0]].date < observations[pair[1]].date);
    }
}

#[test]
fn empty_observations() {
    assert!(annotate(&[], window(5)).is_empty());
    assert_eq!(None, RollingSnapshot::summarise(&[]));
}
