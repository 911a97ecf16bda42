//! Time-based score drain for held bases.
//!
//! A holder gains points at a fixed rate per second of wall time; the same
//! amount is taken from the other teams by water-filling so no team ever
//! drops below zero and the split keeps summing to 100.

use crate::model::Base;
use crate::team::{Scores, Team};

/// Points per second a holder drains from the other teams.
pub const DRAIN_RATE_PER_SEC: f64 = 10.0;

/// Scores at or below this are treated as exhausted.
const EXHAUSTED_EPS: f64 = 1e-3;

/// Loss left undistributed below this is considered fully inflicted.
const SETTLED_EPS: f64 = 1e-4;

/// Drain model parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoreEngine {
    /// Points per second moved to the holder.
    pub drain_rate_per_sec: f64,
}

impl Default for ScoreEngine {
    fn default() -> Self {
        Self {
            drain_rate_per_sec: DRAIN_RATE_PER_SEC,
        }
    }
}

impl ScoreEngine {
    /// Engine with a custom drain rate.
    pub fn with_rate(drain_rate_per_sec: f64) -> Self {
        Self { drain_rate_per_sec }
    }

    /// Score split of `base` as of `now` (epoch ms), folding in drain since
    /// its last interaction.
    ///
    /// Unheld and captured bases, as well as non-positive elapsed time,
    /// return the stored split unchanged.
    pub fn settle(&self, base: &Base, now: i64) -> Scores {
        let Some(holder) = base.held_by else {
            return base.scores;
        };
        if !base.owner.is_neutral() {
            return base.scores;
        }
        let elapsed_ms = now.saturating_sub(base.last_interaction);
        if elapsed_ms <= 0 {
            return base.scores;
        }
        let desired = elapsed_ms as f64 / 1000.0 * self.drain_rate_per_sec;
        drain(&base.scores, holder, desired)
    }
}

/// Settle with the default drain rate.
pub fn settle(base: &Base, now: i64) -> Scores {
    ScoreEngine::default().settle(base, now)
}

/// Move up to `desired` points from the non-holders to `holder`.
///
/// The holder receives exactly what was taken, never the theoretical gain,
/// so the total is preserved even when several teams clamp at zero.
pub fn drain(scores: &Scores, holder: Team, desired: f64) -> Scores {
    let mut next = *scores;
    if !desired.is_finite() || desired <= 0.0 {
        return next;
    }
    let others: Vec<Team> = Team::ALL.into_iter().filter(|t| *t != holder).collect();
    let capacity: f64 = others.iter().map(|t| next[*t].max(0.0)).sum();
    let gain = desired.min(100.0 - next[holder]).min(capacity);
    if gain <= 0.0 {
        return next;
    }

    let mut remaining = gain;
    for _ in 0..others.len() {
        let losers: Vec<Team> = others
            .iter()
            .copied()
            .filter(|t| next[*t] > EXHAUSTED_EPS)
            .collect();
        if losers.is_empty() {
            break;
        }
        let share = remaining / losers.len() as f64;
        let mut consumed = 0.0;
        for t in losers {
            if next[t] >= share {
                next[t] -= share;
                consumed += share;
            } else {
                consumed += next[t];
                next[t] = 0.0;
            }
        }
        remaining -= consumed;
        if remaining < SETTLED_EPS {
            break;
        }
    }

    next[holder] += gain - remaining;
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::team::{Owner, TeamMap};
    use proptest::prelude::*;

    const TOL: f64 = 1e-6;

    fn held(scores: Scores, holder: Team) -> Base {
        Base {
            id: "base_1".into(),
            owner: Owner::Neutral,
            held_by: Some(holder),
            last_interaction: 1_000,
            scores,
        }
    }

    fn split(red: f64, green: f64, blue: f64, yellow: f64) -> Scores {
        TeamMap {
            red,
            green,
            blue,
            yellow,
        }
    }

    #[test]
    fn equal_drain_over_two_and_a_half_seconds() {
        let b = held(Scores::equal_split(), Team::Red);
        let s = settle(&b, 1_000 + 2_500);
        assert!((s.red - 50.0).abs() < TOL);
        for t in [Team::Green, Team::Blue, Team::Yellow] {
            assert!((s[t] - 50.0 / 3.0).abs() < TOL, "{t}: {}", s[t]);
        }
        assert!((s.total() - 100.0).abs() < TOL);
    }

    #[test]
    fn saturating_drain_empties_small_teams_first() {
        let b = held(split(25.0, 5.0, 5.0, 65.0), Team::Red);
        // 3s -> 30 points: 5 + 5 from green/blue, 20 from yellow.
        let s = settle(&b, 1_000 + 3_000);
        assert!((s.red - 55.0).abs() < TOL);
        assert_eq!(s.green, 0.0);
        assert_eq!(s.blue, 0.0);
        assert!((s.yellow - 45.0).abs() < TOL);

        // Long enough to exhaust everyone: capped at 100 - red.
        let s = settle(&b, 1_000 + 60_000);
        assert!((s.red - 100.0).abs() < TOL);
        for t in [Team::Green, Team::Blue, Team::Yellow] {
            assert!(s[t].abs() < TOL);
        }
        assert!((s.total() - 100.0).abs() < TOL);
    }

    #[test]
    fn unheld_captured_and_skewed_bases_are_unchanged() {
        let mut b = held(split(40.0, 20.0, 20.0, 20.0), Team::Green);
        b.held_by = None;
        assert_eq!(settle(&b, 50_000), b.scores);

        let mut b = held(split(40.0, 20.0, 20.0, 20.0), Team::Green);
        b.owner = Owner::Team(Team::Red);
        assert_eq!(settle(&b, 50_000), b.scores);

        let b = held(split(40.0, 20.0, 20.0, 20.0), Team::Green);
        assert_eq!(settle(&b, 1_000), b.scores);
        assert_eq!(settle(&b, 0), b.scores);
    }

    #[test]
    fn holder_at_full_gains_nothing() {
        let b = held(split(0.0, 0.0, 100.0, 0.0), Team::Blue);
        assert_eq!(settle(&b, 99_000), b.scores);
    }

    #[test]
    fn custom_rate_scales_gain() {
        let b = held(Scores::equal_split(), Team::Yellow);
        let s = ScoreEngine::with_rate(20.0).settle(&b, 1_000 + 1_000);
        assert!((s.yellow - 45.0).abs() < TOL);
    }

    fn distribution() -> impl Strategy<Value = Scores> {
        (0.0f64..1.0, 0.0f64..1.0, 0.0f64..1.0, 0.0f64..1.0)
            .prop_filter("non-zero weight", |(a, b, c, d)| a + b + c + d > 1e-3)
            .prop_map(|(a, b, c, d)| {
                let total = a + b + c + d;
                split(
                    a / total * 100.0,
                    b / total * 100.0,
                    c / total * 100.0,
                    d / total * 100.0,
                )
            })
    }

    fn team() -> impl Strategy<Value = Team> {
        prop::sample::select(Team::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn sum_and_range_hold(scores in distribution(), holder in team(), ms in 0i64..120_000) {
            let s = settle(&held(scores, holder), 1_000 + ms);
            prop_assert!((s.total() - 100.0).abs() <= TOL);
            for (_, v) in s.iter() {
                prop_assert!(*v >= 0.0 && *v <= 100.0 + TOL);
            }
        }

        #[test]
        fn holder_never_loses(scores in distribution(), holder in team(),
                              a in 0i64..60_000, extra in 0i64..60_000) {
            let b = held(scores, holder);
            let early = settle(&b, 1_000 + a);
            let late = settle(&b, 1_000 + a + extra);
            prop_assert!(early[holder] >= scores[holder] - TOL);
            prop_assert!(late[holder] >= early[holder] - TOL);
        }

        #[test]
        fn saturated_split_stops_changing(scores in distribution(), holder in team(),
                                          extra in 1i64..60_000) {
            let b = held(scores, holder);
            let full = settle(&b, 1_000 + 20_000);
            let later = settle(&b, 1_000 + 20_000 + extra);
            for t in Team::ALL {
                prop_assert!((full[t] - later[t]).abs() <= TOL);
            }
        }
    }
}
