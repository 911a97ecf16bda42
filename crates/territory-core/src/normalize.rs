//! Integer percentages for display via the largest-remainder method.

use crate::team::{Scores, Team, TeamMap};

/// Whole-number split summing to exactly 100.
pub type Percentages = TeamMap<u32>;

/// Round `scores` to whole percentages that sum to 100.
///
/// Every value is floored, then the missing points go one each to the teams
/// with the largest fractional remainders. Ties keep canonical team order.
pub fn normalize(scores: &Scores) -> Percentages {
    let mut parts: Vec<(Team, i64, f64)> = scores
        .iter()
        .map(|(t, &v)| {
            let v = if v.is_finite() { v.clamp(0.0, 100.0) } else { 0.0 };
            let floor = v.floor();
            (t, floor as i64, v - floor)
        })
        .collect();
    let sum: i64 = parts.iter().map(|p| p.1).sum();
    let mut deficit = 100 - sum;

    // Stable sort keeps canonical order among equal remainders.
    parts.sort_by(|a, b| b.2.total_cmp(&a.2));

    let n = parts.len();
    let mut i = 0;
    while deficit > 0 {
        parts[i % n].1 += 1;
        deficit -= 1;
        i += 1;
    }
    // Only reachable for inputs that already overshoot 100.
    let mut j = n;
    while deficit < 0 && parts.iter().any(|p| p.1 > 0) {
        j = if j == 0 { n - 1 } else { j - 1 };
        if parts[j].1 > 0 {
            parts[j].1 -= 1;
            deficit += 1;
        }
    }

    let mut out = Percentages::default();
    for (t, v, _) in parts {
        out[t] = u32::try_from(v).unwrap_or(0);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn total(p: &Percentages) -> u32 {
        p.iter().map(|(_, v)| *v).sum()
    }

    #[test]
    fn thirds_round_toward_earlier_teams() {
        let s = Scores {
            red: 50.0,
            green: 50.0 / 3.0,
            blue: 50.0 / 3.0,
            yellow: 50.0 / 3.0,
        };
        let p = normalize(&s);
        assert_eq!(p.red, 50);
        assert_eq!((p.green, p.blue, p.yellow), (17, 17, 16));
        assert_eq!(total(&p), 100);
    }

    #[test]
    fn largest_remainder_wins() {
        let s = Scores {
            red: 10.2,
            green: 30.7,
            blue: 29.6,
            yellow: 29.5,
        };
        let p = normalize(&s);
        assert_eq!(p, TeamMap { red: 10, green: 31, blue: 30, yellow: 29 });
    }

    #[test]
    fn integers_pass_through() {
        let s = Scores {
            red: 0.0,
            green: 70.0,
            blue: 5.0,
            yellow: 25.0,
        };
        let p = normalize(&s);
        assert_eq!(p, TeamMap { red: 0, green: 70, blue: 5, yellow: 25 });
    }

    #[test]
    fn garbage_in_still_sums_to_100() {
        let s = Scores {
            red: f64::NAN,
            green: 0.0,
            blue: 0.0,
            yellow: 0.0,
        };
        assert_eq!(total(&normalize(&s)), 100);
        let s = Scores {
            red: 90.0,
            green: 90.0,
            blue: 0.0,
            yellow: 0.0,
        };
        assert_eq!(total(&normalize(&s)), 100);
    }

    proptest! {
        #![proptest_config(ProptestConfig { max_global_rejects: 100_000, ..ProptestConfig::default() })]

        #[test]
        fn always_sums_to_100(a in 0.0f64..1.0, b in 0.0f64..1.0, c in 0.0f64..1.0, d in 0.0f64..1.0) {
            prop_assume!(a + b + c + d > 1e-3);
            let t = a + b + c + d;
            let s = Scores { red: a / t * 100.0, green: b / t * 100.0, blue: c / t * 100.0, yellow: d / t * 100.0 };
            let p = normalize(&s);
            prop_assert_eq!(total(&p), 100);
            for team in Team::ALL {
                prop_assert!((p[team] as f64 - s[team]).abs() < 1.0 + 1e-9);
            }
        }

        #[test]
        fn integer_input_is_identity(a in 0u32..=100, b in 0u32..=100, c in 0u32..=100) {
            prop_assume!(a + b + c <= 100);
            let d = 100 - a - b - c;
            let s = Scores { red: a as f64, green: b as f64, blue: c as f64, yellow: d as f64 };
            prop_assert_eq!(normalize(&s), TeamMap { red: a, green: b, blue: c, yellow: d });
        }
    }
}
