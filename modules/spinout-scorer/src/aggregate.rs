use std::cmp::Ordering;
use std::collections::BTreeMap;

use spinout_common::{Criterion, CriterionScore};

/// Weighted startup-potential score on a 0.0-10.0 scale, one decimal.
///
/// Each present criterion contributes `score * weight`; absent criteria
/// contribute nothing. Scores are clamped to 0-100 first (NaN counts as 0) so
/// the range holds for anything the model returns. Terms are summed in
/// criterion order with fractional weights and the 0-10 value is rounded to
/// one decimal against its exact binary value, so a score that lands just
/// under a half (69.5 summing to 6.9499...) rounds down.
pub fn aggregate(scores: &BTreeMap<Criterion, CriterionScore>) -> f64 {
    let weighted: f64 = Criterion::ALL
        .iter()
        .filter_map(|criterion| {
            scores
                .get(criterion)
                .map(|s| clamp_score(s.score) * criterion.weight())
        })
        .sum();
    round_one_decimal(weighted / 100.0 * 10.0)
}

/// Round to the nearest tenth, ties to even, deciding on the exact value of
/// `x` rather than on `x * 10`, which can itself round onto a tie.
fn round_one_decimal(x: f64) -> f64 {
    if x == 0.0 || !x.is_finite() {
        return x;
    }
    let magnitude = x.abs();
    let (mantissa, exponent) = decompose(magnitude);

    let rounded = if exponent >= 0 {
        // Already an integer.
        magnitude
    } else if exponent < -100 {
        0.0
    } else {
        let lower = (magnitude * 10.0).floor();
        // Compare 20x with 2*lower + 1, i.e. x with the midpoint (lower + 0.5) / 10.
        let twice_mid = (2.0 * lower + 1.0) as i128;
        let lhs = 20 * i128::from(mantissa);
        let rhs = twice_mid << (-exponent);
        let tenths = match lhs.cmp(&rhs) {
            Ordering::Less => lower,
            Ordering::Greater => lower + 1.0,
            Ordering::Equal if lower % 2.0 == 0.0 => lower,
            Ordering::Equal => lower + 1.0,
        };
        tenths / 10.0
    };
    rounded.copysign(x)
}

/// Split a positive finite float into `mantissa * 2^exponent`.
fn decompose(x: f64) -> (u64, i32) {
    let bits = x.to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);
    if biased == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased - 1075)
    }
}

fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 100.0)
    }
}
