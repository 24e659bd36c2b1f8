// Round scoring.
//
// Pure arithmetic over one graded round: no I/O, no clock, no player table.
// The round machine collects one `Submission` per eligible player and gets
// back the points each earned, in the same order.
//
// Points are correctness plus speed:
// - Correctness: an accepted answer earns 10 points when its case-folded
//   text is unique among this round's accepted submissions, 5 when two or
//   more players gave the same answer.
// - Speed: awarded only on top of correctness. The time limit T divides into
//   ten buckets of T/10 seconds; answering with more than nine tenths of the
//   time remaining earns 10, down to 1 for the last tenth. Remaining time
//   exactly on a bucket edge falls into the slower bucket.
//
// Elapsed times are clamped to [0, T]; a missing elapsed counts as T, which
// yields a speed bonus of 0.

use std::collections::BTreeMap;
use std::time::Duration;

/// One eligible player's input to the grader.
pub struct Submission<'a> {
    /// The submitted answer, `None` if the player never answered.
    pub answer: Option<&'a str>,
    /// Time from round start to the answer.
    pub elapsed: Option<Duration>,
}

/// Float guard for bucket edges: remaining time exactly on an edge lands in
/// the slower bucket.
const BUCKET_EPSILON: f64 = 1e-6;

/// Score one round. `accepted` is the round's accepted-answer set; the
/// returned points are aligned with `submissions`.
pub fn score_round(
    accepted: &[String],
    time_limit: Duration,
    submissions: &[Submission<'_>],
) -> Vec<u32> {
    // Group accepted submissions by case-folded text to find shared answers.
    let mut group_sizes: BTreeMap<String, u32> = BTreeMap::new();
    for sub in submissions {
        if let Some(answer) = sub.answer {
            if is_accepted(accepted, answer) {
                *group_sizes.entry(answer.to_ascii_lowercase()).or_insert(0) += 1;
            }
        }
    }

    let t = time_limit.as_secs_f64();
    submissions
        .iter()
        .map(|sub| {
            let Some(answer) = sub.answer else { return 0 };
            if !is_accepted(accepted, answer) {
                return 0;
            }
            let shared = group_sizes
                .get(&answer.to_ascii_lowercase())
                .copied()
                .unwrap_or(0)
                > 1;
            let correctness = if shared { 5 } else { 10 };
            correctness + speed_bonus(t, sub.elapsed)
        })
        .collect()
}

/// Whether `answer` matches any accepted answer, ASCII case-insensitive.
fn is_accepted(accepted: &[String], answer: &str) -> bool {
    accepted.iter().any(|a| a.eq_ignore_ascii_case(answer))
}

/// Speed points for a credited answer: 10 for the earliest tenth of the time
/// limit down to 1 for the last, 0 once no time remained.
fn speed_bonus(time_limit: f64, elapsed: Option<Duration>) -> u32 {
    let elapsed = elapsed.map_or(time_limit, |e| e.as_secs_f64());
    let elapsed = elapsed.clamp(0.0, time_limit);
    let delta = time_limit / 10.0;
    let remaining = time_limit - elapsed;
    for i in 0..10u32 {
        let cutoff = time_limit - f64::from(i) * delta;
        if remaining >= cutoff - delta + BUCKET_EPSILON {
            return 10 - i;
        }
    }
    0
}
