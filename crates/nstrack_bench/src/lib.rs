//! Benchmark utilities.

#![warn(missing_docs)]

use nstrack_core::{Observation, Segment, StarHistory, StarId, TypeCode};
use nstrack_testkit::RunFixture;
use rand::Rng;

/// Builds `segments` restarted segments of `stars` neutron stars each.
///
/// Segment `k` covers `[k * span, (k + 2) * span)`, so every segment
/// overlaps half of the previous one, like a checkpoint restart.
pub fn restarted_segments(segments: usize, stars: usize, snapshots: usize) -> Vec<Segment> {
    let mut rng = rand::thread_rng();
    let span = snapshots as f64;
    (0..segments)
        .map(|k| {
            let start = k as f64 * span;
            let histories = (0..stars)
                .map(|id| {
                    let observations = (0..snapshots * 2)
                        .map(|step| {
                            Observation::single(start + step as f64, TypeCode::NEUTRON_STAR)
                                .with_attribute("mass", rng.gen_range(1.1..2.0))
                        })
                        .collect();
                    let history = StarHistory::from_observations(StarId::new(id as i64), observations);
                    if rng.gen_bool(0.05) {
                        history.with_escape(start + rng.gen_range(0.0..span * 2.0))
                    } else {
                        history
                    }
                })
                .collect();
            Segment::new(format!("save{:02}", k + 1), Some(start), histories)
        })
        .collect()
}

/// Writes a run of `segments` segments with `stars` rows per snapshot.
///
/// About a third of the stars are neutron stars.
pub fn write_run(segments: usize, stars: usize, snapshots: usize) -> RunFixture {
    let mut rng = rand::thread_rng();
    let run = RunFixture::new("bench");
    for k in 0..segments {
        let segment = run.segment(&format!("save{:02}", k + 1));
        for step in 0..snapshots * 2 {
            let time = (k * snapshots + step) as f64;
            let rows: Vec<(i64, i32)> = (0..stars)
                .map(|id| {
                    let code = if rng.gen_ratio(1, 3) { 13 } else { 1 };
                    (id as i64, code)
                })
                .collect();
            segment.singles(time, &rows);
        }
    }
    run
}
