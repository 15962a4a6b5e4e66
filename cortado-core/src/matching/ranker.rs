use cortado_model::SpatialPoint;
use tracing::debug;

use crate::config::MatchConfig;
use crate::error::{DispatchError, Result};
use crate::geo;

use super::{Confidence, MatchOutcome, NoMatchReason, RankedTable, TableSnapshot};

/// Rank a pool of tables against a query point and classify the result.
///
/// `uncertainty_m` is the positioning error of the fix; each table's
/// effective radius is the larger of its own seating radius and that
/// uncertainty, so an imprecise fix is never penalized by a physically
/// small target. Equidistant tables order stably by id, keeping
/// repeated queries reproducible regardless of pool order.
pub fn rank(
    query: SpatialPoint,
    uncertainty_m: f64,
    pool: &[TableSnapshot],
    config: &MatchConfig,
) -> Result<MatchOutcome> {
    if pool.is_empty() {
        return Err(DispatchError::EmptyPool);
    }
    if !uncertainty_m.is_finite() || uncertainty_m < 0.0 {
        return Err(DispatchError::InvalidUncertainty(uncertainty_m));
    }

    let eligible: Vec<&TableSnapshot> =
        pool.iter().filter(|t| t.status.is_eligible()).collect();
    if eligible.is_empty() {
        return Ok(MatchOutcome::NoMatch {
            reason: NoMatchReason::NoEligibleTables,
        });
    }

    let mut in_range: Vec<RankedTable> = eligible
        .into_iter()
        .map(|table| {
            let distance_m = geo::distance_m(query, table.position);
            let effective_radius = table.seating_radius_m.max(uncertainty_m);
            RankedTable {
                table: table.clone(),
                distance_m,
                within_effective_radius: distance_m <= effective_radius,
            }
        })
        .filter(|ranked| ranked.within_effective_radius)
        .collect();
    in_range.sort_by(|a, b| {
        a.distance_m
            .total_cmp(&b.distance_m)
            .then_with(|| a.table.id.cmp(&b.table.id))
    });

    if in_range.is_empty() {
        return Ok(MatchOutcome::NoMatch {
            reason: NoMatchReason::OutsideDetectionRange,
        });
    }
    if in_range.len() == 1 {
        let candidate = in_range.remove(0);
        return Ok(MatchOutcome::Matched {
            candidate,
            confidence: Confidence::High,
            alternates: Vec::new(),
        });
    }

    let gap = in_range[1].distance_m - in_range[0].distance_m;
    if gap < config.disambiguation_gap_m {
        // Too close to call: hand back everything within the gap of the
        // best and let the caller ask the customer.
        let best = in_range[0].distance_m;
        let candidates: Vec<RankedTable> = in_range
            .into_iter()
            .filter(|c| c.distance_m - best < config.disambiguation_gap_m)
            .collect();
        debug!(
            candidates = candidates.len(),
            gap_m = gap,
            "ambiguous table match"
        );
        return Ok(MatchOutcome::Ambiguous { candidates });
    }

    let candidate = in_range.remove(0);
    let confidence = confidence_for(candidate.distance_m, config);
    let alternates: Vec<RankedTable> = in_range
        .into_iter()
        .take(config.max_alternates)
        .collect();
    Ok(MatchOutcome::Matched {
        candidate,
        confidence,
        alternates,
    })
}

fn confidence_for(distance_m: f64, config: &MatchConfig) -> Confidence {
    if distance_m <= config.high_band_m {
        Confidence::High
    } else if distance_m <= config.medium_band_m {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::TableStatus;
    use cortado_model::TableId;

    // ~1 m of latitude in degrees.
    const LAT_METER: f64 = 1.0 / 111_320.0;

    fn point(lat: f64, lon: f64) -> SpatialPoint {
        SpatialPoint::new(lat, lon).expect("valid test point")
    }

    fn table(lat: f64, lon: f64, radius_m: f64) -> TableSnapshot {
        TableSnapshot {
            id: TableId::new(),
            position: point(lat, lon),
            seating_radius_m: radius_m,
            status: TableStatus::Open,
        }
    }

    fn config() -> MatchConfig {
        MatchConfig::default()
    }

    #[test]
    fn single_table_in_range_matches_with_high_confidence() {
        // Customer sits at table A; table B is 50 m away, beyond the
        // 30 m effective radius despite the generous uncertainty.
        let a = table(0.0, 0.0, 1.0);
        let b = table(50.0 * LAT_METER, 0.0, 1.0);
        let pool = vec![a.clone(), b];

        let outcome = rank(point(0.0, 0.0), 30.0, &pool, &config()).unwrap();
        match outcome {
            MatchOutcome::Matched {
                candidate,
                confidence,
                alternates,
            } => {
                assert_eq!(candidate.table.id, a.id);
                assert_eq!(confidence, Confidence::High);
                assert!(alternates.is_empty());
            }
            other => panic!("expected Matched, got {other:?}"),
        }
    }

    #[test]
    fn close_pair_within_gap_is_ambiguous() {
        // Tables 5 m and 6 m out; both inside the 30 m effective
        // radius, 1 m apart, below the 3 m disambiguation gap.
        let near = table(5.0 * LAT_METER, 0.0, 1.0);
        let far = table(6.0 * LAT_METER, 0.0, 1.0);
        let pool = vec![far.clone(), near.clone()];

        let outcome = rank(point(0.0, 0.0), 30.0, &pool, &config()).unwrap();
        match outcome {
            MatchOutcome::Ambiguous { candidates } => {
                assert_eq!(candidates.len(), 2);
                assert_eq!(candidates[0].table.id, near.id);
                assert_eq!(candidates[1].table.id, far.id);
            }
            other => panic!("expected Ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn ambiguous_set_excludes_tables_beyond_the_gap() {
        let best = table(5.0 * LAT_METER, 0.0, 1.0);
        let rival = table(6.0 * LAT_METER, 0.0, 1.0);
        let outlier = table(12.0 * LAT_METER, 0.0, 1.0);
        let pool = vec![outlier.clone(), best.clone(), rival.clone()];

        let outcome = rank(point(0.0, 0.0), 30.0, &pool, &config()).unwrap();
        match outcome {
            MatchOutcome::Ambiguous { candidates } => {
                assert_eq!(candidates.len(), 2);
                assert!(candidates.iter().all(|c| c.table.id != outlier.id));
            }
            other => panic!("expected Ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn matched_candidate_is_within_effective_radius() {
        let a = table(8.0 * LAT_METER, 0.0, 1.5);
        let pool = vec![a];
        let uncertainty = 30.0;

        let outcome = rank(point(0.0, 0.0), uncertainty, &pool, &config()).unwrap();
        let matched = outcome.matched_table().expect("should match");
        let effective = matched.table.seating_radius_m.max(uncertainty);
        assert!(matched.distance_m <= effective);
    }

    #[test]
    fn confidence_degrades_with_distance() {
        // Best table 15 m out with a clear 10 m gap to the runner-up:
        // confident, but only medium given the distance.
        let best = table(15.0 * LAT_METER, 0.0, 1.0);
        let runner_up = table(25.0 * LAT_METER, 0.0, 1.0);
        let pool = vec![best, runner_up];

        let outcome = rank(point(0.0, 0.0), 30.0, &pool, &config()).unwrap();
        match outcome {
            MatchOutcome::Matched { confidence, .. } => {
                assert_eq!(confidence, Confidence::Medium);
            }
            other => panic!("expected Matched, got {other:?}"),
        }

        let best = table(22.0 * LAT_METER, 0.0, 1.0);
        let runner_up = table(28.0 * LAT_METER, 0.0, 1.0);
        let pool = vec![best, runner_up];
        let outcome = rank(point(0.0, 0.0), 30.0, &pool, &config()).unwrap();
        match outcome {
            MatchOutcome::Matched { confidence, .. } => {
                assert_eq!(confidence, Confidence::Low);
            }
            other => panic!("expected Matched, got {other:?}"),
        }
    }

    #[test]
    fn alternates_are_bounded() {
        let best = table(1.0 * LAT_METER, 0.0, 1.0);
        let mut pool = vec![best];
        for i in 0..5 {
            pool.push(table((6.0 + 4.0 * i as f64) * LAT_METER, 0.0, 1.0));
        }

        let outcome = rank(point(0.0, 0.0), 30.0, &pool, &config()).unwrap();
        match outcome {
            MatchOutcome::Matched { alternates, .. } => {
                assert_eq!(alternates.len(), config().max_alternates);
            }
            other => panic!("expected Matched, got {other:?}"),
        }
    }

    #[test]
    fn equidistant_tables_order_stably_by_id() {
        let east = table(0.0, 5.0 * LAT_METER, 1.0);
        let west = table(0.0, -5.0 * LAT_METER, 1.0);
        let expected_first = east.id.min(west.id);

        // Same pool, both insertion orders.
        for pool in [vec![east.clone(), west.clone()], vec![west.clone(), east.clone()]] {
            let outcome = rank(point(0.0, 0.0), 30.0, &pool, &config()).unwrap();
            match outcome {
                MatchOutcome::Ambiguous { candidates } => {
                    assert_eq!(candidates[0].table.id, expected_first);
                }
                other => panic!("expected Ambiguous, got {other:?}"),
            }
        }
    }

    #[test]
    fn reserved_and_offline_tables_are_ignored() {
        let mut reserved = table(0.0, 0.0, 5.0);
        reserved.status = TableStatus::Reserved;
        let mut offline = table(LAT_METER, 0.0, 5.0);
        offline.status = TableStatus::Offline;
        let pool = vec![reserved, offline];

        let outcome = rank(point(0.0, 0.0), 30.0, &pool, &config()).unwrap();
        assert!(matches!(
            outcome,
            MatchOutcome::NoMatch {
                reason: NoMatchReason::NoEligibleTables
            }
        ));
    }

    #[test]
    fn far_query_yields_no_match() {
        let pool = vec![table(0.0, 0.0, 1.0)];
        let outcome =
            rank(point(500.0 * LAT_METER, 0.0), 30.0, &pool, &config()).unwrap();
        assert!(matches!(
            outcome,
            MatchOutcome::NoMatch {
                reason: NoMatchReason::OutsideDetectionRange
            }
        ));
    }

    #[test]
    fn empty_pool_is_a_hard_error() {
        let err = rank(point(0.0, 0.0), 30.0, &[], &config()).unwrap_err();
        assert!(matches!(err, DispatchError::EmptyPool));
    }

    #[test]
    fn negative_uncertainty_is_rejected() {
        let pool = vec![table(0.0, 0.0, 1.0)];
        let err = rank(point(0.0, 0.0), -1.0, &pool, &config()).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidUncertainty(_)));
    }
}
