//! Local search over a single visiting order.
//!
//! Two neighbourhoods, first improvement: 2-opt segment reversal and
//! relocation of one place to another position. Every candidate is scored
//! through the full simulation, so window waits and skips are accounted for.

use crate::context::PlanContext;

const IMPROVEMENT_EPSILON: f64 = 1e-9;

/// Run local search improvement until no more improvements or `max_iterations`
/// passes. Returns the fitness of the improved order.
pub fn local_search(ctx: &PlanContext<'_>, order: &mut [usize], max_iterations: usize) -> f64 {
    let mut fitness = ctx.fitness(order);

    for _ in 0..max_iterations {
        let mut improved = false;

        if let Some(better) = two_opt_improve(ctx, order, fitness) {
            fitness = better;
            improved = true;
        }

        if let Some(better) = relocate_improve(ctx, order, fitness) {
            fitness = better;
            improved = true;
        }

        if !improved {
            break;
        }
    }

    fitness
}

/// 2-opt: reverse a segment of the order.
/// Returns the new fitness if an improvement was made.
fn two_opt_improve(ctx: &PlanContext<'_>, order: &mut [usize], current: f64) -> Option<f64> {
    let n = order.len();
    let mut candidate = order.to_vec();

    for i in 0..n.saturating_sub(1) {
        for j in i + 1..n {
            candidate[i..=j].reverse();
            let fitness = ctx.fitness(&candidate);
            if fitness > current + IMPROVEMENT_EPSILON {
                order.copy_from_slice(&candidate);
                return Some(fitness);
            }
            candidate[i..=j].reverse();
        }
    }

    None
}

/// Relocate: move one place to a different position.
/// Returns the new fitness if an improvement was made.
fn relocate_improve(ctx: &PlanContext<'_>, order: &mut [usize], current: f64) -> Option<f64> {
    let n = order.len();
    let mut candidate = order.to_vec();

    for from in 0..n {
        for to in 0..n {
            if from == to {
                continue;
            }
            let place = candidate.remove(from);
            candidate.insert(to, place);

            let fitness = ctx.fitness(&candidate);
            if fitness > current + IMPROVEMENT_EPSILON {
                order.copy_from_slice(&candidate);
                return Some(fitness);
            }

            let place = candidate.remove(to);
            candidate.insert(from, place);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ClockTime;
    use crate::config::EngineConfig;
    use crate::model::{Place, RouteSettings};
    use crate::traits::{TravelMatrix, is_permutation};

    /// Places on a line at 1..=n, start at 0.
    fn line(n: usize) -> (Vec<Place>, TravelMatrix) {
        let size = n + 1;
        let mut km = vec![vec![0.0; size]; size];
        let mut minutes = vec![vec![0; size]; size];
        for i in 0..size {
            for j in 0..size {
                km[i][j] = i.abs_diff(j) as f64;
                minutes[i][j] = i.abs_diff(j) as u32 * 5;
            }
        }
        let places = (0..n)
            .map(|i| Place::new(format!("p{i}"), "P", 0.0, 0.0).with_duration(20).with_rating(4.0))
            .collect();
        (places, TravelMatrix::new(km, minutes))
    }

    #[test]
    fn test_untangles_reversed_line() {
        let (places, matrix) = line(6);
        let settings = RouteSettings::new(ClockTime::hm(9, 0), 600);
        let config = EngineConfig::default();
        let ctx = PlanContext::new(&places, &settings, &matrix, &config);

        let mut order = vec![5, 4, 3, 2, 1, 0];
        let before = ctx.fitness(&order);
        let after = local_search(&ctx, &mut order, 100);

        assert!(after > before);
        assert_eq!(order, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(after, ctx.fitness(&order));
    }

    #[test]
    fn test_keeps_a_local_optimum() {
        let (places, matrix) = line(5);
        let settings = RouteSettings::new(ClockTime::hm(9, 0), 600);
        let config = EngineConfig::default();
        let ctx = PlanContext::new(&places, &settings, &matrix, &config);

        let mut order = vec![0, 1, 2, 3, 4];
        let fitness = local_search(&ctx, &mut order, 100);
        assert!(is_permutation(&order, 5));
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
        assert_eq!(fitness, ctx.fitness(&order));
    }

    #[test]
    fn test_zero_iterations_is_a_no_op() {
        let (places, matrix) = line(4);
        let settings = RouteSettings::new(ClockTime::hm(9, 0), 600);
        let config = EngineConfig::default();
        let ctx = PlanContext::new(&places, &settings, &matrix, &config);

        let mut order = vec![3, 1, 0, 2];
        local_search(&ctx, &mut order, 0);
        assert_eq!(order, vec![3, 1, 0, 2]);
    }
}
