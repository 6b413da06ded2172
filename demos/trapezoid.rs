//! Partitioned trapezoidal-rule scaling benchmark.
//!
//! Estimates the integral of `f(x) = 5x³ + 3x² + 4x + 20` over
//! `[0, 1_000_000]` with ten million subdivisions, splitting the work
//! across a group of workers and combining partial sums with a
//! sum-reduction at the designated worker. The sweep repeats the run for
//! 1, 2, 4 and 8 workers and finishes with a scaling report.
//!
//! Run with: cargo run --release --example trapezoid

use std::time::Instant;

use trapbench::{ConsoleSink, Integral, ReportSink, TimingSample, WorkerGroup, ROOT};

const X0: f64 = 0.0;
const XN: f64 = 1_000_000.0;
const N: u64 = 10_000_000;
const WORKER_COUNTS: [usize; 4] = [1, 2, 4, 8];

fn main() -> trapbench::Result<()> {
    let integral = Integral::new(X0, XN, N)?;
    let mut samples = Vec::with_capacity(WORKER_COUNTS.len());

    for &workers in &WORKER_COUNTS {
        let group = WorkerGroup::new(workers)?;

        let outcomes = group.run(|comm| {
            if comm.rank() == ROOT {
                println!("Calculating integral using trapezoidal rule on {workers} worker(s)...");
            }
            comm.barrier()?;

            let start = Instant::now();
            let result = integral.estimate(comm)?;
            let elapsed = start.elapsed().as_secs_f64();

            // One elapsed value per worker, ordered by ordinal at the root.
            let elapsed_by_rank = comm.gather_scalar(elapsed, ROOT)?;

            if let Some(estimate) = result {
                println!("Estimate: {estimate:.6e}");
                println!("Elapsed time: {elapsed:.4} seconds");
            }

            // Every worker double-checks the broadcast estimate against the
            // closed-form antiderivative. The trapezoidal rule overshoots on
            // a convex integrand, so the tolerance is loose.
            let mut estimate = [result.unwrap_or(0.0)];
            comm.broadcast(&mut estimate, ROOT)?;
            let exact = antiderivative(XN) - antiderivative(X0);
            assert!(
                ((estimate[0] - exact) / exact).abs() < 1e-3,
                "estimate {} strays too far from the closed form {}",
                estimate[0],
                exact,
            );

            Ok(elapsed_by_rank)
        })?;

        if let Some(times) = &outcomes[ROOT] {
            samples.push(TimingSample {
                workers,
                elapsed_secs: times[ROOT],
            });
        }
    }

    println!();
    ConsoleSink.emit(&samples)?;
    Ok(())
}

/// Antiderivative of the integrand: `F(x) = 1.25x⁴ + x³ + 2x² + 20x`.
fn antiderivative(x: f64) -> f64 {
    1.25 * x.powi(4) + x.powi(3) + 2.0 * x.powi(2) + 20.0 * x
}
