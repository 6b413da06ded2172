//! Collectives smoke demo - exercises every collective operation.
//!
//! Runs a four-worker group through barrier, broadcast, reduce, all-reduce
//! and gather, asserting the results on every worker.
//!
//! Run with: cargo run --example collectives

use trapbench::{ReduceOp, WorkerGroup, ROOT};

fn main() -> trapbench::Result<()> {
    let group = WorkerGroup::new(4)?;
    let size = group.size();

    group.run(|comm| {
        let rank = comm.rank();
        println!("Worker {}/{}: starting collective checks", rank, size);

        // ============================================================
        // Check 1: Broadcast
        // ============================================================
        {
            let mut data = if rank == ROOT {
                vec![1.0, 2.0, 3.0, 4.0, 5.0]
            } else {
                vec![0.0; 5]
            };

            comm.broadcast(&mut data, ROOT)?;

            let expected = vec![1.0, 2.0, 3.0, 4.0, 5.0];
            assert_eq!(data, expected, "broadcast failed on worker {}", rank);

            if rank == ROOT {
                println!("- broadcast check passed");
            }
        }

        // ============================================================
        // Check 2: Reduce (sum)
        // ============================================================
        {
            let total = comm.reduce_scalar(rank as f64 + 1.0, ReduceOp::Sum, ROOT)?;

            if rank == ROOT {
                // Sum of 1 + 2 + ... + size
                let expected: f64 = (1..=size).map(|x| x as f64).sum();
                assert_eq!(total, Some(expected), "reduce sum failed");
                println!("- reduce sum check passed (sum = {})", expected);
            } else {
                assert_eq!(total, None, "worker {} unexpectedly got a result", rank);
            }
        }

        // ============================================================
        // Check 3: Reduce (max)
        // ============================================================
        {
            let max = comm.reduce_scalar(rank as f64 * 10.0, ReduceOp::Max, ROOT)?;

            if rank == ROOT {
                let expected = (size - 1) as f64 * 10.0;
                assert_eq!(max, Some(expected), "reduce max failed");
                println!("- reduce max check passed (max = {})", expected);
            }
        }

        // ============================================================
        // Check 4: All-reduce (sum)
        // ============================================================
        {
            let combined = comm.allreduce(&[1.0; 4], ReduceOp::Sum)?;

            let expected = vec![size as f64; 4];
            assert_eq!(combined, expected, "allreduce sum failed on worker {}", rank);

            if rank == ROOT {
                println!("- allreduce sum check passed");
            }
        }

        // ============================================================
        // Check 5: All-reduce scalar convenience method
        // ============================================================
        {
            let sum = comm.allreduce_scalar(rank as f64 + 1.0, ReduceOp::Sum)?;

            let expected: f64 = (1..=size).map(|x| x as f64).sum();
            assert!((sum - expected).abs() < 1e-10, "allreduce scalar failed");

            if rank == ROOT {
                println!("- allreduce scalar check passed (sum = {})", sum);
            }
        }

        // ============================================================
        // Check 6: Gather
        // ============================================================
        {
            let gathered = comm.gather_scalar(rank as u64 * 10, ROOT)?;

            if rank == ROOT {
                let values = gathered.expect("gather returns a result at the root");
                for (r, value) in values.iter().enumerate() {
                    assert_eq!(*value, r as u64 * 10, "gather failed at ordinal {}", r);
                }
                println!("- gather check passed (received {} values)", values.len());
            } else {
                assert!(gathered.is_none(), "worker {} unexpectedly got a result", rank);
            }
        }

        comm.barrier()?;

        if rank == ROOT {
            println!("\nAll collective checks passed");
        }

        Ok(())
    })?;

    Ok(())
}
