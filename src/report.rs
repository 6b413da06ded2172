//! Scaling-report sinks.
//!
//! The benchmark's terminal step is a report of elapsed time against worker
//! count. Rendering is deliberately pluggable: the core hands a sink plain
//! `(workers, elapsed_secs)` pairs and stays ignorant of presentation, so a
//! non-interactive environment can swap the console table for a CSV writer
//! without touching the algorithm.

use std::io::Write;

use crate::error::Result;

/// One point of the scaling report: how long the integration took on a
/// group of `workers` workers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingSample {
    /// Worker count of the measured run.
    pub workers: usize,
    /// Elapsed wall-clock seconds at the designated worker.
    pub elapsed_secs: f64,
}

/// Destination for the scaling report.
pub trait ReportSink {
    /// Emit the gathered samples, in the order they were recorded.
    fn emit(&mut self, samples: &[TimingSample]) -> Result<()>;
}

/// Renders the report as an aligned table on stdout.
pub struct ConsoleSink;

impl ReportSink for ConsoleSink {
    fn emit(&mut self, samples: &[TimingSample]) -> Result<()> {
        println!("Execution time vs. number of workers");
        println!("{:>8}  {:>14}", "workers", "elapsed (s)");
        for sample in samples {
            println!("{:>8}  {:>14.6}", sample.workers, sample.elapsed_secs);
        }
        Ok(())
    }
}

/// Writes the report as CSV records to any writer.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    /// Wrap a writer in a CSV report sink.
    ///
    /// [`emit`](ReportSink::emit) flushes after writing, so the underlying
    /// writer holds the complete report as soon as the call returns.
    pub fn new(writer: W) -> Self {
        CsvSink {
            writer: csv::Writer::from_writer(writer),
        }
    }
}

impl<W: Write> ReportSink for CsvSink<W> {
    fn emit(&mut self, samples: &[TimingSample]) -> Result<()> {
        self.writer.write_record(["workers", "elapsed_secs"])?;
        for sample in samples {
            self.writer
                .write_record([sample.workers.to_string(), sample.elapsed_secs.to_string()])?;
        }
        self.writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}
