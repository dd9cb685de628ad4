//! Terminal rendering of worker rows and totals.

use harvest_core::scheduler::HarvestSnapshot;
use harvest_core::worker::WorkerRow;

pub fn print_rows(rows: &[WorkerRow]) {
    println!(
        "{:<4} {:<8} {:>8} {:>8} {:>8}  {}",
        "ID", "STATUS", "OFFSET", "FETCHED", "SAVED", "JOB"
    );
    for r in rows {
        println!(
            "{:<4} {:<8} {:>8} {:>8} {:>8}  {}",
            r.id,
            r.status.as_str(),
            r.offset,
            r.fetched,
            r.saved,
            r.job
        );
    }
}

pub fn print_totals(s: &HarvestSnapshot) {
    println!(
        "workers {}  stopped {}  offset {}  fetched {}  saved {}",
        s.worker_count, s.stopped_count, s.total_offset, s.total_fetched, s.total_saved
    );
}
