use std::time::Instant;

pub struct ProgressIndicator {
    total: usize,
    start_time: Instant,
}

impl ProgressIndicator {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            start_time: Instant::now(),
        }
    }

    pub fn chunk_completed(&self, completed: usize) {
        println!(
            "Calling level 2 model ({}/{} completed)",
            completed, self.total
        );
    }

    pub fn finish(&self, succeeded: usize, failed: usize) {
        let elapsed = self.start_time.elapsed();
        println!("\n{}", "=".repeat(60));
        println!("Summary:");
        println!("  Total:     {}", self.total);
        println!("  Succeeded: {}", succeeded);
        println!("  Failed:    {}", failed);
        println!("  Duration:  {:.2}s", elapsed.as_secs_f64());
        println!("{}", "=".repeat(60));
    }
}
