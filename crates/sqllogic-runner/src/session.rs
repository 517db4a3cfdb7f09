//! Run-wide timing context

use crate::statistics::group_digits;
use std::time::{Duration, Instant};

/// Created once per run and threaded through every file execution
#[derive(Debug)]
pub struct RunSession {
    started: Instant,
    total_tests: usize,
    files: usize,
}

/// Started when a file begins executing
#[derive(Debug, Clone, Copy)]
pub struct FileTimer {
    started: Instant,
}

impl FileTimer {
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl RunSession {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            total_tests: 0,
            files: 0,
        }
    }

    pub fn start_file(&self) -> FileTimer {
        FileTimer {
            started: Instant::now(),
        }
    }

    /// Account for a finished file and describe the timings so far
    pub fn finish_file(&mut self, timer: FileTimer, tests: usize) -> String {
        self.total_tests += tests;
        self.files += 1;
        format!(
            "{} tests took {}s, {} took {}s",
            group_digits(tests),
            group_digits(timer.elapsed().as_secs() as usize),
            group_digits(self.total_tests),
            group_digits(self.elapsed().as_secs() as usize),
        )
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn total_tests(&self) -> usize {
        self.total_tests
    }

    pub fn files(&self) -> usize {
        self.files
    }
}

impl Default for RunSession {
    fn default() -> Self {
        Self::new()
    }
}
