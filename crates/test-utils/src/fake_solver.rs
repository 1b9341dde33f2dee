use std::collections::VecDeque;
use std::fs;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use simherd::errors::Result;
use simherd::supervisor::{SolverBackend, SolverChild, SolverInvocation};

/// What a [`FakeSolverBackend`] observed, shared with the test through
/// `Arc`s so it stays inspectable after the backend moves into a pipeline.
#[derive(Debug, Clone, Default)]
pub struct FakeRecord {
    pub launched: Arc<Mutex<Vec<SolverInvocation>>>,
    pub blocking_runs: Arc<Mutex<Vec<SolverInvocation>>>,
    pub pkilled: Arc<Mutex<Vec<String>>>,
    pub child_kills: Arc<Mutex<usize>>,
}

impl FakeRecord {
    pub fn launched_tools(&self) -> Vec<String> {
        self.launched
            .lock()
            .unwrap()
            .iter()
            .map(|inv| inv.tool.clone())
            .collect()
    }

    pub fn blocking_tools(&self) -> Vec<String> {
        self.blocking_runs
            .lock()
            .unwrap()
            .iter()
            .map(|inv| inv.tool.clone())
            .collect()
    }

    pub fn total_spawns(&self) -> usize {
        self.launched.lock().unwrap().len() + self.blocking_runs.lock().unwrap().len()
    }
}

/// A fake solver backend that:
/// - records every launch, blocking run, and name-based kill
/// - never spawns a real process
/// - optionally writes a file on launch after a delay (to simulate the
///   solver producing its status file)
/// - returns queued exit codes for blocking runs (default 0).
pub struct FakeSolverBackend {
    record: FakeRecord,
    exit_codes: Arc<Mutex<VecDeque<i32>>>,
    write_on_launch: Option<(PathBuf, String, Duration)>,
}

impl FakeSolverBackend {
    pub fn new() -> Self {
        Self {
            record: FakeRecord::default(),
            exit_codes: Arc::new(Mutex::new(VecDeque::new())),
            write_on_launch: None,
        }
    }

    /// Shared view of everything this backend observes.
    pub fn record(&self) -> FakeRecord {
        self.record.clone()
    }

    /// Queue an exit code for the next blocking run (FIFO; default 0).
    pub fn push_exit_code(&self, code: i32) {
        self.exit_codes.lock().unwrap().push_back(code);
    }

    /// After each launch, write `contents` to `path` once `delay` has
    /// passed, simulating the solver writing its status file.
    pub fn write_on_launch(
        mut self,
        path: impl Into<PathBuf>,
        contents: impl Into<String>,
        delay: Duration,
    ) -> Self {
        self.write_on_launch = Some((path.into(), contents.into(), delay));
        self
    }
}

impl Default for FakeSolverBackend {
    fn default() -> Self {
        Self::new()
    }
}

struct FakeChild {
    kills: Arc<Mutex<usize>>,
}

impl SolverChild for FakeChild {
    fn kill(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            *self.kills.lock().unwrap() += 1;
            Ok(())
        })
    }
}

impl SolverBackend for FakeSolverBackend {
    fn launch(&mut self, invocation: &SolverInvocation) -> Result<Box<dyn SolverChild>> {
        self.record.launched.lock().unwrap().push(invocation.clone());

        if let Some((path, contents, delay)) = self.write_on_launch.clone() {
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = fs::write(&path, contents);
            });
        }

        Ok(Box::new(FakeChild {
            kills: Arc::clone(&self.record.child_kills),
        }))
    }

    fn run_blocking<'a>(
        &'a mut self,
        invocation: &'a SolverInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + 'a>> {
        let record = self.record.clone();
        let exit_codes = Arc::clone(&self.exit_codes);

        Box::pin(async move {
            record.blocking_runs.lock().unwrap().push(invocation.clone());

            // Real blocking runs leave a log file behind; failure errors
            // point users at it.
            let _ = fs::write(&invocation.log_file, "fake tool output\n");

            let code = exit_codes.lock().unwrap().pop_front().unwrap_or(0);
            Ok(code)
        })
    }

    fn kill_by_name<'a>(
        &'a mut self,
        process: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        let record = self.record.clone();

        Box::pin(async move {
            record.pkilled.lock().unwrap().push(process.to_string());
            Ok(())
        })
    }
}
