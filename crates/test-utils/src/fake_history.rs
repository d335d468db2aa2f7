use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use deploydag::changes::{History, Revision};

#[derive(Debug, Default)]
struct State {
    available: bool,
    current: Option<Revision>,
    changed: Vec<String>,
    fail_diff: bool,
    diff_calls: usize,
}

/// Scripted [`History`]: a current revision and the paths every diff
/// returns. Clones share state.
#[derive(Debug, Clone)]
pub struct FakeHistory {
    state: Arc<Mutex<State>>,
}

impl FakeHistory {
    pub fn at(revision: &str) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                available: true,
                current: Some(revision.to_string()),
                ..State::default()
            })),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    pub fn without_revision() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                available: true,
                ..State::default()
            })),
        }
    }

    pub fn with_changed(self, paths: &[&str]) -> Self {
        self.state.lock().unwrap().changed = paths.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn failing_diff(self) -> Self {
        self.state.lock().unwrap().fail_diff = true;
        self
    }

    pub fn diff_calls(&self) -> usize {
        self.state.lock().unwrap().diff_calls
    }
}

impl History for FakeHistory {
    fn is_available(&self) -> bool {
        self.state.lock().unwrap().available
    }

    fn current_revision(&self) -> Result<Option<Revision>> {
        Ok(self.state.lock().unwrap().current.clone())
    }

    fn diff_paths(&self, _from: &str, _to: &str) -> Result<Vec<String>> {
        let mut state = self.state.lock().unwrap();
        state.diff_calls += 1;
        if state.fail_diff {
            return Err(anyhow!("injected diff failure"));
        }
        Ok(state.changed.clone())
    }
}
