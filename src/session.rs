use std::time::{Duration, SystemTime};

use tracing::debug;

/// Floor applied to the elapsed time before computing wpm, so a test that
/// completes within the same millisecond it started still has a finite rate.
pub const MIN_ELAPSED: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("target text must not be empty")]
pub struct EmptyTarget;

/// The passage the user is expected to reproduce.
///
/// Lengths and indices are counted in chars, not bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetText {
    text: String,
    chars: Vec<char>,
}

impl TargetText {
    pub fn new(text: impl Into<String>) -> Result<Self, EmptyTarget> {
        let text = text.into();
        if text.is_empty() {
            return Err(EmptyTarget);
        }
        let chars = text.chars().collect();
        Ok(Self { text, chars })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn char_at(&self, idx: usize) -> Option<char> {
        self.chars.get(idx).copied()
    }

    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.chars.iter().copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    InProgress,
    Finished,
}

/// Final numbers for a completed test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestResult {
    pub wpm: u32,
    /// percent, 0..=100
    pub accuracy: u8,
    /// seconds
    pub time: u64,
}

/// Highlight state of one target character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharMark {
    Correct,
    Incorrect,
    Current,
    Pending,
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    input: String,
    input_len: usize,
    started_at: Option<SystemTime>,
    total_keystrokes: u32,
    mistakes: u32,
    finished: bool,
    result: Option<TestResult>,
}

impl SessionState {
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn started_at(&self) -> Option<SystemTime> {
        self.started_at
    }

    pub fn total_keystrokes(&self) -> u32 {
        self.total_keystrokes
    }

    pub fn mistakes(&self) -> u32 {
        self.mistakes
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn result(&self) -> Option<TestResult> {
        self.result
    }
}

/// One typing test bound to a single target text.
///
/// A reset never reuses a `Session`: the caller drops it and builds a new one
/// once the next target is available.
#[derive(Debug, Clone)]
pub struct Session {
    target: TargetText,
    state: SessionState,
}

impl Session {
    pub fn new(target: TargetText) -> Self {
        Self {
            target,
            state: SessionState::default(),
        }
    }

    pub fn target(&self) -> &TargetText {
        &self.target
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn input(&self) -> &str {
        &self.state.input
    }

    pub fn result(&self) -> Option<TestResult> {
        self.state.result
    }

    pub fn phase(&self) -> Phase {
        if self.state.finished {
            Phase::Finished
        } else if self.state.started_at.is_some() {
            Phase::InProgress
        } else {
            Phase::NotStarted
        }
    }

    pub fn on_input(&mut self, value: &str) -> Phase {
        self.on_input_at(value, SystemTime::now())
    }

    /// Feed the full current content of the input box.
    ///
    /// Only growth is counted: the last char of a longer value is compared
    /// against the target at the same index. Shrinking never touches the
    /// counters. Once finished, further input is ignored.
    pub fn on_input_at(&mut self, value: &str, now: SystemTime) -> Phase {
        if self.state.finished {
            return Phase::Finished;
        }

        if self.state.started_at.is_none() {
            self.state.started_at = Some(now);
        }

        let new_len = value.chars().count();
        if new_len > self.state.input_len {
            self.state.total_keystrokes += 1;
            // past the end of the target there is nothing to match
            if value.chars().last() != self.target.char_at(new_len - 1) {
                self.state.mistakes += 1;
            }
        }

        self.state.input.clear();
        self.state.input.push_str(value);
        self.state.input_len = new_len;

        if new_len == self.target.len() {
            self.state.finished = true;
            let result = self.compute_result(now);
            debug!(?result, "session finished");
            self.state.result = Some(result);
        }

        self.phase()
    }

    /// Live accuracy percentage. Vacuously 100 before the first keystroke.
    pub fn accuracy(&self) -> u8 {
        accuracy_pct(self.state.total_keystrokes, self.state.mistakes)
    }

    pub fn char_marks(&self) -> Vec<CharMark> {
        let mut typed = self.state.input.chars();
        self.target
            .chars()
            .enumerate()
            .map(|(idx, expected)| match typed.next() {
                Some(c) if c == expected => CharMark::Correct,
                Some(_) => CharMark::Incorrect,
                None if idx == self.state.input_len => CharMark::Current,
                None => CharMark::Pending,
            })
            .collect()
    }

    fn compute_result(&self, now: SystemTime) -> TestResult {
        let elapsed = self
            .state
            .started_at
            .and_then(|started| now.duration_since(started).ok())
            .unwrap_or_default()
            .max(MIN_ELAPSED);
        let elapsed_minutes = elapsed.as_secs_f64() / 60.0;

        TestResult {
            wpm: (count_words(&self.state.input) as f64 / elapsed_minutes).round() as u32,
            accuracy: self.accuracy(),
            time: (elapsed_minutes * 60.0).round() as u64,
        }
    }
}

pub fn accuracy_pct(total_keystrokes: u32, mistakes: u32) -> u8 {
    if total_keystrokes == 0 {
        return 100;
    }
    let correct = total_keystrokes as f64 - mistakes as f64;
    (100.0 * correct / total_keystrokes as f64).round().max(0.0) as u8
}

/// Words are runs between single spaces after trimming; no spaces means one word.
pub fn count_words(input: &str) -> usize {
    input.trim().split(' ').count()
}
