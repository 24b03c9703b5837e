//! Scripted in-memory surface for tests and dry runs.

use crate::error::{BrowserError, Result};
use crate::surface::{BrowserSurface, InputEvent};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// What a scripted responder hands back.
#[derive(Debug, Clone)]
pub enum FakeReply {
    Value(Value),
    Throw(String),
}

#[derive(Debug)]
struct Responder {
    needle: String,
    replies: VecDeque<FakeReply>,
}

#[derive(Debug, Default)]
struct FakeState {
    current_url: String,
    redirects: HashMap<String, String>,
    responders: Vec<Responder>,
    loaded: Vec<String>,
    scripts: Vec<String>,
    inputs: Vec<InputEvent>,
}

/// A [`BrowserSurface`] whose page is a set of canned answers.
///
/// Scripts are matched against responders by substring, most recently
/// registered first. Unmatched scripts evaluate to `null`. Loading a URL lands
/// on its registered redirect target, or on the URL itself.
#[derive(Debug)]
pub struct FakeSurface {
    state: Mutex<FakeState>,
    available: AtomicBool,
}

impl FakeSurface {
    pub fn new(start_url: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(FakeState {
                current_url: start_url.into(),
                ..FakeState::default()
            }),
            available: AtomicBool::new(true),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        // A panicking test thread must not hide the assertion that caused it
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn redirect(&self, from: impl Into<String>, to: impl Into<String>) {
        self.state().redirects.insert(from.into(), to.into());
    }

    pub fn set_url(&self, url: impl Into<String>) {
        self.state().current_url = url.into();
    }

    pub fn respond(&self, needle: impl Into<String>, value: Value) {
        self.respond_sequence(needle, vec![value]);
    }

    /// Answer successive matching scripts with `values`; the last one repeats.
    pub fn respond_sequence(&self, needle: impl Into<String>, values: Vec<Value>) {
        self.push_responder(needle.into(), values.into_iter().map(FakeReply::Value));
    }

    pub fn throw_on(&self, needle: impl Into<String>, message: impl Into<String>) {
        self.push_responder(needle.into(), [FakeReply::Throw(message.into())]);
    }

    pub fn replies(&self, needle: impl Into<String>, replies: Vec<FakeReply>) {
        self.push_responder(needle.into(), replies);
    }

    fn push_responder(&self, needle: String, replies: impl IntoIterator<Item = FakeReply>) {
        let replies: VecDeque<FakeReply> = replies.into_iter().collect();
        if replies.is_empty() {
            return;
        }
        self.state().responders.push(Responder { needle, replies });
    }

    pub fn tear_down(&self) {
        self.available.store(false, Ordering::SeqCst);
    }

    pub fn loaded_urls(&self) -> Vec<String> {
        self.state().loaded.clone()
    }

    pub fn executed_scripts(&self) -> Vec<String> {
        self.state().scripts.clone()
    }

    pub fn scripts_containing(&self, needle: &str) -> usize {
        self.state()
            .scripts
            .iter()
            .filter(|s| s.contains(needle))
            .count()
    }

    pub fn input_events(&self) -> Vec<InputEvent> {
        self.state().inputs.clone()
    }
}

#[async_trait::async_trait]
impl BrowserSurface for FakeSurface {
    async fn load_url(&self, url: &str) -> Result<()> {
        if !self.is_available() {
            return Err(BrowserError::SurfaceUnavailable);
        }
        let mut state = self.state();
        state.loaded.push(url.to_string());
        let landed = state
            .redirects
            .get(url)
            .cloned()
            .unwrap_or_else(|| url.to_string());
        state.current_url = landed;
        Ok(())
    }

    async fn get_url(&self) -> Result<String> {
        if !self.is_available() {
            return Err(BrowserError::SurfaceUnavailable);
        }
        Ok(self.state().current_url.clone())
    }

    async fn execute_javascript(&self, script: &str) -> Result<Value> {
        if !self.is_available() {
            return Err(BrowserError::SurfaceUnavailable);
        }
        let mut state = self.state();
        state.scripts.push(script.to_string());

        let Some(responder) = state
            .responders
            .iter_mut()
            .rev()
            .find(|r| script.contains(&r.needle))
        else {
            return Ok(Value::Null);
        };

        let reply = if responder.replies.len() > 1 {
            responder.replies.pop_front()
        } else {
            responder.replies.front().cloned()
        };

        match reply {
            Some(FakeReply::Value(value)) => Ok(value),
            Some(FakeReply::Throw(message)) => Err(BrowserError::ScriptError(message)),
            None => Ok(Value::Null),
        }
    }

    async fn send_input_event(&self, event: InputEvent) -> Result<()> {
        if !self.is_available() {
            return Err(BrowserError::SurfaceUnavailable);
        }
        self.state().inputs.push(event);
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}
