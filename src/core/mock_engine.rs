//! Recording engine used by the session, transport and loader tests.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use crate::core::engine::{clamp_rate, EngineState, PlaybackEngine, RenderSurface};
use crate::core::media::Media;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Open(PathBuf),
    BindSurface(RenderSurface),
    Play,
    Pause,
    Stop,
    SetTime(i64),
    SetRate(f64),
}

#[derive(Debug)]
struct MockState {
    state: EngineState,
    time: i64,
    rate: f64,
    calls: Vec<EngineCall>,
    transitions: Vec<EngineState>,
    fail_open: bool,
    media: Option<Media>,
}

/// Cloning shares the underlying state, so a test keeps one clone for
/// inspection after handing the other to the code under test.
#[derive(Debug, Clone)]
pub struct MockEngine {
    inner: Rc<RefCell<MockState>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(MockState {
                state: EngineState::Idle,
                time: 0,
                rate: 1.0,
                calls: Vec::new(),
                transitions: Vec::new(),
                fail_open: false,
                media: None,
            })),
        }
    }

    /// Engine that already holds media and is playing at `time`.
    pub fn playing_at(time: i64) -> Self {
        let engine = Self::new();
        {
            let mut inner = engine.inner.borrow_mut();
            inner.media = Some(Media::new("fixture.mkv"));
            inner.state = EngineState::Playing;
            inner.time = time;
        }
        engine
    }

    pub fn failing_open() -> Self {
        let engine = Self::new();
        engine.inner.borrow_mut().fail_open = true;
        engine
    }

    pub fn boxed(&self) -> Box<dyn PlaybackEngine> {
        Box::new(self.clone())
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.inner.borrow().calls.clone()
    }

    pub fn transitions(&self) -> Vec<EngineState> {
        self.inner.borrow().transitions.clone()
    }

    /// Simulate the engine reaching a state on its own (e.g. natural end).
    pub fn force_state(&self, state: EngineState) {
        self.transition(state);
    }

    pub fn force_time(&self, time: i64) {
        self.inner.borrow_mut().time = time;
    }

    pub fn force_rate(&self, rate: f64) {
        self.inner.borrow_mut().rate = rate;
    }

    fn record(&self, call: EngineCall) {
        self.inner.borrow_mut().calls.push(call);
    }

    fn transition(&self, state: EngineState) {
        let mut inner = self.inner.borrow_mut();
        if inner.state != state {
            inner.state = state;
            inner.transitions.push(state);
        }
    }

    fn has_media(&self) -> bool {
        self.inner.borrow().media.is_some()
    }
}

impl PlaybackEngine for MockEngine {
    fn open(&mut self, media: &Media) -> anyhow::Result<()> {
        self.record(EngineCall::Open(media.path.clone()));
        if self.inner.borrow().fail_open {
            return Err(anyhow::anyhow!("unsupported codec"));
        }
        self.inner.borrow_mut().media = Some(media.clone());
        self.transition(EngineState::Stopped);
        Ok(())
    }

    fn bind_surface(&mut self, surface: &RenderSurface) {
        self.record(EngineCall::BindSurface(*surface));
    }

    fn play(&mut self) {
        self.record(EngineCall::Play);
        let current = self.state();
        if self.has_media() && matches!(current, EngineState::Stopped | EngineState::Paused) {
            self.transition(EngineState::Playing);
        }
    }

    fn pause(&mut self) {
        self.record(EngineCall::Pause);
        if self.state() == EngineState::Playing {
            self.transition(EngineState::Paused);
        }
    }

    fn stop(&mut self) {
        self.record(EngineCall::Stop);
        if self.has_media() {
            self.inner.borrow_mut().time = 0;
            self.transition(EngineState::Stopped);
        }
    }

    fn time(&self) -> i64 {
        self.inner.borrow().time
    }

    fn set_time(&mut self, ms: i64) {
        self.record(EngineCall::SetTime(ms));
        if matches!(self.state(), EngineState::Playing | EngineState::Paused) {
            self.inner.borrow_mut().time = ms.max(0);
        }
    }

    fn rate(&self) -> f64 {
        self.inner.borrow().rate
    }

    fn set_rate(&mut self, rate: f64) {
        self.record(EngineCall::SetRate(rate));
        if let Some(rate) = clamp_rate(rate) {
            self.inner.borrow_mut().rate = rate;
        }
    }

    fn state(&self) -> EngineState {
        self.inner.borrow().state
    }
}
