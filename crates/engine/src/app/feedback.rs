use tracing::info;

/// Named audio cue. The simulation only names cues; sinks decide what they sound like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CueId(pub &'static str);

/// A side effect the simulation asks the presentation layer to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackRequest {
    Cue(CueId),
    SetCounter {
        name: &'static str,
        value: u32,
    },
    ShowMessage {
        text: String,
        duration_seconds: f32,
    },
}

pub trait AudioSink {
    fn trigger(&mut self, cue: CueId);
}

pub trait UiSink {
    fn set_counter(&mut self, name: &'static str, value: u32);
    fn show_message(&mut self, text: &str, duration_seconds: f32);
}

#[derive(Debug, Default)]
pub struct LogAudioSink;

impl AudioSink for LogAudioSink {
    fn trigger(&mut self, cue: CueId) {
        info!(cue = cue.0, "audio_cue");
    }
}

#[derive(Debug, Default)]
pub struct LogUiSink;

impl UiSink for LogUiSink {
    fn set_counter(&mut self, name: &'static str, value: u32) {
        info!(counter = name, value, "ui_counter");
    }

    fn show_message(&mut self, text: &str, duration_seconds: f32) {
        info!(text, duration_seconds, "ui_message");
    }
}

/// Keeps every request it receives, for assertions.
#[derive(Debug, Default, Clone)]
pub struct RecordingSinks {
    pub requests: Vec<FeedbackRequest>,
}

impl RecordingSinks {
    pub fn cues(&self) -> impl Iterator<Item = CueId> + '_ {
        self.requests.iter().filter_map(|request| match request {
            FeedbackRequest::Cue(cue) => Some(*cue),
            _ => None,
        })
    }

    pub fn last_counter(&self, name: &str) -> Option<u32> {
        self.requests.iter().rev().find_map(|request| match request {
            FeedbackRequest::SetCounter {
                name: counter,
                value,
            } if *counter == name => Some(*value),
            _ => None,
        })
    }
}

impl AudioSink for RecordingSinks {
    fn trigger(&mut self, cue: CueId) {
        self.requests.push(FeedbackRequest::Cue(cue));
    }
}

impl UiSink for RecordingSinks {
    fn set_counter(&mut self, name: &'static str, value: u32) {
        self.requests.push(FeedbackRequest::SetCounter { name, value });
    }

    fn show_message(&mut self, text: &str, duration_seconds: f32) {
        self.requests.push(FeedbackRequest::ShowMessage {
            text: text.to_string(),
            duration_seconds,
        });
    }
}

pub struct FeedbackRouter {
    audio: Box<dyn AudioSink>,
    ui: Box<dyn UiSink>,
    dispatched: u64,
}

impl Default for FeedbackRouter {
    fn default() -> Self {
        Self::new(Box::new(LogAudioSink), Box::new(LogUiSink))
    }
}

impl FeedbackRouter {
    pub fn new(audio: Box<dyn AudioSink>, ui: Box<dyn UiSink>) -> Self {
        Self {
            audio,
            ui,
            dispatched: 0,
        }
    }

    pub fn dispatch(&mut self, request: &FeedbackRequest) {
        match request {
            FeedbackRequest::Cue(cue) => self.audio.trigger(*cue),
            FeedbackRequest::SetCounter { name, value } => self.ui.set_counter(name, *value),
            FeedbackRequest::ShowMessage {
                text,
                duration_seconds,
            } => self.ui.show_message(text, *duration_seconds),
        }
        self.dispatched = self.dispatched.saturating_add(1);
    }

    pub fn dispatch_all(&mut self, requests: impl IntoIterator<Item = FeedbackRequest>) {
        for request in requests {
            self.dispatch(&request);
        }
    }

    pub fn dispatched_count(&self) -> u64 {
        self.dispatched
    }
}
