use std::sync::Arc;

use parking_lot::Mutex;
use wsbridge::{Bridge, CloseEvent, Delegate, ErrorCode, MessageData};

type Hook = Box<dyn Fn(&Bridge) + Send + Sync>;

/// A delegate callback as observed by [`RecordingDelegate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    Open { protocol: String },
    Message(MessageData),
    Close(CloseEvent),
    Error(ErrorCode),
}

/// Records every callback in order. Optional hooks run after recording.
#[derive(Default)]
pub struct RecordingDelegate {
    events: Mutex<Vec<Callback>>,
    on_open_hook: Option<Hook>,
    on_message_hook: Option<Hook>,
}

impl RecordingDelegate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Run `hook` from inside `on_open`.
    pub fn with_on_open(hook: impl Fn(&Bridge) + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            on_open_hook: Some(Box::new(hook)),
            ..Self::default()
        })
    }

    /// Run `hook` from inside `on_message`.
    pub fn with_on_message(hook: impl Fn(&Bridge) + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            on_message_hook: Some(Box::new(hook)),
            ..Self::default()
        })
    }

    pub fn events(&self) -> Vec<Callback> {
        self.events.lock().clone()
    }

    pub fn opens(&self) -> usize {
        self.count(|e| matches!(e, Callback::Open { .. }))
    }

    pub fn closes(&self) -> Vec<CloseEvent> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Callback::Close(event) => Some(event),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<ErrorCode> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Callback::Error(code) => Some(code),
                _ => None,
            })
            .collect()
    }

    pub fn messages(&self) -> Vec<MessageData> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Callback::Message(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&Callback) -> bool) -> usize {
        self.events.lock().iter().filter(|e| pred(e)).count()
    }
}

impl Delegate for RecordingDelegate {
    fn on_open(&self, bridge: &Bridge) {
        self.events.lock().push(Callback::Open {
            protocol: bridge.negotiated_protocol(),
        });
        if let Some(hook) = &self.on_open_hook {
            hook(bridge);
        }
    }

    fn on_message(&self, bridge: &Bridge, message: &MessageData) {
        self.events.lock().push(Callback::Message(message.clone()));
        if let Some(hook) = &self.on_message_hook {
            hook(bridge);
        }
    }

    fn on_close(&self, _bridge: &Bridge, event: &CloseEvent) {
        self.events.lock().push(Callback::Close(event.clone()));
    }

    fn on_error(&self, _bridge: &Bridge, error: ErrorCode) {
        self.events.lock().push(Callback::Error(error));
    }
}
