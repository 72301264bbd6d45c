use std::sync::{Arc, Mutex};

/// One decoded RGBA frame ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Presentation time in milliseconds
    pub pts: i64,
}

impl VideoFrame {
    pub fn is_valid(&self) -> bool {
        self.rgba.len() == (self.width as usize) * (self.height as usize) * 4
    }
}

#[derive(Debug, Default)]
enum SlotState {
    #[default]
    Unchanged,
    Frame(VideoFrame),
    Cleared,
}

/// What the window should do with its texture this frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameUpdate {
    Unchanged,
    Show(VideoFrame),
    Clear,
}

/// Single-slot mailbox between a decoder thread and the UI. Only the newest
/// frame is kept; the UI never sees a backlog.
#[derive(Debug, Clone, Default)]
pub struct FrameSlot {
    inner: Arc<Mutex<SlotState>>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, frame: VideoFrame) {
        if let Ok(mut slot) = self.inner.lock() {
            *slot = SlotState::Frame(frame);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut slot) = self.inner.lock() {
            *slot = SlotState::Cleared;
        }
    }

    pub fn poll(&self) -> FrameUpdate {
        match self.inner.lock() {
            Ok(mut slot) => match std::mem::take(&mut *slot) {
                SlotState::Unchanged => FrameUpdate::Unchanged,
                SlotState::Frame(frame) => FrameUpdate::Show(frame),
                SlotState::Cleared => FrameUpdate::Clear,
            },
            Err(_) => FrameUpdate::Unchanged,
        }
    }
}
