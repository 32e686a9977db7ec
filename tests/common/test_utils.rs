use std::fmt;

use hexglobe::flow::FrameStages;
use instant::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stage {
    Controls,
    Acquire,
    Composited,
    Overlay,
    Present,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct AcquireFailed;

impl fmt::Display for AcquireFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no frame available")
    }
}

/// Records the order in which frame stages run.
pub(crate) struct Recorder {
    stages: Vec<Stage>,
    elapsed: Duration,
    fail_acquire: bool,
    frames: u32,
}

pub(crate) struct RecordedFrame {
    id: u32,
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            elapsed: Duration::ZERO,
            fail_acquire: false,
            frames: 0,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_acquire: true,
            ..Self::new()
        }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn presented_frames(&self) -> u32 {
        self.frames
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameStages for Recorder {
    type Frame = RecordedFrame;
    type Error = AcquireFailed;

    fn update_controls(&mut self, dt: Duration) {
        self.elapsed += dt;
        self.stages.push(Stage::Controls);
    }

    fn begin_frame(&mut self) -> Result<RecordedFrame, AcquireFailed> {
        self.stages.push(Stage::Acquire);
        if self.fail_acquire {
            return Err(AcquireFailed);
        }
        Ok(RecordedFrame { id: self.frames })
    }

    fn render_composited(&mut self, frame: &mut RecordedFrame) {
        assert_eq!(frame.id, self.frames);
        self.stages.push(Stage::Composited);
    }

    fn render_overlay(&mut self, frame: &mut RecordedFrame) {
        assert_eq!(frame.id, self.frames);
        self.stages.push(Stage::Overlay);
    }

    fn present(&mut self, frame: RecordedFrame) {
        assert_eq!(frame.id, self.frames);
        self.frames += 1;
        self.stages.push(Stage::Present);
    }
}
