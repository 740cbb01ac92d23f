//! Per-frame working buffers.

use crate::compose::Frame;
use crate::config::Config;

/// Parent frames for the current pass, indexed by bone.
///
/// Every bone gets an entry, tracked or not, because its children compose
/// onto it.
#[derive(Debug, Default)]
pub struct Scratch {
    frames: Vec<Frame>,
}

impl Scratch {
    pub fn new(cfg: &Config) -> Self {
        Self {
            frames: Vec::with_capacity(cfg.scratch_bones),
        }
    }

    #[inline]
    pub fn begin_frame(&mut self, bones: usize) {
        self.frames.clear();
        self.frames.reserve(bones);
    }

    #[inline]
    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
