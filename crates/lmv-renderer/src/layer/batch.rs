//! Deferred texture-update batching.
//!
//! Per-object mutations always land in the CPU mirrors immediately. The
//! batcher only decides how they reach the GPU: as a one-texel upload per
//! mutation, or as one whole-texture upload at the frame boundary. A
//! frame that issues more than the configured number of single-object
//! uploads escalates to deferred mode for its remainder, and bulk
//! transactions (e.g. frustum culling touching thousands of objects) can
//! force deferred mode up front with [`UpdateBatcher::begin_deferred`].

/// How mutations reach the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadMode {
    /// Each mutation uploads its texel right away.
    Immediate,
    /// Uploads are suppressed until the next flush.
    Deferred,
}

/// Decision for one recorded mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadDecision {
    /// Upload the mutated texel now.
    Texel,
    /// Mirror only; the flush will upload the whole texture.
    Suppressed,
}

/// Tracks upload mode and the per-frame update budget for one layer.
#[derive(Debug)]
pub struct UpdateBatcher {
    mode: UploadMode,
    updates_this_frame: u32,
    threshold: u32,
}

impl UpdateBatcher {
    /// Create a batcher in immediate mode.
    pub fn new(threshold: u32) -> Self {
        Self {
            mode: UploadMode::Immediate,
            updates_this_frame: 0,
            threshold,
        }
    }

    /// Current mode.
    pub fn mode(&self) -> UploadMode {
        self.mode
    }

    /// Force deferred mode until the next flush, for bulk transactions.
    pub fn begin_deferred(&mut self) {
        self.mode = UploadMode::Deferred;
    }

    /// Record one mutation and decide how it uploads.
    pub fn record_update(&mut self) -> UploadDecision {
        match self.mode {
            UploadMode::Deferred => UploadDecision::Suppressed,
            UploadMode::Immediate => {
                self.updates_this_frame += 1;
                if self.updates_this_frame > self.threshold {
                    tracing::debug!(
                        updates = self.updates_this_frame,
                        "update budget exceeded, deferring until flush"
                    );
                    self.mode = UploadMode::Deferred;
                    UploadDecision::Suppressed
                } else {
                    UploadDecision::Texel
                }
            }
        }
    }

    /// End the frame (or an explicit bulk transaction): report whether a
    /// whole-texture upload is owed, and reset to immediate mode.
    pub fn finish(&mut self) -> bool {
        let owed = self.mode == UploadMode::Deferred;
        self.mode = UploadMode::Immediate;
        self.updates_this_frame = 0;
        owed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escalates_after_threshold() {
        let mut batcher = UpdateBatcher::new(3);
        for _ in 0..3 {
            assert_eq!(batcher.record_update(), UploadDecision::Texel);
        }
        assert_eq!(batcher.record_update(), UploadDecision::Suppressed);
        assert_eq!(batcher.mode(), UploadMode::Deferred);
        assert!(batcher.finish());
        // Next frame starts immediate again.
        assert_eq!(batcher.record_update(), UploadDecision::Texel);
    }

    #[test]
    fn test_explicit_bracket_suppresses_all() {
        let mut batcher = UpdateBatcher::new(10);
        batcher.begin_deferred();
        assert_eq!(batcher.record_update(), UploadDecision::Suppressed);
        assert!(batcher.finish());
    }

    #[test]
    fn test_no_flush_owed_without_updates() {
        let mut batcher = UpdateBatcher::new(10);
        assert!(!batcher.finish());
        batcher.record_update();
        assert!(!batcher.finish());
    }
}
