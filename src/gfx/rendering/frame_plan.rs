//! # Frame Plan
//!
//! The fixed pass order of a frame as data. Each pass declares which
//! attachments it reads, writes and clears; [`FramePlan::new`] checks that
//! every read is produced by an earlier pass before the renderer accepts the
//! plan. The renderer walks [`FramePlan::passes`] in order every frame.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    Shadow,
    Skybox,
    Geometry,
    Composite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attachment {
    ShadowDepth,
    GColor,
    GNormal,
    GWorldPos,
    GDepth,
    Noise,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassDesc {
    pub kind: PassKind,
    /// Sampled inputs and attachments loaded instead of cleared
    pub reads: &'static [Attachment],
    pub writes: &'static [Attachment],
    /// Subset of `writes` cleared at the start of the pass
    pub clears: &'static [Attachment],
}

/// Inputs produced once at startup rather than by a pass
pub const STATIC_INPUTS: &[Attachment] = &[Attachment::Noise];

const GBUFFER: &[Attachment] = &[
    Attachment::GColor,
    Attachment::GNormal,
    Attachment::GWorldPos,
    Attachment::GDepth,
];

pub const FRAME_PASSES: [PassDesc; 4] = [
    PassDesc {
        kind: PassKind::Shadow,
        reads: &[],
        writes: &[Attachment::ShadowDepth],
        clears: &[Attachment::ShadowDepth],
    },
    PassDesc {
        kind: PassKind::Skybox,
        reads: &[],
        writes: GBUFFER,
        clears: GBUFFER,
    },
    PassDesc {
        kind: PassKind::Geometry,
        reads: GBUFFER,
        writes: GBUFFER,
        clears: &[],
    },
    PassDesc {
        kind: PassKind::Composite,
        reads: &[
            Attachment::GColor,
            Attachment::GNormal,
            Attachment::GWorldPos,
            Attachment::GDepth,
            Attachment::ShadowDepth,
            Attachment::Noise,
        ],
        writes: &[Attachment::Output],
        clears: &[Attachment::Output],
    },
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("{pass:?} pass reads {attachment:?} before any pass writes it")]
    UnwrittenInput {
        pass: PassKind,
        attachment: Attachment,
    },

    #[error("{pass:?} pass clears {attachment:?} without writing it")]
    ClearWithoutWrite {
        pass: PassKind,
        attachment: Attachment,
    },

    #[error("{0:?} pass appears more than once")]
    DuplicatePass(PassKind),

    #[error("no pass writes the output image")]
    NoOutput,
}

/// A validated, ordered list of passes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePlan {
    passes: Vec<PassDesc>,
}

impl FramePlan {
    pub fn new(passes: &[PassDesc]) -> Result<Self, PlanError> {
        let mut available: Vec<Attachment> = STATIC_INPUTS.to_vec();
        let mut seen: Vec<PassKind> = Vec::with_capacity(passes.len());

        for pass in passes {
            if seen.contains(&pass.kind) {
                return Err(PlanError::DuplicatePass(pass.kind));
            }
            seen.push(pass.kind);

            if let Some(&attachment) = pass.clears.iter().find(|a| !pass.writes.contains(a)) {
                return Err(PlanError::ClearWithoutWrite {
                    pass: pass.kind,
                    attachment,
                });
            }
            if let Some(&attachment) = pass.reads.iter().find(|a| !available.contains(a)) {
                return Err(PlanError::UnwrittenInput {
                    pass: pass.kind,
                    attachment,
                });
            }
            available.extend(pass.writes.iter().copied());
        }

        if !available.contains(&Attachment::Output) {
            return Err(PlanError::NoOutput);
        }
        Ok(Self {
            passes: passes.to_vec(),
        })
    }

    /// The four-pass deferred frame
    pub fn deferred() -> Result<Self, PlanError> {
        Self::new(&FRAME_PASSES)
    }

    pub fn passes(&self) -> &[PassDesc] {
        &self.passes
    }
}

/// Frame index handed to the composite shader for noise animation
///
/// Counts up from 0 and wraps before reaching `i32::MAX`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameCounter(i32);

impl FrameCounter {
    pub fn new(start: i32) -> Self {
        Self(start)
    }

    /// Increments and returns the value to use for this frame
    pub fn advance(&mut self) -> i32 {
        self.0 = self
            .0
            .checked_add(1)
            .filter(|&next| next != i32::MAX)
            .unwrap_or(0);
        self.0
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deferred_plan_is_valid_and_ordered() {
        let plan = FramePlan::deferred().unwrap();
        let kinds: Vec<PassKind> = plan.passes().iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PassKind::Shadow,
                PassKind::Skybox,
                PassKind::Geometry,
                PassKind::Composite
            ]
        );
    }

    #[test]
    fn test_geometry_before_skybox_is_rejected() {
        let mut passes = FRAME_PASSES;
        passes.swap(1, 2);
        assert_eq!(
            FramePlan::new(&passes),
            Err(PlanError::UnwrittenInput {
                pass: PassKind::Geometry,
                attachment: Attachment::GColor
            })
        );
    }

    #[test]
    fn test_composite_before_shadow_is_rejected() {
        let passes = [FRAME_PASSES[1], FRAME_PASSES[2], FRAME_PASSES[3], FRAME_PASSES[0]];
        assert_eq!(
            FramePlan::new(&passes),
            Err(PlanError::UnwrittenInput {
                pass: PassKind::Composite,
                attachment: Attachment::ShadowDepth
            })
        );
    }

    #[test]
    fn test_plan_without_output_is_rejected() {
        assert_eq!(FramePlan::new(&FRAME_PASSES[..3]), Err(PlanError::NoOutput));
    }

    #[test]
    fn test_duplicate_pass_is_rejected() {
        let passes = [FRAME_PASSES[0], FRAME_PASSES[0]];
        assert_eq!(
            FramePlan::new(&passes),
            Err(PlanError::DuplicatePass(PassKind::Shadow))
        );
    }

    #[test]
    fn test_clear_must_be_written() {
        let passes = [PassDesc {
            kind: PassKind::Composite,
            reads: &[],
            writes: &[],
            clears: &[Attachment::Output],
        }];
        assert_eq!(
            FramePlan::new(&passes),
            Err(PlanError::ClearWithoutWrite {
                pass: PassKind::Composite,
                attachment: Attachment::Output
            })
        );
    }

    #[test]
    fn test_frame_counter_wraps_before_max() {
        let mut counter = FrameCounter::new(i32::MAX - 2);
        assert_eq!(counter.advance(), i32::MAX - 1);
        assert_eq!(counter.advance(), 0);
        assert_eq!(counter.advance(), 1);
    }

    #[test]
    fn test_frame_counter_at_max_wraps_to_zero() {
        let mut counter = FrameCounter::new(i32::MAX);
        assert_eq!(counter.advance(), 0);
        assert_eq!(counter.value(), 0);
    }

    #[test]
    fn test_frame_counter_starts_at_one() {
        let mut counter = FrameCounter::default();
        assert_eq!(counter.advance(), 1);
    }
}
