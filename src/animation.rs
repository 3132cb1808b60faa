/*!
 * Animation strategies.
 *
 * An animation turns one cue into an ordered list of frames. Each frame is a
 * half-open time window plus a scale factor; the frames of a cue tile its
 * window exactly. Layout is attached later by the compiler.
 */

use std::f64::consts::PI;

use crate::cue_track::Cue;
use crate::errors::{CaptionError, Result};
use crate::style::{AnimationKind, BounceParams, CaptionStyle, MIN_BOUNCE_KEYFRAMES, OVERSHOOT_CEILING};

/// Shortest sub-window worth drawing, one frame at 25 fps
pub const MIN_SUB_WINDOW_MS: u64 = 40;

/// A time window and the scale the caption is drawn at during it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub start_ms: u64,
    pub end_ms: u64,
    pub scale: f64,
}

impl Frame {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// Overshoot-then-settle scale curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BounceCurve {
    keyframes: u32,
    overshoot: f64,
}

impl BounceCurve {
    /// Build a curve, rejecting parameters that style validation lets through only by mistake
    pub fn new(params: BounceParams) -> Result<Self> {
        if params.keyframes < MIN_BOUNCE_KEYFRAMES {
            return Err(CaptionError::InternalInvariant(format!(
                "bounce needs at least {} keyframes, got {}",
                MIN_BOUNCE_KEYFRAMES, params.keyframes
            )));
        }
        let ceiling = params.max_overshoot.min(OVERSHOOT_CEILING);
        if !(params.overshoot > 0.0 && params.overshoot <= ceiling) {
            return Err(CaptionError::InternalInvariant(format!(
                "bounce overshoot {} outside (0, {}]",
                params.overshoot, ceiling
            )));
        }
        Ok(Self {
            keyframes: params.keyframes,
            overshoot: params.overshoot,
        })
    }

    pub fn keyframes(&self) -> u32 {
        self.keyframes
    }

    pub fn overshoot(&self) -> f64 {
        self.overshoot
    }

    /// Shortest cue that still gets the full bounce sequence
    pub fn min_duration_ms(&self) -> u64 {
        u64::from(self.keyframes) * MIN_SUB_WINDOW_MS
    }

    /// Scale of sub-window `i`; exactly 1.0 at both ends
    pub fn scale_at(&self, i: u32) -> f64 {
        let last = self.keyframes - 1;
        if i == 0 || i >= last {
            return 1.0;
        }
        let u = f64::from(i) / f64::from(last);
        1.0 + self.overshoot * (3.0 * PI * u).sin() * (1.0 - u).powi(2)
    }

    fn expand(&self, cue: &Cue) -> Vec<Frame> {
        let start = cue.start_ms();
        let duration = cue.duration_ms();
        if duration < self.min_duration_ms() {
            return vec![static_frame(cue)];
        }

        // i * duration may exceed u64 for very long cues; the quotient never does
        let n = u128::from(self.keyframes);
        let boundary = |i: u64| start + (u128::from(i) * u128::from(duration) / n) as u64;
        (0..self.keyframes)
            .map(|i| Frame {
                start_ms: boundary(u64::from(i)),
                end_ms: boundary(u64::from(i) + 1),
                scale: self.scale_at(i),
            })
            .collect()
    }
}

/// Closed set of animations a caption style can select
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Animation {
    Static,
    Bounce(BounceCurve),
}

impl Animation {
    pub fn for_style(style: &CaptionStyle) -> Result<Self> {
        match style.animation() {
            AnimationKind::None => Ok(Self::Static),
            AnimationKind::Bounce => Ok(Self::Bounce(BounceCurve::new(style.bounce())?)),
        }
    }

    /// Frames for one cue, in time order
    pub fn expand(&self, cue: &Cue) -> Vec<Frame> {
        match self {
            Self::Static => vec![static_frame(cue)],
            Self::Bounce(curve) => curve.expand(cue),
        }
    }
}

fn static_frame(cue: &Cue) -> Frame {
    Frame {
        start_ms: cue.start_ms(),
        end_ms: cue.end_ms(),
        scale: 1.0,
    }
}
