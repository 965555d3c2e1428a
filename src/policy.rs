//! Completion policy.
//!
//! Maps a playback position and lesson duration to a completion percentage
//! and a "watched" flag. Pure and stateless; the progress service runs it on
//! every report so the derived fields always agree with position/duration.

/// Lessons shorter than this many seconds must be played to the end.
pub const SHORT_LESSON_SECONDS: f64 = 30.0;

/// Percentage required to complete a lesson shorter than [`SHORT_LESSON_SECONDS`].
pub const SHORT_LESSON_THRESHOLD: u8 = 100;

/// Percentage required to complete a lesson of [`SHORT_LESSON_SECONDS`] or longer.
pub const LONG_LESSON_THRESHOLD: u8 = 95;

/// Result of evaluating a position against a duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// Rounded percentage watched, in `0..=100`.
    pub percentage: u8,
    /// Whether the completion threshold for this duration was reached.
    pub completed: bool,
}

impl Completion {
    const NONE: Completion = Completion {
        percentage: 0,
        completed: false,
    };
}

/// Percentage that must be reached for a lesson of `duration_seconds`.
pub fn threshold_for(duration_seconds: f64) -> u8 {
    if duration_seconds < SHORT_LESSON_SECONDS {
        SHORT_LESSON_THRESHOLD
    } else {
        LONG_LESSON_THRESHOLD
    }
}

/// Evaluate a playback position against the lesson duration.
///
/// Invalid inputs (non-positive or non-finite duration, negative or
/// non-finite position) degrade to 0% / not completed instead of failing;
/// rejecting them is the caller's job.
pub fn evaluate(position_seconds: f64, duration_seconds: f64) -> Completion {
    if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
        return Completion::NONE;
    }
    if !position_seconds.is_finite() || position_seconds < 0.0 {
        return Completion::NONE;
    }

    let ratio = (position_seconds / duration_seconds * 100.0).round();
    let percentage = ratio.min(100.0) as u8;

    Completion {
        percentage,
        completed: percentage >= threshold_for(duration_seconds),
    }
}
