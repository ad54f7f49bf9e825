//! Maps elapsed time to a path parameter.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClockMode {
    /// Restart from the beginning every `duration`.
    #[default]
    Looping,
    /// Run once and hold `t = 1` at the end.
    Once,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathClock {
    duration_secs: f32,
    pub mode: ClockMode,
}

impl PathClock {
    /// Non-positive durations are bumped to a tiny positive value.
    pub fn new(duration_secs: f32, mode: ClockMode) -> Self {
        Self {
            duration_secs: duration_secs.max(f32::EPSILON),
            mode,
        }
    }

    pub fn looping(duration_secs: f32) -> Self {
        Self::new(duration_secs, ClockMode::Looping)
    }

    pub fn once(duration_secs: f32) -> Self {
        Self::new(duration_secs, ClockMode::Once)
    }

    pub fn duration_secs(&self) -> f32 {
        self.duration_secs
    }

    /// Path parameter after `elapsed_secs`. Looping stays in `[0, 1)`, once
    /// saturates at 1.
    pub fn t_at(&self, elapsed_secs: f32) -> f32 {
        match self.mode {
            ClockMode::Looping => elapsed_secs.rem_euclid(self.duration_secs) / self.duration_secs,
            ClockMode::Once => (elapsed_secs / self.duration_secs).clamp(0.0, 1.0),
        }
    }

    pub fn finished(&self, elapsed_secs: f32) -> bool {
        self.mode == ClockMode::Once && elapsed_secs >= self.duration_secs
    }
}
