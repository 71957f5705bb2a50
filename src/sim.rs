//! Simulation scheduler: decides, once per frame, whether the layout runs
//! and with how much slow-down.
//!
//! The slow-down value is a displacement divisor handed to the layout; it
//! grows exponentially with wall-clock time so the simulation cools at the
//! same rate on a 30fps laptop and a 144hz desktop. When it saturates the
//! scheduler freezes and stops requesting layout steps until the next
//! interaction reheats it.
//!
//! Time is injected as milliseconds (`now_ms`) so tests drive the clock
//! directly; the app feeds it `egui`'s frame time.

/// Slow-down held during the pre-interaction warmup window.
pub const SLOW_INIT: f64 = 5.0;
/// Slow-down after an interaction resets the ramp.
pub const SLOW_RESET: f64 = 20.0;
/// Saturation cap; reaching it freezes the simulation.
pub const SLOW_MAX: f64 = 1000.0;
/// Wall-clock grace period after startup before cooling begins.
pub const STARTUP_DELAY_MS: f64 = 15_000.0;
/// Growth multiplier per nominal frame.
pub const GROWTH_PER_FRAME: f64 = 1.015;
/// Nominal frame duration the growth constant is calibrated against.
pub const FRAME_MS: f64 = 1000.0 / 60.0;

const CAP_EPSILON: f64 = 1e-6;

/// Scheduler lifecycle. `Stopped` only exists before the first `start`;
/// afterwards the scheduler oscillates between cooling and frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Stopped,
    /// Pre-first-interaction grace period; slow-down pinned at `SLOW_INIT`.
    Warmup,
    /// Cooling: slow-down grows toward the cap each frame.
    Active,
    /// Cap reached; no layout steps until reheat.
    Frozen,
}

pub struct Simulation {
    phase: Phase,
    slowdown: f64,
    has_interacted: bool,
    last_interaction_ms: f64,
    last_tick_ms: f64,
}

impl Simulation {
    pub fn new() -> Self {
        Self {
            phase: Phase::Stopped,
            slowdown: SLOW_INIT,
            has_interacted: false,
            last_interaction_ms: 0.0,
            last_tick_ms: 0.0,
        }
    }

    /// Begin scheduling. Idempotent once running.
    pub fn start(&mut self, now_ms: f64) {
        if self.phase == Phase::Stopped {
            self.phase = Phase::Warmup;
            self.slowdown = SLOW_INIT;
            self.last_interaction_ms = now_ms;
            self.last_tick_ms = now_ms;
        }
    }

    /// Advance one frame. Returns true when the layout should step this
    /// frame; false while stopped or frozen.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        match self.phase {
            Phase::Stopped | Phase::Frozen => return false,
            Phase::Warmup | Phase::Active => {}
        }

        let idle_ms = now_ms - self.last_interaction_ms;
        let delay_ms = if self.has_interacted { 0.0 } else { STARTUP_DELAY_MS };
        let base = if self.has_interacted { SLOW_RESET } else { SLOW_INIT };

        if idle_ms <= delay_ms {
            // still inside the startup grace period
            self.slowdown = base;
            self.last_tick_ms = now_ms;
            return true;
        }

        // Exponential ramp, frame-rate independent: the ratio after a fixed
        // wall-clock duration is the same regardless of frame spacing.
        let elapsed_ms = (now_ms - self.last_tick_ms).max(0.0);
        let frames = elapsed_ms / FRAME_MS;
        let factor = (GROWTH_PER_FRAME.ln() * frames).exp();
        self.slowdown = (self.slowdown * factor).min(SLOW_MAX);
        self.last_tick_ms = now_ms;
        self.phase = Phase::Active;

        if self.slowdown >= SLOW_MAX - CAP_EPSILON {
            self.phase = Phase::Frozen;
            return false;
        }
        true
    }

    /// Interaction signal: reset the ramp and resume if frozen. Safe to call
    /// at any time, including while already active.
    pub fn reheat(&mut self, now_ms: f64) {
        self.has_interacted = true;
        self.last_interaction_ms = now_ms;
        self.slowdown = SLOW_RESET;
        match self.phase {
            Phase::Stopped => {
                self.phase = Phase::Active;
                self.last_tick_ms = now_ms;
            }
            Phase::Frozen => {
                self.phase = Phase::Active;
                // avoid folding the frozen span into the next growth step
                self.last_tick_ms = now_ms;
            }
            Phase::Warmup | Phase::Active => self.phase = Phase::Active,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current displacement divisor for the layout settings.
    pub fn slowdown(&self) -> f64 {
        self.slowdown
    }

    /// Whether the frame loop should keep scheduling ticks.
    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Warmup | Phase::Active)
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> Simulation {
        let mut sim = Simulation::new();
        sim.start(0.0);
        sim
    }

    /// Drive ticks at a fixed spacing until `end_ms`, returning the final
    /// slow-down.
    fn run_frames(sim: &mut Simulation, start_ms: f64, end_ms: f64, spacing_ms: f64) -> f64 {
        let mut now = start_ms;
        while now <= end_ms {
            sim.tick(now);
            now += spacing_ms;
        }
        sim.slowdown()
    }

    #[test]
    fn warmup_holds_initial_slowdown() {
        let mut sim = started();
        for i in 0..10 {
            assert!(sim.tick(i as f64 * 1000.0));
            assert_eq!(sim.slowdown(), SLOW_INIT);
        }
        assert_eq!(sim.phase(), Phase::Warmup);
    }

    #[test]
    fn slowdown_grows_monotonically_after_warmup_and_never_exceeds_cap() {
        let mut sim = started();
        let mut previous = sim.slowdown();
        let mut now = 0.0;
        for _ in 0..5000 {
            sim.tick(now);
            assert!(sim.slowdown() >= previous);
            assert!(sim.slowdown() <= SLOW_MAX);
            previous = sim.slowdown();
            now += FRAME_MS;
        }
        assert!(previous > SLOW_INIT);
    }

    #[test]
    fn growth_is_frame_rate_independent() {
        // identical wall-clock span, different frame spacing
        let cooled = |spacing_ms: f64| {
            let mut sim = started();
            sim.reheat(0.0);
            run_frames(&mut sim, spacing_ms, 3000.0, spacing_ms)
        };

        let slow_30 = cooled(1000.0 / 30.0);
        let slow_144 = cooled(1000.0 / 144.0);

        assert!(slow_30 > SLOW_RESET && slow_30 < SLOW_MAX);
        let ratio = slow_30 / slow_144;
        assert!(
            (ratio - 1.0).abs() < 0.01,
            "30fps={slow_30} 144fps={slow_144}"
        );
    }

    #[test]
    fn saturation_freezes_and_skips_the_layout_step() {
        let mut sim = started();
        let mut now = STARTUP_DELAY_MS + 1.0;
        let mut stepped = true;
        for _ in 0..100_000 {
            stepped = sim.tick(now);
            if !stepped {
                break;
            }
            now += FRAME_MS;
        }
        assert!(!stepped, "never reached the cap");
        assert_eq!(sim.phase(), Phase::Frozen);
        assert_eq!(sim.slowdown(), SLOW_MAX);
        // frozen scheduler keeps declining further frames
        assert!(!sim.tick(now + FRAME_MS));
    }

    #[test]
    fn reheat_resumes_a_frozen_scheduler() {
        let mut sim = started();
        let mut now = STARTUP_DELAY_MS + 1.0;
        while sim.tick(now) {
            now += FRAME_MS;
        }
        assert_eq!(sim.phase(), Phase::Frozen);

        sim.reheat(now);
        assert_eq!(sim.phase(), Phase::Active);
        assert_eq!(sim.slowdown(), SLOW_RESET);
        assert!(sim.slowdown() < SLOW_MAX);
        assert!(sim.tick(now + FRAME_MS));
    }

    #[test]
    fn reheat_while_active_is_idempotent_for_scheduling() {
        let mut sim = started();
        sim.reheat(100.0);
        assert!(sim.is_running());
        sim.reheat(200.0);
        assert!(sim.is_running());
        assert_eq!(sim.slowdown(), SLOW_RESET);
    }

    #[test]
    fn interaction_ends_the_warmup_hold() {
        let mut sim = started();
        sim.tick(1000.0);
        assert_eq!(sim.slowdown(), SLOW_INIT);

        sim.reheat(2000.0);
        assert_eq!(sim.slowdown(), SLOW_RESET);
        // next tick grows from the reset value instead of re-pinning
        sim.tick(2000.0 + FRAME_MS);
        assert!(sim.slowdown() > SLOW_RESET);
    }

    #[test]
    fn start_is_idempotent() {
        let mut sim = started();
        sim.reheat(50.0);
        sim.start(60.0);
        assert_eq!(sim.phase(), Phase::Active);
        assert_eq!(sim.slowdown(), SLOW_RESET);
    }
}
