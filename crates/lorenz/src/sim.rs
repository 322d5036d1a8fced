use crate::{INITIAL_POSITION, SimParams};

/// Per-stream Lorenz simulation state.
///
/// Holds the current position and the immutable system parameters. The
/// position is mutated only by [`advance`](Self::advance); everything
/// else is read-only. Each stream owns exactly one `SimulationState`,
/// created at the fixed seed [`INITIAL_POSITION`] and discarded when
/// the stream ends - there is no shared or resumable trajectory.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationState {
    x: f64,
    y: f64,
    z: f64,
    params: SimParams,
}

impl SimulationState {
    /// Creates a state seeded at [`INITIAL_POSITION`].
    pub fn new(params: SimParams) -> Self {
        let (x, y, z) = INITIAL_POSITION;
        Self { x, y, z, params }
    }

    /// Creates a state at an explicit starting position.
    ///
    /// Used by tests to verify the integrator against hand-computed
    /// values; production streams always start at the fixed seed.
    pub fn with_position(params: SimParams, x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z, params }
    }

    /// Advances the state by one explicit-Euler step.
    ///
    /// All three deltas are evaluated at the pre-update position; the
    /// position is only written after every derivative has been
    /// computed. Updating in place mid-formula would silently turn
    /// this into a different (semi-implicit) scheme.
    pub fn advance(&mut self) {
        let SimParams {
            sigma,
            rho,
            beta,
            dt,
        } = self.params;

        let dx = sigma * (self.y - self.x) * dt;
        let dy = (self.x * (rho - self.z) - self.y) * dt;
        let dz = (self.x * self.y - beta * self.z) * dt;

        self.x += dx;
        self.y += dy;
        self.z += dz;
    }

    /// Advances by `steps` sub-steps, as one emitted frame.
    pub fn advance_frame(&mut self, steps: u32) {
        for _ in 0..steps {
            self.advance();
        }
    }

    /// Current position.
    pub fn position(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classic_params(dt: f64) -> SimParams {
        SimParams::new(10.0, 28.0, 8.0 / 3.0, dt).unwrap()
    }

    #[test]
    fn euler_step_matches_hand_computed_values() {
        let mut sim = SimulationState::with_position(classic_params(0.01), 1.0, 2.0, 3.0);
        sim.advance();

        let (x, y, z) = sim.position();
        const EPSILON: f64 = 1e-9;
        assert!((x - 1.1).abs() < EPSILON, "x = {x}");
        assert!((y - 2.23).abs() < EPSILON, "y = {y}");
        assert!((z - 2.94).abs() < EPSILON, "z = {z}");
    }

    #[test]
    fn trajectories_are_deterministic() {
        let mut a = SimulationState::new(classic_params(0.01));
        let mut b = SimulationState::new(classic_params(0.01));

        for _ in 0..5_000 {
            a.advance();
            b.advance();
            // Bit-identical, not merely close: same inputs, same
            // arithmetic, no hidden randomness.
            let (ax, ay, az) = a.position();
            let (bx, by, bz) = b.position();
            assert_eq!(ax.to_bits(), bx.to_bits());
            assert_eq!(ay.to_bits(), by.to_bits());
            assert_eq!(az.to_bits(), bz.to_bits());
        }
    }

    #[test]
    fn default_seed_is_not_the_origin() {
        let sim = SimulationState::new(classic_params(0.01));
        assert_ne!(sim.position(), (0.0, 0.0, 0.0));
    }

    #[test]
    fn origin_is_a_fixed_point() {
        // Demonstrates why the seed must be displaced: a trajectory
        // started exactly at the origin never moves.
        let mut sim = SimulationState::with_position(classic_params(0.01), 0.0, 0.0, 0.0);
        for _ in 0..100 {
            sim.advance();
        }
        assert_eq!(sim.position(), (0.0, 0.0, 0.0));
    }

    #[test]
    fn frame_of_n_substeps_equals_n_single_steps() {
        let mut framed = SimulationState::new(classic_params(0.01));
        let mut stepped = SimulationState::new(classic_params(0.01));

        framed.advance_frame(4);
        stepped.advance();
        stepped.advance();
        stepped.advance();
        stepped.advance();

        assert_eq!(framed.position(), stepped.position());
    }

    #[test]
    fn trajectory_leaves_the_seed_immediately() {
        let mut sim = SimulationState::new(classic_params(0.01));
        let before = sim.position();
        sim.advance();
        assert_ne!(sim.position(), before);
    }
}
