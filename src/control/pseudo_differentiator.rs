// Pseudo-differentiator: velocity estimation from position samples

/// First-order low-pass derivative estimator
///
/// Realises `s·g / (s + g)` with a forward-Euler integrator instead of a
/// finite difference, so encoder quantisation noise is not amplified:
///
/// ```text
/// integral += output * dt
/// output    = g * (input - integral)
/// ```
#[derive(Debug, Clone)]
pub struct PseudoDifferentiator {
    /// Cutoff frequency g [rad/s]
    cutoff: f32,
    /// Integral of the output (tracks the input)
    integral: f32,
    /// Last estimate
    output: f32,
}

impl PseudoDifferentiator {
    pub const fn new(cutoff: f32) -> Self {
        Self {
            cutoff,
            integral: 0.0,
            output: 0.0,
        }
    }

    /// Feed one sample and return the derivative estimate
    pub fn update(&mut self, input: f32, dt: f32) -> f32 {
        self.integral += self.output * dt;
        self.output = self.cutoff * (input - self.integral);
        self.output
    }

    /// Re-seed the integrator on `input` and clear the estimate
    ///
    /// The next update then starts from zero velocity instead of
    /// unwinding a stale difference.
    pub fn reset(&mut self, input: f32) {
        self.integral = input;
        self.output = 0.0;
    }

    pub fn set_cutoff(&mut self, cutoff: f32) {
        self.cutoff = cutoff;
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    pub fn output(&self) -> f32 {
        self.output
    }

    pub fn integral(&self) -> f32 {
        self.integral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.0002;

    #[test]
    fn test_constant_input_after_reset() {
        let mut diff = PseudoDifferentiator::new(1000.0);
        diff.reset(3.0);
        for _ in 0..10 {
            assert_eq!(diff.update(3.0, DT), 0.0);
        }
    }

    #[test]
    fn test_ramp_converges_to_slope() {
        let mut diff = PseudoDifferentiator::new(1000.0);
        let slope = 10.0; // rad/s
        let mut velocity = 0.0;
        for k in 1..=500 {
            velocity = diff.update(slope * k as f32 * DT, DT);
        }
        assert!((velocity - slope).abs() < 1e-2);
    }

    #[test]
    fn test_step_response_first_sample() {
        let mut diff = PseudoDifferentiator::new(1000.0);
        // 初回は g * input
        let v = diff.update(0.001, DT);
        assert!((v - 1.0).abs() < 1e-6);
    }
}
