// PI (Proportional-Integral) controller

/// PI controller with a forward-Euler integrator
///
/// No output limiting: saturation is detected downstream by
/// [`DivergenceMonitor`](super::DivergenceMonitor) instead of being clamped here.
#[derive(Debug, Clone)]
pub struct PiController {
    /// Proportional gain
    kp: f32,
    /// Integral gain
    ki: f32,
    /// Error of the last update
    error: f32,
    /// Integral accumulator (∫error dt)
    integral: f32,
    /// Last calculated output
    last_output: f32,
}

impl PiController {
    /// Create a new PI controller
    ///
    /// # Arguments
    /// * `kp` - Proportional gain
    /// * `ki` - Integral gain
    pub const fn new(kp: f32, ki: f32) -> Self {
        Self {
            kp,
            ki,
            error: 0.0,
            integral: 0.0,
            last_output: 0.0,
        }
    }

    /// Update the PI controller
    ///
    /// # Arguments
    /// * `setpoint` - Desired value
    /// * `measured` - Actual measured value
    /// * `dt` - Time step (seconds)
    ///
    /// # Returns
    /// `kp * error + ki * ∫error dt`
    pub fn update(&mut self, setpoint: f32, measured: f32, dt: f32) -> f32 {
        self.error = setpoint - measured;
        self.integral += self.error * dt;
        self.last_output = self.kp * self.error + self.ki * self.integral;
        self.last_output
    }

    /// Reset error, integral and output to zero
    pub fn reset(&mut self) {
        self.error = 0.0;
        self.integral = 0.0;
        self.last_output = 0.0;
    }

    /// Set the proportional and integral gains
    pub fn set_gains(&mut self, kp: f32, ki: f32) {
        self.kp = kp;
        self.ki = ki;
    }

    /// Get the current output
    pub fn get_output(&self) -> f32 {
        self.last_output
    }

    /// Get the error of the last update
    pub fn get_error(&self) -> f32 {
        self.error
    }

    /// Get the current integral term
    pub fn get_integral(&self) -> f32 {
        self.integral
    }

    /// Get the proportional gain
    pub fn get_kp(&self) -> f32 {
        self.kp
    }

    /// Get the integral gain
    pub fn get_ki(&self) -> f32 {
        self.ki
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proportional_only() {
        let mut pi = PiController::new(1.0, 0.0);
        let output = pi.update(5.0, 0.0, 0.1);
        assert_eq!(output, 5.0); // P term only
        assert_eq!(pi.get_error(), 5.0);
    }

    #[test]
    fn test_no_output_limit() {
        let mut pi = PiController::new(1.0, 0.0);
        let output = pi.update(2000.0, 0.0, 0.1);
        assert_eq!(output, 2000.0);
    }

    #[test]
    fn test_integral_accumulation() {
        let mut pi = PiController::new(0.0, 1.0);
        // Error = 10, dt = 0.5, so integral should accumulate by 5.0 each step
        pi.update(10.0, 0.0, 0.5);
        assert_eq!(pi.get_integral(), 5.0);
        let output = pi.update(10.0, 0.0, 0.5);
        assert_eq!(pi.get_integral(), 10.0);
        assert_eq!(output, 10.0);
    }

    #[test]
    fn test_reset() {
        let mut pi = PiController::new(2.0, 3.0);
        pi.update(1.0, 0.0, 0.5);
        pi.reset();
        assert_eq!(pi.get_error(), 0.0);
        assert_eq!(pi.get_integral(), 0.0);
        assert_eq!(pi.get_output(), 0.0);
        assert_eq!(pi.get_kp(), 2.0);
        assert_eq!(pi.get_ki(), 3.0);
    }
}
