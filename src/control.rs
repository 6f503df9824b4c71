// Cascaded DC motor control
// Position/velocity/torque outer stage, current inner stage and supervision

pub mod current;
pub mod divergence;
pub mod gains;
pub mod link;
pub mod major_loop;
pub mod motion;
pub mod pi_controller;
pub mod pseudo_differentiator;
pub mod supervisor;

// Re-export main types for easier access
pub use current::CurrentController;
pub use divergence::{DivergenceMonitor, Verdict};
pub use gains::{GainSet, MotorModel};
pub use link::{LoopLink, SharedF32};
pub use major_loop::{MajorLoop, MajorTick};
pub use motion::{ControllerState, MotionController};
pub use pi_controller::PiController;
pub use pseudo_differentiator::PseudoDifferentiator;
pub use supervisor::{Supervisor, SupervisorEvents, SupervisorInputs, SupervisorState};

/// 制御モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlMode {
    /// 何もしない（加速度指令を保持）
    #[default]
    None,
    /// 位置制御（PID）
    Position,
    /// 速度制御（PI）
    Velocity,
    /// トルク制御
    Torque,
}

impl ControlMode {
    pub fn name(self) -> &'static str {
        match self {
            ControlMode::None => "none",
            ControlMode::Position => "position",
            ControlMode::Velocity => "velocity",
            ControlMode::Torque => "torque",
        }
    }
}
