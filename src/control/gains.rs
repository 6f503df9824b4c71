//! 制御ゲインとモーター公称モデル

use crate::config::params::{gains, motor};

/// 全ループのゲイン
///
/// 位置（PID）・速度（PI）・電流（PI）の各ゲインと擬似微分のカットオフ周波数。
/// モード設定／電流ループ設定の操作でのみ変更されます。
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GainSet {
    pub position_kp: f32,
    pub position_ki: f32,
    pub position_kd: f32,
    pub velocity_kp: f32,
    pub velocity_ki: f32,
    pub current_kp: f32,
    pub current_ki: f32,
    /// 擬似微分のカットオフ周波数 [rad/s]
    pub cutoff: f32,
}

impl GainSet {
    pub const fn new() -> Self {
        Self {
            position_kp: gains::POSITION_KP,
            position_ki: gains::POSITION_KI,
            position_kd: gains::POSITION_KD,
            velocity_kp: gains::VELOCITY_KP,
            velocity_ki: gains::VELOCITY_KI,
            current_kp: gains::CURRENT_KP,
            current_ki: gains::CURRENT_KI,
            cutoff: gains::PSEUDO_DIFF_CUTOFF,
        }
    }
}

impl Default for GainSet {
    fn default() -> Self {
        Self::new()
    }
}

/// モーターの公称パラメータ
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorModel {
    /// トルク定数 [Nm/A]
    pub torque_constant: f32,
    /// 慣性 [kg·m²]
    pub inertia: f32,
    /// 巻線抵抗 [Ω]
    pub resistance: f32,
    /// 巻線インダクタンス [H]
    pub inductance: f32,
}

impl MotorModel {
    pub const fn new() -> Self {
        Self {
            torque_constant: motor::TORQUE_CONSTANT,
            inertia: motor::INERTIA,
            resistance: motor::RESISTANCE,
            inductance: motor::INDUCTANCE,
        }
    }

    /// 加速度指令 [rad/s²] → 電流指令 [A] の変換係数（Mn / Ktn）
    pub fn acceleration_to_current(&self) -> f32 {
        self.inertia / self.torque_constant
    }
}

impl Default for MotorModel {
    fn default() -> Self {
        Self::new()
    }
}
