//! 位置・速度・トルク制御（外側ループ）
//!
//! メジャーループ周期で実行されます。擬似微分で速度を推定し、
//! 制御モードに応じた加速度指令を電流指令に変換して内側ループへ渡します。
//! 電流ループが無効な場合は、公称抵抗から電圧指令を直接計算して出力します。

use super::gains::{GainSet, MotorModel};
use super::link::LoopLink;
use super::pi_controller::PiController;
use super::pseudo_differentiator::PseudoDifferentiator;
use super::ControlMode;
use crate::actuator::Actuator;

/// 制御状態のスナップショット（テレメトリ・デバッグ用）
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerState {
    pub mode: ControlMode,
    pub position_command: f32,
    pub velocity_command: f32,
    pub torque_command: f32,
    pub position_response: f32,
    pub velocity_response: f32,
    pub current_command: f32,
    pub current_response: f32,
    pub position_error: f32,
    pub position_integral: f32,
    pub velocity_error: f32,
    pub velocity_integral: f32,
    pub acceleration_reference: f32,
    pub voltage_reference: f32,
}

impl ControllerState {
    pub const fn new() -> Self {
        Self {
            mode: ControlMode::None,
            position_command: 0.0,
            velocity_command: 0.0,
            torque_command: 0.0,
            position_response: 0.0,
            velocity_response: 0.0,
            current_command: 0.0,
            current_response: 0.0,
            position_error: 0.0,
            position_integral: 0.0,
            velocity_error: 0.0,
            velocity_integral: 0.0,
            acceleration_reference: 0.0,
            voltage_reference: 0.0,
        }
    }
}

impl Default for ControllerState {
    fn default() -> Self {
        Self::new()
    }
}

/// カスケード制御の外側ステージ
pub struct MotionController<'a> {
    link: &'a LoopLink,
    model: MotorModel,
    gains: GainSet,
    mode: ControlMode,
    dt: f32,

    position_command: f32,
    velocity_command: f32,
    torque_command: f32,

    position_response: f32,
    estimator: PseudoDifferentiator,

    /// 位置PID（P・I項。D項は速度偏差に`position_kd`を掛ける）
    position_pi: PiController,
    velocity_pi: PiController,
    velocity_error: f32,

    acceleration_reference: f32,
    current_command: f32,
    /// バイパス時に最後に出力した電圧 [V]
    voltage_reference: f32,
}

impl<'a> MotionController<'a> {
    pub fn new(link: &'a LoopLink, gains: GainSet, model: MotorModel, dt: f32) -> Self {
        link.configure_current_loop(link.current_loop_enabled(), gains.current_kp, gains.current_ki);
        Self {
            link,
            model,
            gains,
            mode: ControlMode::None,
            dt,
            position_command: 0.0,
            velocity_command: 0.0,
            torque_command: 0.0,
            position_response: 0.0,
            estimator: PseudoDifferentiator::new(gains.cutoff),
            position_pi: PiController::new(gains.position_kp, gains.position_ki),
            velocity_pi: PiController::new(gains.velocity_kp, gains.velocity_ki),
            velocity_error: 0.0,
            acceleration_reference: 0.0,
            current_command: 0.0,
            voltage_reference: 0.0,
        }
    }

    /// 位置制御モードに切り替え、指令値とPIDゲインを設定
    pub fn set_position_mode(&mut self, position: f32, velocity: f32, kp: f32, ki: f32, kd: f32) {
        self.mode = ControlMode::Position;
        self.position_command = position;
        self.velocity_command = velocity;
        self.gains.position_kp = kp;
        self.gains.position_ki = ki;
        self.gains.position_kd = kd;
        self.position_pi.set_gains(kp, ki);
    }

    /// 速度制御モードに切り替え、指令値とPIゲインを設定
    pub fn set_velocity_mode(&mut self, velocity: f32, kp: f32, ki: f32) {
        self.mode = ControlMode::Velocity;
        self.velocity_command = velocity;
        self.gains.velocity_kp = kp;
        self.gains.velocity_ki = ki;
        self.velocity_pi.set_gains(kp, ki);
    }

    /// トルク制御モードに切り替え
    pub fn set_torque_mode(&mut self, torque: f32) {
        self.mode = ControlMode::Torque;
        self.torque_command = torque;
    }

    /// 制御を停止（加速度指令は保持）
    pub fn set_idle(&mut self) {
        self.mode = ControlMode::None;
    }

    /// 擬似微分のカットオフ周波数 [rad/s] を設定
    pub fn set_cutoff(&mut self, cutoff: f32) {
        self.gains.cutoff = cutoff;
        self.estimator.set_cutoff(cutoff);
    }

    /// 電流ループの有効/無効とゲインを設定（無効化時はゲインを変更しない）
    pub fn configure_current_loop(&mut self, enabled: bool, kp: f32, ki: f32) {
        if enabled {
            self.gains.current_kp = kp;
            self.gains.current_ki = ki;
        }
        self.link.configure_current_loop(enabled, kp, ki);
    }

    /// 外側ループ1ティック分の計算
    ///
    /// `position`は今回取得できた位置 [rad]。取得できなかったティックでは
    /// 呼び出さないこと。計算した電流指令 [A] を返します。
    pub fn step<A: Actuator>(&mut self, position: f32, actuator: &mut A) -> f32 {
        let dt = self.dt;
        self.position_response = position;
        let velocity = self.estimator.update(position, dt);

        match self.mode {
            ControlMode::Position => {
                self.velocity_error = self.velocity_command - velocity;
                let pi = self.position_pi.update(self.position_command, position, dt);
                self.acceleration_reference = pi + self.gains.position_kd * self.velocity_error;
            }
            ControlMode::Velocity => {
                self.acceleration_reference = self.velocity_pi.update(self.velocity_command, velocity, dt);
                self.velocity_error = self.velocity_pi.get_error();
            }
            ControlMode::Torque => {
                self.acceleration_reference = self.torque_command / self.model.inertia;
            }
            ControlMode::None => {}
        }

        self.current_command = self.acceleration_reference * self.model.acceleration_to_current();
        self.link.set_current_command(self.current_command);

        if !self.link.current_loop_enabled() {
            self.voltage_reference = self.current_command * self.model.resistance;
            self.link.set_voltage_reference(self.voltage_reference);
            actuator.drive(self.voltage_reference);
        }

        self.current_command
    }

    /// 偏差・積分・電圧指令をクリアし、速度推定を現在位置に合わせ直す
    ///
    /// 制御を再開する前に必ず呼ぶこと。内側ループの積分器にもリセットを要求します。
    pub fn reset(&mut self) {
        self.position_pi.reset();
        self.velocity_pi.reset();
        self.velocity_error = 0.0;
        self.acceleration_reference = 0.0;
        self.current_command = 0.0;
        self.voltage_reference = 0.0;
        self.estimator.reset(self.position_response);

        self.link.set_current_command(0.0);
        self.link.set_voltage_reference(0.0);
        self.link.request_reset();
    }

    /// 位置の原点を変更した後に呼び、応答値と速度推定を`position`に合わせる
    pub fn rezero(&mut self, position: f32) {
        self.position_response = position;
        self.estimator.reset(position);
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    pub fn gains(&self) -> &GainSet {
        &self.gains
    }

    pub fn model(&self) -> &MotorModel {
        &self.model
    }

    pub fn position_response(&self) -> f32 {
        self.position_response
    }

    pub fn velocity_response(&self) -> f32 {
        self.estimator.output()
    }

    pub fn current_command(&self) -> f32 {
        self.current_command
    }

    pub fn state(&self) -> ControllerState {
        ControllerState {
            mode: self.mode,
            position_command: self.position_command,
            velocity_command: self.velocity_command,
            torque_command: self.torque_command,
            position_response: self.position_response,
            velocity_response: self.estimator.output(),
            current_command: self.current_command,
            current_response: self.link.current_response(),
            position_error: self.position_pi.get_error(),
            position_integral: self.position_pi.get_integral(),
            velocity_error: self.velocity_error,
            velocity_integral: self.velocity_pi.get_integral(),
            acceleration_reference: self.acceleration_reference,
            voltage_reference: self.voltage_reference,
        }
    }
}
