//! 電流制御（内側ループ）
//!
//! マイナーループ周期で実行されます。メジャーループが書いた電流指令を
//! [`LoopLink`]から読み、PI制御で電圧指令を計算してアクチュエータへ出力します。

use super::link::LoopLink;
use super::pi_controller::PiController;
use crate::actuator::Actuator;

/// 電流PIコントローラ
pub struct CurrentController<'a> {
    link: &'a LoopLink,
    pi: PiController,
    dt: f32,
    seen_epoch: u32,
}

impl<'a> CurrentController<'a> {
    pub fn new(link: &'a LoopLink, dt: f32) -> Self {
        let (kp, ki) = link.current_gains();
        Self {
            link,
            pi: PiController::new(kp, ki),
            dt,
            seen_epoch: link.reset_epoch(),
        }
    }

    /// 1ティック分の電流制御
    ///
    /// `current_response`は電流センスから読んだ値 [A]。
    /// 出力した電圧指令を返します。制御無効時や電流ループ無効時は`None`で、
    /// アクチュエータには触れません（後者はメジャーループが直接出力済み）。
    pub fn tick<A: Actuator>(&mut self, current_response: f32, actuator: &mut A) -> Option<f32> {
        let epoch = self.link.reset_epoch();
        if epoch != self.seen_epoch {
            self.seen_epoch = epoch;
            self.pi.reset();
        }

        self.link.set_current_response(current_response);

        if !self.link.control_enabled() || !self.link.current_loop_enabled() {
            return None;
        }

        let (kp, ki) = self.link.current_gains();
        self.pi.set_gains(kp, ki);

        let voltage = self
            .pi
            .update(self.link.current_command(), current_response, self.dt);
        self.link.set_voltage_reference(voltage);
        actuator.drive(voltage);
        Some(voltage)
    }

    /// 電流偏差 [A]
    pub fn error(&self) -> f32 {
        self.pi.get_error()
    }

    /// 電流偏差の積分 [A·s]
    pub fn integral(&self) -> f32 {
        self.pi.get_integral()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::mock::{Call, RecordingActuator};

    const DT: f32 = 0.00005;

    #[test]
    fn test_disabled_does_not_drive() {
        let link = LoopLink::new(0.5, 10.0);
        let mut ctrl = CurrentController::new(&link, DT);
        let mut act = RecordingActuator::new();

        link.set_current_command(1.0);
        assert_eq!(ctrl.tick(0.7, &mut act), None);
        assert!(act.calls.is_empty());
        // 応答値は無効時も更新
        assert_eq!(link.current_response(), 0.7);
    }

    #[test]
    fn test_pi_output() {
        let link = LoopLink::new(0.5, 10.0);
        link.set_control_enabled(true);
        let mut ctrl = CurrentController::new(&link, DT);
        let mut act = RecordingActuator::new();

        link.set_current_command(1.0);
        let v = ctrl.tick(0.2, &mut act).unwrap();
        // 0.5 * 0.8 + 10 * 0.8 * 50e-6
        let expected = 0.5 * 0.8 + 10.0 * 0.8 * DT;
        assert!((v - expected).abs() < 1e-6);
        assert_eq!(act.last(), Some(Call::Drive(v)));
        assert_eq!(link.voltage_reference(), v);
    }

    #[test]
    fn test_bypass_leaves_actuator_alone() {
        let link = LoopLink::new(0.5, 10.0);
        link.set_control_enabled(true);
        link.configure_current_loop(false, 0.0, 0.0);
        let mut ctrl = CurrentController::new(&link, DT);
        let mut act = RecordingActuator::new();

        link.set_current_command(1.0);
        assert_eq!(ctrl.tick(0.3, &mut act), None);
        assert!(act.calls.is_empty());
        assert_eq!(link.current_response(), 0.3);
    }

    #[test]
    fn test_reset_request_clears_integrator() {
        let link = LoopLink::new(0.0, 10.0);
        link.set_control_enabled(true);
        let mut ctrl = CurrentController::new(&link, DT);
        let mut act = RecordingActuator::new();

        link.set_current_command(1.0);
        for _ in 0..100 {
            ctrl.tick(0.0, &mut act);
        }
        assert!(ctrl.integral() > 0.0);

        link.request_reset();
        link.set_current_command(0.0);
        let v = ctrl.tick(0.0, &mut act).unwrap();
        assert_eq!(v, 0.0);
        assert_eq!(ctrl.integral(), 0.0);
    }
}
