//! アクチュエータ（Hブリッジ）インターフェース
//!
//! 制御側は符号付き電圧指令を出すだけで、方向ピンやPWMへの変換は
//! [`BridgeCommand`]を通してドライバ側で行います。

/// 電圧指令を受け取るモータードライバ
pub trait Actuator {
    /// 符号付き電圧 [V] を出力（符号が回転方向）
    fn drive(&mut self, voltage: f32);

    /// ブレーキ（モーター端子短絡）
    fn stop(&mut self);
}

/// Hブリッジ（TB6612等）の入力ピンとPWMの状態
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BridgeCommand {
    /// IN1ピンのレベル
    pub in1: bool,
    /// IN2ピンのレベル
    pub in2: bool,
    /// Duty比（0.0〜1.0）
    pub duty: f32,
    /// PWM出力を有効にするか
    pub pwm_enabled: bool,
}

impl BridgeCommand {
    /// 電圧指令からピン状態を計算
    ///
    /// 電圧の大きさは電源電圧`supply`でクランプされます。
    /// 正: (IN1, IN2) = (H, L)、0以下: (L, H)
    pub fn from_voltage(voltage: f32, supply: f32) -> Self {
        let forward = voltage > 0.0;
        let magnitude = voltage.abs().min(supply);
        let duty = if supply > 0.0 { magnitude / supply } else { 0.0 };

        Self {
            in1: forward,
            in2: !forward,
            duty,
            pwm_enabled: true,
        }
    }

    /// ショートブレーキ（IN1 = IN2 = H、PWM停止）
    pub const fn brake() -> Self {
        Self {
            in1: true,
            in2: true,
            duty: 0.0,
            pwm_enabled: false,
        }
    }

    /// PWMタイマのコンペア値に変換
    pub fn compare_value(&self, max_duty: u32) -> u32 {
        if !self.pwm_enabled {
            return 0;
        }
        libm::roundf(self.duty * max_duty as f32) as u32
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::Actuator;

    /// アクチュエータ呼び出しの記録
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub enum Call {
        Drive(f32),
        Stop,
    }

    /// テスト用: 呼び出しを記録するだけのアクチュエータ
    #[derive(Debug, Default)]
    pub struct RecordingActuator {
        pub calls: std::vec::Vec<Call>,
    }

    impl RecordingActuator {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn last(&self) -> Option<Call> {
            self.calls.last().copied()
        }

        pub fn clear(&mut self) {
            self.calls.clear();
        }
    }

    impl Actuator for RecordingActuator {
        fn drive(&mut self, voltage: f32) {
            self.calls.push(Call::Drive(voltage));
        }

        fn stop(&mut self) {
            self.calls.push(Call::Stop);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_direction() {
        let cmd = BridgeCommand::from_voltage(2.3, 4.6);
        assert!(cmd.in1);
        assert!(!cmd.in2);
        assert!((cmd.duty - 0.5).abs() < 1e-6);
        assert!(cmd.pwm_enabled);
    }

    #[test]
    fn test_reverse_direction() {
        let cmd = BridgeCommand::from_voltage(-1.15, 4.6);
        assert!(!cmd.in1);
        assert!(cmd.in2);
        assert!((cmd.duty - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_clamped_to_supply() {
        let cmd = BridgeCommand::from_voltage(-20.0, 4.6);
        assert_eq!(cmd.duty, 1.0);
        assert_eq!(cmd.compare_value(1000), 1000);
    }

    #[test]
    fn test_brake() {
        let cmd = BridgeCommand::brake();
        assert!(cmd.in1 && cmd.in2);
        assert_eq!(cmd.compare_value(1000), 0);
    }
}
