//! デモ用の指令値プロファイルと調整ノブ
//!
//! 2.5秒周期で以下を繰り返します。
//!
//! | 時間 [s] | 位置指令 | 速度指令 |
//! |---|---|---|
//! | 0.0 - 1.0 | sin(2πt) | 2π cos(2πt) |
//! | 1.0 - 1.5 | 0 | 0 |
//! | 1.5 - 2.0 | 1 | 0 |
//! | 2.0 - 2.5 | 0 | 0 |
//!
//! 振幅と位置制御ゲインは4つのアナログノブ（0〜1）で調整します。

use core::f32::consts::TAU;

use crate::control::{GainSet, MotionController};

/// プロファイルの周期 [s]
pub const PROFILE_PERIOD_S: f32 = 2.5;

/// 正弦波の周波数 [Hz]
const SINE_FREQUENCY_HZ: f32 = 1.0;

/// i32位相（1回転 = 2^32）への変換係数
const TURNS_TO_PHASE: f32 = 4_294_967_296.0;
const I32_TO_F32: f32 = 1.0 / 2_147_483_648.0;

/// 位置・速度指令の組
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Setpoint {
    /// 位置指令 [rad]
    pub position: f32,
    /// 速度指令 [rad/s]
    pub velocity: f32,
}

impl Setpoint {
    pub fn scaled(self, amplitude: f32) -> Self {
        Self {
            position: self.position * amplitude,
            velocity: self.velocity * amplitude,
        }
    }
}

/// 時間で進む周期プロファイル
#[derive(Debug, Clone)]
pub struct ReferenceProfile {
    time: f32,
}

impl ReferenceProfile {
    pub const fn new() -> Self {
        Self { time: 0.0 }
    }

    /// 時間を`dt` [s] 進める（周期で折り返す）
    pub fn advance(&mut self, dt: f32) {
        self.time = libm::fmodf(self.time + dt, PROFILE_PERIOD_S);
    }

    pub fn reset(&mut self) {
        self.time = 0.0;
    }

    /// 周期内の時間 [s]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// 現在時刻の指令値（振幅1）
    pub fn sample(&self) -> Setpoint {
        Self::at(self.time)
    }

    /// 周期内時間`t` [s] での指令値
    pub fn at(t: f32) -> Setpoint {
        if t < 1.0 {
            let (cos, sin) = cossin_turns(SINE_FREQUENCY_HZ * t);
            Setpoint {
                position: sin,
                velocity: TAU * SINE_FREQUENCY_HZ * cos,
            }
        } else if t < 1.5 {
            Setpoint::default()
        } else if t < 2.0 {
            Setpoint {
                position: 1.0,
                velocity: 0.0,
            }
        } else {
            Setpoint::default()
        }
    }
}

impl Default for ReferenceProfile {
    fn default() -> Self {
        Self::new()
    }
}

/// 回転数（1.0 = 1回転）から(cos, sin)を計算
#[inline]
fn cossin_turns(turns: f32) -> (f32, f32) {
    let frac = turns - libm::floorf(turns);
    // [0, 1) を i32 の全範囲に対応させる（2^31以上は負側に折り返す）
    let phase = (frac * TURNS_TO_PHASE) as u64 as u32 as i32;
    let (cos, sin) = idsp::cossin(phase);
    (cos as f32 * I32_TO_F32, sin as f32 * I32_TO_F32)
}

/// 4つのアナログノブ（0.0〜1.0）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Knobs(pub [f32; 4]);

impl Knobs {
    pub const fn new() -> Self {
        Self([0.0; 4])
    }

    /// 振幅（0.1 + ノブ1）
    pub fn amplitude(&self) -> f32 {
        0.1 + self.0[0]
    }

    /// 位置制御ゲイン (Kp, Ki, Kd)：基準値 × (0.5 + ノブ2〜4)
    pub fn position_gains(&self, base: &GainSet) -> (f32, f32, f32) {
        (
            (0.5 + self.0[1]) * base.position_kp,
            (0.5 + self.0[2]) * base.position_ki,
            (0.5 + self.0[3]) * base.position_kd,
        )
    }

    /// プロファイルの指令値とノブのゲインで位置制御モードを設定
    pub fn apply(&self, setpoint: Setpoint, base: &GainSet, motion: &mut MotionController<'_>) {
        let target = setpoint.scaled(self.amplitude());
        let (kp, ki, kd) = self.position_gains(base);
        motion.set_position_mode(target.position, target.velocity, kp, ki, kd);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_segments() {
        let s = ReferenceProfile::at(0.25);
        assert!((s.position - 1.0).abs() < 1e-4);
        assert!(s.velocity.abs() < 1e-3);

        let s = ReferenceProfile::at(0.0);
        assert!(s.position.abs() < 1e-4);
        assert!((s.velocity - TAU).abs() < 1e-3);

        let s = ReferenceProfile::at(0.75);
        assert!((s.position + 1.0).abs() < 1e-4);

        assert_eq!(ReferenceProfile::at(1.2), Setpoint::default());
        assert_eq!(
            ReferenceProfile::at(1.7),
            Setpoint {
                position: 1.0,
                velocity: 0.0
            }
        );
        assert_eq!(ReferenceProfile::at(2.2), Setpoint::default());
    }

    #[test]
    fn test_profile_wraps() {
        let mut profile = ReferenceProfile::new();
        for _ in 0..3 {
            profile.advance(1.0);
        }
        assert!((profile.time() - 0.5).abs() < 1e-6);
        profile.reset();
        assert_eq!(profile.time(), 0.0);
    }

    #[test]
    fn test_cossin_matches_libm() {
        for k in 0..100 {
            let t = k as f32 / 100.0;
            let (c, s) = cossin_turns(t);
            assert!((c - libm::cosf(TAU * t)).abs() < 1e-4);
            assert!((s - libm::sinf(TAU * t)).abs() < 1e-4);
        }
    }

    #[test]
    fn test_knobs() {
        let base = GainSet::default();
        let knobs = Knobs([0.4, 0.5, 0.0, 1.0]);
        assert!((knobs.amplitude() - 0.5).abs() < 1e-6);
        let (kp, ki, kd) = knobs.position_gains(&base);
        assert_eq!(kp, 4900.0);
        assert_eq!(ki, 3000.0);
        assert_eq!(kd, 210.0);
    }
}
