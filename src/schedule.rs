//! マルチレート実行タイミング
//!
//! 3つの周期タスクの周期と優先度の関係を定義します。
//!
//! | タスク | 周期 | 優先度 |
//! |---|---|---|
//! | マイナーループ（電流制御） | 50μs | 最高 |
//! | メジャーループ（位置・速度制御＋監視） | 200μs | 中 |
//! | テレメトリ | 250ms | 最低 |
//!
//! 擬似微分と積分器はメジャー/マイナー周期に合わせて調整されているため、
//! 周期比は変更しないこと。

use core::f32::consts::TAU;

use crate::config::{
    DT_MAJOR, DT_MINOR, MAJOR_PERIOD_US, MAX_MOTOR_SPEED_RAD_S, MINOR_PERIOD_US,
    TELEMETRY_PERIOD_MS,
};

/// 周期タスクの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoopRate {
    /// 電流制御ループ
    Minor,
    /// 位置・速度制御ループと監視
    Major,
    /// UARTテレメトリ
    Telemetry,
}

impl LoopRate {
    /// 周期 [μs]
    pub const fn period_us(self) -> u64 {
        match self {
            LoopRate::Minor => MINOR_PERIOD_US,
            LoopRate::Major => MAJOR_PERIOD_US,
            LoopRate::Telemetry => TELEMETRY_PERIOD_MS * 1_000,
        }
    }

    /// サンプリング時間 [s]
    pub fn dt(self) -> f32 {
        match self {
            LoopRate::Minor => DT_MINOR,
            LoopRate::Major => DT_MAJOR,
            LoopRate::Telemetry => self.period_us() as f32 / 1_000_000.0,
        }
    }

    /// 相対優先度（大きいほど優先）
    pub const fn priority(self) -> u8 {
        match self {
            LoopRate::Minor => 2,
            LoopRate::Major => 1,
            LoopRate::Telemetry => 0,
        }
    }
}

/// メジャーループ1周期あたりのマイナーループ実行回数
pub const MINOR_TICKS_PER_MAJOR: u32 = (MAJOR_PERIOD_US / MINOR_PERIOD_US) as u32;

/// テレメトリ1周期あたりのメジャーループ実行回数
pub const MAJOR_TICKS_PER_TELEMETRY: u32 = (TELEMETRY_PERIOD_MS * 1_000 / MAJOR_PERIOD_US) as u32;

const _: () = {
    assert!(
        MAJOR_PERIOD_US % MINOR_PERIOD_US == 0,
        "major period must be a multiple of the minor period"
    );
    assert!(
        (TELEMETRY_PERIOD_MS * 1_000) % MAJOR_PERIOD_US == 0,
        "telemetry period must be a multiple of the major period"
    );
    // エンコーダのアンラップはサンプル間の移動量が1/4回転未満であることが前提
    assert!(
        MAX_MOTOR_SPEED_RAD_S * (MAJOR_PERIOD_US as f32 / 1_000_000.0) < TAU / 4.0,
        "motor can move a quarter turn between two encoder samples"
    );
};

/// ミリ秒をメジャーループのティック数に変換
pub const fn ms_to_major_ticks(ms: u32) -> u32 {
    ((ms as u64 * 1_000) / MAJOR_PERIOD_US) as u32
}

/// 一定回数ごとに1回だけ`true`を返すカウンタ
///
/// 高速ループ内の低頻度ログやスナップショット更新に使用します。
#[derive(Debug, Clone)]
pub struct Decimator {
    period: u32,
    count: u32,
}

impl Decimator {
    pub const fn new(period: u32) -> Self {
        Self { period, count: 0 }
    }

    /// カウンタを進め、周期に達したら`true`
    pub fn tick(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.period {
            self.count = 0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_ratios() {
        assert_eq!(MINOR_TICKS_PER_MAJOR, 4);
        assert_eq!(MAJOR_TICKS_PER_TELEMETRY, 1250);
        assert!(LoopRate::Minor.priority() > LoopRate::Major.priority());
        assert!(LoopRate::Major.priority() > LoopRate::Telemetry.priority());
    }

    #[test]
    fn test_divergence_threshold_ticks() {
        assert_eq!(ms_to_major_ticks(300), 1500);
        assert_eq!(ms_to_major_ticks(1), 5);
    }

    #[test]
    fn test_dt() {
        assert!((LoopRate::Minor.dt() - 0.000050).abs() < 1e-9);
        assert!((LoopRate::Major.dt() - 0.000200).abs() < 1e-9);
        assert!((LoopRate::Telemetry.dt() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_decimator() {
        let mut d = Decimator::new(3);
        assert!(!d.tick());
        assert!(!d.tick());
        assert!(d.tick());
        assert!(!d.tick());
    }
}
