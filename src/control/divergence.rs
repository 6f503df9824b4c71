//! 電圧飽和の継続による発散検知
//!
//! メジャーループ毎に電圧指令の飽和を観測し、飽和が閾値時間続いたら
//! 発散と判定します。ステップ応答中などの一時的な飽和は許容されます。

use crate::config::DIVERGENCE_THRESHOLD_MS;
use crate::schedule::ms_to_major_ticks;

/// 発散判定の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Verdict {
    Stable,
    Diverged,
}

/// デバウンス付き飽和検知器
#[derive(Debug, Clone)]
pub struct DivergenceMonitor {
    is_saturated: bool,
    saturated_ticks: u32,
    threshold_ticks: u32,
}

impl DivergenceMonitor {
    /// `threshold_ticks`回連続で飽和したら発散
    pub const fn new(threshold_ticks: u32) -> Self {
        Self {
            is_saturated: false,
            saturated_ticks: 0,
            threshold_ticks,
        }
    }

    /// 閾値を時間 [ms] で指定（メジャーループ周期で換算）
    pub const fn from_duration_ms(ms: u32) -> Self {
        Self::new(ms_to_major_ticks(ms))
    }

    /// 電圧指令を1ティック分観測
    ///
    /// 飽和していなければカウンタは0に戻ります。
    /// 発散判定を返したティックでもカウンタは0に戻ります。
    pub fn observe(&mut self, voltage_ref: f32, voltage_limit: f32) -> Verdict {
        self.is_saturated = voltage_ref.abs() > voltage_limit;
        if !self.is_saturated {
            self.saturated_ticks = 0;
            return Verdict::Stable;
        }

        self.saturated_ticks += 1;
        if self.saturated_ticks >= self.threshold_ticks {
            self.saturated_ticks = 0;
            Verdict::Diverged
        } else {
            Verdict::Stable
        }
    }

    /// カウンタをクリア
    pub fn clear(&mut self) {
        self.is_saturated = false;
        self.saturated_ticks = 0;
    }

    pub fn is_saturated(&self) -> bool {
        self.is_saturated
    }

    pub fn saturated_ticks(&self) -> u32 {
        self.saturated_ticks
    }

    pub fn threshold_ticks(&self) -> u32 {
        self.threshold_ticks
    }
}

impl Default for DivergenceMonitor {
    fn default() -> Self {
        Self::from_duration_ms(DIVERGENCE_THRESHOLD_MS)
    }
}
