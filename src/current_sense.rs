//! 電流センスアンプ（INA181）の変換
//!
//! ```text
//! I = -(V_pin - V_offset) / (Gain * R_shunt)
//! ```
//!
//! シャントの向きの都合で、アンプ出力の増加がモーター電流の負方向に対応します。

use crate::config::params::current_sense::{
    ADC_MAX, ADC_VREF, AMP_GAIN, OFFSET_VOLTAGE, SHUNT_RESISTANCE,
};

/// ADC値 [count] をピン電圧 [V] に変換
#[inline]
pub fn adc_counts_to_voltage(counts: u16) -> f32 {
    counts as f32 * ADC_VREF / ADC_MAX as f32
}

/// 電流センスの変換パラメータ
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentSense {
    /// 電流0のときのアンプ出力 [V]
    offset_voltage: f32,
    /// 電圧 [V] → 電流 [A] の係数（1 / (Gain * R_shunt)）
    amps_per_volt: f32,
}

impl CurrentSense {
    pub const fn new(offset_voltage: f32, gain: f32, shunt_resistance: f32) -> Self {
        Self {
            offset_voltage,
            amps_per_volt: 1.0 / (gain * shunt_resistance),
        }
    }

    /// アンプ出力電圧 [V] から電流 [A] を計算
    #[inline]
    pub fn current_from_voltage(&self, voltage: f32) -> f32 {
        -(voltage - self.offset_voltage) * self.amps_per_volt
    }

    /// ADC値から電流 [A] を計算
    #[inline]
    pub fn current_from_counts(&self, counts: u16) -> f32 {
        self.current_from_voltage(adc_counts_to_voltage(counts))
    }

    /// オフセット電圧を設定（停止中に測定した値で補正する場合）
    pub fn set_offset_voltage(&mut self, offset_voltage: f32) {
        self.offset_voltage = offset_voltage;
    }

    pub fn offset_voltage(&self) -> f32 {
        self.offset_voltage
    }
}

impl Default for CurrentSense {
    fn default() -> Self {
        Self::new(OFFSET_VOLTAGE, AMP_GAIN, SHUNT_RESISTANCE)
    }
}
