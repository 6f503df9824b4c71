//! 外側ループ用の位置取得
//!
//! [`AngleSampleCell`]から新しいサンプルを取り出し、[`PositionTracker`]を
//! 更新して位置を返します。エラーはここで止め、呼び出し側には
//! 「今回は位置なし」として伝えます。

use super::position_tracker::PositionTracker;
use super::sample_cell::{AngleSampleCell, SampleStatus};

/// 位置取得のエラー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// 転送が完了していない
    NotReady,
    /// バスエラー（エンコーダタスクが再初期化中）
    BusFault,
}

/// 位置センサー（トラッカー＋サンプルの消費側）
pub struct PositionSensor<'a> {
    cell: &'a AngleSampleCell,
    tracker: PositionTracker,
    fault_count: u32,
}

impl<'a> PositionSensor<'a> {
    pub fn new(cell: &'a AngleSampleCell, tracker: PositionTracker) -> Self {
        Self {
            cell,
            tracker,
            fault_count: 0,
        }
    }

    /// 新しいサンプルがあればトラッカーを更新し、位置 [rad] を返す
    pub fn read_position(&mut self) -> Result<f32, SensorError> {
        match self.cell.take() {
            SampleStatus::Fresh(sample) => {
                self.tracker.update(sample);
                Ok(self.tracker.read_position())
            }
            SampleStatus::Pending => Err(SensorError::NotReady),
            SampleStatus::Fault => {
                self.fault_count = self.fault_count.wrapping_add(1);
                warn!("encoder: bus fault #{}", self.fault_count);
                Err(SensorError::BusFault)
            }
        }
    }

    /// 現在位置を`position` [rad] として原点を設定
    pub fn set_position(&mut self, position: f32) {
        self.tracker.set_position(position);
    }

    /// 最後に更新された位置 [rad]
    pub fn last_position(&self) -> f32 {
        self.tracker.read_position()
    }

    /// 起動以降のバスエラー回数
    pub fn fault_count(&self) -> u32 {
        self.fault_count
    }

    pub fn tracker(&self) -> &PositionTracker {
        &self.tracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_sequence() {
        let cell = AngleSampleCell::new();
        let mut sensor = PositionSensor::new(&cell, PositionTracker::new(4096, 100));

        assert_eq!(sensor.read_position(), Err(SensorError::NotReady));

        cell.publish(164);
        let pos = sensor.read_position().unwrap();
        assert!((pos - 64.0 * sensor.tracker().rad_per_count()).abs() < 1e-6);

        // 同じサンプルで二重に更新しない
        assert_eq!(sensor.read_position(), Err(SensorError::NotReady));
        assert_eq!(sensor.tracker().counts(), 64);
    }

    #[test]
    fn test_fault_keeps_estimate() {
        let cell = AngleSampleCell::new();
        let mut sensor = PositionSensor::new(&cell, PositionTracker::new(4096, 0));
        cell.publish(10);
        sensor.read_position().unwrap();

        cell.report_fault();
        assert_eq!(sensor.read_position(), Err(SensorError::BusFault));
        assert_eq!(sensor.fault_count(), 1);
        assert_eq!(sensor.tracker().counts(), 10);

        // エラーは1回だけ
        assert_eq!(sensor.read_position(), Err(SensorError::NotReady));
    }

    #[test]
    fn test_set_position() {
        let cell = AngleSampleCell::new();
        let mut sensor = PositionSensor::new(&cell, PositionTracker::new(4096, 0));
        cell.publish(2000);
        sensor.read_position().unwrap();

        sensor.set_position(0.0);
        assert_eq!(sensor.last_position(), 0.0);
        cell.publish(2010);
        assert_eq!(sensor.tracker().counts(), 0);
        sensor.read_position().unwrap();
        assert_eq!(sensor.tracker().counts(), 10);
    }
}
