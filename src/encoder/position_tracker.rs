//! 多回転位置の追跡（角度アンラップ）
//!
//! アブソリュートエンコーダの1回転内の生角度（0〜R-1）から、
//! 境界を跨いだことを検出して無制限の多回転カウントを求めます。
//!
//! # 前提条件
//!
//! 連続する2サンプル間の移動量は1/4回転（R/4カウント）未満であること。
//! これを超えるとラップの方向を誤判定し、累積カウントが壊れます。
//! このモジュールでは検出できないため、サンプリング周期と最大回転速度の
//! 関係は`schedule`のコンパイル時チェックで保証しています。

use core::f32::consts::TAU;

/// 多回転位置トラッカー
#[derive(Debug, Clone)]
pub struct PositionTracker {
    /// 1回転あたりのカウント数 R
    resolution: u16,
    /// 前回の生角度
    previous_sample: u16,
    /// 累積カウント（ラップを除去済み）
    accumulated_count: i64,
    /// 原点オフセット
    offset: i64,
    /// 方向反転フラグ（true: 生角度の増加を負方向として積算）
    inversed: bool,
}

impl PositionTracker {
    /// 現在の生角度を原点として作成
    pub const fn new(resolution: u16, initial_sample: u16) -> Self {
        Self {
            resolution,
            previous_sample: initial_sample,
            accumulated_count: 0,
            offset: 0,
            inversed: false,
        }
    }

    /// 方向反転フラグを設定
    pub fn set_inversed(&mut self, inversed: bool) {
        self.inversed = inversed;
    }

    pub fn is_inversed(&self) -> bool {
        self.inversed
    }

    /// 新しい生角度で累積カウントを更新
    ///
    /// 前回が上位1/4・今回が下位1/4なら正方向、その逆なら負方向に
    /// 境界を跨いだとみなします。
    pub fn update(&mut self, sample: u16) {
        debug_assert!(sample < self.resolution);

        let delta = Self::unwrap_delta(self.previous_sample, sample, self.resolution);
        if self.inversed {
            self.accumulated_count -= delta;
        } else {
            self.accumulated_count += delta;
        }
        self.previous_sample = sample;
    }

    /// 生角度の差分（境界を跨いだ分を補正）
    fn unwrap_delta(previous: u16, now: u16, resolution: u16) -> i64 {
        let r = resolution as i64;
        let prev = previous as i64;
        let now = now as i64;
        let quarter = r / 4;
        let three_quarters = 3 * r / 4;

        if prev > three_quarters && now < quarter {
            now - prev + r
        } else if prev < quarter && now > three_quarters {
            now - prev - r
        } else {
            now - prev
        }
    }

    /// 原点基準の位置 [rad]（多回転）
    pub fn read_position(&self) -> f32 {
        self.counts() as f32 * self.rad_per_count()
    }

    /// 現在位置が`position` [rad] になるよう原点を設定
    ///
    /// 累積カウントは変更しないため、以降の更新もそのまま追従します。
    pub fn set_position(&mut self, position: f32) {
        let counts = libm::round(position as f64 * self.resolution as f64 / core::f64::consts::TAU);
        self.offset = self.accumulated_count - counts as i64;
    }

    /// 原点基準のカウント
    pub fn counts(&self) -> i64 {
        self.accumulated_count - self.offset
    }

    /// 1カウントあたりの角度 [rad]
    pub fn rad_per_count(&self) -> f32 {
        TAU / self.resolution as f32
    }

    pub fn accumulated_count(&self) -> i64 {
        self.accumulated_count
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn previous_sample(&self) -> u16 {
        self.previous_sample
    }

    pub fn resolution(&self) -> u16 {
        self.resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const R: u16 = 4096;

    /// 真の多回転カウントから生角度の列を作って追従させる
    fn track(start: i64, steps: &[i64]) -> (PositionTracker, i64) {
        let wrap = |c: i64| c.rem_euclid(R as i64) as u16;
        let mut tracker = PositionTracker::new(R, wrap(start));
        let mut truth = start;
        for step in steps {
            truth += step;
            tracker.update(wrap(truth));
        }
        (tracker, truth - start)
    }

    #[test]
    fn test_forward_wrap() {
        let mut tracker = PositionTracker::new(R, 4090);
        tracker.update(5);
        assert_eq!(tracker.counts(), 11);
        assert!((tracker.read_position() - 11.0 * TAU / 4096.0).abs() < 1e-6);
    }

    #[test]
    fn test_forward_wrap_inversed() {
        let mut tracker = PositionTracker::new(R, 4090);
        tracker.set_inversed(true);
        tracker.update(5);
        // 方向反転時は同じ移動量で符号のみ逆
        assert_eq!(tracker.counts(), -11);
    }

    #[test]
    fn test_backward_wrap() {
        let mut tracker = PositionTracker::new(R, 5);
        tracker.update(4090);
        assert_eq!(tracker.counts(), -11);
    }

    #[test]
    fn test_multi_turn_forward_and_back() {
        let mut steps = [0i64; 200];
        for (i, s) in steps.iter_mut().enumerate() {
            // 1/4回転未満の移動で正転100回 → 逆転100回
            *s = if i < 100 { 1000 } else { -997 };
        }
        let (tracker, truth) = track(123, &steps);
        assert_eq!(tracker.counts(), truth);
        assert_eq!(truth, 100 * 1000 - 100 * 997);
    }

    #[test]
    fn test_many_rotations() {
        let steps = [1023i64; 4096];
        let (tracker, truth) = track(4000, &steps);
        assert_eq!(tracker.counts(), truth);
        let expected = truth as f32 * TAU / 4096.0;
        assert!((tracker.read_position() - expected).abs() / expected.abs() < 1e-6);
    }

    #[test]
    fn test_set_position_zero() {
        let steps = [700i64; 50];
        let (mut tracker, _) = track(0, &steps);
        assert!(tracker.read_position() > 0.0);

        let accumulated = tracker.accumulated_count();
        tracker.set_position(0.0);
        assert_eq!(tracker.read_position(), 0.0);
        assert_eq!(tracker.accumulated_count(), accumulated);

        // 原点変更後も追従を続ける
        let prev = tracker.previous_sample();
        tracker.update((prev + 100) % R);
        assert_eq!(tracker.counts(), 100);
    }

    #[test]
    fn test_set_position_rounds_to_count() {
        let mut tracker = PositionTracker::new(R, 0);
        tracker.set_position(1.0);
        // 1.0 rad = 651.9 counts
        assert_eq!(tracker.counts(), 652);
        assert!((tracker.read_position() - 1.0).abs() < tracker.rad_per_count());
    }
}
