//! エンコーダタスクからメジャーループへの角度受け渡し
//!
//! I2C転送を行うタスク（生産者）が最新の生角度とバスエラーを書き込み、
//! メジャーループ（消費者）がティック毎に1回取り出します。
//! 単一生産者・単一消費者の最新値セルで、アトミック操作のみを使用します。

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// 未読サンプルを示すビット
const FRESH: u32 = 1 << 31;
const SAMPLE_MASK: u32 = 0xFFFF;

/// 取り出し結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleStatus {
    /// 前回以降に届いた新しいサンプル
    Fresh(u16),
    /// 新しいサンプルなし（転送中）
    Pending,
    /// バスエラーが報告された
    Fault,
}

/// 最新値セル
pub struct AngleSampleCell {
    sample: AtomicU32,
    fault: AtomicBool,
}

impl AngleSampleCell {
    pub const fn new() -> Self {
        Self {
            sample: AtomicU32::new(0),
            fault: AtomicBool::new(false),
        }
    }

    /// 生産者: 完了したサンプルを書き込む（未読の古い値は上書き）
    pub fn publish(&self, sample: u16) {
        self.sample.store(FRESH | sample as u32, Ordering::Release);
    }

    /// 生産者: バスエラーを通知（消費者が取り出すまで保持）
    pub fn report_fault(&self) {
        self.fault.store(true, Ordering::Release);
    }

    /// 消費者: 最新の状態を取り出す
    ///
    /// エラーとサンプルの両方が未読の場合はエラーを先に返し、
    /// サンプルは次回に残します。
    pub fn take(&self) -> SampleStatus {
        if self.fault.swap(false, Ordering::AcqRel) {
            return SampleStatus::Fault;
        }

        let value = self.sample.fetch_and(!FRESH, Ordering::AcqRel);
        if value & FRESH != 0 {
            SampleStatus::Fresh((value & SAMPLE_MASK) as u16)
        } else {
            SampleStatus::Pending
        }
    }

    /// 最後に書き込まれたサンプル（既読かどうかに関わらず）
    pub fn latest(&self) -> u16 {
        (self.sample.load(Ordering::Acquire) & SAMPLE_MASK) as u16
    }
}

impl Default for AngleSampleCell {
    fn default() -> Self {
        Self::new()
    }
}
