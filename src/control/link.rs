//! メジャーループとマイナーループ間の共有データ
//!
//! 2つのループは異なる優先度で動作し、マイナーループはメジャーループを
//! 割り込むことができます。共有するのは単一ワードの値だけで、
//! 各フィールドの書き込み側は常に一方のループに固定されています。
//!
//! | フィールド | 書き込み | 読み出し |
//! |---|---|---|
//! | `current_command` | メジャー | マイナー |
//! | `current_response` | マイナー | テレメトリ |
//! | `voltage_reference` | 実際に電圧を出力したループ | メジャー（発散監視） |
//! | `control_enabled` | メジャー | マイナー |
//! | 電流ループ設定 | 初期化／メジャー | マイナー |
//! | `reset_epoch` | メジャー | マイナー |
//!
//! ロックは使用しません。読み出しが最大1周期古くなることは許容範囲です。

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// アトミックに読み書きできるf32（ビット列をAtomicU32に格納）
pub struct SharedF32 {
    bits: AtomicU32,
}

impl SharedF32 {
    /// `value`のビット列で初期化（constで使えるよう`to_bits`を使用）
    pub const fn new(value: f32) -> Self {
        Self {
            bits: AtomicU32::new(value.to_bits()),
        }
    }

    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn store(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// ループ間リンク
pub struct LoopLink {
    current_command: SharedF32,
    current_response: SharedF32,
    voltage_reference: SharedF32,
    control_enabled: AtomicBool,
    current_loop_enabled: AtomicBool,
    current_kp: SharedF32,
    current_ki: SharedF32,
    reset_epoch: AtomicU32,
}

impl LoopLink {
    pub const fn new(current_kp: f32, current_ki: f32) -> Self {
        Self {
            current_command: SharedF32::new(0.0),
            current_response: SharedF32::new(0.0),
            voltage_reference: SharedF32::new(0.0),
            control_enabled: AtomicBool::new(false),
            current_loop_enabled: AtomicBool::new(true),
            current_kp: SharedF32::new(current_kp),
            current_ki: SharedF32::new(current_ki),
            reset_epoch: AtomicU32::new(0),
        }
    }

    /// 電流指令 [A]
    pub fn current_command(&self) -> f32 {
        self.current_command.load()
    }

    pub fn set_current_command(&self, current: f32) {
        self.current_command.store(current);
    }

    /// 電流応答 [A]（最後にマイナーループが読んだ値）
    pub fn current_response(&self) -> f32 {
        self.current_response.load()
    }

    pub fn set_current_response(&self, current: f32) {
        self.current_response.store(current);
    }

    /// 最後に出力した電圧指令 [V]
    pub fn voltage_reference(&self) -> f32 {
        self.voltage_reference.load()
    }

    pub fn set_voltage_reference(&self, voltage: f32) {
        self.voltage_reference.store(voltage);
    }

    /// 制御有効フラグ（無効時はマイナーループも出力しない）
    pub fn control_enabled(&self) -> bool {
        self.control_enabled.load(Ordering::Acquire)
    }

    pub fn set_control_enabled(&self, enabled: bool) {
        self.control_enabled.store(enabled, Ordering::Release);
    }

    /// 電流ループ有効フラグ（無効時はメジャーループが直接電圧を出力）
    pub fn current_loop_enabled(&self) -> bool {
        self.current_loop_enabled.load(Ordering::Acquire)
    }

    /// 電流ループの有効/無効とゲインを設定
    ///
    /// 無効化する場合、ゲインは変更しません。
    pub fn configure_current_loop(&self, enabled: bool, kp: f32, ki: f32) {
        if enabled {
            self.current_kp.store(kp);
            self.current_ki.store(ki);
        }
        self.current_loop_enabled.store(enabled, Ordering::Release);
    }

    /// 電流ループのゲイン (Kp, Ki)
    pub fn current_gains(&self) -> (f32, f32) {
        (self.current_kp.load(), self.current_ki.load())
    }

    /// マイナーループへ状態リセットを要求
    pub fn request_reset(&self) {
        self.reset_epoch.fetch_add(1, Ordering::AcqRel);
    }

    /// リセット要求の通し番号
    pub fn reset_epoch(&self) -> u32 {
        self.reset_epoch.load(Ordering::Acquire)
    }
}
