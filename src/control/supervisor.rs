//! 有効/無効と発散の監視
//!
//! サーボスイッチ（レベル）とリセットボタン（立ち上がりエッジ）から
//! 制御の状態を決めます。メジャーループ毎に1回呼び出されます。
//!
//! ```text
//!            SW off→on              発散判定
//! Disabled ───────────▶ Enabled ───────────▶ Diverged
//!     ▲                    │                    │
//!     └──── SW off ────────┘◀── SW on でボタン ──┘
//! ```
//!
//! 発散フラグはボタン操作でのみ解除されます。

use super::divergence::Verdict;

/// スーパーバイザの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SupervisorState {
    /// サーボスイッチOFF
    Disabled,
    /// 制御中
    Enabled,
    /// 発散により停止中（ボタンで復帰）
    Diverged,
}

/// 1ティック分の操作入力
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SupervisorInputs {
    /// サーボスイッチがON
    pub servo_switch_on: bool,
    /// リセットボタンが押されている
    pub reset_button_pressed: bool,
}

/// 1ティックで発生したイベント
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SupervisorEvents {
    /// 制御器のリセットと位置の原点設定が必要
    pub rearm: bool,
    /// ゲイン情報の出力要求（スイッチOFF中のボタン操作）
    pub info_requested: bool,
    /// このティックで発散と判定された
    pub diverged: bool,
}

/// 制御有効化・発散ラッチのステートマシン
#[derive(Debug, Clone)]
pub struct Supervisor {
    enabled: bool,
    diverged: bool,
    last_switch: bool,
    last_button: bool,
}

impl Supervisor {
    /// 起動時の入力で初期化（スイッチがONなら有効状態から開始）
    pub const fn new(initial: SupervisorInputs) -> Self {
        Self {
            enabled: initial.servo_switch_on,
            diverged: false,
            last_switch: initial.servo_switch_on,
            last_button: initial.reset_button_pressed,
        }
    }

    /// 入力を1ティック分処理
    ///
    /// `observe`は有効かつ発散していないティックでのみ呼ばれます。
    pub fn tick(&mut self, inputs: SupervisorInputs, observe: impl FnOnce() -> Verdict) -> SupervisorEvents {
        let mut events = SupervisorEvents::default();

        let switch_rose = inputs.servo_switch_on && !self.last_switch;
        let button_rose = inputs.reset_button_pressed && !self.last_button;
        self.last_switch = inputs.servo_switch_on;
        self.last_button = inputs.reset_button_pressed;

        // スイッチはレベルで判定
        if self.enabled != inputs.servo_switch_on {
            if inputs.servo_switch_on {
                info!("supervisor: servo on");
            } else {
                info!("supervisor: servo off");
            }
        }
        self.enabled = inputs.servo_switch_on;
        if switch_rose {
            events.rearm = true;
        }

        if button_rose {
            if inputs.servo_switch_on {
                if self.diverged {
                    info!("supervisor: divergence cleared");
                    self.diverged = false;
                    events.rearm = true;
                }
            } else {
                debug!("supervisor: info requested");
                events.info_requested = true;
            }
        }

        if self.enabled && !self.diverged && observe() == Verdict::Diverged {
            warn!("supervisor: control diverged, stopping motor");
            self.diverged = true;
            events.diverged = true;
        }

        events
    }

    pub fn state(&self) -> SupervisorState {
        if self.diverged {
            SupervisorState::Diverged
        } else if self.enabled {
            SupervisorState::Enabled
        } else {
            SupervisorState::Disabled
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_diverged(&self) -> bool {
        self.diverged
    }
}
