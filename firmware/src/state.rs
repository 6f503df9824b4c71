//! グローバル共有状態管理
//!
//! 制御ループ間はロックなし（アトミック）で、テレメトリ向けの
//! スナップショットはクリティカルセクションのMutexで共有します。

use core::cell::Cell;
use core::sync::atomic::AtomicBool;

use dcm_driver::command::Knobs;
use dcm_driver::config::gains::{CURRENT_KI, CURRENT_KP};
use dcm_driver::encoder::AngleSampleCell;
use dcm_driver::telemetry::TelemetrySnapshot;
use dcm_driver::LoopLink;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

/// メジャーループ ⇔ マイナーループのリンク
pub static LOOP_LINK: LoopLink = LoopLink::new(CURRENT_KP, CURRENT_KI);

/// エンコーダタスク → メジャーループの角度受け渡し
pub static ANGLE_CELL: AngleSampleCell = AngleSampleCell::new();

/// メジャーループ → テレメトリのスナップショット
pub static TELEMETRY: Mutex<CriticalSectionRawMutex, Cell<TelemetrySnapshot>> =
    Mutex::new(Cell::new(TelemetrySnapshot::new()));

/// ゲイン情報の出力要求（スイッチOFF中のボタン操作）
pub static INFO_REQUEST: AtomicBool = AtomicBool::new(false);

/// マイナーループ → メジャーループのノブ読み取り値
pub static KNOBS: Mutex<CriticalSectionRawMutex, Cell<Knobs>> = Mutex::new(Cell::new(Knobs::new()));
