//! DCモーターのカスケード制御コア
//!
//! 位置・速度・トルク制御（外側ループ）と電流制御（内側ループ）、
//! 多回転エンコーダの角度アンラップ、発散監視、スイッチによる有効化を
//! ハードウェアから切り離して実装しています。
//! ペリフェラルとタスクの配線は`firmware/`パッケージで行います。
#![cfg_attr(not(test), no_std)]

// fmtは他のモジュールより先に宣言すること（マクロのスコープ）
mod fmt;

pub mod actuator;
pub mod command;
pub mod config;
pub mod control;
pub mod current_sense;
pub mod encoder;
pub mod schedule;
pub mod telemetry;

pub use actuator::{Actuator, BridgeCommand};
pub use control::{ControlMode, LoopLink, MajorLoop};
