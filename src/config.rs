//! Configuration module
//!
//! このモジュールはモーター制御とハードウェアの設定値を提供します。
//! 実行時に変更できるのはゲイン（`GainSet`）のみで、
//! それ以外はコンパイル時の定数です。

pub mod params;

// params.rsから主要な定数を再エクスポート
pub use params::*;

pub use crate::control::{GainSet, MotorModel};
