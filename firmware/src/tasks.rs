//! タスクモジュール
//!
//! 各タスクの実装を分離して管理します。
//!
//! | タスク | 周期 | 実行コンテキスト |
//! |---|---|---|
//! | minor_loop | 50μs | 割り込みエグゼキュータ（SPI5, P6） |
//! | major_loop | 200μs | 割り込みエグゼキュータ（SPI4, P7） |
//! | encoder | 200μs | 割り込みエグゼキュータ（SPI4, P7） |
//! | telemetry | 250ms | スレッドモード |

pub mod encoder;
pub mod major_loop;
pub mod minor_loop;
pub mod telemetry;

// タスク関数を再エクスポート
pub use encoder::{encoder_task, EncoderBus};
pub use major_loop::{major_loop_task, OperatorInputs};
pub use minor_loop::{minor_loop_task, KNOB_COUNT};
pub use telemetry::telemetry_task;
