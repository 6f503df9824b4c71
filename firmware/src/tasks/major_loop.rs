//! メジャーループタスク
//!
//! 5kHz（200μs）でスイッチ・ボタンを読み、位置制御と発散監視を行います。
//! マイナーループより低い優先度の割り込みエグゼキュータ上で動作します。

use core::sync::atomic::Ordering;

use dcm_driver::command::ReferenceProfile;
use dcm_driver::config::{DT_MAJOR, MAJOR_PERIOD_US};
use dcm_driver::control::{GainSet, SupervisorInputs, SupervisorState};
use dcm_driver::schedule::{Decimator, MAJOR_TICKS_PER_TELEMETRY};
use dcm_driver::MajorLoop;
use embassy_stm32::gpio::{Input, Output};
use embassy_time::{Duration, Ticker};

use crate::fmt::*;
use crate::motor_driver::SharedMotor;
use crate::state::{INFO_REQUEST, KNOBS, TELEMETRY};

/// スナップショットの更新間隔（テレメトリ1周期に10回）
const SNAPSHOT_DECIMATION: u32 = MAJOR_TICKS_PER_TELEMETRY / 10;

/// スイッチとボタン
pub struct OperatorInputs {
    /// SVONスイッチ（アクティブHigh）
    pub servo_switch: Input<'static>,
    /// SYSボタン（アクティブLow）
    pub sys_button: Input<'static>,
}

impl OperatorInputs {
    pub fn read(&self) -> SupervisorInputs {
        SupervisorInputs {
            servo_switch_on: self.servo_switch.is_high(),
            reset_button_pressed: self.sys_button.is_low(),
        }
    }
}

/// メジャーループタスク（位置制御＋監視）
#[embassy_executor::task]
pub async fn major_loop_task(
    mut major: MajorLoop<'static>,
    inputs: OperatorInputs,
    mut sys_led: Output<'static>,
) {
    info!("Major loop task started ({}us)", MAJOR_PERIOD_US);

    let base_gains = GainSet::default();
    let mut profile = ReferenceProfile::new();
    let mut motor = SharedMotor;

    let mut snapshot_decimator = Decimator::new(SNAPSHOT_DECIMATION);
    // デバッグログ用（1秒ごと）
    let mut log_decimator = Decimator::new((1_000_000 / MAJOR_PERIOD_US) as u32);
    let mut last_state = major.state();

    let mut ticker = Ticker::every(Duration::from_micros(MAJOR_PERIOD_US));

    loop {
        ticker.next().await;

        let knobs = KNOBS.lock(|k| k.get());
        let tick = major.tick_with(inputs.read(), &mut motor, |motion| {
            knobs.apply(profile.sample(), &base_gains, motion);
            profile.advance(DT_MAJOR);
        });

        sys_led.set_level((tick.state == SupervisorState::Diverged).into());

        if tick.state != last_state {
            info!("[Major] state changed: {}", tick.state);
            last_state = tick.state;
        }

        if tick.events.info_requested {
            TELEMETRY.lock(|t| t.set(major.snapshot()));
            INFO_REQUEST.store(true, Ordering::Release);
        } else if snapshot_decimator.tick() {
            TELEMETRY.lock(|t| t.set(major.snapshot()));
        }

        if log_decimator.tick() {
            let state = major.motion().state();
            debug!(
                "[Major] pos_cmd={}, pos_res={}, vel_res={}, I_cmd={}",
                state.position_command,
                state.position_response,
                state.velocity_response,
                state.current_command
            );
        }
    }
}
