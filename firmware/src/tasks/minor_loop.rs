//! マイナーループタスク
//!
//! 20kHz（50μs）で電流を読み、電流PI制御で電圧を出力します。
//! 最優先の割り込みエグゼキュータ上で動作します。
//! 空き時間でノブ（可変抵抗）を1周期に1本ずつ読み取ります。

use dcm_driver::command::Knobs;
use dcm_driver::config::params::current_sense::ADC_MAX;
use dcm_driver::config::{DT_MINOR, MINOR_PERIOD_US};
use dcm_driver::control::CurrentController;
use dcm_driver::current_sense::CurrentSense;
use dcm_driver::schedule::Decimator;
use embassy_stm32::adc::{Adc, AnyAdcChannel};
use embassy_stm32::peripherals;
use embassy_time::{Duration, Ticker};

use crate::fmt::*;
use crate::motor_driver::SharedMotor;
use crate::state::{KNOBS, LOOP_LINK};

/// ノブの本数
pub const KNOB_COUNT: usize = 4;

/// マイナーループタスク（電流制御）
#[embassy_executor::task]
pub async fn minor_loop_task(
    mut adc: Adc<'static, peripherals::ADC1>,
    mut current_pin: AnyAdcChannel<peripherals::ADC1>,
    mut knob_pins: [AnyAdcChannel<peripherals::ADC1>; KNOB_COUNT],
) {
    info!("Minor loop task started ({}us)", MINOR_PERIOD_US);

    let sense = CurrentSense::default();
    let mut controller = CurrentController::new(&LOOP_LINK, DT_MINOR);
    let mut motor = SharedMotor;

    let mut knobs = Knobs::new();
    let mut knob_index = 0usize;

    // デバッグログ用（1秒ごと）
    let mut log_decimator = Decimator::new((1_000_000 / MINOR_PERIOD_US) as u32);

    let mut ticker = Ticker::every(Duration::from_micros(MINOR_PERIOD_US));

    loop {
        ticker.next().await;

        let counts = adc.blocking_read(&mut current_pin);
        let current = sense.current_from_counts(counts);
        controller.tick(current, &mut motor);

        // ノブは1周期1本（4周期で一巡）
        let raw = adc.blocking_read(&mut knob_pins[knob_index]);
        knobs.0[knob_index] = raw as f32 / ADC_MAX as f32;
        knob_index += 1;
        if knob_index == KNOB_COUNT {
            knob_index = 0;
            KNOBS.lock(|k| k.set(knobs));
        }

        if log_decimator.tick() {
            debug!(
                "[Minor] I_cmd={}A, I_res={}A, V_ref={}V",
                LOOP_LINK.current_command(),
                current,
                LOOP_LINK.voltage_reference()
            );
        }
    }
}
