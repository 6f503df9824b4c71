//! テレメトリタスク
//!
//! 250ms周期でUART（USART2, 115200bps）に指令値と応答値を送信します。
//! スレッドモード（最低優先度）で動作します。

use core::sync::atomic::Ordering;

use dcm_driver::config::TELEMETRY_PERIOD_MS;
use dcm_driver::telemetry::{format_fault, format_info, format_response, Line};
use embassy_stm32::mode::Async;
use embassy_stm32::usart::UartTx;
use embassy_time::{Duration, Ticker};

use crate::fmt::*;
use crate::state::{INFO_REQUEST, TELEMETRY};

async fn send(uart: &mut UartTx<'static, Async>, line: &Line) {
    if uart.write(line.as_bytes()).await.is_err() {
        warn!("[Telemetry] UART write failed");
    }
}

/// テレメトリタスク
#[embassy_executor::task]
pub async fn telemetry_task(mut uart: UartTx<'static, Async>) {
    info!("Telemetry task started ({}ms)", TELEMETRY_PERIOD_MS);

    let mut reported_faults = 0u32;
    let mut ticker = Ticker::every(Duration::from_millis(TELEMETRY_PERIOD_MS));

    loop {
        ticker.next().await;

        let snapshot = TELEMETRY.lock(|t| t.get());

        if INFO_REQUEST.swap(false, Ordering::AcqRel) {
            send(&mut uart, &format_info(&snapshot)).await;
        }

        if let Some(line) = format_fault(&snapshot, reported_faults) {
            reported_faults = snapshot.bus_faults;
            send(&mut uart, &line).await;
        }

        if let Some(line) = format_response(&snapshot) {
            send(&mut uart, &line).await;
        }
    }
}
