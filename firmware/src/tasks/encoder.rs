//! エンコーダタスク
//!
//! AS5600の生角度をI2C（DMA）で読み出し、[`ANGLE_CELL`]に書き込みます。
//! 転送エラー時はエラーを通知してバスを再初期化し、次の周期で再試行します。

use dcm_driver::config::MAJOR_PERIOD_US;
use dcm_driver::encoder::{As5600, BusReset};
use embassy_stm32::i2c::{self, I2c};
use embassy_stm32::mode::Async;
use embassy_time::{Duration, Ticker, Timer};
use embedded_hal_async::i2c::{ErrorType, Operation};

use crate::fmt::*;
use crate::state::ANGLE_CELL;

/// 再初期化時の待ち時間 [μs]
const BUS_RESET_DELAY_US: u64 = 100;

/// AS5600を接続したI2Cバス
pub struct EncoderBus {
    i2c: I2c<'static, Async>,
}

impl EncoderBus {
    pub fn new(i2c: I2c<'static, Async>) -> Self {
        Self { i2c }
    }
}

impl ErrorType for EncoderBus {
    type Error = i2c::Error;
}

impl embedded_hal_async::i2c::I2c for EncoderBus {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        match operations {
            [Operation::Write(write), Operation::Read(read)] => {
                self.i2c.write_read(address, write, read).await
            }
            ops => {
                for op in ops {
                    match op {
                        Operation::Write(write) => self.i2c.write(address, write).await?,
                        Operation::Read(read) => self.i2c.read(address, read).await?,
                    }
                }
                Ok(())
            }
        }
    }
}

impl BusReset for EncoderBus {
    async fn reset(&mut self) {
        // ペリフェラルはエラー割り込みで自動的に停止状態に戻るため、
        // ここではバスが解放されるまで待つだけ
        Timer::after(Duration::from_micros(BUS_RESET_DELAY_US)).await;
    }
}

/// エンコーダタスク（メジャーループと同じ周期で角度を取得）
#[embassy_executor::task]
pub async fn encoder_task(mut encoder: As5600<EncoderBus>) {
    info!("Encoder task started");

    let mut ticker = Ticker::every(Duration::from_micros(MAJOR_PERIOD_US));

    loop {
        ticker.next().await;

        match encoder.read_raw_angle().await {
            Ok(angle) => ANGLE_CELL.publish(angle),
            Err(_) => {
                ANGLE_CELL.report_fault();
                encoder.reset_bus().await;
            }
        }
    }
}
