//! AS5600 磁気式アブソリュートエンコーダ（I2C）
//!
//! 12ビットの生角度（RAW ANGLE）を読み出します。起動時に磁石の検出状態を
//! 確認し、フィルタ設定を書き込んでから最初の角度を返します。

use embedded_hal_async::i2c::I2c;

use crate::config::params::encoder::I2C_ADDRESS;

/// レジスタアドレス
pub mod register {
    pub const ZMCO: u8 = 0x00;
    pub const ZPOS: u8 = 0x01;
    pub const MPOS: u8 = 0x03;
    pub const MANG: u8 = 0x05;
    pub const CONF: u8 = 0x07;
    pub const RAW_ANGLE: u8 = 0x0C;
    pub const STATUS: u8 = 0x0B;
    pub const ANGLE: u8 = 0x0E;
    pub const AGC: u8 = 0x1A;
    pub const MAGNITUDE: u8 = 0x1B;
    pub const BURN: u8 = 0xFF;
}

/// STATUSレジスタのビット
const STATUS_MH: u8 = 0x08;
const STATUS_ML: u8 = 0x10;
const STATUS_MD: u8 = 0x20;
const STATUS_MASK: u8 = STATUS_MD | STATUS_ML | STATUS_MH;

/// CONFレジスタの設定値（スローフィルタ x2、ファストフィルタ閾値 1）
pub const DESIRED_CONF: [u8; 2] = [0x07, 0x00];
/// CONF上位バイトの有効ビット
const CONF_HIGH_MASK: u8 = 0x3F;

/// 生角度の有効ビット（12bit）
const RAW_ANGLE_MASK: u16 = 0x0FFF;

/// エンコーダのエラー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncoderError {
    /// I2C転送エラー（リトライ上限到達）
    Bus,
    /// 磁石が検出されない
    MagnetNotDetected,
    /// 磁石が弱すぎる（遠すぎる）
    MagnetTooWeak,
    /// 磁石が強すぎる（近すぎる）
    MagnetTooStrong,
}

/// STATUSレジスタから読んだ磁石の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MagnetStatus {
    Detected,
    NotDetected,
    TooWeak,
    TooStrong,
}

impl MagnetStatus {
    /// MDのみが立っている場合だけ正常
    pub fn from_status(status: u8) -> Self {
        let bits = status & STATUS_MASK;
        if bits == STATUS_MD {
            MagnetStatus::Detected
        } else if bits & STATUS_ML != 0 {
            MagnetStatus::TooWeak
        } else if bits & STATUS_MH != 0 {
            MagnetStatus::TooStrong
        } else {
            MagnetStatus::NotDetected
        }
    }

    pub fn check(self) -> Result<(), EncoderError> {
        match self {
            MagnetStatus::Detected => Ok(()),
            MagnetStatus::NotDetected => Err(EncoderError::MagnetNotDetected),
            MagnetStatus::TooWeak => Err(EncoderError::MagnetTooWeak),
            MagnetStatus::TooStrong => Err(EncoderError::MagnetTooStrong),
        }
    }
}

/// ビッグエンディアンの2バイトから12ビットの生角度を取り出す
#[inline]
pub fn decode_raw_angle(bytes: [u8; 2]) -> u16 {
    u16::from_be_bytes(bytes) & RAW_ANGLE_MASK
}

/// バスの再初期化
///
/// 転送エラー後、次の転送の前に呼ばれます。
#[allow(async_fn_in_trait)]
pub trait BusReset {
    async fn reset(&mut self);
}

/// AS5600ドライバ
pub struct As5600<I> {
    bus: I,
    address: u8,
}

impl<I> As5600<I>
where
    I: I2c + BusReset,
{
    pub fn new(bus: I) -> Self {
        Self {
            bus,
            address: I2C_ADDRESS,
        }
    }

    pub fn release(self) -> I {
        self.bus
    }

    /// STATUSレジスタを読み出す
    pub async fn read_status(&mut self) -> Result<u8, EncoderError> {
        let mut buf = [0u8; 1];
        self.bus
            .write_read(self.address, &[register::STATUS], &mut buf)
            .await
            .map_err(|_| EncoderError::Bus)?;
        Ok(buf[0])
    }

    /// 生角度（0〜4095）を1回読み出す
    pub async fn read_raw_angle(&mut self) -> Result<u16, EncoderError> {
        let mut buf = [0u8; 2];
        self.bus
            .write_read(self.address, &[register::RAW_ANGLE], &mut buf)
            .await
            .map_err(|_| EncoderError::Bus)?;
        Ok(decode_raw_angle(buf))
    }

    /// バスを再初期化
    pub async fn reset_bus(&mut self) {
        self.bus.reset().await;
    }

    /// 起動時の初期化
    ///
    /// 転送エラーの間はバスを再初期化して最初からやり直します
    /// （`retry_limit`が`None`なら無制限）。磁石の異常はリトライせずに
    /// 即座にエラーを返します。成功すると最初の生角度を返します。
    pub async fn initialize(&mut self, retry_limit: Option<u32>) -> Result<u16, EncoderError> {
        let mut attempts: u32 = 0;
        loop {
            match self.try_initialize().await {
                Ok(angle) => {
                    info!("as5600: initialized, raw angle {}", angle);
                    return Ok(angle);
                }
                Err(EncoderError::Bus) => {
                    attempts = attempts.saturating_add(1);
                    if retry_limit.is_some_and(|limit| attempts >= limit) {
                        error!("as5600: no response after {} attempts", attempts);
                        return Err(EncoderError::Bus);
                    }
                    debug!("as5600: bus error, resetting (attempt {})", attempts);
                    self.bus.reset().await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_initialize(&mut self) -> Result<u16, EncoderError> {
        let status = self.read_status().await?;
        MagnetStatus::from_status(status).check()?;

        let mut conf = [0u8; 2];
        self.bus
            .write_read(self.address, &[register::CONF], &mut conf)
            .await
            .map_err(|_| EncoderError::Bus)?;
        conf[0] &= CONF_HIGH_MASK;

        if conf != DESIRED_CONF {
            debug!("as5600: writing CONF");
            self.bus
                .write(
                    self.address,
                    &[register::CONF, DESIRED_CONF[0], DESIRED_CONF[1]],
                )
                .await
                .map_err(|_| EncoderError::Bus)?;
        }

        self.read_raw_angle().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embedded_hal::i2c::{ErrorKind, ErrorType, Operation};
    use std::vec::Vec;

    /// レジスタ配列を持つ模擬AS5600
    struct MockBus {
        registers: [u8; 256],
        /// 先頭から数えてこの回数だけ転送を失敗させる
        failures: u32,
        resets: u32,
        writes: Vec<Vec<u8>>,
        pointer: u8,
    }

    impl MockBus {
        fn new(status: u8, raw_angle: u16) -> Self {
            let mut registers = [0u8; 256];
            registers[register::STATUS as usize] = status;
            let [hi, lo] = raw_angle.to_be_bytes();
            registers[register::RAW_ANGLE as usize] = hi;
            registers[register::RAW_ANGLE as usize + 1] = lo;
            Self {
                registers,
                failures: 0,
                resets: 0,
                writes: Vec::new(),
                pointer: 0,
            }
        }
    }

    impl ErrorType for MockBus {
        type Error = ErrorKind;
    }

    impl I2c for MockBus {
        async fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            assert_eq!(address, 0x36);
            if self.failures > 0 {
                self.failures -= 1;
                return Err(ErrorKind::Bus);
            }
            for op in operations {
                match op {
                    Operation::Write(bytes) => {
                        self.pointer = bytes[0];
                        if bytes.len() > 1 {
                            self.writes.push(bytes.to_vec());
                            for (i, b) in bytes[1..].iter().enumerate() {
                                self.registers[self.pointer as usize + i] = *b;
                            }
                        }
                    }
                    Operation::Read(buf) => {
                        for (i, b) in buf.iter_mut().enumerate() {
                            *b = self.registers[self.pointer as usize + i];
                        }
                    }
                }
            }
            Ok(())
        }
    }

    impl BusReset for MockBus {
        async fn reset(&mut self) {
            self.resets += 1;
        }
    }

    #[test]
    fn test_decode_raw_angle() {
        assert_eq!(decode_raw_angle([0x0F, 0xFF]), 4095);
        assert_eq!(decode_raw_angle([0xF1, 0x23]), 0x123);
    }

    #[test]
    fn test_magnet_status() {
        assert_eq!(MagnetStatus::from_status(0x20), MagnetStatus::Detected);
        assert_eq!(MagnetStatus::from_status(0x27), MagnetStatus::Detected);
        assert_eq!(MagnetStatus::from_status(0x00), MagnetStatus::NotDetected);
        assert_eq!(MagnetStatus::from_status(0x30), MagnetStatus::TooWeak);
        assert_eq!(MagnetStatus::from_status(0x28), MagnetStatus::TooStrong);
    }

    #[test]
    fn test_initialize_writes_conf_once() {
        let mut enc = As5600::new(MockBus::new(0x20, 1234));
        assert_eq!(block_on(enc.initialize(None)), Ok(1234));
        assert_eq!(block_on(enc.initialize(None)), Ok(1234));

        let bus = enc.release();
        // 2回目は一致しているので書き込まない
        assert_eq!(bus.writes, vec![vec![register::CONF, 0x07, 0x00]]);
        assert_eq!(bus.resets, 0);
    }

    #[test]
    fn test_conf_watchdog_bits_ignored() {
        let mut bus = MockBus::new(0x20, 10);
        bus.registers[register::CONF as usize] = 0xC7;
        let mut enc = As5600::new(bus);
        assert_eq!(block_on(enc.initialize(None)), Ok(10));
        assert!(enc.release().writes.is_empty());
    }

    #[test]
    fn test_initialize_retries_bus_errors() {
        let mut bus = MockBus::new(0x20, 77);
        bus.failures = 3;
        let mut enc = As5600::new(bus);
        assert_eq!(block_on(enc.initialize(None)), Ok(77));
        assert_eq!(enc.release().resets, 3);
    }

    #[test]
    fn test_initialize_retry_limit() {
        let mut bus = MockBus::new(0x20, 77);
        bus.failures = 10;
        let mut enc = As5600::new(bus);
        assert_eq!(block_on(enc.initialize(Some(2))), Err(EncoderError::Bus));
    }

    #[test]
    fn test_magnet_fault_is_fatal() {
        let mut enc = As5600::new(MockBus::new(0x00, 0));
        assert_eq!(
            block_on(enc.initialize(None)),
            Err(EncoderError::MagnetNotDetected)
        );
        let bus = enc.release();
        assert_eq!(bus.resets, 0);
        assert!(bus.writes.is_empty());
    }
}
