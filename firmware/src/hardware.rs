//! ハードウェア初期化モジュール
//!
//! クロック設定と割り込みのバインドを集約します。

use embassy_stm32::{bind_interrupts, i2c, peripherals, Config};

// I2C1（AS5600）の割り込みをバインド
bind_interrupts!(pub struct Irqs {
    I2C1_EV => i2c::EventInterruptHandler<peripherals::I2C1>;
    I2C1_ER => i2c::ErrorInterruptHandler<peripherals::I2C1>;
});

/// RCCクロック設定を初期化
///
/// HSI(16MHz) → PLL（÷8 × 100 ÷ 2）で100MHz生成
/// APB1は上限50MHzのため÷2
pub fn create_clock_config() -> Config {
    let mut config = Config::default();
    {
        use embassy_stm32::rcc::{
            AHBPrescaler, APBPrescaler, Pll, PllMul, PllPDiv, PllPreDiv, PllQDiv, PllSource,
            Sysclk,
        };

        config.rcc.hsi = true;
        config.rcc.pll_src = PllSource::HSI;
        config.rcc.pll = Some(Pll {
            prediv: PllPreDiv::DIV8,
            mul: PllMul::MUL100,
            divp: Some(PllPDiv::DIV2),
            divq: Some(PllQDiv::DIV4),
            divr: None,
        });
        config.rcc.ahb_pre = AHBPrescaler::DIV1;
        config.rcc.apb1_pre = APBPrescaler::DIV2;
        config.rcc.apb2_pre = APBPrescaler::DIV1;
        config.rcc.sys = Sysclk::PLL1_P; // システムクロックをPLLに設定
    }
    config
}
