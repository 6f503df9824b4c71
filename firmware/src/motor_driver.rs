//! モータードライバー抽象化レイヤー
//!
//! TB6612のPWM（TIM3 CH2）と方向ピン（AIN1/AIN2）を隠蔽し、
//! 制御側には符号付き電圧指令のインターフェースを提供します。
//! ドライバはマイナーループとメジャーループの両方から使われるため、
//! クリティカルセクションのMutexで共有します。

use core::cell::RefCell;

use dcm_driver::config::MOTOR_SUPPLY_VOLTAGE;
use dcm_driver::{Actuator, BridgeCommand};
use embassy_stm32::{
    gpio::Output,
    peripherals,
    timer::simple_pwm::SimplePwm,
};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

/// DCモータードライバー（TB6612 Aチャネル）
pub struct MotorDriver {
    pwm: SimplePwm<'static, peripherals::TIM3>,
    ain1: Output<'static>,
    ain2: Output<'static>,
    max_duty: u32,
}

impl MotorDriver {
    /// 新しいモータードライバーを作成（ブレーキ状態で開始）
    ///
    /// # 引数
    /// * `pwm` - PWMペリフェラル（TIM3、CH2のみ使用）
    /// * `ain1` - 方向ピン1
    /// * `ain2` - 方向ピン2
    pub fn new(
        mut pwm: SimplePwm<'static, peripherals::TIM3>,
        ain1: Output<'static>,
        ain2: Output<'static>,
    ) -> Self {
        let max_duty = pwm.ch2().max_duty_cycle() as u32;
        let mut driver = Self {
            pwm,
            ain1,
            ain2,
            max_duty,
        };
        driver.apply(&BridgeCommand::brake());
        driver
    }

    /// ピン状態とDutyを反映
    pub fn apply(&mut self, command: &BridgeCommand) {
        self.ain1.set_level(command.in1.into());
        self.ain2.set_level(command.in2.into());

        let mut ch = self.pwm.ch2();
        if command.pwm_enabled {
            ch.set_duty_cycle(command.compare_value(self.max_duty) as u16);
            ch.enable();
        } else {
            ch.set_duty_cycle(0);
            ch.disable();
        }
    }
}

/// 共有ドライバ（main で初期化）
pub static MOTOR_DRIVER: Mutex<CriticalSectionRawMutex, RefCell<Option<MotorDriver>>> =
    Mutex::new(RefCell::new(None));

/// 共有ドライバを[`Actuator`]として扱うハンドル
pub struct SharedMotor;

impl SharedMotor {
    fn apply(command: BridgeCommand) {
        MOTOR_DRIVER.lock(|driver| {
            if let Some(driver) = driver.borrow_mut().as_mut() {
                driver.apply(&command);
            }
        });
    }
}

impl Actuator for SharedMotor {
    fn drive(&mut self, voltage: f32) {
        Self::apply(BridgeCommand::from_voltage(voltage, MOTOR_SUPPLY_VOLTAGE));
    }

    fn stop(&mut self) {
        Self::apply(BridgeCommand::brake());
    }
}
