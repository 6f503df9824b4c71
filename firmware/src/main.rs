#![no_std]
#![no_main]

mod fmt;
mod hardware;
mod motor_driver;
mod state;
mod tasks;

#[cfg(not(feature = "defmt"))]
use panic_halt as _;
#[cfg(feature = "defmt")]
use {defmt_rtt as _, panic_probe as _};

use dcm_driver::config::encoder::{I2C_FREQUENCY_HZ, INVERSED, RESOLUTION};
use dcm_driver::config::DT_MAJOR;
use dcm_driver::control::{GainSet, MotionController, MotorModel};
use dcm_driver::encoder::{As5600, PositionSensor, PositionTracker};
use dcm_driver::MajorLoop;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_stm32::{
    adc::{Adc, AdcChannel, SampleTime},
    gpio::{Input, Level, Output, OutputType, Pull, Speed},
    i2c::{self, I2c},
    interrupt::{InterruptExt, Priority},
    time::Hertz,
    timer::{
        low_level::CountingMode,
        simple_pwm::{PwmPin, SimplePwm},
    },
    usart::{self, UartTx},
};
use embassy_stm32::interrupt;
use embassy_time::{Duration, Timer};

use fmt::*;
use hardware::Irqs;
use motor_driver::{MotorDriver, MOTOR_DRIVER};
use state::{ANGLE_CELL, LOOP_LINK};
use tasks::{
    encoder_task, major_loop_task, minor_loop_task, telemetry_task, EncoderBus, OperatorInputs,
};

/// PWM周波数（TB6612）
const PWM_FREQUENCY: Hertz = Hertz(20_000);
/// テレメトリのボーレート
const TELEMETRY_BAUDRATE: u32 = 115_200;

/// マイナーループ用（最優先）
static EXECUTOR_MINOR: InterruptExecutor = InterruptExecutor::new();
/// メジャーループ・エンコーダ用
static EXECUTOR_MAJOR: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SPI5() {
    unsafe { EXECUTOR_MINOR.on_interrupt() }
}

#[interrupt]
unsafe fn SPI4() {
    unsafe { EXECUTOR_MAJOR.on_interrupt() }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    // ハードウェア初期化
    let config = hardware::create_clock_config();
    let p = embassy_stm32::init(config);

    info!("═══════════════════════════════════════════════════════");
    info!("   DC Motor Position Controller • STM32F411RE @ 100MHz");
    info!("   current loop 20kHz / position loop 5kHz");
    info!("═══════════════════════════════════════════════════════");

    // テレメトリ（USART2 TX = PA2）
    let mut uart_config = usart::Config::default();
    uart_config.baudrate = TELEMETRY_BAUDRATE;
    let uart = UartTx::new(p.USART2, p.PA2, p.DMA1_CH6, uart_config).unwrap();

    // エンコーダ（I2C1: SCL = PB8, SDA = PB9）
    let mut enc_err_led = Output::new(p.PA5, Level::Low, Speed::Low);
    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = Hertz(I2C_FREQUENCY_HZ);
    let i2c = I2c::new(
        p.I2C1,
        p.PB8,
        p.PB9,
        Irqs,
        p.DMA1_CH7,
        p.DMA1_CH0,
        i2c_config,
    );
    let mut encoder = As5600::new(EncoderBus::new(i2c));

    info!("Initializing AS5600...");
    let initial_angle = match encoder.initialize(None).await {
        Ok(angle) => angle,
        Err(e) => {
            // 磁石の異常は復帰できないので、LEDを点灯して停止
            error!("AS5600 initialization failed: {}", e);
            enc_err_led.set_high();
            loop {
                Timer::after(Duration::from_secs(1)).await;
            }
        }
    };
    ANGLE_CELL.publish(initial_angle);

    let mut tracker = PositionTracker::new(RESOLUTION, initial_angle);
    tracker.set_inversed(INVERSED);

    // モータードライバ（TB6612: PWMA = PC7(TIM3_CH2), AIN1 = PA8, AIN2 = PA9）
    let pwm = SimplePwm::new(
        p.TIM3,
        None,
        Some(PwmPin::new(p.PC7, OutputType::PushPull)),
        None,
        None,
        PWM_FREQUENCY,
        CountingMode::EdgeAlignedUp,
    );
    let ain1 = Output::new(p.PA8, Level::Low, Speed::Low);
    let ain2 = Output::new(p.PA9, Level::Low, Speed::Low);
    let driver = MotorDriver::new(pwm, ain1, ain2);
    MOTOR_DRIVER.lock(|d| *d.borrow_mut() = Some(driver));

    // ADC（電流 = PA0、ノブ = PA1, PA4, PB0, PC1）
    let mut adc = Adc::new(p.ADC1);
    adc.set_sample_time(SampleTime::CYCLES3);
    let current_pin = p.PA0.degrade_adc();
    let knob_pins = [
        p.PA1.degrade_adc(),
        p.PA4.degrade_adc(),
        p.PB0.degrade_adc(),
        p.PC1.degrade_adc(),
    ];

    // スイッチ・ボタン・LED
    let inputs = OperatorInputs {
        servo_switch: Input::new(p.PB5, Pull::Down),
        sys_button: Input::new(p.PB6, Pull::Up),
    };
    let sys_led = Output::new(p.PB4, Level::Low, Speed::Low);

    // 制御系の組み立て
    let motion = MotionController::new(
        &LOOP_LINK,
        GainSet::default(),
        MotorModel::default(),
        DT_MAJOR,
    );
    let sensor = PositionSensor::new(&ANGLE_CELL, tracker);
    let major = MajorLoop::new(&LOOP_LINK, sensor, motion, inputs.read());
    info!("Initial state: {}", major.state());

    // 割り込みエグゼキュータ起動（数値が小さいほど高優先）
    interrupt::SPI5.set_priority(Priority::P6);
    let minor_spawner = EXECUTOR_MINOR.start(interrupt::SPI5);
    interrupt::SPI4.set_priority(Priority::P7);
    let major_spawner = EXECUTOR_MAJOR.start(interrupt::SPI4);

    minor_spawner
        .spawn(minor_loop_task(adc, current_pin, knob_pins))
        .unwrap();
    major_spawner.spawn(encoder_task(encoder)).unwrap();
    major_spawner
        .spawn(major_loop_task(major, inputs, sys_led))
        .unwrap();
    spawner.spawn(telemetry_task(uart)).unwrap();

    info!("Control loops started");

    loop {
        Timer::after(Duration::from_millis(100)).await;
    }
}
