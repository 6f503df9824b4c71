//! メジャーループ1ティック分の処理
//!
//! 1. エンコーダの新しいサンプルがあれば位置トラッカーを更新
//! 2. スイッチ・ボタン入力と発散判定でスーパーバイザを更新
//! 3. 有効化時（スイッチON・発散解除）は制御器をリセットし原点を再設定
//! 4. 有効でなければ必ずブレーキを出力して終了
//! 5. 指令値を設定し、位置が得られたティックのみ外側ループを計算
//!
//! 位置トラッカーは制御無効中も更新し続けます。停止中に手で回されても
//! サンプル間の移動量が1/4回転を超えないようにするためです。

use super::divergence::DivergenceMonitor;
use super::link::LoopLink;
use super::motion::MotionController;
use super::supervisor::{Supervisor, SupervisorEvents, SupervisorInputs, SupervisorState};
use crate::actuator::Actuator;
use crate::config::MOTOR_SUPPLY_VOLTAGE;
use crate::encoder::{PositionSensor, SensorError};
use crate::telemetry::TelemetrySnapshot;

/// 1ティックの結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MajorTick {
    pub state: SupervisorState,
    pub events: SupervisorEvents,
    /// 今回取得した位置 [rad]
    pub position: Result<f32, SensorError>,
}

/// 外側ループとスーパーバイザの組
pub struct MajorLoop<'a> {
    link: &'a LoopLink,
    sensor: PositionSensor<'a>,
    motion: MotionController<'a>,
    supervisor: Supervisor,
    divergence: DivergenceMonitor,
    voltage_limit: f32,
}

impl<'a> MajorLoop<'a> {
    pub fn new(
        link: &'a LoopLink,
        sensor: PositionSensor<'a>,
        motion: MotionController<'a>,
        initial: SupervisorInputs,
    ) -> Self {
        let supervisor = Supervisor::new(initial);
        link.set_control_enabled(supervisor.state() == SupervisorState::Enabled);
        Self {
            link,
            sensor,
            motion,
            supervisor,
            divergence: DivergenceMonitor::default(),
            voltage_limit: MOTOR_SUPPLY_VOLTAGE,
        }
    }

    /// 発散検知器を差し替える
    pub fn with_divergence(mut self, divergence: DivergenceMonitor) -> Self {
        self.divergence = divergence;
        self
    }

    /// 飽和判定に使う電圧上限 [V] を設定
    pub fn with_voltage_limit(mut self, voltage_limit: f32) -> Self {
        self.voltage_limit = voltage_limit;
        self
    }

    /// 指令値を変更せずに1ティック実行
    pub fn tick<A: Actuator>(&mut self, inputs: SupervisorInputs, actuator: &mut A) -> MajorTick {
        self.tick_with(inputs, actuator, |_| {})
    }

    /// 1ティック実行
    ///
    /// `command`は制御が有効なティックでのみ、外側ループの計算前に呼ばれます。
    pub fn tick_with<A, F>(&mut self, inputs: SupervisorInputs, actuator: &mut A, command: F) -> MajorTick
    where
        A: Actuator,
        F: FnOnce(&mut MotionController<'a>),
    {
        let position = self.sensor.read_position();

        let link = self.link;
        let limit = self.voltage_limit;
        let divergence = &mut self.divergence;
        let events = self
            .supervisor
            .tick(inputs, || divergence.observe(link.voltage_reference(), limit));

        if events.rearm {
            self.rearm();
        }

        let state = self.supervisor.state();
        if state != SupervisorState::Enabled {
            // マイナーループを先に止めてからブレーキ
            self.link.set_control_enabled(false);
            actuator.stop();
            return MajorTick {
                state,
                events,
                position,
            };
        }
        self.link.set_control_enabled(true);

        command(&mut self.motion);

        if position.is_ok() {
            let current = self.sensor.last_position();
            self.motion.step(current, actuator);
        }

        MajorTick {
            state,
            events,
            position,
        }
    }

    /// 制御器をリセットし、現在位置を原点にする
    fn rearm(&mut self) {
        info!("major loop: rearm, position zeroed");
        self.motion.reset();
        self.sensor.set_position(0.0);
        self.motion.rezero(0.0);
        self.divergence.clear();
    }

    pub fn motion(&self) -> &MotionController<'a> {
        &self.motion
    }

    pub fn motion_mut(&mut self) -> &mut MotionController<'a> {
        &mut self.motion
    }

    pub fn sensor(&self) -> &PositionSensor<'a> {
        &self.sensor
    }

    pub fn state(&self) -> SupervisorState {
        self.supervisor.state()
    }

    /// テレメトリ用のスナップショット
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            supervisor: self.supervisor.state(),
            controller: self.motion.state(),
            gains: *self.motion.gains(),
            bus_faults: self.sensor.fault_count(),
        }
    }
}
