//! テレメトリ（UART出力）の整形
//!
//! メジャーループが公開した[`TelemetrySnapshot`]から、低速タスクが
//! 送信する行を組み立てます。送信自体はファームウェア側で行います。

use core::fmt::Write;

use heapless::String;

use crate::control::{ControlMode, ControllerState, GainSet, SupervisorState};

/// 1行の最大長
pub const LINE_CAPACITY: usize = 64;

/// 送信用の1行
pub type Line = String<LINE_CAPACITY>;

/// メジャーループの状態スナップショット
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetrySnapshot {
    pub supervisor: SupervisorState,
    pub controller: ControllerState,
    pub gains: GainSet,
    /// 起動以降のエンコーダのバスエラー回数
    pub bus_faults: u32,
}

impl TelemetrySnapshot {
    pub const fn new() -> Self {
        Self {
            supervisor: SupervisorState::Disabled,
            controller: ControllerState::new(),
            gains: GainSet::new(),
            bus_faults: 0,
        }
    }
}

impl Default for TelemetrySnapshot {
    fn default() -> Self {
        Self::new()
    }
}

/// 指令値と応答値の行（`"cmd,res\r\n"`）
///
/// 制御中の位置・速度モードのみ出力します。
pub fn format_response(snapshot: &TelemetrySnapshot) -> Option<Line> {
    if snapshot.supervisor != SupervisorState::Enabled {
        return None;
    }

    let c = &snapshot.controller;
    let (command, response) = match c.mode {
        ControlMode::Position => (c.position_command, c.position_response),
        ControlMode::Velocity => (c.velocity_command, c.velocity_response),
        ControlMode::Torque | ControlMode::None => return None,
    };

    let mut line = Line::new();
    write!(line, "{:.4},{:.4}\r\n", command, response).ok()?;
    Some(line)
}

/// ゲイン情報の行
pub fn format_info(snapshot: &TelemetrySnapshot) -> Line {
    let g = &snapshot.gains;
    let mut line = Line::new();
    let result = match snapshot.controller.mode {
        ControlMode::Position => write!(
            line,
            "Info:P:{},I:{},D:{}\r\n",
            g.position_kp, g.position_ki, g.position_kd
        ),
        ControlMode::Velocity => write!(line, "Info:P:{},I:{}\r\n", g.velocity_kp, g.velocity_ki),
        ControlMode::Torque | ControlMode::None => line.push_str("Info:\r\n").map_err(|_| core::fmt::Error),
    };

    if result.is_err() {
        // 容量不足（桁数の大きいゲイン）
        line.clear();
        let _ = line.push_str("Info:overflow\r\n");
    }
    line
}

/// バスエラー回数の行（増えたときのみ）
pub fn format_fault(snapshot: &TelemetrySnapshot, last_reported: u32) -> Option<Line> {
    if snapshot.bus_faults == last_reported {
        return None;
    }
    let mut line = Line::new();
    write!(line, "Fault:encoder:{}\r\n", snapshot.bus_faults).ok()?;
    Some(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(mode: ControlMode, supervisor: SupervisorState) -> TelemetrySnapshot {
        let mut s = TelemetrySnapshot::new();
        s.supervisor = supervisor;
        s.controller.mode = mode;
        s.controller.position_command = 0.5;
        s.controller.position_response = 0.49996;
        s.controller.velocity_command = -2.0;
        s.controller.velocity_response = -1.99;
        s
    }

    #[test]
    fn test_position_line() {
        let s = snapshot(ControlMode::Position, SupervisorState::Enabled);
        let line = format_response(&s).unwrap();
        assert_eq!(line.as_str(), "0.5000,0.5000\r\n");
    }

    #[test]
    fn test_velocity_line() {
        let s = snapshot(ControlMode::Velocity, SupervisorState::Enabled);
        let line = format_response(&s).unwrap();
        assert_eq!(line.as_str(), "-2.0000,-1.9900\r\n");
    }

    #[test]
    fn test_no_line_when_not_enabled_or_torque() {
        assert!(format_response(&snapshot(ControlMode::Position, SupervisorState::Diverged)).is_none());
        assert!(format_response(&snapshot(ControlMode::Position, SupervisorState::Disabled)).is_none());
        assert!(format_response(&snapshot(ControlMode::Torque, SupervisorState::Enabled)).is_none());
    }

    #[test]
    fn test_info_line() {
        let s = snapshot(ControlMode::Position, SupervisorState::Disabled);
        assert_eq!(format_info(&s).as_str(), "Info:P:4900,I:6000,D:140\r\n");

        let s = snapshot(ControlMode::Velocity, SupervisorState::Disabled);
        assert_eq!(format_info(&s).as_str(), "Info:P:200,I:10000\r\n");

        let s = snapshot(ControlMode::None, SupervisorState::Disabled);
        assert_eq!(format_info(&s).as_str(), "Info:\r\n");
    }

    #[test]
    fn test_fault_line() {
        let mut s = TelemetrySnapshot::new();
        assert!(format_fault(&s, 0).is_none());
        s.bus_faults = 3;
        assert_eq!(format_fault(&s, 1).unwrap().as_str(), "Fault:encoder:3\r\n");
    }
}
