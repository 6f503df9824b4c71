//! モーター制御とハードウェアの設定パラメータ

/// マイナーループ（電流制御）周期 [μs]（20kHz）
pub const MINOR_PERIOD_US: u64 = 50;

/// メジャーループ（位置・速度制御）周期 [μs]（5kHz）
pub const MAJOR_PERIOD_US: u64 = 200;

/// テレメトリ出力周期 [ms]
pub const TELEMETRY_PERIOD_MS: u64 = 250;

/// 発散判定時間 [ms]（電圧飽和がこの時間続いたら発散とみなす）
pub const DIVERGENCE_THRESHOLD_MS: u32 = 300;

/// マイナーループのサンプリング時間 [s]
pub const DT_MINOR: f32 = MINOR_PERIOD_US as f32 / 1_000_000.0;

/// メジャーループのサンプリング時間 [s]
pub const DT_MAJOR: f32 = MAJOR_PERIOD_US as f32 / 1_000_000.0;

/// モーター印加電圧 [V]（5V - ダイオード順方向電圧）
/// 電圧指令の飽和判定にも使用
pub const MOTOR_SUPPLY_VOLTAGE: f32 = 4.6;

/// 想定する最大回転速度 [rad/s]（エンコーダのサンプル間移動量の上限チェック用）
pub const MAX_MOTOR_SPEED_RAD_S: f32 = 1500.0;

/// モーター公称値（Mabuchi FA-130RA-2270）
pub mod motor {
    /// 公称トルク定数 [Nm/A]
    pub const TORQUE_CONSTANT: f32 = 0.001159;

    /// 公称慣性 [kg·m²]
    pub const INERTIA: f32 = 0.0000005;

    /// 公称抵抗 [Ω]
    pub const RESISTANCE: f32 = 0.6818;

    /// 公称インダクタンス [H]
    pub const INDUCTANCE: f32 = 0.000340;
}

/// 制御ゲイン（デフォルト値）
pub mod gains {
    /// 位置制御 比例ゲイン [s^-2]
    pub const POSITION_KP: f32 = 4900.0;
    /// 位置制御 積分ゲイン [s^-3]
    pub const POSITION_KI: f32 = 6000.0;
    /// 位置制御 微分ゲイン [s^-1]
    pub const POSITION_KD: f32 = 140.0;

    /// 速度制御 比例ゲイン [s^-1]
    pub const VELOCITY_KP: f32 = 200.0;
    /// 速度制御 積分ゲイン [s^-2]
    pub const VELOCITY_KI: f32 = 10000.0;

    /// 電流制御 比例ゲイン [V/A]
    pub const CURRENT_KP: f32 = 0.5;
    /// 電流制御 積分ゲイン [V/(A·s)]
    pub const CURRENT_KI: f32 = 10.0;

    /// 擬似微分のカットオフ周波数 [rad/s]
    pub const PSEUDO_DIFF_CUTOFF: f32 = 1000.0;
}

/// 磁気式アブソリュートエンコーダ（AS5600）
pub mod encoder {
    /// 1回転あたりのカウント数（12bit）
    pub const RESOLUTION: u16 = 4096;

    /// I2Cスレーブアドレス（7bit）
    pub const I2C_ADDRESS: u8 = 0x36;

    /// I2Cクロック [Hz]
    pub const I2C_FREQUENCY_HZ: u32 = 400_000;

    /// 生角度の増加方向とモーター正転方向が逆（シールドの取り付け向き）
    pub const INVERSED: bool = true;
}

/// 電流センスアンプ（INA181）
pub mod current_sense {
    /// Vrefピンのオフセット電圧 [V]（電流0のときの出力）
    pub const OFFSET_VOLTAGE: f32 = 1.8;

    /// アンプゲイン [倍]
    pub const AMP_GAIN: f32 = 20.0;

    /// シャント抵抗 [Ω]
    pub const SHUNT_RESISTANCE: f32 = 0.05;

    /// ADC基準電圧 [V]
    pub const ADC_VREF: f32 = 3.3;

    /// ADC分解能（12ビット = 4096）
    pub const ADC_MAX: u16 = 4096;
}
