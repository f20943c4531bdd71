use std::ops::{Add, Mul, Sub};

/// 3次元位置を表す構造体
///
/// 地面はXY平面、Zは高さ（上方向）とする。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position3D {
    pub x: f64, // m
    pub y: f64, // m
    pub z: f64, // m (height)
}

impl Position3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// XY平面での2次元距離を計算
    pub fn distance_xy(&self, other: &Position3D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// 3次元距離を計算
    pub fn distance_3d(&self, other: &Position3D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2) + (self.z - other.z).powi(2))
            .sqrt()
    }

    /// ベクトルの長さ（原点からの距離）
    pub fn magnitude(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2) + self.z.powi(2)).sqrt()
    }

    /// XY平面でのベクトル長
    pub fn magnitude_xy(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2)).sqrt()
    }

    /// 単位ベクトル化（ゼロベクトルはそのまま返す）
    pub fn normalized(&self) -> Self {
        let mag = self.magnitude();
        if mag > 0.0 {
            Self::new(self.x / mag, self.y / mag, self.z / mag)
        } else {
            *self
        }
    }

    /// Z成分を落とした平面ベクトル
    pub fn planar(&self) -> Self {
        Self::new(self.x, self.y, 0.0)
    }

    /// XY平面での方位角を計算（度）
    pub fn angle_xy(&self) -> f64 {
        self.y.atan2(self.x).to_degrees()
    }
}

impl Add for Position3D {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Position3D {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f64> for Position3D {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

/// 3次元速度を表す構造体
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Velocity3D {
    pub x: f64, // m/s
    pub y: f64, // m/s
    pub z: f64, // m/s
}

impl Velocity3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// 速度ベクトルの大きさ
    pub fn magnitude(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2) + self.z.powi(2)).sqrt()
    }

    /// XY平面での速度の大きさ
    pub fn magnitude_xy(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2)).sqrt()
    }

    /// 速度制限（最大速度でクリップ）
    pub fn clamp_magnitude(&self, max_speed: f64) -> Self {
        let mag = self.magnitude();
        if mag > max_speed {
            let factor = max_speed / mag;
            Self::new(self.x * factor, self.y * factor, self.z * factor)
        } else {
            *self
        }
    }

    /// 目標速度へ最大変化量つきで近づける
    ///
    /// 物理移動での速度積分に使用します。変化量が `max_delta` を超える場合は
    /// その方向に `max_delta` だけ進めます。
    pub fn move_towards(&self, desired: Velocity3D, max_delta: f64) -> Self {
        let diff = Velocity3D::new(desired.x - self.x, desired.y - self.y, desired.z - self.z);
        let dist = diff.magnitude();
        if dist <= max_delta || dist < 1e-12 {
            desired
        } else {
            let factor = max_delta / dist;
            Self::new(
                self.x + diff.x * factor,
                self.y + diff.y * factor,
                self.z + diff.z * factor,
            )
        }
    }
}

impl Add for Velocity3D {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Mul<f64> for Velocity3D {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

/// エージェントの剛体状態
///
/// 位置・方位角・速度をまとめた最小限の剛体表現で、
/// 移動戦略（ILocomotion）が読み書きします。
#[derive(Debug, Clone, Copy)]
pub struct AgentBody {
    /// 現在位置
    pub position: Position3D,
    /// 方位角（度、+X軸基準・反時計回り）
    pub yaw_deg: f64,
    /// 現在速度（物理移動のみ使用）
    pub velocity: Velocity3D,
}

impl AgentBody {
    pub fn new(position: Position3D, yaw_deg: f64) -> Self {
        Self {
            position,
            yaw_deg: math_utils::normalize_angle(yaw_deg),
            velocity: Velocity3D::zero(),
        }
    }

    /// 前方単位ベクトル（XY平面）
    pub fn forward(&self) -> Position3D {
        let rad = math_utils::deg_to_rad(self.yaw_deg);
        Position3D::new(rad.cos(), rad.sin(), 0.0)
    }
}

/// エージェントの状態を表す列挙型
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AgentStatus {
    Active,   // アクティブ
    Inactive, // 非アクティブ（未スポーン等）
}

/// 数学ユーティリティ関数
pub mod math_utils {
    /// 度をラジアンに変換
    pub fn deg_to_rad(degrees: f64) -> f64 {
        degrees * std::f64::consts::PI / 180.0
    }

    /// ラジアンを度に変換
    pub fn rad_to_deg(radians: f64) -> f64 {
        radians * 180.0 / std::f64::consts::PI
    }

    /// 角度を-180度〜180度の範囲に正規化
    pub fn normalize_angle(angle_deg: f64) -> f64 {
        let mut normalized = angle_deg % 360.0;
        if normalized > 180.0 {
            normalized -= 360.0;
        } else if normalized <= -180.0 {
            normalized += 360.0;
        }
        normalized
    }

    /// 2つの角度の差を計算（-180度〜180度の範囲）
    pub fn angle_difference(angle1_deg: f64, angle2_deg: f64) -> f64 {
        normalize_angle(angle2_deg - angle1_deg)
    }

    /// 角度を目標角へ最大変化量つきで回転させる
    pub fn rotate_towards(current_deg: f64, target_deg: f64, max_delta_deg: f64) -> f64 {
        let diff = angle_difference(current_deg, target_deg);
        if diff.abs() <= max_delta_deg {
            normalize_angle(target_deg)
        } else {
            normalize_angle(current_deg + diff.signum() * max_delta_deg)
        }
    }
}
