use crate::models::{
    common::{AgentBody, Position3D},
    traits::{ISense, SenseResult},
    world::{ColliderMask, World},
};

/// 距離判定
///
/// 自己位置とターゲット位置のユークリッド距離が範囲内かを判定します。
pub fn in_range(self_pos: Position3D, target_pos: Position3D, range: f64) -> bool {
    self_pos.distance_3d(&target_pos) <= range
}

/// 視野角判定
///
/// 前方ベクトルとターゲット方向のなす角が半角以内かを判定します。
/// ターゲットが自己位置と一致している場合は方向が定義できないため、
/// 角度によらず視界外として扱います（ゼロ除算・NaNの防止）。
///
/// # 引数
///
/// * `forward` - 前方単位ベクトル
/// * `self_pos` - 自己位置
/// * `target_pos` - ターゲット位置
/// * `half_angle_deg` - 視野半角（度）
pub fn in_cone(
    forward: Position3D,
    self_pos: Position3D,
    target_pos: Position3D,
    half_angle_deg: f64,
) -> bool {
    let to_target = target_pos - self_pos;
    if to_target.magnitude() < 1e-9 {
        return false; // 方向が定義できない
    }

    let dir = to_target.normalized();
    let dot = (forward.x * dir.x + forward.y * dir.y + forward.z * dir.z).clamp(-1.0, 1.0);
    let angle_deg = dot.acos().to_degrees();
    angle_deg <= half_angle_deg
}

/// 視線遮蔽判定
///
/// 目の位置からターゲットまでの直線が遮蔽物に遮られていないかを判定します。
/// ターゲット距離より厳密に手前でヒットした場合のみ遮蔽ありとみなします。
pub fn has_line_of_sight(world: &World, eye_pos: Position3D, target_pos: Position3D) -> bool {
    let to_target = target_pos - eye_pos;
    let distance = to_target.magnitude();
    if distance < 1e-9 {
        return true; // 同一点は遮蔽なし扱い
    }

    let dir = to_target.normalized();
    match world.raycast(eye_pos, dir, distance, ColliderMask::OBSTACLE) {
        Some(hit) => hit.distance >= distance,
        None => true,
    }
}

/// 目の位置の計算
///
/// 接地しているエージェントの足元位置から、固定の高さオフセットを加えた
/// 知覚原点を返します。
pub fn eye_position(root_pos: Position3D, eye_height: f64) -> Position3D {
    Position3D::new(root_pos.x, root_pos.y, root_pos.z + eye_height)
}

/// 検知メーター
///
/// [0,100]にクランプされる疑念度の蓄積器です。視認中は充填レートで増加し、
/// 警戒状態以外では減衰レートで減少します。同一ティックで充填と減衰の
/// 両方が適用されることはありません（呼び出し側が排他を保証）。
#[derive(Debug, Clone, Copy)]
pub struct DetectionMeter {
    /// 充填レート（毎秒）
    pub fill_rate_per_s: f64,
    /// 減衰レート（毎秒）
    pub decay_rate_per_s: f64,
    /// 現在の検知値 [0,100]
    value: f64,
}

impl DetectionMeter {
    pub fn new(fill_rate_per_s: f64, decay_rate_per_s: f64) -> Self {
        Self {
            fill_rate_per_s,
            decay_rate_per_s,
            value: 0.0,
        }
    }

    /// 現在の検知値
    pub fn value(&self) -> f64 {
        self.value
    }

    /// 正規化済み検知値 [0,1]
    pub fn ratio(&self) -> f64 {
        (self.value / 100.0).clamp(0.0, 1.0)
    }

    /// 飽和状態かどうか
    pub fn is_saturated(&self) -> bool {
        self.value >= 100.0
    }

    /// 検知値の充填
    ///
    /// 視認中のティックでのみ呼び出されます。
    ///
    /// # 戻り値
    ///
    /// このティックで100に到達（飽和）した場合はtrue
    pub fn accumulate(&mut self, dt: f64) -> bool {
        self.value = (self.value + self.fill_rate_per_s * dt).clamp(0.0, 100.0);
        self.is_saturated()
    }

    /// 検知値の減衰
    ///
    /// 警戒状態でなく、かつこのティックで充填が起きていない場合に
    /// 呼び出されます。
    pub fn decay(&mut self, dt: f64) {
        self.value = (self.value - self.decay_rate_per_s * dt).max(0.0);
    }
}

/// 視覚+聴覚の知覚戦略
///
/// 巡回ガード用の標準的な知覚能力です。視界（距離・視野角・遮蔽）が
/// 成立すれば視認、成立しない場合でも聴覚圏内なら物音として知覚します。
/// 視野角と距離は足元位置を基準に、遮蔽レイは目の高さから飛ばします。
#[derive(Debug, Clone, Copy)]
pub struct VisionHearingSense {
    pub vision_range_m: f64,
    pub vision_half_angle_deg: f64,
    pub hearing_range_m: f64,
    pub eye_height_m: f64,
}

impl ISense for VisionHearingSense {
    fn sense(&self, body: &AgentBody, world: &World, target_position: Position3D) -> SenseResult {
        // 視界チェック: 距離 → 視野角 → 遮蔽
        if in_range(body.position, target_position, self.vision_range_m)
            && in_cone(
                body.forward(),
                body.position,
                target_position,
                self.vision_half_angle_deg,
            )
        {
            let eye = eye_position(body.position, self.eye_height_m);
            if has_line_of_sight(world, eye, target_position) {
                return SenseResult::Seen(target_position);
            }
        }

        // 聴覚チェック: 距離のみの弱いトリガー
        if in_range(body.position, target_position, self.hearing_range_m) {
            return SenseResult::Heard(target_position);
        }

        SenseResult::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::world::Obstacle;

    fn open_world() -> World {
        World::new(Vec::new())
    }

    #[test]
    fn test_in_cone_dead_center() {
        let forward = Position3D::new(1.0, 0.0, 0.0);
        let origin = Position3D::new(0.0, 0.0, 0.0);
        assert!(in_cone(forward, origin, Position3D::new(5.0, 0.0, 0.0), 35.0));
        assert!(!in_cone(forward, origin, Position3D::new(0.0, 5.0, 0.0), 35.0));
    }

    #[test]
    fn test_in_cone_degenerate_zero_vector() {
        // 自己位置と一致するターゲットはどの角度でも視界外
        let forward = Position3D::new(1.0, 0.0, 0.0);
        let origin = Position3D::new(2.0, 3.0, 0.0);
        assert!(!in_cone(forward, origin, origin, 35.0));
        assert!(!in_cone(forward, origin, origin, 180.0));
    }

    #[test]
    fn test_line_of_sight_blocked_by_obstacle() {
        let world = World::new(vec![Obstacle {
            id: "OBS001".to_string(),
            center: Position3D::new(5.0, 0.0, 1.6),
            radius: 1.0,
        }]);
        let eye = Position3D::new(0.0, 0.0, 1.6);
        assert!(!has_line_of_sight(
            &world,
            eye,
            Position3D::new(10.0, 0.0, 1.6)
        ));
        // 遮蔽物より手前のターゲットは見える
        assert!(has_line_of_sight(
            &world,
            eye,
            Position3D::new(3.0, 0.0, 1.6)
        ));
    }

    #[test]
    fn test_meter_clamped_within_bounds() {
        let mut meter = DetectionMeter::new(60.0, 30.0);
        meter.decay(10.0);
        assert_eq!(meter.value(), 0.0);
        for _ in 0..100 {
            meter.accumulate(1.0);
        }
        assert_eq!(meter.value(), 100.0);
        for _ in 0..100 {
            meter.decay(1.0);
        }
        assert_eq!(meter.value(), 0.0);
    }

    #[test]
    fn test_meter_saturation_reported_on_reach() {
        let mut meter = DetectionMeter::new(60.0, 30.0);
        assert!(!meter.accumulate(1.0)); // 60.0
        assert!(meter.accumulate(1.0)); // 120.0 -> 100.0 で飽和
        assert_eq!(meter.value(), 100.0);
    }

    #[test]
    fn test_vision_sense_sees_target_ahead() {
        let sense = VisionHearingSense {
            vision_range_m: 10.0,
            vision_half_angle_deg: 35.0,
            hearing_range_m: 5.0,
            eye_height_m: 1.6,
        };
        let body = AgentBody::new(Position3D::new(0.0, 0.0, 0.0), 0.0);
        let result = sense.sense(&body, &open_world(), Position3D::new(5.0, 0.0, 0.0));
        assert_eq!(result, SenseResult::Seen(Position3D::new(5.0, 0.0, 0.0)));
    }

    #[test]
    fn test_hearing_only_outside_cone() {
        let sense = VisionHearingSense {
            vision_range_m: 10.0,
            vision_half_angle_deg: 35.0,
            hearing_range_m: 5.0,
            eye_height_m: 1.6,
        };
        // 真後ろ3m: 視野角外だが聴覚圏内
        let body = AgentBody::new(Position3D::new(0.0, 0.0, 0.0), 0.0);
        let result = sense.sense(&body, &open_world(), Position3D::new(-3.0, 0.0, 0.0));
        assert_eq!(result, SenseResult::Heard(Position3D::new(-3.0, 0.0, 0.0)));
    }

    #[test]
    fn test_sense_nothing_out_of_range() {
        let sense = VisionHearingSense {
            vision_range_m: 10.0,
            vision_half_angle_deg: 35.0,
            hearing_range_m: 5.0,
            eye_height_m: 1.6,
        };
        let body = AgentBody::new(Position3D::new(0.0, 0.0, 0.0), 0.0);
        let result = sense.sense(&body, &open_world(), Position3D::new(50.0, 0.0, 0.0));
        assert_eq!(result, SenseResult::None);
    }
}
