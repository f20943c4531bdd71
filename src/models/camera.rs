use crate::models::{
    alert::AlertEvent,
    common::{math_utils, AgentStatus, Position3D},
    intruder::Intruder,
    perception::{eye_position, in_cone},
    traits::IAgent,
    world::{ColliderId, ColliderMask, World},
};
use tracing::{debug, info};

/// 走査カメラエージェント
///
/// 固定位置から走査角を周期的に掃引しながら侵入者を監視するカメラです。
/// 掃引はPD制御による角加速度で行われ、瞬間的なスナップではなく滑らかな
/// 振動になります。検知は3段階の物理クエリ（近接オーバーラップ →
/// スイープ球 → 素のレイ+遮蔽確認）で行い、成功すると共有クールダウンの
/// 範囲内で警報を放送します。検知メーターは持たず、警報は即時です。
pub struct ScanCamera {
    /// カメラの一意識別子
    pub id: String,
    /// 設置位置（固定）
    pub position: Position3D,
    /// 基準方位角（度、スポーン時に一度だけ設定）
    pub base_yaw_deg: f64,
    /// 走査位相（度、単調増加）
    pub phase_deg: f64,
    /// 現在方位角（度）
    pub current_yaw_deg: f64,
    /// 角速度（度/秒）
    pub angular_velocity_deg_s: f64,
    /// 現在状態
    pub status: AgentStatus,

    /// 走査速度（度/秒、位相の進み）
    pub scan_speed_deg_s: f64,
    /// 走査振幅（度）
    pub scan_angle_deg: f64,
    /// PDゲイン（比例）
    pub kp: f64,
    /// PDゲイン（微分=角速度制動）
    pub kd: f64,

    /// 視界距離（メートル）
    pub vision_range_m: f64,
    /// 視野半角（度）
    pub vision_half_angle_deg: f64,
    /// 目の高さ（メートル）
    pub eye_height_m: f64,
    /// 近接検知半径（メートル）
    pub proximity_radius_m: f64,
    /// スイープ球半径（メートル）
    pub sweep_radius_m: f64,

    /// 警報クールダウン（秒）
    pub alert_cooldown_s: f64,
    /// 最終警報時刻（秒）
    pub last_alert_time: f64,
}

impl ScanCamera {
    /// 新しい走査カメラを作成します
    ///
    /// # 引数
    ///
    /// * `id` - カメラの一意識別子
    /// * `position` - 設置位置
    /// * `yaw_deg` - 基準方位角（度）
    pub fn new(id: String, position: Position3D, yaw_deg: f64) -> Self {
        let yaw = math_utils::normalize_angle(yaw_deg);
        Self {
            id,
            position,
            base_yaw_deg: yaw,
            phase_deg: 0.0,
            current_yaw_deg: yaw,
            angular_velocity_deg_s: 0.0,
            status: AgentStatus::Active,
            scan_speed_deg_s: 0.0,      // initializeで設定
            scan_angle_deg: 0.0,        // initializeで設定
            kp: 0.0,                    // initializeで設定
            kd: 0.0,                    // initializeで設定
            vision_range_m: 0.0,        // initializeで設定
            vision_half_angle_deg: 0.0, // initializeで設定
            eye_height_m: 0.0,          // initializeで設定
            proximity_radius_m: 0.0,    // initializeで設定
            sweep_radius_m: 0.0,        // initializeで設定
            alert_cooldown_s: 0.0,      // initializeで設定
            last_alert_time: f64::NEG_INFINITY, // 初回は即時放送可能
        }
    }

    /// 前方単位ベクトル（XY平面、現在方位角から）
    pub fn forward(&self) -> Position3D {
        let rad = math_utils::deg_to_rad(self.current_yaw_deg);
        Position3D::new(rad.cos(), rad.sin(), 0.0)
    }

    /// 走査回転の固定ステップ更新
    ///
    /// 位相を進めて正弦波の目標方位角を計算し、PD制御による角加速度で
    /// 現在方位角を目標へ追従させます。
    ///
    /// # 引数
    ///
    /// * `dt` - 固定時間刻み（秒）
    pub fn fixed_tick(&mut self, dt: f64) {
        if self.status != AgentStatus::Active {
            return;
        }

        self.phase_deg += self.scan_speed_deg_s * dt;
        let target_yaw =
            self.base_yaw_deg + math_utils::deg_to_rad(self.phase_deg).sin() * self.scan_angle_deg;

        // PD制御: 偏差に比例する復元項 - 角速度に比例する制動項
        let yaw_error = math_utils::angle_difference(self.current_yaw_deg, target_yaw);
        let accel_deg_s2 = self.kp * yaw_error - self.kd * self.angular_velocity_deg_s;

        // トルクを角加速度として適用してから方位角を積分
        self.angular_velocity_deg_s += accel_deg_s2 * dt;
        self.current_yaw_deg = math_utils::normalize_angle(
            self.current_yaw_deg + self.angular_velocity_deg_s * dt,
        );
    }

    /// ターゲット知覚の可変ステップ更新
    ///
    /// 距離・視野角の外側ガードを通過した後、3つの検知トリガーを順に
    /// 評価します（最初に成立したもので確定）:
    ///
    /// 1. 近接オーバーラップ: 目の位置の周囲をターゲットマスクで球判定
    /// 2. スイープ球: 目からターゲット方向へ測定距離まで球を掃引
    /// 3. 素のレイ: 遮蔽物マスクでレイを飛ばし、遮蔽がなければ成立
    ///
    /// # 戻り値
    ///
    /// 検知に成功しクールダウンを通過した場合は放送すべき警報イベント
    pub fn perceive(
        &mut self,
        world: &World,
        intruder: Option<&Intruder>,
        now: f64,
    ) -> Option<AlertEvent> {
        if self.status != AgentStatus::Active {
            return None;
        }
        let target = intruder.filter(|t| t.is_active())?;

        let eye = eye_position(self.position, self.eye_height_m);
        let to_target = target.position - eye;
        let distance = to_target.magnitude();

        // 外側ガード: 距離と視野角をここで一度だけ確認
        if distance > self.vision_range_m {
            return None;
        }
        if !in_cone(
            self.forward(),
            eye,
            target.position,
            self.vision_half_angle_deg,
        ) {
            return None;
        }

        let direction = to_target.normalized();

        // ①近接オーバーラップ
        if !world
            .sphere_overlap(eye, self.proximity_radius_m, ColliderMask::TARGET)
            .is_empty()
        {
            return self.try_broadcast(target.position, now, "proximity_overlap");
        }

        // ②スイープ球（ターゲットマスクのみ）
        if let Some(hit) =
            world.sphere_cast(eye, self.sweep_radius_m, direction, distance, ColliderMask::TARGET)
        {
            if hit.collider == ColliderId::Target(target.id.clone()) {
                return self.try_broadcast(target.position, now, "sphere_sweep");
            }
        }

        // ③素のレイ + 遮蔽確認
        let blocked = match world.raycast(eye, direction, distance, ColliderMask::OBSTACLE) {
            Some(hit) => hit.distance < distance,
            None => false,
        };
        if !blocked {
            return self.try_broadcast(target.position, now, "raycast");
        }

        None
    }

    /// 外部からの強制警報（同じクールダウンの対象）
    pub fn force_alert(&mut self, suspect_position: Position3D, now: f64) -> Option<AlertEvent> {
        self.try_broadcast(suspect_position, now, "forced")
    }

    /// クールダウンを確認して警報イベントを生成
    ///
    /// クールダウン中の検知はキューイングされず、このティックでは
    /// 完全に破棄されます（抑制は黙って行われる期待動作）。
    fn try_broadcast(
        &mut self,
        suspect_position: Position3D,
        now: f64,
        trigger: &str,
    ) -> Option<AlertEvent> {
        if now < self.last_alert_time + self.alert_cooldown_s {
            debug!(
                camera_id = %self.id,
                trigger,
                cooldown_remaining = self.last_alert_time + self.alert_cooldown_s - now,
                "CAMERA_ALERT_SUPPRESSED: クールダウン中のため警報を破棄しました"
            );
            return None;
        }

        self.last_alert_time = now;
        info!(
            camera_id = %self.id,
            trigger,
            target_x = suspect_position.x,
            target_y = suspect_position.y,
            timestamp = now,
            "CAMERA_ALERT_BROADCAST: カメラが警報を放送します"
        );

        Some(AlertEvent {
            camera_id: self.id.clone(),
            target_position: suspect_position,
            timestamp: now,
        })
    }
}

impl IAgent for ScanCamera {
    fn initialize(&mut self, scenario_config: &crate::scenario::ScenarioConfig) {
        let defaults = &scenario_config.camera_defaults;

        self.status = AgentStatus::Active;
        self.phase_deg = 0.0;
        self.current_yaw_deg = self.base_yaw_deg;
        self.angular_velocity_deg_s = 0.0;
        self.last_alert_time = f64::NEG_INFINITY;

        self.scan_speed_deg_s = defaults.scan_speed_deg_s;
        self.scan_angle_deg = defaults.scan_angle_deg;
        self.kp = defaults.kp;
        self.kd = defaults.kd;
        self.vision_range_m = defaults.vision_range_m;
        self.vision_half_angle_deg = defaults.vision_half_angle_deg;
        self.eye_height_m = defaults.eye_height_m;
        self.proximity_radius_m = defaults.proximity_radius_m;
        self.sweep_radius_m = defaults.sweep_radius_m;
        self.alert_cooldown_s = defaults.alert_cooldown_s;
    }

    fn tick(&mut self, _dt: f64) {
        // 実際の知覚処理は外部コンテキストが必要なため、
        // シミュレーションループから perceive が呼ばれることで実行される
    }

    fn get_id(&self) -> String {
        self.id.clone()
    }

    fn is_active(&self) -> bool {
        self.status == AgentStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::world::{Obstacle, TargetCollider};

    fn test_camera() -> ScanCamera {
        let mut camera = ScanCamera::new(
            "C001".to_string(),
            Position3D::new(0.0, 0.0, 0.0),
            0.0,
        );
        camera.scan_speed_deg_s = 30.0;
        camera.scan_angle_deg = 45.0;
        camera.kp = 0.6;
        camera.kd = 0.1;
        camera.vision_range_m = 12.0;
        camera.vision_half_angle_deg = 35.0;
        camera.eye_height_m = 1.8;
        camera.proximity_radius_m = 2.0;
        camera.sweep_radius_m = 0.35;
        camera.alert_cooldown_s = 1.0;
        camera
    }

    fn active_intruder(position: Position3D) -> Intruder {
        let mut intruder = Intruder::new("TGT001".to_string(), position, Vec::new());
        intruder.status = AgentStatus::Active;
        intruder.body_radius = 0.4;
        intruder
    }

    fn world_with_target(intruder: &Intruder) -> World {
        let mut world = World::new(Vec::new());
        world.set_target_collider(Some(TargetCollider {
            id: intruder.id.clone(),
            center: intruder.position,
            radius: intruder.body_radius,
        }));
        world
    }

    #[test]
    fn test_cooldown_suppresses_second_detection() {
        let mut camera = test_camera();
        let intruder = active_intruder(Position3D::new(5.0, 0.0, 1.8));
        let world = world_with_target(&intruder);

        assert!(camera.perceive(&world, Some(&intruder), 0.0).is_some());
        let first_alert_time = camera.last_alert_time;
        // クールダウン内の検知は破棄され、last_alert_timeも更新されない
        assert!(camera.perceive(&world, Some(&intruder), 0.5).is_none());
        assert_eq!(camera.last_alert_time, first_alert_time);
        // クールダウン経過後は再放送できる
        assert!(camera.perceive(&world, Some(&intruder), 1.1).is_some());
        assert_eq!(camera.last_alert_time, 1.1);
    }

    #[test]
    fn test_out_of_range_no_detection() {
        let mut camera = test_camera();
        let intruder = active_intruder(Position3D::new(50.0, 0.0, 1.8));
        let world = world_with_target(&intruder);
        assert!(camera.perceive(&world, Some(&intruder), 0.0).is_none());
    }

    #[test]
    fn test_outside_cone_no_detection() {
        let mut camera = test_camera();
        let intruder = active_intruder(Position3D::new(0.0, 5.0, 1.8)); // 真横
        let world = world_with_target(&intruder);
        assert!(camera.perceive(&world, Some(&intruder), 0.0).is_none());
    }

    #[test]
    fn test_occluded_target_no_detection() {
        let mut camera = test_camera();
        let intruder = active_intruder(Position3D::new(10.0, 0.0, 1.8));
        // ターゲット当たり判定体は未同期、間に壁 → 3トリガーとも不成立
        let mut world = World::new(vec![Obstacle {
            id: "OBS001".to_string(),
            center: Position3D::new(5.0, 0.0, 1.8),
            radius: 1.0,
        }]);
        world.set_target_collider(None);
        assert!(camera.perceive(&world, Some(&intruder), 0.0).is_none());
    }

    #[test]
    fn test_proximity_overlap_wins_first() {
        let mut camera = test_camera();
        let intruder = active_intruder(Position3D::new(1.5, 0.0, 1.8));
        let world = world_with_target(&intruder);
        let event = camera
            .perceive(&world, Some(&intruder), 0.0)
            .expect("近接検知が成立するはず");
        assert_eq!(event.camera_id, "C001");
        assert_eq!(event.target_position, intruder.position);
    }

    #[test]
    fn test_force_alert_respects_cooldown() {
        let mut camera = test_camera();
        assert!(camera.force_alert(Position3D::new(1.0, 0.0, 0.0), 0.0).is_some());
        assert!(camera.force_alert(Position3D::new(1.0, 0.0, 0.0), 0.5).is_none());
        assert!(camera.force_alert(Position3D::new(1.0, 0.0, 0.0), 1.1).is_some());
    }

    #[test]
    fn test_missing_target_never_detects() {
        let mut camera = test_camera();
        let world = World::new(Vec::new());
        assert!(camera.perceive(&world, None, 0.0).is_none());
    }

    #[test]
    fn test_pd_sweep_stays_within_amplitude() {
        let mut camera = test_camera();
        let dt = 0.02;
        let mut max_excursion: f64 = 0.0;
        for _ in 0..5000 {
            camera.fixed_tick(dt);
            let excursion =
                math_utils::angle_difference(camera.base_yaw_deg, camera.current_yaw_deg).abs();
            max_excursion = max_excursion.max(excursion);
        }
        // PD追従なので多少のオーバーシュートは許容する
        assert!(max_excursion <= camera.scan_angle_deg + 20.0);
        // 掃引が実際に起きている（静止していない）
        assert!(max_excursion > 5.0);
    }

    #[test]
    fn test_pd_phase_monotonically_increases() {
        let mut camera = test_camera();
        let mut previous = camera.phase_deg;
        for _ in 0..100 {
            camera.fixed_tick(0.02);
            assert!(camera.phase_deg > previous);
            previous = camera.phase_deg;
        }
    }
}
