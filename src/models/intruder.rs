use crate::models::{
    common::{AgentStatus, Position3D, Velocity3D},
    traits::IAgent,
};
use tracing::debug;

/// 経路ウェイポイントへの到達判定距離（メートル）
const ROUTE_ARRIVAL_M: f64 = 0.2;

/// 侵入者エージェント
///
/// 全ガード・カメラが追跡する唯一のターゲットです。スポーン時刻を過ぎると
/// 出現し、スクリプト化された経路を一定速度で周回します。知覚側からは
/// 位置の読み取りのみ行われ、侵入者自身が書き換えられることはありません。
#[derive(Debug, Clone)]
pub struct Intruder {
    /// 侵入者の一意識別子
    pub id: String,
    /// 現在位置
    pub position: Position3D,
    /// 現在速度
    pub velocity: Velocity3D,
    /// 周回経路（順序つきウェイポイント列）
    pub route: Vec<Position3D>,
    /// 経路カーソル（経路長でラップ）
    pub route_index: usize,
    /// 移動速度（m/s）
    pub speed: f64,
    /// スポーン時刻（秒）
    pub spawn_time: f64,
    /// 当たり判定半径（メートル）
    pub body_radius: f64,
    /// 現在状態
    pub status: AgentStatus,
}

impl Intruder {
    pub fn new(id: String, start_position: Position3D, route: Vec<Position3D>) -> Self {
        Self {
            id,
            position: start_position,
            velocity: Velocity3D::zero(),
            route,
            route_index: 0,
            speed: 0.0,      // initializeで設定
            spawn_time: 0.0, // initializeで設定
            body_radius: 0.0, // initializeで設定
            status: AgentStatus::Inactive, // spawn_timeまで非アクティブ
        }
    }

    /// スポーン判定
    ///
    /// 現在時刻がスポーン時刻に達していれば非アクティブからアクティブに
    /// 遷移させます。時刻はエンジンから明示的に渡されます。
    pub fn check_spawn(&mut self, current_time: f64) {
        if self.status == AgentStatus::Inactive && current_time >= self.spawn_time {
            self.status = AgentStatus::Active;
            debug!(
                intruder_id = %self.id,
                spawn_time = self.spawn_time,
                position_x = self.position.x,
                position_y = self.position.y,
                "INTRUDER_SPAWNED: 侵入者が出現しました"
            );
        }
    }
}

impl IAgent for Intruder {
    fn initialize(&mut self, scenario_config: &crate::scenario::ScenarioConfig) {
        if let Some(config) = &scenario_config.intruder {
            self.speed = config.speed_mps;
            self.spawn_time = config.spawn_time_s;
            self.body_radius = config.body_radius_m;
        }
        self.status = AgentStatus::Inactive;
        self.route_index = 0;
    }

    fn tick(&mut self, dt: f64) {
        if self.status != AgentStatus::Active {
            return;
        }

        // 経路がなければその場に留まる
        let Some(&waypoint) = self.route.get(self.route_index) else {
            self.velocity = Velocity3D::zero();
            return;
        };

        let to_waypoint = waypoint - self.position;
        if to_waypoint.magnitude_xy() < ROUTE_ARRIVAL_M {
            self.route_index = (self.route_index + 1) % self.route.len();
            return;
        }

        let direction = to_waypoint.planar().normalized();
        self.velocity = Velocity3D::new(direction.x * self.speed, direction.y * self.speed, 0.0);
        self.position = self.position
            + Position3D::new(self.velocity.x * dt, self.velocity.y * dt, 0.0);
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

    fn patrol_route() -> Vec<Position3D> {
        vec![
            Position3D::new(10.0, 0.0, 0.0),
            Position3D::new(10.0, 10.0, 0.0),
        ]
    }

    fn spawned_intruder() -> Intruder {
        let mut intruder = Intruder::new(
            "TGT001".to_string(),
            Position3D::new(0.0, 0.0, 0.0),
            patrol_route(),
        );
        intruder.speed = 2.0;
        intruder.spawn_time = 5.0;
        intruder.body_radius = 0.4;
        intruder
    }

    #[test]
    fn test_spawn_gating() {
        let mut intruder = spawned_intruder();
        intruder.check_spawn(4.9);
        assert!(!intruder.is_active());
        intruder.check_spawn(5.0);
        assert!(intruder.is_active());
    }

    #[test]
    fn test_inactive_does_not_move() {
        let mut intruder = spawned_intruder();
        let start = intruder.position;
        intruder.tick(1.0);
        assert_eq!(intruder.position, start);
    }

    #[test]
    fn test_route_cursor_wraps() {
        let mut intruder = spawned_intruder();
        intruder.status = AgentStatus::Active;
        // 最初のウェイポイント手前に置いて到達させる
        intruder.position = Position3D::new(9.9, 0.0, 0.0);
        intruder.tick(0.02);
        assert_eq!(intruder.route_index, 1);
        intruder.position = Position3D::new(10.0, 9.9, 0.0);
        intruder.tick(0.02);
        assert_eq!(intruder.route_index, 0);
    }

    #[test]
    fn test_empty_route_stands_still() {
        let mut intruder = Intruder::new(
            "TGT001".to_string(),
            Position3D::new(1.0, 2.0, 0.0),
            Vec::new(),
        );
        intruder.status = AgentStatus::Active;
        intruder.speed = 2.0;
        for _ in 0..50 {
            intruder.tick(0.1);
        }
        assert_eq!(intruder.position, Position3D::new(1.0, 2.0, 0.0));
    }
}
