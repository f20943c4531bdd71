use crate::models::{
    common::{math_utils, AgentBody, Position3D, Velocity3D},
    traits::ILocomotion,
};

/// 操舵を打ち切る平面距離（メートル）
///
/// これ未満の目標は「到達済み」とみなし、ゼロ方向ベクトルの正規化を避けます。
const STEER_EPSILON_M: f64 = 1e-2;

/// キネマティック移動戦略
///
/// 旋回レート制限つきで方位を目標方向へ回しながら、位置を毎ティック
/// 直接積分します。物理エンジンを介さない決定的な移動です。
#[derive(Debug, Clone, Copy)]
pub struct KinematicLocomotion {
    /// 旋回レート（度/秒）
    pub turn_speed_deg_s: f64,
}

impl ILocomotion for KinematicLocomotion {
    fn steer(&mut self, body: &mut AgentBody, goal: Position3D, speed: f64, dt: f64) {
        let to_goal = (goal - body.position).planar();
        if to_goal.magnitude_xy() < STEER_EPSILON_M {
            return; // 到達済み、移動不要
        }

        let direction = to_goal.normalized();
        let look_yaw = to_goal.angle_xy();
        body.yaw_deg =
            math_utils::rotate_towards(body.yaw_deg, look_yaw, self.turn_speed_deg_s * dt);
        body.position = body.position + direction * (speed * dt);
    }

    fn stop(&mut self, _body: &mut AgentBody) {
        // キネマティック移動は操舵しなければ止まる
    }

    fn fixed_tick(&mut self, _body: &mut AgentBody, _dt: f64) {
        // 積分はsteerで完結している
    }
}

/// 物理速度ベース移動戦略
///
/// 操舵では希望平面速度を設定するだけで、固定ステップで実速度を
/// 最大加速度の範囲内で希望速度へ近づけてから位置を積分します。
#[derive(Debug, Clone, Copy)]
pub struct PhysicsLocomotion {
    /// 旋回レート（度/秒）
    pub turn_speed_deg_s: f64,
    /// 最大速度（m/s）
    pub max_speed_mps: f64,
    /// 最大加速度（m/s²）
    pub max_accel_mps2: f64,
    /// 希望平面速度
    desired_velocity: Velocity3D,
}

impl PhysicsLocomotion {
    pub fn new(turn_speed_deg_s: f64, max_speed_mps: f64, max_accel_mps2: f64) -> Self {
        Self {
            turn_speed_deg_s,
            max_speed_mps,
            max_accel_mps2,
            desired_velocity: Velocity3D::zero(),
        }
    }

    pub fn desired_velocity(&self) -> Velocity3D {
        self.desired_velocity
    }
}

impl ILocomotion for PhysicsLocomotion {
    fn steer(&mut self, body: &mut AgentBody, goal: Position3D, speed: f64, dt: f64) {
        let to_goal = (goal - body.position).planar();
        if to_goal.magnitude_xy() < STEER_EPSILON_M {
            self.desired_velocity = Velocity3D::zero();
            return;
        }

        let direction = to_goal.normalized();
        let clamped_speed = speed.min(self.max_speed_mps);
        self.desired_velocity = Velocity3D::new(
            direction.x * clamped_speed,
            direction.y * clamped_speed,
            0.0,
        );

        let look_yaw = to_goal.angle_xy();
        body.yaw_deg =
            math_utils::rotate_towards(body.yaw_deg, look_yaw, self.turn_speed_deg_s * dt);
    }

    fn stop(&mut self, body: &mut AgentBody) {
        self.desired_velocity = Velocity3D::zero();
        let _ = body;
    }

    fn fixed_tick(&mut self, body: &mut AgentBody, dt: f64) {
        // 実速度を希望速度へ加速度制限つきで近づける
        body.velocity = body
            .velocity
            .move_towards(self.desired_velocity, self.max_accel_mps2 * dt);
        body.position = body.position
            + Position3D::new(body.velocity.x * dt, body.velocity.y * dt, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinematic_advances_toward_goal() {
        let mut locomotion = KinematicLocomotion {
            turn_speed_deg_s: 240.0,
        };
        let mut body = AgentBody::new(Position3D::new(0.0, 0.0, 0.0), 0.0);
        locomotion.steer(&mut body, Position3D::new(10.0, 0.0, 0.0), 2.5, 1.0);
        assert!((body.position.x - 2.5).abs() < 1e-9);
        assert_eq!(body.position.y, 0.0);
    }

    #[test]
    fn test_kinematic_degenerate_goal_no_movement() {
        let mut locomotion = KinematicLocomotion {
            turn_speed_deg_s: 240.0,
        };
        let start = Position3D::new(3.0, 4.0, 0.0);
        let mut body = AgentBody::new(start, 45.0);
        locomotion.steer(&mut body, start, 2.5, 1.0);
        assert_eq!(body.position, start);
        assert_eq!(body.yaw_deg, 45.0);
    }

    #[test]
    fn test_kinematic_turn_rate_bounded() {
        let mut locomotion = KinematicLocomotion {
            turn_speed_deg_s: 90.0,
        };
        let mut body = AgentBody::new(Position3D::new(0.0, 0.0, 0.0), 0.0);
        // 真後ろの目標（180度）へは1ティックで90度までしか回れない
        locomotion.steer(&mut body, Position3D::new(-10.0, 0.001, 0.0), 0.0, 1.0);
        assert!((body.yaw_deg - 90.0).abs() < 0.1);
    }

    #[test]
    fn test_physics_velocity_accelerates_bounded() {
        let mut locomotion = PhysicsLocomotion::new(240.0, 3.6, 2.0);
        let mut body = AgentBody::new(Position3D::new(0.0, 0.0, 0.0), 0.0);
        locomotion.steer(&mut body, Position3D::new(100.0, 0.0, 0.0), 3.6, 0.02);
        // 1回の固定ステップでは max_accel*dt しか加速しない
        locomotion.fixed_tick(&mut body, 0.5);
        assert!((body.velocity.magnitude() - 1.0).abs() < 1e-9);
        // 繰り返せば希望速度に到達する
        for _ in 0..10 {
            locomotion.fixed_tick(&mut body, 0.5);
        }
        assert!((body.velocity.magnitude() - 3.6).abs() < 1e-9);
    }

    #[test]
    fn test_physics_stop_clears_desired_velocity() {
        let mut locomotion = PhysicsLocomotion::new(240.0, 3.6, 10.0);
        let mut body = AgentBody::new(Position3D::new(0.0, 0.0, 0.0), 0.0);
        locomotion.steer(&mut body, Position3D::new(10.0, 0.0, 0.0), 3.6, 0.02);
        locomotion.stop(&mut body);
        assert_eq!(locomotion.desired_velocity(), Velocity3D::zero());
        for _ in 0..100 {
            locomotion.fixed_tick(&mut body, 0.1);
        }
        assert_eq!(body.velocity, Velocity3D::zero());
    }
}
