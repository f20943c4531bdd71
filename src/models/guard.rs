use crate::models::{
    common::{AgentBody, AgentStatus, Position3D},
    intruder::Intruder,
    locomotion::{KinematicLocomotion, PhysicsLocomotion},
    perception::{DetectionMeter, VisionHearingSense},
    traits::{IAgent, ILocomotion, ISense, SenseResult},
    world::World,
};
use tracing::{debug, info};

/// 巡回ウェイポイントへの到達判定距離（メートル）
const WAYPOINT_ARRIVAL_M: f64 = 0.2;
/// 調査地点への到達判定距離（メートル）
const INVESTIGATE_ARRIVAL_M: f64 = 0.5;

/// ガードの行動状態
///
/// 巡回 → 不審 → 警戒 の循環状態機械で、終端状態はありません。
/// 警戒への遷移は一方向ラッチであり、本実装では警戒解除を行いません。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GuardState {
    /// 巡回中（初期状態）
    Patrol,
    /// 不審（最終知覚位置を調査中）
    Suspicious,
    /// 警戒（ターゲットを直接追跡）
    Alert,
}

/// 巡回ガードエージェント
///
/// 視覚・聴覚で侵入者を知覚し、検知メーターの蓄積に応じて行動状態を
/// 遷移させるエージェントです。知覚戦略と移動戦略は生成時に差し替え可能な
/// 能力オブジェクトとして保持します（継承ではなく合成）。
pub struct Guard {
    /// ガードの一意識別子
    pub id: String,
    /// 剛体状態（位置・方位・速度）
    pub body: AgentBody,
    /// 現在の行動状態
    pub state: GuardState,
    /// 検知メーター
    pub meter: DetectionMeter,
    /// 最終知覚位置（不審/警戒以外では陳腐化している）
    pub last_known_position: Position3D,
    /// 巡回ウェイポイント列（外部から与えられる読み取り専用経路）
    pub waypoints: Vec<Position3D>,
    /// ウェイポイントカーソル（経路長でラップ）
    pub waypoint_index: usize,
    /// 調査地点付近での滞在時間（秒）
    pub investigate_timer: f64,
    /// 現在状態
    pub status: AgentStatus,

    /// 知覚戦略
    pub sense: Box<dyn ISense>,
    /// 移動戦略
    pub locomotion: Box<dyn ILocomotion>,

    /// 巡回速度（m/s）
    pub move_speed: f64,
    /// 調査速度（m/s）
    pub investigate_speed: f64,
    /// 追跡速度（m/s）
    pub chase_speed: f64,
    /// 調査を打ち切るまでの時間（秒）
    pub give_up_s: f64,
    /// 攻撃フックの発動距離（メートル）
    pub attack_range: f64,
}

impl Guard {
    /// 新しいガードを作成します
    ///
    /// # 引数
    ///
    /// * `id` - ガードの一意識別子
    /// * `position` - 初期位置
    /// * `yaw_deg` - 初期方位角（度）
    /// * `waypoints` - 巡回経路
    ///
    /// # 戻り値
    ///
    /// 初期化されたガードインスタンス（initializeメソッドで詳細設定が必要）
    pub fn new(id: String, position: Position3D, yaw_deg: f64, waypoints: Vec<Position3D>) -> Self {
        Self {
            id,
            body: AgentBody::new(position, yaw_deg),
            state: GuardState::Patrol,
            meter: DetectionMeter::new(0.0, 0.0), // initializeで設定
            last_known_position: position,
            waypoints,
            waypoint_index: 0,
            investigate_timer: 0.0,
            status: AgentStatus::Active,
            sense: Box::new(VisionHearingSense {
                vision_range_m: 0.0, // initializeで設定
                vision_half_angle_deg: 0.0,
                hearing_range_m: 0.0,
                eye_height_m: 0.0,
            }),
            locomotion: Box::new(KinematicLocomotion {
                turn_speed_deg_s: 0.0, // initializeで設定
            }),
            move_speed: 0.0,        // initializeで設定
            investigate_speed: 0.0, // initializeで設定
            chase_speed: 0.0,       // initializeで設定
            give_up_s: 0.0,         // initializeで設定
            attack_range: 0.0,      // initializeで設定
        }
    }

    /// 1ティックの知覚・行動処理
    ///
    /// 知覚は必ず移動より先に実行されます（移動は知覚が今まさに変更した
    /// 状態に依存するため）。1ティックあたり検知メーターには充填か減衰の
    /// どちらか一方のみが適用されます。
    ///
    /// # 引数
    ///
    /// * `world` - 物理クエリサーフェス
    /// * `intruder` - 追跡対象（ワールドに不在の場合はNone）
    /// * `dt` - 経過時間（秒）
    pub fn update(&mut self, world: &World, intruder: Option<&Intruder>, dt: f64) {
        if self.status != AgentStatus::Active {
            return;
        }

        // 知覚ステップ（ターゲット不在なら知覚なしで巡回継続）
        let mut filled = false;
        if let Some(target) = intruder.filter(|t| t.is_active()) {
            filled = self.sense_step(world, target, dt);
        }

        // 状態ごとの行動ステップ
        match self.state {
            GuardState::Patrol => self.patrol_step(dt),
            GuardState::Suspicious => self.investigate_step(dt),
            GuardState::Alert => self.engage_step(intruder, dt),
        }

        // 充填が起きなかったティックのみ減衰（警戒中は減衰しない）
        if self.state != GuardState::Alert && !filled {
            self.meter.decay(dt);
        }
    }

    /// 運動の固定ステップ積分（物理移動のみ実質的な処理を持つ）
    pub fn fixed_tick(&mut self, dt: f64) {
        if self.status == AgentStatus::Active {
            self.locomotion.fixed_tick(&mut self.body, dt);
        }
    }

    /// 知覚ステップ
    ///
    /// # 戻り値
    ///
    /// このティックで検知メーターの充填が起きた場合はtrue
    fn sense_step(&mut self, world: &World, target: &Intruder, dt: f64) -> bool {
        // 警戒中は視界・聴覚判定を省略してターゲット位置を直接追従する
        if self.state == GuardState::Alert {
            self.last_known_position = target.position;
            return false;
        }

        match self.sense.sense(&self.body, world, target.position) {
            SenseResult::Seen(position) => {
                self.last_known_position = position;
                if self.meter.accumulate(dt) {
                    self.change_state(GuardState::Alert);
                } else {
                    self.change_state(GuardState::Suspicious);
                }
                true
            }
            SenseResult::Heard(position) => {
                // 聴覚はメーターを充填しない弱いトリガー
                self.last_known_position = position;
                self.change_state(GuardState::Suspicious);
                false
            }
            SenseResult::None => false,
        }
    }

    /// 巡回行動
    fn patrol_step(&mut self, dt: f64) {
        let Some(&waypoint) = self.waypoints.get(self.waypoint_index) else {
            // 経路が空ならその場に留まる
            self.locomotion.stop(&mut self.body);
            return;
        };

        if (waypoint - self.body.position).magnitude_xy() < WAYPOINT_ARRIVAL_M {
            self.waypoint_index = (self.waypoint_index + 1) % self.waypoints.len();
            return;
        }

        self.locomotion
            .steer(&mut self.body, waypoint, self.move_speed, dt);
    }

    /// 調査行動（最終知覚位置へ向かい、到達後しばらくして巡回へ戻る）
    fn investigate_step(&mut self, dt: f64) {
        self.locomotion.steer(
            &mut self.body,
            self.last_known_position,
            self.investigate_speed,
            dt,
        );

        if (self.last_known_position - self.body.position).magnitude_xy() < INVESTIGATE_ARRIVAL_M {
            self.investigate_timer += dt;
            if self.investigate_timer >= self.give_up_s {
                self.investigate_timer = 0.0;
                self.change_state(GuardState::Patrol);
            }
        }
    }

    /// 追跡行動（最高速度でターゲットへ向かう）
    fn engage_step(&mut self, intruder: Option<&Intruder>, dt: f64) {
        self.locomotion.steer(
            &mut self.body,
            self.last_known_position,
            self.chase_speed,
            dt,
        );

        if let Some(target) = intruder.filter(|t| t.is_active()) {
            if self.body.position.distance_3d(&target.position) <= self.attack_range {
                self.attack(target);
            }
        }
    }

    /// 攻撃フック（ダメージ解決は行わないno-op）
    fn attack(&self, target: &Intruder) {
        debug!(
            guard_id = %self.id,
            target_id = %target.id,
            distance = self.body.position.distance_3d(&target.position),
            "GUARD_ATTACK: 攻撃フックが発動しました（ダメージ処理なし）"
        );
    }

    /// 外部警報の受信
    ///
    /// カメラの放送から呼び出され、知覚・メーターを迂回して警戒状態を
    /// 強制します。既に警戒中の場合は最終知覚位置の更新のみ行います（冪等）。
    pub fn external_alert(&mut self, suspect_position: Position3D) {
        self.last_known_position = suspect_position;
        if self.state != GuardState::Alert {
            self.change_state(GuardState::Alert);
        }
    }

    /// 正規化済み検知値 [0,1]
    pub fn detection_ratio(&self) -> f64 {
        self.meter.ratio()
    }

    /// 状態遷移（同一状態への遷移は無視）
    fn change_state(&mut self, next: GuardState) {
        if self.state == next {
            return;
        }

        info!(
            guard_id = %self.id,
            previous_state = ?self.state,
            next_state = ?next,
            detection = self.meter.value(),
            position_x = self.body.position.x,
            position_y = self.body.position.y,
            "GUARD_STATE_TRANSITION: ガードの行動状態が遷移しました"
        );

        self.investigate_timer = 0.0;
        self.state = next;
    }
}

impl IAgent for Guard {
    fn initialize(&mut self, scenario_config: &crate::scenario::ScenarioConfig) {
        let defaults = &scenario_config.guard_defaults;

        self.state = GuardState::Patrol;
        self.status = AgentStatus::Active;
        self.waypoint_index = 0;
        self.investigate_timer = 0.0;
        self.meter = DetectionMeter::new(defaults.fill_rate_per_s, defaults.decay_rate_per_s);
        self.move_speed = defaults.move_speed_mps;
        self.investigate_speed = defaults.investigate_speed_mps;
        self.chase_speed = defaults.chase_speed_mps;
        self.give_up_s = defaults.give_up_s;
        self.attack_range = defaults.attack_range_m;

        self.sense = Box::new(VisionHearingSense {
            vision_range_m: defaults.vision_range_m,
            vision_half_angle_deg: defaults.vision_half_angle_deg,
            hearing_range_m: defaults.hearing_range_m,
            eye_height_m: defaults.eye_height_m,
        });

        // シナリオから自分の移動方式設定を探して適用
        let mut locomotion_kind = "kinematic".to_string();
        for guard_config in &scenario_config.guards {
            if guard_config.id == self.id {
                locomotion_kind = guard_config.locomotion.clone();
                break;
            }
        }

        self.locomotion = match locomotion_kind.as_str() {
            "physics" => Box::new(PhysicsLocomotion::new(
                defaults.turn_speed_deg_s,
                defaults.chase_speed_mps,
                defaults.max_accel_mps2,
            )),
            _ => Box::new(KinematicLocomotion {
                turn_speed_deg_s: defaults.turn_speed_deg_s,
            }),
        };
    }

    fn tick(&mut self, _dt: f64) {
        // 実際の知覚・行動処理は外部コンテキストが必要なため、
        // シミュレーションループから update が呼ばれることで実行される
    }

    fn get_id(&self) -> String {
        self.id.clone()
    }

    fn is_active(&self) -> bool {
        self.status == AgentStatus::Active
    }
}
