//! # Simulation モジュール
//!
//! 警備シミュレーションの中核となるシミュレーションエンジンを提供します。
//!
//! このモジュールは、時間駆動シミュレーションのメインループを管理し、
//! すべてのエージェント（侵入者、ガード、監視カメラ）の協調動作を制御します。
//! 固定時間刻み（Δt）による数値積分で、知覚・警報・追跡の一連の
//! 警備行動を再現します。
//!
//! ## シミュレーション処理順序
//!
//! 各時間刻みにおいて、以下の順序で処理が実行されます：
//!
//! 1. **侵入者処理**: 出現判定、経路移動
//! 2. **ワールド同期**: 侵入者コライダーの位置反映
//! 3. **ガード処理**: 知覚（視覚・聴覚）と状態機械に応じた行動
//! 4. **物理ステップ**: ガードの運動積分、カメラの首振り制御
//! 5. **カメラ処理**: 3段階トリガによる知覚とクールダウン判定
//! 6. **警報バスのフラッシュ**: 蓄積イベントを全ガードへ配送
//!
//! カメラが生成した警報はフレーム末尾のフラッシュで配送されるため、
//! ガード側からは必ず次フレームの冒頭で観測されます。

use crate::models::{Position3D as ModelPosition3D, *};
use crate::scenario::*;
use tracing::{debug, info, trace, warn};

pub struct SimulationEngine {
    pub current_time: f64,
    pub dt: f64,
    pub max_time: f64,
    pub seed: u64,
    pub step_count: u64,

    pub intruder: Option<Intruder>,
    pub guards: Vec<Guard>,
    pub cameras: Vec<ScanCamera>,
    pub world: World,
    pub alert_bus: AlertBus,

    pub scenario_config: ScenarioConfig,
    pub verbose_level: u8,
}

impl SimulationEngine {
    pub fn new(scenario: ScenarioConfig, verbose_level: u8) -> Self {
        let dt = scenario.sim.dt_s;
        let max_time = scenario.sim.t_max_s;
        let seed = scenario.sim.seed;

        Self {
            current_time: 0.0,
            dt,
            max_time,
            seed,
            step_count: 0,
            intruder: None,
            guards: Vec::new(),
            cameras: Vec::new(),
            world: World::new(Vec::new()),
            alert_bus: AlertBus::new(),
            scenario_config: scenario,
            verbose_level,
        }
    }

    pub fn initialize(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.verbose_level > 0 {
            info!("シミュレーションエンジンを初期化中...");
        }

        self.initialize_world()?;
        self.initialize_intruder()?;
        self.initialize_guards()?;
        self.initialize_cameras()?;

        if self.verbose_level > 0 {
            info!("初期化完了:");
            info!("  ガード: {}名", self.guards.len());
            info!("  カメラ: {}台", self.cameras.len());
            info!("  遮蔽物: {}個", self.world.obstacles.len());
        }

        Ok(())
    }

    fn initialize_world(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let obstacles: Vec<Obstacle> = self
            .scenario_config
            .world
            .obstacles
            .iter()
            .map(|config| Obstacle {
                id: config.id.clone(),
                center: ModelPosition3D::new(config.pos.x_m, config.pos.y_m, config.pos.z_m),
                radius: config.radius_m,
            })
            .collect();

        if self.verbose_level > 1 {
            for obstacle in &obstacles {
                debug!(
                    "遮蔽物配置: {} (位置: {:.0}, {:.0}, 半径: {:.1}m)",
                    obstacle.id, obstacle.center.x, obstacle.center.y, obstacle.radius
                );
            }
        }

        self.world = World::new(obstacles);
        Ok(())
    }

    fn initialize_intruder(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let Some(config) = &self.scenario_config.intruder else {
            // 知覚対象が存在しないシナリオも許容する（ガードは巡回のみ）
            warn!("INTRUDER_MISSING: 侵入者が定義されていません。ガードは巡回のみ行います");
            return Ok(());
        };

        let route: Vec<ModelPosition3D> = config
            .route
            .iter()
            .map(|p| ModelPosition3D::new(p.x_m, p.y_m, p.z_m))
            .collect();

        let start_position = route
            .first()
            .copied()
            .unwrap_or_else(|| ModelPosition3D::new(0.0, 0.0, 0.0));

        let mut intruder = Intruder::new(config.id.clone(), start_position, route);
        intruder.initialize(&self.scenario_config);

        if self.verbose_level > 1 {
            debug!(
                "侵入者初期化: {} (出現時刻: {:.1}秒, 経路: {}点)",
                intruder.get_id(),
                config.spawn_time_s,
                config.route.len()
            );
        }

        self.intruder = Some(intruder);
        Ok(())
    }

    fn initialize_guards(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        for guard_config in &self.scenario_config.guards {
            let position = ModelPosition3D::new(
                guard_config.pos.x_m,
                guard_config.pos.y_m,
                guard_config.pos.z_m,
            );
            let waypoints: Vec<ModelPosition3D> = guard_config
                .waypoints
                .iter()
                .map(|p| ModelPosition3D::new(p.x_m, p.y_m, p.z_m))
                .collect();

            let mut guard = Guard::new(
                guard_config.id.clone(),
                position,
                guard_config.yaw_deg,
                waypoints,
            );
            guard.initialize(&self.scenario_config);

            if self.verbose_level > 1 {
                debug!(
                    "ガード初期化: {} (移動方式: {}, 経路: {}点)",
                    guard.get_id(),
                    guard_config.locomotion,
                    guard_config.waypoints.len()
                );
            }

            self.guards.push(guard);
        }

        Ok(())
    }

    fn initialize_cameras(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        for camera_config in &self.scenario_config.cameras {
            let position = ModelPosition3D::new(
                camera_config.pos.x_m,
                camera_config.pos.y_m,
                camera_config.pos.z_m,
            );

            let mut camera = ScanCamera::new(
                camera_config.id.clone(),
                position,
                camera_config.yaw_deg,
            );
            camera.initialize(&self.scenario_config);

            if self.verbose_level > 1 {
                debug!(
                    "カメラ初期化: {} (基準方位: {:.0}度, 走査角: ±{:.0}度)",
                    camera.get_id(),
                    camera_config.yaw_deg,
                    camera.scan_angle_deg
                );
            }

            self.cameras.push(camera);
        }

        Ok(())
    }

    pub fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("=== シミュレーション実行開始 ===");

        let max_steps = (self.max_time / self.dt).ceil() as u64 + 1;

        while self.current_time < self.max_time {
            self.step();

            if self.verbose_level > 2 {
                trace!("時刻: {:.2}秒 (ステップ: {})", self.current_time, self.step_count);
            }

            if self.step_count % 500 == 0 && self.verbose_level > 0 {
                let progress = (self.current_time / self.max_time) * 100.0;
                info!(
                    "進行状況: {:.1}% ({:.1}/{:.1}秒)",
                    progress, self.current_time, self.max_time
                );
            }

            if self.step_count > max_steps {
                break;
            }
        }

        info!("=== シミュレーション完了 ===");
        info!("実行時間: {:.1}秒", self.current_time);
        info!("総ステップ数: {}", self.step_count);
        info!("警報放送数: {}", self.alert_bus.total_broadcasts);
        for guard in &self.guards {
            info!("  {}: 最終状態 {:?}", guard.get_id(), guard.state);
        }

        Ok(())
    }

    fn step(&mut self) {
        self.process_intruder();
        self.sync_world();
        self.process_guards();
        self.fixed_steps();
        self.process_cameras();
        self.alert_bus.flush(&mut self.guards);

        self.current_time += self.dt;
        self.step_count += 1;
    }

    fn process_intruder(&mut self) {
        if let Some(intruder) = &mut self.intruder {
            intruder.check_spawn(self.current_time);
            if intruder.is_active() {
                intruder.tick(self.dt);
            }
        }
    }

    /// 侵入者の当たり判定体をワールドに反映する
    ///
    /// 知覚クエリは必ずこの同期後の位置を観測します。
    fn sync_world(&mut self) {
        let collider = self
            .intruder
            .as_ref()
            .filter(|t| t.is_active())
            .map(|t| TargetCollider {
                id: t.id.clone(),
                center: t.position,
                radius: t.body_radius,
            });
        self.world.set_target_collider(collider);
    }

    fn process_guards(&mut self) {
        let intruder = self.intruder.as_ref();
        for guard in &mut self.guards {
            if guard.is_active() {
                guard.update(&self.world, intruder, self.dt);
            }
        }
    }

    fn fixed_steps(&mut self) {
        for guard in &mut self.guards {
            guard.fixed_tick(self.dt);
        }
        for camera in &mut self.cameras {
            camera.fixed_tick(self.dt);
        }
    }

    fn process_cameras(&mut self) {
        let intruder = self.intruder.as_ref();
        for camera in &mut self.cameras {
            if let Some(event) = camera.perceive(&self.world, intruder, self.current_time) {
                self.alert_bus.push(event);
            }
        }
    }
}
