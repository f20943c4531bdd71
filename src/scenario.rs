use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// シナリオメタデータ
#[derive(Debug, Deserialize, Serialize)]
pub struct ScenarioMeta {
    pub version: String,
    pub name: String,
    pub description: String,
}

/// シミュレーション設定
#[derive(Debug, Deserialize, Serialize)]
pub struct SimulationConfig {
    pub dt_s: f64,
    pub t_max_s: f64,
    pub seed: u64,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RegionRect {
    pub xmin_m: f64,
    pub xmax_m: f64,
    pub ymin_m: f64,
    pub ymax_m: f64,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Position3D {
    pub x_m: f64,
    pub y_m: f64,
    pub z_m: f64,
}

/// 世界設定（領域と遮蔽物）
#[derive(Debug, Deserialize, Serialize)]
pub struct WorldConfig {
    pub region_rect: RegionRect,
    pub obstacles: Vec<ObstacleConfig>,
}

/// 遮蔽物設定（球コライダー）
#[derive(Debug, Deserialize, Serialize)]
pub struct ObstacleConfig {
    pub id: String,
    pub pos: Position3D,
    pub radius_m: f64,
}

/// 侵入者設定
#[derive(Debug, Deserialize, Serialize)]
pub struct IntruderConfig {
    pub id: String,
    pub spawn_time_s: f64,
    pub speed_mps: f64,
    pub body_radius_m: f64,
    pub route: Vec<Position3D>,
}

/// ガード共通パラメータ
#[derive(Debug, Deserialize, Serialize)]
pub struct GuardDefaults {
    pub move_speed_mps: f64,
    pub turn_speed_deg_s: f64,
    pub investigate_speed_mps: f64,
    pub chase_speed_mps: f64,
    pub max_accel_mps2: f64,
    pub vision_range_m: f64,
    pub vision_half_angle_deg: f64,
    pub hearing_range_m: f64,
    pub eye_height_m: f64,
    pub fill_rate_per_s: f64,
    pub decay_rate_per_s: f64,
    pub give_up_s: f64,
    pub attack_range_m: f64,
}

/// 個別ガード設定
#[derive(Debug, Deserialize, Serialize)]
pub struct GuardConfig {
    pub id: String,
    pub pos: Position3D,
    pub yaw_deg: f64,
    /// 移動方式: "kinematic" または "physics"
    pub locomotion: String,
    pub waypoints: Vec<Position3D>,
}

/// カメラ共通パラメータ
#[derive(Debug, Deserialize, Serialize)]
pub struct CameraDefaults {
    pub scan_speed_deg_s: f64,
    pub scan_angle_deg: f64,
    pub kp: f64,
    pub kd: f64,
    pub vision_range_m: f64,
    pub vision_half_angle_deg: f64,
    pub eye_height_m: f64,
    pub proximity_radius_m: f64,
    pub sweep_radius_m: f64,
    pub alert_cooldown_s: f64,
}

/// 個別カメラ設定
#[derive(Debug, Deserialize, Serialize)]
pub struct CameraConfig {
    pub id: String,
    pub pos: Position3D,
    pub yaw_deg: f64,
}

/// 完全なシナリオ設定
#[derive(Debug, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub meta: ScenarioMeta,
    pub sim: SimulationConfig,
    pub world: WorldConfig,
    /// 侵入者（省略時はターゲット不在として動作）
    pub intruder: Option<IntruderConfig>,
    pub guard_defaults: GuardDefaults,
    pub guards: Vec<GuardConfig>,
    pub camera_defaults: CameraDefaults,
    pub cameras: Vec<CameraConfig>,
}

impl ScenarioConfig {
    /// YAMLファイルからシナリオ設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        // ファイル存在チェック
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()));
        }

        // ファイル読み込み
        let contents =
            fs::read_to_string(path).map_err(|e| ScenarioError::IoError(path.to_path_buf(), e))?;

        // YAML解析
        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .map_err(|e| ScenarioError::ParseError(path.to_path_buf(), e))?;

        // 基本的な検証
        config.validate()?;

        Ok(config)
    }

    /// 設定の基本的な検証
    pub fn validate(&self) -> Result<(), ScenarioError> {
        // 時間設定の検証
        if self.sim.dt_s <= 0.0 {
            return Err(ScenarioError::ValidationError(
                "dt_s must be positive".to_string(),
            ));
        }
        if self.sim.t_max_s <= 0.0 {
            return Err(ScenarioError::ValidationError(
                "t_max_s must be positive".to_string(),
            ));
        }

        // 座標範囲の検証
        let region = &self.world.region_rect;
        if region.xmin_m >= region.xmax_m || region.ymin_m >= region.ymax_m {
            return Err(ScenarioError::ValidationError(
                "Invalid region bounds".to_string(),
            ));
        }

        // 知覚パラメータの検証
        if self.guard_defaults.vision_half_angle_deg <= 0.0
            || self.guard_defaults.vision_half_angle_deg > 180.0
        {
            return Err(ScenarioError::ValidationError(
                "vision_half_angle_deg must be in (0, 180]".to_string(),
            ));
        }
        if self.guard_defaults.fill_rate_per_s <= 0.0 || self.guard_defaults.decay_rate_per_s < 0.0
        {
            return Err(ScenarioError::ValidationError(
                "detection rates must be positive".to_string(),
            ));
        }
        if self.camera_defaults.alert_cooldown_s < 0.0 {
            return Err(ScenarioError::ValidationError(
                "alert_cooldown_s must not be negative".to_string(),
            ));
        }

        // 侵入者のスポーン時刻検証
        if let Some(intruder) = &self.intruder {
            if intruder.spawn_time_s >= self.sim.t_max_s {
                return Err(ScenarioError::ValidationError(format!(
                    "Intruder {} spawn time {} >= simulation time {}",
                    intruder.id, intruder.spawn_time_s, self.sim.t_max_s
                )));
            }
        }

        // 配置位置の検証
        for guard in &self.guards {
            if !self.is_position_in_bounds(guard.pos.x_m, guard.pos.y_m) {
                return Err(ScenarioError::ValidationError(format!(
                    "Guard {} outside region bounds",
                    guard.id
                )));
            }
        }
        for camera in &self.cameras {
            if !self.is_position_in_bounds(camera.pos.x_m, camera.pos.y_m) {
                return Err(ScenarioError::ValidationError(format!(
                    "Camera {} outside region bounds",
                    camera.id
                )));
            }
        }

        Ok(())
    }

    /// 位置が領域内かどうかをチェック
    fn is_position_in_bounds(&self, x: f64, y: f64) -> bool {
        let region = &self.world.region_rect;
        x >= region.xmin_m && x <= region.xmax_m && y >= region.ymin_m && y <= region.ymax_m
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        println!("=== シナリオ情報 ===");
        println!("名前: {}", self.meta.name);
        println!("説明: {}", self.meta.description);
        println!("バージョン: {}", self.meta.version);
        println!();

        println!("=== シミュレーション設定 ===");
        println!("時間刻み: {:.3}秒", self.sim.dt_s);
        println!(
            "最大時間: {:.1}秒 ({:.1}分)",
            self.sim.t_max_s,
            self.sim.t_max_s / 60.0
        );
        println!("シード値: {}", self.sim.seed);
        println!();

        println!("=== 警備戦力 ===");
        println!("ガード: {}名", self.guards.len());
        println!("カメラ: {}台", self.cameras.len());
        println!("遮蔽物: {}個", self.world.obstacles.len());
        println!();

        println!("=== 侵入者 ===");
        match &self.intruder {
            Some(intruder) => {
                println!(
                    "  {}: 出現時刻 {:.1}秒, 速度 {:.1}m/s, 経路 {}点",
                    intruder.id,
                    intruder.spawn_time_s,
                    intruder.speed_mps,
                    intruder.route.len()
                );
            }
            None => println!("  なし（知覚対象が存在しないシナリオ）"),
        }
    }
}

/// シナリオ読み込みエラー
#[derive(Debug)]
pub enum ScenarioError {
    FileNotFound(std::path::PathBuf),
    IoError(std::path::PathBuf, std::io::Error),
    ParseError(std::path::PathBuf, serde_yaml::Error),
    ValidationError(String),
}

impl std::fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioError::FileNotFound(path) => {
                write!(f, "シナリオファイルが見つかりません: {}", path.display())
            }
            ScenarioError::IoError(path, err) => {
                write!(f, "ファイル読み込みエラー {}: {}", path.display(), err)
            }
            ScenarioError::ParseError(path, err) => {
                write!(f, "YAML解析エラー {}: {}", path.display(), err)
            }
            ScenarioError::ValidationError(msg) => {
                write!(f, "設定検証エラー: {}", msg)
            }
        }
    }
}

impl std::error::Error for ScenarioError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config() -> ScenarioConfig {
        ScenarioConfig {
            meta: ScenarioMeta {
                version: "1.0".to_string(),
                name: "test".to_string(),
                description: "test scenario".to_string(),
            },
            sim: SimulationConfig {
                dt_s: 0.02,
                t_max_s: 60.0,
                seed: 42,
            },
            world: WorldConfig {
                region_rect: RegionRect {
                    xmin_m: -100.0,
                    xmax_m: 100.0,
                    ymin_m: -100.0,
                    ymax_m: 100.0,
                },
                obstacles: Vec::new(),
            },
            intruder: None,
            guard_defaults: GuardDefaults {
                move_speed_mps: 2.5,
                turn_speed_deg_s: 240.0,
                investigate_speed_mps: 2.8,
                chase_speed_mps: 3.6,
                max_accel_mps2: 10.0,
                vision_range_m: 10.0,
                vision_half_angle_deg: 35.0,
                hearing_range_m: 5.0,
                eye_height_m: 1.6,
                fill_rate_per_s: 60.0,
                decay_rate_per_s: 30.0,
                give_up_s: 1.5,
                attack_range_m: 1.7,
            },
            guards: Vec::new(),
            camera_defaults: CameraDefaults {
                scan_speed_deg_s: 30.0,
                scan_angle_deg: 45.0,
                kp: 0.6,
                kd: 0.1,
                vision_range_m: 12.0,
                vision_half_angle_deg: 35.0,
                eye_height_m: 1.8,
                proximity_radius_m: 2.0,
                sweep_radius_m: 0.35,
                alert_cooldown_s: 1.0,
            },
            cameras: Vec::new(),
        }
    }

    #[test]
    fn test_validate_accepts_minimal_config() {
        assert!(minimal_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_positive_dt() {
        let mut config = minimal_config();
        config.sim.dt_s = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_region() {
        let mut config = minimal_config();
        config.world.region_rect.xmin_m = 200.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_late_spawn() {
        let mut config = minimal_config();
        config.intruder = Some(IntruderConfig {
            id: "TGT001".to_string(),
            spawn_time_s: 120.0, // t_max_s より遅い
            speed_mps: 1.6,
            body_radius_m: 0.4,
            route: Vec::new(),
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_guard_out_of_bounds() {
        let mut config = minimal_config();
        config.guards.push(GuardConfig {
            id: "G001".to_string(),
            pos: Position3D {
                x_m: 500.0,
                y_m: 0.0,
                z_m: 0.0,
            },
            yaw_deg: 0.0,
            locomotion: "kinematic".to_string(),
            waypoints: Vec::new(),
        });
        assert!(config.validate().is_err());
    }
}
