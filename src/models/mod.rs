// 基本的なデータ型と数学ユーティリティ
pub mod common;

// エージェントの基本インターフェース（trait）定義
pub mod traits;

// 知覚・移動の構成部品と物理クエリサーフェス
pub mod locomotion;
pub mod perception;
pub mod world;

// 各エージェントモデルの実装
pub mod camera;
pub mod guard;
pub mod intruder;

// 警報放送バス
pub mod alert;

// 便利な re-export
pub use alert::{AlertBus, AlertEvent};
pub use camera::ScanCamera;
pub use common::*;
pub use guard::{Guard, GuardState};
pub use intruder::Intruder;
pub use locomotion::{KinematicLocomotion, PhysicsLocomotion};
pub use perception::{DetectionMeter, VisionHearingSense};
pub use traits::*;
pub use world::{ColliderId, ColliderMask, Obstacle, RayHit, TargetCollider, World};
