use crate::models::common::Position3D;

/// 物理クエリの対象種別マスク
///
/// 遮蔽物のみ・ターゲットのみ・両方のいずれを判定対象にするかを
/// 指定します。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColliderMask {
    pub obstacles: bool,
    pub target: bool,
}

impl ColliderMask {
    /// 遮蔽物のみ
    pub const OBSTACLE: ColliderMask = ColliderMask {
        obstacles: true,
        target: false,
    };
    /// ターゲットのみ
    pub const TARGET: ColliderMask = ColliderMask {
        obstacles: false,
        target: true,
    };
    /// 全対象
    pub const ALL: ColliderMask = ColliderMask {
        obstacles: true,
        target: true,
    };
}

/// クエリが返す衝突対象の識別子
#[derive(Debug, Clone, PartialEq)]
pub enum ColliderId {
    Obstacle(String),
    Target(String),
}

/// レイ・スイープクエリのヒット情報
#[derive(Debug, Clone)]
pub struct RayHit {
    /// 始点からヒット点までの距離（メートル）
    pub distance: f64,
    /// ヒットした対象
    pub collider: ColliderId,
}

/// 遮蔽物（球コライダー）
#[derive(Debug, Clone)]
pub struct Obstacle {
    pub id: String,
    pub center: Position3D,
    pub radius: f64,
}

/// ターゲットの当たり判定体
#[derive(Debug, Clone)]
pub struct TargetCollider {
    pub id: String,
    pub center: Position3D,
    pub radius: f64,
}

/// 物理クエリサーフェス
///
/// エージェントの知覚が消費する同期的なクエリ群（レイキャスト、
/// スフィアキャスト、オーバーラップ）を提供します。遮蔽物は球コライダーとして
/// シナリオから構築され、ターゲットの当たり判定体は毎フレーム
/// シミュレーションエンジンが同期します。
#[derive(Debug)]
pub struct World {
    pub obstacles: Vec<Obstacle>,
    target: Option<TargetCollider>,
}

impl World {
    pub fn new(obstacles: Vec<Obstacle>) -> Self {
        Self {
            obstacles,
            target: None,
        }
    }

    /// ターゲット当たり判定体の同期（毎フレーム呼び出し）
    pub fn set_target_collider(&mut self, target: Option<TargetCollider>) {
        self.target = target;
    }

    pub fn target_collider(&self) -> Option<&TargetCollider> {
        self.target.as_ref()
    }

    /// レイキャスト
    ///
    /// 始点から方向ベクトルに沿って最大距離までレイを飛ばし、
    /// 最も近いヒットを返します。ヒットがない場合はNoneです。
    ///
    /// # 引数
    ///
    /// * `origin` - レイの始点
    /// * `direction` - レイの方向（単位ベクトル）
    /// * `max_distance` - 最大距離（メートル）
    /// * `mask` - 対象種別マスク
    pub fn raycast(
        &self,
        origin: Position3D,
        direction: Position3D,
        max_distance: f64,
        mask: ColliderMask,
    ) -> Option<RayHit> {
        self.sweep(origin, 0.0, direction, max_distance, mask)
    }

    /// スフィアキャスト
    ///
    /// 半径を持つ球を方向ベクトルに沿って掃引し、最も近いヒットを返します。
    pub fn sphere_cast(
        &self,
        origin: Position3D,
        radius: f64,
        direction: Position3D,
        max_distance: f64,
        mask: ColliderMask,
    ) -> Option<RayHit> {
        self.sweep(origin, radius, direction, max_distance, mask)
    }

    /// スフィアオーバーラップ
    ///
    /// 中心と半径で指定した球と交差している対象の識別子を返します。
    pub fn sphere_overlap(
        &self,
        center: Position3D,
        radius: f64,
        mask: ColliderMask,
    ) -> Vec<ColliderId> {
        let mut hits = Vec::new();

        if mask.obstacles {
            for obstacle in &self.obstacles {
                if center.distance_3d(&obstacle.center) <= radius + obstacle.radius {
                    hits.push(ColliderId::Obstacle(obstacle.id.clone()));
                }
            }
        }

        if mask.target {
            if let Some(target) = &self.target {
                if center.distance_3d(&target.center) <= radius + target.radius {
                    hits.push(ColliderId::Target(target.id.clone()));
                }
            }
        }

        hits
    }

    /// 掃引クエリの共通実装（radius=0でレイキャスト）
    fn sweep(
        &self,
        origin: Position3D,
        radius: f64,
        direction: Position3D,
        max_distance: f64,
        mask: ColliderMask,
    ) -> Option<RayHit> {
        let dir = direction.normalized();
        if dir.magnitude() < 1e-9 || max_distance <= 0.0 {
            return None;
        }

        let mut nearest: Option<RayHit> = None;

        if mask.obstacles {
            for obstacle in &self.obstacles {
                if let Some(t) =
                    ray_sphere_distance(origin, dir, obstacle.center, obstacle.radius + radius)
                {
                    if t <= max_distance {
                        Self::keep_nearest(
                            &mut nearest,
                            t,
                            ColliderId::Obstacle(obstacle.id.clone()),
                        );
                    }
                }
            }
        }

        if mask.target {
            if let Some(target) = &self.target {
                if let Some(t) =
                    ray_sphere_distance(origin, dir, target.center, target.radius + radius)
                {
                    if t <= max_distance {
                        Self::keep_nearest(&mut nearest, t, ColliderId::Target(target.id.clone()));
                    }
                }
            }
        }

        nearest
    }

    fn keep_nearest(nearest: &mut Option<RayHit>, distance: f64, collider: ColliderId) {
        let closer = match nearest {
            Some(hit) => distance < hit.distance,
            None => true,
        };
        if closer {
            *nearest = Some(RayHit { distance, collider });
        }
    }
}

/// レイと球の交差距離を計算
///
/// 交差する場合は始点から交差点までの距離を返します。始点が球の内部に
/// ある場合は距離0として扱います。
fn ray_sphere_distance(
    origin: Position3D,
    dir: Position3D,
    center: Position3D,
    radius: f64,
) -> Option<f64> {
    let oc = center - origin;
    let oc_sq = oc.x * oc.x + oc.y * oc.y + oc.z * oc.z;
    let radius_sq = radius * radius;

    // 始点が球内部
    if oc_sq <= radius_sq {
        return Some(0.0);
    }

    let proj = oc.x * dir.x + oc.y * dir.y + oc.z * dir.z;
    if proj < 0.0 {
        return None; // 球が後方
    }

    let closest_sq = oc_sq - proj * proj;
    if closest_sq > radius_sq {
        return None; // レイが球を逸れる
    }

    Some(proj - (radius_sq - closest_sq).sqrt())
}
