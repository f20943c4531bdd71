use crate::models::common::{AgentBody, Position3D};
use crate::models::world::World;

/// 全てのシミュレーションエージェントが実装する基本インターフェース
pub trait IAgent {
    /// エージェントの初期化
    fn initialize(&mut self, scenario_config: &crate::scenario::ScenarioConfig);

    /// 1ティックの処理実行
    fn tick(&mut self, dt: f64);

    /// エージェントIDの取得
    fn get_id(&self) -> String;

    /// エージェントがアクティブかどうか
    fn is_active(&self) -> bool;
}

/// 知覚結果
///
/// 視認はlast known positionの更新と検知メーター加算を伴い、
/// 聴覚は位置更新のみの弱いトリガーとして扱われます。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SenseResult {
    /// 何も知覚していない
    None,
    /// 聴覚圏内で物音を聞いた（知覚位置つき）
    Heard(Position3D),
    /// 視界内に目視した（知覚位置つき）
    Seen(Position3D),
}

/// 知覚戦略のインターフェース
///
/// エージェント本体から切り離した差し替え可能な知覚能力です。
pub trait ISense {
    /// 1ティック分の知覚判定
    fn sense(&self, body: &AgentBody, world: &World, target_position: Position3D) -> SenseResult;
}

/// 移動戦略のインターフェース
///
/// 運動の積分方式（キネマティック/物理速度ベース）をエージェント生成時に
/// 選択できるようにする差し替え可能な移動能力です。
pub trait ILocomotion {
    /// 目標地点への操舵（可変ステップ）
    fn steer(&mut self, body: &mut AgentBody, goal: Position3D, speed: f64, dt: f64);

    /// 停止指示
    fn stop(&mut self, body: &mut AgentBody);

    /// 運動の積分（固定ステップ）
    fn fixed_tick(&mut self, body: &mut AgentBody, dt: f64);
}
