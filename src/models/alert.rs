use crate::models::{common::Position3D, guard::Guard, traits::IAgent};
use tracing::debug;

/// 警報イベント
///
/// カメラが検知に成功したときに放送バスへ積まれるイベントです。
#[derive(Debug, Clone)]
pub struct AlertEvent {
    /// 発信元カメラのID
    pub camera_id: String,
    /// 検知時のターゲット位置
    pub target_position: Position3D,
    /// 発信時刻（シミュレーション秒）
    pub timestamp: f64,
}

/// 警報放送バス
///
/// カメラからの警報を全ガードへファンアウトする明示的な配送路です。
/// カメラは知覚ステップ中にイベントを積み、エンジンがフレーム末尾で
/// flushを呼び出して全ガードに配送します。配送順はガード集合の列挙順に
/// よらず決定的で、強制警戒は常に次フレームの移動ステップから反映されます。
#[derive(Debug, Default)]
pub struct AlertBus {
    /// 今フレームに積まれた未配送イベント
    queue: Vec<AlertEvent>,
    /// 累計放送イベント数
    pub total_broadcasts: u64,
    /// 累計配送回数（イベント数 × 受信ガード数）
    pub total_deliveries: u64,
}

impl AlertBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// イベントの投入（カメラの知覚ステップから呼ばれる）
    pub fn push(&mut self, event: AlertEvent) {
        self.queue.push(event);
    }

    /// 未配送イベント数
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// フレーム末尾の一括配送
    ///
    /// 積まれた全イベントを全アクティブガードのexternal_alertへ配送し、
    /// キューを空にします。
    pub fn flush(&mut self, guards: &mut [Guard]) {
        for event in self.queue.drain(..) {
            self.total_broadcasts += 1;
            for guard in guards.iter_mut() {
                if guard.is_active() {
                    guard.external_alert(event.target_position);
                    self.total_deliveries += 1;
                }
            }
            debug!(
                camera_id = %event.camera_id,
                timestamp = event.timestamp,
                guard_count = guards.len(),
                "ALERT_BUS_FLUSH: 警報イベントを全ガードに配送しました"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{common::Position3D, guard::GuardState};

    fn bus_guard(id: &str) -> Guard {
        Guard::new(
            id.to_string(),
            Position3D::new(0.0, 0.0, 0.0),
            0.0,
            Vec::new(),
        )
    }

    #[test]
    fn test_flush_fans_out_to_all_guards() {
        let mut bus = AlertBus::new();
        let mut guards = vec![bus_guard("G001"), bus_guard("G002")];
        bus.push(AlertEvent {
            camera_id: "C001".to_string(),
            target_position: Position3D::new(3.0, 4.0, 0.0),
            timestamp: 1.0,
        });
        assert_eq!(bus.pending(), 1);
        bus.flush(&mut guards);
        assert_eq!(bus.pending(), 0);
        assert_eq!(bus.total_broadcasts, 1);
        assert_eq!(bus.total_deliveries, 2);
        for guard in &guards {
            assert_eq!(guard.state, GuardState::Alert);
            assert_eq!(
                guard.last_known_position,
                Position3D::new(3.0, 4.0, 0.0)
            );
        }
    }

    #[test]
    fn test_flush_without_events_is_noop() {
        let mut bus = AlertBus::new();
        let mut guards = vec![bus_guard("G001")];
        bus.flush(&mut guards);
        assert_eq!(guards[0].state, GuardState::Patrol);
        assert_eq!(bus.total_broadcasts, 0);
    }
}
