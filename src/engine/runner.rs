use super::client::{SimulationEngine, SimulationFrame, TrafficLightState};
use super::error::EngineError;
use super::events::{EngineCommand, EngineEvent, FinishReason};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// 폴링 작업 실행 정보.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// `*.sumocfg` 경로.
    pub config_file: PathBuf,
    /// 틱 간격.
    pub tick: Duration,
}

/// 엔진에 연결해 틱마다 한 스텝씩 진행하며 프레임을 보낸다.
///
/// 완료, 실패, 취소 어느 경우든 `disconnect`를 정확히 한 번 호출하고
/// `SimulationFinished`를 보낸 뒤 끝난다.
pub async fn run_simulation(
    mut engine: Box<dyn SimulationEngine>,
    config: RunConfig,
    events: UnboundedSender<EngineEvent>,
    mut commands: UnboundedReceiver<EngineCommand>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let reason = drive(engine.as_mut(), &config, &events, &mut commands, &cancel).await;
    if let Err(err) = engine.disconnect().await {
        warn!(%err, "엔진 연결 종료 실패");
    }
    info!(%reason, "시뮬레이션 종료");
    let _ = events.send(EngineEvent::SimulationFinished { reason });
    Ok(())
}

async fn drive(
    engine: &mut dyn SimulationEngine,
    config: &RunConfig,
    events: &UnboundedSender<EngineEvent>,
    commands: &mut UnboundedReceiver<EngineCommand>,
    cancel: &CancellationToken,
) -> FinishReason {
    let connected = tokio::select! {
        biased;
        _ = cancel.cancelled() => return FinishReason::Cancelled,
        result = engine.connect(&config.config_file) => result,
    };
    if let Err(err) = connected {
        error!(%err, "엔진 연결 실패");
        return FinishReason::Failed(format!("연결 실패: {err}"));
    }
    let bounds = match engine.network_bounds().await {
        Ok(bounds) => Some(bounds),
        Err(err) => {
            warn!(%err, "네트워크 경계 조회 실패");
            None
        }
    };
    let _ = events.send(EngineEvent::Connected { bounds });

    let mut ticker = interval(config.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return FinishReason::Cancelled,
            _ = ticker.tick() => {}
        }
        while let Ok(command) = commands.try_recv() {
            apply_command(engine, command).await;
        }
        let stepped = tokio::select! {
            biased;
            _ = cancel.cancelled() => return FinishReason::Cancelled,
            result = engine.step() => result,
        };
        match stepped {
            Ok(true) => {}
            Ok(false) => return FinishReason::Completed,
            Err(err) => {
                warn!(%err, "스텝 실패");
                return FinishReason::Failed(err.to_string());
            }
        }
        match collect_frame(engine).await {
            Ok(frame) => {
                let _ = events.send(EngineEvent::Frame(frame));
            }
            Err(err) => {
                warn!(%err, "상태 조회 실패");
                return FinishReason::Failed(err.to_string());
            }
        }
    }
}

async fn apply_command(engine: &mut dyn SimulationEngine, command: EngineCommand) {
    match command {
        EngineCommand::SetTrafficLight { id, state } => {
            match engine.set_traffic_light_state(&id, &state).await {
                Ok(()) => info!(light = %id, %state, "신호 상태 변경"),
                Err(err) => warn!(light = %id, %err, "신호 상태 변경 실패"),
            }
        }
    }
}

/// 차량, 시계, 신호등 상태를 한 프레임으로 모은다.
async fn collect_frame(
    engine: &mut dyn SimulationEngine,
) -> Result<SimulationFrame, EngineError> {
    let mut vehicles = BTreeMap::new();
    for id in engine.vehicle_ids().await? {
        if let Some(state) = engine.vehicle_state(&id).await? {
            vehicles.insert(id, state);
        }
    }
    let time = engine.simulation_time().await?;
    let mut traffic_lights = Vec::new();
    for id in engine.traffic_light_ids().await? {
        let state = engine.traffic_light_state(&id).await?;
        traffic_lights.push(TrafficLightState { id, state });
    }
    Ok(SimulationFrame {
        time,
        vehicles,
        traffic_lights,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::client::{NetworkBounds, VehicleState};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    /// 정해진 횟수만큼 진행한 뒤 끝나는 가짜 엔진.
    struct ScriptedEngine {
        steps_left: usize,
        fail_connect: bool,
        fail_step: bool,
        hang_step: bool,
        disconnects: Arc<AtomicUsize>,
        light_sets: Arc<AtomicUsize>,
        time: f64,
    }

    impl ScriptedEngine {
        fn new(steps: usize, disconnects: Arc<AtomicUsize>) -> Self {
            Self {
                steps_left: steps,
                fail_connect: false,
                fail_step: false,
                hang_step: false,
                disconnects,
                light_sets: Arc::new(AtomicUsize::new(0)),
                time: 0.0,
            }
        }
    }

    #[async_trait]
    impl SimulationEngine for ScriptedEngine {
        async fn connect(&mut self, _config: &Path) -> Result<(), EngineError> {
            if self.fail_connect {
                return Err(EngineError::Unavailable("테스트".into()));
            }
            Ok(())
        }

        async fn step(&mut self) -> Result<bool, EngineError> {
            if self.fail_step {
                return Err(EngineError::Protocol("끊김".into()));
            }
            if self.hang_step {
                std::future::pending::<()>().await;
            }
            if self.steps_left == 0 {
                return Ok(false);
            }
            self.steps_left -= 1;
            self.time += 0.1;
            Ok(true)
        }

        async fn disconnect(&mut self) -> Result<(), EngineError> {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
            Err(EngineError::NotConnected)
        }

        async fn vehicle_ids(&mut self) -> Result<Vec<String>, EngineError> {
            Ok(vec!["veh0".into(), "gone".into()])
        }

        async fn vehicle_state(&mut self, id: &str) -> Result<Option<VehicleState>, EngineError> {
            if id == "gone" {
                return Ok(None);
            }
            Ok(Some(VehicleState {
                position: (self.time * 10.0, 0.0),
                speed: 12.0,
                ..Default::default()
            }))
        }

        async fn simulation_time(&mut self) -> Result<f64, EngineError> {
            Ok(self.time)
        }

        async fn traffic_light_ids(&mut self) -> Result<Vec<String>, EngineError> {
            Ok(vec!["tl0".into()])
        }

        async fn traffic_light_state(&mut self, _id: &str) -> Result<String, EngineError> {
            Ok("GrGr".into())
        }

        async fn set_traffic_light_state(
            &mut self,
            _id: &str,
            _state: &str,
        ) -> Result<(), EngineError> {
            self.light_sets.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn network_bounds(&mut self) -> Result<NetworkBounds, EngineError> {
            Ok(NetworkBounds::default())
        }
    }

    fn run_config() -> RunConfig {
        RunConfig {
            config_file: PathBuf::from("sim.sumocfg"),
            tick: Duration::from_millis(10),
        }
    }

    async fn run(engine: ScriptedEngine, cancel: CancellationToken) -> Vec<EngineEvent> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (_cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        run_simulation(Box::new(engine), run_config(), tx, cmd_rx, cancel)
            .await
            .expect("러너 실행 실패");
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn finished_count(events: &[EngineEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, EngineEvent::SimulationFinished { .. }))
            .count()
    }

    /// 엔진이 완료를 알리면 프레임을 보낸 뒤 한 번만 종료한다.
    #[tokio::test]
    async fn completes_when_engine_reports_no_more_vehicles() {
        let disconnects = Arc::new(AtomicUsize::new(0));
        let events = run(
            ScriptedEngine::new(3, disconnects.clone()),
            CancellationToken::new(),
        )
        .await;
        let frames: Vec<&SimulationFrame> = events
            .iter()
            .filter_map(|e| match e {
                EngineEvent::Frame(frame) => Some(frame),
                _ => None,
            })
            .collect();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].vehicles.len(), 1);
        assert_eq!(frames[0].traffic_lights[0].state, "GrGr");
        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
        assert_eq!(finished_count(&events), 1);
        assert!(matches!(
            events.last(),
            Some(EngineEvent::SimulationFinished {
                reason: FinishReason::Completed
            })
        ));
    }

    /// 스텝 오류는 시뮬레이션 종료로 처리한다.
    #[tokio::test]
    async fn step_failure_ends_simulation() {
        let disconnects = Arc::new(AtomicUsize::new(0));
        let mut engine = ScriptedEngine::new(10, disconnects.clone());
        engine.fail_step = true;
        let events = run(engine, CancellationToken::new()).await;
        assert!(!events.iter().any(|e| matches!(e, EngineEvent::Frame(_))));
        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
        assert_eq!(finished_count(&events), 1);
    }

    /// 연결에 실패해도 연결 해제와 종료 이벤트는 한 번씩 일어난다.
    #[tokio::test]
    async fn connect_failure_still_disconnects_once() {
        let disconnects = Arc::new(AtomicUsize::new(0));
        let mut engine = ScriptedEngine::new(10, disconnects.clone());
        engine.fail_connect = true;
        let events = run(engine, CancellationToken::new()).await;
        assert!(!events.iter().any(|e| matches!(e, EngineEvent::Connected { .. })));
        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
        assert_eq!(finished_count(&events), 1);
    }

    /// 취소하면 다음 틱 전에 멈춘다.
    #[tokio::test]
    async fn cancellation_stops_polling() {
        let disconnects = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let events = run(ScriptedEngine::new(1000, disconnects.clone()), cancel).await;
        assert!(!events.iter().any(|e| matches!(e, EngineEvent::Frame(_))));
        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
        assert!(matches!(
            events.last(),
            Some(EngineEvent::SimulationFinished {
                reason: FinishReason::Cancelled
            })
        ));
    }

    /// 응답하지 않는 스텝도 취소하면 빠져나온다.
    #[tokio::test]
    async fn cancellation_interrupts_hung_step() {
        let disconnects = Arc::new(AtomicUsize::new(0));
        let mut engine = ScriptedEngine::new(10, disconnects.clone());
        engine.hang_step = true;
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });
        let events = tokio::time::timeout(Duration::from_secs(5), run(engine, cancel))
            .await
            .expect("취소 후에도 러너가 끝나지 않음");
        assert!(events.iter().any(|e| matches!(e, EngineEvent::Connected { .. })));
        assert!(!events.iter().any(|e| matches!(e, EngineEvent::Frame(_))));
        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
        assert_eq!(finished_count(&events), 1);
        assert!(matches!(
            events.last(),
            Some(EngineEvent::SimulationFinished {
                reason: FinishReason::Cancelled
            })
        ));
    }

    /// 대기 중인 신호 변경 명령은 스텝 전에 적용된다.
    #[tokio::test]
    async fn pending_light_commands_are_applied() {
        let disconnects = Arc::new(AtomicUsize::new(0));
        let engine = ScriptedEngine::new(1, disconnects);
        let light_sets = engine.light_sets.clone();
        let (tx, _rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        cmd_tx
            .send(EngineCommand::SetTrafficLight {
                id: "tl0".into(),
                state: "rrrr".into(),
            })
            .expect("명령 전송 실패");
        run_simulation(Box::new(engine), run_config(), tx, cmd_rx, CancellationToken::new())
            .await
            .expect("러너 실행 실패");
        assert_eq!(light_sets.load(Ordering::SeqCst), 1);
    }
}
