use super::overlay::VehicleOverlay;
use super::{SimulationSettings, SimulationStatus};
use crate::engine::{
    EngineCommand, EngineError, EngineEvent, FinishReason, RunConfig, SumoInstallation,
    TrafficLightState, TraciEngine, run_simulation,
};
use crate::network::{NetworkSnapshot, SumoConfigSpec, config_xml, route_edge_ids, route_xml};
use crate::theme::ScenePalette;
use anyhow::{Context, anyhow, bail};
use eframe::egui;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// 메모리에 보관하는 최대 엔진 로그 라인 수.
pub(crate) const MAX_LOG_LINES: usize = 500;

/// 시뮬레이션 실행 상태와 폴링 작업을 관리한다.
pub struct SimulationController {
    pub settings: SimulationSettings,
    install: Option<SumoInstallation>,
    status: SimulationStatus,
    cancel_token: Option<CancellationToken>,
    commands: Option<UnboundedSender<EngineCommand>>,
    events_rx: Option<UnboundedReceiver<EngineEvent>>,
    work_dir: Option<PathBuf>,
    traffic_lights: Vec<TrafficLightState>,
    logs: Vec<String>,
    /// 최근 캔버스 크기. 화면 맞춤에 쓴다.
    pub(crate) viewport: egui::Vec2,
    pub overlay: VehicleOverlay,
}

impl SimulationController {
    pub fn new(
        settings: SimulationSettings,
        install: Option<SumoInstallation>,
        palette: ScenePalette,
    ) -> Self {
        Self {
            settings,
            install,
            status: SimulationStatus::Ready,
            cancel_token: None,
            commands: None,
            events_rx: None,
            work_dir: None,
            traffic_lights: Vec::new(),
            logs: Vec::new(),
            viewport: egui::vec2(800.0, 600.0),
            overlay: VehicleOverlay::new(palette),
        }
    }

    pub fn status(&self) -> &SimulationStatus {
        &self.status
    }

    pub fn engine_available(&self) -> bool {
        self.install.is_some()
    }

    pub fn traffic_lights(&self) -> &[TrafficLightState] {
        &self.traffic_lights
    }

    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    /// 마지막 실행 파일이 저장된 디렉터리.
    pub fn work_dir(&self) -> Option<&Path> {
        self.work_dir.as_deref()
    }

    /// 시뮬레이션 시계 / 설정 길이 비율(0..=1).
    pub fn progress(&self) -> f32 {
        let duration = f64::from(self.settings.duration.max(1));
        (self.overlay.stats().simulation_time / duration).clamp(0.0, 1.0) as f32
    }

    /// 경로/설정 파일을 만들고 폴링 작업을 띄운다.
    ///
    /// 엔진이 없거나 네트워크 파일이 없으면 아무것도 시작하지 않고 오류를 돌려준다.
    pub fn start(
        &mut self,
        runtime: &Handle,
        net_file: Option<&Path>,
        network: &NetworkSnapshot,
    ) -> anyhow::Result<()> {
        if self.status.is_active() {
            return Ok(());
        }
        let install = self.install.clone().ok_or_else(|| {
            anyhow!(EngineError::Unavailable(
                "SUMO_HOME 또는 PATH에서 sumo를 찾지 못했습니다".into()
            ))
        })?;
        let net_file = match net_file {
            Some(path) if path.is_file() => path.to_path_buf(),
            _ => bail!("먼저 네트워크를 net.xml로 내보내거나 불러오세요"),
        };
        self.settings = self.settings.clamped();
        let settings = self.settings.clone();
        let config_file = self
            .prepare_run_files(&net_file, &settings)
            .context("시뮬레이션 파일 생성 실패")?;

        let (tx, rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        let engine = TraciEngine::new(install, settings.port, tx.clone());
        runtime.spawn(run_simulation(
            Box::new(engine),
            RunConfig {
                config_file,
                tick: settings.tick_interval(),
            },
            tx,
            cmd_rx,
            token.clone(),
        ));
        info!(
            vehicles = settings.vehicle_count,
            tick_ms = settings.tick_interval().as_millis() as u64,
            "시뮬레이션 시작"
        );
        self.overlay.clear_vehicles();
        self.overlay.draw_network(network, self.viewport);
        self.traffic_lights.clear();
        self.logs.clear();
        self.events_rx = Some(rx);
        self.commands = Some(cmd_tx);
        self.cancel_token = Some(token);
        self.status = SimulationStatus::Starting;
        Ok(())
    }

    fn prepare_run_files(
        &mut self,
        net_file: &Path,
        settings: &SimulationSettings,
    ) -> anyhow::Result<PathBuf> {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("시스템 시간이 UTC epoch 이전입니다")?
            .as_millis();
        let dir = std::env::temp_dir().join(format!("traffic_dashboard_run_{ts}"));
        fs::create_dir_all(&dir)
            .with_context(|| format!("작업 디렉터리 생성 실패: {}", dir.display()))?;

        let route_file = dir.join("routes.rou.xml");
        let edges = route_edge_ids(net_file);
        let routes = route_xml(
            &edges,
            settings.vehicle_count,
            settings.duration,
            settings.distribution,
            &mut rand::thread_rng(),
        );
        fs::write(&route_file, routes)
            .with_context(|| format!("경로 파일 쓰기 실패: {}", route_file.display()))?;

        let config_file = dir.join("sim.sumocfg");
        let spec = SumoConfigSpec {
            net_file: net_file.to_path_buf(),
            route_file,
            duration: settings.duration,
            step_length: settings.step_length,
            output_dir: settings.collect_data.then(|| dir.clone()),
        };
        fs::write(&config_file, config_xml(&spec))
            .with_context(|| format!("설정 파일 쓰기 실패: {}", config_file.display()))?;
        self.work_dir = Some(dir);
        Ok(config_file)
    }

    /// 폴링을 멈추고 UI 상태를 준비 상태로 되돌린다.
    ///
    /// 시작하지 않았거나 이미 멈춘 상태에서도 안전하다. 연결 해제는 폴링 작업이
    /// 취소를 받고 수행한다.
    pub fn stop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
            info!("시뮬레이션 중지 요청");
        }
        self.commands = None;
        self.events_rx = None;
        self.traffic_lights.clear();
        self.overlay.clear_vehicles();
        self.status = SimulationStatus::Ready;
    }

    /// 신호등 상태 변경을 실행 중인 작업에 전달한다.
    pub fn set_traffic_light(&mut self, id: &str, state: &str) -> anyhow::Result<()> {
        let sender = self
            .commands
            .as_ref()
            .ok_or_else(|| anyhow!(EngineError::NotConnected))?;
        sender
            .send(EngineCommand::SetTrafficLight {
                id: id.to_string(),
                state: state.to_string(),
            })
            .map_err(|_| anyhow!("시뮬레이션 작업이 이미 종료되었습니다"))
    }

    /// 쌓인 엔진 이벤트를 모두 처리한다. 사용자에게 알릴 경고가 있으면 반환한다.
    pub fn drain_events(&mut self) -> Option<String> {
        let mut warning = None;
        if let Some(mut rx) = self.events_rx.take() {
            let mut finished = false;
            while let Ok(event) = rx.try_recv() {
                if let Some(message) = self.handle_event(event) {
                    warning = Some(message);
                }
                if !self.status.is_active() {
                    finished = true;
                }
            }
            if !finished {
                self.events_rx = Some(rx);
            }
        }
        warning
    }

    pub(crate) fn handle_event(&mut self, event: EngineEvent) -> Option<String> {
        match event {
            EngineEvent::Connected { bounds } => {
                self.status = SimulationStatus::Running;
                if let Some(bounds) = bounds {
                    self.overlay.fit_bounds(bounds, self.viewport);
                }
                None
            }
            EngineEvent::Frame(frame) => {
                let report = self.overlay.reconcile(&frame.vehicles, frame.time);
                debug!(time = frame.time, ?report, "차량 오버레이 갱신");
                self.traffic_lights = frame.traffic_lights;
                None
            }
            EngineEvent::SimulationFinished { reason } => {
                self.cancel_token = None;
                self.commands = None;
                self.status = SimulationStatus::Finished(reason.to_string());
                match reason {
                    FinishReason::Failed(message) => {
                        warn!(%message, "시뮬레이션 비정상 종료");
                        Some(format!("시뮬레이션 오류: {message}"))
                    }
                    FinishReason::Completed | FinishReason::Cancelled => None,
                }
            }
            EngineEvent::Log { line } => {
                self.push_log(line);
                None
            }
            EngineEvent::NetworkCompiled { .. } | EngineEvent::NetworkCompileFailed { .. } => None,
        }
    }

    fn push_log(&mut self, line: String) {
        self.logs.push(line);
        if self.logs.len() > MAX_LOG_LINES {
            let overflow = self.logs.len() - MAX_LOG_LINES;
            self.logs.drain(0..overflow);
        }
    }
}
