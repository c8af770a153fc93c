use crate::config::AppConfig;
use crate::editor::{EditorPanelState, NetworkEditorState};
use crate::engine::{EngineEvent, SumoInstallation, compile_network};
use crate::network::{load_net_xml, load_snapshot, save_snapshot, write_plain_xml};
use crate::simulation::{SimulationController, SimulationPanelState, SimulationRequest};
use crate::theme::{Theme, install_custom_font};
use anyhow::{Context, anyhow};
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{info, warn};

/// 상단 탭.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppTab {
    NetworkEditor,
    Simulation,
}

/// egui 애플리케이션의 전체 상태를 보관한다.
pub struct TrafficDashboardApp {
    /// UI 테마 정보.
    pub(crate) theme: Theme,
    /// 현재 활성 탭.
    pub(crate) active_tab: AppTab,
    /// 네트워크 편집기 상태.
    pub(crate) editor_state: NetworkEditorState,
    pub(crate) editor_panel: EditorPanelState,
    /// 시뮬레이션 제어 상태.
    pub(crate) simulation: SimulationController,
    pub(crate) simulation_panel: SimulationPanelState,
    /// 시뮬레이션에 넘길 `*.net.xml` 경로.
    pub(crate) net_file: Option<PathBuf>,
    /// `net_file`이 반영하는 편집기 리비전.
    net_revision: u64,
    /// 진행 중인 netconvert가 내보낸 시점의 리비전.
    compile_revision: Option<u64>,
    install: Option<SumoInstallation>,
    /// Tokio 런타임.
    runtime: Runtime,
    /// netconvert 작업 이벤트 수신 채널.
    compile_rx: Option<UnboundedReceiver<EngineEvent>>,
    /// 마지막 오류 메시지.
    pub(crate) last_error: Option<String>,
    /// 마지막 안내 메시지.
    pub(crate) last_notice: Option<String>,
}

impl TrafficDashboardApp {
    /// egui Context를 받아 초기 상태를 구성한다.
    pub fn new(cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        install_custom_font(&cc.egui_ctx);
        let app = Self::from_config(config);
        app.theme.apply(&cc.egui_ctx);
        app
    }

    pub(crate) fn from_config(config: AppConfig) -> Self {
        let theme = Theme::default();
        let runtime = Runtime::new().expect("Tokio 런타임 생성 실패");
        let install = SumoInstallation::discover(config.sumo_home.as_deref());
        if install.is_none() {
            warn!("SUMO 설치를 찾지 못해 시뮬레이션 기능을 끕니다");
        }
        let scene = *theme.scene();
        Self {
            active_tab: AppTab::NetworkEditor,
            editor_state: NetworkEditorState::new(scene, config.snap_threshold),
            editor_panel: EditorPanelState::default(),
            simulation: SimulationController::new(config.simulation, install.clone(), scene),
            simulation_panel: SimulationPanelState::default(),
            net_file: None,
            net_revision: 0,
            compile_revision: None,
            install,
            runtime,
            compile_rx: None,
            last_error: None,
            last_notice: None,
            theme,
        }
    }

    pub(crate) fn report_error(&mut self, err: impl std::fmt::Display) {
        self.last_error = Some(err.to_string());
    }

    pub(crate) fn can_compile(&self) -> bool {
        self.install
            .as_ref()
            .is_some_and(|install| install.netconvert.is_some())
            && self.compile_rx.is_none()
    }

    /// 편집 중인 문서를 비운다.
    pub(crate) fn new_document(&mut self) {
        self.editor_state.clear();
        self.editor_state.current_file = None;
        self.editor_state.mark_saved(None);
        self.net_file = None;
        self.last_error = None;
    }

    /// 파일 다이얼로그로 YAML 문서를 연다.
    pub(crate) fn open_document_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("YAML", &["yaml", "yml"])
            .pick_file()
        {
            if let Err(err) = self.open_document(&path) {
                self.report_error(format!("{err:#}"));
            }
        }
    }

    pub(crate) fn open_document(&mut self, path: &Path) -> anyhow::Result<()> {
        let snapshot = load_snapshot(path)
            .with_context(|| format!("문서 열기 실패: {}", path.display()))?;
        let report = self.editor_state.import_snapshot(&snapshot);
        self.editor_state.mark_saved(Some(path.to_path_buf()));
        self.net_file = None;
        self.last_error = None;
        self.last_notice = Some(format!(
            "노드 {} · 도로 {} 불러옴",
            report.nodes, report.edges
        ));
        Ok(())
    }

    /// 현재 경로에 저장한다. 경로가 없거나 `save_as`이면 다이얼로그를 띄운다.
    pub(crate) fn save_document(&mut self, save_as: bool) {
        let target = match (&self.editor_state.current_file, save_as) {
            (Some(path), false) => Some(path.clone()),
            _ => rfd::FileDialog::new()
                .add_filter("YAML", &["yaml", "yml"])
                .set_file_name("network.yaml")
                .save_file(),
        };
        let Some(path) = target else {
            return;
        };
        if let Err(err) = self.save_document_to(&path) {
            self.report_error(format!("{err:#}"));
        }
    }

    pub(crate) fn save_document_to(&mut self, path: &Path) -> anyhow::Result<()> {
        let snapshot = self.editor_state.export_snapshot();
        save_snapshot(path, &snapshot)
            .with_context(|| format!("문서 저장 실패: {}", path.display()))?;
        self.editor_state.mark_saved(Some(path.to_path_buf()));
        self.last_error = None;
        info!(path = %path.display(), "네트워크 문서 저장");
        Ok(())
    }

    /// SUMO 네트워크 파일을 가져온다. 가져온 파일은 그대로 시뮬레이션에 쓴다.
    pub(crate) fn import_net_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("SUMO network", &["xml"])
            .pick_file()
        {
            if let Err(err) = self.import_net_file(&path) {
                self.report_error(format!("{err:#}"));
            }
        }
    }

    pub(crate) fn import_net_file(&mut self, path: &Path) -> anyhow::Result<()> {
        let snapshot = load_net_xml(path)
            .with_context(|| format!("네트워크 가져오기 실패: {}", path.display()))?;
        let report = self.editor_state.import_snapshot(&snapshot);
        self.net_file = Some(path.to_path_buf());
        self.net_revision = self.editor_state.revision();
        self.last_error = None;
        self.last_notice = Some(if report.skipped_edges > 0 {
            format!(
                "노드 {} · 도로 {} 가져옴 (건너뜀 {})",
                report.nodes, report.edges, report.skipped_edges
            )
        } else {
            format!("노드 {} · 도로 {} 가져옴", report.nodes, report.edges)
        });
        Ok(())
    }

    /// plain XML을 쓰고 netconvert로 `*.net.xml`을 만든다.
    pub(crate) fn export_net_dialog(&mut self) {
        if let Some(output) = rfd::FileDialog::new()
            .add_filter("SUMO network", &["xml"])
            .set_file_name("network.net.xml")
            .save_file()
        {
            if let Err(err) = self.export_network(output) {
                self.report_error(format!("{err:#}"));
            }
        }
    }

    pub(crate) fn export_network(&mut self, output: PathBuf) -> anyhow::Result<()> {
        let install = self
            .install
            .clone()
            .ok_or_else(|| anyhow!("SUMO 설치를 찾지 못했습니다"))?;
        let snapshot = self.editor_state.export_snapshot();
        if snapshot.is_empty() {
            return Err(anyhow!("내보낼 네트워크가 없습니다"));
        }
        let dir = output
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let files = write_plain_xml(&dir, &snapshot).context("plain XML 쓰기 실패")?;
        let (tx, rx) = mpsc::unbounded_channel();
        self.runtime
            .spawn(compile_network(install, files, output, tx));
        self.compile_rx = Some(rx);
        self.compile_revision = Some(self.editor_state.revision());
        self.last_notice = Some("netconvert 실행 중...".into());
        Ok(())
    }

    /// netconvert 이벤트를 처리한다.
    pub(crate) fn drain_compile_events(&mut self) {
        if let Some(mut rx) = self.compile_rx.take() {
            let mut done = false;
            while let Ok(event) = rx.try_recv() {
                done |= self.handle_compile_event(event);
            }
            if !done {
                self.compile_rx = Some(rx);
            }
        }
    }

    /// 컴파일이 끝났으면 true.
    pub(crate) fn handle_compile_event(&mut self, event: EngineEvent) -> bool {
        match event {
            EngineEvent::NetworkCompiled { output } => {
                self.last_notice = Some(format!("net.xml 생성 · {}", output.display()));
                self.net_file = Some(output);
                self.net_revision = self
                    .compile_revision
                    .take()
                    .unwrap_or_else(|| self.editor_state.revision());
                true
            }
            EngineEvent::NetworkCompileFailed { message } => {
                self.compile_revision = None;
                self.report_error(format!("네트워크 컴파일 실패: {message}"));
                true
            }
            EngineEvent::Log { line } => {
                info!(target: "netconvert", "{line}");
                false
            }
            _ => false,
        }
    }

    pub(crate) fn handle_simulation_request(&mut self, request: SimulationRequest) {
        match request {
            SimulationRequest::Start => {
                self.invalidate_stale_net_file();
                let snapshot = self.editor_state.export_snapshot();
                let handle = self.runtime.handle().clone();
                if let Err(err) =
                    self.simulation
                        .start(&handle, self.net_file.as_deref(), &snapshot)
                {
                    self.report_error(format!("{err:#}"));
                } else {
                    self.last_error = None;
                }
            }
            SimulationRequest::Stop => self.simulation.stop(),
        }
    }

    /// 엔진과 컴파일 이벤트를 모두 소비한다.
    pub(super) fn drain_events(&mut self) {
        if let Some(warning) = self.simulation.drain_events() {
            self.report_error(warning);
        }
        self.drain_compile_events();
        self.invalidate_stale_net_file();
    }

    /// 가져오거나 컴파일한 뒤 편집이 있었으면 `net_file`을 버린다.
    pub(crate) fn invalidate_stale_net_file(&mut self) {
        if self.net_file.is_some() && self.editor_state.revision() != self.net_revision {
            info!("편집으로 net.xml이 낡아 다음 실행 때 다시 만듭니다");
            self.net_file = None;
        }
    }

    pub(super) fn needs_repaint(&self) -> bool {
        self.simulation.status().is_active() || self.compile_rx.is_some()
    }
}

impl Drop for TrafficDashboardApp {
    fn drop(&mut self) {
        self.simulation.stop();
    }
}
