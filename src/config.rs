use crate::editor::model::DEFAULT_SNAP_THRESHOLD;
use crate::simulation::{DEFAULT_TRACI_PORT, SimulationSettings};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 설정 파일 경로를 지정하는 환경 변수.
pub const CONFIG_ENV: &str = "TRAFFIC_DASHBOARD_CONFIG";
/// 작업 디렉터리에서 찾는 기본 설정 파일 이름.
pub const DEFAULT_CONFIG_FILE: &str = "dashboard.yaml";

/// 애플리케이션 설정.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 설정 시 `SUMO_HOME` 환경 변수보다 우선한다.
    pub sumo_home: Option<PathBuf>,
    pub traci_port: u16,
    /// 그리기 모드에서 기존 노드에 붙는 거리.
    pub snap_threshold: f32,
    /// 시뮬레이션 패널 초기값.
    pub simulation: SimulationSettings,
    pub window: WindowConfig,
}

/// 시작 창 크기.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1400.0,
            height: 900.0,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sumo_home: None,
            traci_port: DEFAULT_TRACI_PORT,
            snap_threshold: DEFAULT_SNAP_THRESHOLD,
            simulation: SimulationSettings::default(),
            window: WindowConfig::default(),
        }
    }
}

impl AppConfig {
    /// YAML 파일을 읽어 설정으로 역직렬화한다.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("설정 파일을 읽을 수 없습니다: {}", path.display()))?;
        let config: AppConfig = serde_yaml::from_str(&text)
            .with_context(|| format!("설정 파일 형식 오류: {}", path.display()))?;
        Ok(config.normalized())
    }

    /// 환경 변수 또는 작업 디렉터리의 설정 파일을 읽는다.
    ///
    /// 파일이 없거나 잘못되었으면 경고만 남기고 기본값을 쓴다.
    pub fn load() -> Self {
        let path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        Self::load_from(path.as_deref())
    }

    /// `explicit` 경로가 있으면 그것을, 없으면 기본 파일을 읽는다.
    pub fn load_from(explicit: Option<&Path>) -> Self {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.exists() {
                    return Self::default();
                }
                fallback
            }
        };
        match Self::from_file(&path) {
            Ok(config) => {
                info!(path = %path.display(), "설정 파일 로드");
                config
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "설정 파일을 무시하고 기본값을 사용합니다");
                Self::default()
            }
        }
    }

    /// 범위를 벗어난 값을 보정한다. 포트는 최상위 값이 시뮬레이션 설정에 반영된다.
    fn normalized(mut self) -> Self {
        if !self.snap_threshold.is_finite() || self.snap_threshold <= 0.0 {
            self.snap_threshold = DEFAULT_SNAP_THRESHOLD;
        }
        self.simulation = self.simulation.clamped();
        self.simulation.port = self.traci_port;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(name: &str) -> PathBuf {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("시간 계산 실패")
            .as_nanos();
        std::env::temp_dir().join(format!("traffic_dashboard_{name}_{ts}.yaml"))
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let path = temp_path("partial");
        fs::write(
            &path,
            "traci_port: 9000\nsimulation:\n  vehicle_count: 5000\n  distribution: rush_hour\n",
        )
        .expect("설정 파일 쓰기 실패");
        let config = AppConfig::from_file(&path).expect("설정 로드 실패");
        assert_eq!(config.traci_port, 9000);
        assert_eq!(config.simulation.port, 9000);
        assert_eq!(config.simulation.vehicle_count, 1000);
        assert_eq!(
            config.simulation.distribution,
            crate::network::DepartureDistribution::RushHour
        );
        assert_eq!(config.snap_threshold, DEFAULT_SNAP_THRESHOLD);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let path = temp_path("broken");
        fs::write(&path, "traci_port: [not a port").expect("설정 파일 쓰기 실패");
        assert_eq!(AppConfig::load_from(Some(&path)), AppConfig::default());
        let _ = fs::remove_file(&path);
    }
}
