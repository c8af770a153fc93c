use super::error::EngineError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;

/// 차량 한 대의 현재 상태.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VehicleState {
    /// 네트워크 좌표(x, y).
    pub position: (f64, f64),
    /// m/s.
    pub speed: f64,
    /// 경로를 이루는 엣지 ID 목록.
    pub route: Vec<String>,
    pub road_id: String,
    pub lane_id: String,
    pub type_id: String,
    /// 진행 방향(도).
    pub heading: f64,
}

/// 네트워크 경계 상자.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NetworkBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

/// 신호등 ID와 red/yellow/green 상태 문자열.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficLightState {
    pub id: String,
    pub state: String,
}

/// 폴링 한 번으로 얻은 시뮬레이션 스냅샷.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimulationFrame {
    /// 시뮬레이션 시계(초).
    pub time: f64,
    pub vehicles: BTreeMap<String, VehicleState>,
    pub traffic_lights: Vec<TrafficLightState>,
}

/// 외부 교통 시뮬레이터 폴링 인터페이스.
///
/// 모든 호출은 느리거나 실패할 수 있다고 가정한다.
#[async_trait]
pub trait SimulationEngine: Send {
    /// 설정 파일로 시뮬레이터를 띄우고 연결한다.
    async fn connect(&mut self, config: &Path) -> Result<(), EngineError>;

    /// 한 스텝 진행한다. 더 진행할 것이 없으면 `false`.
    async fn step(&mut self) -> Result<bool, EngineError>;

    /// 연결을 닫는다. 여러 번 호출해도 안전해야 한다.
    async fn disconnect(&mut self) -> Result<(), EngineError>;

    async fn vehicle_ids(&mut self) -> Result<Vec<String>, EngineError>;

    /// 조회 사이에 차량이 사라졌으면 `None`.
    async fn vehicle_state(&mut self, id: &str) -> Result<Option<VehicleState>, EngineError>;

    async fn simulation_time(&mut self) -> Result<f64, EngineError>;

    async fn traffic_light_ids(&mut self) -> Result<Vec<String>, EngineError>;

    async fn traffic_light_state(&mut self, id: &str) -> Result<String, EngineError>;

    async fn set_traffic_light_state(&mut self, id: &str, state: &str) -> Result<(), EngineError>;

    async fn network_bounds(&mut self) -> Result<NetworkBounds, EngineError>;
}
