pub mod controller;
pub mod overlay;
pub mod view;

use crate::network::DepartureDistribution;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;

pub use controller::SimulationController;
pub use view::{SimulationPanel, SimulationPanelState, SimulationRequest};

pub const VEHICLE_COUNT_RANGE: RangeInclusive<u32> = 1..=1000;
pub const SPEED_FACTOR_RANGE: RangeInclusive<f64> = 0.1..=5.0;
pub const DURATION_RANGE: RangeInclusive<u32> = 10..=3600;
pub const STEP_LENGTH_RANGE: RangeInclusive<f64> = 0.01..=1.0;
/// TraCI 기본 포트.
pub const DEFAULT_TRACI_PORT: u16 = 8813;

/// 시뮬레이션 실행 상태.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SimulationStatus {
    #[default]
    Ready,
    Starting,
    Running,
    /// 종료 사유를 함께 보관한다.
    Finished(String),
}

impl SimulationStatus {
    pub fn label(&self) -> String {
        match self {
            SimulationStatus::Ready => "준비".to_string(),
            SimulationStatus::Starting => "시작 중".to_string(),
            SimulationStatus::Running => "실행 중".to_string(),
            SimulationStatus::Finished(reason) => format!("종료: {reason}"),
        }
    }

    /// 시작/정지 버튼 활성화 판단에 쓴다.
    pub fn is_active(&self) -> bool {
        matches!(self, SimulationStatus::Starting | SimulationStatus::Running)
    }
}

/// 시뮬레이션 제어 패널의 설정 값.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub vehicle_count: u32,
    /// 배속. 폴링 주기를 결정한다.
    pub speed_factor: f64,
    pub distribution: DepartureDistribution,
    /// 시뮬레이션 길이(초).
    pub duration: u32,
    /// SUMO 스텝 길이(초).
    pub step_length: f64,
    /// summary/tripinfo 출력 여부.
    pub collect_data: bool,
    pub port: u16,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            vehicle_count: 100,
            speed_factor: 1.0,
            distribution: DepartureDistribution::Uniform,
            duration: 600,
            step_length: 0.1,
            collect_data: true,
            port: DEFAULT_TRACI_PORT,
        }
    }
}

impl SimulationSettings {
    /// 모든 값을 허용 범위 안으로 맞춘 사본을 반환한다.
    pub fn clamped(&self) -> Self {
        Self {
            vehicle_count: self
                .vehicle_count
                .clamp(*VEHICLE_COUNT_RANGE.start(), *VEHICLE_COUNT_RANGE.end()),
            speed_factor: clamp_f64(self.speed_factor, &SPEED_FACTOR_RANGE),
            distribution: self.distribution,
            duration: self
                .duration
                .clamp(*DURATION_RANGE.start(), *DURATION_RANGE.end()),
            step_length: clamp_f64(self.step_length, &STEP_LENGTH_RANGE),
            collect_data: self.collect_data,
            port: self.port,
        }
    }

    /// 배속에 따른 폴링 주기.
    pub fn tick_interval(&self) -> Duration {
        tick_interval(self.speed_factor)
    }
}

fn clamp_f64(value: f64, range: &RangeInclusive<f64>) -> f64 {
    if value.is_nan() {
        return *range.start();
    }
    value.clamp(*range.start(), *range.end())
}

/// 폴링 주기 `max(10, 100 / speed_factor)` 밀리초.
pub fn tick_interval(speed_factor: f64) -> Duration {
    let millis = if speed_factor > 0.0 && speed_factor.is_finite() {
        (100.0 / speed_factor) as u64
    } else {
        100
    };
    Duration::from_millis(millis.max(10))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_interval_follows_speed_factor_with_floor() {
        assert_eq!(tick_interval(1.0), Duration::from_millis(100));
        assert_eq!(tick_interval(5.0), Duration::from_millis(20));
        assert_eq!(tick_interval(20.0), Duration::from_millis(10));
        assert_eq!(tick_interval(0.0), Duration::from_millis(100));
    }

    #[test]
    fn clamped_settings_stay_within_ranges() {
        let settings = SimulationSettings {
            vehicle_count: 0,
            speed_factor: 9.0,
            duration: 5,
            step_length: f64::NAN,
            ..Default::default()
        }
        .clamped();
        assert_eq!(settings.vehicle_count, 1);
        assert_eq!(settings.speed_factor, 5.0);
        assert_eq!(settings.duration, 10);
        assert_eq!(settings.step_length, 0.01);
    }
}
