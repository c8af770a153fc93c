use super::client::{NetworkBounds, SimulationFrame};
use std::path::PathBuf;

/// 엔진 작업에서 UI로 전달되는 이벤트 모델이다.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// 엔진 연결 완료. 경계 조회에 실패하면 `bounds`는 비어 있다.
    Connected { bounds: Option<NetworkBounds> },
    /// 한 틱의 폴링 결과.
    Frame(SimulationFrame),
    /// 시뮬레이션 종료. 완료, 실패, 중지 모두 이 이벤트로 끝난다.
    SimulationFinished { reason: FinishReason },
    /// netconvert 컴파일 성공.
    NetworkCompiled { output: PathBuf },
    NetworkCompileFailed { message: String },
    /// 외부 프로세스 출력 한 줄.
    Log { line: String },
}

/// 시뮬레이션 종료 사유.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    /// 남은 차량이 없다.
    Completed,
    /// 사용자가 중지했다.
    Cancelled,
    /// 연결 또는 폴링 실패.
    Failed(String),
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinishReason::Completed => write!(f, "시뮬레이션 완료"),
            FinishReason::Cancelled => write!(f, "사용자가 중지했습니다"),
            FinishReason::Failed(message) => write!(f, "엔진 오류: {message}"),
        }
    }
}

/// UI에서 실행 중인 폴링 작업으로 보내는 명령.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    /// 신호등 상태 문자열을 그대로 전달한다.
    SetTrafficLight { id: String, state: String },
}
