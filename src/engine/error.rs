use thiserror::Error;

/// 시뮬레이션 엔진 접근 중 발생하는 오류.
#[derive(Debug, Error)]
pub enum EngineError {
    /// SUMO 설치를 찾지 못했거나 실행 파일이 없다.
    #[error("SUMO를 사용할 수 없습니다: {0}")]
    Unavailable(String),
    #[error("{program} 실행 실패: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("입출력 오류: {0}")]
    Io(#[from] std::io::Error),
    /// 응답 형식이 예상과 다르다.
    #[error("TraCI 프로토콜 오류: {0}")]
    Protocol(String),
    /// 엔진이 명령에 오류 상태를 돌려주었다.
    #[error("TraCI 명령 0x{command:02x} 실패: {message}")]
    CommandFailed { command: u8, message: String },
    #[error("엔진에 연결되어 있지 않습니다")]
    NotConnected,
}
