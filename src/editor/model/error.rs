/// 네트워크 편집 중 발생 가능한 오류를 표현한다.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// SUMO ID 규칙에 맞지 않는 ID이다.
    #[error("사용할 수 없는 ID입니다: '{0}' (영문, 숫자, _ . : # - 만 허용)")]
    InvalidId(String),
    /// 같은 종류의 엔티티에 이미 존재하는 ID이다.
    #[error("이미 사용 중인 ID입니다: {0}")]
    DuplicateId(String),
    /// 존재하지 않는 노드를 참조했다.
    #[error("존재하지 않는 노드를 참조합니다: {0}")]
    UnknownNode(String),
    /// 존재하지 않는 엣지를 참조했다.
    #[error("존재하지 않는 엣지를 참조합니다: {0}")]
    UnknownEdge(String),
    /// 시작과 끝이 같은 노드인 엣지이다.
    #[error("시작 노드와 도착 노드가 같습니다: {0}")]
    SelfLoop(String),
    /// 허용 범위를 벗어난 속성 값이다.
    #[error("{field} 값이 허용 범위를 벗어났습니다: {value}")]
    OutOfRange { field: &'static str, value: String },
}
