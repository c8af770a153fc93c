//! TraCI 명령 ID, 변수 ID, 값 타입과 요청/응답 변환 함수.

use super::codec::TraciCommand;
use crate::engine::error::EngineError;
use bytes::{Buf, BufMut, Bytes, BytesMut};

pub const CMD_GETVERSION: u8 = 0x00;
pub const CMD_SIMSTEP: u8 = 0x02;
pub const CMD_CLOSE: u8 = 0x7F;
pub const CMD_GET_TL_VARIABLE: u8 = 0xa2;
pub const CMD_SET_TL_VARIABLE: u8 = 0xc2;
pub const CMD_GET_VEHICLE_VARIABLE: u8 = 0xa4;
pub const CMD_GET_SIM_VARIABLE: u8 = 0xab;
/// get 명령 응답 ID = 명령 ID + 0x10.
pub const RESPONSE_OFFSET: u8 = 0x10;

pub const ID_LIST: u8 = 0x00;
pub const VAR_SPEED: u8 = 0x40;
pub const VAR_POSITION: u8 = 0x42;
pub const VAR_ANGLE: u8 = 0x43;
pub const VAR_TYPE: u8 = 0x4f;
pub const VAR_ROAD_ID: u8 = 0x50;
pub const VAR_LANE_ID: u8 = 0x51;
pub const VAR_EDGES: u8 = 0x54;
pub const TL_RED_YELLOW_GREEN_STATE: u8 = 0x20;
pub const VAR_TIME: u8 = 0x66;
pub const VAR_NET_BOUNDING_BOX: u8 = 0x7c;
pub const VAR_MIN_EXPECTED_VEHICLES: u8 = 0x7d;

pub const TYPE_POSITION_2D: u8 = 0x01;
pub const TYPE_POLYGON: u8 = 0x06;
pub const TYPE_UBYTE: u8 = 0x07;
pub const TYPE_INTEGER: u8 = 0x09;
pub const TYPE_DOUBLE: u8 = 0x0B;
pub const TYPE_STRING: u8 = 0x0C;
pub const TYPE_STRINGLIST: u8 = 0x0E;
pub const TYPE_COMPOUND: u8 = 0x0F;

pub const RTYPE_OK: u8 = 0x00;

/// 응답에 담긴 타입 있는 값.
#[derive(Debug, Clone, PartialEq)]
pub enum TraciValue {
    Ubyte(u8),
    Int(i32),
    Double(f64),
    String(String),
    StringList(Vec<String>),
    Position(f64, f64),
    Polygon(Vec<(f64, f64)>),
    Compound(Vec<TraciValue>),
}

impl TraciValue {
    pub fn as_f64(&self) -> Result<f64, EngineError> {
        match self {
            TraciValue::Double(v) => Ok(*v),
            TraciValue::Int(v) => Ok(f64::from(*v)),
            other => Err(unexpected("숫자", other)),
        }
    }

    pub fn as_i32(&self) -> Result<i32, EngineError> {
        match self {
            TraciValue::Int(v) => Ok(*v),
            other => Err(unexpected("정수", other)),
        }
    }

    pub fn into_string(self) -> Result<String, EngineError> {
        match self {
            TraciValue::String(v) => Ok(v),
            other => Err(unexpected("문자열", &other)),
        }
    }

    pub fn into_string_list(self) -> Result<Vec<String>, EngineError> {
        match self {
            TraciValue::StringList(v) => Ok(v),
            other => Err(unexpected("문자열 목록", &other)),
        }
    }

    pub fn as_position(&self) -> Result<(f64, f64), EngineError> {
        match self {
            TraciValue::Position(x, y) => Ok((*x, *y)),
            other => Err(unexpected("2D 좌표", other)),
        }
    }

    pub fn into_polygon(self) -> Result<Vec<(f64, f64)>, EngineError> {
        match self {
            TraciValue::Polygon(points) => Ok(points),
            other => Err(unexpected("폴리곤", &other)),
        }
    }
}

fn unexpected(expected: &str, actual: &TraciValue) -> EngineError {
    EngineError::Protocol(format!("{expected} 값을 기대했지만 {actual:?}를 받았습니다"))
}

pub fn put_string(buf: &mut BytesMut, value: &str) {
    buf.put_u32(value.len() as u32);
    buf.put_slice(value.as_bytes());
}

pub fn version_command() -> TraciCommand {
    TraciCommand::new(CMD_GETVERSION, Bytes::new())
}

pub fn close_command() -> TraciCommand {
    TraciCommand::new(CMD_CLOSE, Bytes::new())
}

/// `target`초까지 진행한다. 0이면 한 스텝.
pub fn simstep_command(target: f64) -> TraciCommand {
    let mut content = BytesMut::with_capacity(8);
    content.put_f64(target);
    TraciCommand::new(CMD_SIMSTEP, content.freeze())
}

pub fn get_var_command(domain: u8, variable: u8, object_id: &str) -> TraciCommand {
    let mut content = BytesMut::new();
    content.put_u8(variable);
    put_string(&mut content, object_id);
    TraciCommand::new(domain, content.freeze())
}

pub fn set_string_command(domain: u8, variable: u8, object_id: &str, value: &str) -> TraciCommand {
    let mut content = BytesMut::new();
    content.put_u8(variable);
    put_string(&mut content, object_id);
    content.put_u8(TYPE_STRING);
    put_string(&mut content, value);
    TraciCommand::new(domain, content.freeze())
}

/// 명령 내용을 앞에서부터 읽는다.
pub struct ValueReader {
    buf: Bytes,
}

impl ValueReader {
    pub fn new(buf: Bytes) -> Self {
        Self { buf }
    }

    fn need(&self, n: usize) -> Result<(), EngineError> {
        if self.buf.remaining() < n {
            return Err(EngineError::Protocol(format!(
                "{n}바이트가 필요하지만 {}바이트만 남았습니다",
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    pub fn u8(&mut self) -> Result<u8, EngineError> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn i32(&mut self) -> Result<i32, EngineError> {
        self.need(4)?;
        Ok(self.buf.get_i32())
    }

    pub fn f64(&mut self) -> Result<f64, EngineError> {
        self.need(8)?;
        Ok(self.buf.get_f64())
    }

    pub fn string(&mut self) -> Result<String, EngineError> {
        let len = self.length()?;
        self.need(len)?;
        let raw = self.buf.split_to(len);
        String::from_utf8(raw.to_vec())
            .map_err(|err| EngineError::Protocol(format!("UTF-8 문자열이 아닙니다: {err}")))
    }

    pub fn string_list(&mut self) -> Result<Vec<String>, EngineError> {
        let count = self.length()?;
        (0..count).map(|_| self.string()).collect()
    }

    fn length(&mut self) -> Result<usize, EngineError> {
        let len = self.i32()?;
        usize::try_from(len).map_err(|_| EngineError::Protocol(format!("음수 길이: {len}")))
    }

    /// 타입 바이트를 읽고 그에 맞는 값을 읽는다.
    pub fn typed_value(&mut self) -> Result<TraciValue, EngineError> {
        let value = match self.u8()? {
            TYPE_UBYTE => TraciValue::Ubyte(self.u8()?),
            TYPE_INTEGER => TraciValue::Int(self.i32()?),
            TYPE_DOUBLE => TraciValue::Double(self.f64()?),
            TYPE_STRING => TraciValue::String(self.string()?),
            TYPE_STRINGLIST => TraciValue::StringList(self.string_list()?),
            TYPE_POSITION_2D => TraciValue::Position(self.f64()?, self.f64()?),
            TYPE_POLYGON => {
                let count = self.u8()?;
                let points = (0..count)
                    .map(|_| Ok((self.f64()?, self.f64()?)))
                    .collect::<Result<Vec<_>, EngineError>>()?;
                TraciValue::Polygon(points)
            }
            TYPE_COMPOUND => {
                let count = self.length()?;
                let items = (0..count)
                    .map(|_| self.typed_value())
                    .collect::<Result<Vec<_>, EngineError>>()?;
                TraciValue::Compound(items)
            }
            other => {
                return Err(EngineError::Protocol(format!(
                    "지원하지 않는 값 타입 0x{other:02x}"
                )));
            }
        };
        Ok(value)
    }
}

/// 첫 응답이 `command`에 대한 성공 상태인지 확인하고 나머지 응답을 돌려준다.
pub fn check_status(command: u8, responses: &[TraciCommand]) -> Result<&[TraciCommand], EngineError> {
    let (status, rest) = responses
        .split_first()
        .ok_or_else(|| EngineError::Protocol("빈 응답".into()))?;
    if status.id != command {
        return Err(EngineError::Protocol(format!(
            "명령 0x{command:02x}에 대한 상태 응답 대신 0x{:02x}를 받았습니다",
            status.id
        )));
    }
    let mut reader = ValueReader::new(status.content.clone());
    let result = reader.u8()?;
    let message = reader.string()?;
    if result != RTYPE_OK {
        return Err(EngineError::CommandFailed { command, message });
    }
    Ok(rest)
}

/// get 명령 응답에서 값을 꺼낸다.
pub fn get_var_value(
    domain: u8,
    variable: u8,
    responses: &[TraciCommand],
) -> Result<TraciValue, EngineError> {
    let response_id = domain + RESPONSE_OFFSET;
    let response = responses
        .iter()
        .find(|cmd| cmd.id == response_id)
        .ok_or_else(|| {
            EngineError::Protocol(format!("응답 0x{response_id:02x}가 없습니다"))
        })?;
    let mut reader = ValueReader::new(response.content.clone());
    let actual = reader.u8()?;
    if actual != variable {
        return Err(EngineError::Protocol(format!(
            "변수 0x{variable:02x} 대신 0x{actual:02x} 응답"
        )));
    }
    let _object_id = reader.string()?;
    reader.typed_value()
}

/// 버전 응답에서 API 버전과 식별 문자열을 읽는다.
pub fn version_value(responses: &[TraciCommand]) -> Result<(i32, String), EngineError> {
    let response = responses
        .iter()
        .find(|cmd| cmd.id == CMD_GETVERSION)
        .ok_or_else(|| EngineError::Protocol("버전 응답이 없습니다".into()))?;
    let mut reader = ValueReader::new(response.content.clone());
    Ok((reader.i32()?, reader.string()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(command: u8, result: u8, message: &str) -> TraciCommand {
        let mut content = BytesMut::new();
        content.put_u8(result);
        put_string(&mut content, message);
        TraciCommand::new(command, content.freeze())
    }

    #[test]
    fn error_status_becomes_command_failed() {
        let responses = vec![status(CMD_GET_VEHICLE_VARIABLE, 0xFF, "Vehicle 'x' is not known")];
        let err = check_status(CMD_GET_VEHICLE_VARIABLE, &responses).expect_err("실패해야 함");
        assert!(matches!(
            err,
            EngineError::CommandFailed { command: CMD_GET_VEHICLE_VARIABLE, .. }
        ));
    }

    /// 차량 ID 목록 응답을 읽는다.
    #[test]
    fn reads_string_list_response() {
        let mut content = BytesMut::new();
        content.put_u8(ID_LIST);
        put_string(&mut content, "");
        content.put_u8(TYPE_STRINGLIST);
        content.put_i32(2);
        put_string(&mut content, "veh0");
        put_string(&mut content, "veh1");
        let responses = vec![
            status(CMD_GET_VEHICLE_VARIABLE, RTYPE_OK, ""),
            TraciCommand::new(CMD_GET_VEHICLE_VARIABLE + RESPONSE_OFFSET, content.freeze()),
        ];
        let rest = check_status(CMD_GET_VEHICLE_VARIABLE, &responses).expect("상태 확인 실패");
        let ids = get_var_value(CMD_GET_VEHICLE_VARIABLE, ID_LIST, rest)
            .and_then(TraciValue::into_string_list)
            .expect("값 읽기 실패");
        assert_eq!(ids, vec!["veh0".to_string(), "veh1".to_string()]);
    }

    #[test]
    fn reads_bounding_box_polygon() {
        let mut content = BytesMut::new();
        content.put_u8(VAR_NET_BOUNDING_BOX);
        put_string(&mut content, "");
        content.put_u8(TYPE_POLYGON);
        content.put_u8(2);
        for v in [-10.0, -5.0, 300.0, 120.5] {
            content.put_f64(v);
        }
        let responses = vec![TraciCommand::new(
            CMD_GET_SIM_VARIABLE + RESPONSE_OFFSET,
            content.freeze(),
        )];
        let points = get_var_value(CMD_GET_SIM_VARIABLE, VAR_NET_BOUNDING_BOX, &responses)
            .and_then(TraciValue::into_polygon)
            .expect("값 읽기 실패");
        assert_eq!(points, vec![(-10.0, -5.0), (300.0, 120.5)]);
    }
}
