use crate::engine::error::EngineError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// 메시지 앞의 전체 길이 필드(자기 자신 포함).
const LENGTH_PREFIX: usize = 4;
/// 1바이트 길이 필드로 표현할 수 있는 최대 명령 길이.
const SHORT_COMMAND_MAX: usize = u8::MAX as usize;

/// 메시지 안의 명령 하나. 길이 필드는 인코딩 시 계산한다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraciCommand {
    pub id: u8,
    pub content: Bytes,
}

impl TraciCommand {
    pub fn new(id: u8, content: impl Into<Bytes>) -> Self {
        Self {
            id,
            content: content.into(),
        }
    }

    /// 길이 필드를 포함한 인코딩 길이.
    fn encoded_len(&self) -> usize {
        let short = 2 + self.content.len();
        if short <= SHORT_COMMAND_MAX {
            short
        } else {
            6 + self.content.len()
        }
    }

    fn write_to(&self, dst: &mut BytesMut) {
        let len = self.encoded_len();
        if len <= SHORT_COMMAND_MAX {
            dst.put_u8(len as u8);
        } else {
            dst.put_u8(0);
            dst.put_u32(len as u32);
        }
        dst.put_u8(self.id);
        dst.put_slice(&self.content);
    }
}

/// TraCI TCP 스트림용 코덱.
///
/// 메시지는 4바이트 빅엔디언 전체 길이 뒤에 명령들이 이어진다. 명령 길이가
/// 255를 넘으면 길이 바이트 0 뒤에 4바이트 길이를 쓴다.
#[derive(Debug, Default, Clone, Copy)]
pub struct TraciCodec;

impl Encoder<Vec<TraciCommand>> for TraciCodec {
    type Error = EngineError;

    fn encode(&mut self, item: Vec<TraciCommand>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let body: usize = item.iter().map(TraciCommand::encoded_len).sum();
        let total = LENGTH_PREFIX + body;
        let total_u32 = u32::try_from(total)
            .map_err(|_| EngineError::Protocol(format!("메시지가 너무 큽니다: {total}")))?;
        dst.reserve(total);
        dst.put_u32(total_u32);
        for command in &item {
            command.write_to(dst);
        }
        Ok(())
    }
}

impl Encoder<TraciCommand> for TraciCodec {
    type Error = EngineError;

    fn encode(&mut self, item: TraciCommand, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.encode(vec![item], dst)
    }
}

impl Decoder for TraciCodec {
    type Item = Vec<TraciCommand>;
    type Error = EngineError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < LENGTH_PREFIX {
            return Ok(None);
        }
        let mut prefix = [0u8; LENGTH_PREFIX];
        prefix.copy_from_slice(&src[..LENGTH_PREFIX]);
        let total = u32::from_be_bytes(prefix) as usize;
        if total < LENGTH_PREFIX {
            return Err(EngineError::Protocol(format!("잘못된 메시지 길이: {total}")));
        }
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }
        let mut message = src.split_to(total);
        message.advance(LENGTH_PREFIX);
        parse_commands(message.freeze()).map(Some)
    }
}

/// 메시지 본문을 명령 단위로 나눈다.
pub fn parse_commands(mut buf: Bytes) -> Result<Vec<TraciCommand>, EngineError> {
    let mut commands = Vec::new();
    while buf.has_remaining() {
        let short = buf.get_u8() as usize;
        let (len, header) = if short == 0 {
            if buf.remaining() < 4 {
                return Err(EngineError::Protocol("확장 길이 필드가 잘렸습니다".into()));
            }
            (buf.get_u32() as usize, 5)
        } else {
            (short, 1)
        };
        if len < header + 1 || buf.remaining() < len - header {
            return Err(EngineError::Protocol(format!(
                "명령 길이 {len}가 남은 데이터 {}와 맞지 않습니다",
                buf.remaining()
            )));
        }
        let id = buf.get_u8();
        let content = buf.split_to(len - header - 1);
        commands.push(TraciCommand { id, content });
    }
    Ok(commands)
}
