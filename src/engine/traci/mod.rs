mod codec;
mod protocol;

use codec::{TraciCodec, TraciCommand};
use protocol::TraciValue;

use super::client::{NetworkBounds, SimulationEngine, VehicleState};
use super::error::EngineError;
use super::events::EngineEvent;
use super::install::SumoInstallation;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use protocol::*;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncRead;
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::sleep;
use tokio_util::codec::{Framed, FramedRead, LinesCodec};
use tracing::{debug, info, warn};

const CONNECT_RETRIES: u32 = 50;
const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(100);
/// 이보다 오래된 API는 경고만 남긴다.
const MIN_API_VERSION: i32 = 20;

/// SUMO 프로세스를 띄우고 TraCI로 폴링하는 엔진.
pub struct TraciEngine {
    install: SumoInstallation,
    port: u16,
    events: UnboundedSender<EngineEvent>,
    connection: Option<Framed<TcpStream, TraciCodec>>,
    child: Option<Child>,
}

impl TraciEngine {
    pub fn new(install: SumoInstallation, port: u16, events: UnboundedSender<EngineEvent>) -> Self {
        Self {
            install,
            port,
            events,
            connection: None,
            child: None,
        }
    }

    fn launch(&mut self, config: &Path) -> Result<(), EngineError> {
        let mut command = Command::new(&self.install.sumo);
        command
            .arg("-c")
            .arg(config)
            .arg("--remote-port")
            .arg(self.port.to_string())
            .args(["--start", "--no-warnings", "--no-step-log"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        let mut child = command.spawn().map_err(|source| EngineError::Launch {
            program: self.install.sumo.display().to_string(),
            source,
        })?;
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(pipe_forwarder(stdout, self.events.clone(), "sumo STDOUT"));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(pipe_forwarder(stderr, self.events.clone(), "sumo STDERR"));
        }
        info!(config = %config.display(), port = self.port, "SUMO 프로세스 시작");
        self.child = Some(child);
        Ok(())
    }

    /// 프로세스가 포트를 열 때까지 재시도한다.
    async fn open_socket(&self) -> Result<TcpStream, EngineError> {
        let mut last_error = None;
        for attempt in 1..=CONNECT_RETRIES {
            match TcpStream::connect(("127.0.0.1", self.port)).await {
                Ok(stream) => {
                    debug!(attempt, "TraCI 소켓 연결");
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Err(err) => last_error = Some(err),
            }
            sleep(CONNECT_RETRY_DELAY).await;
        }
        Err(last_error.map(EngineError::Io).unwrap_or(EngineError::NotConnected))
    }

    /// 명령 하나를 보내고 응답 메시지를 받는다. 상태 응답은 확인 후 제외한다.
    async fn request(&mut self, command: TraciCommand) -> Result<Vec<TraciCommand>, EngineError> {
        let id = command.id;
        let connection = self.connection.as_mut().ok_or(EngineError::NotConnected)?;
        connection.send(command).await?;
        let responses = connection
            .next()
            .await
            .ok_or_else(|| EngineError::Protocol("엔진이 연결을 닫았습니다".into()))??;
        Ok(check_status(id, &responses)?.to_vec())
    }

    async fn get_var(
        &mut self,
        domain: u8,
        variable: u8,
        object_id: &str,
    ) -> Result<TraciValue, EngineError> {
        let responses = self
            .request(get_var_command(domain, variable, object_id))
            .await?;
        get_var_value(domain, variable, &responses)
    }

    async fn vehicle_var(&mut self, variable: u8, id: &str) -> Result<TraciValue, EngineError> {
        self.get_var(CMD_GET_VEHICLE_VARIABLE, variable, id).await
    }

    async fn read_vehicle(&mut self, id: &str) -> Result<VehicleState, EngineError> {
        Ok(VehicleState {
            position: self.vehicle_var(VAR_POSITION, id).await?.as_position()?,
            speed: self.vehicle_var(VAR_SPEED, id).await?.as_f64()?,
            route: self.vehicle_var(VAR_EDGES, id).await?.into_string_list()?,
            road_id: self.vehicle_var(VAR_ROAD_ID, id).await?.into_string()?,
            lane_id: self.vehicle_var(VAR_LANE_ID, id).await?.into_string()?,
            type_id: self.vehicle_var(VAR_TYPE, id).await?.into_string()?,
            heading: self.vehicle_var(VAR_ANGLE, id).await?.as_f64()?,
        })
    }
}

#[async_trait]
impl SimulationEngine for TraciEngine {
    async fn connect(&mut self, config: &Path) -> Result<(), EngineError> {
        if self.connection.is_some() {
            return Ok(());
        }
        self.launch(config)?;
        let stream = self.open_socket().await?;
        self.connection = Some(Framed::new(stream, TraciCodec));
        let responses = self.request(version_command()).await?;
        let (api, identifier) = version_value(&responses)?;
        if api < MIN_API_VERSION {
            warn!(api, %identifier, "오래된 TraCI API 버전");
        } else {
            info!(api, %identifier, "TraCI 연결 완료");
        }
        Ok(())
    }

    async fn step(&mut self) -> Result<bool, EngineError> {
        self.request(simstep_command(0.0)).await?;
        let expected = self
            .get_var(CMD_GET_SIM_VARIABLE, VAR_MIN_EXPECTED_VEHICLES, "")
            .await?
            .as_i32()?;
        Ok(expected > 0)
    }

    async fn disconnect(&mut self) -> Result<(), EngineError> {
        let mut result = Ok(());
        if self.connection.is_some() {
            if let Err(err) = self.request(close_command()).await {
                result = Err(err);
            }
            self.connection = None;
        }
        if let Some(mut child) = self.child.take() {
            if let Err(err) = child.kill().await {
                debug!(%err, "SUMO 프로세스 종료 실패 (이미 종료되었을 수 있음)");
            }
            info!("SUMO 프로세스 종료");
        }
        result
    }

    async fn vehicle_ids(&mut self) -> Result<Vec<String>, EngineError> {
        self.vehicle_var(ID_LIST, "").await?.into_string_list()
    }

    async fn vehicle_state(&mut self, id: &str) -> Result<Option<VehicleState>, EngineError> {
        match self.read_vehicle(id).await {
            Ok(state) => Ok(Some(state)),
            Err(EngineError::CommandFailed { message, .. }) => {
                debug!(vehicle = id, %message, "차량 조회 실패, 이미 도착한 차량으로 간주");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn simulation_time(&mut self) -> Result<f64, EngineError> {
        self.get_var(CMD_GET_SIM_VARIABLE, VAR_TIME, "")
            .await?
            .as_f64()
    }

    async fn traffic_light_ids(&mut self) -> Result<Vec<String>, EngineError> {
        self.get_var(CMD_GET_TL_VARIABLE, ID_LIST, "")
            .await?
            .into_string_list()
    }

    async fn traffic_light_state(&mut self, id: &str) -> Result<String, EngineError> {
        self.get_var(CMD_GET_TL_VARIABLE, TL_RED_YELLOW_GREEN_STATE, id)
            .await?
            .into_string()
    }

    async fn set_traffic_light_state(&mut self, id: &str, state: &str) -> Result<(), EngineError> {
        self.request(set_string_command(
            CMD_SET_TL_VARIABLE,
            TL_RED_YELLOW_GREEN_STATE,
            id,
            state,
        ))
        .await?;
        Ok(())
    }

    async fn network_bounds(&mut self) -> Result<NetworkBounds, EngineError> {
        let points = self
            .get_var(CMD_GET_SIM_VARIABLE, VAR_NET_BOUNDING_BOX, "")
            .await?
            .into_polygon()?;
        match points.as_slice() {
            [(min_x, min_y), (max_x, max_y), ..] => Ok(NetworkBounds {
                min_x: *min_x,
                min_y: *min_y,
                max_x: *max_x,
                max_y: *max_y,
            }),
            _ => Err(EngineError::Protocol(format!(
                "경계 상자 좌표가 부족합니다: {points:?}"
            ))),
        }
    }
}

/// 프로세스 파이프를 읽어 로그와 이벤트로 중계한다.
async fn pipe_forwarder<R>(reader: R, sender: UnboundedSender<EngineEvent>, tag: &'static str)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut lines = FramedRead::new(reader, LinesCodec::new());
    while let Some(line_result) = lines.next().await {
        match line_result {
            Ok(line) => {
                debug!(target: "sumo", "{tag}: {line}");
                let _ = sender.send(EngineEvent::Log {
                    line: format!("{tag}: {line}"),
                });
            }
            Err(err) => {
                warn!(%err, "{tag} 읽기 오류");
                break;
            }
        }
    }
}
