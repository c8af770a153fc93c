use super::events::EngineEvent;
use super::install::SumoInstallation;
use crate::network::PlainXmlFiles;
use anyhow::{Context, bail};
use std::path::PathBuf;
use tokio::process::Command;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

/// plain XML 두 파일을 `netconvert`로 `*.net.xml`로 컴파일한다.
///
/// 결과는 반환값과 함께 이벤트로도 알린다.
pub async fn compile_network(
    install: SumoInstallation,
    inputs: PlainXmlFiles,
    output: PathBuf,
    sender: UnboundedSender<EngineEvent>,
) -> anyhow::Result<()> {
    let result = run_netconvert(&install, &inputs, &output, &sender).await;
    match &result {
        Ok(()) => {
            info!(output = %output.display(), "네트워크 컴파일 완료");
            let _ = sender.send(EngineEvent::NetworkCompiled { output });
        }
        Err(err) => {
            warn!(error = %format!("{err:#}"), "네트워크 컴파일 실패");
            let _ = sender.send(EngineEvent::NetworkCompileFailed {
                message: format!("{err:#}"),
            });
        }
    }
    result
}

async fn run_netconvert(
    install: &SumoInstallation,
    inputs: &PlainXmlFiles,
    output: &PathBuf,
    sender: &UnboundedSender<EngineEvent>,
) -> anyhow::Result<()> {
    let Some(netconvert) = &install.netconvert else {
        bail!("netconvert 실행 파일을 찾을 수 없습니다");
    };
    let result = Command::new(netconvert)
        .arg("-n")
        .arg(&inputs.nodes)
        .arg("-e")
        .arg(&inputs.edges)
        .arg("-o")
        .arg(output)
        .output()
        .await
        .with_context(|| format!("netconvert 실행 실패: {}", netconvert.display()))?;
    for line in String::from_utf8_lossy(&result.stdout).lines() {
        let _ = sender.send(EngineEvent::Log {
            line: format!("netconvert STDOUT: {line}"),
        });
    }
    let stderr = String::from_utf8_lossy(&result.stderr);
    for line in stderr.lines() {
        let _ = sender.send(EngineEvent::Log {
            line: format!("netconvert STDERR: {line}"),
        });
    }
    if !result.status.success() {
        bail!("netconvert 종료 코드 {}: {}", result.status, stderr.trim());
    }
    Ok(())
}
