use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 시작 시 한 번 확인하는 SUMO 설치 정보.
///
/// 이 값이 없으면 시뮬레이션 기능은 비활성화된다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SumoInstallation {
    pub sumo: PathBuf,
    /// 네트워크 컴파일용. 없으면 net.xml 내보내기만 불가하다.
    pub netconvert: Option<PathBuf>,
}

impl SumoInstallation {
    /// `sumo_home`(설정 값), `SUMO_HOME/bin`, `PATH` 순서로 찾는다.
    pub fn discover(sumo_home: Option<&Path>) -> Option<Self> {
        let mut dirs: Vec<PathBuf> = Vec::new();
        if let Some(home) = sumo_home {
            dirs.push(home.join("bin"));
        }
        if let Some(home) = env::var_os("SUMO_HOME") {
            dirs.push(PathBuf::from(home).join("bin"));
        }
        if let Some(path) = env::var_os("PATH") {
            dirs.extend(env::split_paths(&path));
        }
        let found = Self::find_in(dirs);
        match &found {
            Some(install) => info!(sumo = %install.sumo.display(), "SUMO 설치 확인"),
            None => info!("SUMO를 찾지 못해 시뮬레이션 기능을 비활성화합니다"),
        }
        found
    }

    /// 주어진 디렉터리 목록에서 처음 발견한 `sumo`를 쓴다.
    pub fn find_in(dirs: impl IntoIterator<Item = PathBuf>) -> Option<Self> {
        let dirs: Vec<PathBuf> = dirs.into_iter().collect();
        let sumo = dirs.iter().find_map(|dir| executable(dir, "sumo"))?;
        let netconvert = sumo
            .parent()
            .and_then(|dir| executable(dir, "netconvert"))
            .or_else(|| dirs.iter().find_map(|dir| executable(dir, "netconvert")));
        Some(Self { sumo, netconvert })
    }
}

fn executable(dir: &Path, name: &str) -> Option<PathBuf> {
    let candidate = dir.join(format!("{name}{}", env::consts::EXE_SUFFIX));
    if candidate.is_file() {
        debug!(path = %candidate.display(), "실행 파일 발견");
        Some(candidate)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> PathBuf {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("시간 계산 실패")
            .as_nanos();
        let dir = env::temp_dir().join(format!("sumo_install_{name}_{ts}"));
        std::fs::create_dir_all(&dir).expect("임시 디렉터리 생성 실패");
        dir
    }

    fn touch(dir: &Path, name: &str) {
        let path = dir.join(format!("{name}{}", env::consts::EXE_SUFFIX));
        std::fs::write(path, b"").expect("파일 작성 실패");
    }

    #[test]
    fn finds_sumo_and_sibling_netconvert() {
        let empty = temp_dir("empty");
        let bin = temp_dir("bin");
        touch(&bin, "sumo");
        touch(&bin, "netconvert");
        let install =
            SumoInstallation::find_in(vec![empty.clone(), bin.clone()]).expect("sumo 탐색 실패");
        assert_eq!(install.sumo.parent(), Some(bin.as_path()));
        assert!(install.netconvert.is_some());
        let _ = std::fs::remove_dir_all(&empty);
        let _ = std::fs::remove_dir_all(&bin);
    }

    #[test]
    fn missing_sumo_means_unavailable() {
        let dir = temp_dir("none");
        touch(&dir, "netconvert");
        assert!(SumoInstallation::find_in(vec![dir.clone()]).is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
