use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Cargo 빌드 단계에서 대시보드가 사용할 폰트 스텁을 준비한다.
fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    if let Err(err) = generate_font_stub() {
        println!("cargo:warning=폰트 스텁 생성 실패: {err}");
    }
}

/// 한글을 표시할 수 있는 폰트를 찾아 include_bytes! 스텁을 만든다.
fn generate_font_stub() -> std::io::Result<()> {
    let out_dir = env::var_os("OUT_DIR")
        .map(PathBuf::from)
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "OUT_DIR 미설정"))?;
    let dest = out_dir.join("custom_font.rs");
    let content = match locate_font_file() {
        Some(path) => {
            let escaped = path.to_string_lossy().replace('\\', "\\\\");
            format!(
                "pub fn embedded_font_bytes() -> Option<&'static [u8]> {{\n    Some(include_bytes!(\"{escaped}\"))\n}}\n"
            )
        }
        None => "pub fn embedded_font_bytes() -> Option<&'static [u8]> { None }\n".to_string(),
    };
    fs::write(dest, content)
}

/// 시스템 폰트 디렉터리를 순회하며 후보 폰트를 고른다.
fn locate_font_file() -> Option<PathBuf> {
    if let Some(explicit) = env::var_os("TRAFFIC_DASHBOARD_FONT") {
        let path = PathBuf::from(explicit);
        if path.is_file() {
            println!("cargo:rerun-if-changed={}", path.display());
            return Some(path);
        }
    }
    let mut candidates: Vec<PathBuf> = vec![
        PathBuf::from("/usr/share/fonts"),
        PathBuf::from("/usr/local/share/fonts"),
        PathBuf::from("/System/Library/Fonts"),
        PathBuf::from("/Library/Fonts"),
    ];
    if let Some(home) = env::var_os("HOME") {
        candidates.push(Path::new(&home).join(".fonts"));
    }
    if let Some(windir) = env::var_os("WINDIR") {
        candidates.push(Path::new(&windir).join("Fonts"));
    }
    let keywords = ["noto", "nanum", "malgun", "applegothic", "pretendard"];
    for dir in candidates.into_iter().filter(|dir| dir.exists()) {
        for entry in WalkDir::new(dir).into_iter().filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.into_path();
            let lower = path
                .file_name()
                .and_then(|name| name.to_str())
                .map(|s| s.to_ascii_lowercase())
                .unwrap_or_default();
            if !keywords.iter().any(|k| lower.contains(k)) {
                continue;
            }
            let is_font = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "ttf" | "otf" | "ttc"))
                .unwrap_or(false);
            if is_font {
                println!("cargo:rerun-if-changed={}", path.display());
                return Some(path);
            }
        }
    }
    println!("cargo:warning=한글 폰트를 찾지 못했습니다. egui 기본 폰트가 사용됩니다.");
    None
}
