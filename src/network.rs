use crate::editor::model::SPEED_RANGE;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 기본 제한 속도(m/s).
const DEFAULT_LANE_SPEED: f32 = 13.89;

/// 네트워크 파일 입출력 중 발생 가능한 오류이다.
#[derive(Debug, thiserror::Error)]
pub enum NetworkFileError {
    #[error("파일 입출력 실패: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML 처리 실패: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("XML 파싱 실패: {0}")]
    Xml(#[from] roxmltree::Error),
    /// 필수 속성이 없는 요소이다.
    #[error("<{element}> 요소에 '{attribute}' 속성이 없습니다.")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    /// 숫자로 해석할 수 없는 속성 값이다.
    #[error("'{attribute}' 값을 숫자로 해석할 수 없습니다: {value}")]
    InvalidNumber { attribute: &'static str, value: String },
}

/// 내보내기/가져오기용 노드 레코드.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    pub x: f32,
    pub y: f32,
}

/// 내보내기/가져오기용 엣지 레코드.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub id: String,
    pub from: String,
    pub to: String,
    #[serde(default = "default_lanes")]
    pub lanes: u32,
    #[serde(default = "default_speed")]
    pub speed: f32,
}

fn default_lanes() -> u32 {
    1
}

fn default_speed() -> f32 {
    DEFAULT_LANE_SPEED
}

/// 순서가 보존되는 네트워크 스냅샷이다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

impl NetworkSnapshot {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// YAML 네트워크 문서를 읽는다.
pub fn load_snapshot(path: &Path) -> Result<NetworkSnapshot, NetworkFileError> {
    let text = fs::read_to_string(path)?;
    let snapshot: NetworkSnapshot = serde_yaml::from_str(&text)?;
    debug!(
        path = %path.display(),
        nodes = snapshot.nodes.len(),
        edges = snapshot.edges.len(),
        "네트워크 문서 로드"
    );
    Ok(snapshot)
}

/// YAML 네트워크 문서를 저장한다.
pub fn save_snapshot(path: &Path, snapshot: &NetworkSnapshot) -> Result<(), NetworkFileError> {
    let text = serde_yaml::to_string(snapshot)?;
    fs::write(path, text)?;
    Ok(())
}

/// XML 속성 값에 쓸 수 있도록 특수 문자를 이스케이프한다.
pub fn xml_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// SUMO plain 노드 파일(`*.nod.xml`) 내용을 만든다.
pub fn nodes_xml(snapshot: &NetworkSnapshot) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<nodes>\n");
    for node in &snapshot.nodes {
        let _ = writeln!(
            out,
            "    <node id=\"{}\" x=\"{}\" y=\"{}\" type=\"priority\"/>",
            xml_escape(&node.id),
            node.x,
            node.y
        );
    }
    out.push_str("</nodes>\n");
    out
}

/// SUMO plain 엣지 파일(`*.edg.xml`) 내용을 만든다.
pub fn edges_xml(snapshot: &NetworkSnapshot) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<edges>\n");
    for edge in &snapshot.edges {
        let _ = writeln!(
            out,
            "    <edge id=\"{}\" from=\"{}\" to=\"{}\" numLanes=\"{}\" speed=\"{}\"/>",
            xml_escape(&edge.id),
            xml_escape(&edge.from),
            xml_escape(&edge.to),
            edge.lanes,
            edge.speed
        );
    }
    out.push_str("</edges>\n");
    out
}

/// netconvert 입력으로 쓸 plain XML 두 파일의 경로.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainXmlFiles {
    pub nodes: PathBuf,
    pub edges: PathBuf,
}

/// 디렉터리에 `nodes.nod.xml`, `edges.edg.xml`을 쓴다.
pub fn write_plain_xml(
    dir: &Path,
    snapshot: &NetworkSnapshot,
) -> Result<PlainXmlFiles, NetworkFileError> {
    fs::create_dir_all(dir)?;
    let files = PlainXmlFiles {
        nodes: dir.join("nodes.nod.xml"),
        edges: dir.join("edges.edg.xml"),
    };
    fs::write(&files.nodes, nodes_xml(snapshot))?;
    fs::write(&files.edges, edges_xml(snapshot))?;
    Ok(files)
}

fn parse_number(attribute: &'static str, value: &str) -> Result<f32, NetworkFileError> {
    value
        .trim()
        .parse::<f32>()
        .map_err(|_| NetworkFileError::InvalidNumber {
            attribute,
            value: value.to_string(),
        })
}

fn is_internal(edge: &roxmltree::Node<'_, '_>) -> bool {
    edge.attribute("function") == Some("internal")
        || edge.attribute("id").is_some_and(|id| id.starts_with(':'))
}

/// 편집기가 허용하는 범위로 제한 속도를 맞춘다.
fn clamp_speed(speed: f32) -> f32 {
    if !speed.is_finite() {
        return DEFAULT_LANE_SPEED;
    }
    speed.clamp(*SPEED_RANGE.start(), *SPEED_RANGE.end())
}

/// SUMO `*.net.xml` 내용을 스냅샷으로 변환한다.
///
/// 내부 엣지와 양 끝 노드가 없는 엣지는 건너뛴다.
pub fn parse_net_xml(text: &str) -> Result<NetworkSnapshot, NetworkFileError> {
    let doc = roxmltree::Document::parse(text)?;
    let mut snapshot = NetworkSnapshot::default();
    for junction in doc.descendants().filter(|n| n.has_tag_name("junction")) {
        if junction.attribute("type") == Some("internal") {
            continue;
        }
        let id = junction
            .attribute("id")
            .ok_or(NetworkFileError::MissingAttribute {
                element: "junction",
                attribute: "id",
            })?;
        let x = junction
            .attribute("x")
            .ok_or(NetworkFileError::MissingAttribute {
                element: "junction",
                attribute: "x",
            })?;
        let y = junction
            .attribute("y")
            .ok_or(NetworkFileError::MissingAttribute {
                element: "junction",
                attribute: "y",
            })?;
        snapshot.nodes.push(NodeRecord {
            id: id.to_string(),
            x: parse_number("x", x)?,
            y: parse_number("y", y)?,
        });
    }
    for edge in doc.descendants().filter(|n| n.has_tag_name("edge")) {
        if is_internal(&edge) {
            continue;
        }
        let (Some(id), Some(from), Some(to)) = (
            edge.attribute("id"),
            edge.attribute("from"),
            edge.attribute("to"),
        ) else {
            debug!(id = ?edge.attribute("id"), "끝점이 없는 엣지 건너뜀");
            continue;
        };
        let lanes: Vec<_> = edge
            .children()
            .filter(|child| child.has_tag_name("lane"))
            .collect();
        let speed = match lanes.first().and_then(|lane| lane.attribute("speed")) {
            Some(value) => clamp_speed(parse_number("speed", value)?),
            None => DEFAULT_LANE_SPEED,
        };
        snapshot.edges.push(EdgeRecord {
            id: id.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            lanes: (lanes.len() as u32).max(1),
            speed,
        });
    }
    Ok(snapshot)
}

/// `*.net.xml` 파일을 읽어 스냅샷으로 변환한다.
pub fn load_net_xml(path: &Path) -> Result<NetworkSnapshot, NetworkFileError> {
    let text = fs::read_to_string(path)?;
    parse_net_xml(&text)
}

/// 경로 파일에 쓸 엣지 ID 목록을 net.xml에서 읽는다. 실패하면 `edge0` 하나를 쓴다.
pub fn route_edge_ids(net_file: &Path) -> Vec<String> {
    match load_net_xml(net_file) {
        Ok(snapshot) if !snapshot.edges.is_empty() => {
            snapshot.edges.into_iter().map(|edge| edge.id).collect()
        }
        Ok(_) => vec!["edge0".to_string()],
        Err(err) => {
            warn!(%err, path = %net_file.display(), "네트워크 엣지 목록을 읽지 못했습니다");
            vec!["edge0".to_string()]
        }
    }
}

/// 차량 출발 시간 분포.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepartureDistribution {
    #[default]
    Uniform,
    Poisson,
    Normal,
    RushHour,
}

impl DepartureDistribution {
    pub const ALL: [DepartureDistribution; 4] = [
        DepartureDistribution::Uniform,
        DepartureDistribution::Poisson,
        DepartureDistribution::Normal,
        DepartureDistribution::RushHour,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DepartureDistribution::Uniform => "Uniform",
            DepartureDistribution::Poisson => "Poisson",
            DepartureDistribution::Normal => "Normal",
            DepartureDistribution::RushHour => "Rush Hour",
        }
    }
}

/// 차량별 출발 시간(초)을 계산한다. 모든 값은 `[0, duration-1]`로 제한된다.
pub fn departure_times(
    distribution: DepartureDistribution,
    count: u32,
    duration: u32,
    rng: &mut impl Rng,
) -> Vec<f64> {
    if count == 0 {
        return Vec::new();
    }
    let duration = f64::from(duration);
    let n = f64::from(count);
    let upper = (duration - 1.0).max(0.0);
    (0..count)
        .map(|i| {
            let i = f64::from(i);
            let raw = match distribution {
                DepartureDistribution::Uniform => i * (duration / n),
                DepartureDistribution::Poisson => sample_poisson(rng, duration / n),
                DepartureDistribution::Normal => {
                    sample_normal(rng, duration / 2.0, duration / 6.0).max(0.0)
                }
                DepartureDistribution::RushHour => {
                    let start = duration * 0.3;
                    let end = duration * 0.7;
                    start + i * ((end - start) / n)
                }
            };
            raw.clamp(0.0, upper)
        })
        .collect()
}

/// 평균이 `lambda`인 포아송 표본.
fn sample_poisson(rng: &mut impl Rng, lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 0.0;
    }
    if lambda > 30.0 {
        // 큰 평균에서는 정규 근사를 쓴다.
        return sample_normal(rng, lambda, lambda.sqrt()).round().max(0.0);
    }
    let limit = (-lambda).exp();
    let mut k = 0u32;
    let mut p = 1.0;
    loop {
        p *= rng.gen_range(0.0..1.0);
        if p <= limit {
            return f64::from(k);
        }
        k += 1;
    }
}

/// Box-Muller 정규 표본.
fn sample_normal(rng: &mut impl Rng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

/// 경로 파일(`*.rou.xml`) 내용을 만든다.
pub fn route_xml(
    edge_ids: &[String],
    vehicle_count: u32,
    duration: u32,
    distribution: DepartureDistribution,
    rng: &mut impl Rng,
) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<routes>\n");
    out.push_str(
        "    <vType id=\"car\" accel=\"2.6\" decel=\"4.5\" sigma=\"0.5\" length=\"5\" maxSpeed=\"50\"/>\n",
    );
    let edges: Vec<String> = edge_ids.iter().map(|id| xml_escape(id)).collect();
    let _ = writeln!(out, "    <route id=\"route0\" edges=\"{}\"/>", edges.join(" "));
    for (i, depart) in departure_times(distribution, vehicle_count, duration, rng)
        .into_iter()
        .enumerate()
    {
        let _ = writeln!(
            out,
            "    <vehicle id=\"veh{i}\" type=\"car\" route=\"route0\" depart=\"{depart:.2}\" departPos=\"random\"/>"
        );
    }
    out.push_str("</routes>\n");
    out
}

/// `*.sumocfg` 작성에 필요한 값.
#[derive(Debug, Clone, PartialEq)]
pub struct SumoConfigSpec {
    pub net_file: PathBuf,
    pub route_file: PathBuf,
    pub duration: u32,
    pub step_length: f64,
    /// 설정 시 summary/tripinfo 출력을 이 디렉터리에 남긴다.
    pub output_dir: Option<PathBuf>,
}

/// SUMO 설정 파일 내용을 만든다.
pub fn config_xml(spec: &SumoConfigSpec) -> String {
    let path = |p: &Path| xml_escape(&p.to_string_lossy());
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<configuration>\n");
    out.push_str("    <input>\n");
    let _ = writeln!(out, "        <net-file value=\"{}\"/>", path(&spec.net_file));
    let _ = writeln!(out, "        <route-files value=\"{}\"/>", path(&spec.route_file));
    out.push_str("    </input>\n");
    out.push_str("    <defaults>\n        <randomize>\n");
    out.push_str("            <vehicle.depart-pos value=\"random\"/>\n");
    out.push_str("            <vehicle.departspeed value=\"random\"/>\n");
    out.push_str("        </randomize>\n    </defaults>\n");
    out.push_str("    <time>\n        <begin value=\"0\"/>\n");
    let _ = writeln!(out, "        <end value=\"{}\"/>", spec.duration);
    let _ = writeln!(out, "        <step-length value=\"{}\"/>", spec.step_length);
    out.push_str("    </time>\n");
    if let Some(dir) = &spec.output_dir {
        out.push_str("    <output>\n");
        let _ = writeln!(
            out,
            "        <summary-output value=\"{}\"/>",
            path(&dir.join("summary.xml"))
        );
        let _ = writeln!(
            out,
            "        <tripinfo-output value=\"{}\"/>",
            path(&dir.join("tripinfo.xml"))
        );
        out.push_str("    </output>\n");
    }
    out.push_str("    <report>\n        <verbose value=\"false\"/>\n");
    out.push_str("        <no-step-log value=\"true\"/>\n    </report>\n");
    out.push_str("</configuration>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::time::{SystemTime, UNIX_EPOCH};

    const NET_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<net version="1.9">
    <location netOffset="0.00,0.00"/>
    <edge id=":n1_0" function="internal">
        <lane id=":n1_0_0" index="0" speed="13.89" length="3.00" shape="0,0 1,1"/>
    </edge>
    <edge id="e1" from="n1" to="n2" priority="-1">
        <lane id="e1_0" index="0" speed="27.50" length="100.00" shape="0,0 100,0"/>
        <lane id="e1_1" index="1" speed="27.50" length="100.00" shape="0,3 100,3"/>
    </edge>
    <edge id="e2" from="n2">
        <lane id="e2_0" index="0" speed="10.00" length="10.00" shape="0,0 1,1"/>
    </edge>
    <edge id="e3" from="n2" to="n1"/>
    <junction id="n1" type="priority" x="0.00" y="0.00"/>
    <junction id="n2" type="priority" x="100.00" y="-5.50"/>
    <junction id=":n1_0_0" type="internal" x="1.00" y="1.00"/>
</net>
"#;

    /// net.xml 가져오기에서 내부 엣지와 끝점 없는 엣지를 건너뛴다.
    #[test]
    fn net_xml_import_skips_internal_and_dangling_edges() {
        let snapshot = parse_net_xml(NET_XML).expect("파싱 실패");
        assert_eq!(
            snapshot.nodes,
            vec![
                NodeRecord { id: "n1".into(), x: 0.0, y: 0.0 },
                NodeRecord { id: "n2".into(), x: 100.0, y: -5.5 },
            ]
        );
        let ids: Vec<_> = snapshot.edges.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e1", "e3"]);
        assert_eq!(snapshot.edges[0].lanes, 2);
        assert!((snapshot.edges[0].speed - 27.5).abs() < 1e-5);
        assert_eq!(snapshot.edges[1].lanes, 1);
        assert!((snapshot.edges[1].speed - 13.89).abs() < 1e-5);
    }

    /// 범위를 벗어난 차로 속도는 편집기 범위로 잘라 가져온다.
    #[test]
    fn net_xml_speeds_are_clamped() {
        let text = r#"<net>
    <junction id="a" x="0" y="0"/>
    <junction id="b" x="100" y="0"/>
    <edge id="zero" from="a" to="b"><lane id="zero_0" speed="0"/></edge>
    <edge id="negative" from="a" to="b"><lane id="negative_0" speed="-5"/></edge>
    <edge id="fast" from="a" to="b"><lane id="fast_0" speed="120"/></edge>
    <edge id="nan" from="a" to="b"><lane id="nan_0" speed="NaN"/></edge>
</net>"#;
        let snapshot = parse_net_xml(text).expect("파싱 실패");
        let speeds: Vec<f32> = snapshot.edges.iter().map(|e| e.speed).collect();
        assert_eq!(
            speeds,
            vec![
                *SPEED_RANGE.start(),
                *SPEED_RANGE.start(),
                *SPEED_RANGE.end(),
                DEFAULT_LANE_SPEED
            ]
        );
    }

    /// 숫자가 아닌 좌표는 오류로 보고된다.
    #[test]
    fn invalid_coordinate_is_reported() {
        let text = r#"<net><junction id="a" x="abc" y="0"/></net>"#;
        assert!(matches!(
            parse_net_xml(text),
            Err(NetworkFileError::InvalidNumber { attribute: "x", .. })
        ));
    }

    /// plain XML 출력에서 속성 값이 이스케이프된다.
    #[test]
    fn plain_xml_escapes_ids() {
        let snapshot = NetworkSnapshot {
            nodes: vec![NodeRecord { id: "a&b".into(), x: 1.5, y: -2.0 }],
            edges: vec![EdgeRecord {
                id: "e\"1".into(),
                from: "a&b".into(),
                to: "c".into(),
                lanes: 2,
                speed: 13.89,
            }],
        };
        let nodes = nodes_xml(&snapshot);
        assert!(nodes.contains(r#"<node id="a&amp;b" x="1.5" y="-2" type="priority"/>"#));
        let edges = edges_xml(&snapshot);
        assert!(edges.contains(
            r#"<edge id="e&quot;1" from="a&amp;b" to="c" numLanes="2" speed="13.89"/>"#
        ));
        assert!(roxmltree::Document::parse(&edges).is_ok());
    }

    /// YAML 문서 저장 후 다시 읽으면 같은 스냅샷이 나온다.
    #[test]
    fn yaml_document_round_trips() {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("시스템 시간이 UTC epoch 이전입니다.")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("traffic_dashboard_yaml_{nanos}"));
        std::fs::create_dir_all(&dir).expect("임시 디렉터리 생성 실패");
        let path = dir.join("network.yaml");
        let snapshot = NetworkSnapshot {
            nodes: vec![
                NodeRecord { id: "n0".into(), x: 0.0, y: 0.0 },
                NodeRecord { id: "n1".into(), x: 120.25, y: -40.0 },
            ],
            edges: vec![EdgeRecord {
                id: "e0".into(),
                from: "n0".into(),
                to: "n1".into(),
                lanes: 3,
                speed: 22.22,
            }],
        };
        save_snapshot(&path, &snapshot).expect("저장 실패");
        let loaded = load_snapshot(&path).expect("로드 실패");
        assert_eq!(loaded, snapshot);
        let _ = std::fs::remove_dir_all(&dir);
    }

    /// 균등 분포 출발 시간은 단조 증가하며 범위 안에 있다.
    #[test]
    fn uniform_departures_are_sorted_and_bounded() {
        let mut rng = StdRng::seed_from_u64(7);
        let times = departure_times(DepartureDistribution::Uniform, 100, 600, &mut rng);
        assert_eq!(times.len(), 100);
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
        assert!(times.iter().all(|t| (0.0..=599.0).contains(t)));
        assert_eq!(times[1], 6.0);
    }

    /// 무작위 분포도 모두 `[0, duration-1]` 범위로 제한된다.
    #[test]
    fn random_departures_are_clamped() {
        let mut rng = StdRng::seed_from_u64(42);
        for distribution in DepartureDistribution::ALL {
            let times = departure_times(distribution, 200, 60, &mut rng);
            assert!(times.iter().all(|t| (0.0..=59.0).contains(t)), "{distribution:?}");
        }
        let rush = departure_times(DepartureDistribution::RushHour, 10, 100, &mut rng);
        assert!(rush.iter().all(|t| (30.0..70.0).contains(t)));
    }

    /// 모든 차량이 하나의 경로를 참조한다.
    #[test]
    fn route_file_references_single_route() {
        let mut rng = StdRng::seed_from_u64(1);
        let xml = route_xml(
            &["e1".to_string(), "e2".to_string()],
            5,
            100,
            DepartureDistribution::Uniform,
            &mut rng,
        );
        let doc = roxmltree::Document::parse(&xml).expect("유효한 XML");
        let routes: Vec<_> = doc.descendants().filter(|n| n.has_tag_name("route")).collect();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].attribute("edges"), Some("e1 e2"));
        let vehicles: Vec<_> = doc
            .descendants()
            .filter(|n| n.has_tag_name("vehicle"))
            .collect();
        assert_eq!(vehicles.len(), 5);
        assert!(vehicles.iter().all(|v| v.attribute("route") == Some("route0")));
        assert_eq!(vehicles[1].attribute("depart"), Some("20.00"));
    }

    /// 데이터 수집 여부에 따라 출력 섹션이 들어간다.
    #[test]
    fn config_includes_outputs_when_collecting() {
        let mut spec = SumoConfigSpec {
            net_file: PathBuf::from("network.net.xml"),
            route_file: PathBuf::from("routes.rou.xml"),
            duration: 600,
            step_length: 0.1,
            output_dir: None,
        };
        let plain = config_xml(&spec);
        assert!(plain.contains("<end value=\"600\"/>"));
        assert!(plain.contains("<step-length value=\"0.1\"/>"));
        assert!(!plain.contains("summary-output"));
        spec.output_dir = Some(PathBuf::from("out"));
        let collecting = config_xml(&spec);
        assert!(collecting.contains("summary-output"));
        assert!(roxmltree::Document::parse(&collecting).is_ok());
    }
}
