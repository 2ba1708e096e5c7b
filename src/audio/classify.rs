// 输出轨道分类模块
//
// 引擎输出只能按文件名判断轨道类型（文件名启发式，不做内容检测）：
// - 两轨引擎：文件名含 "vocals"（忽略大小写）判为人声，其余判为伴奏
// - 多轨引擎：按 demucs 固定的 stem 文件名精确匹配

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::models::EngineKind;

/// 轨道类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TrackRole {
    /// 人声
    Vocals,
    /// 伴奏
    Instrumental,
    /// 鼓
    Drums,
    /// 贝斯
    Bass,
    /// 其他乐器
    Other,
}

impl TrackRole {
    /// 输出文件名使用的前缀
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackRole::Vocals => "vocals",
            TrackRole::Instrumental => "instrumental",
            TrackRole::Drums => "drums",
            TrackRole::Bass => "bass",
            TrackRole::Other => "other",
        }
    }
}

impl fmt::Display for TrackRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // pad 让 {:<12} 这类宽度对齐在 CLI 输出里生效
        f.pad(self.as_str())
    }
}

/// 按引擎类型对输出文件分类
///
/// 返回 None 表示无法识别，只有多轨引擎会出现，调用方告警后跳过该文件。
pub fn classify_output(engine: EngineKind, path: &Path) -> Option<TrackRole> {
    match engine {
        EngineKind::Uvr => Some(classify_two_stem(path)),
        EngineKind::Demucs => classify_stem_name(path),
    }
}

/// 两轨分类：文件名含 "vocals" 即人声，其余一律视为伴奏
fn classify_two_stem(path: &Path) -> TrackRole {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if name.contains("vocals") {
        TrackRole::Vocals
    } else {
        TrackRole::Instrumental
    }
}

/// 多轨分类：按 demucs 固定 stem 名精确匹配文件主干
fn classify_stem_name(path: &Path) -> Option<TrackRole> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match stem.as_str() {
        "vocals" => Some(TrackRole::Vocals),
        "no_vocals" => Some(TrackRole::Instrumental),
        "drums" => Some(TrackRole::Drums),
        "bass" => Some(TrackRole::Bass),
        "other" => Some(TrackRole::Other),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_stem_vocals_case_insensitive() {
        for name in [
            "song_(Vocals)_UVR-MDX-NET-Inst_HQ_3.mp3",
            "song_VOCALS.mp3",
            "vocals_mix.wav",
        ] {
            assert_eq!(
                classify_output(EngineKind::Uvr, Path::new(name)),
                Some(TrackRole::Vocals),
                "{}",
                name
            );
        }
    }

    #[test]
    fn test_two_stem_everything_else_is_instrumental() {
        for name in [
            "song_(Instrumental)_UVR-MDX-NET-Inst_HQ_3.mp3",
            "song_backing.mp3",
            "song_vocal.mp3", // 单数 "vocal" 不触发人声判定
        ] {
            assert_eq!(
                classify_output(EngineKind::Uvr, Path::new(name)),
                Some(TrackRole::Instrumental),
                "{}",
                name
            );
        }
    }

    #[test]
    fn test_stem_name_exact_match() {
        let cases = [
            ("vocals.mp3", TrackRole::Vocals),
            ("no_vocals.mp3", TrackRole::Instrumental),
            ("drums.mp3", TrackRole::Drums),
            ("bass.mp3", TrackRole::Bass),
            ("other.mp3", TrackRole::Other),
        ];
        for (name, expected) in cases {
            let path = format!("htdemucs/song/{}", name);
            assert_eq!(
                classify_output(EngineKind::Demucs, Path::new(&path)),
                Some(expected),
                "{}",
                name
            );
        }
    }

    #[test]
    fn test_no_vocals_never_matches_vocals() {
        // "no_vocals" 含子串 "vocals"，精确匹配必须先于子串判断
        assert_eq!(
            classify_output(EngineKind::Demucs, Path::new("no_vocals.mp3")),
            Some(TrackRole::Instrumental)
        );
    }

    #[test]
    fn test_stem_name_unknown_is_none() {
        assert_eq!(
            classify_output(EngineKind::Demucs, Path::new("mystery.mp3")),
            None
        );
        assert_eq!(
            classify_output(EngineKind::Demucs, Path::new("vocals_extra.mp3")),
            None
        );
    }

    #[test]
    fn test_role_ordering_stable() {
        // 结果映射按该顺序遍历：人声、伴奏、鼓、贝斯、其他
        assert!(TrackRole::Vocals < TrackRole::Instrumental);
        assert!(TrackRole::Instrumental < TrackRole::Drums);
        assert!(TrackRole::Drums < TrackRole::Bass);
        assert!(TrackRole::Bass < TrackRole::Other);
    }

    #[test]
    fn test_role_display_pads_to_width() {
        // CLI 轨道列表按 {:<12} 对齐
        assert_eq!(format!("{:<12}", TrackRole::Vocals), "vocals      ");
        assert_eq!(format!("{:>8}", TrackRole::Bass), "    bass");
        assert_eq!(TrackRole::Instrumental.to_string(), "instrumental");
    }
}
