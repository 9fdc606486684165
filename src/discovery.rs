//! Anki 미디어 폴더 탐색 모듈
//!
//! OS별 `Anki2` 폴더 아래의 프로필들을 살펴보고,
//! mp3 파일이 가장 많은 `collection.media` 폴더를 고릅니다.

use glob::Pattern;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const ANKI_DIR: &str = "Anki2";
const MEDIA_DIR: &str = "collection.media";
const AUDIO_PATTERN: &str = "*.mp3";

/// OS별 `Anki2` 후보 경로
pub fn candidate_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();

    if let Some(data_dir) = dirs::data_dir() {
        roots.push(data_dir.join(ANKI_DIR));
    }

    if let Some(home) = dirs::home_dir() {
        if cfg!(target_os = "linux") {
            roots.push(home.join(".local").join("share").join(ANKI_DIR));
        }
        if cfg!(any(target_os = "linux", target_os = "macos")) {
            roots.push(home.join(ANKI_DIR));
        }
    }

    let mut unique: Vec<PathBuf> = Vec::with_capacity(roots.len());
    for root in roots {
        if !unique.contains(&root) {
            unique.push(root);
        }
    }
    unique
}

/// 기본 미디어 폴더 탐색
pub fn find_collection_media() -> Option<PathBuf> {
    pick_media_dir(&candidate_roots())
}

/// 후보 루트들의 프로필 중 mp3가 가장 많은 `collection.media` 선택
///
/// 개수가 같으면 먼저 발견된 폴더를 고릅니다.
pub fn pick_media_dir(roots: &[PathBuf]) -> Option<PathBuf> {
    let mut best: Option<(usize, PathBuf)> = None;

    for root in roots.iter().filter(|r| r.is_dir()) {
        let profiles = WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir());

        for profile in profiles {
            let media = profile.path().join(MEDIA_DIR);
            if !media.is_dir() {
                continue;
            }

            let count = count_audio_files(&media);
            if best.as_ref().map_or(true, |(n, _)| count > *n) {
                best = Some((count, media));
            }
        }
    }

    best.map(|(_, path)| path)
}

/// 폴더 바로 아래의 `*.mp3` 파일 수
pub fn count_audio_files(dir: &Path) -> usize {
    let Ok(pattern) = Pattern::new(AUDIO_PATTERN) else {
        return 0;
    };

    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.file_name()
                .to_str()
                .map(|name| pattern.matches(name))
                .unwrap_or(false)
        })
        .count()
}
