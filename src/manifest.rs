//! 덱 매니페스트 (`decks.json`) 모듈
//!
//! 지금까지 성공적으로 내보낸 덱 폴더 이름의 순서 있는 집합입니다.

use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::Path;
use tracing::warn;

use crate::error::{ExportError, Result};

/// 내보낸 덱 폴더 이름 목록
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    decks: Vec<String>,
}

impl Manifest {
    /// 주어진 이름들로 매니페스트 생성 (중복 제거, 순서 유지)
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut manifest = Self::default();
        for name in names {
            manifest.insert(name.into());
        }
        manifest
    }

    /// `decks.json` 읽기
    ///
    /// 파일이 없거나 읽을 수 없거나 손상된 경우 빈 매니페스트를 돌려줍니다.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        let parsed = File::open(path)
            .map_err(|e| e.to_string())
            .and_then(|f| {
                serde_json::from_reader::<_, Vec<String>>(BufReader::new(f))
                    .map_err(|e| e.to_string())
            });

        match parsed {
            Ok(names) => Self::from_names(names),
            Err(reason) => {
                warn!(path = %path.display(), %reason, "decks.json을 읽을 수 없어 빈 목록으로 시작합니다");
                Self::default()
            }
        }
    }

    /// `decks.json` 전체를 다시 씀
    ///
    /// 임시 파일에 쓴 뒤 이름을 바꾸므로 중간에 실패해도 기존 파일은 온전합니다.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, &self.decks)
    }

    /// 이름이 포함되어 있는지 확인
    pub fn contains(&self, name: &str) -> bool {
        self.decks.iter().any(|d| d == name)
    }

    /// 없으면 추가하고 추가 여부를 돌려줌
    pub fn insert(&mut self, name: String) -> bool {
        if self.contains(&name) {
            return false;
        }
        self.decks.push(name);
        true
    }

    /// 조건을 만족하는 항목만 남김
    pub fn retain<F: FnMut(&str) -> bool>(&mut self, mut keep: F) -> Vec<String> {
        let (kept, dropped): (Vec<String>, Vec<String>) = std::mem::take(&mut self.decks)
            .into_iter()
            .partition(|d| keep(d.as_str()));
        self.decks = kept;
        dropped
    }

    pub fn decks(&self) -> &[String] {
        &self.decks
    }

    pub fn len(&self) -> usize {
        self.decks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decks.is_empty()
    }

    pub fn into_decks(self) -> Vec<String> {
        self.decks
    }
}

/// 값을 pretty JSON으로 임시 파일에 쓴 뒤 `path`로 이름 변경
pub(crate) fn write_json_atomic<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| ExportError::SerializeError {
        file: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let tmp = path.with_extension("json.tmp");
    let write = || -> std::io::Result<()> {
        let mut file = File::create(&tmp)?;
        file.write_all(json.as_bytes())?;
        file.write_all(b"\n")?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    };

    write().map_err(|e| {
        let _ = fs::remove_file(&tmp);
        ExportError::io(path, e)
    })
}
