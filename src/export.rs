//! 내보내기 조정 모듈
//!
//! 선택된 덱들을 고정 크기 워커 풀에 나눠 처리하고,
//! 결과를 모아 `decks.json`에 반영합니다.
//!
//! 워커는 덱 결과를 채널로 보내기만 하며, 유효/무효 목록과
//! 매니페스트는 집계 스레드 하나만 수정합니다.

use indicatif::ProgressBar;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use tracing::{info, warn};

use crate::config::{ExportConfig, NOTES_FILE};
use crate::deck::{process_deck, DeckOutcome};
use crate::error::{DeckFailure, ExportError, Result};
use crate::manifest::Manifest;
use crate::normalize::sanitize_deck_name;
use crate::source::NoteSource;
use crate::stats::Statistics;

/// 같은 폴더로 내보내지는 덱 묶음
///
/// 한 워커가 선택 순서대로 처리하며, 처음 성공한 덱이 폴더를 차지합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckGroup {
    pub dir_name: String,
    pub decks: Vec<String>,
}

/// 실행 계획
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportPlan {
    /// 처리할 덱 묶음 (선택 순서)
    pub pending: Vec<DeckGroup>,
    /// 매니페스트에 이미 있어 건너뛸 덱
    pub already_exported: Vec<String>,
}

impl ExportPlan {
    /// 처리할 덱 수
    pub fn pending_decks(&self) -> usize {
        self.pending.iter().map(|g| g.decks.len()).sum()
    }
}

/// 실행 결과
#[derive(Debug)]
pub struct ExportReport {
    /// 내보낸 덱 폴더 이름 전체 (`decks.json` 내용)
    pub valid_decks: Vec<String>,
    /// 실패한 덱과 사유
    pub invalid_decks: Vec<(String, String)>,
    /// 이번 실행에서 내보낸 덱
    pub exported: Vec<String>,
    /// 이미 내보내져 건너뛴 덱
    pub already_exported: Vec<String>,
    /// 처리한 덱별 결과 (완료 순서)
    pub outcomes: Vec<DeckOutcome>,
    pub stats: Statistics,
}

/// 덱 내보내기 조정자
pub struct Exporter<S> {
    config: ExportConfig,
    source: S,
    cancel: Arc<AtomicBool>,
    progress: Option<ProgressBar>,
}

impl<S: NoteSource> Exporter<S> {
    pub fn new(config: ExportConfig, source: S) -> Self {
        Self {
            config,
            source,
            cancel: Arc::new(AtomicBool::new(false)),
            progress: None,
        }
    }

    /// 덱 하나가 끝날 때마다 진행률 바를 증가
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// 실행 취소 플래그
    ///
    /// `true`로 바꾸면 아직 시작하지 않은 덱은 건너뛰고,
    /// 처리 중인 덱은 폴더를 지운 뒤 실패로 보고됩니다.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// 현재 `decks.json` 기준으로 실행 계획 계산
    pub fn plan(&self, selected: &[String]) -> ExportPlan {
        plan_with(selected, &self.load_manifest())
    }

    /// 선택된 덱 내보내기
    ///
    /// 덱/노트 단위 실패는 결과에 기록되고, 출력 폴더 생성이나
    /// `decks.json` 쓰기 실패만 에러로 돌려줍니다.
    pub fn run(&self, selected: &[String]) -> Result<ExportReport> {
        let output_dir = &self.config.output_dir;
        if output_dir.exists() && !output_dir.is_dir() {
            return Err(ExportError::NotADirectory {
                path: output_dir.clone(),
            });
        }
        fs::create_dir_all(output_dir).map_err(|e| ExportError::io(output_dir, e))?;

        let mut manifest = self.load_manifest();
        let plan = plan_with(selected, &manifest);
        let pending_decks = plan.pending_decks();
        let stats = Statistics::new(pending_decks + plan.already_exported.len());
        stats.add_already_exported(plan.already_exported.len());

        info!(
            pending = pending_decks,
            already_exported = plan.already_exported.len(),
            workers = self.config.workers,
            "내보내기 시작"
        );

        if let Some(pb) = &self.progress {
            pb.set_length(pending_decks as u64);
        }

        let outcomes = self.dispatch(plan.pending)?;

        let mut exported = Vec::new();
        let mut invalid_decks = Vec::new();
        for outcome in &outcomes {
            stats.record(outcome);
            match &outcome.result {
                Ok(_) => {
                    manifest.insert(outcome.dir_name.clone());
                    exported.push(outcome.deck.clone());
                }
                Err(failure) => invalid_decks.push((outcome.deck.clone(), failure.to_string())),
            }
        }

        manifest.save(&self.config.decks_file())?;

        Ok(ExportReport {
            valid_decks: manifest.into_decks(),
            invalid_decks,
            exported,
            already_exported: plan.already_exported,
            outcomes,
            stats,
        })
    }

    /// 워커 풀에서 덱 묶음을 처리하고 결과를 완료 순서대로 수집
    fn dispatch(&self, pending: Vec<DeckGroup>) -> Result<Vec<DeckOutcome>> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .thread_name(|i| format!("deck-worker-{}", i))
            .build()
            .map_err(|e| ExportError::ThreadPoolError {
                reason: e.to_string(),
            })?;

        let (tx, rx) = mpsc::channel::<DeckOutcome>();
        let mut outcomes = Vec::with_capacity(pending.iter().map(|g| g.decks.len()).sum());

        thread::scope(|scope| {
            scope.spawn(move || {
                pool.install(|| {
                    pending.par_iter().for_each_with(tx, |tx, group| {
                        self.export_group(group, tx);
                    });
                });
            });

            for outcome in rx {
                if let Some(pb) = &self.progress {
                    pb.set_message(outcome.deck.clone());
                    pb.inc(1);
                }
                outcomes.push(outcome);
            }
        });

        if let Some(pb) = &self.progress {
            pb.finish_with_message("완료!");
        }

        Ok(outcomes)
    }

    /// 같은 폴더를 쓰는 덱들을 차례로 처리
    ///
    /// 한 덱이 성공하면 나머지 덱은 가져오지 않고 폴더 충돌로 보고합니다.
    fn export_group(&self, group: &DeckGroup, tx: &mpsc::Sender<DeckOutcome>) {
        let mut winner: Option<&str> = None;

        for deck in &group.decks {
            let outcome = match winner {
                Some(other) => {
                    warn!(deck = %deck, dir = %group.dir_name, other, "폴더 이름 충돌로 건너뜀");
                    DeckOutcome {
                        deck: deck.clone(),
                        dir_name: group.dir_name.clone(),
                        result: Err(DeckFailure::DuplicateDirectory {
                            dir_name: group.dir_name.clone(),
                            other: other.to_string(),
                        }),
                    }
                }
                None => process_deck(deck, &self.source, &self.config, &self.cancel),
            };

            if outcome.is_exported() {
                winner = Some(deck.as_str());
            }
            // 수신 측은 모든 송신자가 끝날 때까지 살아 있음
            let _ = tx.send(outcome);
        }
    }

    /// `decks.json` 읽기 (설정에 따라 사라진 덱 폴더 항목 제거)
    fn load_manifest(&self) -> Manifest {
        let mut manifest = Manifest::load(&self.config.decks_file());

        if self.config.recheck_existing {
            let dropped =
                manifest.retain(|dir| self.config.deck_dir(dir).join(NOTES_FILE).is_file());
            for dir in dropped {
                warn!(dir = %dir, "notes.json이 없어 다시 내보냅니다");
            }
        }

        manifest
    }

    /// 취소 요청 여부
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }
}

/// 매니페스트 기준 실행 계획 계산
///
/// 같은 이름이 여러 번 선택되면 한 번만 처리합니다.
fn plan_with(selected: &[String], manifest: &Manifest) -> ExportPlan {
    let mut plan = ExportPlan::default();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut groups: HashMap<String, usize> = HashMap::new();

    for deck in selected {
        if !seen.insert(deck.as_str()) {
            continue;
        }

        let dir_name = sanitize_deck_name(deck);
        if manifest.contains(&dir_name) {
            plan.already_exported.push(deck.clone());
            continue;
        }

        match groups.get(&dir_name) {
            Some(&index) => plan.pending[index].decks.push(deck.clone()),
            None => {
                groups.insert(dir_name.clone(), plan.pending.len());
                plan.pending.push(DeckGroup {
                    dir_name,
                    decks: vec![deck.clone()],
                });
            }
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn dirs(plan: &ExportPlan) -> Vec<(&str, Vec<&str>)> {
        plan.pending
            .iter()
            .map(|g| (g.dir_name.as_str(), g.decks.iter().map(String::as_str).collect()))
            .collect()
    }

    #[test]
    fn test_plan_skips_manifest_entries() {
        let manifest = Manifest::from_names(["Basics"]);
        let plan = plan_with(&names(&["German::Basics", "German::Verbs"]), &manifest);

        assert_eq!(dirs(&plan), vec![("Verbs", vec!["German::Verbs"])]);
        assert_eq!(plan.already_exported, vec!["German::Basics"]);
    }

    #[test]
    fn test_plan_groups_colliding_directories() {
        let plan = plan_with(
            &names(&["A::Verbs", "Nouns", "B::Verbs", "Verbs!"]),
            &Manifest::default(),
        );

        assert_eq!(
            dirs(&plan),
            vec![
                ("Verbs", vec!["A::Verbs", "B::Verbs"]),
                ("Nouns", vec!["Nouns"]),
                ("Verbs_", vec!["Verbs!"]),
            ]
        );
        assert_eq!(plan.pending_decks(), 4);
    }

    #[test]
    fn test_plan_ignores_repeated_names() {
        let plan = plan_with(&names(&["X", "Y", "X"]), &Manifest::default());
        assert_eq!(dirs(&plan), vec![("X", vec!["X"]), ("Y", vec!["Y"])]);

        let plan = plan_with(&names(&["X", "X"]), &Manifest::from_names(["X"]));
        assert!(plan.pending.is_empty());
        assert_eq!(plan.already_exported, vec!["X"]);
    }

    #[test]
    fn test_plan_preserves_selection_order() {
        let plan = plan_with(&names(&["C", "A", "B"]), &Manifest::default());
        assert_eq!(
            dirs(&plan),
            vec![("C", vec!["C"]), ("A", vec!["A"]), ("B", vec!["B"])]
        );
    }
}
