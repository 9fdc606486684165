//! ankidata - ANKI DECK EXPORTER
//!
//! 메인 엔트리포인트

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use ankidata::{
    cli::Args,
    discovery::find_collection_media,
    export::{ExportPlan, ExportReport, Exporter},
    source::{AnkiConnect, NoteSource},
    stats::format_bytes,
};

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose);

    let client = AnkiConnect::new(&args.anki_url, Duration::from_secs(args.timeout))
        .context("AnkiConnect 클라이언트 생성 실패")?;

    if !args.list && args.decks.is_empty() && !args.all {
        anyhow::bail!("내보낼 덱을 -d/--deck 으로 지정하거나 --all 을 사용하세요");
    }

    check_connection(&client)?;

    // 덱 목록 모드
    if args.list {
        return run_list_mode(&client);
    }

    let media_dir = resolve_media_dir(args.media.as_deref())?;

    // 헤더 출력
    print_header(&args, &media_dir);

    let selected = select_decks(&args, &client)?;
    if selected.is_empty() {
        println!("{}", "⚠️ 내보낼 덱이 없습니다.".yellow());
        return Ok(());
    }

    println!(
        "  {} 선택된 덱 수: {}",
        "📋".bright_white(),
        selected.len().to_string().bright_green()
    );

    let exporter = Exporter::new(args.export_config(media_dir), client);

    // 드라이런 모드
    if args.dry_run {
        print_dry_run(&exporter.plan(&selected));
        return Ok(());
    }

    run_export_mode(&args, exporter, &selected)
}

/// tracing 구독자 초기화 (RUST_LOG가 있으면 우선)
fn init_logging(verbose: bool) {
    let default_level = if verbose { "ankidata=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 로깅 없이도 동작해야 하므로 초기화 실패는 무시
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// AnkiConnect 연결 확인
fn check_connection(client: &AnkiConnect) -> Result<()> {
    let version = client.version().with_context(|| {
        format!(
            "AnkiConnect({})에 연결할 수 없습니다. Anki가 실행 중인지 확인하세요",
            client.url()
        )
    })?;
    debug!(version, url = client.url(), "AnkiConnect 연결 확인");
    Ok(())
}

/// 미디어 폴더 결정 (지정값 또는 자동 탐색)
fn resolve_media_dir(media: Option<&Path>) -> Result<PathBuf> {
    let media_dir = match media {
        Some(path) => path.to_path_buf(),
        None => find_collection_media().context(
            "Anki collection.media 폴더를 찾을 수 없습니다. -m/--media 로 지정하세요",
        )?,
    };

    if !media_dir.is_dir() {
        anyhow::bail!("미디어 폴더가 존재하지 않습니다: {:?}", media_dir);
    }

    Ok(media_dir)
}

/// 내보낼 덱 목록
fn select_decks(args: &Args, source: &dyn NoteSource) -> Result<Vec<String>> {
    if args.all {
        return source
            .list_decks()
            .context("덱 목록을 가져올 수 없습니다");
    }
    Ok(args.decks.clone())
}

/// 덱 목록 출력
fn run_list_mode(client: &AnkiConnect) -> Result<()> {
    let decks = client
        .list_decks()
        .context("덱 목록을 가져올 수 없습니다")?;

    println!(
        "\n{} {} 개의 덱 ({}):",
        "📚".bright_cyan(),
        decks.len().to_string().bright_green(),
        client.url()
    );
    for deck in &decks {
        println!("  • {}", deck);
    }
    println!();

    Ok(())
}

/// 헤더 출력
fn print_header(args: &Args, media_dir: &Path) {
    println!("\n{}", "═".repeat(50).bright_blue());
    println!("{}", " 🚀 ANKI DECK EXPORTER".bright_white().bold());
    println!("{}", "═".repeat(50).bright_blue());
    println!("  {} 미디어 폴더: {:?}", "🔊".bright_cyan(), media_dir);
    println!("  {} 출력 폴더: {:?}", "📂".bright_green(), args.output);
    println!(
        "  {} 필드: {} / {} / {}",
        "🎯".bright_cyan(),
        args.sound_field,
        args.transcription_field,
        args.meaning_field
    );
    println!("  {} 워커 수: {}", "⚙️".bright_yellow(), args.workers);

    if args.recheck {
        println!("  {} {}", "🔁".bright_magenta(), "사라진 덱 재확인".magenta());
    }

    if args.dry_run {
        println!(
            "  {} {}",
            "⚠️".bright_yellow(),
            "드라이런 모드 (실제 내보내기 없음)".yellow()
        );
    }

    println!("{}", "═".repeat(50).bright_blue());
}

/// 드라이런 출력
fn print_dry_run(plan: &ExportPlan) {
    println!("\n{}", "📋 내보낼 덱 목록:".bright_cyan());
    let decks = plan.pending.iter().flat_map(|g| g.decks.iter());
    for (i, deck) in decks.enumerate() {
        println!("  {}. {}", i + 1, deck);
    }

    let shared: Vec<_> = plan.pending.iter().filter(|g| g.decks.len() > 1).collect();
    if !shared.is_empty() {
        println!("\n{}", "🔀 같은 폴더를 쓰는 덱 (순서대로 시도, 첫 성공만 저장):".bright_yellow());
        for group in shared {
            println!("  {} {}: {}", "•".yellow(), group.dir_name, group.decks.join(", "));
        }
    }

    if !plan.already_exported.is_empty() {
        println!("\n{}", "⏭️ 이미 내보낸 덱 (건너뜀):".bright_white());
        for deck in &plan.already_exported {
            println!("  • {}", deck.dimmed());
        }
    }

    println!(
        "\n{} 총 {} 개의 덱이 내보내질 예정입니다.",
        "ℹ️".bright_blue(),
        plan.pending_decks().to_string().bright_green()
    );
}

/// 내보내기 실행
fn run_export_mode(args: &Args, exporter: Exporter<AnkiConnect>, selected: &[String]) -> Result<()> {
    println!("\n{}", "⚡ 덱 내보내는 중...".bright_cyan());

    let exporter = exporter.with_progress(create_progress_bar(selected.len()));
    let report = exporter
        .run(selected)
        .context("decks.json 저장 실패")?;

    print_results(&report, args.verbose);

    // 로그 파일 작성
    if let Some(ref log_path) = args.log {
        write_error_log(log_path, &report.invalid_decks)?;
    }

    // 통계 출력
    report.stats.print_summary();

    println!(
        "\n{} 저장 완료: {:?} ({} 개의 덱)\n",
        "✅".bright_green(),
        args.output,
        report.valid_decks.len()
    );

    Ok(())
}

/// 진행률 바 생성
fn create_progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
            .unwrap()
            .progress_chars("█▓▒░"),
    );
    pb
}

/// 덱별 결과 출력
fn print_results(report: &ExportReport, verbose: bool) {
    if !report.exported.is_empty() {
        println!("\n{}", "✅ 내보낸 덱:".bright_green());
        for outcome in report.outcomes.iter().filter(|o| o.is_exported()) {
            println!("  {} {} → {}", "✓".green(), outcome.deck, outcome.dir_name);

            if let (true, Ok(export)) = (verbose, &outcome.result) {
                println!(
                    "    {}",
                    format!(
                        "노트 {} 개, 건너뜀 {} 개, 오디오 {}",
                        export.notes_written,
                        export.skipped.len(),
                        format_bytes(export.media_bytes)
                    )
                    .dimmed()
                );
                for skipped in &export.skipped {
                    println!(
                        "    {}",
                        format!("note {}: {}", skipped.note_id, skipped.reasons.join(", ")).dimmed()
                    );
                }
            }
        }
    }

    print_errors(&report.invalid_decks);
}

/// 실패한 덱 목록 출력
fn print_errors(errors: &[(String, String)]) {
    if errors.is_empty() {
        return;
    }

    println!("\n{}", "❌ 내보내지 못한 덱:".bright_red());
    for (deck, reason) in errors {
        println!("  {} {}", "•".red(), deck);
        println!("    {}", reason.dimmed());
    }
}

/// 에러 로그 파일 작성
fn write_error_log(log_path: &Path, errors: &[(String, String)]) -> Result<()> {
    let mut log_file = File::create(log_path)
        .with_context(|| format!("로그 파일을 만들 수 없습니다: {:?}", log_path))?;

    writeln!(log_file, "ankidata 에러 로그")?;
    writeln!(log_file, "생성 시간: {}", chrono_now())?;
    writeln!(log_file, "총 에러 수: {}", errors.len())?;
    writeln!(log_file, "{}", "=".repeat(50))?;

    for (deck, reason) in errors {
        writeln!(log_file, "\n덱: {}", deck)?;
        writeln!(log_file, "사유: {}", reason)?;
    }

    println!("\n{} 에러 로그 저장: {:?}", "📝".bright_cyan(), log_path);

    Ok(())
}

/// 현재 시간 문자열 반환
fn chrono_now() -> String {
    use std::time::SystemTime;
    let now = SystemTime::now();
    let duration = now
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();
    format!("Unix timestamp: {}", duration.as_secs())
}
