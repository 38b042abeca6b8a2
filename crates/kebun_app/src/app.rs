use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Duration, NaiveDate};
use kebun_core::{
    cache::DEFAULT_FRESHNESS_SECS, summary::GardenSummary, InMemoryStore, KebunService,
    RecurrenceOutcome, Snapshot, TodoBoard, TodoCompletion, TodoItem,
};
use tracing::{debug, info};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub(crate) data_path: PathBuf,
    pub(crate) todo_limit: Option<usize>,
    pub(crate) cache_fresh_secs: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(path) = std::env::var("KEBUN_DATA") {
            if !path.trim().is_empty() {
                config.data_path = PathBuf::from(path);
            }
        }
        if let Ok(limit) = std::env::var("KEBUN_TODO_LIMIT") {
            if let Ok(value) = limit.trim().parse::<usize>() {
                if value > 0 {
                    config.todo_limit = Some(value);
                }
            }
        }
        if let Ok(secs) = std::env::var("KEBUN_CACHE_FRESH_SECS") {
            if let Ok(value) = secs.trim().parse::<i64>() {
                config.cache_fresh_secs = value.clamp(0, i64::MAX / 1000);
            }
        }
        info!(path = %config.data_path.display(), "using snapshot");
        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("kebun.json"),
            todo_limit: None,
            cache_fresh_secs: DEFAULT_FRESHNESS_SECS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Board,
    Summary,
    Done { todo_id: String },
}

impl Command {
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut args = args.into_iter();
        match args.next().as_deref() {
            None | Some("board") => Ok(Self::Board),
            Some("summary") => Ok(Self::Summary),
            Some("done") => {
                let todo_id = args
                    .next()
                    .ok_or_else(|| anyhow!("usage: kebun done <todo-id>"))?;
                Ok(Self::Done { todo_id })
            }
            Some(other) => bail!("unknown command `{other}` (expected board, summary or done)"),
        }
    }
}

pub fn run(config: AppConfig, command: Command) -> Result<()> {
    let snapshot = Snapshot::load(&config.data_path)?;
    let store = Arc::new(InMemoryStore::new(snapshot));
    let mut builder = KebunService::builder().with_store(store.clone());
    if config.cache_fresh_secs > 0 {
        builder = builder.with_cache(Duration::seconds(config.cache_fresh_secs));
    }
    let service = builder.build()?;
    let today = service.today();

    match command {
        Command::Board => {
            let board = service.todo_board(config.todo_limit);
            debug!(total = board.total, shown = board.shown(), "rendering board");
            print!("{}", render_board(&board, today));
        }
        Command::Summary => {
            let summary = service.summary().context("failed to list gardens")?;
            print!("{}", render_summary(&summary));
        }
        Command::Done { todo_id } => {
            let item = service
                .find_todo(&todo_id)
                .ok_or_else(|| anyhow!("no pending todo with id `{todo_id}`"))?;
            let completion = service
                .complete_todo(&item)
                .with_context(|| format!("failed to complete `{}`", item.judul))?;
            println!("{}", describe_completion(&completion));
            store.snapshot().save(&config.data_path)?;
        }
    }
    Ok(())
}

pub fn render_board(board: &TodoBoard, today: NaiveDate) -> String {
    let mut out = String::new();
    if board.total == 0 {
        out.push_str("Tidak ada tugas tertunda.\n");
        return out;
    }
    for (bucket, items) in board.buckets.iter() {
        if items.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{} ({})", bucket.label(), items.len());
        for item in items {
            let _ = writeln!(out, "  {}", describe_item(item, today));
        }
    }
    if board.has_more() {
        let _ = writeln!(out, "… {} lainnya", board.total - board.shown());
    }
    out
}

fn describe_item(item: &TodoItem, today: NaiveDate) -> String {
    let mut line = format!(
        "[{}] {} · {} · {} ({})",
        item.kind.as_str(),
        item.judul,
        item.garden_name,
        item.kategori,
        format_relative_label(item.tanggal.date(), today)
    );
    if let Some(who) = item.penanggung_jawab.as_ref().or(item.assigned_to.as_ref()) {
        let _ = write!(line, " @{who}");
    }
    let _ = write!(line, " #{}", item.id);
    line
}

fn format_relative_label(date: NaiveDate, today: NaiveDate) -> String {
    let diff = date.signed_duration_since(today).num_days();
    match diff {
        -1 => "Kemarin".to_string(),
        0 => "Hari ini".to_string(),
        1 => "Besok".to_string(),
        d if d < 0 => format!("{} hari lalu", -d),
        d => format!("{} hari lagi", d),
    }
}

pub fn render_summary(summary: &GardenSummary) -> String {
    format!(
        "Total kebun: {}\nTotal luas: {:.1} Ha\nTotal pohon: {}\n",
        summary.total_gardens, summary.total_luas, summary.total_pohon
    )
}

pub fn describe_completion(completion: &TodoCompletion) -> String {
    match completion {
        TodoCompletion::Issue(issue) => format!("Masalah \"{}\" diselesaikan.", issue.judul),
        TodoCompletion::Task(task) => format!("Tugas \"{}\" selesai.", task.judul),
        TodoCompletion::Maintenance(report) => {
            let done = format!("Perawatan \"{}\" ditandai selesai.", report.completed.judul);
            match &report.recurrence {
                RecurrenceOutcome::NotRecurring => done,
                RecurrenceOutcome::AlreadyScheduled { .. } => {
                    format!("{done} Jadwal berikutnya sudah ada.")
                }
                RecurrenceOutcome::Scheduled { next_date, .. } => {
                    format!("{done} Jadwal berikutnya: {}", next_date.format("%-d %b %Y"))
                }
                RecurrenceOutcome::SchedulingFailed { reason, .. } => {
                    format!("{done} Gagal membuat jadwal berikutnya: {reason}")
                }
            }
        }
    }
}
