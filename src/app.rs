use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::catalog::{self, Artwork, PAGE_SIZE};
use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::output;
use crate::quota::{self, QuotaError, QuotaOutcome};
use crate::runner::{Options, PageView, Runner, RunnerError};
use crate::selection::{SelectionStore, StoreError};
use crate::utils;

fn print_warning(message: &str) {
    eprintln!(
        "{}{}{} {}",
        "[".bold().white(),
        "WRN".bold().yellow(),
        "]".bold().white(),
        message
    );
}

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

#[derive(Clone, Debug)]
struct RunConfig {
    page: Option<u32>,
    check: Vec<i64>,
    uncheck: Vec<i64>,
    pick: Option<u64>,
    list: bool,
    output: Option<String>,
    output_format: Option<String>,
    api_url: String,
    state_file: PathBuf,
    timeout: u64,
    rate: u32,
    page_ceiling: u32,
    no_color: bool,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = args.no_color || cfg.no_color.unwrap_or(false);

    let api_url = args
        .api_url
        .or(cfg.api_url)
        .unwrap_or_else(|| catalog::DEFAULT_API_URL.to_string());

    let state_file = args
        .state_file
        .or(cfg.state_file)
        .map(|p| config::expand_tilde(&p))
        .or_else(config::default_state_path)
        .ok_or_else(|| "could not determine a state file path, set --state-file".to_string())?;

    let timeout = args.timeout.or(cfg.timeout).unwrap_or(10);
    let rate = args
        .rate
        .or(cfg.fetch_rate)
        .unwrap_or(quota::DEFAULT_FETCH_RATE);
    let page_ceiling = args
        .page_ceiling
        .or(cfg.page_ceiling)
        .unwrap_or(quota::DEFAULT_PAGE_CEILING);

    let check = match args.check.as_deref() {
        Some(raw) => {
            utils::parse_id_list_csv(raw).map_err(|e| format!("invalid --check '{raw}': {e}"))?
        }
        None => Vec::new(),
    };
    let uncheck = match args.uncheck.as_deref() {
        Some(raw) => {
            utils::parse_id_list_csv(raw).map_err(|e| format!("invalid --uncheck '{raw}': {e}"))?
        }
        None => Vec::new(),
    };

    let output = args.output.or(cfg.output);
    let output_format = args.output_format.or(cfg.output_format);

    Ok(RunConfig {
        page: args.page,
        check,
        uncheck,
        pick: args.pick,
        list: args.list,
        output,
        output_format,
        api_url,
        state_file,
        timeout,
        rate,
        page_ceiling,
        no_color,
    })
}

async fn run_pick(runner: &mut Runner, count: u64) -> Result<(), String> {
    let pb = ProgressBar::new(count);
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.enable_steady_tick(Duration::from_millis(200));
    pb.set_style(
        ProgressStyle::with_template(
            ":: Picking: [{pos}/{len}] :: Duration: [{elapsed_precise}] :: {msg}",
        )
        .map_err(|e| format!("failed to build progress bar style: {e}"))?
        .progress_chars(r#"#>-"#),
    );

    let result = runner.pick(count, pb.clone()).await;
    pb.finish_and_clear();

    match result {
        Ok(outcome) => {
            report_outcome(&outcome);
            Ok(())
        }
        Err(RunnerError::Quota(QuotaError::Aborted {
            collected,
            requested,
            source,
        })) => {
            print_warning(&format!(
                "collected {collected} of {requested} before the failure; progress is saved"
            ));
            Err(format!("quota run aborted: {source}"))
        }
        Err(e) => Err(e.to_string()),
    }
}

fn report_outcome(outcome: &QuotaOutcome) {
    if outcome.exhausted && outcome.collected < outcome.requested {
        println!(
            "{} only {} of {} requested records were available",
            "::".bold().yellow(),
            outcome.collected.to_string().bold().cyan(),
            outcome.requested
        );
    } else if outcome.collected < outcome.requested {
        println!(
            "{} stopped at the page ceiling after collecting {} of {}",
            "::".bold().yellow(),
            outcome.collected.to_string().bold().cyan(),
            outcome.requested
        );
    } else {
        println!(
            "{} {} records selected",
            "::".bold().green(),
            outcome.collected.to_string().bold().cyan()
        );
    }
}

fn print_selected_count(count: usize) {
    println!(
        "Selected: {} {}",
        count.to_string().bold().cyan(),
        if count == 1 { "row" } else { "rows" }
    );
}

fn render_table(records: &[Artwork], checked: &HashSet<i64>) {
    let header = format!(
        "{:<4} {:<10} {:<30} {:<18} {:<26} {:<22} {:>6} {:>6}",
        "", "ID", "TITLE", "PLACE OF ORIGIN", "ARTIST", "INSCRIPTIONS", "START", "END"
    );
    println!("{}", header.bold().white());
    for r in records {
        let mark = if checked.contains(&r.id) { "[x]" } else { "[ ]" };
        println!(
            "{:<4} {:<10} {:<30} {:<18} {:<26} {:<22} {:>6} {:>6}",
            mark,
            r.id,
            utils::truncate_cell(utils::display_or_na(r.title.as_deref()), 29),
            utils::truncate_cell(utils::display_or_na(r.place_of_origin.as_deref()), 17),
            utils::truncate_cell(utils::display_or_na(r.artist_display.as_deref()), 25),
            utils::truncate_cell(utils::display_or_na(r.inscriptions.as_deref()), 21),
            utils::display_year(r.date_start),
            utils::display_year(r.date_end),
        );
    }
}

fn render_page(view: &PageView) {
    print_selected_count(view.selected_count);
    if view.page.records.is_empty() {
        println!("no data found");
        return;
    }
    let checked_ids: HashSet<i64> = view.checked.iter().map(|r| r.id).collect();
    render_table(&view.page.records, &checked_ids);

    let page = &view.page;
    let first = (u64::from(page.number) - 1) * PAGE_SIZE as u64 + 1;
    let last = first + page.records.len() as u64 - 1;
    let pages = (page.total + PAGE_SIZE as u64 - 1) / PAGE_SIZE as u64;
    println!(
        "Showing {} to {} of {} entries (page {} of {})",
        first, last, page.total, page.number, pages
    );
}

fn render_selection(records: &[Artwork]) {
    print_selected_count(records.len());
    if records.is_empty() {
        return;
    }
    let all: HashSet<i64> = records.iter().map(|r| r.id).collect();
    render_table(records, &all);
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }

    let options = Options {
        api_url: run.api_url.clone(),
        state_file: Some(run.state_file.clone()),
        timeout_seconds: run.timeout,
        fetch_rate: run.rate,
        page_ceiling: run.page_ceiling,
    };

    let mut runner = match Runner::new(options.clone()) {
        Ok(runner) => runner,
        Err(RunnerError::Store(e @ StoreError::Corrupt { .. })) => {
            print_warning(&format!("{e} (continuing with an empty selection)"));
            Runner::with_store(options, SelectionStore::empty_at(&run.state_file))
                .map_err(|e| e.to_string())?
        }
        Err(e) => return Err(e.to_string()),
    };

    format_kv_line("Catalog", &run.api_url);
    format_kv_line("State", &run.state_file.display().to_string());
    println!();

    if let Some(count) = run.pick {
        run_pick(&mut runner, count).await?;
    }

    let wants_page_view = run.page.is_some()
        || !run.check.is_empty()
        || !run.uncheck.is_empty()
        || (run.pick.is_none() && !run.list && run.output.is_none());
    if wants_page_view {
        let page = run.page.unwrap_or(1);
        let result = if run.check.is_empty() && run.uncheck.is_empty() {
            runner.view(page).await
        } else {
            runner.toggle(page, &run.check, &run.uncheck).await
        };
        match result {
            Ok(view) => render_page(&view),
            Err(RunnerError::Catalog(e)) => {
                // the selection and any previously persisted state stay as
                // they were; only this render is affected
                print_warning(&e.to_string());
                println!("no data found");
            }
            Err(e) => return Err(e.to_string()),
        }
    }

    if run.list {
        render_selection(runner.selection());
    }

    if let Some(outfile_path) = run.output.as_ref() {
        let format = run
            .output_format
            .as_deref()
            .and_then(output::OutputFormat::parse)
            .or_else(|| output::infer_format_from_path(outfile_path))
            .unwrap_or(output::OutputFormat::Json);
        let rendered = output::render(format, runner.selection());
        tokio::fs::write(outfile_path, rendered)
            .await
            .map_err(|e| format!("failed to write output file: {e}"))?;
        println!(
            ":: Saved :: {} records -> {}",
            runner.selection().len(),
            outfile_path
        );
    }

    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{}", e.render());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    if args.init_config {
        let path = args
            .config
            .clone()
            .map(|p| config::expand_tilde(&p))
            .or_else(config::default_config_path)
            .ok_or_else(|| "could not determine a config path".to_string())?;
        config::ensure_default_config_file(&path)?;
        println!("config written to {}", path.display());
        return Ok(());
    }

    let user_config_path = args.config.clone().map(|p| config::expand_tilde(&p));
    let cfg = match user_config_path.as_ref() {
        Some(path) => config::load_config(path, false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}
