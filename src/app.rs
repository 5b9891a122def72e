use std::io::Stdout;
use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::time::Instant;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::browser::{BrowseError, Browser, PageOutcome, DEFAULT_PAGE_SIZE, ENTER_KEY};
use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::client::{ClientOptions, HttpSearchApi};
use crate::config::{self, ConfigFile};
use crate::filters::{ClickTarget, FilterPanel, SectionDefinition};
use crate::output::{self, OutputFormat, TerminalSurface};
use crate::render::{CardBuffer, RenderSurface, StudentCard};

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

fn init_tracing(verbose: u8, log_json: bool) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let result = if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    if let Err(e) = result {
        tracing::debug!(error = %e, "tracing subscriber already installed");
    }
}

#[derive(Clone, Debug)]
struct RunConfig {
    client: ClientOptions,
    query: String,
    filters: Vec<(String, String)>,
    sections: Vec<SectionDefinition>,
    page_size: usize,
    max_pages: u32,
    viewport_rows: usize,
    output: Option<String>,
    output_format: Option<OutputFormat>,
    no_color: bool,
    interactive: bool,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = args.no_color || cfg.no_color.unwrap_or(false);

    let base_url = args
        .url
        .or(cfg.url)
        .unwrap_or_else(|| ClientOptions::default().base_url);
    crate::client::students_endpoint(&base_url).map_err(|e| e.to_string())?;

    let header = args.header.or(cfg.header);
    if let Some(raw) = header.as_deref() {
        crate::client::parse_header(raw).map_err(|e| e.to_string())?;
    }

    let timeout_seconds = args.timeout.or(cfg.timeout).unwrap_or(10);
    if timeout_seconds == 0 {
        return Err("invalid timeout, expected positive integer".to_string());
    }

    let client = ClientOptions {
        base_url,
        timeout_seconds,
        proxy: args.proxy.or(cfg.proxy).filter(|p| !p.trim().is_empty()),
        header,
    };

    let page_size = args
        .page_size
        .or(cfg.page_size)
        .unwrap_or(DEFAULT_PAGE_SIZE);
    if page_size == 0 {
        return Err("invalid page-size, expected positive integer".to_string());
    }
    let max_pages = args.pages.or(cfg.max_pages).unwrap_or(1);
    let viewport_rows = cfg.viewport_rows.unwrap_or(40);

    let sections = cfg
        .sections
        .filter(|s| !s.is_empty())
        .unwrap_or_else(crate::filters::default_sections);

    let mut filters = Vec::new();
    for raw in args.filter.iter() {
        let pair = validation::parse_filter_arg(raw)
            .map_err(|e| format!("invalid --filter '{raw}': {e}"))?;
        filters.push(pair);
    }

    let output = args
        .output
        .or(cfg.output)
        .map(|p| config::expand_tilde_string(&p));
    let output_format = match args.output_format.or(cfg.output_format) {
        Some(raw) => Some(
            OutputFormat::parse(&raw).ok_or_else(|| format!("invalid output format '{raw}'"))?,
        ),
        None => None,
    };

    Ok(RunConfig {
        client,
        query: args.query.unwrap_or_default(),
        filters,
        sections,
        page_size,
        max_pages,
        viewport_rows,
        output,
        output_format,
        no_color,
        interactive: args.interactive,
    })
}

fn build_panel(run: &RunConfig) -> Result<FilterPanel, String> {
    let mut panel = FilterPanel::from_definitions(&run.sections);
    for (category, option) in run.filters.iter() {
        panel
            .set(category, option, true)
            .map_err(|e| format!("invalid --filter '{category}={option}': {e}"))?;
    }
    Ok(panel)
}

// cards go to the terminal as they arrive and are kept for the output file
struct BatchSurface {
    terminal: TerminalSurface<Stdout>,
    buffer: CardBuffer,
}

impl RenderSurface for BatchSurface {
    fn clear(&mut self) {
        self.terminal.clear();
        self.buffer.clear();
    }

    fn append(&mut self, card: StudentCard) {
        self.terminal.append(card.clone());
        self.buffer.append(card);
    }
}

fn page_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb
}

async fn write_output(run: &RunConfig, cards: &[StudentCard]) -> Result<(), String> {
    let Some(outfile_path) = run.output.as_ref() else {
        return Ok(());
    };
    let output_format = run
        .output_format
        .or_else(|| output::infer_format_from_path(outfile_path))
        .unwrap_or(OutputFormat::Text);

    if output_format == OutputFormat::Text {
        colored::control::set_override(false);
    }
    let rendered = output::render(output_format, cards, &run.client.base_url);
    if output_format == OutputFormat::Text && !run.no_color {
        colored::control::unset_override();
    }

    let mut outfile = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(outfile_path)
        .await
        .map_err(|e| format!("failed to open output file: {e}"))?;
    outfile
        .write_all(&rendered)
        .await
        .map_err(|_| "failed to write output file".to_string())?;
    Ok(())
}

async fn run_batch(run: &RunConfig, api: HttpSearchApi) -> Result<(), String> {
    let panel = build_panel(run)?;
    let surface = BatchSurface {
        terminal: TerminalSurface::stdout(run.viewport_rows),
        buffer: CardBuffer::new(),
    };
    let mut browser = Browser::new(api, surface).with_page_size(run.page_size);
    let pb = page_spinner();

    pb.set_message(format!("loading page 1 for '{}'", run.query));
    let mut outcome = browser.submit(&run.query, &panel).await;
    loop {
        match outcome {
            Ok(Some(PageOutcome::Rendered { exhausted, page, .. })) => {
                if exhausted || (run.max_pages != 0 && page >= run.max_pages) {
                    break;
                }
            }
            Ok(_) => break,
            Err(BrowseError::Fetch { page: 1, source }) => {
                pb.finish_and_clear();
                return Err(format!("search failed: {source}"));
            }
            Err(e) => {
                warn!(error = %e, "stopping after failed page");
                break;
            }
        }
        pb.set_message(format!(
            "loading page {}",
            browser.session().pages_loaded() + 1
        ));
        outcome = browser.load_next_page().await;
    }
    pb.finish_and_clear();

    let session = browser.session();
    let pages = session.pages_loaded();
    let exhausted = session.is_exhausted();
    let surface = browser.into_surface();
    format_kv_line(
        "Results",
        &format!(
            "{} students across {} page(s){}",
            surface.buffer.len(),
            pages,
            if exhausted { "" } else { ", more available" }
        ),
    );
    write_output(run, surface.buffer.cards()).await
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Command {
    Search(String),
    Submit,
    More,
    Check { category: String, option: String },
    Uncheck { category: String, option: String },
    Collapse(String),
    Filters,
    Reset,
    Help,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::More;
    }
    let Some(rest) = line.strip_prefix(':') else {
        return Command::Search(line.to_string());
    };
    // a doubled colon escapes a search text that starts with one
    if rest.starts_with(':') {
        return Command::Search(rest.to_string());
    }
    let mut parts = rest.splitn(3, char::is_whitespace);
    let name = parts.next().unwrap_or_default().to_lowercase();
    let first = parts.next().unwrap_or_default().trim().to_string();
    let second = parts.next().unwrap_or_default().trim().to_string();
    match name.as_str() {
        "more" | "m" => Command::More,
        "search" if !first.is_empty() => {
            Command::Search(rest[name.len()..].trim().to_string())
        }
        "submit" | "s" => Command::Submit,
        "check" | "c" if !first.is_empty() && !second.is_empty() => Command::Check {
            category: first,
            option: second,
        },
        "uncheck" | "u" if !first.is_empty() && !second.is_empty() => Command::Uncheck {
            category: first,
            option: second,
        },
        "collapse" if !first.is_empty() => Command::Collapse(first),
        "filters" | "f" => Command::Filters,
        "reset" => Command::Reset,
        "help" | "h" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}

const INTERACTIVE_HELP: &str = "\
  <text>                       search for <text> (Enter submits)
  ::<text> | :search <text>    search for text that starts with ':'
  <empty line> | :more         page down, loading more near the end
  :submit                      search again with the current query and filters
  :check <category> <option>   check a filter option (option may be 'all')
  :uncheck <category> <option> uncheck a filter option
  :collapse <category>         fold or unfold a filter section
  :filters                     show the filter sidebar
  :reset                       restore every section to 'all'
  :quit";

fn report_outcome(outcome: Result<Option<PageOutcome>, BrowseError>) {
    match outcome {
        Ok(Some(PageOutcome::Rendered {
            page,
            count: 0,
            ..
        })) if page == 1 => println!("{}", "no students match".dimmed()),
        Ok(Some(PageOutcome::Rendered {
            exhausted: true, ..
        })) => println!("{}", "end of results".dimmed()),
        Ok(_) => {}
        Err(e) => warn!(error = %e, "page load stalled"),
    }
}

async fn run_interactive(run: &RunConfig, api: HttpSearchApi) -> Result<(), String> {
    let mut panel = build_panel(run)?;
    let mut query = run.query.clone();
    let mut browser = Browser::new(api, TerminalSurface::stdout(run.viewport_rows))
        .with_page_size(run.page_size);

    // the page shows the unfiltered directory before anything is submitted
    if query.is_empty() && run.filters.is_empty() {
        report_outcome(browser.load_next_page().await);
    } else {
        report_outcome(browser.submit(&query, &panel).await);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => return Err(format!("failed to read input: {e}")),
        };
        match parse_command(&line) {
            Command::Search(text) => {
                query = text;
                report_outcome(browser.on_query_key(ENTER_KEY, &query, &panel).await);
            }
            Command::Submit => report_outcome(browser.submit(&query, &panel).await),
            Command::More => {
                let position = browser.surface_mut().scroll_down();
                let metrics = browser.surface().scroll_metrics();
                let outcome = browser.on_scroll(metrics).await;
                match outcome {
                    Ok(None) if !browser.session().is_exhausted() => println!(
                        "{}",
                        format!(
                            "line {} of {}",
                            position + 1,
                            browser.surface().lines_written()
                        )
                        .dimmed()
                    ),
                    outcome => report_outcome(outcome),
                }
            }
            Command::Check { category, option } => match panel.set(&category, &option, true) {
                Ok(()) => print_panel(&panel),
                Err(e) => println!("{}", e.to_string().red()),
            },
            Command::Uncheck { category, option } => {
                match panel.set(&category, &option, false) {
                    Ok(()) => print_panel(&panel),
                    Err(e) => println!("{}", e.to_string().red()),
                }
            }
            Command::Collapse(category) => match panel.click(&category, ClickTarget::Header) {
                Ok(_) => print_panel(&panel),
                Err(e) => println!("{}", e.to_string().red()),
            },
            Command::Filters => print_panel(&panel),
            Command::Reset => {
                panel.reset();
                print_panel(&panel);
            }
            Command::Help => println!("{INTERACTIVE_HELP}"),
            Command::Quit => break,
            Command::Unknown(line) => {
                println!("{} {}", "unknown command:".red(), line);
            }
        }
    }
    Ok(())
}

fn print_panel(panel: &FilterPanel) {
    for line in output::format_panel(panel) {
        println!("{line}");
    }
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }
    let now = Instant::now();

    let api = HttpSearchApi::new(&run.client).map_err(|e| e.to_string())?;
    format_kv_line("Server", api.endpoint().as_str());

    if run.interactive {
        run_interactive(&run, api).await?;
    } else {
        run_batch(&run, api).await?;
    }

    println!();
    println!(
        ":: Completed :: took {}ms ::",
        now.elapsed().as_millis()
    );
    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = e.print();
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    init_tracing(args.verbose, args.log_json);

    if args.init_config {
        let path = match args.config.as_deref() {
            Some(p) => config::expand_tilde(p),
            None => config::default_config_path()
                .ok_or_else(|| "could not determine home directory".to_string())?,
        };
        config::ensure_default_config_file(&path)?;
        format_kv_line("Config", &path.display().to_string());
        return Ok(());
    }

    let cfg = match args.config.as_deref() {
        Some(p) => config::load_config(&config::expand_tilde(p), false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))?;
    Ok(())
}

#[cfg(test)]
mod cli_tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn cli_flags_override_config_file() {
        let args = CliArgs::parse_from(["studentdir", "-u", "http://cli.example/", "-p", "0"]);
        let cfg = ConfigFile {
            url: Some("http://file.example/".to_string()),
            page_size: Some(50),
            max_pages: Some(3),
            ..ConfigFile::default()
        };
        let run = build_run_config(args, cfg).unwrap();
        assert_eq!(run.client.base_url, "http://cli.example/");
        assert_eq!(run.page_size, 50);
        assert_eq!(run.max_pages, 0);
        assert_eq!(run.sections.len(), 3);
    }

    #[test]
    fn filters_are_applied_to_panel() {
        let args = CliArgs::parse_from([
            "studentdir",
            "-f",
            "college=Morse",
            "-f",
            "leave=Yes",
            "-f",
            "leave=all",
        ]);
        let run = build_run_config(args, ConfigFile::default()).unwrap();
        let panel = build_panel(&run).unwrap();
        assert!(!panel.section("college").unwrap().all_checked());
        assert!(panel.section("leave").unwrap().all_checked());
    }

    #[test]
    fn unknown_filter_section_is_an_error() {
        let args = CliArgs::parse_from(["studentdir", "-f", "house=Gryffindor"]);
        let run = build_run_config(args, ConfigFile::default()).unwrap();
        assert!(build_panel(&run).is_err());
    }

    #[test]
    fn zero_timeout_from_config_is_rejected() {
        let args = CliArgs::parse_from(["studentdir"]);
        let cfg = ConfigFile {
            timeout: Some(0),
            ..ConfigFile::default()
        };
        assert!(build_run_config(args, cfg).is_err());

        let cfg = ConfigFile {
            timeout: Some(0),
            ..ConfigFile::default()
        };
        let args = CliArgs::parse_from(["studentdir", "-T", "5"]);
        assert_eq!(build_run_config(args, cfg).unwrap().client.timeout_seconds, 5);
    }

    #[test]
    fn colon_prefixed_searches_can_be_escaped() {
        assert_eq!(parse_command("::ada"), Command::Search(":ada".to_string()));
        assert_eq!(
            parse_command(":search :ada lovelace"),
            Command::Search(":ada lovelace".to_string())
        );
        assert!(matches!(parse_command(":search"), Command::Unknown(_)));
    }

    #[test]
    fn rejects_bad_url() {
        let args = CliArgs::parse_from(["studentdir", "-u", "nope"]);
        assert!(build_run_config(args, ConfigFile::default()).is_err());
    }

    #[test]
    fn parse_interactive_commands() {
        assert_eq!(parse_command(""), Command::More);
        assert_eq!(parse_command("  ada  "), Command::Search("ada".to_string()));
        assert_eq!(
            parse_command(":check college Pauli Murray"),
            Command::Check {
                category: "college".to_string(),
                option: "Pauli Murray".to_string(),
            }
        );
        assert_eq!(
            parse_command(":collapse year"),
            Command::Collapse("year".to_string())
        );
        assert_eq!(parse_command(":q"), Command::Quit);
        assert!(matches!(parse_command(":check college"), Command::Unknown(_)));
    }
}
