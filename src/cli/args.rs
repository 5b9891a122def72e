use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "studentdir",
    version,
    about = "filterable student directory browser",
    long_about = "studentdir queries a student directory server and renders the matching records as cards.\n\nExamples:\n  studentdir -u http://localhost:5000 -q smith\n  studentdir -q ada -f college=Morse -f leave=Yes -p 0 -o students.html\n  studentdir --interactive\n\nTip: Use --config to keep the server URL and filter sections out of the command line."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        long = "lj",
        visible_alias = "log-json",
        help_heading = "Output",
        help = "Emit logs as JSON lines on stderr."
    )]
    pub log_json: bool,

    #[arg(
        short = 'n',
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the loaded cards to a file."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'A',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format (text, json, html)."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'u',
        long = "u",
        visible_alias = "url",
        value_name = "URL",
        help_heading = "Server",
        help = "Directory server base URL."
    )]
    pub url: Option<String>,

    #[arg(
        short = 'T',
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        help_heading = "Server",
        help = "Per-request timeout in seconds."
    )]
    pub timeout: Option<usize>,

    #[arg(
        short = 'x',
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        help_heading = "Server",
        help = "HTTP proxy URL (e.g. http://127.0.0.1:8080)."
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 'H',
        long = "hdr",
        visible_alias = "header",
        value_name = "HEADER",
        help_heading = "Server",
        help = "Add a header to every request (format: 'Key: Value')."
    )]
    pub header: Option<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.studentdir/config.yml when present)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "ic",
        visible_alias = "init-config",
        help_heading = "Input",
        help = "Write a default config file if none exists, then exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 'q',
        long = "q",
        visible_alias = "query",
        value_name = "TEXT",
        help_heading = "Search",
        help = "Search text."
    )]
    pub query: Option<String>,

    #[arg(
        short = 'f',
        long = "flt",
        visible_alias = "filter",
        value_name = "CATEGORY=OPTION",
        action = ArgAction::Append,
        help_heading = "Search",
        help = "Check a filter option (repeatable). CATEGORY=all selects the whole category again."
    )]
    pub filter: Vec<String>,

    #[arg(
        short = 'p',
        long = "pg",
        visible_alias = "pages",
        value_name = "N",
        help_heading = "Search",
        help = "Pages to load in batch mode (0 = until the directory runs out)."
    )]
    pub pages: Option<u32>,

    #[arg(
        long = "ps",
        visible_alias = "page-size",
        value_name = "N",
        help_heading = "Search",
        help = "Records per page; a shorter page ends the search."
    )]
    pub page_size: Option<usize>,

    #[arg(
        short = 'i',
        long = "it",
        visible_alias = "interactive",
        help_heading = "Search",
        help = "Browse interactively: type a query and press Enter, :help for commands."
    )]
    pub interactive: bool,
}
