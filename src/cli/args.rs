use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "artcart",
    version,
    about = "paginated catalog selection tool",
    long_about = "Artcart browses a paginated remote catalog one page at a time and keeps a durable cross-page selection of records in a local state file.\n\nExamples:\n  artcart -p 3\n  artcart -p 3 --check 27992,24645\n  artcart -n 50\n  artcart --list -o selection.csv\n\nTip: Use --config to persist settings and keep invocations short."
)]
pub struct CliArgs {
    #[arg(
        short = 'p',
        long = "pg",
        visible_alias = "page",
        value_name = "N",
        help_heading = "Browse",
        help = "Page to display (1-based, defaults to 1)."
    )]
    pub page: Option<u32>,

    #[arg(
        short = 'k',
        long = "check",
        value_name = "IDS",
        help_heading = "Selection",
        help = "Record ids to check on the displayed page (comma-separated)."
    )]
    pub check: Option<String>,

    #[arg(
        short = 'u',
        long = "uncheck",
        value_name = "IDS",
        help_heading = "Selection",
        help = "Record ids to uncheck on the displayed page (comma-separated)."
    )]
    pub uncheck: Option<String>,

    #[arg(
        short = 'n',
        long = "pick",
        value_name = "COUNT",
        help_heading = "Selection",
        help = "Select COUNT not-yet-selected records by walking pages from page 1."
    )]
    pub pick: Option<u64>,

    #[arg(
        short = 'l',
        long = "ls",
        visible_alias = "list",
        help_heading = "Selection",
        help = "Print the current selection without touching the network."
    )]
    pub list: bool,

    #[arg(
        short = 'a',
        long = "api",
        visible_alias = "api-url",
        value_name = "URL",
        help_heading = "Catalog",
        help = "Base URL of the paginated catalog endpoint."
    )]
    pub api_url: Option<String>,

    #[arg(
        short = 's',
        long = "sf",
        visible_alias = "state-file",
        value_name = "FILE",
        help_heading = "State",
        help = "Selection state file (defaults to ~/.artcart/selection.json)."
    )]
    pub state_file: Option<String>,

    #[arg(
        short = 'T',
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Per-request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'r',
        long = "rt",
        visible_alias = "rate",
        value_name = "PPS",
        help_heading = "Performance",
        help = "Page fetch rate during quota fulfillment (pages per second)."
    )]
    pub rate: Option<u32>,

    #[arg(
        long = "pc",
        visible_alias = "page-ceiling",
        value_name = "N",
        help_heading = "Performance",
        help = "Hard ceiling on pages walked by one quota run."
    )]
    pub page_ceiling: Option<u32>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.artcart/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "init-config",
        help_heading = "Input",
        help = "Write a commented default config file if missing, then exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the selection to a file."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'A',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format (text, json, csv); inferred from the file extension when omitted."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'x',
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,
}
