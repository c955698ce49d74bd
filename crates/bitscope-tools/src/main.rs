use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use log::{debug, info};

use bitscope::formats::{RawParser, VgmParser};
use bitscope::{
    BitRange, ColorPriority, DataNode, Explorer, ExplorerConfig, Focus, IgnoreReason, LookupMiss,
    Palette, ParseError, SyntaxParser,
};

mod input;
mod render;

use input::read_input;

/// Syntax tree and bit overlay inspector for binary files
#[derive(Parser)]
#[command(
    name = "bitscope",
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    opts: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalOpts {
    /// Layout used to build the syntax tree
    #[arg(long, value_enum, default_value_t = Format::Raw, global = true)]
    format: Format,

    /// Bytes per row for the raw layout and the hex grid
    #[arg(long, default_value_t = 16, global = true)]
    bytes_per_row: usize,

    /// Selection colors, e.g. "#7B1FA2,#BA68C8"
    #[arg(long, global = true)]
    palette: Option<Palette>,

    /// Let the most recently selected range win on overlapping cells
    #[arg(long, global = true)]
    last_wins: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the syntax tree with the byte span of every node (use '-' for stdin)
    Tree {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Keep only nodes whose title contains TEXT, plus their ancestors
        #[arg(long, value_name = "TEXT")]
        filter: Option<String>,
        /// Stop descending below this depth
        #[arg(long)]
        depth: Option<usize>,
        /// Also list zero-width nodes
        #[arg(long)]
        show_hidden: bool,
    },
    /// Print a hex grid with the selected nodes highlighted
    Hex {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Node key to select; repeat to select several
        #[arg(long = "select", value_name = "KEY")]
        select: Vec<String>,
        #[arg(long, value_name = "TEXT")]
        filter: Option<String>,
    },
    /// Print the bits of the bytes covered by the selected nodes
    Bits {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long = "select", value_name = "KEY", required = true)]
        select: Vec<String>,
        /// Print at most this many bytes
        #[arg(long, default_value_t = 256)]
        max_rows: usize,
    },
    /// Print node counts and session counters
    Stats {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long, value_name = "TEXT")]
        filter: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Rows, bytes and nibbles; works for any file
    Raw,
    /// VGM header, command stream and GD3 chunk
    Vgm,
}

/// The parser picked on the command line.
enum FormatParser {
    Raw(RawParser),
    Vgm(VgmParser),
}

impl SyntaxParser for FormatParser {
    fn parse(&self, buffer: &[u8]) -> Result<DataNode, ParseError> {
        match self {
            FormatParser::Raw(p) => p.parse(buffer),
            FormatParser::Vgm(p) => p.parse(buffer),
        }
    }
}

impl GlobalOpts {
    fn parser(&self) -> FormatParser {
        match self.format {
            Format::Raw => FormatParser::Raw(RawParser::new(self.bytes_per_row)),
            Format::Vgm => FormatParser::Vgm(VgmParser),
        }
    }

    fn config(&self, show_hidden: bool) -> ExplorerConfig {
        let priority = if self.last_wins {
            ColorPriority::LastInserted
        } else {
            ColorPriority::FirstInserted
        };
        ExplorerConfig::default()
            .with_palette(self.palette.clone().unwrap_or_default())
            .with_priority(priority)
            .with_show_hidden_syntax(show_hidden)
    }
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Read `file`, parse it and apply the search filter.
fn open(
    opts: &GlobalOpts,
    file: &Path,
    filter: Option<&str>,
    show_hidden: bool,
) -> Result<Explorer<FormatParser>> {
    let bytes = read_input(file)?;
    info!("{}: {} bytes", file.display(), bytes.len());
    let mut explorer = Explorer::with_config(opts.parser(), opts.config(show_hidden));
    explorer
        .load_buffer(bytes)
        .with_context(|| format!("failed to parse {} as {:?}", file.display(), opts.format))?;
    if let Some(text) = filter {
        explorer.set_filter(text);
        debug!("filter {:?}: {} nodes", text, explorer.index().len());
    }
    Ok(explorer)
}

/// Focus the single node `key`. Ignored focus events are reported on
/// stderr.
fn focus_key<P: SyntaxParser>(explorer: &mut Explorer<P>, key: &str) -> Result<Focus> {
    let focus = explorer
        .focus(key)
        .with_context(|| format!("node {}", key))?;
    match focus {
        Focus::Ignored(IgnoreReason::Miss(LookupMiss::NotFound)) => {
            eprintln!("unknown key: {}", key)
        }
        Focus::Ignored(IgnoreReason::Miss(LookupMiss::Stale { .. })) => {
            eprintln!("stale key: {}", key)
        }
        Focus::Ignored(IgnoreReason::ZeroWidth) => {
            eprintln!("skipping zero-width node: {}", key)
        }
        Focus::Selected(range) => debug!("selected {} {}", key, range),
        Focus::Unchanged => {}
    }
    Ok(focus)
}

/// Extents of the nodes named by `keys`, in argument order. Unknown and
/// zero-width nodes are reported on stderr and skipped.
fn collect_ranges<P: SyntaxParser>(
    explorer: &Explorer<P>,
    keys: &[String],
) -> Result<Vec<BitRange>> {
    let mut ranges = Vec::new();
    for key in keys {
        match explorer.lookup(key) {
            None => eprintln!("unknown key: {}", key),
            Some(node) if !node.is_selectable() => {
                eprintln!("skipping zero-width node: {}", key)
            }
            Some(node) => ranges.push(
                node.bit_range()
                    .with_context(|| format!("node {}", key))?,
            ),
        }
    }
    Ok(ranges)
}

/// Select the nodes named by `keys`. A single key goes through `focus`,
/// several keys build a multi-range selection.
fn select<P: SyntaxParser>(explorer: &mut Explorer<P>, keys: &[String]) -> Result<()> {
    if let [key] = keys {
        focus_key(explorer, key)?;
    } else {
        let ranges = collect_ranges(explorer, keys)?;
        explorer.set_selections(ranges);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.opts.verbose);
    let opts = &cli.opts;

    match &cli.command {
        Commands::Tree {
            file,
            filter,
            depth,
            show_hidden,
        } => {
            let explorer = open(opts, file, filter.as_deref(), *show_hidden)?;
            let table = render::tree_table(explorer.syntax(), *depth, explorer.show_hidden_syntax());
            println!("{}", table);
        }
        Commands::Hex {
            file,
            select: keys,
            filter,
        } => {
            let mut explorer = open(opts, file, filter.as_deref(), false)?;
            select(&mut explorer, keys)?;
            println!("{}", render::hex_table(&explorer, opts.bytes_per_row));
        }
        Commands::Bits {
            file,
            select: keys,
            max_rows,
        } => {
            let mut explorer = open(opts, file, None, false)?;
            select(&mut explorer, keys)?;
            println!("{}", render::bit_table(&explorer, *max_rows));
        }
        Commands::Stats { file, filter } => {
            let explorer = open(opts, file, filter.as_deref(), false)?;
            println!("{}", render::stats_table(&explorer));
            debug!("{}", explorer.metrics());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitscope::selection::{PRIMARY_COLOR, SECONDARY_COLOR};

    fn keys(list: &[&str]) -> Vec<String> {
        list.iter().map(|k| k.to_string()).collect()
    }

    fn with_marker(buffer: &[u8]) -> Result<DataNode, ParseError> {
        let bits = buffer.len() as u64 * 8;
        Ok(DataNode::new("root", "root", 0, bits).with_children(vec![
            DataNode::new("a", "first", 0, 8),
            DataNode::new("m", "marker", 8, 0),
            DataNode::new("b", "second", 8, 16),
        ]))
    }

    #[test]
    fn test_collect_ranges_keeps_argument_order() {
        let mut explorer = Explorer::new(with_marker);
        explorer.load_buffer(vec![0; 3]).unwrap();

        let ranges = collect_ranges(&explorer, &keys(&["b", "nope", "m", "a"])).unwrap();
        assert_eq!(
            ranges,
            vec![BitRange::new(8, 24).unwrap(), BitRange::new(0, 8).unwrap()]
        );
        assert!(collect_ranges(&explorer, &keys(&["nope", "m"])).unwrap().is_empty());
    }

    #[test]
    fn test_select_several_keys() {
        let mut explorer = Explorer::new(with_marker);
        explorer.load_buffer(vec![0; 3]).unwrap();
        select(&mut explorer, &keys(&["b", "m", "a"])).unwrap();
        assert_eq!(explorer.selection().ranges().len(), 2);
        // "b" was given first and takes the first palette color
        assert_eq!(explorer.color_for_byte(1), Some(PRIMARY_COLOR));
        assert_eq!(explorer.color_for_byte(0), Some(SECONDARY_COLOR));
    }

    #[test]
    fn test_select_single_key_uses_focus() {
        let mut explorer = Explorer::new(with_marker);
        explorer.load_buffer(vec![0; 3]).unwrap();

        assert_eq!(
            focus_key(&mut explorer, "a").unwrap(),
            Focus::Selected(BitRange::new(0, 8).unwrap())
        );
        assert_eq!(focus_key(&mut explorer, "a").unwrap(), Focus::Unchanged);
        assert_eq!(
            focus_key(&mut explorer, "m").unwrap(),
            Focus::Ignored(IgnoreReason::ZeroWidth)
        );
        select(&mut explorer, &keys(&["b"])).unwrap();
        assert_eq!(explorer.selection().ranges(), &[BitRange::new(8, 24).unwrap()]);
        assert_eq!(explorer.metrics().get("focus"), Some(4));
    }

    #[test]
    fn test_format_parser_dispatch() {
        let cli =
            Cli::try_parse_from(["bitscope", "--bytes-per-row", "2", "tree", "x.bin"]).unwrap();
        let tree = cli.opts.parser().parse(&[1, 2, 3]).unwrap();
        // three bytes at two per row
        assert_eq!(tree.children()[0].children().len(), 2);

        let cli = Cli::try_parse_from(["bitscope", "tree", "x.vgm", "--format", "vgm"]).unwrap();
        assert_eq!(cli.opts.format, Format::Vgm);
        assert_eq!(
            cli.opts.parser().parse(b"RIFF"),
            Err(ParseError::InvalidIdent(*b"RIFF"))
        );
    }

    #[test]
    fn test_config_from_flags() {
        let cli = Cli::try_parse_from([
            "bitscope",
            "--palette",
            "#FF0000",
            "--last-wins",
            "stats",
            "-",
        ])
        .unwrap();
        let config = cli.opts.config(true);
        assert_eq!(config.priority, ColorPriority::LastInserted);
        assert_eq!(config.palette.len(), 1);
        assert!(config.show_hidden_syntax);
    }
}
