use std::process::ExitCode;

use std::path::Path;

use command_tree_core::{
    ARGS_KEY, COMMAND_KEY, CommandTree, Error, NodeId, Options, Store, command_path,
    residual_args,
};
use tracing::{debug, warn};

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exit status for flag faults, matching the usual usage-error convention.
const USAGE_EXIT: u8 = 2;

struct Demo {
    tree: CommandTree,
    show_options: NodeId,
}

fn build_tree(program: &str) -> command_tree_core::Result<Demo> {
    let mut tree = CommandTree::new(program, "Example program using command-tree");
    let root = tree.root();
    tree.flags_mut(root)
        .bool("version", false, "Display version")?
        .string("config", "", "Merge options from the YAML `file`")?;

    tree.add_command(root, "hello-world hello hw", "Display Hello World!")?;
    let show_options = tree.add_command(root, "show-options options opts", "Show the option store")?;
    tree.flags_mut(show_options)
        .string("format", "yaml", "Output `format`: yaml or json")?;

    let level1 = tree.add_command(root, "level1", "Only a stepping stone")?;
    tree.add_command(level1, "deadend", "Nothing here")?;
    let level2 = tree.add_command(level1, "level2", "Show deeper level")?;
    tree.add_command(level2, "end", "Unnecessarily deep")?;
    // Show the only choice instead of a generic [COMMAND].
    tree.node_mut(level2).set_subcommand_hint("[end]");

    Ok(Demo { tree, show_options })
}

/// Merges a YAML configuration file into `opts`. The parse results under the
/// reserved keys are never overridden by the file.
fn merge_config(opts: &mut Options, path: impl AsRef<Path>) -> command_tree_core::Result<()> {
    let path = path.as_ref();
    debug!(path = %path.display(), "Merging configuration file");
    let mut config = Options::load(path)?;
    for key in [COMMAND_KEY, ARGS_KEY] {
        if config.remove(key).is_some() {
            warn!(key, path = %path.display(), "Ignoring reserved key in configuration file");
        }
    }
    opts.merge(config);
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_tracing();

    let mut argv = std::env::args();
    let program = argv.next().unwrap_or_else(|| "cmdtree-demo".to_string());
    let args: Vec<String> = argv.collect();

    match run(&program, &args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.is_help() => {
            eprint!("{}", err.usage().unwrap_or_default());
            ExitCode::SUCCESS
        }
        Err(err @ Error::Flag { .. }) => {
            eprintln!("{err}");
            eprint!("{}", err.usage().unwrap_or_default());
            ExitCode::from(USAGE_EXIT)
        }
        Err(err) => {
            eprintln!("Failed with error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(program: &str, args: &[String]) -> command_tree_core::Result<()> {
    let Demo {
        mut tree,
        show_options,
    } = build_tree(program)?;

    let mut opts = Options::new();
    opts.set("program-name", program);
    opts.set("program-version", &format!("demo-{PACKAGE_VERSION}"));

    tree.parse(args, &mut opts)?;

    let root = tree.root();
    if let Some(path) = tree.flags(root).get_str("config").filter(|p| !p.is_empty()) {
        merge_config(&mut opts, path)?;
    }

    if tree.flags(root).get_bool("version") == Some(true) {
        println!("{}", opts.get("program-version", "Undefined"));
        return Ok(());
    }

    let command = command_path(&opts);
    let rest = residual_args(&opts);

    match command.as_str() {
        "" => {
            println!("Default command invoked.");
            println!("Arguments as a string: {:?}", opts.get(ARGS_KEY, ""));
            println!("Arguments as an array {rest:?}");
        }
        "hello-world" => println!("Hello World !"),
        "show-options" => {
            let format = tree.flags(show_options).get_str("format").unwrap_or("yaml");
            match format {
                "json" => println!("{}", opts.to_json_string()?),
                _ => print!("{}", opts.to_yaml_string()?),
            }
        }
        _ => {
            println!("Reached the default handler for commands");
            println!("Invoked command: {command}");
            println!("Arguments as an array {rest:?}");
        }
    }

    Ok(())
}
