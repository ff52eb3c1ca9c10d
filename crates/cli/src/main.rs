use anyhow::Result;
use clap::{Parser, Subcommand};
use jitkeeper::commands::{
    cache_clear_command, cache_enable_command, cache_list_command, check_command,
    recompile_command, scan_command, RecompileArgs,
};
use jitkeeper::init_tracing;

/// Discover, audit, and maintain `@njit` kernels of a Python package.
///
/// This CLI is a thin wrapper around `jitkeeper-core` (exposed in code as
/// `jitkeeper_core`). All substantive logic lives in the library so it can be
/// tested thoroughly and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "jitkeeper",
    version,
    about = "Discover, audit, and maintain @njit kernels",
    long_about = None
)]
struct Cli {
    /// Project root holding the package directory. Defaults to the current working directory.
    #[arg(long, default_value = ".", global = true)]
    root: String,

    /// Package name. Overrides `jitkeeper.json` and the root directory name.
    #[arg(long, global = true)]
    package: Option<String>,

    /// Audit every kernel for the required target option before any subcommand runs.
    #[arg(long, default_value_t = false)]
    check: bool,

    /// Show debug logging.
    #[arg(short, long, default_value_t = false, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, default_value_t = false, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every function decorated with the marker, as `module.function`.
    Scan {
        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Audit every kernel for the required target option (same as `--check`).
    Check,

    /// Inspect or modify the installed package's compile cache (experimental).
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Force recompilation of one or all kernels (experimental).
    Recompile {
        /// Kernel to recompile, as `module.function`. Defaults to every kernel.
        #[arg(long)]
        function: Option<String>,

        /// Replacement fastmath value: `true`, `false`, or flags like `nsz,arcp`.
        #[arg(long)]
        fastmath: Option<String>,

        /// Enable caching first so the recompiled artifacts are persisted.
        #[arg(long, default_value_t = false)]
        cache: bool,

        /// Site-packages root the package is installed under.
        #[arg(long)]
        site_packages: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// List cached artifacts.
    List {
        /// Site-packages root the package is installed under.
        #[arg(long)]
        site_packages: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Delete cached artifacts.
    Clear {
        /// Site-packages root the package is installed under.
        #[arg(long)]
        site_packages: Option<String>,
    },

    /// Enable persistent caching for every kernel.
    Enable {
        /// Site-packages root the package is installed under.
        #[arg(long)]
        site_packages: Option<String>,
    },
}

fn main() -> Result<()> {
    let Cli { root, package, check, verbose, quiet, command } = Cli::parse();
    init_tracing(quiet, verbose)?;
    let package = package.as_deref();

    // `--check` audits first; a subcommand then runs only if the audit passed.
    if check {
        check_command(&root, package)?;
    }

    match command {
        None => {}
        Some(Command::Scan { json }) => scan_command(&root, package, json)?,
        Some(Command::Check) => check_command(&root, package)?,
        Some(Command::Cache { action }) => match action {
            CacheAction::List { site_packages, json } => {
                cache_list_command(&root, package, site_packages.as_deref(), json)?
            }
            CacheAction::Clear { site_packages } => {
                cache_clear_command(&root, package, site_packages.as_deref())?
            }
            CacheAction::Enable { site_packages } => {
                cache_enable_command(&root, package, site_packages.as_deref())?
            }
        },
        Some(Command::Recompile { function, fastmath, cache, site_packages }) => {
            let args = RecompileArgs { function, fastmath, cache, site_packages };
            recompile_command(&root, package, &args)?
        }
    }

    Ok(())
}
