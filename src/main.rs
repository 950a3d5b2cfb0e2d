use anyhow::Result;
use clap::{Parser, Subcommand};
use is_terminal::IsTerminal;
use minivc::artifacts::core::PagerWriter;
use minivc::commands::porcelain::log::LogOptions;
use minivc::{Repository, RepositoryError, telemetry};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "minivc",
    version = "0.1.0",
    author = "Sami Barbut-Dica",
    about = "A minimal single-history version control system",
    long_about = "minivc records snapshots of a directory tree as a single linear history. \
    It keeps content-addressed objects, a staging index and a HEAD reference under .minivc.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
",
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "init",
        about = "Initialize a new repository",
        long_about = "This command initializes a new repository in the current directory or at the specified path."
    )]
    Init {
        #[arg(index = 1, help = "The path to the repository")]
        path: Option<PathBuf>,
    },
    #[command(
        name = "add",
        about = "Stage files for the next commit",
        long_about = "This command stores the content of the given files and directories and stages it. \
        Tracked files that no longer exist have their deletion staged."
    )]
    Add {
        #[arg(required = true, help = "Files or directories to stage")]
        paths: Vec<PathBuf>,
    },
    #[command(
        name = "remove",
        about = "Unstage files",
        long_about = "This command removes files from the index. Working files are kept \
        unless --delete is passed or remove.delete_working_files is set in config.toml."
    )]
    Remove {
        #[arg(long, help = "Also delete the working files")]
        delete: bool,
        #[arg(required = true, help = "Files or directories to unstage")]
        paths: Vec<PathBuf>,
    },
    #[command(
        name = "commit",
        about = "Create a new commit with the specified message",
        long_about = "This command records the index as a new commit on top of HEAD. \
        The author is read from MINIVC_AUTHOR_NAME, MINIVC_AUTHOR_EMAIL and MINIVC_AUTHOR_DATE."
    )]
    Commit {
        #[arg(short, long, help = "The commit message")]
        message: String,
    },
    #[command(
        name = "checkout",
        about = "Check out a commit into the working tree",
        long_about = "This command replaces the index and working tree with the tree of a commit. \
        HEAD does not move; checking out HEAD returns to the tip of the history."
    )]
    Checkout {
        #[arg(index = 1, help = "HEAD or an (abbreviated) commit ID")]
        revision: String,
    },
    #[command(
        name = "reset",
        about = "Move HEAD to a commit",
        long_about = "This command moves HEAD to a commit and forces the index and working tree to match it. \
        Later commits are no longer reachable from HEAD."
    )]
    Reset {
        #[arg(index = 1, help = "HEAD or an (abbreviated) commit ID")]
        revision: String,
    },
    #[command(
        name = "log",
        about = "Show the commit history",
        long_about = "This command lists the commits reachable from HEAD, newest first."
    )]
    Log {
        #[arg(long, help = "Show each commit on a single line")]
        oneline: bool,
        #[arg(long = "abbrev-commit", help = "Show abbreviated commit IDs")]
        abbrev_commit: bool,
    },
    #[command(
        name = "status",
        about = "Show the working tree status",
        long_about = "This command lists staged changes, unstaged changes and untracked files."
    )]
    Status {
        #[arg(long, help = "Print the status in a machine-readable format")]
        porcelain: bool,
    },
    #[command(
        name = "hash-object",
        about = "Hash a file and optionally write it to the object database",
        long_about = "This command computes the blob ID of a file and can write the blob to the object database."
    )]
    HashObject {
        #[arg(short, long, required = false, help = "Write the object to the object database")]
        write: bool,
        #[arg(index = 1)]
        file: PathBuf,
    },
    #[command(
        name = "cat-file",
        about = "Print the content of an object",
        long_about = "This command pretty-prints a stored object given HEAD or an (abbreviated) object ID."
    )]
    CatFile {
        #[arg(short = 'p', long = "pretty", help = "The object to print")]
        revision: String,
    },
}

fn main() {
    telemetry::init();

    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let pwd = std::env::current_dir()?;
    let absolute = |paths: &[PathBuf]| paths.iter().map(|path| pwd.join(path)).collect::<Vec<_>>();

    match &cli.command {
        Commands::Init { path } => {
            let path = path.as_ref().map_or_else(|| pwd.clone(), |path| pwd.join(path));
            Repository::new(&path, stdout())?.init()?
        }
        Commands::Add { paths } => open(&pwd)?.add(&absolute(paths))?,
        Commands::Remove { delete, paths } => open(&pwd)?.remove(&absolute(paths), *delete)?,
        Commands::Commit { message } => {
            open(&pwd)?.commit(message)?;
        }
        Commands::Checkout { revision } => open(&pwd)?.checkout(revision)?,
        Commands::Reset { revision } => {
            open(&pwd)?.reset(revision)?;
        }
        Commands::Log {
            oneline,
            abbrev_commit,
        } => {
            let opts = LogOptions {
                oneline: *oneline,
                abbrev_commit: *abbrev_commit,
            };
            log(&pwd, &opts)?
        }
        Commands::Status { porcelain } => open(&pwd)?.show_status(*porcelain)?,
        Commands::HashObject { write, file } => {
            let file = pwd.join(file);
            match Repository::discover(&pwd, stdout()) {
                Ok(repository) => repository.hash_object(&file, *write)?,
                // hashing without writing works outside a repository
                Err(e)
                    if !*write
                        && matches!(
                            e.downcast_ref::<RepositoryError>(),
                            Some(RepositoryError::NotARepository(_))
                        ) =>
                {
                    Repository::new(&pwd, stdout())?.hash_object(&file, false)?
                }
                Err(e) => return Err(e),
            }
        }
        Commands::CatFile { revision } => open(&pwd)?.cat_file(revision)?,
    }

    Ok(())
}

fn stdout() -> Box<dyn Write> {
    Box::new(std::io::stdout())
}

fn open(pwd: &Path) -> Result<Repository> {
    Repository::discover(pwd, stdout())
}

fn log(pwd: &Path, opts: &LogOptions) -> Result<()> {
    if !PagerWriter::is_enabled() {
        return open(pwd)?.log(opts);
    }

    let pager = minus::Pager::new();
    let repository = Repository::discover(pwd, Box::new(PagerWriter::new(pager.clone())))?;
    repository.log(opts)?;
    drop(repository);

    minus::page_all(pager)?;

    Ok(())
}
