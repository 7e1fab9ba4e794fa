//! # strata CLI
//!
//! Command-line front end for Strata path canonicalization and stream
//! buffering.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use strata_buffer::SegmentedByteBuffer;
use strata_config::{log_cli_debug, log_cli_info, log_cli_warn, Config};
use strata_path::{
    ErrorPolicy, FileSystem, MetaFlags, PathEntry, PathMetadata, PathResolver, Resolved,
};

/// Strata - symlink-aware path canonicalization
#[derive(Parser)]
#[command(name = "strata")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Override the configured error policy (lenient or strict)
    #[arg(long, global = true, value_name = "POLICY")]
    policy: Option<ErrorPolicy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the canonical form of each path
    Canon {
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<String>,
    },

    /// Expand aliases and resources, then describe what the path names
    Resolve {
        #[arg(value_name = "PATH")]
        path: String,
    },

    /// Stream a file through the chunk buffer and print its lines
    Lines {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Bytes per read (defaults to `buffer.read_chunk_size`)
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Print the config file locations
    Path,
}

fn main() -> Result<()> {
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }

    let cli = Cli::parse();

    strata_config::reload().context("failed to load configuration")?;
    let mut config = strata_config::config().clone();
    strata_config::logging::init_logging(config.logging.level);

    if let Some(policy) = cli.policy {
        config.resolver.error_policy = policy;
    }

    match cli.command {
        Commands::Canon { paths } => cmd_canon(&config, &paths),
        Commands::Resolve { path } => cmd_resolve(&config, &path),
        Commands::Lines { file, chunk_size } => {
            let chunk_size = chunk_size.unwrap_or(config.buffer.read_chunk_size).max(1);
            cmd_lines(&file, chunk_size)
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                print!("{}", config.to_toml()?);
                Ok(())
            }
            ConfigCommands::Path => {
                match Config::global_config_path() {
                    Some(path) => println!("Global:  {}", path.display()),
                    None => println!("Global:  (no home directory)"),
                }
                println!("Project: {}", strata_config::PROJECT_CONFIG_PATH);
                Ok(())
            }
        },
    }
}

fn cmd_canon(config: &Config, paths: &[String]) -> Result<()> {
    let resolver = config.resolver()?;
    let mut failed = 0usize;

    for path in paths {
        match resolver.canonicalize(path) {
            Ok(canonical) => println!("{canonical}"),
            Err(e) => {
                log_cli_warn!("Canonicalization failed", path = path.as_str(), error = e.to_string());
                eprintln!("strata: {path}: {e}");
                failed += 1;
            }
        }
    }

    log_cli_info!("Canonicalized", total = paths.len(), failed = failed);
    if failed > 0 {
        anyhow::bail!("{failed} of {} path(s) could not be canonicalized", paths.len());
    }
    Ok(())
}

fn cmd_resolve(config: &Config, path: &str) -> Result<()> {
    let resolver = config.resolver()?;
    let resolved = resolver
        .resolve_entry(&PathEntry::new(path))
        .with_context(|| format!("failed to resolve {path}"))?;

    match resolved {
        Resolved::Resource(resource) => {
            println!("resource:  :{}", resource.path);
            println!("type:      {}", if resource.is_dir { "directory" } else { "file" });
            if !resource.is_dir {
                println!("size:      {}", resource.size);
            }
        }
        Resolved::File { entry, metadata } => {
            let metadata = describe(&resolver, &entry, metadata)?;
            let canonical = resolver
                .canonicalize(entry.file_path())
                .with_context(|| format!("failed to canonicalize {entry}"))?;

            println!("path:      {entry}");
            println!("canonical: {canonical}");
            println!("type:      {}", kind(&metadata));
            if metadata.is_symlink() {
                println!("symlink:   yes");
            }
            if metadata.exists() {
                if let Some(size) = metadata.size() {
                    println!("size:      {size}");
                }
                if let Some(perms) = metadata.permissions() {
                    println!("mode:      {}", mode_string(perms));
                }
            }
        }
    }
    Ok(())
}

/// Plain paths come back from resolution without metadata; ask the filesystem.
fn describe<F: FileSystem>(
    resolver: &PathResolver<F>,
    entry: &PathEntry,
    mut metadata: PathMetadata,
) -> Result<PathMetadata> {
    if metadata.has_flags(MetaFlags::LINK_TYPE) {
        return Ok(metadata);
    }
    match resolver.file_system().symlink_metadata(entry.file_path()) {
        Ok(found) => metadata.merge(&found),
        Err(e) if e.kind() == io::ErrorKind::NotFound => metadata.set_missing(),
        Err(e) => return Err(e).with_context(|| format!("failed to stat {entry}")),
    }
    Ok(metadata)
}

fn kind(metadata: &PathMetadata) -> &'static str {
    if !metadata.exists() {
        "missing"
    } else if metadata.is_dir() {
        "directory"
    } else if metadata.is_file() {
        "file"
    } else {
        "special"
    }
}

fn mode_string(perms: MetaFlags) -> String {
    const BITS: [(MetaFlags, char); 9] = [
        (MetaFlags::OWNER_READ, 'r'),
        (MetaFlags::OWNER_WRITE, 'w'),
        (MetaFlags::OWNER_EXECUTE, 'x'),
        (MetaFlags::GROUP_READ, 'r'),
        (MetaFlags::GROUP_WRITE, 'w'),
        (MetaFlags::GROUP_EXECUTE, 'x'),
        (MetaFlags::OTHER_READ, 'r'),
        (MetaFlags::OTHER_WRITE, 'w'),
        (MetaFlags::OTHER_EXECUTE, 'x'),
    ];
    BITS.iter()
        .map(|&(flag, c)| if perms.contains(flag) { c } else { '-' })
        .collect()
}

fn cmd_lines(file: &Path, chunk_size: usize) -> Result<()> {
    let mut reader =
        File::open(file).with_context(|| format!("failed to open {}", file.display()))?;
    let mut buffer = SegmentedByteBuffer::new();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut lines = 0usize;
    let mut reads = 0usize;

    loop {
        let n = buffer
            .fill_from(&mut reader, chunk_size)
            .with_context(|| format!("failed to read {}", file.display()))?;
        reads += 1;
        while let Some(line) = buffer.read_line() {
            out.write_all(&line)?;
            lines += 1;
        }
        if n == 0 {
            break;
        }
    }

    // Unterminated last line
    let tail = buffer.read_all();
    if !tail.is_empty() {
        out.write_all(&tail)?;
        out.write_all(b"\n")?;
        lines += 1;
    }
    out.flush()?;

    log_cli_debug!("Streamed file", lines = lines, reads = reads, chunk_size = chunk_size);
    Ok(())
}
