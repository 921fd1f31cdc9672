use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use slayer_filer::cadapter::client::ObjectClient;
use slayer_filer::cadapter::localfs::LocalFsBackend;
use slayer_filer::chuck::{FileChunk, ObjectChunkDeleter};
use slayer_filer::config::StoreKind;
use slayer_filer::master::{MasterClient, StaticLocationSource};
use slayer_filer::meta::{Attr, Entry, FullPath, create_entry_store};
use slayer_filer::{Filer, FilerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "slayer-filer")]
#[command(about = "Inspect and edit the SlayerFS namespace", long_about = None)]
struct Cli {
    /// Filer configuration (YAML). Defaults apply when omitted.
    #[arg(long, env = "SLAYER_FILER_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding chunk objects, one subdirectory per volume server.
    #[arg(long, default_value = "./slayer-chunks")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Create or replace an entry, creating missing parent directories")]
    Put {
        #[arg(value_name = "PATH")]
        path: String,
        /// Chunk reference as `fid:offset:size`, repeatable.
        #[arg(long = "chunk", value_name = "FID:OFFSET:SIZE")]
        chunks: Vec<String>,
        #[arg(long)]
        dir: bool,
        #[arg(long, default_value_t = 0)]
        uid: u32,
        #[arg(long, default_value_t = 0)]
        gid: u32,
    },
    #[command(about = "Show a single entry")]
    Stat {
        #[arg(value_name = "PATH")]
        path: String,
    },
    #[command(about = "List the children of a directory")]
    Ls {
        #[arg(value_name = "PATH", default_value = "/")]
        path: String,
        #[arg(long, default_value = "")]
        start: String,
        #[arg(long)]
        inclusive: bool,
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    #[command(about = "Delete an entry and reclaim its chunks")]
    Rm {
        #[arg(value_name = "PATH")]
        path: String,
        #[arg(short, long)]
        recursive: bool,
        /// Keep the chunks on the volume servers.
        #[arg(long)]
        keep_chunks: bool,
    },
}

fn parse_chunk(raw: &str) -> anyhow::Result<FileChunk> {
    let mut parts = raw.rsplitn(3, ':');
    let (Some(size), Some(offset), Some(fid)) = (parts.next(), parts.next(), parts.next()) else {
        bail!("chunk {raw:?} is not fid:offset:size");
    };
    let offset = offset
        .parse()
        .with_context(|| format!("chunk {raw:?}: bad offset"))?;
    let size = size
        .parse()
        .with_context(|| format!("chunk {raw:?}: bad size"))?;
    Ok(FileChunk::new(fid, offset, size))
}

async fn build_filer(cli: &Cli) -> anyhow::Result<Filer> {
    let cfg = match &cli.config {
        Some(path) => FilerConfig::from_file(path)?,
        None => FilerConfig::default(),
    };
    if cfg.store.kind == StoreKind::Memory {
        warn!("memory entry store selected, changes are lost on exit");
    }

    let store = create_entry_store(&cfg.store)
        .await
        .context("open entry store")?;
    let source = Arc::new(StaticLocationSource::from_config(&cfg.volumes));
    let master = MasterClient::new(
        "slayer-filer",
        cfg.masters.clone(),
        source,
        cfg.reconnect_interval(),
    )
    .with_static_volumes(&cfg.volumes)
    .await;
    let deleter = ObjectChunkDeleter::new(ObjectClient::new(LocalFsBackend::new(&cli.data_dir)));

    Ok(Filer::with_master(
        store,
        Arc::new(master),
        Arc::new(deleter),
        &cfg,
    ))
}

fn describe(entry: &Entry) -> String {
    let kind = if entry.is_directory() { 'd' } else { '-' };
    format!(
        "{kind} {:o} {}:{} {:>10} {}",
        entry.attr.permissions(),
        entry.attr.uid,
        entry.attr.gid,
        entry.size(),
        entry.full_path
    )
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let filer = build_filer(&cli).await?;
    match cli.command {
        Commands::Put {
            path,
            chunks,
            dir,
            uid,
            gid,
        } => {
            let entry = if dir {
                if !chunks.is_empty() {
                    bail!("a directory cannot hold chunks");
                }
                Entry::new_directory(path.as_str(), uid, gid)
            } else {
                let chunks = chunks
                    .iter()
                    .map(|c| parse_chunk(c))
                    .collect::<anyhow::Result<Vec<_>>>()?;
                Entry::new_file(path.as_str(), Attr::new(0o644, uid, gid), chunks)
            };
            filer.create_entry(&entry).await?;
            println!("{}", describe(&entry));
        }
        Commands::Stat { path } => {
            let entry = filer.find_entry(&FullPath::new(path)).await?;
            println!("{}", describe(&entry));
            for c in &entry.chunks {
                println!("  {} @{} +{}", c.file_id, c.offset, c.size);
            }
        }
        Commands::Ls {
            path,
            start,
            inclusive,
            limit,
        } => {
            let entries = filer
                .list_directory_entries(&FullPath::new(path), &start, inclusive, limit)
                .await?;
            for e in &entries {
                println!("{}", describe(e));
            }
        }
        Commands::Rm {
            path,
            recursive,
            keep_chunks,
        } => {
            filer
                .delete_entry_meta_and_data(&FullPath::new(path), recursive, !keep_chunks)
                .await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{e:#}");
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chunk_keeps_comma_in_fid() {
        let c = parse_chunk("3,01637037d6:0:4096").unwrap();
        assert_eq!(c.file_id.as_str(), "3,01637037d6");
        assert_eq!((c.offset, c.size), (0, 4096));
        assert!(parse_chunk("3,01637037d6:4096").is_err());
        assert!(parse_chunk("3,01:x:1").is_err());
    }
}
