//! Command dispatch and plain-text output.

use anyhow::{Context, Result, bail};
use gpudeps_core::{Library, LibraryFilter, Platform};
use gpudeps_runtime::{CancellationToken, CliProgress, DependencyManager, ProgressReporter};

use crate::parser::Commands;

pub async fn dispatch(
    manager: &DependencyManager,
    command: Commands,
    cancel: &CancellationToken,
) -> Result<()> {
    match command {
        Commands::Sync { os, arch } => {
            let manifest = manager
                .sync_manifest(os.as_deref(), arch.as_deref(), cancel)
                .await?;
            println!(
                "Catalog {} synced ({} libraries)",
                manifest.version,
                manifest.libraries.len()
            );
        }
        Commands::List {
            os,
            arch,
            name,
            version,
        } => {
            let filter = LibraryFilter {
                platform: os,
                arch,
                name,
                version,
            };
            print_libraries(&manager.list_libraries(&filter, cancel).await?);
        }
        Commands::Download { name, version } => {
            let library = select(manager, &name, version, cancel).await?;
            let path = download(manager, &library, cancel).await?;
            println!("{}", path.display());
        }
        Commands::Install { name, version } => {
            let library = select(manager, &name, version, cancel).await?;
            download(manager, &library, cancel).await?;
            let path = manager.install(&library).await?;
            println!("Installed {} {} to {}", library.name, library.version, path.display());
        }
        Commands::Uninstall { name } => {
            let removed = manager.uninstall(&name).await?;
            println!("Removed {} {}", removed.name, removed.version);
        }
        Commands::Installed => print_libraries(&manager.list_installed().await),
        Commands::Downloaded => print_libraries(&manager.list_downloaded().await),
        Commands::CheckUpdates => {
            let updates = manager.check_updates(cancel).await?;
            if updates.is_empty() {
                println!("Everything is up to date");
            } else {
                print_libraries(&updates);
            }
        }
        Commands::Upgrade => {
            let updates = manager.check_updates(cancel).await?;
            let outcome = manager.upgrade(&updates, &CliProgress::new(), cancel).await;
            println!(
                "{} upgraded, {} failed",
                outcome.succeeded.len(),
                outcome.failed.len()
            );
            for (library, error) in &outcome.failed {
                eprintln!("  {}: {error}", library.name);
            }
            if !outcome.is_success() {
                bail!("upgrade incomplete");
            }
        }
        Commands::Clean => {
            manager.clean_cache().await?;
            println!("Cache cleaned: {}", manager.paths().cache_dir.display());
        }
        Commands::Path { name } => {
            println!("{}", manager.installed_path(&name).await?.display());
        }
        Commands::Verify { name } => {
            if manager.verify_installed(&name).await? {
                println!("{name}: OK");
            } else {
                bail!("{name}: checksum does not match the installed record");
            }
        }
        Commands::Binary { vendor, os, arch } => {
            match manager
                .ensure_binary(&vendor, os.as_deref(), arch.as_deref(), cancel)
                .await?
            {
                Some(path) => println!("{}", path.display()),
                None => {
                    let target = Platform::resolve(os.as_deref(), arch.as_deref());
                    println!("No {vendor} binary available for {target}");
                }
            }
        }
    }
    Ok(())
}

/// Pick the catalog entry for `name` on the manager's platform.
async fn select(
    manager: &DependencyManager,
    name: &str,
    version: Option<String>,
    cancel: &CancellationToken,
) -> Result<Library> {
    let mut filter = LibraryFilter::for_platform(manager.platform()).with_name(name);
    filter.version = version;
    manager
        .list_libraries(&filter, cancel)
        .await?
        .into_iter()
        .next()
        .with_context(|| format!("'{name}' is not in the catalog for {}", manager.platform()))
}

async fn download(
    manager: &DependencyManager,
    library: &Library,
    cancel: &CancellationToken,
) -> Result<std::path::PathBuf> {
    let progress = CliProgress::new();
    progress.start(&format!("Downloading {}", library.name), Some(library.size));
    let on_progress = |done: u64, total: u64| progress.update(done, Some(total));

    match manager.download(library, Some(&on_progress), cancel).await {
        Ok(path) => {
            progress.finish(&format!("{} ready", library.name));
            Ok(path)
        }
        Err(e) => {
            progress.finish_with_error(&e.to_string());
            Err(e.into())
        }
    }
}

fn print_libraries(libraries: &[Library]) {
    if libraries.is_empty() {
        println!("(none)");
        return;
    }
    for library in libraries {
        println!(
            "{:<32} {:<16} {}/{}  {} bytes",
            library.name, library.version, library.platform, library.arch, library.size
        );
    }
}
