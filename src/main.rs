use anyhow::{Context, Result};
use serde_json::json;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use flet_storage::display::{format_listing, format_search_results};
use flet_storage::{
    Content, FileStorage, ReadOptions, RootScope, SaveOptions, StorageOptions, StoragePaths,
    StorageRoot,
};

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays the demo output
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("flet_storage=info,flet_storage_demo=info")
        }))
        .init();

    let paths = StoragePaths::from_env().context("Failed to resolve storage roots")?;
    tracing::info!("Data root: {}", paths.data_dir().display());
    tracing::info!("Temp root: {}", paths.temp_dir().display());

    let storage = FileStorage::open(paths, StorageOptions::default())
        .context("Failed to open storage")?;

    let overwrite = SaveOptions::new().overwrite(true);
    storage.save_file("hello.txt", "Hello, Flet FileSystem!", overwrite)?;
    storage.save_file(
        "data.json",
        json!({"name": "Flet", "type": "Framework", "version": 0.28}),
        overwrite,
    )?;
    storage.save_file(
        "session.bin",
        vec![0x46u8, 0x4c, 0x45, 0x54, 0x00, 0xff],
        overwrite.root(StorageRoot::Temporary).encrypt(true),
    )?;

    println!("== Files");
    print!("{}", format_listing(&storage.list_files(RootScope::Both, false)?));

    println!("== Contents");
    let plain = ReadOptions::new().decrypt(false);
    if let Content::Text(text) = storage.read_file("hello.txt", plain)? {
        println!("hello.txt: {}", text);
    }
    let app = storage.read_file("data.json", plain)?;
    if let Some(value) = app.as_json() {
        println!("data.json: {}", value);
    }
    let session = storage.read_file(
        "session.bin",
        ReadOptions::new().root(StorageRoot::Temporary),
    )?;
    if let Some(bytes) = session.as_bytes() {
        println!("session.bin: {} bytes decrypted", bytes.len());
    }

    println!("== Search");
    let results = storage.search_many(
        ["hello.txt", "data.json", "missing.txt"],
        RootScope::Both,
        true,
    )?;
    print!("{}", format_search_results(&results));

    storage.delete_file("hello.txt", StorageRoot::Persistent)?;
    println!("== After deleting hello.txt");
    print!(
        "{}",
        format_listing(&storage.list_files(RootScope::Persistent, false)?)
    );

    Ok(())
}
