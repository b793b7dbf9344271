//! Subcommands operating on the configured blob store.

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Subcommand;
use gridslot_field::RecordKey;
use gridslot_store::{BlobId, BlobStore, Content};
use tokio::fs::File;
use tokio::io::{self, AsyncWriteExt};

use crate::TRACING_TARGET_COMMAND;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store a local file and print its identifier.
    Put {
        /// File to upload.
        file: PathBuf,

        /// Name to store the blob under (defaults to the file name).
        #[arg(long)]
        name: Option<String>,

        /// MIME content-type to record.
        #[arg(long)]
        content_type: Option<String>,

        /// Image width in pixels.
        #[arg(long, requires = "height")]
        width: Option<u32>,

        /// Image height in pixels.
        #[arg(long, requires = "width")]
        height: Option<u32>,

        /// Read the whole file into memory and write it in a single call.
        #[arg(long)]
        buffered: bool,
    },

    /// Write a blob's content to a file or stdout.
    Get {
        id: BlobId,

        /// Destination file (stdout when omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print a blob's metadata as JSON.
    Stat { id: BlobId },

    /// Exit with status 0 if the blob exists, 1 otherwise.
    Exists { id: BlobId },

    /// List stored filenames.
    Ls,

    /// Delete a blob.
    Rm { id: BlobId },

    /// Print a blob's retrieval URL.
    Url {
        id: BlobId,

        /// Owner record as `kind/model/id`.
        #[arg(long, value_parser = parse_owner)]
        owner: Option<RecordKey>,
    },
}

impl Command {
    pub async fn execute(self, store: &BlobStore) -> anyhow::Result<()> {
        match self {
            Self::Put {
                file,
                name,
                content_type,
                width,
                height,
                buffered,
            } => {
                let name = match name {
                    Some(name) => name,
                    None => file
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .context("cannot derive a blob name from the path")?,
                };

                let mut content = if buffered {
                    let data = tokio::fs::read(&file)
                        .await
                        .with_context(|| format!("failed to read {}", file.display()))?;
                    Content::from_bytes(data)
                } else {
                    let reader = File::open(&file)
                        .await
                        .with_context(|| format!("failed to open {}", file.display()))?;
                    Content::from_reader(reader)
                };
                if let Some(content_type) = content_type {
                    content = content.with_content_type(content_type);
                }
                if let (Some(width), Some(height)) = (width, height) {
                    content = content.with_dimensions(width, height);
                }

                let id = store.save(&name, content).await?;
                tracing::info!(target: TRACING_TARGET_COMMAND, %id, name = %name, "Stored blob");
                println!("{id}");
            }
            Self::Get { id, output } => {
                let handle = store.read(&id).await?;
                let mut reader = handle.into_reader();
                match output {
                    Some(path) => {
                        let mut file = File::create(&path)
                            .await
                            .with_context(|| format!("failed to create {}", path.display()))?;
                        io::copy(&mut reader, &mut file).await?;
                        file.flush().await?;
                    }
                    None => {
                        let mut stdout = io::stdout();
                        io::copy(&mut reader, &mut stdout).await?;
                        stdout.flush().await?;
                    }
                }
            }
            Self::Stat { id } => {
                let info = store.info(&id).await?;
                println!("{}", serde_json::to_string_pretty(&info)?);
            }
            Self::Exists { id } => {
                if !store.exists(&id).await? {
                    bail!("blob {id} does not exist");
                }
                println!("true");
            }
            Self::Ls => {
                for filename in store.listdir().await? {
                    println!("{filename}");
                }
            }
            Self::Rm { id } => {
                store.delete(&id).await?;
                tracing::info!(target: TRACING_TARGET_COMMAND, %id, "Deleted blob");
            }
            Self::Url { id, owner } => {
                println!("{}", store.url(&id, owner.as_ref().map(RecordKey::owner)));
            }
        }

        Ok(())
    }
}

fn parse_owner(value: &str) -> Result<RecordKey, String> {
    RecordKey::parse(value).ok_or_else(|| format!("expected kind/model/id, got '{value}'"))
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use gridslot_store::StoreConfig;

    use super::*;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(subcommand)]
        command: Command,
    }

    fn parse(args: &[&str]) -> Command {
        Harness::try_parse_from(std::iter::once("gridslot").chain(args.iter().copied()))
            .unwrap()
            .command
    }

    #[test]
    fn owner_must_have_three_parts() {
        let id = BlobId::generate().to_string();
        let command = parse(&["url", &id, "--owner", "app/document/7"]);
        assert!(matches!(command, Command::Url { owner: Some(_), .. }));

        let err = Harness::try_parse_from(["gridslot", "url", &id, "--owner", "app/document"]);
        assert!(err.is_err());
    }

    #[test]
    fn width_requires_height() {
        let err = Harness::try_parse_from(["gridslot", "put", "a.png", "--width", "10"]);
        assert!(err.is_err());
    }

    #[test]
    fn malformed_id_is_rejected() {
        let err = Harness::try_parse_from(["gridslot", "stat", "not-an-id"]);
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn put_get_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        tokio::fs::write(&path, b"hello").await.unwrap();
        let store = StoreConfig::memory("fs").open().await.unwrap();

        let put = parse(&["put", path.to_str().unwrap(), "--content-type", "text/plain"]);
        put.execute(&store).await.unwrap();
        assert_eq!(store.listdir().await.unwrap(), vec!["notes.txt"]);

        let id = store
            .save("copy.txt", Content::from_bytes("hello"))
            .await
            .unwrap()
            .to_string();
        let output = dir.path().join("copy.txt");
        let get = parse(&["get", &id, "--output", output.to_str().unwrap()]);
        get.execute(&store).await.unwrap();
        assert_eq!(tokio::fs::read(&output).await.unwrap(), b"hello");

        parse(&["rm", &id]).execute(&store).await.unwrap();
        assert!(parse(&["exists", &id]).execute(&store).await.is_err());
    }
}
