//! # Tarjeta CLI
//!
//! Command-line interface for the card composer.
//!
//! ## Usage
//!
//! ```bash
//! # Run the save/view/export service
//! tarjeta serve --listen 0.0.0.0:8080 --data-dir ./data
//!
//! # Render a stored document to PNGs
//! tarjeta render card.json --out ./out
//!
//! # Export a contact file, PDF, or QR image
//! tarjeta export vcard card.json --out ada.vcf
//! tarjeta export pdf card.json --out ada.pdf
//! tarjeta export qr card.json --out ada-qr.png
//!
//! # Batch-export several documents into one zip
//! tarjeta batch a.json b.json c.json --out cards.zip
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use tarjeta::document::{CardDocument, Face};
use tarjeta::export::{
    RasterFormat, SnapshotOptions,
    archive::{self, BatchItem},
    pdf, qr, vcard,
};
use tarjeta::render::{self, ImageResolver};
use tarjeta::server::{ServerConfig, serve};
use tarjeta::sync::StateManager;
use tarjeta::TarjetaError;

/// Tarjeta - business card composer utility
#[derive(Parser, Debug)]
#[command(name = "tarjeta")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP save/view/export service
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8080")]
        listen: String,

        /// Directory for designs and uploads
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },

    /// Render a document's faces to image files
    Render {
        /// Path to a card document JSON file
        doc: PathBuf,

        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,

        /// Face to render: front, back, or both
        #[arg(long, default_value = "both")]
        face: String,

        /// Output format: png or jpeg
        #[arg(long, default_value = "png")]
        format: String,

        /// Output scale factor
        #[arg(long, default_value = "1.0")]
        scale: f64,
    },

    /// Export a document as a PDF, vCard, or QR image
    Export {
        /// What to export: pdf, vcard, or qr
        kind: String,

        /// Path to a card document JSON file
        doc: PathBuf,

        /// Output file path
        #[arg(long)]
        out: PathBuf,
    },

    /// Export several documents into one zip of face snapshots
    Batch {
        /// Card document JSON files
        docs: Vec<PathBuf>,

        /// Output zip path
        #[arg(long, default_value = "cards.zip")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load_doc(path: &PathBuf) -> Result<CardDocument, TarjetaError> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

async fn run() -> Result<(), TarjetaError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { listen, data_dir } => {
            serve(ServerConfig {
                listen_addr: listen,
                data_dir,
            })
            .await
        }

        Commands::Render {
            doc,
            out,
            face,
            format,
            scale,
        } => {
            let document = load_doc(&doc)?;
            let resolver = ImageResolver::new(".")?;
            let resolved = render::resolve_images(&document, &resolver).await;
            let options = SnapshotOptions {
                format: RasterFormat::parse(&format),
                scale,
            };

            std::fs::create_dir_all(&out)?;
            let faces: &[Face] = match face.as_str() {
                "front" => &[Face::Front],
                "back" => &[Face::Back],
                _ => &[Face::Front, Face::Back],
            };
            for f in faces {
                let img = render::render_face(&document, *f, &resolved);
                let bytes = tarjeta::export::encode_raster(&img, options)?;
                let name = match f {
                    Face::Front => format!("card-front.{}", options.format.extension()),
                    Face::Back => format!("card-back.{}", options.format.extension()),
                };
                let path = out.join(name);
                std::fs::write(&path, bytes)?;
                println!("Wrote {}", path.display());
            }
            Ok(())
        }

        Commands::Export { kind, doc, out } => {
            let document = load_doc(&doc)?;
            match kind.as_str() {
                "pdf" => {
                    let resolver = ImageResolver::new(".")?;
                    let resolved = render::resolve_images(&document, &resolver).await;
                    let (front, back) = render::render_card(&document, &resolved);
                    std::fs::write(&out, pdf::to_pdf(&front, &back)?)?;
                }
                "vcard" => {
                    std::fs::write(&out, vcard::to_vcard(&document))?;
                }
                "qr" => match qr::resolve_source(&document) {
                    qr::QrSource::Payload(payload) => {
                        std::fs::write(&out, qr::encode_png(&payload, 512)?)?;
                    }
                    _ => {
                        return Err(TarjetaError::Export(
                            "document has no QR payload to encode".to_string(),
                        ));
                    }
                },
                other => {
                    return Err(TarjetaError::Export(format!(
                        "unknown export kind '{other}' (expected pdf, vcard, or qr)"
                    )));
                }
            }
            println!("Wrote {}", out.display());
            Ok(())
        }

        Commands::Batch { docs, out } => {
            let mut items = Vec::new();
            for path in &docs {
                let name = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("card")
                    .to_string();
                items.push(BatchItem {
                    name,
                    doc: load_doc(path)?,
                });
            }

            let mut state = StateManager::in_memory();
            let resolver = ImageResolver::new(".")?;
            let (blob, report) =
                archive::export_batch(&mut state, &items, &resolver, SnapshotOptions::default())
                    .await?;
            std::fs::write(&out, blob)?;
            println!(
                "Wrote {} ({} exported, {} failed)",
                out.display(),
                report.exported.len(),
                report.failed.len()
            );
            for (name, reason) in &report.failed {
                println!("  failed: {name}: {reason}");
            }
            Ok(())
        }
    }
}
