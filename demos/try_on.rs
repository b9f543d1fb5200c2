//! Upload a garment and a person image, generate a try-on, and follow the
//! job until it finishes.
//!
//! Requires a running try-on service at http://127.0.0.1:5001 (or the URL in
//! `TRYON_ENDPOINT`).
//!
//! ```sh
//! RUST_LOG=tryon_client=debug cargo run --example try_on -- dress.jpg person.jpg
//! ```

use std::path::Path;
use tracing_subscriber::EnvFilter;
use tryon_client::{ClientConfig, ImagePayload, JobPhase, SlotRole, TryOnClient, TryOnSession};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(dress), Some(person)) = (args.next(), args.next()) else {
        eprintln!("usage: try_on <dress-image> <person-image>");
        return Ok(());
    };

    let mut builder = ClientConfig::builder();
    if let Ok(endpoint) = std::env::var("TRYON_ENDPOINT") {
        builder = builder.with_endpoint(endpoint);
    }
    let config = builder.build();
    let mut session = TryOnSession::from_config(&config);

    session.select_image(SlotRole::Primary, ImagePayload::from_path(Path::new(&dress))?);
    session.select_image(SlotRole::Secondary, ImagePayload::from_path(Path::new(&person))?);

    let uploaded = session.upload().await?;
    println!("Uploaded: {} / {}", uploaded.primary_url, uploaded.secondary_url);

    let job_id = session.generate().await?;
    println!("{}", session.jobs().view().message);

    let mut view = session.job_view();
    loop {
        let current = view.borrow_and_update().clone();
        if let Some(status) = &current.status {
            println!("Overall: {:?}", status.overall_status);
            for (stage, stage_status) in status.preprocessing.iter() {
                println!("  {:<20} {:?}", stage.label(), stage_status);
            }
        }
        if current.phase.is_terminal() {
            break;
        }
        if view.changed().await.is_err() {
            break;
        }
    }

    match session.jobs().phase() {
        JobPhase::Completed => {
            let client = TryOnClient::from_config(&config);
            let bytes = client.result_image(&job_id).await?;
            let out = format!("result_{}.jpg", job_id);
            std::fs::write(&out, &bytes)?;
            println!("Saved {} ({} bytes)", out, bytes.len());
        }
        JobPhase::Failed => eprintln!("Generation failed"),
        other => eprintln!("Stopped in phase {:?}", other),
    }

    Ok(())
}
