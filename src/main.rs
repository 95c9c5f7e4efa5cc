use std::env;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use curbside::api::RenderMode;
use curbside::console::MapConsole;
use curbside::display::TraceDisplay;
use curbside::event;
use curbside::external::bin_service::BinService;
use curbside::external::directions::Directions;
use curbside::external::geolocation::EnvLocation;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let mode = match env::var("CURBSIDE_MODE").as_deref() {
        Ok("admin") => RenderMode::Admin,
        _ => RenderMode::ReadOnly,
    };

    tracing::info!(?mode, "starting console");

    let mut console = MapConsole::new(
        Arc::new(BinService),
        Arc::new(Directions),
        Arc::new(TraceDisplay),
        mode,
    );

    console.locate(&EnvLocation).await.unwrap();

    let (tx, rx) = async_channel::unbounded();

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while let Ok(Some(line)) = lines.next_line().await {
            match event::parse_command(&line) {
                Some(event) => {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                None => tracing::warn!(command = %line, "unrecognized command"),
            }
        }
    });

    while let Ok(event) = rx.recv().await {
        if let Err(err) = console.handle(event).await {
            tracing::warn!(code = err.code, message = %err.message, "command failed");
        }
    }
}
