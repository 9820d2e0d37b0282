//! Console driver: plays the chat transport over stdin/stdout.
//!
//! Lines are read as user messages. `/upload <path>` attaches a local file,
//! `/quit` exits; `/start`, `/help` and `/begin` behave as in a chat.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::info;

use forecast_dialog::config::Settings;
use forecast_dialog::dialogue::{Attachment, Dialogue, Incoming, SessionId, Transport};
use forecast_dialog::plot::PlottersRenderer;
use forecast_dialog::{PipelineError, Result};

/// Conversational ARIMA forecasting on the console
#[derive(Parser, Debug)]
#[command(name = "forecast-dialog")]
#[command(about = "Upload a CSV, pick a column and request forecast plots")]
struct Args {
    /// Directory for uploads and rendered plots (overrides FORECAST_DIALOG_DATA_DIR)
    #[arg(long, short = 'd')]
    data_dir: Option<PathBuf>,

    /// Seed for forecast noise, for reproducible output
    #[arg(long, short = 's')]
    seed: Option<u64>,

    /// Largest accepted forecast period in days
    #[arg(long)]
    max_horizon: Option<usize>,
}

/// Writes everything the dialogue says to stdout.
struct ConsoleTransport<W> {
    out: W,
}

impl<W: Write> ConsoleTransport<W> {
    fn line(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{text}")?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> Transport for ConsoleTransport<W> {
    fn send_text(&mut self, _session: SessionId, text: &str) -> Result<()> {
        self.line(text)
    }

    fn offer_action(
        &mut self,
        _session: SessionId,
        text: &str,
        label: &str,
        _action: &str,
    ) -> Result<()> {
        self.line(&format!("{text}\n[{label}: /begin]"))
    }

    fn send_image(&mut self, _session: SessionId, path: &Path, caption: &str) -> Result<()> {
        self.line(&format!("[image] {caption}: {}", path.display()))
    }

    fn download(&mut self, attachment: &Attachment, dest: &Path) -> Result<()> {
        if Path::new(&attachment.file_id) != dest {
            std::fs::copy(&attachment.file_id, dest)?;
        }
        Ok(())
    }

    fn answer_action(&mut self, _session: SessionId, _action: &str) -> Result<()> {
        Ok(())
    }
}

fn settings(args: &Args) -> Result<Settings> {
    let mut settings = Settings::from_env()?;
    if let Some(dir) = &args.data_dir {
        settings = settings.with_data_dir(dir);
    }
    if let Some(seed) = args.seed {
        settings = settings.with_noise_seed(seed);
    }
    if let Some(max) = args.max_horizon {
        settings = settings.with_max_horizon(max);
    }
    settings.validate()?;
    Ok(settings)
}

fn parse_line(line: &str) -> Option<Incoming> {
    let line = line.trim();
    if line == "/quit" {
        return None;
    }
    Some(match line.strip_prefix("/upload") {
        Some(rest) => {
            let path = rest.trim();
            let file_name = Path::new(path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            Incoming::Document(Attachment {
                file_name,
                file_id: path.to_string(),
            })
        }
        None => Incoming::from_text(line),
    })
}

fn main() -> std::result::Result<(), PipelineError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forecast_dialog=info".into()),
        )
        .init();

    let args = Args::parse();
    let settings = settings(&args)?;
    info!(data_dir = %settings.data_dir.display(), "starting console dialogue");

    let session = SessionId(0);
    let transport = ConsoleTransport { out: io::stdout() };
    let mut dialogue = Dialogue::new(transport, PlottersRenderer::new(), settings);
    dialogue.process(session, Incoming::from_text("/start"));

    for line in io::stdin().lock().lines() {
        let Some(message) = parse_line(&line?) else {
            break;
        };
        dialogue.process(session, message);
    }

    info!("console dialogue finished");
    Ok(())
}
