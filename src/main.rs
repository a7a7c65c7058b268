use anyhow::Result;
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use reel_pipeline::api::runway::RunwayClient;
use reel_pipeline::batch::{BatchRunner, DEFAULT_BATCH_SIZE};
use reel_pipeline::drive::{DriveDownloader, DriveUploader};
use reel_pipeline::engagement::{DEFAULT_COMMENTS, DEFAULT_LIKES, EngagementBot};
use reel_pipeline::fetch::VideoFetcher;
use reel_pipeline::log::file_hook;
use reel_pipeline::media::MediaEditor;
use reel_pipeline::pacing::{TokioPacer, now_seed};
use reel_pipeline::{Config, Log, init};
use std::path::PathBuf;

/// Short-video pipeline: generate, edit, move to/from Drive, pace engagement.
#[derive(Parser, Debug)]
#[command(name = "reel-pipeline", version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a batch of videos and download them
    Generate {
        #[arg(short, long, default_value_t = DEFAULT_BATCH_SIZE)]
        count: usize,
    },
    /// Run the fixed ffmpeg filter chain over every generated video
    Edit,
    /// Download every video in the configured Drive folder
    DriveDownload {
        /// Defaults to the generated videos directory
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Upload edited videos to the configured Drive folder
    DriveUpload {
        /// Defaults to the edited videos directory
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Paced like/comment loop for one fanpage
    Engage {
        #[arg(long)]
        fanpage: u32,
        #[arg(long, default_value_t = DEFAULT_LIKES)]
        likes: usize,
        #[arg(long, default_value_t = DEFAULT_COMMENTS)]
        comments: usize,
    },
}

impl Commands {
    fn log_file(&self) -> &'static str {
        match self {
            Commands::Generate { .. } => "generation.log",
            Commands::Edit => "editing.log",
            Commands::DriveDownload { .. } | Commands::DriveUpload { .. } => "drive.log",
            Commands::Engage { .. } => "engagement.log",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    // .env is optional; real environment variables win.
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let cfg = Config::from_env();
    let log = Log::new().with_hook(file_hook(&cfg.logs_dir.join(args.command.log_file()))?);

    init::ensure_directories(&cfg, &log).await?;

    match args.command {
        Commands::Generate { count } => generate(&cfg, &log, count).await,
        Commands::Edit => edit(&cfg, &log).await,
        Commands::DriveDownload { dir } => {
            log.banner("DRIVE DOWNLOAD - starting");
            let downloader = DriveDownloader::new(&cfg, log.clone())?;
            let dir = dir.unwrap_or_else(|| cfg.generated_dir.clone());
            downloader.download_videos(&dir).await?;
            log.ok("Download complete");
            Ok(())
        }
        Commands::DriveUpload { dir } => {
            log.banner("DRIVE UPLOAD - starting");
            let uploader = DriveUploader::new(&cfg, log.clone())?;
            let dir = dir.unwrap_or_else(|| cfg.edited_dir.clone());
            uploader.upload_videos(&dir).await;
            log.ok("Upload complete");
            Ok(())
        }
        Commands::Engage {
            fanpage,
            likes,
            comments,
        } => {
            log.banner(format!("ENGAGEMENT BOT - FANPAGE {}", fanpage));
            let pacer = TokioPacer;
            let rng = StdRng::seed_from_u64(now_seed());
            let mut bot = EngagementBot::new(&cfg, fanpage, &pacer, rng, log.clone())?;
            bot.run_likes(likes).await;
            bot.run_comments(comments).await;
            log.ok(format!("Bot completed for fanpage {}", bot.fanpage()));
            Ok(())
        }
    }
}

async fn generate(cfg: &Config, log: &Log, count: usize) -> Result<()> {
    log.banner("Starting video generation");

    let result = tokio::select! {
        res = run_batch(cfg, log, count) => res,
        _ = tokio::signal::ctrl_c() => {
            log.warn("Interrupted by user");
            Ok(())
        }
    };
    if let Err(err) = &result {
        log.error(format!("Fatal error: {:#}", err));
    }

    log.banner("Process finished");
    result
}

async fn run_batch(cfg: &Config, log: &Log, count: usize) -> Result<()> {
    let runway = RunwayClient::new(cfg, log.clone())?;
    let fetcher = VideoFetcher::new(&cfg.generated_dir, log.clone());
    log.ok("Video generator initialised");
    log.info(format!("Output directory: {}", fetcher.output_dir().display()));

    let pacer = TokioPacer;
    let mut runner = BatchRunner::new(
        &runway,
        &fetcher,
        &pacer,
        &cfg.logs_dir,
        StdRng::seed_from_u64(now_seed()),
        log.clone(),
    );
    let report = runner.run(count).await?;

    if report.results.is_empty() {
        log.warn("No videos were generated");
    } else {
        log.ok(format!("Videos generated: {}", report.results.len()));
        log.info(format!("Location: {}", cfg.generated_dir.display()));
    }
    Ok(())
}

async fn edit(cfg: &Config, log: &Log) -> Result<()> {
    if !init::check_ffmpeg(&cfg.ffmpeg_bin).await {
        log.warn(format!("{} not found in PATH. Please install FFmpeg.", cfg.ffmpeg_bin));
    }

    let editor = MediaEditor::new(
        cfg.ffmpeg_bin.clone(),
        cfg.generated_dir.clone(),
        cfg.edited_dir.clone(),
        log.clone(),
    );
    let summary = editor.process_all().await?;
    if summary.failed > 0 {
        log.warn(format!("{}/{} edits could not run", summary.failed, summary.invoked));
    }
    Ok(())
}
