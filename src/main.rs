//! Gaze session service: tracking and calibration behind an HTTP control API.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use gaze_session::{
    api,
    config::{Config, EXAMPLE_CONFIG},
    engine::{CameraSource, GazeEngine, ReplayEngine, SyntheticCameraSource},
    geometry::ScreenSize,
    session::{SessionController, StartOutcome},
};
use log::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Gaze engine (replay:<file>, or pointer with the x11 feature)
    #[arg(short, long)]
    engine: Option<String>,

    /// Camera (synthetic, or a device index with the opencv feature)
    #[arg(long)]
    camera: Option<String>,

    /// Screen size as WIDTHxHEIGHT, or auto with the x11 feature
    #[arg(long)]
    screen: Option<String>,

    /// Address to bind the control API to
    #[arg(long)]
    host: Option<String>,

    /// Port for the control API
    #[arg(short, long)]
    port: Option<u16>,

    /// Start tracking as soon as the server is up
    #[arg(long)]
    autostart: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Print an example configuration file and exit
    #[arg(long)]
    print_config: bool,
}

fn parse_screen(value: &str) -> Result<ScreenSize> {
    if value == "auto" {
        return discover_screen();
    }
    let (width, height) = value
        .split_once(['x', 'X'])
        .with_context(|| format!("Screen size must look like 1920x1080, got {value}"))?;
    let width: f64 = width.trim().parse().context("Invalid screen width")?;
    let height: f64 = height.trim().parse().context("Invalid screen height")?;
    Ok(ScreenSize::new(width, height))
}

#[cfg(feature = "x11")]
fn discover_screen() -> Result<ScreenSize> {
    Ok(gaze_session::engine::pointer::discover_screen_size()?)
}

#[cfg(not(feature = "x11"))]
fn discover_screen() -> Result<ScreenSize> {
    bail!("Screen discovery requires the x11 feature")
}

fn create_engine(spec: &str) -> Result<Box<dyn GazeEngine>> {
    if let Some(path) = spec.strip_prefix("replay:") {
        info!("Loading gaze replay from: {}", path);
        return Ok(Box::new(ReplayEngine::from_file(path)?));
    }
    match spec {
        #[cfg(feature = "x11")]
        "pointer" => Ok(Box::new(gaze_session::engine::pointer::PointerEngine::new()?)),
        other => bail!("Unknown gaze engine: {other}"),
    }
}

fn create_camera_source(config: &Config) -> Result<Arc<dyn CameraSource>> {
    match config.camera.backend.as_str() {
        "synthetic" => Ok(Arc::new(SyntheticCameraSource::new(640, 480, config.camera.fps))),
        #[cfg(feature = "opencv")]
        "opencv" => Ok(Arc::new(gaze_session::engine::opencv_camera::OpenCvCameraSource::new(
            config.camera.index,
            config.camera.mirror,
        ))),
        other => bail!("Camera backend {other} is not available in this build"),
    }
}

fn apply_overrides(config: &mut Config, args: &Args) -> Result<()> {
    if let Some(camera) = &args.camera {
        if camera == "synthetic" {
            config.camera.backend = "synthetic".to_string();
        } else {
            config.camera.backend = "opencv".to_string();
            config.camera.index = camera
                .parse()
                .with_context(|| format!("Camera must be synthetic or a device index, got {camera}"))?;
        }
    }
    if let Some(screen) = &args.screen {
        let size = parse_screen(screen)?;
        config.screen.width = size.width;
        config.screen.height = size.height;
    }
    if let Some(host) = &args.host {
        config.server.host.clone_from(host);
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install CTRL+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Received shutdown signal");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    if args.print_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Gaze session service v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration if provided
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path);
            Config::from_file(path).with_context(|| format!("Failed to load config file {path}"))?
        }
        None => Config::default(),
    };
    apply_overrides(&mut config, &args)?;
    config.validate()?;

    // The engine is required for anything useful; failing here is fatal
    let Some(engine_spec) = args.engine.as_deref() else {
        bail!("No gaze engine given; use --engine replay:<file>");
    };
    let engine = create_engine(engine_spec).context("Gaze engine initialization failed")?;
    let cameras = create_camera_source(&config)?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid bind address")?;
    let controller = SessionController::new(config, engine, cameras)?;

    if args.autostart {
        let starter = controller.clone();
        let outcome = tokio::task::spawn_blocking(move || starter.start_tracking()).await?;
        if outcome != StartOutcome::Started {
            warn!("Autostart did not start tracking: {}", outcome.as_str());
        }
    }

    let app = api::router(controller.clone());
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    let stopped = tokio::task::spawn_blocking(move || controller.shutdown(Duration::from_secs(5))).await?;
    if !stopped {
        warn!("Worker loops did not stop in time");
    }
    info!("Server shutdown complete");

    Ok(())
}
