use anyhow::{bail, Context};
use camsweep::{
    command::{brand_token, CameraCommand, CommandDispatcher},
    config::ScanConfig,
    device::{Credentials, DeviceRecord},
    output::ScanReport,
    scanner::{ScanEvent, ScanOrchestrator},
};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "camsweep", version, about = "LAN camera discovery and control")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sweep the local /24 for camera endpoints
    Scan {
        /// Three-octet subnet prefix, e.g. 192.168.1 (derived from the
        /// local interface when omitted)
        #[arg(long)]
        subnet: Option<String>,

        /// Concurrent host probes
        #[arg(long)]
        workers: Option<usize>,

        /// Comma-separated port list overriding the built-in camera ports
        #[arg(long, value_delimiter = ',')]
        ports: Option<Vec<u16>>,

        /// Try admin/admin against endpoints that answer 401
        #[arg(long)]
        try_default_creds: bool,

        /// Emit the final report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Send a control command to a camera endpoint
    Ctl {
        /// Target endpoint as address:port
        #[arg(long)]
        target: String,

        /// Brand hint (e.g. hikvision, dahua); generic table when omitted
        #[arg(long)]
        brand: Option<String>,

        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        password: Option<String>,

        /// Logical command: ptz_left, ptz_right, ptz_up, ptz_down,
        /// ptz_stop, zoom_in, zoom_out, snapshot, reboot
        command: String,
    },
}

fn print_banner() {
    println!();
    println!("{}", "  ___ __ _ _ __ ___  _____      _____  ___ _ __   ".bright_cyan().bold());
    println!("{}", " / __/ _` | '_ ` _ \\/ __\\ \\ /\\ / / _ \\/ _ \\ '_ \\  ".bright_cyan().bold());
    println!("{}", "| (_| (_| | | | | | \\__ \\\\ V  V /  __/  __/ |_) | ".bright_cyan().bold());
    println!("{}", " \\___\\__,_|_| |_| |_|___/ \\_/\\_/ \\___|\\___| .__/  ".bright_cyan().bold());
    println!("{}", "                                          |_|     ".bright_cyan().bold());
    println!("{}", "LAN camera discovery & control".dimmed());
    println!();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            subnet,
            workers,
            ports,
            try_default_creds,
            json,
        } => {
            let mut config = ScanConfig::load_default_config();
            if let Some(subnet) = subnet {
                config.subnet = Some(subnet);
            }
            if let Some(workers) = workers {
                config.workers = workers;
            }
            if let Some(ports) = ports {
                config.ports = ports;
            }
            if try_default_creds {
                config.try_default_credentials = true;
            }

            if !json {
                print_banner();
            }
            run_scan(config, json).await
        }
        Commands::Ctl {
            target,
            brand,
            username,
            password,
            command,
        } => run_ctl(target, brand, username, password, command).await,
    }
}

async fn run_scan(config: ScanConfig, json: bool) -> anyhow::Result<()> {
    let subnet_label = config.subnet.clone().unwrap_or_else(|| {
        camsweep::scanner::local_ipv4()
            .map(|ip| {
                let [a, b, c, _] = ip.octets();
                format!("{}.{}.{}", a, b, c)
            })
            .unwrap_or_else(|_| "?".to_string())
    });

    let orchestrator = Arc::new(ScanOrchestrator::new(config)?);
    let mut events = orchestrator
        .start_scan()
        .await?
        .context("a scan is already active")?;

    // Ctrl-C cancels cooperatively; the completion event still fires
    {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                orchestrator.stop_scan();
            }
        });
    }

    let progress = if json {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(254);
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
                .expect("static template"),
        );
        bar
    };

    let start = Instant::now();
    let mut summary = None;

    while let Some(event) = events.recv().await {
        match event {
            ScanEvent::Discovery(device) => {
                if !json {
                    progress.println(format!(
                        "{} {}",
                        "FOUND:".bright_green().bold(),
                        device.display_name()
                    ));
                }
            }
            ScanEvent::Progress { scanned, total, current } => {
                progress.set_length(total as u64);
                progress.set_position(scanned as u64);
                progress.set_message(current);
            }
            ScanEvent::Complete { scanned, total, cancelled, .. } => {
                summary = Some((scanned, total, cancelled));
                break;
            }
        }
    }
    progress.finish_and_clear();

    let (scanned, total, cancelled) = summary.context("scan ended without a completion event")?;
    let devices = orchestrator.registry().all().await;
    let report = ScanReport::new(subnet_label, scanned, total, cancelled, start.elapsed(), devices);

    if json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render_text());
    }

    Ok(())
}

async fn run_ctl(
    target: String,
    brand: Option<String>,
    username: Option<String>,
    password: Option<String>,
    command: String,
) -> anyhow::Result<()> {
    let (address, port) = target
        .split_once(':')
        .context("target must be address:port")?;
    let address: Ipv4Addr = address.parse().context("invalid target address")?;
    let port: u16 = port.parse().context("invalid target port")?;
    let command: CameraCommand = command
        .parse()
        .with_context(|| format!("unknown command; expected one of: {}",
            CameraCommand::ALL.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(", ")))?;

    let mut device = DeviceRecord::network(address, port, "/");
    device.brand = brand;
    if let (Some(username), Some(password)) = (username, password) {
        device.credentials = Some(Credentials::new(username, password));
    }

    let dispatcher = CommandDispatcher::new(&ScanConfig::default())?;
    let token = brand_token(device.brand.as_deref());
    println!(
        "Dispatching {} to {} via {} table...",
        command.to_string().bold(),
        device.id.cyan(),
        token
    );

    if dispatcher.send_command(&device, command).await {
        println!("{}", "Command accepted.".green().bold());
        Ok(())
    } else {
        bail!("command failed or unsupported");
    }
}
