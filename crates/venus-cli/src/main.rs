use clap::{Parser, Subcommand};
use tracing::info;

use venus_core::config::{default_config_path, VenusConfig};
use venus_protocol::extensions::Extension;
use venus_transport::RendererConnection;

#[derive(Parser)]
#[command(name = "vn")]
#[command(about = "Venus renderer diagnostics")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<String>,

    /// Renderer socket path (overrides the config file)
    #[arg(short, long)]
    socket: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect, run the capability handshake, and print what was agreed
    Info,

    /// Measure handshake round-trip latency
    Ping {
        /// Number of round trips
        #[arg(short = 'n', long, default_value_t = 4)]
        count: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    venus_common::init_logging();

    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(default_config_path);
    let config = VenusConfig::load_or_default(&config_path);
    let socket = cli.socket.unwrap_or(config.renderer.socket_path);

    match cli.command {
        Commands::Info => {
            info!("connecting to renderer at {}", socket);
            let conn = RendererConnection::connect(&socket).await?;
            let caps = conn.capabilities();

            println!("Renderer at {}", socket);
            println!(
                "  wire format:    {}",
                caps.wire_format_version
            );
            println!(
                "  vk.xml version: {}.{}.{}",
                caps.vk_xml_version >> 22,
                (caps.vk_xml_version >> 12) & 0x3ff,
                caps.vk_xml_version & 0xfff
            );
            println!(
                "  serialization:  spec version {}",
                caps.vk_ext_command_serialization_spec_version
            );
            println!("  negotiated extensions:");
            for ext in caps.extensions.iter() {
                println!("    {}", ext.name());
            }
            let missing: Vec<Extension> = Extension::all()
                .filter(|ext| !caps.extensions.contains(*ext))
                .collect();
            if !missing.is_empty() {
                println!("  not offered by the renderer:");
                for ext in missing {
                    println!("    {}", ext.name());
                }
            }
        }

        Commands::Ping { count } => {
            for i in 0..count {
                let start = std::time::Instant::now();
                let conn = RendererConnection::connect(&socket).await?;
                let elapsed = start.elapsed();
                println!(
                    "handshake {}: wire format {} in {:.2?}",
                    i + 1,
                    conn.capabilities().wire_format_version,
                    elapsed
                );
            }
        }
    }

    Ok(())
}
