use burnell::commands::{self, keys::ExportFormat, keys::FileFormat, token::CreateOptions};
use burnell::config::BurnellConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "burnell", version, about = "Burnell key and token CLI")]
struct Cli {
    /// Path to the configuration file (defaults to ./burnell.yaml if present)
    #[arg(long, global = true, env = "BURNELL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Key management (generate/export)
    Keys {
        #[command(subcommand)]
        cmd: KeysCommand,
    },

    /// Token management (create/verify/inspect)
    Token {
        #[command(subcommand)]
        cmd: TokenCommand,
    },
}

#[derive(Subcommand, Debug)]
enum KeysCommand {
    /// Generate a new RSA keypair.
    Generate {
        /// Modulus size in bits (defaults to token.key_bits from config)
        #[arg(long)]
        bits: Option<usize>,

        /// Directory to write private.key and public.key into; prints to stdout if omitted
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Encoding of the written key files
        #[arg(long, value_enum, default_value_t = FileFormat::Pem)]
        format: FileFormat,
    },

    /// Print an existing keypair as PEM or base64 DER.
    Export {
        #[arg(long)]
        private_key: Option<PathBuf>,

        #[arg(long)]
        public_key: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = ExportFormat::Pem)]
        format: ExportFormat,
    },
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
    /// Issue a token for a subject.
    Create {
        /// Subject (`sub` claim), e.g. a tenant or service name
        #[arg(long, short)]
        subject: String,

        /// Expiry such as 24h, 90m, 7d or 1y; 0 for a non-expiring token
        #[arg(long, short)]
        expiry: Option<String>,

        /// Signing algorithm, e.g. RS256 or PS512
        #[arg(long, short)]
        algorithm: Option<String>,

        #[arg(long)]
        private_key: Option<PathBuf>,

        #[arg(long)]
        public_key: Option<PathBuf>,

        /// File to write the token to; prints to stdout if omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Verify a token (inline or a file path).
    Verify {
        token: String,

        /// Require this subject
        #[arg(long, short)]
        subject: Option<String>,

        #[arg(long)]
        public_key: Option<PathBuf>,
    },

    /// Decode a token (inline or a file path) without verifying it.
    Inspect { token: String },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = BurnellConfig::load(cli.config.as_deref())?;

    match cli.cmd {
        Command::Keys { cmd } => match cmd {
            KeysCommand::Generate {
                bits,
                output,
                format,
            } => commands::keys::generate(bits.unwrap_or(config.token.key_bits), output, format)?,
            KeysCommand::Export {
                private_key,
                public_key,
                format,
            } => commands::keys::export(&config.keys, private_key, public_key, format)?,
        },

        Command::Token { cmd } => match cmd {
            TokenCommand::Create {
                subject,
                expiry,
                algorithm,
                private_key,
                public_key,
                output,
            } => commands::token::create(
                &config,
                CreateOptions {
                    subject,
                    expiry,
                    algorithm,
                    private_key,
                    public_key,
                    output,
                },
            )?,
            TokenCommand::Verify {
                token,
                subject,
                public_key,
            } => commands::token::verify(&config, public_key, token, subject)?,
            TokenCommand::Inspect { token } => commands::token::inspect(token)?,
        },
    }

    Ok(())
}
