//! UCC Wallet CLI
//!
//! Terminal front end over the wallet core: create or import the identity,
//! show both address formats, query balances and send UCC.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zeroize::Zeroizing;

use ucc_wallet::account::{
    decode_any, to_alt_format_with_hrp, to_eth_format, Identity, IdentityStore, JsonFileIdentityStore,
};
use ucc_wallet::crypto::{confirm_mnemonic, generate_mnemonic, MnemonicStrength};
use ucc_wallet::transaction::{
    BalanceReader, BroadcastOutcome, ChainClient, HttpTransport, SendFlow, SendReceipt, SendState,
    Transport, TransactionFinalStatus,
};
use ucc_wallet::{Error, WalletConfig};

#[derive(Parser)]
#[command(name = "ucc-wallet")]
#[command(about = "UCC wallet: one key, an 0x address and a ucc1 address")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Identity file path
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Node REST endpoint override
    #[arg(long)]
    lcd_url: Option<String>,

    /// Chain id override
    #[arg(long)]
    chain_id: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Words {
    #[value(name = "12")]
    Twelve,
    #[value(name = "24")]
    TwentyFour,
}

impl From<Words> for MnemonicStrength {
    fn from(words: Words) -> Self {
        match words {
            Words::Twelve => MnemonicStrength::Words12,
            Words::TwentyFour => MnemonicStrength::Words24,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new identity and store it
    Generate {
        /// Phrase length
        #[arg(long, value_enum, default_value = "24")]
        words: Words,
        /// Ask for the phrase back before storing the identity
        #[arg(long)]
        confirm: bool,
    },
    /// Import an identity from a seed phrase read on stdin
    Import,
    /// Import an identity from a hex private key read on stdin
    ImportKey,
    /// Show the stored identity's addresses and balance
    Show,
    /// Print an address in both formats
    Convert { address: String },
    /// Show the balance of an address (defaults to the stored identity)
    Balance { address: Option<String> },
    /// Send UCC to an address in either format
    Send {
        to: String,
        /// Amount in UCC, e.g. 1.5
        amount: String,
        #[arg(long, default_value = "")]
        memo: String,
        /// Seconds to wait for inclusion; 0 returns after broadcast
        #[arg(long, default_value_t = 0)]
        wait: u64,
    },
    /// Query a transaction once
    Status { tx_hash: String },
    /// Delete the stored identity
    Forget,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let mut config = WalletConfig::from_env().context("Failed to load configuration")?;
    if let Some(url) = &cli.lcd_url {
        config.provider.url = url.clone();
    }
    if let Some(chain_id) = &cli.chain_id {
        config.chain_id = chain_id.clone();
    }
    config.validate()?;
    debug!(chain_id = %config.chain_id, url = %config.provider.url, "Configuration loaded");

    let store = JsonFileIdentityStore::new(store_path(&cli), config.hrp.clone());

    match &cli.command {
        Commands::Generate { words, confirm } => {
            let strength = MnemonicStrength::from(*words);
            let phrase = generate_mnemonic(strength)?;
            let identity = Identity::from_seed_phrase_with_hrp(&phrase, &config.hrp)?;

            println!("Seed phrase (write it down, it is shown only once):");
            println!("{}", phrase.as_str());
            println!();

            if *confirm {
                let entered = read_secret(&format!("Re-enter the {} words to continue:", strength.word_count()))?;
                confirm_mnemonic(&phrase, &entered)?;
            }

            store.save(&identity)?;
            print_identity(&identity);
        }
        Commands::Import => {
            let phrase = read_secret("Enter seed phrase:")?;
            let identity = Identity::from_seed_phrase_with_hrp(&phrase, &config.hrp)?;
            store.save(&identity)?;
            info!(chain_address = %identity.chain_address(), "Imported identity from seed phrase");
            print_identity(&identity);
        }
        Commands::ImportKey => {
            let key = read_secret("Enter private key (hex):")?;
            let identity = Identity::from_private_key_with_hrp(&key, &config.hrp)?;
            store.save(&identity)?;
            info!(chain_address = %identity.chain_address(), "Imported identity from private key");
            print_identity(&identity);
        }
        Commands::Show => {
            let identity = load_identity(&store)?;
            print_identity(&identity);

            // addresses are still useful when the node is unreachable
            match balance_reader(&config)?.get_balance(identity.chain_address()).await {
                Ok(balance) => println!("Balance:          {} {}", balance, config.display_denom),
                Err(e) => warn!(error = %e, "Balance unavailable"),
            }
        }
        Commands::Convert { address } => {
            let hash = decode_any(address, &config.hrp)?;
            println!("{}", to_eth_format(&hash));
            println!("{}", to_alt_format_with_hrp(&hash, &config.hrp)?);
        }
        Commands::Balance { address } => {
            let address = match address {
                Some(address) => address.clone(),
                None => load_identity(&store)?.chain_address().to_string(),
            };
            let balance = balance_reader(&config)?.get_balance(&address).await?;
            println!("{} {}", balance, config.display_denom);
        }
        Commands::Send {
            to,
            amount,
            memo,
            wait,
        } => {
            let identity = load_identity(&store)?;
            let flow = SendFlow::new(ChainClient::new(transport(&config)?), config.clone());

            let mut receipt = flow.send(&identity, to, amount, memo).await?;
            println!("{}", serde_json::to_string_pretty(&receipt)?);

            match receipt.state {
                SendState::Broadcast(BroadcastOutcome::Rejected) => bail!(
                    "Transaction rejected: {}",
                    receipt.result.error_detail.clone().unwrap_or_default()
                ),
                SendState::Broadcast(BroadcastOutcome::Unknown) => warn!(
                    tx_hash = %receipt.tx_hash,
                    "No answer from the node; the transaction may still land, check it with `status`"
                ),
                _ => {}
            }

            if *wait > 0 {
                let status = wait_for_inclusion(&flow, &mut receipt, *wait).await?;
                println!("{}", serde_json::to_string_pretty(&status)?);

                if receipt.state == SendState::Confirmed {
                    let balance = balance_reader(&config)?.get_balance(identity.chain_address()).await?;
                    println!("Balance: {} {}", balance, config.display_denom);
                }
            }
        }
        Commands::Status { tx_hash } => {
            let client = ChainClient::new(transport(&config)?);
            match client.poll_status(tx_hash).await {
                Ok(status) => println!("{}", serde_json::to_string_pretty(&status)?),
                Err(Error::StillPending(_)) => println!("pending"),
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Forget => {
            store.clear()?;
            warn!(path = %store.path().display(), "Stored identity removed");
        }
    }

    Ok(())
}

fn store_path(cli: &Cli) -> PathBuf {
    cli.store.clone().unwrap_or_else(|| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".ucc-wallet").join("identity.json")
    })
}

fn transport(config: &WalletConfig) -> Result<Arc<dyn Transport>> {
    Ok(Arc::new(HttpTransport::new(config.provider.clone())?))
}

fn balance_reader(config: &WalletConfig) -> Result<BalanceReader> {
    Ok(BalanceReader::from_config(transport(config)?, config))
}

fn load_identity(store: &JsonFileIdentityStore) -> Result<Identity> {
    store
        .load()?
        .with_context(|| format!("No identity stored at {}; run `generate` or `import` first", store.path().display()))
}

fn read_secret(prompt: &str) -> Result<Zeroizing<String>> {
    eprintln!("{}", prompt);
    let mut line = Zeroizing::new(String::new());
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(Zeroizing::new(line.trim().to_string()))
}

fn print_identity(identity: &Identity) {
    println!("Ethereum address: {}", identity.eth_address());
    println!("UCC address:      {}", identity.chain_address());
}

async fn wait_for_inclusion(
    flow: &SendFlow,
    receipt: &mut SendReceipt,
    wait_seconds: u64,
) -> Result<TransactionFinalStatus> {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(wait_seconds);

    loop {
        match flow.confirm(receipt).await {
            Ok(status) => return Ok(status),
            Err(Error::StillPending(_)) if tokio::time::Instant::now() < deadline => {
                debug!(tx_hash = %receipt.tx_hash, "Waiting for inclusion");
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
            Err(Error::StillPending(hash)) => bail!("Transaction {} not included after {}s", hash, wait_seconds),
            Err(e) => return Err(e.into()),
        }
    }
}
