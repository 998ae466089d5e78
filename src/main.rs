use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use plinks::utils::logging;
use plinks::views::{ActionOutcome, CreateForm, CreateView, HomeView, NavView, PayView, StatusView, ViewState};
use plinks::{
    AppConfig, Asset, ChainProvider, ConnectOutcome, LinkCodec, LocalWalletProvider, PaymentGateway,
    PaymentRequest, RequestId, RpcProvider, SessionManager, WalletProvider,
};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "plinks", about = "Shareable payment links for Polkadot Asset Hub", version)]
struct Cli {
    /// JSON config file; defaults apply to missing keys.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// File holding the hex private key used as the wallet.
    #[arg(long, global = true)]
    key_file: Option<PathBuf>,
    /// Print debug logs to stderr.
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the landing screen.
    Home,
    /// Build a payment link offline.
    Link(LinkArgs),
    /// Decode a payment link and print it as JSON.
    Decode { link: String },
    /// Register a request on-chain and print its payment link.
    Create(RequestArgs),
    /// Pay the request a payment link describes.
    Pay { link: String },
    /// Look up a request by id or status link.
    Status { target: String },
}

#[derive(Args)]
struct RequestArgs {
    #[arg(long)]
    recipient: String,
    #[arg(long)]
    amount: String,
    #[arg(long, default_value = "DOT")]
    asset: Asset,
    #[arg(long, default_value = "")]
    memo: String,
}

#[derive(Args)]
struct LinkArgs {
    #[command(flatten)]
    request: RequestArgs,
    #[arg(long)]
    request_id: Option<RequestId>,
}

/// Application root: owns the session and lends it to the views
struct App {
    config: AppConfig,
    codec: LinkCodec,
    gateway: PaymentGateway,
    session: SessionManager,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.debug {
        logging::enable_debug();
    }

    let config = AppConfig::load(cli.config.as_deref())?;
    let codec = LinkCodec::new(&config.origin)?;

    match cli.command {
        Commands::Home => {
            print!("{}", HomeView::new().render_text());
            Ok(())
        }
        Commands::Link(args) => {
            let mut request = to_request(args.request);
            request.validate()?;
            if let Some(id) = args.request_id {
                request = request.with_request_id(id);
            }
            println!("{}", codec.encode(&request)?);
            Ok(())
        }
        Commands::Decode { link } => {
            let request = codec.decode(&link)?;
            print_json(&request)
        }
        Commands::Create(args) => {
            let mut app = App::start(config, codec, cli.key_file).await?;
            app.create(to_request(args)).await
        }
        Commands::Pay { link } => {
            let mut app = App::start(config, codec, cli.key_file).await?;
            app.pay(&link).await
        }
        Commands::Status { target } => {
            let mut app = App::start(config, codec, cli.key_file).await?;
            app.status(&target).await
        }
    }
}

impl App {
    async fn start(config: AppConfig, codec: LinkCodec, key_file: Option<PathBuf>) -> Result<Self> {
        let rpc = Arc::new(RpcProvider::from_config(&config)?);

        let wallet: Option<Arc<dyn WalletProvider>> = match key_file {
            Some(path) => {
                let key = fs::read_to_string(&path)
                    .with_context(|| format!("reading key file {}", path.display()))?;
                let wallet: Arc<dyn WalletProvider> =
                    Arc::new(LocalWalletProvider::from_key_hex(&key, config.chain_id, rpc.clone())?);
                Some(wallet)
            }
            None => None,
        };

        match rpc.chain_id().await {
            Ok(id) if id != config.chain_id => {
                plinks::log_warn!("app", "endpoint chain id differs from config", expected = config.chain_id, actual = id);
            }
            Ok(_) => {}
            Err(e) => plinks::log_warn!("app", "could not read chain id", error = e),
        }

        let gateway = PaymentGateway::from_config(&config)?;
        let mut session = SessionManager::new(wallet);
        session.restore().await;

        Ok(Self {
            config,
            codec,
            gateway,
            session,
        })
    }

    async fn create(&mut self, request: PaymentRequest) -> Result<()> {
        let mut view = CreateView::new(self.codec.clone()).with_form(CreateForm {
            recipient: request.recipient,
            amount: request.amount,
            asset: request.asset,
            memo: request.memo,
        });

        if let ActionOutcome::ConnectAttempted(outcome) = view.submit(&mut self.session, &self.gateway).await {
            connected(outcome)?;
            self.show_nav();
            view.submit(&mut self.session, &self.gateway).await;
        }
        if let Some(reason) = view.state().success().and_then(|g| g.request_id.degraded_reason()) {
            eprintln!("Warning: request not registered on-chain, link has no request id ({})", reason);
        }
        finish(view.state())
    }

    async fn pay(&mut self, link: &str) -> Result<()> {
        let mut view = PayView::open(&self.codec, link);
        if let Some(request) = view.request() {
            eprintln!("Paying {} {} to {}", request.amount, request.asset, request.recipient);
            if !request.memo.is_empty() {
                eprintln!("Memo: {}", request.memo);
            }
        }

        if let ActionOutcome::ConnectAttempted(outcome) = view.confirm(&mut self.session, &self.gateway).await {
            connected(outcome)?;
            self.show_nav();
            view.confirm(&mut self.session, &self.gateway).await;
        }
        let completion = view.state().success().and_then(|c| c.completion.as_ref());
        if let Some(reason) = completion.and_then(|outcome| outcome.degraded_reason()) {
            eprintln!("Warning: payment sent but the request was not marked completed ({})", reason);
        }
        finish(view.state())
    }

    async fn status(&mut self, target: &str) -> Result<()> {
        let mut view = if target.contains('/') {
            StatusView::open(&self.codec, target)
        } else {
            let mut view = StatusView::new();
            view.request_id = target.to_string();
            view
        };

        if !view.auto_lookup(&self.session, &self.gateway).await {
            if let ActionOutcome::ConnectAttempted(outcome) = view.submit(&mut self.session, &self.gateway).await {
                connected(outcome)?;
                self.show_nav();
                view.auto_lookup(&self.session, &self.gateway).await;
            }
        }

        if let Some(report) = view.state().success() {
            eprintln!("{}: {}", report.status(), report.message());
        }
        finish(view.state())
    }

    fn show_nav(&self) {
        let nav = NavView::render(&self.session);
        if let Some(account) = nav.account {
            eprintln!("Connected {} on chain {}", account, self.config.chain_id);
        }
    }
}

fn to_request(args: RequestArgs) -> PaymentRequest {
    PaymentRequest::new(args.recipient, args.amount, args.asset, args.memo)
}

fn connected(outcome: ConnectOutcome) -> Result<()> {
    match outcome {
        ConnectOutcome::Connected(_) => Ok(()),
        ConnectOutcome::WalletUnavailable(prompt) => bail!("{} (pass --key-file)", prompt),
        ConnectOutcome::Failed(e) => Err(anyhow!(e).context("wallet connection failed")),
    }
}

fn finish<T: Serialize>(state: &ViewState<T>) -> Result<()> {
    match state {
        ViewState::Success(value) => print_json(value),
        ViewState::Error(message) => bail!("{}", message),
        ViewState::Idle | ViewState::Loading => bail!("action did not complete"),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
