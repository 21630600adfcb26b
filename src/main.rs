use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use parking_lot::Mutex;

use fluxstore::action::{AccountAction, AccountActionBuilder, AuthenticationActionBuilder};
use fluxstore::auth::{AccessToken, TokenRecord};
use fluxstore::config::Config;
use fluxstore::dispatcher::Dispatcher;
use fluxstore::logging::init_tracing;
use fluxstore::model::AccountModel;
use fluxstore::network::SimulatedNetwork;
use fluxstore::persistence::JsonFilePersistence;
use fluxstore::scheduler::TokioScheduler;
use fluxstore::store::{AccountCollaborators, AccountEvent, AccountStore, EmitsChanges};

#[derive(Debug, Parser)]
#[command(name = "fluxstore", about = "Account store driven by a unidirectional dispatcher")]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Authenticate, then fetch the account and wait for it to settle
    Session(SessionArgs),
    /// Print the persisted account
    Show,
    /// Drop the persisted account and token
    SignOut,
}

#[derive(Debug, Args)]
struct SessionArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    password: String,
}

struct App {
    // Owns the worker threads the network and scheduler run on.
    _runtime: tokio::runtime::Runtime,
    dispatcher: Dispatcher,
    store: Arc<Mutex<AccountStore>>,
    settle_timeout: Duration,
}

impl App {
    fn build(config: &Config) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("failed to start tokio runtime")?;
        let data_dir = &config.storage.data_dir;
        let accounts = JsonFilePersistence::<AccountModel>::open(data_dir)?;
        let tokens = JsonFilePersistence::<TokenRecord>::open(data_dir)?;
        let access_token = AccessToken::load(Arc::new(tokens))?;

        let dispatcher = Dispatcher::new();
        let collaborators = AccountCollaborators {
            network: Arc::new(SimulatedNetwork::from_config(
                runtime.handle().clone(),
                &config.network,
            )),
            scheduler: Arc::new(TokioScheduler::new(
                runtime.handle().clone(),
                dispatcher.handle(),
            )),
            accounts: Arc::new(accounts),
            access_token,
        };
        let store = Arc::new(Mutex::new(AccountStore::new(
            dispatcher.handle(),
            collaborators,
            config.fetch.timeout(),
        )?));
        dispatcher.register(Arc::clone(&store));

        // Room for the deadline check plus one reschedule.
        let settle_timeout = config.fetch.timeout() * 2 + config.network.latency() * 4;
        Ok(Self {
            _runtime: runtime,
            dispatcher,
            store,
            settle_timeout,
        })
    }

    fn session(&self, args: SessionArgs) -> anyhow::Result<()> {
        let (tx, rx) = mpsc::channel();
        let changes = self.store.lock().changes().clone();
        let observer = changes.subscribe(move |event: &AccountEvent| {
            let _ = tx.send(event.clone());
        });

        self.dispatcher.dispatch(AuthenticationActionBuilder::new_authenticate_action(
            args.username,
            args.password,
            Some(AccountActionBuilder::new_fetch_account_action()),
        ))?;

        let outcome = loop {
            let event = match rx.recv_timeout(self.settle_timeout) {
                Ok(event) => event,
                Err(_) => break Err(anyhow::anyhow!("no account update within {:?}", self.settle_timeout)),
            };
            print_event(&event);
            match &event {
                AccountEvent::AuthenticationChanged(change) if change.is_error() => {
                    break Err(anyhow::anyhow!("authentication failed"));
                }
                AccountEvent::AccountChanged(change) if change.is_error() => {
                    break Err(anyhow::anyhow!("account fetch failed"));
                }
                AccountEvent::AccountChanged(change)
                    if change.cause == Some(AccountAction::UpdateAccount) =>
                {
                    break Ok(());
                }
                _ => {}
            }
        };
        changes.unsubscribe(observer);
        outcome?;

        self.show()
    }

    fn show(&self) -> anyhow::Result<()> {
        let store = self.store.lock();
        println!("{}", serde_json::to_string_pretty(store.account())?);
        println!("access token: {}", if store.has_access_token() { "stored" } else { "none" });
        println!("signed in: {}", store.is_signed_in());
        Ok(())
    }

    fn sign_out(&self) -> anyhow::Result<()> {
        self.dispatcher
            .dispatch(AccountActionBuilder::new_sign_out_action())?;
        let store = self.store.lock();
        if store.is_signed_in() {
            bail!("still signed in after sign-out");
        }
        println!("signed out");
        Ok(())
    }
}

fn print_event(event: &AccountEvent) {
    match event {
        AccountEvent::AccountChanged(change) => match &change.error {
            Some(err) => println!("account changed ({:?}): error {}", change.cause, err),
            None => println!(
                "account changed ({:?}): {}",
                change.cause,
                if change.account_infos_changed { "updated" } else { "unchanged" }
            ),
        },
        AccountEvent::AuthenticationChanged(change) => match &change.error {
            Some(err) => println!("authentication changed: error {}", err),
            None => println!("authentication changed"),
        },
        AccountEvent::NewUserCreated(created) => {
            println!("new user created (dry run: {}): {:?}", created.dry_run, created.error)
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    tracing::debug!(?config, "config loaded");

    let app = App::build(&config)?;
    match cli.command {
        Command::Session(args) => app.session(args),
        Command::Show => app.show(),
        Command::SignOut => app.sign_out(),
    }
}
