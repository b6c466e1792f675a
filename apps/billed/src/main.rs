use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    new_bill::FileChangeOutcome,
    session::{sign_in, FileStorage, KeyValueStore, TOKEN_STORAGE_KEY},
    view::NewBillForm,
    HttpStore, Route, Router, SubmitOutcome,
};
use shared::{
    domain::{StoredUser, UserRole},
    protocol::ReceiptFile,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod terminal;

use config::{load_settings, Settings};
use terminal::TerminalView;

#[derive(Parser, Debug)]
#[command(name = "billed", about = "Expense reports from the terminal")]
struct Args {
    /// Overrides the configured store URL.
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    session_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stores the session used by every other command.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        admin: bool,
        #[arg(long)]
        token: Option<String>,
    },
    Logout,
    /// Lists your bills, newest first.
    Bills,
    /// Shows the receipt of the n-th bill of the list.
    Preview { index: usize },
    New(NewBillArgs),
    /// Opens a page by its path, e.g. `#employee/bills`.
    Open { path: String },
}

#[derive(clap::Args, Debug)]
struct NewBillArgs {
    #[arg(long = "type", default_value = "Transports")]
    expense_type: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    amount: String,
    /// YYYY-MM-DD
    #[arg(long)]
    date: String,
    #[arg(long, default_value = "")]
    vat: String,
    #[arg(long, default_value = "20")]
    pct: String,
    #[arg(long, default_value = "")]
    commentary: String,
    /// jpg, jpeg or png image.
    #[arg(long)]
    receipt: Option<PathBuf>,
}

impl NewBillArgs {
    fn form(&self) -> NewBillForm {
        NewBillForm {
            expense_type: self.expense_type.clone(),
            name: self.name.clone(),
            amount: self.amount.clone(),
            date: self.date.clone(),
            vat: self.vat.clone(),
            pct: self.pct.clone(),
            commentary: self.commentary.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings()?;
    if let Some(api_url) = args.api_url {
        settings.api_url = api_url;
    }
    if let Some(session_file) = args.session_file {
        settings.session_file = session_file;
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&settings.log_filter))
        .with_writer(std::io::stderr)
        .init();

    let sessions: Arc<dyn KeyValueStore> = Arc::new(
        FileStorage::open(&settings.session_file).with_context(|| {
            format!(
                "failed to open session file {}",
                settings.session_file.display()
            )
        })?,
    );

    match args.command {
        Command::Login {
            email,
            admin,
            token,
        } => {
            let role = if admin {
                UserRole::Admin
            } else {
                UserRole::Employee
            };
            sign_in(sessions.as_ref(), &StoredUser { role, email })
                .context("failed to store session")?;
            if let Some(token) = token {
                sessions
                    .set_item(TOKEN_STORAGE_KEY, &token)
                    .context("failed to store token")?;
            }
            info!(role = ?role, "signed in");
            let landing = match role {
                UserRole::Employee => Route::Bills,
                UserRole::Admin => Route::Dashboard,
            };
            let (router, view) = build_router(&settings, sessions, TerminalView::default())?;
            router.on_navigate(landing).await;
            fail_on_error(&view)?;
        }
        Command::Logout => {
            let (router, _) = build_router(&settings, sessions, TerminalView::default())?;
            router.navigation().disconnect();
            router.process_pending().await;
        }
        Command::Bills => {
            let (router, view) = build_router(&settings, sessions, TerminalView::default())?;
            open_employee_page(&router, Route::Bills).await?;
            fail_on_error(&view)?;
        }
        Command::Preview { index } => {
            let (router, view) = build_router(&settings, sessions, TerminalView::default())?;
            open_employee_page(&router, Route::Bills).await?;
            fail_on_error(&view)?;
            let rows = view.rows();
            let row = index
                .checked_sub(1)
                .and_then(|i| rows.get(i))
                .with_context(|| format!("no bill #{index}; the list has {}", rows.len()))?;
            let controller = router
                .bills_controller()
                .await
                .context("bills page is not mounted")?;
            controller.handle_click_icon_eye(&row.eye_icon());
        }
        Command::New(new_bill) => {
            let view = TerminalView::with_form(new_bill.form());
            let (router, view) = build_router(&settings, sessions, view)?;
            open_employee_page(&router, Route::NewBill).await?;
            submit_new_bill(&router, new_bill.receipt.as_deref()).await?;
            fail_on_error(&view)?;
        }
        Command::Open { path } => {
            let (router, view) = build_router(&settings, sessions, TerminalView::default())?;
            let route = router.navigate_to_path(&path).await;
            info!(requested = %path, route = %route, page = ?view.page(), "opened");
            fail_on_error(&view)?;
        }
    }

    Ok(())
}

fn build_router(
    settings: &Settings,
    sessions: Arc<dyn KeyValueStore>,
    view: TerminalView,
) -> Result<(Router<TerminalView>, Arc<TerminalView>)> {
    let store = HttpStore::new(
        &settings.api_url,
        settings.request_timeout(),
        Some(sessions.clone()),
    )?;
    info!(api_url = %store.base_url(), "using remote store");
    let view = Arc::new(view);
    let router = Router::new(view.clone(), Arc::new(store), sessions, settings.preview());
    Ok((router, view))
}

async fn open_employee_page(router: &Router<TerminalView>, route: Route) -> Result<()> {
    let mounted = router.on_navigate(route).await;
    if mounted != route {
        bail!("not signed in as an employee; run `billed login --email <email>` first");
    }
    Ok(())
}

async fn submit_new_bill(
    router: &Router<TerminalView>,
    receipt: Option<&std::path::Path>,
) -> Result<()> {
    let controller = router
        .new_bill_controller()
        .await
        .context("new bill page is not mounted")?;

    if let Some(path) = receipt {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("receipt path {} has no file name", path.display()))?;
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read receipt {}", path.display()))?;
        let mut file = ReceiptFile::new(file_name, bytes);
        if let Some(content_type) = content_type_for(file_name) {
            file = file.with_content_type(content_type);
        }
        if let FileChangeOutcome::Rejected(err) = controller.handle_change_file(vec![file]).await {
            return Err(anyhow!(err).context("receipt rejected"));
        }
    }

    match controller.handle_submit().await {
        SubmitOutcome::Navigated => {
            router.process_pending().await;
            Ok(())
        }
        SubmitOutcome::Failed(err) => Err(anyhow!(err).context("bill submission failed")),
        SubmitOutcome::AlreadySubmitting => bail!("a submission is already in flight"),
        SubmitOutcome::AlreadySubmitted => bail!("this bill was already sent"),
    }
}

fn content_type_for(file_name: &str) -> Option<&'static str> {
    let (_, extension) = file_name.rsplit_once('.')?;
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        _ => None,
    }
}

fn fail_on_error(view: &TerminalView) -> Result<()> {
    match view.error() {
        Some(message) => Err(anyhow!(message)),
        None => Ok(()),
    }
}
