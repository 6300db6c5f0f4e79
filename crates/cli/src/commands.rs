//! CLI commands

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use erp_core::FileStore;
use erp_http::client::Resource;
use erp_http::types::{DEFAULT_ROLE, Listing, RegisterRequest};
use erp_http::{ApiClient, ApiRequest, ClientError, Method, SessionState};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::ErpConfig;

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the issued tokens
    Login {
        /// Account email or username
        #[arg(long, env = "ERP_USERNAME")]
        username: String,

        /// Account password
        #[arg(long, env = "ERP_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account; log in afterwards with `erp login`
    Register {
        /// Account email
        #[arg(long)]
        email: String,

        /// Account password
        #[arg(long, env = "ERP_PASSWORD", hide_env_values = true)]
        password: String,

        /// Account role
        #[arg(long, default_value = DEFAULT_ROLE)]
        role: String,

        /// Username, when the server asks for one
        #[arg(long)]
        username: Option<String>,

        #[arg(long, default_value = "")]
        first_name: String,

        #[arg(long, default_value = "")]
        last_name: String,
    },

    /// Forget the stored tokens
    Logout,

    /// Show the logged in account
    Whoami,

    /// GET a path relative to the API root and print the JSON body
    Get {
        /// Path such as `projects/` or `sites/3/`
        path: String,
    },

    /// Send an arbitrary request
    Send {
        /// HTTP method
        method: String,

        /// Path relative to the API root
        path: String,

        /// JSON request body
        #[arg(long)]
        data: Option<String>,
    },

    /// List one of the ERP collections
    List {
        /// Collection name, e.g. `purchase-orders` or `site-inspections`
        resource: String,

        /// Page of a paginated collection
        #[arg(long)]
        page: Option<u32>,
    },

    /// Show dashboard record counts
    Stats,

    /// Print the effective configuration
    Config,
}

impl Commands {
    pub async fn execute(self, config: ErpConfig, data_dir: Option<&Path>) -> Result<()> {
        let client = build_client(&config, data_dir)?;
        watch_session(&client);

        match self.run(&client, &config).await {
            Err(e) => match e.downcast_ref::<ClientError>().and_then(ClientError::redirect_to) {
                Some(redirect_to) => {
                    bail!("{e}\nYour session has ended. Run `erp login` (web login: {redirect_to})")
                }
                None => Err(e),
            },
            ok => ok,
        }
    }

    async fn run(self, client: &ApiClient, config: &ErpConfig) -> Result<()> {
        match self {
            Self::Login { username, password } => {
                client.login(&username, &password).await?;
                info!("Logged in as {username}");
                Ok(())
            }
            Self::Register {
                email,
                password,
                role,
                username,
                first_name,
                last_name,
            } => {
                let registration = RegisterRequest {
                    email,
                    password,
                    role,
                    username,
                    first_name,
                    last_name,
                };
                print_json(&client.register(&registration).await?)
            }
            Self::Logout => {
                client.logout();
                info!("Logged out");
                Ok(())
            }
            Self::Whoami => print_json(&client.current_user().await?),
            Self::Get { path } => {
                let body: Value = client.get(&path).await?;
                print_json(&body)
            }
            Self::Send { method, path, data } => {
                let method: Method = method
                    .to_uppercase()
                    .parse()
                    .with_context(|| format!("invalid HTTP method {method:?}"))?;
                let mut request = ApiRequest::new(method, path);
                if let Some(data) = data {
                    let body: Value =
                        serde_json::from_str(&data).context("--data is not valid JSON")?;
                    request = request.with_body(body);
                }
                let body: Value = client.execute(&request).await?;
                print_json(&body)
            }
            Self::List { resource, page } => {
                let resource: Resource = resource.parse()?;
                let api = client.resource(resource);
                let listing: Listing = match page {
                    Some(page) => api.list_page(page).await?,
                    None => api.list().await?,
                };
                info!(%resource, total = listing.total(), "Listed records");
                print_json(&listing)
            }
            Self::Stats => print_json(&client.dashboard_stats().await?),
            Self::Config => print_json(config),
        }
    }
}

fn build_client(config: &ErpConfig, data_dir: Option<&Path>) -> Result<ApiClient> {
    let store = FileStore::new(config.session_file(data_dir));
    let client = ApiClient::builder()
        .config(config.api.clone())
        .store(Arc::new(store))
        .build()
        .context("Failed to build API client")?;
    Ok(client)
}

/// Report session invalidation as it happens
fn watch_session(client: &ApiClient) {
    let mut state = client.subscribe();
    tokio::spawn(async move {
        while state.changed().await.is_ok() {
            if let SessionState::LoggedOut { redirect_to } = &*state.borrow_and_update() {
                warn!("Session credentials cleared; log in again at {redirect_to}");
            }
        }
    });
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
