mod automation;
mod core;
mod error;
mod server;
mod settings;
mod tools;

use anyhow::Context;
use std::net::SocketAddr;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

use crate::core::desktop::NativeDesktop;
use settings::HelperSettings;
use tools::login_clicker::LoginHelper;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env()?,
        )
        .init();

    let settings = HelperSettings::load();
    let addr: SocketAddr = settings
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address {:?}", settings.bind_addr))?;

    let helper = LoginHelper::new(NativeDesktop::new(), settings)?;
    tracing::info!(
        window_title = %helper.settings().window_title,
        template = %helper.settings().template_path().display(),
        threshold = helper.settings().threshold,
        "login helper ready"
    );

    server::run_server(helper, addr)
        .await
        .context("http server failed")
}
