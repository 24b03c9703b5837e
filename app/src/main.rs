use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cinder_app::Cli::parse();
    cinder_app::init_tracing();
    cinder_app::run(cli).await
}
