use anyhow::{Context, Result};
use benchboard::config::Config;
use benchboard::data::{load_table, DatasetManifest};
use benchboard::logging::{log, obj, v_str, Domain, Level};
use benchboard::server::{serve, until_signal};
use benchboard::view::View;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    if let Err(err) = run(cfg).await {
        log(
            Level::Fatal,
            Domain::System,
            "startup_failed",
            obj(&[("error", v_str(&format!("{:#}", err)))]),
        );
        return Err(err);
    }
    Ok(())
}

async fn run(cfg: Config) -> Result<()> {
    let data_path = Path::new(&cfg.data_path);
    let table = Arc::new(load_table(data_path)?);
    let manifest = DatasetManifest::build(data_path, &table)?;

    let addr = cfg.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("url", v_str(&format!("http://{}", addr))),
            ("data", v_str(&cfg.data_path)),
            ("hash_sha256", v_str(&manifest.hash_sha256)),
            ("rows", json!(manifest.row_count)),
            ("columns", json!(manifest.column_count)),
        ]),
    );

    let view = View::new(table, cfg.title.clone());
    serve(listener, view, manifest, until_signal(tokio::signal::ctrl_c())).await
}
