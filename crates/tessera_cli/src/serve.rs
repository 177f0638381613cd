//! `tessera serve`: the remote detailed-placement endpoint.

use std::error::Error;

use tessera_place::dispatch::server;
use tokio::net::TcpListener;

use crate::{GlobalArgs, ServeArgs};

/// Runs the `tessera serve` command until the process is stopped.
pub fn run(args: &ServeArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        let listener = TcpListener::bind(args.bind.as_str())
            .await
            .map_err(|e| format!("cannot listen on {}: {e}", args.bind))?;
        let addr = listener.local_addr()?;
        if !global.quiet {
            eprintln!("   Serving detailed placement on http://{addr}");
        }
        tracing::info!(%addr, "placement endpoint listening");
        server::serve(listener).await?;
        Ok::<_, Box<dyn Error>>(0)
    })
}
