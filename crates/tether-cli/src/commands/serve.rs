//! `tether serve`: answer JSON-lines requests on stdin/stdout.

use std::io;
use std::path::Path;

use tracing::info;

use crate::{host, transport};

pub fn execute(config: Option<&Path>) -> anyhow::Result<()> {
    let config = super::load_config(config)?;
    let dispatcher = host::dispatcher(&config)?;
    info!(
        channel = config.bridge.channel.as_str(),
        registrar = config.bridge.registrar.as_str(),
        types = dispatcher.engine().types().len(),
        "bridge ready"
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    transport::serve(&dispatcher, stdin.lock(), stdout.lock())?;
    Ok(())
}
