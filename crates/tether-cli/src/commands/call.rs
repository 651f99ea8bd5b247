//! `tether call`: run a single request and print the response.

use std::path::Path;

use anyhow::Context;

use crate::host;
use crate::transport::{self, Request};

pub fn execute(method: String, arguments: Option<String>, config: Option<&Path>) -> anyhow::Result<()> {
    let config = super::load_config(config)?;
    let dispatcher = host::dispatcher(&config)?;

    let arguments = arguments
        .map(|raw| serde_json::from_str(&raw).context("ARGS_JSON is not valid JSON"))
        .transpose()?;
    let response = transport::handle_request(&dispatcher, Request { method, arguments });
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
