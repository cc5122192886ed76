//! Request command implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use retoken_core::{InvalidInputError, Method, Request};

use crate::cli::GlobalOpts;
use crate::output;

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE, HEAD)
    pub method: String,

    /// Path relative to the API base URL, query string included
    pub path: String,

    /// JSON request body
    #[arg(short, long)]
    pub data: Option<String>,

    /// Extra header as "Name: value" (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Print response headers before the body
    #[arg(short, long)]
    pub include: bool,
}

fn parse_header(raw: &str) -> Result<(String, String), InvalidInputError> {
    let Some((name, value)) = raw.split_once(':') else {
        return Err(InvalidInputError::Header {
            name: raw.to_string(),
            reason: "expected \"Name: value\"".to_string(),
        });
    };

    let name = name.trim();
    if name.is_empty() {
        return Err(InvalidInputError::Header {
            name: raw.to_string(),
            reason: "missing name".to_string(),
        });
    }
    if let Some(bad) = name.chars().find(|c| !is_token_char(*c)) {
        return Err(InvalidInputError::Header {
            name: name.to_string(),
            reason: format!("'{bad}' is not allowed in a header name"),
        });
    }

    Ok((name.to_string(), value.trim().to_string()))
}

/// RFC 9110 token characters.
fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

fn build_request(args: &RequestArgs) -> Result<Request> {
    let method: Method = args
        .method
        .parse()
        .with_context(|| format!("Unsupported method {}", args.method))?;

    let mut request = Request::new(method, args.path.clone());
    for raw in &args.headers {
        let (name, value) = parse_header(raw).map_err(retoken_core::Error::from)?;
        request = request.with_header(name, value);
    }
    if let Some(data) = &args.data {
        let body: serde_json::Value = serde_json::from_str(data).context("--data is not valid JSON")?;
        request = request.with_json(body);
    }
    if let Some(secs) = args.timeout {
        request = request.with_timeout(Duration::from_secs(secs));
    }

    Ok(request)
}

pub async fn run(global: &GlobalOpts, args: RequestArgs) -> Result<()> {
    let request = build_request(&args)?;
    let client = super::connect(global)?;

    if !client.is_authenticated() {
        output::warning("Not logged in, sending without credentials");
    }

    let response = match client.send(request).await {
        Ok(response) => response,
        Err(e) => {
            let hint = super::session_hint(&e);
            return Err(anyhow::Error::new(e).context(hint));
        }
    };
    debug!(status = response.status(), "Response received");

    if args.include {
        output::field("Status", &response.status().to_string());
        for (name, value) in response.headers() {
            output::field(name, value);
        }
        println!();
    }

    match response.json::<serde_json::Value>() {
        Ok(value) => output::json_pretty(&value)?,
        Err(_) => {
            let text = response.text();
            if !text.is_empty() {
                println!("{text}");
            }
        }
    }

    Ok(())
}
