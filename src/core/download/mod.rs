// ─── Downloads ───
// Plain HTTP GETs with manual redirect handling, plus `file:` URLs.

mod client;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, ClientBuilder};

pub use client::Downloader;

const APP_USER_AGENT: &str = "MinecraftForge-Utils";

/// Connect and read timeout for every request.
pub const TIMEOUT: Duration = Duration::from_secs(5);

/// The third redirect of a request fails it.
pub const MAX_REDIRECTS: usize = 3;

/// Builder preconfigured with the user agent, JSON accept header, timeouts
/// and redirects disabled. Callers may tweak it before building.
pub fn http_client_builder() -> ClientBuilder {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .redirect(reqwest::redirect::Policy::none())
        .connect_timeout(TIMEOUT)
        .read_timeout(TIMEOUT)
}

pub fn build_http_client() -> Result<Client, reqwest::Error> {
    http_client_builder().build()
}
