//! HTTP access to listing servers.

use std::io::Read;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_LENGTH, RANGE};
use tracing::{debug, warn};

use crate::error::RemoteError;

const USER_AGENT: &str = "Mozilla/5.0";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const LISTING_TIMEOUT: Duration = Duration::from_secs(60);

/// Response body of a (possibly ranged) download request.
pub struct RemoteBody {
    /// True when the server honoured the range and the body continues at the
    /// requested offset.
    pub resumed: bool,
    pub reader: Box<dyn Read + Send>,
}

/// Everything the fetch and install phases need from the network.
pub trait Remote: Send + Sync {
    /// Fetch a directory listing page as text.
    fn fetch_text(&self, url: &str) -> Result<String, RemoteError>;

    /// Probe the total size of a remote file; `0` when the server does not say.
    fn content_length(&self, url: &str) -> Result<u64, RemoteError>;

    /// Open the body of `url`, starting at `offset` when it is nonzero.
    fn open(&self, url: &str, offset: u64) -> Result<RemoteBody, RemoteError>;
}

pub struct HttpRemote {
    client: Client,
}

impl HttpRemote {
    pub fn new() -> Result<Self, reqwest::Error> {
        // Downloads may take arbitrarily long; only connecting is bounded.
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(None::<Duration>)
            .build()?;
        Ok(Self { client })
    }
}

impl Remote for HttpRemote {
    fn fetch_text(&self, url: &str) -> Result<String, RemoteError> {
        debug!("GET {url}");
        let response = self.client.get(url).timeout(LISTING_TIMEOUT).send()?;
        let response = check_status(url, response)?;
        Ok(response.text()?)
    }

    fn content_length(&self, url: &str) -> Result<u64, RemoteError> {
        let response = self.client.head(url).timeout(LISTING_TIMEOUT).send()?;
        let response = check_status(url, response)?;
        // Read the header directly: the body of a HEAD response is always empty.
        Ok(response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(0))
    }

    fn open(&self, url: &str, offset: u64) -> Result<RemoteBody, RemoteError> {
        let mut request = self.client.get(url);
        if offset > 0 {
            request = request.header(RANGE, format!("bytes={offset}-"));
            debug!("Resuming {url} from byte {offset}");
        }
        let response = check_status(url, request.send()?)?;
        let resumed = offset > 0 && response.status() == StatusCode::PARTIAL_CONTENT;
        if offset > 0 && !resumed {
            warn!("Server ignored range request for {url}, restarting from zero");
        }
        Ok(RemoteBody { resumed, reader: Box::new(response) })
    }
}

fn check_status(
    url: &str,
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(RemoteError::Status { url: url.to_string(), status: status.as_u16() })
    }
}
