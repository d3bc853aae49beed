//! Trusted client-IP resolution.
//!
//! # Algorithm
//! 1. Walk [`HEADER_RULES`] in order (most trusted first)
//! 2. Read the header or server variable; skip if empty
//! 3. List values are split on commas and tried left-to-right; repeated
//!    header lines count as one comma-joined value. `Forwarded` elements
//!    contribute their `for=` node
//! 4. A candidate is accepted if it parses as an IP, is not on the ignore
//!    list, and (when enabled) is not private or reserved
//! 5. If nothing is accepted, return `REMOTE_ADDR` as-is

use std::borrow::Cow;
use std::net::IpAddr;

use axum::http::HeaderMap;

use crate::config::ResolverConfig;
use crate::observability::metrics;
use crate::security::ip_range::is_private;

/// Server variable holding the connection-level peer address.
pub const REMOTE_ADDR: &str = "REMOTE_ADDR";

/// Source label used when no rule produced an accepted candidate.
pub const FALLBACK_SOURCE: &str = "fallback";

/// How a header value breaks down into candidate addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    /// The whole value is one candidate.
    Single,
    /// Comma-delimited candidates.
    List,
    /// RFC 7239 elements; the `for=` node of each is a candidate.
    Forwarded,
}

/// One entry of the extraction precedence table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderRule {
    pub name: &'static str,
    pub format: ValueFormat,
    pub server_variable: bool,
}

impl HeaderRule {
    const fn header(name: &'static str, format: ValueFormat) -> Self {
        Self {
            name,
            format,
            server_variable: false,
        }
    }

    const fn server_variable(name: &'static str, format: ValueFormat) -> Self {
        Self {
            name,
            format,
            server_variable: true,
        }
    }

    /// True for rules whose value may hold several addresses.
    pub fn comma_delimited(&self) -> bool {
        self.format != ValueFormat::Single
    }
}

/// Extraction precedence, most trusted first.
pub static HEADER_RULES: &[HeaderRule] = &[
    HeaderRule::header("X-Client-IP", ValueFormat::Single),
    HeaderRule::server_variable("HTTP_CLIENT_IP", ValueFormat::Single),
    HeaderRule::header("X-Forwarded-For", ValueFormat::List),
    HeaderRule::server_variable("HTTP_X_FORWARDED_FOR", ValueFormat::List),
    HeaderRule::header("X-Cluster-Client-IP", ValueFormat::Single),
    HeaderRule::header("X-Forwarded", ValueFormat::List),
    HeaderRule::header("Forwarded-For", ValueFormat::List),
    HeaderRule::header("Forwarded", ValueFormat::Forwarded),
    HeaderRule::server_variable(REMOTE_ADDR, ValueFormat::Single),
];

/// Address of the `for=` pair in one `Forwarded` element, without quotes,
/// brackets or port. Obfuscated nodes come back as-is and fail to parse.
fn forwarded_for(element: &str) -> Option<&str> {
    let node = element.split(';').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        key.trim().eq_ignore_ascii_case("for").then(|| value.trim())
    })?;
    let node = node.trim_matches('"');

    if let Some(bracketed) = node.strip_prefix('[') {
        return bracketed.split(']').next();
    }
    match node.split_once(':') {
        Some((host, port)) if !port.contains(':') => Some(host),
        _ => Some(node),
    }
}

fn candidates(format: ValueFormat, value: &str) -> Vec<&str> {
    match format {
        ValueFormat::Single => vec![value],
        ValueFormat::List => value.split(',').map(str::trim).collect(),
        ValueFormat::Forwarded => value.split(',').filter_map(forwarded_for).collect(),
    }
}

/// Read access to an inbound request's headers and server variables.
///
/// A header sent on several lines is returned as one value, the lines joined
/// with `", "`.
pub trait RequestSource {
    /// Header value by (case-insensitive) name.
    fn header(&self, name: &str) -> Option<Cow<'_, str>>;

    /// Server variable by name, e.g. `REMOTE_ADDR` or `HTTP_X_FORWARDED_FOR`.
    fn server_variable(&self, name: &str) -> Option<Cow<'_, str>>;
}

/// Join every value of `name`, skipping lines that are not visible ASCII.
fn joined_header<'a>(headers: &'a HeaderMap, name: &str) -> Option<Cow<'a, str>> {
    let lines: Vec<&str> = headers
        .get_all(name)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    match lines.as_slice() {
        [] => None,
        [only] => Some(Cow::Borrowed(*only)),
        all => Some(Cow::Owned(all.join(", "))),
    }
}

fn joined_pairs<'a>(pairs: &'a [(String, String)], name: &str) -> Option<Cow<'a, str>> {
    let values: Vec<&str> = pairs
        .iter()
        .filter(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
        .collect();
    match values.as_slice() {
        [] => None,
        [only] => Some(Cow::Borrowed(*only)),
        all => Some(Cow::Owned(all.join(", "))),
    }
}

/// Adapter over an axum request's headers and peer address.
#[derive(Debug, Clone, Copy)]
pub struct HttpRequestSource<'a> {
    headers: &'a HeaderMap,
    remote_addr: Option<&'a str>,
}

impl<'a> HttpRequestSource<'a> {
    pub fn new(headers: &'a HeaderMap, remote_addr: Option<&'a str>) -> Self {
        Self {
            headers,
            remote_addr,
        }
    }
}

impl RequestSource for HttpRequestSource<'_> {
    fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        joined_header(self.headers, name)
    }

    fn server_variable(&self, name: &str) -> Option<Cow<'_, str>> {
        if name.eq_ignore_ascii_case(REMOTE_ADDR) {
            return self.remote_addr.map(Cow::Borrowed);
        }
        let header = cgi_header_name(name)?;
        joined_header(self.headers, header.as_str())
    }
}

/// In-memory request for callers outside a web framework.
#[derive(Debug, Clone, Default)]
pub struct StaticRequest {
    headers: Vec<(String, String)>,
    server_variables: Vec<(String, String)>,
}

impl StaticRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_server_variable(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.server_variables.push((name.into(), value.into()));
        self
    }

    pub fn with_remote_addr(self, addr: impl Into<String>) -> Self {
        self.with_server_variable(REMOTE_ADDR, addr)
    }
}

impl RequestSource for StaticRequest {
    fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        joined_pairs(&self.headers, name)
    }

    fn server_variable(&self, name: &str) -> Option<Cow<'_, str>> {
        joined_pairs(&self.server_variables, name)
    }
}

/// A resolved client address and the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp {
    /// Address text as found in the request.
    pub address: String,
    /// Rule name, or [`FALLBACK_SOURCE`] for the unvalidated peer address.
    pub source: &'static str,
}

impl ClientIp {
    /// Parsed form; `None` only for an unparseable fallback value.
    pub fn parsed(&self) -> Option<IpAddr> {
        self.address.parse().ok()
    }
}

/// Resolves the most trustworthy client IP from a request.
#[derive(Debug, Clone, Default)]
pub struct ClientIpResolver {
    skip_private: bool,
    ignore: Vec<String>,
}

impl ClientIpResolver {
    pub fn new(skip_private: bool, ignore: Vec<String>) -> Self {
        Self {
            skip_private,
            ignore,
        }
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(config.skip_private, config.ignore.clone())
    }

    /// Resolve the client address, falling back to the raw `REMOTE_ADDR`.
    ///
    /// Returns `None` only when no rule matched and there is no peer address.
    pub fn resolve<R: RequestSource + ?Sized>(&self, request: &R) -> Option<ClientIp> {
        for rule in HEADER_RULES {
            let value = if rule.server_variable {
                request.server_variable(rule.name)
            } else {
                request.header(rule.name)
            };
            let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) else {
                continue;
            };

            let accepted = candidates(rule.format, value)
                .into_iter()
                .find(|c| self.accepts(c));

            if let Some(candidate) = accepted {
                metrics::record_ip_resolution(rule.name);
                tracing::trace!(source = rule.name, address = candidate, "Client IP resolved");
                return Some(ClientIp {
                    address: candidate.to_string(),
                    source: rule.name,
                });
            }
        }

        let fallback = request.server_variable(REMOTE_ADDR)?;
        let fallback = fallback.trim();
        if fallback.is_empty() {
            return None;
        }
        metrics::record_ip_resolution(FALLBACK_SOURCE);
        Some(ClientIp {
            address: fallback.to_string(),
            source: FALLBACK_SOURCE,
        })
    }

    fn accepts(&self, candidate: &str) -> bool {
        let Ok(ip) = candidate.parse::<IpAddr>() else {
            return false;
        };
        if self.ignore.iter().any(|ignored| ignored == candidate) {
            return false;
        }
        !(self.skip_private && is_private(&ip))
    }
}
