/// Identifies one issued wage-table fetch.
///
/// Tokens are issued in strictly increasing order, so comparing two tokens
/// tells which request is newer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(pub u64);

/// What the caller needs to run a fetch: the token to report back with and
/// the table key to load.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchTicket {
    pub token: RequestToken,
    pub occupation_key: String,
}

/// Latest-issued-wins gate for out-of-order responses.
///
/// Only the response carrying the most recently issued token is accepted,
/// and only once; everything else is stale.
#[derive(Debug, Default)]
pub struct TokenGate {
    next: u64,
    latest: Option<RequestToken>,
    settled: bool,
}

impl TokenGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> RequestToken {
        self.next += 1;
        let token = RequestToken(self.next);
        self.latest = Some(token);
        self.settled = false;
        token
    }

    pub fn latest(&self) -> Option<RequestToken> {
        self.latest
    }

    /// True while the latest token has been issued but not yet accepted.
    pub fn is_pending(&self) -> bool {
        self.latest.is_some() && !self.settled
    }

    /// Accepts `token` if it is the latest issued and has not been accepted
    /// before. Marks it settled.
    pub fn accept(&mut self, token: RequestToken) -> bool {
        if self.settled || self.latest != Some(token) {
            return false;
        }
        self.settled = true;
        true
    }
}
