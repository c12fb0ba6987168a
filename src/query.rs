use std::collections::BTreeMap;

/// Filter names understood by the log query endpoint.
///
/// Declaration order is the order parameters appear in the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParamKey {
    Limit,
    Search,
    Level,
    SessionId,
    ClientId,
    SubscriberType,
    Context,
    BeforeContext,
    AfterContext,
    StartTime,
    EndTime,
}

impl ParamKey {
    pub fn as_str(self) -> &'static str {
        match self {
            ParamKey::Limit => "limit",
            ParamKey::Search => "search",
            ParamKey::Level => "level",
            ParamKey::SessionId => "session_id",
            ParamKey::ClientId => "client_id",
            ParamKey::SubscriberType => "subscriber_type",
            ParamKey::Context => "context",
            ParamKey::BeforeContext => "before_context",
            ParamKey::AfterContext => "after_context",
            ParamKey::StartTime => "start_time",
            ParamKey::EndTime => "end_time",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ParamKey::Limit => "Limit",
            ParamKey::Search => "Search",
            ParamKey::Level => "Level",
            ParamKey::SessionId => "Session ID",
            ParamKey::ClientId => "Client ID",
            ParamKey::SubscriberType => "Store",
            ParamKey::Context => "Context",
            ParamKey::BeforeContext => "Before",
            ParamKey::AfterContext => "After",
            ParamKey::StartTime => "From",
            ParamKey::EndTime => "To",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    values: BTreeMap<ParamKey, String>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: ParamKey, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: ParamKey, value: impl Into<String>) {
        self.values.insert(key, value.into());
    }

    pub fn get(&self, key: ParamKey) -> &str {
        self.values.get(&key).map(String::as_str).unwrap_or("")
    }

    /// Entries that constrain the query. Blank values mean "no constraint"
    /// and are never sent.
    pub fn active(&self) -> impl Iterator<Item = (ParamKey, &str)> {
        self.values
            .iter()
            .map(|(key, value)| (*key, value.trim()))
            .filter(|(_, value)| !value.is_empty())
    }

    pub fn to_query_string(&self) -> String {
        let mut query = String::new();
        for (key, value) in self.active() {
            if !query.is_empty() {
                query.push('&');
            }
            query.push_str(key.as_str());
            query.push('=');
            form_encode_into(&mut query, value);
        }
        query
    }
}

fn form_encode_into(out: &mut String, value: &str) {
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'*' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
}

/// One GET against the query endpoint, tagged with the sequence number that
/// fences out stale responses.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub seq: u64,
    pub url: String,
}

impl FetchRequest {
    pub fn new(seq: u64, endpoint: &str, params: &QueryParams) -> Self {
        let query = params.to_query_string();
        let url = if query.is_empty() {
            endpoint.to_string()
        } else if endpoint.contains('?') {
            format!("{}&{}", endpoint, query)
        } else {
            format!("{}?{}", endpoint, query)
        };
        Self { seq, url }
    }
}
