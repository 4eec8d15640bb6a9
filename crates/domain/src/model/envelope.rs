use serde::{
    de::DeserializeOwned,
    ser::{SerializeMap, SerializeStruct},
    Deserialize, Deserializer, Serialize, Serializer,
};
use serde_json::{Map, Value};

/// Outcome reported by one server for a seller-scoped request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ServerResult<T> {
    #[serde(default, deserialize_with = "super::lenient::flag")]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ServerResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Data of a successful result; `None` for failures and empty successes.
    pub fn usable(&self) -> Option<&T> {
        if self.success {
            self.data.as_ref()
        } else {
            None
        }
    }
}

/// `{ "servers": { <name>: ServerResult<T> } }` with the server order kept
/// exactly as received.
///
/// A server whose payload fails to decode is downgraded to a failed result
/// instead of failing the whole response.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerResults<T> {
    servers: Vec<(String, ServerResult<T>)>,
}

impl<T> Default for ServerResults<T> {
    fn default() -> Self {
        Self {
            servers: Vec::new(),
        }
    }
}

impl<T> ServerResults<T> {
    pub fn new(servers: Vec<(String, ServerResult<T>)>) -> Self {
        Self { servers }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ServerResult<T>)> {
        self.servers
            .iter()
            .map(|(name, result)| (name.as_str(), result))
    }

    /// Successful servers with data, in received order.
    pub fn successful(&self) -> impl Iterator<Item = (&str, &T)> {
        self.iter()
            .filter_map(|(name, result)| result.usable().map(|data| (name, data)))
    }

    pub fn first_success(&self) -> Option<(&str, &T)> {
        self.successful().next()
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

#[derive(Deserialize)]
struct ServerResultsWire {
    #[serde(default)]
    servers: Map<String, Value>,
}

impl<'de, T> Deserialize<'de> for ServerResults<T>
where
    T: DeserializeOwned,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = ServerResultsWire::deserialize(deserializer)?;
        let servers = wire
            .servers
            .into_iter()
            .map(|(name, raw)| {
                let result = ServerResult::<T>::deserialize(raw).unwrap_or_else(|err| {
                    tracing::warn!(server = %name, error = %err, "undecodable server payload");
                    ServerResult::failed(format!("undecodable payload: {err}"))
                });
                (name, result)
            })
            .collect();
        Ok(Self { servers })
    }
}

struct OrderedServers<'a, T>(&'a [(String, ServerResult<T>)]);

impl<T: Serialize> Serialize for OrderedServers<'_, T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, result) in self.0 {
            map.serialize_entry(name, result)?;
        }
        map.end()
    }
}

impl<T: Serialize> Serialize for ServerResults<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("ServerResults", 1)?;
        state.serialize_field("servers", &OrderedServers(&self.servers))?;
        state.end()
    }
}

/// Generic `{ success, data, error }` envelope used by bot-scoped endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    #[serde(default, deserialize_with = "super::lenient::flag")]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_received_server_order() {
        let raw = json!({
            "servers": {
                "zeta": {"success": true, "data": 1},
                "alpha": {"success": false, "error": "offline"},
                "mid": {"success": true, "data": 3}
            }
        });
        let parsed: ServerResults<i64> = serde_json::from_value(raw).unwrap();
        let names: Vec<&str> = parsed.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(parsed.first_success(), Some(("zeta", &1)));
        assert_eq!(parsed.successful().count(), 2);
    }

    #[test]
    fn undecodable_server_becomes_failure() {
        let raw = json!({
            "servers": {
                "bad": {"success": true, "data": "not-a-number"},
                "good": {"success": true, "data": 7}
            }
        });
        let parsed: ServerResults<i64> = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.first_success(), Some(("good", &7)));
        let (_, bad) = parsed.iter().next().unwrap();
        assert!(!bad.success);
        assert!(bad.error.as_deref().unwrap().contains("undecodable"));
    }

    #[test]
    fn success_without_data_is_not_usable() {
        let result: ServerResult<i64> = serde_json::from_value(json!({"success": true})).unwrap();
        assert_eq!(result.usable(), None);
    }

    #[derive(Debug, PartialEq, Deserialize)]
    struct Ticket {
        url: String,
    }

    #[test]
    fn payloads_need_not_implement_default() {
        let parsed: ServerResults<Ticket> = serde_json::from_value(json!({
            "servers": {"east": {"success": true, "data": {"url": "https://t/1"}}}
        }))
        .unwrap();
        assert_eq!(parsed.first_success().unwrap().1.url, "https://t/1");

        let envelope: Envelope<Ticket> =
            serde_json::from_value(json!({"success": false, "error": "closed"})).unwrap();
        assert_eq!(envelope.data, None);
        assert_eq!(envelope.error.as_deref(), Some("closed"));
    }

    #[test]
    fn missing_servers_key_is_empty() {
        let parsed: ServerResults<i64> = serde_json::from_value(json!({})).unwrap();
        assert!(parsed.is_empty());
    }
}
