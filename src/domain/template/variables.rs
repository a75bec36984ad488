//! Variable bag supplied at send time

use std::collections::BTreeMap;
use std::fmt::Display;

use chrono::{DateTime, TimeZone};
use serde::Deserialize;

/// Display format of `{DATA_HORA}`
pub const DATE_TIME_FORMAT: &str = "%d/%m/%Y %H:%M";

pub const MORADOR: &str = "MORADOR";
pub const UNIDADE: &str = "UNIDADE";
pub const BLOCO: &str = "BLOCO";
pub const PROTOCOLO: &str = "PROTOCOLO";
pub const DATA_HORA: &str = "DATA_HORA";
pub const CONDOMINIO: &str = "CONDOMINIO";
pub const PORTEIRO: &str = "PORTEIRO";
pub const LOCALIZACAO: &str = "LOCALIZACAO";
pub const OBSERVACAO: &str = "OBSERVACAO";
pub const RETIRADO_POR: &str = "RETIRADO_POR";
pub const MENSAGEM: &str = "MENSAGEM";

/// Placeholder name to display-ready value.
///
/// JSON numbers and booleans are stored in textual form; `null` entries are
/// dropped so their placeholders stay unresolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<String, serde_json::Value>")]
pub struct VariableBag {
    values: BTreeMap<String, String>,
}

impl VariableBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, replacing any previous value
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn resident(self, name: impl Into<String>) -> Self {
        self.set(MORADOR, name)
    }

    pub fn unit(self, unit: impl Into<String>) -> Self {
        self.set(UNIDADE, unit)
    }

    pub fn block(self, block: impl Into<String>) -> Self {
        self.set(BLOCO, block)
    }

    pub fn protocol(self, protocol: impl Into<String>) -> Self {
        self.set(PROTOCOLO, protocol)
    }

    pub fn condo_name(self, name: impl Into<String>) -> Self {
        self.set(CONDOMINIO, name)
    }

    pub fn doorman(self, name: impl Into<String>) -> Self {
        self.set(PORTEIRO, name)
    }

    pub fn picked_up_by(self, name: impl Into<String>) -> Self {
        self.set(RETIRADO_POR, name)
    }

    pub fn message(self, text: impl Into<String>) -> Self {
        self.set(MENSAGEM, text)
    }

    /// Set `{DATA_HORA}` as `dd/mm/YYYY HH:MM` in the timestamp's own zone
    pub fn date_time<Tz>(self, at: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let formatted = at.format(DATE_TIME_FORMAT).to_string();
        self.set(DATA_HORA, formatted)
    }
}

impl From<BTreeMap<String, serde_json::Value>> for VariableBag {
    fn from(raw: BTreeMap<String, serde_json::Value>) -> Self {
        let values = raw
            .into_iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    serde_json::Value::Null => return None,
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Number(n) => n.to_string(),
                    serde_json::Value::Bool(b) => b.to_string(),
                    // Arrays and objects keep their JSON representation
                    other => other.to_string(),
                };
                Some((key, text))
            })
            .collect();

        Self { values }
    }
}

impl<K, V> FromIterator<(K, V)> for VariableBag
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
