use std::fmt;

use serde::{Deserialize, Serialize};

/// Percentage applied when a bill carries no usable `pct`.
pub const DEFAULT_PCT: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BillId(pub String);

impl BillId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    #[default]
    Pending,
    Accepted,
    Refused,
}

impl BillStatus {
    /// Label shown in the employee's bill table.
    pub fn label(self) -> &'static str {
        match self {
            BillStatus::Pending => "En attente",
            BillStatus::Accepted => "Accepté",
            BillStatus::Refused => "Refusé",
        }
    }
}

/// Expense categories offered by the new-bill form. `Bill::expense_type` stays
/// free text, so stored bills may carry values outside this list.
pub const EXPENSE_TYPES: [&str; 7] = [
    "Transports",
    "Restaurants et bars",
    "Hôtel et logement",
    "Services en ligne",
    "IT et électronique",
    "Equipement et matériel",
    "Fournitures de bureau",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub id: BillId,
    #[serde(rename = "type", default, deserialize_with = "lenient::text")]
    pub expense_type: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub amount: f64,
    #[serde(default, deserialize_with = "lenient::text")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub vat: Option<f64>,
    #[serde(default = "default_pct", deserialize_with = "lenient::percentage")]
    pub pct: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commentary: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub status: BillStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_admin: Option<String>,
}

fn default_pct() -> u32 {
    DEFAULT_PCT
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    Employee,
    Admin,
}

/// JSON layout of the `"user"` entry in the session store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUser {
    #[serde(rename = "type")]
    pub role: UserRole,
    #[serde(default)]
    pub email: String,
}

/// Current user as seen by controllers. Anything that does not parse into a
/// known role is `NoSession`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    NoSession,
    Employee {
        email: String,
    },
    Admin {
        email: String,
    },
}

impl Session {
    pub const STORAGE_KEY: &'static str = "user";

    pub fn role(&self) -> Option<UserRole> {
        match self {
            Session::NoSession => None,
            Session::Employee { .. } => Some(UserRole::Employee),
            Session::Admin { .. } => Some(UserRole::Admin),
        }
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            Session::NoSession => None,
            Session::Employee { email } | Session::Admin { email } => Some(email),
        }
    }

    pub fn is_role(&self, role: UserRole) -> bool {
        self.role() == Some(role)
    }

    pub fn to_stored(&self) -> Option<StoredUser> {
        let role = self.role()?;
        Some(StoredUser {
            role,
            email: self.email().unwrap_or_default().to_string(),
        })
    }
}

impl From<StoredUser> for Session {
    fn from(value: StoredUser) -> Self {
        match value.role {
            UserRole::Employee => Session::Employee { email: value.email },
            UserRole::Admin => Session::Admin { email: value.email },
        }
    }
}

/// The backend stores numbers either as JSON numbers or as the raw text typed
/// into the form, and leaves some fields `null`. Text that is not a number
/// reads as missing.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use tracing::warn;

    use super::DEFAULT_PCT;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
    }

    pub fn optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<NumberOrText>::deserialize(deserializer)? {
            None => Ok(None),
            Some(NumberOrText::Number(value)) => Ok(Some(value)),
            Some(NumberOrText::Text(raw)) => {
                let raw = raw.trim();
                if raw.is_empty() {
                    return Ok(None);
                }
                match raw.replace(',', ".").parse::<f64>() {
                    Ok(value) if value.is_finite() => Ok(Some(value)),
                    _ => {
                        warn!(raw, "ignoring non-numeric bill field");
                        Ok(None)
                    }
                }
            }
        }
    }

    pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(optional_number(deserializer)?.unwrap_or_default())
    }

    pub fn percentage<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = match Option::<NumberOrText>::deserialize(deserializer)? {
            Some(NumberOrText::Number(value)) => Some(value),
            Some(NumberOrText::Text(raw)) => raw.trim().parse::<f64>().ok(),
            None => None,
        };
        Ok(value
            .filter(|value| value.is_finite() && *value >= 0.0)
            .map(|value| value.trunc() as u32)
            .unwrap_or(DEFAULT_PCT))
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
