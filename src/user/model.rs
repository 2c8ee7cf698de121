//! User entity, field schema and partial-update payload.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};
use sqlx::FromRow;

/// The user resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier, immutable after creation. `null` decodes as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub id: String,
    /// Login name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Phone number (masked in request logs).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Date of birth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<DateTime<Utc>>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// How a field's value is bound in SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Plain text column.
    Text,
    /// `timestamptz` column, bound as RFC 3339 text with an explicit cast.
    Timestamp,
}

impl FieldKind {
    /// SQL cast appended to the bind placeholder, if any.
    pub fn sql_cast(self) -> Option<&'static str> {
        match self {
            Self::Text => None,
            Self::Timestamp => Some("timestamptz"),
        }
    }
}

/// Static description of one [`User`] field.
#[derive(Debug)]
pub struct FieldDescriptor {
    /// Rust field name.
    pub name: &'static str,
    /// Database column.
    pub column: &'static str,
    /// JSON key.
    pub json: &'static str,
    /// Binding kind.
    pub kind: FieldKind,
    /// Whether this field is the identity.
    pub identity: bool,
    extract: fn(&User) -> PatchValue,
}

impl PartialEq for FieldDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for FieldDescriptor {}

impl FieldDescriptor {
    /// Read this field's value from a user.
    pub fn value_of(&self, user: &User) -> PatchValue {
        (self.extract)(user)
    }
}

/// Name of the users table.
pub const USER_TABLE: &str = "users";

/// Field schema of [`User`], in column order.
pub static USER_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        name: "id",
        column: "id",
        json: "id",
        kind: FieldKind::Text,
        identity: true,
        extract: |u| PatchValue::Text(u.id.clone()),
    },
    FieldDescriptor {
        name: "username",
        column: "username",
        json: "username",
        kind: FieldKind::Text,
        identity: false,
        extract: |u| PatchValue::from(u.username.clone()),
    },
    FieldDescriptor {
        name: "email",
        column: "email",
        json: "email",
        kind: FieldKind::Text,
        identity: false,
        extract: |u| PatchValue::from(u.email.clone()),
    },
    FieldDescriptor {
        name: "phone",
        column: "phone",
        json: "phone",
        kind: FieldKind::Text,
        identity: false,
        extract: |u| PatchValue::from(u.phone.clone()),
    },
    FieldDescriptor {
        name: "date_of_birth",
        column: "date_of_birth",
        json: "dateOfBirth",
        kind: FieldKind::Timestamp,
        identity: false,
        extract: |u| {
            PatchValue::from(
                u.date_of_birth
                    .map(|d| d.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            )
        },
    },
];

/// A single value in a partial update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchValue {
    /// Clear the column.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value.
    Number(Number),
    /// Text value.
    Text(String),
}

impl From<Option<String>> for PatchValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Null, Self::Text)
    }
}

impl From<PatchValue> for Value {
    fn from(value: PatchValue) -> Self {
        match value {
            PatchValue::Null => Value::Null,
            PatchValue::Bool(b) => Value::Bool(b),
            PatchValue::Number(n) => Value::Number(n),
            PatchValue::Text(s) => Value::String(s),
        }
    }
}

impl Serialize for PatchValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => n.serialize(serializer),
            Self::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// Why a request body could not be turned into a [`UserPatch`].
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// Body is not valid JSON or does not match the user schema.
    #[error("{0}")]
    Decode(#[from] serde_json::Error),

    /// Body is valid JSON but not an object.
    #[error("request body must be a JSON object")]
    NotAnObject,
}

/// Ordered set of column changes applied to one user.
///
/// Never contains the identity field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPatch {
    /// Identity of the user being patched.
    pub id: String,
    /// Changes in schema order.
    pub changes: Vec<(&'static FieldDescriptor, PatchValue)>,
}

impl UserPatch {
    /// Parse a request body into the decoded user and the raw key set.
    ///
    /// The returned user carries whatever id the body supplied (possibly empty).
    pub fn decode(body: &[u8]) -> Result<(User, Map<String, Value>), PatchError> {
        let value: Value = serde_json::from_slice(body)?;
        let Value::Object(map) = value else {
            return Err(PatchError::NotAnObject);
        };
        let user = User::deserialize(Value::Object(map.clone()))?;
        Ok((user, map))
    }

    /// Build the partial update from a decoded user and the keys present in its body.
    ///
    /// Only non-identity fields whose JSON key appears in `present` are included;
    /// unknown keys are ignored.
    pub fn from_body(user: &User, present: &Map<String, Value>) -> Self {
        let changes = USER_FIELDS
            .iter()
            .filter(|f| !f.identity && present.contains_key(f.json))
            .map(|f| (f, f.value_of(user)))
            .collect();

        Self {
            id: user.id.clone(),
            changes,
        }
    }

    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Apply the changes to an existing user.
    pub fn apply_to(&self, user: &mut User) -> Result<(), serde_json::Error> {
        let mut current = match serde_json::to_value(&*user)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (field, value) in &self.changes {
            current.insert(field.json.to_string(), value.clone().into());
        }
        current.insert("id".to_string(), Value::String(user.id.clone()));
        *user = User::deserialize(Value::Object(current))?;
        Ok(())
    }
}

impl Serialize for UserPatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.changes.len()))?;
        for (field, value) in &self.changes {
            map.serialize_entry(field.json, value)?;
        }
        map.end()
    }
}
