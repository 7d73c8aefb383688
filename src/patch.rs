use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A tri-state patch value distinguishing "leave the field alone" from "clear the field"
/// from "replace the field". JSON cannot express that difference with [Option] alone, so
/// partial-update bodies use this type for fields where an explicit `null` means "clear":
///
/// * field absent from the JSON object -> [Patch::Keep]
/// * field present as `null` -> [Patch::Clear]
/// * field present with a value -> [Patch::Set]
///
/// Deserialization relies on `#[serde(default)]` on the containing field, since serde only
/// invokes a field's deserializer when the key is present.
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(test, derive(Clone))]
pub enum Patch<T> {
    Keep,
    Clear,
    Set(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Keep
    }
}

impl<T> Patch<T> {
    /// True when this patch leaves the field untouched. Used with
    /// `#[serde(skip_serializing_if)]` so untouched fields vanish from outgoing bodies
    /// instead of serializing as `null` (which would mean "clear" on the receiving end).
    pub fn is_keep(&self) -> bool {
        matches!(self, Patch::Keep)
    }

    /// True when applying this patch would modify the field.
    pub fn changes(&self) -> bool {
        !self.is_keep()
    }

    /// The replacement value, if this patch carries one.
    pub fn value(&self) -> Option<&T> {
        match self {
            Patch::Set(value) => Some(value),
            _ => None,
        }
    }
}

impl<T: Clone> Patch<T> {
    /// Merges this patch into an optional field.
    pub fn apply_to(&self, field: &mut Option<T>) {
        match self {
            Patch::Keep => {}
            Patch::Clear => *field = None,
            Patch::Set(value) => *field = Some(value.clone()),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let body = Option::<T>::deserialize(deserializer)?;
        Ok(match body {
            Some(value) => Patch::Set(value),
            None => Patch::Clear,
        })
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            // Keep can only round-trip through skip_serializing_if; serializing it
            // directly degrades to null, same as Clear.
            Patch::Keep | Patch::Clear => serializer.serialize_none(),
            Patch::Set(value) => serializer.serialize_some(value),
        }
    }
}
