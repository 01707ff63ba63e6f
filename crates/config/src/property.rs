//! Explicit-or-inherited material property values

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A material property that is either set on the descriptor or inherited
/// from its parent at resolution time.
///
/// Absent (or `null`) JSON values deserialize to [`Property::Inherited`];
/// inherited values are skipped when serializing.
#[derive(Debug, Clone, PartialEq)]
pub enum Property<T> {
    Inherited,
    Explicit(T),
}

impl<T> Default for Property<T> {
    fn default() -> Self {
        Property::Inherited
    }
}

impl<T> Property<T> {
    #[inline]
    pub fn is_inherited(&self) -> bool {
        matches!(self, Property::Inherited)
    }

    #[inline]
    pub fn is_explicit(&self) -> bool {
        matches!(self, Property::Explicit(_))
    }

    /// Borrow the explicit value, if any
    #[inline]
    pub fn explicit(&self) -> Option<&T> {
        match self {
            Property::Explicit(value) => Some(value),
            Property::Inherited => None,
        }
    }
}

impl<T> From<T> for Property<T> {
    fn from(value: T) -> Self {
        Property::Explicit(value)
    }
}

impl<T: Serialize> Serialize for Property<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Property::Explicit(value) => value.serialize(serializer),
            Property::Inherited => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Property<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Property::Explicit(value),
            None => Property::Inherited,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    struct Holder {
        #[serde(default, skip_serializing_if = "Property::is_inherited")]
        value: Property<f32>,
    }

    #[test]
    fn test_absent_is_inherited() {
        let holder: Holder = serde_json::from_str("{}").unwrap();
        assert!(holder.value.is_inherited());

        let holder: Holder = serde_json::from_str(r#"{ "value": null }"#).unwrap();
        assert!(holder.value.is_inherited());
    }

    #[test]
    fn test_explicit_value() {
        let holder: Holder = serde_json::from_str(r#"{ "value": 0.25 }"#).unwrap();
        assert_eq!(holder.value.explicit(), Some(&0.25));
    }

    #[test]
    fn test_inherited_is_skipped() {
        let json = serde_json::to_string(&Holder {
            value: Property::Inherited,
        })
        .unwrap();
        assert_eq!(json, "{}");
    }
}
